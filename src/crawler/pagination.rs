//! Pagination controller
//!
//! One `PaginationCursor` is owned by each crawl run. After every listing
//! page the owning driver feeds it the site's next-page signal; the cursor
//! either advances to the next page index or becomes exhausted. A visited
//! page-marker set guards against sites whose "current page" indicator stops
//! advancing, which would otherwise loop forever.

use std::collections::HashSet;

/// The site-specific signal that decides whether a next page exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPageSignal {
    /// The listing payload for the current page was non-empty
    ItemsRemain(bool),

    /// A "next" control exists; `disabled` reflects its disabled attribute
    NextControl { disabled: bool },

    /// No "next" control was found on the page
    NoNextControl,

    /// The page identifier shown on the current page, when present
    PageMarker(Option<String>),

    /// The site has a single listing page; stop after it
    EndOfList,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// A listing page request is due for the current index
    AwaitingPage,

    /// No further pages; the crawl branch terminates
    Exhausted,
}

/// Per-crawl pagination cursor
///
/// Tracks the current page index and the set of already-visited page markers.
#[derive(Debug)]
pub struct PaginationCursor {
    index: u64,
    /// Offset multiplier for sites that paginate by record offset
    page_size: u64,
    visited_markers: HashSet<String>,
    state: CursorState,
}

impl PaginationCursor {
    /// Creates a cursor at the site's starting page index
    ///
    /// `page_size` is the offset step for sites addressed by record offset;
    /// sites addressed by page number pass 1.
    pub fn new(start_index: u64, page_size: u64) -> Self {
        Self {
            index: start_index,
            page_size,
            visited_markers: HashSet::new(),
            state: CursorState::AwaitingPage,
        }
    }

    /// The current page index
    pub fn current(&self) -> u64 {
        self.index
    }

    /// The current record offset (`index * page_size`)
    pub fn offset(&self) -> u64 {
        self.index * self.page_size
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Consumes the current page's next-page signal
    ///
    /// A positive signal advances the page index and re-enters AwaitingPage;
    /// a negative signal, a missing marker, or a revisited marker exhausts
    /// the cursor. An exhausted cursor never advances again.
    pub fn advance(&mut self, signal: &NextPageSignal) -> CursorState {
        if self.state == CursorState::Exhausted {
            return self.state;
        }

        let has_next = match signal {
            NextPageSignal::ItemsRemain(non_empty) => *non_empty,
            NextPageSignal::NextControl { disabled } => !disabled,
            NextPageSignal::NoNextControl => false,
            NextPageSignal::PageMarker(Some(marker)) => {
                // Revisiting a marker means the site misreported its state.
                self.visited_markers.insert(marker.clone())
            }
            NextPageSignal::PageMarker(None) => false,
            NextPageSignal::EndOfList => false,
        };

        if has_next {
            self.index += 1;
        } else {
            self.state = CursorState::Exhausted;
        }
        self.state
    }
}
