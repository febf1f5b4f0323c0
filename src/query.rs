//! Search query composition from CLI-supplied filter terms

use url::form_urlencoded;

/// Vehicle search filters supplied on the command line
///
/// Terms are trimmed, empty terms dropped, and the rest joined with spaces
/// into one free-text search phrase.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub year: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
}

impl SearchQuery {
    /// The space-joined search phrase, empty when no filters were given
    pub fn phrase(&self) -> String {
        [&self.year, &self.make, &self.model, &self.trim]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The URL-encoded search phrase
    pub fn encoded(&self) -> String {
        form_urlencoded::byte_serialize(self.phrase().as_bytes()).collect()
    }

    /// True when no filter terms were supplied
    pub fn is_empty(&self) -> bool {
        self.phrase().is_empty()
    }
}
