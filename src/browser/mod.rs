//! Headless-rendering sessions for sites that build their listings in the
//! client
//!
//! One session wraps one tab. Sessions are scoped resources: the tab is
//! closed when the session drops, so every exit path (including wait
//! timeouts) releases it. A timeout skips the single item being rendered and
//! is never fatal to the crawl.

use crate::{MotorlotError, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

fn browser_err(e: anyhow::Error) -> MotorlotError {
    MotorlotError::Browser(e.to_string())
}

/// A launched headless Chrome instance shared by one spider
pub struct BrowserEngine {
    browser: Browser,
}

impl BrowserEngine {
    /// Launches headless Chrome
    pub fn launch() -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .map_err(|e| MotorlotError::Browser(e.to_string()))?;

        let browser = Browser::new(options).map_err(browser_err)?;

        Ok(Self { browser })
    }

    /// Navigates a fresh tab to `url` and waits for `marker` to render
    ///
    /// The wait is bounded by `timeout`; on any failure the tab is closed
    /// before the error is returned.
    pub fn open(&self, url: &str, marker: &str, timeout: Duration) -> Result<PageSession> {
        let tab = self.browser.new_tab().map_err(browser_err)?;
        let session = PageSession {
            tab,
            url: url.to_string(),
        };

        session.tab.navigate_to(url).map_err(browser_err)?;
        session.tab.wait_until_navigated().map_err(browser_err)?;
        session.wait_for(marker, timeout)?;

        Ok(session)
    }
}

/// One rendered page, scoped to one tab
pub struct PageSession {
    tab: Arc<Tab>,
    url: String,
}

impl PageSession {
    /// Waits for `selector` to appear, bounded by `timeout`
    pub fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|_| MotorlotError::NavigationTimeout {
                url: self.url.clone(),
                selector: selector.to_string(),
            })
    }

    /// Clicks `selector` repeatedly until it stops appearing
    ///
    /// Covers "load more" controls that reveal further content. Bounded by
    /// `max_attempts`; each round waits `settle` for the control to re-render
    /// before the next click.
    pub fn click_until_gone(&self, selector: &str, max_attempts: u32, settle: Duration) {
        for attempt in 0..max_attempts {
            let element = match self.tab.find_element(selector) {
                Ok(el) => el,
                Err(_) => {
                    debug!("'{}' gone after {} clicks", selector, attempt);
                    return;
                }
            };
            if element.click().is_err() {
                return;
            }
            thread::sleep(settle);
        }
        debug!("'{}' still present after {} clicks", selector, max_attempts);
    }

    /// Scrolls to the bottom of the page to trigger lazy-loaded content
    pub fn scroll_to_bottom(&self) {
        let _ = self.tab.evaluate(
            "window.scrollTo(0, document.body.scrollHeight);",
            false,
        );
    }

    /// Captures the fully rendered page content
    pub fn content(&self) -> Result<String> {
        self.tab.get_content().map_err(browser_err)
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        // Tab must not leak, whatever path got us here.
        let _ = self.tab.close(true);
    }
}
