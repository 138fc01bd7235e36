// src/session/mod.rs
//! Browser session seam.
//!
//! A [`Session`] drives one live page. Reading happens on a
//! [`PageSnapshot`] of the rendered HTML, where probing for an element
//! that may legitimately be absent returns `None` instead of failing.

pub mod auth;
pub mod chrome;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::authenticate;
pub use chrome::{ChromeLauncher, ChromeSession};
pub use snapshot::PageSnapshot;

use anyhow::Result;

/// One live browser page.
pub trait Session: Send + Sync {
    /// Navigate and wait for the navigation to finish.
    fn navigate(&self, url: &str) -> Result<()>;

    /// Rendered HTML of the current document.
    fn page_source(&self) -> Result<String>;

    /// Type `text` into the first element matching `selector`.
    /// Returns `false` when no such element exists.
    fn fill(&self, selector: &str, text: &str) -> Result<bool>;

    /// Press Enter inside the first element matching `selector`.
    /// Returns `false` when no such element exists.
    fn submit(&self, selector: &str) -> Result<bool>;

    /// Add `delta_px` to the element's `scrollTop` and return the new
    /// value, or `None` when the element is absent.
    fn scroll_by(&self, selector: &str, delta_px: i64) -> Result<Option<f64>>;

    fn snapshot(&self) -> Result<PageSnapshot> {
        Ok(PageSnapshot::parse(&self.page_source()?))
    }
}

/// Opens fresh sessions. Dropping the returned box releases the browser.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn Session>>;
}
