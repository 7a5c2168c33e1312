//! The seam between extraction logic and whatever renders the storefront.

use std::time::Duration;

use crate::error::ScraperError;

/// A product card as captured from the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSnapshot {
    /// The element's `id` attribute, when it has one.
    pub dom_id: Option<String>,
    /// Outer HTML of the card element.
    pub html: String,
}

/// How far one scroll pass moves the listing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStep {
    By(u32),
    ToEnd,
}

/// A rendered storefront page.
///
/// Implementations wrap a live browser tab or a static HTML document. All
/// methods are called from a single task; nothing here requires `Send`.
#[allow(async_fn_in_trait)]
pub trait Page {
    /// Enters a delivery pincode into the first input matched by `inputs`.
    /// Returns `false` when none of the inputs exist on the page.
    async fn set_location(&mut self, location: &str, inputs: &[String])
        -> Result<bool, ScraperError>;

    async fn navigate(&mut self, target: &str) -> Result<(), ScraperError>;

    /// Waits until `selector` matches. Returns `false` on timeout.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, ScraperError>;

    /// Scrollable height of the first matching container, or 0 when none match.
    async fn scroll_height(&mut self, containers: &[String]) -> Result<u64, ScraperError>;

    /// Number of elements matching `selector`.
    async fn count(&mut self, selector: &str) -> Result<usize, ScraperError>;

    /// Scrolls the first matching container. Returns `false` when none match.
    async fn scroll(&mut self, containers: &[String], step: ScrollStep)
        -> Result<bool, ScraperError>;

    /// Captures every element matching `selector`, in document order.
    async fn snapshot_cards(&mut self, selector: &str) -> Result<Vec<CardSnapshot>, ScraperError>;
}
