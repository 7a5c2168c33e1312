//! Listing navigation with exponential backoff on transient load failures.
//!
//! A listing that fails to render in time is retried after a delay. Structural
//! problems (missing containers, bad selectors, a dead browser) are returned
//! immediately; waiting will not fix them.

use std::time::Duration;

use crate::error::ScraperError;
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// Returns `true` if `err` is worth another navigation attempt.
///
/// - [`ScraperError::LoadTimeout`]: the ready element did not appear in time.
/// - [`ScraperError::Navigation`]: the page load itself failed.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::LoadTimeout { .. } | ScraperError::Navigation { .. }
    )
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`, saturating.
#[must_use]
pub fn backoff_delay(backoff_base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(backoff_base_ms.saturating_mul(1u64 << attempt.min(62)))
}

/// Navigates to `target` and waits for `ready_selector`, once.
///
/// # Errors
///
/// Returns [`ScraperError::LoadTimeout`] if the selector never matches, or
/// whatever the page backend reports for the navigation itself.
pub async fn load_listing<P: Page>(
    page: &mut P,
    target: &str,
    ready_selector: &str,
    timeout: Duration,
) -> Result<(), ScraperError> {
    page.navigate(target).await?;
    if page.wait_for(ready_selector, timeout).await? {
        Ok(())
    } else {
        Err(ScraperError::LoadTimeout {
            target: target.to_string(),
            selector: ready_selector.to_string(),
            waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

/// [`load_listing`] with retries on transient failures.
///
/// With `max_retries = 2` the listing is loaded at most three times. The last
/// error is returned once retries are exhausted.
///
/// # Errors
///
/// Returns the first non-retriable error, or the last retriable one.
pub async fn load_listing_with_retry<P: Page>(
    page: &mut P,
    target: &str,
    ready_selector: &str,
    timeout: Duration,
    policy: RetryPolicy,
) -> Result<(), ScraperError> {
    let mut attempt = 0u32;

    loop {
        let err = match load_listing(page, target, ready_selector, timeout).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= policy.max_retries {
            return Err(err);
        }

        let delay = backoff_delay(policy.backoff_base_ms, attempt);
        tracing::warn!(
            target_url = target,
            attempt,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "listing failed to load; retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html_page::HtmlPage;
    use crate::page::{CardSnapshot, ScrollStep};

    const POLICY: RetryPolicy = RetryPolicy {
        max_retries: 2,
        backoff_base_ms: 0,
    };

    /// Reports the ready element missing for the first `misses` waits.
    struct SlowPage {
        inner: HtmlPage,
        misses: u32,
        navigations: u32,
    }

    impl SlowPage {
        fn new(misses: u32) -> Self {
            Self {
                inner: HtmlPage::new().with_document("listing", "<div class='card'>x</div>"),
                misses,
                navigations: 0,
            }
        }
    }

    impl Page for SlowPage {
        async fn set_location(&mut self, location: &str, inputs: &[String]) -> Result<bool, ScraperError> {
            self.inner.set_location(location, inputs).await
        }
        async fn navigate(&mut self, target: &str) -> Result<(), ScraperError> {
            self.navigations += 1;
            self.inner.navigate(target).await
        }
        async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, ScraperError> {
            if self.misses > 0 {
                self.misses -= 1;
                return Ok(false);
            }
            self.inner.wait_for(selector, timeout).await
        }
        async fn scroll_height(&mut self, containers: &[String]) -> Result<u64, ScraperError> {
            self.inner.scroll_height(containers).await
        }
        async fn count(&mut self, selector: &str) -> Result<usize, ScraperError> {
            self.inner.count(selector).await
        }
        async fn scroll(&mut self, containers: &[String], step: ScrollStep) -> Result<bool, ScraperError> {
            self.inner.scroll(containers, step).await
        }
        async fn snapshot_cards(&mut self, selector: &str) -> Result<Vec<CardSnapshot>, ScraperError> {
            self.inner.snapshot_cards(selector).await
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(2000, 0), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2000, 1), Duration::from_millis(4000));
        assert_eq!(backoff_delay(2000, 2), Duration::from_millis(8000));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        assert_eq!(backoff_delay(u64::MAX, 10), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn loads_on_first_try() {
        let mut page = SlowPage::new(0);
        load_listing_with_retry(&mut page, "listing", "div.card", Duration::ZERO, POLICY)
            .await
            .unwrap();
        assert_eq!(page.navigations, 1);
    }

    #[tokio::test]
    async fn retries_timeout_then_succeeds() {
        let mut page = SlowPage::new(2);
        load_listing_with_retry(&mut page, "listing", "div.card", Duration::ZERO, POLICY)
            .await
            .unwrap();
        assert_eq!(page.navigations, 3);
    }

    #[tokio::test]
    async fn returns_timeout_after_exhausting_retries() {
        let mut page = SlowPage::new(10);
        let err = load_listing_with_retry(&mut page, "listing", "div.card", Duration::ZERO, POLICY)
            .await
            .unwrap_err();
        // max_retries=2 → 3 total attempts
        assert_eq!(page.navigations, 3);
        assert!(matches!(err, ScraperError::LoadTimeout { ref selector, .. } if selector == "div.card"));
    }

    #[tokio::test]
    async fn does_not_retry_invalid_selector() {
        let mut page = SlowPage::new(0);
        let err = load_listing_with_retry(&mut page, "listing", "div[", Duration::ZERO, POLICY)
            .await
            .unwrap_err();
        assert_eq!(page.navigations, 1);
        assert!(matches!(err, ScraperError::InvalidSelector { .. }));
    }
}
