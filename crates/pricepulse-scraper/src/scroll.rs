//! Scroll convergence: load a lazily-rendered listing until it stops growing.
//!
//! Each iteration measures the listing, scrolls, and waits. The listing has
//! converged once the measurement stays unchanged for the configured number of
//! consecutive iterations. Hitting the iteration cap is not an error; the
//! caller receives whatever has materialized with `converged = false`.

use std::time::Duration;

use pricepulse_core::{MeasureStrategy, ScrollConfig, ScrollMode, WaitRange};
use rand::Rng;

use crate::error::ScraperError;
use crate::page::{Page, ScrollStep};

/// Per-listing convergence bookkeeping. Not reused across collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub last_measurement: Option<u64>,
    pub stable_iterations: u32,
    pub iteration: u32,
}

impl ScrollState {
    /// Records one measurement and returns the updated stable streak.
    ///
    /// The first measurement only establishes the baseline. Any change resets
    /// the streak to zero.
    pub fn observe(&mut self, measurement: u64) -> u32 {
        self.iteration += 1;
        if self.last_measurement == Some(measurement) {
            self.stable_iterations += 1;
        } else {
            self.stable_iterations = 0;
            self.last_measurement = Some(measurement);
        }
        self.stable_iterations
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// Cards present after the final scroll.
    pub final_card_count: usize,
    pub iterations: u32,
    /// `false` when the iteration cap was reached first.
    pub converged: bool,
}

/// Scrolls the listing until it converges or the iteration cap is reached.
///
/// # Errors
///
/// Returns [`ScraperError::StructuralMismatch`] when a measurement is zero or
/// no scroll container matches. Either means the listing markup is not what
/// the profile expects, so the collection is abandoned immediately.
pub async fn converge_scroll<P: Page>(
    page: &mut P,
    config: &ScrollConfig,
    card_selector: &str,
) -> Result<ConvergenceReport, ScraperError> {
    let step = match config.mode {
        ScrollMode::Step => ScrollStep::By(config.step_px),
        ScrollMode::ToEnd => ScrollStep::ToEnd,
    };
    let mut state = ScrollState::default();
    let mut converged = false;

    while state.iteration < config.max_iterations {
        let measurement = measure(page, config, card_selector).await?;
        if measurement == 0 {
            return Err(ScraperError::StructuralMismatch {
                what: format!(
                    "{} measured zero (containers {:?}, cards \"{card_selector}\")",
                    measure_label(config.measure),
                    config.containers
                ),
            });
        }
        if !page.scroll(&config.containers, step).await? {
            return Err(ScraperError::StructuralMismatch {
                what: format!("no scroll container among {:?}", config.containers),
            });
        }
        tokio::time::sleep(pick_wait(config.wait)).await;

        let stable = state.observe(measurement);
        tracing::debug!(
            iteration = state.iteration,
            measurement,
            stable,
            "scroll iteration"
        );
        if stable >= config.required_stable_iterations {
            converged = true;
            break;
        }
    }

    let final_card_count = page.count(card_selector).await?;
    if converged {
        tracing::info!(
            iterations = state.iteration,
            final_card_count,
            "listing converged"
        );
    } else {
        tracing::warn!(
            iterations = state.iteration,
            final_card_count,
            "listing did not converge before the iteration cap; continuing with partial results"
        );
    }
    Ok(ConvergenceReport {
        final_card_count,
        iterations: state.iteration,
        converged,
    })
}

async fn measure<P: Page>(
    page: &mut P,
    config: &ScrollConfig,
    card_selector: &str,
) -> Result<u64, ScraperError> {
    match config.measure {
        MeasureStrategy::Height => page.scroll_height(&config.containers).await,
        MeasureStrategy::Count => {
            let count = page.count(card_selector).await?;
            Ok(u64::try_from(count).unwrap_or(u64::MAX))
        }
    }
}

fn measure_label(strategy: MeasureStrategy) -> &'static str {
    match strategy {
        MeasureStrategy::Height => "container height",
        MeasureStrategy::Count => "card count",
    }
}

/// Draws a wait duration uniformly from the range.
fn pick_wait(range: WaitRange) -> Duration {
    let ms = if range.min_ms >= range.max_ms {
        range.min_ms
    } else {
        rand::rng().random_range(range.min_ms..=range.max_ms)
    };
    Duration::from_millis(ms)
}

#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;
