//! Collection aggregation for one platform run.
//!
//! Collections are processed strictly in order on a single page. A failing
//! collection is recorded and logged, and the run moves on; the records of
//! every successful collection are merged with first-seen-wins dedup.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use pricepulse_core::{CollectionSpec, ProductRecord};

use crate::error::ScraperError;
use crate::extract::PlatformProfile;
use crate::page::Page;
use crate::retry::{load_listing_with_retry, RetryPolicy};
use crate::scroll::converge_scroll;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub retry: RetryPolicy,
    /// No new collection starts after this instant.
    pub deadline: Option<Instant>,
}

impl RunSettings {
    #[must_use]
    pub fn new(retry: RetryPolicy, budget: Option<Duration>) -> Self {
        Self {
            retry,
            deadline: budget.map(|b| Instant::now() + b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionStatus {
    Completed {
        /// Cards present once scrolling stopped.
        materialized: usize,
        /// Cards that yielded a record.
        extracted: usize,
        /// Records surviving dedup.
        kept: usize,
        converged: bool,
    },
    Failed {
        error: String,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub collection: String,
    pub status: CollectionStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    /// Deduplicated records in materialization order across collections.
    pub records: Vec<ProductRecord>,
    pub outcomes: Vec<CollectionOutcome>,
}

impl AggregateReport {
    pub fn failures(&self) -> impl Iterator<Item = &CollectionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, CollectionStatus::Failed { .. }))
    }

    /// `true` when no collection completed.
    #[must_use]
    pub fn nothing_completed(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|o| matches!(o.status, CollectionStatus::Completed { .. }))
    }
}

/// Opens the storefront home page and applies the delivery pincode once.
///
/// Returns `false` when the platform has no location inputs or none were
/// found. The storefront then serves its default location, which is logged
/// but not fatal.
///
/// # Errors
///
/// Returns the page backend's error if the home page cannot be loaded.
pub async fn open_session<P: Page>(
    page: &mut P,
    profile: &PlatformProfile,
    location: &str,
) -> Result<bool, ScraperError> {
    let config = &profile.config;
    if config.location_inputs.is_empty() {
        tracing::debug!(platform = %config.name, "no location inputs configured");
        return Ok(false);
    }
    if let Some(home) = config.home_url.as_deref() {
        page.navigate(home).await?;
    }
    let applied = page.set_location(location, &config.location_inputs).await?;
    if applied {
        tracing::info!(platform = %config.name, location, "delivery location set");
    } else {
        tracing::warn!(
            platform = %config.name,
            location,
            "no location input found; continuing with the storefront default"
        );
    }
    Ok(applied)
}

pub struct Aggregator<'a, P: Page> {
    page: &'a mut P,
    profile: &'a PlatformProfile,
    settings: RunSettings,
}

impl<'a, P: Page> Aggregator<'a, P> {
    pub fn new(page: &'a mut P, profile: &'a PlatformProfile, settings: RunSettings) -> Self {
        Self {
            page,
            profile,
            settings,
        }
    }

    /// Aggregates every collection configured for the platform.
    pub async fn aggregate(&mut self) -> AggregateReport {
        let profile = self.profile;
        self.aggregate_collections(&profile.config.collections).await
    }

    /// Aggregates `collections` in order.
    ///
    /// Records are deduplicated by identity within a collection and by name
    /// across collections; the first occurrence wins in both cases.
    pub async fn aggregate_collections(&mut self, collections: &[CollectionSpec]) -> AggregateReport {
        let profile = self.profile;
        let platform = profile.name();
        let mut report = AggregateReport::default();
        let mut seen_names: HashSet<String> = HashSet::new();

        for collection in collections {
            if self.settings.deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(
                    platform,
                    collection = %collection.name,
                    "run budget exhausted; skipping collection"
                );
                report.outcomes.push(CollectionOutcome {
                    collection: collection.name.clone(),
                    status: CollectionStatus::Skipped {
                        reason: "run budget exhausted".to_string(),
                    },
                });
                continue;
            }

            tracing::info!(platform, collection = %collection.name, "collecting");
            let status = match self.collect_one(collection).await {
                Ok((materialized, converged, extracted)) => {
                    let extracted_count = extracted.len();
                    let mut seen_ids: HashSet<String> = HashSet::new();
                    // Names only collide with earlier collections; same-name
                    // variants inside one listing are told apart by identity.
                    let mut collection_names: HashSet<String> = HashSet::new();
                    let before = report.records.len();
                    for record in extracted {
                        if seen_names.contains(&record.name)
                            || !seen_ids.insert(record.identity.clone())
                        {
                            continue;
                        }
                        collection_names.insert(record.name.clone());
                        report.records.push(record);
                    }
                    seen_names.extend(collection_names);
                    let kept = report.records.len() - before;
                    tracing::info!(
                        platform,
                        collection = %collection.name,
                        materialized,
                        extracted = extracted_count,
                        kept,
                        converged,
                        "collection complete"
                    );
                    CollectionStatus::Completed {
                        materialized,
                        extracted: extracted_count,
                        kept,
                        converged,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        platform,
                        collection = %collection.name,
                        target_url = %collection.target,
                        error = %e,
                        "collection failed; continuing with remaining collections"
                    );
                    CollectionStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.outcomes.push(CollectionOutcome {
                collection: collection.name.clone(),
                status,
            });
        }

        report
    }

    /// Loads, scrolls and extracts one collection. Returns the materialized
    /// card count, whether scrolling converged, and the extracted records.
    async fn collect_one(
        &mut self,
        collection: &CollectionSpec,
    ) -> Result<(usize, bool, Vec<ProductRecord>), ScraperError> {
        let profile = self.profile;
        let config = &profile.config;
        load_listing_with_retry(
            self.page,
            &collection.target,
            config.ready_selector(),
            Duration::from_millis(config.ready_timeout_ms),
            self.settings.retry,
        )
        .await?;
        if config.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;
        }

        let convergence = converge_scroll(self.page, &config.scroll, &config.card_selector).await?;
        let cards = self.page.snapshot_cards(&config.card_selector).await?;
        let records = cards
            .iter()
            .filter_map(|card| profile.extractor.extract_card(card, collection))
            .collect();
        Ok((cards.len(), convergence.converged, records))
    }
}
