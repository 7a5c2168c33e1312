//! Per-platform run: session, aggregation, CSV artifact, sheet publish.

use std::time::Duration;

use pricepulse_core::{AppConfig, ProductRecord};
use pricepulse_scraper::{
    open_session, write_csv_file, Aggregator, Page, PlatformProfile, RetryPolicy, RunSettings,
};
use pricepulse_sheets::{replace_rows, RowStore};

/// Result of one platform run, used for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlatformOutcome {
    pub platform: String,
    pub records: usize,
    pub failed_collections: usize,
    pub csv_written: bool,
    /// `None` when no sheet write was attempted.
    pub sheet_written: Option<bool>,
    pub succeeded: bool,
}

impl PlatformOutcome {
    pub(crate) fn failed(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
            records: 0,
            failed_collections: 0,
            csv_written: false,
            sheet_written: None,
            succeeded: false,
        }
    }
}

/// Runs one platform end to end.
///
/// The CSV artifact is written before the sheet so a persistence failure
/// never loses the run's data. Nothing is written when no collection
/// completed; the previous artifact and sheet stay as they were.
pub(crate) async fn run_platform<P: Page, S: RowStore>(
    page: &mut P,
    store: Option<&S>,
    profile: &PlatformProfile,
    config: &AppConfig,
    open_location: bool,
) -> PlatformOutcome {
    let platform = profile.name();

    if open_location {
        if let Err(e) = open_session(page, profile, &config.location).await {
            tracing::error!(platform, error = %e, "failed to open storefront session");
            return PlatformOutcome::failed(platform);
        }
    } else {
        tracing::debug!(platform, "static pages; location not set");
    }

    let settings = RunSettings::new(
        RetryPolicy {
            max_retries: config.navigation_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        },
        Some(Duration::from_secs(config.run_budget_secs)),
    );
    let report = Aggregator::new(page, profile, settings).aggregate().await;
    let failed_collections = report.failures().count();

    if report.nothing_completed() {
        tracing::error!(
            platform,
            collections = report.outcomes.len(),
            "no collection completed; leaving previous artifacts untouched"
        );
        return PlatformOutcome {
            failed_collections,
            ..PlatformOutcome::failed(platform)
        };
    }

    let extra = &profile.config.extra_columns;
    let header = ProductRecord::header(extra);
    let rows: Vec<Vec<String>> = report.records.iter().map(|r| r.to_row(extra)).collect();

    let csv_path = config.output_dir.join(&profile.config.output_file);
    let csv_written = match write_csv_file(&csv_path, &header, &rows) {
        Ok(()) => {
            tracing::info!(platform, path = %csv_path.display(), rows = rows.len(), "CSV artifact written");
            true
        }
        Err(e) => {
            tracing::error!(platform, path = %csv_path.display(), error = %e, "CSV artifact write failed");
            false
        }
    };

    let sheet_written = match store {
        Some(store) => {
            let values: Vec<Vec<String>> = std::iter::once(header).chain(rows).collect();
            let result = replace_rows(
                store,
                &profile.config.sheet_clear_range(),
                &profile.config.sheet_write_range(),
                &values,
            )
            .await;
            if let Err(e) = &result {
                tracing::error!(
                    platform,
                    sheet = %profile.config.sheet,
                    error = %e,
                    "sheet write failed; CSV artifact is unaffected"
                );
            }
            Some(result.is_ok())
        }
        None => None,
    };

    PlatformOutcome {
        platform: platform.to_string(),
        records: report.records.len(),
        failed_collections,
        csv_written,
        sheet_written,
        succeeded: csv_written || sheet_written == Some(true),
    }
}

/// Logs the run summary.
///
/// # Errors
///
/// Returns an error when every platform failed.
pub(crate) fn summarize(outcomes: &[PlatformOutcome]) -> anyhow::Result<()> {
    for outcome in outcomes {
        tracing::info!(
            platform = %outcome.platform,
            records = outcome.records,
            failed_collections = outcome.failed_collections,
            csv_written = outcome.csv_written,
            sheet_written = ?outcome.sheet_written,
            succeeded = outcome.succeeded,
            "platform summary"
        );
    }
    let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
    let records: usize = outcomes.iter().map(|o| o.records).sum();
    tracing::info!(
        platforms = outcomes.len(),
        succeeded,
        records,
        finished_at = %chrono::Utc::now().to_rfc3339(),
        "scrape run complete"
    );

    if !outcomes.is_empty() && succeeded == 0 {
        anyhow::bail!("all {} platform(s) failed", outcomes.len());
    }
    Ok(())
}
