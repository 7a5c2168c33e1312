//! The `scrape` command.
//!
//! Platforms run one after another, each in its own page session. A platform
//! that fails is logged and skipped; the command only fails when every
//! selected platform failed.

mod runner;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pricepulse_core::{AppConfig, PlatformConfig, PlatformsFile};
use pricepulse_scraper::{HtmlPage, PlatformProfile};
use pricepulse_sheets::SheetsClient;

pub(crate) use runner::{run_platform, summarize, PlatformOutcome};

/// Retry budget for Sheets API quota errors.
const SHEETS_MAX_RETRIES: u32 = 3;
const SHEETS_BACKOFF_BASE_MS: u64 = 1_000;

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Restrict the run to one platform (by name)
    #[arg(long)]
    pub platform: Option<String>,

    /// Serve a saved rendered page for a navigation target instead of a live browser
    #[arg(long = "html", value_name = "TARGET=FILE", value_parser = parse_html_target)]
    pub html: Vec<(String, PathBuf)>,

    /// Write CSV artifacts only
    #[arg(long)]
    pub no_sheets: bool,
}

/// Parses `TARGET=FILE`. Targets are URLs and may contain `=`, so the split
/// happens at the last one.
pub(crate) fn parse_html_target(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.rsplit_once('=') {
        Some((target, file)) if !target.is_empty() && !file.is_empty() => {
            Ok((target.to_string(), PathBuf::from(file)))
        }
        _ => Err(format!("expected TARGET=FILE, got '{raw}'")),
    }
}

/// Runs the `scrape` command.
///
/// # Errors
///
/// Returns an error if the platform filter matches nothing, an `--html` file
/// cannot be read, the live browser backend is unavailable, the Sheets client
/// cannot be built, or every platform failed.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    platforms: &PlatformsFile,
    args: &ScrapeArgs,
) -> anyhow::Result<()> {
    let selected = select_platforms(platforms, args.platform.as_deref())?;
    let saved_pages = load_html_targets(&args.html)?;
    if saved_pages.is_none() && !cfg!(feature = "chrome") {
        anyhow::bail!(
            "this build has no browser backend; pass --html TARGET=FILE or rebuild with `--features chrome`"
        );
    }

    let mut outcomes = Vec::with_capacity(selected.len());
    for platform in selected {
        let profile = match PlatformProfile::compile(platform.clone()) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(platform = %platform.name, error = %e, "platform profile invalid; skipping");
                outcomes.push(PlatformOutcome::failed(&platform.name));
                continue;
            }
        };
        let store = if args.no_sheets {
            None
        } else {
            build_sheets_client(config, platform.spreadsheet(config.spreadsheet_id.as_deref()))?
        };

        let outcome = match &saved_pages {
            None => run_live(&profile, store.as_ref(), config).await,
            Some(saved) => {
                let mut page = saved.clone();
                let serves_home = platform
                    .home_url
                    .as_deref()
                    .is_some_and(|home| args.html.iter().any(|(target, _)| target == home));
                run_platform(&mut page, store.as_ref(), &profile, config, serves_home).await
            }
        };
        outcomes.push(outcome);
    }

    summarize(&outcomes)
}

/// Reads every `--html` file up front so a bad path fails the command before
/// any platform runs. `None` when no files were given.
pub(crate) fn load_html_targets(targets: &[(String, PathBuf)]) -> anyhow::Result<Option<HtmlPage>> {
    if targets.is_empty() {
        return Ok(None);
    }
    let mut page = HtmlPage::new();
    for (target, file) in targets {
        page.insert_file(target.clone(), file)
            .with_context(|| format!("failed to read --html file for {target}"))?;
    }
    Ok(Some(page))
}

fn select_platforms<'a>(
    platforms: &'a PlatformsFile,
    filter: Option<&str>,
) -> anyhow::Result<Vec<&'a PlatformConfig>> {
    match filter {
        Some(name) => {
            let platform = platforms.find(name).ok_or_else(|| {
                let known: Vec<&str> = platforms.platforms.iter().map(|p| p.name.as_str()).collect();
                anyhow::anyhow!("unknown platform '{name}' (configured: {})", known.join(", "))
            })?;
            Ok(vec![platform])
        }
        None => Ok(platforms.platforms.iter().collect()),
    }
}

/// Builds a Sheets client for `spreadsheet_id`, or `None` with a warning
/// when the spreadsheet or the access token is not configured.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed from the configured
/// base URL.
pub(crate) fn build_sheets_client(
    config: &AppConfig,
    spreadsheet_id: Option<&str>,
) -> anyhow::Result<Option<SheetsClient>> {
    let (Some(spreadsheet_id), Some(token)) =
        (spreadsheet_id, config.sheets_access_token.as_deref())
    else {
        tracing::warn!(
            "no spreadsheet or PRICEPULSE_SHEETS_ACCESS_TOKEN configured; sheet writes disabled"
        );
        return Ok(None);
    };
    let client = SheetsClient::new(
        &config.sheets_base_url,
        spreadsheet_id,
        token,
        config.request_timeout_secs,
        &config.user_agent,
    )?
    .with_retries(SHEETS_MAX_RETRIES, SHEETS_BACKOFF_BASE_MS);
    Ok(Some(client))
}

#[cfg(feature = "chrome")]
async fn run_live(
    profile: &PlatformProfile,
    store: Option<&SheetsClient>,
    config: &AppConfig,
) -> PlatformOutcome {
    match pricepulse_scraper::ChromePage::launch(&config.user_agent, true) {
        Ok(mut page) => run_platform(&mut page, store, profile, config, true).await,
        Err(e) => {
            tracing::error!(platform = %profile.name(), error = %e, "browser failed to start");
            PlatformOutcome::failed(profile.name())
        }
    }
}

#[cfg(not(feature = "chrome"))]
#[allow(clippy::unused_async)]
async fn run_live(
    profile: &PlatformProfile,
    _store: Option<&SheetsClient>,
    _config: &AppConfig,
) -> PlatformOutcome {
    tracing::error!(platform = %profile.name(), "no browser backend in this build");
    PlatformOutcome::failed(profile.name())
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
