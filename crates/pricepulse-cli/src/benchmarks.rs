//! Benchmark maintenance and the price-deviation report.
//!
//! Both read the platform tabs written by `scrape`; neither touches a
//! storefront.

use clap::Subcommand;
use pricepulse_core::{
    merge_benchmarks, parse_price_cell, price_status, AppConfig, BenchmarkTable, PlatformConfig,
    PlatformsFile, PriceStatus,
};
use pricepulse_sheets::{replace_rows, RowStore};
use serde::Serialize;

use crate::scrape::build_sheets_client;

pub(crate) const BENCHMARK_TAB: &str = "Benchmarks";

#[derive(Debug, Subcommand)]
pub enum BenchmarkCommands {
    /// Add newly listed products to the Benchmarks tab and drop delisted ones
    Sync,
}

/// One product on one platform, compared against its benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReportRow {
    pub platform: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub benchmark: Option<f64>,
    pub status: PriceStatus,
}

pub(crate) async fn run_benchmarks_command(
    config: &AppConfig,
    platforms: &PlatformsFile,
    command: BenchmarkCommands,
) -> anyhow::Result<()> {
    match command {
        BenchmarkCommands::Sync => {
            for (spreadsheet_id, group) in group_by_spreadsheet(config.spreadsheet_id.as_deref(), &platforms.platforms)? {
                let store = require_store(config, &spreadsheet_id)?;
                let table = sync_benchmarks(&store, &group).await?;
                println!(
                    "{spreadsheet_id}: Benchmarks tab now lists {} product(s)",
                    table.rows.len()
                );
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_report(
    config: &AppConfig,
    platforms: &PlatformsFile,
    deviations_only: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut rows = Vec::new();
    for (spreadsheet_id, group) in group_by_spreadsheet(config.spreadsheet_id.as_deref(), &platforms.platforms)? {
        let store = require_store(config, &spreadsheet_id)?;
        rows.extend(build_report(&store, &group).await?);
    }
    if deviations_only {
        rows.retain(|r| r.status.is_deviation());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{:<18} {:<48} {:>10} {:>10}  STATUS", "PLATFORM", "PRODUCT", "PRICE", "BENCHMARK");
        for row in &rows {
            println!(
                "{:<18} {:<48} {:>10} {:>10}  {}",
                row.platform,
                row.name,
                format_price(row.current_price),
                format_price(row.benchmark),
                row.status
            );
        }
    }
    Ok(())
}

fn require_store(
    config: &AppConfig,
    spreadsheet_id: &str,
) -> anyhow::Result<pricepulse_sheets::SheetsClient> {
    build_sheets_client(config, Some(spreadsheet_id))?
        .ok_or_else(|| anyhow::anyhow!("this command needs PRICEPULSE_SHEETS_ACCESS_TOKEN"))
}

/// Groups platforms by the spreadsheet holding their tabs, in configuration
/// order. Each spreadsheet keeps its own Benchmarks tab.
///
/// Platforms with no spreadsheet are skipped with a warning.
///
/// # Errors
///
/// Returns an error if no platform has a spreadsheet.
pub(crate) fn group_by_spreadsheet(
    default_spreadsheet: Option<&str>,
    platforms: &[PlatformConfig],
) -> anyhow::Result<Vec<(String, Vec<PlatformConfig>)>> {
    let mut groups: Vec<(String, Vec<PlatformConfig>)> = Vec::new();
    for platform in platforms {
        let Some(id) = platform.spreadsheet(default_spreadsheet) else {
            tracing::warn!(
                platform = %platform.name,
                "no spreadsheet configured (PRICEPULSE_SPREADSHEET_ID); skipping platform"
            );
            continue;
        };
        match groups.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, group)) => group.push(platform.clone()),
            None => groups.push((id.to_string(), vec![platform.clone()])),
        }
    }
    if groups.is_empty() {
        anyhow::bail!("no platform has a spreadsheet; set PRICEPULSE_SPREADSHEET_ID");
    }
    Ok(groups)
}

fn benchmark_ranges() -> (String, String) {
    (format!("{BENCHMARK_TAB}!A1:Z"), format!("{BENCHMARK_TAB}!A1"))
}

/// Product names listed on a platform tab, header excluded.
fn listed_names(values: &[Vec<String>]) -> Vec<String> {
    values
        .iter()
        .skip(1)
        .filter_map(|row| row.first())
        .filter(|name| !name.is_empty())
        .cloned()
        .collect()
}

/// Rebuilds the Benchmarks tab from the names currently on each platform tab.
///
/// Platform tabs missing from the existing header get a new column.
///
/// # Errors
///
/// Returns an error if any tab cannot be read or the Benchmarks tab cannot be
/// rewritten.
pub(crate) async fn sync_benchmarks<S: RowStore>(
    store: &S,
    platforms: &[PlatformConfig],
) -> anyhow::Result<BenchmarkTable> {
    let tabs: Vec<&str> = platforms.iter().map(|p| p.sheet.as_str()).collect();

    let mut names_by_tab = Vec::with_capacity(platforms.len());
    for platform in platforms {
        let values = store.read_rows(&platform.sheet_clear_range()).await?;
        names_by_tab.push((platform.sheet.clone(), listed_names(&values)));
    }

    let (read_range, write_range) = benchmark_ranges();
    let mut existing = BenchmarkTable::from_values(store.read_rows(&read_range).await?, &tabs);
    for tab in &tabs {
        if !existing.header.iter().any(|h| h == tab) {
            existing.header.push((*tab).to_string());
        }
    }

    let merged = merge_benchmarks(&existing, &names_by_tab);
    replace_rows(store, &read_range, &write_range, &merged.to_values()).await?;
    tracing::info!(products = merged.rows.len(), tabs = tabs.len(), "benchmarks synced");
    Ok(merged)
}

/// Compares every listed product's current price with its benchmark.
///
/// # Errors
///
/// Returns an error if a tab cannot be read.
pub(crate) async fn build_report<S: RowStore>(
    store: &S,
    platforms: &[PlatformConfig],
) -> anyhow::Result<Vec<ReportRow>> {
    let tabs: Vec<&str> = platforms.iter().map(|p| p.sheet.as_str()).collect();
    let (read_range, _) = benchmark_ranges();
    let benchmarks = BenchmarkTable::from_values(store.read_rows(&read_range).await?, &tabs);

    let mut report = Vec::new();
    for platform in platforms {
        let values = store.read_rows(&platform.sheet_clear_range()).await?;
        let Some(header) = values.first() else {
            tracing::warn!(platform = %platform.name, sheet = %platform.sheet, "platform tab is empty");
            continue;
        };
        let name_col = column(header, "name").unwrap_or(0);
        let price_col = column(header, "current_price").unwrap_or(2);

        for row in values.iter().skip(1) {
            let Some(name) = row.get(name_col).filter(|n| !n.is_empty()) else {
                continue;
            };
            let current_price = row.get(price_col).and_then(|c| parse_price_cell(c));
            let benchmark = benchmarks.benchmark(name, &platform.sheet);
            report.push(ReportRow {
                platform: platform.name.clone(),
                name: name.clone(),
                current_price,
                benchmark,
                status: price_status(current_price, benchmark),
            });
        }
    }
    Ok(report)
}

fn column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn format_price(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{v}"))
}

#[cfg(test)]
#[path = "benchmarks_test.rs"]
mod tests;
