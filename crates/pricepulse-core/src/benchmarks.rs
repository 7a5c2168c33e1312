//! Benchmark prices set by the brand team, and comparison of live prices
//! against them.
//!
//! The `Benchmarks` tab is a wide table: a `Name` column followed by one
//! column per platform tab, each cell holding that platform's benchmark
//! price for the product (blank when not yet set).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::products::parse_price_cell;

/// Where a live price sits relative to its benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStatus {
    Below,
    Above,
    Equal,
    /// Either price is missing.
    Unknown,
}

impl PriceStatus {
    /// `true` when the live price deviates from a known benchmark.
    #[must_use]
    pub fn is_deviation(self) -> bool {
        matches!(self, PriceStatus::Below | PriceStatus::Above)
    }
}

impl std::fmt::Display for PriceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceStatus::Below => write!(f, "below"),
            PriceStatus::Above => write!(f, "above"),
            PriceStatus::Equal => write!(f, "equal"),
            PriceStatus::Unknown => write!(f, "NA"),
        }
    }
}

#[must_use]
pub fn price_status(current: Option<f64>, benchmark: Option<f64>) -> PriceStatus {
    match (current, benchmark) {
        (Some(c), Some(b)) if c < b => PriceStatus::Below,
        (Some(c), Some(b)) if c > b => PriceStatus::Above,
        (Some(_), Some(_)) => PriceStatus::Equal,
        _ => PriceStatus::Unknown,
    }
}

/// In-memory copy of the `Benchmarks` tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl BenchmarkTable {
    /// Builds a table from raw sheet values (header first). An empty sheet
    /// gets a `Name` header followed by `platform_tabs`.
    #[must_use]
    pub fn from_values(mut values: Vec<Vec<String>>, platform_tabs: &[&str]) -> Self {
        if values.is_empty() || values[0].is_empty() {
            let header = std::iter::once("Name".to_string())
                .chain(platform_tabs.iter().map(|t| (*t).to_string()))
                .collect();
            return Self {
                header,
                rows: Vec::new(),
            };
        }
        let header = values.remove(0);
        let rows = values
            .into_iter()
            .filter(|r| r.first().is_some_and(|n| !n.is_empty()))
            .collect();
        Self { header, rows }
    }

    /// Header followed by rows, ready for a full-range rewrite.
    #[must_use]
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// Benchmark price for `name` on the platform tab `tab`, if set.
    #[must_use]
    pub fn benchmark(&self, name: &str, tab: &str) -> Option<f64> {
        let col = self.header.iter().position(|h| h == tab)?;
        let row = self.rows.iter().find(|r| r.first().is_some_and(|n| n == name))?;
        row.get(col).and_then(|cell| parse_price_cell(cell))
    }
}

/// Rebuilds the benchmark table from the product names currently listed on
/// each platform tab.
///
/// Output rows follow first-seen order across `names_by_tab`. Rows already
/// present keep their benchmark cells; new names get blank cells. Names no
/// longer listed on any tab are dropped.
#[must_use]
pub fn merge_benchmarks(
    existing: &BenchmarkTable,
    names_by_tab: &[(String, Vec<String>)],
) -> BenchmarkTable {
    let width = existing.header.len().max(1);
    let existing_rows: HashMap<&str, &Vec<String>> = existing
        .rows
        .iter()
        .filter_map(|r| r.first().map(|n| (n.as_str(), r)))
        .collect();

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for (_, names) in names_by_tab {
        for name in names {
            if name.is_empty() || !seen.insert(name.as_str()) {
                continue;
            }
            let mut row = existing_rows
                .get(name.as_str())
                .map_or_else(|| vec![name.clone()], |r| (*r).clone());
            if row.len() < width {
                row.resize(width, String::new());
            }
            rows.push(row);
        }
    }

    BenchmarkTable {
        header: existing.header.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| (*x).to_string()).collect()
    }

    fn table() -> BenchmarkTable {
        BenchmarkTable::from_values(
            vec![
                s(&["Name", "Blinkit", "Instamart", "Zepto"]),
                s(&["Pepe Trunk", "599", "", "649"]),
                s(&["Pepe Brief", "399", "399"]),
            ],
            &[],
        )
    }

    #[test]
    fn price_status_compares_against_benchmark() {
        assert_eq!(price_status(Some(500.0), Some(599.0)), PriceStatus::Below);
        assert_eq!(price_status(Some(700.0), Some(599.0)), PriceStatus::Above);
        assert_eq!(price_status(Some(599.0), Some(599.0)), PriceStatus::Equal);
        assert_eq!(price_status(None, Some(599.0)), PriceStatus::Unknown);
        assert_eq!(price_status(Some(599.0), None), PriceStatus::Unknown);
    }

    #[test]
    fn only_below_and_above_are_deviations() {
        assert!(PriceStatus::Below.is_deviation());
        assert!(PriceStatus::Above.is_deviation());
        assert!(!PriceStatus::Equal.is_deviation());
        assert!(!PriceStatus::Unknown.is_deviation());
    }

    #[test]
    fn empty_sheet_gets_default_header() {
        let t = BenchmarkTable::from_values(vec![], &["Blinkit", "Zepto"]);
        assert_eq!(t.header, s(&["Name", "Blinkit", "Zepto"]));
        assert!(t.rows.is_empty());
    }

    #[test]
    fn benchmark_lookup_by_name_and_tab() {
        let t = table();
        assert_eq!(t.benchmark("Pepe Trunk", "Zepto"), Some(649.0));
        assert_eq!(t.benchmark("Pepe Trunk", "Instamart"), None);
        assert_eq!(t.benchmark("Pepe Brief", "Zepto"), None);
        assert_eq!(t.benchmark("Unknown", "Blinkit"), None);
        assert_eq!(t.benchmark("Pepe Trunk", "Swiggy"), None);
    }

    #[test]
    fn merge_keeps_existing_values_and_adds_new_names() {
        let names = vec![
            ("Blinkit".to_string(), s(&["Pepe Brief", "Pepe Vest"])),
            ("Zepto".to_string(), s(&["Pepe Trunk", "Pepe Vest"])),
        ];
        let merged = merge_benchmarks(&table(), &names);
        assert_eq!(merged.header, table().header);
        assert_eq!(
            merged.rows,
            vec![
                s(&["Pepe Brief", "399", "399", ""]),
                s(&["Pepe Vest", "", "", ""]),
                s(&["Pepe Trunk", "599", "", "649"]),
            ]
        );
    }

    #[test]
    fn merge_drops_names_no_longer_listed() {
        let names = vec![("Blinkit".to_string(), s(&["Pepe Brief"]))];
        let merged = merge_benchmarks(&table(), &names);
        assert_eq!(merged.rows.len(), 1);
        assert_eq!(merged.rows[0][0], "Pepe Brief");
    }

    #[test]
    fn to_values_puts_header_first() {
        let values = table().to_values();
        assert_eq!(values[0][0], "Name");
        assert_eq!(values.len(), 3);
    }
}
