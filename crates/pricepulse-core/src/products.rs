use serde::{Deserialize, Serialize};

/// Placeholder written into any field whose value could not be resolved.
pub const SENTINEL: &str = "NA";

/// Fixed leading columns of every platform sheet and CSV artifact.
pub const OUTPUT_HEADER: [&str; 5] = ["name", "unit", "current_price", "original_price", "discount"];

/// Stock availability as rendered on the listing card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    /// Also the default when a platform renders no out-of-stock marker.
    #[default]
    InStock,
    OutOfStock,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "In Stock"),
            StockStatus::OutOfStock => write!(f, "Out of Stock"),
        }
    }
}

/// Optional trailing columns some platforms append after [`OUTPUT_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraColumn {
    Stock,
    Identity,
}

impl ExtraColumn {
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            ExtraColumn::Stock => "stock",
            ExtraColumn::Identity => "id",
        }
    }
}

/// One normalized product listing scraped from a storefront card.
///
/// Every field is always populated; unresolved values carry [`SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Platform-scoped dedup key: the card's DOM id, a collection-prefixed
    /// id, or the product name, depending on the platform's identity mode.
    /// Not stable across runs.
    pub identity: String,
    pub name: String,
    /// Pack size or variant text, e.g. `"Size: M"` or `"1 pc"`.
    pub unit: String,
    /// Digits-only selling price, e.g. `"1299"`.
    pub current_price: String,
    /// Digits-only list price (MRP).
    pub original_price: String,
    /// Either the page's own label (`"40% OFF"`) or one derived from the prices.
    pub discount: String,
    pub stock: StockStatus,
}

impl ProductRecord {
    /// Header row for a sheet/CSV with the given extra columns appended.
    #[must_use]
    pub fn header(extra: &[ExtraColumn]) -> Vec<String> {
        OUTPUT_HEADER
            .iter()
            .map(|h| (*h).to_string())
            .chain(extra.iter().map(|c| c.header().to_string()))
            .collect()
    }

    /// Row cells in [`Self::header`] order.
    #[must_use]
    pub fn to_row(&self, extra: &[ExtraColumn]) -> Vec<String> {
        let mut row = vec![
            self.name.clone(),
            self.unit.clone(),
            self.current_price.clone(),
            self.original_price.clone(),
            self.discount.clone(),
        ];
        row.extend(extra.iter().map(|c| match c {
            ExtraColumn::Stock => self.stock.to_string(),
            ExtraColumn::Identity => self.identity.clone(),
        }));
        row
    }
}

/// Parses a price cell as written to a sheet; `None` for the sentinel or junk.
#[must_use]
pub fn parse_price_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed == SENTINEL {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
