//! Per-platform extraction profiles loaded from `config/platforms.yaml`.
//!
//! Each storefront differs in markup, scroll behavior and pricing display.
//! Those differences live here as data so one extraction engine can serve
//! every platform.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::{ExtraColumn, SENTINEL};
use crate::ConfigError;

/// How a card's dedup key is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// The card element's `id` attribute.
    DomId,
    /// `<collection>_<id>`, for platforms that reuse ids across collections.
    CollectionScopedId,
    /// The resolved product name.
    Name,
}

/// Where brand filtering happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandFilter {
    /// The navigation target already encodes the brand filter.
    Query,
    /// The listing is a mixed catalog; keep names starting with the
    /// collection's brand token (case-insensitive).
    NamePrefix,
}

/// What the convergence loop measures to detect growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureStrategy {
    /// Scroll height of the container; suits reflow-driven lists.
    Height,
    /// Number of materialized cards; suits virtualized lists.
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    /// Scroll forward by `step_px`.
    Step,
    /// Jump straight to the container's max extent.
    ToEnd,
}

/// Inclusive wait range between scroll steps. `min_ms == max_ms` is a fixed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl WaitRange {
    #[must_use]
    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub measure: MeasureStrategy,
    pub mode: ScrollMode,
    /// Scroll container candidates, first match wins.
    pub containers: Vec<String>,
    #[serde(default = "default_step_px")]
    pub step_px: u32,
    pub wait: WaitRange,
    pub required_stable_iterations: u32,
    pub max_iterations: u32,
}

/// Ordered selector fallback chains per output field.
///
/// The first selector is the current markup; later entries are older or
/// alternate markup seen on the same platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelectors {
    pub name: Vec<String>,
    #[serde(default)]
    pub current_price: Vec<String>,
    #[serde(default)]
    pub original_price: Vec<String>,
    /// Rendered discount label. Empty means the discount is always derived.
    #[serde(default)]
    pub discount: Vec<String>,
    #[serde(default)]
    pub unit: Vec<String>,
    /// Out-of-stock marker element. Empty means stock is never inspected.
    #[serde(default)]
    pub stock: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPolicy {
    /// When non-empty, unit text is kept only if it contains one of these
    /// tokens (case-insensitive); otherwise it is treated as unresolved.
    #[serde(default)]
    pub lexicon: Vec<String>,
    /// Value used when the unit cannot be resolved.
    #[serde(default = "default_sentinel")]
    pub default: String,
}

impl Default for UnitPolicy {
    fn default() -> Self {
        Self {
            lexicon: Vec::new(),
            default: default_sentinel(),
        }
    }
}

/// What a derived discount reads when there is no markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDiscount {
    /// `"NA"`
    Na,
    /// `"0% OFF"` (or `"0"` + the configured suffix)
    ZeroPercent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountPolicy {
    pub no_discount: NoDiscount,
    /// Appended to derived percentages, e.g. `"% OFF"` or `"%"`.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Use the page's own discount label verbatim when one is rendered.
    #[serde(default = "default_true")]
    pub prefer_source_label: bool,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            no_discount: NoDiscount::Na,
            suffix: default_suffix(),
            prefer_source_label: true,
        }
    }
}

/// What `original_price` becomes when the card shows no list price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingOriginal {
    /// Assume no markdown: list price equals selling price.
    UseCurrent,
    Sentinel,
}

/// A platform-side filtered listing to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Display name, also the prefix for collection-scoped identities.
    pub name: String,
    /// Navigation target (URL with any filter encoding).
    pub target: String,
    /// Required for [`BrandFilter::NamePrefix`] platforms.
    #[serde(default)]
    pub brand_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    /// Spreadsheet holding this platform's tab. Unset means the configured
    /// default spreadsheet.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Spreadsheet tab receiving this platform's rows.
    pub sheet: String,
    /// CSV artifact file name, relative to the output directory.
    pub output_file: String,
    /// Page opened first to set the delivery location.
    #[serde(default)]
    pub home_url: Option<String>,
    /// Candidate inputs for the delivery pincode, tried in order.
    #[serde(default)]
    pub location_inputs: Vec<String>,
    pub card_selector: String,
    /// Element signalling the listing has rendered. Defaults to `card_selector`.
    #[serde(default)]
    pub ready_selector: Option<String>,
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    /// Pause after navigation before the first measurement.
    #[serde(default)]
    pub settle_ms: u64,
    pub identity: IdentityMode,
    pub brand_filter: BrandFilter,
    pub scroll: ScrollConfig,
    pub fields: FieldSelectors,
    #[serde(default)]
    pub unit: UnitPolicy,
    #[serde(default)]
    pub discount: DiscountPolicy,
    pub missing_original: MissingOriginal,
    /// Case-insensitive text that marks a card as out of stock.
    #[serde(default = "default_stock_marker")]
    pub stock_marker: String,
    #[serde(default)]
    pub extra_columns: Vec<ExtraColumn>,
    pub collections: Vec<CollectionSpec>,
}

impl PlatformConfig {
    #[must_use]
    pub fn ready_selector(&self) -> &str {
        self.ready_selector.as_deref().unwrap_or(&self.card_selector)
    }

    /// The platform's own spreadsheet, falling back to `default`.
    #[must_use]
    pub fn spreadsheet<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.spreadsheet_id.as_deref().or(default)
    }

    /// `A1` range covering the whole tab, used for clears.
    #[must_use]
    pub fn sheet_clear_range(&self) -> String {
        format!("{}!A1:Z", self.sheet)
    }

    /// `A1` anchor for full rewrites.
    #[must_use]
    pub fn sheet_write_range(&self) -> String {
        format!("{}!A1", self.sheet)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsFile {
    pub platforms: Vec<PlatformConfig>,
}

impl PlatformsFile {
    /// Looks up a platform by name, ignoring case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PlatformConfig> {
        self.platforms
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

fn default_step_px() -> u32 {
    800
}

fn default_sentinel() -> String {
    SENTINEL.to_string()
}

fn default_suffix() -> String {
    "% OFF".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ready_timeout_ms() -> u64 {
    30_000
}

fn default_stock_marker() -> String {
    "out of stock".to_string()
}

/// Load and validate the platform configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_platforms(path: &Path) -> Result<PlatformsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlatformsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_platforms(&content)
}

/// Parse and validate platform configuration from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_platforms(yaml: &str) -> Result<PlatformsFile, ConfigError> {
    let file: PlatformsFile = serde_yaml::from_str(yaml)?;
    validate_platforms(&file)?;
    Ok(file)
}

fn validate_platforms(file: &PlatformsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_tabs = HashSet::new();

    for platform in &file.platforms {
        let name = platform.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "platform name must be non-empty".to_string(),
            ));
        }
        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform name: '{name}'"
            )));
        }
        if platform.sheet.trim().is_empty() || platform.output_file.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' needs both a sheet and an output_file"
            )));
        }
        if platform
            .spreadsheet_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' has a blank spreadsheet_id"
            )));
        }
        // Tabs are keyed per spreadsheet; `None` stands for the default one.
        if !seen_tabs.insert((platform.spreadsheet_id.clone(), platform.sheet.to_lowercase())) {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' writes to tab '{}' already used by another platform in the same spreadsheet",
                platform.sheet
            )));
        }
        if platform.card_selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' has an empty card_selector"
            )));
        }
        if platform.fields.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' has no name selectors"
            )));
        }
        validate_scroll(name, &platform.scroll)?;
        validate_collections(platform)?;
    }

    Ok(())
}

fn validate_scroll(platform: &str, scroll: &ScrollConfig) -> Result<(), ConfigError> {
    if scroll.containers.is_empty() {
        return Err(ConfigError::Validation(format!(
            "platform '{platform}' has no scroll containers"
        )));
    }
    if scroll.required_stable_iterations == 0 {
        return Err(ConfigError::Validation(format!(
            "platform '{platform}': required_stable_iterations must be at least 1"
        )));
    }
    // The first measurement only sets the baseline, so convergence needs one extra pass.
    if scroll.max_iterations <= scroll.required_stable_iterations {
        return Err(ConfigError::Validation(format!(
            "platform '{platform}': max_iterations ({}) must exceed required_stable_iterations ({})",
            scroll.max_iterations, scroll.required_stable_iterations
        )));
    }
    if scroll.wait.min_ms > scroll.wait.max_ms {
        return Err(ConfigError::Validation(format!(
            "platform '{platform}': wait.min_ms exceeds wait.max_ms"
        )));
    }
    if scroll.mode == ScrollMode::Step && scroll.step_px == 0 {
        return Err(ConfigError::Validation(format!(
            "platform '{platform}': step scrolling needs a non-zero step_px"
        )));
    }
    Ok(())
}

fn validate_collections(platform: &PlatformConfig) -> Result<(), ConfigError> {
    let name = platform.name.trim();
    if platform.collections.is_empty() {
        return Err(ConfigError::Validation(format!(
            "platform '{name}' declares no collections"
        )));
    }

    let mut seen = HashSet::new();
    for collection in &platform.collections {
        if collection.name.trim().is_empty() || collection.target.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' has a collection without a name or target"
            )));
        }
        if !seen.insert(collection.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' has duplicate collection '{}'",
                collection.name
            )));
        }
        let has_token = collection
            .brand_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if platform.brand_filter == BrandFilter::NamePrefix && !has_token {
            return Err(ConfigError::Validation(format!(
                "platform '{name}' filters by name prefix but collection '{}' has no brand_token",
                collection.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "platforms_test.rs"]
mod tests;
