//! Ordered CSS selector fallback chains.

use scraper::{ElementRef, Selector};

use crate::error::ScraperError;

/// Candidate selectors for one field, tried in order.
///
/// Storefront markup drifts, so a field carries the current selector first and
/// older ones behind it. Resolution is a first-match walk, never a merge.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    candidates: Vec<(String, Selector)>,
}

impl SelectorChain {
    /// Compiles every candidate up front.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first candidate that
    /// is not valid CSS.
    pub fn compile(sources: &[String]) -> Result<Self, ScraperError> {
        let candidates = sources
            .iter()
            .map(|source| compile_one(source).map(|sel| (source.clone(), sel)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { candidates })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Text of the first candidate whose first match under `root` has
    /// non-empty text. Whitespace runs collapse to single spaces.
    #[must_use]
    pub fn resolve_text(&self, root: ElementRef<'_>) -> Option<String> {
        self.candidates.iter().find_map(|(_, selector)| {
            root.select(selector)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty())
        })
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|(source, _)| source.as_str())
    }
}

/// Compiles a single selector, mapping the parser error into ours.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] when `source` is not valid CSS.
pub fn compile_one(source: &str) -> Result<Selector, ScraperError> {
    Selector::parse(source).map_err(|e| ScraperError::InvalidSelector {
        selector: source.to_string(),
        reason: e.to_string(),
    })
}

/// Visible text of an element with whitespace normalized.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
