//! Card extraction: one rendered product card into one [`ProductRecord`].
//!
//! A platform's selector lists are compiled once into a [`CardExtractor`].
//! Extraction never fails; fields that cannot be resolved carry the sentinel,
//! and only a card without a resolvable name is dropped.

use pricepulse_core::{
    BrandFilter, CollectionSpec, DiscountPolicy, IdentityMode, MissingOriginal, PlatformConfig,
    ProductRecord, StockStatus, UnitPolicy,
};
use scraper::{ElementRef, Html};

use crate::error::ScraperError;
use crate::normalize::{accept_unit, clean_price, matches_brand, resolve_discount, resolve_original};
use crate::page::CardSnapshot;
use crate::selectors::{compile_one, SelectorChain};

#[derive(Debug, Clone)]
pub struct CardExtractor {
    identity: IdentityMode,
    brand_filter: BrandFilter,
    name: SelectorChain,
    current_price: SelectorChain,
    original_price: SelectorChain,
    discount: SelectorChain,
    unit: SelectorChain,
    stock: SelectorChain,
    unit_policy: UnitPolicy,
    discount_policy: DiscountPolicy,
    missing_original: MissingOriginal,
    stock_marker: String,
}

impl CardExtractor {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if any field selector fails
    /// to compile.
    pub fn compile(config: &PlatformConfig) -> Result<Self, ScraperError> {
        let fields = &config.fields;
        Ok(Self {
            identity: config.identity,
            brand_filter: config.brand_filter,
            name: SelectorChain::compile(&fields.name)?,
            current_price: SelectorChain::compile(&fields.current_price)?,
            original_price: SelectorChain::compile(&fields.original_price)?,
            discount: SelectorChain::compile(&fields.discount)?,
            unit: SelectorChain::compile(&fields.unit)?,
            stock: SelectorChain::compile(&fields.stock)?,
            unit_policy: config.unit.clone(),
            discount_policy: config.discount.clone(),
            missing_original: config.missing_original,
            stock_marker: config.stock_marker.to_lowercase(),
        })
    }

    /// Extracts one card, or `None` when it has no name or belongs to another
    /// brand.
    #[must_use]
    pub fn extract_card(
        &self,
        card: &CardSnapshot,
        collection: &CollectionSpec,
    ) -> Option<ProductRecord> {
        let fragment = Html::parse_fragment(&card.html);
        let root = fragment.root_element();
        // The fragment is wrapped in a synthetic <html>; fields are looked up
        // beneath the card element itself.
        let element = root.children().find_map(ElementRef::wrap).unwrap_or(root);

        let Some(name) = self.name.resolve_text(element) else {
            tracing::debug!(
                dom_id = card.dom_id.as_deref().unwrap_or(""),
                selectors = ?self.name.sources().collect::<Vec<_>>(),
                "card has no resolvable name; skipping"
            );
            return None;
        };

        if self.brand_filter == BrandFilter::NamePrefix {
            if let Some(token) = collection.brand_token.as_deref() {
                if !matches_brand(&name, token) {
                    tracing::debug!(name = %name, token, "card outside brand; skipping");
                    return None;
                }
            }
        }

        let current_price = clean_price(&self.current_price.resolve_text(element).unwrap_or_default());
        let original_raw = self.original_price.resolve_text(element);
        let original_price =
            resolve_original(original_raw.as_deref(), &current_price, self.missing_original);
        let label = self.discount.resolve_text(element);
        let discount = resolve_discount(
            label.as_deref(),
            &current_price,
            &original_price,
            &self.discount_policy,
        );
        let unit = accept_unit(self.unit.resolve_text(element).as_deref(), &self.unit_policy);

        Some(ProductRecord {
            identity: self.identity_for(card, &name, collection),
            name,
            unit,
            current_price,
            original_price,
            discount,
            stock: self.stock_status(element),
        })
    }

    fn identity_for(
        &self,
        card: &CardSnapshot,
        name: &str,
        collection: &CollectionSpec,
    ) -> String {
        let dom_id = card.dom_id.as_deref().filter(|id| !id.is_empty());
        match self.identity {
            IdentityMode::DomId => dom_id.unwrap_or(name).to_string(),
            IdentityMode::CollectionScopedId => {
                format!("{}_{}", collection.name, dom_id.unwrap_or(name))
            }
            IdentityMode::Name => name.to_string(),
        }
    }

    fn stock_status(&self, element: ElementRef<'_>) -> StockStatus {
        if self.stock.is_empty() {
            return StockStatus::InStock;
        }
        match self.stock.resolve_text(element) {
            Some(text) if text.to_lowercase().contains(&self.stock_marker) => {
                StockStatus::OutOfStock
            }
            _ => StockStatus::InStock,
        }
    }
}

/// A platform's configuration with every selector compiled.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub config: PlatformConfig,
    pub extractor: CardExtractor,
}

impl PlatformProfile {
    /// Compiles the card, ready, container and location selectors along with
    /// the field chains, so a bad selector fails the platform before any
    /// navigation happens.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] naming the first bad selector.
    pub fn compile(config: PlatformConfig) -> Result<Self, ScraperError> {
        compile_one(&config.card_selector)?;
        compile_one(config.ready_selector())?;
        for selector in config
            .scroll
            .containers
            .iter()
            .chain(config.location_inputs.iter())
        {
            compile_one(selector)?;
        }
        let extractor = CardExtractor::compile(&config)?;
        Ok(Self { config, extractor })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
