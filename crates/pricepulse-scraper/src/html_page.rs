//! A [`Page`] over pre-rendered HTML documents.
//!
//! Used for offline runs against saved listings and as the test double for
//! the convergence engine and aggregator. Scrolling never loads anything, so
//! measurements are stable from the first pass.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use scraper::{ElementRef, Html};

use crate::error::ScraperError;
use crate::page::{CardSnapshot, Page, ScrollStep};
use crate::selectors::compile_one;

#[derive(Clone, Debug, Default)]
pub struct HtmlPage {
    documents: HashMap<String, String>,
    current: Option<Html>,
    location: Option<String>,
}

impl HtmlPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the document served when `target` is navigated to.
    #[must_use]
    pub fn with_document(mut self, target: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(target, html);
        self
    }

    pub fn insert(&mut self, target: impl Into<String>, html: impl Into<String>) {
        self.documents.insert(target.into(), html.into());
    }

    /// Registers a document read from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Io`] if the file cannot be read.
    pub fn insert_file(&mut self, target: impl Into<String>, path: &Path) -> Result<(), ScraperError> {
        let html = std::fs::read_to_string(path).map_err(|source| ScraperError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.insert(target, html);
        Ok(())
    }

    /// The pincode most recently applied through [`Page::set_location`].
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn first_match<'a>(doc: &'a Html, selectors: &[String]) -> Result<Option<ElementRef<'a>>, ScraperError> {
        for source in selectors {
            let selector = compile_one(source)?;
            if let Some(element) = doc.select(&selector).next() {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

impl Page for HtmlPage {
    async fn set_location(&mut self, location: &str, inputs: &[String]) -> Result<bool, ScraperError> {
        let found = match &self.current {
            Some(doc) => Self::first_match(doc, inputs)?.is_some(),
            None => false,
        };
        self.location = Some(location.to_string());
        Ok(found)
    }

    async fn navigate(&mut self, target: &str) -> Result<(), ScraperError> {
        let html = self
            .documents
            .get(target)
            .ok_or_else(|| ScraperError::Navigation {
                target: target.to_string(),
                reason: "no document registered for target".to_string(),
            })?;
        self.current = Some(Html::parse_document(html));
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool, ScraperError> {
        let selector = compile_one(selector)?;
        Ok(self
            .current
            .as_ref()
            .is_some_and(|doc| doc.select(&selector).next().is_some()))
    }

    async fn scroll_height(&mut self, containers: &[String]) -> Result<u64, ScraperError> {
        let Some(doc) = &self.current else {
            return Ok(0);
        };
        let Some(container) = Self::first_match(doc, containers)? else {
            return Ok(0);
        };
        // Element count stands in for pixel height in a document that never lays out.
        let elements = container
            .descendants()
            .filter(|node| node.value().is_element())
            .count();
        Ok(u64::try_from(elements).unwrap_or(u64::MAX))
    }

    async fn count(&mut self, selector: &str) -> Result<usize, ScraperError> {
        let selector = compile_one(selector)?;
        Ok(self
            .current
            .as_ref()
            .map_or(0, |doc| doc.select(&selector).count()))
    }

    async fn scroll(&mut self, containers: &[String], _step: ScrollStep) -> Result<bool, ScraperError> {
        match &self.current {
            Some(doc) => Ok(Self::first_match(doc, containers)?.is_some()),
            None => Ok(false),
        }
    }

    async fn snapshot_cards(&mut self, selector: &str) -> Result<Vec<CardSnapshot>, ScraperError> {
        let selector = compile_one(selector)?;
        let Some(doc) = &self.current else {
            return Ok(Vec::new());
        };
        Ok(doc
            .select(&selector)
            .map(|card| CardSnapshot {
                dom_id: card.value().id().map(str::to_string),
                html: card.html(),
            })
            .collect())
    }
}
