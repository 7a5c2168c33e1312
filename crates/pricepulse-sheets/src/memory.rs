//! In-process [`RowStore`] keyed by tab name.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::SheetsError;
use crate::store::RowStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tabs: Mutex<HashMap<String, Vec<Vec<String>>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a tab with existing rows.
    #[must_use]
    pub fn with_tab(self, tab: &str, rows: Vec<Vec<String>>) -> Self {
        self.lock().insert(tab.to_string(), rows);
        self
    }

    /// Current rows of `tab`; empty when the tab has never been written.
    #[must_use]
    pub fn rows(&self, tab: &str) -> Vec<Vec<String>> {
        self.lock().get(tab).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Vec<String>>>> {
        self.tabs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tab name of an A1 range: `"'My Tab'!A1:Z"` → `"My Tab"`.
fn tab_of(range: &str) -> &str {
    let tab = range.split_once('!').map_or(range, |(tab, _)| tab);
    tab.trim_matches('\'')
}

impl RowStore for MemoryStore {
    async fn clear(&self, range: &str) -> Result<(), SheetsError> {
        self.lock().remove(tab_of(range));
        Ok(())
    }

    async fn write_rows(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        let mut tabs = self.lock();
        let existing = tabs.entry(tab_of(range).to_string()).or_default();
        for (i, row) in rows.iter().enumerate() {
            if i < existing.len() {
                existing[i].clone_from(row);
            } else {
                existing.push(row.clone());
            }
        }
        Ok(())
    }

    async fn read_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        Ok(self.rows(tab_of(range)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::replace_rows;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn tab_of_strips_quotes_and_cells() {
        assert_eq!(tab_of("Blinkit!A1:Z"), "Blinkit");
        assert_eq!(tab_of("'Chumbak Blinkit'!A1"), "Chumbak Blinkit");
        assert_eq!(tab_of("Benchmarks"), "Benchmarks");
    }

    #[tokio::test]
    async fn replace_discards_previous_rows() {
        let store = MemoryStore::new().with_tab(
            "Zepto",
            vec![row(&["name"]), row(&["old 1"]), row(&["old 2"])],
        );
        replace_rows(&store, "Zepto!A1:Z", "Zepto!A1", &[row(&["name"]), row(&["new"])])
            .await
            .unwrap();
        assert_eq!(store.rows("Zepto"), vec![row(&["name"]), row(&["new"])]);
    }

    #[tokio::test]
    async fn write_without_clear_overlays_rows() {
        let store = MemoryStore::new().with_tab("T", vec![row(&["a"]), row(&["b"])]);
        store.write_rows("T!A1", &[row(&["c"])]).await.unwrap();
        assert_eq!(store.read_rows("T!A1:Z").await.unwrap(), vec![row(&["c"]), row(&["b"])]);
    }
}
