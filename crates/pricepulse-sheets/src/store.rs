//! The row-store seam between the pipeline and the spreadsheet backend.

use crate::error::SheetsError;

/// A tabular destination addressed by A1 ranges (`"Blinkit!A1:Z"`).
#[allow(async_fn_in_trait)]
pub trait RowStore {
    /// Clears every value inside `range`.
    async fn clear(&self, range: &str) -> Result<(), SheetsError>;

    /// Writes `rows` starting at the top-left cell of `range`.
    async fn write_rows(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError>;

    /// Reads `range` as strings. Trailing empty cells are omitted per row.
    async fn read_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError>;
}

/// Replaces a tab's contents: clears `clear_range`, then writes `rows` at
/// `write_range`.
///
/// # Errors
///
/// Returns the store's error from whichever step failed. A failed write
/// leaves the tab cleared.
pub async fn replace_rows<S: RowStore>(
    store: &S,
    clear_range: &str,
    write_range: &str,
    rows: &[Vec<String>],
) -> Result<(), SheetsError> {
    store.clear(clear_range).await?;
    store.write_rows(write_range, rows).await?;
    tracing::info!(range = write_range, rows = rows.len(), "sheet rows replaced");
    Ok(())
}
