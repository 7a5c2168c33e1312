pub mod client;
pub mod error;
pub mod memory;
pub(crate) mod retry;
pub mod store;

pub use client::SheetsClient;
pub use error::SheetsError;
pub use memory::MemoryStore;
pub use store::{replace_rows, RowStore};
