pub mod aggregate;
#[cfg(feature = "chrome")]
pub mod chrome;
pub mod error;
pub mod export;
pub mod extract;
pub mod html_page;
pub mod normalize;
pub mod page;
pub mod retry;
pub mod scroll;
pub mod selectors;

pub use aggregate::{
    open_session, AggregateReport, Aggregator, CollectionOutcome, CollectionStatus, RunSettings,
};
#[cfg(feature = "chrome")]
pub use chrome::ChromePage;
pub use error::ScraperError;
pub use export::{write_csv, write_csv_file};
pub use extract::{CardExtractor, PlatformProfile};
pub use html_page::HtmlPage;
pub use normalize::{calculate_discount, clean_price};
pub use page::{CardSnapshot, Page, ScrollStep};
pub use retry::RetryPolicy;
pub use scroll::{converge_scroll, ConvergenceReport, ScrollState};
pub use selectors::SelectorChain;
