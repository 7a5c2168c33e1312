use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// A required container or element is absent; the markup has changed.
    #[error("structural mismatch: {what}")]
    StructuralMismatch { what: String },

    /// Expected content never appeared within the wait budget.
    #[error("timed out after {waited_ms}ms waiting for \"{selector}\" on {target}")]
    LoadTimeout {
        target: String,
        selector: String,
        waited_ms: u64,
    },

    #[error("navigation to {target} failed: {reason}")]
    Navigation { target: String, reason: String },

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The page backend itself failed (browser crashed, script error).
    #[error("browser error: {0}")]
    Browser(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
