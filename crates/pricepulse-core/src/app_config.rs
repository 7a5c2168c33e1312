use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub platforms_path: PathBuf,
    /// Postal/area code used to localize storefront pricing.
    pub location: String,
    pub output_dir: PathBuf,
    pub spreadsheet_id: Option<String>,
    pub sheets_access_token: Option<String>,
    pub sheets_base_url: String,
    pub request_timeout_secs: u64,
    pub navigation_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub run_budget_secs: u64,
    pub user_agent: String,
}

impl AppConfig {
    /// Returns `true` when both a spreadsheet id and an access token are set.
    #[must_use]
    pub fn sheets_enabled(&self) -> bool {
        self.spreadsheet_id.is_some() && self.sheets_access_token.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("platforms_path", &self.platforms_path)
            .field("location", &self.location)
            .field("output_dir", &self.output_dir)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field(
                "sheets_access_token",
                &self.sheets_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("sheets_base_url", &self.sheets_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("navigation_retries", &self.navigation_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("run_budget_secs", &self.run_budget_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
