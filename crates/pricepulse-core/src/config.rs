use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values are treated the same as unset.
    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("PRICEPULSE_ENV", "development"))?;
    let log_level = or_default("PRICEPULSE_LOG_LEVEL", "info");
    let platforms_path = PathBuf::from(or_default(
        "PRICEPULSE_PLATFORMS_PATH",
        "./config/platforms.yaml",
    ));

    let location = or_default("PRICEPULSE_LOCATION", "560012");
    if location.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRICEPULSE_LOCATION".to_string(),
            reason: "location must be non-empty".to_string(),
        });
    }

    let output_dir = PathBuf::from(or_default("PRICEPULSE_OUTPUT_DIR", "./output"));
    let spreadsheet_id = optional("PRICEPULSE_SPREADSHEET_ID");
    let sheets_access_token = optional("PRICEPULSE_SHEETS_ACCESS_TOKEN");
    let sheets_base_url = or_default(
        "PRICEPULSE_SHEETS_BASE_URL",
        "https://sheets.googleapis.com",
    );

    let request_timeout_secs = parse_u64("PRICEPULSE_REQUEST_TIMEOUT_SECS", "30")?;
    let navigation_retries = parse_u32("PRICEPULSE_NAVIGATION_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("PRICEPULSE_RETRY_BACKOFF_BASE_MS", "2000")?;
    let run_budget_secs = parse_u64("PRICEPULSE_RUN_BUDGET_SECS", "300")?;
    let user_agent = or_default("PRICEPULSE_USER_AGENT", DEFAULT_USER_AGENT);

    Ok(AppConfig {
        env,
        log_level,
        platforms_path,
        location,
        output_dir,
        spreadsheet_id,
        sheets_access_token,
        sheets_base_url,
        request_timeout_secs,
        navigation_retries,
        retry_backoff_base_ms,
        run_budget_secs,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRICEPULSE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
