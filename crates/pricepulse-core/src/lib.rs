pub mod app_config;
pub mod benchmarks;
pub mod config;
pub mod platforms;
pub mod products;

pub use app_config::{AppConfig, Environment};
pub use benchmarks::{merge_benchmarks, price_status, BenchmarkTable, PriceStatus};
pub use config::{load_app_config, load_app_config_from_env};
pub use platforms::{
    load_platforms, parse_platforms, BrandFilter, CollectionSpec, DiscountPolicy, FieldSelectors,
    IdentityMode, MeasureStrategy, MissingOriginal, NoDiscount, PlatformConfig, PlatformsFile,
    ScrollConfig, ScrollMode, UnitPolicy, WaitRange,
};
pub use products::{parse_price_cell, ExtraColumn, ProductRecord, StockStatus, OUTPUT_HEADER, SENTINEL};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read platforms file {path}: {source}")]
    PlatformsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse platforms file: {0}")]
    PlatformsFileParse(#[from] serde_yaml::Error),

    #[error("platform config validation failed: {0}")]
    Validation(String),
}
