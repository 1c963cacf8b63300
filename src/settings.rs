use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_BATCH_SIZE, DEFAULT_ROW_GROUP_SIZE,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Environment variables with this prefix override file values,
/// e.g. `METAR_CLEANER__MAX_WORKERS=4`.
pub const ENV_PREFIX: &str = "METAR_CLEANER";

const COMPRESSIONS: [&str; 5] = [
    COMPRESSION_SNAPPY,
    COMPRESSION_GZIP,
    COMPRESSION_LZ4,
    COMPRESSION_ZSTD,
    COMPRESSION_NONE,
];

/// Output and resource settings. Cleaning thresholds are fixed and not part of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub compression: String,

    #[validate(range(min = 1))]
    pub row_group_size: usize,

    #[validate(range(min = 1))]
    pub batch_size: usize,

    #[validate(range(min = 1, max = 1024))]
    pub max_workers: usize,
}

impl AppConfig {
    /// Defaults, then the optional TOML file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("compression", COMPRESSION_SNAPPY)?
            .set_default("row_group_size", DEFAULT_ROW_GROUP_SIZE as i64)?
            .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
            .set_default("max_workers", num_cpus::get() as i64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.check()?;
        Ok(settings)
    }

    pub fn with_compression(mut self, compression: Option<String>) -> Self {
        if let Some(compression) = compression {
            self.compression = compression;
        }
        self
    }

    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        if let Some(max_workers) = max_workers {
            self.max_workers = max_workers;
        }
        self
    }

    /// Range checks plus the compression name.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        let compression = self.compression.to_lowercase();
        if !COMPRESSIONS.contains(&compression.as_str()) {
            return Err(ProcessingError::Config(format!(
                "Unsupported compression '{}' (expected one of: {})",
                self.compression,
                COMPRESSIONS.join(", ")
            )));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            compression: COMPRESSION_SNAPPY.to_string(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: num_cpus::get(),
        }
    }
}
