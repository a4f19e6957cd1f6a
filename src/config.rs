//! Tool configuration.
//!
//! Handles loading, validating, and merging `image-handle.toml`. Stock
//! defaults are the base layer; a user file overrides just the keys it sets.
//!
//! ## Config File Location
//!
//! The CLI reads `image-handle.toml` from the working directory, or the file
//! passed with `--config`. Library users construct [`Config`] directly.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [image]
//! quality = 85              # Default JPEG quality (0-100)
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [limits]
//! max_alloc_mb = 1024       # Decode and resize allocation cap in MiB
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, ResizeFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "image-handle.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `image-handle.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Encode defaults.
    pub image: ImageConfig,
    /// Resampling settings.
    pub resize: ResizeConfig,
    /// Memory limits for decoding and resizing.
    pub limits: LimitsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Quality::new(i64::from(self.image.quality)).is_none() {
            return Err(ConfigError::Validation(
                "image.quality must be 0-100".into(),
            ));
        }
        if self.limits.max_alloc_mb == 0 {
            return Err(ConfigError::Validation(
                "limits.max_alloc_mb must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The configured default quality as a validated value.
    pub fn default_quality(&self) -> Quality {
        Quality::new(i64::from(self.image.quality)).unwrap_or_default()
    }
}

/// Encode defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// JPEG quality applied when a command does not pass `--quality`.
    pub quality: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            quality: u32::from(Quality::default().value()),
        }
    }
}

/// Resampling settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResizeFilter,
}

/// Memory limits for decoding and resizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest allocation a single decode or resize may make, in MiB.
    pub max_alloc_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_alloc_mb: 1024 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from an explicit file, or `image-handle.toml` in `dir`.
///
/// An explicit path must exist; the implicit one is optional. Merges user
/// values on top of stock defaults, rejects unknown keys, and validates the
/// result.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(&dir.join(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-handle Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The CLI reads image-handle.toml from the working directory, or the file
# given with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[image]
# JPEG quality when --quality is not given (0 = worst, 100 = best).
# PNG output is lossless and ignores this.
quality = 85

# ---------------------------------------------------------------------------
# Resizing
# ---------------------------------------------------------------------------
[resize]
# Resampling filter: nearest, triangle, catmull-rom, gaussian or lanczos3.
filter = "lanczos3"

# ---------------------------------------------------------------------------
# Memory limits
# ---------------------------------------------------------------------------
[limits]
# Largest allocation a single decode or resize may make, in MiB. Images
# that need more fail to load, or fail to save, with a resource error.
max_alloc_mb = 1024

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of images converted in parallel by `batch`.
# Omit to use all available CPU cores. Larger values are clamped down.
# max_processes = 4
"##
}
