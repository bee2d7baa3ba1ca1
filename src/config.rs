//! Run configuration.
//!
//! Handles loading, validating, and merging `print-pad.toml` files.
//! Configuration is layered: stock defaults are overridden by a config file,
//! which is overridden by command-line flags.
//!
//! ## Config File Location
//!
//! `print-pad.toml` is picked up from the input folder, so a folder of scans
//! can carry its own print settings:
//!
//! ```text
//! scans/
//! ├── print-pad.toml     # Overrides stock defaults for this folder
//! ├── IMG_0001.jpg
//! └── IMG_0002.tif
//! ```
//!
//! `--config <path>` replaces the folder lookup with an explicit file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! ratio = "2:3"                  # "short:long" or "even"
//! border_percent = 0.0           # Outer border, percent of the padded canvas
//! background = "#ffffff"         # Padding and border color
//! preserve_extra_metadata = true # Keep EXIF and DPI (ICC is always kept)
//!
//! [output]
//! suffix = "_padded"             # IMG_0001.jpg -> IMG_0001_padded.jpg
//! on_conflict = "ask"            # ask | overwrite | skip | abort
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::BackgroundColor;
use crate::types::{PadSettings, RatioSetting};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the input folder.
pub const CONFIG_FILE_NAME: &str = "print-pad.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `print-pad.toml`.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PadConfig {
    /// Target print shape, or `even` for border only.
    pub ratio: RatioSetting,
    /// Border in percent of the padded canvas. Converted to a fraction for
    /// the compositor.
    pub border_percent: f64,
    /// Fill color as `#rrggbb`.
    pub background: String,
    /// Keep EXIF and DPI in the output.
    pub preserve_extra_metadata: bool,
    /// Output naming and conflict handling.
    pub output: OutputConfig,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            ratio: RatioSetting::default(),
            border_percent: 0.0,
            background: BackgroundColor::WHITE.to_string(),
            preserve_extra_metadata: true,
            output: OutputConfig::default(),
        }
    }
}

impl PadConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.border_percent.is_finite() || self.border_percent < 0.0 {
            return Err(ConfigError::Validation(
                "border_percent must be a number >= 0".into(),
            ));
        }
        if let Err(e) = self.ratio.padding() {
            return Err(ConfigError::Validation(format!("ratio: {e}")));
        }
        self.background_color()?;
        let suffix = &self.output.suffix;
        if suffix.is_empty() {
            return Err(ConfigError::Validation(
                "output.suffix must not be empty".into(),
            ));
        }
        if suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.suffix must not contain path separators".into(),
            ));
        }
        Ok(())
    }

    pub fn background_color(&self) -> Result<BackgroundColor, ConfigError> {
        self.background
            .parse()
            .map_err(|e| ConfigError::Validation(format!("background: {e}")))
    }

    /// The per-image settings this config describes.
    pub fn pad_settings(&self) -> Result<PadSettings, ConfigError> {
        Ok(PadSettings {
            ratio: self.ratio,
            border: self.border_percent / 100.0,
            background: self.background_color()?,
            preserve_extra_metadata: self.preserve_extra_metadata,
        })
    }
}

/// Output naming and conflict settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Appended to the file stem, before the extension.
    pub suffix: String,
    /// What to do when the output file already exists.
    pub on_conflict: ConflictPolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "_padded".to_string(),
            on_conflict: ConflictPolicy::Ask,
        }
    }
}

/// Configured answer to "the output file already exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Prompt on the terminal for each conflict.
    Ask,
    Overwrite,
    Skip,
    /// Stop the whole batch at the first conflict.
    Abort,
}

/// Values given on the command line. `None` leaves the config value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub ratio: Option<String>,
    pub border_percent: Option<f64>,
    pub background: Option<String>,
    pub preserve_extra_metadata: Option<bool>,
    pub suffix: Option<String>,
    pub on_conflict: Option<String>,
}

impl ConfigOverrides {
    /// The overrides as a sparse TOML table, ready for [`merge_toml`].
    pub fn to_toml(&self) -> toml::Value {
        let mut root = toml::Table::new();
        if let Some(ratio) = &self.ratio {
            root.insert("ratio".into(), toml::Value::String(ratio.clone()));
        }
        if let Some(border) = self.border_percent {
            root.insert("border_percent".into(), toml::Value::Float(border));
        }
        if let Some(background) = &self.background {
            root.insert("background".into(), toml::Value::String(background.clone()));
        }
        if let Some(preserve) = self.preserve_extra_metadata {
            root.insert("preserve_extra_metadata".into(), toml::Value::Boolean(preserve));
        }

        let mut output = toml::Table::new();
        if let Some(suffix) = &self.suffix {
            output.insert("suffix".into(), toml::Value::String(suffix.clone()));
        }
        if let Some(policy) = &self.on_conflict {
            output.insert("on_conflict".into(), toml::Value::String(policy.clone()));
        }
        if !output.is_empty() {
            root.insert("output".into(), toml::Value::Table(output));
        }
        toml::Value::Table(root)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PadConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
pub fn read_raw_config(file: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(file)?;
    Ok(toml::from_str(&content)?)
}

/// Load `print-pad.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `print-pad.toml`.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_raw_config(&config_path).map(Some)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<PadConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: PadConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Resolve the run configuration.
///
/// Layers, lowest first: stock defaults, the config file (`explicit` if
/// given, which must exist, otherwise `print-pad.toml` in `input_dir` if
/// present), then `overrides`.
pub fn load_config(
    input_dir: &Path,
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<PadConfig, ConfigError> {
    let file_layer = match explicit {
        Some(file) => Some(read_raw_config(file)?),
        None => load_raw_config(input_dir)?,
    };
    let overlays = file_layer.into_iter().chain([overrides.to_toml()]);
    resolve_config(stock_defaults_value(), overlays)
}

/// Returns a fully-commented stock `print-pad.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# print-pad Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Put this file in the input folder as print-pad.toml, or pass it with
# --config. Command-line flags override values from the file.
# Unknown keys will cause an error.

# Target print shape as "short:long". The shorter term always comes first;
# the orientation of each photo decides which side grows.
# Common choices: "2:3" (4x6, 8x12), "4:5" (8x10, 16x20), "1:1" (square),
# or "even" to skip ratio padding and only add the border.
ratio = "2:3"

# Uniform border around the padded image, in percent of its size.
# 5 adds 5% to both width and height.
border_percent = 0.0

# Padding and border color (#rrggbb).
background = "#ffffff"

# Keep EXIF (camera, date, copyright) and DPI in the output.
# The ICC color profile is always kept.
preserve_extra_metadata = true

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Appended to each file name: IMG_0001.jpg -> IMG_0001_padded.jpg
suffix = "_padded"

# What to do when an output file already exists:
#   ask       - prompt for each file (yes / no / all / skip all / quit)
#   overwrite - replace it
#   skip      - leave it alone
#   abort     - stop the batch
on_conflict = "ask"
"##
}
