//! Shared types passed from configuration to the batch driver.
//!
//! [`PadSettings`] is built once per run from the resolved config and copied
//! into every [`ProcessingJob`]. Nothing here touches the filesystem.

use crate::imaging::{AspectRatio, BackgroundColor, ComposeParams, Padding, RatioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Ratio choice as written by the user: `"even"` or `"short:long"`.
///
/// Parsing only checks syntax and puts the shorter term first (`"3:2"` and
/// `"2:3"` are the same print shape). Positivity is checked when the setting
/// becomes a [`Padding`], so a zero or negative term surfaces as
/// [`RatioError`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RatioSetting {
    Even,
    Ratio { short: f64, long: f64 },
}

impl RatioSetting {
    pub fn padding(self) -> Result<Padding, RatioError> {
        match self {
            Self::Even => Ok(Padding::Even),
            Self::Ratio { short, long } => Ok(Padding::Ratio(AspectRatio::new(short, long)?)),
        }
    }
}

impl Default for RatioSetting {
    fn default() -> Self {
        Self::Ratio {
            short: 2.0,
            long: 3.0,
        }
    }
}

impl fmt::Display for RatioSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Even => f.write_str("even"),
            Self::Ratio { short, long } => write!(f, "{short}:{long}"),
        }
    }
}

impl FromStr for RatioSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("even") {
            return Ok(Self::Even);
        }
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid ratio '{s}': expected \"short:long\" or \"even\""))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid ratio '{s}': '{}' is not a number", part.trim()))
        };
        let (a, b) = (parse(a)?, parse(b)?);
        // plain comparison so a NaN term is kept for `padding` to reject
        let (short, long) = if a > b { (b, a) } else { (a, b) };
        Ok(Self::Ratio { short, long })
    }
}

impl TryFrom<String> for RatioSetting {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RatioSetting> for String {
    fn from(value: RatioSetting) -> Self {
        value.to_string()
    }
}

/// Everything that decides how a single image is padded and saved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadSettings {
    pub ratio: RatioSetting,
    /// Border as a fraction of the padded canvas (`0.05` = 5%).
    pub border: f64,
    pub background: BackgroundColor,
    /// Keep EXIF and DPI. The ICC profile is kept regardless.
    pub preserve_extra_metadata: bool,
}

impl PadSettings {
    pub fn compose_params(&self) -> Result<ComposeParams, RatioError> {
        Ok(ComposeParams {
            padding: self.ratio.padding()?,
            border: self.border,
            background: self.background,
        })
    }
}

impl Default for PadSettings {
    fn default() -> Self {
        Self {
            ratio: RatioSetting::default(),
            border: 0.0,
            background: BackgroundColor::WHITE,
            preserve_extra_metadata: true,
        }
    }
}

/// One input file and where its padded version goes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub settings: PadSettings,
}
