//! Generation parameters after normalization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_BATCH_SIZE: u8 = 1;
pub const MAX_BATCH_SIZE: u8 = 4;
pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_BATCH_SIZE: u8 = 1;
pub const DEFAULT_SAFETY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Requested width:height category for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s)
            .ok_or_else(|| format!("Unsupported aspect ratio: {}", s))
    }
}

/// Parameters forwarded to the provider. Every field is within its valid
/// range once produced by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub aspect_ratio: AspectRatio,
    pub batch_size: u8,
    pub locale_aware: bool,
    pub safety_threshold: f64,
    /// Upstream deadline in seconds.
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            locale_aware: false,
            safety_threshold: DEFAULT_SAFETY_THRESHOLD,
            timeout: DEFAULT_TIMEOUT_SECS,
            seed: None,
        }
    }
}

impl GenerationParams {
    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed = Some(seed);
        self
    }
}
