//! Engine configuration.
//!
//! Everything is optional when decoded: missing fields take their defaults.

use crate::codec::AttributeCodec;
use crate::error::{Error, Result};
use crate::height::{ContentHeightEstimator, HeightWeights};
use serde::{Deserialize, Serialize};

/// Heading level at which a document is cut into slides (1..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SplitLevel(u8);

impl SplitLevel {
    pub fn new(level: u8) -> Result<Self> {
        if (1..=3).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Error::InvalidSplitLevel(level))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for SplitLevel {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for SplitLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<SplitLevel> for u8 {
    fn from(level: SplitLevel) -> Self {
        level.0
    }
}

/// Settings shared by the segmenter, TOC, validator and render pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Heading level that starts a new slide.
    pub split_level: SplitLevel,

    /// Deepest heading level listed in generated tables of contents.
    pub toc_level: u8,

    /// Accept markers glued to their text (`-item`).
    pub glued_fallback: bool,

    /// Headings longer than this (in characters) are reported.
    pub max_heading_chars: usize,

    /// Weights for content height estimation.
    pub height: HeightWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            split_level: SplitLevel::default(),
            toc_level: 2,
            glued_fallback: true,
            max_heading_chars: 60,
            height: HeightWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Decode and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the split level.
    pub fn with_split_level(mut self, level: SplitLevel) -> Self {
        self.split_level = level;
        self
    }

    /// Check ranges that the type system does not enforce.
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.toc_level) {
            return Err(Error::Config(format!(
                "toc_level must be between 1 and 6, got {}",
                self.toc_level
            )));
        }
        if self.max_heading_chars == 0 {
            return Err(Error::Config(
                "max_heading_chars must be greater than zero".to_string(),
            ));
        }
        self.height.validate()
    }

    /// Codec honoring the configured fallback mode.
    pub fn codec(&self) -> AttributeCodec {
        AttributeCodec::new().with_glued_fallback(self.glued_fallback)
    }

    /// Height estimator with the configured weights and codec.
    pub fn estimator(&self) -> ContentHeightEstimator {
        ContentHeightEstimator::new()
            .with_weights(self.height.clone())
            .with_codec(self.codec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_level_range() {
        assert!(SplitLevel::new(0).is_err());
        assert_eq!(SplitLevel::new(3).unwrap().get(), 3);
        assert!(matches!(
            SplitLevel::new(4),
            Err(Error::InvalidSplitLevel(4))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{"split_level": 1}"#).unwrap();
        assert_eq!(config.split_level.get(), 1);
        assert_eq!(config.toc_level, 2);
        assert!(config.glued_fallback);
        assert_eq!(config.height, HeightWeights::default());
    }

    #[test]
    fn test_json_rejects_bad_split_level() {
        assert!(EngineConfig::from_json_str(r#"{"split_level": 5}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_toc_level() {
        let config = EngineConfig {
            toc_level: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut config = EngineConfig::default();
        config.height.image = -1.0;
        assert!(config.validate().is_err());
    }
}
