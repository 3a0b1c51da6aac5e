//! Pipeline configuration

use crate::{
    error::{CutoutError, Result},
    segmentation::DEFAULT_MAX_DIMENSION,
    silhouette::DEFAULT_SMOOTHING_PASSES,
    types::FOREGROUND_THRESHOLD,
};
use serde::{Deserialize, Serialize};

/// Configuration for the processing pipeline.
///
/// Owned by the hosting application (UI/config layer); the coordinator only
/// reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Segment automatically right after capture/import. When off,
    /// processing starts the first time a record is presented for detailed
    /// viewing.
    pub auto_process: bool,

    /// Longest-side cap applied before segmentation
    pub max_dimension: u32,

    /// Corner-cutting passes applied to traced outlines
    pub smoothing_passes: usize,

    /// Mask values strictly above this count as foreground when the soft
    /// mask is binarized for outline tracing
    pub foreground_threshold: u8,

    /// Capacity of the coordinator's command queue
    pub command_queue_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            auto_process: true,
            max_dimension: DEFAULT_MAX_DIMENSION,
            smoothing_passes: DEFAULT_SMOOTHING_PASSES,
            foreground_threshold: FOREGROUND_THRESHOLD,
            command_queue_depth: 64,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for [`PipelineConfig`]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn auto_process(mut self, enabled: bool) -> Self {
        self.config.auto_process = enabled;
        self
    }

    #[must_use]
    pub fn max_dimension(mut self, max_dimension: u32) -> Self {
        self.config.max_dimension = max_dimension;
        self
    }

    #[must_use]
    pub fn smoothing_passes(mut self, passes: usize) -> Self {
        self.config.smoothing_passes = passes;
        self
    }

    #[must_use]
    pub fn foreground_threshold(mut self, threshold: u8) -> Self {
        self.config.foreground_threshold = threshold;
        self
    }

    #[must_use]
    pub fn command_queue_depth(mut self, depth: usize) -> Self {
        self.config.command_queue_depth = depth;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `CutoutError::InvalidInput` for a zero dimension cap, a zero
    /// foreground threshold, or a zero-depth command queue.
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.max_dimension == 0 {
            return Err(CutoutError::invalid_input("max_dimension must be positive"));
        }
        if self.config.foreground_threshold == 0 {
            return Err(CutoutError::invalid_input(
                "foreground_threshold must be positive",
            ));
        }
        if self.config.command_queue_depth == 0 {
            return Err(CutoutError::invalid_input(
                "command_queue_depth must be positive",
            ));
        }
        Ok(self.config)
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.auto_process);
        assert_eq!(config.max_dimension, 2048);
        assert_eq!(config.smoothing_passes, 2);
        assert_eq!(config.foreground_threshold, FOREGROUND_THRESHOLD);
    }

    #[test]
    fn test_builder_chain() {
        let config = PipelineConfig::builder()
            .auto_process(false)
            .max_dimension(512)
            .smoothing_passes(3)
            .foreground_threshold(64)
            .build()
            .unwrap();
        assert!(!config.auto_process);
        assert_eq!(config.max_dimension, 512);
        assert_eq!(config.smoothing_passes, 3);
        assert_eq!(config.foreground_threshold, 64);
    }

    #[test]
    fn test_builder_rejects_zero_cap() {
        assert!(PipelineConfig::builder().max_dimension(0).build().is_err());
        assert!(PipelineConfig::builder()
            .foreground_threshold(0)
            .build()
            .is_err());
        assert!(PipelineConfig::builder()
            .command_queue_depth(0)
            .build()
            .is_err());
    }
}
