//! # Tuner Configuration
//!
//! The reference design hardcoded its sample rate, sensitivity threshold,
//! window sizing, and note table as constants; here they are lifted into an
//! explicit configuration supplied at construction time. The struct is
//! serde-enabled so a frontend can load it from a file.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::tuning::{self, Note};

/// Configuration for a pitch session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Sensitivity threshold on the ±32767 sample range; excursions must
    /// exceed it in both directions to count as a cycle.
    pub volume_threshold: i16,
    /// Samples per capture block (B).
    pub block_size: usize,
    /// Window capacity as a multiple of the block size (W = multiplier × B).
    pub window_multiplier: usize,
    /// Note table for nearest-note resolution, strictly ascending by
    /// frequency. Defaults to the built-in A0..G6 table.
    pub notes: Vec<Note>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            volume_threshold: 2000,
            block_size: 2048,
            window_multiplier: 8,
            notes: tuning::default_note_table(),
        }
    }
}

impl TunerConfig {
    /// The analysis window length W in samples.
    pub fn window_len(&self) -> usize {
        self.block_size * self.window_multiplier
    }

    /// Checks the configuration for values the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            bail!("sample_rate must be positive");
        }
        if self.volume_threshold <= 0 {
            bail!("volume_threshold must be positive");
        }
        if self.block_size == 0 {
            bail!("block_size must be positive");
        }
        if self.window_multiplier == 0 {
            bail!("window_multiplier must be positive");
        }
        if self.notes.len() < 2 {
            bail!("note table needs at least two entries");
        }
        for pair in self.notes.windows(2) {
            if pair[0].frequency >= pair[1].frequency {
                bail!(
                    "note table must be strictly ascending by frequency ({} >= {})",
                    pair[0].name,
                    pair[1].name
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TunerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_len(), 2048 * 8);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let config = TunerConfig { block_size: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = TunerConfig { window_multiplier: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = TunerConfig { sample_rate: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = TunerConfig { volume_threshold: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unsorted_note_table_is_rejected() {
        let mut config = TunerConfig::default();
        config.notes.swap(0, 1);
        assert!(config.validate().is_err());

        config.notes.truncate(1);
        assert!(config.validate().is_err());
    }
}
