//! Immutable engine configuration
//!
//! Every pipeline builds one `EngineConfig` per forecast kind at construction
//! and threads it through the stages; nothing in the engine reads global
//! state. The two presets carry the tuning the pipelines ship with.

use crate::error::{ForecastError, Result};
use crate::tier::TierThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which quantity a model forecasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastKind {
    /// Remaining useful life of an in-service part, in hours
    Rul,
    /// Monthly consumption demand over a short horizon
    Demand,
}

impl ForecastKind {
    /// Stable key used for artifact file names
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastKind::Rul => "rul",
            ForecastKind::Demand => "demand",
        }
    }
}

impl fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input sequence layout for one forecast kind
#[derive(Debug, Clone)]
pub struct SequenceSpec {
    /// Feature names in projection order
    pub feature_names: Vec<String>,
    /// Sliding-window length in rows
    pub window: usize,
    /// Output steps per forecast (1 for a scalar target)
    pub horizon: usize,
    /// Fewer training windows than this makes training infeasible
    pub min_windows: usize,
}

impl SequenceSpec {
    /// Number of features per row
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}

/// Data-quality tiering parameters
#[derive(Debug, Clone, Copy)]
pub struct TierSpec {
    /// Record-count thresholds between tiers
    pub thresholds: TierThresholds,
    /// Series length synthetic augmentation extends to
    pub synthetic_target: usize,
}

/// Network architecture parameters
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    /// Hidden units in the first recurrent layer
    pub hidden1: usize,
    /// Hidden units in the second recurrent layer
    pub hidden2: usize,
    /// Units in the dense head
    pub dense_units: usize,
    /// Dropout rate applied after each recurrent layer
    pub dropout: f64,
    /// Output vector length
    pub output_len: usize,
    /// Rectify the output so forecasts stay non-negative
    pub output_relu: bool,
}

/// Training-loop parameters
#[derive(Debug, Clone, Copy)]
pub struct TrainingConfig {
    /// Maximum number of epochs
    pub epochs: usize,
    /// Sequences per optimizer step
    pub batch_size: usize,
    /// Initial Adam learning rate
    pub learning_rate: f64,
    /// Huber loss transition point
    pub huber_delta: f64,
    /// Fraction of windows held out as the trailing validation slice
    pub validation_split: f64,
    /// Epochs without validation improvement before stopping
    pub early_stop_patience: usize,
    /// Epochs without improvement before reducing the learning rate
    pub plateau_patience: usize,
    /// Multiplier applied when the learning rate is reduced
    pub plateau_factor: f64,
    /// Learning-rate floor
    pub min_learning_rate: f64,
    /// Seed for weight init and dropout masks
    pub seed: u64,
}

/// Stochastic-inference sampling parameters
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    /// Forward passes per uncertainty estimate
    pub passes: usize,
}

/// Attribution explainer parameters
#[derive(Debug, Clone, Copy)]
pub struct AttributionConfig {
    /// Most background windows ever considered
    pub background_cap: usize,
    /// Representative points the background collapses to
    pub summary_points: usize,
    /// Sampled feature coalitions per explanation
    pub coalition_samples: usize,
    /// Ranked contributions returned
    pub top_k: usize,
}

/// Full engine configuration for one forecast kind
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub kind: ForecastKind,
    pub sequence: SequenceSpec,
    pub tier: TierSpec,
    pub network: NetworkConfig,
    pub training: TrainingConfig,
    pub sampling: SamplingConfig,
    pub attribution: AttributionConfig,
}

impl EngineConfig {
    /// Shipping configuration for RUL forecasting
    pub fn rul_defaults() -> Self {
        Self {
            kind: ForecastKind::Rul,
            sequence: SequenceSpec {
                feature_names: vec![
                    "operating_hours".to_string(),
                    "temperature".to_string(),
                    "vibration".to_string(),
                    "pressure".to_string(),
                    "current_load".to_string(),
                    "rpm".to_string(),
                    "error_code".to_string(),
                ],
                window: 30,
                horizon: 1,
                min_windows: 10,
            },
            tier: TierSpec {
                thresholds: TierThresholds {
                    min_critical: 10,
                    min_sufficient: 100,
                },
                synthetic_target: 200,
            },
            network: NetworkConfig {
                hidden1: 128,
                hidden2: 64,
                dense_units: 32,
                dropout: 0.2,
                output_len: 1,
                output_relu: false,
            },
            training: TrainingConfig {
                epochs: 50,
                batch_size: 32,
                learning_rate: 1e-3,
                huber_delta: 1.0,
                validation_split: 0.15,
                early_stop_patience: 10,
                plateau_patience: 5,
                plateau_factor: 0.5,
                min_learning_rate: 1e-6,
                seed: 42,
            },
            sampling: SamplingConfig { passes: 100 },
            attribution: AttributionConfig {
                background_cap: 200,
                summary_points: 50,
                coalition_samples: 256,
                top_k: 3,
            },
        }
    }

    /// Shipping configuration for demand forecasting
    ///
    /// Monthly history is sparse, so capacity stays below the RUL network.
    pub fn demand_defaults() -> Self {
        Self {
            kind: ForecastKind::Demand,
            sequence: SequenceSpec {
                feature_names: vec![
                    "outbound_qty".to_string(),
                    "repair_count".to_string(),
                    "avg_unit_price".to_string(),
                    "month_sin".to_string(),
                    "month_cos".to_string(),
                    "working_days".to_string(),
                ],
                window: 12,
                horizon: 3,
                min_windows: 5,
            },
            tier: TierSpec {
                thresholds: TierThresholds {
                    min_critical: 3,
                    min_sufficient: 6,
                },
                synthetic_target: 24,
            },
            network: NetworkConfig {
                hidden1: 64,
                hidden2: 32,
                dense_units: 16,
                dropout: 0.2,
                output_len: 3,
                output_relu: true,
            },
            training: TrainingConfig {
                epochs: 80,
                batch_size: 16,
                learning_rate: 1e-3,
                huber_delta: 1.0,
                validation_split: 0.15,
                early_stop_patience: 15,
                plateau_patience: 7,
                plateau_factor: 0.5,
                min_learning_rate: 1e-6,
                seed: 42,
            },
            sampling: SamplingConfig { passes: 50 },
            attribution: AttributionConfig {
                background_cap: 200,
                summary_points: 30,
                coalition_samples: 128,
                top_k: 3,
            },
        }
    }

    /// Check the configuration is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.sequence.feature_names.is_empty() {
            return Err(ForecastError::InvalidInput(
                "feature list must not be empty".to_string(),
            ));
        }
        if self.sequence.window == 0 || self.sequence.horizon == 0 {
            return Err(ForecastError::InvalidInput(
                "window and horizon must be at least 1".to_string(),
            ));
        }
        if self.network.output_len != self.sequence.horizon {
            return Err(ForecastError::InvalidInput(format!(
                "network outputs {} steps but the sequence horizon is {}",
                self.network.output_len, self.sequence.horizon
            )));
        }
        if !(0.0..1.0).contains(&self.network.dropout) {
            return Err(ForecastError::InvalidInput(format!(
                "dropout must lie in [0, 1), got {}",
                self.network.dropout
            )));
        }
        if !(0.0..1.0).contains(&self.training.validation_split) {
            return Err(ForecastError::InvalidInput(format!(
                "validation split must lie in [0, 1), got {}",
                self.training.validation_split
            )));
        }
        if self.tier.thresholds.min_critical == 0
            || self.tier.thresholds.min_critical >= self.tier.thresholds.min_sufficient
        {
            return Err(ForecastError::InvalidInput(
                "tier thresholds must satisfy 0 < min_critical < min_sufficient".to_string(),
            ));
        }
        if self.sampling.passes == 0 {
            return Err(ForecastError::InvalidInput(
                "uncertainty sampling needs at least one pass".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_presets_validate() {
        assert!(EngineConfig::rul_defaults().validate().is_ok());
        assert!(EngineConfig::demand_defaults().validate().is_ok());
    }

    #[test]
    fn test_mismatched_horizon_rejected() {
        let mut config = EngineConfig::demand_defaults();
        config.network.output_len = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dropout_of_one_rejected() {
        let mut config = EngineConfig::rul_defaults();
        config.network.dropout = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kind_keys_are_stable() {
        assert_eq!(ForecastKind::Rul.as_str(), "rul");
        assert_eq!(ForecastKind::Demand.to_string(), "demand");
    }
}
