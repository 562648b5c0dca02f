//! Data-quality tiering
//!
//! The amount of real history decides which prediction strategy is even
//! admissible. Classification is pure; acting on the tier is the caller's
//! job.

use serde::{Deserialize, Serialize};

/// Record-count thresholds between tiers
///
/// The unit of the counts follows the forecast kind: sensor snapshots for
/// RUL, months for demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Below this, only a previously trained model can answer
    pub min_critical: usize,
    /// From this count on, real data alone supports training
    pub min_sufficient: usize,
}

/// Quality tier of the available history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataTier {
    /// No history at all; answer with a conservative default
    Zero,
    /// Too little to train; reuse a persisted model or refuse
    Critical,
    /// Enough to train after synthetic augmentation
    Augmented,
    /// Enough real data to train directly
    Sufficient,
}

/// Classify an available-record count into a tier
pub fn resolve_tier(n: usize, thresholds: TierThresholds) -> DataTier {
    if n == 0 {
        DataTier::Zero
    } else if n < thresholds.min_critical {
        DataTier::Critical
    } else if n < thresholds.min_sufficient {
        DataTier::Augmented
    } else {
        DataTier::Sufficient
    }
}

/// Data-quality tag carried on every forecast result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    /// No history existed; the result is a fixed conservative estimate
    NoData,
    /// Below the critical threshold; a previously trained model answered
    CriticalPretrained,
    /// History was extended with synthetic rows before training
    Augmented,
    /// Enough real history to train on directly
    Sufficient,
}

impl DataQuality {
    /// Stable tag string for logs and serialized results
    pub fn tag(&self) -> &'static str {
        match self {
            DataQuality::NoData => "no_data_default_estimate",
            DataQuality::CriticalPretrained => "critical_low_pretrained",
            DataQuality::Augmented => "insufficient_augmented",
            DataQuality::Sufficient => "sufficient",
        }
    }
}

/// Which strategy produced a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Fixed engineering default, no model involved
    ConservativeDefault,
    /// Persisted model reused because fresh training was not possible
    PretrainedModel,
    /// Model trained (or reloaded) for this request's data tier
    TrainedModel,
    /// Closed-form statistical estimate over recent history
    Statistical,
}
