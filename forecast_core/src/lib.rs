//! # Forecast Core
//!
//! The model engine behind spare-part planning: data-quality tiering,
//! synthetic history augmentation, sequence preprocessing, a recurrent
//! regressor with uncertainty sampling and feature attribution, and
//! persistence for trained bundles.
//!
//! ## Features
//!
//! - Record-count tiering that picks a strategy before any modelling starts
//! - Synthetic extension of thin sensor and demand histories
//! - Min-max scaling and sliding-window assembly for sequence models
//! - Two-layer LSTM regression trained with Huber loss, Adam, early stopping
//!   and plateau-driven learning-rate decay
//! - Dropout-based 95% prediction intervals from repeated stochastic passes
//! - Ranked per-feature attributions estimated against a clustered background
//! - Atomic single-file JSON artifacts bundling weights, scaler and background
//!
//! ## Forecast Kinds
//!
//! Both pipelines drive the same engine through the `ForecastKind` enum:
//!
//! ```rust
//! pub enum ForecastKind {
//!     Rul,
//!     Demand,
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_core::config::EngineConfig;
//! use forecast_core::model::SequenceRegressor;
//! use forecast_core::train::fit;
//! use forecast_core::uncertainty::sample_interval;
//! use ndarray::{array, Array1, Array2};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! # fn main() -> forecast_core::Result<()> {
//! // Shrink the shipping preset so the example trains in milliseconds
//! let mut config = EngineConfig::rul_defaults();
//! config.network.hidden1 = 6;
//! config.network.hidden2 = 4;
//! config.network.dense_units = 3;
//! config.training.epochs = 3;
//!
//! // Windows of shape (window, features) with scalar targets
//! let windows: Vec<Array2<f64>> = (0..8)
//!     .map(|i| Array2::from_elem((4, 2), i as f64 * 0.1))
//!     .collect();
//! let targets: Vec<Array1<f64>> = (0..8).map(|i| array![i as f64 * 0.2]).collect();
//!
//! let mut rng = StdRng::seed_from_u64(config.training.seed);
//! let mut network = SequenceRegressor::new(&config.network, 2, &mut rng);
//! let report = fit(&mut network, &windows, &targets, &config.training)?;
//!
//! // Stochastic passes give a 95% band around the point estimate
//! let interval = sample_interval(&network, &windows[0], 20, 7)?;
//! println!("point {:.2} best val {:.4}", interval.mean[0], report.best_val_loss);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod attribution;
pub mod config;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod synthetic;
pub mod tier;
pub mod train;
pub mod uncertainty;
pub mod window;

// Re-export commonly used types
pub use crate::artifact::{ArtifactMetadata, ArtifactStore, ModelArtifact};
pub use crate::attribution::{
    summarize_background, Attribution, Direction, FeatureContribution, KernelExplainer,
};
pub use crate::config::{EngineConfig, ForecastKind};
pub use crate::error::{ForecastError, Result};
pub use crate::model::SequenceRegressor;
pub use crate::preprocess::{fill_missing, ScalingTransform};
pub use crate::synthetic::{extend_demand_history, extend_sensor_history};
pub use crate::tier::{resolve_tier, DataQuality, DataTier, Strategy, TierThresholds};
pub use crate::train::{fit, TrainingReport};
pub use crate::uncertainty::{sample_interval, PredictionInterval};
pub use crate::window::{demand_windows, latest_window, rul_windows};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
