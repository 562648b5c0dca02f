//! The remaining-useful-life pipeline.
//!
//! One forecaster owns a part store, an artifact directory and an engine
//! configuration. Each request resolves the part's data tier and follows
//! that tier's path: a conservative default, a previously stored model, or
//! training (with synthetic augmentation when the history is thin).

use chrono::Utc;
use forecast_core::artifact::{ArtifactMetadata, ArtifactStore, ModelArtifact};
use forecast_core::attribution::KernelExplainer;
use forecast_core::synthetic::SensorSynthesis;
use forecast_core::uncertainty::PredictionInterval;
use forecast_core::{
    extend_sensor_history, fill_missing, fit, latest_window, resolve_tier, rul_windows,
    sample_interval, summarize_background, Attribution, DataQuality, DataTier, EngineConfig,
    ForecastError, ForecastKind, ScalingTransform, SequenceRegressor, Strategy,
};
use part_store::{HistoryStore, PartInfo, SensorRecord, StockStore, StoreError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, info_span};

use crate::alert::evaluate_alert;
use crate::features::sensor_matrix;
use crate::result::RulForecast;
use crate::{MaintenanceError, Result};

/// Forecasts remaining useful life for parts held in `S`.
pub struct RulForecaster<S> {
    store: S,
    artifacts: ArtifactStore,
    config: EngineConfig,
}

impl<S: HistoryStore + StockStore> RulForecaster<S> {
    /// Forecaster with the shipping configuration.
    pub fn new(store: S, artifacts: ArtifactStore) -> Self {
        Self::with_config(store, artifacts, EngineConfig::rul_defaults())
    }

    pub fn with_config(store: S, artifacts: ArtifactStore, config: EngineConfig) -> Self {
        Self {
            store,
            artifacts,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Forecasts a part, reusing a stored model when one exists.
    pub fn forecast_rul(&self, part_id: &str) -> Result<RulForecast> {
        self.forecast_rul_opts(part_id, false)
    }

    /// Forecasts a part. `retrain` forces a fresh fit even when a stored
    /// model could serve the request.
    pub fn forecast_rul_opts(&self, part_id: &str, retrain: bool) -> Result<RulForecast> {
        let span = info_span!("forecast_rul", part_id);
        let _guard = span.enter();

        let info = self
            .store
            .part_info(part_id)
            .map_err(|source| unavailable(part_id, source))?
            .ok_or_else(|| unavailable(part_id, StoreError::UnknownPart(part_id.to_string())))?;
        let history = self
            .store
            .sensor_history(part_id)
            .map_err(|source| unavailable(part_id, source))?;

        let tier = resolve_tier(history.len(), self.config.tier.thresholds);
        info!(records = history.len(), tier = ?tier, "resolved data tier");

        match tier {
            DataTier::Zero => Ok(self.conservative_forecast(&info)),
            DataTier::Critical => self.pretrained_forecast(&info, &history),
            DataTier::Augmented => {
                let synthesis = SensorSynthesis::new(
                    self.config.tier.synthetic_target,
                    info.nominal_life_hours,
                );
                let extended = extend_sensor_history(
                    part_id,
                    &history,
                    &synthesis,
                    self.config.training.seed,
                )
                .map_err(MaintenanceError::Engine)?;
                debug!(
                    real = history.len(),
                    extended = extended.len(),
                    "augmented thin history"
                );
                let artifact =
                    self.train_or_load(&info, &extended, history.len(), retrain)?;
                self.infer(
                    &info,
                    &extended,
                    &artifact,
                    DataQuality::Augmented,
                    Strategy::TrainedModel,
                )
            }
            DataTier::Sufficient => {
                let artifact = self.train_or_load(&info, &history, history.len(), retrain)?;
                self.infer(
                    &info,
                    &history,
                    &artifact,
                    DataQuality::Sufficient,
                    Strategy::TrainedModel,
                )
            }
        }
    }

    /// No history at all: half the nominal life, with the widest honest band.
    fn conservative_forecast(&self, info: &PartInfo) -> RulForecast {
        let nominal = info.nominal_life_hours;
        let point = 0.5 * nominal;
        // Band chosen so mean +/- 1.96 sigma spans exactly [0, nominal].
        let std_dev = 0.5 * nominal / 1.96;

        RulForecast {
            part_id: info.part_id.clone(),
            predicted_rul_hours: point,
            interval: PredictionInterval {
                mean: vec![point],
                std_dev: vec![std_dev],
                lower: vec![0.0],
                upper: vec![nominal],
            },
            quality: DataQuality::NoData,
            strategy: Strategy::ConservativeDefault,
            alert: evaluate_alert(point),
            attribution: Attribution::Unavailable {
                reason: "no sensor history to attribute".to_string(),
            },
            generated_at: Utc::now(),
        }
    }

    /// Below the critical threshold only a stored model can answer.
    fn pretrained_forecast(
        &self,
        info: &PartInfo,
        history: &[SensorRecord],
    ) -> Result<RulForecast> {
        let artifact = self
            .artifacts
            .load(ForecastKind::Rul)
            .map_err(MaintenanceError::Engine)?
            .ok_or_else(|| MaintenanceError::InsufficientDataNoFallback {
                part_id: info.part_id.clone(),
                available: history.len(),
                needed: self.config.tier.thresholds.min_critical,
            })?;
        info!(
            trained_at = %artifact.metadata.trained_at,
            "answering from stored model"
        );
        self.infer(
            info,
            history,
            &artifact,
            DataQuality::CriticalPretrained,
            Strategy::PretrainedModel,
        )
    }

    /// Returns a usable artifact, training one when needed.
    fn train_or_load(
        &self,
        info: &PartInfo,
        records: &[SensorRecord],
        real_rows: usize,
        retrain: bool,
    ) -> Result<ModelArtifact> {
        if !retrain {
            if let Some(artifact) = self
                .artifacts
                .load(ForecastKind::Rul)
                .map_err(MaintenanceError::Engine)?
            {
                if artifact.metadata.window == self.config.sequence.window
                    && artifact.metadata.feature_names == self.config.sequence.feature_names
                {
                    debug!("reusing stored model");
                    return Ok(artifact);
                }
                debug!("stored model does not match the configuration, retraining");
            }
        }

        let (mut matrix, elapsed) = sensor_matrix(records);
        fill_missing(&mut matrix);
        let scaler = ScalingTransform::fit(&matrix).map_err(MaintenanceError::Engine)?;
        let scaled = scaler.apply(&matrix).map_err(MaintenanceError::Engine)?;
        let (windows, targets) = rul_windows(
            &scaled,
            &elapsed,
            info.nominal_life_hours,
            self.config.sequence.window,
        )
        .map_err(MaintenanceError::Engine)?;
        if windows.len() < self.config.sequence.min_windows {
            return Err(MaintenanceError::Engine(ForecastError::InvalidInput(
                format!(
                    "only {} training windows, need {}",
                    windows.len(),
                    self.config.sequence.min_windows
                ),
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.config.training.seed);
        let mut network = SequenceRegressor::new(
            &self.config.network,
            self.config.sequence.feature_count(),
            &mut rng,
        );
        let report = fit(&mut network, &windows, &targets, &self.config.training)
            .map_err(MaintenanceError::Engine)?;
        info!(
            epochs = report.epochs_run,
            best_val_loss = report.best_val_loss,
            "model trained"
        );

        let start = windows
            .len()
            .saturating_sub(self.config.attribution.background_cap);
        let (background, background_weights) = summarize_background(
            &windows[start..],
            self.config.attribution.summary_points,
            self.config.training.seed,
        );

        let artifact = ModelArtifact {
            metadata: ArtifactMetadata {
                kind: ForecastKind::Rul,
                feature_names: self.config.sequence.feature_names.clone(),
                window: self.config.sequence.window,
                horizon: self.config.sequence.horizon,
                trained_at: Utc::now(),
                real_rows,
                training_rows: records.len(),
                best_val_loss: report.best_val_loss,
            },
            network,
            scaler,
            background,
            background_weights,
        };
        self.artifacts
            .save(&artifact)
            .map_err(MaintenanceError::Engine)?;
        Ok(artifact)
    }

    /// Runs inference for a part with the given artifact.
    fn infer(
        &self,
        info: &PartInfo,
        records: &[SensorRecord],
        artifact: &ModelArtifact,
        quality: DataQuality,
        strategy: Strategy,
    ) -> Result<RulForecast> {
        let (mut matrix, _) = sensor_matrix(records);
        fill_missing(&mut matrix);
        let scaled = artifact
            .scaler
            .apply(&matrix)
            .map_err(MaintenanceError::Engine)?;
        let query = latest_window(&scaled, artifact.metadata.window);

        let interval = sample_interval(
            &artifact.network,
            &query,
            self.config.sampling.passes,
            self.config.training.seed,
        )
        .map_err(MaintenanceError::Engine)?;
        let point = interval.mean.first().copied().unwrap_or(0.0).max(0.0);

        let explainer = KernelExplainer::from_centroids(
            &artifact.network,
            artifact.background.clone(),
            artifact.background_weights.clone(),
            (artifact.metadata.window, artifact.metadata.feature_names.len()),
            self.config.attribution,
        );
        let attribution = explainer.explain(
            &query,
            &artifact.metadata.feature_names,
            self.config.training.seed,
        );

        Ok(RulForecast {
            part_id: info.part_id.clone(),
            predicted_rul_hours: point,
            interval,
            quality,
            strategy,
            alert: evaluate_alert(point),
            attribution,
            generated_at: Utc::now(),
        })
    }
}

fn unavailable(part_id: &str, source: StoreError) -> MaintenanceError {
    MaintenanceError::DataUnavailable {
        part_id: part_id.to_string(),
        source,
    }
}
