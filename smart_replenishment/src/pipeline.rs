//! The demand-to-purchase pipeline.
//!
//! One planner owns a part store, an artifact directory and an engine
//! configuration. Each part resolves its data tier and follows that tier's
//! path: a fixed default, a previously stored model, or training (with
//! synthetic augmentation when the history is thin). A series too short to
//! window goes through the statistical fallback instead of failing. The
//! resulting forecast then drives priority, purchase and supplier decisions.

use chrono::{NaiveDate, Utc};
use forecast_core::artifact::{ArtifactMetadata, ArtifactStore, ModelArtifact};
use forecast_core::attribution::KernelExplainer;
use forecast_core::synthetic::DemandSynthesis;
use forecast_core::uncertainty::PredictionInterval;
use forecast_core::{
    demand_windows, extend_demand_history, fill_missing, fit, latest_window, resolve_tier,
    sample_interval, summarize_background, Attribution, DataQuality, DataTier, EngineConfig,
    ForecastKind, ScalingTransform, SequenceRegressor, Strategy,
};
use part_store::{DemandRecord, PartInfo, PartStore, StoreError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::statistics::Statistics;
use tracing::{debug, info, info_span};

use crate::demand::demand_matrix;
use crate::priority::evaluate_priority;
use crate::purchase::{
    plan_purchase, ReplenishmentInputs, DEFAULT_LEAD_TIME_DAYS, DEFAULT_SAFETY_FACTOR,
    WORKING_DAYS_PER_MONTH,
};
use crate::result::{DemandForecast, PartOutcome, ReplenishmentAdvice};
use crate::supplier::select_supplier;
use crate::{ReplenishError, Result};

/// Months the statistical fallback averages over.
const FALLBACK_LOOKBACK_MONTHS: usize = 12;
/// Interval half-width floor as a fraction of the fallback mean.
const FALLBACK_SPREAD_FLOOR: f64 = 0.2;
/// Monthly demand assumed for a part with no history at all.
const ZERO_DATA_MONTHLY_QTY: f64 = 5.0;
/// Upper interval edge for the zero-history default.
const ZERO_DATA_UPPER_QTY: f64 = 20.0;

/// Plans replenishment for parts held in `S`.
pub struct ReplenishmentPlanner<S> {
    store: S,
    artifacts: ArtifactStore,
    config: EngineConfig,
    safety_factor: f64,
    default_lead_time_days: u32,
    today: Option<NaiveDate>,
}

impl<S: PartStore> ReplenishmentPlanner<S> {
    /// Planner with the shipping configuration.
    pub fn new(store: S, artifacts: ArtifactStore) -> Self {
        Self::with_config(store, artifacts, EngineConfig::demand_defaults())
    }

    pub fn with_config(store: S, artifacts: ArtifactStore, config: EngineConfig) -> Self {
        Self {
            store,
            artifacts,
            config,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            default_lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            today: None,
        }
    }

    /// Pins the plan date. Unpinned planners use the current UTC date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Plans a batch of parts. A part that fails keeps its error in its own
    /// outcome entry; the parts around it still get their plans.
    pub fn forecast_demand(&self, part_ids: &[&str]) -> Vec<PartOutcome> {
        info!(parts = part_ids.len(), "planning replenishment batch");
        part_ids
            .iter()
            .map(|part_id| PartOutcome {
                part_id: part_id.to_string(),
                result: self.plan_part(part_id),
            })
            .collect()
    }

    /// Plans one part, reusing a stored model when one exists.
    pub fn plan_part(&self, part_id: &str) -> Result<ReplenishmentAdvice> {
        self.plan_part_opts(part_id, false)
    }

    /// Plans one part. `retrain` forces a fresh fit even when a stored
    /// model could serve the request.
    pub fn plan_part_opts(&self, part_id: &str, retrain: bool) -> Result<ReplenishmentAdvice> {
        let span = info_span!("plan_replenishment", part_id);
        let _guard = span.enter();

        let info = self
            .store
            .part_info(part_id)
            .map_err(|source| unavailable(part_id, source))?
            .ok_or_else(|| unavailable(part_id, StoreError::UnknownPart(part_id.to_string())))?;
        let history = self
            .store
            .demand_history(part_id)
            .map_err(|source| unavailable(part_id, source))?;

        let tier = resolve_tier(history.len(), self.config.tier.thresholds);
        info!(months = history.len(), tier = ?tier, "resolved data tier");

        let forecast = match tier {
            DataTier::Zero => self.default_forecast(&info),
            DataTier::Critical => self.pretrained_forecast(&info, &history)?,
            DataTier::Augmented => {
                let synthesis = DemandSynthesis::new(self.config.tier.synthetic_target);
                let extended = extend_demand_history(
                    part_id,
                    &history,
                    &synthesis,
                    self.config.training.seed,
                )
                .map_err(ReplenishError::Engine)?;
                debug!(
                    real = history.len(),
                    extended = extended.len(),
                    "augmented thin history"
                );
                match self.train_or_load(&extended, history.len(), retrain)? {
                    Some(artifact) => self.infer(
                        &info,
                        &extended,
                        &artifact,
                        DataQuality::Augmented,
                        Strategy::TrainedModel,
                    )?,
                    None => self.statistical_forecast(&info, &history, DataQuality::Augmented),
                }
            }
            DataTier::Sufficient => {
                match self.train_or_load(&history, history.len(), retrain)? {
                    Some(artifact) => self.infer(
                        &info,
                        &history,
                        &artifact,
                        DataQuality::Sufficient,
                        Strategy::TrainedModel,
                    )?,
                    None => self.statistical_forecast(&info, &history, DataQuality::Sufficient),
                }
            }
        };

        self.advise(&info, forecast)
    }

    /// Turns a demand forecast into the full purchase recommendation.
    fn advise(&self, info: &PartInfo, forecast: DemandForecast) -> Result<ReplenishmentAdvice> {
        let rows = self
            .store
            .performance_rows(&info.part_id)
            .map_err(|source| unavailable(&info.part_id, source))?;
        let supplier = select_supplier(&info.current_supplier, &rows, self.default_lead_time_days);

        let months = forecast.monthly_qty.len().max(1) as f64;
        let daily_avg_demand = forecast.total_qty / months / WORKING_DAYS_PER_MONTH;
        let purchase = plan_purchase(&ReplenishmentInputs {
            total_demand: forecast.total_qty,
            current_stock: info.current_stock,
            daily_avg_demand,
            lead_time_days: supplier.lead_time_days,
            safety_factor: self.safety_factor,
            today: self.plan_date(),
        });
        let priority = evaluate_priority(forecast.total_qty, info.current_stock);
        info!(
            priority = priority.level.as_str(),
            qty = purchase.suggested_qty,
            supplier = %supplier.supplier,
            "replenishment advice ready"
        );

        Ok(ReplenishmentAdvice {
            forecast,
            priority,
            purchase,
            supplier,
            current_stock: info.current_stock,
        })
    }

    /// No history at all: a fixed modest demand with the widest honest band.
    fn default_forecast(&self, info: &PartInfo) -> DemandForecast {
        let horizon = self.config.sequence.horizon;
        let point = ZERO_DATA_MONTHLY_QTY;
        // Band chosen so mean +/- 1.96 sigma spans exactly [0, the ceiling].
        let std_dev = (ZERO_DATA_UPPER_QTY - point) / 1.96;

        DemandForecast {
            part_id: info.part_id.clone(),
            monthly_qty: vec![point; horizon],
            total_qty: point * horizon as f64,
            interval: PredictionInterval {
                mean: vec![point; horizon],
                std_dev: vec![std_dev; horizon],
                lower: vec![0.0; horizon],
                upper: vec![ZERO_DATA_UPPER_QTY; horizon],
            },
            quality: DataQuality::NoData,
            strategy: Strategy::ConservativeDefault,
            attribution: Attribution::Unavailable {
                reason: "no demand history to attribute".to_string(),
            },
            generated_at: Utc::now(),
        }
    }

    /// Below the critical threshold only a stored model can answer.
    fn pretrained_forecast(
        &self,
        info: &PartInfo,
        history: &[DemandRecord],
    ) -> Result<DemandForecast> {
        let artifact = self
            .artifacts
            .load(ForecastKind::Demand)
            .map_err(ReplenishError::Engine)?
            .ok_or_else(|| ReplenishError::InsufficientDataNoFallback {
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

    /// Mean of the recent months with a std-or-20%-of-mean band. Covers
    /// series long enough to admit but too short to window.
    fn statistical_forecast(
        &self,
        info: &PartInfo,
        history: &[DemandRecord],
        quality: DataQuality,
    ) -> DemandForecast {
        let recent: Vec<f64> = history
            .iter()
            .rev()
            .take(FALLBACK_LOOKBACK_MONTHS)
            .map(|r| r.outbound_qty)
            .collect();
        let mean = (&recent).mean();
        let std_dev = (&recent).population_std_dev();
        let spread = std_dev.max(FALLBACK_SPREAD_FLOOR * mean);
        info!(months = recent.len(), mean, "statistical demand fallback");

        let horizon = self.config.sequence.horizon;
        DemandForecast {
            part_id: info.part_id.clone(),
            monthly_qty: vec![mean; horizon],
            total_qty: mean * horizon as f64,
            interval: PredictionInterval {
                mean: vec![mean; horizon],
                std_dev: vec![std_dev; horizon],
                lower: vec![(mean - spread).max(0.0); horizon],
                upper: vec![mean + spread; horizon],
            },
            quality,
            strategy: Strategy::Statistical,
            attribution: Attribution::Unavailable {
                reason: "statistical fallback carries no model to attribute".to_string(),
            },
            generated_at: Utc::now(),
        }
    }

    /// Returns a usable artifact, training one when the series windows.
    /// `None` means too few windows, the caller falls back.
    fn train_or_load(
        &self,
        records: &[DemandRecord],
        real_rows: usize,
        retrain: bool,
    ) -> Result<Option<ModelArtifact>> {
        if !retrain {
            if let Some(artifact) = self
                .artifacts
                .load(ForecastKind::Demand)
                .map_err(ReplenishError::Engine)?
            {
                if artifact.metadata.window == self.config.sequence.window
                    && artifact.metadata.feature_names == self.config.sequence.feature_names
                {
                    debug!("reusing stored model");
                    return Ok(Some(artifact));
                }
                debug!("stored model does not match the configuration, retraining");
            }
        }

        let (mut matrix, outbound) = demand_matrix(records);
        fill_missing(&mut matrix);
        let scaler = ScalingTransform::fit(&matrix).map_err(ReplenishError::Engine)?;
        let scaled = scaler.apply(&matrix).map_err(ReplenishError::Engine)?;
        let (windows, targets) = demand_windows(
            &scaled,
            &outbound,
            self.config.sequence.window,
            self.config.sequence.horizon,
        )
        .map_err(ReplenishError::Engine)?;
        if windows.len() < self.config.sequence.min_windows {
            debug!(
                windows = windows.len(),
                needed = self.config.sequence.min_windows,
                "too few windows to train"
            );
            return Ok(None);
        }

        let mut rng = StdRng::seed_from_u64(self.config.training.seed);
        let mut network = SequenceRegressor::new(
            &self.config.network,
            self.config.sequence.feature_count(),
            &mut rng,
        );
        let report = fit(&mut network, &windows, &targets, &self.config.training)
            .map_err(ReplenishError::Engine)?;
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
                kind: ForecastKind::Demand,
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
            .map_err(ReplenishError::Engine)?;
        Ok(Some(artifact))
    }

    /// Runs inference for a part with the given artifact.
    fn infer(
        &self,
        info: &PartInfo,
        records: &[DemandRecord],
        artifact: &ModelArtifact,
        quality: DataQuality,
        strategy: Strategy,
    ) -> Result<DemandForecast> {
        let (mut matrix, _) = demand_matrix(records);
        fill_missing(&mut matrix);
        let scaled = artifact
            .scaler
            .apply(&matrix)
            .map_err(ReplenishError::Engine)?;
        let query = latest_window(&scaled, artifact.metadata.window);

        let interval = sample_interval(
            &artifact.network,
            &query,
            self.config.sampling.passes,
            self.config.training.seed,
        )
        .map_err(ReplenishError::Engine)?;
        let monthly_qty: Vec<f64> = interval.mean.iter().map(|m| m.max(0.0)).collect();
        let total_qty = monthly_qty.iter().sum();

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

        Ok(DemandForecast {
            part_id: info.part_id.clone(),
            monthly_qty,
            total_qty,
            interval,
            quality,
            strategy,
            attribution,
            generated_at: Utc::now(),
        })
    }

    fn plan_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn unavailable(part_id: &str, source: StoreError) -> ReplenishError {
    ReplenishError::DataUnavailable {
        part_id: part_id.to_string(),
        source,
    }
}
