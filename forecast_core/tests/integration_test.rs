use forecast_core::artifact::{ArtifactMetadata, ArtifactStore, ModelArtifact};
use forecast_core::attribution::{Attribution, KernelExplainer};
use forecast_core::config::EngineConfig;
use forecast_core::model::SequenceRegressor;
use forecast_core::synthetic::{extend_sensor_history, SensorSynthesis};
use forecast_core::{
    fill_missing, fit, latest_window, resolve_tier, rul_windows, sample_interval, DataTier,
    ForecastError, ForecastKind, ScalingTransform,
};
use ndarray::{Array1, Array2};
use part_store::mock::generate_sensor_history;
use part_store::SensorRecord;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

/// Shrinks the shipping preset so tests train in well under a second.
fn small_rul_config() -> EngineConfig {
    let mut config = EngineConfig::rul_defaults();
    config.sequence.window = 6;
    config.network.hidden1 = 8;
    config.network.hidden2 = 6;
    config.network.dense_units = 4;
    config.training.epochs = 4;
    config.training.batch_size = 16;
    config.sampling.passes = 25;
    config.attribution.summary_points = 6;
    config.attribution.coalition_samples = 60;
    config
}

/// Projects sensor records onto the model feature order, missing readings
/// becoming NaN for the fill stage.
fn project(records: &[SensorRecord]) -> (Array2<f64>, Vec<f64>) {
    let mut matrix = Array2::zeros((records.len(), 7));
    let mut elapsed = Vec::with_capacity(records.len());
    for (i, r) in records.iter().enumerate() {
        matrix[[i, 0]] = r.operating_hours;
        matrix[[i, 1]] = r.temperature.unwrap_or(f64::NAN);
        matrix[[i, 2]] = r.vibration.unwrap_or(f64::NAN);
        matrix[[i, 3]] = r.pressure.unwrap_or(f64::NAN);
        matrix[[i, 4]] = r.current_load.unwrap_or(f64::NAN);
        matrix[[i, 5]] = r.rpm.unwrap_or(f64::NAN);
        matrix[[i, 6]] = r.error_code as f64;
        elapsed.push(r.operating_hours);
    }
    (matrix, elapsed)
}

#[test]
fn test_full_degradation_forecast_workflow() {
    let config = small_rul_config();
    let nominal_life = 2000.0;

    // 1. A part with a thin real history lands in the augmented tier
    let real = generate_sensor_history("P-100", 40, nominal_life, 0.0, 9);
    let tier = resolve_tier(real.len(), config.tier.thresholds);
    assert_eq!(tier, DataTier::Augmented);

    // 2. Synthetic extension carries the series to the training target
    let synthesis = SensorSynthesis::new(80, nominal_life);
    let extended = extend_sensor_history("P-100", &real, &synthesis, 9).unwrap();
    assert_eq!(extended.len(), 80);

    // 3. Project, fill gaps and scale
    let (mut matrix, elapsed) = project(&extended);
    fill_missing(&mut matrix);
    let scaler = ScalingTransform::fit(&matrix).unwrap();
    let scaled = scaler.apply(&matrix).unwrap();

    // 4. Window the series against remaining-life targets
    let (windows, targets) = rul_windows(&scaled, &elapsed, nominal_life, config.sequence.window).unwrap();
    assert_eq!(windows.len(), 80 - config.sequence.window);
    assert!(targets.iter().all(|t| t[0] >= 0.0));

    // 5. Train
    let mut rng = StdRng::seed_from_u64(config.training.seed);
    let mut network = SequenceRegressor::new(&config.network, 7, &mut rng);
    let report = fit(&mut network, &windows, &targets, &config.training).unwrap();
    assert!(report.best_val_loss.is_finite());
    assert!(report.epochs_run >= 1);

    // 6. Uncertainty band around the newest window
    let query = latest_window(&scaled, config.sequence.window);
    let interval = sample_interval(&network, &query, config.sampling.passes, 7).unwrap();
    assert!(interval.lower[0] >= 0.0);
    assert!(interval.lower[0] <= interval.upper[0]);

    // 7. Ranked attribution against the training windows
    let explainer = KernelExplainer::new(
        &network,
        &windows,
        (config.sequence.window, 7),
        config.attribution,
        config.training.seed,
    );
    match explainer.explain(&query, &config.sequence.feature_names, 5) {
        Attribution::Ranked(entries) => {
            assert!(!entries.is_empty());
            assert!(entries.len() <= config.attribution.top_k);
            for pair in entries.windows(2) {
                assert!(pair[0].magnitude >= pair[1].magnitude);
            }
        }
        Attribution::Unavailable { reason } => panic!("attribution failed: {reason}"),
    }

    // 8. Persist the bundle and reload it in one piece
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let (background, background_weights) = {
        let (centroids, weights) = explainer.background();
        (centroids.clone(), weights.to_vec())
    };
    let artifact = ModelArtifact {
        metadata: ArtifactMetadata {
            kind: ForecastKind::Rul,
            feature_names: config.sequence.feature_names.clone(),
            window: config.sequence.window,
            horizon: 1,
            trained_at: chrono::Utc::now(),
            real_rows: real.len(),
            training_rows: extended.len(),
            best_val_loss: report.best_val_loss,
        },
        network,
        scaler,
        background,
        background_weights,
    };
    store.save(&artifact).unwrap();

    let reloaded = store.load(ForecastKind::Rul).unwrap().unwrap();
    assert_eq!(reloaded.metadata.real_rows, 40);
    assert_eq!(
        reloaded.network.predict(&query),
        artifact.network.predict(&query)
    );
    let rescaled = reloaded.scaler.apply(&matrix).unwrap();
    assert_eq!(rescaled, scaled);

    // 9. Error handling
    let too_few: Vec<Array2<f64>> = windows[..1].to_vec();
    let one_target: Vec<Array1<f64>> = targets[..1].to_vec();
    let mut fresh = SequenceRegressor::new(&config.network, 7, &mut rng);
    let err = fit(&mut fresh, &too_few, &one_target, &config.training).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidInput(_)));
}

#[test]
fn test_multi_step_forecast_interval_covers_horizon() {
    let mut config = EngineConfig::demand_defaults();
    config.sequence.window = 5;
    config.network.hidden1 = 8;
    config.network.hidden2 = 6;
    config.network.dense_units = 4;
    config.training.epochs = 3;
    config.training.batch_size = 8;

    // Seasonal-ish quantity series with three companion features
    let rows = 30;
    let matrix = Array2::from_shape_fn((rows, 6), |(r, c)| {
        ((r as f64 * 0.4 + c as f64).sin() * 0.5 + 0.5).abs()
    });
    let outbound: Vec<f64> = (0..rows).map(|r| 5.0 + (r as f64 * 0.5).sin() * 2.0).collect();

    let (windows, targets) = forecast_core::demand_windows(
        &matrix,
        &outbound,
        config.sequence.window,
        config.sequence.horizon,
    )
    .unwrap();
    assert_eq!(windows.len(), rows + 1 - config.sequence.window - config.sequence.horizon);
    assert_eq!(targets[0].len(), 3);

    let mut rng = StdRng::seed_from_u64(1);
    let mut network = SequenceRegressor::new(&config.network, 6, &mut rng);
    fit(&mut network, &windows, &targets, &config.training).unwrap();

    let interval = sample_interval(&network, &windows[0], 30, 3).unwrap();
    assert_eq!(interval.output_len(), 3);
    for step in 0..3 {
        assert!(interval.lower[step] >= 0.0);
        assert!(interval.upper[step] >= interval.lower[step]);
        // Rectified output keeps every sampled mean non-negative
        assert!(interval.mean[step] >= 0.0);
    }
}
