//! Persisted model bundles.
//!
//! A trained network, its scaler and the attribution background travel
//! together in one JSON document so a bundle can never mix weights from one
//! run with normalisation from another. Writes go through a temp file and an
//! atomic rename.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ForecastKind;
use crate::error::Result;
use crate::model::SequenceRegressor;
use crate::preprocess::ScalingTransform;

/// Provenance carried alongside the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub kind: ForecastKind,
    pub feature_names: Vec<String>,
    pub window: usize,
    pub horizon: usize,
    pub trained_at: DateTime<Utc>,
    /// Rows that came from the store, before any synthetic extension.
    pub real_rows: usize,
    /// Rows actually used for fitting, synthetic included.
    pub training_rows: usize,
    pub best_val_loss: f64,
}

/// Complete persisted bundle for one forecast kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub network: SequenceRegressor,
    pub scaler: ScalingTransform,
    /// Background centroids for attribution, shape `(k, window * features)`.
    pub background: Array2<f64>,
    /// Cluster sizes behind each centroid, normalised to sum to one.
    pub background_weights: Vec<f64>,
}

/// Directory-backed storage, one file per forecast kind.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: ForecastKind) -> PathBuf {
        self.dir.join(format!("{}_model.json", kind.as_str()))
    }

    pub fn exists(&self, kind: ForecastKind) -> bool {
        self.path_for(kind).is_file()
    }

    /// Serialises the bundle and swaps it into place.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(artifact.metadata.kind);
        let staging = self.dir.join(format!(
            "{}_model.json.tmp",
            artifact.metadata.kind.as_str()
        ));

        let body = serde_json::to_string(artifact)?;
        fs::write(&staging, body)?;
        fs::rename(&staging, &path)?;

        info!(
            kind = artifact.metadata.kind.as_str(),
            path = %path.display(),
            best_val_loss = artifact.metadata.best_val_loss,
            "saved model artifact"
        );
        Ok(path)
    }

    /// Loads the bundle for `kind` if one has been saved.
    pub fn load(&self, kind: ForecastKind) -> Result<Option<ModelArtifact>> {
        let path = self.path_for(kind);
        if !path.is_file() {
            debug!(kind = kind.as_str(), "no artifact on disk");
            return Ok(None);
        }
        let body = fs::read_to_string(&path)?;
        let artifact: ModelArtifact = serde_json::from_str(&body)?;
        debug!(
            kind = kind.as_str(),
            trained_at = %artifact.metadata.trained_at,
            "loaded model artifact"
        );
        Ok(Some(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::error::ForecastError;
    use ndarray::{array, Array1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn sample_artifact(kind: ForecastKind) -> ModelArtifact {
        let config = NetworkConfig {
            hidden1: 4,
            hidden2: 3,
            dense_units: 2,
            dropout: 0.2,
            output_len: 1,
            output_relu: false,
        };
        let mut rng = StdRng::seed_from_u64(8);
        let network = SequenceRegressor::new(&config, 2, &mut rng);
        let scaler =
            ScalingTransform::fit(&array![[0.0, 10.0], [5.0, 20.0], [10.0, 30.0]]).unwrap();
        ModelArtifact {
            metadata: ArtifactMetadata {
                kind,
                feature_names: vec!["a".to_string(), "b".to_string()],
                window: 3,
                horizon: 1,
                trained_at: Utc::now(),
                real_rows: 40,
                training_rows: 200,
                best_val_loss: 0.123,
            },
            network,
            scaler,
            background: array![[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], [0.6, 0.5, 0.4, 0.3, 0.2, 0.1]],
            background_weights: vec![0.75, 0.25],
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let artifact = sample_artifact(ForecastKind::Rul);

        assert!(!store.exists(ForecastKind::Rul));
        let path = store.save(&artifact).unwrap();
        assert!(path.ends_with("rul_model.json"));
        assert!(store.exists(ForecastKind::Rul));

        let loaded = store.load(ForecastKind::Rul).unwrap().unwrap();
        assert_eq!(loaded.metadata, artifact.metadata);
        assert_eq!(loaded.background_weights, artifact.background_weights);

        let window = Array1::linspace(0.0, 1.0, 6)
            .into_shape((3, 2))
            .unwrap();
        assert_eq!(loaded.network.predict(&window), artifact.network.predict(&window));
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&sample_artifact(ForecastKind::Rul)).unwrap();

        assert!(!store.exists(ForecastKind::Demand));
        assert!(store.load(ForecastKind::Demand).unwrap().is_none());
    }

    #[test]
    fn test_missing_artifact_is_none_not_error() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("never_created"));
        assert!(store.load(ForecastKind::Rul).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        std::fs::write(store.path_for(ForecastKind::Demand), "{not json").unwrap();

        let err = store.load(ForecastKind::Demand).unwrap_err();
        assert!(matches!(err, ForecastError::Serialization(_)));
    }

    #[test]
    fn test_save_overwrites_previous_bundle() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let mut artifact = sample_artifact(ForecastKind::Rul);
        store.save(&artifact).unwrap();
        artifact.metadata.best_val_loss = 0.001;
        store.save(&artifact).unwrap();

        let loaded = store.load(ForecastKind::Rul).unwrap().unwrap();
        assert_eq!(loaded.metadata.best_val_loss, 0.001);
    }
}
