//! Persistence of the model/feature-list artifact pair.
//!
//! The two files are always written together and bound by a shared model
//! id: a consumer must never score with a model whose feature list it does
//! not hold, since a column mismatch at inference time corrupts
//! predictions silently. Writes go to a temp file in the destination
//! directory followed by a rename.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use lift_core::{LiftError, LiftResult};
use lift_features::{align_to, FeatureMatrix};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::gbdt::ConversionModel;

pub const MODEL_FILE: &str = "conversion_model.json";
pub const FEATURES_FILE: &str = "model_features.json";

/// The fitted classifier plus the exact ordered feature list it was fit on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub model: ConversionModel,
}

/// The standalone feature list consumed by the dashboard side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureListArtifact {
    pub model_id: Uuid,
    pub feature_names: Vec<String>,
}

impl ModelArtifact {
    /// Align `matrix` to the persisted feature list and predict.
    pub fn score(&self, matrix: &FeatureMatrix) -> LiftResult<Vec<f32>> {
        let aligned = align_to(matrix, &self.feature_names)?;
        self.model.predict_proba(&aligned)
    }
}

/// Persist the pair under `dir`, returning the bound artifact.
pub fn save_pair(
    dir: &Path,
    model: &ConversionModel,
    feature_names: &[String],
) -> LiftResult<ModelArtifact> {
    ensure_unique(feature_names)?;
    if feature_names.len() != model.n_features() {
        return Err(LiftError::Artifact(format!(
            "model was fit on {} features but the list has {}",
            model.n_features(),
            feature_names.len()
        )));
    }

    fs::create_dir_all(dir)?;
    let artifact = ModelArtifact {
        model_id: Uuid::new_v4(),
        created_at: Utc::now(),
        feature_names: feature_names.to_vec(),
        model: model.clone(),
    };
    let features = FeatureListArtifact {
        model_id: artifact.model_id,
        feature_names: feature_names.to_vec(),
    };

    write_atomic(&dir.join(MODEL_FILE), &serde_json::to_vec_pretty(&artifact)?)?;
    write_atomic(&dir.join(FEATURES_FILE), &serde_json::to_vec_pretty(&features)?)?;

    info!(
        model_id = %artifact.model_id,
        dir = %dir.display(),
        features = feature_names.len(),
        "Persisted model artifact pair"
    );
    Ok(artifact)
}

/// Load and cross-check the pair from `dir`.
pub fn load_pair(dir: &Path) -> LiftResult<ModelArtifact> {
    let model_path = dir.join(MODEL_FILE);
    let features_path = dir.join(FEATURES_FILE);

    let artifact: ModelArtifact = serde_json::from_slice(&fs::read(&model_path).map_err(
        |e| LiftError::Artifact(format!("cannot read {}: {e}", model_path.display())),
    )?)?;
    let features: FeatureListArtifact = serde_json::from_slice(&fs::read(&features_path).map_err(
        |e| LiftError::Artifact(format!("cannot read {}: {e}", features_path.display())),
    )?)?;

    if artifact.model_id != features.model_id {
        return Err(LiftError::Artifact(format!(
            "artifact pair mismatch: model {} vs feature list {}",
            artifact.model_id, features.model_id
        )));
    }
    if artifact.feature_names != features.feature_names {
        return Err(LiftError::Artifact(
            "artifact pair mismatch: feature lists differ".to_string(),
        ));
    }
    ensure_unique(&artifact.feature_names)?;

    info!(model_id = %artifact.model_id, dir = %dir.display(), "Loaded model artifact pair");
    Ok(artifact)
}

fn ensure_unique(names: &[String]) -> LiftResult<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(LiftError::Artifact(format!(
                "duplicate feature name '{name}' in feature list"
            )));
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> LiftResult<()> {
    let dir = path.parent().ok_or_else(|| {
        LiftError::Artifact(format!("no parent directory for {}", path.display()))
    })?;
    let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
