//! Trained-artifact layout and loading

use crate::error::Result;
use crate::model::{Building, SequenceModel};
use crate::scaling::ScalerParams;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Where trained model artifacts live on disk.
///
/// The directory root is explicit configuration, never a process-wide
/// constant; each architecture owns a subdirectory per building:
/// `<root>/<building>/<architecture>/`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArtifactConfig {
    root: PathBuf,
}

impl ArtifactConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one building's artifacts for one architecture.
    pub fn model_dir(&self, building: &Building, architecture: &str) -> PathBuf {
        self.root.join(building.model_subdir()).join(architecture)
    }

    /// Path of the scaler-parameters artifact within a model directory.
    pub fn scaler_path(&self, building: &Building, architecture: &str) -> PathBuf {
        self.model_dir(building, architecture).join("scale.json")
    }
}

/// A loaded model plus the scaler parameters it was trained with.
///
/// The two travel together: the params' length and order match the feature
/// frame the engine builds (target, regressors, engineered columns), and
/// both are read-only after load.
pub struct ModelArtifacts {
    pub model: Arc<dyn SequenceModel>,
    pub scaler: ScalerParams,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("scaler_columns", &self.scaler.len())
            .finish()
    }
}

/// A model family that can bind itself to a building's trained artifacts
pub trait Architecture {
    /// Short directory name of this architecture ("lstm", "prophet", ...)
    fn name(&self) -> &str;

    /// Load the building's trained model and scaler parameters.
    fn load(&self, building: &Building, config: &ArtifactConfig) -> Result<ModelArtifacts>;
}

/// Read scaler parameters from a JSON artifact.
pub fn load_scaler_params(path: &Path) -> Result<ScalerParams> {
    let file = std::fs::File::open(path)?;
    let params: ScalerParams = serde_json::from_reader(BufReader::new(file))?;
    info!(path = %path.display(), columns = params.len(), "loaded scaler parameters");
    Ok(params)
}
