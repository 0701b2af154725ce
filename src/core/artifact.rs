use crate::core::classifier::ModelSpec;
use crate::core::preprocess::ColumnTransformer;
use crate::domain::ports::{Classifier, Preprocessor, Storage};
use crate::utils::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// On-disk layout of a fitted pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format_version: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub preprocessor: ColumnTransformer,
    pub model: ModelSpec,
}

/// Loaded, checked pipeline. Immutable once built.
pub struct RiskPipeline {
    name: String,
    model_kind: &'static str,
    preprocessor: Box<dyn Preprocessor>,
    model: Box<dyn Classifier>,
}

impl std::fmt::Debug for RiskPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskPipeline")
            .field("name", &self.name)
            .field("model_kind", &self.model_kind)
            .field("features", &self.preprocessor.output_width())
            .finish()
    }
}

impl RiskPipeline {
    pub fn new(
        name: impl Into<String>,
        preprocessor: Box<dyn Preprocessor>,
        model: Box<dyn Classifier>,
    ) -> Result<Self> {
        Self::with_kind(name, "custom", preprocessor, model)
    }

    fn with_kind(
        name: impl Into<String>,
        model_kind: &'static str,
        preprocessor: Box<dyn Preprocessor>,
        model: Box<dyn Classifier>,
    ) -> Result<Self> {
        if preprocessor.output_width() != model.input_width() {
            return Err(RiskError::artifact(format!(
                "preprocessor produces {} features but the model expects {}",
                preprocessor.output_width(),
                model.input_width()
            )));
        }
        Ok(Self {
            name: name.into(),
            model_kind,
            preprocessor,
            model,
        })
    }

    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self> {
        if artifact.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(RiskError::artifact(format!(
                "unsupported format_version {} (expected {})",
                artifact.format_version, SUPPORTED_FORMAT_VERSION
            )));
        }
        artifact.preprocessor.check()?;
        let kind = artifact.model.kind();
        let model = artifact.model.into_classifier()?;
        Self::with_kind(artifact.name, kind, Box::new(artifact.preprocessor), model)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let artifact: PipelineArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    /// Read and check the artifact through a storage backend.
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        tracing::debug!("Reading pipeline artifact from: {}", path);
        let bytes = storage.read_file(path).await?;
        let pipeline = Self::from_json_slice(&bytes)?;
        tracing::info!(
            "🧠 Loaded pipeline '{}' ({}, {} model features, probability output: {})",
            pipeline.name,
            pipeline.model_kind,
            pipeline.preprocessor.output_width(),
            pipeline.supports_probability()
        );
        Ok(pipeline)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_kind(&self) -> &str {
        self.model_kind
    }

    pub fn preprocessor(&self) -> &dyn Preprocessor {
        self.preprocessor.as_ref()
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    pub fn supports_probability(&self) -> bool {
        self.model.probabilistic().is_some()
    }
}
