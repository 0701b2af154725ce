use crate::domain::model::{Prediction, ValidatedRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use ndarray::{Array2, ArrayView2};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_address(&self) -> &str;
    fn model_path(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn json_logs(&self) -> bool;
}

/// Maps a numeric feature frame (one row per record, canonical field order)
/// to the model's input matrix.
pub trait Preprocessor: Send + Sync {
    fn transform(&self, frame: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
    fn output_width(&self) -> usize;
}

pub trait Classifier: Send + Sync {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>>;

    fn input_width(&self) -> usize;

    /// Capability check for probability output.
    fn probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        None
    }
}

pub trait ProbabilisticClassifier: Send + Sync {
    /// One row per sample, one column per class.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
}

#[async_trait]
pub trait RiskPredictor: Send + Sync {
    async fn predict(&self, record: &ValidatedRecord) -> Result<Prediction>;

    /// Name of the loaded model, for readiness reporting.
    fn model_name(&self) -> &str;
}
