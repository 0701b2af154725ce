pub mod artifact;
pub mod classifier;
pub mod inference;
pub mod orchestrator;
pub mod preprocess;
pub mod validator;

pub use crate::domain::model::{ErrorSet, Field, InputRecord, Prediction, RiskLabel, ValidatedRecord};
pub use crate::domain::ports::{Classifier, ConfigProvider, Preprocessor, RiskPredictor, Storage};
pub use crate::utils::error::Result;
