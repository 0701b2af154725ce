use crate::core::artifact::RiskPipeline;
use crate::domain::model::{Field, Prediction, RiskLabel, ValidatedRecord};
use crate::domain::ports::RiskPredictor;
use crate::utils::error::{Result, RiskError};
use async_trait::async_trait;
use ndarray::Array2;
use std::sync::Arc;

/// Numeric frame for one record: a single row, columns in canonical field order.
pub fn to_frame(record: &ValidatedRecord) -> Result<Array2<f64>> {
    let mut row = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let raw = record.get(field);
        let value: f64 = raw.parse().map_err(|_| {
            RiskError::inference(format!("could not convert {}='{}' to a number", field, raw))
        })?;
        row.push(value);
    }
    Array2::from_shape_vec((1, Field::ALL.len()), row)
        .map_err(|e| RiskError::inference(e.to_string()))
}

/// Runs the loaded pipeline on validated records.
#[derive(Debug, Clone)]
pub struct InferenceInvoker {
    pipeline: Arc<RiskPipeline>,
}

impl InferenceInvoker {
    pub fn new(pipeline: Arc<RiskPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &RiskPipeline {
        &self.pipeline
    }

    /// transform → predict → (predict_proba when supported)
    pub fn run(&self, record: &ValidatedRecord) -> Result<Prediction> {
        let frame = to_frame(record)?;
        let x = self.pipeline.preprocessor().transform(frame.view())?;

        let model = self.pipeline.model();
        let class = model
            .predict(x.view())?
            .first()
            .copied()
            .ok_or_else(|| RiskError::inference("model returned no prediction"))?;
        let label = RiskLabel::from_class(class)
            .ok_or_else(|| RiskError::inference(format!("model returned unknown class {}", class)))?;

        let probability = match model.probabilistic() {
            Some(proba_model) => {
                let proba = proba_model.predict_proba(x.view())?;
                let best = proba
                    .row(0)
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max);
                if !(0.0..=1.0).contains(&best) {
                    return Err(RiskError::inference(format!(
                        "model returned probability {} outside [0, 1]",
                        best
                    )));
                }
                Some(best)
            }
            None => None,
        };

        tracing::info!(
            "Prediction: {}, Probability: {:?}, Result: {}",
            label.code(),
            probability,
            label.text()
        );

        Ok(Prediction { label, probability })
    }
}

#[async_trait]
impl RiskPredictor for InferenceInvoker {
    async fn predict(&self, record: &ValidatedRecord) -> Result<Prediction> {
        let invoker = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || invoker.run(&record))
            .await
            .map_err(|e| RiskError::inference(format!("inference task failed: {}", e)))?
    }

    fn model_name(&self) -> &str {
        self.pipeline.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::validate;
    use crate::domain::model::InputRecord;
    use crate::domain::ports::{Classifier, Preprocessor};
    use ndarray::{ArrayView2, Array2};

    const PASSTHROUGH_TREE: &str = r#"{
        "format_version": 1,
        "name": "age-tree",
        "preprocessor": {"transformers": [{"kind": "passthrough", "columns": ["age"]}]},
        "model": {
            "kind": "decision_tree",
            "classes": [0, 1],
            "n_features": 1,
            "nodes": [
                {"split": {"feature": 0, "threshold": 55.0, "left": 1, "right": 2}},
                {"leaf": {"class_counts": [9.0, 1.0]}},
                {"leaf": {"class_counts": [2.0, 6.0]}}
            ]
        }
    }"#;

    fn record(age: &str) -> ValidatedRecord {
        let input: InputRecord = [
            ("age", age),
            ("sex", "1"),
            ("cp", "0"),
            ("trestbps", "120"),
            ("chol", "200"),
            ("fbs", "0"),
            ("restecg", "0"),
            ("thalach", "150"),
            ("exang", "0"),
            ("oldpeak", "1.0"),
            ("slope", "1"),
            ("ca", "0"),
            ("thal", "1"),
        ]
        .into_iter()
        .collect();
        validate(&input).unwrap()
    }

    fn invoker() -> InferenceInvoker {
        let pipeline = RiskPipeline::from_json_slice(PASSTHROUGH_TREE.as_bytes()).unwrap();
        InferenceInvoker::new(Arc::new(pipeline))
    }

    #[test]
    fn test_frame_follows_field_order() {
        let frame = to_frame(&record("45")).unwrap();
        assert_eq!(frame.shape(), &[1, 13]);
        assert_eq!(frame[[0, 0]], 45.0);
        assert_eq!(frame[[0, 9]], 1.0);
        assert_eq!(frame[[0, 12]], 1.0);
    }

    #[test]
    fn test_run_returns_label_and_max_probability() {
        let young = invoker().run(&record("45")).unwrap();
        assert_eq!(young.label, RiskLabel::NotAtRisk);
        assert!((young.probability.unwrap() - 0.9).abs() < 1e-12);

        let old = invoker().run(&record("70")).unwrap();
        assert_eq!(old.label, RiskLabel::AtRisk);
        assert!((old.probability.unwrap() - 0.75).abs() < 1e-12);
    }

    struct ExplodingPreprocessor;

    impl Preprocessor for ExplodingPreprocessor {
        fn transform(&self, _frame: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
            Err(RiskError::inference("transform exploded"))
        }

        fn output_width(&self) -> usize {
            1
        }
    }

    struct ConstantModel;

    impl Classifier for ConstantModel {
        fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>> {
            Ok(vec![1; x.nrows()])
        }

        fn input_width(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_transform_failure_propagates() {
        let pipeline =
            RiskPipeline::new("broken", Box::new(ExplodingPreprocessor), Box::new(ConstantModel))
                .unwrap();
        let err = InferenceInvoker::new(Arc::new(pipeline))
            .run(&record("45"))
            .unwrap_err();
        assert_eq!(err.to_string(), "transform exploded");
    }

    #[tokio::test]
    async fn test_predictor_without_probability() {
        let pipeline = RiskPipeline::new(
            "constant",
            Box::new(crate::core::preprocess::ColumnTransformer {
                transformers: vec![crate::core::preprocess::ColumnTransform::Passthrough {
                    columns: vec![Field::Age],
                }],
            }),
            Box::new(ConstantModel),
        )
        .unwrap();
        let invoker = InferenceInvoker::new(Arc::new(pipeline));

        let prediction = invoker.predict(&record("45")).await.unwrap();
        assert_eq!(prediction.label, RiskLabel::AtRisk);
        assert_eq!(prediction.probability, None);
        assert_eq!(invoker.model_name(), "constant");
    }
}
