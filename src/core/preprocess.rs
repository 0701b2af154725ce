//! Column-wise preprocessing applied before the classifier.
//!
//! Each transformer reads a subset of the 13 input columns and the outputs are
//! concatenated left to right, so the model sees
//! `[transformer_0 outputs | transformer_1 outputs | ...]`.

use crate::domain::model::Field;
use crate::domain::ports::Preprocessor;
use crate::utils::error::{Result, RiskError};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnTransform {
    StandardScaler {
        columns: Vec<Field>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    OneHot {
        columns: Vec<Field>,
        categories: Vec<Vec<f64>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough {
        columns: Vec<Field>,
    },
}

impl ColumnTransform {
    pub fn output_width(&self) -> usize {
        match self {
            ColumnTransform::StandardScaler { columns, .. }
            | ColumnTransform::Passthrough { columns } => columns.len(),
            ColumnTransform::OneHot { categories, .. } => categories.iter().map(Vec::len).sum(),
        }
    }

    fn check(&self) -> Result<()> {
        match self {
            ColumnTransform::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(RiskError::artifact(format!(
                        "standard_scaler has {} columns but {} means and {} scales",
                        columns.len(),
                        mean.len(),
                        scale.len()
                    )));
                }
                if let Some(pos) = mean.iter().position(|m| !m.is_finite()) {
                    return Err(RiskError::artifact(format!(
                        "standard_scaler mean for '{}' must be finite",
                        columns[pos]
                    )));
                }
                if let Some(pos) = scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
                    return Err(RiskError::artifact(format!(
                        "standard_scaler scale for '{}' must be finite and non-zero",
                        columns[pos]
                    )));
                }
            }
            ColumnTransform::OneHot {
                columns,
                categories,
                ..
            } => {
                if categories.len() != columns.len() {
                    return Err(RiskError::artifact(format!(
                        "one_hot has {} columns but {} category lists",
                        columns.len(),
                        categories.len()
                    )));
                }
                if let Some(pos) = categories.iter().position(Vec::is_empty) {
                    return Err(RiskError::artifact(format!(
                        "one_hot categories for '{}' are empty",
                        columns[pos]
                    )));
                }
            }
            ColumnTransform::Passthrough { .. } => {}
        }
        Ok(())
    }

    fn columns(&self) -> &[Field] {
        match self {
            ColumnTransform::StandardScaler { columns, .. }
            | ColumnTransform::OneHot { columns, .. }
            | ColumnTransform::Passthrough { columns } => columns,
        }
    }

    fn write_row(&self, row: &[f64], out: &mut Vec<f64>) -> Result<()> {
        match self {
            ColumnTransform::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for ((field, m), s) in columns.iter().zip(mean).zip(scale) {
                    out.push((value_of(row, *field)? - m) / s);
                }
            }
            ColumnTransform::OneHot {
                columns,
                categories,
                handle_unknown,
            } => {
                for (field, cats) in columns.iter().zip(categories) {
                    let value = value_of(row, *field)?;
                    let hit = cats.iter().position(|c| *c == value);
                    if hit.is_none() && *handle_unknown == HandleUnknown::Error {
                        return Err(RiskError::inference(format!(
                            "Found unknown category {} in column {} during transform",
                            value, field
                        )));
                    }
                    out.extend((0..cats.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
                }
            }
            ColumnTransform::Passthrough { columns } => {
                for field in columns {
                    out.push(value_of(row, *field)?);
                }
            }
        }
        Ok(())
    }
}

fn value_of(row: &[f64], field: Field) -> Result<f64> {
    let idx = Field::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or(Field::ALL.len());
    row.get(idx).copied().ok_or_else(|| {
        RiskError::inference(format!("column {} missing from feature frame", field))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub transformers: Vec<ColumnTransform>,
}

impl ColumnTransformer {
    /// Structural checks run once when the artifact is loaded.
    pub fn check(&self) -> Result<()> {
        if self.transformers.is_empty() {
            return Err(RiskError::artifact("preprocessor has no transformers"));
        }
        let mut seen = Vec::new();
        for transform in &self.transformers {
            transform.check()?;
            for field in transform.columns() {
                if seen.contains(field) {
                    return Err(RiskError::artifact(format!(
                        "column '{}' is consumed by more than one transformer",
                        field
                    )));
                }
                seen.push(*field);
            }
        }
        Ok(())
    }
}

impl Preprocessor for ColumnTransformer {
    fn transform(&self, frame: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if frame.ncols() != Field::ALL.len() {
            return Err(RiskError::inference(format!(
                "feature frame has {} columns, expected {}",
                frame.ncols(),
                Field::ALL.len()
            )));
        }

        let width = self.output_width();
        let mut data = Vec::with_capacity(frame.nrows() * width);
        for row in frame.rows() {
            let row = row.to_vec();
            for transform in &self.transformers {
                transform.write_row(&row, &mut data)?;
            }
        }

        Array2::from_shape_vec((frame.nrows(), width), data)
            .map_err(|e| RiskError::inference(format!("transform produced a bad shape: {}", e)))
    }

    fn output_width(&self) -> usize {
        self.transformers.iter().map(ColumnTransform::output_width).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn frame() -> Array2<f64> {
        // age sex cp trestbps chol fbs restecg thalach exang oldpeak slope ca thal
        array![[50.0, 1.0, 2.0, 130.0, 250.0, 0.0, 1.0, 150.0, 0.0, 1.0, 1.0, 0.0, 2.0]]
    }

    #[test]
    fn test_concatenates_transformer_outputs() {
        let pre = ColumnTransformer {
            transformers: vec![
                ColumnTransform::StandardScaler {
                    columns: vec![Field::Age, Field::Oldpeak],
                    mean: vec![54.0, 1.0],
                    scale: vec![2.0, 0.5],
                },
                ColumnTransform::OneHot {
                    columns: vec![Field::Cp],
                    categories: vec![vec![0.0, 1.0, 2.0, 3.0]],
                    handle_unknown: HandleUnknown::Error,
                },
                ColumnTransform::Passthrough {
                    columns: vec![Field::Sex],
                },
            ],
        };
        pre.check().unwrap();
        assert_eq!(pre.output_width(), 7);

        let out = pre.transform(frame().view()).unwrap();
        assert_eq!(out.shape(), &[1, 7]);
        assert_eq!(out.row(0).to_vec(), vec![-2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category() {
        let strict = ColumnTransform::OneHot {
            columns: vec![Field::Thal],
            categories: vec![vec![0.0, 1.0]],
            handle_unknown: HandleUnknown::Error,
        };
        let pre = ColumnTransformer {
            transformers: vec![strict],
        };
        assert!(pre.transform(frame().view()).is_err());

        let lenient = ColumnTransformer {
            transformers: vec![ColumnTransform::OneHot {
                columns: vec![Field::Thal],
                categories: vec![vec![0.0, 1.0]],
                handle_unknown: HandleUnknown::Ignore,
            }],
        };
        let out = lenient.transform(frame().view()).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_check_rejects_zero_scale_and_duplicates() {
        let zero = ColumnTransformer {
            transformers: vec![ColumnTransform::StandardScaler {
                columns: vec![Field::Age],
                mean: vec![0.0],
                scale: vec![0.0],
            }],
        };
        assert!(zero.check().is_err());

        let nan_mean = ColumnTransformer {
            transformers: vec![ColumnTransform::StandardScaler {
                columns: vec![Field::Age],
                mean: vec![f64::NAN],
                scale: vec![1.0],
            }],
        };
        assert!(nan_mean.check().is_err());

        let dup = ColumnTransformer {
            transformers: vec![
                ColumnTransform::Passthrough {
                    columns: vec![Field::Age],
                },
                ColumnTransform::Passthrough {
                    columns: vec![Field::Age],
                },
            ],
        };
        assert!(dup.check().is_err());
    }

    #[test]
    fn test_rejects_narrow_frame() {
        let pre = ColumnTransformer {
            transformers: vec![ColumnTransform::Passthrough {
                columns: vec![Field::Age],
            }],
        };
        let narrow = Array2::<f64>::zeros((1, 3));
        assert!(pre.transform(narrow.view()).is_err());
    }
}
