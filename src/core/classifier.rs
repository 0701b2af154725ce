//! Binary classifiers that can be restored from a pipeline artifact.

use crate::domain::ports::{Classifier, ProbabilisticClassifier};
use crate::utils::error::{Result, RiskError};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

fn check_classes(classes: &[u8]) -> Result<()> {
    if classes.len() != 2 || classes[0] == classes[1] || classes.iter().any(|c| *c > 1) {
        return Err(RiskError::artifact(format!(
            "classes must be two distinct labels out of {{0, 1}}, got {:?}",
            classes
        )));
    }
    Ok(())
}

fn check_width(x: &ArrayView2<'_, f64>, expected: usize) -> Result<()> {
    if x.ncols() != expected {
        return Err(RiskError::inference(format!(
            "X has {} features, but the model is expecting {} features as input",
            x.ncols(),
            expected
        )));
    }
    Ok(())
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_v), (i, v)| {
            if *v > best_v {
                (i, *v)
            } else {
                (best, best_v)
            }
        })
        .0
}

/// A node in a fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Training samples per class that reached this leaf.
    Leaf { class_counts: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub classes: Vec<u8>,
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn check(&self) -> Result<()> {
        check_classes(&self.classes)?;
        if self.nodes.is_empty() {
            return Err(RiskError::artifact("decision tree has no nodes"));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if !threshold.is_finite() {
                        return Err(RiskError::artifact(format!(
                            "node {} has non-finite threshold {}",
                            idx, threshold
                        )));
                    }
                    if *feature >= self.n_features {
                        return Err(RiskError::artifact(format!(
                            "node {} splits on feature {} but the tree has {} features",
                            idx, feature, self.n_features
                        )));
                    }
                    // 子節點必須排在父節點之後，避免循環
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(RiskError::artifact(format!(
                                "node {} has invalid child index {}",
                                idx, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { class_counts } => {
                    if class_counts.len() != self.classes.len() {
                        return Err(RiskError::artifact(format!(
                            "leaf {} has {} class counts for {} classes",
                            idx,
                            class_counts.len(),
                            self.classes.len()
                        )));
                    }
                    if class_counts.iter().any(|c| *c < 0.0 || !c.is_finite())
                        || class_counts.iter().sum::<f64>() <= 0.0
                    {
                        return Err(RiskError::artifact(format!(
                            "leaf {} has invalid class counts {:?}",
                            idx, class_counts
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_for(&self, row: ArrayView1<'_, f64>) -> Result<&[f64]> {
        let mut idx = 0;
        // children always point forward, so the walk ends within nodes.len() steps
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { class_counts }) => return Ok(class_counts.as_slice()),
                None => break,
            }
        }
        Err(RiskError::inference(format!(
            "decision tree walk ended outside the tree at node {}",
            idx
        )))
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>> {
        check_width(&x, self.n_features)?;
        x.rows()
            .into_iter()
            .map(|row| {
                let counts = self.leaf_for(row)?;
                Ok(self.classes[argmax(counts)])
            })
            .collect()
    }

    fn input_width(&self) -> usize {
        self.n_features
    }

    fn probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for DecisionTree {
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_width(&x, self.n_features)?;
        let mut out = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, row) in x.rows().into_iter().enumerate() {
            let counts = self.leaf_for(row)?;
            let total: f64 = counts.iter().sum();
            for (j, count) in counts.iter().enumerate() {
                out[[i, j]] = count / total;
            }
        }
        Ok(out)
    }
}

/// Shared weights for linear models: `decision = coef · x + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearWeights {
    pub classes: Vec<u8>,
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LinearWeights {
    pub fn check(&self) -> Result<()> {
        check_classes(&self.classes)?;
        if self.coef.is_empty() {
            return Err(RiskError::artifact("linear model has no coefficients"));
        }
        if self.coef.iter().chain([&self.intercept]).any(|w| !w.is_finite()) {
            return Err(RiskError::artifact("linear model has non-finite weights"));
        }
        Ok(())
    }

    fn decision(&self, x: &ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        check_width(x, self.coef.len())?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&self.coef)
                    .map(|(v, w)| v * w)
                    .sum::<f64>()
                    + self.intercept
            })
            .collect())
    }

    fn labels(&self, decisions: &[f64]) -> Vec<u8> {
        decisions
            .iter()
            .map(|d| if *d > 0.0 { self.classes[1] } else { self.classes[0] })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogisticRegression(pub LinearWeights);

impl Classifier for LogisticRegression {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>> {
        Ok(self.0.labels(&self.0.decision(&x)?))
    }

    fn input_width(&self) -> usize {
        self.0.coef.len()
    }

    fn probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let decisions = self.0.decision(&x)?;
        let mut out = Array2::zeros((decisions.len(), 2));
        for (i, d) in decisions.iter().enumerate() {
            let p = 1.0 / (1.0 + (-d).exp());
            out[[i, 0]] = 1.0 - p;
            out[[i, 1]] = p;
        }
        Ok(out)
    }
}

/// Linear SVM: labels only, no probability output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearSvc(pub LinearWeights);

impl Classifier for LinearSvc {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>> {
        Ok(self.0.labels(&self.0.decision(&x)?))
    }

    fn input_width(&self) -> usize {
        self.0.coef.len()
    }
}

/// Serialized model section of the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    DecisionTree(DecisionTree),
    LogisticRegression(LinearWeights),
    LinearSvc(LinearWeights),
}

impl ModelSpec {
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>> {
        let model: Box<dyn Classifier> = match self {
            ModelSpec::DecisionTree(tree) => {
                tree.check()?;
                Box::new(tree)
            }
            ModelSpec::LogisticRegression(weights) => {
                weights.check()?;
                Box::new(LogisticRegression(weights))
            }
            ModelSpec::LinearSvc(weights) => {
                weights.check()?;
                Box::new(LinearSvc(weights))
            }
        };
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::DecisionTree(_) => "decision_tree",
            ModelSpec::LogisticRegression(_) => "logistic_regression",
            ModelSpec::LinearSvc(_) => "linear_svc",
        }
    }
}
