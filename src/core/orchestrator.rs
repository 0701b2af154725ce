//! Per-request state machine:
//!
//! ```text
//! AwaitingInput → Validating → Invalid
//!                            → Ready → Predicting → Succeeded
//!                                                 → Failed
//! ```

use crate::core::validator;
use crate::domain::model::{ErrorSet, InputRecord, Prediction, ValidatedRecord};
use crate::domain::ports::RiskPredictor;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub const GENERAL_ERROR_PREFIX: &str = "Terjadi kesalahan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingInput,
    Validating,
    Invalid,
    Ready,
    Predicting,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub enum RequestState {
    AwaitingInput(InputRecord),
    Validating(InputRecord),
    Invalid {
        errors: ErrorSet,
        inputs: BTreeMap<String, String>,
    },
    Ready(ValidatedRecord),
    Predicting(ValidatedRecord),
    Succeeded {
        prediction: Prediction,
        inputs: BTreeMap<String, String>,
    },
    Failed {
        errors: ErrorSet,
        inputs: BTreeMap<String, String>,
    },
}

impl RequestState {
    pub fn phase(&self) -> Phase {
        match self {
            RequestState::AwaitingInput(_) => Phase::AwaitingInput,
            RequestState::Validating(_) => Phase::Validating,
            RequestState::Invalid { .. } => Phase::Invalid,
            RequestState::Ready(_) => Phase::Ready,
            RequestState::Predicting(_) => Phase::Predicting,
            RequestState::Succeeded { .. } => Phase::Succeeded,
            RequestState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase(),
            Phase::Invalid | Phase::Succeeded | Phase::Failed
        )
    }
}

/// Terminal result of one request.
#[derive(Debug, Clone)]
pub enum Outcome {
    Invalid {
        errors: ErrorSet,
        inputs: BTreeMap<String, String>,
    },
    Succeeded {
        prediction: Prediction,
        inputs: BTreeMap<String, String>,
    },
    Failed {
        errors: ErrorSet,
        inputs: BTreeMap<String, String>,
    },
}

impl Outcome {
    pub fn phase(&self) -> Phase {
        match self {
            Outcome::Invalid { .. } => Phase::Invalid,
            Outcome::Succeeded { .. } => Phase::Succeeded,
            Outcome::Failed { .. } => Phase::Failed,
        }
    }

    pub fn inputs(&self) -> &BTreeMap<String, String> {
        match self {
            Outcome::Invalid { inputs, .. }
            | Outcome::Succeeded { inputs, .. }
            | Outcome::Failed { inputs, .. } => inputs,
        }
    }
}

/// Outcome plus the phases visited on the way there.
#[derive(Debug, Clone)]
pub struct RequestReport {
    pub outcome: Outcome,
    pub trace: Vec<Phase>,
}

pub struct RequestOrchestrator {
    predictor: Arc<dyn RiskPredictor>,
}

impl RequestOrchestrator {
    pub fn new(predictor: Arc<dyn RiskPredictor>) -> Self {
        Self { predictor }
    }

    /// Drive one submission to a terminal state.
    pub async fn handle(&self, input: InputRecord) -> RequestReport {
        let echoed = input.echo();
        let mut state = RequestState::AwaitingInput(input);
        let mut trace = vec![state.phase()];

        while !state.is_terminal() {
            state = self.step(state, &echoed).await;
            tracing::debug!(phase = %state.phase(), "request state changed");
            trace.push(state.phase());
        }

        let outcome = match state {
            RequestState::Invalid { errors, inputs } => Outcome::Invalid { errors, inputs },
            RequestState::Succeeded { prediction, inputs } => {
                Outcome::Succeeded { prediction, inputs }
            }
            RequestState::Failed { errors, inputs } => Outcome::Failed { errors, inputs },
            // 迴圈只在終止狀態結束
            other => Outcome::Failed {
                errors: ErrorSet::general(format!(
                    "{}: request stopped in {}",
                    GENERAL_ERROR_PREFIX,
                    other.phase()
                )),
                inputs: echoed,
            },
        };

        RequestReport { outcome, trace }
    }

    async fn step(&self, state: RequestState, echoed: &BTreeMap<String, String>) -> RequestState {
        match state {
            RequestState::AwaitingInput(input) => RequestState::Validating(input),
            RequestState::Validating(input) => match validator::validate(&input) {
                Ok(record) => RequestState::Ready(record),
                Err(errors) => {
                    tracing::info!("⚠️ Submission rejected with {} field error(s)", errors.len());
                    RequestState::Invalid {
                        errors,
                        inputs: echoed.clone(),
                    }
                }
            },
            RequestState::Ready(record) => RequestState::Predicting(record),
            RequestState::Predicting(record) => match self.predictor.predict(&record).await {
                Ok(prediction) => RequestState::Succeeded {
                    prediction,
                    inputs: record.echo(),
                },
                Err(e) => {
                    tracing::error!(
                        "❌ Inference failed: {} (Category: {:?}, Severity: {:?})",
                        e,
                        e.category(),
                        e.severity()
                    );
                    RequestState::Failed {
                        errors: ErrorSet::general(format!("{}: {}", GENERAL_ERROR_PREFIX, e)),
                        inputs: record.echo(),
                    }
                }
            },
            terminal => terminal,
        }
    }
}
