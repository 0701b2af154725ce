pub mod config;
pub mod core;
pub mod domain;
pub mod startup;
pub mod utils;
pub mod web;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{
    artifact::RiskPipeline, inference::InferenceInvoker, orchestrator::RequestOrchestrator,
};
pub use crate::utils::error::{Result, RiskError};
