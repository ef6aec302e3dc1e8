//! Step Analysis Orchestrator - Application Library
//!
//! Runs the analysis tabs attached to one workflow step: loads the tab
//! listing, hydrates saved analyses, submits and polls jobs on the remote
//! execution service, and keeps every panel's state consistent while doing
//! so. It includes:
//! - The orchestrator runtime, coordinators and polling scheduler
//! - A reqwest client for the execution service
//! - The per-type renderer registry
//! - Settings, config storage and utilities
//!
//! The pure state model lives in `step-analysis-core` and is re-exported as
//! [`core`].

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use step_analysis_core as core;

pub use models::settings::{OrchestratorSettings, SettingsUpdate};
pub use services::step_analysis::{
    AnalysisPluginRegistry, ConsolePresenter, HttpAnalysisService, Orchestrator,
    OrchestratorHandle,
};
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};
