//! Services
//!
//! Business logic services for the application.

pub mod step_analysis;

pub use step_analysis::{HttpAnalysisService, Orchestrator, OrchestratorHandle};
