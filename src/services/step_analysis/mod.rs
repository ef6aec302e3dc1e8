//! Step Analysis Orchestrator
//!
//! The impure half of the orchestrator: event-driven coordinators, the
//! polling scheduler, the event-loop runtime hosting the store, the HTTP
//! service client and the per-type renderer registry.
//!
//! ## Module Organization
//!
//! - `runtime` - `Orchestrator` / `OrchestratorHandle`, the store host
//! - `coordinators` - One async reaction per event type
//! - `polling` - Status checks and the countdown loop
//! - `client` - reqwest implementation of `AnalysisService`
//! - `presenter` - Console implementation of `Presenter`
//! - `registry` - `AnalysisPluginRegistry`

pub mod client;
pub mod coordinators;
pub mod polling;
pub mod presenter;
pub mod registry;
pub mod runtime;

pub use client::HttpAnalysisService;
pub use coordinators::CoordinatorContext;
pub use presenter::ConsolePresenter;
pub use registry::{AnalysisPlugin, AnalysisPluginRegistry, FormRenderer, ResultRenderer};
pub use runtime::{Orchestrator, OrchestratorHandle};
