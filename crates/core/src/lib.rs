//! Step Analysis Core
//!
//! The pure half of the step analysis orchestrator: the panel state model,
//! the store state and its reducer, view projections, and the collaborator
//! traits the impure half is written against. This crate performs no I/O and
//! spawns no tasks.
//!
//! ## Module Organization
//!
//! - `types` - Domain types exchanged with the execution service
//! - `panel` - `Panel` sum type and its exhaustive matcher
//! - `state` - `StepAnalysesState`, the per-step store snapshot
//! - `event` - `AnalysisEvent`, every action and follow-up
//! - `reducer` - `reduce(state, event) -> state`
//! - `view` - Selectors for the presentation side
//! - `error` - `ServiceError`, `ValidationErrors`
//! - `service` / `presenter` - Collaborator traits
//!
//! ## Design Principles
//!
//! 1. **Pure transitions** - every state/event combination is testable without a network
//! 2. **Exhaustive panel access** - variant contents are reached only through `PanelMatcher`
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod event;
pub mod panel;
pub mod presenter;
pub mod reducer;
pub mod service;
pub mod state;
pub mod types;
pub mod view;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{ServiceError, ServiceResult, ValidationErrors};

// ── Domain Types ───────────────────────────────────────────────────────
pub use types::{
    empty_result, initial_param_values, is_autorun_type, AnalysisChoice, AnalysisConfig,
    AnalysisId, AnalysisStatus, AppliedAnalysis, NewAnalysis, PanelId, PanelUiState, ParamSpec,
    ParamValues, ResultContents, StepId, StrategyId,
};

// ── Panel State Model ──────────────────────────────────────────────────
pub use panel::{
    AnalysisMenu, ConfigStatus, FormStatus, MenuStatus, Panel, PanelKind, PanelMatcher,
    SavedAnalysis, SubmissionOutcome, UninitializedPanel, UninitializedStatus, UnsavedAnalysis,
    MENU_TAB_LABEL,
};

// ── Store ──────────────────────────────────────────────────────────────
pub use event::AnalysisEvent;
pub use reducer::reduce;
pub use state::{StepAnalysesState, DEFAULT_POLL_BUDGET};

// ── Collaborators ──────────────────────────────────────────────────────
pub use presenter::{analysis_page_path, Presenter, DELETE_CONFIRMATION};
pub use service::AnalysisService;

// ── View Projections ───────────────────────────────────────────────────
pub use view::{is_settled, tab_configs, FormView, ResultView, TabConfig};
