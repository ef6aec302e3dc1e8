//! Orchestrator Events
//!
//! Every UI action and every coordinator follow-up is one of these events.
//! The reducer folds them into `StepAnalysesState`; coordinators observe the
//! same stream and answer with further events.

use serde::{Deserialize, Serialize};

use crate::panel::{Panel, SubmissionOutcome};
use crate::types::{AnalysisChoice, AnalysisStatus, ParamValues, PanelId, StepId, StrategyId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum AnalysisEvent {
    /// Hard reset to a fresh state for the given step.
    StartLoadingTabListing {
        step_id: StepId,
        strategy_id: StrategyId,
    },
    FinishLoadingTabListing {
        tabs: Vec<Panel>,
        choices: Vec<AnalysisChoice>,
    },
    SelectTab {
        panel_id: Option<PanelId>,
    },
    StartLoadingSavedTab {
        panel_id: PanelId,
    },
    FinishLoadingSavedTab {
        panel_id: PanelId,
        loaded: Panel,
    },
    StartLoadingChosenAnalysisTab {
        panel_id: PanelId,
        choice: AnalysisChoice,
    },
    FinishLoadingChosenAnalysisTab {
        panel_id: PanelId,
        loaded: Panel,
    },
    CreateNewTab {
        initial: Panel,
    },
    DeleteAnalysis {
        panel_id: PanelId,
    },
    RemoveTab {
        panel_id: PanelId,
    },
    StartFormSubmission {
        panel_id: PanelId,
    },
    FailFormSubmission {
        panel_id: PanelId,
        error_message: Option<String>,
        validation_errors: Vec<String>,
    },
    RunAnalysis {
        panel_id: PanelId,
    },
    AnalysisStatusChanged {
        panel_id: PanelId,
        status: AnalysisStatus,
    },
    CheckResultStatus {
        panel_id: PanelId,
    },
    CountDown {
        panel_id: PanelId,
    },
    FinishFormSubmission {
        panel_id: PanelId,
        outcome: SubmissionOutcome,
    },
    RenameAnalysis {
        panel_id: PanelId,
        new_display_name: String,
    },
    RenameTab {
        panel_id: PanelId,
        new_display_name: String,
    },
    DuplicateAnalysis {
        panel_id: PanelId,
    },
    UpdateParamValues {
        panel_id: PanelId,
        values: ParamValues,
    },
    ToggleDescription {
        panel_id: PanelId,
    },
    ToggleParameters {
        panel_id: PanelId,
    },
}

impl AnalysisEvent {
    /// The panel this event targets, if any.
    pub fn panel_id(&self) -> Option<PanelId> {
        match self {
            AnalysisEvent::StartLoadingTabListing { .. }
            | AnalysisEvent::FinishLoadingTabListing { .. }
            | AnalysisEvent::CreateNewTab { .. } => None,
            AnalysisEvent::SelectTab { panel_id } => *panel_id,
            AnalysisEvent::StartLoadingSavedTab { panel_id }
            | AnalysisEvent::FinishLoadingSavedTab { panel_id, .. }
            | AnalysisEvent::StartLoadingChosenAnalysisTab { panel_id, .. }
            | AnalysisEvent::FinishLoadingChosenAnalysisTab { panel_id, .. }
            | AnalysisEvent::DeleteAnalysis { panel_id }
            | AnalysisEvent::RemoveTab { panel_id }
            | AnalysisEvent::StartFormSubmission { panel_id }
            | AnalysisEvent::FailFormSubmission { panel_id, .. }
            | AnalysisEvent::RunAnalysis { panel_id }
            | AnalysisEvent::AnalysisStatusChanged { panel_id, .. }
            | AnalysisEvent::CheckResultStatus { panel_id }
            | AnalysisEvent::CountDown { panel_id }
            | AnalysisEvent::FinishFormSubmission { panel_id, .. }
            | AnalysisEvent::RenameAnalysis { panel_id, .. }
            | AnalysisEvent::RenameTab { panel_id, .. }
            | AnalysisEvent::DuplicateAnalysis { panel_id }
            | AnalysisEvent::UpdateParamValues { panel_id, .. }
            | AnalysisEvent::ToggleDescription { panel_id }
            | AnalysisEvent::ToggleParameters { panel_id } => Some(*panel_id),
        }
    }

    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisEvent::StartLoadingTabListing { .. } => "StartLoadingTabListing",
            AnalysisEvent::FinishLoadingTabListing { .. } => "FinishLoadingTabListing",
            AnalysisEvent::SelectTab { .. } => "SelectTab",
            AnalysisEvent::StartLoadingSavedTab { .. } => "StartLoadingSavedTab",
            AnalysisEvent::FinishLoadingSavedTab { .. } => "FinishLoadingSavedTab",
            AnalysisEvent::StartLoadingChosenAnalysisTab { .. } => "StartLoadingChosenAnalysisTab",
            AnalysisEvent::FinishLoadingChosenAnalysisTab { .. } => {
                "FinishLoadingChosenAnalysisTab"
            }
            AnalysisEvent::CreateNewTab { .. } => "CreateNewTab",
            AnalysisEvent::DeleteAnalysis { .. } => "DeleteAnalysis",
            AnalysisEvent::RemoveTab { .. } => "RemoveTab",
            AnalysisEvent::StartFormSubmission { .. } => "StartFormSubmission",
            AnalysisEvent::FailFormSubmission { .. } => "FailFormSubmission",
            AnalysisEvent::RunAnalysis { .. } => "RunAnalysis",
            AnalysisEvent::AnalysisStatusChanged { .. } => "AnalysisStatusChanged",
            AnalysisEvent::CheckResultStatus { .. } => "CheckResultStatus",
            AnalysisEvent::CountDown { .. } => "CountDown",
            AnalysisEvent::FinishFormSubmission { .. } => "FinishFormSubmission",
            AnalysisEvent::RenameAnalysis { .. } => "RenameAnalysis",
            AnalysisEvent::RenameTab { .. } => "RenameTab",
            AnalysisEvent::DuplicateAnalysis { .. } => "DuplicateAnalysis",
            AnalysisEvent::UpdateParamValues { .. } => "UpdateParamValues",
            AnalysisEvent::ToggleDescription { .. } => "ToggleDescription",
            AnalysisEvent::ToggleParameters { .. } => "ToggleParameters",
        }
    }
}
