//! Panel State Model
//!
//! One tab's worth of analysis state. `Panel` is a closed sum type over the
//! four lifecycle stages; code outside this module reaches variant contents
//! only through [`Panel::transform`] (owned) or [`Panel::inspect`]
//! (borrowed), both exhaustive, so a new variant is a compile error at every
//! consumer.

use serde::{Deserialize, Serialize};

use crate::types::{
    empty_result, AnalysisChoice, AnalysisConfig, AnalysisId, AnalysisStatus, ParamSpec,
    ParamValues, PanelUiState, ResultContents,
};

/// Label of the "+ new analysis" tab.
pub const MENU_TAB_LABEL: &str = "Choose an Analysis";

// ---------------------------------------------------------------------------
// Variant Statuses
// ---------------------------------------------------------------------------

/// Hydration status of a saved analysis that has not been opened yet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UninitializedStatus {
    Unopened,
    LoadingSaved,
    Error,
}

/// Status of the "+ new analysis" menu tab
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MenuStatus {
    AwaitingChoice,
    CreatingUnsaved,
    Error,
}

/// Status of the parameter form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FormStatus {
    AwaitingUserSubmission,
    SavingAnalysis,
}

/// Whether the locally held job record reflects a settled remote state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigStatus {
    Loading,
    Complete,
    Error,
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// A saved analysis known from the tab listing, not yet fetched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UninitializedPanel {
    pub analysis_id: AnalysisId,
    pub display_name: String,
    pub status: UninitializedStatus,
    pub error_message: Option<String>,
}

impl UninitializedPanel {
    pub fn unopened(analysis_id: AnalysisId, display_name: impl Into<String>) -> Self {
        Self {
            analysis_id,
            display_name: display_name.into(),
            status: UninitializedStatus::Unopened,
            error_message: None,
        }
    }
}

/// The "+ new analysis" tab
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisMenu {
    pub selected_choice: Option<AnalysisChoice>,
    pub status: MenuStatus,
    pub error_message: Option<String>,
}

impl Default for AnalysisMenu {
    fn default() -> Self {
        Self {
            selected_choice: None,
            status: MenuStatus::AwaitingChoice,
            error_message: None,
        }
    }
}

/// A chosen analysis being configured, never submitted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnsavedAnalysis {
    pub display_name: String,
    pub analysis_type: AnalysisChoice,
    pub param_specs: Vec<ParamSpec>,
    pub param_values: ParamValues,
    pub panel_ui: PanelUiState,
    pub form_status: FormStatus,
    pub form_error_message: Option<String>,
    pub form_validation_errors: Vec<String>,
    pub poll_countdown: u32,
}

/// An analysis that has been submitted to the remote service at least once
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedAnalysis {
    pub analysis_config: AnalysisConfig,
    pub config_status: ConfigStatus,
    pub param_specs: Vec<ParamSpec>,
    pub param_values: ParamValues,
    pub panel_ui: PanelUiState,
    pub form_status: FormStatus,
    pub form_error_message: Option<String>,
    pub form_validation_errors: Vec<String>,
    pub poll_countdown: u32,
    pub result_contents: ResultContents,
    pub result_error_message: Option<String>,
}

impl SavedAnalysis {
    /// A settled panel for a freshly fetched job record.
    pub fn from_config(
        analysis_config: AnalysisConfig,
        result_contents: ResultContents,
        poll_countdown: u32,
    ) -> Self {
        Self {
            param_specs: analysis_config.display_params.clone(),
            param_values: analysis_config.parameters.clone(),
            analysis_config,
            config_status: ConfigStatus::Complete,
            panel_ui: PanelUiState::default(),
            form_status: FormStatus::AwaitingUserSubmission,
            form_error_message: None,
            form_validation_errors: Vec::new(),
            poll_countdown,
            result_contents,
            result_error_message: None,
        }
    }

    /// The first saved form of an unsaved panel, after job creation.
    pub fn from_unsaved(
        unsaved: &UnsavedAnalysis,
        analysis_config: AnalysisConfig,
        poll_countdown: u32,
    ) -> Self {
        Self {
            analysis_config,
            config_status: ConfigStatus::Complete,
            param_specs: unsaved.param_specs.clone(),
            param_values: unsaved.param_values.clone(),
            panel_ui: unsaved.panel_ui,
            form_status: unsaved.form_status,
            form_error_message: unsaved.form_error_message.clone(),
            form_validation_errors: unsaved.form_validation_errors.clone(),
            poll_countdown,
            result_contents: empty_result(),
            result_error_message: None,
        }
    }

    /// The settled form of this panel after a terminal status.
    pub fn settled(
        &self,
        status: AnalysisStatus,
        result_contents: ResultContents,
    ) -> Self {
        let mut next = self.clone();
        next.analysis_config.status = status;
        next.config_status = ConfigStatus::Complete;
        next.form_status = FormStatus::AwaitingUserSubmission;
        next.form_error_message = None;
        next.form_validation_errors.clear();
        next.result_contents = if status == AnalysisStatus::Complete {
            result_contents
        } else {
            empty_result()
        };
        next.result_error_message = None;
        next
    }

    /// This panel with a failed status check recorded.
    pub fn poll_failed(&self, message: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.config_status = ConfigStatus::Error;
        next.form_status = FormStatus::AwaitingUserSubmission;
        next.result_error_message = Some(message.into());
        next
    }

    /// Merge the outcome of a status check into this panel.
    pub fn finish_submission(&self, outcome: &SubmissionOutcome) -> Self {
        match outcome {
            SubmissionOutcome::Settled {
                status,
                result_contents,
            } => self.settled(*status, result_contents.clone()),
            SubmissionOutcome::PollFailed { error_message } => {
                self.poll_failed(error_message.clone())
            }
        }
    }
}

/// How a submitted analysis ended.
///
/// Carries only the fields a status check decides, so edits applied to the
/// panel while the check was in flight survive the merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum SubmissionOutcome {
    Settled {
        status: AnalysisStatus,
        result_contents: ResultContents,
    },
    PollFailed {
        error_message: String,
    },
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

/// Variant discriminant, for logging and shape checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PanelKind {
    Uninitialized,
    MenuOpen,
    Unsaved,
    Saved,
}

/// One tab's lifecycle stage and data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Panel {
    Uninitialized(UninitializedPanel),
    MenuOpen(AnalysisMenu),
    Unsaved(UnsavedAnalysis),
    Saved(SavedAnalysis),
}

/// Per-variant handlers for [`Panel::transform`] and [`Panel::inspect`].
///
/// Build one with [`PanelMatcher::owned`] or [`PanelMatcher::borrowed`];
/// their bounds give each closure its argument type. Handlers are given in
/// variant order: uninitialized, menu, unsaved, saved. Tuple-variant
/// constructors double as identity handlers, e.g. `Panel::Uninitialized`.
pub struct PanelMatcher<U, M, N, S> {
    pub uninitialized: U,
    pub menu: M,
    pub unsaved: N,
    pub saved: S,
}

impl<U, M, N, S> PanelMatcher<U, M, N, S> {
    /// Handlers that consume the variant, for [`Panel::transform`].
    pub fn owned<R>(uninitialized: U, menu: M, unsaved: N, saved: S) -> Self
    where
        U: FnOnce(UninitializedPanel) -> R,
        M: FnOnce(AnalysisMenu) -> R,
        N: FnOnce(UnsavedAnalysis) -> R,
        S: FnOnce(SavedAnalysis) -> R,
    {
        Self {
            uninitialized,
            menu,
            unsaved,
            saved,
        }
    }

    /// Handlers that borrow the variant, for [`Panel::inspect`].
    pub fn borrowed<'a, R>(uninitialized: U, menu: M, unsaved: N, saved: S) -> Self
    where
        U: FnOnce(&'a UninitializedPanel) -> R,
        M: FnOnce(&'a AnalysisMenu) -> R,
        N: FnOnce(&'a UnsavedAnalysis) -> R,
        S: FnOnce(&'a SavedAnalysis) -> R,
    {
        Self {
            uninitialized,
            menu,
            unsaved,
            saved,
        }
    }
}

impl Panel {
    /// Consume the panel through the handler for its variant.
    pub fn transform<R, U, M, N, S>(self, matcher: PanelMatcher<U, M, N, S>) -> R
    where
        U: FnOnce(UninitializedPanel) -> R,
        M: FnOnce(AnalysisMenu) -> R,
        N: FnOnce(UnsavedAnalysis) -> R,
        S: FnOnce(SavedAnalysis) -> R,
    {
        match self {
            Panel::Uninitialized(panel) => (matcher.uninitialized)(panel),
            Panel::MenuOpen(panel) => (matcher.menu)(panel),
            Panel::Unsaved(panel) => (matcher.unsaved)(panel),
            Panel::Saved(panel) => (matcher.saved)(panel),
        }
    }

    /// Borrowing counterpart of [`Panel::transform`].
    pub fn inspect<'a, R, U, M, N, S>(&'a self, matcher: PanelMatcher<U, M, N, S>) -> R
    where
        U: FnOnce(&'a UninitializedPanel) -> R,
        M: FnOnce(&'a AnalysisMenu) -> R,
        N: FnOnce(&'a UnsavedAnalysis) -> R,
        S: FnOnce(&'a SavedAnalysis) -> R,
    {
        match self {
            Panel::Uninitialized(panel) => (matcher.uninitialized)(panel),
            Panel::MenuOpen(panel) => (matcher.menu)(panel),
            Panel::Unsaved(panel) => (matcher.unsaved)(panel),
            Panel::Saved(panel) => (matcher.saved)(panel),
        }
    }

    pub fn kind(&self) -> PanelKind {
        self.inspect(PanelMatcher::borrowed(
            |_| PanelKind::Uninitialized,
            |_| PanelKind::MenuOpen,
            |_| PanelKind::Unsaved,
            |_| PanelKind::Saved,
        ))
    }

    pub fn is_menu(&self) -> bool {
        self.kind() == PanelKind::MenuOpen
    }

    /// Panels that can be submitted, renamed or duplicated.
    pub fn is_runnable(&self) -> bool {
        self.inspect(PanelMatcher::borrowed(
            |_| false,
            |_| false,
            |_| true,
            |_| true,
        ))
    }

    /// Remote analysis id, for panels that have been persisted.
    pub fn analysis_id(&self) -> Option<AnalysisId> {
        self.inspect(PanelMatcher::borrowed(
            |p| Some(p.analysis_id),
            |_| None,
            |_| None,
            |p| Some(p.analysis_config.analysis_id),
        ))
    }

    /// Tab label.
    pub fn display_name(&self) -> &str {
        match self {
            Panel::Uninitialized(p) => &p.display_name,
            Panel::MenuOpen(_) => MENU_TAB_LABEL,
            Panel::Unsaved(p) => &p.display_name,
            Panel::Saved(p) => &p.analysis_config.display_name,
        }
    }

    pub fn as_uninitialized(&self) -> Option<&UninitializedPanel> {
        self.inspect(PanelMatcher::borrowed(
            Some,
            |_| None,
            |_| None,
            |_| None,
        ))
    }

    pub fn as_menu(&self) -> Option<&AnalysisMenu> {
        self.inspect(PanelMatcher::borrowed(
            |_| None,
            Some,
            |_| None,
            |_| None,
        ))
    }

    pub fn as_unsaved(&self) -> Option<&UnsavedAnalysis> {
        self.inspect(PanelMatcher::borrowed(
            |_| None,
            |_| None,
            Some,
            |_| None,
        ))
    }

    pub fn as_saved(&self) -> Option<&SavedAnalysis> {
        self.inspect(PanelMatcher::borrowed(
            |_| None,
            |_| None,
            |_| None,
            Some,
        ))
    }

    /// Poll countdown for runnable panels.
    pub fn poll_countdown(&self) -> Option<u32> {
        self.inspect(PanelMatcher::borrowed(
            |_| None,
            |_| None,
            |p| Some(p.poll_countdown),
            |p| Some(p.poll_countdown),
        ))
    }
}
