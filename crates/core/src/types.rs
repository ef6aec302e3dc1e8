//! Domain Types
//!
//! Reference data and remote job records exchanged with the analysis
//! execution service. These are plain serde types; the panel lifecycle that
//! holds them lives in `panel`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of the workflow step that owns the analyses.
pub type StepId = i64;

/// Identifier of the workflow (strategy) containing the step.
pub type StrategyId = i64;

/// Identifier of a persisted analysis, issued by the remote service.
pub type AnalysisId = i64;

/// Opaque tab identifier, assigned monotonically by the store.
pub type PanelId = u32;

/// Parameter name to value, ordered so snapshots compare deterministically.
pub type ParamValues = BTreeMap<String, String>;

/// Opaque analysis output. The empty object means "no result".
pub type ResultContents = Value;

/// Empty result contents.
pub fn empty_result() -> ResultContents {
    Value::Object(serde_json::Map::new())
}

// ---------------------------------------------------------------------------
// Remote Status
// ---------------------------------------------------------------------------

/// Remote job status as reported by the execution service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Created,
    Pending,
    Running,
    Complete,
    Error,
    Interrupted,
    Expired,
    OutOfDate,
    StepRevised,
    Invalid,
    #[serde(other)]
    Unknown,
}

impl AnalysisStatus {
    /// The job is queued or executing; status must be re-checked later.
    pub fn is_in_progress(self) -> bool {
        matches!(self, AnalysisStatus::Pending | AnalysisStatus::Running)
    }

    /// The last run is unusable but the job can be re-run as-is.
    ///
    /// Parameterless analyses found in one of these states are resubmitted
    /// automatically.
    pub fn is_stale(self) -> bool {
        matches!(
            self,
            AnalysisStatus::Created
                | AnalysisStatus::StepRevised
                | AnalysisStatus::Interrupted
                | AnalysisStatus::Expired
                | AnalysisStatus::OutOfDate
        )
    }

    /// User-facing explanation of why results are unavailable.
    pub fn unavailable_reason(self) -> &'static str {
        match self {
            AnalysisStatus::Error => {
                "A run of this analysis encountered an error before it could complete."
            }
            AnalysisStatus::Interrupted => {
                "A run of this analysis was interrupted before it could complete."
            }
            AnalysisStatus::OutOfDate => {
                "Your previous run's results are unavailable and must be regenerated. \
                 Please confirm your parameters above and re-run."
            }
            AnalysisStatus::Expired => {
                "The last run of this analysis took too long to complete and was cancelled. \
                 If this problem persists, please contact us."
            }
            AnalysisStatus::StepRevised => {
                "Your previous analysis results are not available because the result changed \
                 when you used the filter table above or revised a search strategy step. \
                 Please confirm your analysis parameters and re-run."
            }
            AnalysisStatus::Created
            | AnalysisStatus::Pending
            | AnalysisStatus::Running
            | AnalysisStatus::Complete
            | AnalysisStatus::Invalid
            | AnalysisStatus::Unknown => "",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStatus::Created => "CREATED",
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Running => "RUNNING",
            AnalysisStatus::Complete => "COMPLETE",
            AnalysisStatus::Error => "ERROR",
            AnalysisStatus::Interrupted => "INTERRUPTED",
            AnalysisStatus::Expired => "EXPIRED",
            AnalysisStatus::OutOfDate => "OUT_OF_DATE",
            AnalysisStatus::StepRevised => "STEP_REVISED",
            AnalysisStatus::Invalid => "INVALID",
            AnalysisStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------------------------------------------------------
// Reference Data
// ---------------------------------------------------------------------------

/// An analysis type that can be attached to a step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisChoice {
    /// Type name, the lookup key for plugins and remote calls
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Names of user-editable parameters
    #[serde(default)]
    pub param_names: Vec<String>,
}

impl AnalysisChoice {
    /// Parameterless types never need a user form step.
    pub fn is_autorun(&self) -> bool {
        self.param_names.is_empty()
    }
}

/// Look up whether the named analysis type is autorun-eligible.
///
/// Unknown types are never autorun.
pub fn is_autorun_type(type_name: &str, choices: &[AnalysisChoice]) -> bool {
    choices
        .iter()
        .find(|choice| choice.name == type_name)
        .map(AnalysisChoice::is_autorun)
        .unwrap_or(false)
}

/// One row of the applied-analyses listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAnalysis {
    pub analysis_id: AnalysisId,
    pub display_name: String,
}

/// Parameter specification for an analysis form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub initial_display_value: Option<String>,
}

fn default_visible() -> bool {
    true
}

/// Initial parameter values taken from the specs' display defaults.
pub fn initial_param_values(specs: &[ParamSpec]) -> ParamValues {
    specs
        .iter()
        .map(|spec| {
            (
                spec.name.clone(),
                spec.initial_display_value.clone().unwrap_or_default(),
            )
        })
        .collect()
}

/// Remote job record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub analysis_id: AnalysisId,
    /// Analysis type name
    pub analysis_name: String,
    pub display_name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub parameters: ParamValues,
    #[serde(default)]
    pub display_params: Vec<ParamSpec>,
}

/// Body of a job creation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalysis {
    pub analysis_name: String,
    pub display_name: String,
    pub parameters: ParamValues,
}

/// Per-panel presentation toggles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PanelUiState {
    pub description_expanded: bool,
    pub form_expanded: bool,
}

impl Default for PanelUiState {
    fn default() -> Self {
        Self {
            description_expanded: false,
            form_expanded: true,
        }
    }
}
