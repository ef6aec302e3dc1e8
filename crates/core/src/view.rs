//! View Projections
//!
//! Read-only selectors over `StepAnalysesState` for the presentation side.
//! Renderers are handed these projections, never the panels themselves, so
//! what a tab may display is decided by its variant alone.

use serde::Serialize;

use crate::panel::{
    ConfigStatus, FormStatus, MenuStatus, Panel, PanelMatcher, SavedAnalysis, UninitializedStatus,
};
use crate::state::StepAnalysesState;
use crate::types::{AnalysisStatus, PanelId, ResultContents};

const EXTERNAL_ID_PREFIX: &str = "analysis:";
const MENU_EXTERNAL_ID: &str = "analysis:menu";

/// One entry of the tab strip
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TabConfig {
    pub panel_id: PanelId,
    pub label: String,
    /// Stable id used in page URLs; `None` for never-saved analyses
    pub external_id: Option<String>,
}

/// What the result area of a saved analysis shows
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    Complete { contents: ResultContents },
    Pending { countdown: u32 },
    Idle,
    Unavailable { reason: String },
}

impl ResultView {
    /// Header line shown above the result area.
    pub fn header(&self) -> &'static str {
        match self {
            ResultView::Complete { .. } | ResultView::Idle => "",
            ResultView::Pending { .. } => "Results Pending...",
            ResultView::Unavailable { .. } => "Results Unavailable:",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ResultView::Pending { countdown } => format!(
                "The results of this analysis are not yet available. We will check again in {} seconds.",
                countdown
            ),
            ResultView::Unavailable { reason } => reason.clone(),
            ResultView::Complete { .. } | ResultView::Idle => String::new(),
        }
    }
}

/// Parameter form state of a runnable panel
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FormView {
    pub saving: bool,
    pub has_parameters: bool,
    pub expanded: bool,
    pub errors: Vec<String>,
    pub error_message: Option<String>,
}

/// True iff no "+ new analysis" tab is open.
pub fn new_analysis_button_visible(state: &StepAnalysesState) -> bool {
    state.menu_panel_id().is_none()
}

/// External id of a panel, if it has one.
pub fn external_id(panel: &Panel) -> Option<String> {
    panel.inspect(PanelMatcher::borrowed(
        |p| Some(format!("{}{}", EXTERNAL_ID_PREFIX, p.analysis_id)),
        |_| Some(MENU_EXTERNAL_ID.to_string()),
        |_| None,
        |p| {
            Some(format!(
                "{}{}",
                EXTERNAL_ID_PREFIX, p.analysis_config.analysis_id
            ))
        },
    ))
}

/// Tab strip in display order.
///
/// Empty until the analysis types have been loaded. Unsaved analyses carry
/// a trailing `*`.
pub fn tab_configs(state: &StepAnalysesState) -> Vec<TabConfig> {
    if state.analysis_choices.is_empty() {
        return Vec::new();
    }
    state
        .ordered_panels()
        .map(|(panel_id, panel)| TabConfig {
            panel_id,
            label: panel.inspect(PanelMatcher::borrowed(
                |p| p.display_name.clone(),
                |_| panel.display_name().to_string(),
                |p| format!("{}*", p.display_name),
                |p| p.analysis_config.display_name.clone(),
            )),
            external_id: external_id(panel),
        })
        .collect()
}

/// Resolve an external id (`analysis:42`, `analysis:menu`) to a panel.
pub fn find_panel_by_external_id(state: &StepAnalysesState, external: &str) -> Option<PanelId> {
    if !external.starts_with(EXTERNAL_ID_PREFIX) {
        return None;
    }
    state
        .ordered_panels()
        .find(|(_, panel)| external_id(panel).as_deref() == Some(external))
        .map(|(panel_id, _)| panel_id)
}

/// Result area of a saved panel; `None` for other variants.
pub fn result_view(panel: &Panel) -> Option<ResultView> {
    panel.inspect(PanelMatcher::borrowed(
        |_| None,
        |_| None,
        |_| None,
        |p| Some(saved_result_view(p)),
    ))
}

fn saved_result_view(panel: &SavedAnalysis) -> ResultView {
    let status = panel.analysis_config.status;
    if panel.config_status == ConfigStatus::Error {
        return ResultView::Unavailable {
            reason: panel.result_error_message.clone().unwrap_or_default(),
        };
    }
    match status {
        AnalysisStatus::Complete if panel.config_status == ConfigStatus::Complete => {
            ResultView::Complete {
                contents: panel.result_contents.clone(),
            }
        }
        AnalysisStatus::Pending | AnalysisStatus::Running => ResultView::Pending {
            countdown: panel.poll_countdown,
        },
        AnalysisStatus::Created | AnalysisStatus::Invalid | AnalysisStatus::Complete => {
            ResultView::Idle
        }
        other => ResultView::Unavailable {
            reason: other.unavailable_reason().to_string(),
        },
    }
}

/// Form area of a runnable panel; `None` for other variants.
pub fn form_view(panel: &Panel) -> Option<FormView> {
    panel.inspect(PanelMatcher::borrowed(
        |_| None,
        |_| None,
        |p| {
            Some(FormView {
                saving: p.form_status == FormStatus::SavingAnalysis,
                has_parameters: !p.analysis_type.param_names.is_empty(),
                expanded: p.panel_ui.form_expanded,
                errors: p.form_validation_errors.clone(),
                error_message: p.form_error_message.clone(),
            })
        },
        |p| {
            Some(FormView {
                saving: p.form_status == FormStatus::SavingAnalysis,
                has_parameters: !p.param_specs.is_empty(),
                expanded: p.panel_ui.form_expanded,
                errors: p.form_validation_errors.clone(),
                error_message: p.form_error_message.clone(),
            })
        },
    ))
}

/// True when tabs are loaded and no panel is waiting on the remote service.
///
/// Unopened tabs count as settled: nothing is in flight for them.
pub fn is_settled(state: &StepAnalysesState) -> bool {
    !state.loading_choices
        && state.ordered_panels().all(|(_, panel)| {
            panel.inspect(PanelMatcher::borrowed(
                |p| p.status != UninitializedStatus::LoadingSaved,
                |p| p.status != MenuStatus::CreatingUnsaved,
                |p| p.form_status != FormStatus::SavingAnalysis,
                |p| {
                    p.form_status != FormStatus::SavingAnalysis
                        && p.config_status != ConfigStatus::Loading
                        && !(p.config_status == ConfigStatus::Complete
                            && p.analysis_config.status.is_in_progress())
                },
            ))
        })
}
