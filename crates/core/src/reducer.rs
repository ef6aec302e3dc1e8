//! Orchestrator Reducer
//!
//! Pure `(state, event) -> state` transition. Events that target a missing
//! panel, or a panel whose variant does not accept them, return the state
//! unchanged; this is what makes late follow-up events (a poll answer for a
//! tab that was already removed) harmless.

use crate::event::AnalysisEvent;
use crate::panel::{
    AnalysisMenu, ConfigStatus, FormStatus, MenuStatus, Panel, PanelKind, PanelMatcher,
    SavedAnalysis, UninitializedPanel, UninitializedStatus, UnsavedAnalysis,
};
use crate::state::StepAnalysesState;
use crate::types::{empty_result, PanelId};

/// Apply one event to the state.
pub fn reduce(state: StepAnalysesState, event: &AnalysisEvent) -> StepAnalysesState {
    let budget = state.poll_budget;

    match event {
        AnalysisEvent::StartLoadingTabListing {
            step_id,
            strategy_id,
        } => StepAnalysesState::reset(&state, *step_id, *strategy_id),

        AnalysisEvent::FinishLoadingTabListing { tabs, choices } => {
            let mut next = state;
            next.analysis_choices = choices.clone();
            next.loading_choices = false;
            for tab in tabs {
                next.insert_panel(tab.clone());
            }
            next
        }

        AnalysisEvent::SelectTab { panel_id } => {
            let mut next = state;
            match panel_id {
                Some(id) if !next.panels.contains_key(id) => next,
                _ => {
                    next.active_tab = *panel_id;
                    next
                }
            }
        }

        AnalysisEvent::StartLoadingSavedTab { panel_id } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                |panel| {
                    Panel::Uninitialized(UninitializedPanel {
                        status: UninitializedStatus::LoadingSaved,
                        ..panel
                    })
                },
                Panel::MenuOpen,
                Panel::Unsaved,
                Panel::Saved,
            ),
        ),

        AnalysisEvent::FinishLoadingSavedTab { panel_id, loaded } => {
            let loaded_kind = loaded.kind();
            update_panel(
                state,
                *panel_id,
                PanelMatcher::owned(
                    |panel| match loaded_kind {
                        PanelKind::Saved | PanelKind::Uninitialized => loaded.clone(),
                        PanelKind::MenuOpen | PanelKind::Unsaved => Panel::Uninitialized(panel),
                    },
                    Panel::MenuOpen,
                    // first save of a new analysis; form edits made while
                    // the job was being created are kept
                    |panel| match loaded.as_saved() {
                        Some(saved) => Panel::Saved(SavedAnalysis::from_unsaved(
                            &panel,
                            saved.analysis_config.clone(),
                            saved.poll_countdown,
                        )),
                        None => Panel::Unsaved(panel),
                    },
                    Panel::Saved,
                ),
            )
        }

        AnalysisEvent::StartLoadingChosenAnalysisTab { panel_id, choice } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                |_| {
                    Panel::MenuOpen(AnalysisMenu {
                        selected_choice: Some(choice.clone()),
                        status: MenuStatus::CreatingUnsaved,
                        error_message: None,
                    })
                },
                Panel::Unsaved,
                Panel::Saved,
            ),
        ),

        AnalysisEvent::FinishLoadingChosenAnalysisTab { panel_id, loaded } => {
            let loaded_kind = loaded.kind();
            update_panel(
                state,
                *panel_id,
                PanelMatcher::owned(
                    Panel::Uninitialized,
                    |panel| match loaded_kind {
                        PanelKind::Unsaved | PanelKind::MenuOpen => loaded.clone(),
                        _ => Panel::MenuOpen(panel),
                    },
                    Panel::Unsaved,
                    Panel::Saved,
                ),
            )
        }

        AnalysisEvent::CreateNewTab { initial } => {
            let mut next = state;
            if let Some(id) = next.insert_panel(initial.clone()) {
                next.active_tab = Some(id);
            }
            next
        }

        AnalysisEvent::RemoveTab { panel_id } => remove_tab(state, *panel_id),

        AnalysisEvent::StartFormSubmission { panel_id } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                |panel| {
                    Panel::Unsaved(UnsavedAnalysis {
                        poll_countdown: budget,
                        form_status: FormStatus::SavingAnalysis,
                        ..panel
                    })
                },
                |panel| {
                    Panel::Saved(SavedAnalysis {
                        poll_countdown: budget,
                        form_status: FormStatus::SavingAnalysis,
                        result_contents: empty_result(),
                        result_error_message: None,
                        ..panel
                    })
                },
            ),
        ),

        AnalysisEvent::FailFormSubmission {
            panel_id,
            error_message,
            validation_errors,
        } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                |panel| {
                    Panel::Unsaved(UnsavedAnalysis {
                        form_status: FormStatus::AwaitingUserSubmission,
                        form_error_message: error_message.clone(),
                        form_validation_errors: validation_errors.clone(),
                        ..panel
                    })
                },
                |panel| {
                    Panel::Saved(SavedAnalysis {
                        form_status: FormStatus::AwaitingUserSubmission,
                        form_error_message: error_message.clone(),
                        form_validation_errors: validation_errors.clone(),
                        ..panel
                    })
                },
            ),
        ),

        AnalysisEvent::AnalysisStatusChanged { panel_id, status } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                Panel::Unsaved,
                |mut panel| {
                    panel.analysis_config.status = *status;
                    panel.config_status = ConfigStatus::Loading;
                    panel.form_validation_errors.clear();
                    Panel::Saved(panel)
                },
            ),
        ),

        AnalysisEvent::CountDown { panel_id } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                |panel| {
                    Panel::Unsaved(UnsavedAnalysis {
                        poll_countdown: count_down(panel.poll_countdown, budget),
                        ..panel
                    })
                },
                |panel| {
                    Panel::Saved(SavedAnalysis {
                        poll_countdown: count_down(panel.poll_countdown, budget),
                        ..panel
                    })
                },
            ),
        ),

        AnalysisEvent::FinishFormSubmission { panel_id, outcome } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                Panel::Unsaved,
                |panel| Panel::Saved(panel.finish_submission(outcome)),
            ),
        ),

        AnalysisEvent::RenameTab {
            panel_id,
            new_display_name,
        } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                |panel| {
                    Panel::Unsaved(UnsavedAnalysis {
                        display_name: new_display_name.clone(),
                        ..panel
                    })
                },
                |mut panel| {
                    panel.analysis_config.display_name = new_display_name.clone();
                    Panel::Saved(panel)
                },
            ),
        ),

        AnalysisEvent::UpdateParamValues { panel_id, values } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                |panel| {
                    Panel::Unsaved(UnsavedAnalysis {
                        param_values: values.clone(),
                        ..panel
                    })
                },
                |panel| {
                    Panel::Saved(SavedAnalysis {
                        param_values: values.clone(),
                        ..panel
                    })
                },
            ),
        ),

        AnalysisEvent::ToggleDescription { panel_id } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                |mut panel| {
                    panel.panel_ui.description_expanded = !panel.panel_ui.description_expanded;
                    Panel::Unsaved(panel)
                },
                |mut panel| {
                    panel.panel_ui.description_expanded = !panel.panel_ui.description_expanded;
                    Panel::Saved(panel)
                },
            ),
        ),

        AnalysisEvent::ToggleParameters { panel_id } => update_panel(
            state,
            *panel_id,
            PanelMatcher::owned(
                Panel::Uninitialized,
                Panel::MenuOpen,
                |mut panel| {
                    panel.panel_ui.form_expanded = !panel.panel_ui.form_expanded;
                    Panel::Unsaved(panel)
                },
                |mut panel| {
                    panel.panel_ui.form_expanded = !panel.panel_ui.form_expanded;
                    Panel::Saved(panel)
                },
            ),
        ),

        // Intents handled entirely by the coordinators.
        AnalysisEvent::DeleteAnalysis { .. }
        | AnalysisEvent::RunAnalysis { .. }
        | AnalysisEvent::CheckResultStatus { .. }
        | AnalysisEvent::RenameAnalysis { .. }
        | AnalysisEvent::DuplicateAnalysis { .. } => state,
    }
}

/// Decrement, wrapping to the budget once zero is reached.
fn count_down(countdown: u32, budget: u32) -> u32 {
    if countdown > 0 {
        countdown - 1
    } else {
        budget
    }
}

fn update_panel<U, M, N, S>(
    mut state: StepAnalysesState,
    panel_id: PanelId,
    matcher: PanelMatcher<U, M, N, S>,
) -> StepAnalysesState
where
    U: FnOnce(UninitializedPanel) -> Panel,
    M: FnOnce(AnalysisMenu) -> Panel,
    N: FnOnce(UnsavedAnalysis) -> Panel,
    S: FnOnce(SavedAnalysis) -> Panel,
{
    if let Some(panel) = state.panels.remove(&panel_id) {
        state.panels.insert(panel_id, panel.transform(matcher));
    }
    state
}

fn remove_tab(mut state: StepAnalysesState, panel_id: PanelId) -> StepAnalysesState {
    let Some((position, removed)) = state.remove_panel(panel_id) else {
        return state;
    };

    if removed.is_menu() {
        state.active_tab = None;
    } else if state.active_tab == Some(panel_id) {
        state.active_tab = state
            .panel_order
            .get(position)
            .or_else(|| position.checked_sub(1).and_then(|prev| state.panel_order.get(prev)))
            .copied();
    }
    state
}
