//! Event-Driven Coordinators
//!
//! One coordinator per event type. Each reads the post-reduction snapshot,
//! makes at most one remote call chain through the injected service, and
//! returns the follow-up events to feed back into the store. Coordinators
//! never touch the store directly.
//!
//! Read paths (listing, hydration) degrade quietly; write paths (submit,
//! run, rename, delete, duplicate) alert the user and roll the panel back
//! through `FailFormSubmission` or simply emit nothing.

use std::sync::Arc;

use tokio::sync::watch;

use step_analysis_core::{
    analysis_page_path, empty_result, initial_param_values, is_autorun_type, AnalysisChoice,
    AnalysisEvent, AnalysisMenu, AnalysisService, AnalysisStatus, FormStatus, MenuStatus,
    NewAnalysis, Panel, PanelId, PanelMatcher, PanelUiState, Presenter, SavedAnalysis,
    ServiceError, StepAnalysesState, UninitializedPanel, UninitializedStatus, UnsavedAnalysis,
    DELETE_CONFIRMATION,
};

use crate::models::settings::OrchestratorSettings;

use super::polling;

/// Collaborators handed to every coordinator invocation
#[derive(Clone)]
pub struct CoordinatorContext {
    pub service: Arc<dyn AnalysisService>,
    pub presenter: Arc<dyn Presenter>,
    pub settings: Arc<OrchestratorSettings>,
    /// Live view of the store, for coordinators that must re-read it after
    /// suspending
    pub store: watch::Receiver<StepAnalysesState>,
}

/// Run the coordinator for `event`, if any.
///
/// `state` is the snapshot right after `event` was reduced.
pub async fn observe(
    ctx: &CoordinatorContext,
    event: &AnalysisEvent,
    state: &StepAnalysesState,
) -> Vec<AnalysisEvent> {
    match event {
        AnalysisEvent::StartLoadingTabListing { step_id, .. } => {
            load_tab_listing(ctx, *step_id).await
        }
        AnalysisEvent::SelectTab {
            panel_id: Some(panel_id),
        } => select_tab(state, *panel_id),
        AnalysisEvent::StartLoadingSavedTab { panel_id } => {
            load_saved_tab(ctx, state, *panel_id).await
        }
        AnalysisEvent::StartLoadingChosenAnalysisTab { panel_id, choice } => {
            load_chosen_analysis(ctx, state, *panel_id, choice).await
        }
        AnalysisEvent::CreateNewTab { .. } | AnalysisEvent::RemoveTab { .. } => {
            refocus(state)
        }
        AnalysisEvent::DeleteAnalysis { panel_id } => delete_analysis(ctx, state, *panel_id).await,
        AnalysisEvent::StartFormSubmission { panel_id } => {
            submit_form(ctx, state, *panel_id).await
        }
        AnalysisEvent::RunAnalysis { panel_id } => run_analysis(ctx, state, *panel_id).await,
        AnalysisEvent::CheckResultStatus { panel_id } => {
            polling::check_result_status(ctx, state, *panel_id).await
        }
        AnalysisEvent::CountDown { panel_id } => polling::count_down(ctx, state, *panel_id).await,
        AnalysisEvent::RenameAnalysis {
            panel_id,
            new_display_name,
        } => rename_analysis(ctx, state, *panel_id, new_display_name).await,
        AnalysisEvent::DuplicateAnalysis { panel_id } => {
            duplicate_analysis(ctx, state, *panel_id).await
        }
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tab listing and hydration
// ---------------------------------------------------------------------------

async fn load_tab_listing(ctx: &CoordinatorContext, step_id: i64) -> Vec<AnalysisEvent> {
    let applied = match ctx.service.list_applied_analyses(step_id).await {
        Ok(applied) => applied,
        Err(e) => {
            tracing::warn!(step_id, "[StepAnalysis] Failed to list applied analyses: {}", e);
            return Vec::new();
        }
    };
    let choices = match ctx.service.list_analysis_types(step_id).await {
        Ok(choices) => choices,
        Err(e) => {
            tracing::warn!(step_id, "[StepAnalysis] Failed to list analysis types: {}", e);
            return Vec::new();
        }
    };

    let mut tabs: Vec<Panel> = applied
        .into_iter()
        .map(|analysis| {
            Panel::Uninitialized(UninitializedPanel::unopened(
                analysis.analysis_id,
                analysis.display_name,
            ))
        })
        .collect();
    // a step without analyses opens on the chooser
    if tabs.is_empty() {
        tabs.push(Panel::MenuOpen(AnalysisMenu::default()));
    }

    tracing::info!(
        step_id,
        "[StepAnalysis] Loaded {} tabs and {} analysis types",
        tabs.len(),
        choices.len()
    );
    vec![AnalysisEvent::FinishLoadingTabListing { tabs, choices }]
}

fn select_tab(state: &StepAnalysesState, panel_id: PanelId) -> Vec<AnalysisEvent> {
    let needs_hydration = state.panel(panel_id).is_some_and(|panel| {
        panel.inspect(PanelMatcher::borrowed(
            |p| p.status != UninitializedStatus::LoadingSaved,
            |_| false,
            |_| false,
            |_| false,
        ))
    });
    if needs_hydration {
        vec![AnalysisEvent::StartLoadingSavedTab { panel_id }]
    } else {
        Vec::new()
    }
}

/// After a structural change, re-select whatever is now active so a newly
/// focused unopened tab gets hydrated.
fn refocus(state: &StepAnalysesState) -> Vec<AnalysisEvent> {
    match state.active_tab {
        Some(panel_id) => vec![AnalysisEvent::SelectTab {
            panel_id: Some(panel_id),
        }],
        None => Vec::new(),
    }
}

async fn load_saved_tab(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
) -> Vec<AnalysisEvent> {
    let Some(panel) = state.panel(panel_id).and_then(Panel::as_uninitialized) else {
        return Vec::new();
    };
    let step_id = state.step_id;
    let analysis_id = panel.analysis_id;

    let loaded = async {
        let config = ctx.service.get_analysis_config(step_id, analysis_id).await?;
        let contents = if config.status == AnalysisStatus::Complete {
            ctx.service.get_result(step_id, analysis_id).await?
        } else {
            empty_result()
        };
        Ok::<_, ServiceError>(SavedAnalysis::from_config(config, contents, state.poll_budget))
    }
    .await;

    match loaded {
        Ok(saved) => {
            let status = saved.analysis_config.status;
            let autorun = ctx.settings.autorun_stale
                && is_autorun_type(&saved.analysis_config.analysis_name, &state.analysis_choices);
            tracing::debug!(
                panel_id,
                analysis_id,
                "[StepAnalysis] Hydrated saved analysis with status {}",
                status
            );

            let mut events = vec![AnalysisEvent::FinishLoadingSavedTab {
                panel_id,
                loaded: Panel::Saved(saved),
            }];
            if status.is_in_progress() {
                events.push(AnalysisEvent::CheckResultStatus { panel_id });
            } else if status.is_stale() && autorun {
                tracing::info!(
                    panel_id,
                    analysis_id,
                    "[StepAnalysis] Resubmitting stale parameterless analysis"
                );
                events.push(AnalysisEvent::StartFormSubmission { panel_id });
            }
            events
        }
        Err(e) => {
            tracing::warn!(
                panel_id,
                analysis_id,
                "[StepAnalysis] Failed to load saved analysis: {}",
                e
            );
            vec![AnalysisEvent::FinishLoadingSavedTab {
                panel_id,
                loaded: Panel::Uninitialized(UninitializedPanel {
                    status: UninitializedStatus::Error,
                    error_message: Some(e.user_message()),
                    ..panel.clone()
                }),
            }]
        }
    }
}

async fn load_chosen_analysis(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
    choice: &AnalysisChoice,
) -> Vec<AnalysisEvent> {
    let Some(menu) = state.panel(panel_id).and_then(Panel::as_menu) else {
        return Vec::new();
    };

    match ctx.service.get_param_specs(state.step_id, &choice.name).await {
        Ok(param_specs) => {
            let loaded = UnsavedAnalysis {
                display_name: choice.display_name.clone(),
                analysis_type: choice.clone(),
                param_values: initial_param_values(&param_specs),
                param_specs,
                panel_ui: PanelUiState::default(),
                form_status: FormStatus::AwaitingUserSubmission,
                form_error_message: None,
                form_validation_errors: Vec::new(),
                poll_countdown: 0,
            };
            let mut events = vec![AnalysisEvent::FinishLoadingChosenAnalysisTab {
                panel_id,
                loaded: Panel::Unsaved(loaded),
            }];
            // nothing to fill in, so skip the form
            if choice.is_autorun() {
                events.push(AnalysisEvent::StartFormSubmission { panel_id });
            }
            events
        }
        Err(e) => {
            tracing::warn!(
                panel_id,
                "[StepAnalysis] Failed to load parameters of '{}': {}",
                choice.name,
                e
            );
            vec![AnalysisEvent::FinishLoadingChosenAnalysisTab {
                panel_id,
                loaded: Panel::MenuOpen(AnalysisMenu {
                    selected_choice: menu.selected_choice.clone(),
                    status: MenuStatus::Error,
                    error_message: Some(e.user_message()),
                }),
            }]
        }
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Rollback event for a failed write. Validation failures go inline, anything
/// else is also alerted.
async fn fail_submission(
    ctx: &CoordinatorContext,
    panel_id: PanelId,
    error: ServiceError,
) -> Vec<AnalysisEvent> {
    match error {
        ServiceError::Validation(errors) => vec![AnalysisEvent::FailFormSubmission {
            panel_id,
            error_message: errors.summary(),
            validation_errors: errors.messages(),
        }],
        other => {
            let message = other.user_message();
            tracing::warn!(panel_id, "[StepAnalysis] Submission failed: {}", other);
            ctx.presenter.alert(&message).await;
            vec![AnalysisEvent::FailFormSubmission {
                panel_id,
                error_message: Some(message),
                validation_errors: Vec::new(),
            }]
        }
    }
}

async fn submit_form(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
) -> Vec<AnalysisEvent> {
    let Some(panel) = state.panel(panel_id) else {
        return Vec::new();
    };

    if let Some(unsaved) = panel.as_unsaved() {
        let request = NewAnalysis {
            analysis_name: unsaved.analysis_type.name.clone(),
            display_name: unsaved.display_name.clone(),
            parameters: unsaved.param_values.clone(),
        };
        return match ctx.service.create_analysis(state.step_id, &request).await {
            Ok(config) => {
                let path = analysis_page_path(state.strategy_id, state.step_id, config.analysis_id);
                ctx.presenter.navigate(&path, true).await;
                let saved = SavedAnalysis::from_unsaved(unsaved, config, state.poll_budget);
                vec![
                    AnalysisEvent::FinishLoadingSavedTab {
                        panel_id,
                        loaded: Panel::Saved(saved),
                    },
                    AnalysisEvent::RunAnalysis { panel_id },
                ]
            }
            Err(e) => fail_submission(ctx, panel_id, e).await,
        };
    }

    if let Some(saved) = panel.as_saved() {
        let analysis_id = saved.analysis_config.analysis_id;
        return match ctx
            .service
            .update_parameters(state.step_id, analysis_id, &saved.param_values)
            .await
        {
            Ok(()) => vec![AnalysisEvent::RunAnalysis { panel_id }],
            Err(e) => fail_submission(ctx, panel_id, e).await,
        };
    }

    Vec::new()
}

async fn run_analysis(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
) -> Vec<AnalysisEvent> {
    let Some(saved) = state.panel(panel_id).and_then(Panel::as_saved) else {
        return Vec::new();
    };
    let analysis_id = saved.analysis_config.analysis_id;

    match ctx.service.run_analysis(state.step_id, analysis_id).await {
        Ok(status) => {
            tracing::info!(panel_id, analysis_id, "[StepAnalysis] Analysis started: {}", status);
            vec![
                AnalysisEvent::AnalysisStatusChanged { panel_id, status },
                AnalysisEvent::CheckResultStatus { panel_id },
            ]
        }
        Err(e) => fail_submission(ctx, panel_id, e).await,
    }
}

// ---------------------------------------------------------------------------
// Delete, rename, duplicate
// ---------------------------------------------------------------------------

async fn delete_analysis(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
) -> Vec<AnalysisEvent> {
    let Some(panel) = state.panel(panel_id) else {
        return Vec::new();
    };
    if panel.is_menu() {
        return vec![AnalysisEvent::RemoveTab { panel_id }];
    }

    if !ctx.presenter.confirm(DELETE_CONFIRMATION).await {
        return Vec::new();
    }

    if let Some(analysis_id) = panel.analysis_id() {
        if let Err(e) = ctx.service.delete_analysis(state.step_id, analysis_id).await {
            // the tab goes away regardless
            tracing::warn!(panel_id, analysis_id, "[StepAnalysis] Remote delete failed: {}", e);
            ctx.presenter
                .alert(&format!(
                    "An error occurred while deleting this analysis: {}",
                    e.user_message()
                ))
                .await;
        }
    }
    vec![AnalysisEvent::RemoveTab { panel_id }]
}

async fn rename_analysis(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
    new_display_name: &str,
) -> Vec<AnalysisEvent> {
    let rename = AnalysisEvent::RenameTab {
        panel_id,
        new_display_name: new_display_name.to_string(),
    };
    let Some(panel) = state.panel(panel_id) else {
        return Vec::new();
    };
    if panel.as_unsaved().is_some() {
        return vec![rename];
    }
    let Some(saved) = panel.as_saved() else {
        return Vec::new();
    };

    let analysis_id = saved.analysis_config.analysis_id;
    match ctx
        .service
        .rename_analysis(state.step_id, analysis_id, new_display_name)
        .await
    {
        Ok(()) => vec![rename],
        Err(e) => {
            tracing::warn!(panel_id, analysis_id, "[StepAnalysis] Rename failed: {}", e);
            ctx.presenter
                .alert(&format!(
                    "An error occurred while renaming this analysis: {}",
                    e.user_message()
                ))
                .await;
            Vec::new()
        }
    }
}

async fn duplicate_analysis(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
) -> Vec<AnalysisEvent> {
    let Some(panel) = state.panel(panel_id) else {
        return Vec::new();
    };
    if let Some(unsaved) = panel.as_unsaved() {
        return vec![AnalysisEvent::CreateNewTab {
            initial: Panel::Unsaved(unsaved.clone()),
        }];
    }
    let Some(saved) = panel.as_saved() else {
        return Vec::new();
    };
    let config = &saved.analysis_config;

    if is_autorun_type(&config.analysis_name, &state.analysis_choices) {
        let request = NewAnalysis {
            analysis_name: config.analysis_name.clone(),
            display_name: config.display_name.clone(),
            parameters: saved.param_values.clone(),
        };
        return match ctx.service.create_analysis(state.step_id, &request).await {
            Ok(copy) => vec![AnalysisEvent::CreateNewTab {
                initial: Panel::Uninitialized(UninitializedPanel::unopened(
                    copy.analysis_id,
                    copy.display_name,
                )),
            }],
            Err(e) => {
                tracing::warn!(panel_id, "[StepAnalysis] Duplicate failed: {}", e);
                ctx.presenter
                    .alert(&format!(
                        "An error occurred while duplicating this analysis: {}",
                        e.user_message()
                    ))
                    .await;
                Vec::new()
            }
        };
    }

    let analysis_type = state
        .analysis_choices
        .iter()
        .find(|choice| choice.name == config.analysis_name)
        .cloned()
        .unwrap_or_else(|| AnalysisChoice {
            name: config.analysis_name.clone(),
            display_name: config.display_name.clone(),
            short_description: config.short_description.clone(),
            description: config.description.clone(),
            param_names: saved.param_specs.iter().map(|spec| spec.name.clone()).collect(),
        });

    vec![AnalysisEvent::CreateNewTab {
        initial: Panel::Unsaved(UnsavedAnalysis {
            display_name: config.display_name.clone(),
            analysis_type,
            param_specs: saved.param_specs.clone(),
            param_values: saved.param_values.clone(),
            panel_ui: PanelUiState::default(),
            form_status: FormStatus::AwaitingUserSubmission,
            form_error_message: saved.form_error_message.clone(),
            form_validation_errors: saved.form_validation_errors.clone(),
            poll_countdown: state.poll_budget,
        }),
    }]
}
