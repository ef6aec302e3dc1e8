//! Polling Scheduler
//!
//! Fixed-interval status polling for submitted analyses. A status check that
//! finds the job still pending starts a countdown; each `CountDown` waits one
//! tick and then either counts down again or, once the panel's countdown has
//! reached zero, checks the status again. With the default budget of 3 and a
//! one second tick, that is one status request roughly every three seconds.
//!
//! Removing a tab stops its loop: the countdown re-reads the store after
//! every tick and emits nothing for a panel that no longer exists.

use step_analysis_core::{
    empty_result, AnalysisEvent, AnalysisStatus, Panel, PanelId, ServiceError, StepAnalysesState,
    SubmissionOutcome,
};

use super::coordinators::CoordinatorContext;

const POLL_FAILURE_PREFIX: &str = "An error occurred while trying to run your analysis";

/// Query the remote status of a saved panel and settle it once terminal.
pub(crate) async fn check_result_status(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
) -> Vec<AnalysisEvent> {
    let Some(saved) = state.panel(panel_id).and_then(Panel::as_saved) else {
        return Vec::new();
    };
    let step_id = state.step_id;
    let analysis_id = saved.analysis_config.analysis_id;

    let settled = async {
        let status = ctx.service.get_status(step_id, analysis_id).await?;
        if status.is_in_progress() {
            tracing::debug!(panel_id, analysis_id, "[Poll] Analysis still {}", status);
            return Ok(None);
        }
        let contents = if status == AnalysisStatus::Complete {
            ctx.service.get_result(step_id, analysis_id).await?
        } else {
            empty_result()
        };
        tracing::info!(panel_id, analysis_id, "[Poll] Analysis finished: {}", status);
        Ok::<_, ServiceError>(Some(SubmissionOutcome::Settled {
            status,
            result_contents: contents,
        }))
    }
    .await;

    match settled {
        Ok(None) => vec![AnalysisEvent::CountDown { panel_id }],
        Ok(Some(outcome)) => vec![AnalysisEvent::FinishFormSubmission { panel_id, outcome }],
        Err(e) => {
            tracing::warn!(panel_id, analysis_id, "[Poll] Status check failed: {}", e);
            vec![AnalysisEvent::FinishFormSubmission {
                panel_id,
                outcome: SubmissionOutcome::PollFailed {
                    error_message: format!("{}: {}", POLL_FAILURE_PREFIX, e),
                },
            }]
        }
    }
}

/// Wait one tick, then continue the countdown or re-check the status.
pub(crate) async fn count_down(
    ctx: &CoordinatorContext,
    state: &StepAnalysesState,
    panel_id: PanelId,
) -> Vec<AnalysisEvent> {
    let runnable = state.panel(panel_id).is_some_and(Panel::is_runnable);
    if !runnable {
        return Vec::new();
    }

    tokio::time::sleep(ctx.settings.poll_tick()).await;

    let countdown = {
        let current = ctx.store.borrow();
        if current.generation != state.generation {
            return Vec::new();
        }
        current.panel(panel_id).and_then(Panel::poll_countdown)
    };

    match countdown {
        Some(remaining) if remaining > 0 => vec![AnalysisEvent::CountDown { panel_id }],
        Some(_) => vec![AnalysisEvent::CheckResultStatus { panel_id }],
        None => {
            tracing::debug!(panel_id, "[Poll] Panel gone, stopping poll loop");
            Vec::new()
        }
    }
}
