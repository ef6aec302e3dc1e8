//! Tab Action Integration Tests
//!
//! Delete, rename and duplicate, including the way each reports remote
//! failures to the user.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use step_analysis::core::{
    tab_configs, AnalysisEvent, AnalysisMenu, AnalysisStatus, Panel, PanelKind, ParamValues,
    ServiceError, StepAnalysesState, DELETE_CONFIRMATION,
};
use step_analysis::{OrchestratorHandle, OrchestratorSettings};

use crate::support::{
    choice, config, open_step, param, settle, start, wait_until, RecordingPresenter,
    ScriptedService,
};

fn two_tab_step() -> ScriptedService {
    let mut enrichment = config(11, "go-enrichment", "Enrichment", AnalysisStatus::Complete);
    enrichment.parameters = ParamValues::from([("organism".to_string(), "human".to_string())]);
    enrichment.display_params = vec![param("organism", "human")];
    ScriptedService::new()
        .with_applied(1, &[(10, "Word cloud"), (11, "Enrichment")])
        .with_choice(choice("word-cloud", &[]))
        .with_choice(choice("go-enrichment", &["organism"]))
        .with_config(config(10, "word-cloud", "Word cloud", AnalysisStatus::Complete))
        .with_result(10, json!({"words": []}))
        .with_config(enrichment)
        .with_result(11, json!({"terms": 2}))
}

async fn open_tab(handle: &OrchestratorHandle, panel_id: u32) -> StepAnalysesState {
    handle
        .dispatch(AnalysisEvent::SelectTab {
            panel_id: Some(panel_id),
        })
        .unwrap();
    wait_until(handle, |state| {
        state.panel(panel_id).and_then(Panel::as_saved).is_some()
    })
    .await
}

fn labels(state: &StepAnalysesState) -> Vec<String> {
    tab_configs(state).into_iter().map(|tab| tab.label).collect()
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_delete_failure_still_removes_the_tab() {
    let service = Arc::new(two_tab_step().failing(
        "delete_analysis",
        ServiceError::Http {
            status: 409,
            body: "Analysis is locked".to_string(),
        },
    ));
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 0).await;

    handle
        .dispatch(AnalysisEvent::DeleteAnalysis { panel_id: 0 })
        .unwrap();
    // the neighbour takes focus and is hydrated in turn
    let state = wait_until(&handle, |state| {
        state.panel(0).is_none() && state.panel(1).and_then(Panel::as_saved).is_some()
    })
    .await;

    assert_eq!(presenter.confirms(), vec![DELETE_CONFIRMATION.to_string()]);
    assert_eq!(
        presenter.alerts(),
        vec!["An error occurred while deleting this analysis: Analysis is locked".to_string()]
    );
    assert_eq!(service.call_count("delete_analysis"), 1);
    assert_eq!(state.panel_order, vec![1]);
    assert_eq!(state.active_tab, Some(1));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_declined_delete_keeps_the_tab() {
    let service = Arc::new(two_tab_step());
    let presenter = Arc::new(RecordingPresenter::answering(false));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 0).await;

    handle
        .dispatch(AnalysisEvent::DeleteAnalysis { panel_id: 0 })
        .unwrap();
    settle().await;

    let state = handle.snapshot();
    assert_eq!(presenter.confirms().len(), 1);
    assert_eq!(service.call_count("delete_analysis"), 0);
    assert_eq!(state.panel_order, vec![0, 1]);
    assert_eq!(state.active_tab, Some(0));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_menu_tab_closes_without_confirmation() {
    let service = Arc::new(two_tab_step());
    let presenter = Arc::new(RecordingPresenter::answering(false));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::CreateNewTab {
            initial: Panel::MenuOpen(AnalysisMenu::default()),
        })
        .unwrap();
    let state = wait_until(&handle, |state| state.menu_panel_id().is_some()).await;
    let menu_id = state.menu_panel_id().unwrap();
    assert_eq!(state.active_tab, Some(menu_id));

    handle
        .dispatch(AnalysisEvent::DeleteAnalysis { panel_id: menu_id })
        .unwrap();
    let state = wait_until(&handle, |state| state.menu_panel_id().is_none()).await;

    assert!(presenter.confirms().is_empty());
    assert_eq!(service.call_count("delete_analysis"), 0);
    assert_eq!(state.active_tab, None);
    assert_eq!(state.panel_order, vec![0, 1]);

    handle.shutdown().await.unwrap();
}

// ============================================================================
// Rename
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rename_saved_analysis() {
    let service = Arc::new(two_tab_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::RenameAnalysis {
            panel_id: 1,
            new_display_name: "Human enrichment".to_string(),
        })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state
            .panel(1)
            .is_some_and(|panel| panel.display_name() == "Human enrichment")
    })
    .await;

    assert_eq!(service.calls().last().map(String::as_str), Some("rename_analysis:11"));
    assert_eq!(labels(&state), vec!["Word cloud", "Human enrichment"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rename_failure_keeps_old_name() {
    let service = Arc::new(
        two_tab_step().failing("rename_analysis", ServiceError::transport("connection reset")),
    );
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::RenameAnalysis {
            panel_id: 1,
            new_display_name: "Human enrichment".to_string(),
        })
        .unwrap();
    settle().await;

    let state = handle.snapshot();
    assert_eq!(state.panel(1).unwrap().display_name(), "Enrichment");
    assert_eq!(
        presenter.alerts(),
        vec![
            "An error occurred while renaming this analysis: Transport error: connection reset"
                .to_string()
        ]
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rename_unsaved_is_local() {
    let service = Arc::new(two_tab_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::DuplicateAnalysis { panel_id: 1 })
        .unwrap();
    let state = wait_until(&handle, |state| state.panels.len() == 3).await;
    let copy_id = state.active_tab.unwrap();

    handle
        .dispatch(AnalysisEvent::RenameAnalysis {
            panel_id: copy_id,
            new_display_name: "Mouse enrichment".to_string(),
        })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state
            .panel(copy_id)
            .is_some_and(|panel| panel.display_name() == "Mouse enrichment")
    })
    .await;

    assert_eq!(service.call_count("rename_analysis"), 0);
    assert_eq!(labels(&state)[2], "Mouse enrichment*");

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rename_during_status_check_survives_the_result() {
    let service = Arc::new(
        ScriptedService::new()
            .with_applied(1, &[(20, "Old name")])
            .with_choice(choice("go-enrichment", &["organism"]))
            .with_config(config(20, "go-enrichment", "Old name", AnalysisStatus::Running))
            .with_result(20, json!({"terms": 3}))
            .with_status_delay(Duration::from_secs(5)),
    );
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 0).await;

    handle
        .dispatch(AnalysisEvent::RenameAnalysis {
            panel_id: 0,
            new_display_name: "New name".to_string(),
        })
        .unwrap();
    wait_until(&handle, |state| {
        state
            .panel(0)
            .is_some_and(|panel| panel.display_name() == "New name")
    })
    .await;
    assert_eq!(service.call_count("rename_analysis"), 1);
    assert_eq!(service.call_count("get_status"), 0);

    let state = wait_until(&handle, |state| {
        state
            .panel(0)
            .and_then(Panel::as_saved)
            .is_some_and(|saved| saved.analysis_config.status == AnalysisStatus::Complete)
    })
    .await;

    let saved = state.panel(0).and_then(Panel::as_saved).unwrap();
    assert_eq!(saved.analysis_config.display_name, "New name");
    assert_eq!(saved.result_contents, json!({"terms": 3}));
    assert_eq!(labels(&state), vec!["New name"]);

    handle.shutdown().await.unwrap();
}

// ============================================================================
// Duplicate
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_duplicate_with_parameters_opens_unsaved_copy() {
    let service = Arc::new(two_tab_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::DuplicateAnalysis { panel_id: 1 })
        .unwrap();
    let state = wait_until(&handle, |state| state.panels.len() == 3).await;
    settle().await;

    assert_eq!(service.call_count("create_analysis"), 0);
    assert_eq!(labels(&state), vec!["Word cloud", "Enrichment", "Enrichment*"]);
    assert_eq!(state.active_tab, Some(2));
    let copy = state.panel(2).unwrap().as_unsaved().unwrap();
    assert_eq!(copy.analysis_type.name, "go-enrichment");
    assert_eq!(
        copy.param_values.get("organism").map(String::as_str),
        Some("human")
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_autorun_creates_and_runs_copy() {
    let service = Arc::new(two_tab_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 0).await;

    handle
        .dispatch(AnalysisEvent::DuplicateAnalysis { panel_id: 0 })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state
            .panel(2)
            .and_then(Panel::as_saved)
            .is_some_and(|saved| saved.analysis_config.status == AnalysisStatus::Complete)
    })
    .await;

    // persisted at once, then hydrated and re-run from CREATED
    assert_eq!(service.call_count("create_analysis"), 1);
    assert_eq!(service.call_count("run_analysis"), 1);
    assert_eq!(state.active_tab, Some(2));
    assert_eq!(state.panel(2).unwrap().kind(), PanelKind::Saved);
    assert_eq!(state.panel(2).unwrap().analysis_id(), Some(100));
    assert_eq!(labels(&state), vec!["Word cloud", "Enrichment", "Word cloud"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_failure_is_alerted() {
    let service = Arc::new(two_tab_step().failing(
        "create_analysis",
        ServiceError::Http {
            status: 500,
            body: String::new(),
        },
    ));
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    open_tab(&handle, 0).await;

    handle
        .dispatch(AnalysisEvent::DuplicateAnalysis { panel_id: 0 })
        .unwrap();
    settle().await;

    assert_eq!(handle.snapshot().panels.len(), 2);
    assert_eq!(
        presenter.alerts(),
        vec![
            "An error occurred while duplicating this analysis: The server responded with status 500"
                .to_string()
        ]
    );

    handle.shutdown().await.unwrap();
}
