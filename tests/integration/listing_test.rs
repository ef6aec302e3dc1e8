//! Tab Listing and Hydration Integration Tests
//!
//! Covers opening a step, hydrating saved tabs on selection and the
//! automatic re-run of stale parameterless analyses.

use std::sync::Arc;

use serde_json::json;

use step_analysis::core::{
    tab_configs, view, AnalysisEvent, AnalysisStatus, ConfigStatus, PanelKind, ResultView,
    ServiceError, UninitializedStatus, MENU_TAB_LABEL,
};
use step_analysis::OrchestratorSettings;

use crate::support::{
    choice, config, drain_event_names, open_step, settle, start, wait_until, RecordingPresenter,
    ScriptedService,
};

fn word_cloud_step() -> ScriptedService {
    ScriptedService::new()
        .with_applied(1, &[(10, "Word cloud"), (12, "Old cloud")])
        .with_choice(choice("word-cloud", &[]))
        .with_choice(choice("go-enrichment", &["organism"]))
        .with_config(config(10, "word-cloud", "Word cloud", AnalysisStatus::Complete))
        .with_result(10, json!({"words": ["gene", "kinase"]}))
        .with_config(config(12, "word-cloud", "Old cloud", AnalysisStatus::OutOfDate))
        .with_statuses(12, &[AnalysisStatus::Complete])
        .with_result(12, json!({"words": ["fresh"]}))
}

#[tokio::test(start_paused = true)]
async fn test_listing_creates_unopened_tabs_in_order() {
    let service = Arc::new(word_cloud_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());

    let state = open_step(&handle, 1).await;

    assert_eq!(state.generation, 1);
    assert_eq!(state.analysis_choices.len(), 2);
    let labels: Vec<String> = tab_configs(&state).into_iter().map(|tab| tab.label).collect();
    assert_eq!(labels, vec!["Word cloud", "Old cloud"]);
    for (_, panel) in state.ordered_panels() {
        let uninitialized = panel.as_uninitialized().unwrap();
        assert_eq!(uninitialized.status, UninitializedStatus::Unopened);
    }
    assert_eq!(state.active_tab, None);
    // nothing is fetched until a tab is selected
    assert_eq!(service.call_count("get_analysis_config"), 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_empty_step_opens_on_the_menu() {
    let service = Arc::new(ScriptedService::new().with_choice(choice("word-cloud", &[])));
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());

    let state = open_step(&handle, 3).await;

    let tabs = tab_configs(&state);
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0].label, MENU_TAB_LABEL);
    assert_eq!(tabs[0].external_id.as_deref(), Some("analysis:menu"));
    assert!(!view::new_analysis_button_visible(&state));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_listing_failure_leaves_step_loading() {
    let service = Arc::new(
        word_cloud_step().failing("list_analysis_types", ServiceError::transport("refused")),
    );
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());

    handle.open_step(1, 7).unwrap();
    settle().await;

    let state = handle.snapshot();
    assert_eq!(state.step_id, 1);
    assert!(state.loading_choices);
    assert!(state.panels.is_empty());
    assert!(presenter.alerts().is_empty());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_selecting_a_tab_hydrates_it() {
    let service = Arc::new(word_cloud_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::SelectTab { panel_id: Some(0) })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state.panel(0).is_some_and(|panel| panel.kind() == PanelKind::Saved)
    })
    .await;

    assert_eq!(state.active_tab, Some(0));
    let panel = state.panel(0).unwrap();
    let saved = panel.as_saved().unwrap();
    assert_eq!(saved.config_status, ConfigStatus::Complete);
    assert_eq!(
        view::result_view(panel),
        Some(ResultView::Complete {
            contents: json!({"words": ["gene", "kinase"]})
        })
    );
    // the other tab stays unopened
    assert_eq!(state.panel(1).unwrap().kind(), PanelKind::Uninitialized);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hydration_failure_marks_tab_errored() {
    let service = Arc::new(word_cloud_step().failing(
        "get_analysis_config",
        ServiceError::Http {
            status: 500,
            body: "database unavailable".to_string(),
        },
    ));
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::SelectTab { panel_id: Some(0) })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state
            .panel(0)
            .and_then(|panel| panel.as_uninitialized())
            .is_some_and(|panel| panel.status == UninitializedStatus::Error)
    })
    .await;

    let panel = state.panel(0).unwrap().as_uninitialized().unwrap();
    assert_eq!(panel.error_message.as_deref(), Some("database unavailable"));
    // read failures are not alerted
    assert!(presenter.alerts().is_empty());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stale_parameterless_analysis_is_rerun_on_open() {
    let service = Arc::new(word_cloud_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;
    let mut events = handle.subscribe();

    handle
        .dispatch(AnalysisEvent::SelectTab { panel_id: Some(1) })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state
            .panel(1)
            .and_then(|panel| panel.as_saved())
            .is_some_and(|saved| saved.analysis_config.status == AnalysisStatus::Complete)
    })
    .await;

    assert_eq!(
        drain_event_names(&mut events),
        vec![
            "SelectTab",
            "StartLoadingSavedTab",
            "FinishLoadingSavedTab",
            "StartFormSubmission",
            "RunAnalysis",
            "AnalysisStatusChanged",
            "CheckResultStatus",
            "FinishFormSubmission",
        ]
    );
    assert_eq!(service.call_count("update_parameters"), 1);
    assert_eq!(service.call_count("run_analysis"), 1);
    let saved = state.panel(1).unwrap().as_saved().unwrap();
    assert_eq!(saved.result_contents, json!({"words": ["fresh"]}));
    assert!(view::is_settled(&state));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stale_rerun_can_be_disabled() {
    let service = Arc::new(word_cloud_step());
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let settings = OrchestratorSettings {
        autorun_stale: false,
        ..Default::default()
    };
    let handle = start(&service, &presenter, settings);
    open_step(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::SelectTab { panel_id: Some(1) })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state.panel(1).is_some_and(|panel| panel.kind() == PanelKind::Saved)
    })
    .await;
    settle().await;

    assert_eq!(service.call_count("run_analysis"), 0);
    let panel = state.panel(1).unwrap();
    assert_eq!(
        view::result_view(panel),
        Some(ResultView::Unavailable {
            reason: AnalysisStatus::OutOfDate.unavailable_reason().to_string()
        })
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_running_analysis_resumes_polling_on_open() {
    let service = Arc::new(
        ScriptedService::new()
            .with_applied(1, &[(20, "Slow enrichment")])
            .with_choice(choice("go-enrichment", &["organism"]))
            .with_config(config(20, "go-enrichment", "Slow enrichment", AnalysisStatus::Running))
            .with_statuses(20, &[AnalysisStatus::Running, AnalysisStatus::Complete])
            .with_result(20, json!({"terms": 12})),
    );
    let presenter = Arc::new(RecordingPresenter::answering(true));
    let handle = start(&service, &presenter, OrchestratorSettings::default());
    open_step(&handle, 1).await;

    handle
        .dispatch(AnalysisEvent::SelectTab { panel_id: Some(0) })
        .unwrap();
    let state = wait_until(&handle, |state| {
        state
            .panel(0)
            .and_then(|panel| panel.as_saved())
            .is_some_and(|saved| saved.analysis_config.status == AnalysisStatus::Complete)
    })
    .await;

    assert_eq!(service.call_count("get_status"), 2);
    // polling only reads status, it never re-runs the analysis
    assert_eq!(service.call_count("run_analysis"), 0);
    assert_eq!(
        state.panel(0).unwrap().as_saved().unwrap().result_contents,
        json!({"terms": 12})
    );

    handle.shutdown().await.unwrap();
}
