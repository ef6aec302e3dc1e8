// Step Analysis - headless orchestrator entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use step_analysis::core::{
    view, AnalysisEvent, AnalysisStatus, PanelId, PanelKind, PanelMatcher, StepAnalysesState,
    UninitializedStatus,
};
use step_analysis::{
    AnalysisPluginRegistry, ConfigService, ConsolePresenter, HttpAnalysisService, Orchestrator,
    SettingsUpdate,
};

#[derive(Parser)]
#[command(author, version, about = "Open the analysis tabs of a workflow step", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.step-analysis/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the execution service base URL
    #[arg(long)]
    service_url: Option<String>,

    /// Step whose analyses are opened
    #[arg(long)]
    step: i64,

    /// Strategy containing the step
    #[arg(long)]
    strategy: i64,

    /// Focus only this analysis instead of hydrating every tab
    #[arg(long)]
    open: Option<i64>,

    /// Give up waiting for running analyses after this many seconds
    #[arg(long, default_value_t = 60)]
    wait_secs: u64,

    /// Answer yes to confirmation prompts
    #[arg(long)]
    assume_yes: bool,
}

#[derive(Serialize)]
struct TabSummary {
    panel_id: PanelId,
    label: String,
    external_id: Option<String>,
    kind: PanelKind,
    status: Option<AnalysisStatus>,
    form: Option<String>,
    result: Option<String>,
}

fn summarize(state: &StepAnalysesState, registry: &AnalysisPluginRegistry) -> Vec<TabSummary> {
    state
        .ordered_panels()
        .map(|(panel_id, panel)| {
            let type_name = panel.inspect(PanelMatcher::borrowed(
                |_| None,
                |_| None,
                |p| Some(p.analysis_type.name.clone()),
                |p| Some(p.analysis_config.analysis_name.clone()),
            ));
            let plugin = registry.resolve(type_name.as_deref().unwrap_or_default());
            let inputs = panel.inspect(PanelMatcher::borrowed(
                |_| None,
                |_| None,
                |p| Some((p.param_specs.as_slice(), &p.param_values)),
                |p| Some((p.param_specs.as_slice(), &p.param_values)),
            ));
            let form = view::form_view(panel)
                .zip(inputs)
                .map(|(form, (specs, values))| plugin.form.render_form(&form, specs, values));
            let result = view::result_view(panel).map(|result| plugin.result.render_result(&result));
            TabSummary {
                panel_id,
                label: panel.display_name().to_string(),
                external_id: view::external_id(panel),
                kind: panel.kind(),
                status: panel.as_saved().map(|p| p.analysis_config.status),
                form,
                result,
            }
        })
        .collect()
}

/// Log every broadcast event until the orchestrator stops. Returns how many
/// were logged.
async fn log_events(mut events: broadcast::Receiver<AnalysisEvent>) -> usize {
    let mut logged = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                tracing::debug!(
                    "[StepAnalysis] {}",
                    serde_json::to_string(&event).unwrap_or_default()
                );
                logged += 1;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("[StepAnalysis] Event log skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return logged,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigService::open(path),
        None => ConfigService::new(),
    }
    .context("Failed to load configuration")?;
    let mut settings = config.get_config().clone();
    // command line overrides are not written back to the config file
    settings.apply_update(SettingsUpdate {
        service_url: cli.service_url.clone(),
        ..Default::default()
    });
    settings
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid --service-url")?;

    let service = HttpAnalysisService::from_settings(&settings)?;
    let presenter = Arc::new(ConsolePresenter::new(cli.assume_yes));
    let handle = Orchestrator::new(Arc::new(service), presenter, settings).start();

    tokio::spawn(log_events(handle.subscribe()));

    handle.open_step(cli.step, cli.strategy)?;
    let wait = Duration::from_secs(cli.wait_secs);
    let listed = tokio::time::timeout(wait, handle.wait_for(|state| !state.loading_choices))
        .await
        .context("Timed out loading the tab listing")??;

    let targets: Vec<PanelId> = match cli.open {
        Some(analysis_id) => {
            let external = format!("analysis:{}", analysis_id);
            let Some(panel_id) = view::find_panel_by_external_id(&listed, &external) else {
                bail!("Analysis {} is not attached to step {}", analysis_id, cli.step);
            };
            vec![panel_id]
        }
        None => listed
            .ordered_panels()
            .filter(|(_, panel)| panel.kind() == PanelKind::Uninitialized)
            .map(|(panel_id, _)| panel_id)
            .collect(),
    };
    for panel_id in &targets {
        handle.dispatch(AnalysisEvent::SelectTab {
            panel_id: Some(*panel_id),
        })?;
    }

    let hydrated = |state: &StepAnalysesState| {
        view::is_settled(state)
            && targets.iter().all(|panel_id| {
                state
                    .panel(*panel_id)
                    .and_then(|panel| panel.as_uninitialized())
                    .map_or(true, |panel| panel.status != UninitializedStatus::Unopened)
            })
    };
    let state = match tokio::time::timeout(wait, handle.wait_for(hydrated)).await {
        Ok(state) => state?,
        Err(_) => {
            tracing::warn!("[StepAnalysis] Gave up waiting after {}s", cli.wait_secs);
            handle.snapshot()
        }
    };

    let registry = AnalysisPluginRegistry::new();
    println!("{}", serde_json::to_string_pretty(&summarize(&state, &registry))?);

    handle.shutdown().await?;
    Ok(())
}
