//! Orchestrator Runtime
//!
//! Hosts the store. One event-loop task owns the authoritative
//! `StepAnalysesState` and folds events into it strictly in arrival order.
//! After each reduction the snapshot is published on a `watch` channel, the
//! event is broadcast to observers, and the matching coordinator is spawned
//! as its own task.
//!
//! Every coordinator task belongs to a step generation. Re-entering the tab
//! listing cancels the previous generation's token, and any follow-up event
//! that still arrives tagged with an old generation is dropped before it
//! reaches the reducer.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use step_analysis_core::{
    reduce, AnalysisEvent, AnalysisService, Presenter, StepAnalysesState, StepId, StrategyId,
};

use crate::models::settings::OrchestratorSettings;
use crate::utils::error::{AppError, AppResult};

use super::coordinators::{self, CoordinatorContext};

const EVENT_BROADCAST_CAPACITY: usize = 1024;

/// An event waiting in the queue, with the generation of the coordinator that
/// produced it (`None` for user dispatches)
#[derive(Debug)]
struct QueuedEvent {
    event: AnalysisEvent,
    generation: Option<u64>,
}

/// Builder for the orchestrator runtime
pub struct Orchestrator {
    service: Arc<dyn AnalysisService>,
    presenter: Arc<dyn Presenter>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        presenter: Arc<dyn Presenter>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            service,
            presenter,
            settings,
        }
    }

    /// Spawn the event loop on the current tokio runtime.
    pub fn start(self) -> OrchestratorHandle {
        let initial = StepAnalysesState::default().with_poll_budget(self.settings.poll_budget);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
        let (events_tx, _) = broadcast::channel(EVENT_BROADCAST_CAPACITY);
        let shutdown = CancellationToken::new();

        let ctx = CoordinatorContext {
            service: self.service,
            presenter: self.presenter,
            settings: Arc::new(self.settings),
            store: snapshot_rx.clone(),
        };
        let event_loop = EventLoop {
            state: initial,
            queue_tx: queue_tx.clone(),
            snapshot_tx,
            events_tx: events_tx.clone(),
            generation_token: shutdown.child_token(),
            shutdown: shutdown.clone(),
            ctx,
        };

        tracing::info!("[StepAnalysis] Orchestrator started");
        let task = tokio::spawn(event_loop.run(queue_rx));

        OrchestratorHandle {
            queue_tx,
            snapshots: snapshot_rx,
            events_tx,
            shutdown,
            task,
        }
    }
}

struct EventLoop {
    state: StepAnalysesState,
    queue_tx: mpsc::UnboundedSender<QueuedEvent>,
    snapshot_tx: watch::Sender<StepAnalysesState>,
    events_tx: broadcast::Sender<AnalysisEvent>,
    /// Cancelled when the step generation changes
    generation_token: CancellationToken,
    shutdown: CancellationToken,
    ctx: CoordinatorContext,
}

impl EventLoop {
    async fn run(mut self, mut queue_rx: mpsc::UnboundedReceiver<QueuedEvent>) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                queued = queue_rx.recv() => match queued {
                    Some(queued) => self.process(queued),
                    None => break,
                },
            }
        }
        self.generation_token.cancel();
        tracing::info!("[StepAnalysis] Orchestrator stopped");
    }

    fn process(&mut self, queued: QueuedEvent) {
        let QueuedEvent { event, generation } = queued;
        if let Some(generation) = generation {
            if generation != self.state.generation {
                tracing::debug!(
                    generation,
                    current = self.state.generation,
                    "[StepAnalysis] Dropping stale {}",
                    event.name()
                );
                return;
            }
        }

        let previous = std::mem::take(&mut self.state);
        self.state = reduce(previous, &event);
        tracing::debug!(
            generation = self.state.generation,
            panel_id = ?event.panel_id(),
            "[StepAnalysis] Applied {}",
            event.name()
        );

        if matches!(event, AnalysisEvent::StartLoadingTabListing { .. }) {
            self.generation_token.cancel();
            self.generation_token = self.shutdown.child_token();
            tracing::info!(
                step_id = self.state.step_id,
                generation = self.state.generation,
                "[StepAnalysis] Loading step"
            );
        }

        self.snapshot_tx.send_replace(self.state.clone());
        // no subscribers is fine
        let _ = self.events_tx.send(event.clone());
        self.spawn_coordinator(event);
    }

    fn spawn_coordinator(&self, event: AnalysisEvent) {
        let ctx = self.ctx.clone();
        let state = self.state.clone();
        let generation = state.generation;
        let token = self.generation_token.clone();
        let queue_tx = self.queue_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(generation, "[StepAnalysis] Abandoned {} coordinator", event.name());
                }
                follow_ups = coordinators::observe(&ctx, &event, &state) => {
                    for follow_up in follow_ups {
                        let queued = QueuedEvent {
                            event: follow_up,
                            generation: Some(generation),
                        };
                        if queue_tx.send(queued).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
}

/// Dispatch entry point and read-only view of a running orchestrator
pub struct OrchestratorHandle {
    queue_tx: mpsc::UnboundedSender<QueuedEvent>,
    snapshots: watch::Receiver<StepAnalysesState>,
    events_tx: broadcast::Sender<AnalysisEvent>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl OrchestratorHandle {
    /// Queue a user event.
    pub fn dispatch(&self, event: AnalysisEvent) -> AppResult<()> {
        self.queue_tx
            .send(QueuedEvent {
                event,
                generation: None,
            })
            .map_err(|_| AppError::internal("Orchestrator is not running"))
    }

    /// Shorthand for dispatching `StartLoadingTabListing`.
    pub fn open_step(&self, step_id: StepId, strategy_id: StrategyId) -> AppResult<()> {
        self.dispatch(AnalysisEvent::StartLoadingTabListing {
            step_id,
            strategy_id,
        })
    }

    /// Latest published state.
    pub fn snapshot(&self) -> StepAnalysesState {
        self.snapshots.borrow().clone()
    }

    /// Processed events, in reduction order, from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.events_tx.subscribe()
    }

    /// Wait until a published state satisfies `predicate`.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&StepAnalysesState) -> bool,
    ) -> AppResult<StepAnalysesState> {
        let mut snapshots = self.snapshots.clone();
        let state = snapshots
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| AppError::internal("Orchestrator stopped"))?;
        Ok((*state).clone())
    }

    /// Stop the event loop and abandon all in-flight coordinators.
    pub async fn shutdown(self) -> AppResult<()> {
        self.shutdown.cancel();
        self.task
            .await
            .map_err(|e| AppError::internal(format!("Event loop panicked: {}", e)))
    }
}
