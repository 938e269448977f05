//! Per-session sequential processing.
//!
//! Each client gets a dedicated tokio task that handles its events one at a
//! time, in arrival order. Different clients are processed in parallel.
//!
//! `/cancel` bumps the client's cancel epoch when it is enqueued; events
//! queued before it are dropped unprocessed. A handler already running is
//! never interrupted.
//!
//! A worker that stays idle for the idle timeout exits. A session holding a
//! cart or a staff flow is parked in the registry and handed to the next
//! worker of that client; any other session is dropped and reopened in the
//! lobby.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use dinebot_core::inbound::Inbound;
use dinebot_core::types::ChatId;

use crate::effects::EffectRunner;
use crate::error::BotError;
use crate::maintenance::MaintenanceReporter;
use crate::router::UpdateRouter;
use crate::session::Session;

/// An event waiting in a session queue, stamped with the cancel epoch that
/// was current when it arrived.
struct Queued {
    inbound: Inbound,
    epoch: u64,
}

struct Worker {
    sender: mpsc::UnboundedSender<Queued>,
    cancel_epoch: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

/// Default time a worker waits for the next event before exiting.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Live session workers keyed by client id.
#[derive(Default)]
struct SessionRegistry {
    workers: HashMap<ChatId, Worker>,
    /// Sessions of evicted workers, waiting for the client's next event.
    parked: HashMap<ChatId, Session>,
}

/// Everything a worker needs to handle an event.
struct Pipeline {
    router: UpdateRouter,
    runner: EffectRunner,
    reporter: MaintenanceReporter,
}

/// Routes inbound events to per-session workers.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone)]
pub struct SessionDispatcher {
    pipeline: Arc<Pipeline>,
    registry: Arc<Mutex<SessionRegistry>>,
    idle_timeout: Duration,
}

impl SessionDispatcher {
    pub fn new(router: UpdateRouter, runner: EffectRunner, reporter: MaintenanceReporter) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                router,
                runner,
                reporter,
            }),
            registry: Arc::new(Mutex::new(SessionRegistry::default())),
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    /// Evict workers after `idle_timeout` without events.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Queue `inbound` on its client's worker, spawning the worker on first
    /// contact. Must be called from within a tokio runtime.
    pub fn dispatch(&self, inbound: Inbound) {
        if inbound.client.is_bot {
            tracing::debug!(client_id = inbound.client.id, "Ignoring update from a bot");
            return;
        }

        let client_id = inbound.client.id;
        let is_cancel = inbound.event.is_command("cancel");
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);

        let alive = registry
            .workers
            .get(&client_id)
            .is_some_and(|w| !w.sender.is_closed());
        if !alive {
            let parked = registry.parked.remove(&client_id);
            let worker = self.spawn_worker(client_id, parked);
            registry.workers.insert(client_id, worker);
        }
        let Some(worker) = registry.workers.get(&client_id) else {
            return;
        };

        let epoch = if is_cancel {
            worker.cancel_epoch.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            worker.cancel_epoch.load(Ordering::SeqCst)
        };

        if worker.sender.send(Queued { inbound, epoch }).is_err() {
            tracing::warn!(client_id, "Session worker is gone, update dropped");
        }
    }

    /// Number of sessions with a live worker.
    pub fn session_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .workers
            .values()
            .filter(|w| !w.sender.is_closed())
            .count()
    }

    /// Stop accepting work and wait for every worker to drain its queue.
    pub async fn shutdown(&self) {
        let workers: Vec<Worker> = {
            let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.workers.drain().map(|(_, w)| w).collect()
        };
        let count = workers.len();

        let handles: Vec<JoinHandle<()>> = workers
            .into_iter()
            .map(|w| {
                drop(w.sender);
                w.handle
            })
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Session worker panicked");
            }
        }
        tracing::info!(sessions = count, "Session workers stopped");
    }

    // ---- private helpers ----

    fn spawn_worker(&self, client_id: ChatId, parked: Option<Session>) -> Worker {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel_epoch = Arc::new(AtomicU64::new(0));
        let resumed = parked.is_some();
        let handle = tokio::spawn(run_worker(
            Arc::clone(&self.pipeline),
            WorkerSlot {
                client_id,
                registry: Arc::clone(&self.registry),
                idle_timeout: self.idle_timeout,
            },
            receiver,
            Arc::clone(&cancel_epoch),
            parked,
        ));
        tracing::debug!(client_id, resumed, "Session worker started");
        Worker {
            sender,
            cancel_epoch,
            handle,
        }
    }
}

/// Where a worker sits in the registry.
struct WorkerSlot {
    client_id: ChatId,
    registry: Arc<Mutex<SessionRegistry>>,
    idle_timeout: Duration,
}

impl WorkerSlot {
    /// Leave the registry unless an event slipped in meanwhile, in which
    /// case it is returned and the worker carries on.
    ///
    /// Holds the registry lock: `dispatch` either queued its event before
    /// the check or finds the worker gone and spawns a new one.
    fn evict(
        &self,
        receiver: &mut mpsc::UnboundedReceiver<Queued>,
        session: &mut Option<Session>,
    ) -> Option<Queued> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        match receiver.try_recv() {
            Ok(queued) => Some(queued),
            // Shutdown already took this worker out of the registry.
            Err(TryRecvError::Disconnected) => None,
            Err(TryRecvError::Empty) => {
                registry.workers.remove(&self.client_id);
                if let Some(session) = session.take().filter(Session::holds_progress) {
                    registry.parked.insert(self.client_id, session);
                }
                tracing::debug!(client_id = self.client_id, "Idle session worker evicted");
                None
            }
        }
    }
}

async fn run_worker(
    pipeline: Arc<Pipeline>,
    slot: WorkerSlot,
    mut receiver: mpsc::UnboundedReceiver<Queued>,
    cancel_epoch: Arc<AtomicU64>,
    mut session: Option<Session>,
) {
    let client_id = slot.client_id;

    loop {
        let next = match tokio::time::timeout(slot.idle_timeout, receiver.recv()).await {
            Ok(next) => next,
            Err(_) => slot.evict(&mut receiver, &mut session),
        };
        let Some(Queued { inbound, epoch }) = next else {
            break;
        };

        if epoch < cancel_epoch.load(Ordering::SeqCst) {
            tracing::debug!(
                client_id,
                event = inbound.event.label(),
                "Discarding update queued before /cancel"
            );
            continue;
        }

        if session.is_none() {
            match pipeline.open_session(&inbound).await {
                Ok(opened) => session = Some(opened),
                Err(e) => {
                    pipeline
                        .reporter
                        .report(&inbound, &Session::new(client_id), &e)
                        .await;
                    continue;
                }
            }
        }
        if let Some(current) = session.as_mut() {
            pipeline.process(current, &inbound).await;
        }
    }

    tracing::debug!(client_id, "Session worker stopped");
}

impl Pipeline {
    /// First contact in this process, or after an eviction: register the
    /// client and start in the lobby.
    async fn open_session(&self, inbound: &Inbound) -> Result<Session, BotError> {
        let ctx = self.router.context();
        let is_new = ctx.repo.upsert_user(&inbound.client, ctx.now()).await?;

        let mut session = Session::new(inbound.client.id);
        session.welcomed = !is_new;
        Ok(session)
    }

    /// Route on a copy of `session`, commit it on success, then perform the
    /// effects. Faults leave `session` as it was and go to the developer.
    async fn process(&self, session: &mut Session, inbound: &Inbound) {
        let mut working = session.clone();
        match self.router.route(&mut working, inbound).await {
            Ok(effects) => {
                *session = working;
                if let Err(e) = self.runner.apply(effects).await {
                    self.reporter.report(inbound, session, &e.into()).await;
                }
            }
            Err(e) => self.reporter.report(inbound, session, &e).await,
        }
    }
}
