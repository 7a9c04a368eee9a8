//! Background consumer loop: bus → synchronizer → index.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{error, warn};

use tradepost_catalog::ItemMutation;
use tradepost_events::{EventBus, Subscription, SyncEnvelope};

use super::dead_letter::{DeadLetter, DeadLetterQueue};
use super::index::SearchIndex;
use super::synchronizer::IndexSynchronizer;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Index-synchronization worker.
///
/// - Subscribes to the mutation-event bus
/// - Applies each event through the (idempotent) synchronizer
/// - Retries a failing event up to `max_attempts`, then dead-letters it —
///   an exhausted event is parked, never dropped
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct SyncWorker;

impl SyncWorker {
    /// Spawn a worker thread consuming from `bus`.
    ///
    /// `max_attempts` must be at least 1.
    pub fn spawn<B, I>(
        name: &'static str,
        bus: B,
        synchronizer: IndexSynchronizer<I>,
        max_attempts: u32,
        dead_letters: Arc<DeadLetterQueue>,
    ) -> WorkerHandle
    where
        B: EventBus<SyncEnvelope<ItemMutation>> + Send + Sync + 'static,
        I: SearchIndex + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let subscription: Subscription<SyncEnvelope<ItemMutation>> = bus.subscribe();
        let max_attempts = max_attempts.max(1);

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                worker_loop(
                    name,
                    subscription,
                    shutdown_rx,
                    &synchronizer,
                    max_attempts,
                    &dead_letters,
                )
            })
            .expect("failed to spawn sync worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop<I>(
    name: &'static str,
    subscription: Subscription<SyncEnvelope<ItemMutation>>,
    shutdown_rx: mpsc::Receiver<()>,
    synchronizer: &IndexSynchronizer<I>,
    max_attempts: u32,
    dead_letters: &DeadLetterQueue,
) where
    I: SearchIndex,
{
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match subscription.recv_timeout(tick) {
            Ok(envelope) => {
                apply_with_redelivery(name, synchronizer, envelope, max_attempts, dead_letters);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// In-process stand-in for broker redelivery: a failed apply is retried up to
/// the bound, then parked.
fn apply_with_redelivery<I>(
    name: &'static str,
    synchronizer: &IndexSynchronizer<I>,
    envelope: SyncEnvelope<ItemMutation>,
    max_attempts: u32,
    dead_letters: &DeadLetterQueue,
) where
    I: SearchIndex,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match synchronizer.apply(&envelope) {
            Ok(()) => return,
            Err(err) if attempts < max_attempts => {
                warn!(
                    worker = name,
                    event_id = %envelope.event_id(),
                    item_id = %envelope.payload().item_id(),
                    attempts,
                    error = %err,
                    "index apply failed; redelivering"
                );
            }
            Err(err) => {
                error!(
                    worker = name,
                    event_id = %envelope.event_id(),
                    item_id = %envelope.payload().item_id(),
                    attempts,
                    error = %err,
                    "redelivery exhausted; event dead-lettered"
                );
                dead_letters.push(DeadLetter {
                    envelope,
                    attempts,
                    last_error: err.to_string(),
                });
                return;
            }
        }
    }
}
