//! Publish/subscribe abstraction for mutation events (mechanics only).
//!
//! The bus is the seam between the write path and the index pipeline. It is
//! intentionally lightweight and transport-agnostic: in-memory channels for
//! tests and single-process deployments, a durable broker in production.
//!
//! Delivery semantics the rest of the system is built on:
//!
//! - **At-least-once**: a message may be delivered more than once. Consumers
//!   must be idempotent; the synchronizer applies full snapshots so replays
//!   converge to the same index state.
//! - **No cross-item ordering**: messages for different items may interleave
//!   arbitrarily. Per-item ordering is not required either, because payloads
//!   are snapshots, not deltas.
//! - **No persistence**: the bus distributes; the primary store is the source
//!   of truth. A lost message means index lag, never data loss.
//!
//! `publish` failures are surfaced to the caller. What the caller does with
//! them differs by side: the producer (mutation publisher) logs and swallows
//! them — the primary mutation is already committed and must not be rolled
//! back — while the consumer side relies on broker redelivery instead.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to the mutation-event stream.
///
/// Each subscription receives a copy of every message published after it was
/// created (broadcast semantics). Subscriptions are single-consumer: give each
/// worker thread its own.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    ///
    /// Worker loops use this so they can interleave shutdown checks with
    /// consumption.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Transport seam for mutation events.
///
/// Implementations must be safe to publish to from many request threads
/// concurrently (`Send + Sync`).
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
