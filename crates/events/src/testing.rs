//! Test doubles for transport behavior.

use std::sync::mpsc;

use crate::bus::{EventBus, Subscription};

/// Error returned by [`FailingEventBus`].
#[derive(Debug)]
pub struct TransportDown;

/// A bus whose `publish` always fails, simulating an unreachable broker.
///
/// Used to exercise the write path's isolation guarantee: a committed
/// primary-store mutation must still report success when the transport is
/// down at publish time.
#[derive(Debug, Default)]
pub struct FailingEventBus;

impl FailingEventBus {
    pub fn new() -> Self {
        Self
    }
}

impl<M> EventBus<M> for FailingEventBus
where
    M: Send + 'static,
{
    type Error = TransportDown;

    fn publish(&self, _message: M) -> Result<(), Self::Error> {
        Err(TransportDown)
    }

    fn subscribe(&self) -> Subscription<M> {
        // Nothing is ever delivered; the sender is dropped immediately.
        let (_tx, rx) = mpsc::channel();
        Subscription::new(rx)
    }
}
