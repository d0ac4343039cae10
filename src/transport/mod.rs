//! Message transport: the FIFO channel fabric connecting role executors
//! (spec.md §4.8, component C8).
//!
//! Synchronous and in-process — every role's executor runs cooperatively in
//! the same thread (spec.md §5), so the transport is a plain data structure
//! rather than an async/networked abstraction, unlike the teacher's
//! `ChoreoHandler` trait (which targeted real transports). One [`Channel`]
//! per ordered `(sender, receiver)` pair, so FIFO order is per-pair, not
//! global, matching spec.md §4.8.

pub mod channel;

pub use channel::{Channel, ChannelError, Envelope};

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::ast::{MessageSignature, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("receive order violates FIFO: `{receiver}` expected message {expected} from `{sender}` but got {actual}")]
    FifoViolation { sender: Role, receiver: Role, expected: Uuid, actual: Uuid },
}

/// The full set of FIFO channels for one running protocol instance.
#[derive(Debug, Default)]
pub struct Transport {
    channels: HashMap<(Role, Role), Channel>,
    capacity: Option<usize>,
}

impl Transport {
    pub fn new() -> Self {
        Transport { channels: HashMap::new(), capacity: None }
    }

    pub fn bounded(capacity: usize) -> Self {
        Transport { channels: HashMap::new(), capacity: Some(capacity) }
    }

    fn channel_mut(&mut self, sender: &Role, receiver: &Role) -> &mut Channel {
        self.channels.entry((sender.clone(), receiver.clone())).or_insert_with(|| match self.capacity {
            Some(cap) => Channel::bounded(cap),
            None => Channel::new(),
        })
    }

    /// Sends `message` to a single receiver.
    pub fn send(
        &mut self,
        sender: &Role,
        receiver: &Role,
        message: MessageSignature,
    ) -> Result<Uuid, TransportError> {
        let envelope = Envelope { id: Uuid::new_v4(), sender: sender.clone(), receiver: receiver.clone(), message };
        let id = envelope.id;
        self.channel_mut(sender, receiver).send(envelope)?;
        Ok(id)
    }

    /// Fans a multicast send out to every receiver, each getting its own
    /// envelope on its own `(sender, receiver)` channel.
    pub fn send_multicast(
        &mut self,
        sender: &Role,
        receivers: &[Role],
        message: MessageSignature,
    ) -> Result<Vec<Uuid>, TransportError> {
        receivers.iter().map(|r| self.send(sender, r, message.clone())).collect()
    }

    /// Delivers the oldest pending message from `sender` to `receiver`, if
    /// any. Returns `Ok(None)` rather than an error when nothing is ready —
    /// callers treat that as "not yet enabled", not a fault.
    pub fn receive(&mut self, sender: &Role, receiver: &Role) -> Option<Envelope> {
        self.channels.get_mut(&(sender.clone(), receiver.clone())).and_then(Channel::receive)
    }

    pub fn has_message(&self, sender: &Role, receiver: &Role) -> bool {
        self.channels.get(&(sender.clone(), receiver.clone())).is_some_and(Channel::has_message)
    }

    /// The oldest pending message on this channel, without removing it —
    /// used to check a receive's label against the channel head before
    /// reporting it enabled (spec.md §4.9 step 2).
    pub fn peek(&self, sender: &Role, receiver: &Role) -> Option<&Envelope> {
        self.channels.get(&(sender.clone(), receiver.clone())).and_then(Channel::peek)
    }

    pub fn pending(&self, sender: &Role, receiver: &Role) -> usize {
        self.channels.get(&(sender.clone(), receiver.clone())).map_or(0, Channel::pending)
    }

    /// True once every channel is empty — part of global completion
    /// (spec.md §4.10: "all roles completed and all channels empty").
    pub fn is_empty(&self) -> bool {
        self.channels.values().all(|c| !c.has_message())
    }

    /// Checks that `actual` is the next message due on this channel before
    /// letting an executor consume a specific envelope id — used when a role
    /// may be enabled to receive from several senders and picks one
    /// explicitly (spec.md §4.9 manual selection).
    pub fn check_fifo(&self, sender: &Role, receiver: &Role, actual: Uuid) -> Result<(), TransportError> {
        if let Some(channel) = self.channels.get(&(sender.clone(), receiver.clone())) {
            if let Some(expected) = channel.peek() {
                if expected.id != actual {
                    return Err(TransportError::FifoViolation {
                        sender: sender.clone(),
                        receiver: receiver.clone(),
                        expected: expected.id,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }
}
