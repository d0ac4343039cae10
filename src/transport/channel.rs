// FIFO per-sender channels (spec.md §4.8)

use std::collections::VecDeque;

use uuid::Uuid;

use crate::ast::{MessageSignature, Role};

/// A message in flight, with sender/receiver identity and an id for trace
/// reporting (spec.md §4.10 "traces").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: Uuid,
    pub sender: Role,
    pub receiver: Role,
    pub message: MessageSignature,
}

/// A single sender→receiver FIFO channel. Messages are delivered in the
/// order they were sent (spec.md §4.8 "FIFO per sender/receiver pair").
#[derive(Debug, Default)]
pub struct Channel {
    queue: VecDeque<Envelope>,
    capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("channel from `{sender}` to `{receiver}` is full (capacity {capacity})")]
    BufferOverflow { sender: Role, receiver: Role, capacity: usize },
}

impl Channel {
    pub fn new() -> Self {
        Channel { queue: VecDeque::new(), capacity: None }
    }

    pub fn bounded(capacity: usize) -> Self {
        Channel { queue: VecDeque::new(), capacity: Some(capacity) }
    }

    pub fn send(&mut self, envelope: Envelope) -> Result<(), ChannelError> {
        if let Some(capacity) = self.capacity {
            if self.queue.len() >= capacity {
                return Err(ChannelError::BufferOverflow {
                    sender: envelope.sender,
                    receiver: envelope.receiver,
                    capacity,
                });
            }
        }
        self.queue.push_back(envelope);
        Ok(())
    }

    /// Removes and returns the oldest pending message, if any.
    pub fn receive(&mut self) -> Option<Envelope> {
        self.queue.pop_front()
    }

    /// The oldest pending message without removing it.
    pub fn peek(&self) -> Option<&Envelope> {
        self.queue.front()
    }

    pub fn has_message(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
