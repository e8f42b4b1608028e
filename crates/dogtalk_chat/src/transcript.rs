//! Append-only message log.

use chrono::Utc;
use tokio::sync::broadcast;

use crate::types::{Message, MessageId, MessageKind, Sender};

/// Buffered tail notifications per subscriber before it starts lagging.
const TAIL_CAPACITY: usize = 64;

/// Ordered, append-only history of one chat session.
///
/// Messages are never edited or removed. Every append is published to
/// subscribers so renderers only need to draw the new tail.
#[derive(Debug)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
    tail: broadcast::Sender<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        let (tail, _) = broadcast::channel(TAIL_CAPACITY);
        Self {
            messages: Vec::new(),
            next_id: 1,
            tail,
        }
    }

    /// Append a message and notify subscribers. Returns the stored message.
    pub fn push(
        &mut self,
        sender: Sender,
        kind: MessageKind,
        text: impl Into<String>,
        image: Option<String>,
    ) -> Message {
        let message = Message {
            id: MessageId(self.next_id),
            text: text.into(),
            sender,
            image,
            kind,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.messages.push(message.clone());

        // No subscribers is fine
        let _ = self.tail.send(message.clone());
        message
    }

    /// Subscribe to messages appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tail.subscribe()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages appended after `id`, for renderers catching up.
    pub fn since(&self, id: MessageId) -> &[Message] {
        let start = self.messages.partition_point(|m| m.id <= id);
        &self.messages[start..]
    }
}
