//! Core types for the dog chat.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session id (UUID v4), used to correlate logs
pub type SessionId = String;

/// Message identifier, strictly increasing in transcript order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a message is from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Dog,
}

/// What a message carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Regular chat text
    #[default]
    Text,
    /// A notice that a reply could not be produced
    Error,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Assigned by the transcript on append
    pub id: MessageId,
    /// Message content
    pub text: String,
    pub sender: Sender,
    /// Display reference of an attached image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub kind: MessageKind,
    /// When the message was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

/// Turn-taking state of a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TurnState {
    /// Accepting text or photos
    #[default]
    Idle,
    /// One gateway request is outstanding; input is rejected
    AwaitingResponse,
}

impl TurnState {
    pub fn accepts_input(&self) -> bool {
        *self == Self::Idle
    }
}

/// Why an input was turned away without touching the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Text was empty or whitespace only
    EmptyInput,
    /// Another exchange is still in flight
    Busy,
    /// The picked image had no encoded pixel data
    NoImageData,
    /// The greeting turn already ran
    AlreadyInitialized,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmptyInput => "message is empty",
            Self::Busy => "still waiting for a reply",
            Self::NoImageData => "image has no data",
            Self::AlreadyInitialized => "conversation already started",
        };
        f.write_str(text)
    }
}

/// Result of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The dog replied
    Replied(Message),
    /// The gateway failed; a notice was appended instead of a reply
    Failed { notice: Message, error: String },
    /// Input refused, transcript unchanged
    Rejected(Rejection),
}

impl TurnOutcome {
    /// The message appended on the dog's side, if any.
    pub fn reply(&self) -> Option<&Message> {
        match self {
            Self::Replied(message) => Some(message),
            Self::Failed { notice, .. } => Some(notice),
            Self::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
