//! Conversation controller.
//!
//! Owns the transcript and the turn-taking state of one chat session and
//! mediates exactly one gateway exchange at a time.
//!
//! ```text
//!            initialize / send_text / send_photo
//!   ┌──────┐ ───────────────────────────────────▶ ┌──────────────────┐
//!   │ Idle │                                      │ AwaitingResponse │
//!   └──────┘ ◀─────────────────────────────────── └──────────────────┘
//!                 reply appended / error notice
//! ```
//!
//! The gate is checked and flipped under a short lock that is never held
//! across the gateway call, so a shared controller turns away concurrent
//! input with [`Rejection::Busy`] instead of queueing it.

use std::sync::Arc;

use dogtalk_profile::DogProfile;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::gateway::ResponseGateway;
use crate::image::ImageAttachment;
use crate::prompt::{build_prompt, PromptContext};
use crate::transcript::Transcript;
use crate::types::{Message, MessageKind, Rejection, Sender, SessionId, TurnOutcome, TurnState};

/// Text of the user message that carries a photo.
pub const PHOTO_CAPTION: &str = "Here's a photo of you!";

/// Shown in place of a reply when the gateway fails.
pub const GATEWAY_FAILURE_NOTICE: &str = "Woof... I couldn't fetch a reply right now. Please try again.";

struct Inner {
    transcript: Transcript,
    state: TurnState,
    /// Set once a greeting reply has been appended
    greeted: bool,
}

enum Turn<'a> {
    Greeting,
    User { text: &'a str, image: Option<String> },
}

/// A turn holding the gate open.
///
/// If the turn's future is dropped before the reply lands (timeout,
/// `select!`, aborted task), dropping this closes the turn with the failure
/// notice and returns the controller to Idle.
struct PendingTurn<'a> {
    controller: &'a ConversationController,
    greeting: bool,
    armed: bool,
}

impl PendingTurn<'_> {
    fn finish(mut self, result: Result<String, GatewayError>) -> TurnOutcome {
        self.armed = false;
        let controller = self.controller;
        let mut inner = controller.inner.lock();

        match result {
            Ok(text) => {
                if self.greeting {
                    inner.greeted = true;
                }
                let reply = inner
                    .transcript
                    .push(Sender::Dog, MessageKind::Text, text, None);
                controller.set_state(&mut inner, TurnState::Idle);
                info!(session = %controller.session_id, message = %reply.id, "Reply appended");
                TurnOutcome::Replied(reply)
            }
            Err(e) => {
                warn!(session = %controller.session_id, "Gateway failed: {}", e);
                let notice = controller.fail_turn(&mut inner);
                TurnOutcome::Failed {
                    notice,
                    error: e.to_string(),
                }
            }
        }
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let controller = self.controller;
        warn!(session = %controller.session_id, "Turn dropped before the reply arrived");
        let mut inner = controller.inner.lock();
        controller.fail_turn(&mut inner);
    }
}

/// Chat screen logic for one dog persona.
pub struct ConversationController {
    session_id: SessionId,
    profile: DogProfile,
    gateway: Arc<dyn ResponseGateway>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<TurnState>,
}

impl ConversationController {
    /// Create a controller for a finished profile. Call
    /// [`initialize`](Self::initialize) to get the opening line.
    pub fn new(profile: DogProfile, gateway: Arc<dyn ResponseGateway>) -> Self {
        let (state_tx, _) = watch::channel(TurnState::Idle);
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            profile,
            gateway,
            inner: Mutex::new(Inner {
                transcript: Transcript::new(),
                state: TurnState::Idle,
                greeted: false,
            }),
            state_tx,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn profile(&self) -> &DogProfile {
        &self.profile
    }

    /// Current turn state.
    pub fn state(&self) -> TurnState {
        self.inner.lock().state
    }

    /// Follow state changes (e.g. to disable input while a reply is pending).
    pub fn watch_state(&self) -> watch::Receiver<TurnState> {
        self.state_tx.subscribe()
    }

    /// Follow messages appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.inner.lock().transcript.subscribe()
    }

    /// Copy of the transcript in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().transcript.messages().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().transcript.is_empty()
    }

    /// Run the greeting exchange that opens the chat.
    ///
    /// Runs once per session; a greeting that failed or was dropped can be
    /// retried.
    pub async fn initialize(&self) -> TurnOutcome {
        let pending = match self.begin_turn(Turn::Greeting) {
            Ok(pending) => pending,
            Err(rejection) => return TurnOutcome::Rejected(rejection),
        };

        info!(session = %self.session_id, dog = %self.profile.name, gateway = %self.gateway.label(), "Starting chat");
        let prompt = build_prompt(&self.profile, PromptContext::Greeting);
        self.exchange(pending, &prompt).await
    }

    /// Send a text message from the owner.
    ///
    /// Whitespace-only input is rejected; otherwise the raw input is both
    /// shown and quoted in the prompt.
    pub async fn send_text(&self, input: &str) -> TurnOutcome {
        if input.trim().is_empty() {
            return TurnOutcome::Rejected(Rejection::EmptyInput);
        }

        let pending = match self.begin_turn(Turn::User {
            text: input,
            image: None,
        }) {
            Ok(pending) => pending,
            Err(rejection) => return TurnOutcome::Rejected(rejection),
        };

        let prompt = build_prompt(&self.profile, PromptContext::Reply(input));
        self.exchange(pending, &prompt).await
    }

    /// Send a photo for the persona to react to.
    ///
    /// An image without pixel data is a no-op.
    pub async fn send_photo(&self, image: &ImageAttachment) -> TurnOutcome {
        let Some(data) = image.data() else {
            let rejection = if self.state().accepts_input() {
                Rejection::NoImageData
            } else {
                Rejection::Busy
            };
            return TurnOutcome::Rejected(rejection);
        };

        let pending = match self.begin_turn(Turn::User {
            text: PHOTO_CAPTION,
            image: Some(image.reference.clone()),
        }) {
            Ok(pending) => pending,
            Err(rejection) => return TurnOutcome::Rejected(rejection),
        };

        let prompt = build_prompt(&self.profile, PromptContext::Photo(data));
        self.exchange(pending, &prompt).await
    }

    // Check the gate, append the user's message and flip to AwaitingResponse
    // as one step.
    fn begin_turn(&self, turn: Turn<'_>) -> Result<PendingTurn<'_>, Rejection> {
        let mut inner = self.inner.lock();

        if inner.state != TurnState::Idle {
            debug!(session = %self.session_id, "Input rejected, reply pending");
            return Err(Rejection::Busy);
        }

        let greeting = match turn {
            Turn::Greeting if inner.greeted => return Err(Rejection::AlreadyInitialized),
            Turn::Greeting => true,
            Turn::User { text, image } => {
                inner
                    .transcript
                    .push(Sender::User, MessageKind::Text, text, image);
                false
            }
        };
        self.set_state(&mut inner, TurnState::AwaitingResponse);

        Ok(PendingTurn {
            controller: self,
            greeting,
            armed: true,
        })
    }

    async fn exchange(&self, pending: PendingTurn<'_>, prompt: &str) -> TurnOutcome {
        debug!(session = %self.session_id, prompt_chars = prompt.len(), "Calling gateway");
        let result = self.gateway.generate(prompt).await;
        pending.finish(result)
    }

    // Append the failure notice and reopen the gate.
    fn fail_turn(&self, inner: &mut Inner) -> Message {
        let notice = inner.transcript.push(
            Sender::Dog,
            MessageKind::Error,
            GATEWAY_FAILURE_NOTICE,
            None,
        );
        self.set_state(inner, TurnState::Idle);
        notice
    }

    fn set_state(&self, inner: &mut Inner, state: TurnState) {
        inner.state = state;
        self.state_tx.send_replace(state);
    }
}

impl std::fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController")
            .field("session_id", &self.session_id)
            .field("dog", &self.profile.name)
            .field("gateway", &self.gateway.label())
            .finish()
    }
}
