//! Scripted response gateway for testing.
//!
//! Returns queued replies in order and captures every prompt it receives,
//! so tests can drive a conversation without a network. It can also hold
//! replies back until released, which keeps an exchange in flight.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;

use crate::error::GatewayError;
use crate::gateway::ResponseGateway;

/// Reply used when the script runs out.
pub const DEFAULT_SCRIPTED_REPLY: &str = "Woof!";

/// Mock gateway for testing.
#[derive(Clone)]
pub struct ScriptedGateway {
    /// Predefined replies, consumed front to back.
    responses: Arc<Mutex<VecDeque<Result<String, GatewayError>>>>,
    /// Captured prompts for verification.
    prompts: Arc<RwLock<Vec<String>>>,
    /// When set, each call waits for a permit from `release`.
    held: Arc<RwLock<bool>>,
    gate: Arc<Semaphore>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(RwLock::new(Vec::new())),
            held: Arc::new(RwLock::new(false)),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.responses.lock().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: GatewayError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Queue several replies.
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut responses = self.responses.lock();
            responses.extend(replies.into_iter().map(|r| Ok(r.into())));
        }
        self
    }

    /// Make calls wait until [`release`](Self::release) is called.
    pub fn hold(&self) {
        *self.held.write() = true;
    }

    /// Let `n` held calls complete.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// All prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.read().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.read().last().cloned()
    }
}

#[async_trait]
impl ResponseGateway for ScriptedGateway {
    fn label(&self) -> String {
        "scripted".to_string()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.write().push(prompt.to_string());

        let held = *self.held.read();
        if held {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
            permit.forget();
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_SCRIPTED_REPLY.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_replies_in_order() {
        let gateway = ScriptedGateway::new()
            .reply("one")
            .fail(GatewayError::Network("down".into()))
            .reply("three");

        assert_eq!(gateway.generate("a").await.unwrap(), "one");
        assert!(gateway.generate("b").await.is_err());
        assert_eq!(gateway.generate("c").await.unwrap(), "three");
        assert_eq!(gateway.generate("d").await.unwrap(), DEFAULT_SCRIPTED_REPLY);
        assert_eq!(gateway.prompts(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_hold_and_release() {
        let gateway = ScriptedGateway::new().reply("late");
        gateway.hold();

        let task = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.generate("wait").await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        assert_eq!(gateway.call_count(), 1);

        gateway.release(1);
        assert_eq!(task.await.unwrap().unwrap(), "late");
    }
}
