//! AI response gateway trait and the offline gateway.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::prompt::split_image_payload;

/// Turns a prompt into generated text.
///
/// Prompts may carry an inline image as `[IMAGE]\n<base64>`; implementations
/// that cannot see images should still answer from the text part.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseGateway: Send + Sync {
    /// Short name for logs, e.g. `openai/gpt-4o`.
    fn label(&self) -> String;

    /// Generate a reply for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError>;
}

const OFFLINE_REPLIES: &[&str] = &[
    "Woof woof! *wags tail* I'm so happy you're talking to me!",
    "Arf! Did somebody say treats? I heard treats. I definitely heard treats.",
    "*tilts head* Hmm? Say that again, but maybe while holding a ball?",
    "Bark! Can we go outside now? Please? Pleeeease?",
    "*rolls over for belly rubs* This is my answer to everything.",
];

const OFFLINE_PHOTO_REPLIES: &[&str] = &[
    "*sniffs the photo* That's me! Look how shiny my coat is. I was SO happy that day!",
    "Woof! I remember this! My ears are up because I heard the treat bag.",
    "*proud tail wag* I look very serious here, but I was really just waiting for you.",
];

/// Canned replies for when no LLM is configured.
///
/// The reply is picked from the prompt bytes, so the same prompt always gets
/// the same answer.
#[derive(Debug, Clone, Default)]
pub struct OfflineGateway;

impl OfflineGateway {
    pub fn new() -> Self {
        Self
    }

    fn pick(options: &[&'static str], text: &str) -> &'static str {
        let sum = text.bytes().fold(0usize, |acc, b| acc.wrapping_add(b as usize));
        options[sum % options.len()]
    }
}

#[async_trait]
impl ResponseGateway for OfflineGateway {
    fn label(&self) -> String {
        "offline".to_string()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let reply = match split_image_payload(prompt) {
            (text, Some(_)) => Self::pick(OFFLINE_PHOTO_REPLIES, text),
            (text, None) => Self::pick(OFFLINE_REPLIES, text),
        };
        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_is_deterministic() {
        let gateway = OfflineGateway::new();
        let a = gateway.generate("You are a dog named Rex.").await.unwrap();
        let b = gateway.generate("You are a dog named Rex.").await.unwrap();
        assert_eq!(a, b);
        assert!(OFFLINE_REPLIES.contains(&a.as_str()));
    }

    #[tokio::test]
    async fn test_offline_photo_reply() {
        let gateway = OfflineGateway::new();
        let reply = gateway.generate("Analyze this.\n\n[IMAGE]\naGk=").await.unwrap();
        assert!(OFFLINE_PHOTO_REPLIES.contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn test_offline_marker_in_text_gets_text_reply() {
        let gateway = OfflineGateway::new();
        let reply = gateway
            .generate("Respond to your owner: \"look\n[IMAGE]\nZm9v\"")
            .await
            .unwrap();
        assert!(OFFLINE_REPLIES.contains(&reply.as_str()));
    }
}
