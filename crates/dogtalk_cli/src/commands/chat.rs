//! Chat command - Line-based chat with a registered dog.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use dogtalk_chat::{
    ChatError, ConversationController, ImagePicker, LlmAdapter, Message, OfflineGateway,
    Rejection, ResponseGateway, Sender, TurnOutcome,
};
use dogtalk_profile::{DogProfile, FileProfileStore, ProfileStore};

#[derive(Args)]
pub struct ChatArgs {
    /// Name of the registered dog
    #[arg(short, long)]
    profile: String,

    /// Use canned replies instead of an LLM
    #[arg(long)]
    offline: bool,
}

pub async fn execute(args: ChatArgs, root: &Path) -> Result<()> {
    let store = FileProfileStore::new(root);
    let profile = store
        .get_required(&args.profile)
        .with_context(|| format!("Failed to load profile {:?}", args.profile))?;

    run_session(profile, root, args.offline).await
}

/// Chat on stdin/stdout until `/quit` or end of input.
pub async fn run_session(profile: DogProfile, root: &Path, offline: bool) -> Result<()> {
    let gateway = select_gateway(root, offline)?;
    let controller = ConversationController::new(profile, gateway);
    info!(session = %controller.session_id(), "Chat session opened");

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    converse(&controller, input, &mut out).await
}

fn select_gateway(root: &Path, offline: bool) -> Result<Arc<dyn ResponseGateway>> {
    if offline {
        return Ok(Arc::new(OfflineGateway::new()));
    }

    match LlmAdapter::from_workspace(root) {
        Ok(adapter) => {
            info!("Using {}", adapter.label());
            Ok(Arc::new(adapter))
        }
        Err(ChatError::LlmNotConfigured) => {
            warn!("No LLM configured, falling back to offline replies");
            println!("ℹ️  No OPENAI_API_KEY or ANTHROPIC_API_KEY set, using offline replies.");
            Ok(Arc::new(OfflineGateway::new()))
        }
        Err(e) => Err(e).context("Failed to configure the LLM"),
    }
}

/// A line typed at the chat prompt
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Photo(&'a str),
    Text(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let command = line.trim();
        if command == "/quit" || command == "/exit" {
            Self::Quit
        } else if let Some(path) = command.strip_prefix("/photo") {
            Self::Photo(path.trim())
        } else {
            Self::Text(line)
        }
    }
}

async fn converse<R, W>(controller: &ConversationController, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let name = controller.profile().name.clone();
    let mut tail = controller.subscribe();
    let picker = ImagePicker::new();

    writeln!(
        out,
        "💬 Chatting with {}. Share a photo with /photo PATH, leave with /quit.",
        name
    )?;
    controller.initialize().await;
    print_new(&mut tail, &name, out)?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match Input::parse(&line) {
            Input::Quit => break,
            Input::Photo("") => {
                writeln!(out, "Usage: /photo PATH")?;
                continue;
            }
            Input::Photo(path) => match picker.pick(path) {
                Ok(image) => controller.send_photo(&image).await,
                Err(e) => {
                    writeln!(out, "⚠️  {}", e)?;
                    continue;
                }
            },
            Input::Text(text) => controller.send_text(text).await,
        };

        print_new(&mut tail, &name, out)?;
        match outcome {
            TurnOutcome::Rejected(Rejection::EmptyInput) => {}
            TurnOutcome::Rejected(reason) => writeln!(out, "(not sent: {})", reason)?,
            TurnOutcome::Failed { error, .. } => warn!("Reply failed: {}", error),
            TurnOutcome::Replied(_) => {}
        }
    }

    writeln!(out, "👋 Bye from {}!", name)?;
    Ok(())
}

/// Print every message appended since the last call.
fn print_new<W: Write>(
    tail: &mut broadcast::Receiver<Message>,
    dog: &str,
    out: &mut W,
) -> Result<()> {
    loop {
        match tail.try_recv() {
            Ok(message) => writeln!(out, "{}", render(&message, dog))?,
            Err(TryRecvError::Lagged(skipped)) => warn!("Skipped {} messages", skipped),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
        }
    }
}

fn render(message: &Message, dog: &str) -> String {
    match message.sender {
        Sender::User => match &message.image {
            Some(image) => format!("You: {} [photo: {}]", message.text, image),
            None => format!("You: {}", message.text),
        },
        Sender::Dog if message.is_error() => format!("⚠️  {}", message.text),
        Sender::Dog => format!("🐶 {}: {}", dog, message.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dogtalk_chat::ScriptedGateway;
    use tempfile::tempdir;

    fn rex_chat(gateway: &ScriptedGateway) -> ConversationController {
        let mut profile = DogProfile::new("Rex", "Labrador");
        profile.age = "3".to_string();
        ConversationController::new(profile, Arc::new(gateway.clone()))
    }

    async fn run(controller: &ConversationController, script: &str) -> String {
        let mut out = Vec::new();
        converse(controller, BufReader::new(script.as_bytes()), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(Input::parse(" /quit "), Input::Quit);
        assert_eq!(Input::parse("/photo  rex.jpg"), Input::Photo("rex.jpg"));
        assert_eq!(Input::parse("  hi  "), Input::Text("  hi  "));
    }

    #[tokio::test]
    async fn test_text_session() {
        let gateway = ScriptedGateway::new().with_replies(["Woof! I'm Rex!", "Always hungry!"]);
        let controller = rex_chat(&gateway);

        let output = run(&controller, "Are you hungry?\n   \n/quit\nnot sent\n").await;

        assert!(output.contains("🐶 Rex: Woof! I'm Rex!"));
        assert!(output.contains("You: Are you hungry?"));
        assert!(output.contains("🐶 Rex: Always hungry!"));
        assert!(output.contains("👋 Bye from Rex!"));
        assert_eq!(gateway.call_count(), 2);
        assert_eq!(controller.len(), 3);
    }

    #[tokio::test]
    async fn test_photo_commands() {
        let temp = tempdir().unwrap();
        let photo = temp.path().join("beach.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();

        let gateway = ScriptedGateway::new().with_replies(["hi", "That's me!"]);
        let controller = rex_chat(&gateway);
        let script = format!("/photo\n/photo {}\n/photo {}\n", temp.path().join("gone.jpg").display(), photo.display());

        let output = run(&controller, &script).await;

        assert!(output.contains("Usage: /photo PATH"));
        assert!(output.contains("Image error"));
        assert!(output.contains("You: Here's a photo of you! [photo: "));
        assert!(output.contains("🐶 Rex: That's me!"));
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_shown() {
        let gateway = ScriptedGateway::new()
            .reply("hi")
            .fail(dogtalk_chat::GatewayError::Network("offline".into()));
        let controller = rex_chat(&gateway);

        let output = run(&controller, "hello\n").await;
        assert!(output.contains("⚠️  Woof... I couldn't fetch a reply right now. Please try again."));
    }

    #[test]
    fn test_offline_flag_skips_llm() {
        let temp = tempdir().unwrap();
        let gateway = select_gateway(temp.path(), true).unwrap();
        assert_eq!(gateway.label(), "offline");
    }
}
