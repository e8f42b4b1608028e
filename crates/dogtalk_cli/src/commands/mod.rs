//! CLI command definitions.
//!
//! Each subcommand maps to one screen of the app: registration, the profile
//! list, and the chat.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod chat;
pub mod profiles;
pub mod register;

/// dogtalk - chat with your dog
#[derive(Parser)]
#[command(name = "dogtalk")]
#[command(version, about = "dogtalk - chat with your dog")]
#[command(long_about = r#"
dogtalk lets you register your dog and then chat with it. Replies come from
an LLM that role-plays your dog using its breed, age and personality.

WORKFLOWS:
  register  → Register a dog (basic info, 3+ photos, details)
  profiles  → List registered dogs
  chat      → Chat with a registered dog (/photo PATH, /quit)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or unknown profile
  3 - Validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace directory holding `.dogtalk/` (defaults to current directory)
    #[arg(long, global = true, env = "DOGTALK_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new dog
    Register(register::RegisterArgs),

    /// List registered dogs
    Profiles(profiles::ProfilesArgs),

    /// Chat with a registered dog
    Chat(chat::ChatArgs),
}
