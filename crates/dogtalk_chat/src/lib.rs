//! # dogtalk_chat - Dog Persona Chat
//!
//! This crate provides the conversation core behind dogtalk:
//! - A transcript of user and dog messages, append-only
//! - Turn-taking: at most one AI exchange in flight per conversation
//! - Prompt templates that make the model role-play as a registered dog
//! - Photo turns that ask the model to read the dog's mood from an image
//!
//! ## Key Features
//!
//! - **Single-flight gate**: input is rejected while a reply is pending
//! - **Failure recovery**: gateway errors become a visible notice, not a stuck chat
//! - **LLM Optional**: works against OpenAI, Anthropic, or an offline gateway
//! - **Observers**: new messages and state changes are published on channels
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────────┐    ┌──────────────────┐
//! │  DogProfile  │───▶│ ConversationController │───▶│ ResponseGateway  │
//! └──────────────┘    └───────────┬────────────┘    └────────┬─────────┘
//!                                 │                          │
//!                                 ▼                ┌─────────┼─────────┐
//!                         ┌──────────────┐         ▼         ▼         ▼
//!                         │  Transcript  │    LlmAdapter  Offline  Scripted
//!                         │  + observers │
//!                         └──────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod image;
pub mod llm;
pub mod mock;
pub mod prompt;
pub mod transcript;
pub mod types;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use gateway::*;
pub use image::*;
pub use llm::*;
pub use mock::*;
pub use prompt::*;
pub use transcript::*;
pub use types::*;
