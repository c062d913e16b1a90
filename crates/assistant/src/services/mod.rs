//! Business logic services.
//!
//! # Services
//!
//! - `chat` - one chat turn: resolve, dispatch, record

pub mod chat;

pub use chat::{ChatError, ChatService, ChatStreamEvent, TurnOutcome};
