//! Conversational engine for Flight Friend.
//!
//! This crate turns free-text user messages into structured flight-search
//! commands and templated replies. The pipeline is: intent classification
//! (`intent`) consults the dialogue state, city/date slots are filled by
//! `extract` and `dates`, the command synthesizer (`command`) emits a
//! `BotReply` carrying both display text and an optional structured search,
//! and `templates` renders result sets back into text. `engine` ties the
//! pieces together for one conversation.

pub mod command;
pub mod dates;
pub mod engine;
pub mod extract;
pub mod intent;
pub mod templates;

pub use command::BotReply;
pub use engine::ChatbotEngine;
pub use intent::Intent;
