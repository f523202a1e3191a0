//! Persistence layer for Flight Friend.
//!
//! Chat history lives in an append-only record store keyed by user and
//! conversation. The repository trait has two implementations: an
//! in-memory store for offline runs and tests, and a Supabase REST client
//! for hosted deployments. Persistence failures never block the
//! conversation; callers log and continue with an empty history.

pub mod conversation;
pub mod history;
pub mod supabase;

pub use conversation::ConversationService;
pub use history::{ChatHistoryRepository, ConversationSummary, InMemoryHistoryRepository};
pub use supabase::SupabaseHistoryRepository;
