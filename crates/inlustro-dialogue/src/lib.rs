//! Rule-based dialogue engine for the Inlustro assistant.
//!
//! Maps a free-text utterance plus conversation memory to a canned
//! response, an optional follow-up, and an optional navigation target.
//! Intents are matched by lowercase substring containment against one
//! ordered table; the first matching rule wins.

pub mod engine;
pub mod intents;
pub mod memory;

pub use engine::{respond, Dialogue, Reply};
pub use intents::{classify, IntentKind, IntentRule, INTENTS};
pub use memory::ConversationMemory;
