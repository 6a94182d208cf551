//! Dialogue dispatch: memory update followed by a single pass over the
//! intent table.

use serde::{Deserialize, Serialize};

use inlustro_core::{Personality, Route};

use crate::intents::{self, IntentKind};
use crate::memory::ConversationMemory;

/// What the assistant says in answer to one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub response: String,
    /// Second message queued after the primary response.
    pub follow_up: Option<String>,
    /// Page to open once the response has been delivered.
    pub navigate: Option<Route>,
}

impl Reply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            follow_up: None,
            navigate: None,
        }
    }

    pub fn follow_up(mut self, text: impl Into<String>) -> Self {
        self.follow_up = Some(text.into());
        self
    }

    pub fn navigate(mut self, route: Route) -> Self {
        self.navigate = Some(route);
        self
    }
}

/// Produce the reply to `input`.
///
/// `memory` is updated from the utterance before any rule is evaluated, so
/// "hi, my name is Sam" is already greeted by name. A personality-switch
/// rule updates `personality`. Never fails: unmatched input falls through
/// to the personality-specific fallback.
pub fn respond(
    input: &str,
    memory: &mut ConversationMemory,
    personality: &mut Personality,
) -> Reply {
    memory.observe(input);

    let (kind, reply) = match intents::find_rule(input) {
        Some(rule) => (rule.kind, (rule.handler)(memory, *personality)),
        None => (
            IntentKind::Fallback,
            intents::fallback(memory, *personality),
        ),
    };

    if let IntentKind::SwitchPersonality(next) = kind {
        tracing::info!(from = %personality, to = %next, "Personality switched");
        *personality = next;
    }

    tracing::debug!(intent = ?kind, navigate = ?reply.navigate, "Dialogue reply selected");
    reply
}

/// Dialogue state for one session: memory plus the active personality.
#[derive(Debug, Clone, Default)]
pub struct Dialogue {
    memory: ConversationMemory,
    personality: Personality,
}

impl Dialogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, input: &str) -> Reply {
        respond(input, &mut self.memory, &mut self.personality)
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::{
        CONCISE_FALLBACK, CREATIVE_FALLBACK, GREETING, HELPFUL_FALLBACK, PORTAL_QUESTION,
    };

    #[test]
    fn test_generic_greeting_without_name() {
        for input in ["hello", "Hi there", "hey assistant"] {
            let mut dialogue = Dialogue::new();
            let reply = dialogue.respond(input);
            assert_eq!(reply.response, GREETING);
            assert_eq!(reply.follow_up.as_deref(), Some(PORTAL_QUESTION));
            assert!(reply.navigate.is_none());
        }
    }

    #[test]
    fn test_greeting_uses_remembered_name() {
        let mut memory = ConversationMemory {
            user_name: Some("Alex".to_string()),
            ..ConversationMemory::default()
        };
        let mut personality = Personality::Helpful;
        let reply = respond("hello", &mut memory, &mut personality);
        assert!(reply.response.contains("Alex"));
        assert_eq!(reply.follow_up.as_deref(), Some(PORTAL_QUESTION));
    }

    #[test]
    fn test_greeting_offers_role_portal() {
        let mut dialogue = Dialogue::new();
        dialogue.respond("my name is Dana and I am a student");
        let reply = dialogue.respond("hey");
        assert!(reply.response.starts_with("Hello Dana!"));
        assert_eq!(
            reply.follow_up.as_deref(),
            Some("Would you like to access your student portal?")
        );
    }

    #[test]
    fn test_memory_updated_before_matching() {
        let mut dialogue = Dialogue::new();
        let reply = dialogue.respond("hi, my name is Sam");
        assert!(reply.response.contains("Sam"));
    }

    #[test]
    fn test_navigation_before_greeting() {
        let mut dialogue = Dialogue::new();
        let reply = dialogue.respond("hello, tell me about admin login");
        assert_eq!(reply.response, "Alright, heading to the Admin Login page.");
        assert_eq!(reply.navigate, Some(Route::AdminLogin));
        assert!(reply.follow_up.is_none());
    }

    #[test]
    fn test_concise_switch_changes_fallback() {
        let mut dialogue = Dialogue::new();
        let reply = dialogue.respond("be more concise");
        assert_eq!(reply.response, "Concise mode activated.");
        assert_eq!(dialogue.personality(), Personality::Concise);

        let reply = dialogue.respond("xyz123");
        assert_eq!(reply.response, CONCISE_FALLBACK);
        assert!(reply.follow_up.is_none());
    }

    #[test]
    fn test_creative_fallback() {
        let mut dialogue = Dialogue::new();
        dialogue.respond("creative mode");
        let reply = dialogue.respond("xyz123");
        assert_eq!(reply.response, CREATIVE_FALLBACK);
        assert!(reply.follow_up.is_some());
    }

    #[test]
    fn test_helpful_fallback_personalised() {
        let mut dialogue = Dialogue::new();
        let reply = dialogue.respond("my name is Sam");
        assert_eq!(reply.response, HELPFUL_FALLBACK);
        assert!(reply.follow_up.unwrap().contains("Sam"));
    }

    #[test]
    fn test_switch_back_to_helpful() {
        let mut dialogue = Dialogue::new();
        dialogue.respond("be more concise");
        dialogue.respond("be more helpful");
        assert_eq!(dialogue.personality(), Personality::Helpful);
        assert_eq!(dialogue.respond("xyz123").response, HELPFUL_FALLBACK);
    }

    #[test]
    fn test_name_introduction_twice_is_stable() {
        let mut dialogue = Dialogue::new();
        dialogue.respond("my name is Sam");
        dialogue.respond("my name is Sam");
        assert_eq!(dialogue.memory().user_name.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_deterministic_for_same_state() {
        let memory = ConversationMemory {
            user_name: Some("Kai".to_string()),
            interests: vec!["history".to_string()],
            ..ConversationMemory::default()
        };
        let inputs = ["tell me about courses", "xyz123", "hello", "pricing?"];
        for input in inputs {
            let mut m1 = memory.clone();
            let mut m2 = memory.clone();
            let mut p1 = Personality::Creative;
            let mut p2 = Personality::Creative;
            assert_eq!(
                respond(input, &mut m1, &mut p1),
                respond(input, &mut m2, &mut p2)
            );
        }
    }

    #[test]
    fn test_courses_use_interest_from_same_utterance() {
        let mut dialogue = Dialogue::new();
        let reply = dialogue.respond("any chemistry course?");
        assert_eq!(
            reply.follow_up.as_deref(),
            Some("Would you like me to show you our top-rated chemistry courses?")
        );
    }

    #[test]
    fn test_voice_control_is_informational() {
        let mut dialogue = Dialogue::new();
        let reply = dialogue.respond("stop listening");
        assert!(reply.response.starts_with("I'll stop speaking now."));
        assert!(reply.navigate.is_none());
    }
}
