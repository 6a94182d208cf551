//! Conversation memory: facts inferred from user utterances.
//!
//! Memory only grows. A later utterance may overwrite the remembered name
//! or role, but nothing is ever cleared for the lifetime of the session.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use inlustro_core::UserRole;

/// Subjects recognised as user interests, in reporting order.
pub const INTEREST_KEYWORDS: &[&str] = &[
    "math",
    "science",
    "history",
    "english",
    "language",
    "programming",
    "coding",
    "computer",
    "physics",
    "chemistry",
    "biology",
    "literature",
    "art",
    "music",
];

/// Facts remembered about the user for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    pub user_name: Option<String>,
    pub user_role: Option<UserRole>,
    /// Distinct interests in first-mentioned order.
    pub interests: Vec<String>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan an utterance for name, role and interest mentions.
    pub fn observe(&mut self, input: &str) {
        let lower = input.to_lowercase();

        if lower.contains("my name is") || lower.contains("i am ") {
            if let Some(name) = extract_name(input) {
                tracing::debug!(name = %name, "Remembered user name");
                self.user_name = Some(name);
            }
        }

        if let Some(role) = detect_role(&lower) {
            self.user_role = Some(role);
        }

        for interest in INTEREST_KEYWORDS {
            if lower.contains(interest) && !self.interests.iter().any(|i| i == interest) {
                self.interests.push((*interest).to_string());
            }
        }
    }
}

/// Extract a self-introduced name.
///
/// "my name is X" accepts any alphabetic token and capitalises it.
/// "i am X" only accepts a token that is already capitalised, so
/// "i am a student" does not produce a name.
fn extract_name(input: &str) -> Option<String> {
    static MY_NAME_IS: OnceLock<Regex> = OnceLock::new();
    static I_AM: OnceLock<Regex> = OnceLock::new();

    let my_name_is = MY_NAME_IS.get_or_init(|| {
        Regex::new(r"(?i)\bmy name is\s+([a-z]+)").expect("Invalid name regex")
    });
    if let Some(caps) = my_name_is.captures(input) {
        return caps.get(1).map(|m| capitalize(m.as_str()));
    }

    let i_am = I_AM.get_or_init(|| {
        Regex::new(r"(?i:\bi am)\s+([A-Z][A-Za-z]*)").expect("Invalid introduction regex")
    });
    i_am.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Role keywords count only when the utterance is not about logging in.
fn detect_role(lower: &str) -> Option<UserRole> {
    if lower.contains("login") {
        return None;
    }
    if lower.contains("student") {
        Some(UserRole::Student)
    } else if lower.contains("tutor") {
        Some(UserRole::Tutor)
    } else if lower.contains("admin") {
        Some(UserRole::Admin)
    } else {
        None
    }
}
