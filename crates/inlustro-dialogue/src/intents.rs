//! The ordered intent table.
//!
//! Rules are evaluated top to bottom against the lowercased utterance and
//! the first match wins. Order matters: navigation rules sit above
//! greetings so "hello, admin login" navigates, and the help rule excludes
//! "helpful" so the helpful-mode switch further down stays reachable.

use inlustro_core::{Personality, Route};

use crate::engine::Reply;
use crate::memory::ConversationMemory;

/// Which rule produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Navigate(Route),
    Greeting,
    HowAreYou,
    Identity,
    Help,
    StopListening,
    StartListening,
    Pricing,
    About,
    Courses,
    Tutors,
    Registration,
    SwitchPersonality(Personality),
    Fallback,
}

/// Read-only view of the conversation state handed to every handler.
pub type Handler = fn(&ConversationMemory, Personality) -> Reply;

/// One entry of the intent table.
pub struct IntentRule {
    pub kind: IntentKind,
    /// The rule matches when the input contains any of these phrases...
    pub any_of: &'static [&'static str],
    /// ...and none of these.
    pub none_of: &'static [&'static str],
    pub handler: Handler,
}

impl IntentRule {
    pub fn matches(&self, lower: &str) -> bool {
        self.any_of.iter().any(|p| lower.contains(p))
            && !self.none_of.iter().any(|p| lower.contains(p))
    }
}

/// All intents in evaluation order. The fallback is not part of the table.
pub static INTENTS: &[IntentRule] = &[
    // Navigation
    IntentRule {
        kind: IntentKind::Navigate(Route::StudentLogin),
        any_of: &["student login", "go to student portal"],
        none_of: &[],
        handler: |_, _| {
            Reply::new("Okay, taking you to the Student Login page.").navigate(Route::StudentLogin)
        },
    },
    IntentRule {
        kind: IntentKind::Navigate(Route::TutorLogin),
        any_of: &["tutor login", "go to tutor portal"],
        none_of: &[],
        handler: |_, _| {
            Reply::new("Sure, navigating to the Tutor Login page.").navigate(Route::TutorLogin)
        },
    },
    IntentRule {
        kind: IntentKind::Navigate(Route::AdminLogin),
        any_of: &["admin login", "go to admin portal"],
        none_of: &[],
        handler: |_, _| {
            Reply::new("Alright, heading to the Admin Login page.").navigate(Route::AdminLogin)
        },
    },
    IntentRule {
        kind: IntentKind::Navigate(Route::Home),
        any_of: &["home page", "go to home"],
        none_of: &[],
        handler: |_, _| Reply::new("Taking you to the home page!").navigate(Route::Home),
    },
    // Greetings
    IntentRule {
        kind: IntentKind::Greeting,
        any_of: &["hello", "hi", "hey"],
        none_of: &[],
        handler: greeting,
    },
    // Questions about the assistant
    IntentRule {
        kind: IntentKind::HowAreYou,
        any_of: &["how are you"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "I'm doing great, thanks for asking! I'm here to help you navigate our platform.",
            )
            .follow_up("Is there something specific you'd like to know about our services?")
        },
    },
    IntentRule {
        kind: IntentKind::Identity,
        any_of: &["your name", "who are you"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "I'm the Inlustro AI Assistant, designed to help you navigate our platform and answer your questions.",
            )
            .follow_up("Would you like to know more about what I can do?")
        },
    },
    // Help
    IntentRule {
        kind: IntentKind::Help,
        any_of: &["help", "what can you do"],
        none_of: &["helpful"],
        handler: |_, _| {
            Reply::new(
                "I can help you with a variety of tasks! Here are some things I can assist with:",
            )
            .follow_up(
                "• Navigate to different parts of the site (student login, tutor login, admin login, home page)\n• Answer questions about our services\n• Provide information about courses and tutoring\n• Explain how our platform works\n\nWhat would you like to know more about?",
            )
        },
    },
    // Voice control. The session owns the microphone; these only acknowledge.
    IntentRule {
        kind: IntentKind::StopListening,
        any_of: &["stop listening", "stop voice", "stop speaking"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "I'll stop speaking now. You can activate me again by clicking the AI button.",
            )
        },
    },
    IntentRule {
        kind: IntentKind::StartListening,
        any_of: &["start listening", "start voice"],
        none_of: &[],
        handler: |_, _| Reply::new("I'm ready to help you. What would you like to know?"),
    },
    // Domain topics
    IntentRule {
        kind: IntentKind::Pricing,
        any_of: &["price", "cost", "fee"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "Our pricing varies depending on the course, tutor, and session duration. We offer flexible packages to suit different needs and budgets. Many tutors also offer a free initial consultation to discuss your learning goals.",
            )
            .follow_up(
                "Would you like more information about our pricing structure or payment options?",
            )
        },
    },
    IntentRule {
        kind: IntentKind::About,
        any_of: &["about", "what is", "inlustro"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "Inlustro is an innovative educational platform connecting students with qualified tutors. Our mission is to make quality education accessible to everyone through personalized learning experiences.",
            )
            .follow_up("Would you like to know more about our services or how to get started?")
        },
    },
    IntentRule {
        kind: IntentKind::Courses,
        any_of: &["course", "subject", "class"],
        none_of: &[],
        handler: courses,
    },
    IntentRule {
        kind: IntentKind::Tutors,
        any_of: &["tutor", "teacher"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "Our tutors are highly qualified professionals with extensive experience in their fields. They undergo a rigorous selection process to ensure they can provide the best learning experience for our students.",
            )
            .follow_up(
                "Would you like to know how to become a tutor or how to find a tutor for a specific subject?",
            )
        },
    },
    IntentRule {
        kind: IntentKind::Registration,
        any_of: &["register", "sign up", "join"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "Registering with Inlustro is easy! You can sign up as a student or a tutor. The process takes just a few minutes, and you'll need to provide some basic information to get started.",
            )
            .follow_up("Would you like me to guide you through the registration process?")
        },
    },
    // Personality switches
    IntentRule {
        kind: IntentKind::SwitchPersonality(Personality::Creative),
        any_of: &["be more creative", "creative mode"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "I've switched to creative mode! I'll be more imaginative and expressive in my responses now.",
            )
            .follow_up("How can I creatively assist you today?")
        },
    },
    IntentRule {
        kind: IntentKind::SwitchPersonality(Personality::Concise),
        any_of: &["be more concise", "concise mode"],
        none_of: &[],
        handler: |_, _| Reply::new("Concise mode activated.").follow_up("How can I help?"),
    },
    IntentRule {
        kind: IntentKind::SwitchPersonality(Personality::Helpful),
        any_of: &["be more helpful", "helpful mode"],
        none_of: &[],
        handler: |_, _| {
            Reply::new(
                "I've switched to helpful mode. I'll focus on providing detailed and informative responses.",
            )
            .follow_up("What would you like help with today?")
        },
    },
];

pub const CONCISE_FALLBACK: &str =
    "I don't have specific info on that yet. Can I help with something else?";
pub const CREATIVE_FALLBACK: &str = "What a fascinating inquiry! While that particular knowledge hasn't been woven into my digital tapestry yet, I'm constantly expanding my horizons to better serve your curiosity.";
pub const HELPFUL_FALLBACK: &str = "That's an interesting question! While I don't have specific information on that topic yet, I'm continuously learning to better assist you.";

pub const GREETING: &str = "Hello there! How can I assist you today?";
pub const PORTAL_QUESTION: &str =
    "Are you a student, tutor, or administrator looking to access your portal?";

fn greeting(memory: &ConversationMemory, _: Personality) -> Reply {
    match &memory.user_name {
        Some(name) => {
            let follow_up = match memory.user_role {
                Some(role) => format!("Would you like to access your {role} portal?"),
                None => PORTAL_QUESTION.to_string(),
            };
            Reply::new(format!(
                "Hello {name}! It's great to see you again. How can I assist you today?"
            ))
            .follow_up(follow_up)
        }
        None => Reply::new(GREETING).follow_up(PORTAL_QUESTION),
    }
}

fn courses(memory: &ConversationMemory, _: Personality) -> Reply {
    match memory.interests.first() {
        Some(top) => Reply::new(format!(
            "Based on your interest in {}, I can recommend some courses that might be perfect for you.",
            memory.interests.join(", ")
        ))
        .follow_up(format!(
            "Would you like me to show you our top-rated {top} courses?"
        )),
        None => Reply::new(
            "We offer a wide range of courses across various subjects including Mathematics, Sciences, Languages, Humanities, and more. Each course is taught by experienced tutors who specialize in their fields.",
        )
        .follow_up(
            "Are you looking for a specific subject or would you like to browse our course catalog?",
        ),
    }
}

/// Reply used when no rule matches, phrased for the current personality.
pub fn fallback(memory: &ConversationMemory, personality: Personality) -> Reply {
    match personality {
        Personality::Concise => Reply::new(CONCISE_FALLBACK),
        Personality::Creative => Reply::new(CREATIVE_FALLBACK).follow_up(
            "In this moment of discovery, perhaps I can illuminate other paths for you? The realms of courses, tutoring, or platform navigation await your exploration!",
        ),
        Personality::Helpful => {
            let follow_up = match &memory.user_name {
                Some(name) => format!(
                    "In the meantime, {name}, can I help you with navigating the site, learning about our services, or connecting with a tutor?"
                ),
                None => "In the meantime, can I help you with navigating the site, learning about our services, or connecting with a tutor?".to_string(),
            };
            Reply::new(HELPFUL_FALLBACK).follow_up(follow_up)
        }
    }
}

/// First rule matching the utterance, if any.
pub fn find_rule(input: &str) -> Option<&'static IntentRule> {
    let lower = input.to_lowercase();
    INTENTS.iter().find(|rule| rule.matches(&lower))
}

/// Classify an utterance without touching any conversation state.
pub fn classify(input: &str) -> IntentKind {
    find_rule(input).map_or(IntentKind::Fallback, |rule| rule.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_beats_greeting() {
        assert_eq!(
            classify("hello, tell me about admin login"),
            IntentKind::Navigate(Route::AdminLogin)
        );
    }

    #[test]
    fn test_navigation_routes() {
        assert_eq!(
            classify("go to student portal"),
            IntentKind::Navigate(Route::StudentLogin)
        );
        assert_eq!(
            classify("Tutor Login please"),
            IntentKind::Navigate(Route::TutorLogin)
        );
        assert_eq!(classify("back to the home page"), IntentKind::Navigate(Route::Home));
    }

    #[test]
    fn test_greeting_variants() {
        assert_eq!(classify("Hello"), IntentKind::Greeting);
        assert_eq!(classify("hey!"), IntentKind::Greeting);
        assert_eq!(classify("HI"), IntentKind::Greeting);
    }

    #[test]
    fn test_greeting_matches_by_substring() {
        // Substring containment, not tokenisation.
        assert_eq!(classify("which tutor"), IntentKind::Greeting);
    }

    #[test]
    fn test_meta_questions() {
        assert_eq!(classify("how are you"), IntentKind::HowAreYou);
        assert_eq!(classify("what's your name"), IntentKind::Identity);
        assert_eq!(classify("who are you"), IntentKind::Identity);
    }

    #[test]
    fn test_help_excludes_helpful() {
        assert_eq!(classify("I need help"), IntentKind::Help);
        assert_eq!(classify("what can you do"), IntentKind::Help);
        assert_eq!(
            classify("be more helpful"),
            IntentKind::SwitchPersonality(Personality::Helpful)
        );
        assert_eq!(
            classify("helpful mode"),
            IntentKind::SwitchPersonality(Personality::Helpful)
        );
    }

    #[test]
    fn test_voice_control() {
        assert_eq!(classify("stop listening"), IntentKind::StopListening);
        assert_eq!(classify("stop speaking"), IntentKind::StopListening);
        assert_eq!(classify("start voice"), IntentKind::StartListening);
    }

    #[test]
    fn test_domain_topics() {
        assert_eq!(classify("what are your fees"), IntentKind::Pricing);
        assert_eq!(classify("what is inlustro"), IntentKind::About);
        assert_eq!(classify("do you offer a course in art"), IntentKind::Courses);
        assert_eq!(classify("find a teacher"), IntentKind::Tutors);
        assert_eq!(classify("I want to register"), IntentKind::Registration);
    }

    #[test]
    fn test_personality_switches() {
        assert_eq!(
            classify("be more creative"),
            IntentKind::SwitchPersonality(Personality::Creative)
        );
        assert_eq!(
            classify("concise mode"),
            IntentKind::SwitchPersonality(Personality::Concise)
        );
    }

    #[test]
    fn test_unmatched_is_fallback() {
        assert_eq!(classify("xyz123"), IntentKind::Fallback);
        assert_eq!(classify(""), IntentKind::Fallback);
    }

    #[test]
    fn test_courses_personalised_by_interests() {
        let memory = ConversationMemory {
            interests: vec!["physics".to_string(), "music".to_string()],
            ..ConversationMemory::default()
        };
        let reply = courses(&memory, Personality::Helpful);
        assert!(reply.response.contains("physics, music"));
        assert_eq!(
            reply.follow_up.as_deref(),
            Some("Would you like me to show you our top-rated physics courses?")
        );
    }

    #[test]
    fn test_every_rule_has_a_phrase() {
        for rule in INTENTS {
            assert!(!rule.any_of.is_empty(), "{:?} has no phrases", rule.kind);
        }
    }
}
