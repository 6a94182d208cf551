//! Shared data model for the assistant: transcript messages, attachments,
//! dialogue personality, navigation routes, and voice preferences.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::InlustroError;

// =============================================================================
// Transcript
// =============================================================================

/// Metadata of a file the user attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    /// Preview URL (object URL in a browser, `file://` on a desktop host).
    pub url: String,
    pub mime_type: String,
}

/// One entry in a conversation transcript. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub is_from_assistant: bool,
    /// Wall-clock time formatted as `hh:mm AM`.
    pub timestamp: String,
    pub attachment: Option<Attachment>,
}

impl ChatMessage {
    /// Create a user message stamped with the current local time.
    pub fn user(id: u64, text: impl Into<String>, attachment: Option<Attachment>) -> Self {
        Self {
            id,
            text: text.into(),
            is_from_assistant: false,
            timestamp: format_timestamp(Local::now()),
            attachment,
        }
    }

    /// Create an assistant message stamped with the current local time.
    pub fn assistant(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_from_assistant: true,
            timestamp: format_timestamp(Local::now()),
            attachment: None,
        }
    }
}

/// Format a time the way the transcript displays it (12-hour clock).
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format("%I:%M %p").to_string()
}

// =============================================================================
// Dialogue
// =============================================================================

/// Response phrasing style of the dialogue engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Helpful,
    Creative,
    Concise,
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Personality::Helpful => write!(f, "helpful"),
            Personality::Creative => write!(f, "creative"),
            Personality::Concise => write!(f, "concise"),
        }
    }
}

/// Portal role a user has identified with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Tutor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Tutor => write!(f, "tutor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Portal pages the assistant can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Home,
    StudentLogin,
    TutorLogin,
    AdminLogin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::StudentLogin => "/login/student",
            Route::TutorLogin => "/login/tutor",
            Route::AdminLogin => "/login/admin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// =============================================================================
// Voice
// =============================================================================

/// Preferred synthesis voice gender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    #[default]
    Female,
}

impl VoiceGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceGender::Male => "male",
            VoiceGender::Female => "female",
        }
    }

    /// Utterance pitch associated with this gender.
    pub fn pitch(&self) -> f32 {
        match self {
            VoiceGender::Male => 0.9,
            VoiceGender::Female => 1.1,
        }
    }
}

impl fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceGender {
    type Err = InlustroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(VoiceGender::Male),
            "female" => Ok(VoiceGender::Female),
            other => Err(InlustroError::Preferences(format!(
                "unknown voice gender: {other}"
            ))),
        }
    }
}

/// Voice output preferences for one session.
///
/// `gender` and `muted` survive across sessions through a
/// [`PreferenceStore`](crate::prefs::PreferenceStore); `selected_voice_id`
/// is re-derived from the engine's voice list on every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub gender: VoiceGender,
    pub selected_voice_id: Option<String>,
    pub muted: bool,
    pub enabled: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            gender: VoiceGender::Female,
            selected_voice_id: None,
            muted: false,
            enabled: true,
        }
    }
}
