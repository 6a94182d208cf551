use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{InlustroError, Result};

/// Top-level configuration for the Inlustro assistant.
///
/// Loaded from `~/.inlustro/config.toml` by default. Every section is
/// optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlustroConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl InlustroConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: InlustroConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| InlustroError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Resolve `general.data_dir`, expanding a leading `~/` to the home directory.
    pub fn data_dir(&self) -> PathBuf {
        let raw = self.general.data_dir.as_str();
        match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
            Some(rest) => home_dir().join(rest),
            None => PathBuf::from(raw),
        }
    }
}

/// Default config file location (`~/.inlustro/config.toml`).
pub fn default_config_path() -> PathBuf {
    home_dir().join(".inlustro").join("config.toml")
}

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding durable client-side state (voice preferences).
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.inlustro".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Remote chat endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL; requests go to `{api_url}/chat`.
    pub api_url: String,
    /// Reply returned to callers whenever the endpoint cannot be reached.
    pub fallback_reply: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            fallback_reply:
                "I'm having trouble connecting to my backend. Please try again later.".to_string(),
        }
    }
}

/// Speech recognition and synthesis tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition and utterance locale.
    pub lang: String,
    /// Stop listening after this long without a final transcript.
    pub recognition_timeout_ms: u64,
    /// Minimum pause between spoken sentences.
    pub sentence_pause_base_ms: u64,
    /// Extra pause per character of the sentence just spoken.
    pub sentence_pause_per_char_ms: u64,
    /// Upper bound for the inter-sentence pause.
    pub sentence_pause_max_ms: u64,
    /// Delay before each sentence is handed to the synthesis engine.
    pub sentence_start_delay_ms: u64,
    /// How often the synthesis watchdog checks for a stalled engine.
    pub watchdog_interval_ms: u64,
    /// How long the watchdog keeps polling for a single sentence.
    pub watchdog_window_ms: u64,
    /// Speaking rate passed to each utterance.
    pub rate: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            recognition_timeout_ms: 6_000,
            sentence_pause_base_ms: 800,
            sentence_pause_per_char_ms: 5,
            sentence_pause_max_ms: 2_000,
            sentence_start_delay_ms: 300,
            watchdog_interval_ms: 250,
            watchdog_window_ms: 10_000,
            rate: 1.0,
        }
    }
}

/// Conversation session pacing and canned texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before an assistant reply is appended to the transcript.
    pub reply_delay_ms: u64,
    /// Delay before a follow-up is considered after the primary response.
    pub follow_up_delay_ms: u64,
    /// Extra gap between the primary response finishing and the follow-up.
    pub follow_up_gap_ms: u64,
    /// Delay before a navigation action is executed.
    pub navigation_delay_ms: u64,
    /// Opening message of the dedicated chat page.
    pub page_greeting: String,
    /// First message posted when the floating widget is activated.
    pub widget_welcome: String,
    /// Introduction posted after the widget welcome.
    pub widget_introduction: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 500,
            follow_up_delay_ms: 3_000,
            follow_up_gap_ms: 1_500,
            navigation_delay_ms: 1_500,
            page_greeting: "Hello! I'm your friendly AI assistant. Feel free to talk to me via chat or by voice. How can I help you today?".to_string(),
            widget_welcome: "Welcome to The Inlustro!".to_string(),
            widget_introduction: "I'm your AI assistant. I can help you navigate the site, answer questions about our services, or assist with any other inquiries you might have. What would you like to know?".to_string(),
        }
    }
}
