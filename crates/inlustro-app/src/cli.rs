//! Command-line arguments for the console host.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use inlustro_core::config::default_config_path;

/// Which assistant surface the console drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Floating assistant answering with the local dialogue engine.
    Widget,
    /// Chat page answering through the remote chat endpoint.
    Page,
}

/// Inlustro assistant in a terminal.
#[derive(Parser, Debug)]
#[command(name = "inlustro", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Assistant surface to run.
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = Mode::Widget)]
    pub mode: Mode,

    /// Chat endpoint base URL (page mode).
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Priority: --config flag > INLUSTRO_CONFIG env var > ~/.inlustro/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("INLUSTRO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    Attach(PathBuf),
    Voice,
    Mute,
    Unmute,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Command::Message(line.to_string()));
        }

        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        let cmd = match head {
            "/file" if !rest.trim().is_empty() => Command::Attach(PathBuf::from(rest.trim())),
            "/voice" => Command::Voice,
            "/mute" => Command::Mute,
            "/unmute" => Command::Unmute,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Unknown(head.to_string()),
        };
        Some(cmd)
    }
}
