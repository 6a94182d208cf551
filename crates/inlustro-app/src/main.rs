//! Inlustro console host - composition root.
//!
//! Wires the assistant crates into a terminal program standing in for the
//! browser UI:
//! 1. Load configuration from TOML
//! 2. Restore voice preferences from the data directory
//! 3. Build the responder (local dialogue engine or remote gateway)
//! 4. Run a widget or page session driven by stdin
//!
//! The terminal has no speech engines, so voice input reports itself as
//! unsupported and replies are printed rather than spoken.

mod cli;
mod console;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use inlustro_chat::{
    ConversationSession, DialogueResponder, GatewayResponder, OutgoingFile, Responder,
};
use inlustro_core::{FilePreferenceStore, InlustroConfig};
use inlustro_extract::{TesseractOcr, TextExtractor, Upload};
use inlustro_gateway::{generate_session_id, MessageGateway};
use inlustro_speech::SpeechAdapter;

use cli::{CliArgs, Command, Mode};
use console::{ConsoleNavigator, ConsoleNotifier, NoRecognition};

const PREFERENCES_FILE: &str = "preferences.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = InlustroConfig::load_or_default(&config_file);
    let level = args.resolve_log_level(&config.general.log_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if let Some(url) = args.api_url.clone() {
        config.gateway.api_url = url;
    }

    let prefs = Arc::new(FilePreferenceStore::new(
        config.data_dir().join(PREFERENCES_FILE),
    ));
    let speech = Arc::new(SpeechAdapter::new(
        Arc::new(NoRecognition),
        None,
        prefs,
        &config.speech,
    ));

    let responder: Arc<dyn Responder> = match args.mode {
        Mode::Widget => Arc::new(DialogueResponder::new()),
        Mode::Page => {
            let extractor = TextExtractor::new(Arc::new(TesseractOcr::default()));
            let gateway = Arc::new(MessageGateway::new(&config.gateway, extractor));
            let session_id = generate_session_id();
            tracing::info!(
                session_id = %session_id,
                endpoint = %gateway.endpoint(),
                "Using remote chat endpoint"
            );
            Arc::new(GatewayResponder::new(gateway, session_id))
        }
    };

    let notifier = Arc::new(ConsoleNotifier);
    let navigator = Arc::new(ConsoleNavigator);
    let session = match args.mode {
        Mode::Widget => ConversationSession::widget(
            responder,
            speech,
            notifier,
            navigator,
            config.session.clone(),
        ),
        Mode::Page => ConversationSession::page(
            responder,
            speech,
            notifier,
            navigator,
            config.session.clone(),
        ),
    };

    match args.mode {
        Mode::Widget => session.activate(),
        Mode::Page => session.interact(),
    }
    tokio::spawn(console::print_transcript(session.clone()));

    run_prompt(&session).await?;
    tracing::info!("Goodbye");
    Ok(())
}

/// Read commands from stdin until `/quit` or end of input.
async fn run_prompt(session: &ConversationSession) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut staged: Option<OutgoingFile> = None;

    while let Some(line) = lines.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };

        match command {
            Command::Message(text) => {
                session.interact();
                if let Err(e) = session.send_text(&text, staged.take()).await {
                    tracing::debug!(error = %e, "Message not sent");
                }
            }
            Command::Attach(path) => match attach(&path).await {
                Ok(file) => {
                    println!("attached {} ({})", file.upload.name, file.upload.mime_type);
                    staged = Some(file);
                }
                Err(e) => eprintln!("cannot attach {}: {}", path.display(), e),
            },
            Command::Voice => {
                if let Err(e) = session.send_voice().await {
                    tracing::debug!(error = %e, "Voice input ended");
                }
            }
            Command::Mute => {
                if let Err(e) = session.set_muted(true) {
                    tracing::warn!(error = %e, "Failed to save mute preference");
                }
            }
            Command::Unmute => {
                if let Err(e) = session.set_muted(false) {
                    tracing::warn!(error = %e, "Failed to save mute preference");
                }
            }
            Command::Quit => break,
            Command::Unknown(cmd) => {
                eprintln!("unknown command {cmd}; try /file PATH, /voice, /mute, /unmute, /quit")
            }
        }
    }
    Ok(())
}

async fn attach(path: &Path) -> Result<OutgoingFile, inlustro_extract::ExtractError> {
    let upload = Upload::from_path(path).await?;
    let absolute = tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf());
    Ok(OutgoingFile {
        upload,
        url: format!("file://{}", absolute.display()),
    })
}
