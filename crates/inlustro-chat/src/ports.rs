//! Host-facing ports: who answers messages, how transient notices are shown,
//! and how the host changes page.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use inlustro_core::Route;
use inlustro_dialogue::{Dialogue, Reply};
use inlustro_extract::Upload;
use inlustro_gateway::MessageGateway;

use crate::error::ChatError;

/// Produces the assistant's reply to one user message.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, text: &str, file: Option<&Upload>) -> Result<Reply, ChatError>;
}

/// Answers locally with the rule-based dialogue engine.
///
/// Attachments are ignored; the engine only sees the typed text.
#[derive(Default)]
pub struct DialogueResponder {
    dialogue: Mutex<Dialogue>,
}

impl DialogueResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialogue(&self) -> Option<Dialogue> {
        self.dialogue.lock().ok().map(|d| d.clone())
    }
}

#[async_trait]
impl Responder for DialogueResponder {
    async fn respond(&self, text: &str, _file: Option<&Upload>) -> Result<Reply, ChatError> {
        let mut dialogue = self
            .dialogue
            .lock()
            .map_err(|e| ChatError::Responder(format!("dialogue lock poisoned: {}", e)))?;
        Ok(dialogue.respond(text))
    }
}

/// Answers through the remote chat endpoint, under one session id.
pub struct GatewayResponder {
    gateway: Arc<MessageGateway>,
    session_id: String,
}

impl GatewayResponder {
    pub fn new(gateway: Arc<MessageGateway>, session_id: impl Into<String>) -> Self {
        Self {
            gateway,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl Responder for GatewayResponder {
    async fn respond(&self, text: &str, file: Option<&Upload>) -> Result<Reply, ChatError> {
        let reply = self
            .gateway
            .send_message(text, file, &self.session_id)
            .await;
        Ok(Reply::new(reply.response))
    }
}

// =============================================================================
// Notifications and navigation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

/// A transient notice (toast) shown by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.into(),
            description: description.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Notifier that keeps every notification for inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification);
        }
    }
}

/// Navigator that records the routes it was asked to open.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route);
        }
    }
}
