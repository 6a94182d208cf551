//! Client for the remote chat endpoint.
//!
//! Attachments are flattened into the message text before sending so the
//! backend can reason about them without a multipart upload. Any failure
//! yields the configured fallback reply; callers always get a [`ChatReply`].

pub mod error;

use inlustro_core::config::GatewayConfig;
use inlustro_extract::{TextExtractor, Upload};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use error::GatewayError;

const SESSION_ID_LEN: usize = 12;

/// Body of `POST {api_url}/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

/// Reply from the chat endpoint (or the fallback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Generate a random alphanumeric session id.
pub fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

pub struct MessageGateway {
    client: reqwest::Client,
    endpoint: String,
    fallback_reply: String,
    extractor: TextExtractor,
}

impl MessageGateway {
    pub fn new(config: &GatewayConfig, extractor: TextExtractor) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat", config.api_url.trim_end_matches('/')),
            fallback_reply: config.fallback_reply.clone(),
            extractor,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `text` (plus any attachment's extracted text) and return the
    /// endpoint's reply. Resolves to the fallback reply on any failure.
    pub async fn send_message(
        &self,
        text: &str,
        file: Option<&Upload>,
        session_id: &str,
    ) -> ChatReply {
        let message = self.compose(text, file).await;
        tracing::debug!(session_id = %session_id, chars = message.len(), "Sending chat message");

        match self.post(message, session_id).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, endpoint = %self.endpoint, "Chat request failed");
                ChatReply {
                    response: self.fallback_reply.clone(),
                }
            }
        }
    }

    async fn compose(&self, text: &str, file: Option<&Upload>) -> String {
        match file {
            Some(upload) => {
                let extracted = self.extractor.extract(upload).await;
                format!(
                    "{} {} {} {}",
                    text,
                    extracted,
                    upload.name,
                    upload.kind().tag()
                )
            }
            None => text.to_string(),
        }
    }

    async fn post(&self, message: String, session_id: &str) -> Result<ChatReply, GatewayError> {
        let body = ChatRequest {
            message,
            session_id: session_id.to_string(),
        };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        Ok(response.json::<ChatReply>().await?)
    }
}
