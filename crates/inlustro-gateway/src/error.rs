/// Failures talking to the chat endpoint. Never surfaced to callers of
/// [`MessageGateway::send_message`](crate::MessageGateway::send_message).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat endpoint returned status {0}")]
    Status(u16),
}
