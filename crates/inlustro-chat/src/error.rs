//! Error types for conversation sessions.

use inlustro_speech::SpeechError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("assistant is not active")]
    Inactive,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("responder error: {0}")]
    Responder(String),
    #[error(transparent)]
    Speech(#[from] SpeechError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::Inactive.to_string(), "assistant is not active");
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::Responder("timeout".to_string()).to_string(),
            "responder error: timeout"
        );
    }

    #[test]
    fn test_speech_error_is_transparent() {
        let err: ChatError = SpeechError::NoSpeech.into();
        assert!(matches!(err, ChatError::Speech(SpeechError::NoSpeech)));
        assert_eq!(err.to_string(), "no speech detected");
    }
}
