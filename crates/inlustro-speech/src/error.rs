use inlustro_core::InlustroError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    /// The host has no engine for this capability.
    #[error("{0} is not supported on this host")]
    Unsupported(String),
    #[error("speech recognition error: {0}")]
    Recognition(String),
    #[error("no speech detected")]
    NoSpeech,
    #[error("speech synthesis error: {0}")]
    Synthesis(String),
    /// Superseded by a newer request, a mute, or a stop.
    #[error("speech canceled")]
    Canceled,
    #[error("preference error: {0}")]
    Preferences(String),
}

impl From<InlustroError> for SpeechError {
    fn from(err: InlustroError) -> Self {
        SpeechError::Preferences(err.to_string())
    }
}
