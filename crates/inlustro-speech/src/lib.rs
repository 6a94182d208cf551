//! Speech input and output for the assistant.
//!
//! Host engines are injected as ports: [`RecognitionProvider`] for
//! speech-to-text and [`SynthesisEngine`] for text-to-speech.
//! [`SpeechAdapter`] owns both and keeps them mutually exclusive.

pub mod adapter;
pub mod error;
pub mod recognition;
pub mod synthesis;

pub use adapter::SpeechAdapter;
pub use error::SpeechError;
pub use recognition::{
    MockRecognitionProvider, RecognitionConfig, RecognitionEngine, RecognitionEvent,
    RecognitionProvider, Recognizer,
};
pub use synthesis::{
    resolve_voice, select_voice, split_sentences, MockSynthesisEngine, MockSynthesisEvent,
    Speaker, SpeakerState, SpeechTiming, SynthesisEngine, Utterance, Voice, VoiceProfile,
};
