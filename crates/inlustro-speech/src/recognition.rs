//! Speech-to-text: one fresh engine instance per listening session.
//!
//! Host engines are reached through [`RecognitionProvider`], which hands
//! out a new [`RecognitionEngine`] for every [`Recognizer::listen`] call.
//! The instance lives in a [`RecognitionLease`] that aborts it on drop, so
//! every exit path (result, timeout, error, cancel) releases it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use inlustro_core::config::SpeechConfig;
use tokio::sync::futures::Notified;
use tokio::sync::{mpsc, Notify};

use crate::error::SpeechError;

/// Minimum length for leftover interim text to be treated as final.
const MIN_PROMOTED_CHARS: usize = 3;

/// Settings applied to every recognition instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub lang: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl RecognitionConfig {
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self {
            lang: config.lang.clone(),
            continuous: false,
            interim_results: true,
            max_alternatives: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Result { transcript: String, is_final: bool },
    Error(String),
    End,
}

/// One recognition instance. Not reused after its session ends.
pub trait RecognitionEngine: Send {
    fn start(
        &mut self,
        config: &RecognitionConfig,
    ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, SpeechError>;
    /// Stop gracefully; the engine may still deliver pending results.
    fn stop(&mut self);
    /// Stop and discard anything pending.
    fn abort(&mut self);
}

/// Factory for recognition instances. `None` means the host has no engine.
pub trait RecognitionProvider: Send + Sync {
    fn create(&self) -> Option<Box<dyn RecognitionEngine>>;

    fn is_supported(&self) -> bool {
        self.create().is_some()
    }
}

/// Owns a recognition instance for the duration of one session.
pub struct RecognitionLease {
    engine: Box<dyn RecognitionEngine>,
    released: bool,
}

impl RecognitionLease {
    fn new(engine: Box<dyn RecognitionEngine>) -> Self {
        Self {
            engine,
            released: false,
        }
    }

    fn stop(mut self) {
        self.engine.stop();
        self.released = true;
    }

    fn finish(mut self) {
        self.released = true;
    }
}

impl Drop for RecognitionLease {
    fn drop(&mut self) {
        if !self.released {
            self.engine.abort();
        }
    }
}

pub struct Recognizer {
    provider: Arc<dyn RecognitionProvider>,
    config: RecognitionConfig,
    timeout: Duration,
    /// Id of the session currently listening; 0 when idle.
    active: AtomicU64,
    next_session: AtomicU64,
    cancel: Notify,
}

impl Recognizer {
    pub fn new(provider: Arc<dyn RecognitionProvider>, config: &SpeechConfig) -> Self {
        Self {
            provider,
            config: RecognitionConfig::from_config(config),
            timeout: Duration::from_millis(config.recognition_timeout_ms),
            active: AtomicU64::new(0),
            next_session: AtomicU64::new(1),
            cancel: Notify::new(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.provider.is_supported()
    }

    pub fn is_listening(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }

    /// Cancel the in-flight listening session, if any.
    pub fn stop_listening(&self) {
        if self.is_listening() {
            tracing::debug!("Stopping speech recognition");
        }
        self.cancel.notify_waiters();
    }

    /// Listen for one utterance and return its final transcript.
    ///
    /// Any session already in flight is torn down first. Leftover interim
    /// text is promoted to final when the engine ends without a final
    /// result. Times out with [`SpeechError::NoSpeech`].
    pub async fn listen(&self) -> Result<String, SpeechError> {
        self.cancel.notify_waiters();

        let engine = self
            .provider
            .create()
            .ok_or_else(|| SpeechError::Unsupported("speech recognition".to_string()))?;
        let mut lease = RecognitionLease::new(engine);
        let mut events = lease.engine.start(&self.config)?;

        let canceled = self.cancel.notified();
        let session = self.next_session.fetch_add(1, Ordering::SeqCst);
        self.active.store(session, Ordering::SeqCst);
        let outcome = self.drive(&mut events, canceled).await;
        // A newer session may have taken over while this one unwound.
        let _ = self
            .active
            .compare_exchange(session, 0, Ordering::SeqCst, Ordering::SeqCst);

        match outcome {
            Outcome::Final(text) => {
                lease.stop();
                Ok(text)
            }
            Outcome::Ended(interim) => {
                lease.finish();
                let interim = interim.trim();
                if interim.len() > MIN_PROMOTED_CHARS {
                    tracing::debug!(transcript = %interim, "Promoting interim transcript");
                    Ok(interim.to_string())
                } else {
                    Err(SpeechError::NoSpeech)
                }
            }
            Outcome::TimedOut => {
                tracing::debug!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Recognition timed out"
                );
                lease.stop();
                Err(SpeechError::NoSpeech)
            }
            Outcome::Failed(message) => {
                tracing::warn!(error = %message, "Recognition engine error");
                drop(lease);
                Err(SpeechError::Recognition(message))
            }
            Outcome::Canceled => {
                drop(lease);
                Err(SpeechError::Canceled)
            }
        }
    }

    async fn drive(
        &self,
        events: &mut mpsc::UnboundedReceiver<RecognitionEvent>,
        canceled: Notified<'_>,
    ) -> Outcome {
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);
        tokio::pin!(canceled);
        let mut interim = String::new();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(RecognitionEvent::Started) => tracing::debug!("Recognition started"),
                    Some(RecognitionEvent::Result { transcript, is_final: true }) => {
                        return Outcome::Final(transcript.trim().to_string());
                    }
                    Some(RecognitionEvent::Result { transcript, is_final: false }) => {
                        interim = transcript;
                    }
                    Some(RecognitionEvent::Error(message)) => return Outcome::Failed(message),
                    Some(RecognitionEvent::End) | None => return Outcome::Ended(interim),
                },
                _ = &mut deadline => return Outcome::TimedOut,
                _ = &mut canceled => return Outcome::Canceled,
            }
        }
    }
}

enum Outcome {
    Final(String),
    Ended(String),
    TimedOut,
    Failed(String),
    Canceled,
}

// =============================================================================
// Mock
// =============================================================================

/// What a mock recognition instance reports to its lease holder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockRecognitionStats {
    pub created: usize,
    pub stopped: usize,
    pub aborted: usize,
}

/// Scripted recognition provider. Each created instance replays the same
/// event script (after `Started`) and then keeps its channel open.
pub struct MockRecognitionProvider {
    script: Option<Vec<RecognitionEvent>>,
    stats: Arc<Mutex<MockRecognitionStats>>,
}

impl MockRecognitionProvider {
    pub fn new(script: Vec<RecognitionEvent>) -> Self {
        Self {
            script: Some(script),
            stats: Arc::new(Mutex::new(MockRecognitionStats::default())),
        }
    }

    /// Provider for a host without speech recognition.
    pub fn unsupported() -> Self {
        Self {
            script: None,
            stats: Arc::new(Mutex::new(MockRecognitionStats::default())),
        }
    }

    pub fn stats(&self) -> MockRecognitionStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }
}

impl RecognitionProvider for MockRecognitionProvider {
    fn create(&self) -> Option<Box<dyn RecognitionEngine>> {
        let script = self.script.clone()?;
        if let Ok(mut stats) = self.stats.lock() {
            stats.created += 1;
        }
        Some(Box::new(MockRecognitionEngine {
            script,
            stats: Arc::clone(&self.stats),
            sender: None,
        }))
    }

    fn is_supported(&self) -> bool {
        self.script.is_some()
    }
}

struct MockRecognitionEngine {
    script: Vec<RecognitionEvent>,
    stats: Arc<Mutex<MockRecognitionStats>>,
    sender: Option<mpsc::UnboundedSender<RecognitionEvent>>,
}

impl RecognitionEngine for MockRecognitionEngine {
    fn start(
        &mut self,
        _config: &RecognitionConfig,
    ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, SpeechError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(RecognitionEvent::Started);
        for event in &self.script {
            let _ = tx.send(event.clone());
        }
        self.sender = Some(tx);
        Ok(rx)
    }

    fn stop(&mut self) {
        self.sender = None;
        if let Ok(mut stats) = self.stats.lock() {
            stats.stopped += 1;
        }
    }

    fn abort(&mut self) {
        self.sender = None;
        if let Ok(mut stats) = self.stats.lock() {
            stats.aborted += 1;
        }
    }
}
