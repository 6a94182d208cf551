//! Text-to-speech: sentence-by-sentence playback over a host engine.
//!
//! [`Speaker`] is a small state machine (idle, speaking sentence `i`,
//! paused before sentence `i`). Every `speak` or `cancel` bumps a
//! generation counter; a sequence whose generation is stale stops at its
//! next await point. While a sentence plays, a watchdog resumes engines
//! that stall in a paused state.

use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use inlustro_core::config::SpeechConfig;
use inlustro_core::{VoiceGender, VoiceSettings};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;

use crate::error::SpeechError;

/// Wait after a failed sentence before moving to the next one.
const SENTENCE_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    /// BCP 47 tag such as `en-GB`.
    pub lang: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: lang.into(),
        }
    }

    pub fn is_english(&self) -> bool {
        self.lang.starts_with("en")
    }
}

/// One sentence handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice_id: Option<String>,
    pub lang: String,
    pub pitch: f32,
    pub rate: f32,
}

/// Resolves when the engine finishes (or drops) an utterance.
pub type Completion = oneshot::Receiver<Result<(), SpeechError>>;

/// Host speech synthesis engine.
pub trait SynthesisEngine: Send + Sync {
    fn voices(&self) -> Vec<Voice>;
    fn speak(&self, utterance: Utterance) -> Completion;
    /// Drop the current and all queued utterances.
    fn cancel(&self);
    fn is_speaking(&self) -> bool;
    fn is_paused(&self) -> bool;
    fn resume(&self);
}

// =============================================================================
// Voice selection
// =============================================================================

fn looks_female(name: &str) -> bool {
    name.contains("female") || name.contains("woman") || name.contains("girl")
}

fn looks_male(name: &str) -> bool {
    !looks_female(name) && (name.contains("male") || name.contains("man") || name.contains("boy"))
}

/// Pick an English voice matching `gender` by name, else the first
/// English voice.
pub fn select_voice(voices: &[Voice], gender: VoiceGender) -> Option<&Voice> {
    let english: Vec<&Voice> = voices.iter().filter(|v| v.is_english()).collect();

    let matching = english.iter().copied().find(|v| {
        let name = v.name.to_lowercase();
        let vendor = name.contains("google") || name.contains("microsoft");
        match gender {
            VoiceGender::Female => looks_female(&name) || (vendor && !name.contains("male")),
            VoiceGender::Male => looks_male(&name),
        }
    });

    matching.or_else(|| english.first().copied())
}

/// Voice to use for `settings`: the explicit choice if it still exists,
/// then the gender heuristic, then any voice at all.
pub fn resolve_voice<'a>(voices: &'a [Voice], settings: &VoiceSettings) -> Option<&'a Voice> {
    settings
        .selected_voice_id
        .as_deref()
        .and_then(|id| voices.iter().find(|v| v.id == id))
        .or_else(|| select_voice(voices, settings.gender))
        .or_else(|| voices.first())
}

// =============================================================================
// Sentences and pacing
// =============================================================================

fn sentence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence regex"))
}

/// Split text on `.`, `!` and `?` boundaries. Text without terminal
/// punctuation is kept as its own final sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut consumed = 0;
    for m in sentence_regex().find_iter(text) {
        let sentence = m.as_str().trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        consumed = m.end();
    }

    let rest = text[consumed..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechTiming {
    pub lang: String,
    pub rate: f32,
    pub pause_base: Duration,
    pub pause_per_char: Duration,
    pub pause_max: Duration,
    pub start_delay: Duration,
    pub watchdog_interval: Duration,
    pub watchdog_window: Duration,
}

impl SpeechTiming {
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self {
            lang: config.lang.clone(),
            rate: config.rate,
            pause_base: Duration::from_millis(config.sentence_pause_base_ms),
            pause_per_char: Duration::from_millis(config.sentence_pause_per_char_ms),
            pause_max: Duration::from_millis(config.sentence_pause_max_ms),
            start_delay: Duration::from_millis(config.sentence_start_delay_ms),
            watchdog_interval: Duration::from_millis(config.watchdog_interval_ms.max(1)),
            watchdog_window: Duration::from_millis(config.watchdog_window_ms),
        }
    }

    /// Pause after a spoken sentence, growing with its length.
    pub fn pause_after(&self, sentence: &str) -> Duration {
        let chars = sentence.chars().count() as u32;
        (self.pause_base + self.pause_per_char * chars).min(self.pause_max)
    }
}

// =============================================================================
// Speaker
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerState {
    Idle,
    Speaking { sentence: usize },
    Paused { next: usize },
}

/// Voice parameters applied to every sentence of one `speak` call.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    pub voice_id: Option<String>,
    pub pitch: f32,
}

pub struct Speaker {
    engine: Arc<dyn SynthesisEngine>,
    timing: SpeechTiming,
    state: Mutex<SpeakerState>,
    generation: watch::Sender<u64>,
}

impl Speaker {
    pub fn new(engine: Arc<dyn SynthesisEngine>, timing: SpeechTiming) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            engine,
            timing,
            state: Mutex::new(SpeakerState::Idle),
            generation,
        }
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.engine.voices()
    }

    pub fn state(&self) -> SpeakerState {
        self.state.lock().map(|s| *s).unwrap_or(SpeakerState::Idle)
    }

    pub fn is_speaking(&self) -> bool {
        self.state() != SpeakerState::Idle
    }

    /// Stop the current sequence immediately.
    pub fn cancel(&self) {
        self.preempt();
    }

    /// Invalidate every running sequence and return the generation that
    /// now owns the engine.
    fn preempt(&self) -> u64 {
        let mut current = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            current = *g;
        });
        self.engine.cancel();
        self.set_state(SpeakerState::Idle);
        current
    }

    /// Speak `text` sentence by sentence, preempting any sequence already
    /// playing. Returns [`SpeechError::Canceled`] if this call is itself
    /// preempted.
    pub async fn speak(&self, text: &str, voice: &VoiceProfile) -> Result<(), SpeechError> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(());
        }

        let generation = self.preempt();
        let mut rx = self.generation.subscribe();
        tracing::debug!(sentences = sentences.len(), generation, "Speaking");

        let result = self.play(&sentences, voice, generation, &mut rx).await;
        if *self.generation.borrow() == generation {
            self.set_state(SpeakerState::Idle);
        }
        result
    }

    async fn play(
        &self,
        sentences: &[String],
        voice: &VoiceProfile,
        generation: u64,
        rx: &mut watch::Receiver<u64>,
    ) -> Result<(), SpeechError> {
        for (i, sentence) in sentences.iter().enumerate() {
            self.set_state(SpeakerState::Speaking { sentence: i });
            guarded(rx, generation, tokio::time::sleep(self.timing.start_delay)).await?;

            let completion = self.engine.speak(Utterance {
                text: sentence.clone(),
                voice_id: voice.voice_id.clone(),
                lang: self.timing.lang.clone(),
                pitch: voice.pitch,
                rate: self.timing.rate,
            });

            if let Err(e) = guarded(rx, generation, self.await_sentence(completion)).await? {
                tracing::warn!(sentence = i, error = %e, "Sentence failed, continuing");
                guarded(rx, generation, tokio::time::sleep(SENTENCE_RETRY_DELAY)).await?;
                continue;
            }

            if i + 1 < sentences.len() {
                self.set_state(SpeakerState::Paused { next: i + 1 });
                let pause = self.timing.pause_after(sentence);
                guarded(rx, generation, tokio::time::sleep(pause)).await?;
            }
        }
        Ok(())
    }

    async fn await_sentence(&self, completion: Completion) -> Result<(), SpeechError> {
        let watchdog = self.watchdog();
        tokio::pin!(completion, watchdog);

        let done = tokio::select! {
            done = &mut completion => done,
            _ = &mut watchdog => completion.await,
        };
        done.unwrap_or_else(|_| Err(SpeechError::Synthesis("utterance dropped".to_string())))
    }

    /// Resume a stalled engine until the sentence ends or the window closes.
    async fn watchdog(&self) {
        let deadline = Instant::now() + self.timing.watchdog_window;
        let mut interval = tokio::time::interval(self.timing.watchdog_interval);
        loop {
            interval.tick().await;
            if Instant::now() >= deadline {
                return;
            }
            if self.engine.is_paused() {
                tracing::debug!("Synthesis paused, resuming");
                self.engine.resume();
            }
            if !self.engine.is_speaking() {
                return;
            }
        }
    }

    fn set_state(&self, state: SpeakerState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }
}

/// Run `fut` unless the generation moves past `generation` first.
async fn guarded<F: Future>(
    rx: &mut watch::Receiver<u64>,
    generation: u64,
    fut: F,
) -> Result<F::Output, SpeechError> {
    tokio::select! {
        biased;
        _ = superseded(rx, generation) => Err(SpeechError::Canceled),
        out = fut => Ok(out),
    }
}

async fn superseded(rx: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *rx.borrow_and_update() != generation {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// Mock
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSynthesisEvent {
    Started(String),
    Finished(String),
    Canceled,
}

#[derive(Default)]
struct MockSynthesisState {
    events: Vec<MockSynthesisEvent>,
    utterances: Vec<Utterance>,
    started_at: Vec<Instant>,
    speaking: bool,
    paused: bool,
    epoch: u64,
    resumes: usize,
}

/// Synthesis engine that "speaks" each utterance for a fixed duration.
///
/// With [`stall_on_start`](Self::stall_on_start) every utterance starts
/// paused and only progresses once resumed.
pub struct MockSynthesisEngine {
    voices: Vec<Voice>,
    duration: Duration,
    stall_on_start: bool,
    state: Arc<Mutex<MockSynthesisState>>,
}

impl MockSynthesisEngine {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            duration: Duration::from_millis(200),
            stall_on_start: false,
            state: Arc::new(Mutex::new(MockSynthesisState::default())),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn stall_on_start(mut self) -> Self {
        self.stall_on_start = true;
        self
    }

    pub fn events(&self) -> Vec<MockSynthesisEvent> {
        self.state.lock().map(|s| s.events.clone()).unwrap_or_default()
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.state
            .lock()
            .map(|s| s.utterances.clone())
            .unwrap_or_default()
    }

    /// When each utterance was handed to the engine.
    pub fn start_times(&self) -> Vec<Instant> {
        self.state
            .lock()
            .map(|s| s.started_at.clone())
            .unwrap_or_default()
    }

    pub fn resume_count(&self) -> usize {
        self.state.lock().map(|s| s.resumes).unwrap_or(0)
    }

    /// Texts that finished playing, in order.
    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockSynthesisEvent::Finished(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl SynthesisEngine for MockSynthesisEngine {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance) -> Completion {
        let (tx, rx) = oneshot::channel();
        let text = utterance.text.clone();
        let epoch = match self.state.lock() {
            Ok(mut s) => {
                s.events.push(MockSynthesisEvent::Started(text.clone()));
                s.utterances.push(utterance);
                s.started_at.push(Instant::now());
                s.speaking = true;
                s.paused = self.stall_on_start;
                s.epoch
            }
            Err(_) => return rx,
        };

        let state = Arc::clone(&self.state);
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            loop {
                let outcome = {
                    let Ok(mut s) = state.lock() else { return };
                    if s.epoch != epoch {
                        Some(Err(SpeechError::Canceled))
                    } else if !s.paused {
                        s.speaking = false;
                        s.events.push(MockSynthesisEvent::Finished(text.clone()));
                        Some(Ok(()))
                    } else {
                        None
                    }
                };
                match outcome {
                    Some(result) => {
                        let _ = tx.send(result);
                        return;
                    }
                    None => tokio::time::sleep(Duration::from_millis(50)).await,
                }
            }
        });
        rx
    }

    fn cancel(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.epoch += 1;
            if s.speaking {
                s.events.push(MockSynthesisEvent::Canceled);
            }
            s.speaking = false;
            s.paused = false;
        }
    }

    fn is_speaking(&self) -> bool {
        self.state.lock().map(|s| s.speaking).unwrap_or(false)
    }

    fn is_paused(&self) -> bool {
        self.state.lock().map(|s| s.paused).unwrap_or(false)
    }

    fn resume(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.paused = false;
            s.resumes += 1;
        }
    }
}
