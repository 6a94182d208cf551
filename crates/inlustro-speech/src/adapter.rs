//! One owned handle over recognition and synthesis.
//!
//! Listening and speaking are mutually exclusive: starting one cancels the
//! other. Voice preferences live in an explicit [`VoiceSettings`] value,
//! persisted through an injected [`PreferenceStore`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use inlustro_core::config::SpeechConfig;
use inlustro_core::{PreferenceStore, VoiceGender, VoiceSettings};

use crate::error::SpeechError;
use crate::recognition::{RecognitionProvider, Recognizer};
use crate::synthesis::{
    resolve_voice, Speaker, SpeechTiming, SynthesisEngine, Voice, VoiceProfile,
};

pub struct SpeechAdapter {
    recognizer: Recognizer,
    speaker: Option<Speaker>,
    settings: Mutex<VoiceSettings>,
    prefs: Arc<dyn PreferenceStore>,
    visible: AtomicBool,
    recognition_reported: AtomicBool,
    synthesis_reported: AtomicBool,
}

impl SpeechAdapter {
    /// Build an adapter. `synthesis` is `None` on hosts without a
    /// synthesis engine; the first `speak` then reports
    /// [`SpeechError::Unsupported`] and later calls are silent no-ops.
    pub fn new(
        recognition: Arc<dyn RecognitionProvider>,
        synthesis: Option<Arc<dyn SynthesisEngine>>,
        prefs: Arc<dyn PreferenceStore>,
        config: &SpeechConfig,
    ) -> Self {
        let settings = VoiceSettings::load(prefs.as_ref());
        let timing = SpeechTiming::from_config(config);
        let speaker = synthesis.map(|engine| Speaker::new(engine, timing));

        let adapter = Self {
            recognizer: Recognizer::new(recognition, config),
            speaker,
            settings: Mutex::new(settings),
            prefs,
            visible: AtomicBool::new(true),
            recognition_reported: AtomicBool::new(false),
            synthesis_reported: AtomicBool::new(false),
        };
        adapter.refresh_voice();
        adapter
    }

    pub fn recognition_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    /// True on the first call only. Hosts show the missing-recognition
    /// notice once and keep voice input quietly disabled afterwards.
    pub fn report_unsupported_recognition(&self) -> bool {
        !self.recognition_supported() && !self.recognition_reported.swap(true, Ordering::SeqCst)
    }

    pub fn synthesis_supported(&self) -> bool {
        self.speaker.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.recognizer.is_listening()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaker.as_ref().is_some_and(Speaker::is_speaking)
    }

    pub fn settings(&self) -> VoiceSettings {
        self.settings
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn is_muted(&self) -> bool {
        self.settings().muted
    }

    /// Voices offered by the synthesis engine, for a settings surface.
    pub fn voices(&self) -> Vec<Voice> {
        self.speaker.as_ref().map(Speaker::voices).unwrap_or_default()
    }

    /// Listen for one utterance. Any speech in progress is cut off first.
    pub async fn listen(&self) -> Result<String, SpeechError> {
        self.stop_speaking();
        self.recognizer.listen().await
    }

    pub fn stop_listening(&self) {
        self.recognizer.stop_listening();
    }

    /// Speak `text` unless muted, disabled, or hidden. Stops listening
    /// first so the assistant does not hear itself.
    pub async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let Some(speaker) = &self.speaker else {
            if self.synthesis_reported.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            tracing::warn!("Speech synthesis unavailable");
            return Err(SpeechError::Unsupported("speech synthesis".to_string()));
        };
        let settings = self.settings();
        if settings.muted || !settings.enabled || !self.visible.load(Ordering::SeqCst) {
            tracing::debug!(muted = settings.muted, "Skipping speech");
            return Ok(());
        }
        if text.trim().is_empty() {
            return Ok(());
        }

        self.recognizer.stop_listening();
        let profile = VoiceProfile {
            voice_id: settings.selected_voice_id.clone(),
            pitch: settings.gender.pitch(),
        };
        speaker.speak(text, &profile).await
    }

    pub fn stop_speaking(&self) {
        if let Some(speaker) = &self.speaker {
            speaker.cancel();
        }
    }

    /// Mute or unmute. Muting cancels speech in progress.
    pub fn set_muted(&self, muted: bool) -> Result<(), SpeechError> {
        if muted {
            self.stop_speaking();
        }
        self.update(|s| s.muted = muted)
    }

    /// Enable or disable spoken responses for this session.
    pub fn set_enabled(&self, enabled: bool) {
        if !enabled {
            self.stop_speaking();
        }
        if let Ok(mut s) = self.settings.lock() {
            s.enabled = enabled;
        }
    }

    pub fn set_gender(&self, gender: VoiceGender) -> Result<(), SpeechError> {
        self.update(|s| {
            s.gender = gender;
            s.selected_voice_id = None;
        })?;
        self.refresh_voice();
        Ok(())
    }

    /// Pick a specific voice by id. Unknown ids are ignored.
    pub fn select_voice(&self, voice_id: &str) {
        if !self.voices().iter().any(|v| v.id == voice_id) {
            tracing::warn!(voice_id, "Unknown voice id");
            return;
        }
        if let Ok(mut s) = self.settings.lock() {
            s.selected_voice_id = Some(voice_id.to_string());
        }
    }

    /// Host visibility changed. Never speak while hidden.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        if !visible {
            self.stop_speaking();
        }
    }

    /// Re-derive the selected voice from the engine's current voice list.
    pub fn refresh_voice(&self) {
        let voices = self.voices();
        if let Ok(mut s) = self.settings.lock() {
            let chosen = resolve_voice(&voices, &s).map(|v| v.id.clone());
            s.selected_voice_id = chosen;
        }
    }

    fn update(&self, apply: impl FnOnce(&mut VoiceSettings)) -> Result<(), SpeechError> {
        let snapshot = {
            let mut s = self
                .settings
                .lock()
                .map_err(|e| SpeechError::Preferences(e.to_string()))?;
            apply(&mut *s);
            s.clone()
        };
        snapshot.persist(self.prefs.as_ref())?;
        Ok(())
    }
}
