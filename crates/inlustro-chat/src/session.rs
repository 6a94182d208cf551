//! Conversation session: transcript, spoken playback and pacing for one
//! assistant surface.
//!
//! Two surfaces share this type. The floating [`Surface::Widget`] answers
//! locally and starts inactive. The
//! dedicated [`Surface::Page`] talks to the remote endpoint, is always
//! active and opens with a greeting that is spoken only after the first
//! user interaction.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use inlustro_core::config::SessionConfig;
use inlustro_core::{Attachment, ChatMessage, Route};
use inlustro_dialogue::Reply;
use inlustro_extract::Upload;
use inlustro_speech::{SpeechAdapter, SpeechError};

use crate::error::ChatError;
use crate::ports::{Navigator, Notification, Notifier, Responder};

pub const SEND_FAILED: &str = "Failed to send message. Please try again.";
pub const LISTENING: &str = "I'm listening...";
pub const VOICE_CANCELED: &str = "Voice command canceled. How else can I help you?";
pub const NO_SPEECH: &str = "I didn't hear anything. Please try again.";
pub const RECOGNITION_FAILED: &str =
    "Sorry, I had trouble understanding. Please try again or use text input.";
pub const RECOGNITION_UNSUPPORTED: &str =
    "Sorry, speech recognition is not supported in your browser.";
pub const SYNTHESIS_UNSUPPORTED: &str = "Speech synthesis not supported in this browser";

/// Delay before a queued message is handed to the speech adapter.
const SPEAK_DELAY: Duration = Duration::from_millis(300);
/// Delay before a follow-up is spoken after it appears.
const FOLLOW_UP_SPEAK_DELAY: Duration = Duration::from_millis(1_000);
/// How often the follow-up waits for the primary response to finish.
const SPEECH_POLL: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Widget,
    Page,
}

/// A user attachment together with the preview URL the host assigned it.
#[derive(Debug, Clone)]
pub struct OutgoingFile {
    pub upload: Upload,
    pub url: String,
}

impl OutgoingFile {
    fn attachment(&self) -> Attachment {
        Attachment {
            name: self.upload.name.clone(),
            url: self.url.clone(),
            mime_type: self.upload.mime_type.clone(),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    transcript: Vec<ChatMessage>,
    current_response: Option<String>,
    pending_spoken: Option<String>,
    has_user_interacted: bool,
    is_active: bool,
    next_id: u64,
}

impl SessionState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

struct Inner {
    surface: Surface,
    responder: Arc<dyn Responder>,
    speech: Arc<SpeechAdapter>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

/// Handle to one conversation. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ConversationSession {
    inner: Arc<Inner>,
}

impl ConversationSession {
    /// Floating assistant widget. Starts inactive.
    pub fn widget(
        responder: Arc<dyn Responder>,
        speech: Arc<SpeechAdapter>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        let state = SessionState {
            transcript: Vec::new(),
            current_response: None,
            pending_spoken: None,
            has_user_interacted: false,
            is_active: false,
            next_id: 0,
        };
        Self::build(Surface::Widget, responder, speech, notifier, navigator, config, state)
    }

    /// Dedicated chat page. Always active; opens with the greeting, which
    /// waits in the spoken slot until the user first interacts.
    pub fn page(
        responder: Arc<dyn Responder>,
        speech: Arc<SpeechAdapter>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        let greeting = config.page_greeting.clone();
        let state = SessionState {
            transcript: vec![ChatMessage::assistant(1, greeting.clone())],
            current_response: Some(greeting.clone()),
            pending_spoken: Some(greeting),
            has_user_interacted: false,
            is_active: true,
            next_id: 1,
        };
        Self::build(Surface::Page, responder, speech, notifier, navigator, config, state)
    }

    fn build(
        surface: Surface,
        responder: Arc<dyn Responder>,
        speech: Arc<SpeechAdapter>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
        state: SessionState,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                surface,
                responder,
                speech,
                notifier,
                navigator,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn surface(&self) -> Surface {
        self.inner.surface
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.with_state(|s| s.transcript.clone())
    }

    /// Latest assistant text shown in the response slot.
    pub fn current_response(&self) -> Option<String> {
        self.with_state(|s| s.current_response.clone())
    }

    /// Text waiting to be spoken.
    pub fn pending_spoken(&self) -> Option<String> {
        self.with_state(|s| s.pending_spoken.clone())
    }

    pub fn has_user_interacted(&self) -> bool {
        self.with_state(|s| s.has_user_interacted)
    }

    pub fn is_active(&self) -> bool {
        self.with_state(|s| s.is_active)
    }

    pub fn speech(&self) -> &Arc<SpeechAdapter> {
        &self.inner.speech
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Record a user gesture. Releases anything waiting in the spoken slot.
    pub fn interact(&self) {
        let first = self.with_state(|s| {
            let first = !s.has_user_interacted;
            s.has_user_interacted = true;
            first
        });
        if first {
            tracing::debug!(surface = ?self.inner.surface, "First user interaction");
            if let Some(text) = self.pending_spoken() {
                self.speak_later(text, Duration::ZERO);
            }
        }
    }

    /// Turn the widget on and post the welcome and introduction.
    pub fn activate(&self) {
        let already = self.with_state(|s| {
            let already = s.is_active;
            s.is_active = true;
            s.has_user_interacted = true;
            already
        });
        if already {
            return;
        }
        tracing::info!(surface = ?self.inner.surface, "Assistant activated");

        let session = self.clone();
        tokio::spawn(async move {
            let config = &session.inner.config;
            tokio::time::sleep(SPEAK_DELAY).await;
            if !session.is_active() {
                return;
            }
            session.post_assistant(config.widget_welcome.clone());
            session.speak_later(config.widget_welcome.clone(), SPEAK_DELAY);

            tokio::time::sleep(Duration::from_millis(config.follow_up_gap_ms)).await;
            if !session.is_active() {
                return;
            }
            session.post_assistant(config.widget_introduction.clone());
            session.speak_later(config.widget_introduction.clone(), FOLLOW_UP_SPEAK_DELAY);
        });
    }

    /// Turn the widget off, silencing speech and listening.
    pub fn deactivate(&self) {
        if self.inner.surface == Surface::Page {
            return;
        }
        self.with_state(|s| {
            s.is_active = false;
            s.pending_spoken = None;
        });
        self.inner.speech.stop_speaking();
        self.inner.speech.stop_listening();
        tracing::info!("Assistant deactivated");
    }

    pub fn set_muted(&self, muted: bool) -> Result<(), ChatError> {
        self.inner.speech.set_muted(muted)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sending
    // -------------------------------------------------------------------------

    /// Send a typed (or transcribed) message and append the reply.
    ///
    /// On responder failure an error notification is shown and the user
    /// message stays in the transcript.
    pub async fn send_text(&self, text: &str, file: Option<OutgoingFile>) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() && file.is_none() {
            return Err(ChatError::EmptyMessage);
        }
        if !self.is_active() {
            tracing::debug!("Message ignored: assistant inactive");
            return Err(ChatError::Inactive);
        }

        self.inner.speech.stop_speaking();
        let attachment = file.as_ref().map(OutgoingFile::attachment);
        self.with_state(|s| {
            s.has_user_interacted = true;
            s.pending_spoken = None;
            let id = s.next_id();
            s.transcript.push(ChatMessage::user(id, text, attachment));
        });

        let upload = file.as_ref().map(|f| &f.upload);
        let reply = match self.inner.responder.respond(text, upload).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "Sending message failed");
                self.inner.notifier.notify(Notification::error(SEND_FAILED));
                return Err(e);
            }
        };

        tokio::time::sleep(Duration::from_millis(self.inner.config.reply_delay_ms)).await;
        self.deliver(reply);
        Ok(())
    }

    /// Listen for one utterance and send it as a message.
    pub async fn send_voice(&self) -> Result<(), ChatError> {
        if !self.is_active() {
            return Err(ChatError::Inactive);
        }
        self.with_state(|s| {
            s.has_user_interacted = true;
            s.pending_spoken = None;
        });

        if !self.inner.speech.recognition_supported() {
            if self.inner.speech.report_unsupported_recognition() {
                self.set_current(RECOGNITION_UNSUPPORTED);
                self.inner
                    .notifier
                    .notify(Notification::error(RECOGNITION_UNSUPPORTED));
            }
            return Err(SpeechError::Unsupported("speech recognition".to_string()).into());
        }

        self.set_current(LISTENING);
        match self.inner.speech.listen().await {
            Ok(transcript) => {
                tracing::info!(transcript = %transcript, "Voice input received");
                self.send_text(&transcript, None).await
            }
            Err(SpeechError::NoSpeech) => {
                self.set_current(NO_SPEECH);
                self.speak_later(NO_SPEECH.to_string(), Duration::ZERO);
                Err(SpeechError::NoSpeech.into())
            }
            Err(SpeechError::Canceled) => {
                self.set_current(VOICE_CANCELED);
                Err(SpeechError::Canceled.into())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Voice input failed");
                self.set_current(RECOGNITION_FAILED);
                self.inner
                    .notifier
                    .notify(Notification::error(RECOGNITION_FAILED));
                Err(e.into())
            }
        }
    }

    /// Cancel listening started by [`send_voice`](Self::send_voice).
    pub fn stop_listening(&self) {
        self.inner.speech.stop_listening();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn deliver(&self, reply: Reply) {
        let Reply {
            response,
            follow_up,
            navigate,
        } = reply;

        self.post_assistant(response.clone());
        self.speak_later(response, Duration::ZERO);

        if let Some(route) = navigate {
            self.navigate_later(route);
        }
        if let Some(text) = follow_up {
            self.follow_up_later(text);
        }
    }

    fn post_assistant(&self, text: String) {
        self.with_state(|s| {
            let id = s.next_id();
            s.transcript.push(ChatMessage::assistant(id, text.clone()));
            s.current_response = Some(text);
        });
    }

    fn set_current(&self, text: &str) {
        self.with_state(|s| s.current_response = Some(text.to_string()));
    }

    /// Queue `text` in the spoken slot and speak it after `delay` if the
    /// user has interacted by then and nothing newer replaced it.
    fn speak_later(&self, text: String, delay: Duration) {
        self.with_state(|s| s.pending_spoken = Some(text.clone()));

        let session = self.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let ready = session.with_state(|s| {
                if s.has_user_interacted && s.pending_spoken.as_deref() == Some(text.as_str()) {
                    s.pending_spoken = None;
                    true
                } else {
                    false
                }
            });
            if !ready {
                return;
            }
            match session.inner.speech.speak(&text).await {
                Ok(()) | Err(SpeechError::Canceled) => {}
                Err(SpeechError::Unsupported(_)) => session
                    .inner
                    .notifier
                    .notify(Notification::error(SYNTHESIS_UNSUPPORTED)),
                Err(e) => tracing::warn!(error = %e, "Speech playback failed"),
            }
        });
    }

    fn navigate_later(&self, route: Route) {
        let session = self.clone();
        let delay = Duration::from_millis(self.inner.config.navigation_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::info!(route = %route, "Navigating");
            session.inner.navigator.navigate(route);
        });
    }

    /// Post a follow-up once the primary response has finished speaking.
    fn follow_up_later(&self, text: String) {
        let session = self.clone();
        tokio::spawn(async move {
            let config = &session.inner.config;
            tokio::time::sleep(Duration::from_millis(config.follow_up_delay_ms)).await;
            while session.inner.speech.is_speaking() {
                tokio::time::sleep(SPEECH_POLL).await;
            }
            tokio::time::sleep(Duration::from_millis(config.follow_up_gap_ms)).await;
            if !session.is_active() {
                return;
            }
            session.post_assistant(text.clone());
            session.speak_later(text, FOLLOW_UP_SPEAK_DELAY);
        });
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut guard = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{DialogueResponder, RecordingNavigator, RecordingNotifier};
    use async_trait::async_trait;
    use inlustro_core::config::SpeechConfig;
    use inlustro_core::MemoryPreferenceStore;
    use inlustro_extract::TEXT_MIME;
    use inlustro_speech::{
        MockRecognitionProvider, MockSynthesisEngine, RecognitionEvent, SynthesisEngine, Voice,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Responder that replays fixed replies, or fails.
    struct ScriptedResponder {
        reply: Option<Reply>,
        calls: AtomicUsize,
        seen_files: Mutex<Vec<String>>,
    }

    impl ScriptedResponder {
        fn replying(reply: Reply) -> Self {
            Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
                seen_files: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
                seen_files: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Responder for ScriptedResponder {
        async fn respond(&self, _text: &str, file: Option<&Upload>) -> Result<Reply, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(f) = file {
                self.seen_files.lock().unwrap().push(f.name.clone());
            }
            self.reply
                .clone()
                .ok_or_else(|| ChatError::Responder("backend down".to_string()))
        }
    }

    struct Harness {
        session: ConversationSession,
        engine: Arc<MockSynthesisEngine>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(
        surface: Surface,
        responder: Arc<dyn Responder>,
        script: Option<Vec<RecognitionEvent>>,
    ) -> Harness {
        let engine = Arc::new(MockSynthesisEngine::new(vec![Voice::new(
            "f",
            "English Female",
            "en-US",
        )]));
        let recognition = match script {
            Some(script) => MockRecognitionProvider::new(script),
            None => MockRecognitionProvider::unsupported(),
        };
        let speech = Arc::new(SpeechAdapter::new(
            Arc::new(recognition),
            Some(Arc::clone(&engine) as Arc<dyn SynthesisEngine>),
            Arc::new(MemoryPreferenceStore::new()),
            &SpeechConfig::default(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let config = SessionConfig::default();
        let session = match surface {
            Surface::Widget => ConversationSession::widget(
                responder,
                speech,
                notifier.clone(),
                navigator.clone(),
                config,
            ),
            Surface::Page => ConversationSession::page(
                responder,
                speech,
                notifier.clone(),
                navigator.clone(),
                config,
            ),
        };
        Harness {
            session,
            engine,
            notifier,
            navigator,
        }
    }

    fn assistant_texts(session: &ConversationSession) -> Vec<String> {
        session
            .transcript()
            .into_iter()
            .filter(|m| m.is_from_assistant)
            .map(|m| m.text)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_opens_with_unspoken_greeting() {
        let h = harness(
            Surface::Page,
            Arc::new(ScriptedResponder::replying(Reply::new("ok"))),
            None,
        );
        let greeting = SessionConfig::default().page_greeting;

        assert_eq!(assistant_texts(&h.session), vec![greeting.clone()]);
        assert!(h.session.is_active());
        assert!(!h.session.has_user_interacted());
        assert_eq!(h.session.pending_spoken(), Some(greeting.clone()));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.engine.utterances().is_empty());

        h.session.interact();
        tokio::time::sleep(Duration::from_secs(30)).await;
        let spoken: Vec<String> = h.engine.utterances().into_iter().map(|u| u.text).collect();
        assert_eq!(spoken.first().map(String::as_str), Some("Hello!"));
        assert!(h.session.pending_spoken().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_send_appends_user_then_reply() {
        let h = harness(
            Surface::Page,
            Arc::new(ScriptedResponder::replying(Reply::new("Backend says hi."))),
            None,
        );

        h.session.send_text("  hello backend ", None).await.unwrap();

        let transcript = h.session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].text, "hello backend");
        assert!(!transcript[1].is_from_assistant);
        assert_eq!(transcript[2].text, "Backend says hi.");
        assert!(transcript[2].is_from_assistant);
        assert!(transcript[1].id < transcript[2].id);
        assert!(h.session.has_user_interacted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_first_skips_greeting_speech() {
        let h = harness(
            Surface::Page,
            Arc::new(ScriptedResponder::replying(Reply::new("Reply one."))),
            None,
        );

        h.session.send_text("hi", None).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let spoken: Vec<String> = h.engine.utterances().into_iter().map(|u| u.text).collect();
        assert_eq!(spoken, vec!["Reply one.".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_is_delayed() {
        let h = harness(
            Surface::Page,
            Arc::new(ScriptedResponder::replying(Reply::new("Later."))),
            None,
        );
        let session = h.session.clone();
        let task = tokio::spawn(async move { session.send_text("question", None).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.session.transcript().len(), 2);

        task.await.unwrap().unwrap();
        assert_eq!(h.session.transcript().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_notifies_without_rollback() {
        let h = harness(Surface::Page, Arc::new(ScriptedResponder::failing()), None);

        let err = h.session.send_text("hello?", None).await.unwrap_err();
        assert!(matches!(err, ChatError::Responder(_)));

        let transcript = h.session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].text, "hello?");
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::error(SEND_FAILED)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_attachment_recorded_and_forwarded() {
        let responder = Arc::new(ScriptedResponder::replying(Reply::new("Got it.")));
        let h = harness(Surface::Page, responder.clone(), None);
        let file = OutgoingFile {
            upload: Upload::new("notes.txt", TEXT_MIME, b"hello world".to_vec()),
            url: "file:///tmp/notes.txt".to_string(),
        };

        h.session.send_text("read this", Some(file)).await.unwrap();

        let attachment = h.session.transcript()[1].attachment.clone().unwrap();
        assert_eq!(attachment.name, "notes.txt");
        assert_eq!(attachment.url, "file:///tmp/notes.txt");
        assert_eq!(attachment.mime_type, TEXT_MIME);
        assert_eq!(*responder.seen_files.lock().unwrap(), vec!["notes.txt".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_message_rejected() {
        let responder = Arc::new(ScriptedResponder::replying(Reply::new("x")));
        let h = harness(Surface::Page, responder.clone(), None);
        assert!(matches!(
            h.session.send_text("   ", None).await,
            Err(ChatError::EmptyMessage)
        ));
        assert_eq!(responder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_widget_ignores_messages() {
        let responder = Arc::new(ScriptedResponder::replying(Reply::new("x")));
        let h = harness(Surface::Widget, responder.clone(), None);
        assert!(matches!(
            h.session.send_text("hello", None).await,
            Err(ChatError::Inactive)
        ));
        assert_eq!(responder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_widget_activation_posts_welcome_then_introduction() {
        let h = harness(Surface::Widget, Arc::new(DialogueResponder::new()), None);
        let config = SessionConfig::default();

        h.session.activate();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(assistant_texts(&h.session), vec![config.widget_welcome.clone()]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            assistant_texts(&h.session),
            vec![config.widget_welcome, config.widget_introduction.clone()]
        );
        assert_eq!(h.session.current_response(), Some(config.widget_introduction));
    }

    #[tokio::test(start_paused = true)]
    async fn test_widget_navigation_after_delay() {
        let h = harness(Surface::Widget, Arc::new(DialogueResponder::new()), None);
        h.session.activate();
        tokio::time::sleep(Duration::from_secs(3)).await;

        h.session.send_text("take me to the admin login", None).await.unwrap();
        assert!(h.navigator.routes().is_empty());

        tokio::time::sleep(Duration::from_millis(1_600)).await;
        assert_eq!(h.navigator.routes(), vec![Route::AdminLogin]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_widget_records_both_sides() {
        let h = harness(Surface::Widget, Arc::new(DialogueResponder::new()), None);
        h.session.activate();
        tokio::time::sleep(Duration::from_secs(3)).await;

        h.session.send_text("what does it cost", None).await.unwrap();
        let transcript = h.session.transcript();
        let user: Vec<&ChatMessage> = transcript.iter().filter(|m| !m.is_from_assistant).collect();
        assert_eq!(user.len(), 1);
        assert_eq!(user[0].text, "what does it cost");

        let last = transcript.last().unwrap();
        assert!(last.is_from_assistant);
        assert!(last.text.contains("pricing"));
        assert!(user[0].id < last.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_up_posted_after_response() {
        let reply = Reply::new("Main answer.").follow_up("Anything else?");
        let h = harness(
            Surface::Page,
            Arc::new(ScriptedResponder::replying(reply)),
            None,
        );

        h.session.send_text("question", None).await.unwrap();
        assert_eq!(assistant_texts(&h.session).len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let texts = assistant_texts(&h.session);
        assert_eq!(texts.last().map(String::as_str), Some("Anything else?"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            h.engine.finished(),
            vec!["Main answer.".to_string(), "Anything else?".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_silences() {
        let h = harness(Surface::Widget, Arc::new(DialogueResponder::new()), None);
        h.session.activate();
        tokio::time::sleep(Duration::from_millis(700)).await;
        h.session.deactivate();

        assert!(!h.session.is_active());
        assert!(!h.session.speech().is_speaking());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(assistant_texts(&h.session).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_send_uses_transcript() {
        let h = harness(
            Surface::Widget,
            Arc::new(DialogueResponder::new()),
            Some(vec![RecognitionEvent::Result {
                transcript: "what does it cost".to_string(),
                is_final: true,
            }]),
        );
        h.session.activate();
        tokio::time::sleep(Duration::from_secs(3)).await;

        h.session.send_voice().await.unwrap();
        let current = h.session.current_response().unwrap();
        assert!(current.contains("pricing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_unsupported_notifies() {
        let h = harness(Surface::Page, Arc::new(DialogueResponder::new()), None);
        let err = h.session.send_voice().await.unwrap_err();

        assert!(matches!(err, ChatError::Speech(SpeechError::Unsupported(_))));
        assert_eq!(
            h.session.current_response().as_deref(),
            Some(RECOGNITION_UNSUPPORTED)
        );
        assert_eq!(h.notifier.notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_unsupported_reported_once() {
        let h = harness(Surface::Page, Arc::new(DialogueResponder::new()), None);
        for _ in 0..3 {
            let err = h.session.send_voice().await.unwrap_err();
            assert!(matches!(err, ChatError::Speech(SpeechError::Unsupported(_))));
        }
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::error(RECOGNITION_UNSUPPORTED)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_synthesis_reported_once() {
        let speech = Arc::new(SpeechAdapter::new(
            Arc::new(MockRecognitionProvider::unsupported()),
            None,
            Arc::new(MemoryPreferenceStore::new()),
            &SpeechConfig::default(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let session = ConversationSession::page(
            Arc::new(ScriptedResponder::replying(Reply::new("Printed only."))),
            speech,
            notifier.clone(),
            Arc::new(RecordingNavigator::new()),
            SessionConfig::default(),
        );

        session.interact();
        session.send_text("first", None).await.unwrap();
        session.send_text("second", None).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            notifier.notifications(),
            vec![Notification::error(SYNTHESIS_UNSUPPORTED)]
        );
        assert_eq!(assistant_texts(&session).last().map(String::as_str), Some("Printed only."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_timeout_message() {
        let h = harness(Surface::Page, Arc::new(DialogueResponder::new()), Some(vec![]));
        let err = h.session.send_voice().await.unwrap_err();

        assert!(matches!(err, ChatError::Speech(SpeechError::NoSpeech)));
        assert_eq!(h.session.current_response().as_deref(), Some(NO_SPEECH));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_listening_reports_cancel() {
        let h = harness(Surface::Page, Arc::new(DialogueResponder::new()), Some(vec![]));
        let session = h.session.clone();
        let task = tokio::spawn(async move { session.send_voice().await });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.session.current_response().as_deref(), Some(LISTENING));
        h.session.stop_listening();

        assert!(matches!(
            task.await.unwrap(),
            Err(ChatError::Speech(SpeechError::Canceled))
        ));
        assert_eq!(h.session.current_response().as_deref(), Some(VOICE_CANCELED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_muted_session_posts_but_stays_silent() {
        let h = harness(
            Surface::Page,
            Arc::new(ScriptedResponder::replying(Reply::new("Quiet."))),
            None,
        );
        h.session.set_muted(true).unwrap();
        h.session.send_text("hi", None).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(assistant_texts(&h.session).last().map(String::as_str), Some("Quiet."));
        assert!(h.engine.utterances().is_empty());
    }
}
