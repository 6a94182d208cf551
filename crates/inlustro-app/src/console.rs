//! Terminal stand-ins for the host surfaces a browser would provide.

use std::time::Duration;

use inlustro_chat::{ConversationSession, Navigator, Notification, NotificationKind, Notifier};
use inlustro_core::Route;
use inlustro_speech::{RecognitionEngine, RecognitionProvider};

/// Prints notifications to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => {
                eprintln!("[{}] {}", notification.title, notification.description)
            }
            NotificationKind::Info => {
                eprintln!("({}) {}", notification.title, notification.description)
            }
        }
    }
}

/// Reports route changes; the console has no pages to open.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        println!("-> navigating to {}", route.path());
    }
}

/// The terminal has no microphone engine.
pub struct NoRecognition;

impl RecognitionProvider for NoRecognition {
    fn create(&self) -> Option<Box<dyn RecognitionEngine>> {
        None
    }
}

/// Print assistant messages as they land in the transcript.
pub async fn print_transcript(session: ConversationSession) {
    let mut printed = 0;
    let mut interval = tokio::time::interval(Duration::from_millis(100));
    loop {
        interval.tick().await;
        let transcript = session.transcript();
        for message in transcript.iter().skip(printed) {
            if message.is_from_assistant {
                println!("[{}] assistant: {}", message.timestamp, message.text);
            }
        }
        printed = transcript.len();
    }
}
