//! Conversation sessions for the assistant widget and the chat page.
//!
//! A [`ConversationSession`] keeps the transcript, paces replies and
//! follow-ups, and routes spoken playback through the speech adapter.
//! Replies come from a [`Responder`]: the local dialogue engine for the
//! widget, the remote gateway for the page.

pub mod error;
pub mod ports;
pub mod session;

pub use error::ChatError;
pub use ports::{
    DialogueResponder, GatewayResponder, Navigator, Notification, NotificationKind, Notifier,
    RecordingNavigator, RecordingNotifier, Responder,
};
pub use session::{ConversationSession, OutgoingFile, Surface};
