pub mod config;
pub mod error;
pub mod prefs;
pub mod types;

pub use config::InlustroConfig;
pub use error::{InlustroError, Result};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use types::*;
