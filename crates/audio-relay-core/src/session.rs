use std::fmt;

use chrono::Utc;
use uuid::Uuid;

/// Identifier generated once per process, used to namespace uploaded object
/// names. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate `audio_session_<unix_ms>_<random>`.
    pub fn generate() -> Self {
        Self(format!(
            "audio_session_{}_{}",
            Utc::now().timestamp_millis(),
            short_random()
        ))
    }

    /// Wrap an existing identifier.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Eight hex characters of randomness.
pub(crate) fn short_random() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(8);
    simple
}
