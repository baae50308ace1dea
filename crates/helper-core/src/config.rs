use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// What to do with a chat reply that arrives after the user switched
/// sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReplyPolicy {
    /// Append to whichever session is current when the reply fires.
    #[default]
    ApplyToCurrent,
    /// Append to the session that asked, without touching suggestions.
    OriginSession,
    Discard,
}

impl StaleReplyPolicy {
    pub fn label(self) -> &'static str {
        match self {
            Self::ApplyToCurrent => "apply_to_current",
            Self::OriginSession => "origin_session",
            Self::Discard => "discard",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub store_path: Option<PathBuf>,
    pub reply_delay_ms: u64,
    pub stale_reply_policy: StaleReplyPolicy,
    pub max_output_bytes: usize,
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            reply_delay_ms: 1_500,
            stale_reply_policy: StaleReplyPolicy::default(),
            max_output_bytes: 1024 * 1024,
            log_filter: None,
        }
    }
}

impl AppConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}
