use crate::error::EngineError;
use std::time::Duration;

/// Configuration for the game session engine.
///
/// Contest rules are fixed at process start and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Length of the click window once the session starts. Default: 60s.
    pub session_duration: Duration,
    /// Longest gap allowed between consecutive clicks (and between joining
    /// and the first click) before a participant is disqualified. Default: 10s.
    pub inactive_timeout: Duration,
    /// Clicks allowed inside the trailing one-second window anchored at each
    /// click's own timestamp. One more disqualifies. Default: 4.
    pub max_clicks_per_second: u32,
    /// Coordinator mailbox capacity. Senders fail fast with `MailboxFull`
    /// once this many requests are queued. Default: 1024.
    pub mailbox_capacity: usize,
    /// How long a caller waits for its matched reply before giving up, so a
    /// disconnecting ingress unit cannot leak a pending request. Default: 5s.
    pub reply_timeout: Duration,
}

impl EngineConfig {
    /// Validate configuration values. Returns an error if any value is invalid.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.session_duration.is_zero() {
            return Err(EngineError::InvalidConfig {
                reason: "session_duration must be > 0".to_string(),
            });
        }
        if self.inactive_timeout.is_zero() {
            return Err(EngineError::InvalidConfig {
                reason: "inactive_timeout must be > 0".to_string(),
            });
        }
        if self.max_clicks_per_second == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "max_clicks_per_second must be >= 1".to_string(),
            });
        }
        if self.mailbox_capacity == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "mailbox_capacity must be >= 1".to_string(),
            });
        }
        if self.reply_timeout.is_zero() {
            return Err(EngineError::InvalidConfig {
                reason: "reply_timeout must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_duration: Duration::from_secs(60),
            inactive_timeout: Duration::from_secs(10),
            max_clicks_per_second: 4,
            mailbox_capacity: 1024,
            reply_timeout: Duration::from_secs(5),
        }
    }
}
