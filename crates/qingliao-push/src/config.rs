//! Dispatcher policy loaded from environment variables.
//!
//! Defaults are what the hosted service runs with, so tests and local
//! development need no configuration.

/// Maximum message content size in bytes (256 KiB)
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 262_144;

/// Number of recent message ids remembered for retry detection
pub const DEFAULT_DEDUP_WINDOW: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    /// Whether a user may send a direct message to themselves.
    /// Env: `ALLOW_SELF_MESSAGE` (true/false)
    /// Default: `false`
    pub allow_self_message: bool,

    /// Upper bound on message content, in bytes.
    /// Env: `MAX_CONTENT_BYTES`
    /// Default: 256 KiB
    pub max_content_bytes: usize,

    /// How many accepted messages the dispatcher keeps. A retry of an id that
    /// has left the window is treated as a new message.
    /// Env: `DEDUP_WINDOW`
    /// Default: `10000`
    pub dedup_window: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            allow_self_message: false,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            dedup_window: DEFAULT_DEDUP_WINDOW,
        }
    }
}

impl PushConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = var("ALLOW_SELF_MESSAGE") {
            config.allow_self_message = val == "true" || val == "1";
        }

        if let Some(val) = var("MAX_CONTENT_BYTES") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_content_bytes = n,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid MAX_CONTENT_BYTES, using default"
                    );
                }
            }
        }

        if let Some(val) = var("DEDUP_WINDOW") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.dedup_window = n,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid DEDUP_WINDOW, using default"
                    );
                }
            }
        }

        config
    }
}
