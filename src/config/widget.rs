use std::time::Duration;

use crate::cli::Args;

/// Runtime settings for a single widget instance.
///
/// Built once at startup and handed to the widget constructor, so the core
/// carries no hidden global configuration.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Spam guard: sends closer together than this are silently dropped.
    pub min_time_between_messages: Duration,
    /// Maximum outbound message length in characters.
    pub max_message_length: usize,
    /// Cooldown applied when the backend reports a rate limit.
    pub rate_limit_interval: Duration,
    /// Assistant message seeding a fresh conversation.
    pub welcome_message: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            min_time_between_messages: Duration::from_millis(1000),
            max_message_length: 1000,
            rate_limit_interval: Duration::from_secs(60),
            welcome_message: "Hi! How can I help you today?".to_string(),
        }
    }
}

impl WidgetConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            min_time_between_messages: Duration::from_millis(args.min_time_between_messages_ms),
            max_message_length: args.max_message_length,
            rate_limit_interval: Duration::from_secs(args.rate_limit_interval_secs),
            welcome_message: args.welcome_message.clone(),
        }
    }
}
