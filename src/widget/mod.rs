pub mod directives;
pub mod throttle;

use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use std::time::Duration;

use futures::StreamExt;
use log::{ debug, info, warn };
use tokio::time::Instant;

use crate::backend::{ BackendError, ChatBackend };
use crate::config::widget::WidgetConfig;
use crate::models::chat::{ Conversation, Message };
use self::throttle::ThrottleState;

/// Cosmetic cooldown shown after a non-rate-limit backend failure.
const GENERIC_ERROR_COOLDOWN: Duration = Duration::from_secs(5);

struct WidgetState {
    conversation: Conversation,
    throttle: ThrottleState,
}

/// The conversational core of one embedded chat widget: owns the local
/// conversation, gates outbound sends, and classifies backend failures
/// into timed cooldowns.
pub struct ChatWidget {
    config: WidgetConfig,
    backend: Arc<dyn ChatBackend>,
    state: Arc<Mutex<WidgetState>>,
}

impl ChatWidget {
    pub fn new(config: WidgetConfig, backend: Arc<dyn ChatBackend>) -> Self {
        let state = WidgetState {
            conversation: Conversation::seeded(&config.welcome_message),
            throttle: ThrottleState::new(),
        };
        Self {
            config,
            backend,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WidgetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a message through the guard chain. Guards reject silently: a
    /// refused send leaves no trace beyond the unchanged state. On
    /// acceptance the user message is appended locally before any network
    /// I/O begins.
    pub async fn submit(&self, raw_text: &str) {
        if raw_text.trim().is_empty() {
            return;
        }

        let history = {
            let mut state = self.lock();
            if state.throttle.is_rate_limited() {
                debug!("Dropping send while rate limited");
                return;
            }
            if raw_text.chars().count() > self.config.max_message_length {
                debug!(
                    "Dropping send over the {} character limit",
                    self.config.max_message_length
                );
                return;
            }
            if
                !state.throttle.try_begin_send(
                    self.config.min_time_between_messages,
                    Instant::now()
                )
            {
                debug!("Dropping send inside the minimum message interval");
                return;
            }

            let history = state.conversation.messages.clone();
            state.conversation.push(Message::user(raw_text));
            history
        };

        self.dispatch(&history, raw_text).await;
    }

    async fn dispatch(&self, history: &[Message], text: &str) {
        let mut stream = match self.backend.send(history, text).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!("Chat backend refused the message: {}", err);
                self.classify_error(&err);
                return;
            }
        };

        let mut reply = String::new();
        let mut failure: Option<BackendError> = None;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(token) => reply.push_str(&token),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if !reply.is_empty() {
            let mut state = self.lock();
            state.conversation.push(Message::assistant(reply));
        }

        if let Some(err) = failure {
            warn!("Chat backend stream failed: {}", err);
            self.classify_error(&err);
        }
    }

    /// Route a backend failure into a cooldown. Rate limits (status 429 or
    /// a message that says so) get the configured interval and block
    /// further sends; everything else gets a fixed short cooldown that
    /// does not block retries.
    pub fn classify_error(&self, err: &BackendError) {
        let rate_limited = is_rate_limit_error(err);
        let duration = if rate_limited {
            self.config.rate_limit_interval
        } else {
            GENERIC_ERROR_COOLDOWN
        };

        let now = Instant::now();
        let epoch = {
            let mut state = self.lock();
            state.throttle.begin_cooldown(duration, rate_limited, now)
        };

        if rate_limited {
            info!("Rate limited by the backend, cooling down for {}s", duration.as_secs());
        } else {
            info!("Backend error ({}), showing a {}s cooldown", err, duration.as_secs());
        }

        self.schedule_cooldown_expiry(now + duration, epoch);
    }

    fn schedule_cooldown_expiry(&self, deadline: Instant, epoch: u64) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.throttle.expire_cooldown(epoch) {
                debug!("Cooldown expired");
            }
        });
    }

    /// Reset to a fresh conversation. Always succeeds, idempotent; any
    /// pending cooldown expiry becomes stale.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.throttle.reset();
        state.conversation = Conversation::seeded(&self.config.welcome_message);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().conversation.messages.clone()
    }

    pub fn is_rate_limited(&self) -> bool {
        self.lock().throttle.is_rate_limited()
    }

    /// Whole seconds left on the active cooldown, if any.
    pub fn cooldown_remaining_secs(&self) -> Option<u64> {
        self.lock()
            .throttle.cooldown_remaining(Instant::now())
            .map(|remaining| remaining.as_secs_f64().ceil() as u64)
    }
}

fn is_rate_limit_error(err: &BackendError) -> bool {
    if err.status == Some(429) {
        return true;
    }
    let message = err.message.to_lowercase();
    message.contains("429") || message.contains("rate limit") || message.contains("too many requests")
}
