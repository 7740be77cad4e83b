use std::time::Duration;
use tokio::time::Instant;

/// Send-gating state for one widget instance.
///
/// Transitions take an explicit `now` so the callers (and tests) control the
/// clock. The epoch counter invalidates stale cooldown-expiry timers: every
/// cooldown entry and every reset bumps it, and an expiry only applies when
/// it still carries the current epoch.
#[derive(Debug, Default)]
pub struct ThrottleState {
    last_send: Option<Instant>,
    rate_limited: bool,
    cooldown_deadline: Option<Instant>,
    epoch: u64,
}

impl ThrottleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spam guard: allow iff no prior send or the minimum interval has
    /// elapsed, recording the send time on success.
    pub fn try_begin_send(&mut self, min_interval: Duration, now: Instant) -> bool {
        if let Some(last) = self.last_send {
            if now.duration_since(last) < min_interval {
                return false;
            }
        }
        self.last_send = Some(now);
        true
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited
    }

    pub fn last_send(&self) -> Option<Instant> {
        self.last_send
    }

    /// Enter the cooling-down state for `duration`. Returns the epoch the
    /// matching expiry must present to take effect.
    pub fn begin_cooldown(
        &mut self,
        duration: Duration,
        mark_rate_limited: bool,
        now: Instant
    ) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        if mark_rate_limited {
            self.rate_limited = true;
        }
        self.cooldown_deadline = Some(now + duration);
        self.epoch
    }

    /// Elapsed-timer transition back to idle. A stale epoch is a no-op.
    pub fn expire_cooldown(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.rate_limited = false;
        self.cooldown_deadline = None;
        true
    }

    /// Back to initial values; any scheduled expiry becomes stale.
    pub fn reset(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.last_send = None;
        self.rate_limited = false;
        self.cooldown_deadline = None;
    }

    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        self.cooldown_deadline.map(|deadline| deadline.saturating_duration_since(now))
    }
}
