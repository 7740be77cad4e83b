use async_trait::async_trait;
use governor::{ RateLimiter, Quota, state::keyed::DefaultKeyedStateStore, clock::DefaultClock };
use log::warn;
use std::error::Error;
use std::num::NonZeroU32;
use std::time::Duration;

use super::{ DenyReason, GateDecision, RequestDescriptor, RequestGate };
use crate::cli::Args;

const BOT_MARKERS: [&str; 4] = ["bot", "crawler", "spider", "scraper"];

/// In-process request gate: a keyed token bucket per client, an optional
/// User-Agent screen, and a payload-size shield.
pub struct LocalGate {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    bot_protection: bool,
    max_message_len: usize,
}

impl LocalGate {
    pub fn new(
        burst: u32,
        window: Duration,
        bot_protection: bool,
        max_message_len: usize
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let burst = NonZeroU32::new(burst).ok_or("gate rate limit must be at least 1")?;
        let period = window
            .checked_div(burst.get())
            .filter(|p| !p.is_zero())
            .ok_or("gate rate window is too small for the configured limit")?;
        let quota = Quota::with_period(period)
            .ok_or("gate rate window must be non-zero")?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::keyed(quota),
            bot_protection,
            max_message_len,
        })
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Self::new(
            args.gate_rate_limit,
            Duration::from_secs(args.gate_rate_window_secs),
            args.gate_bot_protection,
            args.gate_max_message_length
        )
    }
}

#[async_trait]
impl RequestGate for LocalGate {
    async fn evaluate(&self, request: &RequestDescriptor) -> GateDecision {
        if self.limiter.check_key(&request.client).is_err() {
            warn!("Client {} exceeded the request quota", request.client);
            return GateDecision::Deny(DenyReason::RateLimit);
        }

        if self.bot_protection {
            if let Some(agent) = &request.user_agent {
                let agent = agent.to_lowercase();
                if BOT_MARKERS.iter().any(|marker| agent.contains(marker)) {
                    warn!("Client {} looks automated ({})", request.client, agent);
                    return GateDecision::Deny(DenyReason::Bot);
                }
            }
        }

        if request.message_len > self.max_message_len {
            warn!(
                "Client {} sent an oversized message ({} > {} chars)",
                request.client,
                request.message_len,
                self.max_message_len
            );
            return GateDecision::Deny(DenyReason::Shield);
        }

        GateDecision::Allow
    }
}
