pub mod local;

use async_trait::async_trait;

/// Why the gate refused a request. The HTTP layer answers with the mapped
/// status and a plain-text body, which is what the widget's error
/// classifier ultimately observes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    RateLimit,
    Bot,
    Shield,
    Other,
}

impl DenyReason {
    pub fn status(&self) -> u16 {
        match self {
            DenyReason::RateLimit => 429,
            DenyReason::Bot => 403,
            DenyReason::Shield => 400,
            DenyReason::Other => 400,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::RateLimit => "Too Many Requests",
            DenyReason::Bot => "No bots allowed",
            DenyReason::Shield => "Request blocked",
            DenyReason::Other => "Request refused",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(DenyReason),
}

/// What the gate gets to look at for one inbound chat request.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// Stable per-client key, typically the peer IP.
    pub client: String,
    pub user_agent: Option<String>,
    /// Inbound message length in characters.
    pub message_len: usize,
}

#[async_trait]
pub trait RequestGate: Send + Sync {
    async fn evaluate(&self, request: &RequestDescriptor) -> GateDecision;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_reasons_map_to_expected_statuses() {
        assert_eq!(DenyReason::RateLimit.status(), 429);
        assert_eq!(DenyReason::Bot.status(), 403);
        assert_eq!(DenyReason::Shield.status(), 400);
        assert_eq!(DenyReason::Other.status(), 400);
    }

    #[test]
    fn rate_limit_body_matches_the_classifier_rule() {
        assert_eq!(DenyReason::RateLimit.message(), "Too Many Requests");
    }
}
