use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use chat_widget::backend::http::HttpBackend;
use chat_widget::backend::{ BackendError, ChatBackend, TextStream };
use chat_widget::config::widget::WidgetConfig;
use chat_widget::gate::local::LocalGate;
use chat_widget::gate::{ DenyReason, GateDecision, RequestDescriptor, RequestGate };
use chat_widget::models::chat::{ Message, Role };
use chat_widget::server::api::{ router, AppState };
use chat_widget::widget::ChatWidget;

struct ScriptedUpstream {
    parts: Vec<&'static str>,
}

#[async_trait]
impl ChatBackend for ScriptedUpstream {
    async fn send(&self, _history: &[Message], _text: &str) -> Result<TextStream, BackendError> {
        let items: Vec<Result<String, BackendError>> = self.parts
            .iter()
            .map(|p| Ok(p.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

struct AllowAll;

#[async_trait]
impl RequestGate for AllowAll {
    async fn evaluate(&self, _request: &RequestDescriptor) -> GateDecision {
        GateDecision::Allow
    }
}

struct DenyWith(DenyReason);

#[async_trait]
impl RequestGate for DenyWith {
    async fn evaluate(&self, _request: &RequestDescriptor) -> GateDecision {
        GateDecision::Deny(self.0)
    }
}

async fn spawn_gateway(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
    });
    addr
}

fn widget_against(addr: SocketAddr, config: WidgetConfig) -> ChatWidget {
    let backend = Arc::new(HttpBackend::new(&format!("http://{}/api/chat", addr)).unwrap());
    ChatWidget::new(config, backend)
}

#[tokio::test]
async fn upstream_reply_streams_through_the_gateway_into_the_widget() {
    let addr = spawn_gateway(AppState {
        backend: Arc::new(ScriptedUpstream { parts: vec!["Hello", " there"] }),
        gate: Arc::new(AllowAll),
    }).await;

    let widget = widget_against(addr, WidgetConfig::default());
    widget.submit("hi").await;

    let messages = widget.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].text, "hi");
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].text, "Hello there");
    assert!(!widget.is_rate_limited());
    assert_eq!(widget.cooldown_remaining_secs(), None);
}

#[tokio::test]
async fn a_gate_deny_becomes_a_rate_limit_cooldown_in_the_widget() {
    let addr = spawn_gateway(AppState {
        backend: Arc::new(ScriptedUpstream { parts: vec!["never sent"] }),
        gate: Arc::new(DenyWith(DenyReason::RateLimit)),
    }).await;

    let widget = widget_against(addr, WidgetConfig::default());
    widget.submit("hi").await;

    // Optimistic append happened, but no assistant reply arrived
    let messages = widget.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::User);

    assert!(widget.is_rate_limited());
    let secs = widget.cooldown_remaining_secs().unwrap();
    assert!(secs > 0 && secs <= 60);
}

#[tokio::test]
async fn a_bot_deny_gets_the_generic_cooldown() {
    let addr = spawn_gateway(AppState {
        backend: Arc::new(ScriptedUpstream { parts: vec!["never sent"] }),
        gate: Arc::new(DenyWith(DenyReason::Bot)),
    }).await;

    let widget = widget_against(addr, WidgetConfig::default());
    widget.submit("hi").await;

    assert!(!widget.is_rate_limited());
    let secs = widget.cooldown_remaining_secs().unwrap();
    assert!(secs > 0 && secs <= 5);
}

#[tokio::test]
async fn the_local_gate_limits_a_chatty_widget_end_to_end() {
    let addr = spawn_gateway(AppState {
        backend: Arc::new(ScriptedUpstream { parts: vec!["ok"] }),
        gate: Arc::new(
            LocalGate::new(2, Duration::from_secs(60), false, 4000).unwrap()
        ),
    }).await;

    let config = WidgetConfig {
        min_time_between_messages: Duration::ZERO,
        ..WidgetConfig::default()
    };
    let widget = widget_against(addr, config);

    widget.submit("one").await;
    widget.submit("two").await;
    assert!(!widget.is_rate_limited());

    widget.submit("three").await;
    assert!(widget.is_rate_limited());

    // Further sends are refused locally while the cooldown runs
    let before = widget.messages().len();
    widget.submit("four").await;
    assert_eq!(widget.messages().len(), before);
}
