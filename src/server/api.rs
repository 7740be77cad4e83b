use axum::{
    body::Body,
    extract::{ ConnectInfo, State },
    http::{ header, HeaderMap, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use futures::StreamExt;
use log::{ error, warn };
use serde::{ Deserialize, Serialize };
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };

use crate::backend::ChatBackend;
use crate::gate::{ GateDecision, RequestDescriptor, RequestGate };
use crate::models::chat::Message;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    pub gate: Arc<dyn RequestGate>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn chat_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>
) -> Response {
    let descriptor = RequestDescriptor {
        client: peer.ip().to_string(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        message_len: req.message.chars().count(),
    };

    if let GateDecision::Deny(reason) = state.gate.evaluate(&descriptor).await {
        warn!("Denied chat request from {}: {}", peer, reason.message());
        let status = StatusCode::from_u16(reason.status()).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, reason.message()).into_response();
    }

    match state.backend.send(&req.history, &req.message).await {
        Ok(stream) => {
            let body = Body::from_stream(
                stream.map(|item| {
                    item.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.message))
                })
            );
            ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
        }
        Err(err) => {
            error!("Upstream chat backend error for {}: {}", peer, err);
            let status = err.status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            (status, err.message).into_response()
        }
    }
}
