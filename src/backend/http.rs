use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::Client as HttpClient;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use super::{ BackendError, ChatBackend, TextStream };
use crate::models::chat::Message;

/// Client for a chat gateway endpoint: POSTs the message plus history and
/// streams plain-text increments back. A non-2xx answer becomes a
/// `BackendError` carrying the status code and the response body.
#[derive(Debug)]
pub struct HttpBackend {
    http: HttpClient,
    endpoint: Url,
}

#[derive(Serialize)]
struct GatewayChatRequest<'a> {
    message: &'a str,
    history: &'a [Message],
}

impl HttpBackend {
    pub fn new(endpoint: &str) -> Result<Self, BackendError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            BackendError::transport(format!("invalid chat endpoint '{}': {}", endpoint, e))
        })?;
        Ok(Self {
            http: HttpClient::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(&self, history: &[Message], text: &str) -> Result<TextStream, BackendError> {
        let resp = self.http
            .post(self.endpoint.clone())
            .json(&GatewayChatRequest { message: text, history })
            .send().await
            .map_err(BackendError::from)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(BackendError::new(Some(status.as_u16()), message));
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut bytes = resp.bytes_stream();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(buf) => {
                        match String::from_utf8(buf.to_vec()) {
                            Ok(text) => {
                                if !text.is_empty() && tx.send(Ok(text)).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => debug!("Skipping non-UTF8 chunk from gateway: {}", e),
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(BackendError::from(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_endpoint() {
        let err = HttpBackend::new("not a url").unwrap_err();
        assert!(err.status.is_none());
        assert!(err.message.contains("invalid chat endpoint"));
    }

    #[test]
    fn accepts_http_endpoint() {
        assert!(HttpBackend::new("http://127.0.0.1:4000/api/chat").is_ok());
    }
}
