use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ BackendError, ChatBackend, TextStream };
use crate::cli::Args;
use crate::models::chat::{ Message, Role };

#[derive(Debug)]
pub struct OpenAiBackend {
    http: HttpClient,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct OpenAIStreamResponse {
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
    #[serde(rename = "finish_reason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, BackendError> {
        let model = model.unwrap_or_else(|| "gpt-4o".to_string());
        let endpoint = base_url.unwrap_or_else(||
            "https://api.openai.com/v1/chat/completions".to_string()
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(BackendError::transport)?;

        Ok(Self {
            http,
            api_key,
            model,
            endpoint,
        })
    }

    pub fn from_args(args: &Args) -> Result<Self, BackendError> {
        if args.chat_api_key.is_empty() {
            return Err(BackendError::transport("OpenAI API key is required"));
        }
        Self::new(args.chat_api_key.clone(), args.chat_model.clone(), args.chat_base_url.clone())
    }

    fn request_messages(history: &[Message], text: &str) -> Vec<OpenAIMessage> {
        history
            .iter()
            .map(|m| OpenAIMessage {
                role: match m.role {
                    Role::User => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: m.text.clone(),
            })
            .chain(
                std::iter::once(OpenAIMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                })
            )
            .collect()
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn send(&self, history: &[Message], text: &str) -> Result<TextStream, BackendError> {
        let req = OpenAIChatRequest {
            model: self.model.clone(),
            messages: Self::request_messages(history, text),
            temperature: 0.7,
            max_tokens: Some(2048),
            stream: Some(true),
        };

        let resp = self.http
            .post(self.endpoint.trim_end_matches('/'))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
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
            let mut stream = resp.bytes_stream();
            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        if let Ok(text) = String::from_utf8(chunk.to_vec()) {
                            for line in text.lines() {
                                if line.is_empty() || line == "data: [DONE]" {
                                    continue;
                                }

                                if let Some(data) = line.strip_prefix("data: ") {
                                    match serde_json::from_str::<OpenAIStreamResponse>(data) {
                                        Ok(stream_resp) => {
                                            for choice in stream_resp.choices {
                                                if let Some(content) = choice.delta.content {
                                                    if
                                                        !content.is_empty() &&
                                                        tx.send(Ok(content)).await.is_err()
                                                    {
                                                        return;
                                                    }
                                                }

                                                if let Some(reason) = &choice.finish_reason {
                                                    if reason == "stop" {
                                                        return;
                                                    }
                                                }
                                            }
                                        }
                                        Err(e) => {
                                            debug!("JSON parse error: {} for data: {}", e, data);
                                        }
                                    }
                                }
                            }
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
    fn request_messages_end_with_the_new_user_text() {
        let history = vec![Message::user("hi"), Message::assistant("hello!")];
        let messages = OpenAiBackend::request_messages(&history, "next");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "next");
    }

    #[test]
    fn from_args_requires_an_api_key() {
        use clap::Parser;
        let args = Args::parse_from(["chat-widget"]);
        let err = OpenAiBackend::from_args(&args).unwrap_err();
        assert!(err.message.contains("API key"));
    }

    #[test]
    fn defaults_to_the_hosted_chat_completions_endpoint() {
        let backend = OpenAiBackend::new("sk-test".to_string(), None, None).unwrap();
        assert_eq!(backend.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(backend.model, "gpt-4o");
    }
}
