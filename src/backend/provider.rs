use async_trait::async_trait;
use rllm::{
    builder::{ LLMBackend, LLMBuilder },
    chat::{ ChatMessage, ChatRole, MessageType },
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ build_prompt, BackendError, BackendKind, ChatBackend, TextStream };
use crate::cli::Args;
use crate::models::chat::Message;

/// Provider-agnostic adapter over the rllm builder for hosted LLMs without
/// a dedicated client here. The whole completion is surfaced as a
/// single-increment stream.
pub struct ProviderBackend {
    kind: BackendKind,
    api_key: String,
    model: String,
    base_url: Option<String>,
}

fn default_model(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Anthropic => "claude-3-5-sonnet-latest",
        BackendKind::Ollama => "llama3",
        BackendKind::Gemini => "gemini-2.0-flash",
        BackendKind::DeepSeek => "deepseek-chat",
        BackendKind::Groq => "llama-3.1-8b-instant",
        BackendKind::XAI => "grok-2-latest",
        BackendKind::OpenAI | BackendKind::Http => "gpt-4o",
    }
}

fn llm_backend(kind: BackendKind) -> Result<LLMBackend, BackendError> {
    match kind {
        BackendKind::Anthropic => Ok(LLMBackend::Anthropic),
        BackendKind::Ollama => Ok(LLMBackend::Ollama),
        BackendKind::Gemini => Ok(LLMBackend::Google),
        BackendKind::DeepSeek => Ok(LLMBackend::DeepSeek),
        BackendKind::Groq => Ok(LLMBackend::Groq),
        BackendKind::XAI => Ok(LLMBackend::XAI),
        BackendKind::OpenAI => Ok(LLMBackend::OpenAI),
        BackendKind::Http => Err(BackendError::transport("http is not an LLM provider backend")),
    }
}

impl ProviderBackend {
    pub fn new(
        kind: BackendKind,
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, BackendError> {
        llm_backend(kind)?;
        Ok(Self {
            kind,
            api_key,
            model: model.unwrap_or_else(|| default_model(kind).to_string()),
            base_url,
        })
    }

    pub fn from_args(kind: BackendKind, args: &Args) -> Result<Self, BackendError> {
        Self::new(kind, args.chat_api_key.clone(), args.chat_model.clone(), args.chat_base_url.clone())
    }
}

#[async_trait]
impl ChatBackend for ProviderBackend {
    async fn send(&self, history: &[Message], text: &str) -> Result<TextStream, BackendError> {
        let backend = llm_backend(self.kind)?;
        let mut builder = LLMBuilder::new().backend(backend).model(&self.model);
        if !self.api_key.is_empty() {
            builder = builder.api_key(self.api_key.clone());
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }

        let provider = builder.build().map_err(BackendError::transport)?;
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            content: build_prompt(history, text),
            message_type: MessageType::Text,
        }];

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            match provider.chat(&messages).await {
                Ok(resp) => {
                    let content = resp
                        .text()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| resp.to_string());
                    let _ = tx.send(Ok(content)).await;
                }
                Err(e) => {
                    let _ = tx.send(Err(BackendError::transport(e))).await;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
