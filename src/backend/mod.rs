pub mod http;
pub mod openai;
pub mod provider;

use async_trait::async_trait;
use futures::Stream;
use std::error::Error as StdError;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use crate::cli::Args;
use crate::models::chat::{ Message, Role };

use self::http::HttpBackend;
use self::openai::OpenAiBackend;
use self::provider::ProviderBackend;

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// Failure surfaced by a chat backend: an optional HTTP-like status plus a
/// free-text message. This is the pair the widget's error classifier reads.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(err: impl fmt::Display) -> Self {
        Self {
            status: None,
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Dispatch the latest user text plus full prior history; yields a
    /// stream of text increments terminating in completion.
    async fn send(&self, history: &[Message], text: &str) -> Result<TextStream, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    OpenAI,
    Anthropic,
    Ollama,
    Gemini,
    DeepSeek,
    Groq,
    XAI,
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported chat backend type: '{0}'")]
pub struct ParseBackendKindError(String);

impl FromStr for BackendKind {
    type Err = ParseBackendKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(BackendKind::Http),
            "openai" => Ok(BackendKind::OpenAI),
            "anthropic" => Ok(BackendKind::Anthropic),
            "ollama" => Ok(BackendKind::Ollama),
            "gemini" => Ok(BackendKind::Gemini),
            "deepseek" => Ok(BackendKind::DeepSeek),
            "groq" => Ok(BackendKind::Groq),
            "xai" => Ok(BackendKind::XAI),
            _ => Err(ParseBackendKindError(s.to_string())),
        }
    }
}

pub fn new_backend(args: &Args) -> Result<Arc<dyn ChatBackend>, Box<dyn StdError + Send + Sync>> {
    let kind: BackendKind = args.chat_llm_type.parse()?;
    let backend: Arc<dyn ChatBackend> = match kind {
        BackendKind::Http => {
            let endpoint = args.chat_base_url
                .as_deref()
                .ok_or("--chat-base-url is required for the http backend")?;
            Arc::new(HttpBackend::new(endpoint)?)
        }
        BackendKind::OpenAI => Arc::new(OpenAiBackend::from_args(args)?),
        other => Arc::new(ProviderBackend::from_args(other, args)?),
    };
    Ok(backend)
}

pub fn format_history_for_prompt(history: &[Message]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut result = String::from("Previous conversation:\n");
    for msg in history {
        let role_display = match msg.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        result.push_str(&format!("{}: {}\n", role_display, msg.text));
    }

    result
}

/// Flatten history plus the new user text into a single prompt for
/// providers without a structured message API.
pub fn build_prompt(history: &[Message], text: &str) -> String {
    let history_str = format_history_for_prompt(history);
    if history_str.is_empty() {
        text.to_string()
    } else {
        format!("{}\nUser: {}", history_str, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<BackendKind>().unwrap(), BackendKind::OpenAI);
        assert_eq!("http".parse::<BackendKind>().unwrap(), BackendKind::Http);
        assert!("mystery".parse::<BackendKind>().is_err());
    }

    #[test]
    fn build_prompt_without_history_is_the_text() {
        assert_eq!(build_prompt(&[], "hello"), "hello");
    }

    #[test]
    fn build_prompt_renders_roles() {
        let history = vec![Message::user("hi"), Message::assistant("hello!")];
        let prompt = build_prompt(&history, "how are you?");
        assert!(prompt.starts_with("Previous conversation:\n"));
        assert!(prompt.contains("User: hi\n"));
        assert!(prompt.contains("Assistant: hello!\n"));
        assert!(prompt.ends_with("User: how are you?"));
    }

    #[test]
    fn backend_error_keeps_status_and_message() {
        let err = BackendError::new(Some(429), "Too Many Requests");
        assert_eq!(err.status, Some(429));
        assert_eq!(err.to_string(), "Too Many Requests");
        let transport = BackendError::transport("connection refused");
        assert_eq!(transport.status, None);
    }
}
