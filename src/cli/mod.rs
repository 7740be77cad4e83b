use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Run Mode ---
    /// Run mode: "serve" starts the chat gateway, "chat" opens an interactive widget session.
    #[arg(long, env = "WIDGET_MODE", default_value = "serve")]
    pub mode: String,

    // --- Widget Args ---
    /// Minimum time between outbound messages, in milliseconds (spam guard).
    #[arg(long, env = "MIN_TIME_BETWEEN_MESSAGES_MS", default_value = "1000")]
    pub min_time_between_messages_ms: u64,

    /// Maximum outbound message length in characters.
    #[arg(long, env = "MAX_MESSAGE_LENGTH", default_value = "1000")]
    pub max_message_length: usize,

    /// Cooldown applied when the backend reports a rate limit, in seconds.
    #[arg(long, env = "RATE_LIMIT_INTERVAL_SECS", default_value = "60")]
    pub rate_limit_interval_secs: u64,

    /// Assistant message that seeds a fresh conversation.
    #[arg(long, env = "WELCOME_MESSAGE", default_value = "Hi! How can I help you today?")]
    pub welcome_message: String,

    /// Chat gateway endpoint the interactive widget session talks to.
    #[arg(long, env = "GATEWAY_URL", default_value = "http://127.0.0.1:4000/api/chat")]
    pub gateway_url: String,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider behind the gateway (openai, anthropic, ollama, gemini, deepseek, groq, xai, http)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openai")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (e.g., OpenAI, Anthropic)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-4o, llama3)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    // --- Gateway Args ---
    /// Host address and port for the gateway to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    // --- Security Gate Args ---
    /// Requests allowed per client within one rate window.
    #[arg(long, env = "GATE_RATE_LIMIT", default_value = "10")]
    pub gate_rate_limit: u32,

    /// Length of the per-client rate window, in seconds.
    #[arg(long, env = "GATE_RATE_WINDOW_SECS", default_value = "60")]
    pub gate_rate_window_secs: u64,

    /// Deny requests whose User-Agent looks like an automated client.
    #[arg(long, env = "GATE_BOT_PROTECTION", default_value = "false")]
    pub gate_bot_protection: bool,

    /// Hard cap on inbound message length before the gate blocks the request.
    #[arg(long, env = "GATE_MAX_MESSAGE_LENGTH", default_value = "4000")]
    pub gate_max_message_length: usize,

    // --- TLS ---
    /// Optional path to the TLS certificate file (PEM format) for HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
