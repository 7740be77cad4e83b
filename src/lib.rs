pub mod backend;
pub mod cli;
pub mod config;
pub mod gate;
pub mod host;
pub mod models;
pub mod server;
pub mod widget;

use backend::new_backend;
use cli::Args;
use gate::local::LocalGate;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Run Mode: {}", args.mode);
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Gateway URL: {}", args.gateway_url);
    info!("Min Time Between Messages: {}ms", args.min_time_between_messages_ms);
    info!("Max Message Length: {} chars", args.max_message_length);
    info!("Rate Limit Interval: {}s", args.rate_limit_interval_secs);
    info!("Gate Quota: {} requests / {}s", args.gate_rate_limit, args.gate_rate_window_secs);
    info!("Bot Protection: {}", args.gate_bot_protection);
    info!("-------------------------");

    match args.mode.to_lowercase().as_str() {
        "serve" => {
            let backend = new_backend(&args)?;
            let gate = Arc::new(LocalGate::from_args(&args)?);
            let addr = args.server_addr.clone();
            info!("Starting gateway on: {}", addr);
            let server = Server::new(addr, backend, gate, args.clone());
            server.run().await
        }
        "chat" => host::run_interactive(&args).await,
        other => Err(format!("Unknown run mode '{}'. Use 'serve' or 'chat'.", other).into()),
    }
}
