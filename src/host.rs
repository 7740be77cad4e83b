use std::error::Error;
use std::io::{ self, Write };
use std::sync::Arc;

use log::info;
use tokio::io::{ AsyncBufReadExt, BufReader };

use crate::backend::http::HttpBackend;
use crate::cli::Args;
use crate::config::widget::WidgetConfig;
use crate::models::chat::{ Message, Role };
use crate::widget::directives::extract_directives;
use crate::widget::ChatWidget;

/// Interactive terminal session driving one widget instance against a chat
/// gateway.
pub async fn run_interactive(args: &Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = WidgetConfig::from_args(args);
    let backend = Arc::new(HttpBackend::new(&args.gateway_url)?);
    let widget = ChatWidget::new(config, backend);

    info!("Widget session connected to {}", args.gateway_url);

    if let Some(welcome) = widget.messages().last() {
        render_assistant(welcome);
    }
    println!("(type /clear to reset, /quit to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => {
                break;
            }
            "/clear" => {
                widget.clear();
                if let Some(welcome) = widget.messages().last() {
                    render_assistant(welcome);
                }
                continue;
            }
            _ => {}
        }

        let before = widget.messages().len();
        widget.submit(&line).await;
        render_outcome(&widget, before);
    }

    info!("Widget session closed");
    Ok(())
}

fn render_outcome(widget: &ChatWidget, before: usize) {
    let messages = widget.messages();
    let new_messages = messages.get(before..).unwrap_or(&[]);

    let mut replied = false;
    for message in new_messages {
        if message.role == Role::Assistant {
            render_assistant(message);
            replied = true;
        }
    }

    if !replied {
        match (widget.is_rate_limited(), widget.cooldown_remaining_secs()) {
            (true, Some(secs)) => println!("Rate limited. Try again in {}s.", secs),
            (false, Some(secs)) => println!("Something went wrong. Retry in {}s.", secs),
            _ => println!("(message not sent)"),
        }
    }
}

fn render_assistant(message: &Message) {
    let extracted = extract_directives(&message.text);
    if !extracted.text.is_empty() {
        println!("{}", extracted.text);
    }
    for (index, choice) in extracted.choices.iter().enumerate() {
        println!("  [{}] {}", index + 1, choice.label);
    }
    for link in &extracted.links {
        println!("  -> {} ({})", link.label, link.url);
    }
}
