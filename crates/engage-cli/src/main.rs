//! Terminal chat client.
//!
//! Mounts a [`ChatWidget`] against a live chat backend and lets you talk to
//! it from stdin. Proactive greetings, follow-ups and lead questions print as
//! they arrive.

mod commands;
mod renderer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use engage::{ChatWidget, KeyValueStore, MemoryStore, PageSnapshot, WidgetConfig};
use engage_client::{BackendConfig, HttpBackend};
use engage_core::Role;
use engage_store::SqliteStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::commands::{Command, HELP};
use crate::renderer::TerminalRenderer;

#[derive(Debug, Parser)]
#[command(name = "engage-chat")]
#[command(about = "Chat with a site's assistant from the terminal")]
struct Args {
    /// Chat backend base URL. Falls back to ENGAGE_API_URL env.
    #[arg(long)]
    api_url: Option<String>,

    /// Page URL the conversation is about. Falls back to ENGAGE_PAGE_URL env.
    #[arg(long)]
    page_url: Option<String>,

    /// Admin identifier forwarded to the backend
    #[arg(long)]
    admin_id: Option<String>,

    /// SQLite database for session storage
    #[arg(long, default_value = "sqlite:engage.db?mode=rwc")]
    store: String,

    /// Keep session storage in memory only (a new visitor every run)
    #[arg(long)]
    memory_store: bool,

    /// Never send proactive greetings or follow-ups
    #[arg(long)]
    disable_proactive: bool,

    /// Seed assistant message shown instead of loading history (repeatable)
    #[arg(long)]
    seed: Vec<String>,

    /// Page snapshot JSON used for section detection
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("engage=info".parse()?)
                .add_directive("engage_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let backend_config = match &args.api_url {
        Some(url) => BackendConfig::builder().api_url(url).build(),
        None => BackendConfig::from_env()?,
    };
    let backend = Arc::new(HttpBackend::new(backend_config)?);

    let store: Arc<dyn KeyValueStore> = if args.memory_store {
        Arc::new(MemoryStore::new())
    } else {
        let store = SqliteStore::connect(&args.store).await?;
        store.migrate().await?;
        Arc::new(store)
    };

    let config = widget_config(&args);
    info!("Chatting about {}", config.page_url);

    let snapshot = match &args.snapshot {
        Some(path) => Some(load_snapshot(path)?),
        None => None,
    };

    let widget = ChatWidget::new(config, backend, store, Arc::new(TerminalRenderer));
    widget.mount().await?;
    if let Some(snapshot) = &snapshot {
        widget.on_scroll(snapshot.clone()).await;
    }

    println!("Type a message, or /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Send(text) => {
                widget.input_changed(&text).await;
                widget.send_message(&text).await?;
            }
            Command::Click(label) => match resolve_button(&widget, &label).await {
                Some(label) => widget.click_button(&label).await?,
                None => println!("no button {}", label),
            },
            Command::Edit { index, text } => {
                if let Err(e) = widget.edit_and_resend(index, &text).await {
                    println!("{}", e);
                }
            }
            Command::Reset => {
                widget.reset().await?;
                widget.mount().await?;
                if let Some(snapshot) = &snapshot {
                    widget.on_scroll(snapshot.clone()).await;
                }
            }
            Command::Export => println!("{}", widget.export_text().await),
            Command::Scroll => match &snapshot {
                Some(snapshot) => widget.on_scroll(snapshot.clone()).await,
                None => println!("no snapshot loaded (use --snapshot)"),
            },
            Command::Tab(visible) => widget.tab_visibility_changed(visible).await,
            Command::Status => {
                let status = widget.status().await;
                println!("session: {}", widget.session_id().await);
                println!("{:#?}", status);
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    widget.shutdown().await;
    info!("Bye");
    Ok(())
}

/// Environment configuration with command-line overrides applied.
fn widget_config(args: &Args) -> WidgetConfig {
    let mut config = WidgetConfig::from_env();

    if let Some(page_url) = &args.page_url {
        config.page_url = page_url.clone();
    }
    if let Some(admin_id) = &args.admin_id {
        config.admin_id = Some(admin_id.clone());
    }
    if args.disable_proactive {
        config.disable_proactive = true;
    }
    if !args.seed.is_empty() {
        config.seed_messages = args.seed.clone();
    }

    config
}

fn load_snapshot(path: &Path) -> Result<PageSnapshot, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let snapshot: PageSnapshot = serde_json::from_str(&text)?;
    info!(
        "Loaded page snapshot from {} ({} elements)",
        path.display(),
        snapshot.elements.len()
    );
    Ok(snapshot)
}

/// Map a `/click` argument to a button label on the latest assistant message.
///
/// Numbers pick by position; anything else must match a label (case-insensitive).
async fn resolve_button(widget: &ChatWidget, arg: &str) -> Option<String> {
    let transcript = widget.transcript().await;
    let Some(message) = transcript.iter().rev().find(|m| m.role == Role::Assistant) else {
        warn!("No assistant message to click on");
        return None;
    };

    if let Ok(n) = arg.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| message.buttons.get(i))
            .cloned();
    }

    message
        .buttons
        .iter()
        .find(|label| label.eq_ignore_ascii_case(arg))
        .cloned()
}
