//! msgmate-tail: follow a chat's message stream from the terminal.
//!
//! Usage: `msgmate-tail <chat-uuid>`
//!
//! Environment:
//! - `MSGMATE_BASE_URL` - backend base URL (default `http://localhost:1984`)
//! - `MSGMATE_COOKIE`   - session cookie (e.g. `session=...`)
//! - `RUST_LOG`         - tracing filter

use std::io::Write;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use msgmate_client::adapters::ReqwestHttpClient;
use msgmate_client::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let chat_uuid = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("usage: msgmate-tail <chat-uuid>"))?;

    let config = ClientConfig {
        base_url: std::env::var("MSGMATE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:1984".to_string()),
        cookie: std::env::var("MSGMATE_COOKIE").ok(),
        ..Default::default()
    };

    let mut api = ChatApi::new(ReqwestHttpClient::new(), config.base_url.clone())
        .with_page_size(config.page_size);
    if let Some(cookie) = &config.cookie {
        api = api.with_header("Cookie", cookie);
    }

    let mut state = ClientState::from_config(&config);

    api.load_history(&mut state, &chat_uuid).await;
    if let Some(error) = state.cache.load_error(&chat_uuid) {
        return Err(eyre!("could not load history: {}", error));
    }
    for entry in state.timeline(&chat_uuid) {
        if let TimelineEntry::Persisted(message) = entry {
            println!("[{}] {}", message.sender_uuid, message.text);
        }
    }

    let mut connection = StreamConnection::connect(config.stream_config()).await?;
    let mut status_rx = connection.state_receiver();
    state.set_connection(connection.status());
    info!("Following chat {}", chat_uuid);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            event = connection.recv() => {
                let Some(event) = event else {
                    info!("Stream closed");
                    break;
                };
                render_event(&state, &chat_uuid, &event);
                state.apply_event(event);
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow().clone();
                let was_down = !state.is_connected();
                match status {
                    ConnectionStatus::Connected if was_down => {
                        // Resuming: drop stream residue and re-sync history.
                        state.on_reconnected();
                        api.load_history(&mut state, &chat_uuid).await;
                    }
                    status => state.set_connection(status),
                }
            }
            _ = ticker.tick() => {
                state.expire_stale_handoffs(Instant::now());
            }
        }
    }

    Ok(())
}

/// Print the incremental effect of a frame for the followed chat.
fn render_event(state: &ClientState, chat_uuid: &str, event: &StreamEvent) {
    if event.chat_uuid() != Some(chat_uuid) {
        return;
    }
    match event {
        StreamEvent::StartPartialMessage(_) => print!("[msgmate] "),
        StreamEvent::NewPartialMessage(content) => {
            if let Some(text) = &content.text {
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
        }
        StreamEvent::EndPartialMessage(_) => (),
        StreamEvent::NewMessage(content) => {
            // The streamed text was already printed; if this message was
            // not streamed (e.g. sent by another device), show it whole.
            if !state.is_generating(chat_uuid) {
                println!(
                    "[{}] {}",
                    content.sender_uuid.as_deref().unwrap_or("?"),
                    content.text.as_deref().unwrap_or_default()
                );
            } else {
                println!();
            }
        }
        StreamEvent::Unknown => (),
    }
}
