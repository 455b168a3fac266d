//! `MailPilot` - headless front end for the interaction core
//!
//! Reads one JSON-encoded action per line from stdin, drives the core
//! against an in-memory backend, and writes one JSON object per line to
//! stdout: the effects handed to the host plus a snapshot of the state.
//! Logs go to stderr.
//!
//! ```text
//! {"type":"toggle_palette"}
//! {"type":"set_palette_query","query":"archive"}
//! {"type":"palette_key","key":"enter"}
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod demo;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailpilot_core::{Action, Effect, Runtime, Session, Settings, Store, StoreSnapshot};

use demo::{DemoAi, DemoGateway, mock_messages};

type DemoRuntime = Runtime<DemoGateway, DemoAi>;

/// One line of output.
#[derive(Serialize)]
struct Output<'a> {
    effects: Vec<Effect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    state: StoreSnapshot<'a>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout carries the snapshots
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpilot=info,mailpilot_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting MailPilot");

    let settings_path = settings_path();
    let mut settings = match Settings::load(&settings_path).await {
        Ok(settings) => {
            info!("Settings loaded: theme={:?}", settings.theme_mode);
            settings
        }
        Err(e) => {
            warn!("Failed to load settings, using defaults: {}", e);
            Settings::default()
        }
    };

    let session = Session {
        connection_id: "demo".into(),
        email: "me@mailpilot.dev".into(),
    };
    let mut runtime = Runtime::new(
        Store::new(&settings, &session),
        Arc::new(DemoGateway::new(Duration::from_millis(150))),
        Arc::new(DemoAi::new(Duration::from_millis(400))),
        settings.ai_timeout(),
    );
    runtime.dispatch(Action::LoadMessages {
        messages: mock_messages(),
    });

    let mut stdout = tokio::io::stdout();
    emit(&mut stdout, &runtime, Vec::new(), None).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let error = match serde_json::from_str::<Action>(&line) {
                    Ok(action) => {
                        runtime.dispatch(action);
                        None
                    }
                    Err(e) => {
                        warn!("Ignoring malformed action: {}", e);
                        Some(format!("invalid action: {e}"))
                    }
                };
                let effects = handle_host_effects(&mut runtime, &mut settings, &settings_path).await;
                emit(&mut stdout, &runtime, effects, error).await?;
            }
            progressed = runtime.step(), if runtime.in_flight() > 0 => {
                if progressed {
                    let effects = handle_host_effects(&mut runtime, &mut settings, &settings_path).await;
                    emit(&mut stdout, &runtime, effects, None).await?;
                }
            }
        }
    }

    // Input closed: let outstanding work land before exiting.
    runtime.run_until_idle().await;
    let effects = handle_host_effects(&mut runtime, &mut settings, &settings_path).await;
    emit(&mut stdout, &runtime, effects, None).await?;

    info!("MailPilot exiting");
    Ok(())
}

/// `<config_dir>/mailpilot/settings.json`.
fn settings_path() -> PathBuf {
    Settings::path_in(&dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")))
}

/// Performs the effects the core leaves to the host and returns them for output.
async fn handle_host_effects(
    runtime: &mut DemoRuntime,
    settings: &mut Settings,
    path: &std::path::Path,
) -> Vec<Effect> {
    let effects = runtime.take_host_effects();
    for effect in &effects {
        match effect {
            Effect::PersistTheme { theme } => {
                settings.theme_mode = *theme;
                if let Err(e) = settings.save(path).await {
                    warn!("Failed to save settings: {}", e);
                }
            }
            Effect::Navigate { location } => info!(href = %location.href(), "navigate"),
            Effect::SignOut => info!("session ended"),
            other => warn!(effect = ?other, "unexpected host effect"),
        }
    }
    effects
}

async fn emit(
    stdout: &mut tokio::io::Stdout,
    runtime: &DemoRuntime,
    effects: Vec<Effect>,
    error: Option<String>,
) -> anyhow::Result<()> {
    let output = Output {
        effects,
        error,
        state: runtime.store().snapshot(),
    };
    let mut line = serde_json::to_vec(&output).context("failed to encode snapshot")?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}
