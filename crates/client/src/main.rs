//! `podium-timer` -- terminal client for a shared debate timer.
//!
//! Runs as the session host (drives the countdown), as an observer
//! (follows the host's timer), or solo (an in-memory timer for practice).
//! In host and solo mode, commands are read from stdin, one per line:
//! `set <minutes> <seconds>`, `start`, `pause`, `reset`.
//!
//! # Environment variables
//!
//! | Variable              | Required          | Default | Description                                   |
//! |-----------------------|-------------------|---------|-----------------------------------------------|
//! | `PODIUM_MODE`         | no                | `observer` | `host`, `observer`, or `solo`              |
//! | `PODIUM_API_URL`      | host / observer   | --      | API root, e.g. `http://host:3000/api/v1`      |
//! | `PODIUM_WS_URL`       | host / observer   | --      | WebSocket endpoint, e.g. `ws://host:3000/api/v1/ws` |
//! | `PODIUM_USERNAME`     | host / observer*  | --      | Account to sign in as                         |
//! | `PODIUM_PASSWORD`     | host / observer*  | --      | Password for `PODIUM_USERNAME`                |
//! | `PODIUM_CLIENT_LABEL` | no                | `podium-timer (<mode>)` | Label stored with the login   |
//! | `PODIUM_TOKEN`        | no                | --      | Fixed access token; skips sign-in and renewal |
//! | `PODIUM_SESSION_ID`   | host / observer   | --      | Debate session id                             |
//! | `PODIUM_SOLO_MINUTES` | no                | `3`     | Solo timer minutes                            |
//! | `PODIUM_SOLO_SECONDS` | no                | `0`     | Solo timer seconds                            |
//!
//! \* Required unless `PODIUM_TOKEN` is set. A signed-in client renews its
//! access token for as long as it runs and signs out on shutdown.

use std::sync::Arc;

use podium_client::alert::{Alert, ToneAlert};
use podium_client::api::{HttpTimerApi, TimerApi};
use podium_client::auth::TokenSource;
use podium_client::display::{format_clock, SharedDisplay, TimerDisplay};
use podium_client::host::HostController;
use podium_client::local::LocalTimerApi;
use podium_client::subscriber::ChangeSubscriber;
use podium_client::ticker::CountdownTicker;
use podium_core::types::DbId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Session id used for the in-memory solo timer.
const SOLO_SESSION_ID: DbId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Host,
    Observer,
    Solo,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "podium_client=info,podium_timer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mode = match std::env::var("PODIUM_MODE").as_deref() {
        Ok("host") => Mode::Host,
        Ok("solo") => Mode::Solo,
        Ok("observer") | Err(_) => Mode::Observer,
        Ok(other) => {
            tracing::error!(mode = other, "PODIUM_MODE must be host, observer, or solo");
            std::process::exit(1);
        }
    };

    let alert: Arc<dyn Alert> = Arc::new(ToneAlert::default());
    let cancel = CancellationToken::new();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    let display: SharedDisplay;
    let mut controller: Option<Arc<HostController>> = None;
    let mut tokens: Option<Arc<TokenSource>> = None;

    match mode {
        Mode::Solo => {
            let minutes = env_i32("PODIUM_SOLO_MINUTES", 3);
            let seconds = env_i32("PODIUM_SOLO_SECONDS", 0);
            tracing::info!(minutes, seconds, "Starting solo timer");

            display = Arc::new(Mutex::new(TimerDisplay::new(SOLO_SESSION_ID)));
            let api: Arc<dyn TimerApi> = Arc::new(LocalTimerApi::new(SOLO_SESSION_ID));
            let host = Arc::new(HostController::new(
                Arc::clone(&api),
                Arc::clone(&display),
                Arc::clone(&alert),
            ));
            if let Err(e) = host.set(minutes, seconds).await {
                tracing::error!(error = %e, "Invalid solo timer duration");
                std::process::exit(1);
            }
            if let Err(e) = host.start().await {
                tracing::error!(error = %e, "Failed to start solo timer");
                std::process::exit(1);
            }

            let ticker = CountdownTicker::host(Arc::clone(&display), Arc::clone(&alert), api);
            tasks.push(tokio::spawn(ticker.run(cancel.clone())));
            controller = Some(host);
        }
        Mode::Host | Mode::Observer => {
            let api_url = required_env("PODIUM_API_URL");
            let ws_url = required_env("PODIUM_WS_URL");
            let session_id: DbId = required_env("PODIUM_SESSION_ID")
                .parse()
                .unwrap_or_else(|_| {
                    tracing::error!("PODIUM_SESSION_ID must be a valid integer");
                    std::process::exit(1);
                });

            tracing::info!(?mode, session_id, api_url = %api_url, ws_url = %ws_url, "Starting podium-timer");

            let source = Arc::new(token_source(&api_url, mode).await);
            tokens = Some(Arc::clone(&source));

            display = Arc::new(Mutex::new(TimerDisplay::new(session_id)));
            let api: Arc<dyn TimerApi> =
                Arc::new(HttpTimerApi::new(api_url, Arc::clone(&source), session_id));

            let subscriber =
                ChangeSubscriber::new(ws_url, source, Arc::clone(&display), Arc::clone(&alert));
            let sub_cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                subscriber.run(sub_cancel).await;
            }));

            let ticker = if mode == Mode::Host {
                let host = Arc::new(HostController::new(
                    Arc::clone(&api),
                    Arc::clone(&display),
                    Arc::clone(&alert),
                ));
                if let Err(e) = host.refresh().await {
                    tracing::warn!(error = %e, "Initial timer read failed; waiting for the subscription");
                }
                controller = Some(host);
                CountdownTicker::host(Arc::clone(&display), Arc::clone(&alert), api)
            } else {
                CountdownTicker::observer(Arc::clone(&display), Arc::clone(&alert))
            };
            tasks.push(tokio::spawn(ticker.run(cancel.clone())));
        }
    }

    tasks.push(tokio::spawn(render(Arc::clone(&display), cancel.clone())));
    if let Some(host) = controller {
        tasks.push(tokio::spawn(read_commands(host, cancel.clone())));
    }

    shutdown_signal().await;
    tracing::info!("Shutting down");
    cancel.cancel();
    for task in tasks {
        let _ = task.await;
    }

    if let Some(tokens) = tokens {
        if let Err(e) = tokens.sign_out().await {
            tracing::warn!(error = %e, "Sign-out failed");
        }
    }
}

/// Fixed token from `PODIUM_TOKEN`, or a password sign-in that renews itself.
async fn token_source(api_url: &str, mode: Mode) -> TokenSource {
    if let Ok(token) = std::env::var("PODIUM_TOKEN") {
        return TokenSource::fixed(token);
    }

    let username = required_env("PODIUM_USERNAME");
    let password = required_env("PODIUM_PASSWORD");
    let label = std::env::var("PODIUM_CLIENT_LABEL").unwrap_or_else(|_| {
        let role = if mode == Mode::Host { "host" } else { "observer" };
        format!("podium-timer ({role})")
    });

    TokenSource::sign_in(api_url, &username, &password, &label)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, username = %username, "Sign-in failed");
            std::process::exit(1);
        })
}

/// Log the displayed clock whenever it changes.
async fn render(display: SharedDisplay, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(250));
    let mut last: Option<(i32, bool)> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let (remaining, running) = {
                    let display = display.lock().await;
                    (display.remaining(), display.is_running())
                };
                if last != Some((remaining, running)) {
                    last = Some((remaining, running));
                    tracing::info!(
                        clock = %format_clock(remaining),
                        running,
                        "Timer"
                    );
                }
            }
        }
    }
}

/// Read host commands from stdin until EOF or cancellation.
async fn read_commands(host: Arc<HostController>, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read command");
                break;
            }
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        let result = match parts.as_slice() {
            ["set", minutes, seconds] => match (minutes.parse(), seconds.parse()) {
                (Ok(m), Ok(s)) => host.set(m, s).await.map(|_| ()),
                _ => {
                    tracing::warn!("Usage: set <minutes> <seconds>");
                    continue;
                }
            },
            ["start"] => host.start().await.map(|_| ()),
            ["pause"] => host.pause().await.map(|_| ()),
            ["reset"] => host.reset().await.map(|_| ()),
            [] => continue,
            _ => {
                tracing::warn!(command = %line, "Unknown command (set, start, pause, reset)");
                continue;
            }
        };

        if let Err(e) = result {
            tracing::warn!(command = %line, error = %e, "Command failed");
        }
    }
}

fn required_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        tracing::error!("{name} environment variable is required");
        std::process::exit(1);
    })
}

fn env_i32(name: &str, default: i32) -> i32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
