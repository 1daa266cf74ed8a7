//! actions-worker — console driver for the action rule engine.
//!
//! Loads the actions file, watches it for changes, and reads simulated
//! events from stdin:
//!
//! ```text
//! donation 25
//! bits 100
//! sub 6
//! follow
//! raid 40
//! q
//! ```
//!
//! Each event runs through the handler; resulting effects land in the
//! pending queue and are drained to the log, the way a game host would
//! apply them.

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use streamrig_core::{
    ExecParams, Notification, PendingEffects, Settings, SubscriptionTier,
};
use streamrig_engine::{ActionHandler, ActionStore};

/// Action rule engine worker — file-backed actions with hot reload.
#[derive(Parser, Debug)]
#[command(name = "actions-worker", version, about)]
struct Cli {
    /// Path to the JSON actions file.
    #[arg(long, env = "ACTIONS_FILE", default_value = "events.json")]
    actions_file: PathBuf,

    /// Path to the TOML settings file.
    #[arg(long, env = "SETTINGS_FILE", default_value = "settings.toml")]
    settings_file: PathBuf,

    /// Disable the filesystem watcher (reload only on restart).
    #[arg(long)]
    no_watch: bool,
}

/// Parse one stdin line into a simulated notification.
fn parse_line(line: &str) -> Option<Notification> {
    let mut parts = line.split_whitespace();
    let kind = parts.next()?;
    let amount: i64 = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0);

    let name = "console".to_string();
    match kind {
        "donation" => Some(Notification::Donation {
            name,
            amount,
            formatted: format!("${}", amount),
        }),
        "bits" => Some(Notification::TwitchBits { name, amount }),
        "sub" => Some(Notification::TwitchSubscription {
            name,
            months: amount.max(1),
            tier: SubscriptionTier::Tier1,
            resub: amount > 1,
        }),
        "follow" => Some(Notification::TwitchFollow { name }),
        "host" => Some(Notification::TwitchHost {
            name,
            viewers: amount,
        }),
        "raid" => Some(Notification::TwitchRaid {
            name,
            viewers: amount,
        }),
        "superchat" => Some(Notification::YoutubeSuperchat {
            name,
            amount,
            formatted: format!("${}", amount),
        }),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.settings_file)
        .with_context(|| format!("failed to load settings from {}", cli.settings_file.display()))?;

    let mut store = ActionStore::new(cli.actions_file.clone());
    // No registry exists yet, so the initial load failing is fatal.
    store
        .load()
        .with_context(|| format!("failed to load actions from {}", cli.actions_file.display()))?;
    if !cli.no_watch {
        store.watch()?;
    }

    let handler = ActionHandler::new(store, settings.clone());
    let pending = PendingEffects::new(64);

    // Actions that target a player resolve it from this param.
    let mut params = ExecParams::new();
    if !settings.streamer_name.is_empty() {
        params.insert(
            "target".to_string(),
            serde_json::Value::String(settings.streamer_name.clone()),
        );
    }

    info!("actions-worker started, stop with: q");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "q" {
            break;
        }

        let Some(notification) = parse_line(trimmed) else {
            warn!(input = trimmed, "unrecognized event, try: donation 25 | bits 100 | follow | q");
            continue;
        };

        let event = notification.event();
        let actions = handler.get_actions(&event);

        for action in &actions {
            let execution = action.execute(&event, &params);
            if let Some(message) = execution.message {
                info!(%event, action_message = %message, "action executed");
            }
            if let Some(effect) = execution.effect {
                pending.push(effect);
            }
        }

        if let Some(chat) = notification.chat_message(&settings.events, !actions.is_empty()) {
            info!(chat = %chat, "chat message");
        }

        for effect in pending.drain() {
            info!(?effect, "applying effect");
        }
    }

    info!("actions-worker exited cleanly");
    Ok(())
}
