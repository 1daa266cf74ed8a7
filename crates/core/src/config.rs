//! Plugin settings loaded from a TOML file.
//!
//! Covers the fuzzy-matching switches and the per-event chat message
//! templates. Templates use positional `{0}`/`{1}`/`{2}` placeholders; the
//! argument order per event is documented on each field.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Errors from loading the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level plugin settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Donations that match no action fall back to the closest action with
    /// a lower donation goal.
    pub fuzzy_donations: bool,
    /// Same fallback for subscription months.
    pub fuzzy_subs: bool,
    /// Same fallback for bit cheers.
    pub fuzzy_bits: bool,
    /// Display name actions use to pick the target player.
    pub streamer_name: String,
    pub events: EventMessages,
}

impl Settings {
    /// Load settings from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// A single chat message template with its send policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessageTemplate {
    pub message: String,
    /// Send the message even when no action executed for the event.
    pub always_send: bool,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            message: String::new(),
            always_send: false,
        }
    }
}

impl MessageTemplate {
    fn new(message: &str, always_send: bool) -> Self {
        Self {
            message: message.to_string(),
            always_send,
        }
    }
}

/// Templates for subscription-like events with separate new/resub wording.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubscriptionMessages {
    pub new_message: String,
    pub resub_message: String,
    pub always_send: bool,
    pub tier1: String,
    pub tier2: String,
    pub tier3: String,
}

impl Default for SubscriptionMessages {
    fn default() -> Self {
        Self {
            new_message: String::new(),
            resub_message: String::new(),
            always_send: false,
            tier1: "Tier 1".to_string(),
            tier2: "Tier 2".to_string(),
            tier3: "Tier 3".to_string(),
        }
    }
}

/// Per-event chat message templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventMessages {
    /// 0: name of donor, 1: formatted amount donated.
    pub donation: MessageTemplate,
    /// new: 0: name, 1: tier — resub: 0: name, 1: tier, 2: months.
    pub twitch_subscription: SubscriptionMessages,
    /// 0: name of cheerer, 1: amount cheered.
    pub twitch_bits: MessageTemplate,
    /// 0: name of follower.
    pub twitch_follow: MessageTemplate,
    /// 0: name of user hosting, 1: amount of viewers.
    pub twitch_host: MessageTemplate,
    /// 0: name of raider, 1: amount of viewers.
    pub twitch_raid: MessageTemplate,
    /// 0: name of redeemer, 1: reward identifier.
    pub twitch_channel_points: MessageTemplate,
    /// 0: name of subscriber.
    pub youtube_subscription: MessageTemplate,
    /// new: 0: name — resub: 0: name, 1: months.
    pub youtube_sponsor: SubscriptionMessages,
    /// 0: name of superchatter, 1: formatted amount.
    pub youtube_superchat: MessageTemplate,
    /// new: 0: name — resub: 0: name, 1: months.
    pub mixer_subscription: SubscriptionMessages,
    /// 0: name of follower.
    pub mixer_follow: MessageTemplate,
    /// 0: name of user hosting, 1: amount of viewers.
    pub mixer_host: MessageTemplate,
}

impl Default for EventMessages {
    fn default() -> Self {
        Self {
            donation: MessageTemplate::new("{0} donated {1}!", true),
            twitch_subscription: SubscriptionMessages {
                new_message: "{0} subscribed with a {1} subscription!".to_string(),
                resub_message: "{0} subscribed with a {1} subscription for {2} months!"
                    .to_string(),
                always_send: true,
                ..SubscriptionMessages::default()
            },
            twitch_bits: MessageTemplate::new("{0} cheer with {1} bits!", true),
            twitch_follow: MessageTemplate::new("{0} followed!", false),
            twitch_host: MessageTemplate::new("{0} hosted with {1} viewers!", false),
            twitch_raid: MessageTemplate::new("{0} raided with {1} viewers!", false),
            twitch_channel_points: MessageTemplate::new("{0} redeemed {1}!", false),
            youtube_subscription: MessageTemplate::new("{0} subscribed!", false),
            youtube_sponsor: SubscriptionMessages {
                new_message: "{0} sponsored the channel!".to_string(),
                resub_message: "{0} sponsored the channel for {1} months!".to_string(),
                always_send: false,
                ..SubscriptionMessages::default()
            },
            youtube_superchat: MessageTemplate::new("{0} superchatted with {1}!", false),
            mixer_subscription: SubscriptionMessages {
                new_message: "{0} subscribed to the channel!".to_string(),
                resub_message: "{0} subscribed for {1} months!".to_string(),
                always_send: false,
                ..SubscriptionMessages::default()
            },
            mixer_follow: MessageTemplate::new("{0} followed!", false),
            mixer_host: MessageTemplate::new("{0} hosted with {1} viewers!", false),
        }
    }
}

/// Substitute positional `{n}` placeholders with the given arguments.
///
/// Unknown placeholders are left verbatim.
pub fn format_positional(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), arg);
    }
    out
}

// ── Tests ───────────────────────────────────────────────────────────
