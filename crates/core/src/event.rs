//! Normalized event model shared between platform adapters and the engine.
//!
//! Each upstream notification is reduced to an [`Event`]: a type tag plus a
//! single signed magnitude. Events are created per notification, evaluated
//! once, and discarded — they are never stored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel magnitude for event types without a natural amount (follows,
/// plain subscriptions).
pub const NO_AMOUNT: i64 = -1;

/// Upstream notification kinds the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Donation,
    TwitchSubscription,
    TwitchBits,
    TwitchFollow,
    TwitchHost,
    TwitchRaid,
    TwitchExtension,
    TwitchChannelPoints,
    YoutubeSubscription,
    YoutubeSponsor,
    YoutubeSuperchat,
    MixerSubscription,
    MixerFollow,
    MixerHost,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Donation => "donation",
            EventType::TwitchSubscription => "twitch_subscription",
            EventType::TwitchBits => "twitch_bits",
            EventType::TwitchFollow => "twitch_follow",
            EventType::TwitchHost => "twitch_host",
            EventType::TwitchRaid => "twitch_raid",
            EventType::TwitchExtension => "twitch_extension",
            EventType::TwitchChannelPoints => "twitch_channel_points",
            EventType::YoutubeSubscription => "youtube_subscription",
            EventType::YoutubeSponsor => "youtube_sponsor",
            EventType::YoutubeSuperchat => "youtube_superchat",
            EventType::MixerSubscription => "mixer_subscription",
            EventType::MixerFollow => "mixer_follow",
            EventType::MixerHost => "mixer_host",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "donation" => Ok(EventType::Donation),
            "twitch_subscription" => Ok(EventType::TwitchSubscription),
            "twitch_bits" => Ok(EventType::TwitchBits),
            "twitch_follow" => Ok(EventType::TwitchFollow),
            "twitch_host" => Ok(EventType::TwitchHost),
            "twitch_raid" => Ok(EventType::TwitchRaid),
            "twitch_extension" => Ok(EventType::TwitchExtension),
            "twitch_channel_points" => Ok(EventType::TwitchChannelPoints),
            "youtube_subscription" => Ok(EventType::YoutubeSubscription),
            "youtube_sponsor" => Ok(EventType::YoutubeSponsor),
            "youtube_superchat" => Ok(EventType::YoutubeSuperchat),
            "mixer_subscription" => Ok(EventType::MixerSubscription),
            "mixer_follow" => Ok(EventType::MixerFollow),
            "mixer_host" => Ok(EventType::MixerHost),
            other => Err(format!("unknown event type: '{}'", other)),
        }
    }
}

/// Category an event type falls into for the closest-lower-threshold
/// fallback. Only these three categories can opt in via [`crate::Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyCategory {
    Donations,
    Subscriptions,
    Bits,
}

/// One normalized upstream notification: type plus magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub amount: i64,
}

impl Event {
    pub fn new(event_type: EventType, amount: i64) -> Self {
        Self { event_type, amount }
    }

    /// Event for a type without a natural magnitude (amount is [`NO_AMOUNT`]).
    pub fn without_amount(event_type: EventType) -> Self {
        Self {
            event_type,
            amount: NO_AMOUNT,
        }
    }

    /// Fuzzy-match category of this event's type, if it has one.
    pub fn fuzzy_category(&self) -> Option<FuzzyCategory> {
        match self.event_type {
            EventType::Donation => Some(FuzzyCategory::Donations),
            EventType::TwitchSubscription
            | EventType::YoutubeSponsor
            | EventType::MixerSubscription => Some(FuzzyCategory::Subscriptions),
            EventType::TwitchBits => Some(FuzzyCategory::Bits),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.event_type, self.amount)
    }
}

// ── Notification normalizer ─────────────────────────────────────────

/// Twitch subscription tier, labelled via the configured tier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Tier1,
    Tier2,
    Tier3,
}

/// Raw upstream notification as delivered by a platform adapter.
///
/// `event()` is the normalization table: every variant maps to exactly one
/// [`Event`], with [`NO_AMOUNT`] for magnitude-less types.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Donation {
        name: String,
        amount: i64,
        formatted: String,
    },
    TwitchSubscription {
        name: String,
        months: i64,
        tier: SubscriptionTier,
        resub: bool,
    },
    TwitchBits {
        name: String,
        amount: i64,
    },
    TwitchFollow {
        name: String,
    },
    TwitchHost {
        name: String,
        viewers: i64,
    },
    TwitchRaid {
        name: String,
        viewers: i64,
    },
    TwitchChannelPoints {
        name: String,
        reward: String,
    },
    YoutubeSubscription {
        name: String,
    },
    YoutubeSponsor {
        name: String,
        months: i64,
    },
    YoutubeSuperchat {
        name: String,
        amount: i64,
        formatted: String,
    },
    MixerSubscription {
        name: String,
        months: i64,
    },
    MixerFollow {
        name: String,
    },
    MixerHost {
        name: String,
        viewers: i64,
    },
}

impl Notification {
    /// Normalize to the engine's event record.
    pub fn event(&self) -> Event {
        match self {
            Notification::Donation { amount, .. } => Event::new(EventType::Donation, *amount),
            Notification::TwitchSubscription { months, .. } => {
                Event::new(EventType::TwitchSubscription, *months)
            }
            Notification::TwitchBits { amount, .. } => Event::new(EventType::TwitchBits, *amount),
            Notification::TwitchFollow { .. } => Event::without_amount(EventType::TwitchFollow),
            Notification::TwitchHost { viewers, .. } => Event::new(EventType::TwitchHost, *viewers),
            Notification::TwitchRaid { viewers, .. } => Event::new(EventType::TwitchRaid, *viewers),
            Notification::TwitchChannelPoints { .. } => {
                Event::new(EventType::TwitchChannelPoints, 0)
            }
            Notification::YoutubeSubscription { .. } => {
                Event::without_amount(EventType::YoutubeSubscription)
            }
            Notification::YoutubeSponsor { months, .. } => {
                Event::new(EventType::YoutubeSponsor, *months)
            }
            Notification::YoutubeSuperchat { amount, .. } => {
                Event::new(EventType::YoutubeSuperchat, *amount)
            }
            Notification::MixerSubscription { months, .. } => {
                Event::new(EventType::MixerSubscription, *months)
            }
            Notification::MixerFollow { .. } => Event::without_amount(EventType::MixerFollow),
            Notification::MixerHost { viewers, .. } => Event::new(EventType::MixerHost, *viewers),
        }
    }

    /// Format the configured chat message for this notification.
    ///
    /// `executed` is whether at least one action ran for the event; templates
    /// marked `always_send` produce a message regardless.
    pub fn chat_message(
        &self,
        messages: &crate::config::EventMessages,
        executed: bool,
    ) -> Option<String> {
        use crate::config::format_positional;

        let (template, always_send) = match self {
            Notification::Donation {
                name, formatted, ..
            } => (
                format_positional(&messages.donation.message, &[name, formatted]),
                messages.donation.always_send,
            ),
            Notification::TwitchSubscription {
                name,
                months,
                tier,
                resub,
            } => {
                let sub = &messages.twitch_subscription;
                let tier_name = match tier {
                    SubscriptionTier::Tier1 => &sub.tier1,
                    SubscriptionTier::Tier2 => &sub.tier2,
                    SubscriptionTier::Tier3 => &sub.tier3,
                };
                let text = if *resub {
                    format_positional(
                        &sub.resub_message,
                        &[name, tier_name, &months.to_string()],
                    )
                } else {
                    format_positional(&sub.new_message, &[name, tier_name])
                };
                (text, sub.always_send)
            }
            Notification::TwitchBits { name, amount } => (
                format_positional(&messages.twitch_bits.message, &[name, &amount.to_string()]),
                messages.twitch_bits.always_send,
            ),
            Notification::TwitchFollow { name } => (
                format_positional(&messages.twitch_follow.message, &[name]),
                messages.twitch_follow.always_send,
            ),
            Notification::TwitchHost { name, viewers } => (
                format_positional(&messages.twitch_host.message, &[name, &viewers.to_string()]),
                messages.twitch_host.always_send,
            ),
            Notification::TwitchRaid { name, viewers } => (
                format_positional(&messages.twitch_raid.message, &[name, &viewers.to_string()]),
                messages.twitch_raid.always_send,
            ),
            Notification::TwitchChannelPoints { name, reward } => (
                format_positional(&messages.twitch_channel_points.message, &[name, reward]),
                messages.twitch_channel_points.always_send,
            ),
            Notification::YoutubeSubscription { name } => (
                format_positional(&messages.youtube_subscription.message, &[name]),
                messages.youtube_subscription.always_send,
            ),
            Notification::YoutubeSponsor { name, months } => {
                let sponsor = &messages.youtube_sponsor;
                let text = if *months > 1 {
                    format_positional(&sponsor.resub_message, &[name, &months.to_string()])
                } else {
                    format_positional(&sponsor.new_message, &[name])
                };
                (text, sponsor.always_send)
            }
            Notification::YoutubeSuperchat {
                name, formatted, ..
            } => (
                format_positional(&messages.youtube_superchat.message, &[name, formatted]),
                messages.youtube_superchat.always_send,
            ),
            Notification::MixerSubscription { name, months } => {
                let sub = &messages.mixer_subscription;
                let text = if *months > 1 {
                    format_positional(&sub.resub_message, &[name, &months.to_string()])
                } else {
                    format_positional(&sub.new_message, &[name])
                };
                (text, sub.always_send)
            }
            Notification::MixerFollow { name } => (
                format_positional(&messages.mixer_follow.message, &[name]),
                messages.mixer_follow.always_send,
            ),
            Notification::MixerHost { name, viewers } => (
                format_positional(&messages.mixer_host.message, &[name, &viewers.to_string()]),
                messages.mixer_host.always_send,
            ),
        };

        if executed || always_send {
            Some(template)
        } else {
            None
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventMessages;

    #[test]
    fn event_type_roundtrip() {
        for ty in [
            EventType::Donation,
            EventType::TwitchBits,
            EventType::MixerHost,
            EventType::TwitchChannelPoints,
        ] {
            assert_eq!(ty.to_string().parse::<EventType>().unwrap(), ty);
        }
        assert!("nope".parse::<EventType>().is_err());
    }

    #[test]
    fn follows_have_no_amount() {
        let event = Notification::TwitchFollow {
            name: "viewer".to_string(),
        }
        .event();
        assert_eq!(event.amount, NO_AMOUNT);
        assert_eq!(event.event_type, EventType::TwitchFollow);
    }

    #[test]
    fn channel_points_normalize_to_zero() {
        let event = Notification::TwitchChannelPoints {
            name: "viewer".to_string(),
            reward: "reward-id".to_string(),
        }
        .event();
        assert_eq!(event.amount, 0);
    }

    #[test]
    fn hosts_carry_viewer_count() {
        let event = Notification::TwitchHost {
            name: "host".to_string(),
            viewers: 42,
        }
        .event();
        assert_eq!(event, Event::new(EventType::TwitchHost, 42));
    }

    #[test]
    fn fuzzy_categories() {
        assert_eq!(
            Event::new(EventType::Donation, 5).fuzzy_category(),
            Some(FuzzyCategory::Donations)
        );
        assert_eq!(
            Event::new(EventType::TwitchBits, 5).fuzzy_category(),
            Some(FuzzyCategory::Bits)
        );
        assert_eq!(
            Event::new(EventType::MixerSubscription, 2).fuzzy_category(),
            Some(FuzzyCategory::Subscriptions)
        );
        assert_eq!(Event::without_amount(EventType::TwitchFollow).fuzzy_category(), None);
    }

    #[test]
    fn donation_message_always_sent() {
        let messages = EventMessages::default();
        let notification = Notification::Donation {
            name: "donor".to_string(),
            amount: 20,
            formatted: "$20".to_string(),
        };
        // Donations default to always_send.
        let msg = notification.chat_message(&messages, false).unwrap();
        assert_eq!(msg, "donor donated $20!");
    }

    #[test]
    fn follow_message_suppressed_without_execution() {
        let messages = EventMessages::default();
        let notification = Notification::TwitchFollow {
            name: "viewer".to_string(),
        };
        assert_eq!(notification.chat_message(&messages, false), None);
        assert_eq!(
            notification.chat_message(&messages, true).unwrap(),
            "viewer followed!"
        );
    }

    #[test]
    fn resub_message_uses_tier_and_months() {
        let messages = EventMessages::default();
        let notification = Notification::TwitchSubscription {
            name: "sub".to_string(),
            months: 6,
            tier: SubscriptionTier::Tier2,
            resub: true,
        };
        let msg = notification.chat_message(&messages, true).unwrap();
        assert_eq!(msg, "sub subscribed with a Tier 2 subscription for 6 months!");
    }
}
