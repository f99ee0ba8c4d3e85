//! The raw settings document.
//!
//! This is the externally supplied desired-state document, before any
//! validation against the connected environment. Field names match the
//! JSON document keys.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::types::{AccentColor, ChannelId, GuildId, RoleId};

/// Top-level keys a settings document must carry.
///
/// Checked individually before typed deserialization so each missing key
/// yields its own status message.
pub const REQUIRED_KEYS: [&str; 4] = ["guild", "channel", "reload_roles", "messages"];

/// A parsed settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsDoc {
    /// Target space id.
    pub guild: GuildId,
    /// Target channel id within the space.
    pub channel: ChannelId,
    /// Roles whose holders may trigger a configuration reload.
    pub reload_roles: Vec<RoleId>,
    /// Role-menu message specifications, in display order.
    pub messages: Vec<MessageSpec>,
}

/// One role-menu message specification as written in the document.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageSpec {
    /// Embed title.
    pub title: String,
    /// Embed body text.
    pub message: String,
    /// Accent color as `[r, g, b]`.
    pub color: AccentColor,
    /// Symbol to role-id mapping. Insertion order is meaningful: it is the
    /// creation order of the reactions on the live message.
    #[serde(default)]
    pub reactions: IndexMap<String, RoleId>,
}
