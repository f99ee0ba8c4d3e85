//! Core identifier and content types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Unique identifier for a chat space (guild).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildId(u64);

impl GuildId {
    /// Create from a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Create from a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    /// Create from a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a member (user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    /// Create from a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(u64);

impl RoleId {
    /// Create from a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RGB accent color of a menu embed.
///
/// Stored as the three channel bytes from the settings document
/// (`"color": [r, g, b]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentColor([u8; 3]);

impl AccentColor {
    /// Create from the three channel bytes.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Pack into the platform's single-integer color form.
    pub fn packed(&self) -> u32 {
        (u32::from(self.0[0]) << 16) | (u32::from(self.0[1]) << 8) | u32::from(self.0[2])
    }

    /// Unpack from the platform's single-integer color form.
    pub fn from_packed(value: u32) -> Self {
        Self([(value >> 16) as u8, (value >> 8) as u8, value as u8])
    }
}

/// A reaction symbol as configured: either a literal unicode symbol or the
/// name of a custom emoji in the target space's catalog.
///
/// Resolution to a platform handle happens only at the synchronization
/// boundary; the configured form is what gets stored and compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionSymbol {
    /// A literal multi-byte unicode symbol, e.g. "🔵".
    Literal(String),
    /// The name of a custom emoji, looked up in the space's catalog.
    Named(String),
}

impl ReactionSymbol {
    /// Classify a raw symbol string from the settings document.
    ///
    /// Custom emoji names start with an ASCII byte; unicode symbols do not.
    pub fn parse(raw: &str) -> Self {
        if raw.chars().next().is_some_and(|c| c.is_ascii()) {
            Self::Named(raw.to_string())
        } else {
            Self::Literal(raw.to_string())
        }
    }

    /// The comparable string form: the literal symbol or the emoji name.
    ///
    /// Reaction events carry this form regardless of variant.
    pub fn name(&self) -> &str {
        match self {
            Self::Literal(s) | Self::Named(s) => s,
        }
    }
}

impl std::fmt::Display for ReactionSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The renderable content of a role-menu message.
///
/// Equality is content equality; the synchronizer uses it to suppress
/// redundant edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedContent {
    /// Embed title.
    pub title: String,
    /// Embed body text.
    pub body: String,
    /// Accent color.
    pub accent: AccentColor,
}

impl EmbedContent {
    /// Create new embed content.
    pub fn new(title: impl Into<String>, body: impl Into<String>, accent: AccentColor) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            accent,
        }
    }
}
