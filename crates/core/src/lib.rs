//! Core vocabulary for the rolemenu workspace.
//!
//! Platform-agnostic types shared by the reconciliation engine and the
//! Discord gateway: typed ids, embed content, the reaction symbol variant,
//! the raw settings document, and the committed configuration it becomes
//! after validation.

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod error;
pub mod menu;
pub mod settings;
pub mod types;

pub use error::ConfigError;
pub use menu::{CommittedConfig, DesiredMessage, ReactionBinding};
pub use settings::{MessageSpec, SettingsDoc, REQUIRED_KEYS};
pub use types::{
    AccentColor, ChannelId, EmbedContent, GuildId, MessageId, ReactionSymbol, RoleId, UserId,
};
