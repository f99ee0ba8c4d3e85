//! Narrow interfaces to the chat platform.
//!
//! The engine never talks to the platform directly; it goes through these
//! two seams. The gateway crate provides the real implementations,
//! [`crate::testing::InMemoryChatClient`] provides both for tests.

use async_trait::async_trait;
use rolemenu_core::{ChannelId, EmbedContent, GuildId, MessageId, ReactionSymbol, RoleId, UserId};

use crate::error::Result;
use crate::types::{LiveMessage, MemberView, RoleView};

/// Operations on the target channel and its members.
///
/// An implementation is scoped to one space and one channel. All calls are
/// potentially suspending network I/O; the engine performs them
/// sequentially within a pass.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Fetch the channel's current messages, newest first, up to the
    /// implementation's history depth. Reaction member lists exclude the
    /// bot's own identity.
    async fn channel_history(&self) -> Result<Vec<LiveMessage>>;

    /// Replace a message's embed.
    async fn edit_embed(&self, message: MessageId, embed: &EmbedContent) -> Result<()>;

    /// Send a new message carrying the embed; returns its identity.
    async fn send_embed(&self, embed: &EmbedContent) -> Result<MessageId>;

    /// Delete a message outright.
    async fn delete_message(&self, message: MessageId) -> Result<()>;

    /// Remove every reaction from a message.
    async fn clear_reactions(&self, message: MessageId) -> Result<()>;

    /// React to a message with the bot's own identity. The symbol is
    /// resolved against the space's custom-emoji catalog at this boundary.
    async fn add_reaction(&self, message: MessageId, symbol: &ReactionSymbol) -> Result<()>;

    /// Look up a member of the target space. `Ok(None)` means the user is
    /// not (or no longer) a member.
    async fn member(&self, user: UserId) -> Result<Option<MemberView>>;

    /// Grant a role to a member.
    async fn grant_role(&self, user: UserId, role: RoleId) -> Result<()>;

    /// Revoke a role from a member.
    async fn revoke_role(&self, user: UserId, role: RoleId) -> Result<()>;
}

/// Read-only view of the connected environment, used to validate a
/// settings document before it is committed.
#[async_trait]
pub trait EnvironmentDirectory: Send + Sync {
    /// Whether the bot is connected to the given space.
    async fn space_exists(&self, guild: GuildId) -> bool;

    /// Whether the channel exists within the given space.
    async fn channel_in_space(&self, guild: GuildId, channel: ChannelId) -> bool;

    /// The space's role list.
    async fn space_roles(&self, guild: GuildId) -> Result<Vec<RoleView>>;
}
