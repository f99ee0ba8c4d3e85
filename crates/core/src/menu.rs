//! Committed (validated and resolved) configuration.

use std::sync::Arc;

use crate::types::{ChannelId, EmbedContent, GuildId, ReactionSymbol, RoleId};

/// One reaction option on a role menu: the configured symbol and the role
/// it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionBinding {
    /// The configured symbol.
    pub symbol: ReactionSymbol,
    /// The role granted to members who react with the symbol.
    pub role: RoleId,
    /// The role's display name, for log lines.
    pub role_name: String,
}

/// One role-menu message as it should exist in the channel.
///
/// Immutable once committed; a configuration reload replaces the whole
/// list wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredMessage {
    /// The renderable embed.
    pub embed: EmbedContent,
    /// Reaction options in creation order.
    pub reactions: Vec<ReactionBinding>,
}

impl DesiredMessage {
    /// Look up the binding whose symbol has the given comparable name.
    pub fn binding_for(&self, symbol_name: &str) -> Option<&ReactionBinding> {
        self.reactions.iter().find(|b| b.symbol.name() == symbol_name)
    }

    /// Whether any binding uses the given symbol name.
    pub fn contains_symbol(&self, symbol_name: &str) -> bool {
        self.binding_for(symbol_name).is_some()
    }
}

/// A validated configuration, resolved against the connected environment.
///
/// Replaced wholesale on every successful reload; never mutated in place.
#[derive(Debug, Clone)]
pub struct CommittedConfig {
    /// Target space.
    pub guild: GuildId,
    /// Target channel within the space.
    pub channel: ChannelId,
    /// Roles whose holders may trigger a reload.
    pub reload_roles: Vec<RoleId>,
    /// Role-menu messages in display order.
    pub messages: Vec<Arc<DesiredMessage>>,
}

impl CommittedConfig {
    /// Whether a member holding `roles` is authorized to trigger a reload.
    pub fn authorizes_reload(&self, roles: &[RoleId]) -> bool {
        roles.iter().any(|r| self.reload_roles.contains(r))
    }
}
