//! In-memory chat client for tests.
//!
//! Implements both [`ChatClient`] and [`EnvironmentDirectory`] over a
//! scripted space: seeded roles, members, and channel messages. Every side
//! effect is recorded as an [`Op`] so tests can assert exactly what a pass
//! did. Failure injection mirrors the platform failures the engine has to
//! tolerate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use rolemenu_core::{ChannelId, EmbedContent, GuildId, MessageId, ReactionSymbol, RoleId, UserId};
use tokio::sync::RwLock;

use crate::client::{ChatClient, EnvironmentDirectory};
use crate::error::{Error, Result};
use crate::types::{LiveMessage, LiveReaction, MemberView, RoleView};

/// A recorded side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// A message's embed was edited.
    Edited(MessageId),
    /// A new message was sent.
    Created(MessageId),
    /// A message was deleted.
    Deleted(MessageId),
    /// All reactions were cleared from a message.
    Cleared(MessageId),
    /// The bot reacted with a symbol.
    ReactionAdded(MessageId, String),
    /// A role was granted to a member.
    RoleGranted(UserId, RoleId),
    /// A role was revoked from a member.
    RoleRevoked(UserId, RoleId),
}

#[derive(Debug, Clone)]
struct StoredReaction {
    symbol_name: String,
    by_us: bool,
    members: Vec<UserId>,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: MessageId,
    authored_by_us: bool,
    embeds: Vec<EmbedContent>,
    reactions: Vec<StoredReaction>,
}

/// Scripted in-memory chat space.
pub struct InMemoryChatClient {
    guild: GuildId,
    channel: ChannelId,
    roles: Vec<RoleView>,
    members: RwLock<HashMap<UserId, MemberView>>,
    messages: RwLock<Vec<StoredMessage>>,
    ops: RwLock<Vec<Op>>,
    next_id: AtomicU64,
    failing_members: HashSet<UserId>,
    failing_symbols: HashSet<String>,
    fail_history: AtomicBool,
    fail_role_ops: AtomicBool,
}

impl InMemoryChatClient {
    /// Create an empty space with the given guild and channel ids.
    pub fn new(guild: GuildId, channel: ChannelId) -> Self {
        Self {
            guild,
            channel,
            roles: Vec::new(),
            members: RwLock::new(HashMap::new()),
            messages: RwLock::new(Vec::new()),
            ops: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            failing_members: HashSet::new(),
            failing_symbols: HashSet::new(),
            fail_history: AtomicBool::new(false),
            fail_role_ops: AtomicBool::new(false),
        }
    }

    /// Add a role to the space.
    pub fn with_role(mut self, id: RoleId, name: &str) -> Self {
        self.roles.push(RoleView {
            id,
            name: name.to_string(),
        });
        self
    }

    /// Add a member holding the given roles.
    pub fn with_member(mut self, id: UserId, name: &str, roles: &[RoleId]) -> Self {
        self.members.get_mut().insert(
            id,
            MemberView {
                name: name.to_string(),
                roles: roles.to_vec(),
            },
        );
        self
    }

    /// Make every lookup of this member fail with a transport error.
    pub fn with_failing_member(mut self, id: UserId) -> Self {
        self.failing_members.insert(id);
        self
    }

    /// Make every add of this symbol fail with a transport error.
    pub fn with_failing_symbol(mut self, symbol_name: &str) -> Self {
        self.failing_symbols.insert(symbol_name.to_string());
        self
    }

    /// Make the history fetch fail.
    pub fn with_failing_history(self) -> Self {
        self.fail_history.store(true, Ordering::Relaxed);
        self
    }

    /// Make role grants and revokes fail.
    pub fn with_failing_role_ops(self) -> Self {
        self.fail_role_ops.store(true, Ordering::Relaxed);
        self
    }

    /// Seed a bot-authored message with the given embed and reactions.
    ///
    /// Reactions are `(symbol_name, by_us, reacting members)`; member lists
    /// never include the bot, matching what a history fetch reports.
    pub async fn seed_own_message(
        &self,
        embed: &EmbedContent,
        reactions: &[(&str, bool, &[UserId])],
    ) -> MessageId {
        self.seed_message(embed, reactions, true).await
    }

    /// Seed a message authored by someone else.
    pub async fn seed_foreign_message(&self, embed: &EmbedContent) -> MessageId {
        self.seed_message(embed, &[], false).await
    }

    async fn seed_message(
        &self,
        embed: &EmbedContent,
        reactions: &[(&str, bool, &[UserId])],
        authored_by_us: bool,
    ) -> MessageId {
        let id = MessageId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.messages.write().await.push(StoredMessage {
            id,
            authored_by_us,
            embeds: vec![embed.clone()],
            reactions: reactions
                .iter()
                .map(|(symbol, by_us, members)| StoredReaction {
                    symbol_name: (*symbol).to_string(),
                    by_us: *by_us,
                    members: members.to_vec(),
                })
                .collect(),
        });
        id
    }

    /// Drain and return the recorded side effects.
    pub async fn take_ops(&self) -> Vec<Op> {
        std::mem::take(&mut *self.ops.write().await)
    }

    /// Current message ids in the channel, in storage order.
    pub async fn message_ids(&self) -> Vec<MessageId> {
        self.messages.read().await.iter().map(|m| m.id).collect()
    }

    async fn record(&self, op: Op) {
        self.ops.write().await.push(op);
    }
}

#[async_trait]
impl ChatClient for InMemoryChatClient {
    async fn channel_history(&self) -> Result<Vec<LiveMessage>> {
        if self.fail_history.load(Ordering::Relaxed) {
            return Err(Error::transport("channel_history", "history unreadable"));
        }
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .map(|m| LiveMessage {
                id: m.id,
                authored_by_us: m.authored_by_us,
                embeds: m.embeds.clone(),
                reactions: m
                    .reactions
                    .iter()
                    .map(|r| LiveReaction {
                        symbol_name: r.symbol_name.clone(),
                        by_us: r.by_us,
                        members: r.members.clone(),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn edit_embed(&self, message: MessageId, embed: &EmbedContent) -> Result<()> {
        let mut messages = self.messages.write().await;
        let stored = messages
            .iter_mut()
            .find(|m| m.id == message)
            .ok_or_else(|| Error::transport("edit_embed", "unknown message"))?;
        stored.embeds = vec![embed.clone()];
        drop(messages);
        self.record(Op::Edited(message)).await;
        Ok(())
    }

    async fn send_embed(&self, embed: &EmbedContent) -> Result<MessageId> {
        let id = self.seed_message(embed, &[], true).await;
        self.record(Op::Created(id)).await;
        Ok(id)
    }

    async fn delete_message(&self, message: MessageId) -> Result<()> {
        self.messages.write().await.retain(|m| m.id != message);
        self.record(Op::Deleted(message)).await;
        Ok(())
    }

    async fn clear_reactions(&self, message: MessageId) -> Result<()> {
        let mut messages = self.messages.write().await;
        let stored = messages
            .iter_mut()
            .find(|m| m.id == message)
            .ok_or_else(|| Error::transport("clear_reactions", "unknown message"))?;
        stored.reactions.clear();
        drop(messages);
        self.record(Op::Cleared(message)).await;
        Ok(())
    }

    async fn add_reaction(&self, message: MessageId, symbol: &ReactionSymbol) -> Result<()> {
        let name = symbol.name();
        if self.failing_symbols.contains(name) {
            return Err(Error::transport("add_reaction", "unknown emoji"));
        }
        let mut messages = self.messages.write().await;
        let stored = messages
            .iter_mut()
            .find(|m| m.id == message)
            .ok_or_else(|| Error::transport("add_reaction", "unknown message"))?;
        match stored.reactions.iter_mut().find(|r| r.symbol_name == name) {
            Some(reaction) => reaction.by_us = true,
            None => stored.reactions.push(StoredReaction {
                symbol_name: name.to_string(),
                by_us: true,
                members: Vec::new(),
            }),
        }
        drop(messages);
        self.record(Op::ReactionAdded(message, name.to_string()))
            .await;
        Ok(())
    }

    async fn member(&self, user: UserId) -> Result<Option<MemberView>> {
        if self.failing_members.contains(&user) {
            return Err(Error::transport("member", "lookup failed"));
        }
        Ok(self.members.read().await.get(&user).cloned())
    }

    async fn grant_role(&self, user: UserId, role: RoleId) -> Result<()> {
        if self.fail_role_ops.load(Ordering::Relaxed) {
            return Err(Error::transport("grant_role", "missing permission"));
        }
        let mut members = self.members.write().await;
        let member = members
            .get_mut(&user)
            .ok_or_else(|| Error::transport("grant_role", "unknown member"))?;
        if !member.roles.contains(&role) {
            member.roles.push(role);
        }
        drop(members);
        self.record(Op::RoleGranted(user, role)).await;
        Ok(())
    }

    async fn revoke_role(&self, user: UserId, role: RoleId) -> Result<()> {
        if self.fail_role_ops.load(Ordering::Relaxed) {
            return Err(Error::transport("revoke_role", "missing permission"));
        }
        let mut members = self.members.write().await;
        let member = members
            .get_mut(&user)
            .ok_or_else(|| Error::transport("revoke_role", "unknown member"))?;
        member.roles.retain(|r| *r != role);
        drop(members);
        self.record(Op::RoleRevoked(user, role)).await;
        Ok(())
    }
}

#[async_trait]
impl EnvironmentDirectory for InMemoryChatClient {
    async fn space_exists(&self, guild: GuildId) -> bool {
        guild == self.guild
    }

    async fn channel_in_space(&self, guild: GuildId, channel: ChannelId) -> bool {
        guild == self.guild && channel == self.channel
    }

    async fn space_roles(&self, guild: GuildId) -> Result<Vec<RoleView>> {
        if guild == self.guild {
            Ok(self.roles.clone())
        } else {
            Ok(Vec::new())
        }
    }
}
