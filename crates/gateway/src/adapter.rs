//! Serenity-backed implementations of the engine's client seams.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ChannelId as DiscordChannelId, Colour, CreateEmbed, CreateMessage, EditMessage, Embed,
    GetMessages, GuildId as DiscordGuildId, Message, MessageId as DiscordMessageId, ReactionType,
    UserId as DiscordUserId,
};
use serenity::http::Http;
use tracing::debug;

use rolemenu_core::{
    AccentColor, ChannelId, CommittedConfig, EmbedContent, GuildId, MessageId, ReactionSymbol,
    RoleId, UserId,
};
use rolemenu_engine::{
    ChatClient, EnvironmentDirectory, Error, LiveMessage, LiveReaction, MemberView, Result,
    RoleView,
};

/// Comparable symbol form of a platform reaction: the unicode literal or
/// the custom emoji's name.
pub fn reaction_symbol_name(reaction: &ReactionType) -> String {
    match reaction {
        ReactionType::Unicode(s) => s.clone(),
        ReactionType::Custom { name, .. } => name.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

fn embed_content(embed: &Embed) -> EmbedContent {
    EmbedContent {
        title: embed.title.clone().unwrap_or_default(),
        body: embed.description.clone().unwrap_or_default(),
        accent: embed
            .colour
            .map(|c| AccentColor::from_packed(c.0))
            .unwrap_or_default(),
    }
}

fn create_embed(content: &EmbedContent) -> CreateEmbed {
    CreateEmbed::new()
        .title(content.title.clone())
        .description(content.body.clone())
        .colour(Colour::new(content.accent.packed()))
}

/// Guild-agnostic view of the connected environment, used while validating
/// a settings document.
pub struct DiscordDirectory {
    http: Arc<Http>,
}

impl DiscordDirectory {
    /// Create a directory over the given HTTP handle.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl EnvironmentDirectory for DiscordDirectory {
    async fn space_exists(&self, guild: GuildId) -> bool {
        if guild.get() == 0 {
            return false;
        }
        self.http
            .get_guild(DiscordGuildId::new(guild.get()))
            .await
            .is_ok()
    }

    async fn channel_in_space(&self, guild: GuildId, channel: ChannelId) -> bool {
        if guild.get() == 0 {
            return false;
        }
        match self.http.get_channels(DiscordGuildId::new(guild.get())).await {
            Ok(channels) => channels.iter().any(|c| c.id.get() == channel.get()),
            Err(e) => {
                debug!(guild = %guild, error = %e, "channel listing failed");
                false
            }
        }
    }

    async fn space_roles(&self, guild: GuildId) -> Result<Vec<RoleView>> {
        if guild.get() == 0 {
            return Ok(Vec::new());
        }
        let guild = self
            .http
            .get_guild(DiscordGuildId::new(guild.get()))
            .await
            .map_err(|e| Error::transport("get_guild", e.to_string()))?;
        Ok(guild
            .roles
            .iter()
            .map(|(id, role)| RoleView {
                id: RoleId::new(id.get()),
                name: role.name.clone(),
            })
            .collect())
    }
}

/// Chat client scoped to one guild and one channel.
pub struct DiscordChatClient {
    http: Arc<Http>,
    guild: DiscordGuildId,
    channel: DiscordChannelId,
    bot_user: DiscordUserId,
    history_limit: u8,
}

impl DiscordChatClient {
    /// Create a client scoped to the committed configuration's targets.
    pub fn new(
        http: Arc<Http>,
        config: &CommittedConfig,
        bot_user: DiscordUserId,
        history_limit: u8,
    ) -> Self {
        Self {
            http,
            guild: DiscordGuildId::new(config.guild.get()),
            channel: DiscordChannelId::new(config.channel.get()),
            bot_user,
            history_limit,
        }
    }

    async fn observe(&self, message: &Message) -> Result<LiveMessage> {
        let authored_by_us = message.author.id == self.bot_user;
        let embeds = message.embeds.iter().map(embed_content).collect();

        // Reaction member lists only feed correlation scoring, which only
        // considers our own messages.
        let mut reactions = Vec::new();
        if authored_by_us {
            for reaction in &message.reactions {
                let users = message
                    .reaction_users(
                        &self.http,
                        reaction.reaction_type.clone(),
                        None,
                        None::<DiscordUserId>,
                    )
                    .await
                    .map_err(|e| Error::transport("reaction_users", e.to_string()))?;
                reactions.push(LiveReaction {
                    symbol_name: reaction_symbol_name(&reaction.reaction_type),
                    by_us: reaction.me,
                    members: users
                        .iter()
                        .filter(|u| u.id != self.bot_user)
                        .map(|u| UserId::new(u.id.get()))
                        .collect(),
                });
            }
        }

        Ok(LiveMessage {
            id: MessageId::new(message.id.get()),
            authored_by_us,
            embeds,
            reactions,
        })
    }

    /// Resolve a configured symbol to a platform reaction, looking custom
    /// emoji names up in the guild's catalog. An unknown name passes
    /// through as a literal, and the add then fails platform-side.
    async fn resolve_symbol(&self, symbol: &ReactionSymbol) -> ReactionType {
        match symbol {
            ReactionSymbol::Literal(s) => ReactionType::Unicode(s.clone()),
            ReactionSymbol::Named(name) => match self.guild.emojis(&self.http).await {
                Ok(emojis) => emojis
                    .into_iter()
                    .find(|e| e.name == *name)
                    .map(|e| ReactionType::Custom {
                        animated: e.animated,
                        id: e.id,
                        name: Some(e.name),
                    })
                    .unwrap_or_else(|| ReactionType::Unicode(name.clone())),
                Err(e) => {
                    debug!(symbol = %name, error = %e, "emoji catalog fetch failed");
                    ReactionType::Unicode(name.clone())
                }
            },
        }
    }
}

#[async_trait]
impl ChatClient for DiscordChatClient {
    async fn channel_history(&self) -> Result<Vec<LiveMessage>> {
        let messages = self
            .channel
            .messages(&self.http, GetMessages::new().limit(self.history_limit))
            .await
            .map_err(|e| Error::transport("channel_history", e.to_string()))?;

        let mut live = Vec::with_capacity(messages.len());
        for message in &messages {
            live.push(self.observe(message).await?);
        }
        Ok(live)
    }

    async fn edit_embed(&self, message: MessageId, embed: &EmbedContent) -> Result<()> {
        self.channel
            .edit_message(
                &self.http,
                DiscordMessageId::new(message.get()),
                EditMessage::new().embed(create_embed(embed)),
            )
            .await
            .map(|_| ())
            .map_err(|e| Error::transport("edit_message", e.to_string()))
    }

    async fn send_embed(&self, embed: &EmbedContent) -> Result<MessageId> {
        let sent = self
            .channel
            .send_message(&self.http, CreateMessage::new().embed(create_embed(embed)))
            .await
            .map_err(|e| Error::transport("send_message", e.to_string()))?;
        Ok(MessageId::new(sent.id.get()))
    }

    async fn delete_message(&self, message: MessageId) -> Result<()> {
        self.channel
            .delete_message(&self.http, DiscordMessageId::new(message.get()))
            .await
            .map_err(|e| Error::transport("delete_message", e.to_string()))
    }

    async fn clear_reactions(&self, message: MessageId) -> Result<()> {
        self.http
            .delete_message_reactions(self.channel, DiscordMessageId::new(message.get()))
            .await
            .map_err(|e| Error::transport("clear_reactions", e.to_string()))
    }

    async fn add_reaction(&self, message: MessageId, symbol: &ReactionSymbol) -> Result<()> {
        let reaction = self.resolve_symbol(symbol).await;
        self.http
            .create_reaction(self.channel, DiscordMessageId::new(message.get()), &reaction)
            .await
            .map_err(|e| Error::transport("add_reaction", e.to_string()))
    }

    async fn member(&self, user: UserId) -> Result<Option<MemberView>> {
        // A failed lookup reads as not-a-member; the event or pass goes on.
        match self.guild.member(&self.http, DiscordUserId::new(user.get())).await {
            Ok(member) => Ok(Some(MemberView {
                name: member.user.name.clone(),
                roles: member.roles.iter().map(|r| RoleId::new(r.get())).collect(),
            })),
            Err(e) => {
                debug!(member = %user, error = %e, "member lookup failed");
                Ok(None)
            }
        }
    }

    async fn grant_role(&self, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(
                self.guild,
                DiscordUserId::new(user.get()),
                serenity::all::RoleId::new(role.get()),
                None,
            )
            .await
            .map_err(|e| Error::transport("add_member_role", e.to_string()))
    }

    async fn revoke_role(&self, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .remove_member_role(
                self.guild,
                DiscordUserId::new(user.get()),
                serenity::all::RoleId::new(role.get()),
                None,
            )
            .await
            .map_err(|e| Error::transport("remove_member_role", e.to_string()))
    }
}
