//! Serenity event wiring.
//!
//! The gateway delivers one event at a time; each hook reduces the payload
//! to what the engine needs and hands off. Reconciliation passes are
//! serialized by a single-flight guard, while reaction events run freely
//! against the atomically swapped association table.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    Context, EventHandler, GuildId as DiscordGuildId, Message, Reaction, Ready, ResumedEvent,
    ShardStageUpdateEvent,
};
use tracing::{error, info, warn};

use rolemenu_core::{CommittedConfig, MessageId, RoleId, UserId};
use rolemenu_engine::{
    load_settings, EngineState, PassOutcome, ReactionEvent, RoleEventHandler, Synchronizer,
    LOAD_OK_STATUS,
};

use crate::adapter::{reaction_symbol_name, DiscordChatClient, DiscordDirectory};
use crate::fetch::SettingsFetcher;

/// Reply sent when a pass converged cleanly.
const UPDATE_OK_REPLY: &str = "Successfully updated messages";
/// Reply sent when a pass completed but some reaction add failed.
const UPDATE_EMOJI_REPLY: &str = "Emoji error on message update";
/// Reply sent when a pass failed outright.
const UPDATE_FAILED_REPLY: &str = "Did not successfully update messages. Check log.";

/// Gateway-facing configuration.
pub struct BotOptions {
    /// Local settings cache, read at startup and rewritten on reload.
    pub settings_path: PathBuf,
    /// Remote settings document URL.
    pub settings_url: String,
    /// Maximum channel history depth scanned per pass.
    pub history_limit: u8,
}

/// The bot: engine state plus the plumbing around it.
pub struct RoleMenuBot {
    state: Arc<EngineState>,
    roles: RoleEventHandler,
    fetcher: SettingsFetcher,
    options: BotOptions,
    pass_guard: tokio::sync::Mutex<()>,
}

impl RoleMenuBot {
    /// Create the bot.
    pub fn new(options: BotOptions) -> anyhow::Result<Self> {
        let state = Arc::new(EngineState::new());
        let roles = RoleEventHandler::new(Arc::clone(&state));
        let fetcher = SettingsFetcher::new(options.settings_url.clone())?;
        Ok(Self {
            state,
            roles,
            fetcher,
            options,
            pass_guard: tokio::sync::Mutex::new(()),
        })
    }

    fn chat_client(&self, ctx: &Context, config: &CommittedConfig) -> DiscordChatClient {
        let bot_user = ctx.cache.current_user().id;
        DiscordChatClient::new(
            ctx.http.clone(),
            config,
            bot_user,
            self.options.history_limit,
        )
    }

    /// Validate and commit a raw settings document. Returns the committed
    /// configuration, or the status line describing the rejection.
    async fn load_config(
        &self,
        ctx: &Context,
        raw: &str,
    ) -> Result<Arc<CommittedConfig>, String> {
        let directory = DiscordDirectory::new(ctx.http.clone());
        match load_settings(raw, &directory).await {
            Ok(config) => {
                info!("{LOAD_OK_STATUS}");
                Ok(self.state.commit_config(config).await)
            }
            Err(e) => {
                warn!("{e}");
                Err(e.to_string())
            }
        }
    }

    /// Run one reconciliation pass under the single-flight guard and swap
    /// the association table.
    async fn run_pass(&self, ctx: &Context, config: &CommittedConfig) -> PassOutcome {
        let _guard = self.pass_guard.lock().await;
        let client = self.chat_client(ctx, config);
        let report = Synchronizer::new(&client).run_pass(config).await;
        self.state.swap_associations(report.associations).await;
        report.outcome
    }

    async fn reply(&self, ctx: &Context, msg: &Message, text: &str) {
        if let Err(e) = msg.channel_id.say(&ctx.http, text).await {
            warn!(error = %e, "could not send reply");
        }
    }

    /// The reload flow: fetch, validate, persist, reconcile, report.
    async fn handle_reload(&self, ctx: &Context, msg: &Message) {
        let raw = match self.fetcher.fetch().await {
            Ok(body) => body,
            Err(e) => {
                let text = e.to_string();
                error!("{text}");
                self.reply(ctx, msg, &text).await;
                return;
            }
        };
        info!(url = %self.fetcher.url(), "downloaded new config");

        let config = match self.load_config(ctx, &raw).await {
            Ok(config) => {
                self.reply(ctx, msg, LOAD_OK_STATUS).await;
                config
            }
            Err(status) => {
                // don't save an invalid file
                self.reply(ctx, msg, &status).await;
                return;
            }
        };

        if let Err(e) = tokio::fs::write(&self.options.settings_path, &raw).await {
            let text = format!(
                "Failed to save settings to {}",
                self.options.settings_path.display()
            );
            error!(error = %e, "{text}");
            self.reply(ctx, msg, &text).await;
        }

        let reply = match self.run_pass(ctx, &config).await {
            PassOutcome::Success => UPDATE_OK_REPLY,
            PassOutcome::EmojiError => UPDATE_EMOJI_REPLY,
            PassOutcome::Failed => UPDATE_FAILED_REPLY,
        };
        self.reply(ctx, msg, reply).await;
    }

    async fn forward_reaction(&self, ctx: &Context, reaction: &Reaction, added: bool) {
        let Some(user_id) = reaction.user_id else {
            return;
        };
        let Some(config) = self.state.config().await else {
            return;
        };

        let from_us = user_id == ctx.cache.current_user().id;
        let event = ReactionEvent {
            message: MessageId::new(reaction.message_id.get()),
            user: UserId::new(user_id.get()),
            symbol_name: reaction_symbol_name(&reaction.emoji),
            from_us,
        };

        let client = self.chat_client(ctx, &config);
        if added {
            self.roles.reaction_added(&client, &event).await;
        } else {
            self.roles.reaction_removed(&client, &event).await;
        }
    }
}

#[async_trait]
impl EventHandler for RoleMenuBot {
    async fn ready(&self, ctx: Context, _ready: Ready) {
        info!("Running");

        // Load the cached settings file and converge the channel.
        let raw = match tokio::fs::read_to_string(&self.options.settings_path).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    path = %self.options.settings_path.display(),
                    error = %e,
                    "load config error"
                );
                return;
            }
        };
        if let Ok(config) = self.load_config(&ctx, &raw).await {
            self.run_pass(&ctx, &config).await;
        }
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        info!("Resumed");
    }

    async fn shard_stage_update(&self, _ctx: Context, event: ShardStageUpdateEvent) {
        info!(shard = %event.shard_id, from = ?event.old, to = ?event.new, "connection stage");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Only direct messages from humans are considered.
        if msg.author.bot || msg.guild_id.is_some() {
            return;
        }
        let Some(config) = self.state.config().await else {
            return;
        };

        // The sender must hold an authorized role on the target space;
        // anyone else is silently ignored.
        let guild = DiscordGuildId::new(config.guild.get());
        let Ok(member) = guild.member(&ctx.http, msg.author.id).await else {
            return;
        };
        let roles: Vec<RoleId> = member.roles.iter().map(|r| RoleId::new(r.get())).collect();
        if !config.authorizes_reload(&roles) {
            return;
        }

        if !msg.content.eq_ignore_ascii_case("reload") {
            return;
        }

        info!(member = %msg.author.name, id = %msg.author.id, "reload requested");
        self.handle_reload(&ctx, &msg).await;
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        self.forward_reaction(&ctx, &reaction, true).await;
    }

    async fn reaction_remove(&self, ctx: Context, reaction: Reaction) {
        self.forward_reaction(&ctx, &reaction, false).await;
    }
}
