//! Message synchronization: applying one assignment to the channel.
//!
//! One pass fetches history, scores, assigns, then applies side effects
//! sequentially: matched pairs first (in desired order), then deletions,
//! then creations. The association table is rebuilt from scratch during
//! the pass and handed back for a wholesale swap.

use std::sync::Arc;

use rolemenu_core::{CommittedConfig, DesiredMessage, MessageId};
use tracing::{error, info, warn};

use crate::client::ChatClient;
use crate::correlation;
use crate::error::Result;
use crate::reconcile;
use crate::types::{AssociationTable, LiveMessage, PassOutcome, PassReport};

/// Runs reconciliation passes against a chat client.
pub struct Synchronizer<'a> {
    client: &'a dyn ChatClient,
}

impl<'a> Synchronizer<'a> {
    /// Create a synchronizer over the given client.
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self { client }
    }

    /// Run one full reconciliation pass for the committed configuration.
    ///
    /// Edits, deletions, and sends that fail abort the pass; a failed
    /// reaction add only degrades it. The returned table holds whatever
    /// associations the pass actually established, even on failure.
    pub async fn run_pass(&self, config: &CommittedConfig) -> PassReport {
        let mut associations = AssociationTable::new();
        let mut emoji_error = false;

        let outcome = match self
            .apply(config, &mut associations, &mut emoji_error)
            .await
        {
            Ok(degraded) => {
                if emoji_error {
                    PassOutcome::EmojiError
                } else if degraded {
                    PassOutcome::Failed
                } else {
                    info!("successfully updated messages");
                    PassOutcome::Success
                }
            }
            Err(e) => {
                error!(error = %e, "message update failed");
                PassOutcome::Failed
            }
        };

        PassReport {
            outcome,
            associations,
        }
    }

    /// Score, assign, and apply. Returns whether scoring was degraded.
    async fn apply(
        &self,
        config: &CommittedConfig,
        associations: &mut AssociationTable,
        emoji_error: &mut bool,
    ) -> Result<bool> {
        let history = self.client.channel_history().await?;
        let ours: Vec<LiveMessage> = history.into_iter().filter(|m| m.authored_by_us).collect();

        let matrix = correlation::score(self.client, &ours, &config.messages).await;
        let degraded = matrix.is_degraded();

        let assignment = reconcile::assign(ours, &config.messages, &matrix);

        for (live, entry) in assignment.matched {
            associations.insert(live.id, Arc::clone(&entry));
            info!(message = %live.id, title = %entry.embed.title, "associated live message");
            if !self.sync_matched(&live, &entry).await? {
                *emoji_error = true;
            }
        }

        for live in assignment.to_delete {
            info!(message = %live.id, "deleting old message");
            self.client.delete_message(live.id).await?;
        }

        for entry in assignment.to_create {
            info!(title = %entry.embed.title, "sending new message");
            let id = self.client.send_embed(&entry.embed).await?;
            associations.insert(id, Arc::clone(&entry));
            if !self.add_all_reactions(id, &entry).await {
                *emoji_error = true;
            }
        }

        Ok(degraded)
    }

    /// Converge one matched live message onto its desired entry.
    ///
    /// Returns `Ok(false)` when a reaction add failed (the entry's
    /// remaining adds are skipped); transport failures on the edit or the
    /// reaction reset propagate and abort the pass.
    async fn sync_matched(&self, live: &LiveMessage, entry: &DesiredMessage) -> Result<bool> {
        if !live.has_embed(&entry.embed) {
            self.client.edit_embed(live.id, &entry.embed).await?;
        }

        let stale = live
            .reactions
            .iter()
            .any(|r| r.by_us && !entry.contains_symbol(&r.symbol_name));
        if stale {
            info!(message = %live.id, "clearing reactions because they're different");
            self.client.clear_reactions(live.id).await?;
        }

        Ok(self.add_all_reactions(live.id, entry).await)
    }

    /// Add every desired symbol in creation order. The first failure is
    /// logged and aborts the remaining adds for this entry only.
    async fn add_all_reactions(&self, message: MessageId, entry: &DesiredMessage) -> bool {
        for binding in &entry.reactions {
            if let Err(e) = self.client.add_reaction(message, &binding.symbol).await {
                warn!(
                    message = %message,
                    symbol = %binding.symbol,
                    error = %e,
                    "reaction add failed"
                );
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryChatClient, Op};
    use rolemenu_core::{
        AccentColor, ChannelId, EmbedContent, GuildId, ReactionBinding, ReactionSymbol, RoleId,
    };

    fn entry(title: &str, symbols: &[(&str, u64)]) -> Arc<DesiredMessage> {
        Arc::new(DesiredMessage {
            embed: EmbedContent::new(title, "body", AccentColor::new(0, 0, 255)),
            reactions: symbols
                .iter()
                .map(|(s, r)| ReactionBinding {
                    symbol: ReactionSymbol::parse(s),
                    role: RoleId::new(*r),
                    role_name: format!("role-{r}"),
                })
                .collect(),
        })
    }

    fn config(messages: Vec<Arc<DesiredMessage>>) -> CommittedConfig {
        CommittedConfig {
            guild: GuildId::new(1),
            channel: ChannelId::new(2),
            reload_roles: Vec::new(),
            messages,
        }
    }

    fn client() -> InMemoryChatClient {
        InMemoryChatClient::new(GuildId::new(1), ChannelId::new(2))
            .with_role(RoleId::new(10), "blue")
    }

    #[tokio::test]
    async fn test_creates_missing_messages_with_reactions() {
        let client = client();
        let config = config(vec![entry("Teams", &[("🔵", 10)])]);

        let report = Synchronizer::new(&client).run_pass(&config).await;

        assert_eq!(report.outcome, PassOutcome::Success);
        assert_eq!(report.associations.len(), 1);
        let ops = client.take_ops().await;
        assert!(ops.iter().any(|op| matches!(op, Op::Created(_))));
        assert!(ops
            .iter()
            .any(|op| matches!(op, Op::ReactionAdded(_, s) if s == "🔵")));
    }

    #[tokio::test]
    async fn test_unreadable_history_fails_the_pass() {
        let client = client().with_failing_history();
        let config = config(vec![entry("Teams", &[])]);

        let report = Synchronizer::new(&client).run_pass(&config).await;

        assert_eq!(report.outcome, PassOutcome::Failed);
        assert!(report.associations.is_empty());
    }

    #[tokio::test]
    async fn test_reaction_add_failure_is_emoji_error() {
        let client = client().with_failing_symbol("🔵");
        let config = config(vec![entry("Teams", &[("🔵", 10), ("🟢", 10)])]);

        let report = Synchronizer::new(&client).run_pass(&config).await;

        assert_eq!(report.outcome, PassOutcome::EmojiError);
        // the failed symbol aborts the rest of this entry's adds
        let ops = client.take_ops().await;
        assert!(!ops
            .iter()
            .any(|op| matches!(op, Op::ReactionAdded(_, s) if s == "🟢")));
        // the message itself is still associated
        assert_eq!(report.associations.len(), 1);
    }

    #[tokio::test]
    async fn test_matching_message_is_left_untouched() {
        let client = client();
        let desired = entry("Teams", &[("🔵", 10)]);
        let id = client
            .seed_own_message(&desired.embed, &[("🔵", true, &[])])
            .await;
        let config = config(vec![desired]);

        let report = Synchronizer::new(&client).run_pass(&config).await;

        assert_eq!(report.outcome, PassOutcome::Success);
        assert_eq!(report.associations.keys().copied().collect::<Vec<_>>(), [id]);
        let ops = client.take_ops().await;
        assert!(!ops.iter().any(|op| matches!(
            op,
            Op::Edited(_) | Op::Created(_) | Op::Deleted(_) | Op::Cleared(_)
        )));
    }

    #[tokio::test]
    async fn test_stale_bot_reaction_triggers_full_reset() {
        let client = client();
        let desired = entry("Teams", &[("🟢", 10)]);
        let stale_embed = EmbedContent::new("Teams", "body", AccentColor::new(0, 0, 255));
        let id = client
            .seed_own_message(&stale_embed, &[("🔵", true, &[])])
            .await;
        let config = config(vec![desired]);

        let report = Synchronizer::new(&client).run_pass(&config).await;

        assert_eq!(report.outcome, PassOutcome::Success);
        let ops = client.take_ops().await;
        assert!(ops.iter().any(|op| matches!(op, Op::Cleared(m) if *m == id)));
        assert!(ops
            .iter()
            .any(|op| matches!(op, Op::ReactionAdded(m, s) if *m == id && s == "🟢")));
    }

    #[tokio::test]
    async fn test_changed_embed_is_edited_in_place() {
        let client = client();
        let old = EmbedContent::new("Teams", "old body", AccentColor::new(0, 0, 255));
        let id = client.seed_own_message(&old, &[]).await;
        let config = config(vec![entry("Teams", &[])]);

        let report = Synchronizer::new(&client).run_pass(&config).await;

        assert_eq!(report.outcome, PassOutcome::Success);
        let ops = client.take_ops().await;
        assert!(ops.iter().any(|op| matches!(op, Op::Edited(m) if *m == id)));
        assert!(!ops.iter().any(|op| matches!(op, Op::Created(_) | Op::Deleted(_))));
    }

    #[tokio::test]
    async fn test_foreign_messages_are_ignored() {
        let client = client();
        let foreign = EmbedContent::new("Teams", "body", AccentColor::new(0, 0, 255));
        client.seed_foreign_message(&foreign).await;
        let config = config(vec![entry("Teams", &[])]);

        let report = Synchronizer::new(&client).run_pass(&config).await;

        // the foreign message must not be matched or deleted; a new one is sent
        assert_eq!(report.outcome, PassOutcome::Success);
        let ops = client.take_ops().await;
        assert!(!ops.iter().any(|op| matches!(op, Op::Deleted(_))));
        assert!(ops.iter().any(|op| matches!(op, Op::Created(_))));
    }
}
