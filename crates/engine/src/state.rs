//! Shared engine state.
//!
//! Exactly two pieces of shared mutable state exist: the committed
//! configuration and the association table. Both are replaced wholesale
//! under a short write lock, never mutated field-by-field, so a reaction
//! event racing a reconciliation pass observes either the old value or the
//! new one, never something in between.

use std::sync::Arc;

use rolemenu_core::{CommittedConfig, DesiredMessage, MessageId};
use tokio::sync::RwLock;

use crate::types::AssociationTable;

/// The engine's shared state.
#[derive(Default)]
pub struct EngineState {
    committed: RwLock<Option<Arc<CommittedConfig>>>,
    associations: RwLock<Arc<AssociationTable>>,
}

impl EngineState {
    /// Create empty state: no configuration, no associations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a validated configuration, replacing any previous one.
    pub async fn commit_config(&self, config: CommittedConfig) -> Arc<CommittedConfig> {
        let config = Arc::new(config);
        *self.committed.write().await = Some(Arc::clone(&config));
        config
    }

    /// The currently committed configuration, if any.
    pub async fn config(&self) -> Option<Arc<CommittedConfig>> {
        self.committed.read().await.clone()
    }

    /// Swap in a freshly built association table.
    pub async fn swap_associations(&self, table: AssociationTable) {
        *self.associations.write().await = Arc::new(table);
    }

    /// Resolve a live message to the desired entry it represents.
    pub async fn association_for(&self, message: MessageId) -> Option<Arc<DesiredMessage>> {
        self.associations.read().await.get(&message).cloned()
    }

    /// Snapshot of the current association table.
    pub async fn associations(&self) -> Arc<AssociationTable> {
        self.associations.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolemenu_core::{AccentColor, ChannelId, EmbedContent, GuildId};

    fn desired(title: &str) -> Arc<DesiredMessage> {
        Arc::new(DesiredMessage {
            embed: EmbedContent::new(title, "b", AccentColor::default()),
            reactions: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_swap_replaces_whole_table() {
        let state = EngineState::new();

        let mut first = AssociationTable::new();
        first.insert(MessageId::new(1), desired("old"));
        state.swap_associations(first).await;

        let mut second = AssociationTable::new();
        second.insert(MessageId::new(2), desired("new"));
        state.swap_associations(second).await;

        // nothing from the first table leaks into the second
        assert!(state.association_for(MessageId::new(1)).await.is_none());
        assert!(state.association_for(MessageId::new(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_survives_swap() {
        let state = EngineState::new();
        let mut table = AssociationTable::new();
        table.insert(MessageId::new(1), desired("a"));
        state.swap_associations(table).await;

        let snapshot = state.associations().await;
        state.swap_associations(AssociationTable::new()).await;

        // a reader holding the old snapshot still sees a complete table
        assert_eq!(snapshot.len(), 1);
        assert!(state.associations().await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_replaces_config() {
        let state = EngineState::new();
        assert!(state.config().await.is_none());

        let config = CommittedConfig {
            guild: GuildId::new(1),
            channel: ChannelId::new(2),
            reload_roles: Vec::new(),
            messages: Vec::new(),
        };
        state.commit_config(config).await;
        assert!(state.config().await.is_some());
    }
}
