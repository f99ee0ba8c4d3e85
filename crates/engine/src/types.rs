//! View and result types for the reconciliation engine.

use std::collections::HashMap;
use std::sync::Arc;

use rolemenu_core::{DesiredMessage, EmbedContent, MessageId, RoleId, UserId};

/// A reaction as observed on a live message.
#[derive(Debug, Clone, Default)]
pub struct LiveReaction {
    /// Comparable symbol form: the literal symbol or the custom emoji name.
    pub symbol_name: String,
    /// Whether the bot's own identity has applied this reaction.
    pub by_us: bool,
    /// Members who applied this reaction, excluding the bot.
    pub members: Vec<UserId>,
}

/// A message as observed in the target channel.
///
/// Fetched fresh on every reconciliation pass, never cached across passes.
#[derive(Debug, Clone)]
pub struct LiveMessage {
    /// Opaque message identity.
    pub id: MessageId,
    /// Whether the bot authored this message.
    pub authored_by_us: bool,
    /// Observed embeds.
    pub embeds: Vec<EmbedContent>,
    /// Observed reactions.
    pub reactions: Vec<LiveReaction>,
}

impl LiveMessage {
    /// Whether any observed embed equals the given content.
    pub fn has_embed(&self, embed: &EmbedContent) -> bool {
        self.embeds.iter().any(|e| e == embed)
    }

    /// Whether any observed embed carries the given title.
    pub fn has_title(&self, title: &str) -> bool {
        self.embeds.iter().any(|e| e.title == title)
    }
}

/// A member of the target space, as much of it as the engine needs.
#[derive(Debug, Clone)]
pub struct MemberView {
    /// Display name, for log lines.
    pub name: String,
    /// Roles the member currently holds.
    pub roles: Vec<RoleId>,
}

/// A role in the target space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleView {
    /// Role id.
    pub id: RoleId,
    /// Role name.
    pub name: String,
}

/// Sparse correlation scores: one row per bot-authored live message, one
/// column per desired-message index.
///
/// A cell counts the distinct members who reacted to that live message with
/// a symbol that exists in the desired entry's reaction set and who already
/// hold the role the symbol maps to.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    scores: HashMap<MessageId, Vec<u32>>,
    desired_len: usize,
    degraded: bool,
}

impl CorrelationMatrix {
    /// Create an empty matrix for the given number of desired entries.
    pub fn new(desired_len: usize) -> Self {
        Self {
            scores: HashMap::new(),
            desired_len,
            degraded: false,
        }
    }

    /// Increment the score for a (live message, desired index) cell.
    pub fn increment(&mut self, message: MessageId, desired_index: usize) {
        if desired_index < self.desired_len {
            let row = self
                .scores
                .entry(message)
                .or_insert_with(|| vec![0; self.desired_len]);
            if let Some(cell) = row.get_mut(desired_index) {
                *cell = cell.saturating_add(1);
            }
        }
    }

    /// Read a cell; absent rows score zero.
    pub fn get(&self, message: MessageId, desired_index: usize) -> u32 {
        self.scores
            .get(&message)
            .and_then(|row| row.get(desired_index))
            .copied()
            .unwrap_or(0)
    }

    /// Mark the pass as degraded: some lookup failed and was skipped.
    pub fn mark_degraded(&mut self) {
        self.degraded = true;
    }

    /// Whether any lookup failed while scoring.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// The reconciler's output: how each side of the diff is handled.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Live messages matched to a desired entry, in application order.
    pub matched: Vec<(LiveMessage, Arc<DesiredMessage>)>,
    /// Desired entries with no live counterpart, in send order.
    pub to_create: Vec<Arc<DesiredMessage>>,
    /// Live messages no desired entry claimed.
    pub to_delete: Vec<LiveMessage>,
}

/// Live mapping from a message identity to the desired entry it represents.
///
/// Rebuilt from scratch on every pass and swapped in wholesale.
pub type AssociationTable = HashMap<MessageId, Arc<DesiredMessage>>;

/// Tri-state outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every edit, create, delete, and reaction add succeeded.
    Success,
    /// The pass completed but at least one reaction add failed.
    EmojiError,
    /// The pass aborted, or scoring was degraded by lookup failures.
    Failed,
}

/// Result of one reconciliation pass: the outcome plus the association
/// table built during the pass.
///
/// The table reflects whatever the pass actually established, even when the
/// outcome is not [`PassOutcome::Success`]; callers swap it in wholesale so
/// reaction events resolve against current reality.
#[derive(Debug, Clone)]
pub struct PassReport {
    /// Tri-state outcome.
    pub outcome: PassOutcome,
    /// Associations established by this pass.
    pub associations: AssociationTable,
}
