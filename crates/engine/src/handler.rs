//! Reaction-event handling: granting and revoking roles.

use std::sync::Arc;

use rolemenu_core::{MessageId, UserId};
use tracing::{debug, info, warn};

use crate::client::ChatClient;
use crate::state::EngineState;

/// A reaction-added or reaction-removed notification, reduced to what the
/// handler needs.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    /// The reacted-to message.
    pub message: MessageId,
    /// The acting member.
    pub user: UserId,
    /// Comparable symbol form of the reaction.
    pub symbol_name: String,
    /// Whether the acting member is the bot itself.
    pub from_us: bool,
}

/// Grants and revokes roles in response to reaction events.
///
/// Every event is independent: a platform failure is logged and isolated
/// to that one event.
pub struct RoleEventHandler {
    state: Arc<EngineState>,
}

impl RoleEventHandler {
    /// Create a handler over the shared engine state.
    pub fn new(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    /// Handle a reaction-added notification.
    pub async fn reaction_added(&self, client: &dyn ChatClient, event: &ReactionEvent) {
        self.apply(client, event, true).await;
    }

    /// Handle a reaction-removed notification.
    pub async fn reaction_removed(&self, client: &dyn ChatClient, event: &ReactionEvent) {
        self.apply(client, event, false).await;
    }

    async fn apply(&self, client: &dyn ChatClient, event: &ReactionEvent, grant: bool) {
        // Our own programmatic reactions during synchronization must not
        // feed back into role changes.
        if event.from_us {
            return;
        }

        // Not one of our messages, or the event predates the current
        // configuration. Not an error.
        let Some(entry) = self.state.association_for(event.message).await else {
            return;
        };

        let Some(binding) = entry.binding_for(&event.symbol_name) else {
            return;
        };

        let member = match client.member(event.user).await {
            Ok(Some(member)) => member,
            Ok(None) => return,
            Err(e) => {
                debug!(member = %event.user, error = %e, "member lookup failed, ignoring event");
                return;
            }
        };

        if grant {
            match client.grant_role(event.user, binding.role).await {
                Ok(()) => info!(
                    role = %binding.role_name,
                    member = %member.name,
                    id = %event.user,
                    "added role"
                ),
                Err(e) => warn!(
                    role = %binding.role_name,
                    member = %member.name,
                    id = %event.user,
                    error = %e,
                    "reaction add error"
                ),
            }
        } else {
            match client.revoke_role(event.user, binding.role).await {
                Ok(()) => info!(
                    role = %binding.role_name,
                    member = %member.name,
                    id = %event.user,
                    "removed role"
                ),
                Err(e) => warn!(
                    role = %binding.role_name,
                    member = %member.name,
                    id = %event.user,
                    error = %e,
                    "reaction remove error"
                ),
            }
        }
    }
}
