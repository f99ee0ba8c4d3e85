//! Correlation scoring between live messages and desired entries.
//!
//! The score for a (live message, desired entry) cell is the count of
//! members who reacted to that live message with a symbol the desired entry
//! also configures, and who already hold the role the symbol maps to. High
//! scores are evidence that the live message previously represented that
//! desired slot, so reaction-granted roles survive config rewrites that
//! reorder or retitle entries.

use std::collections::HashMap;
use std::sync::Arc;

use rolemenu_core::{DesiredMessage, RoleId, UserId};
use tracing::warn;

use crate::client::ChatClient;
use crate::types::{CorrelationMatrix, LiveMessage};

/// Score every (live message, desired entry) pair.
///
/// Member role sets are looked up through the client once per distinct
/// member. A failed lookup is logged, skipped, and marks the matrix
/// degraded; scoring itself never aborts.
pub async fn score(
    client: &dyn ChatClient,
    current: &[LiveMessage],
    desired: &[Arc<DesiredMessage>],
) -> CorrelationMatrix {
    let mut matrix = CorrelationMatrix::new(desired.len());
    let mut role_cache: HashMap<UserId, Vec<RoleId>> = HashMap::new();

    for live in current {
        for reaction in &live.reactions {
            for user in &reaction.members {
                let roles = match member_roles(client, &mut role_cache, *user).await {
                    Some(roles) => roles,
                    None => {
                        warn!(
                            member = %user,
                            message = %live.id,
                            symbol = %reaction.symbol_name,
                            "member lookup failed while scoring, skipping"
                        );
                        matrix.mark_degraded();
                        continue;
                    }
                };

                for (j, entry) in desired.iter().enumerate() {
                    if let Some(binding) = entry.binding_for(&reaction.symbol_name) {
                        if roles.contains(&binding.role) {
                            matrix.increment(live.id, j);
                        }
                    }
                }
            }
        }
    }

    matrix
}

async fn member_roles(
    client: &dyn ChatClient,
    cache: &mut HashMap<UserId, Vec<RoleId>>,
    user: UserId,
) -> Option<Vec<RoleId>> {
    if let Some(roles) = cache.get(&user) {
        return Some(roles.clone());
    }
    match client.member(user).await {
        // A departed member simply holds no roles.
        Ok(member) => {
            let roles = member.map(|m| m.roles).unwrap_or_default();
            cache.insert(user, roles.clone());
            Some(roles)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryChatClient;
    use crate::types::LiveReaction;
    use rolemenu_core::{
        AccentColor, ChannelId, EmbedContent, GuildId, MessageId, ReactionBinding, ReactionSymbol,
    };

    fn entry(symbol: &str, role: u64) -> Arc<DesiredMessage> {
        Arc::new(DesiredMessage {
            embed: EmbedContent::new("t", "m", AccentColor::default()),
            reactions: vec![ReactionBinding {
                symbol: ReactionSymbol::parse(symbol),
                role: RoleId::new(role),
                role_name: "r".to_string(),
            }],
        })
    }

    fn live(id: u64, symbol: &str, members: &[u64]) -> LiveMessage {
        LiveMessage {
            id: MessageId::new(id),
            authored_by_us: true,
            embeds: Vec::new(),
            reactions: vec![LiveReaction {
                symbol_name: symbol.to_string(),
                by_us: true,
                members: members.iter().map(|m| UserId::new(*m)).collect(),
            }],
        }
    }

    fn client() -> InMemoryChatClient {
        InMemoryChatClient::new(GuildId::new(1), ChannelId::new(2))
            .with_role(RoleId::new(10), "blue")
            .with_member(UserId::new(100), "alice", &[RoleId::new(10)])
            .with_member(UserId::new(101), "bob", &[])
    }

    #[tokio::test]
    async fn test_counts_members_holding_the_mapped_role() {
        let client = client();
        let desired = vec![entry("🔵", 10)];
        let current = vec![live(1, "🔵", &[100, 101])];

        let matrix = score(&client, &current, &desired).await;

        // alice holds role 10, bob does not
        assert_eq!(matrix.get(MessageId::new(1), 0), 1);
        assert!(!matrix.is_degraded());
    }

    #[tokio::test]
    async fn test_unknown_symbol_scores_nothing() {
        let client = client();
        let desired = vec![entry("🔵", 10)];
        let current = vec![live(1, "🟢", &[100])];

        let matrix = score(&client, &current, &desired).await;
        assert_eq!(matrix.get(MessageId::new(1), 0), 0);
    }

    #[tokio::test]
    async fn test_departed_member_scores_nothing() {
        let client = client();
        let desired = vec![entry("🔵", 10)];
        // user 999 is not a member of the space
        let current = vec![live(1, "🔵", &[999])];

        let matrix = score(&client, &current, &desired).await;
        assert_eq!(matrix.get(MessageId::new(1), 0), 0);
        assert!(!matrix.is_degraded());
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_but_continues() {
        let client = client().with_failing_member(UserId::new(100));
        let desired = vec![entry("🔵", 10)];
        let current = vec![live(1, "🔵", &[100]), live(2, "🔵", &[100])];

        let matrix = score(&client, &current, &desired).await;
        assert!(matrix.is_degraded());
        assert_eq!(matrix.get(MessageId::new(1), 0), 0);
        assert_eq!(matrix.get(MessageId::new(2), 0), 0);
    }
}
