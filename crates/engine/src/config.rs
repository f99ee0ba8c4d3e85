//! Transactional configuration loading.
//!
//! A raw settings document either becomes a complete [`CommittedConfig`] or
//! changes nothing. Validation runs against the live environment: the
//! target space must be connected, the channel must exist in it, and every
//! declared reload role must resolve.

use std::sync::Arc;

use rolemenu_core::{
    CommittedConfig, ConfigError, DesiredMessage, EmbedContent, MessageSpec, ReactionBinding,
    ReactionSymbol, SettingsDoc, REQUIRED_KEYS,
};
use tracing::warn;

use crate::client::EnvironmentDirectory;
use crate::types::RoleView;

/// Status line reported on a successful load.
pub const LOAD_OK_STATUS: &str = "Successfully loaded config file";

/// Validate a raw settings document against the connected environment and
/// resolve it into a committed configuration.
///
/// # Errors
///
/// Returns a [`ConfigError`] whose `Display` form is the status line to
/// report: parse failure, a missing required key, or an environment
/// mismatch. On error nothing is committed.
pub async fn load_settings(
    raw: &str,
    env: &dyn EnvironmentDirectory,
) -> Result<CommittedConfig, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|_| ConfigError::Parse)?;

    let object = value.as_object().ok_or(ConfigError::Parse)?;
    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(ConfigError::missing_key(key));
        }
    }

    let doc: SettingsDoc = serde_json::from_value(value).map_err(|_| ConfigError::Parse)?;

    if !env.space_exists(doc.guild).await {
        return Err(ConfigError::Mismatch);
    }
    if !env.channel_in_space(doc.guild, doc.channel).await {
        return Err(ConfigError::Mismatch);
    }

    let roles = match env.space_roles(doc.guild).await {
        Ok(roles) => roles,
        Err(e) => {
            warn!(error = %e, "could not read role list while validating settings");
            return Err(ConfigError::Mismatch);
        }
    };

    let matching = doc
        .reload_roles
        .iter()
        .filter(|declared| roles.iter().any(|r| r.id == **declared))
        .count();
    if matching != doc.reload_roles.len() {
        return Err(ConfigError::Mismatch);
    }

    let messages = doc
        .messages
        .iter()
        .map(|spec| Arc::new(resolve_message(spec, &roles)))
        .collect();

    Ok(CommittedConfig {
        guild: doc.guild,
        channel: doc.channel,
        reload_roles: doc.reload_roles,
        messages,
    })
}

/// Resolve one message spec's reaction mapping against the space's roles.
///
/// A role id with no counterpart in the space drops that one binding with
/// a warning; the rest of the message is unaffected.
fn resolve_message(spec: &MessageSpec, roles: &[RoleView]) -> DesiredMessage {
    let mut reactions = Vec::with_capacity(spec.reactions.len());
    for (raw_symbol, role_id) in &spec.reactions {
        match roles.iter().find(|r| r.id == *role_id) {
            Some(role) => reactions.push(ReactionBinding {
                symbol: ReactionSymbol::parse(raw_symbol),
                role: role.id,
                role_name: role.name.clone(),
            }),
            None => {
                warn!(
                    symbol = %raw_symbol,
                    role = %role_id,
                    title = %spec.title,
                    "role not found in space, dropping reaction binding"
                );
            }
        }
    }

    DesiredMessage {
        embed: EmbedContent::new(spec.title.clone(), spec.message.clone(), spec.color),
        reactions,
    }
}
