//! Reconciliation engine for role-menu messages.
//!
//! The engine converges the target channel onto a committed configuration:
//!
//! - **Desired state**: the committed list of role-menu messages
//! - **Actual state**: the channel's current messages, fetched fresh each pass
//! - **Correlation**: reaction evidence linking live messages to desired slots
//! - **Assignment**: matched pairs to update, plus creates and deletes
//! - **Synchronization**: sequential application of the assignment
//!
//! Matching preserves already-granted roles: a live message that members
//! with the mapped roles have reacted to stays associated with the desired
//! entry those reactions imply, even when the configuration is reordered or
//! retitled. Title equality is the fallback for messages without reaction
//! evidence.
//!
//! The engine owns no transport. It drives a [`ChatClient`] and an
//! [`EnvironmentDirectory`], implemented over the real platform by the
//! gateway crate and in memory by [`testing::InMemoryChatClient`].

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod client;
pub mod config;
pub mod correlation;
pub mod error;
pub mod handler;
pub mod reconcile;
pub mod state;
pub mod sync;
pub mod testing;
pub mod types;

pub use client::{ChatClient, EnvironmentDirectory};
pub use config::{load_settings, LOAD_OK_STATUS};
pub use error::{Error, Result};
pub use handler::{ReactionEvent, RoleEventHandler};
pub use state::EngineState;
pub use sync::Synchronizer;
pub use types::{
    Assignment, AssociationTable, CorrelationMatrix, LiveMessage, LiveReaction, MemberView,
    PassOutcome, PassReport, RoleView,
};
