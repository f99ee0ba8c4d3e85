//! Two-phase matching of live messages to desired entries.
//!
//! Reaction correlation is the primary signal: it survives a settings file
//! regenerated with the same titles reordered, or titles changed while
//! symbols and roles stay stable. Title equality is the fallback for
//! messages nobody has reacted to yet.

use std::sync::Arc;

use itertools::Itertools;
use rolemenu_core::DesiredMessage;
use tracing::debug;

use crate::types::{Assignment, CorrelationMatrix, LiveMessage};

/// Assign each desired entry to a live message, or mark it for creation;
/// live messages nothing claims are marked for deletion.
///
/// Deterministic: desired entries are processed in list order, and a tied
/// score goes to the first live message in enumeration order. A score of
/// zero never matches.
pub fn assign(
    current: Vec<LiveMessage>,
    desired: &[Arc<DesiredMessage>],
    matrix: &CorrelationMatrix,
) -> Assignment {
    let mut remaining = current;
    let mut matched = Vec::new();
    let mut unmatched_desired: Vec<usize> = Vec::new();

    // Score pass: strictly-greatest nonzero score per desired column,
    // first-found-max wins.
    for (j, entry) in desired.iter().enumerate() {
        let mut best_score = 0;
        let mut best_index = None;
        for (i, live) in remaining.iter().enumerate() {
            let score = matrix.get(live.id, j);
            if score > best_score {
                best_score = score;
                best_index = Some(i);
            }
        }

        match best_index {
            Some(i) => {
                let live = remaining.remove(i);
                debug!(
                    message = %live.id,
                    desired = j,
                    score = best_score,
                    "matched by reaction correlation"
                );
                matched.push((live, Arc::clone(entry)));
            }
            None => unmatched_desired.push(j),
        }
    }

    // Title pass: first still-unmatched live message with an equal title.
    let mut to_create = Vec::new();
    for j in unmatched_desired {
        let Some(entry) = desired.get(j) else { continue };
        let found = remaining
            .iter()
            .find_position(|live| live.has_title(&entry.embed.title))
            .map(|(i, _)| i);
        match found {
            Some(i) => {
                let live = remaining.remove(i);
                debug!(message = %live.id, desired = j, "matched by title");
                matched.push((live, Arc::clone(entry)));
            }
            None => to_create.push(Arc::clone(entry)),
        }
    }

    Assignment {
        matched,
        to_create,
        to_delete: remaining,
    }
}
