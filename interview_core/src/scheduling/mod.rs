//! Priority scheduling over live tales.
//!
//! A tale is live while some declared role remains untagged. The comparator
//! is a deterministic total preorder applied with a stable sort, so tied
//! tales keep their declaration order.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{InterviewState, Role, TaleId, TaleState};
use crate::session::Interview;

/// Roles a tale declares but has not yet tagged, in declaration order.
pub fn pending_roles(declared: &[Role], state: &TaleState) -> Vec<Role> {
    state.untagged(declared)
}

/// A tale with no pending roles is exhausted and never scheduled again.
pub fn is_exhausted(declared: &[Role], state: &TaleState) -> bool {
    state.tagged_all(declared)
}

/// Count, for every role declared anywhere in the interview, how many tales
/// have tagged it.
pub fn tag_counts(interview: &Interview, state: &InterviewState) -> HashMap<Role, usize> {
    let mut counts: HashMap<Role, usize> = HashMap::new();
    for (_, tale) in interview.tales() {
        for role in tale.roles() {
            counts.entry(role.clone()).or_insert(0);
        }
    }
    for (_, tale_state) in state.iter() {
        for role in &tale_state.tagged {
            if let Some(count) = counts.get_mut(role) {
                *count += 1;
            }
        }
    }
    counts
}

/// The minimum global tag count among a tale's pending roles, or `usize::MAX`
/// when nothing is pending.
fn scarcest_pending(pending: &[Role], counts: &HashMap<Role, usize>) -> usize {
    pending
        .iter()
        .map(|role| counts.get(role).copied().unwrap_or(0))
        .min()
        .unwrap_or(usize::MAX)
}

/// Order two tales by scheduling priority. Criteria, in strict precedence:
///
/// 1. fewer prior entries (`invoked`) first;
/// 2. more pending roles first;
/// 3. the tale whose scarcest pending role has the lower global tag count
///    first (it holds coverage nothing else is providing);
/// 4. otherwise equal - stable sorting keeps declaration order.
pub fn compare_priority(
    a: (&[Role], &TaleState),
    b: (&[Role], &TaleState),
    counts: &HashMap<Role, usize>,
) -> Ordering {
    let (roles_a, state_a) = a;
    let (roles_b, state_b) = b;

    let by_invoked = state_a.invoked.cmp(&state_b.invoked);
    if by_invoked != Ordering::Equal {
        return by_invoked;
    }

    let pending_a = pending_roles(roles_a, state_a);
    let pending_b = pending_roles(roles_b, state_b);
    let by_pending = pending_b.len().cmp(&pending_a.len());
    if by_pending != Ordering::Equal {
        return by_pending;
    }

    scarcest_pending(&pending_a, counts).cmp(&scarcest_pending(&pending_b, counts))
}

/// Ids of live tales, highest priority first; ties keep declaration order.
pub fn rank_live_tales(interview: &Interview, state: &InterviewState) -> Vec<TaleId> {
    let counts = tag_counts(interview, state);
    let mut live: Vec<(TaleId, &[Role], TaleState)> = Vec::new();
    for (id, tale) in interview.tales() {
        if let Some(tale_state) = state.get(id) {
            if !is_exhausted(tale.roles(), tale_state) {
                live.push((id.clone(), tale.roles(), tale_state.clone()));
            }
        }
    }
    live.sort_by(|(_, roles_a, state_a), (_, roles_b, state_b)| {
        compare_priority((*roles_a, state_a), (*roles_b, state_b), &counts)
    });
    live.into_iter().map(|(id, _, _)| id).collect()
}
