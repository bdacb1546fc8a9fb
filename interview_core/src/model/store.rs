//! Store wiring for tale state: the per-tale partition and the state
//! transitions expressed as store edits.

use story_flow::{Partition, Projection};

use super::{InterviewState, Marker, Role, TaleId, TaleState};

/// Keyed projection of one tale's state out of the interview aggregate.
///
/// The key and the declared role set are fixed at construction; lookups of
/// an id absent from the aggregate break the interview model's invariant and
/// panic. Carrying the declared roles here lets tag commits be checked at
/// the one choke point all tagging goes through.
#[derive(Debug, Clone)]
pub struct TaleLens {
    id: TaleId,
    declared: Vec<Role>,
}

impl TaleLens {
    pub fn new(id: TaleId, declared: Vec<Role>) -> Self {
        Self { id, declared }
    }

    pub fn id(&self) -> &TaleId {
        &self.id
    }

    /// The tale's declared roles, in declaration order.
    pub fn declared(&self) -> &[Role] {
        &self.declared
    }

    /// Whether `role` belongs to the tale's declared set.
    pub fn declares(&self, role: &Role) -> bool {
        self.declared.contains(role)
    }
}

impl Projection<InterviewState> for TaleLens {
    type Field = TaleState;

    fn get(&self, parent: &InterviewState) -> TaleState {
        match parent.get(&self.id) {
            Some(state) => state.clone(),
            None => panic!("no state entry for tale {}", self.id),
        }
    }

    fn put(&self, parent: &mut InterviewState, field: TaleState) {
        match parent.get_mut(&self.id) {
            Some(state) => *state = field,
            None => panic!("no state entry for tale {}", self.id),
        }
    }
}

/// A watchable store scoped to a single tale's state.
pub type TaleStore = Partition<InterviewState, TaleLens>;

/// Record entry into a tale: bump `invoked`, set `active`.
pub fn mark_entered(store: &TaleStore) {
    store.edit(|state| {
        state.invoked += 1;
        state.active = true;
        tracing::debug!(invoked = state.invoked, "tale entered");
    });
}

/// Record completion of a tale's sequence.
pub fn mark_exited(store: &TaleStore) {
    tracing::debug!("tale exited");
    store.edit(|state| {
        state.active = false;
    });
}

/// Union `roles` into the tale's tagged set, keeping first-appearance order.
///
/// Panics if any role falls outside the tale's declared set: an escaped tag
/// would never count toward the tale's exhaustion, so the content committing
/// it is misdeclared.
pub fn tag_roles(store: &TaleStore, roles: &[Role]) {
    let lens = store.lens();
    for role in roles {
        if !lens.declares(role) {
            panic!("role {role:?} is not declared by tale {}", lens.id());
        }
    }
    tracing::debug!(roles = ?roles.iter().map(Role::as_str).collect::<Vec<_>>(), "tagging roles");
    store.edit(|state| {
        for role in roles {
            if !state.tagged.contains(role) {
                state.tagged.push(role.clone());
            }
        }
    });
}

/// Record a one-shot marker, idempotently.
pub fn flag_marker(store: &TaleStore, marker: Marker) {
    store.edit(|state| {
        if !state.flagged.contains(&marker) {
            state.flagged.push(marker);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_flow::Store;

    /// A one-tale aggregate, enough to exercise the partition.
    pub fn example_tale_store() -> TaleStore {
        let id = TaleId::from("example");
        let declared = vec![
            Role::from("baker"),
            Role::from("astronaut"),
            Role::from("cook"),
        ];
        let root = Store::new(InterviewState::new([id.clone()]));
        Partition::new(root, TaleLens::new(id, declared))
    }

    #[test]
    fn test_mark_entered_and_exited() {
        let store = example_tale_store();
        mark_entered(&store);
        let state = store.read();
        assert_eq!(state.invoked, 1);
        assert!(state.active);

        mark_exited(&store);
        let state = store.read();
        assert_eq!(state.invoked, 1);
        assert!(!state.active);

        mark_entered(&store);
        assert_eq!(store.read().invoked, 2);
    }

    #[test]
    fn test_tag_roles_dedupes_and_keeps_order() {
        let store = example_tale_store();
        tag_roles(&store, &[Role::from("baker"), Role::from("astronaut")]);
        tag_roles(&store, &[Role::from("astronaut"), Role::from("cook")]);
        assert_eq!(
            store.read().tagged,
            vec![
                Role::from("baker"),
                Role::from("astronaut"),
                Role::from("cook")
            ]
        );
    }

    #[test]
    #[should_panic(expected = "not declared by tale")]
    fn test_tag_roles_rejects_undeclared_role() {
        let store = example_tale_store();
        tag_roles(&store, &[Role::from("stowaway")]);
    }

    #[test]
    fn test_flag_marker_is_idempotent() {
        let store = example_tale_store();
        let marker = Marker::fresh();
        flag_marker(&store, marker);
        flag_marker(&store, marker);
        assert_eq!(store.read().flagged, vec![marker]);
    }
}
