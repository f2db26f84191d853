//! The pure `(state, action) -> state` transition function.
//!
//! A transition that changes nothing hands back the *same* `Record`
//! allocation, so callers detect no-ops with [`Record::ptr_eq`] instead of a
//! deep comparison.

use crate::action::Action;
use crate::nested::{lookup, set_nested};
use crate::value::{Record, Value};

/// State holder seam: a pure reducer plus the test that tells an accepted
/// transition from a no-op.
pub trait Reducer: 'static {
    type State: Clone;
    type Action;

    fn reduce(state: &Self::State, action: Self::Action) -> Self::State;
    fn unchanged(prev: &Self::State, next: &Self::State) -> bool;
}

/// Reducer over string-keyed [`Record`] state.
pub struct RecordReducer;

impl Reducer for RecordReducer {
    type State = Record;
    type Action = Action;

    fn reduce(state: &Record, action: Action) -> Record {
        reduce(state, action)
    }

    fn unchanged(prev: &Record, next: &Record) -> bool {
        prev.ptr_eq(next)
    }
}

pub fn reduce(state: &Record, action: Action) -> Record {
    match action {
        Action::Update { key, assign } => {
            let current = state.get(&key);
            let next = assign.resolve(current);
            if current.is_some_and(|c| c.same(&next)) {
                log::debug!("UPDATE {key:?}: value unchanged");
                return state.clone();
            }
            state.with(key, next)
        }
        Action::DeepUpdate { path, assign } => {
            let current = lookup(state, &path);
            let next = assign.resolve(current.as_ref());
            if current.is_some_and(|c| c.same(&next)) {
                log::debug!("DEEP_UPDATE {:?}: value unchanged", path.to_string());
                return state.clone();
            }
            match set_nested(&Value::Map(state.clone()), &path, next) {
                Value::Map(record) => record,
                other => {
                    log::warn!(
                        "DEEP_UPDATE at the root needs a mapping, got {}; state left as is",
                        other.type_name()
                    );
                    state.clone()
                }
            }
        }
        Action::BulkUpdate { updates } => {
            let changed = updates
                .iter()
                .any(|(k, v)| !state.get(k).is_some_and(|c| c.same(v)));
            if !changed {
                log::debug!("BULK_UPDATE: all {} value(s) unchanged", updates.len());
                return state.clone();
            }
            state.merged(&updates)
        }
        Action::Reset { new_state } => match new_state {
            Some(partial) => state.merged(&partial),
            None => state.shallow_clone(),
        },
        Action::Unrecognized(tag) => {
            log::debug!("ignoring unrecognized action {tag:?}");
            state.clone()
        }
    }
}
