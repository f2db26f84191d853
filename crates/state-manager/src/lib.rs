//! # Component-local reducer state
//!
//! `state-manager` wraps a reducer around one immutable, string-keyed
//! [`Record`] and adds the updates a component usually wants:
//!
//! - `update_state(key, value)` — replace one top-level key.
//! - `deep_update_state(path, value)` — replace a value deep inside nested
//!   mappings/sequences, addressed by a path like `"user.tags[0]"`.
//! - `bulk_update(updates)` — replace several top-level keys at once.
//! - `reset_state(new_state)` — clone the state, optionally merging a partial
//!   record over it.
//!
//! ## Identity is the change signal
//!
//! State is never mutated in place. A write copies only the containers on the
//! path to the changed value and shares everything else, and a write that
//! would store the value already there returns the *same* record. Comparing
//! allocations is therefore enough to know whether anything changed:
//!
//! ```rust
//! use state_manager::*;
//!
//! let m = Manager::new(record! { "a" => record! { "b" => 1 }, "c" => seq![1, 2] });
//! let before = m.state();
//!
//! m.update_state("a", before.get("a").cloned().unwrap_or_default());
//! assert!(m.state().ptr_eq(&before)); // same value: no-op
//!
//! m.deep_update_state("a.b", 2);
//! let after = m.state();
//! assert!(!after.ptr_eq(&before));
//! assert_eq!(m.get_in("a.b"), Some(2.into()));
//! // the untouched branch is shared
//! assert!(after.get("c").zip(before.get("c")).is_some_and(|(x, y)| x.same(y)));
//! ```
//!
//! ## Updaters
//!
//! Every update has a `_with` form taking a function of the current value
//! (`None` when absent), so a literal value is never confused with an updater:
//!
//! ```rust
//! use state_manager::*;
//!
//! let m = Manager::new(record! { "count" => 0 });
//! m.update_state_with("count", |v| Value::from(v.and_then(Value::as_f64).unwrap_or(0.0) + 1.0));
//! assert_eq!(m.get("count"), Some(1.into()));
//! ```
//!
//! ## Notification
//!
//! `subscribe` registers a callback that runs once per accepted transition,
//! never for no-ops. Inside a [`Composition`] the manager is obtained with
//! [`use_manager`] and survives re-evaluation; subscriptions made during a
//! pass are cancelled when the composition's scope is disposed.

pub mod action;
pub mod composition;
pub mod config;
pub mod error;
#[cfg(feature = "serde")]
pub mod json;
pub mod manager;
pub mod nested;
pub mod path;
pub mod prelude;
pub mod reducer;
pub mod scope;
pub mod signal;
pub mod tests;
pub mod value;

pub use action::*;
pub use composition::*;
pub use config::*;
pub use error::*;
pub use manager::*;
pub use nested::*;
pub use path::*;
pub use reducer::*;
pub use scope::*;
pub use signal::*;
pub use value::*;
