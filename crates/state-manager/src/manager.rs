//! The public state container.
//!
//! A [`Manager`] owns one [`Record`] and changes it only through the reducer.
//! All handles obtained by cloning share the same container, so the update
//! methods keep a stable identity for as long as any handle lives.
//!
//! Dispatch is synchronous. An action dispatched while another is being
//! applied (typically from inside a subscriber) is queued and applied right
//! after, in dispatch order. Subscribers run once per accepted transition and
//! never for a no-op.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::action::Action;
use crate::config::{ManagerConfig, ResetPolicy};
use crate::nested::lookup;
use crate::path::Path;
use crate::reducer::{RecordReducer, Reducer};
use crate::scope::current_scope;
use crate::signal::{Subscribers, Subscription};
use crate::value::{Record, Value};

struct Inner {
    state: RefCell<Record>,
    initial: Record,
    config: ManagerConfig,
    queue: RefCell<VecDeque<Action>>,
    draining: Cell<bool>,
    version: Cell<u64>,
    subscribers: RefCell<Subscribers<Record>>,
}

#[derive(Clone)]
pub struct Manager(Rc<Inner>);

impl Manager {
    pub fn new(initial: Record) -> Self {
        Self::with_config(initial, ManagerConfig::default())
    }

    pub fn with_config(initial: Record, config: ManagerConfig) -> Self {
        log::debug!("{}: created with {} key(s)", config.label, initial.len());
        Self(Rc::new(Inner {
            state: RefCell::new(initial.clone()),
            initial,
            config,
            queue: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
            version: Cell::new(0),
            subscribers: RefCell::new(Subscribers::default()),
        }))
    }

    /// Current state. The snapshot keeps its identity until the next accepted
    /// transition.
    pub fn state(&self) -> Record {
        self.0.state.borrow().clone()
    }

    /// Alias of [`Manager::state`].
    pub fn get_state(&self) -> Record {
        self.state()
    }

    /// The state this manager was created with.
    pub fn initial_state(&self) -> Record {
        self.0.initial.clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.state.borrow().get(key).cloned()
    }

    pub fn get_in(&self, path: impl Into<Path>) -> Option<Value> {
        lookup(&self.0.state.borrow(), &path.into())
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.0.config
    }

    /// Number of accepted transitions so far.
    pub fn version(&self) -> u64 {
        self.0.version.get()
    }

    /// Whether both handles refer to the same container.
    pub fn ptr_eq(&self, other: &Manager) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn update_state(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.dispatch(Action::update(key, value));
    }

    pub fn update_state_with(
        &self,
        key: impl Into<String>,
        f: impl FnOnce(Option<&Value>) -> Value + 'static,
    ) {
        self.dispatch(Action::update_with(key, f));
    }

    pub fn deep_update_state(&self, path: impl Into<Path>, value: impl Into<Value>) {
        self.dispatch(Action::deep_update(path, value));
    }

    pub fn deep_update_state_with(
        &self,
        path: impl Into<Path>,
        f: impl FnOnce(Option<&Value>) -> Value + 'static,
    ) {
        self.dispatch(Action::deep_update_with(path, f));
    }

    pub fn bulk_update(&self, updates: Record) {
        self.dispatch(Action::bulk(updates));
    }

    /// `None` clones the base state into a new allocation; `Some(partial)`
    /// merges `partial` onto it. The base depends on the configured
    /// [`ResetPolicy`].
    pub fn reset_state(&self, new_state: impl Into<Option<Record>>) {
        self.dispatch(Action::reset(new_state));
    }

    pub fn dispatch(&self, action: Action) {
        self.0.queue.borrow_mut().push_back(action);
        if self.0.draining.replace(true) {
            return;
        }
        let _guard = DrainGuard(&self.0);
        loop {
            let next = self.0.queue.borrow_mut().pop_front();
            let Some(action) = next else { break };
            self.apply(action);
        }
    }

    /// Register `f` to be called with the new state after every accepted
    /// transition. Inside a composition the subscription is tied to the
    /// current scope.
    pub fn subscribe(&self, f: impl Fn(&Record) + 'static) -> Subscription {
        let id = self.0.subscribers.borrow_mut().subscribe(f);
        let weak: Weak<Inner> = Rc::downgrade(&self.0);
        let sub = Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().unsubscribe(id);
            }
        });
        if let Some(scope) = current_scope() {
            let s = sub.clone();
            scope.add_disposer(move || s.cancel());
        }
        sub
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.borrow().len()
    }

    fn apply(&self, action: Action) {
        let current = self.state();
        let tag = action.tag().to_owned();
        let restore_initial =
            action.is_reset() && self.0.config.reset_policy == ResetPolicy::RestoreInitial;
        let base = if restore_initial {
            &self.0.initial
        } else {
            &current
        };
        let next = RecordReducer::reduce(base, action);
        if RecordReducer::unchanged(&current, &next) {
            return;
        }

        *self.0.state.borrow_mut() = next.clone();
        let version = self.0.version.get() + 1;
        self.0.version.set(version);
        log::debug!("{}: {tag} accepted (version {version})", self.0.config.label);

        let subs = self.0.subscribers.borrow().snapshot();
        for sub in subs {
            sub(&next);
        }
    }
}

/// Ends a drain. Actions still queued when an updater or subscriber panics
/// are dropped rather than applied by a later dispatch.
struct DrainGuard<'a>(&'a Inner);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        let dropped = std::mem::take(&mut *self.0.queue.borrow_mut());
        if !dropped.is_empty() {
            log::warn!(
                "{}: dropping {} queued action(s) after an aborted dispatch",
                self.0.config.label,
                dropped.len()
            );
        }
        self.0.draining.set(false);
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("label", &self.0.config.label)
            .field("version", &self.version())
            .field("state", &*self.0.state.borrow())
            .finish()
    }
}
