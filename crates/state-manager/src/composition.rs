//! Binding to a composition-style host.
//!
//! A [`Composition`] is the persistent storage of one owning component: every
//! pass through [`Composition::run`] sees the same remembered slots, so a
//! [`Manager`] obtained from [`use_manager`] survives re-evaluation and its
//! update methods keep their identity.
//!
//! ```rust
//! use state_manager::{Composition, record, use_manager};
//!
//! let composition = Composition::new();
//! let first = composition.run(|| use_manager(|| record! { "count" => 0 }));
//! first.update_state("count", 1);
//!
//! let second = composition.run(|| use_manager(|| record! { "count" => 0 }));
//! assert!(first.ptr_eq(&second));
//! assert_eq!(second.get("count"), Some(1.into()));
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::ManagerConfig;
use crate::manager::Manager;
use crate::scope::Scope;
use crate::value::Record;

thread_local! {
    static ACTIVE: RefCell<Option<Rc<RefCell<Composer>>>> = const { RefCell::new(None) };
}

#[derive(Default)]
pub struct Composer {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
    keyed_slots: HashMap<String, Box<dyn Any>>,
}

impl Composer {
    pub fn slot_count(&self) -> usize {
        self.slots.len() + self.keyed_slots.len()
    }
}

pub struct Composition {
    composer: Rc<RefCell<Composer>>,
    scope: Scope,
}

impl Composition {
    pub fn new() -> Self {
        Self {
            composer: Rc::new(RefCell::new(Composer::default())),
            scope: Scope::new(),
        }
    }

    /// One evaluation pass: positional slots restart from the first one and
    /// this composition's scope is current while `f` runs.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        self.composer.borrow_mut().cursor = 0;
        let prev = ACTIVE.with(|a| a.replace(Some(self.composer.clone())));
        let result = self.scope.run(f);
        ACTIVE.with(|a| *a.borrow_mut() = prev);
        result
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn slot_count(&self) -> usize {
        self.composer.borrow().slot_count()
    }

    /// Run the scope's cleanups and drop everything remembered.
    pub fn dispose(self) {
        self.scope.dispose();
        let mut c = self.composer.borrow_mut();
        c.slots.clear();
        c.keyed_slots.clear();
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

fn active() -> Option<Rc<RefCell<Composer>>> {
    ACTIVE.with(|a| a.borrow().clone())
}

/// Slot-based remember (sequential composition only).
///
/// Outside of [`Composition::run`] nothing can be remembered and `init` runs
/// on every call.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let Some(composer) = active() else {
        log::warn!("remember called outside of a composition; value will not persist");
        return Rc::new(init());
    };

    let cursor = {
        let mut c = composer.borrow_mut();
        let cursor = c.cursor;
        c.cursor += 1;
        if let Some(rc) = c.slots.get(cursor).and_then(|s| s.downcast_ref::<Rc<T>>()) {
            return rc.clone();
        }
        cursor
    };

    // `init` may itself remember, so the composer is not borrowed here.
    let rc: Rc<T> = Rc::new(init());
    let mut c = composer.borrow_mut();
    if cursor < c.slots.len() {
        log::warn!(
            "remember: slot {cursor} type changed; replacing. \
             If this is due to conditional composition, prefer remember_with_key."
        );
        c.slots[cursor] = Box::new(rc.clone());
    } else {
        c.slots.push(Box::new(rc.clone()));
    }
    rc
}

/// Key-based remember, stable across conditional branches.
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    let Some(composer) = active() else {
        log::warn!("remember_with_key called outside of a composition; value will not persist");
        return Rc::new(init());
    };
    let key = key.into();

    {
        let c = composer.borrow();
        if let Some(existing) = c.keyed_slots.get(&key) {
            if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                return rc.clone();
            }
            log::warn!("remember_with_key: key '{key}' reused with a different type; replacing.");
        }
    }

    let rc: Rc<T> = Rc::new(init());
    composer
        .borrow_mut()
        .keyed_slots
        .insert(key, Box::new(rc.clone()));
    rc
}

/// Manager remembered in the next positional slot. `init` only runs on the
/// first pass.
pub fn use_manager(init: impl FnOnce() -> Record) -> Manager {
    (*remember(|| Manager::new(init()))).clone()
}

pub fn use_manager_with_config(init: impl FnOnce() -> Record, config: ManagerConfig) -> Manager {
    (*remember(|| Manager::with_config(init(), config))).clone()
}

/// Manager remembered under `key`.
pub fn use_manager_with_key(key: impl Into<String>, init: impl FnOnce() -> Record) -> Manager {
    (*remember_with_key(key, || Manager::new(init()))).clone()
}
