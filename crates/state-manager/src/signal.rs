use std::cell::RefCell;
use std::rc::Rc;

pub type SubId = usize;

/// Subscriber list notified with a reference to the new value.
pub(crate) struct Subscribers<T: 'static> {
    next_id: SubId,
    subs: Vec<(SubId, Rc<dyn Fn(&T)>)>,
}

impl<T: 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subs: Vec::new(),
        }
    }
}

impl<T: 'static> Subscribers<T> {
    pub fn subscribe(&mut self, f: impl Fn(&T) + 'static) -> SubId {
        let id = self.next_id;
        self.next_id += 1;
        self.subs.push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubId) -> bool {
        let before = self.subs.len();
        self.subs.retain(|(sid, _)| *sid != id);
        self.subs.len() != before
    }

    /// Callbacks to invoke, detached from the list so they may (un)subscribe
    /// while being notified.
    pub fn snapshot(&self) -> Vec<Rc<dyn Fn(&T)>> {
        self.subs.iter().map(|(_, f)| f.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }
}

/// Handle to a live subscription. Cancelling runs at most once; clones share
/// the same underlying cancel.
///
/// Dropping the handle does not cancel: subscriptions made inside a
/// composition are cancelled when its scope is disposed.
#[derive(Clone)]
pub struct Subscription(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(cancel)))))
    }

    pub fn cancel(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.borrow().is_some()
    }
}
