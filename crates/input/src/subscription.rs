//! Observer registry keyed by action name, with scoped subscription handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::value::ActionValue;

/// When a subscriber wants to hear about an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Every resolved value, including the zero reported on release.
    OnChange,
    /// Once per press transition.
    OnEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

pub(crate) type Callback = Rc<dyn Fn(ActionValue)>;

struct Entry {
    id: SubscriptionId,
    mode: DeliveryMode,
    callback: Callback,
}

/// Registration order is preserved per action; delivery follows it.
#[derive(Default)]
pub(crate) struct Registry {
    actions: HashMap<String, Vec<Entry>>,
    next_id: u64,
}

impl Registry {
    pub(crate) fn add(&mut self, action: &str, mode: DeliveryMode, callback: Callback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.actions
            .entry(action.to_string())
            .or_default()
            .push(Entry { id, mode, callback });
        id
    }

    pub(crate) fn remove(&mut self, action: &str, id: SubscriptionId) -> bool {
        let Some(entries) = self.actions.get_mut(action) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.actions.remove(action);
        }
        removed
    }

    /// Callbacks due for this resolution, in registration order.
    ///
    /// Returned as owned handles so the registry is not borrowed while they run.
    pub(crate) fn due(&self, action: &str, changed: bool, edge: bool) -> Vec<(SubscriptionId, Callback)> {
        self.actions
            .get(action)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| match e.mode {
                        DeliveryMode::OnChange => changed,
                        DeliveryMode::OnEdge => edge,
                    })
                    .map(|e| (e.id, e.callback.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn contains(&self, action: &str, id: SubscriptionId) -> bool {
        self.actions
            .get(action)
            .is_some_and(|entries| entries.iter().any(|e| e.id == id))
    }

    pub(crate) fn count(&self, action: &str) -> usize {
        self.actions.get(action).map_or(0, Vec::len)
    }

    pub(crate) fn total(&self) -> usize {
        self.actions.values().map(Vec::len).sum()
    }
}

/// Scoped registration returned by `InputDispatcher::subscribe`.
///
/// Dropping the handle removes the callback. Holding it past the dispatcher's
/// lifetime is harmless.
#[must_use = "dropping a Subscription immediately unsubscribes it"]
pub struct Subscription {
    id: SubscriptionId,
    action: String,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, action: String, registry: &Rc<RefCell<Registry>>) -> Self {
        Self {
            id,
            action,
            registry: Rc::downgrade(registry),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Unsubscribe now. Equivalent to dropping the handle.
    pub fn release(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.action, self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("action", &self.action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn noop() -> Callback {
        Rc::new(|_| {})
    }

    #[test]
    fn ids_are_unique_and_removal_is_idempotent() {
        let mut reg = Registry::default();
        let a = reg.add("Jump", DeliveryMode::OnEdge, noop());
        let b = reg.add("Jump", DeliveryMode::OnEdge, noop());
        assert_ne!(a, b);
        assert_eq!(reg.count("Jump"), 2);
        assert!(reg.remove("Jump", a));
        assert!(!reg.remove("Jump", a));
        assert!(!reg.remove("Move", b));
        assert!(reg.contains("Jump", b));
        assert!(!reg.contains("Jump", a));
        assert_eq!(reg.total(), 1);
    }

    #[test]
    fn due_filters_by_mode_in_registration_order() {
        let mut reg = Registry::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = order.clone();
            reg.add(
                "Jump",
                DeliveryMode::OnChange,
                Rc::new(move |_| order.borrow_mut().push(tag)),
            );
        }
        reg.add("Jump", DeliveryMode::OnEdge, noop());

        let due = reg.due("Jump", true, false);
        assert_eq!(due.len(), 2);
        for (_, cb) in due {
            cb(ActionValue::Button(true));
        }
        assert_eq!(*order.borrow(), vec!["first", "second"]);
        assert_eq!(reg.due("Jump", false, true).len(), 1);
        assert!(reg.due("Look", true, true).is_empty());
    }

    #[test]
    fn dropping_handle_unsubscribes() {
        let reg = Rc::new(RefCell::new(Registry::default()));
        let hits = Rc::new(Cell::new(0));
        let id = {
            let hits = hits.clone();
            reg.borrow_mut()
                .add("Move", DeliveryMode::OnChange, Rc::new(move |_| hits.set(hits.get() + 1)))
        };
        let handle = Subscription::new(id, "Move".into(), &reg);
        assert_eq!(reg.borrow().count("Move"), 1);
        drop(handle);
        assert_eq!(reg.borrow().count("Move"), 0);
    }

    #[test]
    fn handle_outliving_registry_is_harmless() {
        let reg = Rc::new(RefCell::new(Registry::default()));
        let id = reg.borrow_mut().add("Move", DeliveryMode::OnChange, noop());
        let handle = Subscription::new(id, "Move".into(), &reg);
        drop(reg);
        handle.release();
    }
}
