use std::cell::RefCell;
use std::rc::Rc;

/// Single-threaded shared handle, the unit passed to every consumer of a service.
pub type Shared<T> = Rc<RefCell<T>>;

/// A second construction of a single-instance service was attempted.
///
/// Non-fatal: the duplicate is discarded and the first instance stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate {kind} instance discarded; the first instance stays authoritative")]
pub struct DuplicateInstanceWarning {
    pub kind: &'static str,
}

/// Holder for a service that must exist exactly once for the process lifetime.
///
/// The slot is created at startup and passed explicitly to whoever constructs
/// services; consumers receive the `Shared` handle, never the slot itself.
#[derive(Debug)]
pub struct InstanceSlot<T> {
    kind: &'static str,
    instance: Option<Shared<T>>,
}

impl<T> InstanceSlot<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            instance: None,
        }
    }

    /// Install `value` if the slot is empty.
    ///
    /// If an instance already exists, `value` is dropped and the warning is returned.
    pub fn try_install(&mut self, value: T) -> Result<Shared<T>, DuplicateInstanceWarning> {
        if self.instance.is_some() {
            return Err(DuplicateInstanceWarning { kind: self.kind });
        }
        let shared = Rc::new(RefCell::new(value));
        self.instance = Some(shared.clone());
        tracing::debug!(kind = self.kind, "instance installed");
        Ok(shared)
    }

    /// Install `value`, or discard it and hand back the existing instance.
    pub fn install(&mut self, value: T) -> Shared<T> {
        if let Some(existing) = &self.instance {
            tracing::warn!("{}", DuplicateInstanceWarning { kind: self.kind });
            return existing.clone();
        }
        let shared = Rc::new(RefCell::new(value));
        self.instance = Some(shared.clone());
        tracing::debug!(kind = self.kind, "instance installed");
        shared
    }

    /// Handle to the installed instance, if any.
    pub fn get(&self) -> Option<Shared<T>> {
        self.instance.clone()
    }

    pub fn is_installed(&self) -> bool {
        self.instance.is_some()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_has_no_instance() {
        let slot: InstanceSlot<u32> = InstanceSlot::new("counter");
        assert!(slot.get().is_none());
        assert!(!slot.is_installed());
    }

    #[test]
    fn first_install_is_authoritative() {
        let mut slot = InstanceSlot::new("counter");
        let first = slot.install(1u32);
        let second = slot.install(2u32);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(*second.borrow(), 1);
    }

    #[test]
    fn try_install_reports_duplicate() {
        let mut slot = InstanceSlot::new("dispatcher");
        slot.try_install("a").unwrap();
        let err = slot.try_install("b").unwrap_err();
        assert_eq!(err.kind, "dispatcher");
        assert!(err.to_string().contains("dispatcher"));
        assert_eq!(*slot.get().unwrap().borrow(), "a");
    }
}
