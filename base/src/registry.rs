use std::any::{type_name, Any, TypeId};
use std::rc::Rc;

use crate::base::HashMap;

//////////////////////////////////////////////////////////////////////////////

type Waiter = Box<dyn FnOnce(Rc<dyn Any>)>;

// A publish-once directory of shared services, keyed by type. Consumers that
// start before a service exists can queue a callback for when it shows up.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Rc<dyn Any>>,
    waiters: HashMap<TypeId, Vec<Waiter>>,
}

impl ServiceRegistry {
    pub fn new() -> Self { Self::default() }

    /// Publishes `service` and runs every callback waiting on its type, in the
    /// order they were queued. Returns false, and keeps the existing service,
    /// if the type was already published.
    pub fn publish<T: 'static>(&mut self, service: Rc<T>) -> bool {
        let key = TypeId::of::<T>();
        if self.services.contains_key(&key) {
            log::info!("{} is already published", type_name::<T>());
            return false;
        }

        let erased: Rc<dyn Any> = service;
        self.services.insert(key, erased.clone());
        log::debug!("Published {}", type_name::<T>());

        let Some(waiters) = self.waiters.remove(&key) else { return true; };
        for waiter in waiters { waiter(erased.clone()); }
        true
    }

    pub fn resolve<T: 'static>(&self) -> Option<Rc<T>> {
        let service = self.services.get(&TypeId::of::<T>())?;
        service.clone().downcast::<T>().ok()
    }

    pub fn is_published<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Calls `callback` with the service of type T: right away if it is
    /// already published, otherwise once, when it is.
    pub fn wait_for<T: 'static, F: FnOnce(Rc<T>) + 'static>(&mut self, callback: F) {
        if let Some(service) = self.resolve::<T>() { return callback(service); }

        let waiter: Waiter = Box::new(move |x: Rc<dyn Any>| {
            let Ok(service) = x.downcast::<T>() else { return; };
            callback(service);
        });
        self.waiters.entry(TypeId::of::<T>()).or_default().push(waiter);
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Manager { name: &'static str }

    struct Other;

    type Log = Rc<RefCell<Vec<String>>>;

    fn waiter(log: &Log, tag: &'static str) -> impl FnOnce(Rc<Manager>) + 'static {
        let log = log.clone();
        move |x: Rc<Manager>| log.borrow_mut().push(format!("{}: {}", tag, x.name))
    }

    #[test]
    fn test_resolve() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.resolve::<Manager>().is_none());
        assert!(registry.publish(Rc::new(Manager { name: "fog" })));
        assert!(registry.is_published::<Manager>());
        assert!(!registry.is_published::<Other>());
        assert_eq!(registry.resolve::<Manager>().map(|x| x.name), Some("fog"));
        assert!(registry.resolve::<Other>().is_none());
    }

    #[test]
    fn test_publish_once() {
        let mut registry = ServiceRegistry::new();
        let log = Log::default();
        registry.wait_for::<Manager, _>(waiter(&log, "a"));
        assert!(registry.publish(Rc::new(Manager { name: "first" })));
        assert!(!registry.publish(Rc::new(Manager { name: "second" })));
        assert_eq!(registry.resolve::<Manager>().map(|x| x.name), Some("first"));
        assert_eq!(*log.borrow(), vec!["a: first"]);
    }

    #[test]
    fn test_early_waiters_run_in_order() {
        let mut registry = ServiceRegistry::new();
        let log = Log::default();
        registry.wait_for::<Manager, _>(waiter(&log, "a"));
        registry.wait_for::<Manager, _>(waiter(&log, "b"));
        registry.wait_for(|_: Rc<Other>| panic!("Wrong service type"));
        assert!(log.borrow().is_empty());

        registry.publish(Rc::new(Manager { name: "fog" }));
        assert_eq!(*log.borrow(), vec!["a: fog", "b: fog"]);
    }

    #[test]
    fn test_late_waiter_runs_immediately() {
        let mut registry = ServiceRegistry::new();
        let log = Log::default();
        registry.publish(Rc::new(Manager { name: "fog" }));
        registry.wait_for::<Manager, _>(waiter(&log, "late"));
        assert_eq!(*log.borrow(), vec!["late: fog"]);
    }
}
