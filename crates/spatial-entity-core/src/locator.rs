//! Lazy service locator.
//!
//! Services are registered by name with a zero-argument factory and built on
//! first use. The built instance is kept for the lifetime of the locator.
//! Instances are never torn down. A factory that asks the locator for a
//! service that is still being built gets a second instance.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// A built service.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Memoizing factory registry.
#[derive(Default)]
pub struct LazyServiceLocator {
    factories: RwLock<HashMap<String, Factory>>,
    instances: Mutex<HashMap<String, Instance>>,
}

impl LazyServiceLocator {
    /// Create an empty locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous factory.
    ///
    /// An instance already built under `name` is kept until [`set`](Self::set).
    pub fn register<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Instance);
        self.factories.write().insert(name.into(), factory);
    }

    /// Register a type built with [`Default`].
    pub fn register_default<T>(&self, name: impl Into<String>)
    where
        T: Default + Any + Send + Sync,
    {
        self.register(name, T::default);
    }

    /// Get the instance for `name`, building it on first use.
    ///
    /// Returns `None` when no factory is registered under `name`.
    pub fn get(&self, name: &str) -> Option<Instance> {
        if let Some(instance) = self.instances.lock().get(name) {
            return Some(Arc::clone(instance));
        }

        let built = self.build(name)?;
        let mut instances = self.instances.lock();
        let instance = instances.entry(name.to_string()).or_insert(built);
        Some(Arc::clone(instance))
    }

    /// Get the instance for `name` as a concrete type.
    ///
    /// Returns `None` when no factory is registered or the type does not match.
    pub fn get_as<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get(name)?.downcast::<T>().ok()
    }

    /// Build a fresh instance for `name` and keep it, discarding any previous one.
    ///
    /// Returns `None` when no factory is registered under `name`.
    pub fn set(&self, name: &str) -> Option<Instance> {
        let built = self.build(name)?;
        self.instances
            .lock()
            .insert(name.to_string(), Arc::clone(&built));
        tracing::trace!(service = name, "service instantiated");
        Some(built)
    }

    /// Check if a factory is registered under `name`.
    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Check if `name` has been built.
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.instances.lock().contains_key(name)
    }

    /// Number of built instances.
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Check if nothing has been built yet.
    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    fn build(&self, name: &str) -> Option<Instance> {
        // Factories run without any lock held so they may use the locator.
        let factory = self.factories.read().get(name).cloned()?;
        Some(factory())
    }
}

impl fmt::Debug for LazyServiceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<String> = self.factories.read().keys().cloned().collect();
        registered.sort();
        let mut built: Vec<String> = self.instances.lock().keys().cloned().collect();
        built.sort();
        f.debug_struct("LazyServiceLocator")
            .field("registered", &registered)
            .field("instantiated", &built)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Mailer {
        sent: AtomicUsize,
    }

    #[test]
    fn test_get_memoizes() {
        let locator = LazyServiceLocator::new();
        locator.register_default::<Mailer>("Mailer");

        let first = locator.get("Mailer").unwrap();
        let second = locator.get("Mailer").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(locator.len(), 1);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let locator = LazyServiceLocator::new();
        assert!(locator.get("NoSuchType").is_none());
        assert!(!locator.is_instantiated("NoSuchType"));
        assert!(locator.is_empty());
    }

    #[test]
    fn test_get_as() {
        let locator = LazyServiceLocator::new();
        locator.register_default::<Mailer>("Mailer");

        let mailer = locator.get_as::<Mailer>("Mailer").unwrap();
        mailer.sent.fetch_add(1, Ordering::SeqCst);

        let again = locator.get_as::<Mailer>("Mailer").unwrap();
        assert_eq!(again.sent.load(Ordering::SeqCst), 1);
        assert!(locator.get_as::<String>("Mailer").is_none());
    }

    #[test]
    fn test_set_replaces_instance() {
        let locator = LazyServiceLocator::new();
        locator.register_default::<Mailer>("Mailer");

        let first = locator.get("Mailer").unwrap();
        let replaced = locator.set("Mailer").unwrap();
        assert!(!Arc::ptr_eq(&first, &replaced));

        let current = locator.get("Mailer").unwrap();
        assert!(Arc::ptr_eq(&replaced, &current));
        assert!(locator.set("NoSuchType").is_none());
    }

    #[test]
    fn test_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let locator = LazyServiceLocator::new();
        let counter = Arc::clone(&calls);
        locator.register("Clock", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            42u64
        });

        assert!(!locator.is_instantiated("Clock"));
        assert_eq!(*locator.get_as::<u64>("Clock").unwrap(), 42);
        locator.get("Clock");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(locator.is_instantiated("Clock"));
    }

    #[test]
    fn test_shared_across_threads() {
        let locator = Arc::new(LazyServiceLocator::new());
        locator.register_default::<Mailer>("Mailer");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locator = Arc::clone(&locator);
                std::thread::spawn(move || locator.get("Mailer").unwrap())
            })
            .collect();
        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for instance in &instances[1..] {
            assert!(Arc::ptr_eq(&instances[0], instance));
        }
    }
}
