use crate::Disposable;
use std::sync::Arc;

/// Runs its release action when dropped, unless detached.
#[must_use]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Keeps the subscribed resource alive for the rest of the process.
    pub fn detach(mut self) {
        self.unsubscribe.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// A disposal scope. Everything pushed into it is released in reverse
/// registration order, either by [`ManagedResources::dispose`] or on drop.
#[derive(Debug, Default)]
#[must_use]
pub struct ManagedResources {
    subscriptions: Vec<Subscription>,
}

impl ManagedResources {
    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn push_disposable(&mut self, disposable: Arc<dyn Disposable>) {
        self.push(Subscription::new(move || disposable.dispose()));
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn dispose(&mut self) {
        while let Some(subscription) = self.subscriptions.pop() {
            drop(subscription);
        }
    }
}

impl Drop for ManagedResources {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subscription_release_and_detach() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let subscription = Subscription::new({
            let log = log.clone();
            move || log.lock().push("released")
        });
        drop(subscription);
        assert_eq!(*log.lock(), ["released"]);

        Subscription::new({
            let log = log.clone();
            move || log.lock().push("detached")
        })
        .detach();
        assert_eq!(*log.lock(), ["released"]);
    }

    #[test]
    fn test_managed_resources_release_in_reverse_order() {
        struct Counted(Arc<Mutex<Vec<&'static str>>>);

        impl Disposable for Counted {
            fn dispose(&self) {
                self.0.lock().push("disposable");
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut resources = ManagedResources::default();
        resources.push_disposable(Arc::new(Counted(log.clone())));
        for name in ["first", "second"] {
            let log = log.clone();
            resources.push(Subscription::new(move || log.lock().push(name)));
        }
        assert_eq!(resources.len(), 3);

        resources.dispose();
        assert!(resources.is_empty());
        assert_eq!(*log.lock(), ["second", "first", "disposable"]);

        resources.dispose();
        drop(resources);
        assert_eq!(log.lock().len(), 3);
    }
}
