//! Progress notifications for long running package requests.
//!
//! A packaging client emits an event each time it observes a request that is
//! still pending while polling. Commands register listeners to print a status
//! line; listeners are removed when their [`ListenerGuard`] is dropped.

use crate::sobjects::{PackageInstallRequest, SubscriberPackageVersionUninstallRequest};
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, warn};

/// An observation made while polling a request.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// An uninstall request is still pending
    PackageUninstall(SubscriberPackageVersionUninstallRequest),
    /// An install request is still pending
    PackageInstall(PackageInstallRequest),
}

impl LifecycleEvent {
    /// The kind used to filter listeners.
    #[must_use]
    pub const fn kind(&self) -> LifecycleEventKind {
        match self {
            Self::PackageUninstall(_) => LifecycleEventKind::PackageUninstall,
            Self::PackageInstall(_) => LifecycleEventKind::PackageInstall,
        }
    }
}

/// Event kinds a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    /// See [`LifecycleEvent::PackageUninstall`]
    PackageUninstall,
    /// See [`LifecycleEvent::PackageInstall`]
    PackageInstall,
}

type Callback = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

struct Listener {
    id: u64,
    kind: LifecycleEventKind,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Cloneable handle to a set of listeners.
#[derive(Clone, Default)]
pub struct Lifecycle {
    registry: Arc<RwLock<Registry>>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Lifecycle {
    /// Create an empty lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of `kind`.
    ///
    /// The listener stays registered until the returned guard is dropped.
    #[must_use = "the listener is removed when the guard is dropped"]
    pub fn on<F>(&self, kind: LifecycleEventKind, callback: F) -> ListenerGuard
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        let mut registry = match self.registry.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push(Listener {
            id,
            kind,
            callback: Arc::new(callback),
        });
        debug!(?kind, id, "Registered lifecycle listener");

        ListenerGuard {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every listener registered for its kind.
    ///
    /// Listeners run on the caller's task, in registration order.
    pub fn emit(&self, event: &LifecycleEvent) {
        let callbacks: Vec<Callback> = match self.registry.read() {
            Ok(registry) => registry
                .listeners
                .iter()
                .filter(|l| l.kind == event.kind())
                .map(|l| Arc::clone(&l.callback))
                .collect(),
            Err(_) => {
                warn!("Lifecycle registry poisoned, dropping event");
                return;
            }
        };
        debug!(kind = ?event.kind(), listeners = callbacks.len(), "Emitting lifecycle event");
        for callback in callbacks {
            callback(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.read().map_or(0, |r| r.listeners.len())
    }
}

/// Removes its listener on drop.
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    registry: Weak<RwLock<Registry>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade()
            && let Ok(mut registry) = registry.write()
        {
            registry.listeners.retain(|l| l.id != self.id);
        }
    }
}
