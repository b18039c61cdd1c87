use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Handle returned by [`NotificationHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type SharedHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Registry of "cargo changed" listeners.
#[derive(Default)]
pub struct NotificationHub {
    handlers: Mutex<Vec<(SubscriptionId, SharedHandler)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: SharedHandler = Arc::new(handler);
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        tracing::debug!(subscription = id.0, "Cargo change handler installed");
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        before != handlers.len()
    }

    pub fn len(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every handler registered at the moment of the call, in
    /// registration order. The registry lock is released before the first
    /// handler runs, so handlers may subscribe or unsubscribe freely.
    pub fn notify_all(&self) -> NotifyReport {
        let handlers: Vec<(SubscriptionId, SharedHandler)> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        tracing::debug!("Calling {} on_cargo_changed handlers", handlers.len());

        let mut report = NotifyReport::default();
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| (*handler)())) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    report.failed += 1;
                    tracing::error!(
                        subscription = id.0,
                        "Cargo change handler panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
