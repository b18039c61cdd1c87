use crate::core::detector;
use crate::core::hub::{NotificationHub, SubscriptionId};
use crate::core::store::InventoryStore;
use crate::domain::model::{CargoTally, InventorySnapshot, Mutation};
use chrono::{DateTime, Duration, Utc};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared entry point to the carrier inventory.
///
/// Construct one per process, wrap it in an `Arc` and hand clones to every
/// plugin that needs cargo data.
///
/// Reads are served from the committed snapshot and never wait for a
/// visitor. Every write runs as one unit under the writer lock:
/// visitor, change detection, commit, then listener notification.
///
/// # Caller contract
///
/// Visitors passed to [`read_modify_write`](Self::read_modify_write) or
/// [`inventory`](Self::inventory), and change handlers, must not call back
/// into `read_modify_write` or `inventory`. The writer lock is not reentrant
/// and such a call deadlocks. Calling [`read`](Self::read) or
/// [`snapshot`](Self::snapshot) from a change handler is fine and observes
/// the change being announced.
#[derive(Debug, Default)]
pub struct CargoArbiter {
    store: InventoryStore,
    hub: NotificationHub,
    writer: Mutex<()>,
}

impl CargoArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current committed snapshot.
    pub fn snapshot(&self) -> Arc<InventorySnapshot> {
        self.store.get()
    }

    pub fn read<R>(&self, visitor: impl FnOnce(Option<&str>, &CargoTally) -> R) -> R {
        let snapshot = self.store.get();
        visitor(snapshot.call_sign(), snapshot.tally())
    }

    /// Runs `visitor` against the current inventory and commits what it asks
    /// for. Returns whether a change was committed (and listeners notified).
    ///
    /// An `Err` from the visitor is handed back untouched; nothing is
    /// committed in that case.
    pub fn read_modify_write<E>(
        &self,
        visitor: impl FnOnce(Option<&str>, &CargoTally) -> Result<Mutation, E>,
    ) -> Result<bool, E> {
        self.write(visitor, None)
    }

    /// Replaces call sign and tally with an authoritative copy and stamps the
    /// sync time. The stamp lands before listeners run, so they already see
    /// it through [`last_sync`](Self::last_sync).
    pub fn resync(&self, snapshot: InventorySnapshot, synced_at: DateTime<Utc>) -> bool {
        let result = self.write(
            |_, _| Ok::<_, Infallible>(Mutation::Resync(snapshot)),
            Some(synced_at),
        );
        match result {
            Ok(changed) => changed,
            Err(never) => match never {},
        }
    }

    fn write<E>(
        &self,
        visitor: impl FnOnce(Option<&str>, &CargoTally) -> Result<Mutation, E>,
        synced_at: Option<DateTime<Utc>>,
    ) -> Result<bool, E> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.store.get();
        let mutation = visitor(current.call_sign(), current.tally())?;
        if let Some(at) = synced_at {
            self.store.mark_synced(at);
        }

        let proposed = match mutation {
            Mutation::Keep => return Ok(false),
            Mutation::Replace(tally) => current.with_tally(tally.normalized()),
            Mutation::Resync(snapshot) => InventorySnapshot::new(
                snapshot.call_sign().map(str::to_string),
                snapshot.tally().clone().normalized(),
            ),
        };

        if !detector::changed(&current, &proposed) {
            tracing::debug!("Inventory unchanged after write request");
            return Ok(false);
        }

        tracing::debug!(
            call_sign = ?proposed.call_sign(),
            commodities = proposed.tally().len(),
            units = proposed.tally().total(),
            "Committing inventory change"
        );
        self.store.replace(proposed);

        let report = self.hub.notify_all();
        if report.failed > 0 {
            tracing::warn!(
                failed = report.failed,
                delivered = report.delivered,
                "Some cargo change handlers failed"
            );
        }
        Ok(true)
    }

    /// Plugin-facing access: `callback` gets the call sign and a working copy
    /// of the tally it may edit in place. Returning `true` asks for the edited
    /// copy to replace the inventory; `false` discards the edits.
    pub fn inventory(&self, callback: impl FnOnce(Option<&str>, &mut CargoTally) -> bool) -> bool {
        tracing::debug!("Accessing watchable inventory");
        let result = self.read_modify_write(|call_sign, tally| {
            let mut working = tally.clone();
            let mutation = if callback(call_sign, &mut working) {
                Mutation::Replace(working)
            } else {
                Mutation::Keep
            };
            Ok::<_, Infallible>(mutation)
        });
        match result {
            Ok(changed) => changed,
            Err(never) => match never {},
        }
    }

    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.hub.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    pub fn add_on_cargo_change_handler(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe(handler)
    }

    pub fn remove_on_cargo_change_handler(&self, id: SubscriptionId) -> bool {
        self.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.len()
    }

    pub fn record_sync(&self, at: DateTime<Utc>) {
        self.store.mark_synced(at);
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.store.last_sync()
    }

    /// A never-synced inventory is always stale.
    pub fn is_sync_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match self.store.last_sync() {
            Some(at) => now - at > max_age,
            None => true,
        }
    }
}
