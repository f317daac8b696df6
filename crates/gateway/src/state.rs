//! Shared gateway state: the snapshot cell and the notification log.
//!
//! The twin engine writes from its own threads; HTTP handlers read from
//! axum workers. The snapshot triple lives behind a `watch` channel holding
//! an immutable cell, so a publish is one atomic swap and readers can never
//! observe a torn combination of snapshot and change set.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use gemello_core::{EventNotification, StateChange, TwinState};

/// The atomically swapped snapshot triple. Immutable once installed.
#[derive(Debug)]
pub struct StateCell {
    pub current: Arc<TwinState>,
    pub previous: Option<Arc<TwinState>>,
    pub changes: Arc<Vec<StateChange>>,
}

/// Latest and previous snapshots, the last change set, and the append-only
/// notification log.
///
/// `publish` is called once per twin state recomputation; it moves the live
/// `current` to `previous` and installs the new snapshot and its change set
/// in a single swap. Nothing older than `previous` is retained — history
/// lives behind the storage executor. The notification log only grows, for
/// the lifetime of the process.
#[derive(Debug)]
pub struct GatewayState {
    cell: watch::Sender<Option<Arc<StateCell>>>,
    notifications: RwLock<Vec<EventNotification>>,
}

impl GatewayState {
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        GatewayState {
            cell,
            notifications: RwLock::new(Vec::new()),
        }
    }

    /// Install `new_state` as current, moving the live current to previous.
    pub fn publish(&self, new_state: TwinState, changes: Vec<StateChange>) {
        let current = Arc::new(new_state);
        let changes = Arc::new(changes);
        self.cell.send_modify(move |cell| {
            let previous = cell.as_ref().map(|c| Arc::clone(&c.current));
            *cell = Some(Arc::new(StateCell {
                current,
                previous,
                changes,
            }));
        });
    }

    /// Latest published cell, or `None` before the first publish.
    pub fn read(&self) -> Option<Arc<StateCell>> {
        self.cell.borrow().clone()
    }

    pub fn current(&self) -> Option<Arc<TwinState>> {
        self.read().map(|cell| Arc::clone(&cell.current))
    }

    pub fn previous(&self) -> Option<Arc<TwinState>> {
        self.read().and_then(|cell| cell.previous.clone())
    }

    pub fn changes(&self) -> Option<Arc<Vec<StateChange>>> {
        self.read().map(|cell| Arc::clone(&cell.changes))
    }

    /// Append one notification. Never evicts.
    pub fn append_notification(&self, notification: EventNotification) {
        self.notifications
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }

    /// Full notification log, oldest first.
    pub fn notifications(&self) -> Vec<EventNotification> {
        self.notifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        GatewayState::new()
    }
}
