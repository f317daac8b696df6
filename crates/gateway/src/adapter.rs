//! The gateway itself: push-callback binding, action forwarding, query
//! dispatch, and the server lifecycle.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use gemello_core::{
    ActionDispatcher, ChangedComponent, EventNotification, StateChange, StateObserver,
    TwinInstance, TwinState,
};
use gemello_storage::{QueryRequest, QueryResult, StorageError, StorageStats, TwinStorage};

use crate::config::{GatewayConfig, ResourceKind};
use crate::error::GatewayError;
use crate::routes::build_router;
use crate::state::{GatewayState, StateCell};

/// Outcome of an HTTP-initiated action request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Forwarded into the engine's action pipeline; execution is asynchronous.
    Accepted,
    /// Unknown action key, no published snapshot, or the dispatch failed.
    Rejected,
}

struct ServerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// The HTTP gateway over one digital twin.
///
/// Bridges the engine's asynchronous push model (state updates, event
/// notifications) to a synchronous pull-based HTTP surface, forwards action
/// requests back into the engine, and translates historical queries for the
/// attached storage executor.
pub struct HttpGateway {
    config: GatewayConfig,
    instance: TwinInstance,
    state: GatewayState,
    dispatcher: Arc<dyn ActionDispatcher>,
    storage: Option<Arc<dyn TwinStorage>>,
    server: Mutex<Option<ServerHandle>>,
}

impl HttpGateway {
    pub fn new(
        config: GatewayConfig,
        instance: TwinInstance,
        dispatcher: Arc<dyn ActionDispatcher>,
        storage: Option<Arc<dyn TwinStorage>>,
    ) -> Self {
        HttpGateway {
            config,
            instance,
            state: GatewayState::new(),
            dispatcher,
            storage,
            server: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn instance(&self) -> &TwinInstance {
        &self.instance
    }

    // ── Snapshot reads ───────────────────────────────────────────────────

    /// Latest snapshot cell, or `None` before the first state update.
    pub fn read(&self) -> Option<Arc<StateCell>> {
        self.state.read()
    }

    pub fn current_state(&self) -> Option<Arc<TwinState>> {
        self.state.current()
    }

    pub fn previous_state(&self) -> Option<Arc<TwinState>> {
        self.state.previous()
    }

    pub fn last_changes(&self) -> Option<Arc<Vec<StateChange>>> {
        self.state.changes()
    }

    /// Full notification log, oldest first.
    pub fn notifications(&self) -> Vec<EventNotification> {
        self.state.notifications()
    }

    // ── Action forwarding ────────────────────────────────────────────────

    /// Validate `action_key` against the current snapshot and forward the
    /// request into the engine. Forwarding is fire-and-forget: `Accepted`
    /// means accepted for processing, never executed.
    pub async fn invoke_action(&self, action_key: &str, body: String) -> ActionOutcome {
        let declared = self
            .state
            .current()
            .is_some_and(|s| s.contains_action(action_key));
        if !declared {
            warn!(action = action_key, "action rejected: not declared in current state");
            return ActionOutcome::Rejected;
        }

        match self.dispatcher.submit_action(action_key, body).await {
            Ok(()) => {
                debug!(action = action_key, "action forwarded to engine");
                ActionOutcome::Accepted
            }
            Err(e) => {
                error!(action = action_key, "action dispatch failed: {e}");
                ActionOutcome::Rejected
            }
        }
    }

    // ── Query dispatch ───────────────────────────────────────────────────

    /// Run one historical query through the attached executor, unchanged.
    pub async fn execute_query(&self, request: QueryRequest) -> Result<QueryResult, StorageError> {
        match &self.storage {
            Some(storage) => storage.execute_query(request).await,
            None => Ok(QueryResult::fail("no storage executor attached")),
        }
    }

    /// Storage statistics, when an executor is attached and can provide them.
    pub async fn storage_stats(&self) -> Result<StorageStats, StorageError> {
        match &self.storage {
            Some(storage) => storage.storage_stats().await,
            None => Err(StorageError::StatsUnavailable),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Bind the configured address and start serving.
    ///
    /// One-shot: a second call while running returns
    /// [`GatewayError::AlreadyStarted`]. Returns the bound address (useful
    /// with port 0).
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr, GatewayError> {
        if self.lock_server().is_some() {
            return Err(GatewayError::AlreadyStarted);
        }

        let addr = format!("{}:{}", self.config.host(), self.config.port());
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| GatewayError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| GatewayError::Bind {
            addr,
            source,
        })?;

        let router = build_router(Arc::clone(self));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                // Resolves on an explicit stop or when the handle is dropped.
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                error!("gateway server error: {e}");
            }
        });

        let mut server = self.server.lock().unwrap_or_else(PoisonError::into_inner);
        if server.is_some() {
            // Lost a start race; dropping shutdown_tx tears the new task down.
            return Err(GatewayError::AlreadyStarted);
        }
        *server = Some(ServerHandle {
            shutdown: shutdown_tx,
            task,
            local_addr,
        });
        info!(id = self.config.id(), %local_addr, "gateway listening");
        Ok(local_addr)
    }

    /// Signal shutdown and wait for the serving task to finish. Idempotent:
    /// calling while not started is a no-op.
    pub async fn stop(&self) {
        let handle = self
            .server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.shutdown.send(());
            if let Err(e) = handle.task.await {
                warn!("gateway task join failed: {e}");
            }
            info!(id = self.config.id(), "gateway stopped");
        }
    }

    /// Address the server is bound to while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_server().as_ref().map(|h| h.local_addr)
    }

    fn lock_server(&self) -> std::sync::MutexGuard<'_, Option<ServerHandle>> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Whitelist binding ────────────────────────────────────────────────

    /// Rebuild a pushed snapshot with only the whitelisted components. The
    /// read handlers never filter; what is installed here is what they serve.
    fn apply_filters(&self, state: TwinState) -> TwinState {
        if self.config.is_unrestricted() {
            return state;
        }

        let mut filtered = TwinState::new(state.evaluated_at_ms());
        for property in state.properties() {
            if self.config.included(ResourceKind::Property, &property.key) {
                filtered = filtered.with_property(property.clone());
            }
        }
        for action in state.actions() {
            if self.config.included(ResourceKind::Action, &action.key) {
                filtered = filtered.with_action(action.clone());
            }
        }
        for event in state.events() {
            if self.config.included(ResourceKind::Event, &event.key) {
                filtered = filtered.with_event(event.clone());
            }
        }
        for relationship in state.relationships() {
            if self
                .config
                .included(ResourceKind::Relationship, &relationship.name)
            {
                filtered = filtered.with_relationship(relationship.clone());
            }
        }
        filtered
    }

    /// Keep only changes whose component passes the whitelist, so the change
    /// list never leaks components the snapshot itself excludes.
    fn filter_changes(&self, changes: Vec<StateChange>) -> Vec<StateChange> {
        if self.config.is_unrestricted() {
            return changes;
        }

        changes
            .into_iter()
            .filter(|change| {
                let component = change.after.as_ref().or(change.before.as_ref());
                match component {
                    Some(component) => self
                        .config
                        .included(component_kind(component), &change.key),
                    None => true,
                }
            })
            .collect()
    }
}

fn component_kind(component: &ChangedComponent) -> ResourceKind {
    match component {
        ChangedComponent::Property(_) => ResourceKind::Property,
        ChangedComponent::Action(_) => ResourceKind::Action,
        ChangedComponent::Event(_) => ResourceKind::Event,
        ChangedComponent::Relationship(_) | ChangedComponent::RelationshipInstance(_) => {
            ResourceKind::Relationship
        }
    }
}

impl StateObserver for HttpGateway {
    fn on_state_update(
        &self,
        new_state: TwinState,
        previous: Option<TwinState>,
        changes: Vec<StateChange>,
    ) {
        debug!(
            evaluated_at_ms = new_state.evaluated_at_ms(),
            engine_previous = previous.is_some(),
            change_count = changes.len(),
            "state update from engine"
        );
        // The snapshot store derives its own previous from the live current;
        // the engine-supplied one is only observed here.
        let filtered_state = self.apply_filters(new_state);
        let filtered_changes = self.filter_changes(changes);
        self.state.publish(filtered_state, filtered_changes);
    }

    fn on_event_notification(&self, notification: EventNotification) {
        if !self
            .config
            .included(ResourceKind::Event, &notification.event_key)
        {
            debug!(event = %notification.event_key, "notification dropped by event filter");
            return;
        }
        self.state.append_notification(notification);
    }
}
