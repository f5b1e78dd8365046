//! Hand-written fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use valyan_audit::{AuditEvent, AuditLog, AuditLogError, AuditLogFilter, AuditLogId};
use valyan_storage::{
    AssignOwnerParams, OwnershipLookup, PermissionStore, PrincipalId, StoreError,
};

/// Permission store that counts fetches and can hold a role's fetch until released.
#[derive(Default)]
pub struct FakePermissionStore {
    roles: Mutex<HashMap<String, Vec<String>>>,
    fetches: AtomicUsize,
    per_role: Mutex<HashMap<String, usize>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    started: Notify,
    unavailable: AtomicBool,
}

impl FakePermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(self, role: &str, codes: &[&str]) -> Self {
        self.set_role(role, codes);
        self
    }

    pub fn set_role(&self, role: &str, codes: &[&str]) {
        self.roles.lock().unwrap().insert(
            role.to_string(),
            codes.iter().map(|c| c.to_string()).collect(),
        );
    }

    /// Make fetches for `role` wait until the returned gate is notified.
    pub fn block(&self, role: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(role.to_string(), gate.clone());
        gate
    }

    pub fn unblock(&self, role: &str) {
        self.gates.lock().unwrap().remove(role);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Resolves once a fetch has started (possibly before this call).
    pub async fn wait_fetch_started(&self) {
        self.started.notified().await;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fetches_for(&self, role: &str) -> usize {
        self.per_role
            .lock()
            .unwrap()
            .get(role)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PermissionStore for FakePermissionStore {
    async fn get_permissions_for_role(&self, role_name: &str) -> Result<Vec<String>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self
            .per_role
            .lock()
            .unwrap()
            .entry(role_name.to_string())
            .or_default() += 1;
        self.started.notify_one();

        let gate = self.gates.lock().unwrap().get(role_name).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".into()));
        }
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(role_name)
            .cloned()
            .unwrap_or_default())
    }
}

/// Audit sink that keeps events in memory and can be switched to fail or stall.
#[derive(Default)]
pub struct RecordingAuditLog {
    events: Mutex<Vec<AuditEvent>>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl RecordingAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let log = Self::default();
        log.failing.store(true, Ordering::SeqCst);
        log
    }

    /// Every `record` sleeps for `delay` first.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLog for RecordingAuditLog {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditLogError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditLogError::Database("disk full".into()));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError> {
        Ok(self
            .events()
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    async fn get(&self, id: AuditLogId) -> Result<AuditEvent, AuditLogError> {
        self.events()
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(AuditLogError::NotFound(id))
    }

    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError> {
        Ok(self.query(filter).await?.len() as u64)
    }
}

/// Ownership lookup over a fixed list of `(principal, type, id)` records.
#[derive(Default)]
pub struct FakeOwnership {
    owners: Mutex<HashMap<(String, String), PrincipalId>>,
    lookups: AtomicUsize,
}

impl FakeOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(self, principal_id: PrincipalId, resource_type: &str, resource_id: &str) -> Self {
        self.owners.lock().unwrap().insert(
            (resource_type.to_string(), resource_id.to_string()),
            principal_id,
        );
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OwnershipLookup for FakeOwnership {
    async fn is_owner(
        &self,
        principal_id: &PrincipalId,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<bool, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.owners
            .lock()
            .unwrap()
            .get(&(resource_type.to_string(), resource_id.to_string()))
            .map(|owner| owner == principal_id)
            .ok_or(StoreError::NotFound)
    }

    async fn assign_owner(&self, params: &AssignOwnerParams) -> Result<(), StoreError> {
        self.owners.lock().unwrap().insert(
            (params.resource_type.clone(), params.resource_id.clone()),
            params.principal_id,
        );
        Ok(())
    }
}

/// Captures tracing events so tests can assert on what was logged.
pub mod logs {
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Debug)]
    pub struct CapturedEvent {
        pub target: String,
        pub level: tracing::Level,
        pub fields: Vec<(String, String)>,
    }

    impl CapturedEvent {
        pub fn field(&self, key: &str) -> Option<&str> {
            self.fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    struct TestLayer {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for TestLayer {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut fields = Vec::new();
            let mut visitor = FieldVisitor(&mut fields);
            event.record(&mut visitor);
            self.events.lock().unwrap().push(CapturedEvent {
                target: event.metadata().target().to_string(),
                level: *event.metadata().level(),
                fields,
            });
        }
    }

    struct FieldVisitor<'a>(&'a mut Vec<(String, String)>);

    impl tracing::field::Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0
                .push((field.name().to_string(), format!("{value:?}")));
        }
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
    }

    pub fn make_subscriber() -> (
        impl tracing::Subscriber + Send + Sync,
        Arc<Mutex<Vec<CapturedEvent>>>,
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = TestLayer {
            events: Arc::clone(&events),
        };
        let subscriber = tracing_subscriber::registry().with(layer);
        (subscriber, events)
    }
}
