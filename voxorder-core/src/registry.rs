//! Order registry abstraction.
//!
//! The interpreter only pulls a fresh snapshot before each utterance and
//! issues status updates. `LocalRegistry` is the in-process implementation:
//! authoritative local state, optionally mirrored to an external service.
//! Mirror failures are logged and never undo or fail the local update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, VoxorderError};
use crate::vocab::Status;

/// A kitchen order as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub status: Status,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Snapshot element handed to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    pub status: Status,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            status: order.status,
        }
    }
}

/// Contract for order registry collaborators.
pub trait OrderRegistry: Send + Sync {
    /// Point-in-time view of every known order.
    ///
    /// # Errors
    /// `VoxorderError::CollaboratorUnavailable` if the registry cannot be reached.
    fn snapshot(&self) -> Result<Vec<OrderSummary>>;

    /// Set the status of order `id`. Setting the current status again is a no-op.
    ///
    /// # Errors
    /// - `VoxorderError::IdentifierUnresolved` if no order has this id.
    /// - `VoxorderError::CollaboratorUnavailable` on transport failure.
    fn update_status(&self, id: &str, status: Status) -> Result<Order>;
}

/// Downstream service notified after each successful local update.
pub trait StatusMirror: Send + Sync {
    fn mirror(&self, id: &str, status: Status) -> Result<()>;
}

/// Thread-safe reference-counted handle to any `OrderRegistry` implementor.
#[derive(Clone)]
pub struct RegistryHandle(pub Arc<dyn OrderRegistry>);

impl RegistryHandle {
    pub fn new<R: OrderRegistry + 'static>(registry: R) -> Self {
        Self(Arc::new(registry))
    }

    /// Wrap a registry that the caller keeps its own `Arc` to.
    pub fn shared<R: OrderRegistry + 'static>(registry: Arc<R>) -> Self {
        Self(registry)
    }
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle").finish_non_exhaustive()
    }
}

/// In-memory registry, local-first.
#[derive(Default)]
pub struct LocalRegistry {
    orders: RwLock<HashMap<String, Order>>,
    mirror: Option<Box<dyn StatusMirror>>,
}

impl LocalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mirror<M: StatusMirror + 'static>(mirror: M) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            mirror: Some(Box::new(mirror)),
        }
    }

    /// Register a new order in `Preparing`. An existing order with the same
    /// id is replaced.
    ///
    /// # Errors
    /// `VoxorderError::MissingOrderId` if `id` is blank.
    pub fn ingest(&self, id: &str) -> Result<Order> {
        let id = id.trim();
        if id.is_empty() {
            return Err(VoxorderError::MissingOrderId);
        }

        let now = Utc::now();
        let order = Order {
            id: id.to_string(),
            status: Status::Preparing,
            created_at: now,
            updated_at: now,
        };
        let replaced = self
            .orders
            .write()
            .insert(order.id.clone(), order.clone())
            .is_some();
        info!(order_id = %order.id, replaced, "order ingested");
        Ok(order)
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.orders.read().get(id).cloned()
    }

    /// All orders, oldest first.
    pub fn list(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.read().values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

impl OrderRegistry for LocalRegistry {
    fn snapshot(&self) -> Result<Vec<OrderSummary>> {
        Ok(self.list().iter().map(OrderSummary::from).collect())
    }

    fn update_status(&self, id: &str, status: Status) -> Result<Order> {
        let updated = {
            let mut orders = self.orders.write();
            let order = orders
                .get_mut(id)
                .ok_or_else(|| VoxorderError::IdentifierUnresolved { id: id.to_string() })?;
            if order.status == status {
                debug!(order_id = %id, %status, "status unchanged");
            } else {
                order.status = status;
                order.updated_at = Utc::now();
                info!(order_id = %id, %status, "order status updated");
            }
            order.clone()
        };

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.mirror(id, status) {
                warn!(order_id = %id, error = %e, "status mirror failed; keeping local update");
            }
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingMirror {
        calls: Arc<AtomicUsize>,
    }

    impl StatusMirror for FailingMirror {
        fn mirror(&self, _id: &str, _status: Status) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VoxorderError::CollaboratorUnavailable("connection refused".into()))
        }
    }

    #[test]
    fn ingest_starts_in_preparing() {
        let registry = LocalRegistry::new();
        let order = registry.ingest(" A-1017 ").expect("ingest order");
        assert_eq!(order.id, "A-1017");
        assert_eq!(order.status, Status::Preparing);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ingest_rejects_blank_id() {
        let registry = LocalRegistry::new();
        assert!(matches!(
            registry.ingest("   "),
            Err(VoxorderError::MissingOrderId)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn update_unknown_order_is_unresolved() {
        let registry = LocalRegistry::new();
        let err = registry
            .update_status("404", Status::Prepared)
            .expect_err("unknown id should fail");
        match err {
            VoxorderError::IdentifierUnresolved { id } => assert_eq!(id, "404"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mirror_failure_keeps_local_update() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = LocalRegistry::with_mirror(FailingMirror {
            calls: Arc::clone(&calls),
        });
        registry.ingest("1001").expect("ingest order");

        let order = registry
            .update_status("1001", Status::Delivered)
            .expect("local update should succeed despite mirror failure");
        assert_eq!(order.status, Status::Delivered);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            registry.get("1001").map(|o| o.status),
            Some(Status::Delivered)
        );
    }

    #[test]
    fn repeated_status_is_a_no_op() {
        let registry = LocalRegistry::new();
        registry.ingest("1001").expect("ingest order");
        let first = registry
            .update_status("1001", Status::Prepared)
            .expect("first update");
        let second = registry
            .update_status("1001", Status::Prepared)
            .expect("second update");
        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_lists_every_order() {
        let registry = LocalRegistry::new();
        registry.ingest("1001").expect("ingest 1001");
        registry.ingest("A-1017").expect("ingest A-1017");
        let mut ids: Vec<String> = registry
            .snapshot()
            .expect("snapshot")
            .into_iter()
            .map(|o| o.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["1001", "A-1017"]);
    }

    #[test]
    fn order_serializes_timestamps_as_millis() {
        let registry = LocalRegistry::new();
        let order = registry.ingest("1001").expect("ingest order");
        let json = serde_json::to_value(&order).expect("serialize order");
        assert_eq!(json["id"], "1001");
        assert_eq!(json["status"], "preparing");
        assert_eq!(
            json["createdAt"].as_i64(),
            Some(order.created_at.timestamp_millis())
        );
    }
}
