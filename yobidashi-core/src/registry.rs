//! Mutation operations over the queue store.
//!
//! Every operation is one load → apply → save round trip; a failed
//! precondition returns before the save, leaving the file untouched. No
//! snapshot is held across operations.
//!
//! Forward-only status sequencing (受付済み → 仕掛中 → 完了) is a contract
//! between callers, not enforced here: the control tool only issues forward
//! transitions, and keeping the mutator lenient leaves room for manual
//! correction of a mis-keyed order.

use crate::error::{QueueError, QueueResult};
use crate::model::{Order, OrderStatus, now_iso};
use crate::store::QueueStore;

/// The writer-side operations: register, advance, remove.
#[derive(Debug, Clone)]
pub struct OrderRegistry {
    store: QueueStore,
}

impl OrderRegistry {
    pub fn new(store: QueueStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    /// Append a new order with status 受付済み.
    ///
    /// With an explicit id, fails with `DuplicateId` when the id is already
    /// queued, and advances the counter past a numeric id so later auto ids
    /// cannot collide with it. Without one, the next auto id is generated
    /// and still checked for collision - a manually registered order may
    /// already occupy it.
    pub fn register(&self, explicit_id: Option<&str>) -> QueueResult<Order> {
        let mut snapshot = self.store.load()?;

        let id = match explicit_id {
            Some(id) => {
                if snapshot.find(id).is_some() {
                    return Err(QueueError::DuplicateId { id: id.to_owned() });
                }
                snapshot.absorb_numeric_id(id);
                id.to_owned()
            }
            None => {
                let id = snapshot.next_auto_id();
                if snapshot.find(&id).is_some() {
                    return Err(QueueError::DuplicateId { id });
                }
                id
            }
        };

        let order = Order::received(id);
        snapshot.orders.push(order.clone());
        self.store.save(&snapshot)?;
        tracing::debug!(id = %order.id, "order registered");
        Ok(order)
    }

    /// Set an order's status, stamping `updated_at` on 仕掛中 and
    /// `completed_at` on 完了.
    pub fn advance(&self, id: &str, new_status: OrderStatus) -> QueueResult<Order> {
        let mut snapshot = self.store.load()?;
        let order = snapshot
            .find_mut(id)
            .ok_or_else(|| QueueError::not_found(id))?;

        order.status = new_status.clone();
        match new_status {
            OrderStatus::InProgress => order.updated_at = Some(now_iso()),
            OrderStatus::Done => order.completed_at = Some(now_iso()),
            _ => {}
        }

        let order = order.clone();
        self.store.save(&snapshot)?;
        tracing::debug!(id = %order.id, status = %order.status, "order advanced");
        Ok(order)
    }

    /// Remove an order from the queue.
    ///
    /// With an id, the order must exist (`NotFound`) and, when
    /// `require_status` is set, must be in that status (`InvalidState`).
    /// Without an id, the earliest stored order matching `require_status`
    /// (or the earliest overall) is taken - the queue's FIFO intent.
    pub fn remove(
        &self,
        id: Option<&str>,
        require_status: Option<OrderStatus>,
    ) -> QueueResult<Order> {
        let mut snapshot = self.store.load()?;

        let index = match id {
            Some(id) => snapshot
                .orders
                .iter()
                .position(|order| order.id == id)
                .ok_or_else(|| QueueError::not_found(id))?,
            None => snapshot
                .orders
                .iter()
                .position(|order| {
                    require_status
                        .as_ref()
                        .is_none_or(|status| &order.status == status)
                })
                .ok_or_else(QueueError::no_candidate)?,
        };

        if let Some(expected) = &require_status {
            if &snapshot.orders[index].status != expected {
                return Err(QueueError::InvalidState {
                    id: snapshot.orders[index].id.clone(),
                    expected: expected.as_str().to_owned(),
                });
            }
        }

        let order = snapshot.orders.remove(index);
        self.store.save(&snapshot)?;
        tracing::debug!(id = %order.id, "order removed");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn registry_in(dir: &TempDir) -> OrderRegistry {
        OrderRegistry::new(QueueStore::new(dir.path().join("queue.json")))
    }

    #[test]
    fn test_auto_ids_are_increasing_and_padded() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);

        assert_eq!(registry.register(None).unwrap().id, "001");
        assert_eq!(registry.register(None).unwrap().id, "002");
        assert_eq!(registry.register(None).unwrap().id, "003");

        let snapshot = registry.store().load().unwrap();
        assert_eq!(snapshot.counter, 3);
    }

    #[test]
    fn test_explicit_numeric_id_advances_counter() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);

        registry.register(None).unwrap();
        registry.register(None).unwrap();
        registry.register(None).unwrap();
        registry.register(Some("050")).unwrap();

        assert_eq!(registry.register(None).unwrap().id, "051");
    }

    #[test]
    fn test_explicit_non_numeric_id_leaves_counter() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);

        registry.register(Some("A-7")).unwrap();
        assert_eq!(registry.register(None).unwrap().id, "001");
    }

    #[test]
    fn test_duplicate_explicit_id_fails() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);

        registry.register(Some("010")).unwrap();
        let err = registry.register(Some("010")).unwrap_err();
        assert!(matches!(err, QueueError::DuplicateId { id } if id == "010"));
    }

    #[test]
    fn test_generated_id_collision_fails() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);

        // "001" occupied but counter still at zero, so the next auto id
        // lands on it.
        registry.register(Some("001")).unwrap();
        let mut snapshot = registry.store().load().unwrap();
        snapshot.counter = 0;
        registry.store().save(&snapshot).unwrap();

        let err = registry.register(None).unwrap_err();
        assert!(matches!(err, QueueError::DuplicateId { id } if id == "001"));
    }

    #[test]
    fn test_advance_stamps_timestamps() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);
        registry.register(None).unwrap();

        let started = registry.advance("001", OrderStatus::InProgress).unwrap();
        assert_eq!(started.status, OrderStatus::InProgress);
        assert!(started.updated_at.is_some());
        assert!(started.completed_at.is_none());

        let finished = registry.advance("001", OrderStatus::Done).unwrap();
        assert_eq!(finished.status, OrderStatus::Done);
        assert!(finished.completed_at.is_some());
        // updated_at from the earlier transition is kept.
        assert!(finished.updated_at.is_some());
    }

    #[test]
    fn test_advance_unknown_id_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);
        registry.register(None).unwrap();

        let before = fs::read(registry.store().path()).unwrap();
        let err = registry.advance("999", OrderStatus::Done).unwrap_err();
        assert!(matches!(err, QueueError::NotFound { id: Some(id) } if id == "999"));
        let after = fs::read(registry.store().path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_default_picks_oldest_match() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);
        registry.register(None).unwrap(); // 001
        registry.register(None).unwrap(); // 002
        registry.register(None).unwrap(); // 003
        registry.advance("002", OrderStatus::Done).unwrap();
        registry.advance("003", OrderStatus::Done).unwrap();

        let removed = registry.remove(None, Some(OrderStatus::Done)).unwrap();
        assert_eq!(removed.id, "002");

        let removed = registry.remove(None, None).unwrap();
        assert_eq!(removed.id, "001");
    }

    #[test]
    fn test_remove_with_status_precondition() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);
        registry.register(None).unwrap();

        let err = registry
            .remove(Some("001"), Some(OrderStatus::Done))
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidState { id, .. } if id == "001"));

        // Still present: the failed removal saved nothing.
        assert!(registry.store().load().unwrap().find("001").is_some());
    }

    #[test]
    fn test_remove_from_empty_queue_is_not_found() {
        let dir = TempDir::new().unwrap();
        let registry = registry_in(&dir);

        let err = registry.remove(None, Some(OrderStatus::Done)).unwrap_err();
        assert!(matches!(err, QueueError::NotFound { id: None }));

        let err = registry.remove(Some("001"), None).unwrap_err();
        assert!(matches!(err, QueueError::NotFound { id: Some(_) }));
    }
}
