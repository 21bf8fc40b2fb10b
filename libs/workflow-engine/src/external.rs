//! Narrow contracts for the collaborators the engine consumes but does not
//! own: a process-wide service registry, optional persistence write-through,
//! and an optional message broker.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

// =============================================================================
// Service registry
// =============================================================================

#[derive(Debug, Error)]
pub enum ServiceRegistryError {
    #[error("no service registered under {0:?}")]
    NotFound(String),
    #[error("service {0:?} registered under a different type than requested")]
    WrongType(String),
}

/// A process-wide name -> service instance mapping.
///
/// Lookups are always by exact configured name. There is deliberately no
/// substring or fuzzy resolution: an ambiguous or missing match fails loudly
/// rather than guessing (see `SPEC_FULL.md` §9).
#[derive(Default)]
pub struct ServiceRegistry {
    entries: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register<T: Any + Send + Sync>(&self, name: impl Into<String>, service: Arc<T>) {
        let mut entries = self.entries.write().await;
        entries.insert(name.into(), service);
    }

    pub async fn get<T: Any + Send + Sync>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, ServiceRegistryError> {
        let entries = self.entries.read().await;
        let entry = entries
            .get(name)
            .ok_or_else(|| ServiceRegistryError::NotFound(name.to_string()))?;
        entry
            .clone()
            .downcast::<T>()
            .map_err(|_| ServiceRegistryError::WrongType(name.to_string()))
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Write-through persistence mirror. Not an event log: callers save whole
/// snapshots, and failures here are logged rather than propagated (see
/// `SPEC_FULL.md` §4.5's persistence hook and §7's propagation policy).
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn save_resource(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<(), PersistenceError>;

    async fn load_resources(
        &self,
        collection: &str,
    ) -> Result<HashMap<String, Value>, PersistenceError>;
}

/// In-memory `PersistenceStore`, used by tests and by any deployment that
/// has not wired a real backing store (`wovra-db`'s `sqlx`-backed
/// repositories are the production implementation, out of this crate's
/// scope).
#[derive(Default)]
pub struct InMemoryPersistenceStore {
    data: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl InMemoryPersistenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for InMemoryPersistenceStore {
    async fn save_resource(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<(), PersistenceError> {
        let mut store = self.data.write().await;
        store
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn load_resources(
        &self,
        collection: &str,
    ) -> Result<HashMap<String, Value>, PersistenceError> {
        let store = self.data.read().await;
        Ok(store.get(collection).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Message broker
// =============================================================================

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker error: {0}")]
    Backend(String),
}

pub type BrokerHandler = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// Narrow producer/consumer contract. No concrete transport ships with this
/// crate; `async-nats` remains an ambient workspace dependency for whatever
/// application wires a real one.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn send_message(&self, topic: &str, bytes: Vec<u8>) -> Result<(), BrokerError>;
    async fn subscribe(&self, topic: &str, handler: BrokerHandler) -> Result<(), BrokerError>;
    async fn unsubscribe(&self, topic: &str) -> Result<(), BrokerError>;
}

/// In-process broker: `send_message` holds the subscription map's read lock
/// and calls handlers synchronously, so a slow handler blocks the sender.
/// Documented trade-off, matching the locking discipline in `SPEC_FULL.md`
/// §5.
#[derive(Default)]
pub struct InMemoryBroker {
    subscriptions: RwLock<HashMap<String, Vec<BrokerHandler>>>,
}

impl InMemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn send_message(&self, topic: &str, bytes: Vec<u8>) -> Result<(), BrokerError> {
        let subscriptions = self.subscriptions.read().await;
        if let Some(handlers) = subscriptions.get(topic) {
            for handler in handlers {
                handler(bytes.clone());
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: BrokerHandler) -> Result<(), BrokerError> {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.entry(topic.to_string()).or_default().push(handler);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), BrokerError> {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.remove(topic);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn service_registry_exact_name_lookup() {
        let registry = ServiceRegistry::new();
        registry.register("counter", Arc::new(42i32)).await;

        let found: Arc<i32> = registry.get("counter").await.unwrap();
        assert_eq!(*found, 42);

        assert!(matches!(
            registry.get::<i32>("missing").await,
            Err(ServiceRegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn service_registry_wrong_type_fails_loudly() {
        let registry = ServiceRegistry::new();
        registry.register("counter", Arc::new(42i32)).await;

        assert!(matches!(
            registry.get::<String>("counter").await,
            Err(ServiceRegistryError::WrongType(_))
        ));
    }

    #[tokio::test]
    async fn in_memory_persistence_roundtrip() {
        let store = InMemoryPersistenceStore::new();
        store
            .save_resource("orders", "1", serde_json::json!({"total": 9}))
            .await
            .unwrap();

        let loaded = store.load_resources("orders").await.unwrap();
        assert_eq!(loaded["1"]["total"], serde_json::json!(9));
    }

    #[tokio::test]
    async fn in_memory_broker_delivers_to_subscriber() {
        let broker = InMemoryBroker::new();
        let received = Arc::new(std::sync::Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);

        broker
            .subscribe(
                "topic",
                Arc::new(move |bytes| received_clone.lock().unwrap().push(bytes)),
            )
            .await
            .unwrap();

        broker.send_message("topic", b"hello".to_vec()).await.unwrap();
        assert_eq!(received.lock().unwrap().as_slice(), [b"hello".to_vec()]);
    }
}
