//! Short-lived storage for priced-but-unpaid carts ("pre-orders").
//!
//! The store only deals in opaque strings with a TTL; [`PreOrderStaging`] layers
//! the JSON encoding and key scheme for [`StagedPreOrder`] on top of it.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

mod memory;
mod redis_store;

pub use self::memory::InMemoryStagingStore;
pub use self::redis_store::RedisStagingStore;

const PREORDER_KEY_PREFIX: &str = "order:preorder:";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait StagingStore: Send + Sync {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StagingError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StagingError>;
    async fn delete(&self, key: &str) -> Result<(), StagingError>;
}

/// A line of a staged pre-order, already priced against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StagedItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedPreOrder {
    pub owner_user_id: Uuid,
    pub items: Vec<StagedItem>,
    pub total_amount: i64,
    pub shipping_fee: i64,
    pub final_amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Typed access to pre-orders kept in a [`StagingStore`].
#[derive(Clone)]
pub struct PreOrderStaging {
    store: Arc<dyn StagingStore>,
    ttl: Duration,
}

impl PreOrderStaging {
    pub fn new(store: Arc<dyn StagingStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a pre-order under a fresh random key and return the key.
    pub async fn stage(&self, pre_order: &StagedPreOrder) -> Result<String, StagingError> {
        let key = format!("{PREORDER_KEY_PREFIX}{}", Uuid::new_v4().simple());
        let value = serde_json::to_string(pre_order)?;
        self.store.put(&key, value, self.ttl).await?;
        Ok(key)
    }

    /// Keys that were never issued by [`Self::stage`] are treated as absent.
    pub async fn load(&self, key: &str) -> Result<Option<StagedPreOrder>, StagingError> {
        if !key.starts_with(PREORDER_KEY_PREFIX) {
            return Ok(None);
        }
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn purge(&self, key: &str) -> Result<(), StagingError> {
        if !key.starts_with(PREORDER_KEY_PREFIX) {
            return Ok(());
        }
        self.store.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(owner: Uuid) -> StagedPreOrder {
        StagedPreOrder {
            owner_user_id: owner,
            items: vec![StagedItem {
                product_id: Uuid::new_v4(),
                product_name: "Linen Shirt".into(),
                quantity: 2,
                unit_price: 35000,
                color_id: None,
                size_id: None,
            }],
            total_amount: 70000,
            shipping_fee: 0,
            final_amount: 70000,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn stage_load_and_purge() {
        let staging = PreOrderStaging::new(
            Arc::new(InMemoryStagingStore::new()),
            Duration::from_secs(900),
        );
        let owner = Uuid::new_v4();
        let pre_order = sample(owner);

        let key = staging.stage(&pre_order).await.unwrap();
        assert!(key.starts_with(PREORDER_KEY_PREFIX));
        assert_eq!(staging.load(&key).await.unwrap(), Some(pre_order));

        staging.purge(&key).await.unwrap();
        assert_eq!(staging.load(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn foreign_keys_are_never_read() {
        let store = Arc::new(InMemoryStagingStore::new());
        store
            .put("session:abc", "{}".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let staging = PreOrderStaging::new(store.clone(), Duration::from_secs(900));

        assert_eq!(staging.load("session:abc").await.unwrap(), None);
        staging.purge("session:abc").await.unwrap();
        assert!(store.get("session:abc").await.unwrap().is_some());
    }
}
