use std::time::Duration;

use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager};

use super::{StagingError, StagingStore};

#[derive(Clone)]
pub struct RedisStagingStore {
    conn: ConnectionManager,
}

impl RedisStagingStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StagingError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl StagingStore for RedisStagingStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StagingError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl.as_millis().max(1) as u64)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StagingError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), StagingError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}
