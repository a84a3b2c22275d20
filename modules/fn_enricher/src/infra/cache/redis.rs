use std::fmt;

use anyhow::Context;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info, instrument};

use crate::contract::model::User;
use crate::domain::ports::UserCache;

const KEY_PREFIX: &str = "UserKey:";

/// Cache key of a stored user.
pub fn user_key(id: i32) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Redis-backed user cache. Values are the JSON form of [`User`], kept without TTL.
#[derive(Clone)]
pub struct RedisUserCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisUserCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisUserCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisUserCache {
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to Redis cache at {}", redis_url);
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;
        info!("Successfully connected to Redis cache");
        Ok(Self { conn })
    }

    async fn put(&self, user: &User) -> anyhow::Result<()> {
        let key = user_key(user.id);
        let json = serde_json::to_string(user).context("Failed to serialize cached user")?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&key, json)
            .await
            .with_context(|| format!("Redis SET {key} failed"))?;
        Ok(())
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    #[instrument(name = "fn_enricher.cache.get", skip(self))]
    async fn get(&self, id: i32) -> anyhow::Result<Option<User>> {
        let key = user_key(id);
        let mut conn = self.conn.clone();
        let data: Option<String> = conn
            .get(&key)
            .await
            .with_context(|| format!("Redis GET {key} failed"))?;

        match data {
            Some(json) => {
                let user = serde_json::from_str(&json)
                    .with_context(|| format!("Failed to deserialize cached user {key}"))?;
                debug!("Cache HIT: {}", key);
                Ok(Some(user))
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    #[instrument(name = "fn_enricher.cache.set", skip_all, fields(user_id = user.id))]
    async fn set(&self, user: &User) -> anyhow::Result<()> {
        self.put(user).await
    }

    #[instrument(name = "fn_enricher.cache.update", skip_all, fields(user_id = user.id))]
    async fn update(&self, user: &User) -> anyhow::Result<()> {
        self.put(user).await
    }

    #[instrument(name = "fn_enricher.cache.delete", skip(self))]
    async fn delete(&self, id: i32) -> anyhow::Result<()> {
        let key = user_key(id);
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key)
            .await
            .with_context(|| format!("Redis DEL {key} failed"))?;
        Ok(())
    }
}
