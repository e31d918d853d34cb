use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;

use crate::{
    error::{AppError, AppResult},
    models::TitleId,
};

/// Creates a Redis client for caching
///
/// Establishes a connection to Redis for fast data caching.
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    TitleSummary(TitleId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TitleSummary(id) => write!(f, "title:{}", id),
        }
    }
}

/// Cache for catalog display data.
///
/// Reads are synchronous on the request path; writes happen in a spawned
/// task so a slow or absent Redis never delays a response.
#[derive(Clone)]
pub struct SummaryCache {
    client: Client,
}

impl SummaryCache {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::Internal(format!("Cache deserialization error: {}", e))),
            None => Ok(None),
        }
    }

    pub fn put_in_background(&self, key: &CacheKey, value: &impl Serialize, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!(error = %error, key = %key, "Cache serialization failed");
                return;
            }
        };

        let client = self.client.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            let result: redis::RedisResult<()> = async {
                let mut conn = client.get_multiplexed_async_connection().await?;
                conn.set_ex(&key, json, ttl).await
            }
            .await;

            if let Err(error) = result {
                tracing::warn!(error = %error, key = %key, "Cache write failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        let key = CacheKey::TitleSummary(TitleId::new("tt1375666").unwrap());
        assert_eq!(key.to_string(), "title:tt1375666");
    }
}
