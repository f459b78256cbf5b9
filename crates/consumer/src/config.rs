//! Consumer configuration, read from the environment once at startup.

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub database_url: String,
    pub redis_url: String,
    pub stream_key: String,
    pub consumer_group: String,
    pub consumer_name: String,
    pub batch_size: usize,
    pub block_ms: u64,
}

impl ConsumerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let stream_key =
            std::env::var("STREAM_KEY").unwrap_or_else(|_| "stockflow:events".to_string());
        let consumer_group = std::env::var("CONSUMER_GROUP")
            .unwrap_or_else(|_| "stockflow.workers".to_string());
        let consumer_name =
            std::env::var("CONSUMER_NAME").unwrap_or_else(|_| "worker-1".to_string());
        let batch_size = std::env::var("BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let block_ms = std::env::var("BLOCK_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Ok(Self {
            database_url,
            redis_url,
            stream_key,
            consumer_group,
            consumer_name,
            batch_size,
            block_ms,
        })
    }
}
