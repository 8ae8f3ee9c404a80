//! # Redis bitmap store
//!
//! One Redis string per (user, year) key, addressed with `SETBIT`/`GETBIT`.
//! Range counts fetch the covering bytes with `GETRANGE` and count locally,
//! which works on servers without bit-granular `BITCOUNT`.
//!
//! The connection is established lazily and retried on later calls, so a
//! cache that is down at startup degrades to log-only operation and heals
//! once Redis is reachable.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Cmd, FromRedisValue, RedisResult};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::warn;

use dailymark_domain::bitmap::{count_set_bits, BitStore};
use dailymark_domain::shared::DomainError;

pub struct RedisBitStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    op_timeout: Duration,
}

impl RedisBitStore {
    pub fn new(redis_url: &str, op_timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::open(redis_url)
            .map_err(|e| DomainError::CacheUnavailable(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, DomainError> {
        let connect = self
            .connection
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()));

        match timeout(self.op_timeout, connect).await {
            Ok(Ok(manager)) => Ok(manager.clone()),
            Ok(Err(e)) => {
                warn!(error = %e, "Redis connection failed");
                Err(DomainError::CacheUnavailable(e.to_string()))
            }
            Err(_) => Err(DomainError::CacheUnavailable(
                "timed out connecting to Redis".to_string(),
            )),
        }
    }

    async fn run<T: FromRedisValue>(&self, cmd: Cmd, context: &str) -> Result<T, DomainError> {
        let mut conn = self.connection().await?;

        let reply: Result<RedisResult<T>, _> =
            timeout(self.op_timeout, cmd.query_async(&mut conn)).await;

        match reply {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DomainError::CacheUnavailable(format!("{}: {}", context, e))),
            Err(_) => Err(DomainError::CacheUnavailable(format!(
                "{}: timed out after {}ms",
                context,
                self.op_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl BitStore for RedisBitStore {
    async fn get_bit(&self, key: &str, offset: u32) -> Result<bool, DomainError> {
        let mut cmd = redis::cmd("GETBIT");
        cmd.arg(key).arg(offset);
        let bit: i64 = self.run(cmd, "GETBIT").await?;
        Ok(bit != 0)
    }

    async fn set_bit(&self, key: &str, offset: u32, value: bool) -> Result<bool, DomainError> {
        let mut cmd = redis::cmd("SETBIT");
        cmd.arg(key).arg(offset).arg(u8::from(value));
        let previous: i64 = self.run(cmd, "SETBIT").await?;
        Ok(previous != 0)
    }

    async fn count_bits(&self, key: &str, start: u32, end: u32) -> Result<u32, DomainError> {
        if start > end {
            return Ok(0);
        }

        let first_byte = start as usize / 8;
        let last_byte = end as usize / 8;

        let mut cmd = redis::cmd("GETRANGE");
        cmd.arg(key).arg(first_byte).arg(last_byte);
        let bytes: Vec<u8> = self.run(cmd, "GETRANGE").await?;

        Ok(count_set_bits(&bytes, first_byte, start, end))
    }
}
