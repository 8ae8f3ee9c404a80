use async_trait::async_trait;

use dailymark_domain::bitmap::BitStore;
use dailymark_domain::shared::DomainError;

/// Bit store that is never reachable. Forces log-only operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBitStore;

fn unavailable() -> DomainError {
    DomainError::CacheUnavailable("bitmap cache disabled".to_string())
}

#[async_trait]
impl BitStore for DisabledBitStore {
    async fn get_bit(&self, _key: &str, _offset: u32) -> Result<bool, DomainError> {
        Err(unavailable())
    }

    async fn set_bit(&self, _key: &str, _offset: u32, _value: bool) -> Result<bool, DomainError> {
        Err(unavailable())
    }

    async fn count_bits(&self, _key: &str, _start: u32, _end: u32) -> Result<u32, DomainError> {
        Err(unavailable())
    }
}
