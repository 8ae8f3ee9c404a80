use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use dailymark_domain::bitmap::{bit_position, count_set_bits, BitStore};
use dailymark_domain::shared::DomainError;

/// Bytes needed for one bit per day of a leap year (366 bits).
const YEAR_BYTES: usize = 46;

/// Process-local bit store. Bitmaps are allocated on first write and grow
/// to cover the highest addressed offset. Contents are lost on restart,
/// which the check-in flows tolerate through read-repair and backfill.
#[derive(Default)]
pub struct InMemoryBitStore {
    bitmaps: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated bitmaps.
    pub async fn key_count(&self) -> usize {
        self.bitmaps.read().await.len()
    }
}

#[async_trait]
impl BitStore for InMemoryBitStore {
    async fn get_bit(&self, key: &str, offset: u32) -> Result<bool, DomainError> {
        let (byte, mask) = bit_position(offset);
        let bitmaps = self.bitmaps.read().await;

        Ok(bitmaps
            .get(key)
            .and_then(|bitmap| bitmap.get(byte))
            .is_some_and(|value| value & mask != 0))
    }

    async fn set_bit(&self, key: &str, offset: u32, value: bool) -> Result<bool, DomainError> {
        let (byte, mask) = bit_position(offset);
        let mut bitmaps = self.bitmaps.write().await;

        let bitmap = bitmaps
            .entry(key.to_string())
            .or_insert_with(|| vec![0u8; YEAR_BYTES]);
        if bitmap.len() <= byte {
            bitmap.resize(byte + 1, 0);
        }

        let previous = bitmap[byte] & mask != 0;
        if value {
            bitmap[byte] |= mask;
        } else {
            bitmap[byte] &= !mask;
        }

        Ok(previous)
    }

    async fn count_bits(&self, key: &str, start: u32, end: u32) -> Result<u32, DomainError> {
        let bitmaps = self.bitmaps.read().await;

        Ok(bitmaps
            .get(key)
            .map(|bitmap| count_set_bits(bitmap, 0, start, end))
            .unwrap_or(0))
    }
}
