use async_trait::async_trait;

use crate::shared::DomainError;

/// Bit-addressable key/value store backing the presence cache.
///
/// Offsets address bits most-significant-first within each byte, the order
/// Redis uses for `SETBIT`/`GETBIT`. Failures are reported as
/// `DomainError::CacheUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BitStore: Send + Sync {
    async fn get_bit(&self, key: &str, offset: u32) -> Result<bool, DomainError>;

    /// Set the bit and return its previous value.
    async fn set_bit(&self, key: &str, offset: u32, value: bool) -> Result<bool, DomainError>;

    /// Number of set bits with `start <= offset <= end`.
    async fn count_bits(&self, key: &str, start: u32, end: u32) -> Result<u32, DomainError> {
        let mut count = 0;
        for offset in start..=end {
            if self.get_bit(key, offset).await? {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Population count over the bit range `start..=end` of a bitmap.
///
/// `bytes` holds the bitmap starting at byte index `base_byte`; bytes past
/// the end of the slice count as zero.
pub fn count_set_bits(bytes: &[u8], base_byte: usize, start: u32, end: u32) -> u32 {
    if start > end {
        return 0;
    }

    let first = start as usize / 8;
    let last = end as usize / 8;
    let mut count = 0;

    for byte_index in first..=last {
        let Some(local) = byte_index.checked_sub(base_byte) else {
            continue;
        };
        let Some(&byte) = bytes.get(local) else {
            break;
        };

        let mut mask = 0xFFu8;
        if byte_index == first {
            mask &= 0xFFu8 >> (start % 8);
        }
        if byte_index == last {
            mask &= 0xFFu8 << (7 - end % 8);
        }
        count += (byte & mask).count_ones();
    }

    count
}

/// Byte index and MSB-first mask addressing `offset`.
pub fn bit_position(offset: u32) -> (usize, u8) {
    (offset as usize / 8, 0x80u8 >> (offset % 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_position_is_msb_first() {
        assert_eq!(bit_position(0), (0, 0b1000_0000));
        assert_eq!(bit_position(7), (0, 0b0000_0001));
        assert_eq!(bit_position(9), (1, 0b0100_0000));
        assert_eq!(bit_position(365), (45, 0b0000_0100));
    }

    #[test]
    fn test_count_set_bits_with_edge_masks() {
        // offsets 0, 3, 7 | 8, 15
        let bytes = [0b1001_0001, 0b1000_0001];

        assert_eq!(count_set_bits(&bytes, 0, 0, 15), 5);
        assert_eq!(count_set_bits(&bytes, 0, 1, 7), 2);
        assert_eq!(count_set_bits(&bytes, 0, 3, 3), 1);
        assert_eq!(count_set_bits(&bytes, 0, 4, 14), 2);
        assert_eq!(count_set_bits(&bytes, 0, 9, 14), 0);
    }

    #[test]
    fn test_count_set_bits_with_base_offset_and_short_slice() {
        // slice starts at byte 1 of the bitmap
        let bytes = [0b1000_0001];

        assert_eq!(count_set_bits(&bytes, 1, 0, 15), 2);
        assert_eq!(count_set_bits(&bytes, 1, 8, 40), 2);
        assert_eq!(count_set_bits(&bytes, 1, 16, 40), 0);
    }

    #[test]
    fn test_count_set_bits_empty_range() {
        assert_eq!(count_set_bits(&[0xFF], 0, 5, 4), 0);
    }
}
