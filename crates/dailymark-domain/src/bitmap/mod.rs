mod cache;
mod store;


pub use cache::CheckinBitmapCache;
#[cfg(test)]
pub use store::MockBitStore;
pub use store::{bit_position, count_set_bits, BitStore};
