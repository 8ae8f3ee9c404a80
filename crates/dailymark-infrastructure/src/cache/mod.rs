mod disabled;
mod memory;
mod redis_store;

pub use disabled::DisabledBitStore;
pub use memory::InMemoryBitStore;
pub use redis_store::RedisBitStore;
