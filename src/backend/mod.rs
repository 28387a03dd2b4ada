//! Key-value backends the store can talk to.
//!
//! `RedisBackend` is the production client; `MemoryBackend` keeps everything
//! in process and is used for tests and embedding.

pub mod traits;
pub mod memory;
pub mod redis;

pub use memory::MemoryBackend;
pub use self::redis::RedisBackend;
pub use traits::*;
