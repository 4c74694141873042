//! Two-tier video job store.
//!
//! This crate provides:
//! - A fast in-process index of job records (by id and owning user)
//! - A TTL-bearing Redis durable tier for crash survival
//! - A write-through `JobStore` that degrades gracefully when the
//!   durable tier is unreachable

pub mod error;
pub mod memory;
pub mod metrics;
pub mod redis_tier;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryIndex;
pub use redis_tier::{RedisTier, RedisTierConfig};
pub use store::{DurableTier, JobStore};
