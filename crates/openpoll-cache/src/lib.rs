//! # openpoll-cache
//!
//! Key-value store implementations for OpenPoll. The rate limiter and
//! anti-forgery guard persist their state through the
//! [`KeyValueStore`](openpoll_core::traits::KeyValueStore) seam; this
//! crate provides the backends:
//!
//! - **memory**: In-process store using [moka](https://crates.io/crates/moka)
//!   and [dashmap](https://crates.io/crates/dashmap). Valid for a
//!   single-instance deployment; does not survive restarts or scale
//!   horizontally.
//! - **redis**: Redis-backed store using the
//!   [redis](https://crates.io/crates/redis) crate, with pipelined
//!   atomic counter windows.
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
