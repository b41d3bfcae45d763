//! Adapters for the domain ports: record stores and the Stripe API client.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod stripe;
