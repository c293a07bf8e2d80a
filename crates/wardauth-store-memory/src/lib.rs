//! In-memory storage backend for wardauth.
//!
//! This crate provides an in-memory implementation of the wardauth storage
//! traits and scope cache, backed by `tokio::sync::RwLock`-guarded maps.
//! It is intended for tests and local development; all data is lost when
//! the process exits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wardauth_store_memory::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let patient = wardauth::storage::Patient::new("abc123");
//! store.create(&patient).await?;
//! ```

mod scope;
mod store;

pub use scope::MemoryScopeCache;
pub use store::MemoryStore;
