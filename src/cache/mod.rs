//! Cache module for storing raw API responses on disk
//!
//! This module provides a flat, file-backed key-value store. Entries are keyed
//! by the parameters of the remote lookup that produced them and are kept
//! forever; a different spelling of the same query simply becomes a new key.

mod store;

pub use store::{CacheError, JsonCache};
