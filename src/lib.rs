//! menufinder library
//!
//! Exposes the cache, API clients, results table, and reporting modules for
//! use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod report;
pub mod session;
pub mod table;
pub mod ui;
