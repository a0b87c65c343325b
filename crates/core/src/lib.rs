//! Core types and shared functionality for the Alveo client.
//!
//! This crate provides:
//! - Local cache with a SQLite index and a directory of document blobs
//! - Unified error types
//! - Resource keys and layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod key;

pub use cache::{Cache, CacheSettings, ResourceKind};
pub use config::AlveoConfig;
pub use error::Error;
pub use key::{ResourceKey, ToResourceKey};
