//! Common library for the Legacy Keeper application
//!
//! This crate provides shared infrastructure used by the Legacy Keeper
//! services: PostgreSQL connection pooling, the Redis session store, and
//! typed database errors.

pub mod cache;
pub mod database;
pub mod error;
