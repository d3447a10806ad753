//! An in-memory document database core with two specialties: distinct-value
//! aggregation (with a strict count-only mode) and a registry of in-flight
//! operations that supports `currentOp` introspection and cooperative
//! `killOp` cancellation.
//!
//! # Examples
//!
//! ```
//! use memdocdb::{Db, Document, Filter};
//! use serde_json::json;
//!
//! # fn main() -> memdocdb::Result<()> {
//! # tokio_test::block_on(async {
//! let db = Db::new();
//! db.save("test.people", Document::from_json(json!({"age": 30}))?)?;
//! db.save("test.people", Document::from_json(json!({"age": 30}))?)?;
//! db.save("test.people", Document::from_json(json!({"age": 41}))?)?;
//!
//! let ages = db.distinct("test.people", "age", Filter::All).await?;
//! assert_eq!(ages.len(), 2);
//!
//! let n = db.distinct_count("test.people", "age", Filter::All).await?;
//! assert_eq!(n, 2);
//! # Ok(())
//! # })
//! # }
//! ```
//!
//! Long-running scans (a `count` carrying a user predicate) appear in
//! [`Db::current_op`] and terminate with [`DbError::OperationKilled`]
//! shortly after [`Db::kill_op`] flags them.

pub mod command;
pub mod config;
pub mod core;
pub mod facade;
pub mod ops;
pub mod query;
pub mod storage;

// Re-export main types for convenience
pub use config::DbConfig;
pub use core::{DbError, Document, Result, Value};
pub use facade::Db;
pub use ops::{OpRegistry, OpSnapshot};
pub use query::{CmpOp, Filter, WherePredicate};
