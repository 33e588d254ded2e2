#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(
    missing_debug_implementations,
    clippy::print_stderr,
    clippy::print_stdout
)]

//! # Document Relations
//!
//! An async engine for the relation bookkeeping of document based content
//! stores: it reads the polymorphic `set` / `connect` / `disconnect` mutation
//! syntax, resolves document ids to entry rows, arranges join-table links at
//! fractional positions, and keeps the inverse side of bidirectional
//! relations in their captured order when a draft/publish transition swaps
//! entry ids underneath them.
//!
//! ## Features
//!
//! 1. Async
//!
//!     Relying on [SQLx](https://github.com/launchbadge/sqlx), every database
//!     interaction is non-blocking and transaction scoped.
//!
//! 2. Schema driven
//!
//!     Built upon [SeaQuery](https://github.com/SeaQL/sea-query); payload
//!     traversal and join-table access are guided entirely by content type
//!     metadata, no generated entities required.
//!
//! 3. Testable
//!
//!     Use mock connections and their transaction logs to write unit tests
//!     for your content logic.
//!
//! ## A quick taste
//!
//! Diff a relation mutation against the stored links of one entry:
//!
//! ```
//! use document_relations::{RelationId, RelationValue, plan_links};
//! use serde_json::json;
//!
//! let stored = [(RelationId::Int(7), 1.0), (RelationId::Int(9), 2.0)];
//! let value = RelationValue::from_json(&json!({
//!     "connect": [{ "id": 8, "position": { "after": 7 } }]
//! }));
//!
//! let plan = plan_links(&stored, &value, false)?;
//! assert!(plan.detach.is_empty());
//! assert_eq!(
//!     plan.attach,
//!     [(RelationId::Int(8), 2.0), (RelationId::Int(9), 3.0)]
//! );
//! # Ok::<(), document_relations::OrderingError>(())
//! ```
//!
//! ## Feature flags
//!
//! - `sqlx-postgres` / `sqlx-sqlite`: enable the corresponding [SQLx](https://github.com/launchbadge/sqlx)
//!   driver together with a `runtime-*` feature of your choice.
//! - `mock`: the in-memory `MockDatabase` connection.
//! - `debug-print`: log every SQL statement at debug level.

mod database;
mod driver;
pub mod error;
mod executor;
pub mod metric;
pub mod relation;
pub mod schema;
#[cfg(feature = "tests-cfg")]
#[doc(hidden)]
pub mod tests_cfg;
mod util;

pub use database::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use relation::*;
pub use schema::*;

pub use sea_query;
