//! Apicalypse query model
//!
//! This module contains the request-side data model:
//! - `Query`: one immutable request against a single endpoint
//! - `FieldList`: normalized, ordered, de-duplicated field paths
//! - `MultiqueryBatch`: labeled sub-queries sent as one physical request
//!
//! # Example
//!
//! ```
//! use igdb_scrape::query::{Query, Sort};
//!
//! let query = Query::builder()
//!     .fields(["a", "b"])
//!     .where_clause("x=1")
//!     .limit(10)
//!     .offset(0)
//!     .sort(Sort::asc("name"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(query.to_string(), "fields a,b; where x=1; limit 10; offset 0; sort name asc;");
//! ```

mod fields;
mod multiquery;
#[allow(clippy::module_inception)]
mod query;

pub use fields::FieldList;
pub use multiquery::{MultiqueryBatch, MultiqueryEntry};
pub use query::{Query, QueryBuilder, Sort, SortDirection};
