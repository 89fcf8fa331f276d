//! # sqlpatch
//!
//! Compiles an in-memory record into the SET list and bound parameters of an
//! `UPDATE` statement.
//!
//! ## Features
//!
//! - **Policy driven**: version/created/updated/auto-increment/soft-delete rules,
//!   allow-lists, omit lists, forced columns and NULL overrides via [`UpdatePolicy`]
//! - **Zero means unset**: zero-valued fields are skipped unless required
//! - **Typed encoding**: booleans, numbers, time values, embedded references,
//!   JSON documents and byte payloads each follow their own rule
//! - **Static capabilities**: `#[derive(Record)]` resolves field kinds at compile time
//! - **Named SQL templates**: engine-owned, compiled once per key
//!
//! ## Example
//!
//! ```ignore
//! use sqlpatch::{Engine, MySql, Record, UpdatePolicy};
//!
//! #[derive(Record)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(id)]
//!     code: String,
//!     name: String,
//!     age: i32,
//! }
//!
//! let engine = Engine::new(MySql);
//! let user = User { code: "C1".into(), name: "bob".into(), age: 0 };
//! let clause = engine.update_clause(&user, &UpdatePolicy::new())?;
//!
//! assert_eq!(clause.fragments(), vec!["`name` = ?"]);
//! assert_eq!(clause.values(), vec!["C1".into(), "bob".into()]);
//! ```

pub mod catalog;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod field;
pub mod policy;
pub mod template;
pub mod update;
pub mod value;

pub use catalog::{Column, MapDirection, Record, SqlType, StorageKind, TableDef};
pub use dialect::{Dialect, MySql, Postgres, Sqlite};
pub use engine::{Engine, EngineConfig};
pub use error::{BoxError, OrmError, OrmResult};
pub use field::{
    CollectionValue, Encode, FieldValue, ScalarValue, StructValue, ToDb, ToField, ToFieldElem,
};
pub use policy::{ColumnFlags, ColumnSet, UpdatePolicy};
pub use template::{PlainTemplates, Template, TemplateBuilder, TemplateRegistry};
pub use update::{
    ClauseEntry, SkipReason, UpdateClause, UpdateContext, UpdateStatement, build_update_clause,
};
pub use value::Value;

#[cfg(feature = "derive")]
pub use sqlpatch_derive::Record;
