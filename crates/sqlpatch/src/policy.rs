//! Per-call inclusion/exclusion policy for UPDATE clause building.
//!
//! # Example
//! ```ignore
//! use sqlpatch::UpdatePolicy;
//!
//! let policy = UpdatePolicy::new()
//!     .must_cols(["nickname"])
//!     .omit(["password_hash"])
//!     .incr("login_count");
//! ```

use std::collections::HashMap;

use crate::catalog::Column;

/// A set of column names compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    names: Vec<String>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; duplicates (ignoring ASCII case) are ignored.
    pub fn insert(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.names.push(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for ColumnSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

/// Column name → flag map with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFlags {
    // keyed by lowercased name
    flags: HashMap<String, bool>,
}

impl ColumnFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, flag: bool) {
        self.flags.insert(name.to_ascii_lowercase(), flag);
    }

    /// The flag for `column`, if one was set.
    pub fn get(&self, column: &Column) -> Option<bool> {
        if self.flags.is_empty() {
            return None;
        }
        self.flags.get(&column.name.to_ascii_lowercase()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Policy controlling which columns take part in an UPDATE and how ambiguous
/// zero values are treated.
///
/// Built per call and never mutated while a clause is being built.
#[derive(Debug, Clone, Default)]
pub struct UpdatePolicy {
    /// Include version columns.
    pub include_version: bool,
    /// Include update-timestamp columns.
    pub include_updated: bool,
    /// Emit NULL for nil pointers even without `all_cols`.
    pub include_nil: bool,
    /// Include auto-increment columns.
    pub include_auto_increment: bool,
    /// Treat every column as required (zero values are written).
    pub all_cols: bool,
    /// Always write boolean fields, including `false`.
    pub use_bool: bool,
    /// Do not exclude the soft-delete marker column.
    pub unscoped: bool,
    /// Forced include (`true`) or exclude (`false`) per column.
    pub must_columns: ColumnFlags,
    /// Write NULL for zero-valued nullable columns.
    pub nullable_columns: ColumnFlags,
    /// When non-empty, only these columns are considered.
    pub cols: ColumnSet,
    pub omit: ColumnSet,
    /// Columns updated through `col = col + ?`.
    pub incr: ColumnSet,
    /// Columns updated through `col = col - ?`.
    pub decr: ColumnSet,
    /// Columns set from a raw SQL expression.
    pub expr: ColumnSet,
}

impl UpdatePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_version(mut self, yes: bool) -> Self {
        self.include_version = yes;
        self
    }

    pub fn include_updated(mut self, yes: bool) -> Self {
        self.include_updated = yes;
        self
    }

    pub fn include_nil(mut self, yes: bool) -> Self {
        self.include_nil = yes;
        self
    }

    pub fn include_auto_increment(mut self, yes: bool) -> Self {
        self.include_auto_increment = yes;
        self
    }

    /// Write every column, zero values included.
    pub fn all_cols(mut self) -> Self {
        self.all_cols = true;
        self
    }

    /// Write every boolean column, `false` included.
    pub fn use_bool(mut self) -> Self {
        self.use_bool = true;
        self
    }

    pub fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }

    /// Force the named columns to be written even when zero.
    pub fn must_cols<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.must_columns.set(name.as_ref(), true);
        }
        self
    }

    /// Force-exclude a column; wins over every inclusion rule.
    pub fn must_not(mut self, name: &str) -> Self {
        self.must_columns.set(name, false);
        self
    }

    /// Write NULL for these columns when their value is zero and the column is nullable.
    pub fn nullable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.nullable_columns.set(name.as_ref(), true);
        }
        self
    }

    /// Restrict the update to these columns.
    pub fn cols<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cols.extend(names);
        self
    }

    pub fn omit<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit.extend(names);
        self
    }

    pub fn incr(mut self, name: impl Into<String>) -> Self {
        self.incr.insert(name);
        self
    }

    pub fn decr(mut self, name: impl Into<String>) -> Self {
        self.decr.insert(name);
        self
    }

    pub fn expr(mut self, name: impl Into<String>) -> Self {
        self.expr.insert(name);
        self
    }

    /// Whether `name` is driven by an increment, decrement or expression update.
    pub fn is_externally_handled(&self, name: &str) -> bool {
        self.incr.contains(name) || self.decr.contains(name) || self.expr.contains(name)
    }
}
