//! Clause assembler output.

use tokio_postgres::types::ToSql;

use crate::catalog::Column;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// One produced column value.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseEntry {
    /// Raw column name.
    pub column: String,
    /// Dialect-quoted column name.
    pub quoted: String,
    pub value: Value,
    /// `false` for primary keys: their value belongs to the WHERE predicate.
    pub in_set_list: bool,
}

/// The compiled UPDATE clause for one record.
///
/// Entries are kept in catalog order. Primary key entries carry a value but no
/// SET fragment, so [`values`](Self::values) is positionally interleaved and may be
/// longer than [`fragments`](Self::fragments). Prefer [`set_values`](Self::set_values)
/// and [`key_values`](Self::key_values) when assembling SQL by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateClause {
    entries: Vec<ClauseEntry>,
}

impl UpdateClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a produced value for `column`.
    pub fn push(&mut self, column: &Column, value: Value, dialect: &dyn Dialect) {
        self.entries.push(ClauseEntry {
            column: column.name.clone(),
            quoted: dialect.quote(&column.name),
            value,
            in_set_list: !column.is_primary_key,
        });
    }

    pub fn entries(&self) -> &[ClauseEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of SET fragments.
    pub fn set_len(&self) -> usize {
        self.entries.iter().filter(|e| e.in_set_list).count()
    }

    /// `"<quoted> = ?"` for every SET member, in catalog order.
    pub fn fragments(&self) -> Vec<String> {
        self.set_entries().map(|e| format!("{} = ?", e.quoted)).collect()
    }

    /// Every produced value in catalog order, primary keys included at their position.
    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|e| e.value.clone()).collect()
    }

    /// Values of SET members only, aligned with [`fragments`](Self::fragments).
    pub fn set_values(&self) -> Vec<Value> {
        self.set_entries().map(|e| e.value.clone()).collect()
    }

    /// `(column, value)` for every primary key entry.
    pub fn key_values(&self) -> Vec<(&str, &Value)> {
        self.entries
            .iter()
            .filter(|e| !e.in_set_list)
            .map(|e| (e.column.as_str(), &e.value))
            .collect()
    }

    /// Split into the `(fragments, values)` pair.
    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        let fragments = self.fragments();
        let values = self.entries.into_iter().map(|e| e.value).collect();
        (fragments, values)
    }

    fn set_entries(&self) -> impl Iterator<Item = &ClauseEntry> {
        self.entries.iter().filter(|e| e.in_set_list)
    }

    /// Render a full `UPDATE` statement.
    ///
    /// Primary key entries become an `AND`-joined WHERE predicate; without any the
    /// statement has no WHERE clause. Parameters follow placeholder order.
    pub fn to_statement(&self, table: &str, dialect: &dyn Dialect) -> OrmResult<UpdateStatement> {
        if self.set_len() == 0 {
            return Err(OrmError::validation(
                "UpdateClause: SET clause cannot be empty",
            ));
        }

        let mut params = Vec::with_capacity(self.entries.len());
        let mut set_parts = Vec::new();
        for entry in self.set_entries() {
            params.push(entry.value.clone());
            set_parts.push(format!("{} = {}", entry.quoted, dialect.placeholder(params.len())));
        }

        let mut sql = format!("UPDATE {} SET {}", dialect.quote(table), set_parts.join(", "));

        let mut where_parts = Vec::new();
        for entry in self.entries.iter().filter(|e| !e.in_set_list) {
            params.push(entry.value.clone());
            where_parts.push(format!("{} = {}", entry.quoted, dialect.placeholder(params.len())));
        }
        if !where_parts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_parts.join(" AND "));
        }

        Ok(UpdateStatement { sql, params })
    }
}

/// A rendered UPDATE statement with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl UpdateStatement {
    /// Parameters as references for `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }
}
