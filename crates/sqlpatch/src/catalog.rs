//! Column catalog: per-table column metadata and the [`Record`] trait.
//!
//! A record type exposes its columns once through [`Record::table_def`]
//! (normally generated by `#[derive(Record)]`) and reads individual fields
//! through [`Record::field`].

use chrono::FixedOffset;

use crate::error::{OrmError, OrmResult};
use crate::field::FieldValue;

/// Storage-type category of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Numeric,
    Char,
    Varchar,
    Text,
    Uuid,
    Json,
    Jsonb,
    Bytea,
    Blob,
    Date,
    Time,
    DateTime,
    Timestamp,
    TimestampTz,
}

/// Coarse storage class used when encoding structured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Text,
    Blob,
    Other,
}

impl SqlType {
    /// Storage class of this type.
    pub fn storage_kind(self) -> StorageKind {
        match self {
            Self::Char | Self::Varchar | Self::Text | Self::Uuid | Self::Json => StorageKind::Text,
            Self::Bytea | Self::Blob | Self::Jsonb => StorageKind::Blob,
            _ => StorageKind::Other,
        }
    }

    /// Whether the column holds JSON documents.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::Jsonb)
    }

    pub fn is_text(self) -> bool {
        self.storage_kind() == StorageKind::Text
    }

    pub fn is_blob(self) -> bool {
        self.storage_kind() == StorageKind::Blob
    }
}

/// Which direction the application maps a column in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapDirection {
    #[default]
    Both,
    /// Written by the application, never read back.
    WriteOnly,
    /// Populated by the database only; never written.
    ReadOnly,
}

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub is_primary_key: bool,
    pub is_version: bool,
    pub is_created: bool,
    pub is_updated: bool,
    pub is_auto_increment: bool,
    /// Soft-delete marker.
    pub is_deleted: bool,
    pub nullable: bool,
    pub sql_type: SqlType,
    pub map_direction: MapDirection,
    /// Overrides the engine's default zone when formatting time values.
    pub time_zone: Option<FixedOffset>,
}

impl Column {
    /// Create a nullable `varchar` column with no role flags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_primary_key: false,
            is_version: false,
            is_created: false,
            is_updated: false,
            is_auto_increment: false,
            is_deleted: false,
            nullable: true,
            sql_type: SqlType::Varchar,
            map_direction: MapDirection::Both,
            time_zone: None,
        }
    }

    /// Mark as primary key (implies NOT NULL).
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn version(mut self) -> Self {
        self.is_version = true;
        self
    }

    pub fn created(mut self) -> Self {
        self.is_created = true;
        self
    }

    pub fn updated(mut self) -> Self {
        self.is_updated = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    /// Mark as the soft-delete marker column.
    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn sql_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = sql_type;
        self
    }

    pub fn map_direction(mut self, direction: MapDirection) -> Self {
        self.map_direction = direction;
        self
    }

    pub fn time_zone(mut self, tz: FixedOffset) -> Self {
        self.time_zone = Some(tz);
        self
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Column catalog for one table. Column order is the canonical iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableDef {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Columns in catalog order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Find a column by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_named(name))
    }

    /// All primary key columns, in catalog order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    /// The single primary key column.
    ///
    /// Fails with [`OrmError::CompositeKey`] when the table declares zero or
    /// several primary key columns.
    pub fn primary_key(&self) -> OrmResult<&Column> {
        let mut keys = self.primary_keys();
        match (keys.next(), keys.next()) {
            (Some(pk), None) => Ok(pk),
            _ => Err(OrmError::CompositeKey {
                table: self.name.clone(),
                count: self.primary_keys().count(),
            }),
        }
    }
}

/// A record type whose fields map onto a table's columns.
///
/// Usually implemented with `#[derive(Record)]`.
pub trait Record {
    /// The static column catalog for this type.
    fn table_def() -> &'static TableDef
    where
        Self: Sized;

    /// Object-safe access to the catalog.
    fn table(&self) -> &'static TableDef;

    /// Read the current value of the field mapped to `column`.
    fn field(&self, column: &Column) -> OrmResult<FieldValue<'_>>;
}
