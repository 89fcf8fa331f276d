//! SQL dialect hooks: identifier quoting, placeholders and time formatting.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::catalog::{Column, SqlType};
use crate::value::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database-specific rendering rules.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Short dialect name (`mysql`, `postgres`, ...).
    fn name(&self) -> &'static str;

    /// Quote a column or table identifier.
    fn quote(&self, ident: &str) -> String;

    /// Render the `n`-th (1-based) bind placeholder.
    fn placeholder(&self, _n: usize) -> String {
        "?".to_string()
    }

    /// `strftime` pattern for zoned timestamps; `None` renders RFC 3339.
    fn timestamptz_format(&self) -> Option<&'static str> {
        None
    }

    /// Format a time value for `column`.
    ///
    /// The value is first moved into the column's zone, or `default_tz` when the
    /// column declares none.
    fn format_time(
        &self,
        time: DateTime<FixedOffset>,
        default_tz: FixedOffset,
        column: &Column,
    ) -> Value {
        let local = time.with_timezone(&column.time_zone.unwrap_or(default_tz));
        match column.sql_type {
            SqlType::Date => Value::Text(local.format(DATE_FORMAT).to_string()),
            SqlType::Time => Value::Text(local.format(TIME_FORMAT).to_string()),
            SqlType::TimestampTz => match self.timestamptz_format() {
                Some(fmt) => Value::Text(local.format(fmt).to_string()),
                None => Value::Text(local.to_rfc3339()),
            },
            SqlType::SmallInt | SqlType::Int | SqlType::BigInt => Value::Int(local.timestamp()),
            _ => Value::Text(local.format(DATETIME_FORMAT).to_string()),
        }
    }
}

fn quote_with(ident: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push(open);
    for ch in ident.chars() {
        if ch == close {
            out.push(close);
        }
        out.push(ch);
    }
    out.push(close);
    out
}

/// MySQL / MariaDB: backtick quoting, `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, ident: &str) -> String {
        quote_with(ident, '`', '`')
    }
}

/// PostgreSQL: double-quote quoting, `$n` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote(&self, ident: &str) -> String {
        quote_with(ident, '"', '"')
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn timestamptz_format(&self) -> Option<&'static str> {
        Some("%Y-%m-%d %H:%M:%S%:z")
    }
}

/// SQLite: double-quote quoting, `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote(&self, ident: &str) -> String {
        quote_with(ident, '"', '"')
    }
}
