//! Database-bound scalar values.
//!
//! [`Value`] is what the type encoder produces for every included column. It
//! implements [`ToSql`] so a built clause can be bound straight into a
//! `tokio-postgres` client.

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, WrongType};
use uuid::Uuid;

// jsonb binary format version
const JSONB_VERSION: u8 = 1;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// A database-ready scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`
    Null,
    Bool(bool),
    /// Every signed and unsigned integer width is stored as `i64`.
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text payload, if this is a [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is a [`Value::Int`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the byte payload, if this is a [`Value::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

type BindError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BindError> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => bind(*v, ty, out),
            Self::Int(v) => match *ty {
                Type::INT2 => bind(i16::try_from(*v)?, ty, out),
                Type::INT4 => bind(i32::try_from(*v)?, ty, out),
                _ => bind(*v, ty, out),
            },
            Self::Float(v) => match *ty {
                Type::FLOAT4 => bind(*v as f32, ty, out),
                _ => bind(*v, ty, out),
            },
            Self::Text(v) => bind_text(v, ty, out),
            Self::Bytes(v) => match *ty {
                Type::JSON | Type::JSONB => Ok(write_json(ty, v, out)),
                _ => bind(v.as_slice(), ty, out),
            },
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(*ty, Type::JSON | Type::JSONB)
            || <bool as ToSql>::accepts(ty)
            || <i16 as ToSql>::accepts(ty)
            || <i32 as ToSql>::accepts(ty)
            || <i64 as ToSql>::accepts(ty)
            || <f32 as ToSql>::accepts(ty)
            || <f64 as ToSql>::accepts(ty)
            || <&str as ToSql>::accepts(ty)
            || <&[u8] as ToSql>::accepts(ty)
            || <Uuid as ToSql>::accepts(ty)
            || <NaiveDateTime as ToSql>::accepts(ty)
            || <DateTime<Utc> as ToSql>::accepts(ty)
            || <NaiveDate as ToSql>::accepts(ty)
            || <NaiveTime as ToSql>::accepts(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

fn bind<T: ToSql>(value: T, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BindError> {
    if !T::accepts(ty) {
        return Err(Box::new(WrongType::new::<T>(ty.clone())));
    }
    value.to_sql(ty, out)
}

/// Binds text, parsing it into the column's binary representation where the
/// column is not itself textual. Accepts the formats the dialects write.
fn bind_text(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BindError> {
    match *ty {
        Type::JSON | Type::JSONB => Ok(write_json(ty, v.as_bytes(), out)),
        Type::UUID => bind(Uuid::parse_str(v)?, ty, out),
        Type::TIMESTAMP => {
            let at = match NaiveDateTime::parse_from_str(v, DATETIME_FORMAT) {
                Ok(at) => at,
                Err(_) => DateTime::parse_from_rfc3339(v)?.naive_local(),
            };
            bind(at, ty, out)
        }
        Type::TIMESTAMPTZ => {
            let at = DateTime::parse_from_rfc3339(v)
                .or_else(|_| DateTime::parse_from_str(v, TIMESTAMPTZ_FORMAT))?;
            bind(at.with_timezone(&Utc), ty, out)
        }
        Type::DATE => bind(NaiveDate::parse_from_str(v, "%Y-%m-%d")?, ty, out),
        Type::TIME => bind(NaiveTime::parse_from_str(v, "%H:%M:%S%.f")?, ty, out),
        _ => bind(v, ty, out),
    }
}

fn write_json(ty: &Type, raw: &[u8], out: &mut BytesMut) -> IsNull {
    if *ty == Type::JSONB {
        out.put_u8(JSONB_VERSION);
    }
    out.extend_from_slice(raw);
    IsNull::No
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_binds_as_sql_null() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn int_narrows_to_column_width() {
        let mut buf = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &7i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn jsonb_text_gets_version_prefix() {
        let mut buf = BytesMut::new();
        Value::Text("{}".into())
            .to_sql(&Type::JSONB, &mut buf)
            .unwrap();
        assert_eq!(&buf[..], &[1, b'{', b'}']);

        let mut buf = BytesMut::new();
        Value::Bytes(b"[]".to_vec())
            .to_sql(&Type::JSON, &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"[]");
    }

    #[test]
    fn text_parses_into_binary_column_types() {
        let mut buf = BytesMut::new();
        Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8")
            .to_sql(&Type::UUID, &mut buf)
            .unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(buf[0], 0x67);

        let mut buf = BytesMut::new();
        Value::from("2024-01-02 04:04:05")
            .to_sql(&Type::TIMESTAMP, &mut buf)
            .unwrap();
        assert_eq!(buf.len(), 8);

        let mut buf = BytesMut::new();
        Value::from("2024-01-03 04:04:05+08:00")
            .to_sql(&Type::TIMESTAMPTZ, &mut buf)
            .unwrap();
        let mut rfc = BytesMut::new();
        Value::from("2024-01-02T20:04:05Z")
            .to_sql(&Type::TIMESTAMPTZ, &mut rfc)
            .unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(buf, rfc);

        let mut buf = BytesMut::new();
        Value::from("2024-02-29").to_sql(&Type::DATE, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);

        let mut buf = BytesMut::new();
        Value::from("04:04:05").to_sql(&Type::TIME, &mut buf).unwrap();
        assert_eq!(buf.len(), 8);

        let mut buf = BytesMut::new();
        Value::from("bob").to_sql(&Type::TEXT, &mut buf).unwrap();
        assert_eq!(&buf[..], b"bob");
    }

    #[test]
    fn malformed_text_is_rejected() {
        let mut buf = BytesMut::new();
        assert!(Value::from("not-a-uuid").to_sql(&Type::UUID, &mut buf).is_err());
        assert!(Value::from("yesterday").to_sql(&Type::DATE, &mut buf).is_err());
    }

    #[test]
    fn mismatched_types_are_rejected() {
        let mut buf = BytesMut::new();
        assert!(Value::Bool(true).to_sql(&Type::INT4, &mut buf).is_err());
        assert!(Value::Bytes(vec![1]).to_sql(&Type::TEXT, &mut buf).is_err());
        assert!(buf.is_empty());

        assert!(!<Value as ToSql>::accepts(&Type::POINT));
        assert!(<Value as ToSql>::accepts(&Type::UUID));
        let err = Value::Int(1).to_sql_checked(&Type::POINT, &mut buf);
        assert!(err.is_err());
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }
}
