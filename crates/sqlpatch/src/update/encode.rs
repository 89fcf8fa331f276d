//! Type encoder: turns a classified field value into a bound [`Value`].
//!
//! `Ok(None)` means "skip this column"; it is not an error.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::FixedOffset;

use crate::catalog::{Column, StorageKind};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::field::{Encode, FieldValue, StructValue, is_zero_time};
use crate::value::Value;

/// Encoding settings shared by every column of one call.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    pub dialect: &'a dyn Dialect,
    pub time_zone: FixedOffset,
    /// Write `false` booleans instead of treating them as unset.
    pub use_bool: bool,
}

impl Encoder<'_> {
    pub fn encode(
        &self,
        value: FieldValue<'_>,
        required: bool,
        include_nil: bool,
        column: &Column,
    ) -> OrmResult<Option<Value>> {
        let value = match value {
            FieldValue::Custom(conv) => return conv.to_db().map(Some).map_err(OrmError::Conversion),
            FieldValue::Absent => return Ok(None),
            FieldValue::Nil => return Ok(include_nil.then_some(Value::Null)),
            // A populated pointer always counts as provided.
            FieldValue::Ptr(inner) => return self.encode(*inner, true, include_nil, column),
            FieldValue::Bool(v) => (self.use_bool || required).then_some(Value::Bool(v)),
            FieldValue::Str(v) => (required || !v.is_empty()).then(|| Value::Text(v.into_owned())),
            FieldValue::Int(v) => (required || v != 0).then_some(Value::Int(v)),
            FieldValue::Uint(v) => (required || v != 0).then_some(Value::Int(v as i64)),
            FieldValue::Float(v) => (required || v != 0.0).then_some(Value::Float(v)),
            FieldValue::Time(t) => {
                if !required && is_zero_time(&t) {
                    return Ok(None);
                }
                Some(self.dialect.format_time(t, self.time_zone, column))
            }
            FieldValue::Scalar(s) => match s.scalar() {
                None | Some(Value::Null) if !required => None,
                None => Some(Value::Null),
                Some(v) => Some(v),
            },
            FieldValue::Struct(s) if column.sql_type.is_json() => {
                if !required && s.is_blank() {
                    return Ok(None);
                }
                encode_structured(s.encoder(), column.sql_type.storage_kind())?
            }
            FieldValue::Struct(s) => return self.encode_reference(s, required, include_nil, column),
            FieldValue::Collection(c) => {
                if !required && c.is_zero() {
                    return Ok(None);
                }
                encode_structured(c.encoder(), column.sql_type.storage_kind())?
            }
            FieldValue::Bytes(b) => {
                if !required && b.is_empty() {
                    return Ok(None);
                }
                match column.sql_type.storage_kind() {
                    // A JSON string of the standard base64 encoding.
                    StorageKind::Text => encode_structured(&BASE64.encode(b), StorageKind::Text)?,
                    // Empty byte sequences are never written, even when required.
                    StorageKind::Blob => (!b.is_empty()).then(|| Value::Bytes(b.to_vec())),
                    StorageKind::Other => None,
                }
            }
            FieldValue::ByteArray(b) => {
                if !required && b.iter().all(|&x| x == 0) {
                    return Ok(None);
                }
                match column.sql_type.storage_kind() {
                    StorageKind::Text => encode_structured(&b, StorageKind::Text)?,
                    // Fixed-size arrays are bound as an empty placeholder.
                    StorageKind::Blob => Some(Value::Bytes(Vec::new())),
                    StorageKind::Other => None,
                }
            }
            FieldValue::Raw(v) => Some(v),
        };
        Ok(value)
    }

    /// Resolve a struct on a non-JSON column to the related record's primary key.
    fn encode_reference(
        &self,
        value: StructValue<'_>,
        required: bool,
        include_nil: bool,
        column: &Column,
    ) -> OrmResult<Option<Value>> {
        let Some(record) = value.record() else {
            // Not a mapped table: bind the struct as its JSON text.
            return encode_structured(value.encoder(), StorageKind::Text);
        };
        let pk = record.table().primary_key()?;
        let key = record.field(pk)?;
        if !required && key.is_zero() {
            return Ok(None);
        }
        self.encode(key, true, include_nil, column)
    }
}

/// Serialize to JSON, as text or bytes depending on the column's storage.
fn encode_structured(value: &dyn Encode, storage: StorageKind) -> OrmResult<Option<Value>> {
    let encode = || {
        value.encode_json().map_err(|e| {
            OrmError::Serialization(format!("marshal {} failed: {e}", value.type_name()))
        })
    };
    match storage {
        StorageKind::Text => {
            let bytes = encode()?;
            let text = String::from_utf8(bytes).map_err(|e| OrmError::Serialization(e.to_string()))?;
            Ok(Some(Value::Text(text)))
        }
        StorageKind::Blob => Ok(Some(Value::Bytes(encode()?))),
        StorageKind::Other => Ok(None),
    }
}
