//! Field values as seen by the update pipeline.
//!
//! A [`Record`] accessor returns a [`FieldValue`]: one variant per resolved
//! kind. Which variant a Rust type maps to is decided statically by its
//! [`ToField`] impl (or by `#[derive(Record)]` attributes), so capability
//! checks never happen per call.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::catalog::Record;
use crate::error::BoxError;
use crate::value::Value;

/// Custom conversion into a database representation.
///
/// When a field exposes this capability its result is used verbatim and no
/// other encoding rule applies.
pub trait ToDb {
    fn to_db(&self) -> Result<Value, BoxError>;
}

/// A type that can yield its own underlying database scalar.
///
/// `None` means "NULL".
pub trait ScalarValue {
    fn scalar(&self) -> Option<Value>;
}

/// Object-safe structured-data encoding (JSON).
pub trait Encode {
    fn encode_json(&self) -> serde_json::Result<Vec<u8>>;

    /// Name of the encoded type, used in error messages.
    fn type_name(&self) -> &'static str;
}

impl<T: Serialize> Encode for T {
    fn encode_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A struct-valued field.
///
/// On a JSON column it is serialized; on any other column it is treated as an
/// embedded reference and resolved to the related record's primary key.
#[derive(Clone, Copy)]
pub struct StructValue<'a> {
    encode: &'a dyn Encode,
    record: Option<&'a dyn Record>,
    blank: bool,
}

impl<'a> StructValue<'a> {
    /// A plain serializable struct. It is blank when equal to its `Default`.
    pub fn document<T>(value: &'a T) -> Self
    where
        T: Serialize + Default + PartialEq,
    {
        Self {
            encode: value,
            record: None,
            blank: *value == T::default(),
        }
    }

    /// A struct that is itself a record of another table.
    pub fn reference<T>(value: &'a T) -> Self
    where
        T: Record + Serialize,
    {
        Self {
            encode: value,
            record: Some(value),
            blank: false,
        }
    }

    pub fn encoder(&self) -> &'a dyn Encode {
        self.encode
    }

    /// The related record, if this struct maps to a table.
    pub fn record(&self) -> Option<&'a dyn Record> {
        self.record
    }

    /// `true` when every field holds its zero value.
    pub fn is_blank(&self) -> bool {
        match self.record {
            Some(record) => record.table().columns().iter().all(|col| {
                record
                    .field(col)
                    .map(|v| v.is_zero())
                    .unwrap_or(false)
            }),
            None => self.blank,
        }
    }
}

/// An array, slice or map value.
#[derive(Clone, Copy)]
pub struct CollectionValue<'a> {
    encode: &'a dyn Encode,
    zero: bool,
}

impl<'a> CollectionValue<'a> {
    pub fn new(encode: &'a dyn Encode, zero: bool) -> Self {
        Self { encode, zero }
    }

    pub fn encoder(&self) -> &'a dyn Encode {
        self.encode
    }

    /// Empty (slices, maps) or all elements zero (fixed arrays).
    pub fn is_zero(&self) -> bool {
        self.zero
    }
}

/// The resolved kind and current value of one field.
pub enum FieldValue<'a> {
    /// The field's runtime type is indeterminate; the column is skipped.
    Absent,
    /// A nil pointer / `None`.
    Nil,
    /// A populated pointer / `Some`.
    Ptr(Box<FieldValue<'a>>),
    Custom(&'a dyn ToDb),
    Bool(bool),
    Str(Cow<'a, str>),
    Int(i64),
    Uint(u64),
    Float(f64),
    Time(DateTime<FixedOffset>),
    Scalar(&'a dyn ScalarValue),
    Struct(StructValue<'a>),
    Collection(CollectionValue<'a>),
    /// A growable byte sequence (`Vec<u8>`).
    Bytes(&'a [u8]),
    /// A fixed-size byte array (`[u8; N]`).
    ByteArray(&'a [u8]),
    /// Any other kind; bound as-is.
    Raw(Value),
}

impl FieldValue<'_> {
    /// Whether the value equals its type's zero value.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Absent | Self::Nil => true,
            Self::Ptr(_) | Self::Custom(_) => false,
            Self::Bool(v) => !*v,
            Self::Str(v) => v.is_empty(),
            Self::Int(v) => *v == 0,
            Self::Uint(v) => *v == 0,
            Self::Float(v) => *v == 0.0,
            Self::Time(t) => is_zero_time(t),
            Self::Scalar(s) => s.scalar().is_none_or(|v| v.is_null()),
            Self::Struct(s) => s.is_blank(),
            Self::Collection(c) => c.is_zero(),
            Self::Bytes(b) => b.is_empty(),
            Self::ByteArray(b) => b.iter().all(|&x| x == 0),
            Self::Raw(v) => v.is_null(),
        }
    }

    /// Short kind name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Nil => "nil",
            Self::Ptr(_) => "ptr",
            Self::Custom(_) => "custom",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Time(_) => "time",
            Self::Scalar(_) => "scalar",
            Self::Struct(_) => "struct",
            Self::Collection(_) => "collection",
            Self::Bytes(_) => "bytes",
            Self::ByteArray(_) => "byte_array",
            Self::Raw(_) => "raw",
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ptr(inner) => f.debug_tuple("Ptr").field(inner).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Uint(v) => f.debug_tuple("Uint").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Time(v) => f.debug_tuple("Time").field(v).finish(),
            Self::Bytes(v) => f.debug_tuple("Bytes").field(v).finish(),
            Self::ByteArray(v) => f.debug_tuple("ByteArray").field(v).finish(),
            Self::Raw(v) => f.debug_tuple("Raw").field(v).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Whether `t` is the zero instant, the Unix epoch (`DateTime::default()`).
///
/// A genuine `1970-01-01T00:00:00Z` is therefore indistinguishable from an
/// unset value and is skipped unless the column is required. Use an
/// `Option<DateTime<_>>` field or `UpdatePolicy::must_cols` to write it.
pub fn is_zero_time<Tz: TimeZone>(t: &DateTime<Tz>) -> bool {
    t.timestamp() == 0 && t.timestamp_subsec_nanos() == 0
}

/// Conversion of a Rust field into a [`FieldValue`].
pub trait ToField {
    fn to_field(&self) -> FieldValue<'_>;
}

impl ToField for bool {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

impl ToField for str {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Str(Cow::Borrowed(self))
    }
}

impl ToField for String {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Str(Cow::Borrowed(self.as_str()))
    }
}

impl ToField for Cow<'_, str> {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Str(Cow::Borrowed(self.as_ref()))
    }
}

macro_rules! impl_to_field_int {
    ($variant:ident => $($ty:ty),+) => {
        $(
            impl ToField for $ty {
                fn to_field(&self) -> FieldValue<'_> {
                    FieldValue::$variant((*self).try_into().unwrap_or_default())
                }
            }
        )+
    };
}

impl_to_field_int!(Int => i8, i16, i32, i64, isize);
impl_to_field_int!(Uint => u8, u16, u32, u64, usize);

impl ToField for f32 {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Float(f64::from(*self))
    }
}

impl ToField for f64 {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Float(*self)
    }
}

impl ToField for DateTime<Utc> {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Time(self.fixed_offset())
    }
}

impl ToField for DateTime<FixedOffset> {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Time(*self)
    }
}

impl ToField for DateTime<Local> {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Time(self.fixed_offset())
    }
}

impl ToField for NaiveDateTime {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Time(self.and_utc().fixed_offset())
    }
}

impl ToField for NaiveDate {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Time(self.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset())
    }
}

impl<T: ToField> ToField for Option<T> {
    fn to_field(&self) -> FieldValue<'_> {
        match self {
            Some(v) => FieldValue::Ptr(Box::new(v.to_field())),
            None => FieldValue::Nil,
        }
    }
}

impl<T: ToField + ?Sized> ToField for Box<T> {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Ptr(Box::new((**self).to_field()))
    }
}

/// Element type of a `Vec<T>` or `[T; N]` field.
///
/// Sequences are JSON-encoded collections by default. `u8` overrides both
/// constructors so byte buffers map to [`FieldValue::Bytes`] and
/// [`FieldValue::ByteArray`]. Custom element types opt in with an empty impl.
pub trait ToFieldElem: Serialize + Sized {
    /// Whether the element is its type's zero value. Used for fixed arrays.
    fn is_zero_elem(&self) -> bool {
        false
    }

    #[allow(clippy::ptr_arg)]
    fn vec_field(items: &Vec<Self>) -> FieldValue<'_> {
        FieldValue::Collection(CollectionValue::new(items, items.is_empty()))
    }

    fn array_field<const N: usize>(items: &[Self; N]) -> FieldValue<'_>
    where
        [Self; N]: Serialize,
    {
        let zero = items.iter().all(Self::is_zero_elem);
        FieldValue::Collection(CollectionValue::new(items, zero))
    }
}

impl ToFieldElem for u8 {
    fn is_zero_elem(&self) -> bool {
        *self == 0
    }

    fn vec_field(items: &Vec<u8>) -> FieldValue<'_> {
        FieldValue::Bytes(items)
    }

    fn array_field<const N: usize>(items: &[u8; N]) -> FieldValue<'_>
    where
        [u8; N]: Serialize,
    {
        FieldValue::ByteArray(items)
    }
}

macro_rules! impl_to_field_elem {
    ($($ty:ty),+) => {
        $(
            impl ToFieldElem for $ty {
                fn is_zero_elem(&self) -> bool {
                    *self == <$ty>::default()
                }
            }
        )+
    };
}

impl_to_field_elem!(
    i8, i16, i32, i64, isize, u16, u32, u64, usize, f32, f64, bool, char, String
);

impl ToFieldElem for serde_json::Value {
    fn is_zero_elem(&self) -> bool {
        self.is_null()
    }
}

impl ToFieldElem for uuid::Uuid {
    fn is_zero_elem(&self) -> bool {
        self.is_nil()
    }
}

impl<T: ToFieldElem> ToFieldElem for Vec<T> {
    fn is_zero_elem(&self) -> bool {
        self.is_empty()
    }
}

impl<T: ToFieldElem> ToFieldElem for Option<T> {
    fn is_zero_elem(&self) -> bool {
        self.is_none()
    }
}

impl<T: ToFieldElem> ToField for Vec<T> {
    fn to_field(&self) -> FieldValue<'_> {
        T::vec_field(self)
    }
}

impl<T: ToFieldElem, const N: usize> ToField for [T; N]
where
    [T; N]: Serialize,
{
    fn to_field(&self) -> FieldValue<'_> {
        T::array_field(self)
    }
}

impl<K, V, S> ToField for HashMap<K, V, S>
where
    HashMap<K, V, S>: Serialize,
    S: BuildHasher,
{
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Collection(CollectionValue::new(self, self.is_empty()))
    }
}

impl<K, V> ToField for BTreeMap<K, V>
where
    BTreeMap<K, V>: Serialize,
{
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Collection(CollectionValue::new(self, self.is_empty()))
    }
}

impl ToField for serde_json::Value {
    fn to_field(&self) -> FieldValue<'_> {
        let zero = match self {
            serde_json::Value::Null => true,
            serde_json::Value::Array(a) => a.is_empty(),
            serde_json::Value::Object(o) => o.is_empty(),
            _ => false,
        };
        FieldValue::Collection(CollectionValue::new(self, zero))
    }
}

impl ScalarValue for uuid::Uuid {
    fn scalar(&self) -> Option<Value> {
        Some(Value::Text(self.to_string()))
    }
}

impl ToField for uuid::Uuid {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Scalar(self)
    }
}

impl ToField for Value {
    fn to_field(&self) -> FieldValue<'_> {
        FieldValue::Raw(self.clone())
    }
}
