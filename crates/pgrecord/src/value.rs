//! Scalar values carried by field maps and bound to placeholders.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::net::IpAddr;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type BoxError = Box<dyn StdError + Sync + Send>;

/// A single column value.
///
/// Values only ever travel to the database as bound parameters; they are
/// never rendered into SQL text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    Bool(bool),
    /// Any integer column (`smallint`, `integer`, `bigint`)
    Int(i64),
    /// Any floating point column (`real`, `double precision`)
    Float(f64),
    /// `numeric`
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    /// `timestamptz`, or `timestamp` interpreted as UTC
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    /// `json` / `jsonb`
    Json(serde_json::Value),
    /// `bytea`, or the binary wire form of a column type with no variant
    /// of its own (`interval`, `money`, geometric types, ...)
    Bytes(Vec<u8>),
    /// One-dimensional array of any supported element type
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Floats, and integers widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(v) => Some(*v),
            Value::Int(v) => Some(Decimal::from(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Value::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::Bytes(v) => {
                f.write_str("\\x")?;
                v.iter().try_for_each(|b| write!(f, "{b:02x}"))
            }
            Value::Array(v) => {
                f.write_str("[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Failed conversion out of a [`Value`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct ValueTypeError {
    pub expected: &'static str,
    pub found: &'static str,
}

macro_rules! impl_try_from_value {
    ($t:ty, $expected:literal, $pat:pat => $out:expr) => {
        impl TryFrom<Value> for $t {
            type Error = ValueTypeError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    $pat => Ok($out),
                    other => Err(ValueTypeError {
                        expected: $expected,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

impl_try_from_value!(bool, "bool", Value::Bool(v) => v);
impl_try_from_value!(i64, "int", Value::Int(v) => v);
impl_try_from_value!(f64, "float", Value::Float(v) => v);
impl_try_from_value!(Decimal, "decimal", Value::Decimal(v) => v);
impl_try_from_value!(String, "text", Value::Text(v) => v);
impl_try_from_value!(NaiveTime, "time", Value::Time(v) => v);
impl_try_from_value!(Vec<u8>, "bytes", Value::Bytes(v) => v);
impl_try_from_value!(Vec<Value>, "array", Value::Array(v) => v);
impl_try_from_value!(NaiveDate, "date", Value::Date(v) => v);
impl_try_from_value!(DateTime<Utc>, "timestamp", Value::Timestamp(v) => v);
impl_try_from_value!(Uuid, "uuid", Value::Uuid(v) => v);
impl_try_from_value!(serde_json::Value, "json", Value::Json(v) => v);

impl TryFrom<Value> for i32 {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let found = value.kind();
        value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or(ValueTypeError {
                expected: "int4",
                found,
            })
    }
}

/// Encode `v` only if its Rust type maps to the target column type.
fn encode<T: ToSql>(v: &T, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if !T::accepts(ty) {
        return Err(format!(
            "cannot bind {} to a parameter of type {}",
            std::any::type_name::<T>(),
            ty
        )
        .into());
    }
    v.to_sql(ty, out)
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => encode(v, ty, out),
            Value::Int(v) => {
                if *ty == Type::INT2 {
                    encode(&i16::try_from(*v)?, ty, out)
                } else if *ty == Type::INT4 {
                    encode(&i32::try_from(*v)?, ty, out)
                } else if *ty == Type::FLOAT4 {
                    encode(&(*v as f32), ty, out)
                } else if *ty == Type::FLOAT8 {
                    encode(&(*v as f64), ty, out)
                } else if *ty == Type::NUMERIC {
                    encode(&Decimal::from(*v), ty, out)
                } else {
                    encode(v, ty, out)
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    encode(&(*v as f32), ty, out)
                } else if *ty == Type::NUMERIC {
                    encode(&Decimal::try_from(*v)?, ty, out)
                } else {
                    encode(v, ty, out)
                }
            }
            Value::Decimal(v) => {
                if *ty == Type::FLOAT8 || *ty == Type::FLOAT4 {
                    let float = v
                        .to_f64()
                        .ok_or_else(|| format!("{v} does not fit in a {ty} parameter"))?;
                    Value::Float(float).to_sql(ty, out)
                } else {
                    encode(v, ty, out)
                }
            }
            Value::Text(v) => {
                if *ty == Type::INET {
                    encode(&v.parse::<IpAddr>()?, ty, out)
                } else {
                    encode(v, ty, out)
                }
            }
            Value::Date(v) => encode(v, ty, out),
            Value::Time(v) => encode(v, ty, out),
            Value::Timestamp(v) => {
                if *ty == Type::TIMESTAMP {
                    encode(&v.naive_utc(), ty, out)
                } else {
                    encode(v, ty, out)
                }
            }
            Value::Uuid(v) => encode(v, ty, out),
            Value::Json(v) => encode(v, ty, out),
            Value::Bytes(v) => {
                if *ty == Type::BYTEA {
                    encode(v, ty, out)
                } else if decodes_as_raw(ty) {
                    out.extend_from_slice(v);
                    Ok(IsNull::No)
                } else {
                    Err(format!("cannot bind bytes to a parameter of type {ty}").into())
                }
            }
            Value::Array(v) => encode(v, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Column types read back as their binary wire form.
fn decodes_as_raw(ty: &Type) -> bool {
    let own_variant = [
        Type::BOOL,
        Type::INT2,
        Type::INT4,
        Type::INT8,
        Type::FLOAT4,
        Type::FLOAT8,
        Type::NUMERIC,
        Type::DATE,
        Type::TIME,
        Type::TIMESTAMP,
        Type::TIMESTAMPTZ,
        Type::UUID,
        Type::JSON,
        Type::JSONB,
        Type::INET,
        Type::BYTEA,
    ];
    !own_variant.contains(ty)
        && !<String as FromSql>::accepts(ty)
        && !matches!(ty.kind(), Kind::Array(_))
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = if *ty == Type::BOOL {
            Value::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::INT2 {
            Value::Int(i16::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT4 {
            Value::Int(i32::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT8 {
            Value::Int(i64::from_sql(ty, raw)?)
        } else if *ty == Type::FLOAT4 {
            Value::Float(f32::from_sql(ty, raw)?.into())
        } else if *ty == Type::FLOAT8 {
            Value::Float(f64::from_sql(ty, raw)?)
        } else if *ty == Type::NUMERIC {
            Value::Decimal(Decimal::from_sql(ty, raw)?)
        } else if *ty == Type::DATE {
            Value::Date(NaiveDate::from_sql(ty, raw)?)
        } else if *ty == Type::TIME {
            Value::Time(NaiveTime::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMP {
            Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?.and_utc())
        } else if *ty == Type::TIMESTAMPTZ {
            Value::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?)
        } else if *ty == Type::UUID {
            Value::Uuid(Uuid::from_sql(ty, raw)?)
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Value::Json(serde_json::Value::from_sql(ty, raw)?)
        } else if *ty == Type::INET {
            Value::Text(IpAddr::from_sql(ty, raw)?.to_string())
        } else if <String as FromSql>::accepts(ty) {
            Value::Text(String::from_sql(ty, raw)?)
        } else if let Kind::Array(_) = ty.kind() {
            // multi-dimensional arrays fall back to their wire bytes
            Vec::<Value>::from_sql(ty, raw)
                .map_or_else(|_| Value::Bytes(raw.to_vec()), Value::Array)
        } else {
            Value::Bytes(raw.to_vec())
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
