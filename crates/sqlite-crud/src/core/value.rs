use base64::{engine::general_purpose::STANDARD, Engine as _};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

/// A single SQLite cell, typed by storage class rather than declared column type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(x) => SqlValue::Integer(x),
            ValueRef::Real(x) => SqlValue::Real(x),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

/// JSON input is loosely typed: booleans become 0/1 and nested arrays or
/// objects are stored as their compact JSON text.
impl From<Value> for SqlValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Integer(i64::from(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlValue::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => SqlValue::Text(other.to_string()),
        }
    }
}

impl From<&Value> for SqlValue {
    fn from(v: &Value) -> Self {
        SqlValue::from(v.clone())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let v = match self {
            SqlValue::Null => ValueRef::Null,
            SqlValue::Integer(x) => ValueRef::Integer(*x),
            SqlValue::Real(x) => ValueRef::Real(*x),
            SqlValue::Text(s) => ValueRef::Text(s.as_bytes()),
            SqlValue::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(v))
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_unit(),
            SqlValue::Integer(x) => serializer.serialize_i64(*x),
            SqlValue::Real(x) => serializer.serialize_f64(*x),
            SqlValue::Text(s) => serializer.serialize_str(s),
            SqlValue::Blob(b) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("$type", "blob")?;
                map.serialize_entry("base64", &STANDARD.encode(b))?;
                map.serialize_entry("size", &b.len())?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_scalars_map_to_storage_classes() {
        assert_eq!(SqlValue::from(json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from(json!(true)), SqlValue::Integer(1));
        assert_eq!(SqlValue::from(json!(42)), SqlValue::Integer(42));
        assert_eq!(SqlValue::from(json!(2.5)), SqlValue::Real(2.5));
        assert_eq!(SqlValue::from(json!("30")), SqlValue::Text("30".into()));
    }

    #[test]
    fn nested_json_is_stored_as_text() {
        let v = SqlValue::from(json!({"a": [1, 2]}));
        assert_eq!(v, SqlValue::Text(r#"{"a":[1,2]}"#.into()));
    }

    #[test]
    fn blobs_serialize_as_tagged_base64() {
        let v = serde_json::to_value(SqlValue::Blob(b"hi!".to_vec())).unwrap();
        assert_eq!(v, json!({"$type": "blob", "base64": "aGkh", "size": 3}));
    }
}
