use std::fmt::{Display, Formatter};

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    NULL,
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),

    /// json, bound as its canonical text
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::NULL)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_) | Value::Float(_))
    }

    /// Converts a field of a seed row into a bindable value.
    ///
    /// Numbers keep their numeric type, objects and arrays are bound as
    /// their JSON text and every other scalar is bound as text.
    pub fn from_seed_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::NULL,
            serde_json::Value::Bool(b) => Value::String(b.to_string()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            value @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::Json(value)
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Value::NULL => "NULL".to_string(),
            Value::Int(value) => value.to_string(),
            Value::UInt(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Json(value) => value.to_string(),
        };

        write!(f, "{}", str)
    }
}

macro_rules! from_to_value {
    ($variant:ident, $($source:ty),*) => {$(
        impl From<$source> for Value {
            #[inline]
            fn from(value: $source) -> Self {
                Value::$variant(value.into())
            }
        }
    )*}
}

from_to_value!(Int, i8, i16, i32, i64);
from_to_value!(UInt, u8, u16, u32, u64);
from_to_value!(Float, f32, f64);
from_to_value!(String, String, &str);
from_to_value!(Json, serde_json::Value);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            None => Value::NULL,
            Some(value) => value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Value;
    use serde_json::json;

    #[test]
    fn seed_numbers_stay_numeric() {
        assert_eq!(Value::from_seed_json(json!(42)), Value::Int(42));
        assert_eq!(Value::from_seed_json(json!(u64::MAX)), Value::UInt(u64::MAX));
        assert_eq!(Value::from_seed_json(json!(1.5)), Value::Float(1.5));
        assert!(Value::from_seed_json(json!(-3)).is_numeric());
    }

    #[test]
    fn seed_structures_are_bound_as_json_text() {
        let value = Value::from_seed_json(json!({"a": [1, 2], "b": "c"}));
        assert_eq!(value.to_string(), r#"{"a":[1,2],"b":"c"}"#);
        assert_eq!(Value::from_seed_json(json!([1, "x"])).to_string(), r#"[1,"x"]"#);
    }

    #[test]
    fn seed_scalars_are_bound_as_text() {
        assert_eq!(
            Value::from_seed_json(json!(true)),
            Value::String("true".to_string())
        );
        assert_eq!(
            Value::from_seed_json(json!("0")),
            Value::String("0".to_string())
        );
        assert!(Value::from_seed_json(json!(null)).is_null());
    }
}
