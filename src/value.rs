use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single leaf value: a filter literal, an attribute value, or one element
/// of a typed array.
///
/// # Examples
///
/// ```
/// use hdfq::value::{DType, Scalar};
///
/// let count = Scalar::Integer(3);
/// assert_eq!(count.dtype(), DType::Int64);
///
/// let label = Scalar::from("raw");
/// assert_eq!(label.as_str(), Some("raw"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),

    Integer(i64),

    Float(f64),

    /// UTF-8 string
    String(String),
}

impl Scalar {
    /// Element type this value would be stored with.
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Boolean(_) => DType::Bool,
            Scalar::Integer(_) => DType::Int64,
            Scalar::Float(_) => DType::Float64,
            Scalar::String(_) => DType::Str,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts to `dtype` when the conversion is lossless.
    pub fn cast(&self, dtype: DType) -> Option<Scalar> {
        match (self, dtype) {
            (value, dtype) if value.dtype() == dtype => Some(value.clone()),
            (Scalar::Integer(n), DType::Float64) => Some(Scalar::Float(*n as f64)),
            _ => None,
        }
    }

    /// Reads a JSON leaf; arrays, objects and `null` are not scalars.
    pub fn from_json(value: &serde_json::Value) -> Option<Scalar> {
        match value {
            serde_json::Value::Bool(b) => Some(Scalar::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Integer(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            serde_json::Value::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }

    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Boolean(b) => serde_json::Value::Bool(*b),
            Scalar::Integer(n) => serde_json::Value::Number((*n).into()),
            Scalar::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Integer(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Boolean(b)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Float(n) => write!(f, "{:?}", n),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// Element type tag of a typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Bool,
    Int64,
    Float64,
    Str,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Str => "str",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown dtype name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dtype '{0}'")]
pub struct UnknownDType(pub String);

impl FromStr for DType {
    type Err = UnknownDType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(DType::Bool),
            "int64" | "int" => Ok(DType::Int64),
            "float64" | "float" => Ok(DType::Float64),
            "str" | "string" => Ok(DType::Str),
            other => Err(UnknownDType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_aliases() {
        assert_eq!("int".parse::<DType>(), Ok(DType::Int64));
        assert_eq!("string".parse::<DType>(), Ok(DType::Str));
        assert_eq!(
            "complex128".parse::<DType>(),
            Err(UnknownDType("complex128".to_string()))
        );
    }

    #[test]
    fn test_cast_widens_integers_only() {
        assert_eq!(
            Scalar::Integer(2).cast(DType::Float64),
            Some(Scalar::Float(2.0))
        );
        assert_eq!(Scalar::Float(2.5).cast(DType::Int64), None);
        assert_eq!(Scalar::from("x").cast(DType::Str), Some(Scalar::from("x")));
    }

    #[test]
    fn test_json_leaves() {
        let json: serde_json::Value = serde_json::from_str("[1, 1.5, true, \"a\", null]").unwrap();
        let leaves: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(Scalar::from_json)
            .collect();
        assert_eq!(
            leaves,
            vec![
                Some(Scalar::Integer(1)),
                Some(Scalar::Float(1.5)),
                Some(Scalar::Boolean(true)),
                Some(Scalar::from("a")),
                None,
            ]
        );
        assert_eq!(Scalar::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(Scalar::Float(1.0).to_string(), "1.0");
        assert_eq!(Scalar::from("test").to_string(), "test");
    }
}
