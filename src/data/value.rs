use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::index::IndexKey;

/// Scalar cell value stored in an indexed column
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Value {
    /// Numeric projection used by sum indexes. NaN has no projection.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) if !v.is_nan() => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get a numeric order for type comparison
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int64(_) => 2,
            Value::Float64(_) => 3,
            Value::String(_) => 4,
        }
    }
}

// Equality is type-strict: Int64(1) and Float64(1.0) are distinct keys, which
// keeps Hash and canonical bytes consistent with Eq.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float64(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            // Mixed numerics compare by value; ties fall back to type order
            (Value::Int64(a), Value::Float64(b)) => {
                (*a as f64).total_cmp(b).then(Ordering::Less)
            }
            (Value::Float64(a), Value::Int64(b)) => {
                a.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

impl IndexKey for Value {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        out.push(self.type_order());
        match self {
            Value::Null => {}
            Value::Bool(b) => b.write_canonical(out),
            Value::Int64(i) => i.write_canonical(out),
            Value::Float64(f) => f.write_canonical(out),
            Value::String(s) => s.write_canonical(out),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// Column data type inferred from the values handed to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Bool,
    Int64,
    Float64,
    String,
}

impl DataType {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Bool,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::String(_) => DataType::String,
        }
    }

    /// Determine the best type when merging two types
    pub fn merge(&self, other: &DataType) -> DataType {
        if self == other {
            return *self;
        }
        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => *t,
            (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
                DataType::Float64
            }
            // Default to string for incompatible types
            _ => DataType::String,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Bool => write!(f, "BOOL"),
            DataType::Int64 => write!(f, "INT64"),
            DataType::Float64 => write!(f, "FLOAT64"),
            DataType::String => write!(f, "STRING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ordering() {
        assert!(Value::Int64(1) < Value::Int64(2));
        assert!(Value::String("a".into()) < Value::String("b".into()));
        assert!(Value::Null < Value::Int64(0));
        assert!(Value::Float64(-0.5) < Value::Float64(0.5));
        assert!(Value::Int64(1) < Value::Float64(1.5));
        assert!(Value::Float64(0.5) < Value::Int64(1));
    }

    #[test]
    fn test_mixed_numeric_equality_is_type_strict() {
        assert_ne!(Value::Int64(1), Value::Float64(1.0));
        assert!(Value::Int64(1) < Value::Float64(1.0));
        assert!(Value::Float64(1.0) > Value::Int64(1));
    }

    #[test]
    fn test_canonical_bytes_distinguish_types() {
        let int_bytes = Value::Int64(1).canonical_bytes();
        let float_bytes = Value::Float64(1.0).canonical_bytes();
        let str_bytes = Value::from("1").canonical_bytes();

        assert_ne!(int_bytes, float_bytes);
        assert_ne!(int_bytes, str_bytes);
        assert_eq!(Value::from("1").canonical_bytes(), str_bytes);
    }

    #[test]
    fn test_numeric_projection() {
        assert_eq!(Value::Int64(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float64(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Float64(f64::NAN).as_f64(), None);
        assert_eq!(Value::from("x").as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_data_type_merge() {
        assert_eq!(DataType::Null.merge(&DataType::Int64), DataType::Int64);
        assert_eq!(DataType::Int64.merge(&DataType::Float64), DataType::Float64);
        assert_eq!(DataType::Bool.merge(&DataType::Int64), DataType::String);
    }
}
