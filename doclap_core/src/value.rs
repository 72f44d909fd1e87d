//! Parsed values and the (possibly nested) namespaces holding them.
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use thiserror::Error;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Namespace(Namespace),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Namespace(_) => "namespace",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Value::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn into_namespace(self) -> Option<Namespace> {
        match self {
            Value::Namespace(ns) => Some(ns),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (n, item) in items.iter().enumerate() {
                    if n > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Namespace(ns) => write!(f, "{ns}"),
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}
value_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Values out of the `i64` range saturate.
macro_rules! value_from_wide_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[allow(unused_comparisons)]
                fn from(v: $ty) -> Self {
                    let saturated = if v < 0 { i64::MIN } else { i64::MAX };
                    Value::Int(i64::try_from(v).unwrap_or(saturated))
                }
            }
        )*
    };
}
value_from_wide_int!(isize, u64, usize);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::Str(v.to_string_lossy().into_owned())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<Namespace> for Value {
    fn from(v: Namespace) -> Self {
        Value::Namespace(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: String,
}

impl ValueError {
    fn new(expected: &'static str, value: &Value) -> Self {
        ValueError {
            expected,
            found: format!("{} '{}'", value.kind(), value),
        }
    }
}

/// Conversion of a parsed [`Value`] into a function argument.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(value.clone())
    }
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(i) => {
                            <$ty>::try_from(*i).map_err(|_| ValueError::new(stringify!($ty), value))
                        }
                        _ => Err(ValueError::new(stringify!($ty), value)),
                    }
                }
            }
        )*
    };
}
int_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(ValueError::new("f64", value)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        f64::from_value(value)
            .map(|x| x as f32)
            .map_err(|_| ValueError::new("f32", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(ValueError::new("bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            _ => Err(ValueError::new("String", value)),
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(PathBuf::from(s)),
            _ => Err(ValueError::new("PathBuf", value)),
        }
    }
}

impl FromValue for Namespace {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Namespace(ns) => Ok(ns.clone()),
            _ => Err(ValueError::new("Namespace", value)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => Err(ValueError::new("list", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// The result of a parse: argument names mapped to their values.
///
/// Chained subcommands are stored as nested namespaces under the name of the
/// subcommand, with `-` replaced by `_`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: IndexMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The namespace of a chained subcommand.
    pub fn child(&self, name: &str) -> Option<&Namespace> {
        self.get(name).and_then(Value::as_namespace)
    }

    pub fn extract<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| Error::MissingValue(name.to_string()))?;
        T::from_value(value).map_err(|source| Error::Value {
            name: name.to_string(),
            source,
        })
    }

    /// Copy every entry of `other` into this namespace, replacing existing
    /// values. Nested namespaces present on both sides are merged.
    pub fn merge(&mut self, other: Namespace) {
        for (name, value) in other.values {
            match (self.values.get_mut(&name), value) {
                (Some(Value::Namespace(mine)), Value::Namespace(theirs)) => mine.merge(theirs),
                (_, value) => {
                    self.values.insert(name, value);
                }
            }
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace(")?;
        for (n, (name, value)) in self.values.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            match value {
                Value::Str(s) => write!(f, "{name}={s:?}")?,
                other => write!(f, "{name}={other}")?,
            }
        }
        write!(f, ")")
    }
}

impl FromIterator<(String, Value)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Namespace {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Namespace {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract() {
        let mut ns = Namespace::new();
        ns.insert("a", 3);
        ns.insert("scale", 2);
        ns.insert("names", vec!["x", "y"]);
        ns.insert("maybe", Value::None);

        assert_eq!(ns.extract::<i64>("a").unwrap(), 3);
        assert_eq!(ns.extract::<u8>("a").unwrap(), 3);
        assert_eq!(ns.extract::<f64>("scale").unwrap(), 2.0);
        assert_eq!(
            ns.extract::<Vec<String>>("names").unwrap(),
            vec!["x".to_string(), "y".to_string()]
        );
        assert_eq!(ns.extract::<Option<i64>>("maybe").unwrap(), None);
        assert_eq!(ns.extract::<Option<i64>>("a").unwrap(), Some(3));
    }

    #[test]
    fn test_extract_errors() {
        let mut ns = Namespace::new();
        ns.insert("a", 2.5);
        ns.insert("neg", -1);

        assert!(matches!(ns.extract::<i64>("missing"), Err(Error::MissingValue(name)) if name == "missing"));
        let err = ns.extract::<i64>("a").unwrap_err();
        assert_eq!(err.to_string(), "invalid value for 'a': expected i64, found float '2.5'");
        assert!(ns.extract::<u32>("neg").is_err());
    }

    #[test]
    fn test_merge_nested() {
        let mut left = Namespace::new();
        let mut inner = Namespace::new();
        inner.insert("a", 1);
        left.insert("x", 1);
        left.insert("sub", inner);

        let mut right = Namespace::new();
        let mut inner = Namespace::new();
        inner.insert("b", 2);
        right.insert("x", 2);
        right.insert("sub", inner);

        left.merge(right);
        assert_eq!(left.get("x"), Some(&Value::Int(2)));
        let sub = left.child("sub").unwrap();
        assert_eq!(sub.get("a"), Some(&Value::Int(1)));
        assert_eq!(sub.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_wide_ints() {
        assert_eq!(Value::from(3usize), Value::Int(3));
        assert_eq!(Value::from(-3isize), Value::Int(-3));
        assert_eq!(Value::from(u64::MAX), Value::Int(i64::MAX));
        let ns: Namespace = [("n".to_string(), Value::from(7usize))].into_iter().collect();
        assert_eq!(ns.extract::<usize>("n").unwrap(), 7);
    }

    #[test]
    fn test_display() {
        let mut ns = Namespace::new();
        ns.insert("a", "test");
        ns.insert("n", vec![1, 2]);
        ns.insert("flag", true);
        assert_eq!(ns.to_string(), "Namespace(a=\"test\", n=[1, 2], flag=true)");
    }
}
