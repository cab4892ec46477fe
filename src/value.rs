//! Typed values produced by parsing, and the builtin conversions from raw
//! tokens.

use std::{fmt, path::PathBuf};

use crate::error::{binding_err, Result};

#[derive(Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    List(Vec<Value>),
    Set(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Builds a set, keeping the first occurrence of every element.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Value {
        let mut res: Vec<Value> = Vec::new();
        for item in items {
            if !res.contains(&item) {
                res.push(item);
            }
        }
        Value::Set(res)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Path(_) => "path",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Tuple(_) => "tuple",
        }
    }
}

// Compact even under `{:#?}` so that parse results stay readable in snapshots.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq(f: &mut fmt::Formatter<'_>, l: &str, items: &[Value], r: &str) -> fmt::Result {
            write!(f, "{l}")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item:?}")?;
            }
            write!(f, "{r}")
        }
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(it) => write!(f, "{it}"),
            Value::Int(it) => write!(f, "{it}"),
            Value::Float(it) => write!(f, "{it:?}"),
            Value::Str(it) => write!(f, "{it:?}"),
            Value::Path(it) => write!(f, "Path({it:?})"),
            Value::List(items) => seq(f, "[", items, "]"),
            Value::Set(items) => seq(f, "{", items, "}"),
            Value::Tuple(items) => seq(f, "(", items, ")"),
        }
    }
}

impl From<bool> for Value {
    fn from(it: bool) -> Value {
        Value::Bool(it)
    }
}

impl From<i64> for Value {
    fn from(it: i64) -> Value {
        Value::Int(it)
    }
}

impl From<f64> for Value {
    fn from(it: f64) -> Value {
        Value::Float(it)
    }
}

impl From<&str> for Value {
    fn from(it: &str) -> Value {
        Value::Str(it.to_string())
    }
}

impl From<String> for Value {
    fn from(it: String) -> Value {
        Value::Str(it)
    }
}

impl From<PathBuf> for Value {
    fn from(it: PathBuf) -> Value {
        Value::Path(it)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(it: Vec<T>) -> Value {
        Value::List(it.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Str,
    Path,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Str => "string",
            ScalarType::Path => "path",
        }
    }

    /// Converts one raw token, returning `None` when the token isn't a valid
    /// value of this type.
    pub fn convert(self, token: &str) -> Option<Value> {
        let res = match self {
            ScalarType::Bool => Value::Bool(parse_bool(token)?),
            ScalarType::Int => Value::Int(token.parse().ok()?),
            ScalarType::Float => Value::Float(token.parse().ok()?),
            ScalarType::Str => Value::Str(token.to_string()),
            ScalarType::Path => Value::Path(PathBuf::from(token)),
        };
        Some(res)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    Tuple,
}

impl CollectionKind {
    pub fn wrap(self, items: Vec<Value>) -> Value {
        match self {
            CollectionKind::List => Value::List(items),
            CollectionKind::Set => Value::set(items),
            CollectionKind::Tuple => Value::Tuple(items),
        }
    }
}

/// The declared target type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Scalar(ScalarType),
    Collection(CollectionKind, ScalarType),
    /// A type only an explicit `mapping` can produce.
    Custom(&'static str),
}

impl ValueType {
    pub const BOOL: ValueType = ValueType::Scalar(ScalarType::Bool);
    pub const INT: ValueType = ValueType::Scalar(ScalarType::Int);
    pub const FLOAT: ValueType = ValueType::Scalar(ScalarType::Float);
    pub const STR: ValueType = ValueType::Scalar(ScalarType::Str);
    pub const PATH: ValueType = ValueType::Scalar(ScalarType::Path);

    pub fn list(of: ScalarType) -> ValueType {
        ValueType::Collection(CollectionKind::List, of)
    }

    pub fn set(of: ScalarType) -> ValueType {
        ValueType::Collection(CollectionKind::Set, of)
    }

    pub fn tuple(of: ScalarType) -> ValueType {
        ValueType::Collection(CollectionKind::Tuple, of)
    }

    pub fn is_builtin(self) -> bool {
        !matches!(self, ValueType::Custom(_))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar(it) => f.write_str(it.name()),
            ValueType::Collection(kind, it) => {
                let kind = match kind {
                    CollectionKind::List => "list",
                    CollectionKind::Set => "set",
                    CollectionKind::Tuple => "tuple",
                };
                write!(f, "{kind}[{}]", it.name())
            }
            ValueType::Custom(name) => f.write_str(name),
        }
    }
}

/// `true`/`yes` and `false`/`no`, case-insensitive.
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Extraction of typed values out of parse results.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(it) => Some(*it),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(it) => Some(*it),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(it) => Some(*it),
            Value::Int(it) => Some(*it as f64),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(it) => Some(it.clone()),
            _ => None,
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Path(it) => Some(it.clone()),
            Value::Str(it) => Some(PathBuf::from(it)),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::None => Some(None),
            it => T::from_value(it).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                items.iter().map(T::from_value).collect()
            }
            _ => None,
        }
    }
}

pub(crate) fn extract<T: FromValue>(dest: &str, value: &Value) -> Result<T> {
    T::from_value(value).ok_or_else(|| {
        binding_err!(
            "`{dest}` holds a {} value ({value:?}) of an unexpected type",
            value.type_name()
        )
    })
}
