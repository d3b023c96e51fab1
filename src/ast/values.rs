use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format used when a date-time is written as SQL text.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single domain value, before coercion to a SQL literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Text
    Text(String),
    /// Date and time without zone
    DateTime(NaiveDateTime),
}

impl Scalar {
    pub fn is_text(&self) -> bool {
        matches!(self, Scalar::Text(_))
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value (IS NULL / IS NOT NULL)
    #[default]
    None,
    /// A literal, coerced through the field's domain type
    Literal(Scalar),
    /// Another table's column, addressed through the request's alias index
    Column { alias: String, field: String },
    /// Values of a membership test
    List(Vec<Scalar>),
}

impl Value {
    /// Reference a column of the table registered under `alias`.
    pub fn column(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Value::Column {
            alias: alias.into(),
            field: field.into(),
        }
    }

    /// Build a membership list.
    pub fn list<S: Into<Scalar>>(values: impl IntoIterator<Item = S>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "-"),
            Value::Literal(s) => write!(f, "{:?}", s.to_string()),
            Value::Column { alias, field } => write!(f, "{}.{}", alias, field),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", v.to_string())?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n as i64)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(dt: NaiveDateTime) -> Self {
        Scalar::DateTime(dt)
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Literal(s)
    }
}

macro_rules! literal_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Literal(v.into())
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, f64, &str, String, NaiveDateTime);
