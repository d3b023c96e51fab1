use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JoineryError;

/// Logical connector placed before a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }

    /// Parse a wire connector. The empty string means "no connector".
    pub fn parse_optional(s: &str) -> Result<Option<Self>, JoineryError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for LogicalOp {
    type Err = JoineryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicalOp::And),
            "OR" => Ok(LogicalOp::Or),
            _ => Err(JoineryError::UnknownLogic(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_keyword())
    }
}

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = JoineryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(JoineryError::InvalidValue(format!(
                "sort direction must be ASC or DESC, got '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// Date-part wrapper applied to an ORDER BY column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderOption {
    #[default]
    None,
    Day,
    Month,
    Year,
}

impl OrderOption {
    /// SQL function wrapping the column, if any.
    pub fn sql_function(&self) -> Option<&'static str> {
        match self {
            OrderOption::None => None,
            OrderOption::Day => Some("DAY"),
            OrderOption::Month => Some("MONTH"),
            OrderOption::Year => Some("YEAR"),
        }
    }
}

impl FromStr for OrderOption {
    type Err = JoineryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "NONE" => Ok(OrderOption::None),
            "DAY" => Ok(OrderOption::Day),
            "MONTH" => Ok(OrderOption::Month),
            "YEAR" => Ok(OrderOption::Year),
            _ => Err(JoineryError::UnknownOrderOption(s.to_string())),
        }
    }
}

/// Join kind of a non-root table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

impl FromStr for JoinType {
    type Err = JoineryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INNER" | "INNER JOIN" => Ok(JoinType::Inner),
            "LEFT" | "LEFT JOIN" => Ok(JoinType::Left),
            _ => Err(JoineryError::UnknownJoinType(s.to_string())),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than or equal (<=)
    Lte,
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// LIKE pattern match
    Like,
    /// Case-insensitive LIKE, rendered through UPPER() on both sides
    ILike,
    /// IN list
    In,
    /// NOT IN list
    NotIn,
}

impl Operator {
    /// Returns the symbol accepted on the wire for this operator.
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    /// IS NULL and IS NOT NULL ignore their value.
    pub fn needs_value(&self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// IN and NOT IN take a list of values.
    pub fn is_membership(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl FromStr for Operator {
    type Err = JoineryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim() {
            "IS NULL" => Operator::IsNull,
            "IS NOT NULL" => Operator::IsNotNull,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            "LIKE" => Operator::Like,
            "ILIKE" | "LIKE_CI" => Operator::ILike,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            _ => return Err(JoineryError::UnsupportedOperator(s.to_string())),
        };
        Ok(op)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_symbol())
    }
}
