use serde::{Deserialize, Serialize};

use super::operators::{LogicalOp, Operator};
use super::values::Value;

/// A single column test: `T{table}.{field} {op} {value}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub table: usize,
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

/// One element of a boolean filter.
///
/// Each element carries the connector written *before* it. A connector on
/// the first element of a sequence is still rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Comparison {
        logic: Option<LogicalOp>,
        comparison: Comparison,
    },
    Group {
        logic: Option<LogicalOp>,
        children: Vec<Predicate>,
    },
}

impl Predicate {
    /// Create a comparison with no leading connector.
    pub fn compare(
        table: usize,
        field: impl Into<String>,
        op: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Predicate::Comparison {
            logic: None,
            comparison: Comparison {
                table,
                field: field.into(),
                op,
                value: value.into(),
            },
        }
    }

    /// Create a parenthesised group with no leading connector.
    pub fn group(children: Vec<Predicate>) -> Self {
        Predicate::Group {
            logic: None,
            children,
        }
    }

    /// Create an IS NULL test.
    pub fn is_null(table: usize, field: impl Into<String>) -> Self {
        Self::compare(table, field, Operator::IsNull, Value::None)
    }

    /// Create an IS NOT NULL test.
    pub fn is_not_null(table: usize, field: impl Into<String>) -> Self {
        Self::compare(table, field, Operator::IsNotNull, Value::None)
    }

    /// Prefix this element with AND.
    pub fn and(self) -> Self {
        self.with_logic(Some(LogicalOp::And))
    }

    /// Prefix this element with OR.
    pub fn or(self) -> Self {
        self.with_logic(Some(LogicalOp::Or))
    }

    pub fn with_logic(self, logic: Option<LogicalOp>) -> Self {
        match self {
            Predicate::Comparison { comparison, .. } => Predicate::Comparison { logic, comparison },
            Predicate::Group { children, .. } => Predicate::Group { logic, children },
        }
    }

    pub fn logic(&self) -> Option<LogicalOp> {
        match self {
            Predicate::Comparison { logic, .. } | Predicate::Group { logic, .. } => *logic,
        }
    }

    /// Visit every comparison in this subtree, depth first.
    pub fn for_each_comparison<'a>(&'a self, f: &mut impl FnMut(&'a Comparison)) {
        match self {
            Predicate::Comparison { comparison, .. } => f(comparison),
            Predicate::Group { children, .. } => {
                for child in children {
                    child.for_each_comparison(f);
                }
            }
        }
    }
}
