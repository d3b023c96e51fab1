//! SQL statement compiler.
//!
//! Turns a [`Request`](crate::ast::Request) into a MySQL SELECT or COUNT
//! statement. Compilation is pure: each call builds its own buffer and the
//! compiler only holds shared references to its collaborators.

pub mod coerce;
pub mod conditions;
pub mod joins;
pub mod operators;
pub mod select;

use crate::ast::{JoinType, OrderClause, SortOrder};
use crate::config::CompilerConfig;
use crate::metadata::{Escaper, Metadata};

pub use self::operators::Operand;

/// Value rendered by an empty IN / NOT IN list. Assumes every real
/// primary key is positive, so `IN (-1)` matches nothing.
pub const EMPTY_SET_SENTINEL: i64 = -1;

/// Trait for converting AST nodes that cannot fail to SQL.
pub trait ToSql {
    /// Convert this node to a SQL string.
    fn to_sql(&self) -> String;
}

/// Column reference `T{table}.{field}`.
pub fn column_ref(table: usize, field: &str) -> String {
    format!("T{}.{}", table, field)
}

/// Compiles requests against a metadata provider and an escaper.
#[derive(Clone, Copy)]
pub struct Compiler<'a> {
    metadata: &'a dyn Metadata,
    escaper: &'a dyn Escaper,
    empty_set_sentinel: i64,
}

impl<'a> Compiler<'a> {
    pub fn new(metadata: &'a dyn Metadata, escaper: &'a dyn Escaper) -> Self {
        Self {
            metadata,
            escaper,
            empty_set_sentinel: EMPTY_SET_SENTINEL,
        }
    }

    /// Apply the `[compiler]` configuration section.
    pub fn with_config(mut self, config: &CompilerConfig) -> Self {
        self.empty_set_sentinel = config.empty_set_sentinel;
        self
    }

    pub fn with_empty_set_sentinel(mut self, sentinel: i64) -> Self {
        self.empty_set_sentinel = sentinel;
        self
    }

    pub fn metadata(&self) -> &'a dyn Metadata {
        self.metadata
    }

    pub fn escaper(&self) -> &'a dyn Escaper {
        self.escaper
    }
}

impl ToSql for JoinType {
    fn to_sql(&self) -> String {
        self.sql_keyword().to_string()
    }
}

impl ToSql for SortOrder {
    fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl ToSql for OrderClause {
    fn to_sql(&self) -> String {
        let col = column_ref(self.table, &self.field);
        match self.option.sql_function() {
            Some(func) => format!("{}({}) {}", func, col, self.direction.to_sql()),
            None => format!("{} {}", col, self.direction.to_sql()),
        }
    }
}
