//! # joinery: join-graph SQL compiler
//!
//! joinery compiles a structured query request (tables, selected fields,
//! joins, filter predicates, ordering, pagination) into a MySQL `SELECT`
//! statement, or into a `COUNT` statement over the same filter.
//!
//! ## Quick Example
//!
//! ```rust
//! use joinery::prelude::*;
//!
//! let catalog = Catalog::new()
//!     .entity("User", "users")
//!     .field("User", "name", DomainType::String)
//!     .entity("Order", "orders");
//!
//! let mut req = Request::new("User", "user");
//! req.join("Order", "order", Link::left(0, "id", "user_id"));
//! req.select(0, ["id", "name"]);
//! req.filter(Predicate::compare(0, "name", Operator::Eq, "Ann"));
//!
//! let compiler = Compiler::new(&catalog, &MysqlEscaper);
//! assert_eq!(
//!     compiler.compile_select(&req).unwrap(),
//!     "SELECT T0.id AS T0_id,T0.name AS T0_name\n\
//!      FROM users T0\n\
//!      LEFT JOIN orders T1 ON (T0.id=T1.user_id)\n\
//!      WHERE T0.name='Ann'"
//! );
//! ```
//!
//! ## Aliases
//!
//! | Alias      | Meaning                                  |
//! |------------|------------------------------------------|
//! | `T0`       | Root table                               |
//! | `T{i}`     | Table `i` of the request, joined by link |
//! | `T{i}_{f}` | Selected column `f` of table `i`         |
//! | `C`        | Result column of a count statement       |

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod parser;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::{Config, ParenthesisPolicy};
    pub use crate::engine::{Database, Row, RowSource};
    pub use crate::error::*;
    pub use crate::metadata::{Catalog, DomainType, Escaper, Metadata, MysqlEscaper};
    pub use crate::parser::parse_request;
    pub use crate::transpiler::{Compiler, ToSql};
}

/// Parse a JSON request with the default parenthesis policy.
///
/// # Example
///
/// ```
/// use joinery::parse;
///
/// let req = parse(r#"{"classes": ["User"], "fields": {"0": ["id"]}}"#).unwrap();
/// assert_eq!(req.classes, vec!["User".to_string()]);
/// ```
pub fn parse(json: &str) -> Result<ast::Request, error::JoineryError> {
    parser::parse_request(json, config::ParenthesisPolicy::default())
}
