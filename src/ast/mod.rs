pub mod operators;
pub mod predicate;
pub mod request;
pub mod values;

pub use self::operators::{JoinType, LogicalOp, Operator, OrderOption, SortOrder};
pub use self::predicate::{Comparison, Predicate};
pub use self::request::{Link, OrderClause, Request};
pub use self::values::{Scalar, Value};
