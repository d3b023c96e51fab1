use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operators::{JoinType, OrderOption, SortOrder};
use super::predicate::Predicate;
use super::values::Value;
use crate::error::{JoineryError, JoineryResult};

/// How a non-root table is attached to the statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub join_type: JoinType,
    pub left_table_index: usize,
    pub left_table_field: String,
    pub right_table_field: String,
    /// Extra ON-clause conditions, ANDed with the key equality.
    pub conditions: Vec<Predicate>,
}

impl Link {
    pub fn new(
        join_type: JoinType,
        left_table_index: usize,
        left_table_field: impl Into<String>,
        right_table_field: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            left_table_index,
            left_table_field: left_table_field.into(),
            right_table_field: right_table_field.into(),
            conditions: Vec::new(),
        }
    }

    pub fn left(
        left_table_index: usize,
        left_table_field: impl Into<String>,
        right_table_field: impl Into<String>,
    ) -> Self {
        Self::new(JoinType::Left, left_table_index, left_table_field, right_table_field)
    }

    pub fn inner(
        left_table_index: usize,
        left_table_field: impl Into<String>,
        right_table_field: impl Into<String>,
    ) -> Self {
        Self::new(JoinType::Inner, left_table_index, left_table_field, right_table_field)
    }

    /// Add ON-clause conditions.
    pub fn on(mut self, conditions: Vec<Predicate>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderClause {
    pub table: usize,
    pub field: String,
    pub option: OrderOption,
    pub direction: SortOrder,
}

impl OrderClause {
    pub fn new(table: usize, field: impl Into<String>, direction: SortOrder) -> Self {
        Self {
            table,
            field: field.into(),
            option: OrderOption::None,
            direction,
        }
    }

    /// Wrap the column in DAY()/MONTH()/YEAR().
    pub fn by(mut self, option: OrderOption) -> Self {
        self.option = option;
        self
    }
}

/// A compiled-query description: tables, selected fields, joins,
/// filter, ordering and pagination.
///
/// Table `i` of `classes` is addressed as `T{i}`; index 0 is the root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Request {
    pub classes: Vec<String>,
    pub fields: IndexMap<usize, Vec<String>>,
    /// Keyed by table index; iteration order is join order.
    pub links: BTreeMap<usize, Link>,
    pub conditions: Vec<Predicate>,
    pub order_by: Vec<OrderClause>,
    pub lines: u64,
    pub offset: u64,
    pub distinct_lines: bool,
    /// Alias name -> table index, for column-to-column comparisons.
    pub index: HashMap<String, usize>,
}

impl Request {
    /// Start a request rooted at `class`, registered under alias `alias`.
    pub fn new(class: impl Into<String>, alias: impl Into<String>) -> Self {
        let mut req = Self {
            classes: vec![class.into()],
            ..Self::default()
        };
        req.index.insert(alias.into(), 0);
        req
    }

    /// Attach another class and return its table index.
    pub fn join(&mut self, class: impl Into<String>, alias: impl Into<String>, link: Link) -> usize {
        let idx = self.classes.len();
        self.classes.push(class.into());
        self.index.insert(alias.into(), idx);
        self.links.insert(idx, link);
        idx
    }

    /// Select fields of table `table`, appended after any already selected.
    pub fn select<S: Into<String>>(&mut self, table: usize, fields: impl IntoIterator<Item = S>) -> &mut Self {
        self.fields
            .entry(table)
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.conditions.push(predicate);
        self
    }

    pub fn order(&mut self, clause: OrderClause) -> &mut Self {
        self.order_by.push(clause);
        self
    }

    pub fn limit(&mut self, offset: u64, lines: u64) -> &mut Self {
        self.offset = offset;
        self.lines = lines;
        self
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct_lines = distinct;
        self
    }

    /// Class of table `index`.
    pub fn class_of(&self, index: usize) -> JoineryResult<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| JoineryError::unknown_table(index, "no class at this index"))
    }

    /// Whether `T{index}` is defined in the FROM clause.
    fn is_attached(&self, index: usize) -> bool {
        index < self.classes.len() && (index == 0 || self.links.contains_key(&index))
    }

    fn check_attached(&self, index: usize, usage: &str) -> JoineryResult<()> {
        if index >= self.classes.len() {
            return Err(JoineryError::unknown_table(
                index,
                format!("{} refers to a table with no class", usage),
            ));
        }
        if !self.is_attached(index) {
            return Err(JoineryError::unknown_table(
                index,
                format!("{} refers to a table with no join descriptor", usage),
            ));
        }
        Ok(())
    }

    /// Check a predicate tree against the attached tables.
    ///
    /// `bound` caps the table index a join ON clause may reference.
    fn check_conditions(&self, conditions: &[Predicate], usage: &str, bound: Option<usize>) -> JoineryResult<()> {
        for predicate in conditions {
            match predicate {
                Predicate::Comparison { comparison, .. } => {
                    self.check_reference(comparison.table, usage, bound)?;
                    if let Value::Column { alias, .. } = &comparison.value {
                        let table = self.index.get(alias).copied().ok_or_else(|| {
                            JoineryError::InvalidValue(format!("unknown table alias '{}'", alias))
                        })?;
                        self.check_reference(table, "column reference", bound)?;
                    }
                }
                Predicate::Group { children, .. } => {
                    if children.is_empty() {
                        return Err(JoineryError::InvalidValue("empty predicate group".into()));
                    }
                    self.check_conditions(children, usage, bound)?;
                }
            }
        }
        Ok(())
    }

    fn check_reference(&self, index: usize, usage: &str, bound: Option<usize>) -> JoineryResult<()> {
        self.check_attached(index, usage)?;
        match bound {
            Some(max) if index > max => Err(JoineryError::unknown_table(
                index,
                format!("{} in the join of T{} refers to a later table", usage, max),
            )),
            _ => Ok(()),
        }
    }

    /// Check the structural invariants of the table graph.
    ///
    /// Table 0 must exist and have no join descriptor; every other table
    /// referenced by fields, conditions, column references, order clauses
    /// or aliases must be joined. A join may only reference tables joined
    /// before it. Predicate groups may not be empty.
    pub fn validate(&self) -> JoineryResult<()> {
        if self.classes.is_empty() {
            return Err(JoineryError::unknown_table(0, "request has no root class"));
        }
        if self.links.contains_key(&0) {
            return Err(JoineryError::unknown_table(0, "root table cannot have a join descriptor"));
        }

        for (&idx, link) in &self.links {
            if idx >= self.classes.len() {
                return Err(JoineryError::unknown_table(idx, "join descriptor has no class"));
            }
            if link.left_table_index >= idx || !self.is_attached(link.left_table_index) {
                return Err(JoineryError::unknown_table(
                    link.left_table_index,
                    format!("join of T{} must reference an earlier joined table", idx),
                ));
            }
            self.check_conditions(&link.conditions, "join condition", Some(idx))?;
        }

        for &table in self.fields.keys() {
            self.check_attached(table, "selected field")?;
        }
        self.check_conditions(&self.conditions, "condition", None)?;
        for clause in &self.order_by {
            self.check_attached(clause.table, "order clause")?;
        }
        for (alias, &table) in &self.index {
            if table >= self.classes.len() {
                return Err(JoineryError::unknown_table(
                    table,
                    format!("alias '{}' refers to a table with no class", alias),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operator;

    #[test]
    fn test_builder_assigns_indices() {
        let mut req = Request::new("User", "user");
        let orders = req.join("Order", "order", Link::left(0, "id", "user_id"));
        assert_eq!(orders, 1);
        assert_eq!(req.index["order"], 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_select_preserves_insertion_order() {
        let mut req = Request::new("User", "user");
        req.join("Order", "order", Link::left(0, "id", "user_id"));
        req.select(1, ["total"]).select(0, ["id", "name"]);
        let keys: Vec<usize> = req.fields.keys().copied().collect();
        assert_eq!(keys, vec![1, 0]);
    }

    #[test]
    fn test_validate_rejects_unlinked_table() {
        let mut req = Request::new("User", "user");
        req.classes.push("Order".to_string());
        req.select(1, ["total"]);
        let err = req.validate().unwrap_err();
        assert!(matches!(err, JoineryError::UnknownTable { index: 1, .. }));
    }

    #[test]
    fn test_validate_rejects_root_link() {
        let mut req = Request::new("User", "user");
        req.links.insert(0, Link::left(0, "id", "id"));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_checks_nested_conditions() {
        let mut req = Request::new("User", "user");
        req.filter(Predicate::group(vec![
            Predicate::compare(0, "id", Operator::Eq, 1),
            Predicate::compare(4, "id", Operator::Eq, 2).or(),
        ]));
        let err = req.validate().unwrap_err();
        assert!(matches!(err, JoineryError::UnknownTable { index: 4, .. }));
    }

    #[test]
    fn test_validate_rejects_forward_join_reference() {
        let mut req = Request::new("User", "user");
        req.join("Order", "order", Link::left(2, "id", "user_id"));
        req.join("Item", "item", Link::left(1, "id", "order_id"));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_column_reference_to_unlinked_table() {
        let mut req = Request::new("Root", "root");
        req.classes.push("Order".to_string());
        req.index.insert("order".to_string(), 1);
        req.filter(Predicate::compare(0, "id", Operator::Eq, Value::column("order", "id")));
        let err = req.validate().unwrap_err();
        assert!(matches!(err, JoineryError::UnknownTable { index: 1, .. }));
    }

    #[test]
    fn test_validate_rejects_unknown_column_alias() {
        let mut req = Request::new("Root", "root");
        req.filter(Predicate::compare(0, "id", Operator::Eq, Value::column("ghost", "id")));
        assert!(matches!(req.validate(), Err(JoineryError::InvalidValue(_))));
    }

    #[test]
    fn test_validate_rejects_join_condition_on_later_table() {
        let mut req = Request::new("User", "user");
        req.join(
            "Order",
            "order",
            Link::left(0, "id", "user_id").on(vec![Predicate::compare(
                1,
                "item_id",
                Operator::Eq,
                Value::column("item", "id"),
            )]),
        );
        req.join("Item", "item", Link::left(1, "item_id", "id"));
        let err = req.validate().unwrap_err();
        assert!(matches!(err, JoineryError::UnknownTable { index: 2, .. }));

        req.links.get_mut(&1).unwrap().conditions =
            vec![Predicate::compare(1, "user_id", Operator::Eq, Value::column("user", "id"))];
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let mut req = Request::new("User", "user");
        req.filter(Predicate::is_null(0, "a"))
            .filter(Predicate::group(vec![]).and());
        assert!(matches!(req.validate(), Err(JoineryError::InvalidValue(m)) if m == "empty predicate group"));

        let mut nested = Request::new("User", "user");
        nested.filter(Predicate::group(vec![Predicate::group(vec![])]));
        assert!(nested.validate().is_err());
    }
}
