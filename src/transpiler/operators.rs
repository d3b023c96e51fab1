//! Operator translation: one comparison to one boolean SQL fragment.

use super::coerce::{coerce, list_element};
use super::{Compiler, column_ref};
use crate::ast::{Comparison, Operator, Request, Value};
use crate::error::{JoineryError, JoineryResult};

/// Right-hand side of a comparison, already rendered to SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Nothing (unary operators).
    None,
    /// A coerced literal or a column reference.
    Sql(String),
    /// Rendered elements of a membership list.
    List(Vec<String>),
}

impl Compiler<'_> {
    /// Render the value of `cmp` for its operator and field type.
    ///
    /// Literals are coerced through the field's domain type; column
    /// references resolve their alias through the request's index.
    pub fn operand(&self, request: &Request, cmp: &Comparison) -> JoineryResult<Operand> {
        if !cmp.op.needs_value() {
            return Ok(Operand::None);
        }
        match &cmp.value {
            Value::None => Ok(Operand::None),
            Value::Literal(scalar) => {
                let class = request.class_of(cmp.table)?;
                let ty = self.metadata().property_type(class, &cmp.field)?;
                Ok(Operand::Sql(coerce(ty, scalar, self.escaper())?))
            }
            Value::Column { alias, field } => {
                let table = request.index.get(alias).copied().ok_or_else(|| {
                    JoineryError::InvalidValue(format!("unknown table alias '{}'", alias))
                })?;
                if !is_identifier(field) {
                    return Err(JoineryError::InvalidValue(format!(
                        "column reference field '{}' is not an identifier",
                        field
                    )));
                }
                Ok(Operand::Sql(column_ref(table, field)))
            }
            Value::List(items) => items
                .iter()
                .map(|item| list_element(item, self.escaper()))
                .collect::<JoineryResult<Vec<_>>>()
                .map(Operand::List),
        }
    }

    /// Produce the boolean fragment for `col {op} {operand}`.
    pub fn translate(&self, col: &str, op: Operator, operand: &Operand) -> JoineryResult<String> {
        let fragment = match op {
            Operator::IsNull => format!("{} IS NULL", col),
            Operator::IsNotNull => format!("{} IS NOT NULL", col),
            Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte | Operator::Eq | Operator::Ne => {
                format!("{}{}{}", col, op.sql_symbol(), scalar_operand(op, operand)?)
            }
            Operator::Like => format!("{} LIKE {}", col, scalar_operand(op, operand)?),
            Operator::ILike => format!("UPPER({}) LIKE UPPER({})", col, scalar_operand(op, operand)?),
            Operator::In | Operator::NotIn => {
                let items = match operand {
                    Operand::List(items) => items,
                    _ => {
                        return Err(JoineryError::InvalidValue(format!(
                            "operator {} requires a list of values",
                            op
                        )));
                    }
                };
                if items.is_empty() {
                    format!("{} {} ({})", col, op.sql_symbol(), self.empty_set_sentinel)
                } else {
                    format!("{} {} ({})", col, op.sql_symbol(), items.join(","))
                }
            }
        };
        Ok(fragment)
    }

    /// Translate from a wire operator symbol.
    pub fn translate_symbol(&self, col: &str, symbol: &str, operand: &Operand) -> JoineryResult<String> {
        let op: Operator = symbol.parse()?;
        self.translate(col, op, operand)
    }

    /// Render one comparison node.
    pub fn comparison(&self, request: &Request, cmp: &Comparison) -> JoineryResult<String> {
        let operand = self.operand(request, cmp)?;
        self.translate(&column_ref(cmp.table, &cmp.field), cmp.op, &operand)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn scalar_operand(op: Operator, operand: &Operand) -> JoineryResult<&str> {
    match operand {
        Operand::Sql(sql) => Ok(sql),
        Operand::None => Err(JoineryError::InvalidValue(format!(
            "operator {} requires a value",
            op
        ))),
        Operand::List(_) => Err(JoineryError::InvalidValue(format!(
            "operator {} does not accept a list",
            op
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Catalog, DomainType, MysqlEscaper};

    fn catalog() -> Catalog {
        Catalog::new()
            .entity("User", "users")
            .field("User", "name", DomainType::String)
            .field("User", "age", DomainType::Integer)
            .entity("Order", "orders")
    }

    fn sql(s: &str) -> Operand {
        Operand::Sql(s.to_string())
    }

    #[test]
    fn test_binary_operators() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        assert_eq!(c.translate("T0.a", Operator::Gt, &sql("1")).unwrap(), "T0.a>1");
        assert_eq!(c.translate("T0.a", Operator::Lt, &sql("1")).unwrap(), "T0.a<1");
        assert_eq!(c.translate("T0.a", Operator::Gte, &sql("1")).unwrap(), "T0.a>=1");
        assert_eq!(c.translate("T0.a", Operator::Lte, &sql("1")).unwrap(), "T0.a<=1");
        assert_eq!(c.translate("T0.a", Operator::Eq, &sql("1")).unwrap(), "T0.a=1");
        assert_eq!(c.translate("T0.a", Operator::Ne, &sql("1")).unwrap(), "T0.a!=1");
    }

    #[test]
    fn test_unary_operators_ignore_value() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        assert_eq!(c.translate("T0.a", Operator::IsNull, &sql("9")).unwrap(), "T0.a IS NULL");
        assert_eq!(
            c.translate("T0.a", Operator::IsNotNull, &Operand::None).unwrap(),
            "T0.a IS NOT NULL"
        );
    }

    #[test]
    fn test_like_operators() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        assert_eq!(c.translate("T0.n", Operator::Like, &sql("'%a%'")).unwrap(), "T0.n LIKE '%a%'");
        assert_eq!(
            c.translate("T0.n", Operator::ILike, &sql("'%a%'")).unwrap(),
            "UPPER(T0.n) LIKE UPPER('%a%')"
        );
    }

    #[test]
    fn test_membership() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let list = Operand::List(vec!["1".into(), "2".into()]);
        assert_eq!(c.translate("T0.id", Operator::In, &list).unwrap(), "T0.id IN (1,2)");
        assert_eq!(c.translate("T0.id", Operator::NotIn, &list).unwrap(), "T0.id NOT IN (1,2)");
    }

    #[test]
    fn test_empty_membership_uses_sentinel() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let empty = Operand::List(Vec::new());
        assert_eq!(c.translate("T0.id", Operator::In, &empty).unwrap(), "T0.id IN (-1)");
        assert_eq!(c.translate("T0.id", Operator::NotIn, &empty).unwrap(), "T0.id NOT IN (-1)");

        let c = c.with_empty_set_sentinel(0);
        assert_eq!(c.translate("T0.id", Operator::In, &empty).unwrap(), "T0.id IN (0)");
    }

    #[test]
    fn test_membership_requires_list() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let err = c.translate("T0.id", Operator::In, &sql("1")).unwrap_err();
        assert!(matches!(err, JoineryError::InvalidValue(_)));
    }

    #[test]
    fn test_comparison_rejects_list() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let err = c
            .translate("T0.id", Operator::Eq, &Operand::List(vec!["1".into()]))
            .unwrap_err();
        assert!(matches!(err, JoineryError::InvalidValue(_)));
    }

    #[test]
    fn test_unsupported_symbol() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let err = c.translate_symbol("T0.id", "BETWEEN", &sql("1")).unwrap_err();
        assert!(matches!(err, JoineryError::UnsupportedOperator(s) if s == "BETWEEN"));
    }

    #[test]
    fn test_operand_coerces_by_field_type() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let req = Request::new("User", "user");
        let cmp = Comparison {
            table: 0,
            field: "name".into(),
            op: Operator::Eq,
            value: "Ann".into(),
        };
        assert_eq!(c.comparison(&req, &cmp).unwrap(), "T0.name='Ann'");

        let cmp = Comparison {
            table: 0,
            field: "age".into(),
            op: Operator::Gte,
            value: "18 OR 1=1".into(),
        };
        assert_eq!(c.comparison(&req, &cmp).unwrap(), "T0.age>=18");
    }

    #[test]
    fn test_operand_resolves_column_alias() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let mut req = Request::new("User", "user");
        req.join("Order", "order", crate::ast::Link::left(0, "id", "user_id"));
        let cmp = Comparison {
            table: 1,
            field: "created_by".into(),
            op: Operator::Ne,
            value: Value::column("user", "id"),
        };
        assert_eq!(c.comparison(&req, &cmp).unwrap(), "T1.created_by!=T0.id");
    }

    #[test]
    fn test_operand_unknown_alias() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let req = Request::new("User", "user");
        let cmp = Comparison {
            table: 0,
            field: "id".into(),
            op: Operator::Eq,
            value: Value::column("ghost", "id"),
        };
        assert!(matches!(
            c.comparison(&req, &cmp),
            Err(JoineryError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_operand_rejects_non_identifier_column_field() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let req = Request::new("User", "user");
        for field in ["id OR 1=1 -- ", "", "1id", "id;", "a.b"] {
            let cmp = Comparison {
                table: 0,
                field: "id".into(),
                op: Operator::Eq,
                value: Value::column("user", field),
            };
            assert!(
                matches!(c.comparison(&req, &cmp), Err(JoineryError::InvalidValue(_))),
                "{:?}",
                field
            );
        }
    }

    #[test]
    fn test_identifier_shape() {
        assert!(is_identifier("id"));
        assert!(is_identifier("_created_at2"));
        assert!(!is_identifier("2nd"));
        assert!(!is_identifier("id OR 1=1"));
        assert!(!is_identifier("`id`"));
    }

    #[test]
    fn test_operand_list_quotes_text() {
        let cat = catalog();
        let c = Compiler::new(&cat, &MysqlEscaper);
        let req = Request::new("User", "user");
        let cmp = Comparison {
            table: 0,
            field: "name".into(),
            op: Operator::In,
            value: Value::list(["a", "b'c"]),
        };
        assert_eq!(c.comparison(&req, &cmp).unwrap(), "T0.name IN ('a','b\\'c')");
    }
}
