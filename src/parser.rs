//! Request wire format.
//!
//! Requests arrive as JSON with predicates written as a flat list whose
//! grouping is carried by `open` / `close` markers:
//!
//! ```json
//! {
//!   "classes": ["User", "Order"],
//!   "index": {"user": 0, "order": 1},
//!   "fields": {"0": ["id", "name"]},
//!   "links": {"1": {"joinType": "LEFT", "leftTableIndex": 0,
//!                   "leftTableField": "id", "rightTableField": "user_id"}},
//!   "conditions": [
//!     {"table": 0, "field": "age", "operator": ">", "value": 18},
//!     {"table": 1, "field": "total", "operator": ">", "value": 10, "logic": "AND", "open": true},
//!     {"table": 1, "field": "status", "operator": "IS NULL", "logic": "OR", "close": true}
//!   ],
//!   "orderBy": [{"table": 0, "field": "created_at", "option": "YEAR", "direction": "DESC"}],
//!   "lines": 10, "offset": 0
//! }
//! ```
//!
//! Parsing turns the markers into [`Predicate::Group`] nodes and the
//! untyped values into [`Value`] variants.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::ast::*;
use crate::config::ParenthesisPolicy;
use crate::error::{JoineryError, JoineryResult};

/// One flat predicate as written on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PredicateNode {
    pub table: usize,
    pub field: String,
    pub operator: String,
    pub value: serde_json::Value,
    pub open: bool,
    pub close: bool,
    pub logic: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpec {
    pub join_type: String,
    pub left_table_index: usize,
    pub left_table_field: String,
    pub right_table_field: String,
    #[serde(default)]
    pub conditions: Vec<PredicateNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderSpec {
    pub table: usize,
    pub field: String,
    #[serde(default)]
    pub option: String,
    #[serde(default)]
    pub direction: String,
}

/// A request as written on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestSpec {
    pub classes: Vec<String>,
    pub fields: IndexMap<usize, Vec<String>>,
    pub links: BTreeMap<usize, LinkSpec>,
    pub conditions: Vec<PredicateNode>,
    pub order_by: Vec<OrderSpec>,
    pub lines: u64,
    pub offset: u64,
    pub distinct_lines: bool,
    pub index: HashMap<String, usize>,
}

/// Parse and validate a JSON request.
pub fn parse_request(json: &str, policy: ParenthesisPolicy) -> JoineryResult<Request> {
    let spec: RequestSpec = serde_json::from_str(json)?;
    build_request(spec, policy)
}

/// Read and parse a JSON request file.
pub fn load_request(path: impl AsRef<Path>, policy: ParenthesisPolicy) -> JoineryResult<Request> {
    let json = std::fs::read_to_string(path)?;
    parse_request(&json, policy)
}

/// Convert a decoded wire request into a validated [`Request`].
pub fn build_request(spec: RequestSpec, policy: ParenthesisPolicy) -> JoineryResult<Request> {
    let links = spec
        .links
        .into_iter()
        .map(|(idx, link)| -> JoineryResult<(usize, Link)> {
            Ok((
                idx,
                Link {
                    join_type: link.join_type.parse()?,
                    left_table_index: link.left_table_index,
                    left_table_field: link.left_table_field,
                    right_table_field: link.right_table_field,
                    conditions: parse_conditions(&link.conditions, &spec.index, policy)?,
                },
            ))
        })
        .collect::<JoineryResult<BTreeMap<_, _>>>()?;

    let conditions = parse_conditions(&spec.conditions, &spec.index, policy)?;

    let order_by = spec
        .order_by
        .into_iter()
        .map(|o| -> JoineryResult<OrderClause> {
            Ok(OrderClause {
                table: o.table,
                field: o.field,
                option: o.option.parse()?,
                direction: o.direction.parse()?,
            })
        })
        .collect::<JoineryResult<Vec<_>>>()?;

    let request = Request {
        classes: spec.classes,
        fields: spec.fields,
        links,
        conditions,
        order_by,
        lines: spec.lines,
        offset: spec.offset,
        distinct_lines: spec.distinct_lines,
        index: spec.index,
    };
    request.validate()?;
    Ok(request)
}

/// Rebuild the predicate tree from a flat marker sequence.
///
/// `close` is applied before the node's connector, `open` after it, so a
/// node with `open` starts a group that carries the node's connector.
/// Closing with nothing open always fails; groups still open at the end are
/// closed or rejected according to `policy`.
pub fn parse_conditions(
    nodes: &[PredicateNode],
    index: &HashMap<String, usize>,
    policy: ParenthesisPolicy,
) -> JoineryResult<Vec<Predicate>> {
    // Bottom entry is the sequence itself; each open group pushes one frame.
    let mut stack: Vec<(Option<LogicalOp>, Vec<Predicate>)> = vec![(None, Vec::new())];

    for (position, node) in nodes.iter().enumerate() {
        if node.close {
            if stack.len() == 1 {
                return Err(JoineryError::unbalanced(
                    position,
                    "cannot close a group that was never opened",
                ));
            }
            close_group(&mut stack);
        }

        let logic = LogicalOp::parse_optional(&node.logic)?;
        let comparison = parse_comparison(node, index)?;

        if node.open {
            let first = Predicate::Comparison {
                logic: None,
                comparison,
            };
            stack.push((logic, vec![first]));
        } else if let Some((_, items)) = stack.last_mut() {
            items.push(Predicate::Comparison { logic, comparison });
        }
    }

    if stack.len() > 1 && policy == ParenthesisPolicy::Strict {
        return Err(JoineryError::unbalanced(
            nodes.len(),
            format!("{} group(s) left open", stack.len() - 1),
        ));
    }
    while stack.len() > 1 {
        close_group(&mut stack);
    }

    Ok(stack.pop().map(|(_, items)| items).unwrap_or_default())
}

fn close_group(stack: &mut Vec<(Option<LogicalOp>, Vec<Predicate>)>) {
    if let Some((logic, children)) = stack.pop() {
        if let Some((_, parent)) = stack.last_mut() {
            parent.push(Predicate::Group { logic, children });
        }
    }
}

fn parse_comparison(node: &PredicateNode, index: &HashMap<String, usize>) -> JoineryResult<Comparison> {
    let op: Operator = node.operator.parse()?;
    let value = if op.needs_value() {
        parse_value(&node.value, index)?
    } else {
        Value::None
    };
    Ok(Comparison {
        table: node.table,
        field: node.field.clone(),
        op,
        value,
    })
}

/// Sniff an untyped wire value.
///
/// `null` and `false` mean "no value". A two-string array whose first
/// element is a known alias is a column reference; any other array is a
/// membership list.
pub fn parse_value(value: &serde_json::Value, index: &HashMap<String, usize>) -> JoineryResult<Value> {
    use serde_json::Value as Json;

    match value {
        Json::Null | Json::Bool(false) => Ok(Value::None),
        Json::Array(items) => {
            if let [Json::String(alias), Json::String(field)] = items.as_slice() {
                if index.contains_key(alias) {
                    return Ok(Value::column(alias.as_str(), field.as_str()));
                }
            }
            items
                .iter()
                .map(parse_scalar)
                .collect::<JoineryResult<Vec<_>>>()
                .map(Value::List)
        }
        other => parse_scalar(other).map(Value::Literal),
    }
}

fn parse_scalar(value: &serde_json::Value) -> JoineryResult<Scalar> {
    use serde_json::Value as Json;

    match value {
        Json::Bool(b) => Ok(Scalar::Bool(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Scalar::Int(i)),
            None => n.as_f64().map(Scalar::Float).ok_or_else(|| {
                JoineryError::InvalidValue(format!("number {} is out of range", n))
            }),
        },
        Json::String(s) => Ok(Scalar::Text(s.clone())),
        other => Err(JoineryError::InvalidValue(format!(
            "expected a scalar, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(field: &str, op: &str) -> PredicateNode {
        PredicateNode {
            field: field.to_string(),
            operator: op.to_string(),
            value: json!(1),
            ..PredicateNode::default()
        }
    }

    fn no_index() -> HashMap<String, usize> {
        HashMap::new()
    }

    #[test]
    fn test_flat_without_groups() {
        let mut b = node("b", "=");
        b.logic = "AND".into();
        let preds = parse_conditions(&[node("a", "="), b], &no_index(), ParenthesisPolicy::AutoClose).unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[1].logic(), Some(LogicalOp::And));
    }

    #[test]
    fn test_open_and_close_build_group() {
        let a = node("a", "=");
        let mut b = node("b", "=");
        b.logic = "AND".into();
        b.open = true;
        let mut c = node("c", "=");
        c.logic = "OR".into();
        let mut d = node("d", "=");
        d.close = true;
        d.logic = "AND".into();

        let preds = parse_conditions(&[a, b, c, d], &no_index(), ParenthesisPolicy::AutoClose).unwrap();
        assert_eq!(preds.len(), 3);
        match &preds[1] {
            Predicate::Group { logic, children } => {
                assert_eq!(*logic, Some(LogicalOp::And));
                assert_eq!(children.len(), 2);
                assert_eq!(children[0].logic(), None);
                assert_eq!(children[1].logic(), Some(LogicalOp::Or));
            }
            other => panic!("expected a group, got {:?}", other),
        }
        assert_eq!(preds[2].logic(), Some(LogicalOp::And));
    }

    #[test]
    fn test_close_without_open_fails_anywhere() {
        let mut closing = node("b", "=");
        closing.close = true;

        let err = parse_conditions(&[closing.clone()], &no_index(), ParenthesisPolicy::AutoClose).unwrap_err();
        assert!(matches!(err, JoineryError::UnbalancedParenthesis { position: 0, .. }));

        let mut opening = node("a", "=");
        opening.open = true;
        let mut inner_close = node("c", "=");
        inner_close.close = true;
        let err = parse_conditions(
            &[opening, inner_close, closing],
            &no_index(),
            ParenthesisPolicy::AutoClose,
        )
        .unwrap_err();
        assert!(matches!(err, JoineryError::UnbalancedParenthesis { position: 2, .. }));
    }

    #[test]
    fn test_trailing_open_policy() {
        let mut a = node("a", "=");
        a.open = true;
        let mut b = node("b", "=");
        b.open = true;
        b.logic = "OR".into();

        let preds = parse_conditions(&[a.clone(), b.clone()], &no_index(), ParenthesisPolicy::AutoClose).unwrap();
        assert_eq!(preds.len(), 1);
        match &preds[0] {
            Predicate::Group { children, .. } => {
                assert!(matches!(&children[1], Predicate::Group { .. }));
            }
            other => panic!("expected a group, got {:?}", other),
        }

        let err = parse_conditions(&[a, b], &no_index(), ParenthesisPolicy::Strict).unwrap_err();
        assert!(matches!(err, JoineryError::UnbalancedParenthesis { position: 2, .. }));
    }

    #[test]
    fn test_value_sniffing() {
        let mut index = HashMap::new();
        index.insert("order".to_string(), 1);

        assert_eq!(parse_value(&json!(null), &index).unwrap(), Value::None);
        assert_eq!(parse_value(&json!(false), &index).unwrap(), Value::None);
        assert_eq!(parse_value(&json!(3), &index).unwrap(), Value::from(3));
        assert_eq!(parse_value(&json!(2.5), &index).unwrap(), Value::from(2.5));
        assert_eq!(parse_value(&json!("x"), &index).unwrap(), Value::from("x"));
        assert_eq!(
            parse_value(&json!(["order", "id"]), &index).unwrap(),
            Value::column("order", "id")
        );
        assert_eq!(
            parse_value(&json!(["user", "id"]), &index).unwrap(),
            Value::list(["user", "id"])
        );
        assert_eq!(parse_value(&json!([]), &index).unwrap(), Value::List(Vec::new()));
        assert!(parse_value(&json!({"a": 1}), &index).is_err());
        assert!(parse_value(&json!([[1]]), &index).is_err());
    }

    #[test]
    fn test_unary_operator_drops_value() {
        let n = node("a", "IS NULL");
        let preds = parse_conditions(&[n], &no_index(), ParenthesisPolicy::AutoClose).unwrap();
        match &preds[0] {
            Predicate::Comparison { comparison, .. } => assert_eq!(comparison.value, Value::None),
            other => panic!("expected a comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tokens() {
        let err = parse_conditions(&[node("a", "~=")], &no_index(), ParenthesisPolicy::AutoClose).unwrap_err();
        assert!(matches!(err, JoineryError::UnsupportedOperator(_)));

        let mut n = node("a", "=");
        n.logic = "XOR".into();
        let err = parse_conditions(&[n], &no_index(), ParenthesisPolicy::AutoClose).unwrap_err();
        assert!(matches!(err, JoineryError::UnknownLogic(_)));
    }

    #[test]
    fn test_parse_request() {
        let req = parse_request(
            r#"{
                "classes": ["User", "Order"],
                "index": {"user": 0, "order": 1},
                "fields": {"1": ["total"], "0": ["id"]},
                "links": {"1": {"joinType": "INNER", "leftTableIndex": 0,
                                "leftTableField": "id", "rightTableField": "user_id"}},
                "conditions": [{"table": 1, "field": "user_id", "operator": "=", "value": ["user", "id"]}],
                "orderBy": [{"table": 0, "field": "created_at", "option": "YEAR", "direction": "DESC"}],
                "lines": 10,
                "distinctLines": true
            }"#,
            ParenthesisPolicy::AutoClose,
        )
        .unwrap();

        assert_eq!(req.fields.keys().copied().collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(req.links[&1].join_type, JoinType::Inner);
        assert_eq!(req.order_by[0].option, OrderOption::Year);
        assert_eq!(req.order_by[0].direction, SortOrder::Desc);
        assert!(req.distinct_lines);
        assert_eq!(req.lines, 10);
        assert_eq!(req.offset, 0);
    }

    #[test]
    fn test_parse_request_unknown_join_type() {
        let err = parse_request(
            r#"{
                "classes": ["User", "Order"],
                "links": {"1": {"joinType": "CROSS", "leftTableIndex": 0,
                                "leftTableField": "id", "rightTableField": "user_id"}}
            }"#,
            ParenthesisPolicy::AutoClose,
        )
        .unwrap_err();
        assert!(matches!(err, JoineryError::UnknownJoinType(s) if s == "CROSS"));
    }

    #[test]
    fn test_parse_request_malformed_json() {
        let err = parse_request("{\"classes\": 3}", ParenthesisPolicy::AutoClose).unwrap_err();
        assert!(matches!(err, JoineryError::Request(_)));
    }

    #[test]
    fn test_load_request_from_file() {
        let path = std::env::temp_dir().join(format!("joinery-request-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"classes": ["User"], "fields": {"0": ["id"]}}"#).unwrap();
        let req = load_request(&path, ParenthesisPolicy::AutoClose).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(req.classes, vec!["User".to_string()]);

        let err = load_request(&path, ParenthesisPolicy::AutoClose).unwrap_err();
        assert!(matches!(err, JoineryError::Io(_)));
    }
}
