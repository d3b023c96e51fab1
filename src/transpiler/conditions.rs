//! Boolean expression rendering for WHERE and join ON clauses.

use super::Compiler;
use crate::ast::{Predicate, Request};
use crate::error::JoineryResult;

impl Compiler<'_> {
    /// Render a predicate sequence as one boolean expression.
    ///
    /// Each element is preceded by ` {logic} ` when it carries a connector,
    /// including the first one. Groups are wrapped in parentheses.
    pub fn render_conditions(&self, request: &Request, predicates: &[Predicate]) -> JoineryResult<String> {
        let mut sql = String::new();
        self.render_into(&mut sql, request, predicates)?;
        Ok(sql)
    }

    fn render_into(&self, sql: &mut String, request: &Request, predicates: &[Predicate]) -> JoineryResult<()> {
        for predicate in predicates {
            if let Some(logic) = predicate.logic() {
                sql.push(' ');
                sql.push_str(logic.sql_keyword());
                sql.push(' ');
            }
            match predicate {
                Predicate::Comparison { comparison, .. } => {
                    sql.push_str(&self.comparison(request, comparison)?);
                }
                Predicate::Group { children, .. } => {
                    sql.push('(');
                    self.render_into(sql, request, children)?;
                    sql.push(')');
                }
            }
        }
        Ok(())
    }
}
