//! FROM clause and JOIN chain.

use super::{Compiler, ToSql, column_ref};
use crate::ast::Request;
use crate::error::JoineryResult;

impl Compiler<'_> {
    /// Emit `FROM {root} T0` followed by one line per join, in table-index order.
    pub fn assemble_from(&self, request: &Request) -> JoineryResult<String> {
        let root = self.metadata().table_name(request.class_of(0)?)?;
        let mut sql = format!("FROM {} T0", root);

        for (&idx, link) in &request.links {
            let table = self.metadata().table_name(request.class_of(idx)?)?;
            sql.push('\n');
            sql.push_str(&link.join_type.to_sql());
            sql.push(' ');
            sql.push_str(&table);
            sql.push_str(&format!(
                " T{} ON ({}={}",
                idx,
                column_ref(link.left_table_index, &link.left_table_field),
                column_ref(idx, &link.right_table_field)
            ));
            if !link.conditions.is_empty() {
                sql.push_str(" AND (");
                sql.push_str(&self.render_conditions(request, &link.conditions)?);
                sql.push(')');
            }
            sql.push(')');
        }

        Ok(sql)
    }
}
