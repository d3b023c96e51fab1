//! SELECT and COUNT statements.

use tracing::debug;

use super::{Compiler, ToSql, column_ref};
use crate::ast::Request;
use crate::error::{JoineryError, JoineryResult};

impl Compiler<'_> {
    /// Compile the full SELECT statement for `request`.
    pub fn compile_select(&self, request: &Request) -> JoineryResult<String> {
        request.validate()?;

        let mut sql = String::from("SELECT ");
        if request.distinct_lines {
            sql.push_str("DISTINCT ");
        }

        let cols: Vec<String> = request
            .fields
            .iter()
            .flat_map(|(&table, fields)| {
                fields
                    .iter()
                    .map(move |field| format!("{} AS T{}_{}", column_ref(table, field), table, field))
            })
            .collect();
        if cols.is_empty() {
            return Err(JoineryError::InvalidValue("no fields selected".into()));
        }
        sql.push_str(&cols.join(","));

        sql.push('\n');
        sql.push_str(&self.assemble_from(request)?);
        self.push_where(&mut sql, request)?;

        if !request.order_by.is_empty() {
            let orders: Vec<String> = request.order_by.iter().map(|o| o.to_sql()).collect();
            sql.push_str("\nORDER BY ");
            sql.push_str(&orders.join(","));
        }

        if request.lines != 0 || request.offset != 0 {
            sql.push_str(&format!("\nLIMIT {},{}", request.offset, request.lines));
        }

        debug!(statement = %sql, "compiled select");
        Ok(sql)
    }

    /// Compile the row-count statement for `request`'s tables and filter.
    ///
    /// The count lands in column `C`.
    pub fn compile_count(&self, request: &Request) -> JoineryResult<String> {
        request.validate()?;

        let mut sql = String::from("SELECT COUNT(");
        if request.distinct_lines {
            sql.push_str("DISTINCT ");
        }
        sql.push_str("T0.id) AS C\n");
        sql.push_str(&self.assemble_from(request)?);
        self.push_where(&mut sql, request)?;

        debug!(statement = %sql, "compiled count");
        Ok(sql)
    }

    fn push_where(&self, sql: &mut String, request: &Request) -> JoineryResult<()> {
        if !request.conditions.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&self.render_conditions(request, &request.conditions)?);
        }
        Ok(())
    }
}
