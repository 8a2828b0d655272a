//! Nested loop equi-join
//!
//! The right table is fully materialized and scanned once per left row.
//! Joined rows are always `left ++ right`; for outer joins the missing side
//! is filled with NULLs.

use tracing::debug;

use crate::catalog::{Column, ColumnMap};
use crate::error::{Error, Result};
use crate::sql::ast::{JoinClause, JoinType};
use crate::storage::{Row, TableData};

/// Output of a join
#[derive(Debug, Clone)]
pub struct JoinedRows {
    /// Left columns followed by right columns
    pub columns: Vec<Column>,
    /// Resolves plain and qualified references into joined rows
    pub column_map: ColumnMap,
    pub rows: Vec<Row>,
}

fn join_ordinal(data: &TableData, column: &str, table: &str) -> Result<usize> {
    data.schema
        .get_column_index(column)
        .ok_or_else(|| Error::ColumnNotFound(column.to_string(), table.to_string()))
}

/// Join `left` and `right` on `join`'s column equality.
///
/// NULL join keys never match.
pub fn nested_loop_join(join: &JoinClause, left: &TableData, right: &TableData) -> Result<JoinedRows> {
    let left_key = join_ordinal(left, &join.left_column, &join.left_table)?;
    let right_key = join_ordinal(right, &join.right_column, &join.right_table)?;
    let left_width = left.schema.column_count();
    let right_width = right.schema.column_count();

    let keys_match = |l: &Row, r: &Row| match (l.get(left_key), r.get(right_key)) {
        (Some(a), Some(b)) => !a.is_null() && a == b,
        _ => false,
    };

    let mut rows = Vec::new();
    match join.join_type {
        JoinType::Inner | JoinType::LeftOuter => {
            for l_row in &left.rows {
                let mut matched = false;
                for r_row in right.rows.iter().filter(|r_row| keys_match(l_row, *r_row)) {
                    rows.push(l_row.concat(r_row));
                    matched = true;
                }
                if !matched && join.join_type == JoinType::LeftOuter {
                    rows.push(l_row.concat(&Row::nulls(right_width)));
                }
            }
        }
        JoinType::RightOuter => {
            for r_row in &right.rows {
                let mut matched = false;
                for l_row in left.rows.iter().filter(|l_row| keys_match(*l_row, r_row)) {
                    rows.push(l_row.concat(r_row));
                    matched = true;
                }
                if !matched {
                    rows.push(Row::nulls(left_width).concat(r_row));
                }
            }
        }
    }

    let mut column_map = ColumnMap::new(format!("{} join {}", join.left_table, join.right_table));
    column_map.extend(
        &left.schema,
        &[join.left_alias.as_str(), join.left_table.as_str()],
        0,
    );
    column_map.extend(
        &right.schema,
        &[join.right_alias.as_str(), join.right_table.as_str()],
        left_width,
    );

    let mut columns = left.schema.columns().to_vec();
    columns.extend_from_slice(right.schema.columns());

    debug!(
        left = %join.left_table,
        right = %join.right_table,
        join_type = ?join.join_type,
        rows = rows.len(),
        "joined tables"
    );
    Ok(JoinedRows {
        columns,
        column_map,
        rows,
    })
}
