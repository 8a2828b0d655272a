//! INSERT, UPDATE and DELETE
//!
//! Each statement is checked in full before anything is written, then the
//! table file is replaced in one step.

use tracing::debug;

use crate::catalog::Schema;
use crate::error::{Error, Result};
use crate::executor::predicate::Predicate;
use crate::sql::ast::{DeleteStatement, InsertStatement, UpdateStatement};
use crate::storage::codec;
use crate::storage::{Row, TableFile, Value};

fn check_value(table: &str, schema: &Schema, index: usize, value: &Value) -> Result<()> {
    let column = &schema.columns()[index];
    if !value.compatible_with(&column.data_type) {
        return Err(Error::SchemaMismatch(format!(
            "value {} is not of type {} (column {})",
            value, column.data_type, column.name
        )));
    }
    codec::check_encodable(table, value)
}

/// Append one row. The file is left untouched unless the row is valid.
pub fn insert(table: &TableFile, stmt: InsertStatement) -> Result<Row> {
    let schema = table.read_schema()?;
    if stmt.values.len() != schema.column_count() {
        return Err(Error::SchemaMismatch(format!(
            "table {} has {} columns but {} values were given",
            table.name(),
            schema.column_count(),
            stmt.values.len()
        )));
    }
    for (index, value) in stmt.values.iter().enumerate() {
        check_value(table.name(), &schema, index, value)?;
    }

    let row = Row::new(stmt.values);
    table.append(&row)?;
    debug!(table = %table.name(), "inserted row");
    Ok(row)
}

/// Check that `stmt` could be applied to a table with `schema`. Returns the
/// ordinal of the updated column.
pub fn check_update(table: &str, schema: &Schema, stmt: &UpdateStatement) -> Result<usize> {
    let index = schema.column_map(table).ordinal(&stmt.column)?;
    check_value(table, schema, index, &stmt.value)?;
    Ok(index)
}

/// Overwrite one column in every matching row. Returns the number of rows
/// changed.
pub fn update(table: &TableFile, stmt: &UpdateStatement) -> Result<usize> {
    let mut data = table.read()?;
    let index = check_update(table.name(), &data.schema, stmt)?;
    let predicate = Predicate::compile(
        stmt.where_clause.as_ref(),
        &data.schema.column_map(table.name()),
    )?;

    let mut updated = 0;
    for row in &mut data.rows {
        if predicate.matches(row)? {
            row.set(index, stmt.value.clone());
            updated += 1;
        }
    }

    if updated > 0 {
        table.rewrite(&data.schema, &data.rows)?;
    }
    debug!(table = %table.name(), updated, "updated rows");
    Ok(updated)
}

/// Drop every matching row, keeping the order of the rest. Returns the
/// number of rows removed.
pub fn delete(table: &TableFile, stmt: &DeleteStatement) -> Result<usize> {
    let data = table.read()?;
    let predicate = Predicate::compile(
        stmt.where_clause.as_ref(),
        &data.schema.column_map(table.name()),
    )?;

    let before = data.rows.len();
    let mut kept = Vec::with_capacity(before);
    for row in data.rows {
        if !predicate.matches(&row)? {
            kept.push(row);
        }
    }

    let deleted = before - kept.len();
    if deleted > 0 {
        table.rewrite(&data.schema, &kept)?;
    }
    debug!(table = %table.name(), deleted, "deleted rows");
    Ok(deleted)
}
