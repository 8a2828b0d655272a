//! Database and table definition statements

use std::collections::HashSet;

use tracing::info;

use super::QueryResult;
use crate::catalog::{Column, DataType, Schema};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::sql::ast::{AlterTableStatement, CreateTableStatement};
use crate::storage::Value;

pub fn create_database(session: &mut Session, name: &str) -> Result<QueryResult> {
    session.databases().create(name)?;
    info!(database = name, "created database");
    Ok(QueryResult::with_message(format!("Database {} created.", name)))
}

/// Remove a database and everything in it. Dropping the current database
/// leaves the session with none selected.
pub fn drop_database(session: &mut Session, name: &str) -> Result<QueryResult> {
    session.databases().drop_database(name)?;
    if session.current_database() == Some(name) {
        session.set_current_database(None);
    }
    info!(database = name, "dropped database");
    Ok(QueryResult::with_message(format!("Database {} deleted.", name)))
}

pub fn use_database(session: &mut Session, name: &str) -> Result<QueryResult> {
    session.databases().open(name)?;
    session.set_current_database(Some(name.to_string()));
    Ok(QueryResult::with_message(format!("Using database {}.", name)))
}

fn check_declared_type(table: &str, column: &Column) -> Result<()> {
    if column.data_type == DataType::Null {
        return Err(Error::SchemaMismatch(format!(
            "column {} of table {} cannot be declared NULL",
            column.name, table
        )));
    }
    Ok(())
}

pub fn create_table(session: &mut Session, stmt: CreateTableStatement) -> Result<QueryResult> {
    let table = session.table(&stmt.table_name)?;

    if stmt.columns.is_empty() {
        return Err(Error::SchemaMismatch(format!(
            "table {} needs at least one column",
            stmt.table_name
        )));
    }
    let mut seen = HashSet::new();
    for column in &stmt.columns {
        check_declared_type(&stmt.table_name, column)?;
        if !seen.insert(column.name.as_str()) {
            return Err(Error::SchemaMismatch(format!(
                "column {} appears twice in table {}",
                column.name, stmt.table_name
            )));
        }
    }

    table.create(&Schema::from_columns(stmt.columns))?;
    info!(table = %stmt.table_name, "created table");
    Ok(QueryResult::with_message(format!(
        "Table {} created.",
        stmt.table_name
    )))
}

pub fn drop_table(session: &mut Session, name: &str) -> Result<QueryResult> {
    session.table(name)?.drop_file()?;
    info!(table = name, "dropped table");
    Ok(QueryResult::with_message(format!("Deleted table {}.", name)))
}

/// Append a column to the header. Existing rows get NULL in the new column.
pub fn alter_table(session: &mut Session, stmt: AlterTableStatement) -> Result<QueryResult> {
    let table = session.table(&stmt.table_name)?;
    let mut data = table.read()?;

    if data.schema.has_column(&stmt.column_name) {
        return Err(Error::ColumnAlreadyExists(
            stmt.column_name,
            stmt.table_name,
        ));
    }
    let column = Column::new(stmt.column_name, stmt.column_type);
    check_declared_type(&stmt.table_name, &column)?;

    let message = format!(
        "Table {} modified, added column {}.",
        stmt.table_name, column.name
    );
    data.schema.add_column(column);
    for row in &mut data.rows {
        row.push(Value::Null);
    }
    table.rewrite(&data.schema, &data.rows)?;

    info!(table = %stmt.table_name, rows = data.rows.len(), "altered table");
    Ok(QueryResult::with_message(message))
}
