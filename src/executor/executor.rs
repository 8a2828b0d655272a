//! Statement executor for PlainDB
//!
//! This module dispatches statements to their executors and returns results.

use serde::Serialize;
use std::fmt;

use tracing::{debug, info, warn};

use super::{ddl, dml, select};
use crate::catalog::Column;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::sql::ast::{Statement, UpdateStatement};
use crate::storage::{Row, TableFile};
use crate::transaction::release_locks;

/// Query result
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    /// Result columns (SELECT only)
    pub columns: Vec<Column>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Number of affected rows (for INSERT/UPDATE/DELETE)
    pub affected_rows: usize,
    /// Message
    pub message: Option<String>,
}

impl QueryResult {
    /// Create a new empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a result with a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Create a result with affected rows count
    pub fn with_affected_rows(count: usize, message: impl Into<String>) -> Self {
        Self {
            affected_rows: count,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Create a result set
    pub fn with_rows(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Whether this result carries a row set rather than just a message
    pub fn has_rows(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// Renders a row set the way a table file stores it: the header line and
/// then one line per row. Other results render as their message.
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_rows() {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", column)?;
            }
            for row in &self.rows {
                write!(f, "\n{}", row)?;
            }
            Ok(())
        } else if let Some(message) = &self.message {
            write!(f, "{}", message)
        } else {
            Ok(())
        }
    }
}

impl Statement {
    /// Run the statement against `session`
    pub fn execute(self, session: &mut Session) -> Result<QueryResult> {
        match self {
            Statement::CreateDatabase(name) => ddl::create_database(session, &name),
            Statement::DropDatabase(name) => ddl::drop_database(session, &name),
            Statement::UseDatabase(name) => ddl::use_database(session, &name),
            Statement::CreateTable(stmt) => ddl::create_table(session, stmt),
            Statement::DropTable(name) => ddl::drop_table(session, &name),
            Statement::AlterTable(stmt) => ddl::alter_table(session, stmt),
            Statement::Insert(stmt) => {
                let table = session.table(&stmt.table_name)?;
                let row = dml::insert(&table, stmt)?;
                Ok(QueryResult::with_affected_rows(
                    1,
                    format!("Inserted {{{}}} into {}", row, table.name()),
                ))
            }
            Statement::Select(stmt) => select::select(session, stmt),
            Statement::Update(stmt) => {
                if session.in_transaction() {
                    return execute_queued_update(session, stmt);
                }
                let table = session.table(&stmt.table_name)?;
                let updated = dml::update(&table, &stmt)?;
                Ok(QueryResult::with_affected_rows(
                    updated,
                    format!("Updated {} rows.", updated),
                ))
            }
            Statement::Delete(stmt) => {
                let table = session.table(&stmt.table_name)?;
                let deleted = dml::delete(&table, &stmt)?;
                Ok(QueryResult::with_affected_rows(
                    deleted,
                    format!("Deleted {} rows.", deleted),
                ))
            }
            Statement::BeginTransaction => execute_begin(session),
            Statement::Commit => execute_commit(session),
            Statement::Comment => Ok(QueryResult::empty()),
        }
    }
}

fn execute_begin(session: &mut Session) -> Result<QueryResult> {
    session.begin()?;
    debug!("transaction started");
    Ok(QueryResult::with_message("Transaction started."))
}

/// Check the update against the table as it is now, lock the table and queue
/// the update for COMMIT. The table itself is not touched.
fn execute_queued_update(session: &mut Session, stmt: UpdateStatement) -> Result<QueryResult> {
    let db_dir = session.db_dir()?;
    let table = session.table(&stmt.table_name)?;
    dml::check_update(table.name(), &table.read_schema()?, &stmt)?;

    let table_name = stmt.table_name.clone();
    let transaction = session
        .transaction_mut()
        .ok_or_else(|| Error::TransactionAbort("no transaction in progress".to_string()))?;
    transaction.queue_update(&db_dir, stmt)?;

    Ok(QueryResult::with_message(format!(
        "Update of {} queued until COMMIT.",
        table_name
    )))
}

/// Apply every queued update in order, then drop the transaction's locks.
///
/// A COMMIT with nothing to apply fails and keeps the transaction as it is.
/// Otherwise the transaction ends here whatever happens: every update is
/// attempted, every lock is released and the first failure is reported.
fn execute_commit(session: &mut Session) -> Result<QueryResult> {
    match session.transaction() {
        None => {
            return Err(Error::TransactionAbort(
                "no transaction in progress".to_string(),
            ))
        }
        Some(transaction) if transaction.is_empty() => {
            return Err(Error::TransactionAbort("nothing to commit".to_string()))
        }
        Some(_) => {}
    }

    let (pending, locks) = match session.take_transaction() {
        Some(transaction) => transaction.into_parts(),
        None => return Err(Error::TransactionAbort("no transaction in progress".to_string())),
    };

    let mut first_error = None;
    let mut updated = 0;
    for update in &pending {
        let table = TableFile::new(&update.db_dir, &update.statement.table_name)
            .sync_writes(session.write_sync());
        match dml::update(&table, &update.statement) {
            Ok(count) => updated += count,
            Err(e) => {
                warn!(table = %update.statement.table_name, error = %e, "queued update failed");
                first_error.get_or_insert(e);
            }
        }
    }
    if let Err(e) = release_locks(&locks) {
        first_error.get_or_insert(e);
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    info!(statements = pending.len(), updated, "transaction committed");
    Ok(QueryResult::with_affected_rows(
        updated,
        "Transaction committed.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(session: &mut Session, sql: &str) -> QueryResult {
        session.execute(sql).unwrap()
    }

    fn shop() -> (TempDir, Session) {
        let root = TempDir::new().unwrap();
        let mut session = Session::new(root.path()).sync_writes(false);
        run(&mut session, "CREATE DATABASE shop;");
        run(&mut session, "USE shop;");
        run(
            &mut session,
            "CREATE TABLE items (name varchar(10), price float);",
        );
        (root, session)
    }

    #[test]
    fn test_insert_and_select() {
        let (_root, mut session) = shop();

        let result = run(&mut session, "INSERT INTO items VALUES('pen', 1.50);");
        assert_eq!(result.affected_rows, 1);
        assert_eq!(
            result.message.as_deref(),
            Some("Inserted {'pen', 1.5} into items")
        );

        let result = run(&mut session, "SELECT * FROM items;");
        assert!(result.has_rows());
        assert_eq!(result.to_string(), "name varchar(10), price float\n'pen', 1.5");
    }

    #[test]
    fn test_update_and_delete_messages() {
        let (_root, mut session) = shop();
        run(&mut session, "INSERT INTO items VALUES('pen', 1.5);");
        run(&mut session, "INSERT INTO items VALUES('ink', 2.5);");

        let result = run(&mut session, "UPDATE items SET price = 3.0 WHERE name = 'ink';");
        assert_eq!(result.to_string(), "Updated 1 rows.");

        let result = run(&mut session, "DELETE FROM items;");
        assert_eq!(result.affected_rows, 2);
        assert_eq!(result.to_string(), "Deleted 2 rows.");
    }

    #[test]
    fn test_comment_is_noop() {
        let (_root, mut session) = shop();
        let result = run(&mut session, "-- nothing to see");
        assert!(!result.has_rows());
        assert_eq!(result.to_string(), "");
    }

    #[test]
    fn test_commit_without_transaction() {
        let (_root, mut session) = shop();
        assert!(matches!(
            session.execute("COMMIT;"),
            Err(Error::TransactionAbort(_))
        ));

        run(&mut session, "BEGIN TRANSACTION;");
        assert!(matches!(
            session.execute("COMMIT;"),
            Err(Error::TransactionAbort(_))
        ));
        assert!(session.in_transaction());
    }

    #[test]
    fn test_queued_update_checks_column() {
        let (root, mut session) = shop();
        run(&mut session, "BEGIN TRANSACTION;");

        assert!(matches!(
            session.execute("UPDATE items SET color = 'red';"),
            Err(Error::ColumnNotFound(_, _))
        ));
        assert!(!root.path().join("shop").join(".items_lock").exists());
    }

    #[test]
    fn test_result_serializes() {
        let result = QueryResult::with_affected_rows(2, "Deleted 2 rows.");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["affected_rows"], 2);
        assert_eq!(json["message"], "Deleted 2 rows.");
    }
}
