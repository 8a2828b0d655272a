use plaindb::transaction::lock;
use plaindb::{Error, Session};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn shop() -> (TempDir, Session, PathBuf) {
    let root = TempDir::new().unwrap();
    let mut session = Session::new(root.path()).sync_writes(false);
    for sql in [
        "CREATE DATABASE shop;",
        "USE shop;",
        "CREATE TABLE items (name varchar(10), price float);",
        "INSERT INTO items VALUES ('pen', 1.5);",
        "INSERT INTO items VALUES ('ink', 2.0);",
    ] {
        session.execute(sql).unwrap();
    }
    let db_dir = root.path().join("shop");
    (root, session, db_dir)
}

#[test]
fn test_transaction_lifecycle() {
    let (_root, mut session, db_dir) = shop();
    let table = db_dir.join("items");
    let lock_file = db_dir.join(".items_lock");
    let before = fs::read(&table).unwrap();

    // BEGIN
    let result = session.execute("BEGIN TRANSACTION;").unwrap();
    assert_eq!(result.message.as_deref(), Some("Transaction started."));
    assert!(session.in_transaction());

    // Updates are queued behind the table lock, the file is untouched
    session
        .execute("UPDATE items SET price = 3.0 WHERE name = 'pen';")
        .unwrap();
    session
        .execute("UPDATE items SET price = 4.0 WHERE name = 'ink';")
        .unwrap();
    assert_eq!(fs::read(&table).unwrap(), before);
    assert_eq!(
        fs::read_to_string(&lock_file).unwrap(),
        std::process::id().to_string()
    );
    assert_eq!(session.transaction().unwrap().pending().len(), 2);

    // Reads are not queued
    let result = session.execute("SELECT * FROM items WHERE price > 1.9;").unwrap();
    assert_eq!(result.rows.len(), 1);

    // COMMIT applies the queue in order and drops the lock
    let result = session.execute("COMMIT;").unwrap();
    assert_eq!(result.message.as_deref(), Some("Transaction committed."));
    assert_eq!(result.affected_rows, 2);
    assert!(!session.in_transaction());
    assert!(!lock_file.exists());
    assert_eq!(
        fs::read_to_string(&table).unwrap(),
        "name varchar(10), price float\n'pen', 3.0\n'ink', 4.0\n"
    );
}

#[test]
fn test_begin_twice() {
    let (_root, mut session, _db_dir) = shop();
    session.execute("BEGIN TRANSACTION;").unwrap();
    assert!(matches!(
        session.execute("BEGIN TRANSACTION;"),
        Err(Error::TransactionInProgress)
    ));
}

#[test]
fn test_empty_commit_keeps_locks() {
    let (_root, mut session, db_dir) = shop();

    assert!(matches!(
        session.execute("COMMIT;"),
        Err(Error::TransactionAbort(_))
    ));

    session.execute("BEGIN TRANSACTION;").unwrap();
    // a lock taken outside the queue stays where it is
    let held = lock::acquire(&db_dir, "items").unwrap();
    assert!(matches!(
        session.execute("COMMIT;"),
        Err(Error::TransactionAbort(_))
    ));
    assert!(session.in_transaction());
    assert!(held.exists());
}

#[test]
fn test_lock_conflict_with_other_process() {
    let (_root, mut session, db_dir) = shop();
    let lock_file = db_dir.join(".items_lock");
    let other = std::process::id().wrapping_add(1).to_string();
    fs::write(&lock_file, &other).unwrap();

    session.execute("BEGIN TRANSACTION;").unwrap();
    match session.execute("UPDATE items SET price = 9.0;") {
        Err(Error::LockConflict { table, pid }) => {
            assert_eq!(table, "items");
            assert_eq!(pid, other);
        }
        other => panic!("expected lock conflict, got {:?}", other),
    }

    assert_eq!(fs::read_to_string(&lock_file).unwrap(), other);
    assert!(session.transaction().unwrap().is_empty());
}

#[test]
fn test_failed_update_still_releases_locks() {
    let (_root, mut session, db_dir) = shop();
    session.execute("CREATE TABLE orders (item varchar(10), qty int);").unwrap();

    session.execute("BEGIN TRANSACTION;").unwrap();
    session.execute("UPDATE items SET price = 5.0;").unwrap();
    session.execute("UPDATE orders SET qty = 2;").unwrap();

    // break the first table behind the transaction's back
    fs::write(db_dir.join("items"), "name varchar(10), price float\n'pen\n").unwrap();

    assert!(matches!(
        session.execute("COMMIT;"),
        Err(Error::MalformedData { .. })
    ));
    assert!(!session.in_transaction());
    assert!(!db_dir.join(".items_lock").exists());
    assert!(!db_dir.join(".orders_lock").exists());
}

#[test]
fn test_statements_outside_updates_run_immediately() {
    let (_root, mut session, db_dir) = shop();
    session.execute("BEGIN TRANSACTION;").unwrap();

    session.execute("INSERT INTO items VALUES ('cap', 0.5);").unwrap();
    session.execute("DELETE FROM items WHERE name = 'ink';").unwrap();

    assert_eq!(
        fs::read_to_string(db_dir.join("items")).unwrap(),
        "name varchar(10), price float\n'pen', 1.5\n'cap', 0.5\n"
    );
}

#[test]
fn test_commit_applies_updates_in_order() {
    let (_root, mut session, db_dir) = shop();
    session.execute("BEGIN TRANSACTION;").unwrap();

    // both touch the same row, the later one has to win
    session
        .execute("UPDATE items SET price = 3.0 WHERE name = 'pen';")
        .unwrap();
    session
        .execute("UPDATE items SET price = 4.0 WHERE name = 'pen';")
        .unwrap();
    assert_eq!(session.transaction().unwrap().pending().len(), 2);

    let result = session.execute("COMMIT;").unwrap();
    assert_eq!(result.affected_rows, 2);
    assert_eq!(
        fs::read_to_string(db_dir.join("items")).unwrap(),
        "name varchar(10), price float\n'pen', 4.0\n'ink', 2.0\n"
    );
}
