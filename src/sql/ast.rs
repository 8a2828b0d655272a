//! Statement AST
//!
//! This module defines the statements the engine executes. They are produced
//! by [`crate::sql::Parser`] but can be built directly as well; the executors
//! re-check every semantic constraint either way.

use std::fmt;

use crate::catalog::{Column, DataType};
use crate::storage::Value;

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE DATABASE
    CreateDatabase(String),
    /// DROP DATABASE
    DropDatabase(String),
    /// USE
    UseDatabase(String),
    /// CREATE TABLE
    CreateTable(CreateTableStatement),
    /// DROP TABLE
    DropTable(String),
    /// ALTER TABLE ... ADD
    AlterTable(AlterTableStatement),
    /// INSERT INTO ... VALUES
    Insert(InsertStatement),
    /// SELECT
    Select(SelectStatement),
    /// UPDATE
    Update(UpdateStatement),
    /// DELETE FROM
    Delete(DeleteStatement),
    /// BEGIN TRANSACTION
    BeginTransaction,
    /// COMMIT
    Commit,
    /// `--` comment or blank input
    Comment,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub columns: Vec<Column>,
}

/// ALTER TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub table_name: String,
    pub column_name: String,
    pub column_type: DataType,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table_name: String,
    /// One value per column, in header order
    pub values: Vec<Value>,
}

/// What a SELECT returns
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`
    All,
    /// Named columns, possibly qualified (`alias.column`)
    Columns(Vec<String>),
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table_name: String,
    /// Alias of the FROM table
    pub alias: Option<String>,
    pub projection: Projection,
    pub where_clause: Option<WhereClause>,
    pub join: Option<JoinClause>,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table_name: String,
    pub column: String,
    pub value: Value,
    pub where_clause: Option<WhereClause>,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table_name: String,
    pub where_clause: Option<WhereClause>,
}

/// Comparison operator of a WHERE clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(op)
    }
}

/// `WHERE column op literal`
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

impl WhereClause {
    pub fn new(column: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }
}

/// Type of JOIN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
}

/// Equi-join between the FROM table and one other table
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub left_table: String,
    pub left_alias: String,
    pub left_column: String,
    pub right_table: String,
    pub right_alias: String,
    pub right_column: String,
}
