//! WHERE clause evaluation

use std::cmp::Ordering;

use crate::catalog::ColumnMap;
use crate::error::Result;
use crate::sql::ast::{CompareOp, WhereClause};
use crate::storage::{Row, Value};

/// A WHERE clause with its column already resolved to an ordinal
#[derive(Debug, Clone)]
pub struct Predicate {
    test: Option<(usize, CompareOp, Value)>,
}

impl Predicate {
    /// Resolve the clause's column against `columns`. No clause means every
    /// row matches.
    pub fn compile(clause: Option<&WhereClause>, columns: &ColumnMap) -> Result<Self> {
        let test = match clause {
            Some(clause) => Some((
                columns.ordinal(&clause.column)?,
                clause.op,
                clause.value.clone(),
            )),
            None => None,
        };
        Ok(Self { test })
    }

    pub fn matches(&self, row: &Row) -> Result<bool> {
        match &self.test {
            Some((ordinal, op, literal)) => {
                let value = row.get(*ordinal).unwrap_or(&Value::Null);
                compare(value, *op, literal)
            }
            None => Ok(true),
        }
    }
}

/// Whether `row` satisfies `clause`
pub fn where_applies(clause: Option<&WhereClause>, columns: &ColumnMap, row: &Row) -> Result<bool> {
    Predicate::compile(clause, columns)?.matches(row)
}

/// Apply `op` to two values. Equality is structural; ordering needs two
/// numbers.
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool> {
    let matched = match op {
        CompareOp::Eq => left == right,
        CompareOp::NotEq => left != right,
        CompareOp::Lt => left.compare(right)? == Ordering::Less,
        CompareOp::LtEq => left.compare(right)? != Ordering::Greater,
        CompareOp::Gt => left.compare(right)? == Ordering::Greater,
        CompareOp::GtEq => left.compare(right)? != Ordering::Less,
    };
    Ok(matched)
}
