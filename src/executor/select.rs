//! SELECT execution: read, join, filter, project

use tracing::debug;

use super::join::nested_loop_join;
use super::predicate::Predicate;
use super::QueryResult;
use crate::catalog::ColumnMap;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::sql::ast::{Projection, SelectStatement};

pub fn select(session: &Session, stmt: SelectStatement) -> Result<QueryResult> {
    if stmt.join.is_some() && stmt.where_clause.is_some() {
        return Err(Error::Unsupported(
            "WHERE cannot be combined with a join".to_string(),
        ));
    }
    let left = session.table(&stmt.table_name)?.read()?;

    let (columns, column_map, rows) = match &stmt.join {
        Some(join) => {
            let right = session.table(&join.right_table)?.read()?;
            let joined = nested_loop_join(join, &left, &right)?;
            (joined.columns, joined.column_map, joined.rows)
        }
        None => {
            let mut qualifiers = vec![stmt.table_name.as_str()];
            if let Some(alias) = &stmt.alias {
                qualifiers.push(alias.as_str());
            }
            let mut column_map = ColumnMap::new(stmt.table_name.as_str());
            column_map.extend(&left.schema, &qualifiers, 0);
            (left.schema.columns().to_vec(), column_map, left.rows)
        }
    };

    let predicate = Predicate::compile(stmt.where_clause.as_ref(), &column_map)?;
    let ordinals = match &stmt.projection {
        Projection::All => (0..columns.len()).collect::<Vec<_>>(),
        Projection::Columns(names) => names
            .iter()
            .map(|name| column_map.ordinal(name))
            .collect::<Result<Vec<_>>>()?,
    };

    let mut selected = Vec::new();
    for row in &rows {
        if predicate.matches(row)? {
            selected.push(row.project(&ordinals));
        }
    }

    debug!(table = %stmt.table_name, scanned = rows.len(), selected = selected.len(), "select");
    let columns = ordinals.iter().map(|&i| columns[i].clone()).collect();
    Ok(QueryResult::with_rows(columns, selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::{CompareOp, JoinClause, JoinType, WhereClause};
    use crate::storage::Value;
    use tempfile::TempDir;

    fn shop() -> (TempDir, Session) {
        let root = TempDir::new().unwrap();
        let shop = root.path().join("shop");
        std::fs::create_dir(&shop).unwrap();
        std::fs::write(
            shop.join("items"),
            "name varchar(10), price float, stock int\n'pen', 1.5, 10\n'ink', 2.0, NULL\n'cap', 0.5, 3\n",
        )
        .unwrap();

        let mut session = Session::new(root.path());
        session.set_current_database(Some("shop".into()));
        (root, session)
    }

    fn select_items(projection: Projection, where_clause: Option<WhereClause>) -> SelectStatement {
        SelectStatement {
            table_name: "items".into(),
            alias: Some("i".into()),
            projection,
            where_clause,
            join: None,
        }
    }

    #[test]
    fn test_select_all() {
        let (_root, session) = shop();
        let result = select(&session, select_items(Projection::All, None)).unwrap();

        assert_eq!(result.columns.len(), 3);
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[1].to_string(), "'ink', 2.0, NULL");
    }

    #[test]
    fn test_select_projects_and_filters() {
        let (_root, session) = shop();
        let stmt = select_items(
            Projection::Columns(vec!["stock".into(), "i.name".into()]),
            Some(WhereClause::new("items.price", CompareOp::LtEq, Value::Float(1.5))),
        );
        let result = select(&session, stmt).unwrap();

        let names: Vec<_> = result.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["stock", "name"]);
        assert_eq!(
            result.rows.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
            vec!["10, 'pen'", "3, 'cap'"]
        );
    }

    #[test]
    fn test_select_unknown_column() {
        let (_root, session) = shop();
        let stmt = select_items(Projection::Columns(vec!["color".into()]), None);
        assert!(matches!(
            select(&session, stmt),
            Err(Error::ColumnNotFound(column, _)) if column == "color"
        ));
    }

    #[test]
    fn test_select_missing_table() {
        let (_root, session) = shop();
        let mut stmt = select_items(Projection::All, None);
        stmt.table_name = "ghost".into();
        assert!(matches!(select(&session, stmt), Err(Error::TableNotFound(_))));
    }

    #[test]
    fn test_join_with_where_is_unsupported() {
        let (_root, session) = shop();
        let mut stmt = select_items(
            Projection::All,
            Some(WhereClause::new("price", CompareOp::Gt, Value::Float(1.0))),
        );
        stmt.join = Some(JoinClause {
            join_type: JoinType::Inner,
            left_table: "items".into(),
            left_alias: "i".into(),
            left_column: "name".into(),
            right_table: "items".into(),
            right_alias: "j".into(),
            right_column: "name".into(),
        });
        assert!(matches!(select(&session, stmt), Err(Error::Unsupported(_))));
    }
}
