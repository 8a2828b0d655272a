//! Statement parser
//!
//! Turns one statement of text into a [`Statement`]. Keywords are case
//! insensitive and identifiers are folded to lower case; string literals keep
//! their case. A trailing `;` is optional.

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case};
use nom::character::complete::{char, multispace0, multispace1, not_line_ending};
use nom::combinator::{all_consuming, map, opt, recognize, value, verify};
use nom::error::ErrorKind;
use nom::multi::{many0_count, separated_list1};
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::{Finish, IResult};

use super::ast::*;
use crate::catalog::Column;
use crate::error::{Error, Result};
use crate::storage::codec::{data_type, identifier, literal};

/// Words that end a FROM clause and so can never be an alias
const RESERVED: &[&str] = &[
    "where", "inner", "left", "right", "outer", "join", "on", "set", "values", "from",
];

/// Statement parser
pub struct Parser<'a> {
    sql: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(sql: &'a str) -> Self {
        Self { sql }
    }

    /// Parse a single statement
    pub fn parse(&self) -> Result<Statement> {
        if all_consuming(blank)(self.sql).is_ok() {
            return Ok(Statement::Comment);
        }

        all_consuming(delimited(
            blank,
            statement,
            tuple((blank, opt(char(';')), blank)),
        ))(self.sql)
        .finish()
        .map(|(_, stmt)| stmt)
        .map_err(|e| {
            if e.input.is_empty() {
                Error::Parse("unexpected end of statement".to_string())
            } else {
                let near: String = e.input.trim_start().chars().take(24).collect();
                Error::Parse(format!("syntax error near \"{}\"", near))
            }
        })
    }
}

/// Parse one statement
pub fn parse_statement(sql: &str) -> Result<Statement> {
    Parser::new(sql).parse()
}

// ========== Tokens ==========

/// Whitespace and `--` line comments
fn blank(input: &str) -> IResult<&str, &str> {
    recognize(many0_count(alt((
        multispace1,
        recognize(pair(tag("--"), not_line_ending)),
    ))))(input)
}

fn tok<'a, O, F>(parser: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(multispace0, parser)
}

/// A keyword that is not the prefix of a longer identifier
fn kw<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    tok(move |input: &'a str| -> IResult<&'a str, &'a str> {
        let (rest, matched) = tag_no_case::<_, _, nom::error::Error<&'a str>>(word)(input)?;
        match rest.chars().next() {
            Some(c) if c.is_alphanumeric() || c == '_' => Err(nom::Err::Error(
                nom::error::Error::new(input, ErrorKind::Tag),
            )),
            _ => Ok((rest, matched)),
        }
    })
}

fn name(input: &str) -> IResult<&str, String> {
    map(tok(identifier), str::to_ascii_lowercase)(input)
}

fn alias(input: &str) -> IResult<&str, String> {
    verify(name, |s: &str| !RESERVED.contains(&s))(input)
}

/// `column` or `qualifier.column`
fn column_ref(input: &str) -> IResult<&str, String> {
    map(
        tok(recognize(pair(identifier, opt(pair(char('.'), identifier))))),
        str::to_ascii_lowercase,
    )(input)
}

fn qualified(input: &str) -> IResult<&str, (String, String)> {
    pair(
        name,
        preceded(char('.'), map(identifier, str::to_ascii_lowercase)),
    )(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    tok(char(','))(input)
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    tok(alt((
        value(CompareOp::NotEq, tag("!=")),
        value(CompareOp::NotEq, tag("<>")),
        value(CompareOp::LtEq, tag("<=")),
        value(CompareOp::GtEq, tag(">=")),
        value(CompareOp::Lt, tag("<")),
        value(CompareOp::Gt, tag(">")),
        value(CompareOp::Eq, tag("=")),
    )))(input)
}

fn where_clause(input: &str) -> IResult<&str, WhereClause> {
    map(
        preceded(kw("where"), tuple((column_ref, compare_op, tok(literal)))),
        |(column, op, value)| WhereClause { column, op, value },
    )(input)
}

// ========== Statements ==========

fn statement(input: &str) -> IResult<&str, Statement> {
    alt((
        create_database,
        create_table,
        drop_database,
        drop_table,
        use_database,
        alter_table,
        insert,
        select,
        update,
        delete,
        begin,
        map(kw("commit"), |_| Statement::Commit),
    ))(input)
}

fn create_database(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(pair(kw("create"), kw("database")), name),
        Statement::CreateDatabase,
    )(input)
}

fn drop_database(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(pair(kw("drop"), kw("database")), name),
        Statement::DropDatabase,
    )(input)
}

fn use_database(input: &str) -> IResult<&str, Statement> {
    map(preceded(kw("use"), name), Statement::UseDatabase)(input)
}

fn column_def(input: &str) -> IResult<&str, Column> {
    map(pair(name, tok(data_type)), |(name, data_type)| {
        Column::new(name, data_type)
    })(input)
}

fn create_table(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            kw("create"),
            kw("table"),
            name,
            delimited(
                tok(char('(')),
                separated_list1(comma, column_def),
                tok(char(')')),
            ),
        )),
        |(_, _, table_name, columns)| {
            Statement::CreateTable(CreateTableStatement {
                table_name,
                columns,
            })
        },
    )(input)
}

fn drop_table(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(pair(kw("drop"), kw("table")), name),
        Statement::DropTable,
    )(input)
}

fn alter_table(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            kw("alter"),
            kw("table"),
            name,
            kw("add"),
            name,
            tok(data_type),
        )),
        |(_, _, table_name, _, column_name, column_type)| {
            Statement::AlterTable(AlterTableStatement {
                table_name,
                column_name,
                column_type,
            })
        },
    )(input)
}

fn insert(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            kw("insert"),
            kw("into"),
            name,
            kw("values"),
            delimited(
                tok(char('(')),
                separated_list1(comma, tok(literal)),
                tok(char(')')),
            ),
        )),
        |(_, _, table_name, _, values)| {
            Statement::Insert(InsertStatement { table_name, values })
        },
    )(input)
}

fn projection(input: &str) -> IResult<&str, Projection> {
    alt((
        value(Projection::All, tok(char('*'))),
        map(separated_list1(comma, column_ref), Projection::Columns),
    ))(input)
}

fn join_type(input: &str) -> IResult<&str, JoinType> {
    alt((
        value(JoinType::Inner, pair(kw("inner"), kw("join"))),
        value(
            JoinType::LeftOuter,
            tuple((kw("left"), opt(kw("outer")), kw("join"))),
        ),
        value(
            JoinType::RightOuter,
            tuple((kw("right"), opt(kw("outer")), kw("join"))),
        ),
        value(JoinType::Inner, kw("join")),
    ))(input)
}

/// The part of a join after the FROM table: its alias, the join type, the
/// other table with its alias and the two sides of the equality
struct JoinTail {
    left_alias: String,
    join_type: JoinType,
    right_table: String,
    right_alias: String,
    condition: ((String, String), (String, String)),
}

fn equality(input: &str) -> IResult<&str, ((String, String), (String, String))> {
    tuple((qualified, preceded(tok(char('=')), qualified)))(input)
}

/// `a x [INNER | LEFT OUTER | RIGHT OUTER] JOIN b y ON x.c = y.d`
fn explicit_join(input: &str) -> IResult<&str, JoinTail> {
    map(
        tuple((alias, join_type, name, alias, preceded(kw("on"), equality))),
        |(left_alias, join_type, right_table, right_alias, condition)| JoinTail {
            left_alias,
            join_type,
            right_table,
            right_alias,
            condition,
        },
    )(input)
}

/// `a x, b y WHERE x.c = y.d`
fn implicit_join(input: &str) -> IResult<&str, JoinTail> {
    map(
        tuple((alias, comma, name, alias, preceded(kw("where"), equality))),
        |(left_alias, _, right_table, right_alias, condition)| JoinTail {
            left_alias,
            join_type: JoinType::Inner,
            right_table,
            right_alias,
            condition,
        },
    )(input)
}

/// Pin each side of the ON equality to its table, whichever way round it was
/// written
fn resolve_join(table_name: &str, tail: JoinTail) -> Option<JoinClause> {
    let ((a_alias, a_column), (b_alias, b_column)) = tail.condition;
    let (left_column, right_column) = if a_alias == tail.left_alias && b_alias == tail.right_alias
    {
        (a_column, b_column)
    } else if a_alias == tail.right_alias && b_alias == tail.left_alias {
        (b_column, a_column)
    } else {
        return None;
    };

    Some(JoinClause {
        join_type: tail.join_type,
        left_table: table_name.to_string(),
        left_alias: tail.left_alias,
        left_column,
        right_table: tail.right_table,
        right_alias: tail.right_alias,
        right_column,
    })
}

fn select(input: &str) -> IResult<&str, Statement> {
    let (input, (_, projection, _, table_name)) =
        tuple((kw("select"), projection, kw("from"), name))(input)?;

    if let Ok((rest, tail)) = alt((explicit_join, implicit_join))(input) {
        let join = resolve_join(&table_name, tail).ok_or_else(|| {
            nom::Err::Failure(nom::error::Error::new(input, ErrorKind::Verify))
        })?;
        let stmt = SelectStatement {
            table_name,
            alias: Some(join.left_alias.clone()),
            projection,
            where_clause: None,
            join: Some(join),
        };
        return Ok((rest, Statement::Select(stmt)));
    }

    let (rest, (alias, where_clause)) = pair(opt(alias), opt(where_clause))(input)?;
    let stmt = SelectStatement {
        table_name,
        alias,
        projection,
        where_clause,
        join: None,
    };
    Ok((rest, Statement::Select(stmt)))
}

fn update(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            kw("update"),
            name,
            kw("set"),
            column_ref,
            tok(char('=')),
            tok(literal),
            opt(where_clause),
        )),
        |(_, table_name, _, column, _, value, where_clause)| {
            Statement::Update(UpdateStatement {
                table_name,
                column,
                value,
                where_clause,
            })
        },
    )(input)
}

fn delete(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((kw("delete"), kw("from"), name, opt(where_clause))),
        |(_, _, table_name, where_clause)| {
            Statement::Delete(DeleteStatement {
                table_name,
                where_clause,
            })
        },
    )(input)
}

fn begin(input: &str) -> IResult<&str, Statement> {
    value(
        Statement::BeginTransaction,
        pair(kw("begin"), opt(kw("transaction"))),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataType;
    use crate::storage::Value;

    fn parse(sql: &str) -> Statement {
        Parser::new(sql).parse().unwrap()
    }

    #[test]
    fn test_parse_database_statements() {
        assert_eq!(
            parse("CREATE DATABASE Shop;"),
            Statement::CreateDatabase("shop".into())
        );
        assert_eq!(parse("drop database shop"), Statement::DropDatabase("shop".into()));
        assert_eq!(parse("use shop ;"), Statement::UseDatabase("shop".into()));
    }

    #[test]
    fn test_parse_create_table() {
        let stmt = parse("CREATE TABLE Items (name VARCHAR(10), price float, code char (3));");
        assert_eq!(
            stmt,
            Statement::CreateTable(CreateTableStatement {
                table_name: "items".into(),
                columns: vec![
                    Column::new("name", DataType::VarChar(10)),
                    Column::new("price", DataType::Float),
                    Column::new("code", DataType::Char(3)),
                ],
            })
        );
    }

    #[test]
    fn test_parse_alter_and_drop() {
        assert_eq!(
            parse("alter table items add stock int"),
            Statement::AlterTable(AlterTableStatement {
                table_name: "items".into(),
                column_name: "stock".into(),
                column_type: DataType::Int,
            })
        );
        assert_eq!(parse("DROP TABLE items;"), Statement::DropTable("items".into()));
    }

    #[test]
    fn test_parse_insert_keeps_string_case() {
        let stmt = parse("INSERT INTO items VALUES('Pen', 1.5, -3, null);");
        assert_eq!(
            stmt,
            Statement::Insert(InsertStatement {
                table_name: "items".into(),
                values: vec![
                    Value::String("Pen".into()),
                    Value::Float(1.5),
                    Value::Int(-3),
                    Value::Null,
                ],
            })
        );
    }

    #[test]
    fn test_parse_select_with_where() {
        let stmt = parse("SELECT name, price FROM items WHERE price >= 2");
        assert_eq!(
            stmt,
            Statement::Select(SelectStatement {
                table_name: "items".into(),
                alias: None,
                projection: Projection::Columns(vec!["name".into(), "price".into()]),
                where_clause: Some(WhereClause::new("price", CompareOp::GtEq, Value::Int(2))),
                join: None,
            })
        );

        let Statement::Select(select) = parse("select * from items i where i.name != 'pen'")
        else {
            panic!("expected SELECT");
        };
        assert_eq!(select.alias.as_deref(), Some("i"));
        assert_eq!(select.projection, Projection::All);
        assert_eq!(
            select.where_clause,
            Some(WhereClause::new(
                "i.name",
                CompareOp::NotEq,
                Value::String("pen".into())
            ))
        );
    }

    #[test]
    fn test_parse_implicit_join() {
        let Statement::Select(select) =
            parse("select * from employee e, sales s where e.id = s.employeeid;")
        else {
            panic!("expected SELECT");
        };
        assert_eq!(select.where_clause, None);
        assert_eq!(
            select.join,
            Some(JoinClause {
                join_type: JoinType::Inner,
                left_table: "employee".into(),
                left_alias: "e".into(),
                left_column: "id".into(),
                right_table: "sales".into(),
                right_alias: "s".into(),
                right_column: "employeeid".into(),
            })
        );
    }

    #[test]
    fn test_parse_explicit_joins() {
        let cases = [
            ("inner join", JoinType::Inner),
            ("join", JoinType::Inner),
            ("left outer join", JoinType::LeftOuter),
            ("LEFT JOIN", JoinType::LeftOuter),
            ("right outer join", JoinType::RightOuter),
        ];
        for (words, expected) in cases {
            let sql = format!("select * from employee e {} sales s on e.id = s.employeeid", words);
            let Statement::Select(select) = parse(&sql) else {
                panic!("expected SELECT");
            };
            let join = select.join.unwrap();
            assert_eq!(join.join_type, expected, "{}", sql);
            assert_eq!(join.left_column, "id");
            assert_eq!(join.right_column, "employeeid");
        }
    }

    #[test]
    fn test_join_condition_written_backwards() {
        let Statement::Select(select) =
            parse("select * from employee e inner join sales s on s.employeeid = e.id")
        else {
            panic!("expected SELECT");
        };
        let join = select.join.unwrap();
        assert_eq!(join.left_column, "id");
        assert_eq!(join.right_column, "employeeid");
    }

    #[test]
    fn test_join_condition_with_unknown_alias() {
        let result = Parser::new("select * from employee e inner join sales s on x.id = s.id").parse();
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_update_delete() {
        assert_eq!(
            parse("UPDATE items SET price = 2.5 WHERE name = 'pen';"),
            Statement::Update(UpdateStatement {
                table_name: "items".into(),
                column: "price".into(),
                value: Value::Float(2.5),
                where_clause: Some(WhereClause::new(
                    "name",
                    CompareOp::Eq,
                    Value::String("pen".into())
                )),
            })
        );
        assert_eq!(
            parse("delete from items"),
            Statement::Delete(DeleteStatement {
                table_name: "items".into(),
                where_clause: None,
            })
        );
    }

    #[test]
    fn test_parse_transactions_and_comments() {
        assert_eq!(parse("BEGIN TRANSACTION;"), Statement::BeginTransaction);
        assert_eq!(parse("begin"), Statement::BeginTransaction);
        assert_eq!(parse("COMMIT;"), Statement::Commit);
        assert_eq!(parse("-- a comment"), Statement::Comment);
        assert_eq!(parse("   "), Statement::Comment);
        assert_eq!(parse("-- one\n  -- two\n"), Statement::Comment);
    }

    #[test]
    fn test_comment_lines_around_statement() {
        let delete_all = Statement::Delete(DeleteStatement {
            table_name: "items".into(),
            where_clause: None,
        });
        assert_eq!(parse("-- note\nDELETE FROM items;"), delete_all);
        assert_eq!(parse("-- a\n-- b\n\n  delete from items"), delete_all);
        assert_eq!(parse("DELETE FROM items; -- all of them"), delete_all);
        assert_eq!(parse("DELETE FROM items -- all\n;"), delete_all);
    }

    #[test]
    fn test_keyword_needs_word_boundary() {
        assert!(Parser::new("usershop").parse().is_err());
        assert_eq!(parse("use users"), Statement::UseDatabase("users".into()));
    }

    #[test]
    fn test_parse_errors() {
        for sql in [
            "SELEKT * FROM items",
            "INSERT INTO items VALUES('unterminated)",
            "CREATE TABLE t (a blob)",
            "CREATE TABLE t (a varchar)",
            "UPDATE items SET price = 1 WHERE",
            "SELECT * FROM items; extra",
        ] {
            assert!(
                matches!(Parser::new(sql).parse(), Err(Error::Parse(_))),
                "{} should not parse",
                sql
            );
        }
    }
}
