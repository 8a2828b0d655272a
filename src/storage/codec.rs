//! Table file codec
//!
//! A table file is plain text. The first line is the header, a comma
//! separated list of `name type` pairs. Every following line is one row of
//! comma separated literals:
//!
//! ```text
//! name varchar(10), price float
//! 'pen', 1.5
//! 'ink', NULL
//! ```
//!
//! The literal grammar is shared with the statement parser.

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while, take_while1};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, cut, map, map_res, opt, recognize, success, value, verify};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::{Finish, IResult};

use crate::catalog::{Column, DataType, Schema};
use crate::error::{Error, Result};
use crate::storage::{Row, Value};

/// Parse an identifier: letters, digits and `_`
pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parse a type token, `int`, `float`, `char(N)` or `varchar(N)`
pub(crate) fn data_type(input: &str) -> IResult<&str, DataType> {
    map_res(
        pair(
            identifier,
            opt(preceded(
                pair(space0, char('(')),
                cut(terminated(
                    delimited(space0, map_res(digit1, str::parse::<usize>), space0),
                    char(')'),
                )),
            )),
        ),
        |(name, size)| match (DataType::is_sized(name), size) {
            (true, Some(size)) => DataType::new(name, size),
            (false, None) => DataType::new(name, 0),
            (true, None) => Err(Error::UnknownType(format!("{} without a size", name))),
            (false, Some(_)) => Err(Error::UnknownType(format!("{} with a size", name))),
        },
    )(input)
}

/// Digits too many for an f64 would read as infinity, which has no literal
fn float(input: &str) -> IResult<&str, Value> {
    map(
        verify(
            map_res(
                recognize(tuple((opt(char('-')), digit1, char('.'), digit1))),
                str::parse::<f64>,
            ),
            |f: &f64| f.is_finite(),
        ),
        Value::Float,
    )(input)
}

fn int(input: &str) -> IResult<&str, Value> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>().map(Value::Int)
    })(input)
}

fn string(input: &str) -> IResult<&str, Value> {
    map(
        preceded(
            char('\''),
            cut(terminated(take_while(|c: char| c != '\''), char('\''))),
        ),
        |s: &str| Value::String(s.to_string()),
    )(input)
}

/// Parse one literal. Float is tried before Int, otherwise `1.5` would stop
/// after `1` and strand `.5`.
pub(crate) fn literal(input: &str) -> IResult<&str, Value> {
    alt((float, int, string, value(Value::Null, tag_no_case("null"))))(input)
}

/// A row field: a literal, or nothing at all, which reads as NULL
fn field(input: &str) -> IResult<&str, Value> {
    alt((literal, success(Value::Null)))(input)
}

/// `,` with optional blanks around it
pub(crate) fn comma(input: &str) -> IResult<&str, char> {
    delimited(space0, char(','), space0)(input)
}

fn column(input: &str) -> IResult<&str, Column> {
    map(
        tuple((identifier, space1, data_type)),
        |(name, _, data_type)| Column::new(name, data_type),
    )(input)
}

fn describe(err: nom::error::Error<&str>) -> String {
    if err.input.is_empty() {
        format!("unexpected end of line ({:?})", err.code)
    } else {
        let snippet: String = err.input.chars().take(20).collect();
        format!("unexpected input at \"{}\" ({:?})", snippet, err.code)
    }
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Decode a header line into a schema
pub fn decode_header(table: &str, line: &str) -> Result<Schema> {
    let line = trim_line(line);
    let (_, columns) = all_consuming(delimited(
        space0,
        separated_list1(comma, column),
        space0,
    ))(line)
    .finish()
    .map_err(|e| Error::malformed(table, format!("bad header: {}", describe(e))))?;

    let mut schema = Schema::new();
    for column in columns {
        if schema.has_column(&column.name) {
            return Err(Error::malformed(
                table,
                format!("duplicate column '{}' in header", column.name),
            ));
        }
        schema.add_column(column);
    }
    Ok(schema)
}

/// Encode a schema as a header line, including the line terminator
pub fn encode_header(schema: &Schema) -> String {
    format!("{}\n", schema)
}

/// Decode one row line
pub fn decode_row(table: &str, line: &str) -> Result<Row> {
    let line = trim_line(line);
    let (_, values) = all_consuming(delimited(space0, separated_list1(comma, field), space0))(
        line,
    )
    .finish()
    .map_err(|e| Error::malformed(table, format!("bad row: {}", describe(e))))?;
    Ok(Row::new(values))
}

/// Reject values the text format cannot represent
pub fn check_encodable(table: &str, value: &Value) -> Result<()> {
    match value {
        Value::String(s) if s.contains(['\'', '\n', '\r']) => Err(Error::malformed(
            table,
            format!("string {:?} contains a quote or line break", s),
        )),
        Value::Float(f) if !f.is_finite() => Err(Error::malformed(
            table,
            format!("float {} has no literal form", f),
        )),
        _ => Ok(()),
    }
}

/// Encode a row, including the line terminator
pub fn encode_row(table: &str, row: &Row) -> Result<String> {
    for value in row {
        check_encodable(table, value)?;
    }
    Ok(format!("{}\n", row))
}
