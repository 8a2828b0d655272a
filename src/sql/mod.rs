//! SQL module
//!
//! Statement AST and the parser that produces it.

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::{parse_statement, Parser};
