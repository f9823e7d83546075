//! # Introduction
//!
//! `tinyml` turns the source text of TinyML, a small ML-family language, into
//! an abstract syntax tree. It is a front end only: nothing here evaluates or
//! type checks a program.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST
//! ```
//!
//! 1. [`parser::lexer`]: lazily turns text into tokens, skipping whitespace
//!    and `(* ... *)` comments.
//! 2. [`parser::parse`]: recursive descent over the token stream, failing
//!    fast with a [`ParseError`] that carries the position, the production
//!    being parsed and the tokens that would have been accepted.
//! 3. [`parser::ast`]: the tree, which owns all of its children.
//!
//! ## Example
//!
//! ```
//! let program = tinyml::parse("val id : 'a -> 'a = fn x => x").unwrap();
//! assert_eq!(program.to_string(), "(val id : (-> 'a 'a) (fn (x => x)))");
//! ```

pub mod parser;

pub use parser::ast::{Decl, Expr, Pattern, Program, Type};
pub use parser::parse::{ParseError, Parser, ParserConfig};

/// Parse a whole program.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source)?.parse_program()
}

/// Parse a single expression spanning all of `source`.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    Parser::new(source)?.parse_single_expression()
}

/// Parse a single pattern spanning all of `source`.
pub fn parse_pattern(source: &str) -> Result<Pattern, ParseError> {
    Parser::new(source)?.parse_single_pattern()
}

/// Parse a single type annotation spanning all of `source`.
pub fn parse_type(source: &str) -> Result<Type, ParseError> {
    Parser::new(source)?.parse_single_type()
}
