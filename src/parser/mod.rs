//! TinyML source code parser
//!
//! This module transforms TinyML source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser state, errors and entry points (tokens → AST)
//! - [`ast`]: AST node definitions
//! - [`display`]: s-expression rendering of the AST
//! - [`visit`]: read-only traversal of the AST
//!
//! # Supported Syntax
//!
//! - Declarations: `val pat (: typ)? = exp`, `fun f match (: typ)?`, chained with `;`
//! - Expressions: literals, identifiers, `()`, tuples, lists, `if`/`let`/`fn`,
//!   `+ - * /`, comparisons, application by juxtaposition
//! - Patterns: literals, `_`, identifiers, binary tuples
//! - Types: `int`, `char`, `string`, `bool`, `'a`, `*`, `->`
//! - No `case`, `::`, or parenthesized types
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one method per precedence layer.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
pub mod display;
mod expressions;
pub mod lexer;
mod macros;
pub mod parse;
mod types;
pub mod visit;
