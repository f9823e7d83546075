//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, configuration, helper methods, and the parse entry
//! points.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: `val`/`fun` declarations, match arms and patterns
//! - `expressions`: expressions, one method per precedence layer
//! - `types`: type annotations
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! Tokens are pulled from the [`Lexer`] one at a time, so a lexical error is
//! reported only once the parser reaches it.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, LexError, Lexer, Punct, Token, TokenKind};
use crate::parser::macros::trace_production;
use log::debug;
use std::fmt;
use thiserror::Error;

/// Default limit on nested expressions, patterns and types
///
/// One level of parenthesized expression costs six parser frames, so this
/// stays well inside a 2 MiB thread stack in unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parser settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Deepest nesting accepted before failing with
    /// [`SyntaxErrorKind::NestingTooDeep`]
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Grammar productions, as named in syntax errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Production {
    Program,
    Decl,
    Pattern,
    Match,
    Exp,
    Atom,
    Type,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Production::Program => "prog",
            Production::Decl => "dec",
            Production::Pattern => "pat",
            Production::Match => "match",
            Production::Exp => "exp",
            Production::Atom => "atom",
            Production::Type => "typ",
        };
        f.write_str(name)
    }
}

/// A class of token the parser would have accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expected {
    Keyword(Keyword),
    Punct(Punct),
    Identifier,
    TypeVar,
    Literal,
    /// The identifier `bool` in a type annotation
    BoolType,
    Eof,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            Expected::Punct(p) => write!(f, "'{}'", p.as_str()),
            Expected::Identifier => write!(f, "identifier"),
            Expected::TypeVar => write!(f, "type variable"),
            Expected::Literal => write!(f, "literal"),
            Expected::BoolType => write!(f, "'bool'"),
            Expected::Eof => write!(f, "end of file"),
        }
    }
}

/// Ordered, duplicate-free set of [`Expected`] token classes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedSet(Vec<Expected>);

impl ExpectedSet {
    pub fn new(items: impl IntoIterator<Item = Expected>) -> Self {
        let mut items: Vec<Expected> = items.into_iter().collect();
        items.sort();
        items.dedup();
        ExpectedSet(items)
    }

    pub fn contains(&self, expected: Expected) -> bool {
        self.0.binary_search(&expected).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expected> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExpectedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "nothing"),
            [only] => write!(f, "{}", only),
            [first, second] => write!(f, "{} or {}", first, second),
            items => {
                write!(f, "one of ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: ExpectedSet,
        found: TokenKind,
    },
    #[error("expected {expected}, found end of file")]
    UnexpectedEof { expected: ExpectedSet },
    #[error("nesting is deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Syntax error: the offending position, the production being attempted
/// and what went wrong there
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {location} in {production}: {kind}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub production: Production,
    pub location: SourceLocation,
}

impl SyntaxError {
    /// The accepted token classes, if this error is about an unexpected token
    pub fn expected(&self) -> Option<&ExpectedSet> {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { expected, .. }
            | SyntaxErrorKind::UnexpectedEof { expected } => Some(expected),
            SyntaxErrorKind::NestingTooDeep { .. } => None,
        }
    }
}

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Lex(err) => err.location,
            ParseError::Syntax(err) => err.location,
        }
    }
}

pub(crate) const DECLARATION_START: &[Expected] = &[
    Expected::Keyword(Keyword::Val),
    Expected::Keyword(Keyword::Fun),
];

/// Recursive descent parser for TinyML
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub(crate) current: Token,
    /// Token classes tried and rejected at the current token
    tried: Vec<Expected>,
    depth: usize,
    config: ParserConfig,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        Self::with_config(source, ParserConfig::default())
    }

    pub fn with_config(source: &'a str, config: ParserConfig) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = match lexer.next() {
            Some(token) => token?,
            None => Token::new(TokenKind::Eof, SourceLocation::new(0, 1, 1)),
        };
        Ok(Self {
            lexer,
            current,
            tried: Vec::new(),
            depth: 0,
            config,
        })
    }

    /// Parse the entire program: declarations up to end of file
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        trace_production!(self, Production::Program);
        let mut program = Program::new();

        while !self.is_at_end() {
            if !self.can_start_declaration() {
                let expected: Vec<Expected> = DECLARATION_START
                    .iter()
                    .copied()
                    .chain([Expected::Eof])
                    .collect();
                return Err(self.unexpected(Production::Program, &expected));
            }
            let decls = self.parse_declaration_sequence()?;
            program.decls.extend(decls);
        }

        debug!("parsed program with {} declarations", program.decls.len());
        Ok(program)
    }

    /// Parse one expression that must span the rest of the input
    pub fn parse_single_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect_eof(Production::Exp)?;
        Ok(expr)
    }

    /// Parse one pattern that must span the rest of the input
    pub fn parse_single_pattern(&mut self) -> Result<Pattern, ParseError> {
        let pattern = self.parse_pattern()?;
        self.expect_eof(Production::Pattern)?;
        Ok(pattern)
    }

    /// Parse one type annotation that must span the rest of the input
    pub fn parse_single_type(&mut self) -> Result<Type, ParseError> {
        let ty = self.parse_type()?;
        self.expect_eof(Production::Type)?;
        Ok(ty)
    }

    // ===== Helper methods =====

    pub(crate) fn can_start_declaration(&mut self) -> bool {
        self.check_keyword(Keyword::Val) || self.check_keyword(Keyword::Fun)
    }

    /// Count one level of nesting, failing once the configured limit is passed
    pub(crate) fn enter(&mut self, production: Production) -> Result<(), ParseError> {
        if self.depth >= self.config.max_depth {
            return Err(self.too_deep(production));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Check the length of an operator, application or `let` chain.
    ///
    /// A chain of `links` nodes nests the tree that many levels without
    /// nesting the parser, so it is charged against the remaining budget.
    pub(crate) fn check_chain(
        &self,
        links: usize,
        production: Production,
    ) -> Result<(), ParseError> {
        if self.depth + links > self.config.max_depth {
            return Err(self.too_deep(production));
        }
        Ok(())
    }

    fn too_deep(&self, production: Production) -> ParseError {
        SyntaxError {
            kind: SyntaxErrorKind::NestingTooDeep {
                limit: self.config.max_depth,
            },
            production,
            location: self.current_location(),
        }
        .into()
    }

    /// Remember that `expected` would have been accepted here
    pub(crate) fn tried(&mut self, expected: Expected) {
        self.tried.push(expected);
    }

    pub(crate) fn check_punct(&mut self, punct: Punct) -> bool {
        let found = self.current.kind == TokenKind::Punct(punct);
        if !found {
            self.tried(Expected::Punct(punct));
        }
        found
    }

    pub(crate) fn check_keyword(&mut self, keyword: Keyword) -> bool {
        let found = self.current.kind == TokenKind::Keyword(keyword);
        if !found {
            self.tried(Expected::Keyword(keyword));
        }
        found
    }

    pub(crate) fn match_punct(&mut self, punct: Punct) -> Result<bool, ParseError> {
        if self.check_punct(punct) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn match_keyword(&mut self, keyword: Keyword) -> Result<bool, ParseError> {
        if self.check_keyword(keyword) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the current token and pull the next one from the lexer
    pub(crate) fn advance(&mut self) -> Result<Token, ParseError> {
        let next = match self.lexer.next() {
            Some(token) => token?,
            // the lexer is exhausted only after handing out EOF
            None => self.current.clone(),
        };
        self.tried.clear();
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current.is_eof()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.current.location
    }

    /// Build the error for an unexpected current token.
    ///
    /// The reported set also holds every alternative already tried at this
    /// token, e.g. the operators that could have continued an expression.
    pub(crate) fn unexpected(&self, production: Production, expected: &[Expected]) -> ParseError {
        let expected = ExpectedSet::new(self.tried.iter().chain(expected).copied());
        let kind = if self.is_at_end() {
            SyntaxErrorKind::UnexpectedEof { expected }
        } else {
            SyntaxErrorKind::UnexpectedToken {
                expected,
                found: self.current.kind.clone(),
            }
        };
        SyntaxError {
            kind,
            production,
            location: self.current_location(),
        }
        .into()
    }

    pub(crate) fn expect_punct(
        &mut self,
        punct: Punct,
        production: Production,
    ) -> Result<(), ParseError> {
        if self.match_punct(punct)? {
            Ok(())
        } else {
            Err(self.unexpected(production, &[Expected::Punct(punct)]))
        }
    }

    pub(crate) fn expect_keyword(
        &mut self,
        keyword: Keyword,
        production: Production,
    ) -> Result<(), ParseError> {
        if self.match_keyword(keyword)? {
            Ok(())
        } else {
            Err(self.unexpected(production, &[Expected::Keyword(keyword)]))
        }
    }

    pub(crate) fn expect_identifier(&mut self, production: Production) -> Result<Ident, ParseError> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let ident = Ident::new(name.clone(), self.current.location);
            self.advance()?;
            Ok(ident)
        } else {
            Err(self.unexpected(production, &[Expected::Identifier]))
        }
    }

    pub(crate) fn expect_eof(&mut self, production: Production) -> Result<(), ParseError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected(production, &[Expected::Eof]))
        }
    }

    /// Consume the current token if it is a literal
    pub(crate) fn match_literal(&mut self) -> Result<Option<Literal>, ParseError> {
        let literal = match &self.current.kind {
            TokenKind::IntLiteral { value, negated } => Some(Literal::Int {
                value: *value,
                negated: *negated,
            }),
            TokenKind::CharLiteral(c) => Some(Literal::Char(*c)),
            TokenKind::StringLiteral(s) => Some(Literal::String(s.clone())),
            TokenKind::BoolLiteral(b) => Some(Literal::Bool(*b)),
            _ => None,
        };
        let Some(literal) = literal else {
            self.tried(Expected::Literal);
            return Ok(None);
        };
        self.advance()?;
        Ok(Some(literal))
    }
}
