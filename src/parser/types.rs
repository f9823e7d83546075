//! Type annotation parsing
//!
//! The grammar writes types as `typ -> typ | typ * typ`, which is left
//! recursive and says nothing about precedence. We parse two tiers instead:
//!
//! ```text
//! typ      ::= product ("->" product)*     right-associative
//! product  ::= atomic ("*" atomic)*        right-associative
//! atomic   ::= "int" | "char" | "string" | "bool" | VAR
//! ```
//!
//! so `*` binds tighter than `->`. There is no parenthesized type.

use crate::parser::ast::Type;
use crate::parser::lexer::{Keyword, Punct, TokenKind};
use crate::parser::macros::trace_production;
use crate::parser::parse::{Expected, ParseError, Parser, Production};

const TYPE_START: &[Expected] = &[
    Expected::Keyword(Keyword::Int),
    Expected::Keyword(Keyword::Char),
    Expected::Keyword(Keyword::String),
    Expected::BoolType,
    Expected::TypeVar,
];

impl Parser<'_> {
    /// Parse a full type
    pub(crate) fn parse_type(&mut self) -> Result<Type, ParseError> {
        trace_production!(self, Production::Type);
        self.enter(Production::Type)?;
        let result = self.parse_arrow_type();
        self.leave();
        result
    }

    fn parse_arrow_type(&mut self) -> Result<Type, ParseError> {
        let first = self.parse_product_type()?;
        let mut rest = Vec::new();
        while self.match_punct(Punct::Arrow)? {
            self.check_chain(rest.len() + 1, Production::Type)?;
            rest.push(self.parse_product_type()?);
        }
        Ok(associate_right(first, rest, Type::Arrow))
    }

    fn parse_product_type(&mut self) -> Result<Type, ParseError> {
        let first = self.parse_atomic_type()?;
        let mut rest = Vec::new();
        while self.match_punct(Punct::Star)? {
            self.check_chain(rest.len() + 1, Production::Type)?;
            rest.push(self.parse_atomic_type()?);
        }
        Ok(associate_right(first, rest, Type::Product))
    }

    fn parse_atomic_type(&mut self) -> Result<Type, ParseError> {
        let location = self.current_location();
        let ty = match &self.current.kind {
            TokenKind::Keyword(Keyword::Int) => Type::Int(location),
            TokenKind::Keyword(Keyword::Char) => Type::Char(location),
            TokenKind::Keyword(Keyword::String) => Type::String(location),
            // `bool` is only special here; elsewhere it is an identifier
            TokenKind::Ident(name) if name == "bool" => Type::Bool(location),
            TokenKind::TypeVar(name) => Type::Var(name.clone(), location),
            _ => return Err(self.unexpected(Production::Type, TYPE_START)),
        };
        self.advance()?;
        Ok(ty)
    }
}

/// Fold `first op t1 op ... op tn` into `first op (t1 op (... op tn))`
fn associate_right(
    first: Type,
    mut rest: Vec<Type>,
    combine: fn(Box<Type>, Box<Type>) -> Type,
) -> Type {
    let Some(mut result) = rest.pop() else {
        return first;
    };
    while let Some(left) = rest.pop() {
        result = combine(Box::new(left), Box::new(result));
    }
    combine(Box::new(first), Box::new(result))
}
