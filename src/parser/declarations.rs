//! Declaration parsing implementation
//!
//! This module handles `val` and `fun` declarations together with the match
//! arms and patterns they contain.
//!
//! # Grammar
//!
//! ```text
//! dec   ::= "val" pat (":" typ)? "=" exp
//!         | "fun" ID match (":" typ)?
//!         | dec ";" dec
//! match ::= pat "=>" exp ("|" pat "=>" exp)*
//! pat   ::= literal | "_" | ID | "(" pat "," pat ")"
//! ```
//!
//! `dec ; dec` chains come back as a flat list in source order.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Punct, TokenKind};
use crate::parser::macros::trace_production;
use crate::parser::parse::{Expected, ParseError, Parser, Production, DECLARATION_START};

const PATTERN_START: &[Expected] = &[
    Expected::Literal,
    Expected::Punct(Punct::Underscore),
    Expected::Identifier,
    Expected::Punct(Punct::LParen),
];

impl Parser<'_> {
    /// Parse `dec (; dec)*` into a flat list
    pub(crate) fn parse_declaration_sequence(&mut self) -> Result<Vec<Decl>, ParseError> {
        let mut decls = vec![self.parse_declaration()?];

        while self.match_punct(Punct::Semicolon)? {
            decls.push(self.parse_declaration()?);
        }

        Ok(decls)
    }

    /// Parse a single `val` or `fun` declaration
    pub(crate) fn parse_declaration(&mut self) -> Result<Decl, ParseError> {
        trace_production!(self, Production::Decl);
        let location = self.current_location();

        if self.match_keyword(Keyword::Val)? {
            let pattern = self.parse_pattern()?;
            let ty = self.parse_type_annotation()?;

            if !self.match_punct(Punct::Eq)? {
                let expected: &[Expected] = if ty.is_some() {
                    &[Expected::Punct(Punct::Eq)]
                } else {
                    &[Expected::Punct(Punct::Colon), Expected::Punct(Punct::Eq)]
                };
                return Err(self.unexpected(Production::Decl, expected));
            }

            let expr = self.parse_expression()?;
            return Ok(Decl::Val {
                pattern,
                ty,
                expr,
                location,
            });
        }

        if self.match_keyword(Keyword::Fun)? {
            let name = self.expect_identifier(Production::Decl)?;
            let arms = self.parse_match()?;
            let ty = self.parse_type_annotation()?;
            return Ok(Decl::Fun {
                name,
                arms,
                ty,
                location,
            });
        }

        Err(self.unexpected(Production::Decl, DECLARATION_START))
    }

    /// Parse an optional `: typ` suffix
    fn parse_type_annotation(&mut self) -> Result<Option<Type>, ParseError> {
        if self.match_punct(Punct::Colon)? {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    /// Parse one or more `pat => exp` arms separated by `|`
    pub(crate) fn parse_match(&mut self) -> Result<Vec<MatchArm>, ParseError> {
        trace_production!(self, Production::Match);
        let mut arms = vec![self.parse_match_arm()?];

        while self.match_punct(Punct::Bar)? {
            arms.push(self.parse_match_arm()?);
        }

        Ok(arms)
    }

    fn parse_match_arm(&mut self) -> Result<MatchArm, ParseError> {
        let pattern = self.parse_pattern()?;
        self.expect_punct(Punct::FatArrow, Production::Match)?;
        let body = self.parse_expression()?;
        Ok(MatchArm { pattern, body })
    }

    /// Parse a pattern
    pub(crate) fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        trace_production!(self, Production::Pattern);
        self.enter(Production::Pattern)?;
        let result = self.parse_pattern_inner();
        self.leave();
        result
    }

    fn parse_pattern_inner(&mut self) -> Result<Pattern, ParseError> {
        let location = self.current_location();

        if let Some(literal) = self.match_literal()? {
            return Ok(Pattern::Literal(literal, location));
        }

        if self.match_punct(Punct::Underscore)? {
            return Ok(Pattern::Wildcard(location));
        }

        if let TokenKind::Ident(_) = self.current.kind {
            let ident = self.expect_identifier(Production::Pattern)?;
            return Ok(Pattern::Var(ident));
        }

        // Tuple patterns take exactly two components
        if self.match_punct(Punct::LParen)? {
            let first = self.parse_pattern()?;
            self.expect_punct(Punct::Comma, Production::Pattern)?;
            let second = self.parse_pattern()?;
            self.expect_punct(Punct::RParen, Production::Pattern)?;
            return Ok(Pattern::Tuple(Box::new(first), Box::new(second), location));
        }

        Err(self.unexpected(Production::Pattern, PATTERN_START))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{Expected, ParseError, Parser, Production, SyntaxErrorKind};
    use crate::parser::lexer::Punct;

    fn program(source: &str) -> Program {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_program().unwrap()
    }

    fn syntax_error(source: &str) -> crate::parser::parse::SyntaxError {
        let mut parser = Parser::new(source).unwrap();
        match parser.parse_program().unwrap_err() {
            ParseError::Syntax(err) => err,
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    fn names(program: &Program) -> Vec<String> {
        program
            .decls
            .iter()
            .map(|decl| match decl {
                Decl::Val { pattern, .. } => pattern.to_string(),
                Decl::Fun { name, .. } => name.name.clone(),
            })
            .collect()
    }

    #[test]
    fn test_parse_fun_declaration() {
        let program = program("fun fact 0 => 1 | n => n * fact (n - 1)");

        assert_eq!(program.decls.len(), 1);
        match &program.decls[0] {
            Decl::Fun { name, arms, ty, .. } => {
                assert_eq!(name.name, "fact");
                assert_eq!(arms.len(), 2);
                assert!(matches!(arms[0].pattern, Pattern::Literal(Literal::Int { value: 0, .. }, _)));
                assert!(matches!(arms[1].pattern, Pattern::Var(ref n) if n.name == "n"));
                assert!(ty.is_none());
            }
            _ => panic!("Expected fun declaration"),
        }
    }

    #[test]
    fn test_parse_fun_with_type() {
        let program = program("fun id x => x : 'a -> 'a");
        match &program.decls[0] {
            Decl::Fun { ty: Some(ty), .. } => assert_eq!(ty.to_string(), "(-> 'a 'a)"),
            _ => panic!("Expected annotated fun declaration"),
        }
    }

    #[test]
    fn test_semicolon_sequence_is_flattened() {
        let program = program("val a = 1; val b = 2; fun c x => x");
        assert_eq!(names(&program), ["a", "b", "c"]);
    }

    #[test]
    fn test_sequence_equals_concatenation() {
        let first = program("val (x, _) = p");
        let second = program("fun f 1 => true | _ => false");
        let both = program("val (x, _) = p ; fun f 1 => true | _ => false");

        let mut concatenated = first.decls.clone();
        concatenated.extend(second.decls.clone());
        assert_eq!(both.decls.len(), concatenated.len());
        for (a, b) in both.decls.iter().zip(&concatenated) {
            assert_eq!(a.to_string(), b.to_string());
        }
    }

    #[test]
    fn test_declarations_without_separator() {
        let program = program("val a = f x\nval b = 2");
        assert_eq!(names(&program), ["a", "b"]);
    }

    #[test]
    fn test_trailing_semicolon_is_rejected() {
        let err = syntax_error("val a = 1;");
        assert_eq!(err.production, Production::Decl);
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedEof { .. }));
    }

    #[test]
    fn test_patterns() {
        let program = program("val (a, (_, ~3)) = t");
        match &program.decls[0] {
            Decl::Val { pattern, .. } => {
                assert_eq!(pattern.to_string(), "(tuple a (tuple _ ~3))");
            }
            _ => panic!("Expected val declaration"),
        }
    }

    #[test]
    fn test_literal_patterns() {
        let program = program(r##"fun f #"a" => 1 | "s" => 2 | true => 3 | _ => 4"##);
        match &program.decls[0] {
            Decl::Fun { arms, .. } => {
                assert!(matches!(arms[0].pattern, Pattern::Literal(Literal::Char(b'a'), _)));
                assert!(matches!(arms[1].pattern, Pattern::Literal(Literal::String(ref s), _) if s == "s"));
                assert!(matches!(arms[2].pattern, Pattern::Literal(Literal::Bool(true), _)));
                assert!(matches!(arms[3].pattern, Pattern::Wildcard(_)));
            }
            _ => panic!("Expected fun declaration"),
        }
    }

    #[test]
    fn test_three_element_tuple_pattern_fails() {
        let err = syntax_error("val (a, b, c) = t");
        assert_eq!(err.production, Production::Pattern);
        assert_eq!(err.location.column, 10);
        match err.kind {
            SyntaxErrorKind::UnexpectedToken { expected, .. } => {
                assert!(expected.contains(Expected::Punct(Punct::RParen)));
            }
            other => panic!("Expected unexpected token, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_single_pattern_fails() {
        let err = syntax_error("val (a) = t");
        assert_eq!(err.production, Production::Pattern);
    }

    #[test]
    fn test_missing_equals() {
        let err = syntax_error("val x 1");
        assert_eq!(err.production, Production::Decl);
        let expected = err.expected().unwrap();
        assert!(expected.contains(Expected::Punct(Punct::Colon)));
        assert!(expected.contains(Expected::Punct(Punct::Eq)));
    }

    #[test]
    fn test_fun_requires_name() {
        let err = syntax_error("fun 1 => 2");
        assert_eq!(err.production, Production::Decl);
        assert!(err.expected().unwrap().contains(Expected::Identifier));
    }

    #[test]
    fn test_match_requires_fat_arrow() {
        let err = syntax_error("fun f x = x");
        assert_eq!(err.production, Production::Match);
        assert!(err.expected().unwrap().contains(Expected::Punct(Punct::FatArrow)));
    }
}
