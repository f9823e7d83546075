//! Expression parsing implementation
//!
//! This module handles TinyML expressions with one method per precedence
//! layer, loosest first:
//!
//! ```text
//! exp     ::= "if" exp "then" exp "else" exp      (if_exp)
//!           | "let" dec "in" exp "end"            (let_exp)
//!           | "fn" match                          (fn_exp)
//!           | cmp_exp
//! cmp_exp ::= add_exp (("=" | "<" | "<=" | ">" | ">=") add_exp)*
//! add_exp ::= mul_exp (("+" | "-") mul_exp)*
//! mul_exp ::= app_exp (("*" | "/") app_exp)*
//! app_exp ::= atom atom*
//! atom    ::= literal | ID | "(" ")" | "(" exp ")" | "(" exp ("," exp)+ ")"
//!           | "[" "]" | "[" exp ("," exp)* "]"
//! ```
//!
//! A keyword form is only tried when the current token is exactly its
//! keyword, so `if`/`let`/`fn` never appear as an operand of an operator or
//! of application without parentheses. All binary layers are
//! left-associative.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Punct, TokenKind};
use crate::parser::macros::trace_production;
use crate::parser::parse::{Expected, ParseError, Parser, Production};

const EXPRESSION_START: &[Expected] = &[
    Expected::Keyword(Keyword::If),
    Expected::Keyword(Keyword::Let),
    Expected::Keyword(Keyword::Fn),
    Expected::Literal,
    Expected::Identifier,
    Expected::Punct(Punct::LParen),
    Expected::Punct(Punct::LBracket),
];

const ATOM_START: &[Expected] = &[
    Expected::Literal,
    Expected::Identifier,
    Expected::Punct(Punct::LParen),
    Expected::Punct(Punct::LBracket),
];

impl Parser<'_> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        trace_production!(self, Production::Exp);
        if !self.can_start_expression() {
            return Err(self.unexpected(Production::Exp, EXPRESSION_START));
        }

        // keyword forms skip the operator layers
        self.enter(Production::Exp)?;
        let result = match self.current.kind {
            TokenKind::Keyword(Keyword::If) => self.parse_if_expression(),
            TokenKind::Keyword(Keyword::Let) => self.parse_let_expression(),
            TokenKind::Keyword(Keyword::Fn) => self.parse_fn_expression(),
            _ => self.parse_comparison(),
        };
        self.leave();
        result
    }

    fn can_start_expression(&mut self) -> bool {
        self.check_keyword(Keyword::If)
            || self.check_keyword(Keyword::Let)
            || self.check_keyword(Keyword::Fn)
            || self.can_start_atom()
    }

    fn can_start_atom(&mut self) -> bool {
        let found = matches!(
            self.current.kind,
            TokenKind::IntLiteral { .. }
                | TokenKind::CharLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::BoolLiteral(_)
                | TokenKind::Ident(_)
                | TokenKind::Punct(Punct::LParen)
                | TokenKind::Punct(Punct::LBracket)
        );
        if !found {
            for expected in ATOM_START {
                self.tried(*expected);
            }
        }
        found
    }

    /// Parse `if exp then exp else exp`; the current token is `if`
    fn parse_if_expression(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        self.advance()?;

        let condition = Box::new(self.parse_expression()?);
        self.expect_keyword(Keyword::Then, Production::Exp)?;
        let then_branch = Box::new(self.parse_expression()?);
        self.expect_keyword(Keyword::Else, Production::Exp)?;
        let else_branch = Box::new(self.parse_expression()?);

        Ok(Expr::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    /// Parse `let dec in exp end`
    ///
    /// `let d1; d2 in e end` becomes `Let(d1, Let(d2, e))`.
    fn parse_let_expression(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        self.advance()?;

        let decls = self.parse_declaration_sequence()?;
        self.check_chain(decls.len() - 1, Production::Exp)?;
        if !self.match_keyword(Keyword::In)? {
            let expected = [
                Expected::Keyword(Keyword::In),
                Expected::Punct(Punct::Semicolon),
            ];
            return Err(self.unexpected(Production::Exp, &expected));
        }
        let body = self.parse_expression()?;
        self.expect_keyword(Keyword::End, Production::Exp)?;

        Ok(decls
            .into_iter()
            .rev()
            .fold(body, |body, decl| Expr::Let {
                decl: Box::new(decl),
                body: Box::new(body),
                location,
            }))
    }

    /// Parse `fn match`; the current token is `fn`
    fn parse_fn_expression(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        self.advance()?;

        let arms = self.parse_match()?;
        Ok(Expr::Fn { arms, location })
    }

    /// Parse comparison (= < <= > >=)
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        let mut links = 0;

        loop {
            let location = self.current_location();
            let op = match self.current.kind {
                TokenKind::Punct(Punct::Eq) => BinOp::Eq,
                TokenKind::Punct(Punct::Lt) => BinOp::Lt,
                TokenKind::Punct(Punct::Le) => BinOp::Le,
                TokenKind::Punct(Punct::Gt) => BinOp::Gt,
                TokenKind::Punct(Punct::Ge) => BinOp::Ge,
                _ => {
                    for punct in [Punct::Eq, Punct::Lt, Punct::Le, Punct::Gt, Punct::Ge] {
                        self.tried(Expected::Punct(punct));
                    }
                    break;
                }
            };
            links += 1;
            self.check_chain(links, Production::Exp)?;
            self.advance()?;

            let right = Box::new(self.parse_additive()?);
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        let mut links = 0;

        loop {
            let location = self.current_location();
            let op = if self.match_punct(Punct::Plus)? {
                BinOp::Add
            } else if self.match_punct(Punct::Minus)? {
                BinOp::Sub
            } else {
                break;
            };
            links += 1;
            self.check_chain(links, Production::Exp)?;

            let right = Box::new(self.parse_multiplicative()?);
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse multiplicative (* /)
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_application()?;
        let mut links = 0;

        loop {
            let location = self.current_location();
            let op = if self.match_punct(Punct::Star)? {
                BinOp::Mul
            } else if self.match_punct(Punct::Slash)? {
                BinOp::Div
            } else {
                break;
            };
            links += 1;
            self.check_chain(links, Production::Exp)?;

            let right = Box::new(self.parse_application()?);
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse application by juxtaposition: `f a b` is `(f a) b`
    fn parse_application(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        let mut links = 0;

        while self.can_start_atom() {
            links += 1;
            self.check_chain(links, Production::Exp)?;
            let arg = self.parse_atom()?;
            expr = Expr::App {
                callee: Box::new(expr),
                arg: Box::new(arg),
            };
        }

        Ok(expr)
    }

    /// Parse atom (literals, identifiers, parenthesized groups, lists)
    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        trace_production!(self, Production::Atom);
        let location = self.current_location();

        if let Some(literal) = self.match_literal()? {
            return Ok(Expr::Literal(literal, location));
        }

        if let TokenKind::Ident(_) = self.current.kind {
            let ident = self.expect_identifier(Production::Atom)?;
            return Ok(Expr::Var(ident));
        }

        if self.match_punct(Punct::LParen)? {
            if self.match_punct(Punct::RParen)? {
                return Ok(Expr::Unit(location));
            }

            let first = self.parse_expression()?;
            if self.match_punct(Punct::RParen)? {
                return Ok(Expr::Paren(Box::new(first), location));
            }
            if !self.check_punct(Punct::Comma) {
                let expected = [Expected::Punct(Punct::Comma), Expected::Punct(Punct::RParen)];
                return Err(self.unexpected(Production::Atom, &expected));
            }

            let mut elements = vec![first];
            while self.match_punct(Punct::Comma)? {
                elements.push(self.parse_expression()?);
            }
            self.close_group(Punct::RParen)?;
            return Ok(Expr::Tuple(elements, location));
        }

        if self.match_punct(Punct::LBracket)? {
            let mut elements = Vec::new();
            if !self.match_punct(Punct::RBracket)? {
                elements.push(self.parse_expression()?);
                while self.match_punct(Punct::Comma)? {
                    elements.push(self.parse_expression()?);
                }
                self.close_group(Punct::RBracket)?;
            }
            return Ok(Expr::List(elements, location));
        }

        Err(self.unexpected(Production::Atom, ATOM_START))
    }

    /// Expect the closing bracket of a comma-separated group
    fn close_group(&mut self, close: Punct) -> Result<(), ParseError> {
        if self.match_punct(close)? {
            Ok(())
        } else {
            let expected = [Expected::Punct(Punct::Comma), Expected::Punct(close)];
            Err(self.unexpected(Production::Atom, &expected))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseError, Parser, Production, SyntaxErrorKind};

    fn expr(source: &str) -> Expr {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_single_expression().unwrap()
    }

    fn sexp(source: &str) -> String {
        expr(source).to_string()
    }

    fn syntax_error(source: &str) -> crate::parser::parse::SyntaxError {
        let mut parser = Parser::new(source).unwrap();
        match parser.parse_single_expression().unwrap_err() {
            ParseError::Syntax(err) => err,
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_application_is_left_associative() {
        let e = expr("f a b c");
        match e {
            Expr::App { callee, arg } => {
                assert!(matches!(*arg, Expr::Var(ref v) if v.name == "c"));
                match *callee {
                    Expr::App { callee, arg } => {
                        assert!(matches!(*arg, Expr::Var(ref v) if v.name == "b"));
                        assert!(matches!(*callee, Expr::App { .. }));
                    }
                    other => panic!("Expected application, got {:?}", other),
                }
            }
            other => panic!("Expected application, got {:?}", other),
        }
        assert_eq!(sexp("f a b c"), "(app (app (app f a) b) c)");
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(sexp("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(sexp("1 * 2 + 3"), "(+ (* 1 2) 3)");
        assert_eq!(sexp("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(sexp("8 / 4 / 2"), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn test_application_binds_tighter_than_operators() {
        assert_eq!(sexp("f x * g y + 1"), "(+ (* (app f x) (app g y)) 1)");
    }

    #[test]
    fn test_comparison_is_loosest_operator() {
        assert_eq!(sexp("n + 1 <= f m"), "(<= (+ n 1) (app f m))");
        assert_eq!(sexp("a = b"), "(= a b)");
    }

    #[test]
    fn test_negative_literals() {
        assert!(matches!(
            expr("~42"),
            Expr::Literal(Literal::Int { value: 42, negated: true }, _)
        ));
        assert!(matches!(
            expr("42"),
            Expr::Literal(Literal::Int { value: 42, negated: false }, _)
        ));
        assert_eq!(sexp("x - ~1"), "(- x ~1)");
    }

    #[test]
    fn test_unit_paren_and_tuples() {
        assert!(matches!(expr("()"), Expr::Unit(_)));
        assert!(matches!(expr("(x)"), Expr::Paren(_, _)));
        match expr("(1,2,3)") {
            Expr::Tuple(elements, _) => assert_eq!(elements.len(), 3),
            other => panic!("Expected tuple, got {:?}", other),
        }
        assert_eq!(sexp("(a, b, c)"), "(tuple a b c)");
    }

    #[test]
    fn test_lists() {
        assert_eq!(sexp("[]"), "(list)");
        assert_eq!(sexp("[1, f x, [2]]"), "(list 1 (app f x) (list 2))");
    }

    #[test]
    fn test_if_expression() {
        assert_eq!(
            sexp("if x < 1 then 0 else x * 2"),
            "(if (< x 1) 0 (* x 2))"
        );
    }

    #[test]
    fn test_keyword_forms_extend_to_the_right() {
        assert_eq!(
            sexp("if c then 1 else fn x => x + 1"),
            "(if c 1 (fn (x => (+ x 1))))"
        );
    }

    #[test]
    fn test_if_is_not_an_operand() {
        let err = syntax_error("1 + if c then 2 else 3");
        assert_eq!(err.production, Production::Atom);
    }

    #[test]
    fn test_parenthesized_if_is_an_operand() {
        assert_eq!(
            sexp("1 + (if c then 2 else 3)"),
            "(+ 1 (paren (if c 2 3)))"
        );
    }

    #[test]
    fn test_let_expression() {
        assert_eq!(
            sexp("let val x = 1 in x + 1 end"),
            "(let (val x 1) (+ x 1))"
        );
    }

    #[test]
    fn test_let_with_declaration_sequence() {
        assert_eq!(
            sexp("let val x = 1; fun f y => y in f x end"),
            "(let (val x 1) (let (fun f (y => y)) (app f x)))"
        );
    }

    #[test]
    fn test_let_requires_end() {
        let err = syntax_error("let val x = 1 in x");
        assert_eq!(err.production, Production::Exp);
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedEof { .. }));
    }

    #[test]
    fn test_fn_arms_in_order() {
        match expr("fn x => x | y => y") {
            Expr::Fn { arms, .. } => {
                assert_eq!(arms.len(), 2);
                assert!(matches!(arms[0].pattern, Pattern::Var(ref v) if v.name == "x"));
                assert!(matches!(arms[1].pattern, Pattern::Var(ref v) if v.name == "y"));
            }
            other => panic!("Expected fn, got {:?}", other),
        }
    }

    #[test]
    fn test_case_is_plain_application() {
        assert_eq!(
            sexp("case xs of NIL"),
            "(app (app (app case xs) of) NIL)"
        );
    }

    #[test]
    fn test_unclosed_tuple() {
        let err = syntax_error("(1, 2");
        assert_eq!(err.production, Production::Atom);
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedEof { .. }));
    }

    #[test]
    fn test_missing_expression() {
        let err = syntax_error("");
        assert_eq!(err.production, Production::Exp);
    }

    #[test]
    fn test_locations() {
        let e = expr("f\n  (x + 1)");
        match e {
            Expr::App { arg, .. } => {
                assert_eq!(arg.location(), &SourceLocation::new(4, 2, 3));
                match *arg {
                    Expr::Paren(inner, _) => {
                        assert_eq!(inner.location(), &SourceLocation::new(7, 2, 6));
                    }
                    other => panic!("Expected paren, got {:?}", other),
                }
            }
            other => panic!("Expected application, got {:?}", other),
        }
    }
}
