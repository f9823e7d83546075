//! S-expression rendering of the AST
//!
//! Every node prints as an unambiguous s-expression, e.g. `1 + 2 * 3` is
//! `(+ 1 (* 2 3))` and `int * int -> bool` is `(-> (* int int) bool)`.
//! Literals and names keep their TinyML spelling. Locations are not printed.

use crate::parser::ast::*;
use core::fmt::{Display, Formatter, Result};

/// Write `items` separated by single spaces, each preceded by one
fn write_spaced<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> Result {
    for item in items {
        write!(f, " {}", item)?;
    }
    Ok(())
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Literal::Int { value, negated } => {
                if *negated {
                    write!(f, "~{}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            Literal::Char(c) => write!(f, "#\"{}\"", *c as char),
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.symbol())
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.name)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Type::Int(_) => write!(f, "int"),
            Type::Char(_) => write!(f, "char"),
            Type::String(_) => write!(f, "string"),
            Type::Bool(_) => write!(f, "bool"),
            Type::Var(name, _) => write!(f, "'{}", name),
            Type::Arrow(from, to) => write!(f, "(-> {} {})", from, to),
            Type::Product(left, right) => write!(f, "(* {} {})", left, right),
        }
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Pattern::Literal(lit, _) => write!(f, "{}", lit),
            Pattern::Wildcard(_) => write!(f, "_"),
            Pattern::Var(ident) => write!(f, "{}", ident),
            Pattern::Tuple(first, second, _) => write!(f, "(tuple {} {})", first, second),
        }
    }
}

impl Display for MatchArm {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "({} => {})", self.pattern, self.body)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Expr::Literal(lit, _) => write!(f, "{}", lit),
            Expr::Var(ident) => write!(f, "{}", ident),
            Expr::Unit(_) => write!(f, "()"),
            Expr::Paren(inner, _) => write!(f, "(paren {})", inner),
            Expr::Tuple(elements, _) => {
                write!(f, "(tuple")?;
                write_spaced(f, elements)?;
                write!(f, ")")
            }
            Expr::List(elements, _) => {
                write!(f, "(list")?;
                write_spaced(f, elements)?;
                write!(f, ")")
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => write!(f, "(if {} {} {})", condition, then_branch, else_branch),
            Expr::Let { decl, body, .. } => write!(f, "(let {} {})", decl, body),
            Expr::Fn { arms, .. } => {
                write!(f, "(fn")?;
                write_spaced(f, arms)?;
                write!(f, ")")
            }
            Expr::BinOp {
                op, left, right, ..
            } => write!(f, "({} {} {})", op, left, right),
            Expr::App { callee, arg } => write!(f, "(app {} {})", callee, arg),
        }
    }
}

impl Display for Decl {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Decl::Val {
                pattern, ty, expr, ..
            } => match ty {
                Some(ty) => write!(f, "(val {} : {} {})", pattern, ty, expr),
                None => write!(f, "(val {} {})", pattern, expr),
            },
            Decl::Fun { name, arms, ty, .. } => {
                write!(f, "(fun {}", name)?;
                write_spaced(f, arms)?;
                if let Some(ty) = ty {
                    write!(f, " : {}", ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for (i, decl) in self.decls.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", decl)?;
        }
        Ok(())
    }
}
