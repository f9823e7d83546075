//! Read-only AST traversal
//!
//! Implement [`Visitor`] and override the methods for the nodes you care
//! about; the defaults call the matching `walk_*` function, which visits the
//! children in source order. An override that still wants to descend calls
//! the `walk_*` function itself.

use crate::parser::ast::*;

pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_match_arm(&mut self, arm: &MatchArm) {
        walk_match_arm(self, arm);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        walk_pattern(self, pattern);
    }

    fn visit_type(&mut self, ty: &Type) {
        walk_type(self, ty);
    }

    fn visit_ident(&mut self, _ident: &Ident) {}

    fn visit_literal(&mut self, _literal: &Literal, _location: &SourceLocation) {}
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    for decl in &program.decls {
        visitor.visit_decl(decl);
    }
}

pub fn walk_decl<V: Visitor + ?Sized>(visitor: &mut V, decl: &Decl) {
    match decl {
        Decl::Val {
            pattern, ty, expr, ..
        } => {
            visitor.visit_pattern(pattern);
            if let Some(ty) = ty {
                visitor.visit_type(ty);
            }
            visitor.visit_expr(expr);
        }
        Decl::Fun { name, arms, ty, .. } => {
            visitor.visit_ident(name);
            for arm in arms {
                visitor.visit_match_arm(arm);
            }
            if let Some(ty) = ty {
                visitor.visit_type(ty);
            }
        }
    }
}

pub fn walk_match_arm<V: Visitor + ?Sized>(visitor: &mut V, arm: &MatchArm) {
    visitor.visit_pattern(&arm.pattern);
    visitor.visit_expr(&arm.body);
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Literal(lit, loc) => visitor.visit_literal(lit, loc),
        Expr::Var(ident) => visitor.visit_ident(ident),
        Expr::Unit(_) => {}
        Expr::Paren(inner, _) => visitor.visit_expr(inner),
        Expr::Tuple(elements, _) | Expr::List(elements, _) => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_branch);
            visitor.visit_expr(else_branch);
        }
        Expr::Let { decl, body, .. } => {
            visitor.visit_decl(decl);
            visitor.visit_expr(body);
        }
        Expr::Fn { arms, .. } => {
            for arm in arms {
                visitor.visit_match_arm(arm);
            }
        }
        Expr::BinOp { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::App { callee, arg } => {
            visitor.visit_expr(callee);
            visitor.visit_expr(arg);
        }
    }
}

pub fn walk_pattern<V: Visitor + ?Sized>(visitor: &mut V, pattern: &Pattern) {
    match pattern {
        Pattern::Literal(lit, loc) => visitor.visit_literal(lit, loc),
        Pattern::Wildcard(_) => {}
        Pattern::Var(ident) => visitor.visit_ident(ident),
        Pattern::Tuple(first, second, _) => {
            visitor.visit_pattern(first);
            visitor.visit_pattern(second);
        }
    }
}

pub fn walk_type<V: Visitor + ?Sized>(visitor: &mut V, ty: &Type) {
    match ty {
        Type::Arrow(left, right) | Type::Product(left, right) => {
            visitor.visit_type(left);
            visitor.visit_type(right);
        }
        Type::Int(_) | Type::Char(_) | Type::String(_) | Type::Bool(_) | Type::Var(..) => {}
    }
}

/// Collects the names bound by `val` and `fun` declarations, in source
/// order, including those inside `let`. Names bound by `fn` arms and by the
/// arms of a `fun` are parameters, not declarations, and are skipped.
#[derive(Debug, Default)]
pub struct DeclaredNames {
    names: Vec<Ident>,
}

impl DeclaredNames {
    pub fn collect(program: &Program) -> Vec<Ident> {
        let mut collector = DeclaredNames::default();
        collector.visit_program(program);
        collector.names
    }

    fn bind_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Var(ident) => self.names.push(ident.clone()),
            Pattern::Tuple(first, second, _) => {
                self.bind_pattern(first);
                self.bind_pattern(second);
            }
            Pattern::Literal(..) | Pattern::Wildcard(_) => {}
        }
    }
}

impl Visitor for DeclaredNames {
    fn visit_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Val { pattern, .. } => self.bind_pattern(pattern),
            Decl::Fun { name, .. } => self.names.push(name.clone()),
        }
        walk_decl(self, decl);
    }
}
