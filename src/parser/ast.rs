// AST (Abstract Syntax Tree) definitions for TinyML

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// Byte offset into the source text
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// An identifier together with the place it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub location: SourceLocation,
}

impl Ident {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Ident {
            name: name.into(),
            location,
        }
    }
}

/// Literal values shared by patterns and expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// `42` or `~42`; `value` is the magnitude as written
    Int { value: i64, negated: bool },
    Char(u8),
    String(String),
    Bool(bool),
}

impl Literal {
    /// The signed value of an integer literal.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Int { value, negated } => Some(if *negated { -value } else { *value }),
            _ => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Type annotations
///
/// `*` binds tighter than `->` and both are right-associative, so
/// `int * int -> bool` is `Arrow(Product(int, int), bool)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int(SourceLocation),
    Char(SourceLocation),
    String(SourceLocation),
    Bool(SourceLocation),
    /// `'a`, stored without the leading quote
    Var(String, SourceLocation),
    Arrow(Box<Type>, Box<Type>),
    Product(Box<Type>, Box<Type>),
}

impl Type {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Type::Int(loc) | Type::Char(loc) | Type::String(loc) | Type::Bool(loc) => loc,
            Type::Var(_, loc) => loc,
            Type::Arrow(from, _) => from.location(),
            Type::Product(left, _) => left.location(),
        }
    }
}

/// Patterns on the left of `=>` and after `val`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Literal(Literal, SourceLocation),
    Wildcard(SourceLocation),
    Var(Ident),
    /// `(p, q)`: tuple patterns are always binary
    Tuple(Box<Pattern>, Box<Pattern>, SourceLocation),
}

impl Pattern {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Pattern::Literal(_, loc) => loc,
            Pattern::Wildcard(loc) => loc,
            Pattern::Var(ident) => &ident.location,
            Pattern::Tuple(_, _, loc) => loc,
        }
    }
}

/// One `pattern => expression` clause of a `fn` or `fun`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, SourceLocation),
    Var(Ident),
    /// `()`
    Unit(SourceLocation),
    /// `( e )`
    Paren(Box<Expr>, SourceLocation),
    /// `(e1, e2, ...)` with at least two elements
    Tuple(Vec<Expr>, SourceLocation),
    /// `[e1, ...]`, possibly empty
    List(Vec<Expr>, SourceLocation),
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        location: SourceLocation,
    },
    Let {
        decl: Box<Decl>,
        body: Box<Expr>,
        location: SourceLocation,
    },
    /// `fn p => e | ...`; `arms` is never empty
    Fn {
        arms: Vec<MatchArm>,
        location: SourceLocation,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    App {
        callee: Box<Expr>,
        arg: Box<Expr>,
    },
}

impl Expr {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expr::Literal(_, loc) => loc,
            Expr::Var(ident) => &ident.location,
            Expr::Unit(loc) => loc,
            Expr::Paren(_, loc) => loc,
            Expr::Tuple(_, loc) => loc,
            Expr::List(_, loc) => loc,
            Expr::If { location, .. } => location,
            Expr::Let { location, .. } => location,
            Expr::Fn { location, .. } => location,
            Expr::BinOp { location, .. } => location,
            Expr::App { callee, .. } => callee.location(),
        }
    }
}

/// Declarations introduced by `val` and `fun`
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Val {
        pattern: Pattern,
        ty: Option<Type>,
        expr: Expr,
        location: SourceLocation,
    },
    Fun {
        name: Ident,
        arms: Vec<MatchArm>,
        ty: Option<Type>,
        location: SourceLocation,
    },
}

impl Decl {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Decl::Val { location, .. } => location,
            Decl::Fun { location, .. } => location,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Declarations in source order; `d1; d2` is flattened into this list
    pub decls: Vec<Decl>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
