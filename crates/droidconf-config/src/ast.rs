//! Syntax tree for descriptor text.

use crate::error::Location;

/// A parsed descriptor: the top-level statements in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `name { ... }` or `name("arg") { ... }`.
    Block {
        name: String,
        args: Vec<Expr>,
        body: Vec<Statement>,
        location: Location,
    },
    /// `a.b = value`.
    Assign {
        target: Vec<String>,
        value: Expr,
        location: Location,
    },
    /// A bare call or infix expression, e.g. `id("x") version "1.0"`.
    Expr(Expr),
    /// `import java.util.Properties`.
    Import {
        path: Vec<String>,
        location: Location,
    },
    /// `val name = value` or `var name = value`.
    Local {
        name: String,
        mutable: bool,
        value: Expr,
        location: Location,
    },
}

impl Statement {
    pub fn location(&self) -> Location {
        match self {
            Statement::Block { location, .. }
            | Statement::Assign { location, .. }
            | Statement::Import { location, .. }
            | Statement::Local { location, .. } => *location,
            Statement::Expr(expr) => expr.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Dotted reference such as `flutter.minSdkVersion`.
    Path(Vec<String>),
    /// `receiver.name(args)`; `receiver` is absent for free calls like `id("x")`.
    Call {
        receiver: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    /// Property read on a non-path receiver, e.g. `file("a").path`.
    Member { receiver: Box<Expr>, name: String },
    /// Kotlin infix call: `lhs op rhs`.
    Infix {
        lhs: Box<Expr>,
        op: String,
        rhs: Box<Expr>,
    },
    /// `receiver[index]`.
    Index { receiver: Box<Expr>, index: Box<Expr> },
    /// Named call argument, `plugin = "x"` in `apply(plugin = "x")`.
    Named { name: String, value: Box<Expr> },
    /// Trailing lambda body, `{ file(it) }` in `x?.let { file(it) }`.
    Lambda(Vec<Statement>),
}

impl Expr {
    pub fn new(kind: ExprKind, location: Location) -> Self {
        Self { kind, location }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&[String]> {
        match &self.kind {
            ExprKind::Path(segments) => Some(segments),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            ExprKind::Str(s) => format!("\"{}\"", s),
            ExprKind::Int(n) => n.to_string(),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Path(segments) => segments.join("."),
            ExprKind::Call { receiver, name, .. } => match receiver {
                Some(receiver) => format!("{}.{}(...)", receiver.describe(), name),
                None => format!("{}(...)", name),
            },
            ExprKind::Member { receiver, name } => format!("{}.{}", receiver.describe(), name),
            ExprKind::Infix { lhs, op, rhs } => {
                format!("{} {} {}", lhs.describe(), op, rhs.describe())
            }
            ExprKind::Index { receiver, index } => {
                format!("{}[{}]", receiver.describe(), index.describe())
            }
            ExprKind::Named { name, value } => format!("{} = {}", name, value.describe()),
            ExprKind::Lambda(_) => "{ ... }".to_string(),
        }
    }
}
