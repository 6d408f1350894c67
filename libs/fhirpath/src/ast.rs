//! Abstract syntax tree for FHIRPath expressions.
//!
//! Nodes mirror the grammar rules directly; no semantic information is
//! attached. The evaluator walks this tree, re-entering argument
//! subtrees for higher-order functions.

use rust_decimal::Decimal;

use crate::temporal::{Date, DateTime, Time};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// The empty collection literal `{}`.
    Empty,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Decimal(Decimal),
    Str(String),
    Date(Date),
    DateTime(DateTime),
    Time(Time),
    Quantity { value: Decimal, unit: Option<String> },

    // Terms
    Identifier(String),
    This,
    IndexVar,
    TotalVar,
    ExternalConstant(String),
    Parenthesized(Box<Expr>),

    /// `base.name`
    Member { base: Box<Expr>, name: String },
    /// `base[index]`
    Indexer { base: Box<Expr>, index: Box<Expr> },
    /// `base.name(args)` or bare `name(args)` against the current input.
    Function {
        base: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },

    /// Unary `+`/`-`.
    Polarity { negate: bool, operand: Box<Expr> },
    Multiplicative {
        op: MulOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Additive {
        op: AddOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `expr is T` / `expr as T`; the specifier is a qualified name.
    TypeOp {
        op: TypeOpKind,
        operand: Box<Expr>,
        specifier: String,
    },
    Union { left: Box<Expr>, right: Box<Expr> },
    Inequality {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Equality {
        op: EqOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Membership {
        op: MembershipOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And { left: Box<Expr>, right: Box<Expr> },
    Or {
        exclusive: bool,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Implies { left: Box<Expr>, right: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulOp {
    Multiply,
    Divide,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    Plus,
    Minus,
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOpKind {
    Is,
    As,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqOp {
    Equal,
    NotEqual,
    Equivalent,
    NotEquivalent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    In,
    Contains,
}
