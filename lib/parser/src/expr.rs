use std::fmt::{self, Display, Formatter};

use scanner::Token;

use crate::visitor::ExprVisitor;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),
    Grouping(Box<Expr>),
    Unary { operator: Token, right: Box<Expr> },
    Binary { left: Box<Expr>, operator: Token, right: Box<Expr> },
    Logical { left: Box<Expr>, operator: Token, right: Box<Expr> },
    /// `left ? middle : right`. The operator tokens are only kept for diagnostics.
    Ternary {
        left: Box<Expr>,
        left_operator: Token,
        middle: Box<Expr>,
        right_operator: Token,
        right: Box<Expr>,
    },
    Variable(Token),
    Assign { name: Token, value: Box<Expr> },
    Call { callee: Box<Expr>, paren: Token, arguments: Vec<Expr> },
}

impl Expr {
    pub fn accept<R>(&self, visitor: &mut impl ExprVisitor<R>) -> R {
        match self {
            Expr::Literal(value) => visitor.visit_literal(value),
            Expr::Grouping(expression) => visitor.visit_grouping(expression),
            Expr::Unary { operator, right } => visitor.visit_unary(operator, right),
            Expr::Binary { left, operator, right } => visitor.visit_binary(left, operator, right),
            Expr::Logical { left, operator, right } => visitor.visit_logical(left, operator, right),
            Expr::Ternary { left, left_operator, middle, right_operator, right } => {
                visitor.visit_ternary(left, left_operator, middle, right_operator, right)
            }
            Expr::Variable(name) => visitor.visit_variable(name),
            Expr::Assign { name, value } => visitor.visit_assign(name, value),
            Expr::Call { callee, paren, arguments } => visitor.visit_call(callee, paren, arguments),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Str(String),
    Boolean(bool),
    Nil,
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::Str(s) => write!(f, "{}", s),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::Nil => write!(f, "nil"),
        }
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::Str(s.to_string())
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}
