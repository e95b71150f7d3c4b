//! One method per node variant. `Expr::accept` and `Stmt::accept` pick the
//! method, the implementor picks what the operation means.

use scanner::Token;

use crate::{Expr, LiteralValue, Stmt};

pub trait ExprVisitor<R> {
    fn visit_literal(&mut self, value: &LiteralValue) -> R;
    fn visit_grouping(&mut self, expression: &Expr) -> R;
    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> R;
    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
    fn visit_ternary(
        &mut self,
        left: &Expr,
        left_operator: &Token,
        middle: &Expr,
        right_operator: &Token,
        right: &Expr,
    ) -> R;
    fn visit_variable(&mut self, name: &Token) -> R;
    fn visit_assign(&mut self, name: &Token, value: &Expr) -> R;
    fn visit_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> R;
}

pub trait StmtVisitor<R> {
    fn visit_expression_stmt(&mut self, expr: &Expr) -> R;
    fn visit_print_stmt(&mut self, expr: &Expr) -> R;
    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> R;
    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> R;
    fn visit_if_stmt(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>)
        -> R;
    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> R;
}
