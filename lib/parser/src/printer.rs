use itertools::Itertools;
use scanner::Token;

use crate::{
    visitor::{ExprVisitor, StmtVisitor},
    Expr, LiteralValue, Stmt,
};

/// Renders syntax trees in a fully parenthesized prefix notation, e.g.
/// `(+ 1 (group (* 2 3)))`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_expr(&mut self, expr: &Expr) -> String {
        expr.accept(self)
    }

    pub fn print_stmt(&mut self, stmt: &Stmt) -> String {
        stmt.accept(self)
    }

    fn parenthesize<'e>(&mut self, name: &str, exprs: impl IntoIterator<Item = &'e Expr>) -> String {
        let parts = exprs.into_iter().map(|e| self.print_expr(e)).collect_vec();
        if parts.is_empty() {
            format!("({name})")
        } else {
            format!("({name} {})", parts.join(" "))
        }
    }
}

impl ExprVisitor<String> for AstPrinter {
    fn visit_literal(&mut self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::Str(s) => format!("{s:?}"),
            _ => value.to_string(),
        }
    }

    fn visit_grouping(&mut self, expression: &Expr) -> String {
        self.parenthesize("group", [expression])
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> String {
        self.parenthesize(operator.lexeme(), [right])
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(operator.lexeme(), [left, right])
    }

    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(operator.lexeme(), [left, right])
    }

    fn visit_ternary(
        &mut self,
        left: &Expr,
        left_operator: &Token,
        middle: &Expr,
        right_operator: &Token,
        right: &Expr,
    ) -> String {
        let name = format!("{}{}", left_operator.lexeme(), right_operator.lexeme());
        self.parenthesize(&name, [left, middle, right])
    }

    fn visit_variable(&mut self, name: &Token) -> String {
        name.lexeme().to_string()
    }

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> String {
        format!("(assign {} {})", name.lexeme(), self.print_expr(value))
    }

    fn visit_call(&mut self, callee: &Expr, _paren: &Token, arguments: &[Expr]) -> String {
        self.parenthesize("call", std::iter::once(callee).chain(arguments))
    }
}

impl StmtVisitor<String> for AstPrinter {
    fn visit_expression_stmt(&mut self, expr: &Expr) -> String {
        self.parenthesize(";", [expr])
    }

    fn visit_print_stmt(&mut self, expr: &Expr) -> String {
        self.parenthesize("print", [expr])
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> String {
        match initializer {
            Some(init) => format!("(var {} = {})", name.lexeme(), self.print_expr(init)),
            None => format!("(var {})", name.lexeme()),
        }
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> String {
        let body: String = statements.iter().map(|s| self.print_stmt(s)).collect();
        format!("{{block {body}}}")
    }

    fn visit_if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> String {
        let condition = self.print_expr(condition);
        let then_branch = self.print_stmt(then_branch);
        match else_branch {
            Some(else_branch) => {
                format!("(if-else {condition} {then_branch} {})", self.print_stmt(else_branch))
            }
            None => format!("(if {condition} {then_branch})"),
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> String {
        format!("(while {} {})", self.print_expr(condition), self.print_stmt(body))
    }
}
