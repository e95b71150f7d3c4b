mod expr;
mod printer;
mod stmt;
pub mod visitor;

use errors::{LoxError, LoxErrors};
pub use expr::{Expr, LiteralValue};
pub use printer::AstPrinter;
use scanner::{Literal, Scanner, Token, TokenKind};
pub use stmt::Stmt;
pub use visitor::{ExprVisitor, StmtVisitor};

use errors::Result;

use TokenKind::*;

const MAX_ARGUMENTS: usize = 255;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ParserErrorType {
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect ')' after expression.")]
    MissingRightParen,
    #[error("Expect ';' after value.")]
    ExpectedSemicolonAfterValue,
    #[error("Expect ';' after expression.")]
    ExpectedSemicolonAfterExpression,
    #[error("Expect ';' after variable declaration.")]
    ExpectedSemicolonAfterVariable,
    #[error("Expect variable name.")]
    ExpectedVariableName,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("Expect '}}' after block.")]
    ExpectedRightBrace,
    #[error("Expect '(' after '{0}'.")]
    MissingLeftParenAfter(&'static str),
    #[error("Expect ')' after {0}.")]
    MissingRightParenAfter(&'static str),
    #[error("Expect ';' after loop condition.")]
    ExpectedSemicolonAfterCondition,
    #[error("Expect ':' after then branch of conditional expression.")]
    ExpectedColon,
    #[error("Can't have more than 255 arguments.")]
    TooManyArguments,
}

impl ParserErrorType {
    fn at(self, token: &Token) -> LoxError {
        LoxError::at_token(token, self.to_string())
    }
}

/// Scans and parses `source` into a program.
pub fn parse(source: &str) -> std::result::Result<Vec<Stmt>, LoxErrors> {
    let tokens = Scanner::new(source).scan_tokens()?;
    Parser::new(tokens).parse()
}

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    // Errors that don't require resynchronizing the parser.
    errors: Vec<LoxError>,
}

impl Parser {
    /// `tokens` is expected to end with an `EOF` token, as produced by the scanner.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(Eof) {
            let line = tokens.last().map_or(1, |t| t.line().0);
            tokens.push(Token::new(Eof, "", line));
        }
        Self { tokens, current: 0, errors: Vec::new() }
    }

    pub fn parse(mut self) -> std::result::Result<Vec<Stmt>, LoxErrors> {
        let mut errors = LoxErrors::default();
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            let result = self.declaration();
            errors.append(&mut self.errors);
            match result {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    log::trace!("Hit error: {:?}, syncing...", e);
                    errors.push(e);
                    self.synchronize();
                }
            }
        }

        if errors.is_empty() {
            Ok(stmts)
        } else {
            Err(errors)
        }
    }

    fn declaration(&mut self) -> Result<Stmt> {
        if self.consume(Var).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume_or_error(Identifier, ParserErrorType::ExpectedVariableName)?;

        let initializer = match self.consume(Equal) {
            Some(_) => Some(self.expression()?),
            None => None,
        };

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterVariable)?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.consume(Print).is_some() {
            return self.print_statement();
        }

        if self.consume(LeftBrace).is_some() {
            return Ok(Stmt::Block(self.block()?));
        }

        if self.consume(If).is_some() {
            return self.if_statement();
        }

        if self.consume(While).is_some() {
            return self.while_statement();
        }

        if self.consume(For).is_some() {
            return self.for_statement();
        }

        self.expression_statement()
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume_or_error(LeftParen, ParserErrorType::MissingLeftParenAfter("for"))?;

        let initializer = if self.consume(Semicolon).is_some() {
            None
        } else if self.consume(Var).is_some() {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(Semicolon) {
            Expr::Literal(LiteralValue::Boolean(true))
        } else {
            self.expression()?
        };
        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterCondition)?;

        let increment = if self.check(RightParen) { None } else { Some(self.expression()?) };
        self.consume_or_error(RightParen, ParserErrorType::MissingRightParenAfter("for clauses"))?;

        let body = self.statement()?;

        let while_stmt = Stmt::While {
            condition,
            body: Box::new(Stmt::Block(
                [Some(body), increment.map(Stmt::Expression)].into_iter().flatten().collect(),
            )),
        };

        Ok(Stmt::Block([initializer, Some(while_stmt)].into_iter().flatten().collect()))
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume_or_error(LeftParen, ParserErrorType::MissingLeftParenAfter("while"))?;
        let condition = self.expression()?;
        self.consume_or_error(RightParen, ParserErrorType::MissingRightParenAfter("condition"))?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume_or_error(LeftParen, ParserErrorType::MissingLeftParenAfter("if"))?;
        let condition = self.expression()?;
        self.consume_or_error(RightParen, ParserErrorType::MissingRightParenAfter("if condition"))?;

        let then_branch = Box::new(self.statement()?);

        let else_branch = match self.consume(Else) {
            Some(_) => Some(Box::new(self.statement()?)),
            None => None,
        };

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();

        while !self.check(RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }

        self.consume_or_error(RightBrace, ParserErrorType::ExpectedRightBrace)?;
        Ok(stmts)
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value = self.expression()?;

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterValue)?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let value = self.expression()?;

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterExpression)?;

        Ok(Stmt::Expression(value))
    }

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.conditional()?;

        if let Some(equal) = self.consume(Equal) {
            let value = Box::new(self.assignment()?);

            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign { name, value });
            }

            // Reported, but the parser is still in a sane state.
            self.errors.push(ParserErrorType::InvalidAssignmentTarget.at(&equal));
        }

        Ok(expr)
    }

    fn conditional(&mut self) -> Result<Expr> {
        let expr = self.or()?;

        if let Some(left_operator) = self.consume(Question) {
            let middle = Box::new(self.expression()?);
            let right_operator = self.consume_or_error(Colon, ParserErrorType::ExpectedColon)?;
            let right = Box::new(self.conditional()?);
            return Ok(Expr::Ternary {
                left: Box::new(expr),
                left_operator,
                middle,
                right_operator,
                right,
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr = self.and()?;

        while let Some(operator) = self.consume(Or) {
            let right = Box::new(self.and()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while let Some(operator) = self.consume(And) {
            let right = Box::new(self.equality()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;

        while let Some(operator) = self.consume_any(&[BangEqual, EqualEqual]) {
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.term()?;

        while let Some(operator) = self.consume_any(&[Greater, GreaterEqual, Less, LessEqual]) {
            let right = Box::new(self.term()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.consume_any(&[Plus, Minus]) {
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;

        while let Some(operator) = self.consume_any(&[Star, Slash]) {
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(operator) = self.consume_any(&[Minus, Bang]) {
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        while self.consume(LeftParen).is_some() {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments = Vec::new();

        if !self.check(RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    let error = ParserErrorType::TooManyArguments.at(self.peek());
                    self.errors.push(error);
                }
                arguments.push(self.expression()?);

                if self.consume(Comma).is_none() {
                    break;
                }
            }
        }

        let paren =
            self.consume_or_error(RightParen, ParserErrorType::MissingRightParenAfter("arguments"))?;

        Ok(Expr::Call { callee: Box::new(callee), paren, arguments })
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        let expr = match token.kind {
            False => Expr::Literal(LiteralValue::Boolean(false)),
            True => Expr::Literal(LiteralValue::Boolean(true)),
            Nil => Expr::Literal(LiteralValue::Nil),
            Number | Str => match &token.literal {
                Some(Literal::Number(n)) => Expr::Literal(LiteralValue::Number(*n)),
                Some(Literal::Str(s)) => Expr::Literal(LiteralValue::Str(s.clone())),
                None => return Err(ParserErrorType::ExpectedExpression.at(&token)),
            },
            LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume_or_error(RightParen, ParserErrorType::MissingRightParen)?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            Identifier => Expr::Variable(token),
            _ => return Err(ParserErrorType::ExpectedExpression.at(&token)),
        };
        self.advance();
        Ok(expr)
    }

    fn consume(&mut self, kind: TokenKind) -> Option<Token> {
        self.check(kind).then(|| self.advance())
    }

    fn consume_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        kinds.iter().find_map(|kind| self.consume(*kind))
    }

    fn consume_or_error(&mut self, kind: TokenKind, error_type: ParserErrorType) -> Result<Token> {
        match self.consume(kind) {
            Some(token) => Ok(token),
            None => Err(error_type.at(self.peek())),
        }
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == Semicolon {
                return;
            }

            match self.peek().kind {
                Class | Fun | Var | For | If | While | Print | Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

// Helpers
impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == Eof
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use scanner::Line;

    use super::*;

    fn print_program(source: &str) -> Vec<String> {
        parse(source).unwrap().iter().map(|s| AstPrinter.print_stmt(s)).collect()
    }

    fn error_messages(source: &str) -> Vec<String> {
        parse(source).unwrap_err().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn precedence() {
        assert_eq!(print_program("1 + 2 * 3 - -4;"), vec!["(; (- (+ 1 (* 2 3)) (- 4)))"]);
        assert_eq!(print_program("!(1 < 2) == false;"), vec!["(; (== (! (group (< 1 2))) false))"]);
    }

    #[test]
    fn logical_and_assignment() {
        assert_eq!(
            print_program("a = b or c and d;"),
            vec!["(; (assign a (or b (and c d))))"]
        );
    }

    #[test]
    fn ternary_is_right_associative() {
        assert_eq!(print_program("a ? 1 : b ? 2 : 3;"), vec!["(; (?: a 1 (?: b 2 3)))"]);
    }

    #[test]
    fn calls() {
        assert_eq!(print_program("f(1, \"two\")(g);"), vec![r#"(; (call (call f 1 "two") g))"#]);
        assert_eq!(print_program("clock();"), vec!["(; (call clock))"]);
        assert_ne!(print_program("print x;"), print_program("print \"x\";"));
        assert_ne!(print_program("print 1;"), print_program("print \"1\";"));
    }

    #[test]
    fn statements() {
        assert_eq!(
            print_program("var x; var y = 1; { print y; } if (x) print 1; else print 2; while (y) y = nil;"),
            vec![
                "(var x)",
                "(var y = 1)",
                "{block (print y)}",
                "(if-else x (print 1) (print 2))",
                "(while y (; (assign y nil)))",
            ]
        );
    }

    #[test]
    fn for_is_desugared_into_while() {
        assert_eq!(
            print_program("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["{block (var i = 0)(while (< i 3) {block (print i)(; (assign i (+ i 1)))})}"]
        );
        assert_eq!(print_program("for (;;) print 1;"), vec!["{block (while true {block (print 1)})}"]);
    }

    #[test]
    fn scan_errors_are_reported() {
        assert_eq!(
            error_messages("var @ = 3;\nprint $<4;"),
            vec!["[line 1] Error: Unexpected character.", "[line 2] Error: Unexpected character."]
        );
    }

    #[test]
    fn print_without_semicolon() {
        assert_eq!(error_messages("print 1"), vec!["[line 1] Error at end: Expect ';' after value."]);
    }

    #[test]
    fn missing_expression() {
        assert_eq!(error_messages("print ;"), vec!["[line 1] Error at ';': Expect expression."]);
    }

    #[test]
    fn synchronize_after_error() {
        let errors = parse("var a = 1 var b = 2;\nvar c = 3").unwrap_err();
        assert_eq!(
            errors,
            LoxErrors(vec![
                LoxError {
                    line: Line(1),
                    location: " at 'var'".to_string(),
                    message: ParserErrorType::ExpectedSemicolonAfterVariable.to_string(),
                },
                LoxError {
                    line: Line(2),
                    location: " at end".to_string(),
                    message: ParserErrorType::ExpectedSemicolonAfterVariable.to_string(),
                },
            ])
        );
    }

    #[test]
    fn invalid_assignment_target_does_not_unwind() {
        assert_eq!(
            error_messages("1 + a = 3;\nprint 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn unterminated_block() {
        assert_eq!(error_messages("{ print 1;"), vec!["[line 1] Error at end: Expect '}' after block."]);
    }

    #[test]
    fn missing_colon_in_ternary() {
        assert_eq!(
            error_messages("true ? 1;"),
            vec!["[line 1] Error at ';': Expect ':' after then branch of conditional expression."]
        );
    }
}
