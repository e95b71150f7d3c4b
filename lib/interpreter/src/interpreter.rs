use std::{io::Write, rc::Rc};

use errors::LoxErrors;
use parser::{AstPrinter, Expr, ExprVisitor, LiteralValue, Stmt, StmtVisitor};
use scanner::{Line, Token, TokenKind};

mod callable;
pub use callable::{Callable, NativeFunction};

mod value;
pub use value::Value;

mod environment;
pub use environment::Environment;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: Line },
    #[error("{details}")]
    TypeMismatch { operator: String, line: Line, details: &'static str },
    #[error("Can only call functions and classes.")]
    NotInvokable { line: Line },
    #[error("Expected {expected} arguments but got {actual}.")]
    ArityMismatch { expected: usize, actual: usize, line: Line },
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn line(&self) -> Option<Line> {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::TypeMismatch { line, .. }
            | RuntimeError::NotInvokable { line }
            | RuntimeError::ArityMismatch { line, .. } => Some(*line),
            RuntimeError::Output(_) => None,
        }
    }

    pub(crate) fn undefined_variable(name: &Token) -> Self {
        RuntimeError::UndefinedVariable { name: name.lexeme().to_string(), line: name.line() }
    }

    fn type_mismatch(operator: &Token, details: &'static str) -> Self {
        RuntimeError::TypeMismatch {
            operator: operator.lexeme().to_string(),
            line: operator.line(),
            details,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("{0}")]
    CompileError(#[from] LoxErrors),
    #[error("{0}")]
    RuntimeError(#[from] RuntimeError),
}

type Result<T> = std::result::Result<T, RuntimeError>;

/// Tree-walking evaluator. `print` statements write to the injected `output`.
pub struct Interpreter<'o> {
    globals: Environment,
    environment: Environment,
    output: Box<dyn Write + 'o>,
}

impl<'o> Interpreter<'o> {
    pub fn new(output: impl Write + 'o) -> Self {
        let globals = Environment::new();
        globals.define("clock", Value::Callable(Rc::new(NativeFunction::clock())));

        Self { environment: globals.clone(), globals, output: Box::new(output) }
    }

    /// The outermost scope. Bindings made at the top level of a program live
    /// here and survive across calls to [`Interpreter::interpret`].
    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn define_native(
        &mut self,
        name: &str,
        arity: usize,
        function: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) {
        log::debug!("Defining native function {name}/{arity}");
        let native = NativeFunction::new(name, arity, function);
        self.globals.define(name, Value::Callable(Rc::new(native)));
    }

    pub fn run_source(&mut self, source: &str) -> std::result::Result<(), InterpretError> {
        let stmts = parser::parse(source)?;
        self.interpret(&stmts)?;
        Ok(())
    }

    /// Runs a whole program in the global scope, stopping at the first error.
    pub fn interpret(&mut self, stmts: &[Stmt]) -> Result<()> {
        let globals = self.globals.clone();
        self.execute_block(stmts, globals)
    }

    pub fn execute(&mut self, stmt: &Stmt, environment: &Environment) -> Result<()> {
        self.with_environment(environment.clone(), |this| this.exec(stmt))
    }

    pub fn evaluate(&mut self, expr: &Expr, environment: &Environment) -> Result<Value> {
        self.with_environment(environment.clone(), |this| this.eval(expr))
    }

    /// Executes `stmts` with `environment` as the innermost scope. The previous
    /// scope is restored afterwards, also when a statement fails.
    pub fn execute_block(&mut self, stmts: &[Stmt], environment: Environment) -> Result<()> {
        self.with_environment(environment, |this| stmts.iter().try_for_each(|s| this.exec(s)))
    }

    fn with_environment<T>(
        &mut self,
        environment: Environment,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = f(self);
        self.environment = previous;
        result
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<()> {
        log::trace!("Executing {}", AstPrinter.print_stmt(stmt));
        stmt.accept(self)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        expr.accept(self)
    }
}

impl StmtVisitor<Result<()>> for Interpreter<'_> {
    fn visit_expression_stmt(&mut self, expr: &Expr) -> Result<()> {
        self.eval(expr)?;
        Ok(())
    }

    fn visit_print_stmt(&mut self, expr: &Expr) -> Result<()> {
        let value = self.eval(expr)?;
        writeln!(self.output, "{}", value)?;
        Ok(())
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> Result<()> {
        let value = match initializer {
            Some(init) => self.eval(init)?,
            None => Value::Nil,
        };
        self.environment.define(name.lexeme(), value);
        Ok(())
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> Result<()> {
        let scope = Environment::new_enclosed(&self.environment);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Entering scope at depth {}", scope.depth());
        }
        self.execute_block(statements, scope)
    }

    fn visit_if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<()> {
        if self.eval(condition)?.is_truthy() {
            self.exec(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.exec(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> Result<()> {
        while self.eval(condition)?.is_truthy() {
            self.exec(body)?;
        }
        Ok(())
    }
}

impl ExprVisitor<Result<Value>> for Interpreter<'_> {
    fn visit_literal(&mut self, value: &LiteralValue) -> Result<Value> {
        Ok(value.into())
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Value> {
        self.eval(expression)
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right = self.eval(right)?;
        match (operator.kind, right) {
            (TokenKind::Minus, Value::Number(n)) => Ok((-n).into()),
            (TokenKind::Minus, _) => {
                Err(RuntimeError::type_mismatch(operator, "Operand must be a number."))
            }
            (TokenKind::Bang, v) => Ok((!v.is_truthy()).into()),
            _ => Err(RuntimeError::type_mismatch(operator, "Unknown unary operator.")),
        }
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        use TokenKind::*;

        let left = self.eval(left)?;
        let right = self.eval(right)?;
        match (&left, &right, operator.kind) {
            (Value::Number(l), Value::Number(r), Minus) => Ok((l - r).into()),
            (Value::Number(l), Value::Number(r), Slash) => Ok((l / r).into()),
            (Value::Number(l), Value::Number(r), Star) => Ok((l * r).into()),
            (Value::Number(l), Value::Number(r), Plus) => Ok((l + r).into()),
            (Value::Str(l), Value::Str(r), Plus) => Ok(format!("{l}{r}").into()),

            (Value::Number(l), Value::Number(r), Greater) => Ok((l > r).into()),
            (Value::Number(l), Value::Number(r), GreaterEqual) => Ok((l >= r).into()),
            (Value::Number(l), Value::Number(r), Less) => Ok((l < r).into()),
            (Value::Number(l), Value::Number(r), LessEqual) => Ok((l <= r).into()),

            (_, _, EqualEqual) => Ok(left.eq_in_lox(&right).into()),
            (_, _, BangEqual) => Ok((!left.eq_in_lox(&right)).into()),

            (_, _, Plus) => Err(RuntimeError::type_mismatch(
                operator,
                "Operands must be two numbers or two strings.",
            )),
            (_, _, Minus | Slash | Star | Greater | GreaterEqual | Less | LessEqual) => {
                Err(RuntimeError::type_mismatch(operator, "Operands must be numbers."))
            }

            _ => Err(RuntimeError::type_mismatch(operator, "Unknown binary operator.")),
        }
    }

    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.eval(left)?;
        let decided = match operator.kind {
            TokenKind::Or => left.is_truthy(),
            TokenKind::And => !left.is_truthy(),
            _ => return Err(RuntimeError::type_mismatch(operator, "Unknown logical operator.")),
        };

        if decided {
            Ok(left)
        } else {
            self.eval(right)
        }
    }

    fn visit_ternary(
        &mut self,
        left: &Expr,
        _left_operator: &Token,
        middle: &Expr,
        _right_operator: &Token,
        right: &Expr,
    ) -> Result<Value> {
        if self.eval(left)?.is_truthy() {
            self.eval(middle)
        } else {
            self.eval(right)
        }
    }

    fn visit_variable(&mut self, name: &Token) -> Result<Value> {
        self.environment.get(name)
    }

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<Value> {
        let value = self.eval(value)?;
        self.environment.assign(name, value)
    }

    fn visit_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee = self.eval(callee)?;
        let arguments = arguments.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>>>()?;

        let Value::Callable(function) = callee else {
            return Err(RuntimeError::NotInvokable { line: paren.line() });
        };

        if arguments.len() != function.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: function.arity(),
                actual: arguments.len(),
                line: paren.line(),
            });
        }

        log::debug!("Calling {} with {} argument(s)", function, arguments.len());
        function.call(self, arguments)
    }
}
