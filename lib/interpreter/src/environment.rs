use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use itertools::Itertools;
use scanner::Token;

use crate::{value::Value, RuntimeError};

#[derive(Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<Environment>,
}

/// Handle to one scope in a chain of scopes, innermost first.
///
/// Cloning the handle shares the scope instead of copying it: a definition
/// or assignment made through one handle is visible through every other, and
/// the scope lives as long as its longest-lived handle.
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// A new outermost (global) scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new, empty scope nested inside `enclosing`.
    pub fn new_enclosed(enclosing: &Environment) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            values: HashMap::new(),
            enclosing: Some(enclosing.clone()),
        })))
    }

    pub fn enclosing(&self) -> Option<Environment> {
        self.0.borrow().enclosing.clone()
    }

    /// Number of scopes enclosing this one.
    pub fn depth(&self) -> usize {
        match &self.0.borrow().enclosing {
            Some(enclosing) => 1 + enclosing.depth(),
            None => 0,
        }
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Binds `name` in this scope only, replacing any previous binding here.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().values.insert(name.into(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        let scope = self.0.borrow();
        if let Some(value) = scope.values.get(name.lexeme()) {
            return Ok(value.clone());
        }

        match &scope.enclosing {
            Some(enclosing) => enclosing.get(name),
            None => Err(RuntimeError::undefined_variable(name)),
        }
    }

    /// Overwrites the innermost existing binding of `name`.
    pub fn assign(&self, name: &Token, value: Value) -> Result<Value, RuntimeError> {
        let mut scope = self.0.borrow_mut();
        if let Some(slot) = scope.values.get_mut(name.lexeme()) {
            *slot = value.clone();
            return Ok(value);
        }

        match &scope.enclosing {
            Some(enclosing) => enclosing.assign(name, value),
            None => Err(RuntimeError::undefined_variable(name)),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only names: values may hold callables that point back into the chain.
        let scope = self.0.borrow();
        f.debug_struct("Environment")
            .field("names", &scope.values.keys().sorted().collect_vec())
            .field("enclosing", &scope.enclosing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use scanner::{Line, TokenKind};

    use super::*;

    fn name(lexeme: &str) -> Token {
        Token::new(TokenKind::Identifier, lexeme, 7)
    }

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define("a", 1.0.into());
        assert_eq!(env.get(&name("a")).unwrap(), Value::Number(1.0));

        env.define("a", "redefined".into());
        assert_eq!(env.get(&name("a")).unwrap(), Value::from("redefined"));
    }

    #[test]
    fn lookup_ascends_to_enclosing_scopes() {
        let global = Environment::new();
        global.define("a", 1.0.into());
        let inner = Environment::new_enclosed(&Environment::new_enclosed(&global));

        assert_eq!(inner.get(&name("a")).unwrap(), Value::Number(1.0));
        assert_eq!(inner.depth(), 2);
        assert!(inner.enclosing().unwrap().enclosing().unwrap().ptr_eq(&global));
    }

    #[test]
    fn define_shadows_without_touching_outer_scope() {
        let global = Environment::new();
        global.define("x", 1.0.into());
        let inner = Environment::new_enclosed(&global);
        inner.define("x", 2.0.into());

        assert_eq!(inner.get(&name("x")).unwrap(), Value::Number(2.0));
        assert_eq!(global.get(&name("x")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_updates_the_scope_that_owns_the_binding() {
        let global = Environment::new();
        global.define("x", 1.0.into());
        let inner = Environment::new_enclosed(&global);

        assert_eq!(inner.assign(&name("x"), 2.0.into()).unwrap(), Value::Number(2.0));
        assert_eq!(global.get(&name("x")).unwrap(), Value::Number(2.0));
        assert!(inner.0.borrow().values.is_empty());
    }

    #[test]
    fn undefined_names() {
        let env = Environment::new_enclosed(&Environment::new());

        let err = env.get(&name("y")).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UndefinedVariable { ref name, line: Line(7) } if name == "y"
        ));
        assert_eq!(err.to_string(), "Undefined variable 'y'.");

        assert!(matches!(
            env.assign(&name("y"), Value::Nil),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn handles_share_the_same_scope() {
        let global = Environment::new();
        let block = Environment::new_enclosed(&global);
        let captured = block.clone();
        drop(block);

        captured.define("counter", 0.0.into());
        global.define("total", 0.0.into());
        captured.assign(&name("total"), 10.0.into()).unwrap();

        assert_eq!(global.get(&name("total")).unwrap(), Value::Number(10.0));
        assert_eq!(captured.get(&name("counter")).unwrap(), Value::Number(0.0));
    }

    #[test]
    fn debug_lists_names_only() {
        let global = Environment::new();
        global.define("b", Value::Nil);
        global.define("a", Value::Nil);
        assert_eq!(
            format!("{:?}", global),
            r#"Environment { names: ["a", "b"], enclosing: None }"#
        );
    }
}
