use std::{
    fmt::{self, Debug, Display, Formatter},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{value::Value, Interpreter, RuntimeError};

/// Anything a call expression can invoke.
pub trait Callable: Debug + Display {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// `arguments` has already been checked against `arity`.
    fn call(
        &self,
        interpreter: &mut Interpreter<'_>,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value, RuntimeError>;

pub struct NativeFunction {
    name: String,
    arity: usize,
    function: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        function: impl Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
    ) -> Self {
        Self { name: name.into(), arity, function: Box::new(function) }
    }

    /// Seconds since the Unix epoch.
    pub fn clock() -> Self {
        Self::new("clock", 0, |_| {
            let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
            Ok(Value::Number(now.as_secs_f64()))
        })
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _: &mut Interpreter<'_>, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.function)(&arguments)
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // The boxed closure has nothing useful to print.
        f.debug_struct("NativeFunction").field("name", &self.name).field("arity", &self.arity).finish()
    }
}
