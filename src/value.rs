use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Stmt;
use crate::environment::Environment;
use crate::error::SlangError;
use crate::token::{Literal, Token};

#[derive(Debug, Clone)]
pub enum Value {
    Literal(Literal),
    Function(Rc<Function>),
}

#[derive(Debug)]
pub enum Function {
    Slang(SlangFunction),
    Native(NativeFunction),
}

/// A user-declared function. `closure` is the environment that was
/// active at declaration time; calls fork their frame from it, not from
/// the caller's frame.
#[derive(Debug, Clone)]
pub struct SlangFunction {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
    pub closure: Rc<RefCell<Environment>>,
}

pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, SlangError>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Slang(function) => &function.name.lexeme,
            Function::Native(native) => &native.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Slang(function) => function.params.len(),
            Function::Native(native) => native.arity,
        }
    }
}

impl Value {
    pub fn type_string(&self) -> &'static str {
        match self {
            Value::Literal(Literal::Number(_)) => "number",
            Value::Literal(Literal::String(_)) => "string",
            Value::Literal(Literal::Bool(_)) => "boolean",
            Value::Literal(Literal::Nil) => "nil",
            Value::Function(_) => "<callable>",
        }
    }

    pub fn as_number(&self) -> Result<f64, SlangError> {
        match self {
            Value::Literal(Literal::Number(n)) => Ok(*n),
            _ => Err(SlangError::Type {
                message: format!("Expected a number, got {}.", self.type_string()),
            }),
        }
    }

    pub fn as_string(&self) -> Result<&str, SlangError> {
        match self {
            Value::Literal(Literal::String(s)) => Ok(s),
            _ => Err(SlangError::Type {
                message: format!("Expected a string, got {}.", self.type_string()),
            }),
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        Value::Literal(literal)
    }
}

/// Equality is total: literals compare structurally, and a callable is
/// never equal to anything, itself included.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Literal(a), Value::Literal(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(literal) => write!(f, "{}", literal),
            Value::Function(function) => write!(f, "{}", function),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Slang(_) => write!(f, "<fun>"),
            Function::Native(native) => write!(f, "<native fun {}>", native.name),
        }
    }
}
