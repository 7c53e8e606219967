use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::{Expr, Stmt};
use crate::environment::Environment;
use crate::error::SlangError;
use crate::resolver::Resolutions;
use crate::token::{Literal, Token, TokenType};
use crate::value::{Function, NativeFunction, SlangFunction, Value};

/// Outcome of a statement. `Return` carries its value up through
/// enclosing blocks and loops until the active call consumes it; the
/// error channel is reserved for actual failures.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    /// Innermost frame; swapped while blocks and calls run.
    environment: Rc<RefCell<Environment>>,
    /// Outermost frame, where natives and unresolved names live.
    globals: Rc<RefCell<Environment>>,
    /// Scope depths for every variable use the resolver pinned down.
    resolutions: Resolutions,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        define_native(&globals, "clock", 0, native_clock);
        define_native(&globals, "str", 1, native_str);
        define_native(&globals, "split", 3, native_split);
        define_native(&globals, "count", 2, native_count);
        define_native(&globals, "num", 1, native_num);
        Self {
            environment: Rc::clone(&globals),
            globals,
            resolutions: Resolutions::new(),
        }
    }

    /// Merge freshly resolved depths in. Ids never repeat within a
    /// session, so entries accumulate instead of replacing.
    pub fn add_resolutions(&mut self, resolutions: Resolutions) {
        self.resolutions.extend(resolutions);
    }

    pub fn execute(&mut self, stmt: &Stmt, output: &mut dyn Write) -> Result<Flow, SlangError> {
        match stmt {
            Stmt::Print { expr } => {
                let value = self.evaluate(expr, output)?;
                writeln!(output, "{}", value)?;
                Ok(Flow::Normal)
            }
            Stmt::Expression { expr } => {
                self.evaluate(expr, output)?;
                Ok(Flow::Normal)
            }
            Stmt::Var { name, initializer } => {
                let value = self.evaluate(initializer, output)?;
                self.define(name, value)?;
                Ok(Flow::Normal)
            }
            Stmt::Fun { name, params, body } => {
                let function = SlangFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: Rc::clone(&self.environment),
                };
                self.define(name, Value::Function(Rc::new(Function::Slang(function))))?;
                Ok(Flow::Normal)
            }
            Stmt::Block { statements } => self.execute_block(statements, output),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition_value = self.evaluate(condition, output)?;
                if self.is_truthy(&condition_value) {
                    self.execute(then_branch, output)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, output)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { condition, body } => {
                loop {
                    let condition_value = self.evaluate(condition, output)?;
                    if !self.is_truthy(&condition_value) {
                        break;
                    }
                    if let Flow::Return(value) = self.execute(body, output)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return { expr } => {
                let value = self.evaluate(expr, output)?;
                Ok(Flow::Return(value))
            }
        }
    }

    fn execute_block(
        &mut self,
        statements: &[Stmt],
        output: &mut dyn Write,
    ) -> Result<Flow, SlangError> {
        let previous = Rc::clone(&self.environment);
        self.environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &previous,
        ))));

        let result = self.execute_all(statements, output);

        self.environment = previous;
        result
    }

    fn execute_all(
        &mut self,
        statements: &[Stmt],
        output: &mut dyn Write,
    ) -> Result<Flow, SlangError> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt, output)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    pub fn evaluate(&mut self, expr: &Expr, output: &mut dyn Write) -> Result<Value, SlangError> {
        match expr {
            Expr::Literal { value } => Ok(Value::from(value.clone())),
            Expr::Grouping { expression } => self.evaluate(expression, output),
            Expr::Unary { operator, right } => {
                let right_value = self.evaluate(right, output)?;
                match operator.token_type {
                    TokenType::Minus => Ok(Value::from(Literal::Number(-right_value.as_number()?))),
                    TokenType::Bang => {
                        Ok(Value::from(Literal::Bool(!self.is_truthy(&right_value))))
                    }
                    _ => Err(SlangError::Unreachable),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_value = self.evaluate(left, output)?;
                let right_value = self.evaluate(right, output)?;

                match operator.token_type {
                    // Dispatch on the left operand: a Num left coerces the
                    // right side, everything else must pair exactly.
                    TokenType::Plus => match (&left_value, &right_value) {
                        (Value::Literal(Literal::Number(a)), _) => {
                            let b = right_value.as_number()?;
                            Ok(Value::from(Literal::Number(a + b)))
                        }
                        (
                            Value::Literal(Literal::String(a)),
                            Value::Literal(Literal::String(b)),
                        ) => Ok(Value::from(Literal::String(format!("{}{}", a, b)))),
                        _ => Err(SlangError::Type {
                            message: "Can only add strings or numbers.".to_string(),
                        }),
                    },
                    TokenType::Minus | TokenType::Slash | TokenType::Star => {
                        let a = left_value.as_number()?;
                        let b = right_value.as_number()?;
                        let result = match operator.token_type {
                            TokenType::Minus => a - b,
                            TokenType::Slash => a / b,
                            TokenType::Star => a * b,
                            _ => return Err(SlangError::Unreachable),
                        };
                        Ok(Value::from(Literal::Number(result)))
                    }
                    TokenType::Greater
                    | TokenType::GreaterEqual
                    | TokenType::Less
                    | TokenType::LessEqual => {
                        let a = left_value.as_number()?;
                        let b = right_value.as_number()?;
                        let result = match operator.token_type {
                            TokenType::Greater => a > b,
                            TokenType::GreaterEqual => a >= b,
                            TokenType::Less => a < b,
                            TokenType::LessEqual => a <= b,
                            _ => return Err(SlangError::Unreachable),
                        };
                        Ok(Value::from(Literal::Bool(result)))
                    }
                    TokenType::EqualEqual => {
                        Ok(Value::from(Literal::Bool(left_value == right_value)))
                    }
                    TokenType::BangEqual => {
                        Ok(Value::from(Literal::Bool(left_value != right_value)))
                    }
                    _ => Err(SlangError::Unreachable),
                }
            }
            Expr::Variable { id, name } => match self.resolutions.get(id) {
                Some(depth) => self.environment.borrow().get_at(*depth, &name.lexeme),
                None => self.globals.borrow().get(&name.lexeme),
            },
            Expr::Assignment { id, name, value } => {
                let value = self.evaluate(value, output)?;
                match self.resolutions.get(id) {
                    Some(depth) => {
                        self.environment
                            .borrow_mut()
                            .assign_at(*depth, &name.lexeme, value.clone())?
                    }
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call { callee, arguments } => {
                let callee_value = self.evaluate(callee, output)?;
                let mut argument_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    argument_values.push(self.evaluate(argument, output)?);
                }

                let Value::Function(function) = callee_value else {
                    return Err(SlangError::Type {
                        message: "Can only call a callable.".to_string(),
                    });
                };
                self.call(&function, argument_values, output)
            }
        }
    }

    fn call(
        &mut self,
        function: &Function,
        arguments: Vec<Value>,
        output: &mut dyn Write,
    ) -> Result<Value, SlangError> {
        if arguments.len() != function.arity() {
            return Err(SlangError::Arity {
                name: function.name().to_string(),
                expected: function.arity(),
                got: arguments.len(),
            });
        }

        match function {
            Function::Native(native) => (native.func)(&arguments),
            Function::Slang(function) => {
                // The frame forks from the defining closure, not from
                // the caller's environment.
                let previous = Rc::clone(&self.environment);
                self.environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &function.closure,
                ))));

                let result = self.call_body(function, arguments, output);

                self.environment = previous;
                result
            }
        }
    }

    fn call_body(
        &mut self,
        function: &SlangFunction,
        arguments: Vec<Value>,
        output: &mut dyn Write,
    ) -> Result<Value, SlangError> {
        for (param, argument) in function.params.iter().zip(arguments) {
            self.define(param, argument)?;
        }
        match self.execute_all(&function.body, output)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::from(Literal::Nil)),
        }
    }

    fn define(&mut self, name: &Token, value: Value) -> Result<(), SlangError> {
        if self
            .environment
            .borrow_mut()
            .define(name.lexeme.clone(), value)
        {
            Ok(())
        } else {
            Err(SlangError::AlreadyDefined {
                ident: name.lexeme.clone(),
            })
        }
    }

    fn is_truthy(&self, value: &Value) -> bool {
        match value {
            Value::Literal(Literal::Nil) => false,
            Value::Literal(Literal::Bool(b)) => *b,
            _ => true,
        }
    }
}

fn define_native(
    globals: &Rc<RefCell<Environment>>,
    name: &str,
    arity: usize,
    func: fn(&[Value]) -> Result<Value, SlangError>,
) {
    globals.borrow_mut().define(
        name.to_string(),
        Value::Function(Rc::new(Function::Native(NativeFunction {
            name: name.to_string(),
            arity,
            func,
        }))),
    );
}

// Natives index into their argument slice directly; call() has already
// checked the arity.

fn native_clock(_arguments: &[Value]) -> Result<Value, SlangError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Ok(Value::from(Literal::Number(elapsed.as_millis() as f64)))
}

fn native_str(arguments: &[Value]) -> Result<Value, SlangError> {
    Ok(Value::from(Literal::String(arguments[0].to_string())))
}

fn native_split(arguments: &[Value]) -> Result<Value, SlangError> {
    let text = arguments[0].as_string()?;
    let separator = arguments[1].as_string()?;
    let index = arguments[2].as_number()?;

    let pieces: Vec<&str> = text.split(separator).collect();
    if index < 0.0 || index as usize >= pieces.len() {
        return Err(SlangError::Type {
            message: format!("Split index {} out of range.", index),
        });
    }
    Ok(Value::from(Literal::String(
        pieces[index as usize].to_string(),
    )))
}

fn native_count(arguments: &[Value]) -> Result<Value, SlangError> {
    let text = arguments[0].as_string()?;
    let needle = arguments[1].as_string()?;
    Ok(Value::from(Literal::Number(
        text.matches(needle).count() as f64
    )))
}

fn native_num(arguments: &[Value]) -> Result<Value, SlangError> {
    let text = arguments[0].as_string()?;
    Ok(match text.trim().parse::<f64>() {
        Ok(number) => Value::from(Literal::Number(number)),
        Err(_) => Value::from(Literal::Nil),
    })
}
