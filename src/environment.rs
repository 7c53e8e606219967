use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::SlangError;
use crate::value::Value;

/// One lexical scope frame. Frames link to their enclosing frame, and
/// closures keep the chain alive by holding an `Rc` to the frame they
/// captured.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Creates a binding in this frame. Returns false when the name is
    /// already bound here; the caller turns that into an error.
    pub fn define(&mut self, name: String, value: Value) -> bool {
        if self.values.contains_key(&name) {
            return false;
        }

        self.values.insert(name, value);
        true
    }

    pub fn get(&self, name: &str) -> Result<Value, SlangError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(SlangError::UndefinedVariable {
            ident: name.to_string(),
        })
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), SlangError> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(SlangError::UndefinedVariable {
            ident: name.to_string(),
        })
    }

    /// Reads a binding exactly `depth` frames up the chain. The depth
    /// comes from the resolver; running out of frames means the resolver
    /// and this chain disagree about scope structure.
    pub fn get_at(&self, depth: usize, name: &str) -> Result<Value, SlangError> {
        if depth == 0 {
            return match self.values.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(SlangError::UndefinedVariable {
                    ident: name.to_string(),
                }),
            };
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_at(depth - 1, name),
            None => Err(SlangError::Scope { depth }),
        }
    }

    pub fn assign_at(&mut self, depth: usize, name: &str, value: Value) -> Result<(), SlangError> {
        if depth == 0 {
            if !self.values.contains_key(name) {
                return Err(SlangError::UndefinedVariable {
                    ident: name.to_string(),
                });
            }

            self.values.insert(name.to_string(), value);
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(depth - 1, name, value),
            None => Err(SlangError::Scope { depth }),
        }
    }
}
