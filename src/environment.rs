use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// A lexical scope frame: name-to-value bindings plus the enclosing frame.
/// The enclosing pointer is fixed at creation; the global frame has none.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditionally bind in this frame. Redefinition overwrites; the
    /// parser and resolver keep that path limited to globals, parameters
    /// and `var`.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}'", name);

        self.values.insert(name.to_string(), value);
    }

    /// Lookup confined to this frame, without touching the chain.
    pub fn try_get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Late-bound lookup: this frame first, then the enclosing chain.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Assign in the nearest frame that already binds the name.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Read from the frame exactly `distance` hops up the enclosing chain.
    /// The resolver guarantees that frame exists and binds the name; a
    /// missing binding reads as nil.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        if distance == 0 {
            return self.values.get(name).cloned().unwrap_or(Value::Nil);
        }

        let frame = self.ancestor(distance);
        let borrowed = frame.borrow();

        borrowed.values.get(name).cloned().unwrap_or(Value::Nil)
    }

    /// Mirror of `get_at`.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
            return;
        }

        let frame = self.ancestor(distance);

        frame.borrow_mut().values.insert(name.to_string(), value);
    }

    /// Follow enclosing pointers, advancing the cursor one frame per hop.
    fn ancestor(&self, distance: usize) -> Rc<RefCell<Environment>> {
        let mut frame: Rc<RefCell<Environment>> = self
            .enclosing
            .clone()
            .expect("resolved depth exceeds scope chain");

        for _ in 0..distance - 1 {
            let next = frame
                .borrow()
                .enclosing
                .clone()
                .expect("resolved depth exceeds scope chain");

            frame = next;
        }

        frame
    }
}
