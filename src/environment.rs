//! Variable environment for Bamboo
//!
//! Handles lexically scoped variable storage. Environments are shared
//! (`Rc<RefCell<_>>`) because a function value keeps the scope it was
//! defined in alive after the defining call returns.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// Shared handle to an environment
pub type Env = Rc<RefCell<Environment>>;

/// Variable environment with lexical scoping
#[derive(Default)]
pub struct Environment {
    values: FxHashMap<String, Value>,
    parent: Option<Env>,
}

impl Environment {
    /// Create a new root environment
    pub fn new() -> Env {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Create a child environment with parent scope
    pub fn with_parent(parent: Env) -> Env {
        Rc::new(RefCell::new(Self {
            values: FxHashMap::default(),
            parent: Some(parent),
        }))
    }

    /// Bind `name` in this scope, shadowing any outer binding
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look `name` up here, then in each enclosing scope
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref()?.borrow().get(name),
        }
    }

    /// Overwrite the nearest existing binding of `name`. Returns false when
    /// no scope in the chain binds it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().assign(name, value)
        } else {
            false
        }
    }
}
