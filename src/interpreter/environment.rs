use crate::interpreter::error::RuntimeErrorKind;
use crate::interpreter::value::{BuiltinFlow, NativeFunction, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A scope in the chain: its own variable bindings plus a link to the parent.
/// The function table lives only at the root — function declarations register
/// there no matter how deeply nested the declaring scope is, and later
/// declarations with the same name win.
#[derive(Debug, Default)]
pub struct Environment {
    parent: Option<Rc<Environment>>,
    vars: RefCell<HashMap<String, Value>>,
    funcs: RefCell<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            parent: Some(parent),
            ..Self::default()
        })
    }

    /// Binds a fresh name in *this* scope. Fails only if the name is already
    /// bound here; ancestor scopes are not consulted.
    pub fn declare(&self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        let mut vars = self.vars.borrow_mut();
        if vars.contains_key(name) {
            return Err(RuntimeErrorKind::DuplicateDeclaration(name.to_string()));
        }
        vars.insert(name.to_string(), value);
        Ok(())
    }

    /// Mutates an existing binding, wherever in the chain it lives.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeErrorKind::UndefinedVariable(name.to_string())),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.lookup(name),
            None => Err(RuntimeErrorKind::UndefinedVariable(name.to_string())),
        }
    }

    /// `=` statement semantics: reassign if the name resolves anywhere in the
    /// chain, declare in the current scope otherwise. Never fails.
    pub fn declare_or_assign(&self, name: &str, value: Value) {
        if self.assign(name, value.clone()).is_err() {
            self.vars.borrow_mut().insert(name.to_string(), value);
        }
    }

    /// Registers a function in the root table, overwriting any previous
    /// definition of the same name.
    pub fn set_function(&self, name: &str, value: Value) {
        match &self.parent {
            Some(parent) => parent.set_function(name, value),
            None => {
                self.funcs.borrow_mut().insert(name.to_string(), value);
            }
        }
    }

    pub fn get_function(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        match &self.parent {
            Some(parent) => parent.get_function(name),
            None => self
                .funcs
                .borrow()
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeErrorKind::UndefinedFunction(name.to_string())),
        }
    }

    /// Convenience wrapper for host collaborators injecting callables.
    pub fn register_builtin(
        &self,
        name: &str,
        arity: Option<usize>,
        func: impl Fn(&[Value]) -> Result<BuiltinFlow, String> + 'static,
    ) {
        self.set_function(
            name,
            Value::NativeFn(Rc::new(NativeFunction {
                name: Rc::from(name),
                arity,
                func: Box::new(func),
            })),
        );
    }
}
