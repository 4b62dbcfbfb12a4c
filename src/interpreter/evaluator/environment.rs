use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{ast::Value, error::RuntimeError};

/// An insertion-ordered mapping from names to values.
///
/// Backs both object values and environment scopes, which lets the symbols
/// `local` and `global` evaluate to live objects aliasing the scope they name.
/// Lookup is a linear scan; objects and scopes in this language stay small.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(Rc<str>, Value)>,
}

impl Bindings {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Looks up a value by name.
    ///
    /// # Example
    /// ```
    /// use expreva::{ast::Value, interpreter::evaluator::environment::Bindings};
    ///
    /// let mut bindings = Bindings::new();
    /// bindings.set("x", Value::Number(1.0));
    /// assert_eq!(bindings.get("x"), Some(Value::Number(1.0)));
    /// assert_eq!(bindings.get("y"), None);
    /// ```
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.clone())
    }

    /// Returns `true` when the name is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key.as_ref() == name)
    }

    /// Binds a name, replacing an existing entry in place so insertion order
    /// is preserved.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| key.as_ref() == name) {
            entry.1 = value;
            return;
        }
        self.entries.push((Rc::from(name), value));
    }

    /// Removes a binding, returning its value if present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let position = self.entries.iter().position(|(key, _)| key.as_ref() == name)?;
        Some(self.entries.remove(position).1)
    }

    /// Copies every entry of `other` into this map.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            self.set(key, value.clone());
        }
    }

    /// The entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[(Rc<str>, Value)] {
        &self.entries
    }

    /// The number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the map holds no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Rc<str>, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (Rc<str>, Value)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// A reference-counted handle to an environment scope.
pub type Env = Rc<Environment>;

/// A lexical scope: bindings plus an optional parent.
///
/// Scopes form a chain ending at the shared root environment, which is
/// initialized once per thread with the standard bindings and never
/// destroyed. Each chain additionally records its `global` scope, the
/// top-most non-root scope of the current evaluation, which is where `def`
/// binds names.
pub struct Environment {
    bindings: Rc<RefCell<Bindings>>,
    parent:   Option<Env>,
    global:   RefCell<Option<Weak<Environment>>>,
}

thread_local! {
    static ROOT: Env = Rc::new(Environment {
        bindings: Rc::new(RefCell::new(super::builtin::standard_bindings())),
        parent:   None,
        global:   RefCell::new(None),
    });
}

impl Environment {
    /// The shared root environment holding the standard bindings.
    ///
    /// Constructed on first use and reused for every evaluation on this
    /// thread. User code may mutate root bindings through `def` on member
    /// paths, but ordinary definitions land in the user global instead.
    #[must_use]
    pub fn root() -> Env {
        ROOT.with(Rc::clone)
    }

    /// Creates a fresh user global: a child of the root that `def` binds
    /// into, optionally seeded with host-supplied bindings.
    #[must_use]
    pub fn user_global(initial: Option<Bindings>) -> Env {
        let env = Self::root().create();
        if let Some(bindings) = initial {
            env.bindings.borrow_mut().merge(&bindings);
        }
        *env.global.borrow_mut() = Some(Rc::downgrade(&env));
        env
    }

    /// Produces a new child scope whose parent is this scope.
    ///
    /// The child shares the chain's global handle, so `def` inside nested
    /// scopes still binds at the top of the evaluation.
    #[must_use]
    pub fn create(self: &Rc<Self>) -> Env {
        Rc::new(Self { bindings: Rc::new(RefCell::new(Bindings::new())),
                       parent:   Some(Rc::clone(self)),
                       global:   RefCell::new(self.global.borrow().clone()), })
    }

    /// Resolves a symbol by walking this scope, then its parents, up to the
    /// root.
    ///
    /// # Example
    /// ```
    /// use expreva::{ast::Value, interpreter::evaluator::environment::Environment};
    ///
    /// let outer = Environment::user_global(None);
    /// outer.define("x", Value::Number(10.0));
    /// let inner = outer.create();
    /// assert_eq!(inner.lookup("x"), Some(Value::Number(10.0)));
    /// ```
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self;
        loop {
            if let Some(value) = current.bindings.borrow().get(name) {
                return Some(value);
            }
            match &current.parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Binds a name in this scope, shadowing any parent binding.
    pub fn define(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().set(name, value);
    }

    /// The global scope of the current evaluation, or this scope when the
    /// chain has none (e.g. scopes hanging directly off the root).
    #[must_use]
    pub fn global(self: &Rc<Self>) -> Env {
        self.global
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .unwrap_or_else(|| Rc::clone(self))
    }

    /// The scope's backing map, shared with object values produced by the
    /// `local` and `global` symbols.
    #[must_use]
    pub fn bindings_handle(&self) -> Rc<RefCell<Bindings>> {
        Rc::clone(&self.bindings)
    }

    /// The parent scope, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&Env> {
        self.parent.as_ref()
    }

    /// Builds an evaluation error to raise through `?`.
    ///
    /// # Example
    /// ```
    /// use expreva::interpreter::evaluator::environment::Environment;
    ///
    /// let env = Environment::user_global(None);
    /// let error = env.throw("boom");
    /// assert_eq!(error.to_string(), "Error: boom");
    /// ```
    pub fn throw(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::Raised { message: message.into() }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
         .field("bindings", &self.bindings.borrow().len())
         .field("has_parent", &self.parent.is_some())
         .finish()
    }
}
