//! Lexical environments
//!
//! An `Env` maps identifiers to bindings and chains to an enclosing scope.
//! The checker only reads from environments; populating them is the driver's
//! job.

use std::collections::HashMap;

use crate::constant::ConstValue;
use crate::types::{ConstKind, Type};

/// What a name is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A variable (or function value) of a concrete type
    Var(Type),
    /// A named type
    TypeName(Type),
    /// A declared constant: its untyped kind and exact value
    Const(ConstKind, ConstValue),
}

/// A lexical scope
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: HashMap<String, Binding>,
    parent: Option<Box<Env>>,
}

impl Env {
    /// Create a new top-level environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child scope of this environment
    pub fn child(&self) -> Env {
        Env {
            bindings: HashMap::new(),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Bind a name in this scope, shadowing any outer binding
    pub fn define(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    /// Bind a variable
    pub fn define_var(&mut self, name: impl Into<String>, ty: Type) {
        self.define(name, Binding::Var(ty));
    }

    /// Bind a named type
    pub fn define_type(&mut self, name: impl Into<String>, ty: Type) {
        self.define(name, Binding::TypeName(ty));
    }

    /// Bind a constant
    pub fn define_const(&mut self, name: impl Into<String>, kind: ConstKind, value: ConstValue) {
        self.define(name, Binding::Const(kind, value));
    }

    /// Look up a name, walking outward through enclosing scopes
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        match self.bindings.get(name) {
            Some(b) => Some(b),
            None => self.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }

    /// Look up a name bound as a type. Falls back to the predeclared types
    /// when the name is not bound at all; a non-type binding shadows them.
    pub fn lookup_type(&self, name: &str) -> Option<Type> {
        match self.lookup(name) {
            Some(Binding::TypeName(t)) => Some(t.clone()),
            Some(_) => None,
            None => Type::builtin(name),
        }
    }
}
