use std::collections::HashMap;

use crate::runtime_value::RuntimeValue;

/// Variables of one function invocation (or of the program itself).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Hoisted: `var` names exist from scope entry and start as `undefined`.
    variables: HashMap<String, RuntimeValue>,
}

impl Scope {
    pub fn new(hoisted_vars: Vec<String>) -> Self {
        let variables = hoisted_vars
            .into_iter()
            .map(|name| (name, RuntimeValue::Undefined))
            .collect();
        Scope { variables }
    }

    pub fn get_variable(&self, name: &str) -> Option<&RuntimeValue> {
        self.variables.get(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn set_variable(&mut self, name: &str, value: RuntimeValue) {
        self.variables.insert(name.to_string(), value);
    }

    /// Declare `name` without touching an existing value (`var x;` twice).
    pub fn declare(&mut self, name: &str) {
        self.variables.entry(name.to_string()).or_insert(RuntimeValue::Undefined);
    }
}

/// A stack of scopes: the global scope at the bottom, one scope per active
/// function call above it. Name lookup sees the innermost scope and the
/// global scope, never the scopes of callers.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new(globals: Scope) -> Self {
        Environment { scopes: vec![globals] }
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Pop a function scope. The global scope is never popped.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 { self.scopes.pop() } else { None }
    }

    /// Number of active function calls.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn current_scope_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn global_scope_mut(&mut self) -> &mut Scope {
        &mut self.scopes[0]
    }

    /// Look up a variable in the current scope, then the global scope.
    pub fn get_variable(&self, name: &str) -> Option<&RuntimeValue> {
        let current = self.scopes.last()?;
        current
            .get_variable(name)
            .or_else(|| self.scopes.first().and_then(|global| global.get_variable(name)))
    }

    /// Assign to the innermost visible binding. Assigning a name that was
    /// never declared creates a global.
    pub fn set_variable(&mut self, name: &str, value: RuntimeValue) {
        if self.current_scope_mut().has_variable(name) {
            self.current_scope_mut().set_variable(name, value);
        } else {
            self.global_scope_mut().set_variable(name, value);
        }
    }
}
