//! Symbol table for a single program scope.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::expression::Variable;
use super::types::Type;

/// Owns the variables declared in a scope and interns derived array types, so
/// `int[10]` always resolves to the same `Arc<Type>`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    variables: FxHashMap<String, Arc<Variable>>,
    array_types: FxHashMap<(String, i32), Arc<Type>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable and returns the shared handle used by references.
    pub fn add_variable(&mut self, variable: Variable) -> Arc<Variable> {
        let variable = Arc::new(variable);
        self.variables
            .insert(variable.name.clone(), Arc::clone(&variable));
        variable
    }

    #[must_use]
    pub fn find_variable(&self, name: &str) -> Option<&Arc<Variable>> {
        self.variables.get(name)
    }

    /// Returns the interned `base[size]` type.
    pub fn add_array_dimension(&mut self, base: &Arc<Type>, size: i32) -> Arc<Type> {
        Arc::clone(
            self.array_types
                .entry((base.name().to_string(), size))
                .or_insert_with(|| Arc::new(Type::array_of(base, size))),
        )
    }

    #[must_use]
    pub fn array_type_count(&self) -> usize {
        self.array_types.len()
    }
}
