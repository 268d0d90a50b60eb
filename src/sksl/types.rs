//! Shading-language type model.
//!
//! Types are immutable and shared through `Arc`. Two types are equal when they
//! have the same name; the builtin table and the [`SymbolTable`] guarantee that
//! a name is only ever bound to one shape.
//!
//! [`SymbolTable`]: super::SymbolTable

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::constant_folder;
use super::context::Context;
use super::error::{ArraySizeError, CompileErrorKind};
use super::expression::{Expression, ScalarCast};

/// Numeric category of a scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Float,
    Signed,
    Unsigned,
    Boolean,
}

/// Structural shape of a [`Type`].
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Placeholder type carried by expressions that are not values
    /// (e.g. type references).
    Invalid,
    Void,
    Scalar(NumberKind),
    Vector { component: Arc<Type>, columns: u8 },
    /// `columns` vectors of `rows` components each.
    Matrix { component: Arc<Type>, columns: u8, rows: u8 },
    Array { element: Arc<Type>, count: i32 },
    /// Opaque resource types (textures, samplers).
    Sampler,
}

#[derive(Debug, Clone)]
pub struct Type {
    name: String,
    kind: TypeKind,
}

impl Type {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Builds the sized array type `element[count]`.
    #[must_use]
    pub fn array_of(element: &Arc<Type>, count: i32) -> Self {
        Self::new(
            format!("{}[{}]", element.name, count),
            TypeKind::Array {
                element: Arc::clone(element),
                count,
            },
        )
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in diagnostics.
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    #[must_use]
    pub fn is_vector(&self) -> bool {
        matches!(self.kind, TypeKind::Vector { .. })
    }

    #[must_use]
    pub fn is_matrix(&self) -> bool {
        matches!(self.kind, TypeKind::Matrix { .. })
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, TypeKind::Scalar(_))
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    #[must_use]
    pub fn is_opaque(&self) -> bool {
        matches!(self.kind, TypeKind::Sampler)
    }

    /// Scalar number kind, if this is a scalar.
    #[must_use]
    pub fn number_kind(&self) -> Option<NumberKind> {
        match self.kind {
            TypeKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// `true` for signed and unsigned integer scalars.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self.number_kind(),
            Some(NumberKind::Signed | NumberKind::Unsigned)
        )
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        self.number_kind() == Some(NumberKind::Float)
    }

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.number_kind() == Some(NumberKind::Boolean)
    }

    /// Indexable extent: components of a vector, columns of a matrix,
    /// element count of an array, 1 for scalars.
    #[must_use]
    pub fn columns(&self) -> i64 {
        match &self.kind {
            TypeKind::Vector { columns, .. } | TypeKind::Matrix { columns, .. } => {
                i64::from(*columns)
            }
            TypeKind::Array { count, .. } => i64::from(*count),
            TypeKind::Scalar(_) => 1,
            TypeKind::Invalid | TypeKind::Void | TypeKind::Sampler => 0,
        }
    }

    #[must_use]
    pub fn rows(&self) -> u8 {
        match &self.kind {
            TypeKind::Matrix { rows, .. } => *rows,
            TypeKind::Vector { .. } | TypeKind::Scalar(_) => 1,
            _ => 0,
        }
    }

    /// Component type of vectors and matrices, element type of arrays,
    /// the type itself otherwise.
    #[must_use]
    pub fn component_type(self: &Arc<Self>) -> Arc<Type> {
        match &self.kind {
            TypeKind::Vector { component, .. } | TypeKind::Matrix { component, .. } => {
                Arc::clone(component)
            }
            TypeKind::Array { element, .. } => Arc::clone(element),
            _ => Arc::clone(self),
        }
    }

    /// Coerces `expr` to this (scalar) type.
    ///
    /// Identical types pass through. Integer scalars convert freely; floating
    /// point scalars only convert when the program allows narrowing
    /// conversions. Everything else is a type mismatch.
    pub fn coerce_expression(
        self: &Arc<Self>,
        expr: Expression,
        context: &Context,
    ) -> Result<Expression, CompileErrorKind> {
        let from = expr.ty();
        if from.as_ref() == self.as_ref() {
            return Ok(expr);
        }

        let possible = match (from.number_kind(), self.number_kind()) {
            (
                Some(NumberKind::Signed | NumberKind::Unsigned),
                Some(NumberKind::Signed | NumberKind::Unsigned | NumberKind::Float),
            ) => true,
            (Some(NumberKind::Float), Some(NumberKind::Signed | NumberKind::Unsigned)) => {
                context.settings.allow_narrowing_conversions
            }
            (Some(NumberKind::Float), Some(NumberKind::Float)) => true,
            _ => false,
        };

        if !possible {
            return Err(CompileErrorKind::IndexNotInteger {
                expected: self.display_name().to_string(),
                found: from.display_name().to_string(),
            });
        }

        let line = expr.line();
        Ok(ScalarCast::make(line, Arc::clone(self), expr))
    }

    /// Validates an array dimension expression and returns the element count.
    pub fn convert_array_size(
        &self,
        context: &Context,
        size: Expression,
    ) -> Result<i32, ArraySizeError> {
        let size = context
            .types
            .int
            .coerce_expression(size, context)
            .map_err(|_| ArraySizeError::NotInteger)?;

        if self.is_array() {
            return Err(ArraySizeError::MultiDimensional);
        }
        if self.is_void() {
            return Err(ArraySizeError::Void);
        }
        if self.is_opaque() {
            return Err(ArraySizeError::Opaque(self.display_name().to_string()));
        }

        let count = constant_folder::get_constant_int(&size).ok_or(ArraySizeError::NotInteger)?;
        if count <= 0 {
            return Err(ArraySizeError::NotPositive);
        }
        i32::try_from(count).map_err(|_| ArraySizeError::TooLarge)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
