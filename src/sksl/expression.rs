//! Immutable expression IR.
//!
//! Expressions are produced by the (external) parser and by lowering passes.
//! Once built they are never mutated; rewrites build new nodes.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use super::constant_folder;
use super::context::Context;
use super::types::Type;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const CONST = 1 << 0;
    }
}

/// A declared variable. Shared by every reference to it.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub ty: Arc<Type>,
    pub modifiers: Modifiers,
    pub initial_value: Option<Expression>,
}

impl Variable {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Arc<Type>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers,
            initial_value: None,
        }
    }

    #[must_use]
    pub fn with_initial_value(mut self, value: Expression) -> Self {
        self.initial_value = Some(value);
        self
    }
}

// ─── Node Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub line: i32,
    pub value: LiteralValue,
    pub ty: Arc<Type>,
}

#[derive(Debug, Clone)]
pub struct VariableReference {
    pub line: i32,
    pub variable: Arc<Variable>,
}

impl PartialEq for VariableReference {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.variable, &other.variable)
    }
}

/// A type name used in expression position (`int` in `int[10]`).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    pub line: i32,
    pub value: Arc<Type>,
    /// Always the invalid type: a type reference is not a value.
    pub ty: Arc<Type>,
}

/// Generic `base[index]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub line: i32,
    pub base: Box<Expression>,
    pub index: Box<Expression>,
    pub ty: Arc<Type>,
}

/// Component selection (`v.zyx`). Components are 0-based lane indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Swizzle {
    pub line: i32,
    pub base: Box<Expression>,
    pub components: SmallVec<[i8; 4]>,
    pub ty: Arc<Type>,
}

/// Conversion between scalar types (`int(x)`).
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarCast {
    pub line: i32,
    pub ty: Arc<Type>,
    pub argument: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    VariableReference(VariableReference),
    TypeReference(TypeReference),
    Index(IndexExpression),
    Swizzle(Swizzle),
    ScalarCast(ScalarCast),
}

impl Expression {
    #[must_use]
    pub fn line(&self) -> i32 {
        match self {
            Self::Literal(e) => e.line,
            Self::VariableReference(e) => e.line,
            Self::TypeReference(e) => e.line,
            Self::Index(e) => e.line,
            Self::Swizzle(e) => e.line,
            Self::ScalarCast(e) => e.line,
        }
    }

    #[must_use]
    pub fn ty(&self) -> &Arc<Type> {
        match self {
            Self::Literal(e) => &e.ty,
            Self::VariableReference(e) => &e.variable.ty,
            Self::TypeReference(e) => &e.ty,
            Self::Index(e) => &e.ty,
            Self::Swizzle(e) => &e.ty,
            Self::ScalarCast(e) => &e.ty,
        }
    }

    #[must_use]
    pub fn int_literal(line: i32, value: i64, context: &Context) -> Self {
        Self::Literal(Literal {
            line,
            value: LiteralValue::Int(value),
            ty: Arc::clone(&context.types.int),
        })
    }

    #[must_use]
    pub fn float_literal(line: i32, value: f64, context: &Context) -> Self {
        Self::Literal(Literal {
            line,
            value: LiteralValue::Float(value),
            ty: Arc::clone(&context.types.float),
        })
    }

    #[must_use]
    pub fn bool_literal(line: i32, value: bool, context: &Context) -> Self {
        Self::Literal(Literal {
            line,
            value: LiteralValue::Bool(value),
            ty: Arc::clone(&context.types.bool),
        })
    }

    #[must_use]
    pub fn variable_reference(line: i32, variable: &Arc<Variable>) -> Self {
        Self::VariableReference(VariableReference {
            line,
            variable: Arc::clone(variable),
        })
    }

    #[must_use]
    pub fn type_reference(line: i32, value: Arc<Type>, context: &Context) -> Self {
        Self::TypeReference(TypeReference {
            line,
            value,
            ty: Arc::clone(&context.types.invalid),
        })
    }

    /// `Some(v)` when this node is an integer literal.
    #[must_use]
    pub fn as_int_literal(&self) -> Option<i64> {
        match self {
            Self::Literal(Literal {
                value: LiteralValue::Int(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// `true` if the expression can be evaluated at compile time.
    #[must_use]
    pub fn is_compile_time_constant(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::ScalarCast(cast) => cast.argument.is_compile_time_constant(),
            Self::Swizzle(swizzle) => swizzle.base.is_compile_time_constant(),
            _ => false,
        }
    }
}

impl ScalarCast {
    /// Builds `ty(argument)`, folding literal arguments into literals.
    #[must_use]
    pub fn make(line: i32, ty: Arc<Type>, argument: Expression) -> Expression {
        if argument.ty().as_ref() == ty.as_ref() {
            return argument;
        }

        let value = match constant_folder::get_constant_value_for_variable(&argument) {
            Expression::Literal(literal) => Some(literal.value),
            _ => None,
        };

        if let Some(value) = value {
            let folded = if ty.is_integer() {
                match value {
                    LiteralValue::Int(v) => Some(LiteralValue::Int(v)),
                    LiteralValue::Float(v) => Some(LiteralValue::Int(v.trunc() as i64)),
                    LiteralValue::Bool(v) => Some(LiteralValue::Int(i64::from(v))),
                }
            } else if ty.is_float() {
                match value {
                    LiteralValue::Int(v) => Some(LiteralValue::Float(v as f64)),
                    LiteralValue::Float(v) => Some(LiteralValue::Float(v)),
                    LiteralValue::Bool(v) => Some(LiteralValue::Float(if v { 1.0 } else { 0.0 })),
                }
            } else {
                None
            };

            if let Some(value) = folded {
                return Expression::Literal(Literal { line, value, ty });
            }
        }

        Expression::ScalarCast(ScalarCast {
            line,
            ty,
            argument: Box::new(argument),
        })
    }
}

impl Swizzle {
    /// Builds a component selection over `base`.
    ///
    /// A swizzle of a swizzle collapses into one selection over the inner base.
    #[must_use]
    pub fn make(context: &Context, base: Expression, components: &[i8]) -> Expression {
        debug_assert!(!components.is_empty() && components.len() <= 4);

        let (base, components): (Expression, SmallVec<[i8; 4]>) = match base {
            Expression::Swizzle(inner) => {
                let composed = components
                    .iter()
                    .map(|&c| inner.components[c as usize])
                    .collect();
                (*inner.base, composed)
            }
            other => (other, components.iter().copied().collect()),
        };

        let component = base.ty().component_type();
        let ty = if components.len() == 1 {
            component
        } else {
            context
                .types
                .vector(&component, components.len() as u8)
                .unwrap_or(component)
        };

        Expression::Swizzle(Swizzle {
            line: base.line(),
            base: Box::new(base),
            components,
            ty,
        })
    }
}

// ─── Source Rendering ────────────────────────────────────────────────────────

const SWIZZLE_LETTERS: [char; 4] = ['x', 'y', 'z', 'w'];

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => match literal.value {
                LiteralValue::Int(v) => write!(f, "{v}"),
                LiteralValue::Float(v) => write!(f, "{v:?}"),
                LiteralValue::Bool(v) => write!(f, "{v}"),
            },
            Self::VariableReference(r) => f.write_str(&r.variable.name),
            Self::TypeReference(r) => f.write_str(r.value.name()),
            Self::Index(e) => write!(f, "{}[{}]", e.base, e.index),
            Self::Swizzle(s) => {
                write!(f, "{}.", s.base)?;
                for &c in &s.components {
                    write!(f, "{}", SWIZZLE_LETTERS[c as usize])?;
                }
                Ok(())
            }
            Self::ScalarCast(c) => write!(f, "{}({})", c.ty.name(), c.argument),
        }
    }
}
