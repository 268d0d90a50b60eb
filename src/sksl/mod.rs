//! Shading-language front-end slice: types, expression IR and the indexing
//! rules (`base[index]`) applied while lowering parsed source.
//!
//! ```rust,ignore
//! use strata::sksl::{Context, Expression, IndexExpression, Modifiers, SymbolTable, Variable};
//!
//! let ctx = Context::default();
//! let mut symbols = SymbolTable::new();
//! let float4 = ctx.types.vector(&ctx.types.float, 4).unwrap();
//! let v = symbols.add_variable(Variable::new("v", float4, Modifiers::empty()));
//!
//! // `v[2]` lowers to the swizzle `v.z`
//! let expr = IndexExpression::convert(
//!     &ctx,
//!     &mut symbols,
//!     Expression::variable_reference(1, &v),
//!     Expression::int_literal(1, 2, &ctx),
//! )?;
//! ```

pub mod constant_folder;
pub mod context;
pub mod error;
pub mod expression;
pub mod index_expression;
pub mod symbol_table;
pub mod types;

pub use context::{BuiltinTypes, Context, ProgramSettings};
pub use error::{ArraySizeError, CompileError, CompileErrorKind, ErrorReporter};
pub use expression::{
    Expression, IndexExpression, Literal, LiteralValue, Modifiers, ScalarCast, Swizzle,
    TypeReference, Variable, VariableReference,
};
pub use symbol_table::SymbolTable;
pub use types::{NumberKind, Type, TypeKind};
