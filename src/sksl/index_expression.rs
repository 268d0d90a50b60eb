//! Resolution of `base[index]` expressions.
//!
//! [`IndexExpression::convert`] performs full validation and is used when
//! lowering parsed source. [`IndexExpression::make`] assumes validated operands
//! and only normalizes constant vector indices into swizzles; internal
//! rewrites call it directly.

use std::sync::Arc;

use super::constant_folder;
use super::context::Context;
use super::error::{CompileError, CompileErrorKind};
use super::expression::{Expression, IndexExpression, Swizzle};
use super::symbol_table::SymbolTable;
use super::types::Type;

impl IndexExpression {
    /// Result type of indexing into `ty`.
    ///
    /// Matrices yield the float/half vector with one lane per matrix row;
    /// vectors yield their component and arrays their element type.
    #[must_use]
    pub fn index_type(context: &Context, ty: &Arc<Type>) -> Arc<Type> {
        if ty.is_matrix() {
            let component = ty.component_type();
            let is_float_like =
                *component == *context.types.float || *component == *context.types.half;
            if is_float_like {
                if let Some(column) = context.types.vector(&component, ty.rows()) {
                    return column;
                }
                debug_assert!(false, "matrix '{ty}' has an unsupported row count");
            }
        }
        ty.component_type()
    }

    /// Validates and lowers `base[index]`.
    pub fn convert(
        context: &Context,
        symbols: &mut SymbolTable,
        base: Expression,
        index: Expression,
    ) -> Result<Expression, CompileError> {
        let line = base.line();

        // Array type constructor: `int[10]`.
        if let Expression::TypeReference(reference) = &base {
            let size = reference
                .value
                .convert_array_size(context, index)
                .map_err(|e| CompileError::new(line, e))?;
            let array_type = symbols.add_array_dimension(&reference.value, size);
            return Ok(Expression::type_reference(line, array_type, context));
        }

        let base_type = Arc::clone(base.ty());
        if !base_type.is_array() && !base_type.is_matrix() && !base_type.is_vector() {
            return Err(CompileError::new(
                line,
                CompileErrorKind::NotIndexable {
                    ty: base_type.display_name().to_string(),
                },
            ));
        }

        let index = if index.ty().is_integer() {
            index
        } else {
            context
                .types
                .int
                .coerce_expression(index, context)
                .map_err(|e| CompileError::new(line, e))?
        };

        // Compile-time bounds check on constant indices.
        if let Some(value) = constant_folder::get_constant_int(&index)
            && (value < 0 || value >= base_type.columns())
        {
            return Err(CompileError::new(
                line,
                CompileErrorKind::IndexOutOfRange {
                    index: value,
                    ty: base_type.display_name().to_string(),
                },
            ));
        }

        Ok(Self::make(context, base, index))
    }

    /// Builds `base[index]` from operands that have already been validated.
    ///
    /// A constant index into a vector becomes a single-component swizzle
    /// (`v[2]` → `v.z`); later passes rely on this normal form.
    #[must_use]
    pub fn make(context: &Context, base: Expression, index: Expression) -> Expression {
        let base_type = Arc::clone(base.ty());
        debug_assert!(base_type.is_array() || base_type.is_matrix() || base_type.is_vector());
        debug_assert!(index.ty().is_integer());

        if base_type.is_vector()
            && let Some(value) = constant_folder::get_constant_int(&index)
        {
            debug_assert!(
                (0..base_type.columns()).contains(&value),
                "constant index {value} out of range for '{}'",
                base_type.name()
            );
            return Swizzle::make(context, base, &[value as i8]);
        }

        Expression::Index(IndexExpression {
            line: base.line(),
            ty: Self::index_type(context, &base_type),
            base: Box::new(base),
            index: Box::new(index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sksl::expression::{Modifiers, Variable};

    #[test]
    fn test_make_keeps_dynamic_vector_index() {
        let ctx = Context::default();
        let half3 = ctx.types.vector(&ctx.types.half, 3).expect("half3");
        let v = Arc::new(Variable::new("v", half3, Modifiers::empty()));
        let i = Arc::new(Variable::new("i", Arc::clone(&ctx.types.int), Modifiers::empty()));

        let expr = IndexExpression::make(
            &ctx,
            Expression::variable_reference(5, &v),
            Expression::variable_reference(5, &i),
        );
        let Expression::Index(index) = &expr else {
            panic!("expected generic index, got {expr}");
        };
        assert_eq!(index.line, 5);
        assert_eq!(*index.ty, *ctx.types.half);
    }

    #[test]
    fn test_index_type_of_vectors_and_arrays() {
        let ctx = Context::default();
        let int4 = ctx.types.vector(&ctx.types.int, 4).expect("int4");
        assert_eq!(*IndexExpression::index_type(&ctx, &int4), *ctx.types.int);

        let float2 = ctx.types.vector(&ctx.types.float, 2).expect("float2");
        let array = Arc::new(Type::array_of(&float2, 3));
        assert_eq!(*IndexExpression::index_type(&ctx, &array), *float2);

        let mat = ctx.types.matrix(&ctx.types.float, 4, 3).expect("float4x3");
        let float3 = ctx.types.vector(&ctx.types.float, 3).expect("float3");
        assert_eq!(*IndexExpression::index_type(&ctx, &mat), *float3);
    }

    #[test]
    fn test_type_reference_error_carries_line() {
        let ctx = Context::default();
        let mut symbols = SymbolTable::new();
        let base = Expression::type_reference(12, Arc::clone(&ctx.types.float), &ctx);

        let err = IndexExpression::convert(&ctx, &mut symbols, base, Expression::int_literal(12, 0, &ctx))
            .expect_err("zero-sized array");
        assert_eq!(err.line, 12);
        assert_eq!(err.to_string(), "12: array size must be positive");
        assert_eq!(symbols.array_type_count(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "constant index 300 out of range for 'float4'")]
    fn test_make_rejects_unchecked_constant_index() {
        let ctx = Context::default();
        let float4 = ctx.types.vector(&ctx.types.float, 4).expect("float4");
        let v = Arc::new(Variable::new("v", float4, Modifiers::empty()));
        let _ = IndexExpression::make(
            &ctx,
            Expression::variable_reference(1, &v),
            Expression::int_literal(1, 300, &ctx),
        );
    }
}
