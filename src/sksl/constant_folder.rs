//! Compile-time evaluation helpers used by index resolution.

use super::expression::{Expression, Modifiers};

/// Follows references to `const` variables with constant initializers and
/// returns the expression that ultimately provides the value.
///
/// Non-constant expressions are returned unchanged.
#[must_use]
pub fn get_constant_value_for_variable(expr: &Expression) -> &Expression {
    let mut current = expr;
    while let Expression::VariableReference(reference) = current {
        let variable = &reference.variable;
        if !variable.modifiers.contains(Modifiers::CONST) {
            break;
        }
        match &variable.initial_value {
            Some(value) if value.is_compile_time_constant() || is_const_reference(value) => {
                current = value;
            }
            _ => break,
        }
    }
    current
}

fn is_const_reference(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::VariableReference(r) if r.variable.modifiers.contains(Modifiers::CONST)
    )
}

/// The integer value of `expr` if it folds to an integer literal.
#[must_use]
pub fn get_constant_int(expr: &Expression) -> Option<i64> {
    get_constant_value_for_variable(expr).as_int_literal()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sksl::context::{Context, ProgramSettings};
    use crate::sksl::expression::Variable;

    #[test]
    fn test_follows_const_chain() {
        let ctx = Context::new(ProgramSettings::default());
        let a = Arc::new(
            Variable::new("a", Arc::clone(&ctx.types.int), Modifiers::CONST)
                .with_initial_value(Expression::int_literal(1, 3, &ctx)),
        );
        let b = Arc::new(
            Variable::new("b", Arc::clone(&ctx.types.int), Modifiers::CONST)
                .with_initial_value(Expression::variable_reference(2, &a)),
        );

        let expr = Expression::variable_reference(3, &b);
        assert_eq!(get_constant_int(&expr), Some(3));
    }

    #[test]
    fn test_mutable_variable_is_not_constant() {
        let ctx = Context::new(ProgramSettings::default());
        let v = Arc::new(
            Variable::new("v", Arc::clone(&ctx.types.int), Modifiers::empty())
                .with_initial_value(Expression::int_literal(1, 3, &ctx)),
        );

        let expr = Expression::variable_reference(2, &v);
        assert_eq!(get_constant_int(&expr), None);
    }
}
