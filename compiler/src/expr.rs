use crate::symbol_table::{DataType, Value};
use crate::tac::Operand;

/// Result of evaluating an expression: the folded compile-time value, used
/// only for checking and constant tracking, and the operand that holds the
/// same value at runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExprValue {
    pub ty: DataType,
    pub value: Value,
    pub reference: Operand,
}

impl ExprValue {
    pub fn literal(value: Value) -> Self {
        Self {
            ty: value.ty(),
            reference: Operand::Literal(value.clone()),
            value,
        }
    }

    pub fn symbol(name: &str, ty: DataType, value: Value) -> Self {
        Self {
            ty,
            value,
            reference: Operand::Symbol(name.into()),
        }
    }
}
