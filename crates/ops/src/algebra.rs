//! Scalar arithmetic on `x` and `y`.
//!
//! Two ints stay ints and overflow is an error. Any float operand promotes
//! the result to float. Division always yields a float.

use jobwire_core::codec::Value;

use crate::args::{Bound, CallArgs};
use crate::error::OperationError;
use crate::registry::OperationTable;

pub fn table() -> OperationTable {
    OperationTable::new()
        .with("add", add)
        .with("sub", sub)
        .with("mul", mul)
        .with("div", div)
}

pub fn add(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("add", &["x", "y"])?;
    arithmetic(&bound, i64::checked_add, |x, y| x + y)
}

pub fn sub(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("sub", &["x", "y"])?;
    arithmetic(&bound, i64::checked_sub, |x, y| x - y)
}

pub fn mul(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("mul", &["x", "y"])?;
    arithmetic(&bound, i64::checked_mul, |x, y| x * y)
}

pub fn div(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("div", &["x", "y"])?;
    let x = bound.number(0)?;
    let y = bound.number(1)?;
    if y == 0.0 {
        return Err(OperationError::Failed {
            operation: bound.operation(),
            reason: "division by zero".to_string(),
        });
    }
    finite(&bound, x / y)
}

fn arithmetic(
    bound: &Bound<'_>,
    ints: fn(i64, i64) -> Option<i64>,
    floats: fn(f64, f64) -> f64,
) -> Result<Value, OperationError> {
    let x = bound.required(0)?;
    let y = bound.required(1)?;
    if let (Value::Int(x), Value::Int(y)) = (x, y) {
        return ints(*x, *y).map(Value::Int).ok_or(OperationError::Failed {
            operation: bound.operation(),
            reason: "integer overflow".to_string(),
        });
    }
    finite(bound, floats(bound.number(0)?, bound.number(1)?))
}

fn finite(bound: &Bound<'_>, result: f64) -> Result<Value, OperationError> {
    if result.is_finite() {
        Ok(Value::Float(result))
    } else {
        Err(OperationError::Failed {
            operation: bound.operation(),
            reason: format!("result is not finite ({result})"),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn pair(x: impl Into<Value>, y: impl Into<Value>) -> CallArgs {
        CallArgs::positional(vec![x.into(), y.into()])
    }

    #[test]
    fn ints_stay_ints() {
        assert_eq!(add(&pair(2i64, 3i64)).unwrap(), Value::Int(5));
        assert_eq!(sub(&pair(2i64, 3i64)).unwrap(), Value::Int(-1));
        assert_eq!(mul(&pair(4i64, 3i64)).unwrap(), Value::Int(12));
    }

    #[test]
    fn floats_promote() {
        assert_eq!(add(&pair(2i64, 0.5)).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn division_yields_float() {
        assert_eq!(div(&pair(7i64, 2i64)).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn division_by_zero_fails() {
        let err = div(&pair(1i64, 0i64)).unwrap_err();
        assert_eq!(err.to_string(), "div failed: division by zero");
    }

    #[test]
    fn overflow_fails() {
        assert_matches!(
            add(&pair(i64::MAX, 1i64)),
            Err(OperationError::Failed { operation: "add", .. })
        );
    }

    #[test]
    fn keyword_operands() {
        let call = CallArgs::default().with_kwarg("x", 10i64).with_kwarg("y", 4i64);
        assert_eq!(sub(&call).unwrap(), Value::Int(6));
    }

    #[test]
    fn non_numeric_operand_rejected() {
        assert_matches!(
            add(&pair("1", 2i64)),
            Err(OperationError::InvalidArgument { parameter: "x", .. })
        );
    }
}
