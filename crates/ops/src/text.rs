use jobwire_core::codec::Value;

use crate::args::CallArgs;
use crate::error::OperationError;
use crate::registry::OperationTable;

pub fn table() -> OperationTable {
    OperationTable::new()
        .with("upper", upper)
        .with("lower", lower)
        .with("reverse", reverse)
        .with("word_count", word_count)
}

pub fn upper(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("upper", &["text"])?;
    Ok(Value::String(bound.string(0)?.to_uppercase()))
}

pub fn lower(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("lower", &["text"])?;
    Ok(Value::String(bound.string(0)?.to_lowercase()))
}

/// Reverse by Unicode scalar value.
pub fn reverse(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("reverse", &["text"])?;
    Ok(Value::String(bound.string(0)?.chars().rev().collect()))
}

/// Count whitespace-separated words.
pub fn word_count(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("word_count", &["text"])?;
    let count = bound.string(0)?.split_whitespace().count();
    Ok(Value::Int(count as i64))
}
