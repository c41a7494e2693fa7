//! Implementation of the `String.'upper'()` built-in method.

use crate::error::RuntimeError;
use crate::function::NativeMethod;
use crate::token::CodeLoc;
use crate::value::Value;

pub const METHOD: NativeMethod = NativeMethod {
    name: "upper",
    arity: 0,
    handler,
};

fn handler(me: Option<&Value>, _args: &[Value], loc: CodeLoc) -> Result<Value, RuntimeError> {
    let me = me.ok_or(RuntimeError::MeNotBound { loc })?;
    let s = me.as_str().ok_or_else(|| RuntimeError::TypeMismatch {
        message: format!(
            "'upper' expects a string receiver, found {}",
            me.type_name()
        ),
        loc,
    })?;
    Ok(Value::string(s.to_uppercase()))
}
