//! Implementation of the `Boolean.'stringify'()` built-in method.

use crate::error::RuntimeError;
use crate::function::NativeMethod;
use crate::token::CodeLoc;
use crate::value::Value;

pub const METHOD: NativeMethod = NativeMethod {
    name: "stringify",
    arity: 0,
    handler,
};

fn handler(me: Option<&Value>, _args: &[Value], loc: CodeLoc) -> Result<Value, RuntimeError> {
    let me = me.ok_or(RuntimeError::MeNotBound { loc })?;
    let b = me.as_boolean().ok_or_else(|| RuntimeError::TypeMismatch {
        message: format!(
            "'stringify' expects a boolean receiver, found {}",
            me.type_name()
        ),
        loc,
    })?;
    Ok(Value::string(if b { "true" } else { "false" }))
}
