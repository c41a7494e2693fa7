//! Implementation of the `Tuple.'push'(e)` built-in method.

use crate::error::RuntimeError;
use crate::function::NativeMethod;
use crate::token::CodeLoc;
use crate::value::Value;

pub const METHOD: NativeMethod = NativeMethod {
    name: "push",
    arity: 1,
    handler,
};

fn handler(me: Option<&Value>, args: &[Value], loc: CodeLoc) -> Result<Value, RuntimeError> {
    let me = me.ok_or(RuntimeError::MeNotBound { loc })?;
    let items = me.as_tuple_items().ok_or_else(|| RuntimeError::TypeMismatch {
        message: format!("'push' expects a tuple receiver, found {}", me.type_name()),
        loc,
    })?;
    let mut items = items.to_vec();
    items.push(args[0].clone());
    Ok(Value::tuple(items))
}
