//! Implementation of the `Record.'get'(k)` built-in method.

use crate::error::RuntimeError;
use crate::function::NativeMethod;
use crate::token::CodeLoc;
use crate::value::Value;

pub const METHOD: NativeMethod = NativeMethod {
    name: "get",
    arity: 1,
    handler,
};

fn handler(me: Option<&Value>, args: &[Value], loc: CodeLoc) -> Result<Value, RuntimeError> {
    let me = me.ok_or(RuntimeError::MeNotBound { loc })?;
    let entries = me.as_record_entries().ok_or_else(|| RuntimeError::TypeMismatch {
        message: format!("'get' expects a record receiver, found {}", me.type_name()),
        loc,
    })?;
    let key = &args[0];
    entries
        .get(key.hash())
        .map(|(_, v)| v.clone())
        .ok_or_else(|| RuntimeError::MissingKey {
            message: format!("record has no key {key}"),
            loc,
        })
}
