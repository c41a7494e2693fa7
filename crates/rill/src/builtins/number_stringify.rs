//! Implementation of the `Number.'stringify'()` built-in method.

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
    let n = me.as_number().ok_or_else(|| RuntimeError::TypeMismatch {
        message: format!(
            "'stringify' expects a number receiver, found {}",
            me.type_name()
        ),
        loc,
    })?;
    Ok(Value::string(format_number(n)))
}

/// Shortest round-trip decimal representation: integral values print
/// without a trailing `.0`, matching how the language's own number
/// literals look.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
