//! Built-in prototype methods, one file per method.
//!
//! Mirrors the teacher's one-file-per-builtin convention
//! (`ouros/src/builtins/<name>.rs`): each module exposes a single `METHOD`
//! constant and the handler function that backs it.

pub mod boolean_stringify;
pub mod number_stringify;
pub mod record_get;
pub mod string_upper;
pub mod tuple_push;
