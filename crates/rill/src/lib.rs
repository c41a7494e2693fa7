//! A small expression-oriented scripting language: scanner, parser,
//! static analyzer, and tree-walking evaluator.
//!
//! The four stages are meant to be run in order:
//!
//! ```
//! let source = "let a = 1; let b = 2; a + b";
//! let tokens = rill::scan(source).unwrap();
//! let program = rill::parse(tokens).unwrap();
//! rill::analyze(&program).unwrap();
//! let value = rill::evaluate(&program).unwrap();
//! assert_eq!(value.as_number(), Some(3.0));
//! ```
//!
//! [`run`] is a convenience wrapper over all four stages for callers (the
//! CLI, integration tests) that don't need to inspect intermediate output.

pub mod analyzer;
pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

pub use ast::Node;
pub use error::{ParseError, RillError, RuntimeError, ScanError, StaticError};
pub use token::Token;
pub use value::Value;

pub use analyzer::analyze;
pub use evaluator::evaluate;
pub use parser::parse;
pub use scanner::scan;

/// Runs source text through every stage, returning the value of its last
/// expression-statement. A thin convenience wrapper — callers who need to
/// report errors per-stage (e.g. to format a scan error differently from a
/// runtime one) should call [`scan`], [`parse`], [`analyze`], and
/// [`evaluate`] directly instead.
pub fn run(source: &str) -> Result<Value, RillError> {
    let tokens = scan(source)?;
    let program = parse(tokens)?;
    analyze(&program)?;
    Ok(evaluate(&program)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_executes_a_full_program() {
        assert_eq!(run("1 + 2").unwrap().as_number(), Some(3.0));
    }

    #[test]
    fn run_surfaces_static_errors_before_evaluating() {
        assert!(matches!(run("a;"), Err(RillError::Static(_))));
    }

    #[test]
    fn run_surfaces_scan_errors() {
        assert!(matches!(run("'unterminated"), Err(RillError::Scan(_))));
    }
}
