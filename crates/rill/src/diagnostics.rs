//! Renders pipeline errors into terminal-friendly diagnostics.
//!
//! The error types in [`crate::error`] are plain, matchable data — this
//! module is the one place that turns them into the text a user actually
//! reads, pairing the message with the offending source line and a caret
//! pointing at the column.

use crate::error::RillError;
use crate::token::CodeLoc;

/// Extracts the single source line at `loc.row`, if the program is short
/// enough that the row is in range (0-indexed, matching the scanner).
fn source_line(source: &str, loc: CodeLoc) -> Option<&str> {
    source.lines().nth(loc.row)
}

fn caret(col: usize) -> String {
    format!("{}^", " ".repeat(col))
}

/// Renders `source_line`/caret context under `message`, if `loc` falls
/// within `source`. Used by every stage-specific render function below.
fn with_context(message: String, source: &str, loc: CodeLoc) -> String {
    match source_line(source, loc) {
        Some(line) => format!("{message}\n  {line}\n  {}", caret(loc.col)),
        None => message,
    }
}

/// Renders a [`RillError`] against the source text it was produced from.
#[must_use]
pub fn render(source: &str, error: &RillError) -> String {
    match error {
        RillError::Scan(e) => with_context(format!("scan error: {e}"), source, scan_loc(e)),
        RillError::Parse(e) => match parse_loc(e) {
            Some(loc) => with_context(format!("parse error: {e}"), source, loc),
            None => format!("parse error: {e}"),
        },
        RillError::Static(e) => with_context(format!("static error: {e}"), source, static_loc(e)),
        RillError::Runtime(e) => with_context(format!("runtime error: {e}"), source, runtime_loc(e)),
    }
}

fn scan_loc(e: &crate::error::ScanError) -> CodeLoc {
    use crate::error::ScanError::{MalformedNumber, UnrecognizedSymbol, UnterminatedString};
    match e {
        UnterminatedString { loc } | MalformedNumber { loc } | UnrecognizedSymbol { loc, .. } => {
            *loc
        }
    }
}

fn parse_loc(e: &crate::error::ParseError) -> Option<CodeLoc> {
    use crate::error::ParseError::{
        InvalidAssignmentTarget, RestParameterNotLast, UnexpectedEof, UnexpectedToken,
    };
    match e {
        UnexpectedToken { loc, .. } | InvalidAssignmentTarget { loc } | RestParameterNotLast { loc } => {
            Some(*loc)
        }
        UnexpectedEof { .. } => None,
    }
}

fn static_loc(e: &crate::error::StaticError) -> CodeLoc {
    use crate::error::StaticError::{
        AssignmentArityMismatch, DeclarationArityMismatch, LoopControlOutsideWhile,
        MeOutsideMethod, NotMutable, PipeMissingQuestion, QuestionOutsidePipe, Redeclaration,
        RestParameterNotLast, ReturnOutsideCallable, UnresolvedIdentifier,
    };
    match e {
        UnresolvedIdentifier { loc, .. }
        | Redeclaration { loc, .. }
        | DeclarationArityMismatch { loc }
        | AssignmentArityMismatch { loc }
        | NotMutable { loc, .. }
        | MeOutsideMethod { loc }
        | QuestionOutsidePipe { loc }
        | PipeMissingQuestion { loc }
        | ReturnOutsideCallable { loc }
        | LoopControlOutsideWhile { loc }
        | RestParameterNotLast { loc } => *loc,
    }
}

fn runtime_loc(e: &crate::error::RuntimeError) -> CodeLoc {
    use crate::error::RuntimeError::{
        MeNotBound, MissingKey, NonBooleanCondition, NonBooleanOperand, NotCallable,
        QuestionNotBound, SpreadNonTuple, TypeMismatch, UnresolvedIdentifier,
    };
    match e {
        TypeMismatch { loc, .. }
        | NotCallable { loc }
        | NonBooleanCondition { loc }
        | NonBooleanOperand { loc }
        | SpreadNonTuple { loc }
        | MissingKey { loc, .. }
        | MeNotBound { loc }
        | QuestionNotBound { loc }
        | UnresolvedIdentifier { loc, .. } => *loc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RillError, StaticError};

    #[test]
    fn renders_message_with_source_line_and_caret() {
        let source = "a;";
        let err = crate::run(source).expect_err("expected an unresolved identifier");
        let rendered = render(source, &err);
        assert!(rendered.contains("unresolved identifier"));
        assert!(rendered.contains("a;"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn points_at_the_right_line_for_a_second_line_error() {
        let source = "let x = 1;\nb;";
        let err = crate::run(source).expect_err("expected an unresolved identifier");
        let rendered = render(source, &err);
        let shown_line = rendered.lines().nth(1).unwrap().trim();
        assert_eq!(shown_line, "b;");
    }

    #[test]
    fn first_line_error_still_shows_source_context() {
        let source = "a;";
        let err = RillError::Static(StaticError::UnresolvedIdentifier {
            name: "a".to_string(),
            loc: CodeLoc::new(0, 0),
        });
        let rendered = render(source, &err);
        assert!(rendered.contains("a;"));
        assert!(rendered.ends_with('^'));
    }

    #[test]
    fn falls_back_to_bare_message_when_loc_out_of_range() {
        let err = RillError::Parse(crate::error::ParseError::UnexpectedEof { expected: "';'" });
        assert_eq!(render("", &err), "parse error: expected ';' but reached end of input");
    }
}
