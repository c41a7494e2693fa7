//! Error taxonomy shared by every pipeline stage.
//!
//! Each stage has its own error type so callers can tell which phase failed
//! without downcasting. None of these wrap a boxed trait object: every
//! variant is a concrete, matchable case, and `Display`/`Error` are
//! hand-written rather than derived.

use std::fmt;

use crate::token::CodeLoc;

/// Failure produced while turning source text into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    UnterminatedString { loc: CodeLoc },
    MalformedNumber { loc: CodeLoc },
    UnrecognizedSymbol { symbol: char, loc: CodeLoc },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::UnterminatedString { loc } => {
                write!(f, "unterminated string literal at {loc}")
            }
            ScanError::MalformedNumber { loc } => {
                write!(f, "decimals must have digits after the decimal point at {loc}")
            }
            ScanError::UnrecognizedSymbol { symbol, loc } => {
                write!(f, "unrecognizable symbol {symbol:?} at {loc}")
            }
        }
    }
}

impl std::error::Error for ScanError {}

/// Failure produced while turning tokens into an AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedToken {
        expected: &'static str,
        found: String,
        loc: CodeLoc,
    },
    UnexpectedEof {
        expected: &'static str,
    },
    InvalidAssignmentTarget {
        loc: CodeLoc,
    },
    RestParameterNotLast {
        loc: CodeLoc,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                loc,
            } => write!(f, "expected {expected} but found {found} at {loc}"),
            ParseError::UnexpectedEof { expected } => {
                write!(f, "expected {expected} but reached end of input")
            }
            ParseError::InvalidAssignmentTarget { loc } => {
                write!(f, "invalid assignment target at {loc}")
            }
            ParseError::RestParameterNotLast { loc } => {
                write!(f, "rest parameter must be the last parameter at {loc}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Failure produced while statically validating an AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticError {
    UnresolvedIdentifier { name: String, loc: CodeLoc },
    Redeclaration { name: String, loc: CodeLoc },
    DeclarationArityMismatch { loc: CodeLoc },
    AssignmentArityMismatch { loc: CodeLoc },
    NotMutable { name: String, loc: CodeLoc },
    MeOutsideMethod { loc: CodeLoc },
    QuestionOutsidePipe { loc: CodeLoc },
    PipeMissingQuestion { loc: CodeLoc },
    ReturnOutsideCallable { loc: CodeLoc },
    LoopControlOutsideWhile { loc: CodeLoc },
    RestParameterNotLast { loc: CodeLoc },
}

impl fmt::Display for StaticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticError::UnresolvedIdentifier { name, loc } => {
                write!(f, "unresolved identifier {name:?} at {loc}")
            }
            StaticError::Redeclaration { name, loc } => {
                write!(f, "{name:?} is already declared in this scope at {loc}")
            }
            StaticError::DeclarationArityMismatch { loc } => {
                write!(f, "declaration names and initializers counts differ at {loc}")
            }
            StaticError::AssignmentArityMismatch { loc } => {
                write!(f, "assignment targets and values counts differ at {loc}")
            }
            StaticError::NotMutable { name, loc } => {
                write!(f, "{name:?} is not declared mutable at {loc}")
            }
            StaticError::MeOutsideMethod { loc } => {
                write!(f, "`me` used outside a proto method at {loc}")
            }
            StaticError::QuestionOutsidePipe { loc } => {
                write!(f, "`?` used outside a pipe expression at {loc}")
            }
            StaticError::PipeMissingQuestion { loc } => {
                write!(f, "pipe right-hand side never references `?` at {loc}")
            }
            StaticError::ReturnOutsideCallable { loc } => {
                write!(f, "`return` used outside a function or method at {loc}")
            }
            StaticError::LoopControlOutsideWhile { loc } => {
                write!(f, "`break`/`continue` used outside a `while` loop at {loc}")
            }
            StaticError::RestParameterNotLast { loc } => {
                write!(f, "rest parameter must be the last parameter at {loc}")
            }
        }
    }
}

impl std::error::Error for StaticError {}

/// Failure produced while evaluating an already-validated AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    TypeMismatch { message: String, loc: CodeLoc },
    NotCallable { loc: CodeLoc },
    NonBooleanCondition { loc: CodeLoc },
    NonBooleanOperand { loc: CodeLoc },
    SpreadNonTuple { loc: CodeLoc },
    MissingKey { message: String, loc: CodeLoc },
    MeNotBound { loc: CodeLoc },
    QuestionNotBound { loc: CodeLoc },
    UnresolvedIdentifier { name: String, loc: CodeLoc },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeMismatch { message, loc } => write!(f, "{message} at {loc}"),
            RuntimeError::NotCallable { loc } => write!(f, "value is not callable at {loc}"),
            RuntimeError::NonBooleanCondition { loc } => {
                write!(f, "condition did not evaluate to a boolean at {loc}")
            }
            RuntimeError::NonBooleanOperand { loc } => {
                write!(f, "logical operand did not evaluate to a boolean at {loc}")
            }
            RuntimeError::SpreadNonTuple { loc } => {
                write!(f, "spread target is not a tuple at {loc}")
            }
            RuntimeError::MissingKey { message, loc } => write!(f, "{message} at {loc}"),
            RuntimeError::MeNotBound { loc } => write!(f, "`me` is not bound here at {loc}"),
            RuntimeError::QuestionNotBound { loc } => write!(f, "`?` is not bound here at {loc}"),
            RuntimeError::UnresolvedIdentifier { name, loc } => {
                write!(f, "unresolved identifier {name:?} at {loc}")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Top-level error uniting every stage, for callers that drive the whole
/// pipeline (the CLI, integration tests) and don't care which stage failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RillError {
    Scan(ScanError),
    Parse(ParseError),
    Static(StaticError),
    Runtime(RuntimeError),
}

impl fmt::Display for RillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RillError::Scan(e) => write!(f, "scan error: {e}"),
            RillError::Parse(e) => write!(f, "parse error: {e}"),
            RillError::Static(e) => write!(f, "static error: {e}"),
            RillError::Runtime(e) => write!(f, "runtime error: {e}"),
        }
    }
}

impl std::error::Error for RillError {}

impl From<ScanError> for RillError {
    fn from(e: ScanError) -> Self {
        RillError::Scan(e)
    }
}

impl From<ParseError> for RillError {
    fn from(e: ParseError) -> Self {
        RillError::Parse(e)
    }
}

impl From<StaticError> for RillError {
    fn from(e: StaticError) -> Self {
        RillError::Static(e)
    }
}

impl From<RuntimeError> for RillError {
    fn from(e: RuntimeError) -> Self {
        RillError::Runtime(e)
    }
}
