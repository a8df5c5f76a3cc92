use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        RuntimeError { kind, span }
    }
}

/// Everything that can go wrong while evaluating a parsed program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Looked up a variable that is not bound in any enclosing scope.
    UndefinedVariable(String),
    /// Called a function that is not in the global function table.
    UndefinedFunction(String),
    /// Declared a variable that already exists in the same scope.
    DuplicateDeclaration(String),
    /// Called a user function with the wrong number of arguments.
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// Applied an operator to operand types it is not defined for.
    UnsupportedOperator {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },
    /// A condition (or loop bound) evaluated to the wrong type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        context: &'static str,
    },
    /// A native builtin reported a failure.
    Builtin(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable(name) => {
                write!(f, "cannot resolve '{}' as it does not exist", name)
            }
            Self::UndefinedFunction(name) => {
                write!(f, "function '{}' is not defined", name)
            }
            Self::DuplicateDeclaration(name) => {
                write!(f, "cannot declare '{}' as it is already defined", name)
            }
            Self::ArityMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "function '{}' expected {} arguments but got {}",
                name, expected, actual
            ),
            Self::UnsupportedOperator { op, lhs, rhs } => write!(
                f,
                "operator '{}' is not supported between {} and {}",
                op, lhs, rhs
            ),
            Self::TypeMismatch {
                expected,
                found,
                context,
            } => write!(f, "{} must be a {} but was a {}", context, expected, found),
            Self::Builtin(message) => write!(f, "{}", message),
        }
    }
}
