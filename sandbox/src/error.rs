use std::fmt;
use std::ops::Range;

/// Everything that can stop a script run. Messages read like the script
/// environment's own error messages; [`RuntimeError::kind`] names the class.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("{0}")]
    Syntax(String),
    #[error("{0} is not defined")]
    ReferenceError(String),
    #[error("{0}")]
    TypeError(String),
    #[error("{0} is not a function")]
    NotAFunction(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("step limit of {0} exceeded (is there an infinite loop?)")]
    StepLimitExceeded(u64),
    #[error("maximum call stack size exceeded")]
    StackOverflow,
    #[error("illegal {0} statement outside of a loop")]
    IllegalControlFlow(&'static str),
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::TypeError(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::Syntax(_) | RuntimeError::IllegalControlFlow(_) => "SyntaxError",
            RuntimeError::ReferenceError(_) => "ReferenceError",
            RuntimeError::TypeError(_) | RuntimeError::NotAFunction(_) => "TypeError",
            RuntimeError::DivisionByZero | RuntimeError::StepLimitExceeded(_) | RuntimeError::StackOverflow => {
                "RangeError"
            }
        }
    }
}

/// A runtime error together with the source location it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub error: RuntimeError,
    pub span: Option<Range<usize>>,
    pub source_id: usize,
}

impl Fault {
    pub fn new(error: RuntimeError, span: Range<usize>, source_id: usize) -> Self {
        Fault {
            error,
            span: Some(span),
            source_id,
        }
    }

    /// Attach `span` unless a more precise one is already known.
    pub(crate) fn at(mut self, span: &Range<usize>, source_id: usize) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
            self.source_id = source_id;
        }
        self
    }
}

impl From<RuntimeError> for Fault {
    fn from(error: RuntimeError) -> Self {
        Fault {
            error,
            span: None,
            source_id: 0,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for Fault {}
