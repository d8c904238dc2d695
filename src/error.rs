//! Error types and handling for the funfun crate.
//!
//! Parsing and name resolution report an [`ExprError`]. The compiler wraps it in a
//! [`CompileError`] tagged with the slot (`f1`, `f2` or `blend`) whose text failed, so the
//! editor can show the message next to the right field. Sampling and persistence have their
//! own small error enums; none of these errors is fatal to the host.

use core::fmt;
use core::result;

use crate::compiler::Slot;
use crate::Real;

/// Result type used by the parser and compiler.
pub type Result<T> = result::Result<T, ExprError>;

/// Error type for expression parsing and name resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    /// The lexer met a character or literal it cannot turn into a token.
    Tokenizer(String),

    /// The token sequence does not fit the arithmetic grammar.
    Syntax(String),

    /// An opening parenthesis without its closing partner, or the other way round.
    UnmatchedParenthesis { position: usize, found: String },

    /// A name that is neither reserved nor one of the compiled parameters.
    UnknownVariable { name: String },

    /// A call to something outside the fixed function library.
    UnknownFunction { name: String },

    /// A library function called with the wrong number of arguments.
    InvalidFunctionCall {
        /// Name of the function that was called
        name: String,
        /// Expected number of arguments
        expected: usize,
        /// Actual number of arguments provided
        found: usize,
    },

    /// A reserved name used where it has no value, such as `alpha` inside the blend
    /// expression that defines it.
    Unavailable { name: String },

    /// Nesting deeper than the parser's recursion limit.
    RecursionLimit(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Tokenizer(err) => write!(f, "Tokenizer error: {}", err),
            ExprError::Syntax(err) => write!(f, "Syntax error: {}", err),
            ExprError::UnmatchedParenthesis { position, found } => {
                write!(
                    f,
                    "Unmatched parenthesis at position {}: found '{}'",
                    position, found
                )
            }
            ExprError::UnknownVariable { name } => write!(f, "Unknown variable: '{}'", name),
            ExprError::UnknownFunction { name } => write!(f, "Unknown function: '{}'", name),
            ExprError::InvalidFunctionCall {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Invalid function call to '{}': expected {} arguments, found {}",
                    name, expected, found
                )
            }
            ExprError::Unavailable { name } => {
                write!(f, "'{}' cannot be used in this expression", name)
            }
            ExprError::RecursionLimit(err) => write!(f, "Recursion limit exceeded: {}", err),
        }
    }
}

impl std::error::Error for ExprError {}

/// A parse or resolution failure in one of the three expression slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub slot: Slot,
    pub error: ExprError,
}

impl CompileError {
    pub fn new(slot: Slot, error: ExprError) -> Self {
        Self { slot, error }
    }

    /// The message shown next to the offending editor field.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.slot, self.error)
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Invalid sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    /// At least one step is needed to span the domain.
    ZeroSteps,
    /// Viewport dimensions must be finite and positive.
    InvalidViewport { width: Real, height: Real },
    /// Domain bounds must be finite.
    InvalidDomain { min_x: Real, max_x: Real },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::ZeroSteps => write!(f, "Sample count must be at least 1"),
            SampleError::InvalidViewport { width, height } => {
                write!(f, "Invalid viewport {}x{}", width, height)
            }
            SampleError::InvalidDomain { min_x, max_x } => {
                write!(f, "Invalid domain [{}, {}]", min_x, max_x)
            }
        }
    }
}

impl std::error::Error for SampleError {}

/// Failure to read or write the persisted application state.
#[derive(Debug)]
pub enum StateError {
    /// The payload is not valid JSON.
    Json(serde_json::Error),
    /// The payload is valid JSON but not a flat object.
    NotAnObject,
    /// A known key holds a value of the wrong type.
    InvalidValue { key: String },
    /// The backing store could not be read or written.
    Io(std::io::Error),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Json(err) => write!(f, "Invalid state JSON: {}", err),
            StateError::NotAnObject => write!(f, "State must be a JSON object"),
            StateError::InvalidValue { key } => write!(f, "Invalid value for '{}'", key),
            StateError::Io(err) => write!(f, "State storage error: {}", err),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Json(err) => Some(err),
            StateError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> StateError {
        StateError::Json(err)
    }
}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> StateError {
        StateError::Io(err)
    }
}
