// Error types for parsing and evaluating lambda terms

use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that abort an evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
  /// Too many nested continuation frames; stands in for host stack exhaustion
  #[error("recursion depth limit of {limit} frames exceeded")]
  DepthExceeded { limit: usize },

  #[error("step limit of {limit} reductions exceeded")]
  StepLimitExceeded { limit: u64 },

  #[error("cannot apply {found} to an argument")]
  NotAFunction { found: &'static str },

  #[error("expected a pair, found {found}")]
  NotAPair { found: &'static str },

  #[error("expected a list, found {found}")]
  NotAList { found: &'static str },

  #[error("term does not decode to a numeral, found {found}")]
  NotANumeral { found: &'static str },

  #[error("term does not decode to a boolean, found {found}")]
  NotABoolean { found: &'static str },

  #[error("primitive {opr} expects integers, found {found}")]
  TypeMismatch { opr: &'static str, found: &'static str },

  #[error("integer overflow while decoding")]
  IntegerOverflow,

  /// A de Bruijn index pointing past the environment
  #[error("unbound variable with index {0}")]
  UnboundVariable(usize),

  #[error("no definition named {0}")]
  UnknownDefinition(String),
}

/// Errors raised while reading lambda notation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  #[error("unexpected character {ch:?} at offset {offset}")]
  UnexpectedChar { ch: char, offset: usize },

  #[error("unexpected {found} at offset {offset}, expected {expected}")]
  UnexpectedToken {
    found: String,
    expected: &'static str,
    offset: usize,
  },

  #[error("unexpected end of input, expected {expected}")]
  UnexpectedEnd { expected: &'static str },

  #[error("integer literal {literal} at offset {offset} is out of range")]
  InvalidInteger { literal: String, offset: usize },

  #[error("unknown name {name} at offset {offset}")]
  UnknownName { name: String, offset: usize },

  #[error("nesting deeper than {limit} levels at offset {offset}")]
  TooDeep { limit: usize, offset: usize },

  #[error("{name} is already defined")]
  Redefinition { name: String },
}
