//! Church encodings evaluated on a trampolined call-by-value machine.
//!
//! Booleans, numerals, pairs and lists are encoded as lambda terms; recursive
//! functions (factorial, Fibonacci, modulo, map, filter, reduce) are built
//! with the `Z` fixed-point combinator instead of named recursion.
//!
//! ```
//! use church::{EvalConfig, Runtime};
//!
//! let mut rt = Runtime::new(EvalConfig::default()).unwrap();
//! let four = rt.numeral(4);
//! let fact = rt.factorial(four);
//! assert_eq!(rt.decode_numeral(fact).unwrap(), 24);
//! ```

pub mod config;
pub mod error;
pub mod parse;
pub mod prelude;
pub mod runtime;
pub mod strict;
pub mod term;

pub use config::EvalConfig;
pub use error::{EvalError, EvalResult, ParseError};
pub use prelude::Prelude;
pub use runtime::Runtime;
pub use term::TermPtr;
