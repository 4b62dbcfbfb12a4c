/// Lexing and parsing errors.
///
/// Defines all error types that can occur while turning source text into an
/// AST: unrecognized characters, unexpected or missing tokens, unclosed
/// delimiters, and invalid construct shapes. Parse errors carry the partially
/// parsed program for host-side lint overlays.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised during evaluation: unbound
/// symbols, member access on non-indexable values, malformed special forms,
/// wrapped host-function failures, and tick-hook cancellation.
pub mod runtime_error;

pub use parse_error::{LexError, ParseError, ParseErrorKind};
pub use runtime_error::RuntimeError;
