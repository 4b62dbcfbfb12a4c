use crate::ast::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents a failure to tokenize source text.
pub enum LexError {
    /// No lexer rule matched at the current position.
    UnrecognizedCharacter {
        /// The source line where the error occurred.
        line:   usize,
        /// The source column where the error occurred.
        column: usize,
    },
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedCharacter { line, column } => {
                write!(f,
                       "Error on line {line}, column {column}: Unrecognized character.")
            },
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, PartialEq)]
/// Identifies what went wrong while parsing.
pub enum ParseErrorKind {
    /// Found an unexpected token while parsing.
    UnexpectedToken {
        /// The token encountered.
        token: String,
    },
    /// Reached the end of input unexpectedly.
    UnexpectedEndOfInput,
    /// A specific token was expected but something else was found.
    ExpectedToken {
        /// The token that was expected.
        expected: String,
        /// The token actually found.
        found:    String,
    },
    /// An opening delimiter was never closed.
    UnclosedDelimiter {
        /// The opening delimiter.
        delimiter: char,
    },
    /// The left-hand side of an assignment cannot be bound.
    InvalidAssignmentTarget,
    /// A function parameter definition was not a name, default, or rest form.
    InvalidParameter {
        /// Rendered form of the offending parameter.
        found: String,
    },
    /// An object key was not an identifier, number, string, or `(expr)`.
    InvalidObjectKey {
        /// The token found in key position.
        found: String,
    },
    /// A reserved word was used in expression position.
    ReservedWord {
        /// The reserved word.
        name: String,
    },
    /// The input could not be tokenized at all.
    UnrecognizedCharacter,
}

#[derive(Debug, Clone, PartialEq)]
/// Represents all errors that can occur while parsing source text.
///
/// Alongside the failure kind and position, a parse error carries the
/// statements that parsed successfully before the failure, so hosts can
/// display partially parsed output (lint overlays, editor feedback).
pub struct ParseError {
    /// What went wrong.
    pub kind:    ParseErrorKind,
    /// The source line where the error occurred.
    pub line:    usize,
    /// The source column where the error occurred.
    pub column:  usize,
    /// The statements parsed before the failure, as a `do` sequence
    /// (`Value::Nil` when nothing parsed).
    pub partial: Value,
}

impl ParseError {
    /// Creates a parse error with no partial program attached.
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self { kind,
               line,
               column,
               partial: Value::Nil }
    }

    /// Attaches the partially parsed program to this error.
    #[must_use]
    pub fn with_partial(mut self, partial: Value) -> Self {
        self.partial = partial;
        self
    }

    /// Returns the failure description without the position prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            ParseErrorKind::UnexpectedToken { token } => format!("Unexpected token: {token}."),
            ParseErrorKind::UnexpectedEndOfInput => "Unexpected end of input.".to_string(),
            ParseErrorKind::ExpectedToken { expected, found } => {
                format!("Expected {expected} but found {found}.")
            },
            ParseErrorKind::UnclosedDelimiter { delimiter } => {
                format!("Unclosed delimiter '{delimiter}'.")
            },
            ParseErrorKind::InvalidAssignmentTarget => {
                "Only a name or a member expression can be assigned to.".to_string()
            },
            ParseErrorKind::InvalidParameter { found } => {
                format!("Invalid function parameter: {found}.")
            },
            ParseErrorKind::InvalidObjectKey { found } => format!("Invalid object key: {found}."),
            ParseErrorKind::ReservedWord { name } => format!("'{name}' is a reserved word."),
            ParseErrorKind::UnrecognizedCharacter => "Unrecognized character.".to_string(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f,
               "Error on line {}, column {}: {}",
               self.line,
               self.column,
               self.message())
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        match error {
            LexError::UnrecognizedCharacter { line, column } => {
                Self::new(ParseErrorKind::UnrecognizedCharacter, line, column)
            },
        }
    }
}
