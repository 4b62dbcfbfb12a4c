#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur during evaluation.
///
/// The homoiconic AST carries no source positions, so runtime errors report
/// what failed rather than where; positions exist only in lexer and parser
/// diagnostics.
pub enum RuntimeError {
    /// Looked up a symbol with no binding anywhere in the scope chain.
    UndefinedSymbol {
        /// The name of the symbol.
        name: String,
    },
    /// Applied member access to a value that has no members.
    NotIndexable {
        /// The type of the offending base value.
        type_name: &'static str,
    },
    /// Invoked a value that is not callable.
    NotCallable {
        /// The type of the offending value.
        type_name: &'static str,
    },
    /// An `if` form was missing its condition or then-branch.
    MalformedIf,
    /// A function parameter definition was not a name, default, or rest form.
    BadArgDef {
        /// Rendered form of the offending definition.
        detail: String,
    },
    /// A host function reported a failure.
    HostError {
        /// The name of the host function.
        name:    String,
        /// The failure reported by the host.
        message: String,
    },
    /// An error raised explicitly by user or host code.
    Raised {
        /// The raised message.
        message: String,
    },
    /// The host's tick hook requested cancellation.
    Cancelled,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndefinedSymbol { name } => write!(f, "Error: Undefined symbol '{name}'."),
            Self::NotIndexable { type_name } => {
                write!(f, "Error: A value of type {type_name} has no members.")
            },
            Self::NotCallable { type_name } => {
                write!(f, "Error: A value of type {type_name} cannot be called.")
            },
            Self::MalformedIf => {
                write!(f, "Error: 'if' requires a condition and a then-branch.")
            },
            Self::BadArgDef { detail } => {
                write!(f, "Error: Invalid function parameter: {detail}.")
            },
            Self::HostError { name, message } => write!(f, "Error in '{name}': {message}"),
            Self::Raised { message } => write!(f, "Error: {message}"),
            Self::Cancelled => write!(f, "Error: Evaluation was cancelled."),
        }
    }
}

impl std::error::Error for RuntimeError {}
