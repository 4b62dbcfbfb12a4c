/// The evaluator module executes syntax trees and computes results.
///
/// The evaluator walks the homoiconic AST against a chain of lexical
/// scopes, dispatching special forms directly and invoking lambdas and
/// host functions, with a trampoline for tail positions and macro
/// expansion before dispatch.
///
/// # Responsibilities
/// - Evaluates syntax trees, implementing every special form.
/// - Manages environments, closures, and the host-function bridge.
/// - Reports runtime errors and honors the host's tick hook.
pub mod evaluator;
/// The lexer module tokenizes source code for further parsing.
///
/// The lexer reads the raw source text through an ordered table of regular
/// rules and produces tokens carrying decoded literal values and source
/// positions. This is the first stage of interpretation.
///
/// # Responsibilities
/// - Converts the input character stream into tokens with type and source
///   location.
/// - Handles numeric and string literals, identifiers, and operators.
/// - Reports lexical errors for invalid or malformed input.
pub mod lexer;
/// The parser module builds the syntax tree from tokens.
///
/// The parser processes the token stream with top-down operator precedence
/// (Pratt parsing) and constructs the nested-list AST the evaluator
/// consumes.
///
/// # Responsibilities
/// - Converts tokens into list forms for every language construct.
/// - Resolves the ambiguous operators (`-`, `(`, `->`, `=>`) by binding
///   power and token adjacency.
/// - Reports parse errors with positions and the partially parsed program.
pub mod parser;
/// Pretty printers for diagnostics.
///
/// Renders runtime values for display and unparses syntax trees back to
/// minimally parenthesized surface syntax.
pub mod printer;
