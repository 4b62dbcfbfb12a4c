//! # expreva
//!
//! expreva is an embeddable expression language written in Rust. Its surface
//! syntax mixes algebraic infix forms (`1 + 2 * x`, `f(a, b)`, `x => x*x`,
//! `if c then a else b`) with a homoiconic prefix form used internally as
//! the syntax tree (`['if', cond, a, b]`, `['lambda', [args], body]`). Host
//! programs parse a source string into that tree and evaluate it against an
//! environment they populate with host-provided functions.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    ast::Value,
    error::{ParseError, RuntimeError},
    interpreter::{
        evaluator::{
            core::Evaluator,
            environment::{Bindings, Env, Environment},
        },
        parser::core::Parser,
    },
};

/// Defines the structure of parsed code and of runtime values.
///
/// This module declares the homoiconic `Value` enum shared by the parser
/// and the evaluator, together with the callable types (`Lambda`,
/// `HostFunction`) and their helpers. The language is homoiconic, so the
/// syntax tree is a value and quoted data round-trips unchanged.
///
/// # Responsibilities
/// - Defines the value variants for every language construct.
/// - Provides constructors, accessors, truthiness, and equality.
/// - Declares the host-function signature and arity scheme.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// This module defines all errors that can be raised during lexing,
/// parsing, or evaluating code. It standardizes error reporting and carries
/// detailed information about failures, including positions for lexer and
/// parser errors and the partially parsed program for lint tooling.
///
/// # Responsibilities
/// - Defines error enums for all failure modes (lexer, parser, evaluator).
/// - Attaches line and column coordinates where they exist.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together lexing, parsing, evaluation, environments,
/// the standard bindings, and the pretty printers to provide a complete
/// runtime for source code evaluation.
///
/// # Responsibilities
/// - Coordinates all core components: lexer, parser, evaluator, printers.
/// - Provides entry points for parsing and evaluating user code.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// General utilities shared across phases.
///
/// Numeric formatting and checked conversions used by the lexer, the
/// evaluator, and the printers.
pub mod util;

pub use interpreter::printer::{syntax_tree_to_pretty_string, value_to_pretty_string};

/// Parses a source string into a syntax tree.
///
/// Empty input parses to `Nil`; several statements become a `do` sequence.
///
/// # Errors
/// Returns a [`ParseError`] carrying the failure position and the
/// statements that parsed before it.
///
/// # Examples
/// ```
/// use expreva::{parse, syntax_tree_to_pretty_string};
///
/// let ast = parse("1 + 2 * 3").unwrap();
/// assert_eq!(syntax_tree_to_pretty_string(&ast), "1 + 2 * 3");
///
/// // Operator precedence shapes the tree: `*` binds tighter than `+`.
/// let grouped = parse("(1 + 2) * 3").unwrap();
/// assert_eq!(syntax_tree_to_pretty_string(&grouped), "(1 + 2) * 3");
/// ```
pub fn parse(source: &str) -> Result<Value, ParseError> {
    Parser::new(source)?.parse_program()
}

/// Evaluates a syntax tree, creating a fresh environment when the caller
/// does not supply one.
///
/// # Errors
/// Returns a [`RuntimeError`] when evaluation fails.
///
/// # Examples
/// ```
/// use expreva::{ast::Value, evaluate, parse};
///
/// let ast = parse("1 + 1").unwrap();
/// assert_eq!(evaluate(&ast, None).unwrap(), Value::Number(2.0));
/// ```
pub fn evaluate(ast: &Value, env: Option<&Env>) -> Result<Value, RuntimeError> {
    let evaluator = Evaluator::new();
    match env {
        Some(env) => evaluator.evaluate(ast, env),
        None => evaluator.evaluate(ast, &create_environment(None)),
    }
}

/// Seeds a new user environment: a child of the shared root that `def`
/// binds into, optionally populated with host-supplied bindings.
///
/// # Examples
/// ```
/// use expreva::{ast::Value, create_environment, evaluate, parse};
/// use expreva::interpreter::evaluator::environment::Bindings;
///
/// let mut initial = Bindings::new();
/// initial.set("x", Value::Number(41.0));
/// let env = create_environment(Some(initial));
///
/// let ast = parse("x + 1").unwrap();
/// assert_eq!(evaluate(&ast, Some(&env)).unwrap(), Value::Number(42.0));
/// ```
#[must_use]
pub fn create_environment(initial: Option<Bindings>) -> Env {
    Environment::user_global(initial)
}

/// Parses and evaluates a script in a fresh environment, optionally
/// printing the final value.
///
/// This is the entry point the CLI uses; the returned value is the last
/// statement's result.
///
/// # Errors
/// Returns an error if parsing or evaluation fails.
///
/// # Examples
/// ```
/// use expreva::{ast::Value, run_script};
///
/// let result = run_script("f = x => x * x  f(5)", false).unwrap();
/// assert_eq!(result, Value::Number(25.0));
///
/// // Unknown variable: 'y' is not defined.
/// assert!(run_script("y + 1", false).is_err());
/// ```
pub fn run_script(source: &str, auto_print: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let ast = parse(source)?;
    let value = evaluate(&ast, None)?;
    if auto_print && !matches!(value, Value::Nil) {
        println!("{value}");
    }
    Ok(value)
}
