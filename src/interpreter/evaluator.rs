/// The standard-bindings table.
///
/// Builds the host-function library registered in the root environment at
/// startup: arithmetic, comparison, logic, and the list, object, and string
/// helpers, plus the `true` and `false` constants.
pub mod builtin;

/// The evaluation engine.
///
/// Contains the `Evaluator` with its optional tick hook, the trampolined
/// `evaluate` loop that rewrites `(ast, env)` in tail positions, atom
/// evaluation, and special-form dispatch.
pub mod core;

/// Lexical scopes.
///
/// Defines the insertion-ordered `Bindings` map and the `Environment` chain
/// with parent lookup, global binding, and the shared root scope.
pub mod environment;

/// Function invocation.
///
/// Implements lambda and host-function application, function-scope binding
/// (positional, default, and rest parameters), and macro expansion.
pub mod function;

/// Structure-building special forms.
///
/// Evaluates `list` and `obj` construction with spread, `def` binding and
/// member assignment, `get` member walks with method binding, and the
/// shared member read/write helpers.
pub mod special;
