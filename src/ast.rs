use std::{cell::RefCell, rc::Rc};

use crate::interpreter::evaluator::{
    core::Evaluator,
    environment::{Bindings, Env},
};

/// The head symbol of a quoted subtree.
pub const QUOTE: &str = "`";

/// Represents both a syntax tree and a runtime value.
///
/// The language is homoiconic: the parser produces a `Value` whose list forms
/// have symbol heads (`['+', 2, ['*', 3, 'x']]`), and the evaluator consumes
/// and produces the same type. Quoted data therefore round-trips between code
/// and values without conversion.
#[derive(Clone)]
pub enum Value {
    /// The absence of a value; produced by forms with nothing useful to
    /// return (empty `do`, `comment`, a missing `else` branch).
    Nil,
    /// A numeric value (double-precision floating point).
    Number(f64),
    /// A boolean value.
    Bool(bool),
    /// A string value. In syntax trees strings appear quoted; a bare string
    /// in evaluation position is a [`Value::Symbol`] instead.
    Str(Rc<str>),
    /// A symbol: an identifier or operator name resolved against the
    /// environment when evaluated.
    Symbol(Rc<str>),
    /// An ordered sequence of values; also the node type of the syntax tree.
    List(Rc<Vec<Value>>),
    /// A mapping from string keys to values, insertion-order preserved.
    /// Objects share their storage, so mutation through one handle is
    /// visible through all others (scopes expose themselves this way via
    /// the `local` and `global` symbols).
    Object(Rc<RefCell<Bindings>>),
    /// A host-provided function.
    Function(Rc<HostFunction>),
    /// A function defined in the language, closing over its defining scope.
    Lambda(Rc<Lambda>),
}

/// A function defined in the language.
///
/// Calling a lambda binds its parameters in a child of `scope` and evaluates
/// `body` there; the defining scope is captured by reference, so closures see
/// later mutations of their environment.
pub struct Lambda {
    /// Display name, assigned when the lambda is bound through `def`.
    pub name:     RefCell<Rc<str>>,
    /// The parameter definition list.
    pub params:   Value,
    /// The body expression.
    pub body:     Value,
    /// The scope the lambda was created in.
    pub scope:    Env,
    /// Whether this lambda is invoked on unevaluated arguments during macro
    /// expansion.
    pub is_macro: bool,
}

impl std::fmt::Debug for Lambda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lambda")
         .field("name", &self.name.borrow())
         .field("is_macro", &self.is_macro)
         .finish_non_exhaustive()
    }
}

/// Specifies the allowed number of arguments for a host function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// The function must receive exactly this many arguments.
    Exact(usize),
    /// The function accepts this many arguments or more.
    AtLeast(usize),
    /// The function accepts any arity listed in the slice.
    OneOf(&'static [usize]),
    /// The function accepts any number of arguments.
    Any,
}

impl Arity {
    /// Tests whether the given argument count satisfies this constraint.
    #[must_use]
    pub fn check(&self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == *n,
            Self::AtLeast(n) => count >= *n,
            Self::OneOf(choices) => choices.contains(&count),
            Self::Any => true,
        }
    }

    /// Describes the constraint for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Exact(n) => format!("exactly {n}"),
            Self::AtLeast(n) => format!("at least {n}"),
            Self::OneOf(choices) => {
                let choices = choices.iter()
                                     .map(ToString::to_string)
                                     .collect::<Vec<_>>()
                                     .join(" or ");
                format!("exactly {choices}")
            },
            Self::Any => "any number of".to_string(),
        }
    }
}

/// The signature shared by all host functions.
///
/// A host function receives the active evaluator (so it can apply user
/// callables with the tick hook still in force) and the evaluated positional
/// arguments. A `String` error is wrapped by the bridge into
/// [`RuntimeError::HostError`](crate::error::RuntimeError::HostError) carrying
/// the function name.
pub type HostFn = Rc<dyn Fn(&Evaluator, &[Value]) -> Result<Value, String>>;

/// An opaque callable provided by the host program.
pub struct HostFunction {
    /// The name the function is registered under.
    pub name:     Rc<str>,
    /// The accepted argument counts, checked before invocation.
    pub arity:    Arity,
    /// Whether this function is invoked on unevaluated arguments during
    /// macro expansion.
    pub is_macro: bool,
    func:         HostFn,
}

impl HostFunction {
    /// Wraps a host closure as a callable value.
    pub fn new<F>(name: &str, arity: Arity, func: F) -> Self
        where F: Fn(&Evaluator, &[Value]) -> Result<Value, String> + 'static
    {
        Self { name: Rc::from(name),
               arity,
               is_macro: false,
               func: Rc::new(func) }
    }

    /// Invokes the host closure without arity checking or error wrapping;
    /// the bridge in the evaluator performs both.
    pub fn call(&self, evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
        (self.func)(evaluator, args)
    }

    /// Returns a copy of this function flagged as a macro.
    #[must_use]
    pub fn as_macro(&self) -> Self {
        Self { name:     Rc::clone(&self.name),
               arity:    self.arity,
               is_macro: true,
               func:     Rc::clone(&self.func), }
    }
}

impl std::fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunction")
         .field("name", &self.name)
         .field("arity", &self.arity)
         .finish_non_exhaustive()
    }
}

/// Returns `true` when the name is interpreted directly by the evaluator
/// rather than resolved as a binding.
#[must_use]
pub fn is_special_form(name: &str) -> bool {
    matches!(name,
             QUOTE
             | "expr"
             | "eva"
             | "~"
             | "macro"
             | "comment"
             | "list"
             | "obj"
             | "def"
             | "get"
             | "let"
             | "do"
             | ","
             | "if"
             | "try"
             | "lambda"
             | "λ")
}

impl Value {
    /// Creates a symbol value.
    #[must_use]
    pub fn symbol(name: &str) -> Self {
        Self::Symbol(Rc::from(name))
    }

    /// Creates a string value.
    #[must_use]
    pub fn string(text: &str) -> Self {
        Self::Str(Rc::from(text))
    }

    /// Creates a list value.
    #[must_use]
    pub fn list(items: Vec<Self>) -> Self {
        Self::List(Rc::new(items))
    }

    /// Creates an object value from a bindings map.
    #[must_use]
    pub fn object(bindings: Bindings) -> Self {
        Self::Object(Rc::new(RefCell::new(bindings)))
    }

    /// Wraps a value in a quote so evaluation returns it unchanged.
    ///
    /// # Example
    /// ```
    /// use expreva::ast::Value;
    ///
    /// let quoted = Value::quoted(Value::string("hi"));
    /// assert_eq!(expreva::evaluate(&quoted, None).unwrap(), Value::string("hi"));
    /// ```
    #[must_use]
    pub fn quoted(value: Self) -> Self {
        Self::list(vec![Self::symbol(QUOTE), value])
    }

    /// Returns the symbol text when the value is a symbol.
    #[must_use]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the elements when the value is a list.
    #[must_use]
    pub fn list_items(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the head symbol of a non-empty list form.
    #[must_use]
    pub fn head_symbol(&self) -> Option<&str> {
        self.list_items().and_then(|items| items.first()).and_then(Self::as_symbol)
    }

    /// Returns `true` when the value is a list form with the given head.
    #[must_use]
    pub fn is_form(&self, head: &str) -> bool {
        self.head_symbol() == Some(head)
    }

    /// Names the value's type for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Function(_) | Self::Lambda(_) => "function",
        }
    }

    /// Tests the language's truthiness rule: `nil`, `false`, `0`, and the
    /// empty string are falsy, everything else truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0,
            Self::Str(text) => !text.is_empty(),
            _ => true,
        }
    }

    /// Renders the value as bare text: strings without quotes, everything
    /// else in its printed form. Used for concatenation and printing.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(text) => text.to_string(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) | (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b) || a.as_slice() == b.as_slice(),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Lambda(a), Self::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::interpreter::printer::value_to_pretty_string(self))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::list(items)
    }
}
