use std::{cell::RefCell, rc::Rc};

use crate::{
    ast::{Lambda, Value},
    error::RuntimeError,
    interpreter::evaluator::{
        environment::{Bindings, Env},
        function::is_lambda_list,
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// [`RuntimeError`] describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// A host-supplied hook invoked once per trampoline iteration.
///
/// Returning `false` cancels the evaluation with
/// [`RuntimeError::Cancelled`]; hosts build timeouts and step limits on top
/// of this.
pub type TickHook = Rc<dyn Fn() -> bool>;

/// Executes syntax trees against an environment.
///
/// The evaluator itself is stateless apart from the optional tick hook; all
/// bindings live in the environment chain, so one evaluator can serve many
/// environments and a fresh one can resume work in an existing environment.
#[derive(Default)]
pub struct Evaluator {
    tick_hook: Option<TickHook>,
}

impl Evaluator {
    /// Creates an evaluator without a tick hook.
    #[must_use]
    pub const fn new() -> Self {
        Self { tick_hook: None }
    }

    /// Creates an evaluator whose tick hook runs once per trampoline
    /// iteration.
    ///
    /// # Example
    /// ```
    /// use std::{cell::Cell, rc::Rc};
    ///
    /// use expreva::{
    ///     error::RuntimeError, interpreter::evaluator::core::Evaluator,
    /// };
    ///
    /// let budget = Rc::new(Cell::new(50));
    /// let evaluator = Evaluator::with_tick_hook(move || {
    ///     budget.set(budget.get() - 1);
    ///     budget.get() > 0
    /// });
    ///
    /// let program = expreva::parse("loop = n => if n > 0 then loop(n - 1) else 0; loop(1000)")
    ///     .unwrap();
    /// let env = expreva::create_environment(None);
    /// assert_eq!(evaluator.evaluate(&program, &env), Err(RuntimeError::Cancelled));
    /// ```
    #[must_use]
    pub fn with_tick_hook(hook: impl Fn() -> bool + 'static) -> Self {
        Self { tick_hook: Some(Rc::new(hook)) }
    }

    /// Evaluates a syntax tree in the given environment.
    ///
    /// The loop is a trampoline: tail positions (`if` branches, the last
    /// expression of `do` and `let`, and lambda bodies) rewrite `ast` and
    /// `env` in place and continue instead of recursing, so tail-recursive
    /// programs run in constant stack space. Non-tail positions (operands,
    /// call arguments) recurse as usual.
    ///
    /// # Errors
    /// Returns a [`RuntimeError`] for unbound symbols, malformed special
    /// forms, uncallable or non-indexable values, failures reported by host
    /// functions, and tick-hook cancellation.
    pub fn evaluate(&self, ast: &Value, env: &Env) -> EvalResult<Value> {
        let mut ast = ast.clone();
        let mut env = Rc::clone(env);
        loop {
            if let Some(hook) = &self.tick_hook
               && !hook()
            {
                return Err(RuntimeError::Cancelled);
            }
            let Value::List(list) = &ast else {
                return self.eval_atom(&ast, &env);
            };
            if list.is_empty() {
                return Ok(ast.clone());
            }
            let items = Rc::clone(list);
            if let Some(expanded) = self.expand_macro(&items, &env)? {
                ast = expanded;
                continue;
            }
            match items[0].as_symbol() {
                Some("`" | "expr") => return Ok(items.get(1).cloned().unwrap_or(Value::Nil)),
                Some("eva") => {
                    ast = self.evaluate(items.get(1).unwrap_or(&Value::Nil), &env)?;
                    continue;
                },
                Some("~" | "macro") => return self.eval_macro_flag(&items, &env),
                Some("comment") => return Ok(Value::Nil),
                Some("list") => return self.eval_list_form(&items[1..], &env),
                Some("obj") => return self.eval_obj_form(&items[1..], &env),
                Some("def") => return self.eval_def(&items, &env),
                Some("get") => return self.eval_get(&items, &env),
                Some("let") => {
                    env = self.enter_let(&items, &env)?;
                    ast = items.get(2).cloned().unwrap_or(Value::Nil);
                    continue;
                },
                Some("do" | ",") => {
                    let Some((tail, leading)) = items[1..].split_last() else {
                        return Ok(Value::Nil);
                    };
                    for expression in leading {
                        self.evaluate(expression, &env)?;
                    }
                    ast = tail.clone();
                    continue;
                },
                Some("if") => {
                    if items.len() < 3 {
                        return Err(RuntimeError::MalformedIf);
                    }
                    if self.evaluate(&items[1], &env)?.is_truthy() {
                        ast = items[2].clone();
                    } else if let Some(else_branch) = items.get(3) {
                        ast = else_branch.clone();
                    } else {
                        return Ok(Value::Nil);
                    }
                    continue;
                },
                Some("try") => return self.eval_try(&items, &env),
                Some("lambda" | "λ") => return self.make_lambda(&items, &env),
                _ => {
                    let callee = self.evaluate(&items[0], &env)?;
                    let arguments = self.eval_arguments(&items[1..], &env)?;
                    match callee {
                        Value::Lambda(lambda) => {
                            env = self.bind_function_scope(&lambda.scope,
                                                           &lambda.params,
                                                           &arguments)?;
                            ast = lambda.body.clone();
                            continue;
                        },
                        Value::Function(function) => return self.call_host(&function, &arguments),
                        Value::List(raw) if is_lambda_list(&raw) => {
                            env = self.bind_function_scope(&env, &raw[1], &arguments)?;
                            ast = raw[2].clone();
                            continue;
                        },
                        Value::Nil => return Ok(Value::Nil),
                        other => {
                            return Err(RuntimeError::NotCallable { type_name:
                                                                       other.type_name() });
                        },
                    }
                },
            }
        }
    }

    /// Evaluates a non-form value.
    ///
    /// Literals evaluate to themselves. A symbol resolves through the scope
    /// chain, except `local` and `global`, which expose the current and
    /// global scopes as live objects. A list reaching this path (only data
    /// lists; forms are dispatched by the trampoline) evaluates its elements.
    fn eval_atom(&self, ast: &Value, env: &Env) -> EvalResult<Value> {
        match ast {
            Value::Symbol(name) => match name.as_ref() {
                "local" => Ok(Value::Object(env.bindings_handle())),
                "global" => Ok(Value::Object(env.global().bindings_handle())),
                _ => {
                    env.lookup(name)
                       .ok_or_else(|| RuntimeError::UndefinedSymbol { name: name.to_string() })
                },
            },
            Value::List(items) => Ok(Value::list(self.eval_arguments(items, env)?)),
            other => Ok(other.clone()),
        }
    }

    /// Evaluates a slice of expressions left to right.
    pub(crate) fn eval_arguments(&self,
                                 expressions: &[Value],
                                 env: &Env)
                                 -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(expressions.len());
        for expression in expressions {
            values.push(self.evaluate(expression, env)?);
        }
        Ok(values)
    }

    /// Evaluates `['macro', f]`: flags the callable so the expander invokes
    /// it on unevaluated arguments.
    fn eval_macro_flag(&self, items: &[Value], env: &Env) -> EvalResult<Value> {
        let value = self.evaluate(items.get(1).unwrap_or(&Value::Nil), env)?;
        match &value {
            Value::Lambda(lambda) => {
                Ok(Value::Lambda(Rc::new(Lambda { name:     RefCell::new(lambda.name
                                                                               .borrow()
                                                                               .clone()),
                                                  params:   lambda.params.clone(),
                                                  body:     lambda.body.clone(),
                                                  scope:    Rc::clone(&lambda.scope),
                                                  is_macro: true, })))
            },
            Value::Function(function) => Ok(Value::Function(Rc::new(function.as_macro()))),
            other => Err(RuntimeError::NotCallable { type_name: other.type_name() }),
        }
    }

    /// Builds the child scope for `['let', bindings, body]`.
    ///
    /// Bindings are successive key/value pairs; each value already sees the
    /// bindings before it. The bindings list may carry a `list` head so that
    /// the form can also be written through the surface call syntax
    /// `let(['x', 1], body)`.
    fn enter_let(&self, items: &[Value], env: &Env) -> EvalResult<Env> {
        let scope = env.create();
        let Some(bindings) = items.get(1) else {
            return Ok(scope);
        };
        let pairs: &[Value] = match bindings {
            Value::List(entries) => {
                if entries.first().and_then(Value::as_symbol) == Some("list") {
                    &entries[1..]
                } else {
                    entries
                }
            },
            Value::Nil => &[],
            other => return Err(RuntimeError::BadArgDef { detail: other.to_string() }),
        };
        for pair in pairs.chunks(2) {
            let Some(name) = binding_name(&pair[0]) else {
                return Err(RuntimeError::BadArgDef { detail: pair[0].to_string() });
            };
            let value = match pair.get(1) {
                Some(expression) => self.evaluate(expression, &scope)?,
                None => Value::Nil,
            };
            scope.define(&name, value);
        }
        Ok(scope)
    }

    /// Evaluates `['try', body, catch?]`.
    ///
    /// A failing body is caught by a `['catch', name, handler]` clause,
    /// which binds an object `{ message }` describing the error in a child
    /// scope; without a catch clause the error is swallowed and the form
    /// yields `nil`. Cancellation is never caught.
    fn eval_try(&self, items: &[Value], env: &Env) -> EvalResult<Value> {
        match self.evaluate(items.get(1).unwrap_or(&Value::Nil), env) {
            Ok(value) => Ok(value),
            Err(RuntimeError::Cancelled) => Err(RuntimeError::Cancelled),
            Err(error) => {
                if let Some(Value::List(handler)) = items.get(2)
                   && handler.len() >= 3
                   && handler[0].as_symbol() == Some("catch")
                   && let Value::Symbol(name) = &handler[1]
                {
                    let scope = env.create();
                    let mut payload = Bindings::new();
                    payload.set("message", Value::from(error.to_string()));
                    scope.define(name, Value::object(payload));
                    return self.evaluate(&handler[2], &scope);
                }
                Ok(Value::Nil)
            },
        }
    }

    /// Evaluates `['lambda', params, body]` into a callable closing over the
    /// current environment.
    fn make_lambda(&self, items: &[Value], env: &Env) -> EvalResult<Value> {
        if items.len() != 3 {
            return Err(RuntimeError::BadArgDef { detail:
                                                     "a lambda needs a parameter list and a body"
                                                         .to_string(), });
        }
        let params = match &items[1] {
            Value::Symbol(_) => Value::list(vec![items[1].clone()]),
            Value::List(_) => items[1].clone(),
            Value::Nil => Value::list(Vec::new()),
            other => return Err(RuntimeError::BadArgDef { detail: other.to_string() }),
        };
        Ok(Value::Lambda(Rc::new(Lambda { name: RefCell::new(Rc::from("")),
                                          params,
                                          body: items[2].clone(),
                                          scope: Rc::clone(env),
                                          is_macro: false })))
    }
}

/// Reads a binding name from a `let` pair key: a symbol, a string, or a
/// quoted string.
fn binding_name(value: &Value) -> Option<String> {
    match value {
        Value::Symbol(name) | Value::Str(name) => Some(name.to_string()),
        Value::List(items) if items.len() == 2 && items[0].as_symbol() == Some("`") => {
            match &items[1] {
                Value::Str(name) | Value::Symbol(name) => Some(name.to_string()),
                _ => None,
            }
        },
        _ => None,
    }
}
