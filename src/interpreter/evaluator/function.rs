use crate::{
    ast::{HostFunction, Value, is_special_form},
    error::RuntimeError,
    interpreter::evaluator::{
        core::{EvalResult, Evaluator},
        environment::{Env, Environment},
    },
};

/// Returns `true` for a raw `['lambda', params, body]` list, which may be
/// invoked directly without having been evaluated into a closure first.
pub(crate) fn is_lambda_list(items: &[Value]) -> bool {
    items.len() == 3 && matches!(items[0].as_symbol(), Some("lambda" | "λ"))
}

impl Evaluator {
    /// Applies a callable value to already-evaluated arguments.
    ///
    /// This is the entry point host functions use to call user callables
    /// (`map`, `filter`, `reduce` go through it), keeping the tick hook in
    /// force inside the callback. Applying `nil` yields `nil`; a raw lambda
    /// list is bound against the root scope since it closes over nothing.
    ///
    /// # Errors
    /// Returns a [`RuntimeError`] when the value is not callable or its
    /// invocation fails.
    pub fn apply(&self, callable: &Value, arguments: &[Value]) -> EvalResult<Value> {
        match callable {
            Value::Lambda(lambda) => {
                let scope = self.bind_function_scope(&lambda.scope, &lambda.params, arguments)?;
                self.evaluate(&lambda.body, &scope)
            },
            Value::Function(function) => self.call_host(function, arguments),
            Value::List(items) if is_lambda_list(items) => {
                let scope = self.bind_function_scope(&Environment::root(), &items[1], arguments)?;
                self.evaluate(&items[2], &scope)
            },
            Value::Nil => Ok(Value::Nil),
            other => Err(RuntimeError::NotCallable { type_name: other.type_name() }),
        }
    }

    /// Invokes a host function: checks the declared arity, then wraps any
    /// failure it reports with the function's name.
    pub(crate) fn call_host(&self,
                            function: &HostFunction,
                            arguments: &[Value])
                            -> EvalResult<Value> {
        if !function.arity.check(arguments.len()) {
            return Err(RuntimeError::HostError { name:    function.name.to_string(),
                                                 message: format!("expected {} arguments, got {}",
                                                                  function.arity.describe(),
                                                                  arguments.len()), });
        }
        function.call(self, arguments)
                .map_err(|message| RuntimeError::HostError { name: function.name.to_string(),
                                                             message })
    }

    /// Expands one macro step: when the form's head symbol resolves to a
    /// callable flagged as a macro, invokes it on the unevaluated tail and
    /// returns the replacement tree.
    ///
    /// The trampoline re-enters here with the replacement, so macros whose
    /// output starts with another macro expand in turn (and a macro that
    /// produces itself diverges).
    pub(crate) fn expand_macro(&self, items: &[Value], env: &Env) -> EvalResult<Option<Value>> {
        let Some(name) = items.first().and_then(Value::as_symbol) else {
            return Ok(None);
        };
        if is_special_form(name) {
            return Ok(None);
        }
        let Some(binding) = env.lookup(name) else {
            return Ok(None);
        };
        let flagged = match &binding {
            Value::Lambda(lambda) => lambda.is_macro,
            Value::Function(function) => function.is_macro,
            _ => false,
        };
        if !flagged {
            return Ok(None);
        }
        Ok(Some(self.apply(&binding, &items[1..])?))
    }

    /// Builds the call scope of a function: a child of `parent` with one
    /// binding per parameter definition.
    ///
    /// Definitions are bound in order: a plain name takes the next given
    /// argument (`nil` when exhausted); `['def', name, default]` evaluates
    /// its default when the argument is missing or `nil`; `['...', name]`
    /// and the `&`-followed-by-name form collect the remaining arguments
    /// into a list. Surplus given arguments are ignored.
    pub(crate) fn bind_function_scope(&self,
                                      parent: &Env,
                                      parameter_defs: &Value,
                                      given: &[Value])
                                      -> EvalResult<Env> {
        let scope = parent.create();
        let single = std::slice::from_ref(parameter_defs);
        let defs: &[Value] = match parameter_defs {
            Value::List(items) => items,
            Value::Symbol(_) => single,
            Value::Nil => &[],
            other => return Err(RuntimeError::BadArgDef { detail: other.to_string() }),
        };
        let mut position = 0;
        let mut index = 0;
        while index < defs.len() {
            match &defs[index] {
                Value::Symbol(marker) if marker.as_ref() == "&" => {
                    let Some(Value::Symbol(rest)) = defs.get(index + 1) else {
                        return Err(RuntimeError::BadArgDef { detail:
                                                                 "'&' must be followed by a name"
                                                                     .to_string(), });
                    };
                    scope.define(rest, rest_list(given, position));
                    position = given.len();
                    index += 2;
                },
                Value::Symbol(name) => {
                    scope.define(name, given.get(position).cloned().unwrap_or(Value::Nil));
                    position += 1;
                    index += 1;
                },
                entry @ Value::List(items) if entry.is_form("...") => {
                    let Some(Value::Symbol(rest)) = items.get(1) else {
                        return Err(RuntimeError::BadArgDef { detail: entry.to_string() });
                    };
                    scope.define(rest, rest_list(given, position));
                    position = given.len();
                    index += 1;
                },
                entry @ Value::List(items) if entry.is_form("def") && items.len() >= 3 => {
                    let Some(Value::Symbol(name)) = items.get(1) else {
                        return Err(RuntimeError::BadArgDef { detail: entry.to_string() });
                    };
                    let value = match given.get(position) {
                        Some(Value::Nil) | None => self.evaluate(&items[2], &scope)?,
                        Some(value) => value.clone(),
                    };
                    scope.define(name, value);
                    position += 1;
                    index += 1;
                },
                other => return Err(RuntimeError::BadArgDef { detail: other.to_string() }),
            }
        }
        Ok(scope)
    }
}

/// The remaining given arguments as a list value.
fn rest_list(given: &[Value], position: usize) -> Value {
    Value::list(given.get(position..).unwrap_or(&[]).to_vec())
}
