use std::{cell::RefCell, rc::Rc};

use crate::{
    ast::{Lambda, Value},
    error::RuntimeError,
    interpreter::evaluator::{
        core::{EvalResult, Evaluator},
        environment::Bindings,
        environment::Env,
    },
    util::num::{f64_to_index, format_number},
};

impl Evaluator {
    /// Evaluates `['list', e…]` into a list value.
    ///
    /// A `['...', e]` entry splices: a list contributes its elements, `nil`
    /// contributes nothing, and any other value joins as a single element.
    pub(crate) fn eval_list_form(&self, entries: &[Value], env: &Env) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Value::List(spread) = entry
               && spread.first().and_then(Value::as_symbol) == Some("...")
            {
                match self.evaluate(spread.get(1).unwrap_or(&Value::Nil), env)? {
                    Value::List(elements) => values.extend(elements.iter().cloned()),
                    Value::Nil => {},
                    other => values.push(other),
                }
                continue;
            }
            values.push(self.evaluate(entry, env)?);
        }
        Ok(Value::list(values))
    }

    /// Evaluates `['obj', [k, v]…]` into an object value.
    ///
    /// Keys and values are evaluated left to right and inserted in source
    /// order; `['...', e]` entries spread another object's entries. A
    /// lambda value takes its key as display name.
    pub(crate) fn eval_obj_form(&self, entries: &[Value], env: &Env) -> EvalResult<Value> {
        let mut bindings = Bindings::new();
        for entry in entries {
            let Value::List(pair) = entry else {
                return Err(RuntimeError::Raised { message:
                                                      format!("malformed object entry: {entry}") });
            };
            if pair.first().and_then(Value::as_symbol) == Some("...") {
                match self.evaluate(pair.get(1).unwrap_or(&Value::Nil), env)? {
                    Value::Object(map) => {
                        let source = map.borrow();
                        for (key, value) in source.entries() {
                            bindings.set(key, value.clone());
                        }
                    },
                    Value::Nil => {},
                    other => {
                        return Err(RuntimeError::Raised { message:
                                                              format!("cannot spread a {} into an object",
                                                                      other.type_name()), });
                    },
                }
                continue;
            }
            if pair.len() < 2 {
                return Err(RuntimeError::Raised { message:
                                                      format!("malformed object entry: {entry}") });
            }
            let key = member_key(&self.evaluate(&pair[0], env)?);
            let value = self.evaluate(&pair[1], env)?;
            if let Value::Lambda(lambda) = &value {
                *lambda.name.borrow_mut() = Rc::from(key.as_str());
            }
            bindings.set(&key, value);
        }
        Ok(Value::object(bindings))
    }

    /// Evaluates `['def', target, value]`.
    ///
    /// A symbol target binds in the evaluation's global scope (a lambda
    /// value takes the name for display). A member target —
    /// `['get', base, members…]` — resolves the owner of the final member
    /// and sets it there instead, mutating the object.
    pub(crate) fn eval_def(&self, items: &[Value], env: &Env) -> EvalResult<Value> {
        match items.get(1) {
            Some(Value::Symbol(name)) => {
                let value = match items.get(2) {
                    Some(expression) => self.evaluate(expression, env)?,
                    None => Value::Nil,
                };
                if let Value::Lambda(lambda) = &value {
                    *lambda.name.borrow_mut() = Rc::clone(name);
                }
                env.global().define(name, value.clone());
                Ok(value)
            },
            Some(target @ Value::List(members)) if target.is_form("get") && members.len() >= 3 => {
                let value = match items.get(2) {
                    Some(expression) => self.evaluate(expression, env)?,
                    None => Value::Nil,
                };
                let mut owner = self.evaluate(&members[1], env)?;
                for member in &members[2..members.len() - 1] {
                    let key = self.evaluate(member, env)?;
                    owner = read_member(&owner, &key)?;
                }
                let key = self.evaluate(&members[members.len() - 1], env)?;
                write_member(&owner, &key, value.clone())?;
                Ok(value)
            },
            Some(other) => Err(RuntimeError::BadArgDef { detail: other.to_string() }),
            None => Ok(Value::Nil),
        }
    }

    /// Evaluates `['get', base, members…]`: walks successive members from
    /// the evaluated base.
    ///
    /// A member of the form `['def', key, value]` performs a set on the
    /// value reached so far and short-circuits, returning the assigned
    /// value.
    pub(crate) fn eval_get(&self, items: &[Value], env: &Env) -> EvalResult<Value> {
        let mut current = self.evaluate(items.get(1).unwrap_or(&Value::Nil), env)?;
        for member in items.get(2..).unwrap_or(&[]) {
            if let Value::List(entry) = member
               && entry.first().and_then(Value::as_symbol) == Some("def")
               && entry.len() >= 3
            {
                let key = self.evaluate(&entry[1], env)?;
                let value = self.evaluate(&entry[2], env)?;
                write_member(&current, &key, value.clone())?;
                return Ok(value);
            }
            let key = self.evaluate(member, env)?;
            current = read_member(&current, &key)?;
        }
        Ok(current)
    }
}

/// Coerces an evaluated member expression to an object key.
pub(crate) fn member_key(value: &Value) -> String {
    match value {
        Value::Str(text) | Value::Symbol(text) => text.to_string(),
        Value::Number(number) => format_number(*number),
        other => other.to_string(),
    }
}

/// Reads one member from a base value.
///
/// Objects look keys up by name; `__proto__` and missing keys read as
/// `nil`, and a lambda member comes back bound to the object it was read
/// from. Lists are indexed by integral numbers, anything else reading as
/// `nil`. Any other base has no members.
pub(crate) fn read_member(base: &Value, key: &Value) -> EvalResult<Value> {
    match base {
        Value::Object(map) => {
            let key = member_key(key);
            if key == "__proto__" {
                return Ok(Value::Nil);
            }
            let found = map.borrow().get(&key);
            match found {
                Some(Value::Lambda(lambda)) => Ok(bind_method(&lambda, base)),
                Some(value) => Ok(value),
                None => Ok(Value::Nil),
            }
        },
        Value::List(items) => {
            if let Value::Number(number) = key
               && let Some(index) = f64_to_index(*number)
            {
                return Ok(items.get(index).cloned().unwrap_or(Value::Nil));
            }
            Ok(Value::Nil)
        },
        other => Err(RuntimeError::NotIndexable { type_name: other.type_name() }),
    }
}

/// Writes one member on a base value. Only objects are assignable; lists
/// are immutable values rebuilt by `push`, `pop`, and `insert`.
pub(crate) fn write_member(base: &Value, key: &Value, value: Value) -> EvalResult<()> {
    match base {
        Value::Object(map) => {
            let key = member_key(key);
            if let Value::Lambda(lambda) = &value {
                *lambda.name.borrow_mut() = Rc::from(key.as_str());
            }
            map.borrow_mut().set(&key, value);
            Ok(())
        },
        Value::List(_) => {
            Err(RuntimeError::Raised { message:
                                           "cannot assign into a list; build a new one with push or insert"
                                               .to_string(), })
        },
        other => Err(RuntimeError::NotIndexable { type_name: other.type_name() }),
    }
}

/// Returns a copy of the lambda whose scope binds `this` to the receiver.
fn bind_method(lambda: &Rc<Lambda>, receiver: &Value) -> Value {
    let scope = lambda.scope.create();
    scope.define("this", receiver.clone());
    Value::Lambda(Rc::new(Lambda { name: RefCell::new(lambda.name.borrow().clone()),
                                   params: lambda.params.clone(),
                                   body: lambda.body.clone(),
                                   scope,
                                   is_macro: lambda.is_macro }))
}
