use std::rc::Rc;

use crate::{
    ast::{Arity, HostFunction, Value},
    interpreter::evaluator::{
        core::Evaluator,
        environment::Bindings,
        special::{member_key, read_member},
    },
    util::num::{f64_to_index, format_number},
};

/// Type alias for builtin function handlers.
///
/// A builtin receives the active evaluator (for applying user callables)
/// and the evaluated arguments, and reports failures as messages that the
/// bridge wraps with the function's name.
type BuiltinFn = fn(&Evaluator, &[Value]) -> Result<Value, String>;

/// Defines the standard bindings by generating a lookup table and a name
/// list.
///
/// Each entry provides a string name, an arity specification checked by the
/// bridge, and a function pointer implementing the builtin. The macro
/// produces `BuiltinDef` (internal metadata), `BUILTIN_TABLE` (static table
/// for registration), and `STANDARD_FUNCTIONS` (public list of names).
macro_rules! standard_bindings_table {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        struct BuiltinDef {
            name:  &'static str,
            arity: Arity,
            func:  BuiltinFn,
        }
        static BUILTIN_TABLE: &[BuiltinDef] = &[
            $(
                BuiltinDef { name: $name, arity: $arity, func: $func },
            )*
        ];
        /// The function names registered by [`standard_bindings`].
        pub const STANDARD_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

standard_bindings_table! {
    "+"         => { arity: Arity::AtLeast(1), func: add },
    "-"         => { arity: Arity::AtLeast(1), func: subtract },
    "*"         => { arity: Arity::AtLeast(1), func: multiply },
    "/"         => { arity: Arity::Exact(2), func: divide },
    "%"         => { arity: Arity::Exact(2), func: remainder },
    "^"         => { arity: Arity::Exact(2), func: power },
    "!"         => { arity: Arity::Exact(1), func: logical_not },
    "factorial" => { arity: Arity::Exact(1), func: factorial },
    "=="        => { arity: Arity::Exact(2), func: |_, args| Ok(Value::Bool(args[0] == args[1])) },
    "!="        => { arity: Arity::Exact(2), func: |_, args| Ok(Value::Bool(args[0] != args[1])) },
    "<"         => { arity: Arity::Exact(2), func: |_, args| compare("<", args) },
    "<="        => { arity: Arity::Exact(2), func: |_, args| compare("<=", args) },
    ">"         => { arity: Arity::Exact(2), func: |_, args| compare(">", args) },
    ">="        => { arity: Arity::Exact(2), func: |_, args| compare(">=", args) },
    "&&"        => { arity: Arity::Exact(2), func: logical_and },
    "||"        => { arity: Arity::Exact(2), func: logical_or },
    "in"        => { arity: Arity::Exact(2), func: contains },
    "set"       => { arity: Arity::Exact(3), func: set },
    "get"       => { arity: Arity::Exact(2), func: get },
    "unset"     => { arity: Arity::Exact(2), func: unset },
    "use"       => { arity: Arity::Exact(2), func: use_bindings },
    "push"      => { arity: Arity::AtLeast(2), func: push },
    "pop"       => { arity: Arity::Exact(1), func: pop },
    "insert"    => { arity: Arity::Exact(3), func: insert },
    "slice"     => { arity: Arity::OneOf(&[2, 3]), func: slice },
    "search"    => { arity: Arity::Exact(2), func: search },
    "keys"      => { arity: Arity::Exact(1), func: keys },
    "values"    => { arity: Arity::Exact(1), func: values },
    "size"      => { arity: Arity::Exact(1), func: size },
    "join"      => { arity: Arity::OneOf(&[1, 2]), func: join },
    "split"     => { arity: Arity::Exact(2), func: split },
    "map"       => { arity: Arity::Exact(2), func: map_list },
    "filter"    => { arity: Arity::Exact(2), func: filter_list },
    "reduce"    => { arity: Arity::Exact(3), func: reduce_list },
    "repeat"    => { arity: Arity::Exact(2), func: repeat },
    "char"      => { arity: Arity::Exact(2), func: char_at },
    "print"     => { arity: Arity::Exact(1), func: print },
    "assert"    => { arity: Arity::Exact(1), func: assert_fn },
    "throw"     => { arity: Arity::Exact(1), func: throw },
    "sym"       => { arity: Arity::Exact(1), func: sym },
    "type"      => { arity: Arity::Exact(1), func: type_of },
}

/// Builds the standard-bindings table registered in the root environment at
/// startup: every function in `BUILTIN_TABLE` plus the `true` and `false`
/// constants.
///
/// # Example
/// ```
/// use expreva::interpreter::evaluator::builtin::standard_bindings;
///
/// let bindings = standard_bindings();
/// assert!(bindings.get("+").is_some());
/// assert!(bindings.get("map").is_some());
/// ```
#[must_use]
pub fn standard_bindings() -> Bindings {
    let mut bindings = Bindings::new();
    for def in BUILTIN_TABLE {
        let function = HostFunction::new(def.name, def.arity, def.func);
        bindings.set(def.name, Value::Function(Rc::new(function)));
    }
    bindings.set("true", Value::Bool(true));
    bindings.set("false", Value::Bool(false));
    bindings
}

/// Extracts a numeric operand or reports its type.
fn number_argument(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(number) => Ok(*number),
        other => Err(format!("expected a number, got {}", other.type_name())),
    }
}

/// A collection index as a number value.
#[allow(clippy::cast_precision_loss)]
fn index_number(index: usize) -> Value {
    Value::Number(index as f64)
}

/// Extracts a non-negative integer index argument.
fn index_argument(value: &Value) -> Result<usize, String> {
    match value {
        Value::Number(number) => {
            f64_to_index(*number).ok_or_else(|| format!("invalid index {}", format_number(*number)))
        },
        other => Err(format!("expected a number index, got {}", other.type_name())),
    }
}

/// `+`: adds numbers, concatenates strings, and appends to or concatenates
/// lists. With one argument, returns it unchanged.
fn add(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let mut total = args[0].clone();
    for value in &args[1..] {
        total = add_values(&total, value)?;
    }
    Ok(total)
}

fn add_values(left: &Value, right: &Value) -> Result<Value, String> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::list(items))
        },
        (Value::List(a), _) => {
            let mut items = a.as_ref().clone();
            items.push(right.clone());
            Ok(Value::list(items))
        },
        (_, Value::List(b)) => {
            let mut items = vec![left.clone()];
            items.extend(b.iter().cloned());
            Ok(Value::list(items))
        },
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::from(format!("{}{}", left.to_text(), right.to_text())))
        },
        _ => Err(format!("cannot add {} and {}", left.type_name(), right.type_name())),
    }
}

/// `-`: negates a single number, subtracts the rest from the first
/// otherwise.
fn subtract(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    if args.len() == 1 {
        return Ok(Value::Number(-number_argument(&args[0])?));
    }
    let mut total = number_argument(&args[0])?;
    for value in &args[1..] {
        total -= number_argument(value)?;
    }
    Ok(Value::Number(total))
}

/// `*`: multiplies numbers.
fn multiply(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let mut total = number_argument(&args[0])?;
    for value in &args[1..] {
        total *= number_argument(value)?;
    }
    Ok(Value::Number(total))
}

/// `/`: divides two numbers; dividing by zero is an error.
fn divide(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let left = number_argument(&args[0])?;
    let right = number_argument(&args[1])?;
    if right == 0.0 {
        return Err("division by zero".to_string());
    }
    Ok(Value::Number(left / right))
}

/// `%`: remainder of two numbers; a zero divisor is an error.
fn remainder(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let left = number_argument(&args[0])?;
    let right = number_argument(&args[1])?;
    if right == 0.0 {
        return Err("division by zero".to_string());
    }
    Ok(Value::Number(left % right))
}

/// `^`: raises a number to a power.
fn power(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let base = number_argument(&args[0])?;
    let exponent = number_argument(&args[1])?;
    Ok(Value::Number(base.powf(exponent)))
}

/// `!`: logical negation of a value's truthiness.
fn logical_not(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(!args[0].is_truthy()))
}

/// `factorial`: the postfix `!` operator. Only non-negative integers up to
/// `170!` (the largest factorial an `f64` can hold) are accepted.
fn factorial(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let n = number_argument(&args[0])?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err("factorial expects a non-negative integer".to_string());
    }
    if n > 170.0 {
        return Err("factorial overflow".to_string());
    }
    let mut product = 1.0;
    let mut k = 2.0;
    while k <= n {
        product *= k;
        k += 1.0;
    }
    Ok(Value::Number(product))
}

/// Evaluates an ordering comparison on two numbers or two strings.
fn compare(operator: &str, args: &[Value]) -> Result<Value, String> {
    let ordering = match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (left, right) => {
            return Err(format!("cannot compare {} and {}",
                               left.type_name(),
                               right.type_name()));
        },
    };
    // NaN compares false under every operator.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(match operator {
           "<" => ordering.is_lt(),
           "<=" => ordering.is_le(),
           ">" => ordering.is_gt(),
           ">=" => ordering.is_ge(),
           _ => unreachable!(),
       }))
}

/// `&&`: returns the first operand when falsy, the second otherwise. Both
/// operands were already evaluated by the caller.
fn logical_and(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    if args[0].is_truthy() {
        return Ok(args[1].clone());
    }
    Ok(args[0].clone())
}

/// `||`: returns the first operand when truthy, the second otherwise.
fn logical_or(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    if args[0].is_truthy() {
        return Ok(args[0].clone());
    }
    Ok(args[1].clone())
}

/// `in`: membership test. A value in a list, a key in an object, or a
/// substring in a string.
fn contains(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    match &args[1] {
        Value::List(items) => Ok(Value::Bool(items.contains(&args[0]))),
        Value::Object(map) => Ok(Value::Bool(map.borrow().contains(&member_key(&args[0])))),
        Value::Str(text) => Ok(Value::Bool(text.contains(&args[0].to_text()))),
        other => Err(format!("cannot search in a {}", other.type_name())),
    }
}

/// `set`: binds a member on an object and returns the object. Works on the
/// scope objects produced by `local` and `global` as well.
fn set(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::Object(map) = &args[0] else {
        return Err(format!("can only set members of an object, got {}", args[0].type_name()));
    };
    let key = member_key(&args[1]);
    if let Value::Lambda(lambda) = &args[2] {
        *lambda.name.borrow_mut() = Rc::from(key.as_str());
    }
    map.borrow_mut().set(&key, args[2].clone());
    Ok(args[0].clone())
}

/// `get`: reads a member, with the same semantics as member access.
fn get(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    read_member(&args[0], &args[1]).map_err(|error| error.to_string())
}

/// `unset`: removes a member from an object and returns the object.
fn unset(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::Object(map) = &args[0] else {
        return Err(format!("can only unset members of an object, got {}", args[0].type_name()));
    };
    map.borrow_mut().remove(&member_key(&args[1]));
    Ok(args[0].clone())
}

/// `use`: copies every entry of the source object into the target object.
/// `use(local, obj)` imports an object's entries into the current scope.
fn use_bindings(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let (Value::Object(target), Value::Object(source)) = (&args[0], &args[1]) else {
        return Err(format!("expected two objects, got {} and {}",
                           args[0].type_name(),
                           args[1].type_name()));
    };
    if !Rc::ptr_eq(target, source) {
        let source = source.borrow();
        target.borrow_mut().merge(&source);
    }
    Ok(args[0].clone())
}

/// `push`: a new list with the given values appended.
fn push(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::List(items) = &args[0] else {
        return Err(format!("expected a list, got {}", args[0].type_name()));
    };
    let mut items = items.as_ref().clone();
    items.extend(args[1..].iter().cloned());
    Ok(Value::list(items))
}

/// `pop`: a new list without the last element.
fn pop(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::List(items) = &args[0] else {
        return Err(format!("expected a list, got {}", args[0].type_name()));
    };
    let mut items = items.as_ref().clone();
    items.pop();
    Ok(Value::list(items))
}

/// `insert`: a new list with a value inserted at an index (clamped to the
/// length).
fn insert(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::List(items) = &args[0] else {
        return Err(format!("expected a list, got {}", args[0].type_name()));
    };
    let index = index_argument(&args[1])?.min(items.len());
    let mut items = items.as_ref().clone();
    items.insert(index, args[2].clone());
    Ok(Value::list(items))
}

/// `slice`: a sub-list or substring from `start` to an optional `end`
/// (character indices for strings), clamped to the bounds.
fn slice(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let start = index_argument(&args[1])?;
    match &args[0] {
        Value::List(items) => {
            let end = match args.get(2) {
                Some(value) => index_argument(value)?.min(items.len()),
                None => items.len(),
            };
            let start = start.min(items.len());
            let end = end.max(start);
            Ok(Value::list(items[start..end].to_vec()))
        },
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let end = match args.get(2) {
                Some(value) => index_argument(value)?.min(chars.len()),
                None => chars.len(),
            };
            let start = start.min(chars.len());
            let end = end.max(start);
            Ok(Value::from(chars[start..end].iter().collect::<String>()))
        },
        other => Err(format!("expected a list or string, got {}", other.type_name())),
    }
}

/// `search`: the index of a value in a list or of a substring in a string;
/// `nil` when absent.
fn search(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::List(items) => {
            Ok(items.iter().position(|value| *value == args[1]).map_or(Value::Nil, index_number))
        },
        Value::Str(text) => {
            let needle = args[1].to_text();
            Ok(text.find(&needle)
                   .map_or(Value::Nil, |byte| index_number(text[..byte].chars().count())))
        },
        other => Err(format!("expected a list or string, got {}", other.type_name())),
    }
}

/// `keys`: an object's keys in insertion order, or a list's indices.
fn keys(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Object(map) => Ok(Value::list(map.borrow()
                                                .entries()
                                                .iter()
                                                .map(|(key, _)| Value::Str(Rc::clone(key)))
                                                .collect())),
        Value::List(items) => Ok(Value::list((0..items.len()).map(index_number).collect())),
        other => Err(format!("expected a list or object, got {}", other.type_name())),
    }
}

/// `values`: an object's values in insertion order, or the list itself.
fn values(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Object(map) => Ok(Value::list(map.borrow()
                                                .entries()
                                                .iter()
                                                .map(|(_, value)| value.clone())
                                                .collect())),
        Value::List(_) => Ok(args[0].clone()),
        other => Err(format!("expected a list or object, got {}", other.type_name())),
    }
}

/// `size`: element count of a list or object, character count of a string.
fn size(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::List(items) => Ok(index_number(items.len())),
        Value::Object(map) => Ok(index_number(map.borrow().len())),
        Value::Str(text) => Ok(index_number(text.chars().count())),
        other => Err(format!("expected a list, object, or string, got {}", other.type_name())),
    }
}

/// `join`: concatenates a list's elements into a string with an optional
/// separator (`,` by default).
fn join(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::List(items) = &args[0] else {
        return Err(format!("expected a list, got {}", args[0].type_name()));
    };
    let separator = args.get(1).map_or_else(|| ",".to_string(), Value::to_text);
    Ok(Value::from(items.iter().map(Value::to_text).collect::<Vec<_>>().join(&separator)))
}

/// `split`: splits a string on a separator; an empty separator splits into
/// characters.
fn split(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::Str(text) = &args[0] else {
        return Err(format!("expected a string, got {}", args[0].type_name()));
    };
    let separator = args[1].to_text();
    if separator.is_empty() {
        return Ok(Value::list(text.chars().map(|ch| Value::from(ch.to_string())).collect()));
    }
    Ok(Value::list(text.split(separator.as_str()).map(Value::from).collect()))
}

/// `map`: applies a callable to each element (receiving the element and its
/// index) and collects the results.
fn map_list(evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::List(items) = &args[0] else {
        return Err(format!("expected a list, got {}", args[0].type_name()));
    };
    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let value = evaluator.apply(&args[1], &[item.clone(), index_number(index)])
                             .map_err(|error| error.to_string())?;
        results.push(value);
    }
    Ok(Value::list(results))
}

/// `filter`: keeps the elements for which the callable returns a truthy
/// value.
fn filter_list(evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::List(items) = &args[0] else {
        return Err(format!("expected a list, got {}", args[0].type_name()));
    };
    let mut results = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let keep = evaluator.apply(&args[1], &[item.clone(), index_number(index)])
                            .map_err(|error| error.to_string())?;
        if keep.is_truthy() {
            results.push(item.clone());
        }
    }
    Ok(Value::list(results))
}

/// `reduce`: folds a list with a callable receiving the accumulator, the
/// element, and its index.
fn reduce_list(evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::List(items) = &args[0] else {
        return Err(format!("expected a list, got {}", args[0].type_name()));
    };
    let mut accumulator = args[2].clone();
    for (index, item) in items.iter().enumerate() {
        accumulator = evaluator.apply(&args[1],
                                      &[accumulator, item.clone(), index_number(index)])
                               .map_err(|error| error.to_string())?;
    }
    Ok(accumulator)
}

/// `repeat`: a string or list repeated a number of times.
fn repeat(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let count = index_argument(&args[1])?;
    match &args[0] {
        Value::Str(text) => Ok(Value::from(text.repeat(count))),
        Value::List(items) => {
            let mut results = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                results.extend(items.iter().cloned());
            }
            Ok(Value::list(results))
        },
        other => Err(format!("expected a string or list, got {}", other.type_name())),
    }
}

/// `char`: the character of a string at an index, or `nil` past the end.
fn char_at(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    let Value::Str(text) = &args[0] else {
        return Err(format!("expected a string, got {}", args[0].type_name()));
    };
    let index = index_argument(&args[1])?;
    Ok(text.chars()
           .nth(index)
           .map_or(Value::Nil, |ch| Value::from(ch.to_string())))
}

/// `print`: writes the value's bare text to standard output and returns the
/// value.
fn print(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    println!("{}", args[0].to_text());
    Ok(args[0].clone())
}

/// `assert`: fails unless the argument is truthy.
fn assert_fn(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    if !args[0].is_truthy() {
        return Err("assertion failed".to_string());
    }
    Ok(args[0].clone())
}

/// `throw`: raises the argument's text as an error, catchable by `try`.
fn throw(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    Err(args[0].to_text())
}

/// `sym`: turns a string into a symbol; macros use this to build syntax
/// trees with symbol heads.
fn sym(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Str(name) => Ok(Value::Symbol(Rc::clone(name))),
        Value::Symbol(_) => Ok(args[0].clone()),
        other => Err(format!("expected a string, got {}", other.type_name())),
    }
}

/// `type`: the name of the value's type.
fn type_of(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, String> {
    Ok(Value::from(args[0].type_name()))
}
