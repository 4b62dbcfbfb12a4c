use crate::{
    ast::Value,
    interpreter::parser::core::{
        POWER_ADDITIVE, POWER_ASSIGN, POWER_COMMA, POWER_COMPARISON, POWER_EXPONENT,
        POWER_LOGICAL, POWER_MULTIPLICATIVE, POWER_POSTFIX, POWER_TERNARY, POWER_UNARY,
    },
    util::num::format_number,
};

/// A power that never needs parentheses.
const POWER_ATOM: u8 = u8::MAX;

/// Renders a runtime value for display.
///
/// Numbers print in integer form when integral, strings single-quoted with
/// their escapes re-encoded, lists and objects with bracketed elements, and
/// lambdas as their source form. This is also the `Display` implementation
/// of [`Value`].
#[must_use]
pub fn value_to_pretty_string(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Number(number) => format_number(*number),
        Value::Bool(value) => value.to_string(),
        Value::Str(text) => quote_string(text),
        Value::Symbol(name) => name.to_string(),
        Value::List(items) => {
            let items = items.iter().map(value_to_pretty_string).collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        },
        Value::Object(map) => {
            let map = map.borrow();
            if map.is_empty() {
                return "{}".to_string();
            }
            let entries = map.entries()
                             .iter()
                             .map(|(key, value)| {
                                 format!("{key}: {}", value_to_pretty_string(value))
                             })
                             .collect::<Vec<_>>();
            format!("{{ {} }}", entries.join(", "))
        },
        Value::Function(function) => format!("<function {}>", function.name),
        Value::Lambda(lambda) => {
            format!("{} => {}",
                    render_parameters(&lambda.params),
                    print_expression(&lambda.body, POWER_COMMA + 1))
        },
    }
}

/// Renders a syntax tree back to surface syntax.
///
/// The printer shares the parser's binding powers and parenthesizes only
/// where reparsing would otherwise change the tree, so for every tree the
/// parser can produce, printing and reparsing yields the same tree (and a
/// second print the same text). Forms with no surface syntax (`try`, `let`,
/// `eva`) render in call style, which reparses to the same form.
#[must_use]
pub fn syntax_tree_to_pretty_string(ast: &Value) -> String {
    if let Value::List(items) = ast
       && items.first().and_then(Value::as_symbol) == Some("do")
    {
        return items[1..]
               .iter()
               .map(|statement| print_expression(statement, 0))
               .collect::<Vec<_>>()
               .join("; ");
    }
    print_expression(ast, 0)
}

/// Prints a subtree, parenthesizing it when its own binding power is below
/// what the surrounding position requires.
fn print_expression(ast: &Value, minimum: u8) -> String {
    let (text, power) = render(ast);
    if power < minimum {
        return format!("({text})");
    }
    text
}

/// Renders one node and reports the binding power of the produced text.
fn render(ast: &Value) -> (String, u8) {
    let Value::List(items) = ast else {
        return render_atom(ast);
    };
    if items.is_empty() {
        return ("[]".to_string(), POWER_ATOM);
    }
    match items[0].as_symbol() {
        Some("`" | "expr") if items.len() == 2 => match &items[1] {
            Value::Str(text) => (quote_string(text), POWER_ATOM),
            payload => (print_expression(payload, 0), POWER_ATOM),
        },
        Some("lambda" | "λ") if items.len() == 3 => {
            let text = format!("{} => {}",
                               render_parameters(&items[1]),
                               print_expression(&items[2], POWER_COMMA + 1));
            (text, POWER_ASSIGN)
        },
        Some("if") if items.len() == 3 || items.len() == 4 => {
            let mut text = format!("if {} then {}",
                                   print_expression(&items[1], POWER_COMMA + 1),
                                   print_expression(&items[2], POWER_COMMA + 1));
            if let Some(else_branch) = items.get(3) {
                text.push_str(" else ");
                text.push_str(&print_expression(else_branch, POWER_COMMA + 1));
            }
            (text, POWER_TERNARY)
        },
        Some("def") if items.len() == 3 => {
            let text = format!("{} = {}",
                               print_expression(&items[1], 0),
                               print_expression(&items[2], POWER_ASSIGN));
            (text, POWER_ASSIGN)
        },
        Some("get") if items.len() >= 3 => {
            let mut text = print_expression(&items[1], POWER_POSTFIX);
            for member in &items[2..] {
                text.push_str(&render_member(member));
            }
            (text, POWER_POSTFIX)
        },
        Some("list") => {
            let elements = items[1..]
                           .iter()
                           .map(|element| print_expression(element, POWER_COMMA + 1))
                           .collect::<Vec<_>>();
            (format!("[{}]", elements.join(", ")), POWER_ATOM)
        },
        Some("obj") => render_object(&items[1..]),
        Some(",") => {
            let elements = items[1..]
                           .iter()
                           .map(|element| print_expression(element, POWER_COMMA + 1))
                           .collect::<Vec<_>>();
            (format!("({})", elements.join(", ")), POWER_ATOM)
        },
        Some("factorial") if items.len() == 2 => {
            (format!("{}!", print_expression(&items[1], POWER_POSTFIX)), POWER_POSTFIX)
        },
        Some("!") if items.len() == 2 => {
            (format!("!{}", print_expression(&items[1], POWER_UNARY)), POWER_UNARY)
        },
        Some("-") if items.len() == 2 => {
            (format!("-{}", print_expression(&items[1], POWER_UNARY)), POWER_UNARY)
        },
        Some("...") if items.len() == 2 => {
            (format!("...{}", print_expression(&items[1], POWER_UNARY)), POWER_UNARY)
        },
        Some("macro") if items.len() == 2 => {
            (format!("macro {}", print_expression(&items[1], POWER_COMMA + 1)), POWER_COMMA)
        },
        Some(operator) if items.len() == 3 && binary_power(operator).is_some() => {
            let power = binary_power(operator).unwrap_or(POWER_ADDITIVE);
            // `^` is the one right-associative binary operator.
            let (left_minimum, right_minimum) = if operator == "^" {
                (power + 1, power)
            } else {
                (power, power + 1)
            };
            let text = format!("{} {operator} {}",
                               print_expression(&items[1], left_minimum),
                               print_expression(&items[2], right_minimum));
            (text, power)
        },
        _ => render_call(items),
    }
}

/// Renders values and non-form atoms that can appear in a tree.
fn render_atom(ast: &Value) -> (String, u8) {
    match ast {
        Value::Number(number) if *number < 0.0 => (format_number(*number), POWER_UNARY),
        Value::Str(text) => (quote_string(text), POWER_ATOM),
        other => (value_to_pretty_string(other), POWER_ATOM),
    }
}

/// Renders an invocation (or a special form with no surface syntax, which
/// reparses to itself through the call syntax).
fn render_call(items: &[Value]) -> (String, u8) {
    let callee = match &items[0] {
        Value::Symbol(name) => name.to_string(),
        other => print_expression(other, POWER_POSTFIX),
    };
    let arguments = items[1..]
                    .iter()
                    .map(|argument| print_expression(argument, POWER_COMMA + 1))
                    .collect::<Vec<_>>();
    (format!("{callee}({})", arguments.join(", ")), POWER_POSTFIX)
}

/// Renders one `.member` step of a `get` chain.
fn render_member(member: &Value) -> String {
    if let Value::List(entry) = member
       && entry.len() == 2
       && entry[0].as_symbol() == Some("`")
       && let Value::Str(name) = &entry[1]
       && identifier_safe(name)
    {
        return format!(".{name}");
    }
    format!(".({})", print_expression(member, 0))
}

/// Renders an `obj` form's entries.
fn render_object(entries: &[Value]) -> (String, u8) {
    if entries.is_empty() {
        return ("{}".to_string(), POWER_ATOM);
    }
    let mut rendered = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(pair) = entry.list_items() else {
            rendered.push(print_expression(entry, POWER_COMMA + 1));
            continue;
        };
        if pair.first().and_then(Value::as_symbol) == Some("...") && pair.len() == 2 {
            rendered.push(format!("...{}", print_expression(&pair[1], POWER_UNARY)));
            continue;
        }
        if pair.len() == 2 {
            rendered.push(format!("{}: {}",
                                  render_object_key(&pair[0]),
                                  print_expression(&pair[1], POWER_COMMA + 1)));
            continue;
        }
        rendered.push(print_expression(entry, POWER_COMMA + 1));
    }
    (format!("{{ {} }}", rendered.join(", ")), POWER_ATOM)
}

/// Renders an object key: bare when it would lex back as an identifier,
/// a literal for strings and numbers, parenthesized otherwise.
fn render_object_key(key: &Value) -> String {
    if let Value::List(entry) = key
       && entry.len() == 2
       && entry[0].as_symbol() == Some("`")
       && let Value::Str(name) = &entry[1]
    {
        if identifier_safe(name) {
            return name.to_string();
        }
        return quote_string(name);
    }
    if let Value::Number(number) = key {
        return format_number(*number);
    }
    format!("({})", print_expression(key, 0))
}

/// Renders a lambda's parameter list: a bare name for one plain parameter,
/// a parenthesized tuple otherwise.
fn render_parameters(params: &Value) -> String {
    let Some(defs) = params.list_items() else {
        return format!("({})", print_expression(params, 0));
    };
    if let [Value::Symbol(name)] = defs {
        return name.to_string();
    }
    let defs = defs.iter().map(|def| print_expression(def, 0)).collect::<Vec<_>>();
    format!("({})", defs.join(", "))
}

/// The binding power of a binary operator spelling, if it is one.
fn binary_power(operator: &str) -> Option<u8> {
    match operator {
        "&&" | "||" => Some(POWER_LOGICAL),
        "==" | "!=" | "<" | "<=" | ">" | ">=" | "in" => Some(POWER_COMPARISON),
        "+" | "-" => Some(POWER_ADDITIVE),
        "*" | "/" | "%" => Some(POWER_MULTIPLICATIVE),
        "^" => Some(POWER_EXPONENT),
        _ => None,
    }
}

/// Returns `true` when the name lexes back as a single identifier token.
fn identifier_safe(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return false;
    }
    // Reserved words lex as keywords, not identifiers.
    !matches!(name,
              "if" | "then"
              | "else"
              | "and"
              | "or"
              | "not"
              | "in"
              | "true"
              | "false"
              | "nil"
              | "return"
              | "macro"
              | "lambda")
}

/// Quotes a string with the language's escape syntax.
fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch if (ch as u32) < 0x20 => {
                quoted.push_str(&format!("\\u{:04x}", ch as u32));
            },
            ch => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}
