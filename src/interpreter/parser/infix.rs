use crate::{
    ast::{Value, is_special_form},
    error::ParseErrorKind,
    interpreter::{
        lexer::TokenKind,
        parser::core::{
            POWER_ADDITIVE, POWER_ASSIGN, POWER_COMMA, POWER_COMPARISON, POWER_EXPONENT,
            POWER_LOGICAL, POWER_MULTIPLICATIVE, POWER_TERNARY, ParseResult, Parser,
            comma_elements, parse_expression,
        },
    },
};

/// Extends `left` with the operator at the current token.
///
/// Reached only when the token's left binding power exceeded the caller's
/// right binding power, so every arm may consume unconditionally.
pub(crate) fn parse_infix(parser: &mut Parser, left: Value) -> ParseResult<Value> {
    let Some(token) = parser.current() else {
        return Err(parser.end_of_input());
    };
    match token.kind.clone() {
        TokenKind::Plus => parse_binary(parser, left, "+", POWER_ADDITIVE),
        TokenKind::Minus => parse_binary(parser, left, "-", POWER_ADDITIVE),
        TokenKind::Star => parse_binary(parser, left, "*", POWER_MULTIPLICATIVE),
        TokenKind::Slash => parse_binary(parser, left, "/", POWER_MULTIPLICATIVE),
        TokenKind::Percent => parse_binary(parser, left, "%", POWER_MULTIPLICATIVE),
        // `^` chains right-associatively: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
        TokenKind::Caret => parse_binary(parser, left, "^", POWER_EXPONENT - 1),
        TokenKind::Less => parse_binary(parser, left, "<", POWER_COMPARISON),
        TokenKind::LessEqual => parse_binary(parser, left, "<=", POWER_COMPARISON),
        TokenKind::Greater => parse_binary(parser, left, ">", POWER_COMPARISON),
        TokenKind::GreaterEqual => parse_binary(parser, left, ">=", POWER_COMPARISON),
        TokenKind::EqualEqual => parse_binary(parser, left, "==", POWER_COMPARISON),
        TokenKind::BangEqual => parse_binary(parser, left, "!=", POWER_COMPARISON),
        TokenKind::In => parse_binary(parser, left, "in", POWER_COMPARISON),
        TokenKind::AmpAmp | TokenKind::And => parse_binary(parser, left, "&&", POWER_LOGICAL),
        TokenKind::PipePipe | TokenKind::Or => parse_binary(parser, left, "||", POWER_LOGICAL),
        TokenKind::Equal => parse_assignment(parser, left),
        TokenKind::PlusEqual => parse_compound_assignment(parser, left, "+"),
        TokenKind::MinusEqual => parse_compound_assignment(parser, left, "-"),
        TokenKind::StarEqual => parse_compound_assignment(parser, left, "*"),
        TokenKind::SlashEqual => parse_compound_assignment(parser, left, "/"),
        TokenKind::PlusPlus => parse_step(parser, left, "+"),
        TokenKind::MinusMinus => parse_step(parser, left, "-"),
        TokenKind::Bang => {
            parser.advance();
            Ok(Value::list(vec![Value::symbol("factorial"), left]))
        },
        TokenKind::Question => parse_conditional(parser, left),
        TokenKind::Dot => parse_member(parser, left),
        TokenKind::LParen => parse_call(parser, left),
        TokenKind::Arrow => parse_pipe(parser, left),
        TokenKind::FatArrow => parse_lambda(parser, left),
        TokenKind::Comma => {
            parser.advance();
            let right = parse_expression(parser, POWER_COMMA)?;
            Ok(push_comma(left, right))
        },
        _ => Err(parser.unexpected_here()),
    }
}

/// Parses the right operand of a binary operator and folds both sides into
/// an operator form. Passing the operator's own power keeps it
/// left-associative; passing one less makes it right-associative.
fn parse_binary(parser: &mut Parser,
                left: Value,
                operator: &str,
                right_binding_power: u8)
                -> ParseResult<Value> {
    parser.advance();
    let right = parse_expression(parser, right_binding_power)?;
    Ok(Value::list(vec![Value::symbol(operator), left, right]))
}

/// Parses `target = value` into a `def` form.
///
/// A member target stays a `get` node inside the `def`; the evaluator
/// rewrites it into a set on the owning object.
fn parse_assignment(parser: &mut Parser, left: Value) -> ParseResult<Value> {
    check_assignment_target(parser, &left)?;
    parser.advance();
    let value = parse_expression(parser, POWER_ASSIGN - 1)?;
    Ok(Value::list(vec![Value::symbol("def"), left, value]))
}

/// Parses `target op= value` as `target = target op value`.
fn parse_compound_assignment(parser: &mut Parser,
                             left: Value,
                             operator: &str)
                             -> ParseResult<Value> {
    check_assignment_target(parser, &left)?;
    parser.advance();
    let value = parse_expression(parser, POWER_ASSIGN - 1)?;
    let combined = Value::list(vec![Value::symbol(operator), left.clone(), value]);
    Ok(Value::list(vec![Value::symbol("def"), left, combined]))
}

/// Parses postfix `++`/`--` as `target = target op 1`.
fn parse_step(parser: &mut Parser, left: Value, operator: &str) -> ParseResult<Value> {
    check_assignment_target(parser, &left)?;
    parser.advance();
    let combined = Value::list(vec![Value::symbol(operator), left.clone(), Value::Number(1.0)]);
    Ok(Value::list(vec![Value::symbol("def"), left, combined]))
}

/// Rejects assignment targets that are neither names nor member accesses.
fn check_assignment_target(parser: &Parser, target: &Value) -> ParseResult<()> {
    if matches!(target, Value::Symbol(_)) || target.is_form("get") {
        return Ok(());
    }
    Err(parser.error_here(ParseErrorKind::InvalidAssignmentTarget))
}

/// Parses `condition ? a : b` into an `if` form. The else arm chains
/// right-associatively so `c ? a : d ? b : e` nests in the else position.
fn parse_conditional(parser: &mut Parser, left: Value) -> ParseResult<Value> {
    parser.advance();
    let then_branch = parse_expression(parser, 0)?;
    parser.expect(&TokenKind::Colon)?;
    let else_branch = parse_expression(parser, POWER_TERNARY - 1)?;
    Ok(Value::list(vec![Value::symbol("if"), left, then_branch, else_branch]))
}

/// Parses one `.member` step, flattening chains into a single `get` node:
/// `a.b.c` becomes `['get', a, 'b', 'c']` with the member keys quoted.
/// `.(expr)` evaluates the expression to a key.
fn parse_member(parser: &mut Parser, left: Value) -> ParseResult<Value> {
    parser.advance();
    let Some(token) = parser.current() else {
        return Err(parser.end_of_input());
    };
    let member = match token.kind.clone() {
        TokenKind::Name(name) => {
            parser.advance();
            Value::quoted(Value::from(name))
        },
        TokenKind::Str(text) => {
            parser.advance();
            Value::quoted(Value::from(text))
        },
        TokenKind::Number(value) => {
            parser.advance();
            Value::Number(value)
        },
        TokenKind::LParen => {
            parser.advance();
            let key = parse_expression(parser, 0)?;
            if !parser.accept(&TokenKind::RParen) {
                return Err(parser.error_here(ParseErrorKind::UnclosedDelimiter { delimiter:
                                                                                     '(' }));
            }
            key
        },
        other => {
            return Err(parser.error_here(ParseErrorKind::ExpectedToken { expected:
                                                                             "a member name".to_string(),
                                                                         found:
                                                                             other.to_string() }));
        },
    };
    if let Value::List(items) = &left
       && items.first().and_then(Value::as_symbol) == Some("get")
    {
        let mut items = items.as_ref().clone();
        items.push(member);
        return Ok(Value::list(items));
    }
    Ok(Value::list(vec![Value::symbol("get"), left, member]))
}

/// Parses a call's argument list into an invocation node `[callee, args…]`.
fn parse_call(parser: &mut Parser, left: Value) -> ParseResult<Value> {
    parser.advance();
    let mut items = vec![left];
    if !parser.accept(&TokenKind::RParen) {
        let inner = parse_expression(parser, 0)?;
        if !parser.accept(&TokenKind::RParen) {
            return Err(parser.error_here(ParseErrorKind::UnclosedDelimiter { delimiter: '(' }));
        }
        items.extend(comma_elements(inner));
    }
    Ok(Value::list(items))
}

/// Parses `x -> f` function application.
///
/// The left side (spread if it is an argument tuple) becomes the leading
/// arguments: `x -> f` is `f(x)`, `x -> f(y)` is `f(x, y)`, and
/// `(a, b) -> f` is `f(a, b)`. A right side that is itself a lambda, a
/// member access, or any other value-producing form is called whole.
fn parse_pipe(parser: &mut Parser, left: Value) -> ParseResult<Value> {
    parser.advance();
    let target = parse_expression(parser, POWER_MULTIPLICATIVE)?;
    let arguments = comma_elements(left);
    Ok(pipe_call(target, arguments))
}

/// Builds the call node for a pipe: call-shaped right sides receive the
/// piped arguments after their callee, everything else is applied to them.
fn pipe_call(target: Value, arguments: Vec<Value>) -> Value {
    if let Value::List(items) = &target
       && !items.is_empty()
       && !items[0].as_symbol().is_some_and(is_special_form)
    {
        let mut call = Vec::with_capacity(items.len() + arguments.len());
        call.push(items[0].clone());
        call.extend(arguments);
        call.extend(items[1..].iter().cloned());
        return Value::list(call);
    }
    let mut call = Vec::with_capacity(arguments.len() + 1);
    call.push(target);
    call.extend(arguments);
    Value::list(call)
}

/// Parses `params => body` into a `lambda` form.
///
/// The already-parsed left side supplies the parameters: a bare name, `()`
/// for none, or a parenthesized tuple whose elements may be names,
/// `name = default` pairs, or `...rest`.
fn parse_lambda(parser: &mut Parser, left: Value) -> ParseResult<Value> {
    parser.advance();
    let params = lambda_parameters(parser, left)?;
    let body = parse_expression(parser, POWER_COMMA)?;
    Ok(Value::list(vec![Value::symbol("lambda"), Value::list(params), body]))
}

/// Extracts and validates a lambda's parameter definitions.
fn lambda_parameters(parser: &Parser, left: Value) -> ParseResult<Vec<Value>> {
    let params = match &left {
        Value::Nil => Vec::new(),
        Value::List(items) if items.first().and_then(Value::as_symbol) == Some(",") => {
            items[1..].to_vec()
        },
        _ => vec![left],
    };
    for param in &params {
        if !valid_parameter(param) {
            return Err(parser.error_here(ParseErrorKind::InvalidParameter { found:
                                                                                param.to_string() }));
        }
    }
    Ok(params)
}

/// A parameter is a name, a `name = default` pair, or a `...rest` form.
fn valid_parameter(param: &Value) -> bool {
    match param {
        Value::Symbol(_) => true,
        Value::List(items) => match items.first().and_then(Value::as_symbol) {
            Some("def") => items.len() == 3 && matches!(items[1], Value::Symbol(_)),
            Some("...") => items.len() == 2 && matches!(items[1], Value::Symbol(_)),
            _ => false,
        },
        _ => false,
    }
}

/// Appends to an existing `,` aggregate or starts one.
fn push_comma(left: Value, right: Value) -> Value {
    if let Value::List(items) = &left
       && items.first().and_then(Value::as_symbol) == Some(",")
    {
        let mut items = items.as_ref().clone();
        items.push(right);
        return Value::list(items);
    }
    Value::list(vec![Value::symbol(","), left, right])
}
