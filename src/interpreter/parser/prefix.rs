use crate::{
    ast::Value,
    error::ParseErrorKind,
    interpreter::{
        lexer::TokenKind,
        parser::core::{
            POWER_COMMA, POWER_UNARY, ParseResult, Parser, comma_elements, parse_expression,
        },
    },
};

/// Parses the expression that starts at the current token.
///
/// Literals become values (strings are emitted quoted so evaluation returns
/// their text), identifiers become symbols, and the bracket tokens dispatch
/// to the grouping, array, and object handlers. `return` is a reserved
/// noise word that passes its operand through unchanged.
pub(crate) fn parse_prefix(parser: &mut Parser) -> ParseResult<Value> {
    let Some(token) = parser.current() else {
        return Err(parser.end_of_input());
    };
    match token.kind.clone() {
        TokenKind::Number(value) => {
            parser.advance();
            Ok(Value::Number(value))
        },
        TokenKind::Str(text) => {
            parser.advance();
            Ok(Value::quoted(Value::from(text)))
        },
        TokenKind::Name(name) => {
            parser.advance();
            Ok(Value::symbol(&name))
        },
        TokenKind::True => {
            parser.advance();
            Ok(Value::Bool(true))
        },
        TokenKind::False => {
            parser.advance();
            Ok(Value::Bool(false))
        },
        TokenKind::Nil => {
            parser.advance();
            Ok(Value::Nil)
        },
        TokenKind::Minus => {
            parser.advance();
            let operand = parse_expression(parser, POWER_UNARY)?;
            Ok(Value::list(vec![Value::symbol("-"), operand]))
        },
        TokenKind::Plus => {
            parser.advance();
            parse_expression(parser, POWER_UNARY)
        },
        TokenKind::Bang | TokenKind::Not => {
            parser.advance();
            let operand = parse_expression(parser, POWER_UNARY)?;
            Ok(Value::list(vec![Value::symbol("!"), operand]))
        },
        TokenKind::Ellipsis => {
            parser.advance();
            let operand = parse_expression(parser, POWER_UNARY)?;
            Ok(Value::list(vec![Value::symbol("..."), operand]))
        },
        TokenKind::Return => {
            parser.advance();
            parse_expression(parser, POWER_COMMA)
        },
        TokenKind::Macro => {
            parser.advance();
            let target = parse_expression(parser, POWER_COMMA)?;
            Ok(Value::list(vec![Value::symbol("macro"), target]))
        },
        TokenKind::Lambda => {
            Err(parser.error_here(ParseErrorKind::ReservedWord { name: "lambda".to_string() }))
        },
        TokenKind::If => {
            parser.advance();
            parse_if(parser)
        },
        TokenKind::LParen => {
            parser.advance();
            parse_group(parser)
        },
        TokenKind::LBracket => {
            parser.advance();
            parse_array(parser)
        },
        TokenKind::LBrace => {
            parser.advance();
            parse_object(parser)
        },
        _ => Err(parser.unexpected_here()),
    }
}

/// Parses `if condition then a else b`.
///
/// `then` and `else` are noise words: `then` may be omitted entirely, and a
/// missing `else` branch makes the form yield `nil` when the condition is
/// false.
fn parse_if(parser: &mut Parser) -> ParseResult<Value> {
    let condition = parse_expression(parser, POWER_COMMA)?;
    parser.accept(&TokenKind::Then);
    let then_branch = parse_expression(parser, POWER_COMMA)?;
    let mut items = vec![Value::symbol("if"), condition, then_branch];
    if parser.accept(&TokenKind::Else) {
        items.push(parse_expression(parser, POWER_COMMA)?);
    }
    Ok(Value::list(items))
}

/// Parses the remainder of a parenthesized expression.
///
/// `()` is the empty argument tuple (and `nil` anywhere else). A comma
/// inside the parens aggregates into the `,` marker, which a following `=>`
/// reads as a parameter list and a following `->` spreads into call
/// arguments.
fn parse_group(parser: &mut Parser) -> ParseResult<Value> {
    if parser.accept(&TokenKind::RParen) {
        return Ok(Value::Nil);
    }
    let inner = parse_expression(parser, 0)?;
    if parser.accept(&TokenKind::RParen) {
        return Ok(inner);
    }
    Err(parser.error_here(ParseErrorKind::UnclosedDelimiter { delimiter: '(' }))
}

/// Parses the remainder of an array literal into a `list` form.
fn parse_array(parser: &mut Parser) -> ParseResult<Value> {
    let mut items = vec![Value::symbol("list")];
    if parser.accept(&TokenKind::RBracket) {
        return Ok(Value::list(items));
    }
    let inner = parse_expression(parser, 0)?;
    if !parser.accept(&TokenKind::RBracket) {
        return Err(parser.error_here(ParseErrorKind::UnclosedDelimiter { delimiter: '[' }));
    }
    items.extend(comma_elements(inner));
    Ok(Value::list(items))
}

/// Parses the remainder of an object literal into an `obj` form.
///
/// Entries are `key: value` pairs whose keys may be identifiers, numbers,
/// string literals, or `(expr)` for dynamic keys; `{ k }` is shorthand for
/// `{ k: k }`, and `...e` spreads another object's entries.
fn parse_object(parser: &mut Parser) -> ParseResult<Value> {
    let mut entries = vec![Value::symbol("obj")];
    loop {
        if parser.accept(&TokenKind::RBrace) {
            break;
        }
        if parser.accept(&TokenKind::Ellipsis) {
            let source = parse_expression(parser, POWER_COMMA)?;
            entries.push(Value::list(vec![Value::symbol("..."), source]));
        } else {
            entries.push(parse_object_entry(parser)?);
        }
        if parser.accept(&TokenKind::Comma) {
            continue;
        }
        if parser.accept(&TokenKind::RBrace) {
            break;
        }
        return Err(match parser.current() {
                       Some(token) => {
                           let found = token.kind.to_string();
                           parser.error_here(ParseErrorKind::ExpectedToken { expected:
                                                                                 "',' or '}'".to_string(),
                                                                             found })
                       },
                       None => {
                           parser.error_here(ParseErrorKind::UnclosedDelimiter { delimiter: '{' })
                       },
                   });
    }
    Ok(Value::list(entries))
}

/// Parses one `key: value` entry of an object literal.
fn parse_object_entry(parser: &mut Parser) -> ParseResult<Value> {
    let Some(token) = parser.current() else {
        return Err(parser.error_here(ParseErrorKind::UnclosedDelimiter { delimiter: '{' }));
    };
    let (key, shorthand) = match token.kind.clone() {
        TokenKind::Name(name) => {
            parser.advance();
            (Value::quoted(Value::from(name.as_str())), Some(Value::symbol(&name)))
        },
        TokenKind::Str(text) => {
            parser.advance();
            (Value::quoted(Value::from(text)), None)
        },
        TokenKind::Number(value) => {
            parser.advance();
            (Value::Number(value), None)
        },
        TokenKind::LParen => {
            parser.advance();
            let key = parse_expression(parser, 0)?;
            if !parser.accept(&TokenKind::RParen) {
                return Err(parser.error_here(ParseErrorKind::UnclosedDelimiter { delimiter:
                                                                                     '(' }));
            }
            (key, None)
        },
        other => {
            return Err(parser.error_here(ParseErrorKind::InvalidObjectKey { found:
                                                                                other.to_string() }));
        },
    };
    let value = if parser.accept(&TokenKind::Colon) {
        parse_expression(parser, POWER_COMMA)?
    } else if let Some(value) = shorthand {
        value
    } else {
        return Err(match parser.current() {
                       Some(token) => {
                           let found = token.kind.to_string();
                           parser.error_here(ParseErrorKind::ExpectedToken { expected:
                                                                                 "':'".to_string(),
                                                                             found })
                       },
                       None => parser.end_of_input(),
                   });
    };
    Ok(Value::list(vec![key, value]))
}
