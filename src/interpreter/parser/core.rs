use crate::{
    ast::Value,
    error::{ParseError, ParseErrorKind},
    interpreter::{
        lexer::{Lexer, Token, TokenKind},
        parser::{infix::parse_infix, prefix::parse_prefix},
    },
};

/// Result type used by the parser.
pub type ParseResult<T> = Result<T, ParseError>;

/// Binding power of `,` (argument aggregation).
pub const POWER_COMMA: u8 = 5;
/// Binding power of `=` and its compound forms.
pub const POWER_ASSIGN: u8 = 10;
/// Binding power of the conditional operator `?`.
pub const POWER_TERNARY: u8 = 20;
/// Binding power of `&&`, `||`, `and`, `or`.
pub const POWER_LOGICAL: u8 = 30;
/// Binding power of comparisons and `in`.
pub const POWER_COMPARISON: u8 = 40;
/// Binding power of binary `+` and `-`.
pub const POWER_ADDITIVE: u8 = 50;
/// Binding power of `*`, `/`, `%`, and the pipe `->`.
pub const POWER_MULTIPLICATIVE: u8 = 60;
/// Binding power of `^`.
pub const POWER_EXPONENT: u8 = 65;
/// Binding power applied to the operand of a prefix operator.
pub const POWER_UNARY: u8 = 70;
/// Binding power of member access, calls, lambdas, and postfix operators.
pub const POWER_POSTFIX: u8 = 80;

/// A Pratt parser over the lexer's token cursor.
///
/// Expressions are parsed top-down by operator precedence: a prefix handler
/// produces the leftmost node, then infix handlers extend it while the next
/// token's left binding power exceeds the caller's right binding power.
pub struct Parser {
    pub(crate) lexer: Lexer,
}

impl Parser {
    /// Tokenizes the source and positions the cursor at the first token.
    ///
    /// # Errors
    /// Returns a [`ParseError`] when the input cannot be tokenized.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Self { lexer: Lexer::new(source)? })
    }

    /// Parses a whole program: expressions separated by optional `;` until
    /// the end of input.
    ///
    /// Zero statements produce `Nil`, a single statement is returned bare,
    /// and several become a `do` sequence. On failure the error carries the
    /// statements that parsed before it.
    ///
    /// # Errors
    /// Returns a [`ParseError`] carrying the partially parsed program.
    pub fn parse_program(&mut self) -> ParseResult<Value> {
        let mut statements = Vec::new();
        loop {
            while self.accept(&TokenKind::Semicolon) {}
            if self.lexer.at_end() {
                break;
            }
            match parse_expression(self, 0) {
                Ok(statement) => statements.push(statement),
                Err(error) => return Err(error.with_partial(sequence_value(statements))),
            }
        }
        Ok(sequence_value(statements))
    }

    /// The left binding power of the current token; `0` for terminators and
    /// at end of input.
    ///
    /// A `(` carries call power only when it immediately follows the
    /// previous token, so `f(x)` is a call while `f (x)` is the name `f`
    /// followed by a grouped expression.
    #[must_use]
    pub(crate) fn left_binding_power(&self) -> u8 {
        let Some(token) = self.lexer.current() else {
            return 0;
        };
        match &token.kind {
            TokenKind::Comma => POWER_COMMA,
            TokenKind::Equal
            | TokenKind::PlusEqual
            | TokenKind::MinusEqual
            | TokenKind::StarEqual
            | TokenKind::SlashEqual => POWER_ASSIGN,
            TokenKind::Question => POWER_TERNARY,
            TokenKind::AmpAmp | TokenKind::PipePipe | TokenKind::And | TokenKind::Or => {
                POWER_LOGICAL
            },
            TokenKind::EqualEqual
            | TokenKind::BangEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::In => POWER_COMPARISON,
            TokenKind::Plus | TokenKind::Minus => POWER_ADDITIVE,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::Arrow => {
                POWER_MULTIPLICATIVE
            },
            TokenKind::Caret => POWER_EXPONENT,
            TokenKind::Bang
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus
            | TokenKind::Dot
            | TokenKind::FatArrow => POWER_POSTFIX,
            TokenKind::LParen if self.call_adjacent() => POWER_POSTFIX,
            _ => 0,
        }
    }

    /// Returns `true` when the current `(` touches the token before it.
    fn call_adjacent(&self) -> bool {
        match (self.lexer.previous(), self.lexer.current()) {
            (Some(previous), Some(current)) => previous.end == current.start,
            _ => false,
        }
    }

    /// Consumes the current token.
    pub(crate) fn advance(&mut self) {
        self.lexer.advance();
    }

    /// Returns `true` when the current token matches.
    #[must_use]
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.lexer.current().is_some_and(|token| token.kind == *kind)
    }

    /// Consumes the current token when it matches.
    pub(crate) fn accept(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    /// Consumes the current token or fails with what was found instead.
    pub(crate) fn expect(&mut self, kind: &TokenKind) -> ParseResult<()> {
        if self.accept(kind) {
            return Ok(());
        }
        match self.lexer.current() {
            Some(token) => {
                let found = token.kind.to_string();
                Err(self.error_here(ParseErrorKind::ExpectedToken { expected: kind.to_string(),
                                                                    found }))
            },
            None => Err(self.end_of_input()),
        }
    }

    /// Bookmarks the cursor (single slot; see [`Lexer::save`]).
    pub fn save(&mut self) {
        self.lexer.save();
    }

    /// Rewinds the cursor to the bookmark.
    pub fn restore(&mut self) {
        self.lexer.restore();
    }

    /// Builds a parse error at the cursor's position.
    pub(crate) fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        let (line, column) = self.lexer.current_position();
        ParseError::new(kind, line, column)
    }

    /// Builds an unexpected-token error for the current token, or an
    /// end-of-input error past the last one.
    pub(crate) fn unexpected_here(&self) -> ParseError {
        match self.lexer.current() {
            Some(token) => {
                let token = token.kind.to_string();
                self.error_here(ParseErrorKind::UnexpectedToken { token })
            },
            None => self.end_of_input(),
        }
    }

    /// Builds an end-of-input error.
    pub(crate) fn end_of_input(&self) -> ParseError {
        self.error_here(ParseErrorKind::UnexpectedEndOfInput)
    }

    /// The current token, for handlers that branch on literal values.
    #[must_use]
    pub(crate) fn current(&self) -> Option<&Token> {
        self.lexer.current()
    }
}

/// Parses one expression with the given right binding power.
///
/// This is the Pratt loop: a prefix handler builds the leftmost node, then
/// infix handlers fold following operators in while they bind more tightly
/// than the caller.
pub fn parse_expression(parser: &mut Parser, right_binding_power: u8) -> ParseResult<Value> {
    let mut left = parse_prefix(parser)?;
    while right_binding_power < parser.left_binding_power() {
        left = parse_infix(parser, left)?;
    }
    Ok(left)
}

/// Folds parsed statements into a program value: `Nil` for none, the bare
/// statement for one, a `do` sequence otherwise.
pub(crate) fn sequence_value(mut statements: Vec<Value>) -> Value {
    match statements.len() {
        0 => Value::Nil,
        1 => statements.pop().unwrap_or(Value::Nil),
        _ => {
            let mut items = vec![Value::symbol("do")];
            items.extend(statements);
            Value::list(items)
        },
    }
}

/// Splits a comma-aggregated node into its elements, or wraps a single
/// value. The grouping, call, pipe, and lambda handlers use this to consume
/// the `,` argument marker.
pub(crate) fn comma_elements(value: Value) -> Vec<Value> {
    if let Value::List(items) = &value
       && items.first().and_then(Value::as_symbol) == Some(",")
    {
        return items[1..].to_vec();
    }
    vec![value]
}
