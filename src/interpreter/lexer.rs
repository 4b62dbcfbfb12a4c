use logos::Logos;

use crate::{error::LexError, util::num::format_number};

/// Represents a lexical token kind in the source input.
///
/// The derive attributes form the lexer's ordered rule table: keywords are
/// listed before the identifier rule, and multi-character operators before
/// their single-character prefixes. Whitespace and comments are skipped.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n\r]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum TokenKind {
    /// Numeric literal tokens, such as `3.14`, `.5`, `42` or `2.1e-10`.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", parse_number)]
    #[regex(r"[0-9]+([eE][+-]?[0-9]+)?", parse_number)]
    Number(f64),
    /// String literal tokens in single or double quotes, with backslash
    /// escapes decoded.
    #[regex(r#""(\\.|[^"\\])*""#, decode_string)]
    #[regex(r"'(\\.|[^'\\])*'", decode_string)]
    Str(String),
    /// `if`
    #[token("if")]
    If,
    /// `then`
    #[token("then")]
    Then,
    /// `else`
    #[token("else")]
    Else,
    /// `and`
    #[token("and")]
    And,
    /// `or`
    #[token("or")]
    Or,
    /// `not`
    #[token("not")]
    Not,
    /// `in`
    #[token("in")]
    In,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// `nil`
    #[token("nil")]
    Nil,
    /// `return`
    #[token("return")]
    Return,
    /// `macro`
    #[token("macro")]
    Macro,
    /// `lambda`
    #[token("lambda")]
    Lambda,
    /// Identifier tokens; variable or function names such as `x` or `square`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `&&`
    #[token("&&")]
    AmpAmp,
    /// `||`
    #[token("||")]
    PipePipe,
    /// `++`
    #[token("++")]
    PlusPlus,
    /// `--`
    #[token("--")]
    MinusMinus,
    /// `+=`
    #[token("+=")]
    PlusEqual,
    /// `-=`
    #[token("-=")]
    MinusEqual,
    /// `*=`
    #[token("*=")]
    StarEqual,
    /// `/=`
    #[token("/=")]
    SlashEqual,
    /// `->`
    #[token("->")]
    Arrow,
    /// `=>`
    #[token("=>")]
    FatArrow,
    /// `...`
    #[token("...")]
    Ellipsis,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `^`
    #[token("^")]
    Caret,
    /// `!`
    #[token("!")]
    Bang,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `=`
    #[token("=")]
    Equal,
    /// `?`
    #[token("?")]
    Question,
    /// `:`
    #[token(":")]
    Colon,
    /// `.`
    #[token(".")]
    Dot,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Number(value) => return write!(f, "{}", format_number(*value)),
            Self::Str(text) => return write!(f, "'{text}'"),
            Self::Name(name) => return write!(f, "{name}"),
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::In => "in",
            Self::True => "true",
            Self::False => "false",
            Self::Nil => "nil",
            Self::Return => "return",
            Self::Macro => "macro",
            Self::Lambda => "lambda",
            Self::EqualEqual => "==",
            Self::BangEqual => "!=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::PlusEqual => "+=",
            Self::MinusEqual => "-=",
            Self::StarEqual => "*=",
            Self::SlashEqual => "/=",
            Self::Arrow => "->",
            Self::FatArrow => "=>",
            Self::Ellipsis => "...",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::Bang => "!",
            Self::Less => "<",
            Self::Greater => ">",
            Self::Equal => "=",
            Self::Question => "?",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Semicolon => ";",
        };
        write!(f, "{text}")
    }
}

/// Parses a numeric literal from the current token slice.
fn parse_number(lex: &logos::Lexer<TokenKind>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Strips the quotes from a string literal and decodes its escapes.
fn decode_string(lex: &logos::Lexer<TokenKind>) -> Option<String> {
    let slice = lex.slice();
    decode_escapes(&slice[1..slice.len() - 1])
}

/// Decodes backslash escapes using the JSON string conventions, extended
/// with `\'`.
///
/// Supports `\n \r \t \b \f \\ \/ \' \"` and `\uXXXX` (with surrogate
/// pairs). Returns `None` for a malformed escape, which surfaces as an
/// unrecognized-character error at the string's position.
fn decode_escapes(raw: &str) -> Option<String> {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => decoded.push('\n'),
            'r' => decoded.push('\r'),
            't' => decoded.push('\t'),
            'b' => decoded.push('\u{8}'),
            'f' => decoded.push('\u{c}'),
            'u' => {
                let mut unit = read_hex4(&mut chars)?;
                if (0xD800..=0xDBFF).contains(&unit) {
                    if chars.next()? != '\\' || chars.next()? != 'u' {
                        return None;
                    }
                    let low = read_hex4(&mut chars)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return None;
                    }
                    unit = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                }
                decoded.push(char::from_u32(unit)?);
            },
            other @ ('\\' | '/' | '\'' | '"') => decoded.push(other),
            _ => return None,
        }
    }
    Some(decoded)
}

/// Reads four hex digits from the character stream.
fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..4 {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

/// A token with its source position.
///
/// `line` and `column` are 1-based; `start` and `end` are byte offsets into
/// the source. The parser compares offsets of neighboring tokens to tell a
/// call `f(x)` from a grouped expression `f (x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind, carrying decoded literal values.
    pub kind:   TokenKind,
    /// 1-based source line.
    pub line:   usize,
    /// 1-based source column.
    pub column: usize,
    /// Byte offset of the token's first character.
    pub start:  usize,
    /// Byte offset one past the token's last character.
    pub end:    usize,
}

/// Maps byte offsets to line and column coordinates.
#[derive(Debug)]
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(offset + 1);
            }
        }
        Self { starts }
    }

    fn line_column(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|start| *start <= offset);
        (line, offset - self.starts[line - 1] + 1)
    }
}

/// Tokenizes a source string and drives the parser's token cursor.
///
/// The whole input is tokenized eagerly; the cursor then walks the token
/// vector with one token of lookahead and a single-slot bookmark for
/// host-driven save/restore.
#[derive(Debug)]
pub struct Lexer {
    tokens:     Vec<Token>,
    line_index: LineIndex,
    pos:        usize,
    bookmark:   Option<usize>,
}

impl Lexer {
    /// Tokenizes the input.
    ///
    /// # Errors
    /// Returns [`LexError::UnrecognizedCharacter`] when no rule matches at a
    /// non-end position.
    ///
    /// # Example
    /// ```
    /// use expreva::interpreter::lexer::{Lexer, TokenKind};
    ///
    /// let lexer = Lexer::new("1 + x").unwrap();
    /// assert_eq!(lexer.current().map(|t| t.kind.clone()),
    ///            Some(TokenKind::Number(1.0)));
    /// assert!(Lexer::new("1 @ 2").is_err());
    /// ```
    pub fn new(source: &str) -> Result<Self, LexError> {
        let line_index = LineIndex::new(source);
        let mut tokens = Vec::new();
        let mut lexer = TokenKind::lexer(source);
        while let Some(item) = lexer.next() {
            let span = lexer.span();
            let (line, column) = line_index.line_column(span.start);
            match item {
                Ok(kind) => tokens.push(Token { kind,
                                                line,
                                                column,
                                                start: span.start,
                                                end: span.end, }),
                Err(()) => return Err(LexError::UnrecognizedCharacter { line, column }),
            }
        }
        Ok(Self { tokens,
                  line_index,
                  pos: 0,
                  bookmark: None })
    }

    /// The token at the cursor, or `None` at end of input.
    #[must_use]
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// One token of lookahead past the cursor.
    #[must_use]
    pub fn next_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    /// The most recently consumed token.
    #[must_use]
    pub fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|index| self.tokens.get(index))
    }

    /// Consumes the current token and returns it.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Returns `true` when every token has been consumed.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Bookmarks the cursor. The bookmark has a single slot: a second `save`
    /// overwrites the first.
    ///
    /// # Example
    /// ```
    /// use expreva::interpreter::lexer::{Lexer, TokenKind};
    ///
    /// let mut lexer = Lexer::new("a b").unwrap();
    /// lexer.save();
    /// lexer.advance();
    /// lexer.restore();
    /// assert_eq!(lexer.current().map(|t| t.kind.clone()),
    ///            Some(TokenKind::Name("a".to_string())));
    /// ```
    pub fn save(&mut self) {
        self.bookmark = Some(self.pos);
    }

    /// Rewinds the cursor to the bookmark, if one was saved.
    pub fn restore(&mut self) {
        if let Some(position) = self.bookmark.take() {
            self.pos = position;
        }
    }

    /// Line and column coordinates for a byte offset, for error reporting.
    #[must_use]
    pub fn position_of(&self, offset: usize) -> (usize, usize) {
        self.line_index.line_column(offset)
    }

    /// The position of the cursor: the current token's coordinates, or the
    /// coordinates just past the last token at end of input.
    #[must_use]
    pub fn current_position(&self) -> (usize, usize) {
        match self.current() {
            Some(token) => (token.line, token.column),
            None => match self.tokens.last() {
                Some(token) => self.position_of(token.end),
                None => (1, 1),
            },
        }
    }
}

/// The `(type, regex)` rule table in the order the lexer matches, for
/// editor collaborators that re-implement highlighting.
static TOKEN_TYPES: &[(&str, &str)] = &[
    ("COMMENT", r"//[^\n\r]*"),
    ("COMMENT", r"/\*([^*]|\*[^/])*\*/"),
    ("NUMBER", r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+([eE][+-]?[0-9]+)?"),
    ("STRING", r#""(\\.|[^"\\])*""#),
    ("STRING", r"'(\\.|[^'\\])*'"),
    ("NAME", r"if|then|else|and|or|not|in|true|false|nil|return|macro|lambda"),
    ("NAME", r"[A-Za-z_][A-Za-z0-9_]*"),
    ("OP", r"==|!=|<=|>=|&&|\|\||\+\+|--|\+=|-=|\*=|/=|->|=>|\.\.\."),
    ("OP", r"[+\-*/%^!<>=?:.]"),
    ("PAREN", r"[()]"),
    ("BRACKET", r"[\[\]{}]"),
    ("COMMA", r","),
    ("SEMICOLON", r";"),
    ("EOF", r""),
];

/// Returns the ordered `(type, regex)` pairs the lexer matches.
#[must_use]
pub fn token_types() -> &'static [(&'static str, &'static str)] {
    TOKEN_TYPES
}
