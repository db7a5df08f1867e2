//! Lexical analysis of command text.
//!
//! The lexer is an iterator: tokens are produced on demand, and the first error
//! ends the stream.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// A command name: a letter or `_` followed by letters, digits or `_`.
    Ident(String),
    /// A double-quoted string with escapes already resolved, or a back-quoted raw string.
    Str(String),
    /// An integer literal with optional sign.
    Int(i64),
    /// A decimal literal: optional sign, digits, `.`, digits.
    Float(f64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::Ident(name) => write!(f, "identifier `{name}`"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Int(v) => write!(f, "integer {v}"),
            Token::Float(v) => write!(f, "float {v}"),
        }
    }
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Lexing or parsing failure, located at a byte offset of the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at byte {offset}: {kind}")]
pub struct SyntaxError {
    pub offset: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub(crate) fn new(offset: usize, kind: SyntaxErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// Why the text could not be turned into a call tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    /// A character that starts no token.
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    /// The closing quote of a string literal was not found.
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unknown escape sequence `\\{0}`")]
    UnknownEscape(char),
    /// A numeric literal with bad digits, e.g. `1.`, `1.2.3` or `12ab`.
    #[error("malformed number `{0}`")]
    MalformedNumber(String),
    #[error("integer `{0}` does not fit in 64 bits")]
    IntegerOverflow(String),
    #[error("float `{0}` is out of range")]
    FloatOverflow(String),
    #[error("empty command")]
    Empty,
    #[error("expected a command name, found {0}")]
    ExpectedName(String),
    /// A `)` that closes nothing.
    #[error("unexpected `)`")]
    StrayParen,
    /// A `(` whose `)` never came.
    #[error("unmatched `(`")]
    UnclosedParen,
    #[error("expected `)`, found {0}")]
    ExpectedClose(String),
    /// A parameter that is neither a literal nor a parenthesised command.
    #[error("expected a literal or `(`, found {0}")]
    ExpectedParam(String),
    #[error("unexpected {0} after the end of the command")]
    TrailingInput(String),
    #[error("sub-commands nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Streaming tokenizer over a command string.
///
/// Yields `Ok` tokens until the input is exhausted or a single `Err`, after
/// which it yields nothing.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            failed: false,
        }
    }

    /// Byte offset of the next unread character.
    fn pos(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn read_ident(&mut self, start: usize) -> Token {
        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.chars.next();
        }
        let end = self.pos();
        Token::Ident(self.input[start..end].to_string())
    }

    fn read_digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.chars.next();
            count += 1;
        }
        count
    }

    /// Consume everything up to the next delimiter; used to report the whole
    /// malformed literal rather than its first bad character.
    fn skip_to_delimiter(&mut self) -> usize {
        while self.peek_char().is_some_and(|c| !is_delimiter(c)) {
            self.chars.next();
        }
        self.pos()
    }

    /// `first` is the sign or leading digit, already consumed.
    fn read_number(&mut self, start: usize, first: char) -> Result<Token, SyntaxError> {
        let int_digits = usize::from(first.is_ascii_digit()) + self.read_digits();
        let mut is_float = false;
        let mut well_formed = int_digits > 0;

        if self.peek_char() == Some('.') {
            self.chars.next();
            is_float = true;
            well_formed &= self.read_digits() > 0;
        }

        if self.peek_char().is_some_and(|c| !is_delimiter(c)) {
            well_formed = false;
        }

        let end = if well_formed {
            self.pos()
        } else {
            self.skip_to_delimiter()
        };
        let text = &self.input[start..end];
        if !well_formed {
            return Err(SyntaxError::new(
                start,
                SyntaxErrorKind::MalformedNumber(text.to_string()),
            ));
        }

        if is_float {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Token::Float(value)),
                Ok(_) => Err(SyntaxError::new(
                    start,
                    SyntaxErrorKind::FloatOverflow(text.to_string()),
                )),
                Err(_) => Err(SyntaxError::new(
                    start,
                    SyntaxErrorKind::MalformedNumber(text.to_string()),
                )),
            }
        } else {
            text.parse::<i64>().map(Token::Int).map_err(|_| {
                SyntaxError::new(start, SyntaxErrorKind::IntegerOverflow(text.to_string()))
            })
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Token, SyntaxError> {
        let mut buffer = String::new();
        while let Some((at, ch)) = self.chars.next() {
            match ch {
                '"' => return Ok(Token::Str(buffer)),
                '\\' => match self.chars.next() {
                    Some((_, '"')) => buffer.push('"'),
                    Some((_, '\\')) => buffer.push('\\'),
                    Some((_, 'n')) => buffer.push('\n'),
                    Some((_, 't')) => buffer.push('\t'),
                    Some((_, 'r')) => buffer.push('\r'),
                    Some((_, other)) => {
                        return Err(SyntaxError::new(at, SyntaxErrorKind::UnknownEscape(other)));
                    }
                    None => break,
                },
                c => buffer.push(c),
            }
        }
        Err(SyntaxError::new(start, SyntaxErrorKind::UnterminatedString))
    }

    fn read_raw_string(&mut self, start: usize) -> Result<Token, SyntaxError> {
        let content_start = self.pos();
        for (at, ch) in self.chars.by_ref() {
            if ch == '`' {
                return Ok(Token::Str(self.input[content_start..at].to_string()));
            }
        }
        Err(SyntaxError::new(start, SyntaxErrorKind::UnterminatedString))
    }

    fn read_token(&mut self) -> Option<Result<Spanned, SyntaxError>> {
        self.skip_whitespace();
        let (start, ch) = self.chars.next()?;

        let token = match ch {
            '(' => Ok(Token::LParen),
            ')' => Ok(Token::RParen),
            '"' => self.read_string(start),
            '`' => self.read_raw_string(start),
            c if c.is_ascii_digit() => self.read_number(start, c),
            '+' | '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start, ch)
            }
            c if c.is_alphabetic() || c == '_' => Ok(self.read_ident(start)),
            c => Err(SyntaxError::new(start, SyntaxErrorKind::UnexpectedChar(c))),
        };

        Some(token.map(|token| Spanned {
            token,
            offset: start,
        }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Spanned, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_token();
        if let Some(Err(_)) = &item {
            self.failed = true;
        }
        if let Some(Ok(spanned)) = &item {
            tracing::trace!(offset = spanned.offset, token = %spanned.token, "lexed token");
        }
        item
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

/// Tokenize the whole input eagerly.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, SyntaxError> {
    Lexer::new(input).collect()
}
