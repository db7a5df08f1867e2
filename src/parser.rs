//! Recursive descent parser producing a call tree.
//!
//! ```text
//! program = command ;
//! command = [ "(" ] , identifier , { param } , [ ")" ] ;
//! param   = string_lit | int_lit | float_lit | "(" command ")" ;
//! ```
//!
//! Only the outermost command may drop its parentheses. Arity and types are
//! not checked here; that needs the environment.

use crate::lexer::{Lexer, Spanned, SyntaxError, SyntaxErrorKind, Token};
use crate::value::Value;

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A node of the call tree.
#[derive(Debug, Clone, PartialEq)]
pub enum CallNode {
    /// A literal argument.
    Literal(Value),
    /// A parenthesised sub-command used as an argument.
    Call(Call),
}

/// One command invocation: a name and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<CallNode>,
}

struct CallTreeBuilder<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Spanned>,
    end: usize,
    max_depth: usize,
}

impl<'a> CallTreeBuilder<'a> {
    fn new(input: &'a str, max_depth: usize) -> Self {
        Self {
            lexer: Lexer::new(input),
            lookahead: None,
            end: input.len(),
            max_depth,
        }
    }

    fn build(mut self) -> Result<Call, SyntaxError> {
        let call = self.parse_command(0)?;

        // Ensure we consumed all tokens
        match self.consume()? {
            None => Ok(call),
            Some(Spanned {
                token: Token::RParen,
                offset,
            }) => Err(SyntaxError::new(offset, SyntaxErrorKind::StrayParen)),
            Some(Spanned { token, offset }) => Err(SyntaxError::new(
                offset,
                SyntaxErrorKind::TrailingInput(token.to_string()),
            )),
        }
    }

    fn peek(&mut self) -> Result<Option<&Spanned>, SyntaxError> {
        if self.lookahead.is_none() {
            self.lookahead = self.lexer.next().transpose()?;
        }
        Ok(self.lookahead.as_ref())
    }

    fn consume(&mut self) -> Result<Option<Spanned>, SyntaxError> {
        self.peek()?;
        Ok(self.lookahead.take())
    }

    /// Parse a command: ['('] identifier param* [')']
    fn parse_command(&mut self, depth: usize) -> Result<Call, SyntaxError> {
        let opener = match self.peek()? {
            Some(Spanned {
                token: Token::LParen,
                offset,
            }) => Some(*offset),
            _ => None,
        };
        if opener.is_some() {
            self.consume()?;
        }

        let name = match self.consume()? {
            Some(Spanned {
                token: Token::Ident(name),
                ..
            }) => name,
            Some(Spanned {
                token: Token::RParen,
                offset,
            }) if opener.is_none() && depth == 0 => {
                return Err(SyntaxError::new(offset, SyntaxErrorKind::StrayParen));
            }
            Some(Spanned { token, offset }) => {
                return Err(SyntaxError::new(
                    offset,
                    SyntaxErrorKind::ExpectedName(token.to_string()),
                ));
            }
            None if opener.is_none() && depth == 0 => {
                return Err(SyntaxError::new(self.end, SyntaxErrorKind::Empty));
            }
            None => {
                return Err(SyntaxError::new(
                    self.end,
                    SyntaxErrorKind::ExpectedName("end of input".to_string()),
                ));
            }
        };

        let mut args = Vec::new();
        while let Some(arg) = self.parse_param(depth)? {
            args.push(arg);
        }

        if let Some(open) = opener {
            self.expect_close(open)?;
        }

        Ok(Call { name, args })
    }

    /// Parse one parameter, or return `None` at `)` or end of input.
    fn parse_param(&mut self, depth: usize) -> Result<Option<CallNode>, SyntaxError> {
        let Some(next) = self.peek()? else {
            return Ok(None);
        };
        let offset = next.offset;

        match &next.token {
            Token::RParen => Ok(None),
            Token::LParen => {
                if depth + 1 > self.max_depth {
                    return Err(SyntaxError::new(
                        offset,
                        SyntaxErrorKind::TooDeep(self.max_depth),
                    ));
                }
                self.consume()?;
                let call = self.parse_command(depth + 1)?;
                self.expect_close(offset)?;
                Ok(Some(CallNode::Call(call)))
            }
            Token::Ident(_) => {
                let token = next.token.to_string();
                Err(SyntaxError::new(offset, SyntaxErrorKind::ExpectedParam(token)))
            }
            Token::Str(_) | Token::Int(_) | Token::Float(_) => {
                let value = match self.consume()?.map(|s| s.token) {
                    Some(Token::Str(s)) => Value::String(s),
                    Some(Token::Int(v)) => Value::Int(v),
                    Some(Token::Float(v)) => Value::Float(v),
                    _ => unreachable!("lookahead was a literal"),
                };
                Ok(Some(CallNode::Literal(value)))
            }
        }
    }

    /// Consume the `)` matching the `(` at `open`.
    fn expect_close(&mut self, open: usize) -> Result<(), SyntaxError> {
        match self.consume()? {
            Some(Spanned {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Some(Spanned { token, offset }) => Err(SyntaxError::new(
                offset,
                SyntaxErrorKind::ExpectedClose(token.to_string()),
            )),
            None => Err(SyntaxError::new(open, SyntaxErrorKind::UnclosedParen)),
        }
    }
}

/// Parse command text into the root call, allowing [`DEFAULT_MAX_DEPTH`]
/// levels of sub-commands.
pub fn parse(input: &str) -> Result<Call, SyntaxError> {
    parse_with_depth(input, DEFAULT_MAX_DEPTH)
}

/// Parse command text, refusing sub-commands nested deeper than `max_depth`.
pub fn parse_with_depth(input: &str, max_depth: usize) -> Result<Call, SyntaxError> {
    let call = CallTreeBuilder::new(input, max_depth).build()?;
    tracing::debug!(command = %call.name, args = call.args.len(), "parsed command");
    Ok(call)
}
