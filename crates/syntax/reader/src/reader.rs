//! Recursive-descent reader over [`Scanner`] tokens.

use std::iter::Peekable;

use rhizome_tendril_ir::{Block, Form, KeyValue, PropertyAccess};
use thiserror::Error;

use crate::scanner::{Scanner, Token};

const UNEXPECTED_END: &str = "Unexpected end of input!";

/// A reader failure. The message is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when more input could complete the form, e.g. an unclosed list
    /// or string. A REPL uses this to keep buffering lines.
    pub fn is_unexpected_end(&self) -> bool {
        self.message == UNEXPECTED_END
    }

    fn unexpected_end() -> Self {
        Self::new(UNEXPECTED_END)
    }
}

/// Quotes `text` the way JSON does.
fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Reads exactly one form. Anything but whitespace or comments after it is
/// an error.
pub fn read_form(input: &str) -> Result<Form, ParseError> {
    let mut reader = Reader::new(input);
    let form = reader.form()?;
    match reader.tokens.next() {
        Some(token) => Err(ParseError::new(format!(
            "Unexpected token left!: {}",
            quote(&token.to_string())
        ))),
        None => Ok(form),
    }
}

/// Reads every form in `input`, in order.
pub fn read_block(input: &str) -> Result<Block, ParseError> {
    let mut reader = Reader::new(input);
    let mut block = Vec::new();
    while reader.tokens.peek().is_some() {
        block.push(reader.form()?);
    }
    Ok(block)
}

struct Reader<'a> {
    tokens: Peekable<Scanner<'a>>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokens: Scanner::new(input).peekable(),
        }
    }

    fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        self.tokens.next().ok_or_else(ParseError::unexpected_end)
    }

    fn form(&mut self) -> Result<Form, ParseError> {
        match self.next_token()? {
            Token::Delimiter('(') => self.sequence(')').map(Form::List),
            Token::Delimiter('[') => self.sequence(']').map(Form::LiteralArray),
            Token::Delimiter('{') => self.key_values().map(Form::KeyValues),
            token @ Token::Delimiter(')' | ']' | '}') => Err(ParseError::new(format!(
                "Unexpected token: {}",
                quote(&token.to_string())
            ))),
            token => atom(token),
        }
    }

    /// Reads forms up to and including `close`.
    fn sequence(&mut self, close: char) -> Result<Vec<Form>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.tokens.peek() {
                None => return Err(ParseError::unexpected_end()),
                Some(Token::Delimiter(c)) if *c == close => {
                    self.tokens.next();
                    return Ok(items);
                }
                Some(_) => items.push(self.form()?),
            }
        }
    }

    fn key_values(&mut self) -> Result<Vec<KeyValue>, ParseError> {
        let mut entries = Vec::new();
        loop {
            let entry = match self.next_token()? {
                Token::Delimiter('}') => return Ok(entries),
                Token::Bare(text) => match text.strip_suffix(':') {
                    Some(key) if !key.is_empty() => KeyValue::Pair {
                        key: bare(key)?,
                        value: self.form()?,
                    },
                    _ => shorthand(text)?,
                },
                token @ Token::Str { .. } => {
                    let key = atom(token)?;
                    self.colon()?;
                    KeyValue::Pair {
                        key,
                        value: self.form()?,
                    }
                }
                Token::Delimiter('[') => {
                    let key = Form::LiteralArray(self.sequence(']')?);
                    self.colon()?;
                    KeyValue::Pair {
                        key,
                        value: self.form()?,
                    }
                }
                token => {
                    return Err(ParseError::new(format!(
                        "Unexpected token in key-values: {}",
                        quote(&token.to_string())
                    )));
                }
            };
            entries.push(entry);
        }
    }

    fn colon(&mut self) -> Result<(), ParseError> {
        match self.next_token()? {
            Token::Bare(":") => Ok(()),
            token => Err(ParseError::new(format!(
                "Expected \":\" after a key, but got {}",
                quote(&token.to_string())
            ))),
        }
    }
}

fn shorthand(text: &str) -> Result<KeyValue, ParseError> {
    let form = if text.ends_with(':') {
        None
    } else {
        Some(bare(text)?)
    };
    match form {
        Some(Form::Symbol(symbol)) => Ok(KeyValue::Shorthand(symbol)),
        _ => Err(ParseError::new(format!(
            "Invalid shorthand entry in key-values: {}",
            quote(text)
        ))),
    }
}

fn atom(token: Token<'_>) -> Result<Form, ParseError> {
    match token {
        Token::Str {
            terminated: false, ..
        } => Err(ParseError::unexpected_end()),
        Token::Str { text, .. } => Ok(Form::String(unescape(&text[1..text.len() - 1]))),
        // Reader-macro characters have no meaning yet; they read as symbols.
        Token::Delimiter(c) => Ok(Form::symbol(c.to_string())),
        Token::Bare(text) => bare(text),
    }
}

fn bare(text: &str) -> Result<Form, ParseError> {
    if let Some(number) = number(text) {
        return Ok(number);
    }
    match text {
        "true" => Ok(Form::Bool(true)),
        "false" => Ok(Form::Bool(false)),
        "none" => Ok(Form::Undefined),
        _ if text.contains('.') => PropertyAccess::parse(text)
            .map(Form::PropertyAccess)
            .map_err(|_| ParseError::new(format!("Invalid property access: {}", quote(text)))),
        _ => Ok(Form::symbol(text)),
    }
}

/// `-?[0-9]+(\.[0-9]+)?`. Without a fraction the value is an `Integer32`,
/// wrapped like a JavaScript `x | 0`.
fn number(text: &str) -> Option<Form> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (integral, fraction) = match unsigned.split_once('.') {
        Some((integral, fraction)) => (integral, Some(fraction)),
        None => (unsigned, None),
    };
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(integral) || fraction.is_some_and(|f| !is_digits(f)) {
        return None;
    }

    let value: f64 = text.parse().ok()?;
    Some(match fraction {
        Some(_) => Form::Float64(value),
        None => Form::Integer32(to_int32(value)),
    })
}

fn to_int32(value: f64) -> i32 {
    const TWO_32: f64 = 4_294_967_296.0;
    const TWO_31: f64 = 2_147_483_648.0;
    if !value.is_finite() {
        return 0;
    }
    let wrapped = value.trunc().rem_euclid(TWO_32);
    let signed = if wrapped >= TWO_31 {
        wrapped - TWO_32
    } else {
        wrapped
    };
    signed as i32
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => {}
        }
    }
    out
}
