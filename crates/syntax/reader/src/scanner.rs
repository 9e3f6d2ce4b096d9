//! Lazy tokenizer.

use std::fmt;

/// Characters that always form a token on their own.
const DELIMITERS: &[char] = &['(', ')', '[', ']', '{', '}', '\'', '`', '~', '^', '@'];

/// A token of Tendril source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A single-character delimiter.
    Delimiter(char),
    /// A double-quoted string, quotes included. `terminated` is false when
    /// the input ended before the closing quote.
    Str { text: &'a str, terminated: bool },
    /// Any other run of characters: numbers, symbols, dotted names, `key:`.
    Bare(&'a str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Delimiter(c) => write!(f, "{}", c),
            Token::Str { text, .. } | Token::Bare(text) => f.write_str(text),
        }
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn ends_bare_token(c: char) -> bool {
    is_separator(c) || matches!(c, ';' | '"' | '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '`')
}

/// Splits source text into [`Token`]s on demand.
///
/// Whitespace and commas separate tokens and are otherwise ignored, as is
/// everything from `;` to the end of the line.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    fn skip_ignored(&mut self) {
        loop {
            let rest = &self.source[self.position..];
            let trimmed = rest.trim_start_matches(is_separator);
            self.position += rest.len() - trimmed.len();
            if !trimmed.starts_with(';') {
                return;
            }
            self.position += trimmed.find('\n').unwrap_or(trimmed.len());
        }
    }

    fn string(&mut self, rest: &'a str) -> Token<'a> {
        let mut escaped = false;
        for (idx, c) in rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '"' => {
                    let end = idx + c.len_utf8();
                    self.position += end;
                    return Token::Str {
                        text: &rest[..end],
                        terminated: true,
                    };
                }
                _ => {}
            }
        }
        self.position += rest.len();
        Token::Str {
            text: rest,
            terminated: false,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.skip_ignored();
        let rest = &self.source[self.position..];
        let first = rest.chars().next()?;

        if DELIMITERS.contains(&first) {
            self.position += first.len_utf8();
            return Some(Token::Delimiter(first));
        }
        if first == '"' {
            return Some(self.string(rest));
        }

        let len = rest.find(ends_bare_token).unwrap_or(rest.len());
        self.position += len;
        Some(Token::Bare(&rest[..len]))
    }
}
