//! Tokenizer for query expressions.

use crate::error::{KilnError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Identifier or keyword (`status`, `and`, `contains`, `true`).
    Ident(String),
    /// Quoted string literal, escapes resolved.
    Str(String),
    Number(f64),
    /// Comparison or logical symbol: `==`, `!=`, `>=`, `<=`, `>`, `<`, `=`, `&&`, `||`.
    Op(&'static str),
    Bang,
    Minus,
    Dot,
    Comma,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
}

impl Token {
    /// Case-insensitive keyword check.
    pub(crate) fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(w) if w.eq_ignore_ascii_case(word))
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut i = 0;

    let error = |message: String| KilnError::QueryParse {
        query: input.to_string(),
        message,
    };

    while i < len {
        let ch = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        // Two-character symbols first
        if i + 1 < len {
            let pair = match (ch, chars[i + 1]) {
                ('=', '=') => Some("=="),
                ('!', '=') => Some("!="),
                ('>', '=') => Some(">="),
                ('<', '=') => Some("<="),
                ('&', '&') => Some("&&"),
                ('|', '|') => Some("||"),
                _ => None,
            };
            if let Some(op) = pair {
                tokens.push(Token::Op(op));
                i += 2;
                continue;
            }
        }

        let single = match ch {
            '>' => Some(Token::Op(">")),
            '<' => Some(Token::Op("<")),
            '=' => Some(Token::Op("=")),
            '!' => Some(Token::Bang),
            '-' => Some(Token::Minus),
            '.' => Some(Token::Dot),
            ',' => Some(Token::Comma),
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            '[' => Some(Token::OpenBracket),
            ']' => Some(Token::CloseBracket),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push(token);
            i += 1;
            continue;
        }

        // Quoted string, either quote style
        if ch == '"' || ch == '\'' {
            let quote = ch;
            let start = i;
            i += 1;
            let mut s = String::new();
            while i < len && chars[i] != quote {
                if chars[i] == '\\' && i + 1 < len {
                    i += 1;
                    s.push(match chars[i] {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                } else {
                    s.push(chars[i]);
                }
                i += 1;
            }
            if i >= len {
                return Err(error(format!("Unterminated string at position {}", start)));
            }
            i += 1; // skip closing quote
            tokens.push(Token::Str(s));
            continue;
        }

        if ch.is_ascii_digit() {
            let start = i;
            while i < len && chars[i].is_ascii_digit() {
                i += 1;
            }
            // A fraction only when a digit follows the dot, so `x.y` stays a path
            if i + 1 < len && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < len && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let number = text
                .parse::<f64>()
                .map_err(|e| error(format!("Invalid number {:?}: {}", text, e)))?;
            tokens.push(Token::Number(number));
            continue;
        }

        if is_ident_start(ch) {
            let start = i;
            while i < len && is_ident_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        return Err(error(format!(
            "Unexpected character {:?} at position {}",
            ch, i
        )));
    }

    Ok(tokens)
}
