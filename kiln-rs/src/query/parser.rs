//! Recursive descent parser for query expressions.
//!
//! Grammar:
//! ```text
//! expr       = comparison (("and" | "or" | "&&" | "||") comparison)*
//! comparison = unary (binary_op unary | "is" ["not"] "empty")?
//! unary      = "!" unary | term
//! term       = factor ("." IDENT ["(" args ")"])*
//! factor     = IDENT | STRING | ["-"] NUMBER | "true" | "false" | "null"
//!            | "[" list "]" | "(" expr ")"
//! ```
//!
//! Word operators are matched case-insensitively: `is`, `is not`, `on`,
//! `not on`, `contains [any of | all of]`, `does not contain [any of | all of]`,
//! `starts with`, `does not start with`, `ends with`, `does not end with`.
//!
//! Nesting (parentheses, `!`, chained operators and method calls) is capped at
//! [`MAX_DEPTH`] levels so a hostile filter fails to parse instead of
//! exhausting the stack.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{tokenize, Token};
use super::value::Value;
use crate::error::{KilnError, Result};

/// Deepest expression tree the parser will build.
pub const MAX_DEPTH: usize = 128;

/// Parse a query string into an expression tree.
pub fn parse_expression(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(input, tokens);
    let expr = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(parser.error(format!(
            "Unexpected token {:?} at position {}",
            tok, parser.pos
        )));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            input,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: String) -> KilnError {
        KilnError::QueryParse {
            query: self.input.to_string(),
            message,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(ref tok) if tok == expected => Ok(()),
            Some(tok) => Err(self.error(format!(
                "Expected {:?}, got {:?} at position {}",
                expected, tok, self.pos
            ))),
            None => Err(self.error(format!("Expected {:?}, got end of input", expected))),
        }
    }

    /// Go one level deeper into the tree, failing past [`MAX_DEPTH`].
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error(format!(
                "Expression nested deeper than {} levels at position {}",
                MAX_DEPTH, self.pos
            )));
        }
        Ok(())
    }

    /// Consume the next token if it is the keyword `word`.
    fn eat_word(&mut self, word: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_word(word)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<()> {
        if self.eat_word(word) {
            return Ok(());
        }
        match self.peek() {
            Some(tok) => Err(self.error(format!(
                "Expected {:?}, got {:?} at position {}",
                word, tok, self.pos
            ))),
            None => Err(self.error(format!("Expected {:?}, got end of input", word))),
        }
    }

    /// expr = comparison (logical_op comparison)*
    fn parse_expr(&mut self) -> Result<Expr> {
        let entry = self.depth;
        self.descend()?;
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.peek() {
                Some(Token::Op("&&")) => BinaryOp::And,
                Some(Token::Op("||")) => BinaryOp::Or,
                Some(tok) if tok.is_word("and") => BinaryOp::And,
                Some(tok) if tok.is_word("or") => BinaryOp::Or,
                _ => break,
            };
            self.advance();
            // Each chained operator nests the left side one level deeper
            self.descend()?;
            let right = self.parse_comparison()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = entry;

        Ok(left)
    }

    /// comparison = unary (binary_op unary | "is" ["not"] "empty")?
    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_unary()?;

        let op = match self.peek() {
            Some(Token::Op(symbol)) => {
                let op = match *symbol {
                    "==" | "=" => BinaryOp::Eq,
                    "!=" => BinaryOp::NotEq,
                    ">" => BinaryOp::Gt,
                    ">=" => BinaryOp::Gte,
                    "<" => BinaryOp::Lt,
                    "<=" => BinaryOp::Lte,
                    // Logical symbols belong to the enclosing expr
                    _ => return Ok(left),
                };
                self.advance();
                op
            }
            Some(Token::Ident(_)) => match self.parse_word_operator()? {
                WordOp::Binary(op) => op,
                WordOp::Postfix(op) => return Ok(Expr::unary(op, left)),
                WordOp::None => return Ok(left),
            },
            _ => return Ok(left),
        };

        let right = self.parse_unary()?;
        Ok(Expr::binary(op, left, right))
    }

    fn parse_word_operator(&mut self) -> Result<WordOp> {
        if self.eat_word("is") {
            if self.eat_word("not") {
                if self.eat_word("empty") {
                    return Ok(WordOp::Postfix(UnaryOp::IsNotEmpty));
                }
                return Ok(WordOp::Binary(BinaryOp::NotEq));
            }
            if self.eat_word("empty") {
                return Ok(WordOp::Postfix(UnaryOp::IsEmpty));
            }
            return Ok(WordOp::Binary(BinaryOp::Eq));
        }

        if self.eat_word("on") {
            return Ok(WordOp::Binary(BinaryOp::On));
        }

        if self.eat_word("not") {
            self.expect_word("on")?;
            return Ok(WordOp::Binary(BinaryOp::NotOn));
        }

        if self.eat_word("contains") {
            let op = match self.parse_quantifier()? {
                Some(Quantifier::Any) => BinaryOp::ContainsAnyOf,
                Some(Quantifier::All) => BinaryOp::ContainsAllOf,
                None => BinaryOp::Contains,
            };
            return Ok(WordOp::Binary(op));
        }

        if self.eat_word("starts") {
            self.expect_word("with")?;
            return Ok(WordOp::Binary(BinaryOp::StartsWith));
        }

        if self.eat_word("ends") {
            self.expect_word("with")?;
            return Ok(WordOp::Binary(BinaryOp::EndsWith));
        }

        if self.eat_word("does") {
            self.expect_word("not")?;
            if self.eat_word("contain") {
                let op = match self.parse_quantifier()? {
                    Some(Quantifier::Any) => BinaryOp::NotContainsAnyOf,
                    Some(Quantifier::All) => BinaryOp::NotContainsAllOf,
                    None => BinaryOp::NotContains,
                };
                return Ok(WordOp::Binary(op));
            }
            if self.eat_word("start") {
                self.expect_word("with")?;
                return Ok(WordOp::Binary(BinaryOp::NotStartsWith));
            }
            if self.eat_word("end") {
                self.expect_word("with")?;
                return Ok(WordOp::Binary(BinaryOp::NotEndsWith));
            }
            return Err(self.error(format!(
                "Expected \"contain\", \"start\" or \"end\" after \"does not\" at position {}",
                self.pos
            )));
        }

        Ok(WordOp::None)
    }

    /// Optional `any of` / `all of` after a contain keyword.
    fn parse_quantifier(&mut self) -> Result<Option<Quantifier>> {
        if self.eat_word("any") {
            self.expect_word("of")?;
            return Ok(Some(Quantifier::Any));
        }
        if self.eat_word("all") {
            self.expect_word("of")?;
            return Ok(Some(Quantifier::All));
        }
        Ok(None)
    }

    /// unary = "!" unary | term
    fn parse_unary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Bang) {
            self.advance();
            let entry = self.depth;
            self.descend()?;
            let operand = self.parse_unary()?;
            self.depth = entry;
            return Ok(Expr::unary(UnaryOp::Not, operand));
        }
        self.parse_term()
    }

    /// term = factor ("." IDENT ["(" args ")"])*
    fn parse_term(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut expr = self.parse_factor()?;

        while self.peek() == Some(&Token::Dot) {
            self.advance();
            let name = match self.advance() {
                Some(Token::Ident(name)) => name,
                Some(tok) => {
                    return Err(self.error(format!(
                        "Expected property or method name, got {:?} at position {}",
                        tok, self.pos
                    )))
                }
                None => {
                    return Err(self.error(
                        "Expected property or method name, got end of input".to_string(),
                    ))
                }
            };

            if self.peek() == Some(&Token::OpenParen) {
                self.advance();
                self.descend()?;
                let args = self.parse_args(&Token::CloseParen)?;
                expr = Expr::MethodCall {
                    object: Box::new(expr),
                    name,
                    args,
                };
            } else {
                expr = match expr {
                    Expr::FieldRef(field) => Expr::FieldRef(format!("{}.{}", field, name)),
                    _ => {
                        return Err(self.error(format!(
                            "Unexpected property access .{} at position {}",
                            name, self.pos
                        )))
                    }
                };
            }
        }

        self.depth = entry;
        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_args(&mut self, close: &Token) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek() == Some(close) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.peek() == Some(&Token::Comma) {
                self.advance();
                continue;
            }
            self.expect(close)?;
            return Ok(args);
        }
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Ident(word)) => Ok(match word.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "nil" => Expr::Literal(Value::Null),
                _ => Expr::FieldRef(word),
            }),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Minus) => match self.advance() {
                Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(-n))),
                Some(tok) => Err(self.error(format!(
                    "Expected number after '-', got {:?} at position {}",
                    tok, self.pos
                ))),
                None => Err(self.error("Expected number after '-', got end of input".to_string())),
            },
            Some(Token::OpenBracket) => {
                let items = self.parse_args(&Token::CloseBracket)?;
                let values = items
                    .into_iter()
                    .map(|item| match item {
                        Expr::Literal(value) => Ok(value),
                        other => Err(self.error(format!(
                            "List items must be literals, got {:?}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Expr::Literal(Value::List(values)))
            }
            Some(Token::OpenParen) => {
                let expr = self.parse_expr()?;
                self.expect(&Token::CloseParen)?;
                Ok(expr)
            }
            Some(tok) => Err(self.error(format!(
                "Unexpected token {:?} at position {}",
                tok,
                self.pos - 1
            ))),
            None => Err(self.error("Unexpected end of input".to_string())),
        }
    }
}

enum WordOp {
    Binary(BinaryOp),
    Postfix(UnaryOp),
    None,
}

enum Quantifier {
    Any,
    All,
}
