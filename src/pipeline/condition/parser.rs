// SPDX-License-Identifier: MIT

//! Condition expression parser
//!
//! Parses rewritten conditions such as:
//! - `"main" == "main"`
//! - `matches("v1.2.3", "^v\\d+") && "prod" != ""`
//! - `!("a" == "b") || 2 >= 1`
//!
//! Precedence, lowest first: `||`, `&&`, comparisons, unary `!`/`-`.

use super::ast::{CompareOp, Expression, Literal};
use crate::error::ConditionError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    String(String),
    Number(f64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Compare(CompareOp),
    And,
    Or,
    Not,
    Minus,
}

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, ConditionError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error(format!("unexpected token {:?}", token))),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '"' | '\'' => {
                let (value, end) = read_string(&chars, i).ok_or_else(|| {
                    ConditionError::parse(input, "unterminated string literal")
                })?;
                tokens.push(Token::String(value));
                i = end;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text.parse::<f64>().map_err(|_| {
                    ConditionError::parse(input, format!("invalid number {}", text))
                })?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => {
                let (token, width) = match (c, next) {
                    ('=', Some('=')) => (Token::Compare(CompareOp::Eq), 2),
                    ('!', Some('=')) => (Token::Compare(CompareOp::NotEq), 2),
                    ('=', Some('~')) => (Token::Compare(CompareOp::Match), 2),
                    ('!', Some('~')) => (Token::Compare(CompareOp::NotMatch), 2),
                    ('>', Some('=')) => (Token::Compare(CompareOp::Gte), 2),
                    ('<', Some('=')) => (Token::Compare(CompareOp::Lte), 2),
                    ('&', Some('&')) => (Token::And, 2),
                    ('|', Some('|')) => (Token::Or, 2),
                    ('>', _) => (Token::Compare(CompareOp::Gt), 1),
                    ('<', _) => (Token::Compare(CompareOp::Lt), 1),
                    ('!', _) => (Token::Not, 1),
                    ('-', _) => (Token::Minus, 1),
                    ('(', _) => (Token::LParen, 1),
                    (')', _) => (Token::RParen, 1),
                    (',', _) => (Token::Comma, 1),
                    _ => {
                        return Err(ConditionError::parse(
                            input,
                            format!("unexpected character '{}'", c),
                        ))
                    }
                };
                tokens.push(token);
                i += width;
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted literal starting at `start`; a backslash takes the next
/// character literally. Returns the value and the index after the closing quote.
fn read_string(chars: &[char], start: usize) -> Option<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                value.push(*chars.get(i + 1)?);
                i += 2;
            }
            c if c == quote => return Some((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    None
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ConditionError {
        ConditionError::parse(self.input, message)
    }

    fn parse_or(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_comparison()?;
        while self.eat(&Token::And) {
            let right = self.parse_comparison()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_unary()?;
        while let Some(Token::Compare(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expression::Compare {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ConditionError> {
        if self.eat(&Token::Not) {
            return Ok(Expression::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expression::Negate(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, ConditionError> {
        match self.advance() {
            Some(Token::String(s)) => Ok(Expression::Literal(Literal::String(s))),
            Some(Token::Number(n)) => Ok(Expression::Literal(Literal::Number(n))),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expression::Literal(Literal::Boolean(true))),
                "false" => Ok(Expression::Literal(Literal::Boolean(false))),
                _ if self.eat(&Token::LParen) => {
                    let args = self.parse_args()?;
                    Ok(Expression::Call { name, args })
                }
                _ => Ok(Expression::Variable(name)),
            },
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            Some(token) => Err(self.error(format!("unexpected token {:?}", token))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    /// Arguments after an opening parenthesis, through the closing one
    fn parse_args(&mut self) -> Result<Vec<Expression>, ConditionError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            if !self.eat(&Token::Comma) {
                return Err(self.error("expected ',' or ')' in argument list"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Box<Expression> {
        Box::new(Expression::Literal(Literal::String(s.to_string())))
    }

    #[test]
    fn test_parse_simple_equality() {
        let expr = parse(r#""main" == "main""#).unwrap();
        assert_eq!(
            expr,
            Expression::Compare {
                left: string("main"),
                op: CompareOp::Eq,
                right: string("main"),
            }
        );
    }

    #[test]
    fn test_parse_single_quotes() {
        let expr = parse("'a' != 'b'").unwrap();
        assert_eq!(
            expr,
            Expression::Compare {
                left: string("a"),
                op: CompareOp::NotEq,
                right: string("b"),
            }
        );
    }

    #[test]
    fn test_parse_escapes() {
        let expr = parse(r#""^v\\d+\/x \"q\"""#).unwrap();
        assert_eq!(
            expr,
            Expression::Literal(Literal::String(r#"^v\d+/x "q""#.to_string()))
        );
    }

    #[test]
    fn test_parse_numeric_comparison() {
        let expr = parse("3 >= -1.5").unwrap();
        assert_eq!(
            expr,
            Expression::Compare {
                left: Box::new(Expression::Literal(Literal::Number(3.0))),
                op: CompareOp::Gte,
                right: Box::new(Expression::Negate(Box::new(Expression::Literal(
                    Literal::Number(1.5)
                )))),
            }
        );
    }

    #[test]
    fn test_parse_and_binds_tighter_than_or() {
        let expr = parse("true || false && false").unwrap();
        match expr {
            Expression::Or(left, right) => {
                assert_eq!(*left, Expression::Literal(Literal::Boolean(true)));
                assert!(matches!(*right, Expression::And(_, _)));
            }
            _ => panic!("Expected Or expression"),
        }
    }

    #[test]
    fn test_parse_parentheses_and_not() {
        let expr = parse(r#"!("a" == "b")"#).unwrap();
        match expr {
            Expression::Not(inner) => assert!(matches!(*inner, Expression::Compare { .. })),
            _ => panic!("Expected Not expression"),
        }
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse(r#"matches("v1", "^v")"#).unwrap();
        assert_eq!(
            expr,
            Expression::Call {
                name: "matches".to_string(),
                args: vec![*string("v1"), *string("^v")],
            }
        );
    }

    #[test]
    fn test_parse_bare_identifier() {
        let expr = parse(r#"CI == "true""#).unwrap();
        assert!(matches!(
            expr,
            Expression::Compare { left, .. } if *left == Expression::Variable("CI".to_string())
        ));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse(r#""a" =="#).is_err());
        assert!(parse(r#""unterminated"#).is_err());
        assert!(parse("a = b").is_err());
        assert!(parse("(true").is_err());
        assert!(parse("true false").is_err());
        assert!(parse("").is_err());
    }
}
