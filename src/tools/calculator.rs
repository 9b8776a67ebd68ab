//! Safe arithmetic expression evaluation.
//!
//! Parses and evaluates expressions like `sqrt(16) + 2^3` without any
//! dynamic code execution: a tokenizer feeds a small recursive-descent
//! parser over a fixed operator and function set. Conversational noise
//! ("calculate", "what is", trailing `=`) is stripped first.

use crate::tools::registry::Tool;
use crate::types::{AppError, CalculationOutcome, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        super::CALCULATOR
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression, e.g. 'sqrt(16) + 2^3'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let raw = args
            .get("expression")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let expression = clean_expression(raw);
        if expression.is_empty() {
            return Err(AppError::InvalidInput("Empty expression".to_string()));
        }
        validate_charset(&expression)?;

        let result = evaluate(&expression)?;
        if result.is_nan() || result.is_infinite() {
            return Err(AppError::Tool("Result is not a valid number".to_string()));
        }

        let outcome = CalculationOutcome {
            expression,
            result,
            success: true,
        };
        serde_json::to_value(outcome).map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// Strip conversational noise around the actual expression.
fn clean_expression(raw: &str) -> String {
    let noise =
        regex::Regex::new(r"(?i)\b(calculate|compute|what is|equals?)\b").expect("static regex");
    noise
        .replace_all(raw, "")
        .trim()
        .trim_matches('=')
        .trim()
        .to_string()
}

/// Reject anything outside the arithmetic alphabet before parsing.
fn validate_charset(expression: &str) -> Result<()> {
    let ok = expression.chars().all(|c| {
        c.is_ascii_digit()
            || c.is_ascii_lowercase()
            || c.is_whitespace()
            || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.' | '^' | '%' | '_' | ',')
    });
    if ok {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "Expression contains invalid characters".to_string(),
        ))
    }
}

// ============= Tokenizer =============

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                // '**' is power, as is '^'.
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Caret);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal.parse::<f64>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid number: {literal}"))
                })?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_lowercase() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_lowercase()
                        || chars[i].is_ascii_digit()
                        || chars[i] == '_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(AppError::InvalidInput(format!(
                    "Unexpected character: {other}"
                )));
            }
        }
    }

    Ok(tokens)
}

// ============= Parser / Evaluator =============

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(ref token) if token == expected => Ok(()),
            other => Err(AppError::InvalidInput(format!(
                "Expected {expected:?}, found {other:?}"
            ))),
        }
    }

    // expr := term (('+'|'-') term)*
    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := unary (('*'|'/'|'//'|'%') unary)*
    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Star => {
                    self.advance();
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(AppError::InvalidInput("Division by zero".to_string()));
                    }
                    value /= divisor;
                }
                Token::DoubleSlash => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(AppError::InvalidInput("Division by zero".to_string()));
                    }
                    value = (value / divisor).floor();
                }
                Token::Percent => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(AppError::InvalidInput("Division by zero".to_string()));
                    }
                    value %= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // unary := '-' unary | power
    fn unary(&mut self) -> Result<f64> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.power()
    }

    // power := primary ('^' unary)?   (right-associative)
    fn power(&mut self) -> Result<f64> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // primary := number | ident '(' args ')' | ident | '(' expr ')'
    fn primary(&mut self) -> Result<f64> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        args.push(self.expr()?);
                        while self.peek() == Some(&Token::Comma) {
                            self.advance();
                            args.push(self.expr()?);
                        }
                    }
                    self.expect(&Token::RParen)?;
                    apply_function(&name, &args)
                } else {
                    named_constant(&name)
                }
            }
            other => Err(AppError::InvalidInput(format!(
                "Unexpected token: {other:?}"
            ))),
        }
    }
}

fn named_constant(name: &str) -> Result<f64> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(AppError::InvalidInput(format!("Unknown name: {name}"))),
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64> {
    let arity_error = |expected: &str| {
        Err(AppError::InvalidInput(format!(
            "{name} expects {expected} argument(s), got {}",
            args.len()
        )))
    };

    match name {
        "abs" => match args {
            [x] => Ok(x.abs()),
            _ => arity_error("1"),
        },
        "sqrt" => match args {
            [x] if *x >= 0.0 => Ok(x.sqrt()),
            [_] => Err(AppError::InvalidInput(
                "sqrt of a negative number".to_string(),
            )),
            _ => arity_error("1"),
        },
        "sin" => match args {
            [x] => Ok(x.sin()),
            _ => arity_error("1"),
        },
        "cos" => match args {
            [x] => Ok(x.cos()),
            _ => arity_error("1"),
        },
        "tan" => match args {
            [x] => Ok(x.tan()),
            _ => arity_error("1"),
        },
        "exp" => match args {
            [x] => Ok(x.exp()),
            _ => arity_error("1"),
        },
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.log(*base)),
            _ => arity_error("1 or 2"),
        },
        "log10" => match args {
            [x] => Ok(x.log10()),
            _ => arity_error("1"),
        },
        "ceil" => match args {
            [x] => Ok(x.ceil()),
            _ => arity_error("1"),
        },
        "floor" => match args {
            [x] => Ok(x.floor()),
            _ => arity_error("1"),
        },
        "round" => match args {
            [x] => Ok(x.round()),
            [x, digits] => {
                let factor = 10f64.powi(*digits as i32);
                Ok((x * factor).round() / factor)
            }
            _ => arity_error("1 or 2"),
        },
        "pow" => match args {
            [base, exponent] => Ok(base.powf(*exponent)),
            _ => arity_error("2"),
        },
        "min" => {
            if args.is_empty() {
                return arity_error("at least 1");
            }
            Ok(args.iter().cloned().fold(f64::INFINITY, f64::min))
        }
        "max" => {
            if args.is_empty() {
                return arity_error("at least 1");
            }
            Ok(args.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
        }
        "sum" => Ok(args.iter().sum()),
        _ => Err(AppError::InvalidInput(format!("Unknown function: {name}"))),
    }
}

/// Evaluate a cleaned expression string.
fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(AppError::InvalidInput("Empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(AppError::InvalidInput(
            "Trailing input after expression".to_string(),
        ));
    }
    Ok(value)
}
