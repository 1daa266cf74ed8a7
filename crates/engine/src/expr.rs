//! Expression evaluator for thresholds and numeric action parameters.
//!
//! A small arithmetic/comparison language over a single reserved identifier,
//! `event`, bound to the event's magnitude. Comparisons and logical
//! operators yield `1.0`/`0.0`; any non-zero value is truthy.
//!
//! Supported grammar, loosest binding first:
//! `||` < `&&` < `== != < <= > >=` < `+ -` < `* /` < unary `- !`
//!
//! Evaluation is a pure function of the input string and magnitude; authoring
//! mistakes surface as [`ExprError`], never panics.

use thiserror::Error;
use tracing::warn;

/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("malformed number '{0}'")]
    MalformedNumber(String),

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,
}

/// Evaluate `expression` with the reserved `event` identifier bound to
/// `event` (the event's amount).
pub fn evaluate(expression: &str, event: f64) -> Result<f64, ExprError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        event,
    };
    let value = parser.expr(0)?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(ExprError::UnexpectedToken(format!("{:?}", token))),
    }
}

/// Evaluate an optional parameter expression, falling back to `default` when
/// the expression is absent or fails to evaluate. Authoring errors are
/// logged, never propagated.
pub fn eval_or_default(expression: Option<&str>, default: f64, event: f64) -> f64 {
    let Some(expression) = expression else {
        return default;
    };
    match evaluate(expression, event) {
        Ok(value) => value,
        Err(e) => {
            warn!(expression, error = %e, default, "expression error, using default");
            default
        }
    }
}

/// Non-zero values are truthy.
pub fn is_truthy(value: f64) -> bool {
    value != 0.0
}

// ── Tokenizer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Event,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Bang,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::MalformedNumber(literal.clone()))?;
                tokens.push(Token::Num(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if ident == "event" {
                    tokens.push(Token::Event);
                } else {
                    return Err(ExprError::UnknownIdentifier(ident));
                }
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Eq);
                } else {
                    return Err(ExprError::UnexpectedChar('='));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    tokens.push(Token::Bang);
                }
            }
            '&' => {
                chars.next();
                if chars.peek() == Some(&'&') {
                    chars.next();
                    tokens.push(Token::And);
                } else {
                    return Err(ExprError::UnexpectedChar('&'));
                }
            }
            '|' => {
                chars.next();
                if chars.peek() == Some(&'|') {
                    chars.next();
                    tokens.push(Token::Or);
                } else {
                    return Err(ExprError::UnexpectedChar('|'));
                }
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

// ── Parser ──────────────────────────────────────────────────────────

/// Precedence-climbing parser that evaluates as it parses.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    event: f64,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self, min_bp: u8) -> Result<f64, ExprError> {
        let mut lhs = self.prefix()?;

        while let Some(op) = self.peek() {
            let Some(bp) = binding_power(op) else { break };
            if bp < min_bp {
                break;
            }
            self.next();
            // Left-associative: right side binds one level tighter.
            let rhs = self.expr(bp + 1)?;
            lhs = apply(op, lhs, rhs)?;
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<f64, ExprError> {
        match self.next() {
            Some(Token::Num(value)) => Ok(value),
            Some(Token::Event) => Ok(self.event),
            Some(Token::Minus) => Ok(-self.prefix()?),
            Some(Token::Bang) => Ok(bool_value(!is_truthy(self.prefix()?))),
            Some(Token::LParen) => {
                let value = self.expr(0)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(token) => Err(ExprError::UnexpectedToken(format!("{:?}", token))),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(token) => Err(ExprError::UnexpectedToken(format!("{:?}", token))),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

fn binding_power(op: Token) -> Option<u8> {
    match op {
        Token::Or => Some(1),
        Token::And => Some(2),
        Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge => Some(3),
        Token::Plus | Token::Minus => Some(4),
        Token::Star | Token::Slash => Some(5),
        _ => None,
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn apply(op: Token, lhs: f64, rhs: f64) -> Result<f64, ExprError> {
    Ok(match op {
        Token::Plus => lhs + rhs,
        Token::Minus => lhs - rhs,
        Token::Star => lhs * rhs,
        Token::Slash => {
            if rhs == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            lhs / rhs
        }
        Token::Lt => bool_value(lhs < rhs),
        Token::Le => bool_value(lhs <= rhs),
        Token::Gt => bool_value(lhs > rhs),
        Token::Ge => bool_value(lhs >= rhs),
        Token::Eq => bool_value(lhs == rhs),
        Token::Ne => bool_value(lhs != rhs),
        Token::And => bool_value(is_truthy(lhs) && is_truthy(rhs)),
        Token::Or => bool_value(is_truthy(lhs) || is_truthy(rhs)),
        // Covered by binding_power returning None.
        other => return Err(ExprError::UnexpectedToken(format!("{:?}", other))),
    })
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(evaluate("1 + 2 * 3", 0.0).unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3", 0.0).unwrap(), 9.0);
        assert_eq!(evaluate("10 - 4 - 3", 0.0).unwrap(), 3.0);
        assert_eq!(evaluate("8 / 2 / 2", 0.0).unwrap(), 2.0);
    }

    #[test]
    fn event_binding() {
        assert_eq!(evaluate("event / 2", 20.0).unwrap(), 10.0);
        assert_eq!(evaluate("event", -1.0).unwrap(), -1.0);
    }

    #[test]
    fn comparisons_yield_bool_values() {
        assert_eq!(evaluate("event >= 20", 25.0).unwrap(), 1.0);
        assert_eq!(evaluate("event >= 20", 19.0).unwrap(), 0.0);
        assert_eq!(evaluate("event != 5", 5.0).unwrap(), 0.0);
        assert_eq!(evaluate("3 < 4", 0.0).unwrap(), 1.0);
    }

    #[test]
    fn logical_operators() {
        assert_eq!(evaluate("event >= 10 && event < 20", 15.0).unwrap(), 1.0);
        assert_eq!(evaluate("event >= 10 && event < 20", 25.0).unwrap(), 0.0);
        assert_eq!(evaluate("event == 1 || event == 2", 2.0).unwrap(), 1.0);
        assert_eq!(evaluate("!(event > 0)", -1.0).unwrap(), 1.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-event + 5", 3.0).unwrap(), 2.0);
        assert_eq!(evaluate("--2", 0.0).unwrap(), 2.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(evaluate("1 / 0", 0.0), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            evaluate("2 +", 0.0),
            Err(ExprError::UnexpectedEnd)
        ));
        assert!(matches!(
            evaluate("foo + 1", 0.0),
            Err(ExprError::UnknownIdentifier(_))
        ));
        assert!(matches!(
            evaluate("1 # 2", 0.0),
            Err(ExprError::UnexpectedChar('#'))
        ));
        assert!(matches!(
            evaluate("1 2", 0.0),
            Err(ExprError::UnexpectedToken(_))
        ));
        assert!(matches!(
            evaluate("1.2.3", 0.0),
            Err(ExprError::MalformedNumber(_))
        ));
    }

    #[test]
    fn eval_or_default_falls_back() {
        assert_eq!(eval_or_default(None, 1.0, 50.0), 1.0);
        assert_eq!(eval_or_default(Some("event / 2"), 1.0, 50.0), 25.0);
        assert_eq!(eval_or_default(Some("not valid ("), 1.0, 50.0), 1.0);
        assert_eq!(eval_or_default(Some("1 / 0"), 3.0, 50.0), 3.0);
    }
}
