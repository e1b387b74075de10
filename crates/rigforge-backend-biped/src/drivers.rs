//! Rig properties and the drivers that read them.
//!
//! A module exposes animator-facing scalar properties on its prop holder
//! joint. Drivers map a property value `v` through a small arithmetic
//! expression onto a constraint influence, a constraint mute flag, a
//! joint hide flag, or a transform-lock channel. The expression language
//! is deliberately tiny: one variable, literals, `+ - * /`, comparisons,
//! `and` / `or`, parentheses. Comparisons and boolean operators collapse
//! to 0 or 1 so every expression is numeric end to end.

use serde::{Deserialize, Serialize};

use crate::error::{RigError, RigResult};

/// An animator-facing property exposed on a prop holder joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub description: String,
}

impl PropertyDef {
    pub fn new(
        name: impl Into<String>,
        min: f32,
        max: f32,
        default: f32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            default,
            description: description.into(),
        }
    }
}

/// Reference to a property on its holder joint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropRef {
    pub holder: String,
    pub property: String,
}

impl PropRef {
    pub fn new(holder: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            holder: holder.into(),
            property: property.into(),
        }
    }
}

/// Which lock triple a lock-channel driver writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockAttribute {
    Location,
    Rotation,
    Scale,
}

impl LockAttribute {
    pub fn as_str(self) -> &'static str {
        match self {
            LockAttribute::Location => "lock_location",
            LockAttribute::Rotation => "lock_rotation",
            LockAttribute::Scale => "lock_scale",
        }
    }
}

/// What a driver writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverTarget {
    /// Constraint influence, clamped to [0, 1] by the host.
    ConstraintInfluence { joint: String, constraint: String },
    /// Constraint mute flag; nonzero mutes.
    ConstraintMute { joint: String, constraint: String },
    /// Joint visibility; nonzero hides.
    JointHide { joint: String },
    /// One slot of a transform-lock triple; nonzero locks.
    LockChannel {
        joint: String,
        attribute: LockAttribute,
        index: u8,
    },
}

impl DriverTarget {
    /// The joint this driver writes to.
    pub fn joint(&self) -> &str {
        match self {
            DriverTarget::ConstraintInfluence { joint, .. }
            | DriverTarget::ConstraintMute { joint, .. }
            | DriverTarget::JointHide { joint }
            | DriverTarget::LockChannel { joint, .. } => joint,
        }
    }

    /// The constraint this driver writes to, if any.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DriverTarget::ConstraintInfluence { constraint, .. }
            | DriverTarget::ConstraintMute { constraint, .. } => Some(constraint),
            _ => None,
        }
    }
}

/// One property-to-attribute mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub prop: PropRef,
    pub expression: String,
    pub target: DriverTarget,
}

impl Driver {
    pub fn new(prop: PropRef, expression: impl Into<String>, target: DriverTarget) -> Self {
        Self {
            prop,
            expression: expression.into(),
            target,
        }
    }
}

/// Stock driver expressions.
pub mod expr {
    /// Pass the property through unchanged.
    pub const DIRECT: &str = "v";
    /// One minus the property.
    pub const INVERTED: &str = "1 - v";
    /// Mute the FK bind outside the FK region [0, 1).
    pub const FK_MUTE: &str = "1 - (v < 1)";
    /// Mute the IK bind outside the IK region [1, 2).
    pub const IK_MUTE: &str = "1 - (v >= 1 and v < 2)";
    /// IK bind influence: full at 1, fading to base over (1, 2].
    pub const BIND_BLEND: &str = "2 - v";
}

/// Evaluates a driver expression at property value `v`.
pub fn evaluate(expression: &str, v: f32) -> RigResult<f32> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        expression,
        tokens: &tokens,
        pos: 0,
    };
    let value = parser.or_term()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error("trailing input"));
    }
    Ok(value.resolve(v))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f32),
    Var,
    And,
    Or,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> RigResult<Vec<Token>> {
    let bytes = expression.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
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
            '<' | '>' => {
                let eq = bytes.get(i + 1) == Some(&b'=');
                tokens.push(match (c, eq) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::Le,
                    ('>', false) => Token::Gt,
                    _ => Token::Ge,
                });
                i += if eq { 2 } else { 1 };
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let text = &expression[start..i];
                let value = text.parse::<f32>().map_err(|_| {
                    RigError::Expression(format!("bad number {text:?} in {expression:?}"))
                })?;
                tokens.push(Token::Num(value));
            }
            'a'..='z' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_lowercase() {
                    i += 1;
                }
                tokens.push(match &expression[start..i] {
                    "v" => Token::Var,
                    "and" => Token::And,
                    "or" => Token::Or,
                    word => {
                        return Err(RigError::Expression(format!(
                            "unknown word {word:?} in {expression:?}"
                        )))
                    }
                });
            }
            _ => {
                return Err(RigError::Expression(format!(
                    "unexpected character {c:?} in {expression:?}"
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, what: &str) -> RigError {
        RigError::Expression(format!("{what} in {:?}", self.expression))
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.peek();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn or_term(&mut self) -> RigResult<Eval> {
        let mut left = self.and_term()?;
        while self.peek() == Some(Token::Or) {
            self.bump();
            let right = self.and_term()?;
            left = Eval::binary(left, right, |a, b| {
                if a != 0.0 || b != 0.0 {
                    1.0
                } else {
                    0.0
                }
            });
        }
        Ok(left)
    }

    fn and_term(&mut self) -> RigResult<Eval> {
        let mut left = self.comparison()?;
        while self.peek() == Some(Token::And) {
            self.bump();
            let right = self.comparison()?;
            left = Eval::binary(left, right, |a, b| {
                if a != 0.0 && b != 0.0 {
                    1.0
                } else {
                    0.0
                }
            });
        }
        Ok(left)
    }

    fn comparison(&mut self) -> RigResult<Eval> {
        let left = self.additive()?;
        let op: fn(f32, f32) -> f32 = match self.peek() {
            Some(Token::Lt) => |a, b| (a < b) as u8 as f32,
            Some(Token::Le) => |a, b| (a <= b) as u8 as f32,
            Some(Token::Gt) => |a, b| (a > b) as u8 as f32,
            Some(Token::Ge) => |a, b| (a >= b) as u8 as f32,
            _ => return Ok(left),
        };
        self.bump();
        let right = self.additive()?;
        Ok(Eval::binary(left, right, op))
    }

    fn additive(&mut self) -> RigResult<Eval> {
        let mut left = self.multiplicative()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    let right = self.multiplicative()?;
                    left = Eval::binary(left, right, |a, b| a + b);
                }
                Some(Token::Minus) => {
                    self.bump();
                    let right = self.multiplicative()?;
                    left = Eval::binary(left, right, |a, b| a - b);
                }
                _ => return Ok(left),
            }
        }
    }

    fn multiplicative(&mut self) -> RigResult<Eval> {
        let mut left = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.bump();
                    let right = self.unary()?;
                    left = Eval::binary(left, right, |a, b| a * b);
                }
                Some(Token::Slash) => {
                    self.bump();
                    let right = self.unary()?;
                    left = Eval::binary(left, right, |a, b| a / b);
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> RigResult<Eval> {
        if self.peek() == Some(Token::Minus) {
            self.bump();
            let inner = self.unary()?;
            return Ok(Eval::unary(inner, |a| -a));
        }
        self.atom()
    }

    fn atom(&mut self) -> RigResult<Eval> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(Eval::constant(n)),
            Some(Token::Var) => Ok(Eval::var()),
            Some(Token::LParen) => {
                let inner = self.or_term()?;
                if self.bump() != Some(Token::RParen) {
                    return Err(self.error("missing closing parenthesis"));
                }
                Ok(inner)
            }
            _ => Err(self.error("expected value")),
        }
    }
}

/// Evaluation node: a boxed function of `v`.
struct Eval(Box<dyn Fn(f32) -> f32>);

impl Eval {
    fn constant(c: f32) -> Self {
        Eval(Box::new(move |_| c))
    }

    fn var() -> Self {
        Eval(Box::new(|v| v))
    }

    fn unary(inner: Eval, op: fn(f32) -> f32) -> Self {
        Eval(Box::new(move |v| op(inner.0(v))))
    }

    fn binary(left: Eval, right: Eval, op: fn(f32, f32) -> f32) -> Self {
        Eval(Box::new(move |v| op(left.0(v), right.0(v))))
    }

    fn resolve(&self, v: f32) -> f32 {
        self.0(v)
    }
}
