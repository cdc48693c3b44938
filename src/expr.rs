//! Formula compilation and evaluation.
//!
//! Catalog documents embed small infix formulas (`"3 + dexterity * 2"`).
//! [`compile`] tokenizes a formula, reorders it into postfix with a
//! shunting yard, and returns an [`Expression`]: a formula with no
//! variable references is folded into a constant at compile time, anything
//! else becomes a postfix program evaluated later against a map of named
//! values.
//!
//! Supported operators, highest precedence first (left-associative within
//! a tier):
//!
//! | tier | operators | meaning |
//! |---|---|---|
//! | 1 | `^` `^1/` | power, root |
//! | 2 | `*` `/` `%` | multiply, divide, modulus |
//! | 3 | `+` `-` | add, subtract |
//! | 4 | `>` `<` | max, min |
//!
//! Juxtaposition against a parenthesized group multiplies: `3(x + 2)` is
//! `3 * (x + 2)`. A `+` or `-` directly attached to a digit in operand
//! position is part of the number literal (`"+2"`, `"-0.5"`); there is no
//! standalone unary minus.
//!
//! # Examples
//!
//! ```rust
//! use gearcalc::expr::compile;
//! use std::collections::BTreeMap;
//!
//! // Pure arithmetic folds to a constant.
//! let exp = compile("(2 + 3) * 4").unwrap();
//! assert!(exp.is_constant());
//! assert_eq!(exp.value(), 20.0);
//!
//! // Variables are resolved at evaluation time; missing names read as 0.
//! let mut exp = compile("strength * 2 + bonus").unwrap();
//! let mut vars = BTreeMap::new();
//! vars.insert("strength".to_string(), 5.0);
//! assert_eq!(exp.evaluate(&vars), 10.0);
//! ```

use crate::error::ExprError;
use std::collections::BTreeMap;
use std::fmt;

/// A binary operator in a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulus,
    Max,
    Min,
    Root,
}

impl Op {
    /// Precedence tier; higher binds tighter.
    fn precedence(self) -> u8 {
        match self {
            Op::Power | Op::Root => 3,
            Op::Multiply | Op::Divide | Op::Modulus => 2,
            Op::Add | Op::Subtract => 1,
            Op::Max | Op::Min => 0,
        }
    }

    /// Apply the operator. Division and modulus by zero follow IEEE
    /// floating-point semantics; there is no special guard.
    fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Op::Add => left + right,
            Op::Subtract => left - right,
            Op::Multiply => left * right,
            Op::Divide => left / right,
            Op::Power => left.powf(right),
            Op::Modulus => left % right,
            Op::Max => left.max(right),
            Op::Min => left.min(right),
            Op::Root => left.powf(1.0 / right),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Subtract => "-",
            Op::Multiply => "*",
            Op::Divide => "/",
            Op::Power => "^",
            Op::Modulus => "%",
            Op::Max => ">",
            Op::Min => "<",
            Op::Root => "^1/",
        }
    }
}

/// One token of a compiled postfix program.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Variable(String),
    Operator(Op),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Variable(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op.symbol()),
        }
    }
}

/// A compiled postfix program that references named variables.
///
/// The program keeps the result of its most recent evaluation; other
/// programs read that cached value when they reference this one's stat by
/// name. A fresh program (or a [`copy`](VariableProgram::copy)) starts with
/// a cached result of `0.0`.
#[derive(Debug)]
pub struct VariableProgram {
    tokens: Vec<Token>,
    variables: Vec<String>,
    last_result: f64,
}

impl VariableProgram {
    fn new(tokens: Vec<Token>) -> Self {
        // Collect the distinct variable names in first-reference order.
        let mut variables: Vec<String> = Vec::new();
        for token in &tokens {
            if let Token::Variable(name) = token {
                if !variables.iter().any(|v| v == name) {
                    variables.push(name.clone());
                }
            }
        }
        Self {
            tokens,
            variables,
            last_result: 0.0,
        }
    }

    /// The distinct variable names this program references.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The result of the most recent evaluation (`0.0` before the first).
    pub fn value(&self) -> f64 {
        self.last_result
    }

    /// Run the stack machine over the postfix stream.
    ///
    /// Variables look themselves up in `vars`; a missing name contributes
    /// `0.0`. The result is cached until the next evaluation.
    pub fn evaluate(&mut self, vars: &BTreeMap<String, f64>) -> f64 {
        let mut stack: Vec<f64> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match token {
                Token::Number(n) => stack.push(*n),
                Token::Variable(name) => {
                    stack.push(vars.get(name).copied().unwrap_or(0.0));
                }
                Token::Operator(op) => {
                    // Compilation validated arity, so both pops succeed.
                    let right = stack.pop().unwrap_or(0.0);
                    let left = stack.pop().unwrap_or(0.0);
                    stack.push(op.apply(left, right));
                }
            }
        }
        self.last_result = stack.pop().unwrap_or(0.0);
        self.last_result
    }

    /// An independent program with the same tokens and no cached result.
    pub fn copy(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            variables: self.variables.clone(),
            last_result: 0.0,
        }
    }
}

// Programs compare by their token streams; the cached result is transient
// state and does not affect equality.
impl PartialEq for VariableProgram {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl fmt::Display for VariableProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// A compiled formula.
///
/// `Constant` is an optimization, not a user-facing distinction: any
/// formula without variable references is evaluated once at compile time
/// and stored as its result.
#[derive(Debug, PartialEq)]
pub enum Expression {
    Constant(f64),
    Variable(VariableProgram),
}

impl Expression {
    /// Build a constant expression directly, without compiling a formula.
    pub fn constant(value: f64) -> Self {
        Expression::Constant(value)
    }

    /// True if this expression never needs a variable map.
    pub fn is_constant(&self) -> bool {
        matches!(self, Expression::Constant(_))
    }

    /// The current value: the constant itself, or the variable program's
    /// cached result.
    pub fn value(&self) -> f64 {
        match self {
            Expression::Constant(v) => *v,
            Expression::Variable(program) => program.value(),
        }
    }

    /// Evaluate against a map of named values. Constants ignore the map.
    pub fn evaluate(&mut self, vars: &BTreeMap<String, f64>) -> f64 {
        match self {
            Expression::Constant(v) => *v,
            Expression::Variable(program) => program.evaluate(vars),
        }
    }

    /// The distinct variable names referenced (empty for constants).
    pub fn variables(&self) -> &[String] {
        match self {
            Expression::Constant(_) => &[],
            Expression::Variable(program) => program.variables(),
        }
    }

    /// An independent copy sharing no mutable state. A variable program's
    /// cached result is not carried over.
    pub fn copy(&self) -> Self {
        match self {
            Expression::Constant(v) => Expression::Constant(*v),
            Expression::Variable(program) => Expression::Variable(program.copy()),
        }
    }

    /// A new expression whose evaluation equals the sum of both inputs.
    ///
    /// Two constants fold into a new constant; otherwise the postfix
    /// streams are concatenated with a trailing add.
    pub fn add_with(&self, other: &Expression) -> Expression {
        match (self, other) {
            (Expression::Constant(a), Expression::Constant(b)) => Expression::Constant(a + b),
            _ => {
                let mut tokens = self.postfix_tokens();
                tokens.extend(other.postfix_tokens());
                tokens.push(Token::Operator(Op::Add));
                Expression::Variable(VariableProgram::new(tokens))
            }
        }
    }

    fn postfix_tokens(&self) -> Vec<Token> {
        match self {
            Expression::Constant(v) => vec![Token::Number(*v)],
            Expression::Variable(program) => program.tokens.clone(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(v) => write!(f, "{}", v),
            Expression::Variable(program) => write!(f, "{}", program),
        }
    }
}

/// An infix token, before the shunting yard runs.
#[derive(Debug, Clone, PartialEq)]
enum InfixToken {
    Operand(Token),
    Operator(Op),
    LeftParen,
    RightParen,
}

/// Tokenize a formula via longest-match scanning.
///
/// Tracks whether the scanner sits in operand position (start of input,
/// after an operator, after `(`): a sign directly attached to a digit is
/// folded into the literal there, and a `(` outside operand position gets
/// an implicit multiply in front of it.
fn tokenize(formula: &str) -> Result<Vec<InfixToken>, ExprError> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut after_operand = false;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Signed literal in operand position.
        if !after_operand
            && (c == '+' || c == '-')
            && i + 1 < chars.len()
            && (chars[i + 1].is_ascii_digit() || chars[i + 1] == '.')
        {
            let (value, next) = scan_number(&chars, i)?;
            tokens.push(InfixToken::Operand(Token::Number(value)));
            after_operand = true;
            i = next;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let (value, next) = scan_number(&chars, i)?;
            tokens.push(InfixToken::Operand(Token::Number(value)));
            after_operand = true;
            i = next;
            continue;
        }

        if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            tokens.push(InfixToken::Operand(Token::Variable(name)));
            after_operand = true;
            continue;
        }

        match c {
            '(' => {
                // Juxtaposition: `3(x + 2)` multiplies.
                if after_operand {
                    tokens.push(InfixToken::Operator(Op::Multiply));
                }
                tokens.push(InfixToken::LeftParen);
                after_operand = false;
                i += 1;
            }
            ')' => {
                tokens.push(InfixToken::RightParen);
                after_operand = true;
                i += 1;
            }
            '^' => {
                // `^1/` (root) outranks `^` (power) under longest match.
                if i + 2 < chars.len() && chars[i + 1] == '1' && chars[i + 2] == '/' {
                    tokens.push(InfixToken::Operator(Op::Root));
                    i += 3;
                } else {
                    tokens.push(InfixToken::Operator(Op::Power));
                    i += 1;
                }
                after_operand = false;
            }
            '+' | '-' | '*' | '/' | '%' | '>' | '<' => {
                let op = match c {
                    '+' => Op::Add,
                    '-' => Op::Subtract,
                    '*' => Op::Multiply,
                    '/' => Op::Divide,
                    '%' => Op::Modulus,
                    '>' => Op::Max,
                    _ => Op::Min,
                };
                tokens.push(InfixToken::Operator(op));
                after_operand = false;
                i += 1;
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

/// Scan a number literal starting at `start` (which may be a sign).
fn scan_number(chars: &[char], start: usize) -> Result<(f64, usize), ExprError> {
    let mut i = start;
    if chars[i] == '+' || chars[i] == '-' {
        i += 1;
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    let text: String = chars[start..i].iter().collect();
    let value = text
        .parse::<f64>()
        .map_err(|_| ExprError::Malformed(format!("bad number literal {:?}", text)))?;
    Ok((value, i))
}

/// Reorder infix tokens into postfix with a shunting yard.
fn shunting_yard(infix: Vec<InfixToken>) -> Result<Vec<Token>, ExprError> {
    enum StackEntry {
        Operator(Op),
        LeftParen,
    }

    let mut output = Vec::with_capacity(infix.len());
    let mut stack: Vec<StackEntry> = Vec::new();

    for token in infix {
        match token {
            InfixToken::Operand(t) => output.push(t),
            InfixToken::Operator(op) => {
                // Operators within a tier are left-associative: pop while
                // the incoming precedence is <= the top of the stack.
                while let Some(StackEntry::Operator(top)) = stack.last() {
                    if op.precedence() <= top.precedence() {
                        output.push(Token::Operator(*top));
                        stack.pop();
                    } else {
                        break;
                    }
                }
                stack.push(StackEntry::Operator(op));
            }
            InfixToken::LeftParen => stack.push(StackEntry::LeftParen),
            InfixToken::RightParen => loop {
                match stack.pop() {
                    Some(StackEntry::Operator(op)) => output.push(Token::Operator(op)),
                    Some(StackEntry::LeftParen) => break,
                    None => return Err(ExprError::UnbalancedParens),
                }
            },
        }
    }

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Operator(op) => output.push(Token::Operator(op)),
            StackEntry::LeftParen => return Err(ExprError::UnbalancedParens),
        }
    }

    Ok(output)
}

/// Check that a postfix stream is a well-formed single expression.
fn validate(tokens: &[Token]) -> Result<(), ExprError> {
    let mut depth: usize = 0;
    for token in tokens {
        match token {
            Token::Number(_) | Token::Variable(_) => depth += 1,
            Token::Operator(op) => {
                if depth < 2 {
                    return Err(ExprError::Malformed(format!(
                        "operator {} is missing an operand",
                        op.symbol()
                    )));
                }
                depth -= 1;
            }
        }
    }
    match depth {
        1 => Ok(()),
        0 => Err(ExprError::Empty),
        _ => Err(ExprError::Malformed(
            "operands left over without an operator".to_string(),
        )),
    }
}

/// Compile an infix formula into an [`Expression`].
///
/// A formula with no variable references is evaluated immediately and
/// returned as a constant.
///
/// # Examples
///
/// ```rust
/// use gearcalc::expr::compile;
///
/// assert_eq!(compile("2 + 3 * 4").unwrap().value(), 14.0);
/// assert_eq!(compile("2 ^ 3").unwrap().value(), 8.0);
/// assert!(!compile("hp / 2").unwrap().is_constant());
/// ```
pub fn compile(formula: &str) -> Result<Expression, ExprError> {
    let infix = tokenize(formula)?;
    if infix.is_empty() {
        return Err(ExprError::Empty);
    }
    let postfix = shunting_yard(infix)?;
    validate(&postfix)?;

    let mut program = VariableProgram::new(postfix);
    if program.variables().is_empty() {
        // No variables: fold to a constant now.
        let value = program.evaluate(&BTreeMap::new());
        Ok(Expression::Constant(value))
    } else {
        Ok(Expression::Variable(program))
    }
}
