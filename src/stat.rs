//! A single named attribute.
//!
//! A [`Stat`] is what a catalog document attaches to a name: some
//! descriptive strings, a numeric range, a formula — any subset, including
//! none of them. Stats merge pairwise (string union, range addition,
//! expression addition), which is the primitive every higher-level
//! combination in the engine is built from.

use crate::document;
use crate::error::LoadError;
use crate::expr::{self, Expression};
use crate::range::Range;
use serde_json::Value;
use std::fmt;

/// One named attribute of a component, item, or character.
///
/// # Examples
///
/// ```rust
/// use gearcalc::Stat;
/// use serde_json::json;
///
/// // A bare string is a formula; an object spells the parts out.
/// let base = Stat::from_document(&json!("3")).unwrap();
/// let bonus = Stat::from_document(&json!({
///     "strings": ["keen"],
///     "range": [1, 6],
///     "expression": "+2",
/// }))
/// .unwrap();
///
/// let mut merged = base.copy();
/// merged.merge(&bonus);
/// assert_eq!(merged.to_string(), "[keen, [1, 6] + 5]");
/// ```
#[derive(Debug, PartialEq, Default)]
pub struct Stat {
    strings: Option<Vec<String>>,
    range: Option<Range>,
    expression: Option<Expression>,
}

impl Stat {
    /// A stat with every part absent. Legal, and the identity for
    /// [`merge`](Stat::merge).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(range: Range) -> Self {
        Stat {
            range: Some(range),
            ..Self::default()
        }
    }

    pub fn with_expression(expression: Expression) -> Self {
        Stat {
            expression: Some(expression),
            ..Self::default()
        }
    }

    pub fn with_strings(strings: Vec<String>) -> Self {
        Stat {
            strings: Some(strings),
            ..Self::default()
        }
    }

    /// Build a stat from a document stat-spec.
    ///
    /// The spec is either a bare formula string, a bare number (shorthand
    /// for a constant formula), or an object with optional `strings`,
    /// `range` (`[min, max]`), and `expression` fields.
    pub fn from_document(value: &Value) -> Result<Self, LoadError> {
        match value {
            Value::String(formula) => Ok(Stat::with_expression(expr::compile(formula)?)),
            Value::Number(n) => {
                let v = n
                    .as_f64()
                    .ok_or_else(|| LoadError::field_type("<stat>", "a finite number"))?;
                Ok(Stat::with_expression(Expression::constant(v)))
            }
            Value::Object(obj) => {
                let mut stat = Stat::new();
                if let Some(items) = document::opt_array_field(obj, "strings")? {
                    stat.strings = Some(document::string_array(items, "strings")?);
                }
                if let Some(bounds) = document::opt_array_field(obj, "range")? {
                    stat.range = Some(parse_range(bounds)?);
                }
                if let Some(formula) = document::opt_str_field(obj, "expression")? {
                    stat.expression = Some(expr::compile(formula)?);
                }
                Ok(stat)
            }
            _ => Err(LoadError::field_type(
                "<stat>",
                "a formula string, number, or object",
            )),
        }
    }

    pub fn strings(&self) -> Option<&[String]> {
        self.strings.as_deref()
    }

    pub fn range(&self) -> Option<&Range> {
        self.range.as_ref()
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.expression.as_ref()
    }

    pub fn expression_mut(&mut self) -> Option<&mut Expression> {
        self.expression.as_mut()
    }

    /// Deep copy. Expression copies start with no cached result.
    pub fn copy(&self) -> Self {
        Stat {
            strings: self.strings.clone(),
            range: self.range,
            expression: self.expression.as_ref().map(Expression::copy),
        }
    }

    /// Fold another stat into this one.
    ///
    /// Strings union, preserving this stat's order and appending only
    /// novel entries; ranges add (adopting the other side's range when
    /// this one has none); expressions add via
    /// [`Expression::add_with`] (copying when only one side has one).
    pub fn merge(&mut self, other: &Stat) {
        if let Some(other_strings) = &other.strings {
            match &mut self.strings {
                None => self.strings = Some(other_strings.clone()),
                Some(strings) => {
                    for s in other_strings {
                        if !strings.contains(s) {
                            strings.push(s.clone());
                        }
                    }
                }
            }
        }

        if let Some(other_range) = &other.range {
            match &mut self.range {
                None => self.range = Some(*other_range),
                Some(range) => range.add(other_range),
            }
        }

        if let Some(other_exp) = &other.expression {
            self.expression = Some(match &self.expression {
                None => other_exp.copy(),
                Some(exp) => exp.add_with(other_exp),
            });
        }
    }

    /// The display parts of this stat, in presentation order: the
    /// descriptive strings, then (when non-trivial) the range and the
    /// expression's current value combined as `[a, b] + n` / `[a, b] - n`.
    ///
    /// An entirely empty stat displays as `"0"`.
    pub fn to_display_strings(&self) -> Vec<String> {
        let exp_val = self.expression.as_ref().map_or(0, |e| e.value() as i64);

        let numeric = match (&self.range, exp_val) {
            (None, v) => {
                if self.strings.is_some() && v == 0 {
                    None
                } else {
                    Some(v.to_string())
                }
            }
            (Some(range), 0) => Some(range.to_string()),
            (Some(range), v) if v < 0 => Some(format!("{} - {}", range, -v)),
            (Some(range), v) => Some(format!("{} + {}", range, v)),
        };

        let mut out = self.strings.clone().unwrap_or_default();
        if let Some(numeric) = numeric {
            out.push(numeric);
        }
        out
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.to_display_strings();
        if parts.len() == 1 {
            write!(f, "{}", parts[0])
        } else {
            write!(f, "[{}]", parts.join(", "))
        }
    }
}

fn parse_range(bounds: &[Value]) -> Result<Range, LoadError> {
    if bounds.len() != 2 {
        return Err(LoadError::field_type("range", "a [min, max] pair"));
    }
    let min = bounds[0]
        .as_i64()
        .ok_or_else(|| LoadError::field_type("range", "a [min, max] pair of integers"))?;
    let max = bounds[1]
        .as_i64()
        .ok_or_else(|| LoadError::field_type("range", "a [min, max] pair of integers"))?;
    Ok(Range::new(min as i32, max as i32))
}
