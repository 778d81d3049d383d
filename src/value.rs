use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};

/// Runtime value produced by a context lookup, an expression evaluation, or
/// a builtin function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Truthiness used by conditionals, `!`, and short-circuit operators.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// `default()`/`coalesce()` treat nil and the empty string as absent.
    pub fn is_absent(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Loose equality: numeric values compare as floats, strings compare
    /// literally, cross-type comparisons that aren't numeric-coercible are
    /// simply unequal rather than an error.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|bv| v.loose_eq(bv)))
            }
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64() == b.as_f64(),
            (Value::Str(s), b) if b.is_numeric() => s.trim().parse::<f64>().ok() == b.as_f64(),
            (a, Value::Str(s)) if a.is_numeric() => s.trim().parse::<f64>().ok() == a.as_f64(),
            _ => false,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Ordering across numeric pairs or string pairs. `None` when the types
    /// can't be ordered against each other.
    pub fn partial_cmp_loose(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (a, b) if a.is_numeric() && b.is_numeric() => {
                a.as_f64().and_then(|x| b.as_f64().and_then(|y| x.partial_cmp(&y)))
            }
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Stringification used when rendering tag/variable output.
    pub fn render(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.clone(),
            Value::List(l) => l.iter().map(|v| v.render()).collect::<Vec<_>>().join(", "),
            Value::Map(m) => {
                let mut keys: Vec<&String> = m.keys().collect();
                keys.sort();
                keys.into_iter()
                    .map(|k| format!("{}={}", k, m[k].render()))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
    }

    /// Deterministic key-sorted iteration over a map value, used by `for`,
    /// `keys`, and `values`.
    pub fn sorted_map_entries(&self) -> Vec<(&str, &Value)> {
        match self {
            Value::Map(m) => {
                let mut entries: Vec<(&str, &Value)> =
                    m.iter().map(|(k, v)| (k.as_str(), v)).collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                entries
            }
            _ => Vec::new(),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.0}", f)
    } else {
        let mut s = format!("{}", f);
        if !s.contains('.') && !s.contains('e') {
            s.push_str(".0");
        }
        s
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_total() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::List(vec![Value::Nil]).is_truthy());
    }

    #[test]
    fn loose_eq_cross_type_false() {
        assert!(!Value::Str("1".into()).loose_eq(&Value::Bool(true)));
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
    }

    #[test]
    fn loose_eq_string_vs_number_parses_exactly() {
        assert!(Value::Str("5".into()).loose_eq(&Value::Int(5)));
        assert!(Value::Float(5.0).loose_eq(&Value::Str("5".into())));
        assert!(!Value::Str("5a".into()).loose_eq(&Value::Int(5)));
    }

    #[test]
    fn ordering_only_for_same_kind() {
        assert!(Value::Int(1).partial_cmp_loose(&Value::Float(2.0)).is_some());
        assert!(Value::Str("a".into())
            .partial_cmp_loose(&Value::Int(1))
            .is_none());
    }

    #[test]
    fn render_float_trims_trailing_zero() {
        assert_eq!(Value::Float(3.0).render(), "3");
        assert_eq!(Value::Float(3.5).render(), "3.5");
    }
}
