//! Runtime values produced while evaluating query expressions.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A dynamically typed query value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Time(NaiveDateTime),
    List(Vec<Value>),
}

// Date layouts accepted when a string stands in for a timestamp
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

impl Value {
    /// Convert a frontmatter value.
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(*b),
            serde_yaml::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_yaml::Value::String(s) => Value::String(s.clone()),
            serde_yaml::Value::Sequence(items) => {
                Value::List(items.iter().map(Value::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(_) => Value::String(
                serde_yaml::to_string(value)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(&tagged.value),
        }
    }

    /// Only an actual `true` counts.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Null, a blank string or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a timestamp: a time itself, or a string in one of the
    /// accepted date layouts.
    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Time(t) => Some(*t),
            Value::String(s) => parse_time(s.trim()),
            _ => None,
        }
    }

    /// The list items, or `None` for a scalar.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Order two values: nulls first, then numbers, then timestamps, then
    /// strings.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => return Ordering::Equal,
            (Value::Null, _) => return Ordering::Less,
            (_, Value::Null) => return Ordering::Greater,
            _ => {}
        }

        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        }
        if let (Some(a), Some(b)) = (self.as_time(), other.as_time()) {
            return a.cmp(&b);
        }
        self.to_string().cmp(&other.to_string())
    }

    /// Same calendar day when both sides read as dates, plain string
    /// equality otherwise.
    pub fn same_day(&self, other: &Value) -> bool {
        match (self.as_time(), other.as_time()) {
            (Some(a), Some(b)) => a.date() == b.date(),
            _ => self.to_string() == other.to_string(),
        }
    }
}

fn parse_time(s: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Time(t) => write!(f, "{}", t.format("%Y-%m-%d")),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_emptiness() {
        assert!(Value::from("").is_empty());
        assert!(Value::from("   ").is_empty());
        assert!(Value::List(vec![]).is_empty());
        assert!(Value::Null.is_empty());
        assert!(!Value::Number(0.0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn test_compare_priority() {
        assert_eq!(Value::Number(10.0).compare(&Value::Number(9.0)), Ordering::Greater);
        // Numbers compare numerically, strings lexically
        assert_eq!(Value::from("10").compare(&Value::from("9")), Ordering::Less);
        assert_eq!(
            Value::Time(day(2024, 3, 1)).compare(&Value::from("2024-02-28")),
            Ordering::Greater
        );
        assert_eq!(Value::Null.compare(&Value::Number(0.0)), Ordering::Less);
        assert_eq!(Value::from("b").compare(&Value::from("a")), Ordering::Greater);
    }

    #[test]
    fn test_same_day() {
        let t = Value::Time(day(2024, 3, 1));
        assert!(t.same_day(&Value::from("2024-03-01")));
        assert!(t.same_day(&Value::from("2024-03-01T08:00:00+00:00")));
        assert!(!t.same_day(&Value::from("2024-03-02")));
        assert!(Value::from("abc").same_day(&Value::from("abc")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Time(day(2024, 3, 1)).to_string(), "2024-03-01");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Number(1.0)]).to_string(),
            "a, 1"
        );
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_from_yaml() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("priority: 3\ntags: [a, b]\ndone: true\nnothing:").unwrap();
        assert_eq!(Value::from_yaml(&yaml["priority"]), Value::Number(3.0));
        assert_eq!(
            Value::from_yaml(&yaml["tags"]),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(Value::from_yaml(&yaml["done"]), Value::Bool(true));
        assert_eq!(Value::from_yaml(&yaml["nothing"]), Value::Null);
    }
}
