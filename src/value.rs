use std::fmt;
use std::sync::Arc;

use im::OrdMap;

use crate::case::CaseDescriptor;

/// Keyword arguments, ordered by name. Cloning is cheap, updates never touch the original.
pub type Kwargs = OrdMap<String, Value>;

/// Represents a value flowing through parametrization: parameter rows, case payloads,
/// tags and the control value delivered by the host framework.
///
/// # Examples
///
/// ```rust
/// use caseform::value::Value;
/// let n = Value::from(3);
/// assert_eq!(n.type_name(), "Int");
/// let row = Value::from((1, "a"));
/// assert_eq!(row.type_name(), "Tuple");
/// assert!(Value::default().is_nil());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A positional row: the values of several parameter names declared together,
    /// or the per-axis rows of a combined entry.
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Map(OrdMap<String, Value>),
    Case(Arc<CaseDescriptor>),
    Request(Arc<Request>),
}

impl Value {
    /// Returns the type name of the value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::Tuple(_) => "Tuple",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Case(_) => "Case",
            Value::Request(_) => "Request",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_case(&self) -> Option<&Arc<CaseDescriptor>> {
        match self {
            Value::Case(case) => Some(case),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&Arc<Request>> {
        match self {
            Value::Request(request) => Some(request),
            _ => None,
        }
    }

    /// Canonical id text of a parameter value.
    ///
    /// Booleans and nil use the fixed tokens `True`, `False` and `None`; integral floats keep
    /// their decimal point so `1.0` never reads as the integer `1`. Tuples join their
    /// components with `separator`. Returns `None` for values without a canonical text
    /// (lists, maps, requests), which callers replace with a positional id.
    pub fn id_text(&self, separator: &str) -> Option<String> {
        match self {
            Value::Nil => Some("None".to_string()),
            Value::Bool(true) => Some("True".to_string()),
            Value::Bool(false) => Some("False".to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(x) => Some(float_text(*x)),
            Value::Str(s) => Some(s.clone()),
            Value::Tuple(items) => {
                let parts = items
                    .iter()
                    .map(|item| item.id_text(separator))
                    .collect::<Option<Vec<_>>>()?;
                Some(parts.join(separator))
            }
            Value::Case(case) => Some(case.display().to_string()),
            Value::List(_) | Value::Map(_) | Value::Request(_) => None,
        }
    }

    /// JSON rendering used by the CLI.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Nil => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::Tuple(items) | Value::List(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Case(case) => Json::String(case.display().to_string()),
            Value::Request(request) => Json::String(format!("<request {}>", request.id)),
        }
    }
}

fn float_text(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Case(a), Value::Case(b)) => Arc::ptr_eq(a, b) || a.as_ref() == b.as_ref(),
            (Value::Request(a), Value::Request(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", float_text(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Case(case) => write!(f, "{}", case.display()),
            Value::Request(request) => write!(f, "<request {}>", request.id),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Arc<CaseDescriptor>> for Value {
    fn from(case: Arc<CaseDescriptor>) -> Self {
        Value::Case(case)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

/// An opaque tag interpreted only by the host framework (skip, xfail, ...).
///
/// The engine never looks inside a mark; it only threads marks from declarations and cases
/// through to combined entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub name: String,
    pub args: Vec<Value>,
}

impl Mark {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}", self.name);
        }
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

/// The control value through which the host framework delivers the selected combined
/// value to a rewritten callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The selected combined value: a row, or one row per axis.
    pub param: Value,
    /// The id of the selected combined entry.
    pub id: String,
}

impl Request {
    pub fn new(param: Value, id: impl Into<String>) -> Self {
        Self {
            param,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_text_keeps_booleans_and_numbers_apart() {
        assert_eq!(Value::Bool(true).id_text("-").as_deref(), Some("True"));
        assert_eq!(Value::Int(1).id_text("-").as_deref(), Some("1"));
        assert_eq!(Value::Float(1.0).id_text("-").as_deref(), Some("1.0"));
        assert_eq!(Value::Float(2.5).id_text("-").as_deref(), Some("2.5"));
        assert_eq!(Value::Nil.id_text("-").as_deref(), Some("None"));
    }

    #[test]
    fn id_text_joins_tuple_components() {
        let row = Value::from((1, "b"));
        assert_eq!(row.id_text("-").as_deref(), Some("1-b"));
        let nested = Value::tuple([Value::from(1), Value::List(vec![])]);
        assert_eq!(nested.id_text("-"), None);
    }

    #[test]
    fn mark_display_lists_arguments() {
        let mark = Mark::new("skip").with_arg("not ready");
        assert_eq!(mark.to_string(), "skip(not ready)");
        assert_eq!(Mark::new("slow").to_string(), "slow");
    }
}
