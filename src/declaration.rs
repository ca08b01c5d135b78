//! Parametrization declarations.
//!
//! A [`Declaration`] is one `(names, values, ids)` attachment on a callable. Rows are
//! [`ParamValue`]s so that a single row can carry its own id and marks, the way a
//! parametrize call accepts individually configured parameter values.

use std::fmt;
use std::sync::Arc;

use crate::value::{Mark, Value};
use crate::{err_msg, CaseError};

/// Function deriving an id from a row value.
pub type IdFn = dyn Fn(&Value) -> String + Send + Sync;

/// One row of a declaration, with optional per-row id override and marks.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue {
    pub value: Value,
    pub id: Option<String>,
    pub marks: Vec<Mark>,
}

impl ParamValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            id: None,
            marks: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Shorthand for an individually configured row.
pub fn param(value: impl Into<Value>) -> ParamValue {
    ParamValue::new(value)
}

/// Declaration-level id source.
#[derive(Clone)]
pub enum Ids {
    /// One id per row, used as given.
    Explicit(Vec<String>),
    /// Applied to each row value.
    Function(Arc<IdFn>),
}

impl fmt::Debug for Ids {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ids::Explicit(ids) => f.debug_tuple("Explicit").field(ids).finish(),
            Ids::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Splits a comma separated name list, ignoring whitespace: `"a, b"` → `["a", "b"]`.
pub fn split_names(names: &str) -> Vec<String> {
    let compact: String = names.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Vec::new();
    }
    compact.split(',').map(str::to_string).collect()
}

#[derive(Debug, Clone)]
pub struct Declaration {
    names: Vec<String>,
    values: Vec<ParamValue>,
    ids: Option<Ids>,
}

impl Declaration {
    /// Declares `names` (comma separated) over plain row values.
    pub fn new<I, V>(names: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::with_params(names, values.into_iter().map(ParamValue::new).collect())
    }

    /// Declares `names` (comma separated) over individually configured rows.
    pub fn with_params(names: &str, values: Vec<ParamValue>) -> Self {
        Self::from_names(split_names(names), values)
    }

    pub fn from_names(names: Vec<String>, values: Vec<ParamValue>) -> Self {
        Self {
            names,
            values,
            ids: None,
        }
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(Ids::Explicit(ids.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_id_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.ids = Some(Ids::Function(Arc::new(f)));
        self
    }

    pub fn with_id_source(mut self, ids: Option<Ids>) -> Self {
        self.ids = ids;
        self
    }

    /// Attaches marks row by row. `None` leaves a row unmarked.
    pub fn with_marks(mut self, marks: Vec<Option<Vec<Mark>>>) -> Result<Self, CaseError> {
        if marks.len() != self.values.len() {
            return Err(err_msg!(
                Configuration,
                "{} mark sets given for {} values of '{}'",
                marks.len(),
                self.values.len(),
                self.names.join(",")
            ));
        }
        for (row, row_marks) in self.values.iter_mut().zip(marks) {
            row.marks.extend(row_marks.unwrap_or_default());
        }
        Ok(self)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    pub fn ids(&self) -> Option<&Ids> {
        self.ids.as_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks the declaration's own consistency: at least one name, no repeated name,
    /// one id per row when ids are explicit, and tuple rows of the right arity when
    /// several names are declared together.
    pub fn validate(&self) -> Result<(), CaseError> {
        if self.names.is_empty() || self.names.iter().any(String::is_empty) {
            return Err(err_msg!(
                Configuration,
                "a parametrization declaration has an empty parameter name"
            ));
        }
        for (i, name) in self.names.iter().enumerate() {
            if self.names[..i].contains(name) {
                return Err(err_msg!(
                    Configuration,
                    "parameter '{}' is declared twice in '{}'",
                    name,
                    self.names.join(",")
                ));
            }
        }
        if let Some(Ids::Explicit(ids)) = &self.ids {
            if ids.len() != self.values.len() {
                return Err(err_msg!(
                    Configuration,
                    "{} ids given for {} values of '{}'",
                    ids.len(),
                    self.values.len(),
                    self.names.join(",")
                ));
            }
        }
        if self.names.len() > 1 {
            for (i, row) in self.values.iter().enumerate() {
                let arity = row.value.as_tuple().map(<[Value]>::len);
                if arity != Some(self.names.len()) {
                    return Err(err_msg!(
                        Configuration,
                        "row {} of '{}' must be a tuple of {} values, got {}",
                        i,
                        self.names.join(","),
                        self.names.len(),
                        row.value
                    )
                    .with_help(
                        "each row of a multi-name declaration holds one value per name",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Resolves one id per row.
    ///
    /// Explicit ids are taken as given, an id function is applied to each row value, and
    /// otherwise the id is derived from the value's canonical text. A row's own id always
    /// replaces the resolved one.
    pub fn resolve_ids(&self, separator: &str) -> Vec<String> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let resolved = match &self.ids {
                    Some(Ids::Explicit(ids)) => ids
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| self.derive_id(i, &row.value, separator)),
                    Some(Ids::Function(f)) => f(&row.value),
                    None => self.derive_id(i, &row.value, separator),
                };
                row.id.clone().unwrap_or(resolved)
            })
            .collect()
    }

    fn derive_id(&self, index: usize, value: &Value, separator: &str) -> String {
        if self.names.len() == 1 {
            return value
                .id_text(separator)
                .unwrap_or_else(|| format!("{}{}", self.names[0], index));
        }
        match value.as_tuple() {
            Some(components) => components
                .iter()
                .zip(&self.names)
                .map(|(component, name)| {
                    component
                        .id_text(separator)
                        .unwrap_or_else(|| format!("{}{}", name, index))
                })
                .collect::<Vec<_>>()
                .join(separator),
            None => format!("{}{}", self.names.join(separator), index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;

    #[test]
    fn split_names_ignores_whitespace() {
        assert_eq!(split_names("arg1, arg2"), vec!["arg1", "arg2"]);
        assert_eq!(split_names("x"), vec!["x"]);
        assert!(split_names("  ").is_empty());
    }

    #[test]
    fn default_ids_follow_value_text() {
        let decl = Declaration::new("x", [1, 2, 3]);
        assert_eq!(decl.resolve_ids("-"), vec!["1", "2", "3"]);
    }

    #[test]
    fn multi_name_ids_join_components() {
        let decl = Declaration::new("a, b", [Value::from((1, 2)), Value::from((3, "x"))]);
        assert_eq!(decl.resolve_ids("-"), vec!["1-2", "3-x"]);
    }

    #[test]
    fn unrepresentable_values_get_positional_ids() {
        let decl = Declaration::new("data", [Value::List(vec![]), Value::from(7)]);
        assert_eq!(decl.resolve_ids("-"), vec!["data0", "7"]);
    }

    #[test]
    fn row_id_overrides_every_source() {
        let rows = vec![param(1).with_id("one"), param(2)];
        let explicit = Declaration::with_params("x", rows.clone()).with_ids(["a", "b"]);
        assert_eq!(explicit.resolve_ids("-"), vec!["one", "b"]);
        let derived = Declaration::with_params("x", rows.clone());
        assert_eq!(derived.resolve_ids("-"), vec!["one", "2"]);
        let by_fn = Declaration::with_params("x", rows).with_id_fn(|v| format!("v{}", v));
        assert_eq!(by_fn.resolve_ids("-"), vec!["one", "v2"]);
    }

    #[test]
    fn validate_rejects_malformed_declarations() {
        let empty = Declaration::new("", [1]);
        assert_eq!(
            empty.validate().unwrap_err().error_type(),
            ErrorType::Configuration
        );
        let short_ids = Declaration::new("x", [1, 2]).with_ids(["only"]);
        assert!(short_ids.validate().is_err());
        let bad_arity = Declaration::new("a, b", [Value::from((1, 2, 3))]);
        assert!(bad_arity.validate().is_err());
        let repeated = Declaration::new("a, a", [Value::from((1, 2))]);
        assert!(repeated.validate().is_err());
    }

    #[test]
    fn with_marks_requires_one_entry_per_row() {
        let decl = Declaration::new("x", [1, 2])
            .with_marks(vec![Some(vec![Mark::new("skip")]), None])
            .unwrap();
        assert_eq!(decl.values()[0].marks, vec![Mark::new("skip")]);
        assert!(decl.values()[1].marks.is_empty());
        assert!(Declaration::new("x", [1]).with_marks(vec![]).is_err());
    }
}
