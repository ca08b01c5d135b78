//! Helpers for the conventional case payload `(inputs, expected outputs, expected error)`.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::callable::Args;
use crate::case::CaseDescriptor;
use crate::diagnostics::BoxError;
use crate::value::Value;

pub type ErrorCheck = dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync;

/// What error a case expects its subject to raise.
#[derive(Clone)]
pub enum ExpectedError {
    /// Any error of the named kind.
    Kind(String),
    /// An error of the named kind with this exact message.
    Instance { kind: String, message: String },
    /// Any error accepted by the validation function.
    Check(Arc<ErrorCheck>),
}

impl ExpectedError {
    pub fn check<F>(f: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        ExpectedError::Check(Arc::new(f))
    }

    /// Unfolds into `(kind, message, validator)`. A `None` kind accepts any error kind.
    pub fn unfold(&self) -> (Option<&str>, Option<&str>, Option<&ErrorCheck>) {
        match self {
            ExpectedError::Kind(kind) => (Some(kind), None, None),
            ExpectedError::Instance { kind, message } => (Some(kind), Some(message), None),
            ExpectedError::Check(f) => (None, None, Some(f.as_ref())),
        }
    }

    /// Checks `error`, of kind `kind`, against this expectation.
    pub fn matches(&self, kind: &str, error: &(dyn Error + 'static)) -> bool {
        let (expected_kind, expected_message, validator) = self.unfold();
        expected_kind.map_or(true, |k| k == kind)
            && expected_message.map_or(true, |m| m == error.to_string())
            && validator.map_or(true, |f| f(error))
    }
}

impl fmt::Debug for ExpectedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedError::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            ExpectedError::Instance { kind, message } => f
                .debug_struct("Instance")
                .field("kind", kind)
                .field("message", message)
                .finish(),
            ExpectedError::Check(_) => f.write_str("Check(..)"),
        }
    }
}

impl CaseDescriptor {
    /// Deprecated: invokes the case and projects multi-step case data on `key`.
    ///
    /// The payload must be a 3-tuple whose second and third items are maps keyed by step,
    /// or `None`. Prefer calling [`get`](CaseDescriptor::get) and selecting from the result.
    pub fn get_for(&self, key: &str) -> Result<Value, BoxError> {
        warn!(
            target: "caseform::deprecated",
            case = %self.display(),
            "get_for is deprecated: call get() and select from the case data yourself"
        );
        let data = self.get(Args::new())?;
        let Some([inputs, outputs, errors]) = data.as_tuple().and_then(|t| <&[Value; 3]>::try_from(t).ok()) else {
            return Err(format!(
                "case '{}' did not return multi-step case data (inputs, outputs, errors)",
                self.display()
            )
            .into());
        };
        let project = |step_data: &Value, what: &str| -> Result<Value, BoxError> {
            match step_data {
                Value::Nil => Ok(Value::Nil),
                Value::Map(steps) => steps.get(key).cloned().ok_or_else(|| {
                    format!("case '{}' has no expected {} for '{}'", self.display(), what, key).into()
                }),
                other => Err(format!(
                    "case '{}' has {} of type {}, expected a map",
                    self.display(),
                    what,
                    other.type_name()
                )
                .into()),
            }
        };
        Ok(Value::tuple([
            inputs.clone(),
            project(outputs, "outputs")?,
            project(errors, "errors")?,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseFunction, SourceLocation};
    use crate::value::Kwargs;

    #[derive(Debug)]
    struct Overflow;

    impl fmt::Display for Overflow {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "overflow")
        }
    }

    impl Error for Overflow {}

    #[test]
    fn unfold_splits_each_expectation() {
        let kind = ExpectedError::Kind("Overflow".into());
        assert_eq!(kind.unfold().0, Some("Overflow"));
        assert!(kind.matches("Overflow", &Overflow));
        assert!(!kind.matches("Underflow", &Overflow));

        let instance = ExpectedError::Instance {
            kind: "Overflow".into(),
            message: "overflow".into(),
        };
        assert_eq!(instance.unfold().1, Some("overflow"));
        assert!(instance.matches("Overflow", &Overflow));

        let check = ExpectedError::check(|e| e.to_string().starts_with("over"));
        let (k, m, v) = check.unfold();
        assert!(k.is_none() && m.is_none() && v.is_some());
        assert!(check.matches("Anything", &Overflow));
    }

    #[test]
    fn get_for_projects_step_data() {
        let function = Arc::new(CaseFunction::new(
            "case_steps",
            SourceLocation::new("cases.rs", 1),
            |_| {
                let mut outs = Kwargs::new();
                outs.insert("train".to_string(), Value::Int(1));
                outs.insert("score".to_string(), Value::Int(2));
                Ok(Value::tuple([Value::from("x"), Value::Map(outs), Value::Nil]))
            },
        ));
        let case = CaseDescriptor::new(function);
        let projected = case.get_for("score").unwrap();
        assert_eq!(
            projected,
            Value::tuple([Value::from("x"), Value::Int(2), Value::Nil])
        );
        assert!(case.get_for("missing").is_err());
    }
}
