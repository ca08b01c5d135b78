use std::fmt;
use std::sync::Arc;

use crate::callable::Args;
use crate::case::CaseFunction;
use crate::diagnostics::BoxError;
use crate::value::{Kwargs, Mark, Value};

/// A lazily invoked handle to one case.
///
/// Created once per discovered or generated case and never mutated afterwards. Every
/// [`get`](CaseDescriptor::get) re-invokes the underlying function: case functions may be
/// stateful or random, so nothing is cached.
#[derive(Clone)]
pub struct CaseDescriptor {
    display_name: String,
    function: Arc<CaseFunction>,
    bound_kwargs: Kwargs,
}

impl CaseDescriptor {
    /// Describes a simple case, displayed under the function's own name.
    pub fn new(function: Arc<CaseFunction>) -> Self {
        Self {
            display_name: function.name().to_string(),
            function,
            bound_kwargs: Kwargs::new(),
        }
    }

    /// Describes a generated case with its own name and parameter values.
    pub fn generated(function: Arc<CaseFunction>, display_name: String, bound_kwargs: Kwargs) -> Self {
        Self {
            display_name,
            function,
            bound_kwargs,
        }
    }

    /// Invokes the case function. Bound keyword arguments win over supplied ones.
    pub fn get(&self, args: Args) -> Result<Value, BoxError> {
        let keywords = self.bound_kwargs.clone().union(args.keywords);
        self.function.call(Args {
            positional: args.positional,
            keywords,
        })
    }

    pub fn display(&self) -> &str {
        &self.display_name
    }

    pub fn tags(&self) -> &[Value] {
        self.function.tags()
    }

    pub fn marks(&self) -> &[Mark] {
        self.function.marks()
    }

    pub fn bound_kwargs(&self) -> &Kwargs {
        &self.bound_kwargs
    }

    pub fn function(&self) -> &Arc<CaseFunction> {
        &self.function
    }
}

impl PartialEq for CaseDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.display_name == other.display_name
            && self.bound_kwargs == other.bound_kwargs
            && Arc::ptr_eq(&self.function, &other.function)
    }
}

impl fmt::Display for CaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

impl fmt::Debug for CaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Test Case Data generator - [{}] - {}",
            self.display_name,
            self.function.origin()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::case::SourceLocation;

    fn echo_case() -> Arc<CaseFunction> {
        Arc::new(CaseFunction::new(
            "case_echo",
            SourceLocation::new("cases.rs", 1),
            |args: Args| Ok(Value::Map(args.keywords)),
        ))
    }

    #[test]
    fn bound_kwargs_win_on_collision() {
        let mut bound = Kwargs::new();
        bound.insert("a".to_string(), Value::Int(1));
        let case = CaseDescriptor::generated(echo_case(), "gen_a=1".to_string(), bound);
        let out = case
            .get(Args::new().with_keyword("a", 99).with_keyword("b", 2))
            .unwrap();
        let Value::Map(kwargs) = out else {
            panic!("expected a map");
        };
        assert_eq!(kwargs.get("a"), Some(&Value::Int(1)));
        assert_eq!(kwargs.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn every_get_reinvokes_the_function() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let function = Arc::new(CaseFunction::new(
            "case_count",
            SourceLocation::new("cases.rs", 3),
            move |_| Ok(Value::Int(counter.fetch_add(1, Ordering::SeqCst) as i64)),
        ));
        let case = CaseDescriptor::new(function);
        assert_eq!(case.get(Args::new()).unwrap(), Value::Int(0));
        assert_eq!(case.get(Args::new()).unwrap(), Value::Int(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(case.display(), "case_count");
    }
}
