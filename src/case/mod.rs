//! # Case Functions
//!
//! A case function supplies test input and expected output data. It is either a simple
//! producer, yielding one case, or a generator declaring many named cases from one
//! definition. Discovery turns case functions into [`CaseDescriptor`]s.
//!
//! ## Module Structure
//!
//! - **`descriptor`**: the lazily invoked case handle
//! - **`data`**: helpers for the conventional `(inputs, outputs, error)` case payload

use std::fmt;
use std::sync::Arc;

use crate::callable::{Args, ReturnFn};
use crate::diagnostics::BoxError;
use crate::value::{Kwargs, Mark, Value};

pub mod data;
pub mod descriptor;

pub use data::ExpectedError;
pub use descriptor::CaseDescriptor;

/// Where a function was defined. Discovery orders cases by `line` and excludes functions
/// whose `file` is not the scanned module's own file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

pub type NameFn = dyn Fn(&Kwargs) -> String + Send + Sync;

/// How a generator names the cases it produces.
#[derive(Clone)]
pub enum NameSource {
    /// A template with `{param}` placeholders filled from each combination.
    Template(String),
    /// One name per combination, in order.
    Explicit(Vec<String>),
    /// A function over the combination's named parameter values.
    Function(Arc<NameFn>),
}

impl fmt::Debug for NameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameSource::Template(t) => f.debug_tuple("Template").field(t).finish(),
            NameSource::Explicit(names) => f.debug_tuple("Explicit").field(names).finish(),
            NameSource::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Whether a case function produces one case or many.
#[derive(Debug, Clone)]
pub enum ProducerKind {
    Simple,
    Generator {
        name_source: NameSource,
        parameter_ids: Vec<String>,
        value_rows: Vec<Vec<Value>>,
    },
}

/// A case-producing function with its tags and marks.
#[derive(Clone)]
pub struct CaseFunction {
    name: String,
    origin: SourceLocation,
    body: Arc<ReturnFn>,
    tags: Vec<Value>,
    marks: Vec<Mark>,
    kind: ProducerKind,
}

impl CaseFunction {
    pub fn new<F>(name: impl Into<String>, origin: SourceLocation, body: F) -> Self
    where
        F: Fn(Args) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            origin,
            body: Arc::new(body),
            tags: Vec::new(),
            marks: Vec::new(),
            kind: ProducerKind::Simple,
        }
    }

    pub fn with_tags<I, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// Turns this function into a generator of one case per row of `value_rows`.
    pub fn generator<I, S>(
        mut self,
        name_source: NameSource,
        parameter_ids: I,
        value_rows: Vec<Vec<Value>>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = ProducerKind::Generator {
            name_source,
            parameter_ids: parameter_ids.into_iter().map(Into::into).collect(),
            value_rows,
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &SourceLocation {
        &self.origin
    }

    pub fn tags(&self) -> &[Value] {
        &self.tags
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn kind(&self) -> &ProducerKind {
        &self.kind
    }

    pub fn call(&self, args: Args) -> Result<Value, BoxError> {
        (self.body)(args)
    }
}

impl fmt::Debug for CaseFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseFunction")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("tags", &self.tags)
            .field("marks", &self.marks)
            .field("kind", &self.kind)
            .finish()
    }
}
