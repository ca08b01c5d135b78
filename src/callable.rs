//! Callables and their calling convention.
//!
//! A [`Callable`] couples a [`Signature`] with a body that either returns once or yields a
//! lazy stream of results (a resource with setup and teardown phases). Parametrization
//! declarations are attached to a callable in attachment order.

use std::fmt;
use std::sync::Arc;

use crate::declaration::Declaration;
use crate::diagnostics::BoxError;
use crate::signature::Signature;
use crate::value::{Kwargs, Value};

/// Arguments delivered to a callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keywords: Kwargs,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keywords(keywords: Kwargs) -> Self {
        Self {
            positional: Vec::new(),
            keywords,
        }
    }

    pub fn with_positional(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn with_keyword(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }
}

/// A stream of results produced lazily by a multi-yield body.
pub type ValueStream = Box<dyn Iterator<Item = Result<Value, BoxError>>>;

pub type ReturnFn = dyn Fn(Args) -> Result<Value, BoxError> + Send + Sync;
pub type YieldFn = dyn Fn(Args) -> Result<ValueStream, BoxError> + Send + Sync;

/// Execution shape of a callable.
#[derive(Clone)]
pub enum Body {
    /// Returns a single value.
    Return(Arc<ReturnFn>),
    /// Yields values over its lifetime. Nothing runs until the stream is pulled.
    Yield(Arc<YieldFn>),
}

impl Body {
    pub fn is_yielding(&self) -> bool {
        matches!(self, Body::Yield(_))
    }
}

/// Result of invoking a callable, in the callable's own execution shape.
pub enum Produced {
    Value(Value),
    Stream(ValueStream),
}

impl Produced {
    /// Drains the result into a list of values: one for a returning body, every yielded
    /// value for a yielding one. Stops at the first error.
    pub fn into_values(self) -> Result<Vec<Value>, BoxError> {
        match self {
            Produced::Value(value) => Ok(vec![value]),
            Produced::Stream(stream) => stream.collect(),
        }
    }

    /// Returns the single value of a returning body, or the first value of a stream.
    pub fn into_first(self) -> Result<Value, BoxError> {
        match self {
            Produced::Value(value) => Ok(value),
            Produced::Stream(mut stream) => stream
                .next()
                .unwrap_or_else(|| Err("stream ended before yielding a value".into())),
        }
    }
}

impl fmt::Debug for Produced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Produced::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Produced::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A named callable with an explicit signature and its attached declarations.
#[derive(Clone)]
pub struct Callable {
    name: String,
    signature: Signature,
    body: Body,
    declarations: Vec<Declaration>,
}

impl Callable {
    pub fn new(name: impl Into<String>, signature: Signature, body: Body) -> Self {
        Self {
            name: name.into(),
            signature,
            body,
            declarations: Vec::new(),
        }
    }

    /// A callable returning once per invocation.
    pub fn returning<F>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        F: Fn(Args) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::new(name, signature, Body::Return(Arc::new(f)))
    }

    /// A callable yielding a lazy stream of values per invocation.
    pub fn yielding<F>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        F: Fn(Args) -> Result<ValueStream, BoxError> + Send + Sync + 'static,
    {
        Self::new(name, signature, Body::Yield(Arc::new(f)))
    }

    /// Attaches a declaration. Declarations are enumerated in attachment order, the first
    /// attached being the outermost axis.
    pub fn parametrize(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn call(&self, args: Args) -> Result<Produced, BoxError> {
        match &self.body {
            Body::Return(f) => f(args).map(Produced::Value),
            Body::Yield(f) => f(args).map(Produced::Stream),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("signature", &self.signature.to_string())
            .field("yielding", &self.body.is_yielding())
            .field("declarations", &self.declarations.len())
            .finish()
    }
}
