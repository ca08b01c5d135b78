pub use crate::diagnostics::{to_error_source, BoxError, CaseError, ErrorContext, ErrorType};

pub mod callable;
pub mod case;
pub mod cli;
pub mod combinator;
pub mod config;
pub mod declaration;
pub mod diagnostics;
pub mod discovery;
pub mod engine;
pub mod injector;
pub mod manifest;
pub mod namespace;
pub mod provider;
pub mod runner;
pub mod signature;
pub mod value;

pub mod prelude {
    pub use crate::callable::{Args, Body, Callable, Produced, ValueStream};
    pub use crate::case::{CaseDescriptor, CaseFunction, ExpectedError, NameSource, SourceLocation};
    pub use crate::combinator::{combine, CombinedEntry, CombinedParameterSet};
    pub use crate::config::EngineConfig;
    pub use crate::declaration::{param, Declaration, Ids, ParamValue};
    pub use crate::discovery::{CaseFilter, CaseSource, DiscoveryOptions, ModuleRef};
    pub use crate::engine::Engine;
    pub use crate::injector::wrap;
    pub use crate::namespace::{CaseModule, Member};
    pub use crate::provider::{ParamProviders, Provider};
    pub use crate::runner::{CaseReport, CaseRunner};
    pub use crate::signature::{Param, ParamKind, Signature};
    pub use crate::value::{Kwargs, Mark, Request, Value};
    pub use crate::{BoxError, CaseError, ErrorType};
}
