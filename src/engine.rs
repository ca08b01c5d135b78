use std::sync::Arc;

use tracing::{debug, warn};

use crate::callable::Callable;
use crate::case::CaseDescriptor;
use crate::combinator::{self, CombinedParameterSet};
use crate::config::EngineConfig;
use crate::declaration::{Declaration, Ids, ParamValue};
use crate::discovery::{CaseDiscoverer, CaseSource, DiscoveryOptions};
use crate::injector;
use crate::namespace::CaseModule;
use crate::provider::{self, ParamProviders, Provider};
use crate::value::Value;
use crate::CaseError;

// ============================================================================
// ENGINE - Configured entry point to every collection-time operation
// ============================================================================

/// Ties a configuration to discovery, combination and wrapping.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    discoverer: CaseDiscoverer,
}

impl Default for Engine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            discoverer: CaseDiscoverer::new(config.case_prefix.clone()),
            config,
        }
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, CaseError> {
        config.validate()?;
        Ok(Self {
            discoverer: CaseDiscoverer::new(config.case_prefix.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Core pipeline
    // ------------------------------------------------------------------------

    pub fn discover(
        &self,
        source: &CaseSource<'_>,
        options: &DiscoveryOptions<'_>,
    ) -> Result<Vec<CaseDescriptor>, CaseError> {
        self.discoverer.discover(source, options)
    }

    pub fn combine(&self, declarations: &[Declaration]) -> Result<CombinedParameterSet, CaseError> {
        combinator::combine(declarations, &self.config.id_separator)
    }

    /// Rewrites `callable` to receive the entries of `params` through the control parameter.
    pub fn wrap(&self, callable: &Callable, params: &CombinedParameterSet) -> Result<Callable, CaseError> {
        injector::wrap(callable, params.axes(), &self.config.control_param)
    }

    /// Turns a callable and its declarations into a provider.
    pub fn provider(&self, name: impl Into<String>, callable: Callable) -> Result<Provider, CaseError> {
        Provider::parametrized(name, callable, &self.config)
    }

    // ------------------------------------------------------------------------
    // Case-set parametrization
    // ------------------------------------------------------------------------

    /// One declaration over the discovered cases, named by `case_data_argname`. Ids are the
    /// display names of the cases and each row carries its case's marks.
    pub fn cases_declaration(
        &self,
        source: &CaseSource<'_>,
        options: &DiscoveryOptions<'_>,
    ) -> Result<Declaration, CaseError> {
        let cases = self.discover(source, options)?;
        let rows: Vec<ParamValue> = cases
            .into_iter()
            .map(|case| {
                let marks = case.marks().to_vec();
                let id = case.display().to_string();
                let mut row = ParamValue::new(Value::Case(Arc::new(case))).with_id(id);
                row.marks = marks;
                row
            })
            .collect();
        debug!(argname = %self.config.case_data_argname, cases = rows.len(), "built case declaration");
        Ok(Declaration::from_names(vec![self.config.case_data_argname.clone()], rows))
    }

    /// Attaches the declaration built by [`cases_declaration`](Self::cases_declaration).
    pub fn cases_data(
        &self,
        callable: Callable,
        source: &CaseSource<'_>,
        options: &DiscoveryOptions<'_>,
    ) -> Result<Callable, CaseError> {
        Ok(callable.parametrize(self.cases_declaration(source, options)?))
    }

    /// Deprecated: [`cases_data`](Self::cases_data) followed by [`provider`](Self::provider).
    pub fn cases_provider(
        &self,
        name: impl Into<String>,
        callable: Callable,
        source: &CaseSource<'_>,
        options: &DiscoveryOptions<'_>,
    ) -> Result<Provider, CaseError> {
        let name = name.into();
        warn!(
            target: "caseform::deprecated",
            provider = %name,
            "cases_provider is deprecated: use cases_data and provider"
        );
        let callable = self.cases_data(callable, source, options)?;
        self.provider(name, callable)
    }

    // ------------------------------------------------------------------------
    // Parameter providers
    // ------------------------------------------------------------------------

    pub fn param_fixture(
        &self,
        argname: &str,
        values: Vec<ParamValue>,
        ids: Option<Ids>,
    ) -> Result<Provider, CaseError> {
        provider::param_fixture(argname, values, ids, &self.config)
    }

    pub fn param_fixtures(
        &self,
        argnames: &str,
        rows: Vec<ParamValue>,
        ids: Option<Ids>,
        module: &mut CaseModule,
    ) -> Result<ParamProviders, CaseError> {
        provider::param_fixtures(argnames, rows, ids, module, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Args;
    use crate::case::{CaseFunction, SourceLocation};
    use crate::signature::Signature;
    use crate::value::Mark;

    fn module() -> CaseModule {
        let mut module = CaseModule::new("cases", "cases.rs");
        let at = module.at(2);
        module.add_case(CaseFunction::new("case_b", at, |_| Ok(Value::Int(2))));
        let at = module.at(1);
        module.add_case(
            CaseFunction::new("case_a", at, |_| Ok(Value::Int(1))).with_mark(Mark::new("slow")),
        );
        module
    }

    #[test]
    fn cases_declaration_uses_display_names_and_marks() {
        let engine = Engine::default();
        let module = module();
        let decl = engine
            .cases_declaration(&CaseSource::module(&module), &DiscoveryOptions::default())
            .unwrap();
        assert_eq!(decl.names(), ["case_data".to_string()]);
        let set = engine.combine(&[decl]).unwrap();
        assert_eq!(set.ids(), vec!["case_a", "case_b"]);
        assert_eq!(set.entries()[0].marks, vec![Mark::new("slow")]);
    }

    #[test]
    fn cases_provider_hands_each_case_to_the_callable() {
        let engine = Engine::default();
        let module = module();
        let test = Callable::returning("test_x", Signature::from_names(["case_data"]).unwrap(), |args: Args| {
            let case = args
                .keyword("case_data")
                .and_then(Value::as_case)
                .ok_or("no case")?;
            case.get(Args::new())
        });
        let provider = engine
            .cases_provider("test_x", test, &CaseSource::module(&module), &DiscoveryOptions::default())
            .unwrap();
        let out = provider.invoke(1, Args::new()).unwrap().into_first().unwrap();
        assert_eq!(out, Value::Int(2));
    }

    #[test]
    fn callable_without_declarations_is_a_plain_provider() {
        let engine = Engine::default();
        let f = Callable::returning("f", Signature::default(), |_| Ok(Value::Nil));
        let provider = engine.provider("f", f).unwrap();
        assert!(!provider.is_parametrized());
        assert_eq!(provider.callable().signature().to_string(), "()");
    }
}
