//! Parametrized resource providers.
//!
//! A [`Provider`] is what the host framework registers as a fixture: a callable, already
//! rewritten by the injector when it is parametrized, together with the combined parameter
//! set the framework iterates over.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::callable::{Args, Callable, Produced};
use crate::combinator::{combine, CombinedParameterSet};
use crate::config::EngineConfig;
use crate::declaration::{split_names, Declaration, Ids, ParamValue};
use crate::diagnostics::BoxError;
use crate::injector::wrap;
use crate::namespace::{CaseModule, Member};
use crate::signature::Signature;
use crate::value::{Request, Value};
use crate::{err_msg, CaseError};

pub struct Provider {
    name: String,
    callable: Callable,
    params: Option<CombinedParameterSet>,
    control_param: Option<String>,
    fingerprint: String,
}

impl Provider {
    /// A provider without parametrization.
    pub fn plain(name: impl Into<String>, callable: Callable) -> Self {
        Self::assemble(name.into(), callable, None, None)
    }

    /// Combines the callable's declarations and wraps it so that each combined entry
    /// reaches the original parameters through the control parameter.
    ///
    /// A callable without declarations becomes a plain provider.
    pub fn parametrized(
        name: impl Into<String>,
        callable: Callable,
        config: &EngineConfig,
    ) -> Result<Self, CaseError> {
        let name = name.into();
        if callable.declarations().is_empty() {
            return Ok(Self::plain(name, callable));
        }
        let params = combine(callable.declarations(), &config.id_separator)?;
        let wrapped = wrap(&callable, params.axes(), &config.control_param)?;
        debug!(provider = %name, entries = params.len(), "built parametrized provider");
        Ok(Self::assemble(
            name,
            wrapped,
            Some(params),
            Some(config.control_param.clone()),
        ))
    }

    fn assemble(
        name: String,
        callable: Callable,
        params: Option<CombinedParameterSet>,
        control_param: Option<String>,
    ) -> Self {
        let fingerprint = fingerprint(&name, &callable, params.as_ref());
        Self {
            name,
            callable,
            params,
            control_param,
            fingerprint,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn params(&self) -> Option<&CombinedParameterSet> {
        self.params.as_ref()
    }

    pub fn is_parametrized(&self) -> bool {
        self.params.is_some()
    }

    /// Digest of the provider's name, signature and parameter set. Two providers built from
    /// the same inputs share a fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Invokes the provider for the combined entry at `index`, delivered through the
    /// control parameter alongside `args`.
    pub fn invoke(&self, index: usize, args: Args) -> Result<Produced, CaseError> {
        let (Some(entry), Some(control_param)) = (
            self.params.as_ref().and_then(|p| p.entries().get(index)),
            self.control_param.as_deref(),
        ) else {
            return Err(err_msg!(
                Configuration,
                "provider '{}' has no parameter entry {}",
                self.name,
                index
            ));
        };
        let request = Request::new(entry.value.clone(), entry.id.clone());
        let args = args.with_keyword(control_param, Value::Request(Arc::new(request)));
        self.callable
            .call(args)
            .map_err(|e| CaseError::invocation(&self.name, e))
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("signature", &self.callable.signature().to_string())
            .field("entries", &self.params.as_ref().map(CombinedParameterSet::len))
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

fn fingerprint(name: &str, callable: &Callable, params: Option<&CombinedParameterSet>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(callable.signature().to_string().as_bytes());
    if let Some(params) = params {
        for axis in params.axes() {
            hasher.update(axis.join(",").as_bytes());
            hasher.update([0u8]);
        }
        for entry in params.entries() {
            hasher.update(entry.id.as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.value.to_string().as_bytes());
            hasher.update([0u8]);
            for mark in &entry.marks {
                hasher.update(mark.to_string().as_bytes());
            }
            hasher.update([1u8]);
        }
    }
    format!("{:x}", hasher.finalize())
}

// =====================
// Parameter providers
// =====================

/// A provider whose value is the selected parameter itself.
pub fn param_fixture(
    argname: &str,
    values: Vec<ParamValue>,
    ids: Option<Ids>,
    config: &EngineConfig,
) -> Result<Provider, CaseError> {
    if argname.contains(',') {
        return Err(err_msg!(
            Configuration,
            "param_fixture declares a single parameter, got '{}'",
            argname
        )
        .with_help("use param_fixtures to declare several parameters at once"));
    }
    let argname = argname.trim();
    let name = argname.to_string();
    let callable = Callable::returning(argname, Signature::from_names([argname])?, move |args: Args| {
        keyword(&args, &name)
    })
    .parametrize(Declaration::from_names(vec![argname.to_string()], values).with_id_source(ids));
    Provider::parametrized(argname, callable, config)
}

/// Providers created by [`param_fixtures`].
#[derive(Debug)]
pub struct ParamProviders {
    /// Effective name of the root provider in the module.
    pub root_name: String,
    pub root: Arc<Provider>,
    /// One provider per declared name, in declaration order.
    pub providers: Vec<Provider>,
}

/// Declares several parameters at once.
///
/// A root provider, parametrized over the rows and returning the whole row, is registered in
/// `module` under `root_provider_prefix` followed by the names joined with `_`. Each name
/// then gets its own provider depending on the root one and returning its component of the
/// row. With a single name the root provider returns the bare value.
pub fn param_fixtures(
    argnames: &str,
    rows: Vec<ParamValue>,
    ids: Option<Ids>,
    module: &mut CaseModule,
    config: &EngineConfig,
) -> Result<ParamProviders, CaseError> {
    let names = split_names(argnames);
    if names.is_empty() {
        return Err(err_msg!(Configuration, "param_fixtures needs at least one parameter name"));
    }
    let requested = format!("{}{}", config.root_provider_prefix, names.join("_"));

    let root_names = names.clone();
    let root_callable = Callable::returning(
        requested.clone(),
        Signature::from_names(names.iter().cloned())?,
        move |args: Args| {
            if let [name] = root_names.as_slice() {
                return keyword(&args, name);
            }
            let values = root_names
                .iter()
                .map(|n| keyword(&args, n))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Tuple(values))
        },
    )
    .parametrize(Declaration::from_names(names.clone(), rows).with_id_source(ids));
    let root = Arc::new(Provider::parametrized(requested.clone(), root_callable, config)?);
    let root_name = module.register(&requested, Member::Provider(Arc::clone(&root)));

    let single = names.len() == 1;
    let mut providers = Vec::with_capacity(names.len());
    for (index, argname) in names.iter().enumerate() {
        let dependency = root_name.clone();
        let callable = Callable::returning(
            argname.clone(),
            Signature::from_names([root_name.as_str()])?,
            move |args: Args| {
                let row = keyword(&args, &dependency)?;
                if single {
                    return Ok(row);
                }
                row.as_tuple()
                    .and_then(|t| t.get(index))
                    .cloned()
                    .ok_or_else(|| format!("'{}' holds no component {}", dependency, index).into())
            },
        );
        providers.push(Provider::plain(argname.clone(), callable));
    }
    debug!(root = %root_name, providers = providers.len(), "declared parameter providers");
    Ok(ParamProviders {
        root_name,
        root,
        providers,
    })
}

fn keyword(args: &Args, name: &str) -> Result<Value, BoxError> {
    args.keyword(name)
        .cloned()
        .ok_or_else(|| format!("missing argument '{}'", name).into())
}
