use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::case::{CaseDescriptor, CaseFunction, NameSource, ProducerKind};
use crate::namespace::{CaseModule, Member};
use crate::value::{Kwargs, Value};
use crate::{err_msg, CaseError};

// =====================
// Type Aliases for Complex Types
// =====================

/// Predicate over the tags of a case.
pub type TagPredicate = dyn Fn(&[Value]) -> bool + Send + Sync;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("placeholder pattern is valid")
});

/// A module to scan, either given directly or resolved to the caller's own module.
#[derive(Debug, Clone, Copy)]
pub enum ModuleRef<'a> {
    Module(&'a CaseModule),
    This,
}

/// Where cases come from.
#[derive(Debug, Clone)]
pub enum CaseSource<'a> {
    /// A single case function, taken as given.
    Function(Arc<CaseFunction>),
    /// An explicit list of case functions, taken in list order.
    Functions(Vec<Arc<CaseFunction>>),
    /// One or more modules to scan.
    Modules(Vec<ModuleRef<'a>>),
}

impl<'a> CaseSource<'a> {
    pub fn module(module: &'a CaseModule) -> Self {
        CaseSource::Modules(vec![ModuleRef::Module(module)])
    }

    pub fn this_module() -> Self {
        CaseSource::Modules(vec![ModuleRef::This])
    }
}

/// Filter over case tags.
#[derive(Clone)]
pub enum CaseFilter {
    Predicate(Arc<TagPredicate>),
    /// A non-callable filter. Always rejected: use `has_tag` to match a single tag.
    Literal(Value),
}

impl CaseFilter {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        CaseFilter::Predicate(Arc::new(f))
    }
}

impl std::fmt::Debug for CaseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseFilter::Predicate(_) => f.write_str("Predicate(..)"),
            CaseFilter::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
        }
    }
}

/// Selection options of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions<'a> {
    /// Keep only cases carrying this tag.
    pub has_tag: Option<Value>,
    /// Keep only cases whose tags satisfy this filter. ANDed with `has_tag`.
    pub filter: Option<CaseFilter>,
    /// The module `ModuleRef::This` resolves to.
    pub this_module: Option<&'a CaseModule>,
}

impl<'a> DiscoveryOptions<'a> {
    pub fn with_tag(mut self, tag: impl Into<Value>) -> Self {
        self.has_tag = Some(tag.into());
        self
    }

    pub fn with_filter(mut self, filter: CaseFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_this_module(mut self, module: &'a CaseModule) -> Self {
        self.this_module = Some(module);
        self
    }
}

/// Sort key of a discovered case: the defining line, then the position among the cases
/// generated by the same function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub line: u32,
    pub generation_index: usize,
}

/// Discovers case functions and expands them into case descriptors.
///
/// The discovery process follows this flow:
/// 1. Select members carrying the case prefix and defined in the scanned module itself
/// 2. Filter them by tag and predicate
/// 3. Expand generators into one descriptor per generated case
/// 4. Sort everything by defining line, generated cases staying at their generator's place
#[derive(Debug, Clone)]
pub struct CaseDiscoverer {
    case_prefix: String,
}

impl CaseDiscoverer {
    pub fn new(case_prefix: impl Into<String>) -> Self {
        Self {
            case_prefix: case_prefix.into(),
        }
    }

    // =====================
    // Public API - Discovery
    // =====================

    /// Lists every case selected by `source` and `options`, in deterministic order.
    ///
    /// Explicit functions keep their list order. Modules are scanned one after the other,
    /// each sorted by source position. Tag filtering applies to scanned modules only.
    pub fn discover(
        &self,
        source: &CaseSource<'_>,
        options: &DiscoveryOptions<'_>,
    ) -> Result<Vec<CaseDescriptor>, CaseError> {
        Self::check_filter(options)?;
        let cases = match source {
            CaseSource::Function(function) => Self::expand(function)?
                .into_iter()
                .map(|(_, case)| case)
                .collect(),
            CaseSource::Functions(functions) => {
                let mut cases = Vec::new();
                for function in functions {
                    cases.extend(Self::expand(function)?.into_iter().map(|(_, case)| case));
                }
                cases
            }
            CaseSource::Modules(modules) => {
                let mut cases = Vec::new();
                for module in modules {
                    let module = Self::resolve_module(*module, options)?;
                    cases.extend(self.extract_cases_from_module(module, options)?);
                }
                cases
            }
        };
        debug!(cases = cases.len(), "discovered cases");
        Ok(cases)
    }

    /// Scans a single module. See [`discover`](Self::discover).
    pub fn extract_cases_from_module(
        &self,
        module: &CaseModule,
        options: &DiscoveryOptions<'_>,
    ) -> Result<Vec<CaseDescriptor>, CaseError> {
        Self::check_filter(options)?;
        let mut keyed = Vec::new();
        let mut lines: HashMap<u32, &str> = HashMap::new();
        for (name, member) in module.members() {
            let Member::Case(function) = member else {
                continue;
            };
            if !name.starts_with(&self.case_prefix) {
                continue;
            }
            if function.origin().file != module.file() {
                trace!(module = module.name(), case = %name, "skipping imported case");
                continue;
            }
            let line = function.origin().line;
            if let Some(other) = lines.insert(line, function.name()) {
                return Err(err_msg!(
                    Configuration,
                    "cases '{}' and '{}' of module '{}' are both defined at line {}",
                    other,
                    function.name(),
                    module.name(),
                    line
                )
                .with_help("every case function needs its own source line to be ordered"));
            }
            if !Self::is_selected(function, options) {
                continue;
            }
            keyed.extend(Self::expand(function)?);
        }
        keyed.sort_by_key(|(key, _)| *key);
        debug!(module = module.name(), cases = keyed.len(), "scanned case module");
        Ok(keyed.into_iter().map(|(_, case)| case).collect())
    }

    // =====================
    // Internal - Selection
    // =====================

    fn check_filter(options: &DiscoveryOptions<'_>) -> Result<(), CaseError> {
        if let Some(CaseFilter::Literal(value)) = &options.filter {
            return Err(err_msg!(
                Configuration,
                "case filter should be a callable, got {} '{}'",
                value.type_name(),
                value
            )
            .with_help("to select cases carrying a single tag, use `has_tag` instead"));
        }
        Ok(())
    }

    fn resolve_module<'m>(
        module: ModuleRef<'m>,
        options: &DiscoveryOptions<'m>,
    ) -> Result<&'m CaseModule, CaseError> {
        match module {
            ModuleRef::Module(module) => Ok(module),
            ModuleRef::This => options.this_module.ok_or_else(|| {
                err_msg!(
                    Configuration,
                    "THIS_MODULE was requested but the calling module is unknown"
                )
            }),
        }
    }

    fn is_selected(function: &CaseFunction, options: &DiscoveryOptions<'_>) -> bool {
        let tags = function.tags();
        let tagged = options
            .has_tag
            .as_ref()
            .map_or(true, |tag| tags.contains(tag));
        let accepted = match &options.filter {
            Some(CaseFilter::Predicate(predicate)) => predicate(tags),
            _ => true,
        };
        tagged && accepted
    }

    // =====================
    // Internal - Generator Expansion
    // =====================

    /// Expands a function into its descriptors, each with its ordering key.
    fn expand(function: &Arc<CaseFunction>) -> Result<Vec<(OrderKey, CaseDescriptor)>, CaseError> {
        let line = function.origin().line;
        let ProducerKind::Generator {
            name_source,
            parameter_ids,
            value_rows,
        } = function.kind()
        else {
            let key = OrderKey {
                line,
                generation_index: 0,
            };
            return Ok(vec![(key, CaseDescriptor::new(Arc::clone(function)))]);
        };

        if let NameSource::Explicit(names) = name_source {
            if names.len() != value_rows.len() {
                return Err(err_msg!(
                    Configuration,
                    "generator '{}' lists {} names for {} generated cases",
                    function.name(),
                    names.len(),
                    value_rows.len()
                ));
            }
        }

        let mut used = HashSet::new();
        let mut generated = Vec::with_capacity(value_rows.len());
        for (index, row) in value_rows.iter().enumerate() {
            if row.len() != parameter_ids.len() {
                return Err(err_msg!(
                    Configuration,
                    "generator '{}' row {} has {} values for {} parameters",
                    function.name(),
                    index,
                    row.len(),
                    parameter_ids.len()
                ));
            }
            let kwargs: Kwargs = parameter_ids
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            let name = match name_source {
                NameSource::Template(template) => format_template(template, &kwargs)
                    .map_err(|placeholder| {
                        err_msg!(
                            Configuration,
                            "name template '{}' of generator '{}' uses unknown parameter '{}'",
                            template,
                            function.name(),
                            placeholder
                        )
                    })?,
                NameSource::Explicit(names) => names[index].clone(),
                NameSource::Function(f) => f(&kwargs),
            };
            if name.is_empty() {
                return Err(err_msg!(
                    Configuration,
                    "generator '{}' produced an empty case name for row {}",
                    function.name(),
                    index
                ));
            }
            if !used.insert(name.clone()) {
                return Err(err_msg!(
                    Configuration,
                    "generated case names of generator '{}' are not unique: '{}' repeats",
                    function.name(),
                    name
                )
                .with_help("use every parameter name in the name template"));
            }
            trace!(generator = function.name(), case = %name, "generated case");
            let key = OrderKey {
                line,
                generation_index: index,
            };
            generated.push((
                key,
                CaseDescriptor::generated(Arc::clone(function), name, kwargs),
            ));
        }
        Ok(generated)
    }
}

/// Fills `{param}` placeholders from `params`; `{{` and `}}` escape braces.
///
/// Returns the name of the first unknown placeholder on failure.
pub fn format_template(template: &str, params: &Kwargs) -> Result<String, String> {
    let mut missing = None;
    let formatted = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match (caps.get(0).map(|m| m.as_str()), caps.get(1)) {
            (Some("{{"), _) => "{".to_string(),
            (Some("}}"), _) => "}".to_string(),
            (_, Some(name)) => match params.get(name.as_str().trim()) {
                Some(value) => value.to_string(),
                None => {
                    missing.get_or_insert_with(|| name.as_str().to_string());
                    String::new()
                }
            },
            _ => String::new(),
        }
    });
    match missing {
        Some(name) => Err(name),
        None => Ok(formatted.into_owned()),
    }
}
