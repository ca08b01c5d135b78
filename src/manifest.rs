//! YAML case manifests.
//!
//! A manifest describes a case module and, optionally, a parametrized provider, so that the
//! CLI can list discovered cases and combined ids without compiling anything.
//!
//! ```yaml
//! module: arithmetic
//! cases:
//!   - name: case_small
//!     tags: [fast]
//!     returns: 1
//!   - name: case_pairs
//!     generator:
//!       name: "pair_{a}_{b}"
//!       params: [a, b]
//!       rows: [[1, 2], [3, 4]]
//! provider:
//!   name: test_add
//!   cases: true
//!   parametrize:
//!     - names: "x, y"
//!       values: [[1, 2], [3, 4]]
//!       ids: [low, high]
//!       marks: [[slow], null]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::callable::{Args, Callable};
use crate::case::{CaseFunction, NameSource, SourceLocation};
use crate::declaration::{split_names, Declaration, ParamValue};
use crate::diagnostics::{yaml_error, BoxError};
use crate::discovery::{CaseSource, DiscoveryOptions};
use crate::engine::Engine;
use crate::namespace::CaseModule;
use crate::provider::Provider;
use crate::signature::Signature;
use crate::value::{Kwargs, Mark, Value};
use crate::{err_msg, CaseError, ErrorContext};

/// File name suffix of manifests picked up by directory discovery.
pub const MANIFEST_SUFFIX: &str = ".cases.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(skip)]
    path: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub cases: Vec<CaseEntry>,
    #[serde(default)]
    pub provider: Option<ProviderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseEntry {
    pub name: String,
    /// Defining line. Defaults to the case's position in the list, starting at 1.
    #[serde(default)]
    pub line: Option<u32>,
    /// Source file of an imported case. Imported cases are never discovered.
    #[serde(default)]
    pub imported_from: Option<String>,
    #[serde(default)]
    pub tags: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub marks: Vec<String>,
    #[serde(default)]
    pub returns: serde_yaml::Value,
    #[serde(default)]
    pub generator: Option<GeneratorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorEntry {
    /// Name template with `{param}` placeholders.
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit names, one per row.
    #[serde(default)]
    pub names: Option<Vec<String>>,
    pub params: Vec<String>,
    pub rows: Vec<Vec<serde_yaml::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderEntry {
    pub name: String,
    /// Full signature, such as `(a, b, request)`. Defaults to the parametrized names.
    #[serde(default)]
    pub signature: Option<String>,
    /// Parametrize over the module's own cases first.
    #[serde(default)]
    pub cases: bool,
    #[serde(default)]
    pub parametrize: Vec<DeclarationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationEntry {
    pub names: String,
    pub values: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub marks: Option<Vec<Option<Vec<String>>>>,
}

impl Manifest {
    pub fn parse(name: &str, source: &str) -> Result<Self, CaseError> {
        let mut manifest: Manifest = if source.trim().is_empty() {
            Manifest {
                path: String::new(),
                module: None,
                cases: Vec::new(),
                provider: None,
            }
        } else {
            serde_yaml::from_str(source).map_err(|e| yaml_error(name, source, e))?
        };
        manifest.path = name.to_string();
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CaseError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| CaseError::Manifest {
            message: format!("cannot read manifest '{}'", path.display()),
            ctx: ErrorContext::none(),
            source: Some(Box::new(e)),
        })?;
        let manifest = Self::parse(&path.display().to_string(), &source)?;
        debug!(path = %path.display(), cases = manifest.cases.len(), "loaded manifest");
        Ok(manifest)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the described module: the `module` field, else the file name without its suffix.
    pub fn module_name(&self) -> String {
        if let Some(name) = &self.module {
            return name.clone();
        }
        let file = Path::new(&self.path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        file.strip_suffix(MANIFEST_SUFFIX)
            .map(str::to_string)
            .unwrap_or(file)
    }

    /// Builds the case module, defined in the manifest's own file.
    pub fn module(&self) -> Result<CaseModule, CaseError> {
        let mut module = CaseModule::new(self.module_name(), self.path.clone());
        for (index, entry) in self.cases.iter().enumerate() {
            let line = entry.line.unwrap_or(index as u32 + 1);
            let file = entry.imported_from.clone().unwrap_or_else(|| self.path.clone());
            let function = self.case_function(entry, SourceLocation::new(file, line))?;
            module.add_case(function);
        }
        Ok(module)
    }

    fn case_function(&self, entry: &CaseEntry, origin: SourceLocation) -> Result<CaseFunction, CaseError> {
        let returns = to_value(&entry.returns)?;
        let mut function = CaseFunction::new(entry.name.clone(), origin, move |args: Args| {
            if returns.is_nil() && !args.keywords.is_empty() {
                return Ok(Value::Map(args.keywords));
            }
            Ok(returns.clone())
        })
        .with_tags(entry.tags.iter().map(to_value).collect::<Result<Vec<_>, _>>()?);
        for mark in &entry.marks {
            function = function.with_mark(Mark::new(mark.clone()));
        }
        let Some(generator) = &entry.generator else {
            return Ok(function);
        };
        let name_source = match (&generator.name, &generator.names) {
            (Some(template), None) => NameSource::Template(template.clone()),
            (None, Some(names)) => NameSource::Explicit(names.clone()),
            _ => {
                return Err(err_msg!(
                    Configuration,
                    "generator case '{}' needs exactly one of `name` and `names`",
                    entry.name
                ))
            }
        };
        let rows = generator
            .rows
            .iter()
            .map(|row| row.iter().map(to_value).collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(function.generator(name_source, generator.params.clone(), rows))
    }

    /// Builds the described provider, if any.
    pub fn provider(&self, engine: &Engine, module: &CaseModule) -> Result<Option<Provider>, CaseError> {
        let Some(entry) = &self.provider else {
            return Ok(None);
        };
        let mut declarations = Vec::new();
        if entry.cases {
            declarations.push(
                engine.cases_declaration(&CaseSource::module(module), &DiscoveryOptions::default())?,
            );
        }
        for decl in &entry.parametrize {
            declarations.push(declaration(decl)?);
        }

        let signature = match &entry.signature {
            Some(text) => Signature::parse(text)?,
            None => Signature::from_names(
                declarations
                    .iter()
                    .flat_map(|d| d.names().iter().cloned())
                    .collect::<Vec<_>>(),
            )?,
        };
        let mut callable = Callable::returning(entry.name.clone(), signature, echo);
        for decl in declarations {
            callable = callable.parametrize(decl);
        }
        engine.provider(entry.name.clone(), callable).map(Some)
    }
}

/// Body of manifest providers: returns the keyword arguments it receives.
fn echo(args: Args) -> Result<Value, BoxError> {
    Ok(Value::Map(args.keywords))
}

fn declaration(entry: &DeclarationEntry) -> Result<Declaration, CaseError> {
    let rows = entry
        .values
        .iter()
        .map(|v| to_value(v).map(ParamValue::new))
        .collect::<Result<Vec<_>, _>>()?;
    let mut declaration = Declaration::from_names(split_names(&entry.names), rows);
    if let Some(ids) = &entry.ids {
        declaration = declaration.with_ids(ids.iter().cloned());
    }
    if let Some(marks) = &entry.marks {
        let marks = marks
            .iter()
            .map(|row| row.as_ref().map(|names| names.iter().map(Mark::new).collect()))
            .collect();
        declaration = declaration.with_marks(marks)?;
    }
    Ok(declaration)
}

/// Converts a YAML value. Sequences become tuples, so that they can serve as multi-name rows.
pub fn to_value(yaml: &serde_yaml::Value) -> Result<Value, CaseError> {
    use serde_yaml::Value as Yaml;
    Ok(match yaml {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Int(i),
            (None, Some(x)) => Value::Float(x),
            _ => return Err(err_msg!(Manifest, "unsupported number '{}'", n)),
        },
        Yaml::String(s) => Value::Str(s.clone()),
        Yaml::Sequence(items) => Value::Tuple(items.iter().map(to_value).collect::<Result<_, _>>()?),
        Yaml::Mapping(map) => {
            let mut out = Kwargs::new();
            for (key, value) in map {
                let Some(key) = key.as_str() else {
                    return Err(err_msg!(Manifest, "mapping keys must be strings, got {:?}", key));
                };
                out.insert(key.to_string(), to_value(value)?);
            }
            Value::Map(out)
        }
        Yaml::Tagged(tagged) => to_value(&tagged.value)?,
    })
}
