//! Engine configuration.
//!
//! Every field has a default, so an empty YAML document is a valid configuration.
//!
//! ```yaml
//! case_prefix: case_
//! control_param: request
//! id_separator: "-"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::yaml_error;
use crate::{err_msg, CaseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Prefix of discoverable case functions.
    pub case_prefix: String,
    /// Control parameter through which wrapped callables receive the selected value.
    pub control_param: String,
    /// Joins ids across axes and across the components of a tuple row.
    pub id_separator: String,
    /// Parameter receiving a case descriptor in case-set parametrization.
    pub case_data_argname: String,
    /// Prefix of the root provider synthesized by `param_fixtures`.
    pub root_provider_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            case_prefix: "case_".to_string(),
            control_param: "request".to_string(),
            id_separator: "-".to_string(),
            case_data_argname: "case_data".to_string(),
            root_provider_prefix: "param_fixtures_root__".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, CaseError> {
        Self::parse("<config>", source)
    }

    /// Reads and validates a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CaseError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| CaseError::Manifest {
            message: format!("cannot read configuration '{}'", path.display()),
            ctx: crate::ErrorContext::none(),
            source: Some(Box::new(e)),
        })?;
        let config = Self::parse(&path.display().to_string(), &source)?;
        debug!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    fn parse(name: &str, source: &str) -> Result<Self, CaseError> {
        let config: Self = if source.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(source).map_err(|e| yaml_error(name, source, e))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CaseError> {
        let required = [
            ("case_prefix", &self.case_prefix),
            ("control_param", &self.control_param),
            ("id_separator", &self.id_separator),
            ("case_data_argname", &self.case_data_argname),
            ("root_provider_prefix", &self.root_provider_prefix),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(err_msg!(Configuration, "configuration field '{}' must not be empty", field));
            }
        }
        Ok(())
    }
}
