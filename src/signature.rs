//! Signature descriptors.
//!
//! A [`Signature`] is the ordered list of formal parameters a callable exposes. The injector
//! reads it to check declared names and rewrites it to hide them from the host framework.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{err_msg, CaseError};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Bound by position or by name.
    PositionalOrKeyword,
    /// Bound by name only (declared after `*` or `*args`).
    KeywordOnly,
    /// Collects extra positional arguments (`*args`).
    VarPositional,
    /// Collects extra keyword arguments (`**kwargs`).
    VarKeyword,
}

impl ParamKind {
    /// True when a single named value can be bound to a parameter of this kind.
    pub fn binds_by_name(self) -> bool {
        matches!(self, ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOrKeyword)
    }
}

/// Ordered formal parameter list of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Builds a signature, rejecting duplicate and malformed names.
    pub fn new(params: Vec<Param>) -> Result<Self, CaseError> {
        for (i, param) in params.iter().enumerate() {
            if !IDENTIFIER.is_match(&param.name) {
                return Err(err_msg!(
                    Configuration,
                    "invalid parameter name '{}'",
                    param.name
                ));
            }
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(err_msg!(
                    Configuration,
                    "duplicate parameter '{}' in signature",
                    param.name
                ));
            }
        }
        Ok(Self { params })
    }

    /// Builds a signature of positional-or-keyword parameters.
    pub fn from_names<I, S>(names: I) -> Result<Self, CaseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Param::positional).collect())
    }

    /// Parses a comma separated parameter list such as `a, b, *args, c, **kwargs`.
    ///
    /// A bare `*` switches the following parameters to keyword-only.
    pub fn parse(text: &str) -> Result<Self, CaseError> {
        let text = text.trim();
        let text = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(text);
        let mut params = Vec::new();
        let mut keyword_only = false;
        for raw in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if raw == "*" {
                keyword_only = true;
                continue;
            }
            if let Some(name) = raw.strip_prefix("**") {
                params.push(Param::new(name, ParamKind::VarKeyword));
            } else if let Some(name) = raw.strip_prefix('*') {
                params.push(Param::new(name, ParamKind::VarPositional));
                keyword_only = true;
            } else if keyword_only {
                params.push(Param::new(raw, ParamKind::KeywordOnly));
            } else {
                params.push(Param::positional(raw));
            }
        }
        Self::new(params)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns a copy without the given parameter names. Absent names are ignored.
    pub fn without<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: Vec<&str> = names.into_iter().collect();
        Self {
            params: self
                .params
                .iter()
                .filter(|p| !names.contains(&p.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Returns a copy with `param` inserted first.
    pub fn with_first(&self, param: Param) -> Result<Self, CaseError> {
        let mut params = Vec::with_capacity(self.params.len() + 1);
        params.push(param);
        params.extend(self.params.iter().cloned());
        Self::new(params)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut star_written = self
            .params
            .iter()
            .any(|p| p.kind == ParamKind::VarPositional);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match param.kind {
                ParamKind::PositionalOrKeyword => write!(f, "{}", param.name)?,
                ParamKind::KeywordOnly => {
                    if !star_written {
                        write!(f, "*, ")?;
                        star_written = true;
                    }
                    write!(f, "{}", param.name)?
                }
                ParamKind::VarPositional => write!(f, "*{}", param.name)?,
                ParamKind::VarKeyword => write!(f, "**{}", param.name)?,
            }
        }
        write!(f, ")")
    }
}
