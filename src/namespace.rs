//! Case modules: the containers scanned by discovery.
//!
//! A [`CaseModule`] names its members the way a source module does. Providers synthesized
//! during collection are attached through [`CaseModule::register`], which probes for a free
//! name instead of overwriting an existing member.
//!
//! # Summary Table
//! | Method     | Overwrites | Collision handling             |
//! |------------|------------|--------------------------------|
//! | define     | Yes        | None                           |
//! | add_case   | Yes        | None                           |
//! | register   | No         | `name`, `name_1`, `name_2`, .. |
//!
//! # Thread Safety
//! Collection is a single pass on a single thread. Wrap in a `Mutex` to share.

use std::sync::Arc;

use im::OrdMap;
use tracing::debug;

use crate::case::{CaseFunction, SourceLocation};
use crate::provider::Provider;
use crate::value::Value;

/// A named member of a case module.
#[derive(Debug, Clone)]
pub enum Member {
    Case(Arc<CaseFunction>),
    Provider(Arc<Provider>),
    Value(Value),
}

impl Member {
    pub fn as_case(&self) -> Option<&Arc<CaseFunction>> {
        match self {
            Member::Case(case) => Some(case),
            _ => None,
        }
    }

    pub fn as_provider(&self) -> Option<&Arc<Provider>> {
        match self {
            Member::Provider(provider) => Some(provider),
            _ => None,
        }
    }

    /// True when `other` is the same registration: the same case function, a provider
    /// built from the same inputs, or an equal value.
    fn same_registration(&self, other: &Member) -> bool {
        match (self, other) {
            (Member::Case(a), Member::Case(b)) => Arc::ptr_eq(a, b),
            (Member::Provider(a), Member::Provider(b)) => {
                Arc::ptr_eq(a, b) || a.fingerprint() == b.fingerprint()
            }
            (Member::Value(a), Member::Value(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaseModule {
    name: String,
    file: String,
    members: OrdMap<String, Member>,
}

impl CaseModule {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            members: OrdMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module's own source file. Members defined elsewhere are imports.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// A location inside this module's own file.
    pub fn at(&self, line: u32) -> SourceLocation {
        SourceLocation::new(self.file.clone(), line)
    }

    /// Binds `name` to `member`, replacing any previous binding.
    pub fn define(&mut self, name: impl Into<String>, member: Member) -> Option<Member> {
        self.members.insert(name.into(), member)
    }

    /// Binds a case function under its own name.
    pub fn add_case(&mut self, case: CaseFunction) -> Arc<CaseFunction> {
        let case = Arc::new(case);
        self.members
            .insert(case.name().to_string(), Member::Case(Arc::clone(&case)));
        case
    }

    /// Binds an existing case function, possibly defined in another module, under `name`.
    pub fn import_case(&mut self, name: impl Into<String>, case: Arc<CaseFunction>) {
        self.members.insert(name.into(), Member::Case(case));
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Members ordered by name.
    pub fn members(&self) -> impl Iterator<Item = (&String, &Member)> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Attaches `member` under `name`, or under the first free `name_N` (N = 1, 2, ..).
    ///
    /// Returns the effective name. Registering the same member again returns the name it
    /// already holds without writing.
    pub fn register(&mut self, name: &str, member: Member) -> String {
        let mut candidate = name.to_string();
        let mut suffix = 0usize;
        loop {
            match self.members.get(&candidate) {
                None => {
                    debug!(module = %self.name, requested = name, effective = %candidate, "registered member");
                    self.members.insert(candidate.clone(), member);
                    return candidate;
                }
                Some(existing) if existing.same_registration(&member) => return candidate,
                Some(_) => {
                    suffix += 1;
                    candidate = format!("{}_{}", name, suffix);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_probes_for_a_free_name() {
        let mut module = CaseModule::new("m", "m.rs");
        module.define("root", Member::Value(Value::Int(0)));
        module.define("root_1", Member::Value(Value::Int(1)));
        let name = module.register("root", Member::Value(Value::Int(2)));
        assert_eq!(name, "root_2");
        assert_eq!(module.get("root").and_then(|m| match m {
            Member::Value(v) => v.as_int(),
            _ => None,
        }), Some(0));
    }

    #[test]
    fn register_is_idempotent_for_the_same_member() {
        let mut module = CaseModule::new("m", "m.rs");
        module.define("root", Member::Value(Value::Int(0)));
        let first = module.register("root", Member::Value(Value::Int(5)));
        let again = module.register("root", Member::Value(Value::Int(5)));
        assert_eq!(first, "root_1");
        assert_eq!(again, "root_1");
        assert_eq!(module.len(), 2);
    }
}
