// Shared builders for the integration suites.
#![allow(dead_code)]

use caseform::prelude::*;

/// A case function returning a constant, defined in `module` at `line`.
pub fn constant_case(module: &CaseModule, name: &str, line: u32, value: i64) -> CaseFunction {
    CaseFunction::new(name, module.at(line), move |_| Ok(Value::Int(value)))
}

/// A callable returning its keyword arguments as a map.
pub fn echo(name: &str, signature: &str) -> Callable {
    Callable::returning(name, Signature::parse(signature).unwrap(), |args: Args| {
        Ok(Value::Map(args.keywords))
    })
}

pub fn names(cases: &[CaseDescriptor]) -> Vec<&str> {
    cases.iter().map(CaseDescriptor::display).collect()
}

pub fn axes(names: &[&[&str]]) -> Vec<Vec<String>> {
    names
        .iter()
        .map(|axis| axis.iter().map(|n| n.to_string()).collect())
        .collect()
}

pub fn request(param: Value, id: &str) -> Value {
    Value::Request(std::sync::Arc::new(Request::new(param, id)))
}
