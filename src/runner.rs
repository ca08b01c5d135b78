use tracing::{debug, trace};

use crate::callable::Args;
use crate::provider::Provider;
use crate::value::{Mark, Value};
use crate::CaseError;

/// Outcome of one invocation of a provider.
#[derive(Debug)]
pub struct CaseReport {
    /// Combined id of the entry, or the provider's name when it is not parametrized.
    pub id: String,
    /// Marks of the entry, reported as given.
    pub marks: Vec<Mark>,
    /// Every value produced by the invocation. A stream is drained to its end.
    pub outcome: Result<Vec<Value>, CaseError>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Executes a provider once per combined entry, in entry order.
pub struct CaseRunner;

impl CaseRunner {
    pub fn run(provider: &Provider) -> Vec<CaseReport> {
        Self::run_with(provider, &Args::new())
    }

    /// Runs with `args` passed through to every invocation.
    pub fn run_with(provider: &Provider, args: &Args) -> Vec<CaseReport> {
        let Some(params) = provider.params() else {
            let outcome = provider
                .callable()
                .call(args.clone())
                .and_then(|produced| produced.into_values())
                .map_err(|e| CaseError::invocation(provider.name(), e));
            return vec![CaseReport {
                id: provider.name().to_string(),
                marks: Vec::new(),
                outcome,
            }];
        };

        let reports: Vec<CaseReport> = params
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let outcome = provider.invoke(index, args.clone()).and_then(|produced| {
                    produced
                        .into_values()
                        .map_err(|e| CaseError::invocation(provider.name(), e))
                });
                trace!(provider = provider.name(), id = %entry.id, passed = outcome.is_ok(), "ran entry");
                CaseReport {
                    id: entry.id.clone(),
                    marks: entry.marks.clone(),
                    outcome,
                }
            })
            .collect();
        debug!(
            provider = provider.name(),
            runs = reports.len(),
            failures = reports.iter().filter(|r| !r.passed()).count(),
            "ran provider"
        );
        reports
    }
}

/// Shorthand for [`CaseRunner::run`].
pub fn run(provider: &Provider) -> Vec<CaseReport> {
    CaseRunner::run(provider)
}
