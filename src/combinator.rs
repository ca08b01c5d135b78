//! Multi-axis parametrization combinator.
//!
//! Merges every declaration attached to a callable into a single [`CombinedParameterSet`].
//! One declaration passes through unchanged. Several declarations are combined as a
//! cartesian product in which the last declaration varies fastest.

use itertools::Itertools;
use tracing::{debug, trace};

use crate::declaration::Declaration;
use crate::value::{Mark, Value};
use crate::{err_msg, CaseError};

/// One entry of a combined parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedEntry {
    /// A row when there is a single axis, otherwise a tuple holding one row per axis.
    pub value: Value,
    pub id: String,
    /// Union of the marks of every selected row, in axis order.
    pub marks: Vec<Mark>,
}

impl CombinedEntry {
    pub fn is_marked(&self) -> bool {
        !self.marks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedParameterSet {
    axes: Vec<Vec<String>>,
    entries: Vec<CombinedEntry>,
}

impl CombinedParameterSet {
    /// Parameter names per axis, in declaration order.
    pub fn axes(&self) -> &[Vec<String>] {
        &self.axes
    }

    /// All declared names, flattened across axes.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().flatten().map(String::as_str)
    }

    pub fn is_single_axis(&self) -> bool {
        self.axes.len() == 1
    }

    pub fn entries(&self) -> &[CombinedEntry] {
        &self.entries
    }

    pub fn values(&self) -> Vec<&Value> {
        self.entries.iter().map(|e| &e.value).collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Combines `declarations`, listed outermost first, joining per-axis ids with `separator`.
pub fn combine(
    declarations: &[Declaration],
    separator: &str,
) -> Result<CombinedParameterSet, CaseError> {
    if declarations.is_empty() {
        return Err(err_msg!(
            Configuration,
            "at least one parametrization declaration is required"
        ));
    }
    for declaration in declarations {
        declaration.validate()?;
    }

    let axes: Vec<Vec<String>> = declarations.iter().map(|d| d.names().to_vec()).collect();
    let axis_ids: Vec<Vec<String>> = declarations
        .iter()
        .map(|d| d.resolve_ids(separator))
        .collect();

    let (values, ids, marks) = if let [single] = declarations {
        let values: Vec<Value> = single.values().iter().map(|r| r.value.clone()).collect();
        let marks: Vec<Vec<Mark>> = single.values().iter().map(|r| r.marks.clone()).collect();
        (values, axis_ids[0].clone(), marks)
    } else {
        let mut values = Vec::new();
        let mut ids = Vec::new();
        let mut marks = Vec::new();
        for selection in declarations
            .iter()
            .map(|d| 0..d.len())
            .multi_cartesian_product()
        {
            let rows: Vec<_> = selection
                .iter()
                .zip(declarations)
                .map(|(&row, d)| &d.values()[row])
                .collect();
            values.push(Value::tuple(rows.iter().map(|r| r.value.clone())));
            ids.push(
                selection
                    .iter()
                    .zip(&axis_ids)
                    .map(|(&row, axis)| axis[row].as_str())
                    .join(separator),
            );
            marks.push(rows.iter().flat_map(|r| r.marks.iter().cloned()).collect());
        }
        (values, ids, marks)
    };

    if values.len() != ids.len() || values.len() != marks.len() {
        return Err(err_msg!(
            Internal,
            "combined {} values but {} ids and {} mark sets",
            values.len(),
            ids.len(),
            marks.len()
        ));
    }

    let entries: Vec<CombinedEntry> = values
        .into_iter()
        .zip(ids)
        .zip(marks)
        .map(|((value, id), marks)| CombinedEntry { value, id, marks })
        .collect();

    for entry in &entries {
        trace!(id = %entry.id, marks = entry.marks.len(), "combined entry");
    }
    debug!(
        axes = axes.len(),
        entries = entries.len(),
        "combined parametrization declarations"
    );

    Ok(CombinedParameterSet { axes, entries })
}
