use std::collections::BTreeMap;

use thiserror::Error;

use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Scalar and grouped reductions over a filtered subset
// ---------------------------------------------------------------------------

/// A reduction operator applied to one column of the subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    Sum,
    Mean,
    Count,
}

impl Reduce {
    pub fn name(self) -> &'static str {
        match self {
            Reduce::Sum => "sum",
            Reduce::Mean => "mean",
            Reduce::Count => "count",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// `mean` has no defined value over zero records.
    #[error("mean of column '{column}' is undefined over an empty subset")]
    UndefinedAggregate { column: String },

    /// A numeric reduction hit a cell that is not a number.
    #[error("column '{column}' contains a non-numeric value; cannot {op}")]
    NonNumeric { column: String, op: &'static str },
}

/// The tuple of group-column values identifying one group.
pub type GroupKey = Vec<Value>;

/// Reduce one column of the subset to a single number.
///
/// `Sum` over an empty subset is 0. `Count` counts non-null cells. `Mean`
/// over zero values signals [`AggregateError::UndefinedAggregate`] rather
/// than returning 0 or NaN.
pub fn reduce(
    dataset: &Dataset,
    indices: &[usize],
    column: &str,
    op: Reduce,
) -> Result<f64, AggregateError> {
    if op == Reduce::Count {
        let n = indices
            .iter()
            .filter(|&&i| {
                !matches!(dataset.records[i].get(column), None | Some(Value::Null))
            })
            .count();
        return Ok(n as f64);
    }

    let mut sum = 0.0;
    let mut n = 0usize;
    for &i in indices {
        match dataset.records[i].get(column) {
            None | Some(Value::Null) => continue,
            Some(val) => {
                let x = val.as_f64().ok_or_else(|| AggregateError::NonNumeric {
                    column: column.to_string(),
                    op: op.name(),
                })?;
                sum += x;
                n += 1;
            }
        }
    }

    match op {
        Reduce::Sum => Ok(sum),
        Reduce::Mean => {
            if n == 0 {
                Err(AggregateError::UndefinedAggregate {
                    column: column.to_string(),
                })
            } else {
                Ok(sum / n as f64)
            }
        }
        Reduce::Count => unreachable!(),
    }
}

/// Group the subset by equality on `group_columns`, reduce `value_column`
/// within each group, and return the entries sorted ascending by reduced
/// value (ties broken by group key, so the order is deterministic).
///
/// Only groups observed in the subset appear; absent categories are not
/// zero-filled.
pub fn group_reduce(
    dataset: &Dataset,
    indices: &[usize],
    group_columns: &[&str],
    value_column: &str,
    op: Reduce,
) -> Result<Vec<(GroupKey, f64)>, AggregateError> {
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for &i in indices {
        let key: GroupKey = group_columns
            .iter()
            .map(|col| dataset.records[i].get(col).cloned().unwrap_or(Value::Null))
            .collect();
        groups.entry(key).or_default().push(i);
    }

    let mut entries = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let reduced = reduce(dataset, &members, value_column, op)?;
        entries.push((key, reduced));
    }

    entries.sort_by(|(ka, va), (kb, vb)| va.total_cmp(vb).then_with(|| ka.cmp(kb)));
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Presentation-boundary helpers
// ---------------------------------------------------------------------------

/// Round to a fixed number of decimal places for display. Rounding happens
/// here, at the presentation boundary, never inside `reduce`.
pub fn round_to(v: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (v * factor).round() / factor
}

/// Build a qualitative rating string: `symbol` repeated `round(score)` times.
pub fn repeat_symbol(symbol: &str, score: f64) -> String {
    let n = score.round().max(0.0) as usize;
    symbol.repeat(n)
}
