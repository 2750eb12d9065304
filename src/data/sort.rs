use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{EngineError, Result};

use super::model::{field, parse_numeric, Dataset, Schema};

// ---------------------------------------------------------------------------
// SortOrder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(EngineError::InvalidOrder(format!(
                "Unknown sort order '{other}'. Use 'asc' or 'desc'."
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}

// ---------------------------------------------------------------------------
// Merge sort over row indices
// ---------------------------------------------------------------------------

/// Sort `order` in place. `takes_left(a, b)` says whether `a` (from the left
/// run) goes before `b` (from the right run); returning true on ties keeps the
/// sort stable.
fn merge_sort<F>(order: &mut [usize], scratch: &mut [usize], takes_left: &F)
where
    F: Fn(usize, usize) -> bool,
{
    let len = order.len();
    if len <= 1 {
        return;
    }
    let mid = len / 2;
    {
        let (left, right) = order.split_at_mut(mid);
        let (left_scratch, right_scratch) = scratch.split_at_mut(mid);
        merge_sort(left, left_scratch, takes_left);
        merge_sort(right, right_scratch, takes_left);
    }
    merge(order, scratch, mid, takes_left);
}

/// Two-pointer merge of `order[..mid]` and `order[mid..]`, both already sorted.
fn merge<F>(order: &mut [usize], scratch: &mut [usize], mid: usize, takes_left: &F)
where
    F: Fn(usize, usize) -> bool,
{
    scratch.copy_from_slice(order);
    let (left, right) = scratch.split_at(mid);
    let (mut i, mut j) = (0, 0);
    for slot in order.iter_mut() {
        let from_left = match (left.get(i), right.get(j)) {
            (Some(&a), Some(&b)) => takes_left(a, b),
            (Some(_), None) => true,
            _ => false,
        };
        if from_left {
            *slot = left[i];
            i += 1;
        } else {
            *slot = right[j];
            j += 1;
        }
    }
}

/// Stable permutation of `0..len` under `takes_left`.
fn sorted_indices<F>(len: usize, takes_left: F) -> Vec<usize>
where
    F: Fn(usize, usize) -> bool,
{
    let mut order: Vec<usize> = (0..len).collect();
    let mut scratch = vec![0usize; len];
    merge_sort(&mut order, &mut scratch, &takes_left);
    order
}

/// Row indices of `dataset` in sorted order by column `idx`.
///
/// Numeric columns compare parsed floats; any unparsable cell fails with
/// `InvalidNumber`. Categorical columns compare raw text.
pub fn sort_indices(schema: &Schema, dataset: &Dataset, idx: usize, order: SortOrder) -> Result<Vec<usize>> {
    let len = dataset.len();

    if schema.is_numeric(idx) {
        let keys = dataset
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cell = field(row, idx);
                parse_numeric(cell).ok_or_else(|| {
                    EngineError::InvalidNumber(format!(
                        "Row {i} has a non-numeric sort value: '{cell}'."
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        return Ok(match order {
            SortOrder::Ascending => sorted_indices(len, |a, b| keys[a] <= keys[b]),
            SortOrder::Descending => sorted_indices(len, |a, b| keys[a] >= keys[b]),
        });
    }

    let keys: Vec<&str> = dataset.column_values(idx).collect();
    Ok(match order {
        SortOrder::Ascending => sorted_indices(len, |a, b| keys[a] <= keys[b]),
        SortOrder::Descending => sorted_indices(len, |a, b| keys[a] >= keys[b]),
    })
}

/// Return a new dataset sorted by `column`. The input is left untouched.
pub fn sort_dataset(schema: &Schema, dataset: &Dataset, column: &str, order: SortOrder) -> Result<Dataset> {
    let idx = schema.column_index(column)?;
    let rows = dataset.rows();
    Ok(sort_indices(schema, dataset, idx, order)?
        .into_iter()
        .filter_map(|i| rows.get(i).cloned())
        .collect())
}
