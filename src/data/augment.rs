//! Growing a dataset with extra rows, either resampled from the existing
//! rows or synthesised inside each column's observed envelope.
//!
//! The synthesiser draws every column independently and uniformly, so it
//! keeps values inside the observed ranges but does not preserve the shape
//! of their distributions or any correlation between columns.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::{EngineError, Result};

use super::model::{field, parse_finite, parse_numeric, Dataset, Row, Schema};

// ---------------------------------------------------------------------------
// AugmentMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentMode {
    /// Resample existing rows uniformly, with replacement.
    Duplicate,
    /// Generate new rows inside the column envelope.
    Create,
}

impl FromStr for AugmentMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "duplicate" => Ok(AugmentMode::Duplicate),
            "create" => Ok(AugmentMode::Create),
            other => Err(EngineError::InvalidOption(format!(
                "Unknown augment option '{other}'. Use 'duplicate' or 'create'."
            ))),
        }
    }
}

impl fmt::Display for AugmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AugmentMode::Duplicate => write!(f, "duplicate"),
            AugmentMode::Create => write!(f, "create"),
        }
    }
}

/// Parse a percentage argument. Any integer is accepted, negative included.
pub fn parse_percent(raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        EngineError::InvalidNumber(format!("'{raw}' is not a valid percentage."))
    })
}

/// Number of rows to add: `floor(len * percent / 100)`, in exact integer arithmetic.
///
/// A zero or negative percentage adds nothing.
pub fn rows_to_add(len: usize, percent: i64) -> usize {
    let Ok(percent) = u128::try_from(percent) else {
        return 0;
    };
    let n = len as u128 * percent / 100;
    usize::try_from(n).unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// ColumnEnvelope
// ---------------------------------------------------------------------------

/// Observed extent of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnEnvelope {
    /// Closed interval of the parseable, finite values.
    Range { min: f64, max: f64 },
    /// Distinct raw values, in first-seen order.
    Values(IndexSet<String>),
}

impl ColumnEnvelope {
    /// Draw one cell uniformly from the envelope.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match self {
            ColumnEnvelope::Range { min, max } => {
                let value = if (max - min).is_finite() {
                    rng.gen_range(*min..=*max)
                } else {
                    // Width overflows f64; interpolate between the bounds instead.
                    let t: f64 = rng.gen();
                    (min * (1.0 - t) + max * t).clamp(*min, *max)
                };
                value.to_string()
            }
            ColumnEnvelope::Values(values) => {
                if values.is_empty() {
                    return String::new();
                }
                let i = rng.gen_range(0..values.len());
                values.get_index(i).cloned().unwrap_or_default()
            }
        }
    }

    /// Whether `raw` lies inside the envelope.
    pub fn contains(&self, raw: &str) -> bool {
        match self {
            ColumnEnvelope::Range { min, max } => {
                parse_numeric(raw).is_some_and(|v| v >= *min && v <= *max)
            }
            ColumnEnvelope::Values(values) => values.contains(raw),
        }
    }
}

/// Per-column envelope of a whole dataset, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    columns: Vec<ColumnEnvelope>,
}

impl Envelope {
    /// Scan `dataset` once and record every column's extent.
    ///
    /// Unparsable and non-finite numeric cells are ignored. A numeric column
    /// with no usable value at all cannot bound synthetic values, which is
    /// reported as `InvalidNumber`.
    pub fn build(schema: &Schema, dataset: &Dataset) -> Result<Self> {
        let columns = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                if schema.is_numeric(idx) {
                    let (min, max) = dataset
                        .column_values(idx)
                        .filter_map(parse_finite)
                        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                            (lo.min(v), hi.max(v))
                        });
                    if min > max {
                        return Err(EngineError::InvalidNumber(format!(
                            "Column '{}' has no numeric values to synthesise from.",
                            column.name
                        )));
                    }
                    Ok(ColumnEnvelope::Range { min, max })
                } else {
                    Ok(ColumnEnvelope::Values(
                        dataset.column_values(idx).map(str::to_string).collect(),
                    ))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Envelope { columns })
    }

    pub fn columns(&self) -> &[ColumnEnvelope] {
        &self.columns
    }

    /// One synthetic row.
    pub fn sample_row<R: Rng + ?Sized>(&self, rng: &mut R) -> Row {
        self.columns.iter().map(|c| c.sample(rng)).collect()
    }

    /// Whether every field of `row` lies inside its column's envelope.
    pub fn contains_row(&self, row: &Row) -> bool {
        self.columns
            .iter()
            .enumerate()
            .all(|(idx, c)| c.contains(field(row, idx)))
    }
}

// ---------------------------------------------------------------------------
// Augmentation
// ---------------------------------------------------------------------------

/// Result of an augmentation: the extended dataset and what was added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Augmentation {
    pub dataset: Dataset,
    pub added: usize,
    pub mode: AugmentMode,
}

/// `count` rows drawn uniformly, with replacement, from `dataset`.
pub fn duplicate_rows<R: Rng + ?Sized>(dataset: &Dataset, count: usize, rng: &mut R) -> Vec<Row> {
    let rows = dataset.rows();
    (0..count).filter_map(|_| rows.choose(rng).cloned()).collect()
}

/// `count` synthetic rows drawn from the envelope of `dataset`.
pub fn synthesize_rows<R: Rng + ?Sized>(
    schema: &Schema,
    dataset: &Dataset,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Row>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let envelope = Envelope::build(schema, dataset)?;
    Ok((0..count).map(|_| envelope.sample_row(rng)).collect())
}

/// Grow `dataset` by `percent` percent of its size.
///
/// Returns a new dataset: the original rows followed by the added ones. The
/// argument itself is never modified.
pub fn augment<R: Rng + ?Sized>(
    schema: &Schema,
    dataset: &Dataset,
    percent: i64,
    mode: AugmentMode,
    rng: &mut R,
) -> Result<Augmentation> {
    let count = rows_to_add(dataset.len(), percent);
    let extra = match mode {
        AugmentMode::Duplicate => duplicate_rows(dataset, count, rng),
        AugmentMode::Create => synthesize_rows(schema, dataset, count, rng)?,
    };
    Ok(Augmentation {
        added: extra.len(),
        dataset: dataset.extended(extra),
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{row, sample};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn percent_to_count_floors() {
        assert_eq!(rows_to_add(4, 50), 2);
        assert_eq!(rows_to_add(4, 30), 1);
        assert_eq!(rows_to_add(29, 100), 29);
        assert_eq!(rows_to_add(7, 0), 0);
        assert_eq!(rows_to_add(3, 250), 7);
        assert_eq!(rows_to_add(0, 90), 0);
        assert_eq!(rows_to_add(4, -5), 0);
        assert_eq!(rows_to_add(4, i64::MIN), 0);
    }

    #[test]
    fn percent_must_be_an_integer() {
        assert_eq!(parse_percent("25"), Ok(25));
        assert_eq!(parse_percent(" 7 "), Ok(7));
        assert_eq!(parse_percent("-5"), Ok(-5));
        for bad in ["abc", "12.5", "1e2", ""] {
            assert!(matches!(parse_percent(bad), Err(EngineError::InvalidNumber(_))));
        }
    }

    #[test]
    fn negative_percent_adds_nothing() {
        let schema = Schema::penguins();
        let ds = sample();
        for mode in [AugmentMode::Duplicate, AugmentMode::Create] {
            let out = augment(&schema, &ds, -5, mode, &mut StdRng::seed_from_u64(5)).unwrap();
            assert_eq!(out.added, 0);
            assert_eq!(out.dataset, ds);
        }
    }

    #[test]
    fn mode_tokens() {
        assert_eq!("duplicate".parse::<AugmentMode>(), Ok(AugmentMode::Duplicate));
        assert_eq!("create".parse::<AugmentMode>(), Ok(AugmentMode::Create));
        assert!(matches!(
            "clone".parse::<AugmentMode>(),
            Err(EngineError::InvalidOption(_))
        ));
    }

    #[test]
    fn duplicate_adds_exact_copies() {
        let schema = Schema::penguins();
        let ds = sample();
        let mut rng = StdRng::seed_from_u64(7);
        let out = augment(&schema, &ds, 75, AugmentMode::Duplicate, &mut rng).unwrap();

        assert_eq!(out.added, 3);
        assert_eq!(out.mode, AugmentMode::Duplicate);
        assert_eq!(out.dataset.len(), 7);
        assert_eq!(&out.dataset.rows()[..4], ds.rows());
        for added in &out.dataset.rows()[4..] {
            assert!(ds.rows().contains(added));
        }
        // Caller's dataset untouched.
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn create_stays_inside_envelope() {
        let schema = Schema::penguins();
        let ds = sample();
        let envelope = Envelope::build(&schema, &ds).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let out = augment(&schema, &ds, 200, AugmentMode::Create, &mut rng).unwrap();

        assert_eq!(out.added, 8);
        assert_eq!(out.dataset.len(), 12);
        for new_row in &out.dataset.rows()[4..] {
            assert_eq!(new_row.len(), schema.width());
            assert!(envelope.contains_row(new_row), "{new_row:?} escaped the envelope");
        }
        assert_eq!(
            envelope.columns()[4],
            ColumnEnvelope::Range { min: 3750.0, max: 5000.0 }
        );
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let schema = Schema::penguins();
        let ds = sample();
        let a = augment(&schema, &ds, 100, AugmentMode::Create, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = augment(&schema, &ds, 100, AugmentMode::Create, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn envelope_ignores_noise_but_needs_some_numbers() {
        let schema = Schema::penguins();
        let mut rows = sample().into_rows();
        rows.push(row(&["Adelie", "NA", "inf", "18.1", "3750", "Dream", "F"]));
        let env = Envelope::build(&schema, &Dataset::from_rows(rows)).unwrap();
        assert_eq!(env.columns()[1], ColumnEnvelope::Range { min: 181.0, max: 217.0 });
        assert_eq!(env.columns()[2], ColumnEnvelope::Range { min: 39.1, max: 50.3 });

        let hollow = Dataset::from_rows(vec![row(&["Adelie", "NA", "1", "1", "1", "Dream", "F"])]);
        assert!(matches!(
            Envelope::build(&schema, &hollow),
            Err(EngineError::InvalidNumber(_))
        ));
    }

    #[test]
    fn create_spans_extreme_ranges() {
        let schema = Schema::penguins();
        let ds = Dataset::from_rows(vec![
            row(&["Adelie", "181", "39.1", "18.1", "-1e308", "Dream", "F"]),
            row(&["Gentoo", "217", "50.3", "19.0", "1e308", "Biscoe", "M"]),
        ]);
        let envelope = Envelope::build(&schema, &ds).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let out = augment(&schema, &ds, 500, AugmentMode::Create, &mut rng).unwrap();

        assert_eq!(out.added, 10);
        for new_row in &out.dataset.rows()[2..] {
            let mass = parse_numeric(&new_row[4]).unwrap();
            assert!(mass.is_finite());
            assert!(envelope.contains_row(new_row), "{new_row:?} escaped the envelope");
        }
    }

    #[test]
    fn zero_rows_requested_skips_envelope() {
        let schema = Schema::penguins();
        let hollow = Dataset::from_rows(vec![row(&["Adelie", "NA", "1", "1", "1", "Dream", "F"])]);
        let out = augment(&schema, &hollow, 50, AugmentMode::Create, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(out.added, 0);
        assert_eq!(out.dataset, hollow);
    }
}
