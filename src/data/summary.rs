//! Read-only summaries of a single dataset: numeric description, value
//! counts, and the prepared series that charts are drawn from.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{EngineError, Result};

use super::model::{field, parse_finite, Dataset, Schema};

// ---------------------------------------------------------------------------
// Describe
// ---------------------------------------------------------------------------

/// Minimum, maximum and arithmetic mean of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Description {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Description {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Description { min, max, mean })
    }
}

/// Describe a numeric column.
///
/// Cells that do not parse, and `nan` or infinite cells, are skipped.
/// Returns `Ok(None)` when no cell is left.
pub fn describe(schema: &Schema, dataset: &Dataset, column: &str) -> Result<Option<Description>> {
    let idx = schema.numeric_index(column)?;
    Ok(Description::from_values(&dataset.numeric_values(idx)))
}

// ---------------------------------------------------------------------------
// Unique
// ---------------------------------------------------------------------------

/// Count occurrences of each distinct raw value, keyed in first-seen order.
pub fn unique_counts(schema: &Schema, dataset: &Dataset, column: &str) -> Result<IndexMap<String, usize>> {
    let idx = schema.column_index(column)?;
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for value in dataset.column_values(idx) {
        match counts.get_mut(value) {
            Some(n) => *n += 1,
            None => {
                counts.insert(value.to_string(), 1);
            }
        }
    }
    Ok(counts)
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

/// Paired values of two numeric columns.
///
/// Rows where either cell is unparsable or non-finite are dropped.
pub fn scatter_points(
    schema: &Schema,
    dataset: &Dataset,
    x_column: &str,
    y_column: &str,
) -> Result<Vec<(f64, f64)>> {
    let x_idx = schema.column_index(x_column)?;
    let y_idx = schema.column_index(y_column)?;
    schema.numeric_index(x_column)?;
    schema.numeric_index(y_column)?;

    Ok(dataset
        .iter()
        .filter_map(|row| {
            let x = parse_finite(field(row, x_idx))?;
            let y = parse_finite(field(row, y_idx))?;
            Some((x, y))
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Largest bin count a histogram may be asked for.
pub const MAX_BINS: usize = 10_000;

/// Equal-width bin edges and per-bin counts.
///
/// `edges` has one more entry than `counts`. Every bin is half-open except
/// the last, which also includes the maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        let desc = Description::from_values(values)?;
        // Divide before subtracting so extreme ranges stay finite.
        let width = desc.max / bins as f64 - desc.min / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| desc.min + width * i as f64).collect();

        let mut counts = vec![0usize; bins];
        for &v in values {
            let slot = if width > 0.0 {
                (((v - desc.min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            if let Some(c) = counts.get_mut(slot) {
                *c += 1;
            }
        }
        Some(Histogram { edges, counts })
    }

    /// Total number of values binned.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Bin a numeric column into `bins` equal-width buckets.
///
/// Unparsable and non-finite cells are skipped; `Ok(None)` when nothing is left.
/// `bins` must lie in `1..=MAX_BINS`.
pub fn histogram(schema: &Schema, dataset: &Dataset, column: &str, bins: usize) -> Result<Option<Histogram>> {
    let idx = schema.numeric_index(column)?;
    if bins == 0 {
        return Err(EngineError::InvalidNumber(
            "Bin count must be a positive integer.".to_string(),
        ));
    }
    if bins > MAX_BINS {
        return Err(EngineError::InvalidNumber(format!(
            "Bin count must be at most {MAX_BINS}, got {bins}."
        )));
    }
    Ok(Histogram::from_values(&dataset.numeric_values(idx), bins))
}

// ---------------------------------------------------------------------------
// Boxplot
// ---------------------------------------------------------------------------

/// Five-number summary of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linear interpolation between closest ranks on sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(BoxStats {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Values of one group in a boxplot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub values: Vec<f64>,
    pub stats: BoxStats,
}

/// Group the numeric `value_column` by the raw value of `group_column`.
///
/// Groups appear in first-seen order. Rows whose value cell is not a finite number
/// are skipped, so a group only exists if it has at least one value.
pub fn boxplot_groups(
    schema: &Schema,
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
) -> Result<IndexMap<String, BoxGroup>> {
    let group_idx = schema.column_index(group_column)?;
    let value_idx = schema.numeric_index(value_column)?;

    let mut grouped: IndexMap<String, Vec<f64>> = IndexMap::new();
    for row in dataset {
        let Some(v) = parse_finite(field(row, value_idx)) else {
            continue;
        };
        grouped
            .entry(field(row, group_idx).to_string())
            .or_default()
            .push(v);
    }

    Ok(grouped
        .into_iter()
        .filter_map(|(label, values)| {
            let stats = BoxStats::from_values(&values)?;
            Some((label, BoxGroup { values, stats }))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{row, sample};

    fn masses() -> Dataset {
        Dataset::from_rows(vec![
            row(&["A", "10", "0", "0", "100", "I", "M"]),
            row(&["B", "11", "0", "0", "200", "I", "F"]),
            row(&["C", "12", "0", "0", "300", "I", "M"]),
        ])
    }

    #[test]
    fn describe_numeric_column() {
        let schema = Schema::penguins();
        let d = describe(&schema, &masses(), "body_mass_g").unwrap().unwrap();
        assert_eq!(d.min, 100.0);
        assert_eq!(d.max, 300.0);
        assert!((d.mean - 200.0).abs() < 1e-9);
    }

    #[test]
    fn describe_skips_bad_cells() {
        let schema = Schema::penguins();
        let mut rows = masses().into_rows();
        rows.push(row(&["D", "13", "0", "0", "NA", "I", "F"]));
        let d = describe(&schema, &Dataset::from_rows(rows), "body_mass_g")
            .unwrap()
            .unwrap();
        assert_eq!((d.min, d.max), (100.0, 300.0));
        assert!(d.mean >= d.min && d.mean <= d.max);
    }

    #[test]
    fn describe_ignores_non_finite_cells() {
        let schema = Schema::penguins();
        let ds = Dataset::from_rows(vec![
            row(&["A", "10", "0", "0", "100", "I", "M"]),
            row(&["B", "11", "0", "0", "nan", "I", "F"]),
            row(&["C", "12", "0", "0", "inf", "I", "M"]),
        ]);
        let d = describe(&schema, &ds, "body_mass_g").unwrap().unwrap();
        assert_eq!((d.min, d.max, d.mean), (100.0, 100.0, 100.0));
        assert!(d.mean >= d.min && d.mean <= d.max);
    }

    #[test]
    fn describe_with_nothing_parseable_is_absent() {
        let schema = Schema::penguins();
        let ds = Dataset::from_rows(vec![
            row(&["A", "x", "0", "0", "NA", "I", "M"]),
            row(&["B", "y", "0", "0", "NA", "I", "F"]),
        ]);
        assert_eq!(describe(&schema, &ds, "body_mass_g").unwrap(), None);
        assert_eq!(describe(&schema, &Dataset::default(), "body_mass_g").unwrap(), None);
    }

    #[test]
    fn describe_rejects_categorical_and_unknown() {
        let schema = Schema::penguins();
        assert!(matches!(
            describe(&schema, &masses(), "species"),
            Err(EngineError::NotNumericColumn(_))
        ));
        assert!(matches!(
            describe(&schema, &masses(), "nope"),
            Err(EngineError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn unique_counts_in_first_seen_order() {
        let schema = Schema::penguins();
        let ds = sample();
        let counts = unique_counts(&schema, &ds, "species").unwrap();
        let pairs: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(pairs, vec![("Adelie", 2), ("Chinstrap", 1), ("Gentoo", 1)]);
        assert_eq!(counts.values().sum::<usize>(), ds.len());
    }

    #[test]
    fn unique_counts_numeric_column_uses_raw_text() {
        let schema = Schema::penguins();
        let ds = Dataset::from_rows(vec![
            row(&["A", "181"]),
            row(&["A", "181.0"]),
            row(&["A", "181"]),
        ]);
        let counts = unique_counts(&schema, &ds, "flipper_length_mm").unwrap();
        assert_eq!(counts.get("181"), Some(&2));
        assert_eq!(counts.get("181.0"), Some(&1));
    }

    #[test]
    fn scatter_skips_incomplete_pairs() {
        let schema = Schema::penguins();
        let mut rows = sample().into_rows();
        rows.push(row(&["Adelie", "NA", "39.1", "18.1", "3750", "Torgersen", "F"]));
        let pts = scatter_points(&schema, &Dataset::from_rows(rows), "flipper_length_mm", "body_mass_g").unwrap();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], (181.0, 3750.0));

        assert!(matches!(
            scatter_points(&schema, &sample(), "species", "body_mass_g"),
            Err(EngineError::NotNumericColumn(_))
        ));
        assert!(matches!(
            scatter_points(&schema, &sample(), "body_mass_g", "nope"),
            Err(EngineError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn histogram_bins_cover_every_value() {
        let schema = Schema::penguins();
        let h = histogram(&schema, &sample(), "body_mass_g", 5).unwrap().unwrap();
        assert_eq!(h.edges.len(), 6);
        assert_eq!(h.edges[0], 3750.0);
        assert_eq!(h.edges[5], 5000.0);
        // 3750, 3800 in the first bin (width 250); 4000 in the second; 5000 in the last.
        assert_eq!(h.counts, vec![2, 1, 0, 0, 1]);
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn histogram_of_constant_column() {
        let schema = Schema::penguins();
        let h = histogram(&schema, &masses(), "culmen_depth_mm", 3).unwrap().unwrap();
        assert_eq!(h.counts, vec![3, 0, 0]);
    }

    #[test]
    fn histogram_requires_bins() {
        let schema = Schema::penguins();
        assert!(matches!(
            histogram(&schema, &sample(), "body_mass_g", 0),
            Err(EngineError::InvalidNumber(_))
        ));
    }

    #[test]
    fn histogram_caps_bin_count() {
        let schema = Schema::penguins();
        let h = histogram(&schema, &sample(), "body_mass_g", MAX_BINS).unwrap().unwrap();
        assert_eq!(h.counts.len(), MAX_BINS);
        assert_eq!(h.total(), 4);
        for bins in [MAX_BINS + 1, usize::MAX] {
            assert!(matches!(
                histogram(&schema, &sample(), "body_mass_g", bins),
                Err(EngineError::InvalidNumber(_))
            ));
        }
    }

    #[test]
    fn boxplot_groups_by_label() {
        let schema = Schema::penguins();
        let groups = boxplot_groups(&schema, &sample(), "species", "body_mass_g").unwrap();
        let labels: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["Adelie", "Chinstrap", "Gentoo"]);

        let adelie = &groups["Adelie"];
        assert_eq!(adelie.values, vec![3750.0, 4000.0]);
        assert_eq!(adelie.stats.median, 3875.0);
        assert_eq!(adelie.stats.q1, 3812.5);
        assert_eq!(adelie.stats.max, 4000.0);

        assert!(matches!(
            boxplot_groups(&schema, &sample(), "species", "island"),
            Err(EngineError::NotNumericColumn(_))
        ));
    }

    #[test]
    fn box_stats_of_odd_count() {
        let s = BoxStats::from_values(&[5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!(s, BoxStats { min: 1.0, q1: 2.0, median: 3.0, q3: 4.0, max: 5.0 });
        assert!(BoxStats::from_values(&[]).is_none());
    }
}
