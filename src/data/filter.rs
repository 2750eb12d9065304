use crate::error::{EngineError, Result};

use super::model::{field, parse_numeric, Dataset, Row, Schema};

// ---------------------------------------------------------------------------
// Filter predicate: threshold on numeric columns, substring on text columns
// ---------------------------------------------------------------------------

/// What a resolved filter tests each row against.
#[derive(Debug, Clone, PartialEq)]
enum Predicate<'a> {
    /// Keep rows whose value is strictly greater than the threshold.
    GreaterThan(f64),
    /// Keep rows whose value contains the text (case-sensitive).
    Contains(&'a str),
}

fn resolve<'a>(schema: &Schema, column: &str, value: &'a str) -> Result<(usize, Predicate<'a>)> {
    let idx = schema.column_index(column)?;
    if !schema.is_numeric(idx) {
        return Ok((idx, Predicate::Contains(value)));
    }
    let threshold = parse_numeric(value).ok_or_else(|| {
        EngineError::InvalidNumber(format!("'{value}' is not a valid number to filter by."))
    })?;
    Ok((idx, Predicate::GreaterThan(threshold)))
}

/// Return indices of rows that pass the filter on `column`.
///
/// * Numeric column → rows whose value is strictly greater than `value`.
///   A single unparsable cell fails the whole call with `InvalidNumber`.
/// * Categorical column → rows whose value contains `value` as a substring.
pub fn filtered_indices(
    schema: &Schema,
    dataset: &Dataset,
    column: &str,
    value: &str,
) -> Result<Vec<usize>> {
    let (idx, predicate) = resolve(schema, column, value)?;

    let mut matches = Vec::new();
    for (i, row) in dataset.iter().enumerate() {
        let cell = field(row, idx);
        let keep = match predicate {
            Predicate::GreaterThan(threshold) => {
                let v = parse_numeric(cell).ok_or_else(|| {
                    EngineError::InvalidNumber(format!(
                        "Row {i} has a non-numeric '{column}' value: '{cell}'."
                    ))
                })?;
                v > threshold
            }
            Predicate::Contains(needle) => cell.contains(needle),
        };
        if keep {
            matches.push(i);
        }
    }
    Ok(matches)
}

/// Same as [`filtered_indices`] but yields the matching rows themselves,
/// borrowed from `dataset`.
pub fn filter_rows<'d>(
    schema: &Schema,
    dataset: &'d Dataset,
    column: &str,
    value: &str,
) -> Result<Vec<&'d Row>> {
    let rows = dataset.rows();
    Ok(filtered_indices(schema, dataset, column, value)?
        .into_iter()
        .filter_map(|i| rows.get(i))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{row, sample};

    #[test]
    fn categorical_filter_is_substring_match() {
        let schema = Schema::penguins();
        let ds = sample();
        let res = filter_rows(&schema, &ds, "species", "Adelie").unwrap();
        assert_eq!(res.len(), 2);
        assert!(res.iter().all(|r| r[0] == "Adelie"));

        let partial = filtered_indices(&schema, &ds, "island", "isc").unwrap();
        assert_eq!(partial, vec![1, 3]);

        let case_sensitive = filtered_indices(&schema, &ds, "species", "adelie").unwrap();
        assert!(case_sensitive.is_empty());
    }

    #[test]
    fn numeric_filter_is_strictly_greater() {
        let schema = Schema::penguins();
        let ds = sample();
        let res = filter_rows(&schema, &ds, "body_mass_g", "4500").unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0][0], "Gentoo");

        // 4000 itself is excluded.
        let res = filtered_indices(&schema, &ds, "body_mass_g", "3999.5").unwrap();
        assert_eq!(res, vec![2, 3]);
        let res = filtered_indices(&schema, &ds, "body_mass_g", "4000").unwrap();
        assert_eq!(res, vec![3]);
    }

    #[test]
    fn rows_are_borrowed_not_copied() {
        let schema = Schema::penguins();
        let ds = sample();
        let res = filter_rows(&schema, &ds, "species", "Gentoo").unwrap();
        assert!(std::ptr::eq(res[0], &ds.rows()[3]));
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let schema = Schema::penguins();
        let err = filtered_indices(&schema, &sample(), "body_mass_g", "heavy").unwrap_err();
        assert!(matches!(err, EngineError::InvalidNumber(_)));

        // Even on an empty dataset.
        let err = filtered_indices(&schema, &Dataset::default(), "body_mass_g", "x").unwrap_err();
        assert!(matches!(err, EngineError::InvalidNumber(_)));
    }

    #[test]
    fn bad_cell_aborts_numeric_filter() {
        let schema = Schema::penguins();
        let ds = Dataset::from_rows(vec![
            row(&["Adelie", "181", "39.1", "18.1", "5750", "Torgersen", "F"]),
            row(&["Adelie", "181", "39.1", "18.1", "NA", "Torgersen", "F"]),
        ]);
        let err = filtered_indices(&schema, &ds, "body_mass_g", "4000").unwrap_err();
        assert!(matches!(err, EngineError::InvalidNumber(_)));
    }

    #[test]
    fn unknown_column() {
        let schema = Schema::penguins();
        let err = filtered_indices(&schema, &sample(), "unknown_col", "x").unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound(_)));
    }
}
