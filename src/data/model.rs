use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// ColumnKind – how the engine interprets a column's raw text
// ---------------------------------------------------------------------------

/// Type tag of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Cells are parsed to `f64` at the point of numeric use.
    Numeric,
    /// Cells are compared and counted as raw text.
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// One named, typed column of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Column {
            name: name.to_string(),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema – fixed column table shared by every operation
// ---------------------------------------------------------------------------

/// Columns of the penguin measurement table, in storage order.
pub const PENGUIN_COLUMNS: [(&str, ColumnKind); 7] = [
    ("species", ColumnKind::Categorical),
    ("flipper_length_mm", ColumnKind::Numeric),
    ("culmen_length_mm", ColumnKind::Numeric),
    ("culmen_depth_mm", ColumnKind::Numeric),
    ("body_mass_g", ColumnKind::Numeric),
    ("island", ColumnKind::Categorical),
    ("sex", ColumnKind::Categorical),
];

/// Immutable mapping from column name to position and type tag.
///
/// A schema is built once and passed by reference into every operation, so
/// several schemas can coexist in one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Schema { columns }
    }

    /// The 7-column penguin schema.
    pub fn penguins() -> Self {
        Schema::new(
            PENGUIN_COLUMNS
                .iter()
                .map(|&(name, kind)| Column::new(name, kind))
                .collect(),
        )
    }

    /// Position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| EngineError::ColumnNotFound(format!("Column '{name}' does not exist.")))
    }

    /// Whether the column at `position` is numeric. Out-of-range positions are not.
    pub fn is_numeric(&self, position: usize) -> bool {
        self.columns
            .get(position)
            .is_some_and(|c| c.kind == ColumnKind::Numeric)
    }

    /// Resolve `name` and require it to be numeric.
    pub fn numeric_index(&self, name: &str) -> Result<usize> {
        let idx = self.column_index(name)?;
        if !self.is_numeric(idx) {
            return Err(EngineError::NotNumericColumn(format!(
                "Column '{name}' is not numeric."
            )));
        }
        Ok(idx)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns, i.e. the expected width of every row.
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::penguins()
    }
}

// ---------------------------------------------------------------------------
// Row / Dataset – raw text cells, parsed on demand
// ---------------------------------------------------------------------------

/// One record: raw field values in schema order.
pub type Row = Vec<String>;

/// Read field `idx` of `row`. A row shorter than the schema reads as empty.
pub fn field(row: &Row, idx: usize) -> &str {
    row.get(idx).map_or("", String::as_str)
}

/// Parse a raw cell as a float, ignoring surrounding whitespace.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Like [`parse_numeric`], but `nan` and the infinities count as unparsable.
pub fn parse_finite(raw: &str) -> Option<f64> {
    parse_numeric(raw).filter(|v| v.is_finite())
}

/// An ordered sequence of rows.
///
/// Row width is not enforced here; the loader is responsible for producing
/// rows that match the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Dataset { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A new dataset holding these rows followed by `extra`.
    pub fn extended(&self, extra: Vec<Row>) -> Dataset {
        let mut rows = Vec::with_capacity(self.rows.len() + extra.len());
        rows.extend(self.rows.iter().cloned());
        rows.extend(extra);
        Dataset { rows }
    }

    /// Every row's raw value at `idx`, in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| field(row, idx))
    }

    /// Every finite value at `idx`; unparsable, `nan` and infinite cells are skipped.
    pub fn numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column_values(idx).filter_map(parse_finite).collect()
    }
}

impl From<Vec<Row>> for Dataset {
    fn from(rows: Vec<Row>) -> Self {
        Dataset::from_rows(rows)
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Dataset::from_rows(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
