use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::model::{field, Dataset, Row, Schema};

/// Cell values treated as missing by [`extract_raw_csv`].
const MISSING_MARKERS: [&str; 2] = ["", "NA"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by one row per penguin
/// * `.json`    – `[{ "species": "Adelie", ... }, ...]` or `[["Adelie", ...], ...]`
/// * `.parquet` – one column per schema column, any scalar type
pub fn load_file(path: &Path, schema: &Schema) -> Result<Dataset> {
    let dataset = match extension(path).as_str() {
        "csv" => load_csv(path, schema),
        "json" => load_json(path, schema),
        "parquet" | "pq" => load_parquet(path, schema),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    info!("loaded {} rows from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Persist a dataset. The format is chosen by extension as in [`load_file`].
pub fn save_file(path: &Path, schema: &Schema, dataset: &Dataset) -> Result<()> {
    match extension(path).as_str() {
        "csv" => save_csv(path, schema, dataset),
        "json" => save_json(path, schema, dataset),
        "parquet" | "pq" => save_parquet(path, schema, dataset),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    info!("saved {} rows to {}", dataset.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// The header row is skipped. A header that differs from the schema is only
/// warned about; rows are taken positionally.
fn load_csv(path: &Path, schema: &Schema) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.iter().map(String::as_str).ne(schema.column_names()) {
        warn!(
            "{}: header {:?} does not match schema {:?}",
            path.display(),
            headers,
            schema.column_names()
        );
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != schema.width() {
            warn!(
                "CSV row {row_no}: {} fields, schema has {}",
                record.len(),
                schema.width()
            );
        }
        rows.push(record.iter().map(str::to_string).collect::<Row>());
    }
    Ok(Dataset::from_rows(rows))
}

fn save_csv(path: &Path, schema: &Schema, dataset: &Dataset) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("creating CSV")?;
    writer
        .write_record(schema.column_names())
        .context("writing CSV header")?;
    for (row_no, row) in dataset.iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Project a wide raw CSV onto `schema`.
///
/// Columns are matched by header name. Any row with an empty or `NA` value in
/// a projected column is dropped.
pub fn extract_raw_csv(path: &Path, schema: &Schema) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening raw CSV")?;
    let headers = reader.headers().context("reading raw CSV headers")?.clone();

    let positions = schema
        .column_names()
        .into_iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("raw CSV missing '{name}' column"))
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("raw CSV row {row_no}"))?;
        let projected: Row = positions
            .iter()
            .map(|&p| record.get(p).unwrap_or("").to_string())
            .collect();
        if projected.iter().any(|v| MISSING_MARKERS.contains(&v.as_str())) {
            dropped += 1;
            continue;
        }
        rows.push(projected);
    }
    info!(
        "extracted {} rows from {} ({dropped} incomplete rows dropped)",
        rows.len(),
        path.display()
    );
    Ok(Dataset::from_rows(rows))
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Accepted JSON layouts (top-level array):
///
/// ```json
/// [
///   { "species": "Adelie", "flipper_length_mm": 181, ... },
///   ["Gentoo", "217", "50.3", "19.0", "5000", "Biscoe", "M"]
/// ]
/// ```
fn load_json(path: &Path, schema: &Schema) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let row: Row = match rec {
            JsonValue::Array(cells) => cells.iter().map(json_to_cell).collect(),
            JsonValue::Object(obj) => schema
                .column_names()
                .into_iter()
                .map(|name| obj.get(name).map(json_to_cell).unwrap_or_default())
                .collect(),
            _ => bail!("Row {i} is neither a JSON array nor an object"),
        };
        rows.push(row);
    }
    Ok(Dataset::from_rows(rows))
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn save_json(path: &Path, schema: &Schema, dataset: &Dataset) -> Result<()> {
    let names = schema.column_names();
    let records: Vec<JsonValue> = dataset
        .iter()
        .map(|row| {
            let obj: Map<String, JsonValue> = names
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.to_string(), JsonValue::String(field(row, idx).to_string())))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    let file = File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(file, &records).context("writing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Columns are located by schema name; every cell is rendered to text and
/// nulls become empty strings.
fn load_parquet(path: &Path, schema: &Schema) -> Result<Dataset> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_schema = batch.schema();

        let columns: HashMap<&str, &ArrayRef> = schema
            .column_names()
            .into_iter()
            .filter_map(|name| {
                let idx = batch_schema.index_of(name).ok()?;
                Some((name, batch.column(idx)))
            })
            .collect();
        if columns.len() != schema.width() {
            warn!(
                "{}: only {} of {} schema columns present",
                path.display(),
                columns.len(),
                schema.width()
            );
        }

        for row in 0..batch.num_rows() {
            let cells = schema
                .column_names()
                .into_iter()
                .map(|name| match columns.get(name) {
                    Some(col) => cell_to_string(col, row),
                    None => Ok(String::new()),
                })
                .collect::<Result<Row>>()
                .with_context(|| format!("Row {row}: failed to read cell"))?;
            rows.push(cells);
        }
    }
    Ok(Dataset::from_rows(rows))
}

fn cell_to_string(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    Ok(array_value_to_string(col, row)?)
}

fn save_parquet(path: &Path, schema: &Schema, dataset: &Dataset) -> Result<()> {
    let arrow_schema = Arc::new(ArrowSchema::new(
        schema
            .column_names()
            .into_iter()
            .map(|name| Field::new(name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    ));

    let arrays: Vec<ArrayRef> = (0..schema.width())
        .map(|idx| {
            let values: Vec<&str> = dataset.column_values(idx).collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(arrow_schema.clone(), arrays)
        .context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, arrow_schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
