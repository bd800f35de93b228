use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, ContainerKind, DataContainer, LabeledTable};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load simulation output into a labeled table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one numeric column per variable
/// * `.json`    – `[{ "time": 0.0, "norm": 1.0, ... }, ...]`
/// * `.parquet` – one numeric column per variable
/// * anything else (`.t`, `.dat`, …) – whitespace-delimited text with a header line
pub fn load_file(path: &Path) -> Result<LabeledTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    info!("Reading from file {}", path.display());
    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        _ => load_text(path),
    }
    .with_context(|| format!("loading {}", path.display()))?;
    debug!("loaded {table}");
    Ok(table)
}

/// Load a file and convert it into the requested container shape.
pub fn load_container(path: &Path, kind: ContainerKind) -> Result<DataContainer> {
    let table = load_file(path)?;
    match kind {
        ContainerKind::Table => info!("Reading labeled table"),
        ContainerKind::Matrix => info!("Reading positional matrix (one row per file column)"),
    }
    Ok(DataContainer::from_table(table, kind))
}

// ---------------------------------------------------------------------------
// Whitespace-delimited text loader
// ---------------------------------------------------------------------------

/// Layout written by the simulation code:
///
/// ```text
/// time    norm    <H>    <x>   <y>   <z>
/// 0.00    1.0   -75.3   0.0   0.0   0.12
/// 0.05    1.0   -75.3   0.0   0.0   0.11
/// ```
///
/// A leading `#` on the header line is ignored; later lines starting with
/// `#` are comments. When the header width does not match the data, columns
/// are labelled positionally (`c0`, `c1`, …).
fn load_text(path: &Path) -> Result<LabeledTable> {
    let text = std::fs::read_to_string(path).context("reading text file")?;
    parse_text(&text)
}

pub(crate) fn parse_text(text: &str) -> Result<LabeledTable> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (_, header_line) = lines.next().context("file is empty")?;
    let mut header: Vec<String> = header_line
        .trim_start_matches('#')
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line_no, line) in lines {
        if line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .enumerate()
            .map(|(j, tok)| {
                tok.parse::<f64>()
                    .with_context(|| format!("line {line_no}, field {j}: '{tok}' is not a number"))
            })
            .collect::<Result<Vec<f64>>>()?;
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                bail!(
                    "line {line_no}: expected {} values, found {}",
                    first.len(),
                    row.len()
                );
            }
        }
        rows.push(row);
    }

    let width = rows.first().map_or(header.len(), Vec::len);
    if header.len() != width {
        warn!(
            "header has {} labels but rows have {width} values, using positional labels",
            header.len()
        );
        header = (0..width).map(|i| format!("c{i}")).collect();
    }

    let columns = header
        .into_iter()
        .enumerate()
        .map(|(j, name)| Column::new(name, rows.iter().map(|r| r[j]).collect()))
        .collect();
    Ok(LabeledTable::new(columns)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "time": 0.0, "norm": 1.0, "<H>": -75.3 },
///   { "time": 0.05, "norm": 1.0, "<H>": -75.2 }
/// ]
/// ```
///
/// Column order follows the keys of the first record. `null` becomes NaN.
fn load_json(path: &Path) -> Result<LabeledTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let names: Vec<String> = match records.first() {
        Some(first) => first
            .as_object()
            .context("Row 0 is not a JSON object")?
            .keys()
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(records.len()); names.len()];
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        if obj.len() != names.len() {
            bail!("Row {i}: expected {} fields, found {}", names.len(), obj.len());
        }
        for (col, name) in values.iter_mut().zip(&names) {
            let v = match obj.get(name) {
                Some(JsonValue::Null) => f64::NAN,
                Some(v) => v
                    .as_f64()
                    .with_context(|| format!("Row {i}, '{name}': not a number"))?,
                None => bail!("Row {i}: missing '{name}'"),
            };
            col.push(v);
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, v)| Column::new(name, v))
        .collect();
    Ok(LabeledTable::new(columns)?)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, numeric cells. Empty cells are NaN.
fn load_csv(path: &Path) -> Result<LabeledTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, cell) in record.iter().enumerate() {
            let cell = cell.trim();
            let v = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().with_context(|| {
                    format!("CSV row {row_no}, '{}': '{cell}' is not a number", headers[col_idx])
                })?
            };
            values[col_idx].push(v);
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, v)| Column::new(name, v))
        .collect();
    Ok(LabeledTable::new(columns)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one numeric column per variable.
///
/// Float64, Float32, Int64 and Int32 columns are read; nulls become NaN.
/// Columns of any other type are skipped with a warning.
fn load_parquet(path: &Path) -> Result<LabeledTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if columns.is_empty() {
            for field in schema.fields() {
                if is_numeric(field.data_type()) {
                    columns.push(Column::new(field.name().clone(), Vec::new()));
                } else {
                    warn!(
                        "skipping parquet column '{}' of type {:?}",
                        field.name(),
                        field.data_type()
                    );
                }
            }
        }

        for column in &mut columns {
            let idx = schema
                .index_of(&column.name)
                .map_err(|_| anyhow::anyhow!("Parquet batch missing '{}' column", column.name))?;
            let values = extract_f64_column(batch.column(idx))
                .with_context(|| format!("reading column '{}'", column.name))?;
            column.values.extend(values);
        }
    }

    Ok(LabeledTable::new(columns)?)
}

// -- Parquet / Arrow helpers --

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

/// Extract a numeric column as `f64`, mapping nulls to NaN.
fn extract_f64_column(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    let any = col.as_any();
    let values = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, |i| i as f64))
            .collect(),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(values)
}
