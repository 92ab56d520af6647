use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::{
    DataType, Int8Type, Int16Type, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use super::model::{
    COL_COUNTY, COL_HUNV, COL_INCOME, COL_LILA, COL_SNAP, COL_STATE, Dataset, TractRecord,
};

/// Columns every dataset file must provide. Others are ignored.
const REQUIRED_COLUMNS: [&str; 6] = [
    COL_STATE, COL_COUNTY, COL_INCOME, COL_LILA, COL_SNAP, COL_HUNV,
];

#[derive(Debug, Error)]
pub enum LoadError {
    /// File missing, unreadable, or not a valid tract dataset.
    #[error("dataset unavailable ({path}): {reason}")]
    DataUnavailable { path: PathBuf, reason: String },
}

// ---------------------------------------------------------------------------
// DatasetCache – load once per path
// ---------------------------------------------------------------------------

/// Memoizes loaded datasets by path. Owned by the application state and
/// never invalidated: datasets are assumed static for the session.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dataset at `path`, reading the file only on first use.
    /// Failures are not cached.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let key = path.to_path_buf();
        if let Some(ds) = self.entries.get(&key) {
            log::debug!("Dataset cache hit for {}", key.display());
            return Ok(Arc::clone(ds));
        }

        match load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} tracts across {} states from {}",
                    dataset.len(),
                    dataset.counties_by_state.len(),
                    path.display()
                );
                let ds = Arc::new(dataset);
                self.entries.insert(key, Arc::clone(&ds));
                Ok(ds)
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                Err(LoadError::DataUnavailable {
                    path: path.to_path_buf(),
                    reason: format!("{e:#}"),
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tract dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – columns named after the tract schema
/// * `.json`    – `[{ "State": ..., "County": ..., ... }, ...]`
/// * `.tsv`     – tab-delimited with a header row
/// * anything else is read as comma-delimited text with a header row
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let tracts = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "tsv" => load_delimited(path, b'\t')?,
        _ => load_delimited(path, b',')?,
    };

    for (row, t) in tracts.iter().enumerate() {
        if let Err(reason) = t.validate() {
            bail!("Row {row}: {reason}");
        }
    }

    Ok(Dataset::from_tracts(tracts))
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<Vec<TractRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening delimited file")?;

    let headers = reader.headers().context("reading headers")?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            bail!("missing '{col}' column");
        }
    }

    reader
        .deserialize::<TractRecord>()
        .enumerate()
        .map(|(row_no, rec)| rec.with_context(|| format!("row {row_no}")))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Vec<TractRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON tract records")
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
///
/// Each row is lifted into a JSON object keyed by column name and then
/// deserialized like the JSON loader, so integral floats and indicator
/// checks behave identically across formats.
fn load_parquet(path: &Path) -> Result<Vec<TractRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut tracts = Vec::new();
    let mut row_base = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns = REQUIRED_COLUMNS
            .iter()
            .map(|name| {
                let idx = schema
                    .index_of(name)
                    .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
                Ok((*name, decode_dictionary(batch.column(idx))?))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let mut obj = Map::new();
            for (name, col) in &columns {
                let value = cell_to_json(col.as_ref(), row)
                    .with_context(|| format!("Row {}: column '{name}'", row_base + row))?;
                obj.insert((*name).to_string(), value);
            }
            let tract: TractRecord = serde_json::from_value(JsonValue::Object(obj))
                .with_context(|| format!("Row {}", row_base + row))?;
            tracts.push(tract);
        }
        row_base += batch.num_rows();
    }

    Ok(tracts)
}

/// Categorical columns arrive dictionary-encoded; unpack them to their values.
fn decode_dictionary(col: &ArrayRef) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::Dictionary(_, values) => arrow::compute::cast(col, values)
            .with_context(|| format!("decoding dictionary column of {values:?}")),
        _ => Ok(ArrayRef::clone(col)),
    }
}

/// Extract a single cell from an Arrow column as JSON.
fn cell_to_json(col: &dyn Array, row: usize) -> Result<JsonValue> {
    if col.is_null(row) {
        bail!("null value");
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            JsonValue::from(arr.value(row))
        }
        DataType::LargeUtf8 => JsonValue::from(col.as_string::<i64>().value(row)),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            JsonValue::from(arr.value(row))
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            JsonValue::from(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            JsonValue::from(f64::from(arr.value(row)))
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            JsonValue::from(arr.value(row))
        }
        DataType::Int8 => JsonValue::from(col.as_primitive::<Int8Type>().value(row)),
        DataType::Int16 => JsonValue::from(col.as_primitive::<Int16Type>().value(row)),
        DataType::UInt8 => JsonValue::from(col.as_primitive::<UInt8Type>().value(row)),
        DataType::UInt16 => JsonValue::from(col.as_primitive::<UInt16Type>().value(row)),
        DataType::UInt32 => JsonValue::from(col.as_primitive::<UInt32Type>().value(row)),
        DataType::UInt64 => JsonValue::from(col.as_primitive::<UInt64Type>().value(row)),
        DataType::Boolean => JsonValue::from(u8::from(col.as_boolean().value(row))),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}
