use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array,
    Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::derive::apply_derivations;
use super::model::{Dataset, Record, Value};
use super::profile::Profile;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// A loaded and derived dataset together with its detected profile.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub dataset: Dataset,
    pub profile: Profile,
}

/// Load, detect the deployment variant, and run derivations. Any failure is
/// fatal for this load; nothing partial is returned.
pub fn ingest(path: &Path) -> Result<LoadedSource> {
    let records = load_records(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let raw = Dataset::from_records(records);

    let profile = Profile::detect(&raw).with_context(|| {
        format!(
            "{}: columns {:?} match neither the sales nor the biomarker schema",
            path.display(),
            raw.column_names
        )
    })?;

    let mut records = raw.records;
    apply_derivations(&mut records, &profile.derivations)
        .with_context(|| format!("deriving columns for {}", path.display()))?;
    let dataset = Dataset::from_records(records);

    log::info!(
        "Loaded {} records ({} profile) from {}",
        dataset.len(),
        profile.name,
        path.display()
    );
    Ok(LoadedSource { dataset, profile })
}

/// Read raw records from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat Parquet file, one record per row
/// * `.json`    – records-oriented array: `[{ "col": value, ... }, ...]`
/// * `.csv`     – header row with column names, per-cell type guessing
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Source cache – load once, reuse until the file changes on disk
// ---------------------------------------------------------------------------

/// Process-scoped handle over the loaded source. A repeat request for the
/// same path with an unchanged mtime is served from memory; a changed mtime
/// invalidates and reloads.
#[derive(Default)]
pub struct SourceCache {
    entry: Option<CacheEntry>,
}

struct CacheEntry {
    path: PathBuf,
    modified: Option<SystemTime>,
    source: Arc<LoadedSource>,
}

impl SourceCache {
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<LoadedSource>> {
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        if let Some(entry) = &self.entry {
            if entry.path == path && modified.is_some() && entry.modified == modified {
                log::debug!("source cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.source));
            }
        }

        let source = Arc::new(ingest(path)?);
        self.entry = Some(CacheEntry {
            path: path.to_path_buf(),
            modified,
            source: Arc::clone(&source),
        });
        Ok(source)
    }

    /// Path of the currently cached source, if any.
    pub fn path(&self) -> Option<&Path> {
        self.entry.as_ref().map(|e| e.path.as_path())
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "City": "Yangon", "Total": 522.83, "Rating": 9.1 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut values = BTreeMap::new();
        for (key, val) in obj {
            values.insert(key.clone(), json_to_value(val));
        }
        records.push(Record { values });
    }
    Ok(records)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; every cell is typed by guessing
/// (integer, then float, then bool, otherwise string; empty = null).
fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut values = BTreeMap::new();
        for (col_idx, cell) in row.iter().enumerate() {
            let Some(col_name) = headers.get(col_idx) else {
                bail!("CSV row {row_no} has more cells than the header");
            };
            values.insert(col_name.clone(), guess_value_type(cell));
        }
        records.push(Record { values });
    }
    Ok(records)
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file: every column becomes a record field. Works with
/// files written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let mut values = BTreeMap::new();
            for (col_idx, col_name) in &columns {
                let col_array = batch.column(*col_idx);
                values.insert(col_name.clone(), extract_value(col_array, row));
            }
            records.push(Record { values });
        }
    }
    Ok(records)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                Value::String(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                Value::String(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Value::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            Value::Bool(arr.value(row))
        }
        DataType::Date32 => {
            let arr = col.as_any().downcast_ref::<Date32Array>().unwrap();
            let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let date = epoch + chrono::Duration::days(arr.value(row) as i64);
            Value::Date(date.to_string())
        }
        _ => Value::String(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const BIOMARKER_CSV: &str = "\
subj_id,grp,sex,age,ptau217,nfl,gfap
1,AD,1,72,1.8,30.5,210.0
2,CU,2,66,0.4,18.2,120.0
3,MCI,2,70,,22.0,150.0
";

    #[test]
    fn csv_cells_are_type_guessed() {
        let path = write_temp("tabdash_loader_types.csv", BIOMARKER_CSV);
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("subj_id"), Some(&Value::Integer(1)));
        assert_eq!(records[0].get("grp"), Some(&Value::String("AD".into())));
        assert_eq!(records[0].get("ptau217"), Some(&Value::Float(1.8)));
        assert_eq!(records[2].get("ptau217"), Some(&Value::Null));
    }

    #[test]
    fn ingest_detects_profile_and_derives_columns() {
        let path = write_temp("tabdash_loader_ingest.csv", BIOMARKER_CSV);
        let loaded = ingest(&path).unwrap();
        assert_eq!(loaded.profile.name, "Biomarkers");
        assert_eq!(
            loaded.dataset.records[0].get("sex_bin"),
            Some(&Value::String("Male".into()))
        );
        assert_eq!(
            loaded.dataset.records[1].get("sex_bin"),
            Some(&Value::String("Female".into()))
        );
    }

    #[test]
    fn unknown_schema_is_a_load_error() {
        let path = write_temp("tabdash_loader_unknown.csv", "foo,bar\n1,2\n");
        let err = ingest(&path).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_records(Path::new("data.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn cache_serves_unchanged_source_from_memory() {
        let path = write_temp("tabdash_loader_cache.csv", BIOMARKER_CSV);
        let mut cache = SourceCache::default();
        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.invalidate();
        let third = cache.get_or_load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
