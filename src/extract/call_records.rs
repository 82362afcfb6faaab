//! Reader for the calls-for-service parquet export.
//!
//! Every column is cast to text before parsing: depending on the export,
//! timestamps arrive as `MM/DD/YYYY hh:mm:ss AM` strings or as native
//! timestamps, and `District` as an integer, a float, or a string.

use anyhow::{Context, Result};
use arrow::array::{Array as _, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::period::parse_timestamp;

pub const TIME_CREATE: &str = "TimeCreate";
pub const TIME_DISPATCH: &str = "TimeDispatch";
pub const TIME_ARRIVE: &str = "TimeArrive";
pub const PRIORITY: &str = "Priority";
pub const DISTRICT: &str = "District";
pub const TYPE_TEXT: &str = "TypeText";

const REQUIRED: &[&str] = &[TIME_CREATE, TIME_DISPATCH, TIME_ARRIVE];
const OPTIONAL: &[&str] = &[PRIORITY, DISTRICT, TYPE_TEXT];

/// One call for service, with every field parsed or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRecord {
    pub created: Option<NaiveDateTime>,
    pub dispatched: Option<NaiveDateTime>,
    pub arrived: Option<NaiveDateTime>,
    pub priority: Option<String>,
    pub district: Option<i64>,
    pub type_text: Option<String>,
}

/// Reads every call record from a parquet file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded, or if one of
/// the timestamp columns is missing.
pub fn read_call_records(path: &Path) -> Result<Vec<CallRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("failed to read parquet metadata from {}", path.display()))?;

    let schema = builder.schema().clone();
    for column in REQUIRED {
        if schema.field_with_name(column).is_err() {
            anyhow::bail!("required column '{column}' missing from {}", path.display());
        }
    }
    let wanted: Vec<usize> = REQUIRED
        .iter()
        .chain(OPTIONAL)
        .filter_map(|name| schema.index_of(name).ok())
        .collect();
    let mask = ProjectionMask::roots(builder.parquet_schema(), wanted);

    let reader = builder
        .with_projection(mask)
        .build()
        .context("failed to build parquet reader")?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.context("failed to read parquet batch")?;
        records.extend(records_from_batch(&batch)?);
    }

    debug!(records = records.len(), path = %path.display(), "Call records loaded");
    Ok(records)
}

/// Decodes one record batch. Missing optional columns yield `None` fields.
///
/// # Errors
///
/// Returns an error if a present column cannot be cast to text.
pub fn records_from_batch(batch: &RecordBatch) -> Result<Vec<CallRecord>> {
    let created = text_column(batch, TIME_CREATE)?;
    let dispatched = text_column(batch, TIME_DISPATCH)?;
    let arrived = text_column(batch, TIME_ARRIVE)?;
    let priority = text_column(batch, PRIORITY)?;
    let district = text_column(batch, DISTRICT)?;
    let type_text = text_column(batch, TYPE_TEXT)?;

    Ok((0..batch.num_rows())
        .map(|row| CallRecord {
            created: value_at(&created, row).and_then(parse_timestamp),
            dispatched: value_at(&dispatched, row).and_then(parse_timestamp),
            arrived: value_at(&arrived, row).and_then(parse_timestamp),
            priority: value_at(&priority, row).and_then(non_empty),
            district: value_at(&district, row).and_then(parse_district),
            type_text: value_at(&type_text, row).and_then(non_empty),
        })
        .collect())
}

fn text_column(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>> {
    let Ok(idx) = batch.schema().index_of(name) else {
        return Ok(None);
    };
    let as_text = cast(batch.column(idx).as_ref(), &DataType::Utf8)
        .with_context(|| format!("column '{name}' cannot be read as text"))?;
    let strings = as_text
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .with_context(|| format!("column '{name}' did not cast to a string array"))?;
    Ok(Some(strings))
}

fn value_at(column: &Option<StringArray>, row: usize) -> Option<&str> {
    column
        .as_ref()
        .filter(|array| array.is_valid(row))
        .map(|array| array.value(row))
}

fn non_empty(raw: &str) -> Option<String> {
    let s = raw.trim();
    (!s.is_empty() && s != "None").then(|| s.to_string())
}

fn parse_district(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn batch(district: ArrayRef) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new(TIME_CREATE, DataType::Utf8, true),
            Field::new(TIME_DISPATCH, DataType::Utf8, true),
            Field::new(TIME_ARRIVE, DataType::Utf8, true),
            Field::new(PRIORITY, DataType::Utf8, true),
            Field::new(DISTRICT, district.data_type().clone(), true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![
                    Some("01/05/2020 10:00:00 PM"),
                    Some("None"),
                ])),
                Arc::new(StringArray::from(vec![Some("01/05/2020 10:02:00 PM"), None])),
                Arc::new(StringArray::from(vec![Some("01/05/2020 10:12:30 PM"), None])),
                Arc::new(StringArray::from(vec![Some(" 2A "), Some("")])),
                district,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_records_from_batch_parses_fields() {
        let records =
            records_from_batch(&batch(Arc::new(Int64Array::from(vec![Some(3), None])))).unwrap();

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.created.unwrap().to_string(), "2020-01-05 22:00:00");
        assert_eq!(first.arrived.unwrap().to_string(), "2020-01-05 22:12:30");
        assert_eq!(first.priority.as_deref(), Some("2A"));
        assert_eq!(first.district, Some(3));
        assert_eq!(first.type_text, None);

        assert_eq!(records[1], CallRecord::default());
    }

    #[test]
    fn test_string_district_column() {
        let records = records_from_batch(&batch(Arc::new(StringArray::from(vec![
            Some("7.0"),
            Some("x"),
        ]))))
        .unwrap();

        assert_eq!(records[0].district, Some(7));
        assert_eq!(records[1].district, None);
    }

    #[test]
    fn test_read_call_records_round_trips_through_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.parquet");
        let data = batch(Arc::new(Int64Array::from(vec![Some(1), Some(2)])));

        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, data.schema(), None).unwrap();
        writer.write(&data).unwrap();
        writer.close().unwrap();

        let records = read_call_records(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].district, Some(1));
    }

    #[test]
    fn test_missing_timestamp_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new(PRIORITY, DataType::Utf8, true)]));
        let data = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec![Some("1A")]))],
        )
        .unwrap();

        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&data).unwrap();
        writer.close().unwrap();

        assert!(read_call_records(&path).is_err());
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.parquet");
        std::fs::write(&path, b"not parquet").unwrap();

        assert!(read_call_records(&path).is_err());
    }
}
