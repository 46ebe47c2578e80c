//! Per-port table construction.
//!
//! A port table pairs a port's timestamp and value columns into a two-column
//! Arrow `RecordBatch` (`ts`, `<value name>`) sorted ascending by `ts`.
//! Recorders append in arrival order, so the on-disk columns are usually
//! sorted already; in that case the mapped columns are used as-is and no
//! rows are copied.

use std::{fs, io, path::Path, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, RecordBatch, TimestampNanosecondArray, UInt64Array},
    compute::{self, take_record_batch},
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    error::ArrowError,
};
use chrono::{DateTime, Utc};
use log::debug;
use snafu::prelude::*;

use crate::{
    column::{self, ColumnError},
    layout::DataDir,
};

/// Name of the timestamp column in every table this crate produces.
pub const TS_COLUMN: &str = "ts";

/// Errors raised while building a single port's table.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PortTableError {
    /// The port's count file does not exist.
    #[snafu(display("Count file not found: {path}"))]
    CountNotFound {
        /// Path of the missing count file.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Reading the count file failed.
    #[snafu(display("I/O error reading count file {path}: {source}"))]
    CountIo {
        /// Path of the count file.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The count file is not exactly one little-endian `u64`.
    #[snafu(display("Malformed count file {path}: expected 8 bytes, found {len}"))]
    MalformedCount {
        /// Path of the count file.
        path: String,
        /// Number of bytes actually present.
        len: usize,
    },

    /// Loading the timestamp column failed.
    #[snafu(display("Failed to load timestamp column: {source}"))]
    TimestampColumn {
        /// Underlying column error.
        source: ColumnError,
    },

    /// Loading the value column failed.
    #[snafu(display("Failed to load value column: {source}"))]
    ValueColumn {
        /// Underlying column error.
        source: ColumnError,
    },

    /// Assembling or sorting the table failed.
    #[snafu(display("Arrow error while building port table: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

/// One port's `(ts, value)` table, sorted ascending by `ts`.
#[derive(Clone, Debug)]
pub struct PortTable {
    port: String,
    batch: RecordBatch,
    ts: TimestampNanosecondArray,
    values: UInt64Array,
}

impl PortTable {
    fn from_batch(port: &str, batch: RecordBatch) -> Result<Self, ArrowError> {
        let ts = ts_column(&batch).cloned().ok_or_else(missing_ts)?;
        let values = batch
            .column(1)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .cloned()
            .ok_or_else(|| ArrowError::SchemaError("expected a UInt64 value column".into()))?;
        Ok(PortTable {
            port: port.to_string(),
            batch,
            ts,
            values,
        })
    }

    /// Port id this table was read from.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Name given to the value column.
    pub fn value_column_name(&self) -> &str {
        self.batch.schema_ref().field(1).name()
    }

    /// Number of recorded rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// The `ts` column.
    pub fn ts(&self) -> &TimestampNanosecondArray {
        &self.ts
    }

    /// The value column.
    pub fn values(&self) -> &UInt64Array {
        &self.values
    }

    /// Borrow the underlying batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consume the table, returning the underlying batch.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }
}

/// Summary of a port's recorded data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortSummary {
    /// Port id.
    pub port: String,
    /// Recorded row count.
    pub count: u64,
    /// Earliest timestamp, `None` for an empty port.
    pub ts_min: Option<DateTime<Utc>>,
    /// Latest timestamp, `None` for an empty port.
    pub ts_max: Option<DateTime<Utc>>,
}

/// Arrow type of the `ts` column.
pub fn ts_data_type() -> DataType {
    DataType::Timestamp(TimeUnit::Nanosecond, None)
}

/// Schema of a port table whose value column is `value_column_name`.
pub fn port_table_schema(value_column_name: &str) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(TS_COLUMN, ts_data_type(), false),
        Field::new(value_column_name, DataType::UInt64, false),
    ]))
}

/// Read the record count stored in a port's count file.
pub fn read_count(path: &Path) -> Result<u64, PortTableError> {
    let path_str = || path.display().to_string();
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PortTableError::CountNotFound {
                path: path_str(),
                source,
            }
        } else {
            PortTableError::CountIo {
                path: path_str(),
                source,
            }
        }
    })?;

    let raw: [u8; 8] = bytes
        .as_slice()
        .try_into()
        .ok()
        .context(MalformedCountSnafu {
            path: path_str(),
            len: bytes.len(),
        })?;
    Ok(u64::from_le_bytes(raw))
}

/// Build the sorted table for `port_id` from the files in `data_dir`.
///
/// Every call re-reads the port's files; nothing is cached.
pub fn build_port_table(
    port_id: &str,
    value_column_name: &str,
    data_dir: &DataDir,
) -> Result<PortTable, PortTableError> {
    let files = data_dir.port_files(port_id);
    let count = read_count(&files.count)?;

    let ts = column::load_timestamp_column(count, &files.ts).context(TimestampColumnSnafu)?;
    let values = column::load_u64_column(count, &files.val).context(ValueColumnSnafu)?;

    let batch = RecordBatch::try_new(
        port_table_schema(value_column_name),
        vec![Arc::new(ts) as ArrayRef, Arc::new(values)],
    )
    .context(ArrowSnafu)?;
    let batch = sort_by_ts(batch).context(ArrowSnafu)?;

    debug!(
        "loaded port {port_id} as column {value_column_name}: {count} rows from {}",
        data_dir.path().display()
    );

    PortTable::from_batch(port_id, batch).context(ArrowSnafu)
}

/// Summarise `port_id` without loading its value column.
pub fn describe_port(port_id: &str, data_dir: &DataDir) -> Result<PortSummary, PortTableError> {
    let files = data_dir.port_files(port_id);
    let count = read_count(&files.count)?;
    let ts = column::load_timestamp_column(count, &files.ts).context(TimestampColumnSnafu)?;

    Ok(PortSummary {
        port: port_id.to_string(),
        count,
        ts_min: compute::min(&ts).map(DateTime::<Utc>::from_timestamp_nanos),
        ts_max: compute::max(&ts).map(DateTime::<Utc>::from_timestamp_nanos),
    })
}

pub(crate) fn ts_column(batch: &RecordBatch) -> Option<&TimestampNanosecondArray> {
    batch
        .column_by_name(TS_COLUMN)?
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
}

fn missing_ts() -> ArrowError {
    ArrowError::SchemaError(format!(
        "expected a Timestamp(Nanosecond) column named {TS_COLUMN}"
    ))
}

/// Sort `batch` ascending by its `ts` column.
///
/// The sort is stable, so rows sharing a timestamp keep their relative order.
/// A batch that is already sorted is returned without copying.
pub(crate) fn sort_by_ts(batch: RecordBatch) -> Result<RecordBatch, ArrowError> {
    let ts = ts_column(&batch).ok_or_else(missing_ts)?;
    if ts.null_count() > 0 {
        return Err(ArrowError::InvalidArgumentError(format!(
            "{TS_COLUMN} column contains nulls"
        )));
    }

    let values = ts.values();
    if values.windows(2).all(|w| w[0] <= w[1]) {
        return Ok(batch);
    }

    let mut indices: Vec<u64> = (0..values.len() as u64).collect();
    indices.sort_by_key(|&i| values[i as usize]);
    take_record_batch(&batch, &UInt64Array::from(indices))
}
