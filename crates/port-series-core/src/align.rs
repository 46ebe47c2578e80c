//! Multi-port alignment onto a shared timeline.
//!
//! [`read_ports_table`] is the main entry point:
//! 1. Build one sorted [`PortTable`] per requested port, in request order.
//! 2. Outer-join the tables on `ts` by exact instant equality. Each distinct
//!    timestamp becomes one output row; a port's column holds its recorded
//!    value at that instant and `0` where the port has no row there. Values
//!    are never interpolated or carried forward.
//! 3. Sort by `ts`.
//! 4. Unless the scale is the identity, rescale elapsed time around the
//!    first timestamp and sort again.
//!
//! The result has exactly the columns `ts` followed by the requested names in
//! request order. A failure on any port aborts the read; no partial table is
//! returned.

pub mod error;

use std::{collections::BTreeMap, sync::Arc};

use arrow::{
    array::{ArrayRef, RecordBatch, TimestampNanosecondArray, UInt64Array},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
};
use log::{debug, warn};
use snafu::prelude::*;

use crate::{
    layout::DataDir,
    port_table::{
        self, PortSummary, PortTable, TS_COLUMN, build_port_table, describe_port, ts_data_type,
    },
    request::{PortSelection, ReadOptions},
    time_scale::{TimeScale, rescale_ts},
};
pub use error::AlignError;
use error::{
    ArrowSnafu, ListPortsSnafu, NoPortsRequestedSnafu, PortSnafu, ScaleSnafu, SelectionSnafu,
};

/// Value written where a port has no row at a merged timestamp.
pub const FILL_VALUE: u64 = 0;

/// Read, align and optionally rescale the requested ports.
///
/// `ports_and_names` maps port ids to output column names and its iteration
/// order fixes the output column order. `scale_ts` must be finite and
/// greater than zero; `1.0` disables rescaling.
pub fn read_ports_table<I, P, N>(
    ports_and_names: I,
    data_dir: impl Into<DataDir>,
    scale_ts: f64,
) -> Result<RecordBatch, AlignError>
where
    I: IntoIterator<Item = (P, N)>,
    P: Into<String>,
    N: Into<String>,
{
    let selection = PortSelection::new(ports_and_names).context(SelectionSnafu)?;
    let scale = TimeScale::new(scale_ts).context(ScaleSnafu)?;
    let options = ReadOptions::default()
        .with_data_dir(data_dir)
        .with_scale(scale);
    read_ports_table_with(&selection, &options)
}

/// Read, align and optionally rescale a validated selection.
pub fn read_ports_table_with(
    selection: &PortSelection,
    options: &ReadOptions,
) -> Result<RecordBatch, AlignError> {
    ensure!(!selection.is_empty(), NoPortsRequestedSnafu);

    let tables = selection
        .iter()
        .map(|(port, name)| {
            build_port_table(port, name, &options.data_dir).context(PortSnafu { port })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let merged = merge_port_tables(&tables)?;
    scale_table(merged, options.scale)
}

/// Outer-join sorted port tables on `ts` with zero fill.
///
/// Output columns are `ts` followed by each table's value column, in slice
/// order. If a port records the same instant more than once, its last row in
/// sorted order supplies the value.
pub fn merge_port_tables(tables: &[PortTable]) -> Result<RecordBatch, AlignError> {
    ensure!(!tables.is_empty(), NoPortsRequestedSnafu);
    let width = tables.len();

    let mut rows: BTreeMap<i64, Vec<Option<u64>>> = BTreeMap::new();
    for (col, table) in tables.iter().enumerate() {
        let mut duplicates = 0usize;
        for (&ts, &value) in table.ts().values().iter().zip(table.values().values().iter()) {
            let slot = &mut rows.entry(ts).or_insert_with(|| vec![None; width])[col];
            if slot.replace(value).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!(
                "port {} has {duplicates} rows sharing a timestamp; keeping the last value per instant",
                table.port()
            );
        }
    }

    let mut fields = vec![Field::new(TS_COLUMN, ts_data_type(), false)];
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(width + 1);
    columns.push(Arc::new(TimestampNanosecondArray::from_iter_values(
        rows.keys().copied(),
    )));
    for (col, table) in tables.iter().enumerate() {
        fields.push(Field::new(
            table.value_column_name(),
            DataType::UInt64,
            false,
        ));
        columns.push(Arc::new(UInt64Array::from_iter_values(
            rows.values().map(|row| row[col].unwrap_or(FILL_VALUE)),
        )));
    }

    debug!(
        "merged {width} ports into {} rows from {} input rows",
        rows.len(),
        tables.iter().map(PortTable::num_rows).sum::<usize>()
    );

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context(ArrowSnafu)?;
    port_table::sort_by_ts(batch).context(ArrowSnafu)
}

/// Rescale the `ts` column of a merged table around its first row.
///
/// Identity scales return the batch unchanged. Other columns are carried
/// through as-is and the result is re-sorted by `ts`.
pub fn scale_table(batch: RecordBatch, scale: TimeScale) -> Result<RecordBatch, AlignError> {
    if scale.is_identity() {
        return Ok(batch);
    }

    let ts = port_table::ts_column(&batch).ok_or_else(|| AlignError::Arrow {
        source: ArrowError::SchemaError(format!("merged table has no {TS_COLUMN} column")),
    })?;
    let scaled = rescale_ts(ts, scale).context(ScaleSnafu)?;

    let mut columns = batch.columns().to_vec();
    columns[0] = Arc::new(scaled);
    let batch = RecordBatch::try_new(batch.schema(), columns).context(ArrowSnafu)?;
    port_table::sort_by_ts(batch).context(ArrowSnafu)
}

/// Summarise every port found in `data_dir`.
pub fn describe_ports(data_dir: &DataDir) -> Result<Vec<PortSummary>, AlignError> {
    let ports = data_dir.list_ports().context(ListPortsSnafu {
        path: data_dir.path().display().to_string(),
    })?;
    ports
        .iter()
        .map(|port| describe_port(port, data_dir).context(PortSnafu { port }))
        .collect()
}
