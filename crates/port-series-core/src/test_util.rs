use std::{fs, io, path::Path};

use arrow::array::{Array, RecordBatch, TimestampNanosecondArray, UInt64Array};

use crate::layout::DataDir;

pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn write_u64_file(path: &Path, values: &[u64]) -> io::Result<()> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(path, bytes)
}

/// Write the count, timestamp and value files for one port.
pub(crate) fn write_port(dir: &Path, port: &str, rows: &[(u64, u64)]) -> io::Result<()> {
    let files = DataDir::new(dir).port_files(port);
    let ts: Vec<u64> = rows.iter().map(|(ts, _)| *ts).collect();
    let val: Vec<u64> = rows.iter().map(|(_, v)| *v).collect();
    fs::write(&files.count, (rows.len() as u64).to_le_bytes())?;
    write_u64_file(&files.ts, &ts)?;
    write_u64_file(&files.val, &val)
}

pub(crate) fn ts_values(batch: &RecordBatch) -> Vec<i64> {
    batch
        .column(0)
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
        .map(|a| a.values().to_vec())
        .unwrap_or_default()
}

pub(crate) fn u64_values(batch: &RecordBatch, name: &str) -> Vec<u64> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<UInt64Array>().cloned())
        .map(|a| {
            assert_eq!(a.null_count(), 0, "column {name} has nulls");
            a.values().to_vec()
        })
        .unwrap_or_default()
}

pub(crate) fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}
