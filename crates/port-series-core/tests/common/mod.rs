use std::{fs, io, path::Path};

use arrow::array::{RecordBatch, TimestampNanosecondArray, UInt64Array};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn write_u64_file(path: &Path, values: &[u64]) -> io::Result<()> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(path, bytes)
}

pub fn write_port(dir: &Path, port: &str, rows: &[(u64, u64)]) -> io::Result<()> {
    let ts: Vec<u64> = rows.iter().map(|(ts, _)| *ts).collect();
    let val: Vec<u64> = rows.iter().map(|(_, v)| *v).collect();
    fs::write(
        dir.join(format!("{port}.count")),
        (rows.len() as u64).to_le_bytes(),
    )?;
    write_u64_file(&dir.join(format!("{port}.ts")), &ts)?;
    write_u64_file(&dir.join(format!("{port}.val")), &val)
}

pub fn ts_values(batch: &RecordBatch) -> Vec<i64> {
    batch
        .column(0)
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
        .map(|a| a.values().to_vec())
        .unwrap_or_default()
}

pub fn u64_values(batch: &RecordBatch, name: &str) -> Vec<u64> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
        .map(|a| a.values().to_vec())
        .unwrap_or_default()
}

pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// Small deterministic generator so property-style tests need no extra crates.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }
}
