//! On-disk layout of a port data directory.
//!
//! A data directory holds three files per recorded port:
//!
//! - `<port>.count`: a single little-endian `u64` record count.
//! - `<port>.ts`: `count` little-endian 64-bit nanosecond timestamps.
//! - `<port>.val`: `count` little-endian `u64` values.
//!
//! This module keeps those naming conventions in one place so the column
//! loader and table builder work with typed paths instead of hand-built
//! strings.

use std::{
    cmp::Ordering,
    fs, io,
    path::{Path, PathBuf},
};

/// Extension of the sidecar file holding a port's record count.
pub const COUNT_EXTENSION: &str = "count";
/// Extension of a port's timestamp column file.
pub const TS_EXTENSION: &str = "ts";
/// Extension of a port's value column file.
pub const VAL_EXTENSION: &str = "val";

/// Directory used when the caller does not name one.
pub const DEFAULT_DATA_DIR: &str = "data";

/// A directory containing recorded port files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataDir(PathBuf);

/// Paths of the three files recorded for one port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortFiles {
    /// `<port>.count`
    pub count: PathBuf,
    /// `<port>.ts`
    pub ts: PathBuf,
    /// `<port>.val`
    pub val: PathBuf,
}

impl DataDir {
    /// Wrap a local directory path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataDir(root.into())
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Resolve the file paths for `port`.
    ///
    /// The port id is appended as a file stem; ids containing a `.` are kept
    /// whole rather than having their suffix replaced.
    pub fn port_files(&self, port: &str) -> PortFiles {
        let file = |ext: &str| self.0.join(format!("{port}.{ext}"));
        PortFiles {
            count: file(COUNT_EXTENSION),
            ts: file(TS_EXTENSION),
            val: file(VAL_EXTENSION),
        }
    }

    /// List the ids of all ports that have a count file in this directory.
    ///
    /// Numeric ids (the common case for network ports) sort numerically and
    /// come first; other ids follow in lexicographic order.
    pub fn list_ports(&self) -> io::Result<Vec<String>> {
        let mut ports = Vec::new();
        for entry in fs::read_dir(&self.0)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(COUNT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ports.push(stem.to_string());
            }
        }
        ports.sort_by(|a, b| cmp_port_ids(a, b));
        Ok(ports)
    }
}

impl Default for DataDir {
    fn default() -> Self {
        DataDir::new(DEFAULT_DATA_DIR)
    }
}

impl From<&Path> for DataDir {
    fn from(p: &Path) -> Self {
        DataDir::new(p)
    }
}

impl From<PathBuf> for DataDir {
    fn from(p: PathBuf) -> Self {
        DataDir(p)
    }
}

impl AsRef<Path> for DataDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

fn cmp_port_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn port_files_use_id_as_stem() {
        let dir = DataDir::new("/tmp/capture");
        let files = dir.port_files("8080");
        assert_eq!(files.count, Path::new("/tmp/capture/8080.count"));
        assert_eq!(files.ts, Path::new("/tmp/capture/8080.ts"));
        assert_eq!(files.val, Path::new("/tmp/capture/8080.val"));
    }

    #[test]
    fn port_files_keep_dotted_ids_whole() {
        let files = DataDir::new("d").port_files("eth0.rx");
        assert_eq!(files.count, Path::new("d/eth0.rx.count"));
    }

    #[test]
    fn default_dir_is_data() {
        assert_eq!(DataDir::default().path(), Path::new("data"));
    }

    #[test]
    fn list_ports_orders_numeric_ids_first() -> TestResult {
        let tmp = TempDir::new()?;
        for name in ["9000.count", "80.count", "rx.count", "443.count", "80.ts", "notes.txt"] {
            fs::write(tmp.path().join(name), [0u8; 8])?;
        }
        fs::create_dir(tmp.path().join("sub.count"))?;

        let ports = DataDir::new(tmp.path()).list_ports()?;
        assert_eq!(ports, vec!["80", "443", "9000", "rx"]);
        Ok(())
    }

    #[test]
    fn list_ports_errors_for_missing_dir() -> TestResult {
        let tmp = TempDir::new()?;
        let missing = DataDir::new(tmp.path().join("nope"));
        let err = missing.list_ports().expect_err("missing dir should error");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        Ok(())
    }
}
