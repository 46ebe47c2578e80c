//! Reader and time aligner for recorded per-port time series.
//!
//! Recorders write each logical port as three flat files: a record count, a
//! column of nanosecond timestamps and a column of `u64` values. This crate
//! turns those files into Arrow `RecordBatch`es:
//!
//! - Zero-copy, memory-mapped decoding of fixed-width column files
//!   (`column` module).
//! - Per-port `(ts, value)` tables sorted by time (`port_table` module).
//! - Outer-joining several ports onto one timeline with zero fill, and
//!   optional affine rescaling of elapsed time (`align` and `time_scale`
//!   modules).
//! - Data directory naming conventions and port discovery (`layout` module).
//!
//! Everything is synchronous and read-only.
#![deny(missing_docs)]

pub mod align;
pub mod column;
pub mod layout;
pub mod port_table;
pub mod request;
pub mod time_scale;

#[cfg(test)]
pub(crate) mod test_util;

pub use align::{AlignError, describe_ports, read_ports_table, read_ports_table_with};
pub use column::{ColumnError, ColumnKind, load_column};
pub use layout::DataDir;
pub use port_table::{PortSummary, PortTable, PortTableError, TS_COLUMN, build_port_table};
pub use request::{ParsePortSpecError, PortSelection, PortSpec, ReadOptions, SelectionError};
pub use time_scale::{TimeScale, TimeScaleError};
