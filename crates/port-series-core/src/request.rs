//! Typed inputs for an aligned read.
//!
//! - [`PortSelection`]: the ordered mapping from port id to output column
//!   name. Order decides the output column order.
//! - [`PortSpec`]: one `ID=NAME` entry as written on a command line.
//! - [`ReadOptions`]: data directory and time scale, defaulting to `data`
//!   and no scaling.

use std::{collections::HashSet, fmt, str::FromStr};

use snafu::prelude::*;

use crate::{layout::DataDir, port_table::TS_COLUMN, time_scale::TimeScale};

/// Errors raised while validating a port selection.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SelectionError {
    /// The same port id was requested twice.
    #[snafu(display("Port {port} requested more than once"))]
    DuplicatePort {
        /// Repeated port id.
        port: String,
    },

    /// Two ports map onto the same output column.
    #[snafu(display("Output column {name} is used by more than one port"))]
    DuplicateColumn {
        /// Repeated column name.
        name: String,
    },

    /// A port maps onto the reserved `ts` column.
    #[snafu(display("Output column name {name} is reserved for timestamps"))]
    ReservedColumn {
        /// The reserved name.
        name: String,
    },
}

/// Error returned when parsing a [`PortSpec`] fails.
#[derive(Debug, Snafu)]
#[snafu(display("Invalid port spec '{input}': expected ID or ID=NAME with non-empty parts"))]
pub struct ParsePortSpecError {
    input: String,
}

/// One requested port and the name of its output column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortSpec {
    /// Port id (file stem in the data directory).
    pub port: String,
    /// Output column name.
    pub name: String,
}

impl FromStr for PortSpec {
    type Err = ParsePortSpecError;

    /// Parse `ID=NAME`, or a bare `ID` that names its own column.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (port, name) = match s.split_once('=') {
            Some((port, name)) => (port.trim(), name.trim()),
            None => (s.trim(), s.trim()),
        };
        ensure!(
            !port.is_empty() && !name.is_empty(),
            ParsePortSpecSnafu { input: s }
        );
        Ok(PortSpec {
            port: port.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.port, self.name)
    }
}

/// Ordered mapping from port id to output column name.
///
/// Port ids and column names are each unique, and no column may be named
/// `ts`. An empty selection is representable; reading one fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortSelection {
    entries: Vec<PortSpec>,
}

impl PortSelection {
    /// Build a selection from `(port, name)` pairs, keeping their order.
    pub fn new<I, P, N>(pairs: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<String>,
        N: Into<String>,
    {
        Self::from_specs(pairs.into_iter().map(|(port, name)| PortSpec {
            port: port.into(),
            name: name.into(),
        }))
    }

    /// Build a selection from parsed specs, keeping their order.
    pub fn from_specs<I>(specs: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = PortSpec>,
    {
        let mut ports = HashSet::new();
        let mut names = HashSet::new();
        let mut entries = Vec::new();

        for spec in specs {
            ensure!(
                spec.name != TS_COLUMN,
                ReservedColumnSnafu { name: &spec.name }
            );
            ensure!(
                ports.insert(spec.port.clone()),
                DuplicatePortSnafu { port: &spec.port }
            );
            ensure!(
                names.insert(spec.name.clone()),
                DuplicateColumnSnafu { name: &spec.name }
            );
            entries.push(spec);
        }

        Ok(PortSelection { entries })
    }

    /// True when no ports are selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of selected ports.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate `(port, name)` pairs in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.port.as_str(), e.name.as_str()))
    }

    /// Output column names in selection order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

/// Where to read from and how to rescale time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadOptions {
    /// Directory holding the port files.
    pub data_dir: DataDir,
    /// Elapsed-time scale factor.
    pub scale: TimeScale,
}

impl ReadOptions {
    /// Set the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<DataDir>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the time scale.
    pub fn with_scale(mut self, scale: TimeScale) -> Self {
        self.scale = scale;
        self
    }
}
