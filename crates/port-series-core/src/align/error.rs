//! Error types and SNAFU context selectors for aligned reads.
//!
//! `AlignError` is the error surfaced by the public entry points. Per-port
//! failures keep the port id alongside the underlying table error so callers
//! can tell which port aborted the read.

use std::io;

use arrow::error::ArrowError;
use snafu::prelude::*;

use crate::{port_table::PortTableError, request::SelectionError, time_scale::TimeScaleError};

/// Errors from aligning multiple ports onto one timeline.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AlignError {
    /// The request named no ports, so there is no `ts` axis to build.
    #[snafu(display("No ports requested"))]
    NoPortsRequested,

    /// The port-to-column mapping is invalid.
    #[snafu(display("Invalid port selection: {source}"))]
    Selection {
        /// Underlying validation error.
        source: SelectionError,
    },

    /// The time scale factor is invalid or rescaling overflowed.
    #[snafu(display("Time scale error: {source}"))]
    Scale {
        /// Underlying time scale error.
        source: TimeScaleError,
    },

    /// Loading one port failed; the whole read is aborted.
    #[snafu(display("Failed to read port {port}: {source}"))]
    Port {
        /// Port id that failed.
        port: String,
        /// Underlying table error (boxed to keep the variant size small).
        #[snafu(source(from(PortTableError, Box::new)))]
        source: Box<PortTableError>,
    },

    /// Listing the data directory failed.
    #[snafu(display("Failed to list ports in {path}: {source}"))]
    ListPorts {
        /// Directory being listed.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Assembling the merged table failed.
    #[snafu(display("Arrow error while merging ports: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}
