use std::io;

use arrow::error::ArrowError;
use port_series_core::{AlignError, SelectionError};
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Invalid --port list: {source}"))]
    InvalidPorts { source: SelectionError },

    #[snafu(display(
        "Failed to read ports from {dir}: {source}. \
         Each port needs <id>.count, <id>.ts and <id>.val files."
    ))]
    ReadPorts {
        dir: String,
        #[snafu(source(from(AlignError, Box::new)))]
        source: Box<AlignError>,
    },

    #[snafu(display("Failed to list ports in {dir}: {source}"))]
    ListPorts {
        dir: String,
        #[snafu(source(from(AlignError, Box::new)))]
        source: Box<AlignError>,
    },

    #[snafu(display("Failed to format results: {source}"))]
    Format { source: ArrowError },

    #[snafu(display("Failed to write output file {path}: {source}"))]
    WriteOutput { path: String, source: io::Error },

    #[snafu(display("Failed to encode output file {path}: {source}"))]
    EncodeOutput { path: String, source: ArrowError },

    #[snafu(display("Failed to write to stdout: {source}"))]
    Stdout { source: io::Error },
}
