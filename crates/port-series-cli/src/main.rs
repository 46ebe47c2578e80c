//! CLI tool for aligning recorded port time series.

mod error;
mod output;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use port_series_core::{
    DataDir, PortSelection, PortSpec, ReadOptions, TimeScale, describe_ports,
    layout::DEFAULT_DATA_DIR, read_ports_table_with,
};
use snafu::ResultExt;

use crate::{
    error::{CliResult, InvalidPortsSnafu, ListPortsSnafu, ReadPortsSnafu, StdoutSnafu},
    output::{OutputFormat, ReadOpts, write_batch, write_port_summaries, write_read_result},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Csv,
    Jsonl,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(v: OutputFormatArg) -> Self {
        match v {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Align ports onto one timeline and preview or export the result
    Read {
        /// Directory holding <port>.count, <port>.ts and <port>.val files
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        dir: PathBuf,

        /// Repeatable; ID=NAME, or a bare ID to name the column after the port
        #[arg(long = "port", required = true)]
        ports: Vec<PortSpec>,

        /// Stretch elapsed time by this factor (must be > 0)
        #[arg(long, default_value = "1")]
        scale: TimeScale,

        #[arg(long, default_value_t = 10)]
        max_rows: usize,

        /// Write the full aligned table to this file
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormatArg::Csv)]
        format: OutputFormatArg,

        /// Print elapsed time for the read
        #[arg(long, default_value_t = false)]
        timing: bool,
    },

    /// List recorded ports with their row counts and time ranges
    Ports {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        dir: PathBuf,
    },
}

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

fn cmd_read(
    dir: PathBuf,
    ports: Vec<PortSpec>,
    scale: TimeScale,
    opts: ReadOpts,
) -> CliResult<()> {
    let start = Instant::now();
    let selection = PortSelection::from_specs(ports).context(InvalidPortsSnafu)?;
    let options = ReadOptions::default()
        .with_data_dir(dir.clone())
        .with_scale(scale);

    let batch = read_ports_table_with(&selection, &options).context(ReadPortsSnafu {
        dir: dir.display().to_string(),
    })?;

    if let Some(path) = &opts.output {
        write_batch(&batch, path, opts.format)?;
    }

    let mut stdout = std::io::stdout().lock();
    write_read_result(&batch, &opts, start.elapsed(), &mut stdout)
}

fn cmd_ports(dir: PathBuf) -> CliResult<()> {
    let summaries = describe_ports(&DataDir::new(&dir)).context(ListPortsSnafu {
        dir: dir.display().to_string(),
    })?;

    let mut stdout = std::io::stdout().lock();
    write_port_summaries(&summaries, &mut stdout)?;
    std::io::Write::flush(&mut stdout).context(StdoutSnafu)
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Read {
            dir,
            ports,
            scale,
            max_rows,
            output,
            format,
            timing,
        } => cmd_read(
            dir,
            ports,
            scale,
            ReadOpts {
                timing,
                max_rows,
                output,
                format: format.into(),
            },
        ),

        Command::Ports { dir } => cmd_ports(dir),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
