use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use arrow::{
    array::RecordBatch,
    util::display::{ArrayFormatter, FormatOptions},
};
use chrono::{DateTime, Utc};
use port_series_core::PortSummary;
use snafu::ResultExt;
use tabled::{builder::Builder, settings::Style};

use crate::error::{CliResult, EncodeOutputSnafu, FormatSnafu, StdoutSnafu, WriteOutputSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

#[derive(Debug, Clone)]
pub struct ReadOpts {
    pub timing: bool,
    pub max_rows: usize,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Format the first `max_rows` rows of `batch` as display strings.
pub fn preview_rows(batch: &RecordBatch, max_rows: usize) -> CliResult<Vec<Vec<String>>> {
    let options = FormatOptions::default();
    let formatters = batch
        .columns()
        .iter()
        .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
        .collect::<Result<Vec<_>, _>>()
        .context(FormatSnafu)?;

    Ok((0..batch.num_rows().min(max_rows))
        .map(|row| formatters.iter().map(|f| f.value(row).to_string()).collect())
        .collect())
}

pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

pub fn write_batch(batch: &RecordBatch, path: &Path, format: OutputFormat) -> CliResult<()> {
    let path_str = path.display().to_string();
    let file = File::create(path).context(WriteOutputSnafu { path: &path_str })?;
    let mut out = BufWriter::new(file);

    match format {
        OutputFormat::Csv => {
            let mut writer = arrow_csv::WriterBuilder::new()
                .with_header(true)
                .build(&mut out);
            writer
                .write(batch)
                .context(EncodeOutputSnafu { path: &path_str })?;
        }
        OutputFormat::Jsonl => {
            let mut writer = arrow_json::LineDelimitedWriter::new(&mut out);
            writer
                .write_batches(&[batch])
                .context(EncodeOutputSnafu { path: &path_str })?;
            writer
                .finish()
                .context(EncodeOutputSnafu { path: &path_str })?;
        }
    }

    out.flush().context(WriteOutputSnafu { path: path_str })
}

pub fn write_read_result<W: Write>(
    batch: &RecordBatch,
    opts: &ReadOpts,
    elapsed: Duration,
    out: &mut W,
) -> CliResult<()> {
    if opts.max_rows > 0 {
        let rows = preview_rows(batch, opts.max_rows)?;
        let rendered = render_table(&column_names(batch), &rows);
        writeln!(out, "{rendered}").context(StdoutSnafu)?;
    }

    if batch.num_rows() == 0 {
        writeln!(out, "(no rows)").context(StdoutSnafu)?;
    } else if opts.max_rows == 0 {
        writeln!(out, "(preview suppressed; use --max-rows > 0)").context(StdoutSnafu)?;
    }

    writeln!(out, "total_rows: {}", batch.num_rows()).context(StdoutSnafu)?;

    if opts.timing {
        writeln!(out, "elapsed_ms: {}", elapsed.as_millis()).context(StdoutSnafu)?;
    }

    if let Some(path) = &opts.output {
        writeln!(out, "wrote: {} ({:?})", path.display(), opts.format).context(StdoutSnafu)?;
    }

    Ok(())
}

pub fn write_port_summaries<W: Write>(summaries: &[PortSummary], out: &mut W) -> CliResult<()> {
    if summaries.is_empty() {
        writeln!(out, "(no ports)").context(StdoutSnafu)?;
        return Ok(());
    }

    let columns = ["port", "count", "first_ts", "last_ts"].map(String::from);
    let fmt_ts = |ts: Option<DateTime<Utc>>| ts.map(|t| t.to_rfc3339()).unwrap_or_default();
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.port.clone(),
                s.count.to_string(),
                fmt_ts(s.ts_min),
                fmt_ts(s.ts_max),
            ]
        })
        .collect();

    writeln!(out, "{}", render_table(&columns, &rows)).context(StdoutSnafu)
}
