mod cli;

use std::io::Write;

use clap::Parser;
use est_meter::api::consumption::ReportResult;
use est_meter::{PortalClient, PRODUCTION_BASE_URL};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, OutputFormat, PeriodArg};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse(), PRODUCTION_BASE_URL)
}

/// Fetches the report and writes it out. Nothing is written unless the fetch succeeds.
fn run(args: Args, base_url: &str) -> anyhow::Result<()> {
    let (credentials, meter) = args.identity()?;

    let portal = PortalClient::new(credentials, meter)?.with_base_url(base_url)?;
    let report = portal.consumption();
    let data = match args.period {
        PeriodArg::Year => report.year(args.neto, args.year)?,
        PeriodArg::Month => report.month(args.neto, args.year, args.month)?,
        PeriodArg::Day => report.day(args.neto, args.year, args.month, args.day)?,
    };

    let rendered = match args.format {
        OutputFormat::Json => to_indented_json(&data)?,
        OutputFormat::Table => format!("{}\n", data.as_polars_df()?),
    };

    match args.outfile {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            info!("wrote {}", path.display());
        }
        None => std::io::stdout().write_all(rendered.as_bytes())?,
    }

    Ok(())
}

fn to_indented_json(data: &ReportResult) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    data.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(String::from_utf8(buf)?)
}
