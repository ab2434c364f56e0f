//! Command-line wrapper: read a JSON trial design, write an SVG diagram.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};

use soachart::{RenderOptions, Schedule, render};

/// Clinical trial design visualization.
///
/// Generates a schedule-of-assessments overview for clinical trials from a
/// json-formatted input file. Output is SVG vector graphics that any web
/// browser can display and office applications can import directly.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Json-formatted trial design file
    file: PathBuf,

    /// Output file name (defaults to the input name with .svg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Font type
    #[arg(short, long, default_value = "Arial")]
    font: String,

    /// Font size
    #[arg(short = 's', long, default_value_t = 14.0)]
    fontsize: f64,

    /// Y-axis padding factor
    #[arg(short, long, default_value_t = 1.0)]
    padding: f64,

    /// Show condensed daygrid
    #[arg(short, long)]
    condensed: bool,

    /// Automatically compress daygrid
    #[arg(short, long)]
    autocompress: bool,

    /// Reduce symbols in condensed output
    #[arg(short, long)]
    ellipsis: bool,

    /// Show time scale
    #[arg(short, long)]
    timescale: bool,

    /// Show dose graph
    #[arg(short, long)]
    graph: bool,

    /// Show footnotes
    #[arg(short = 'n', long)]
    footnotes: bool,

    /// All options, equivalent to -ctgen
    #[arg(short = 'A', long)]
    all: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("error loading input file {}", cli.file.display()))?;
    let schedule: Schedule = serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err_with(|| format!("json syntax error in input file {}", cli.file.display()))?;

    let title = cli
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let options = RenderOptions {
        title,
        font: cli.font,
        font_size: cli.fontsize,
        padding: cli.padding,
        condensed: cli.condensed || cli.all,
        autocompress: cli.autocompress,
        ellipsis: cli.ellipsis || cli.all,
        timescale: cli.timescale || cli.all,
        graph: cli.graph || cli.all,
        footnotes: cli.footnotes || cli.all,
        debug: false,
    };

    let svg = render(&schedule, &options)?;

    let outfile = cli
        .output
        .unwrap_or_else(|| cli.file.with_extension("svg"));
    fs::write(&outfile, svg)
        .into_diagnostic()
        .wrap_err_with(|| format!("error writing output file {}", outfile.display()))?;
    Ok(())
}
