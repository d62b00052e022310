use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use attention::{
    matrix_from_rows, rows_from_matrix, Attention, Config, ExactAttention, PrecisionPolicy,
};
use candle_core::Device;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(report) => print!("{report}"),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Scaled dot-product attention on small matrices", long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "JSON file with `query`, `key`, `value` matrices and optional `config`"
    )]
    input: Option<PathBuf>,

    #[arg(long, value_name = "POLICY", help = "Working precision: inherit or at_least_f32")]
    precision: Option<PrecisionPolicy>,

    #[arg(long, default_value_t = 3, help = "Decimal places used when printing values")]
    decimals: usize,

    #[arg(long, help = "Emit JSON instead of tables")]
    json: bool,
}

#[derive(Debug, Deserialize)]
struct InputFile {
    query: Vec<Vec<f32>>,
    key: Vec<Vec<f32>>,
    value: Vec<Vec<f32>>,
    #[serde(default)]
    config: Config,
}

#[derive(Debug, Serialize)]
struct Report {
    weights: Vec<Vec<f32>>,
    output: Vec<Vec<f32>>,
}

/// Three tokens with two-dimensional keys; the first query leans on the
/// first key, the last query is neutral.
fn demo_input() -> InputFile {
    InputFile {
        query: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]],
        key: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
        value: vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
        config: Config::default(),
    }
}

fn load_input(args: &Args) -> Result<InputFile> {
    let Some(path) = args.input.as_ref() else {
        log::info!("no --input given, using the built-in demo matrices");
        return Ok(demo_input());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse input file {}", path.display()))
}

fn run(args: &Args) -> Result<String> {
    let input = load_input(args)?;
    let config = resolve_config(args, &input.config);

    let device = Device::Cpu;
    let q = matrix_from_rows(&input.query, &device).context("invalid query matrix")?;
    let k = matrix_from_rows(&input.key, &device).context("invalid key matrix")?;
    let v = matrix_from_rows(&input.value, &device).context("invalid value matrix")?;

    let result = ExactAttention::new().attend(&q, &k, &v, &config)?;
    let report = Report {
        weights: round_rows(rows_from_matrix(&result.weights)?, args.decimals),
        output: round_rows(rows_from_matrix(&result.output)?, args.decimals),
    };

    if args.json {
        let mut rendered = serde_json::to_string_pretty(&report)?;
        rendered.push('\n');
        return Ok(rendered);
    }

    let mut rendered = render_table("weights", &report.weights, args.decimals);
    rendered.push('\n');
    rendered.push_str(&render_table("output", &report.output, args.decimals));
    Ok(rendered)
}

/// Precedence: `--precision`, then `ATTENTION_PRECISION`, then the input file.
fn resolve_config(args: &Args, file_config: &Config) -> Config {
    let mut config = file_config.clone();
    config.apply_env_overrides();
    if let Some(precision) = args.precision {
        config.precision = precision;
    }
    config
}

fn round_rows(rows: Vec<Vec<f32>>, decimals: usize) -> Vec<Vec<f32>> {
    let factor = 10f32.powi(decimals.min(9) as i32);
    rows.into_iter()
        .map(|row| row.into_iter().map(|x| (x * factor).round() / factor).collect())
        .collect()
}

fn render_table(label: &str, rows: &[Vec<f32>], decimals: usize) -> String {
    let mut table = format!("{label}:\n");
    for row in rows {
        let cells: Vec<String> = row.iter().map(|x| format!("{x:.decimals$}")).collect();
        table.push_str("  [");
        table.push_str(&cells.join(", "));
        table.push_str("]\n");
    }
    table
}
