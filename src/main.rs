use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use pipeline_simulator::pipeline::{expand_source, printer, Environment, Simulator};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:
  pipeline-simulator --show-scripts .gitlab-ci.yml CI_COMMIT_BRANCH=master
  pipeline-simulator --expand-only complex-pipeline.yml > expanded.yml")]
struct Args {
    /// Path to the pipeline YAML file
    file: PathBuf,

    /// Variables as KEY=VALUE; arguments without '=' are ignored
    vars: Vec<String>,

    /// Display the scripts of every job that would run
    #[arg(long)]
    show_scripts: bool,

    /// Print the expanded YAML without simulating
    #[arg(long)]
    expand_only: bool,

    /// Output format for simulation results
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Load variables from a dotenv file; command line variables win
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    if args.expand_only {
        let data = std::fs::read(&args.file)
            .with_context(|| format!("failed to read {}", args.file.display()))?;
        let root = expand_source(&data)?;
        print!("{}", printer::expanded_to_yaml(root.as_ref())?);
        return Ok(());
    }

    let mut env = match &args.env_file {
        Some(path) => load_env_file(path)?,
        None => Environment::new(),
    };
    env.extend(parse_env(&args.vars));
    log::debug!("Simulating with {} variables", env.len());

    let simulator = Simulator::new(env);
    let report = simulator
        .run(&args.file)
        .context("Error running pipeline simulation")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Text => printer::write_report(&mut out, &report, args.show_scripts)?,
        Format::Json => writeln!(out, "{}", printer::report_to_json(&report)?)?,
    }
    Ok(())
}

/// `KEY=VALUE` bindings; the value may itself contain '='
fn parse_env(args: &[String]) -> Environment {
    args.iter()
        .filter_map(|arg| match arg.split_once('=') {
            Some((key, value)) => Some((key.to_string(), value.to_string())),
            None => {
                log::warn!("Ignoring argument without '=': {}", arg);
                None
            }
        })
        .collect()
}

fn load_env_file(path: &Path) -> Result<Environment> {
    let mut env = Environment::new();
    let entries = dotenv::from_path_iter(path)
        .with_context(|| format!("failed to open env file {}", path.display()))?;
    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("failed to parse env file {}", path.display()))?;
        env.insert(key, value);
    }
    Ok(env)
}
