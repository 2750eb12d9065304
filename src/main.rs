use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rusty_penguin::data::loader;
use rusty_penguin::{Schema, Session};

#[derive(Parser)]
#[command(name = "rusty-penguin")]
#[command(about = "Filter, describe, sort and augment a penguin measurement table", long_about = None)]
struct Cli {
    /// Input table (.csv, .json or .parquet)
    input: PathBuf,

    /// Command tokens, e.g. `sort body_mass_g desc`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,

    /// Save the resulting table here (format chosen by extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for augmentation; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Treat the input as a raw wide CSV and extract the schema columns
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let schema = Schema::penguins();
    let dataset = if cli.raw {
        loader::extract_raw_csv(&cli.input, &schema)
    } else {
        loader::load_file(&cli.input, &schema)
    }
    .with_context(|| format!("loading {}", cli.input.display()))?;

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut session = Session::new(schema, dataset, rng);

    let outcome = session.execute(&cli.tokens)?;
    let rendered = serde_json::to_string_pretty(&outcome).context("rendering outcome")?;
    println!("{rendered}");

    if let Some(path) = &cli.output {
        match outcome.dataset() {
            Some(table) => loader::save_file(path, session.schema(), table)
                .with_context(|| format!("saving {}", path.display()))?,
            None => info!("'{}' produced no table; nothing written", cli.tokens[0]),
        }
    }
    Ok(())
}
