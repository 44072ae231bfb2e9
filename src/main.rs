use std::io::{self, Write};
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ssa_synth::evaluation::ExampleSuite;
use ssa_synth::program::DEFAULT_MAX_INSTRUCTIONS;
use ssa_synth::search::{self, Config, Limits, SearchResult, DEFAULT_EXPLORATION};

/// Searches for a straight-line program reproducing the given examples.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Comma-separated parameter names of the synthesized function.
    #[arg(long, value_delimiter = ',', default_value = "a,b")]
    params: Vec<String>,
    /// Semicolon-separated examples, one input per parameter, e.g.
    /// "2,2=4;2,3=5". Defaults to four examples of addition.
    #[arg(long)]
    examples: Option<ExampleSuite>,
    /// Time budget in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    time: u64,
    /// Stop after this many search iterations even if there is time left.
    #[arg(long)]
    iterations: Option<u64>,
    /// Number of instructions after which programs can only return.
    #[arg(long, default_value_t = DEFAULT_MAX_INSTRUCTIONS)]
    max_instructions: usize,
    /// Exploration constant of the selection policy.
    #[arg(long, default_value_t = DEFAULT_EXPLORATION)]
    exploration: f64,
    /// Seed of the random completions.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn report(result: &SearchResult, output: &mut impl Write) -> anyhow::Result<()> {
    writeln!(output, "{}", result.program)?;
    writeln!(output, "reward {}", result.reward)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    ssa_synth::log_build_info();

    let examples = args.examples.unwrap_or_else(ExampleSuite::addition);
    if examples.arity() != args.params.len() {
        bail!(
            "examples have {} inputs but there are {} parameters",
            examples.arity(),
            args.params.len()
        );
    }

    let config = Config {
        params: args.params,
        max_instructions: args.max_instructions,
        exploration: args.exploration,
        limits: Limits {
            time: Duration::from_millis(args.time),
            iterations: args.iterations,
        },
    };
    let mut rng = StdRng::seed_from_u64(args.seed);
    let result = search::synthesize(&config, &examples, &mut rng)?;

    report(&result, &mut io::stdout().lock())
}
