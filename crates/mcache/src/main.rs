//! mcache - drive a model cache from a command script

mod handler;
mod reply;

use anyhow::{bail, Context, Result};
use clap::Parser;
use modelcache::{CacheConfig, DEFAULT_CAPACITY};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::handler::{CommandHandler, ModelStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of cached models
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// JSON config file (replaces --capacity)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command script (reads stdin when omitted)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Stop at the first error reply
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so replies on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    info!("Starting mcache v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", config.capacity);

    let store = ModelStore::from_config(&config)?
        .with_reclaimer(|| info!("Evicted model dropped, reclaiming memory"));
    let handler = CommandHandler::new(Arc::new(store));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let errors = match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            run_script(&handler, BufReader::new(file), &mut out, args.strict)?
        }
        None => run_script(&handler, io::stdin().lock(), &mut out, args.strict)?,
    };

    if errors > 0 {
        warn!("{} command(s) returned an error", errors);
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<CacheConfig> {
    match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Ok(CacheConfig::from_json_str(&text)?)
        }
        None => {
            let config = CacheConfig::with_capacity(args.capacity);
            config.validate()?;
            Ok(config)
        }
    }
}

/// Feed every script line to the handler and print the replies
///
/// # Returns
/// * `Result<usize>` - Number of error replies
fn run_script<R: BufRead, W: Write>(
    handler: &CommandHandler,
    input: R,
    output: &mut W,
    strict: bool,
) -> Result<usize> {
    let mut errors = 0;

    for (lineno, line) in input.lines().enumerate() {
        let line = line.context("failed to read script line")?;
        let Some(reply) = handler.handle(&line) else {
            continue;
        };

        writeln!(output, "{}", reply.render())?;
        if reply.is_error() {
            errors += 1;
            if strict {
                output.flush()?;
                bail!("line {}: {}", lineno + 1, reply.render());
            }
        }
    }

    output.flush()?;
    Ok(errors)
}
