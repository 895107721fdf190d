use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use range_core::errors::RangeError;
use range_net::{generate, GeneratorConfig, MAX_NODES, MIN_NODES};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "range",
    version,
    about = "Random transcription network generator emitting the NEMO motif grammar"
)]
struct Cli {
    /// Number of genes in the network.
    genes: usize,
    /// Print the node degree distribution after the network.
    #[arg(short = 'd', long = "distribution")]
    distribution: bool,
    /// Print the degree of every node after the network.
    #[arg(short = 'n', long = "node-degrees")]
    node_degrees: bool,
    /// Seed for the random number generator.
    #[arg(short, long)]
    seed: Option<u64>,
    /// YAML configuration; command line values take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write a JSON run summary to this path.
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Re-parse the document and cross-check every node degree.
    #[arg(long)]
    verify: bool,
    /// Log generation decisions to stderr (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn generator_config(&self) -> Result<GeneratorConfig, RangeError> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_yaml_file(path)?,
            None => GeneratorConfig::default(),
        };
        config.node_count = self.genes;
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.verify |= self.verify;
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.generator_config()?;
    debug!(?config, "resolved configuration");
    let network = generate(&config)?;

    if let Some(path) = &cli.summary {
        network.summary().write_json(path)?;
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    out.write_all(network.document().as_bytes())?;
    if cli.distribution {
        write!(out, "{}", network.histogram())?;
    }
    if cli.node_degrees {
        write!(out, "{}", network.listing())?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("range: {err}");
            if let Some(range_err) = err.downcast_ref::<RangeError>() {
                if range_err.is_user_error() {
                    eprintln!(
                        "usage: range [options] <number of genes in network, >= {MIN_NODES}, <= {MAX_NODES}>"
                    );
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_match_the_classic_interface() {
        let cli = Cli::try_parse_from(["range", "-d", "-n", "-s", "42", "250"]).unwrap();
        assert!(cli.distribution);
        assert!(cli.node_degrees);
        let config = cli.generator_config().unwrap();
        assert_eq!(config.node_count, 250);
        assert_eq!(config.seed, 42);
        assert!(!config.verify);
    }

    #[test]
    fn non_numeric_seed_is_a_usage_error() {
        let err = Cli::try_parse_from(["range", "-s", "abc", "100"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn gene_count_is_required() {
        assert!(Cli::try_parse_from(["range", "-d"]).is_err());
    }

    #[test]
    fn out_of_range_genes_fail_validation() {
        let cli = Cli::try_parse_from(["range", "20"]).unwrap();
        let err = cli.generator_config().unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn command_line_overrides_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("range.yaml");
        std::fs::write(&path, "node_count: 64\nseed: 5\nmotif_stride: 3\n").unwrap();
        let cli = Cli::try_parse_from([
            "range",
            "--config",
            path.to_str().unwrap(),
            "--verify",
            "128",
        ])
        .unwrap();
        let config = cli.generator_config().unwrap();
        assert_eq!(config.node_count, 128);
        assert_eq!(config.seed, 5);
        assert_eq!(config.motif_stride, 3);
        assert!(config.verify);
    }
}
