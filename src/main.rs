//! grit-nearest: nearest-gene lookup for genomic intervals
//!
//! Usage: grit-nearest <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use rayon::ThreadPoolBuildError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

use grit_nearest::bed::BedError;
use grit_nearest::commands::{NearestCommand, SortCommand};
use grit_nearest::config::{ParseMode, DEFAULT_CAP, DEFAULT_GENE_COLUMN, DEFAULT_MAX_DISTANCE};
use grit_nearest::mapping::MappingTable;

#[derive(Parser)]
#[command(name = "grit-nearest")]
#[command(version)]
#[command(about = "Report the genes nearest to a set of genomic intervals", long_about = None)]
struct Cli {
    /// Number of threads to use for sorting (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the id of the nearest gene for each query interval
    Nearest {
        /// Query BED file (use - for stdin)
        #[arg(short = 'a', long)]
        file_a: PathBuf,

        /// Gene BED file with the gene id in the seventh column
        #[arg(short = 'b', long)]
        file_b: PathBuf,

        /// Two-column table translating gene ids to display names
        #[arg(short = 'm', long)]
        mapping: Option<PathBuf>,

        /// Maximum distance to the nearest gene (inclusive)
        #[arg(short = 'D', long, default_value_t = DEFAULT_MAX_DISTANCE)]
        max_distance: u64,

        /// Maximum number of ids to report
        #[arg(short = 'n', long, default_value_t = DEFAULT_CAP)]
        cap: usize,

        /// 0-based column holding the gene id in file B
        #[arg(long, default_value_t = DEFAULT_GENE_COLUMN)]
        gene_column: usize,

        /// Fail on the first malformed line instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Inputs are already sorted; validate instead of sorting
        #[arg(long)]
        assume_sorted: bool,

        /// Print run statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Sort a BED file by chromosome and position
    Sort {
        /// Input BED file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fail on the first malformed line instead of skipping it
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(cli.verbose.log_level_filter().as_trace())
            .with_writer(io::stderr)
            .init(),
    };

    let parallel = match configure_threads(cli.threads) {
        Ok(parallel) => parallel,
        Err(e) => {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Nearest {
            file_a,
            file_b,
            mapping,
            max_distance,
            cap,
            gene_column,
            strict,
            assume_sorted,
            stats,
        } => {
            let mut cmd = NearestCommand::new()
                .with_max_distance(max_distance)
                .with_cap(cap)
                .with_gene_column(gene_column)
                .with_parse_mode(ParseMode::from_strict(strict));
            cmd.assume_sorted = assume_sorted;
            cmd.parallel_sort = parallel;
            run_nearest(&cmd, file_a, file_b, mapping, stats)
        }

        Commands::Sort { input, strict } => run_sort(input, strict, parallel),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Build the global rayon pool. Returns whether parallel sorting is enabled.
fn configure_threads(threads: Option<usize>) -> Result<bool, ThreadPoolBuildError> {
    match threads {
        Some(n) => {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build_global()?;
            Ok(n > 1)
        }
        None => Ok(rayon::current_num_threads() > 1),
    }
}

fn is_stdin(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn run_nearest(
    cmd: &NearestCommand,
    file_a: PathBuf,
    file_b: PathBuf,
    mapping: Option<PathBuf>,
    stats: bool,
) -> Result<(), BedError> {
    if is_stdin(&file_a) && is_stdin(&file_b) {
        return Err(BedError::InvalidFormat(
            "Only one of -a and -b can read from stdin".to_string(),
        ));
    }

    let mapping = match mapping {
        Some(path) => Some(MappingTable::from_reader(File::open(&path)?, cmd.parse_mode)?),
        None => None,
    };

    let query: Box<dyn io::Read> = if is_stdin(&file_a) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&file_a)?)
    };
    let reference: Box<dyn io::Read> = if is_stdin(&file_b) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&file_b)?)
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let result = cmd.run(query, reference, mapping.as_ref(), &mut handle)?;

    if stats {
        eprintln!("Nearest stats: {}", result);
        eprintln!("Sweep stats: {}", result.sweep);
    }

    Ok(())
}

fn run_sort(input: Option<PathBuf>, strict: bool, parallel: bool) -> Result<(), BedError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let cmd = SortCommand { parallel };
    let mode = ParseMode::from_strict(strict);

    match input {
        Some(path) if !is_stdin(&path) => cmd.run(File::open(&path)?, &mut handle, mode)?,
        _ => cmd.run(io::stdin().lock(), &mut handle, mode)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_builds_only_once() {
        // The global pool can only be built once per process
        let _ = configure_threads(Some(2));
        assert!(configure_threads(Some(2)).is_err());
    }

    #[test]
    fn test_nearest_defaults() {
        let cli = Cli::try_parse_from(["grit-nearest", "nearest", "-a", "q.bed", "-b", "g.bed"])
            .unwrap();

        match cli.command {
            Commands::Nearest {
                max_distance,
                cap,
                gene_column,
                strict,
                ..
            } => {
                assert_eq!(max_distance, DEFAULT_MAX_DISTANCE);
                assert_eq!(cap, DEFAULT_CAP);
                assert_eq!(gene_column, DEFAULT_GENE_COLUMN);
                assert!(!strict);
            }
            Commands::Sort { .. } => panic!("expected nearest"),
        }
    }
}
