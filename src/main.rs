// Clippy allows
#![allow(clippy::too_many_arguments)]

//! tsv-sieve: streaming tally and filter for large TSV dumps
//!
//! Usage: tsv-sieve <COMMAND> [OPTIONS]

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;

use tsv_sieve::commands::{FilterCommand, TallyCommand};
use tsv_sieve::config::{parse_delimiter, FilterConfig, MissingFieldPolicy, WriteMode};
use tsv_sieve::predicate::Predicate;
use tsv_sieve::streaming::{ensure_stdin_distinct, open_destination};
use tsv_sieve::tally::{Normalizer, ReportOrder};
use tsv_sieve::tsv::Result;

#[derive(Parser)]
#[command(name = "tsv-sieve")]
#[command(version)]
#[command(about = "Streaming tally and filter for large tab-separated data dumps", long_about = None)]
struct Cli {
    /// Field delimiter: a single ASCII character, or "tab"
    #[arg(long, short = 'd', global = true, default_value = "tab")]
    delimiter: String,

    /// Skip records that lack the selected field instead of aborting
    #[arg(long, global = true)]
    skip_malformed: bool,

    /// Use smaller I/O buffers
    #[arg(long, global = true)]
    low_memory: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the values of one field across all records
    Tally {
        /// Input TSV file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Zero-based index of the field to count
        #[arg(short, long)]
        field: usize,

        /// Count only these values by name; everything else goes to --other
        #[arg(long, num_args = 1..)]
        keep: Vec<String>,

        /// Bucket name for values not listed in --keep
        #[arg(long, default_value = "Other", requires = "keep")]
        other: String,

        /// Report row order
        #[arg(long, value_enum, default_value = "count")]
        sort: SortArg,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print tally statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Copy the header and every record whose field matches
    Filter {
        /// Input TSV file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Destination file (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Zero-based index of the field to test
        #[arg(short, long)]
        field: usize,

        #[command(flatten)]
        predicate: PredicateArgs,

        /// Append to or truncate an existing destination
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Print filter statistics to stderr
        #[arg(long)]
        stats: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PredicateArgs {
    /// Keep records whose field equals this value
    #[arg(long)]
    equals: Option<String>,

    /// Keep records whose field differs from this value
    #[arg(long)]
    not_equals: Option<String>,

    /// Keep records whose field is any of these values
    #[arg(long, num_args = 1..)]
    one_of: Vec<String>,
}

impl PredicateArgs {
    fn into_predicate(self) -> Predicate {
        if let Some(v) = self.equals {
            Predicate::equals(v)
        } else if let Some(v) = self.not_equals {
            Predicate::not_equals(v)
        } else {
            Predicate::one_of(self.one_of)
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Append,
    Truncate,
}

impl From<ModeArg> for WriteMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Append => WriteMode::Append,
            ModeArg::Truncate => WriteMode::Truncate,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Count,
    Value,
}

impl From<SortArg> for ReportOrder {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Count => ReportOrder::Count,
            SortArg::Value => ReportOrder::Value,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let result = build_config(&cli).and_then(|config| match cli.command {
        Commands::Tally {
            input,
            field,
            keep,
            other,
            sort,
            output,
            stats,
        } => run_tally(config, input, field, keep, other, sort, output, stats),

        Commands::Filter {
            input,
            output,
            field,
            predicate,
            mode,
            stats,
        } => run_filter(config, input, output, field, predicate, mode, stats),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Set up stderr logging. `RUST_LOG` overrides the flag-derived level.
fn setup_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tsv_sieve={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();

    debug!("Logging initialized at level: {}", level);
}

fn build_config(cli: &Cli) -> Result<FilterConfig> {
    let policy = if cli.skip_malformed {
        MissingFieldPolicy::Skip
    } else {
        MissingFieldPolicy::Abort
    };
    Ok(FilterConfig::new()
        .with_delimiter(parse_delimiter(&cli.delimiter)?)
        .with_missing_field(policy)
        .with_low_memory(cli.low_memory))
}

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn run_tally(
    config: FilterConfig,
    input: Option<PathBuf>,
    field: usize,
    keep: Vec<String>,
    other: String,
    sort: SortArg,
    output: Option<PathBuf>,
    stats: bool,
) -> Result<()> {
    let normalizer = if keep.is_empty() {
        Normalizer::Identity
    } else {
        Normalizer::keep_or_bucket(keep, other)
    };
    let cmd = TallyCommand::new(field)
        .with_normalizer(normalizer)
        .with_config(config);

    let (tally, result) = match input {
        Some(path) if !is_stdio(&path) => cmd.run(&path)?,
        _ => cmd.run_stdin()?,
    };

    if stats {
        eprintln!("Tally stats: {}", result);
    }

    match output {
        Some(path) if !is_stdio(&path) => tally.write_report(File::create(&path)?, sort.into()),
        _ => {
            let stdout = io::stdout();
            tally.write_report(stdout.lock(), sort.into())
        }
    }
}

fn run_filter(
    config: FilterConfig,
    input: PathBuf,
    output: PathBuf,
    field: usize,
    predicate: PredicateArgs,
    mode: ModeArg,
    stats: bool,
) -> Result<()> {
    let cmd = FilterCommand::new(field, predicate.into_predicate(), mode.into()).with_config(config);

    let result = match (is_stdio(&input), is_stdio(&output)) {
        (false, false) => cmd.run(&input, &output)?,
        (false, true) => cmd.run_to_writer(&input, io::stdout().lock())?,
        (true, true) => cmd.run_stdin(io::stdout().lock())?,
        (true, false) => {
            ensure_stdin_distinct(&output)?;
            let dest = open_destination(&output, mode.into())?;
            cmd.run_stdin(dest)?
        }
    };

    if stats {
        eprintln!("Filter stats: {}", result);
    }

    Ok(())
}
