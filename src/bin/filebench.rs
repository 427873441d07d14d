use std::{io, path::PathBuf, process, time::Duration};

use clap::{Parser, ValueEnum};
use filebench::{
    BenchError, CompareConfig, Confirm, FixedAnswer, Harness, HarnessConfig, Pairing,
    SamplerConfig, StdinConfirm, WorkloadConfig, split_dirs,
};
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum PairingArg {
    /// Pair records by position in the run
    #[default]
    Index,
    /// Pair records by benchmark name
    Name,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Benchmark an executable over a set of input files")]
struct Args {
    /// Directories to scan, separated by ':'
    dirs: String,
    /// Only run files whose name contains this text
    #[arg(default_value = "")]
    pattern: String,
    /// Executable each input file is passed to
    #[arg(long, env = "FILEBENCH_RUNTIME", default_value = "./target/release/aria")]
    runtime: PathBuf,
    /// Extension of input files, without the dot
    #[arg(long, default_value = "aria")]
    extension: String,
    /// Directory receiving the results and baseline reports
    #[arg(long, env = "FILEBENCH_OUTPUT", default_value = "target/filebench")]
    output: PathBuf,
    /// Title stored with the results
    #[arg(long, default_value = "Benchmarking Aria execution time")]
    title: String,
    /// Relative change reported as a regression or improvement
    #[arg(long, default_value_t = 0.05)]
    threshold: f64,
    /// How baseline and new results are matched
    #[arg(long, value_enum, default_value_t)]
    pairing: PairingArg,
    /// Epochs per benchmark
    #[arg(long, default_value_t = 11)]
    epochs: u64,
    /// Unmeasured iterations before sampling
    #[arg(long, default_value_t = 0)]
    warmup: u64,
    #[arg(long, default_value_t = 1)]
    min_epoch_time_ms: u64,
    #[arg(long, default_value_t = 100)]
    max_epoch_time_ms: u64,
    /// Kill an invocation after this many seconds (0 disables the limit)
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
    /// Fail a benchmark whose process exits with a non-zero status
    #[arg(long)]
    fail_on_nonzero: bool,
    /// Do not read hardware performance counters
    #[arg(long)]
    no_counters: bool,
    /// Always collect every epoch instead of stopping on a stable median
    #[arg(long)]
    no_early_stop: bool,
    /// Disable coloured output
    #[arg(long)]
    no_color: bool,
    /// Save the results as the new baseline without asking
    #[arg(long, conflicts_with = "no_save")]
    yes: bool,
    /// Never save the results as the new baseline
    #[arg(long)]
    no_save: bool,
    /// Log sampling details
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> HarnessConfig {
        let sampler = SamplerConfig {
            epochs: self.epochs,
            warmup: self.warmup,
            min_epoch_time: Duration::from_millis(self.min_epoch_time_ms),
            max_epoch_time: Duration::from_millis(self.max_epoch_time_ms),
            hardware_counters: !self.no_counters,
            convergence: if self.no_early_stop {
                None
            } else {
                SamplerConfig::default().convergence
            },
            ..SamplerConfig::default()
        };
        HarnessConfig {
            title: self.title,
            dirs: split_dirs(&self.dirs),
            pattern: self.pattern,
            extension: self.extension,
            output: self.output,
            color: !self.no_color,
            sampler,
            compare: CompareConfig {
                threshold: self.threshold,
                pairing: match self.pairing {
                    PairingArg::Index => Pairing::Positional,
                    PairingArg::Name => Pairing::ByName,
                },
            },
            workload: WorkloadConfig {
                runtime: self.runtime,
                timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
                fail_on_nonzero: self.fail_on_nonzero,
            },
            ..HarnessConfig::default()
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(FixedAnswer(true))
    } else if args.no_save {
        Box::new(FixedAnswer(false))
    } else {
        Box::new(StdinConfirm::stdin())
    };
    if args.no_color {
        colored::control::set_override(false);
    }

    let harness = match Harness::new(args.into_config()) {
        Ok(harness) => harness,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    match harness.run(confirm.as_mut(), &mut io::stdout()) {
        Ok(summary) => {
            for failure in &summary.outcome.failures {
                eprintln!("failed: {}: {}", failure.target, failure.error);
            }
            if summary.outcome.collection.is_empty() {
                eprintln!("no benchmark produced a result");
                process::exit(1);
            }
        }
        Err(err @ BenchError::InvalidInput(_)) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
        Err(err) => {
            eprintln!("benchmark run failed: {err}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
