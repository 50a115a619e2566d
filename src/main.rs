//! CLI entry point for sprout

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser, ValueEnum};
use rayon::prelude::*;
use sprout::{
    DEFAULT_REQUIRES_PYTHON, Error, FileReport, JsonEntry, ProcessOptions, Reporter, Tally,
    print_json, process_file, select_oracle,
};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            // Respect FORCE_COLOR environment variable
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            // Respect TERM=dumb
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            // Check if stdout is a TTY
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sprout")]
#[command(about = "Inject PEP 723 inline dependency metadata into Python scripts")]
#[command(version)]
struct Args {
    /// Python scripts to process
    #[arg(value_name = "SCRIPT")]
    scripts: Vec<PathBuf>,

    /// requires-python specifier for newly created blocks
    #[arg(long = "python", value_name = "SPEC", default_value = DEFAULT_REQUIRES_PYTHON)]
    python: String,

    /// Analyze and report without modifying files
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Also show stdlib and local modules per file
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Classify against this interpreter's standard library instead of the
    /// bundled table
    #[arg(long = "interpreter", value_name = "PYTHON")]
    interpreter: Option<PathBuf>,

    /// Output per-file results as JSON
    #[arg(long = "json")]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Number of parallel workers for batch processing
    /// (0 = auto-detect, 1 = sequential, N = use N workers)
    #[arg(short = 'j', long = "jobs", default_value = "0")]
    jobs: usize,
}

/// What happened to one input path.
enum Processed {
    Report(FileReport),
    Skipped(PathBuf, &'static str),
    Failed(PathBuf, Error),
}

fn main() {
    let args = Args::parse();

    if args.scripts.is_empty() {
        if let Err(e) = Args::command().print_help() {
            eprintln!("sprout: {e}");
        }
        return;
    }

    let oracle = select_oracle(args.interpreter.as_deref());
    let options = ProcessOptions {
        requires_python: args.python.clone(),
        dry_run: args.dry_run,
    };

    let run = |path: &PathBuf| -> Processed {
        if !path.exists() {
            return Processed::Skipped(path.clone(), "file not found");
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("py") {
            return Processed::Skipped(path.clone(), "not a .py file");
        }
        match process_file(path, &options, oracle.as_ref()) {
            Ok(report) => Processed::Report(report),
            Err(err) => Processed::Failed(path.clone(), err),
        }
    };

    // Files are independent, so the batch may fan out; results are printed
    // sequentially in input order either way.
    let results: Vec<Processed> = if args.jobs == 1 || args.scripts.len() <= 1 {
        args.scripts.iter().map(run).collect()
    } else {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(args.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| args.scripts.par_iter().map(run).collect()),
            Err(_) => args.scripts.iter().map(run).collect(),
        }
    };

    let tally = match report_results(&args, &results) {
        Ok(tally) => tally,
        Err(e) => {
            eprintln!("sprout: error writing output: {e}");
            process::exit(1);
        }
    };

    if tally.failed > 0 {
        process::exit(1);
    }
}

fn report_results(args: &Args, results: &[Processed]) -> std::io::Result<Tally> {
    let mut tally = Tally::default();

    if args.json {
        let mut entries = Vec::with_capacity(results.len());
        for item in results {
            match item {
                Processed::Report(report) => {
                    tally.record(report.outcome);
                    entries.push(JsonEntry::from_report(report));
                }
                Processed::Skipped(path, reason) => {
                    tally.skipped += 1;
                    entries.push(JsonEntry::skipped(path, reason));
                }
                Processed::Failed(path, err) => {
                    tally.failed += 1;
                    entries.push(JsonEntry::from_error(path, err));
                }
            }
        }
        print_json(&entries)?;
        return Ok(tally);
    }

    let reporter = Reporter::new(should_use_color(args.color), args.verbose);
    for item in results {
        match item {
            Processed::Report(report) => {
                reporter.file_header(&report.path)?;
                reporter.report(report)?;
                tally.record(report.outcome);
            }
            Processed::Skipped(path, reason) => {
                reporter.file_header(path)?;
                reporter.warn(reason)?;
                tally.skipped += 1;
            }
            Processed::Failed(path, err) => {
                reporter.file_header(path)?;
                reporter.failure(err)?;
                tally.failed += 1;
            }
        }
    }
    reporter.summary(&tally)?;

    Ok(tally)
}
