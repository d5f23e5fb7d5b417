use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use rs_nextword_core::io::build_output_path;
use rs_nextword_core::{ModelStats, NextWordError, PredictorConfig, Session, TrainingReport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Markov next-word predictor", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a model from a text file and print its statistics
    Train(TrainArgs),
    /// Predict the next word after some text
    Predict(PredictArgs),
    /// Print model statistics
    Stats(StatsArgs),
    /// Continue some text with sampled words
    Generate(GenerateArgs),
    /// Read lines from stdin and predict after each one
    Repl(ReplArgs),
}

/// Where the model comes from: a text file to train on or a saved snapshot.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ModelSource {
    /// Text file to train on
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Snapshot written by `train --save`
    #[arg(short, long, value_name = "PATH")]
    model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Text file to train on
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Save a snapshot of the trained model
    #[arg(long)]
    save: bool,

    /// Snapshot path (defaults to the input path with a .bin extension)
    #[arg(short, long, value_name = "PATH", requires = "save")]
    output: Option<PathBuf>,

    /// Bytes read per step while loading the file
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[command(flatten)]
    source: ModelSource,

    /// Number of suggestions
    #[arg(short, long, value_name = "N", default_value_t = rs_nextword_core::config::DEFAULT_TOP_K)]
    k: usize,

    /// Print suggestions as a JSON array
    #[arg(long)]
    json: bool,

    /// Typed text; the last word is the prefix
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(flatten)]
    source: ModelSource,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    source: ModelSource,

    /// Maximum number of generated words
    #[arg(short, long, value_name = "N", default_value_t = rs_nextword_core::config::DEFAULT_MAX_PHRASE_WORDS)]
    words: usize,

    /// Seed for reproducible output
    #[arg(long, value_name = "U64")]
    seed: Option<u64>,

    /// Text to continue
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
}

#[derive(Args, Debug)]
struct ReplArgs {
    #[command(flatten)]
    source: ModelSource,

    /// Number of suggestions per line
    #[arg(short, long, value_name = "N", default_value_t = rs_nextword_core::config::DEFAULT_TOP_K)]
    k: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
        Commands::Stats(args) => run_stats(args),
        Commands::Generate(args) => run_generate(args),
        Commands::Repl(args) => run_repl(args),
    }
}

/// Level forced by `-v`/`-q`; `None` leaves `RUST_LOG` (default `info`) in charge.
fn verbosity_override(verbose: u8, quiet: u8) -> Option<LevelFilter> {
    match (verbose, quiet) {
        (0, 0) => None,
        (_, 1) => Some(LevelFilter::Warn),
        (_, q) if q > 1 => Some(LevelFilter::Error),
        (1, _) => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Some(level) = verbosity_override(verbose, quiet) {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

fn make_progress_bar(path: &Path) -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.set_message(format!("loading {}", path.display()));
    bar
}

/// Trains a session on `path`, drawing a progress bar unless disabled.
fn train_session(path: &Path, config: PredictorConfig, show_progress: bool) -> Result<Session> {
    let mut session = Session::new(config);
    let bar = show_progress.then(|| make_progress_bar(path));
    let report = session
        .train_file_with_progress(path, |read, total| {
            if let Some(bar) = &bar {
                bar.set_length(total);
                bar.set_position(read);
            }
        })
        .with_context(|| format!("failed to train on {}", path.display()))?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    info!("model ready: {} words", report.stats.vocab_size);
    Ok(session)
}

fn open_session(source: &ModelSource, config: PredictorConfig) -> Result<Session> {
    match (&source.input, &source.model) {
        (_, Some(model)) => Session::load_snapshot(model, config)
            .with_context(|| format!("failed to load snapshot {}", model.display())),
        (Some(input), None) => train_session(input, config, false),
        (None, None) => anyhow::bail!("either --input or --model is required"),
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut builder = PredictorConfig::builder();
    if let Some(chunk_size) = args.chunk_size {
        builder = builder.chunk_size(chunk_size);
    }
    let config = builder.build()?;

    let session = train_session(&args.input, config, !args.no_progress && !args.json)?;
    let report = session
        .last_report()
        .context("training finished without a report")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_json(report))?);
    } else {
        print_report(report);
    }

    if args.save {
        let output = match args.output {
            Some(output) => output,
            None => build_output_path(&args.input, "bin")?,
        };
        session
            .save_snapshot(&output)
            .with_context(|| format!("failed to save snapshot to {}", output.display()))?;
        info!("snapshot written to {}", output.display());
    }
    Ok(())
}

fn report_json(report: &TrainingReport) -> serde_json::Value {
    json!({
        "file_name": report.source.name,
        "file_size_bytes": report.source.size_bytes,
        "training_seconds": report.elapsed.as_secs_f64(),
        "token_count": report.token_count,
        "stats": report.stats,
    })
}

fn print_report(report: &TrainingReport) {
    println!("File:               {} ({:.1} KB)", report.source.name, report.source.size_bytes as f64 / 1024.0);
    println!("Training time:      {:.2} seconds", report.elapsed.as_secs_f64());
    println!("Tokens:             {}", report.token_count);
    print_stats(&report.stats);
}

fn print_stats(stats: &ModelStats) {
    println!("Vocabulary size:    {} words", stats.vocab_size);
    println!("Unique transitions: {}", stats.unique_transitions);
    println!("Total transitions:  {}", stats.total_transitions);
    println!("Repetition F1:      {:.3}", stats.repetition_f1);
    match stats.compression_ratio {
        Some(ratio) => println!("Compression ratio:  {ratio:.1}x"),
        None => println!("Compression ratio:  N/A"),
    }
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let session = open_session(&args.source, PredictorConfig::default())?;
    let text = args.text.join(" ");
    let words = session.predict_top(&text, args.k)?;

    if args.json {
        println!("{}", serde_json::to_string(&words)?);
    } else {
        for word in words {
            println!("{word}");
        }
    }
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let session = open_session(&args.source, PredictorConfig::default())?;
    let stats = session.stats()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        if let Some(source) = session.source() {
            println!("Source:             {}", source.name);
        }
        print_stats(&stats);
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = PredictorConfig::builder().max_phrase_words(args.words.max(1)).build()?;
    let session = open_session(&args.source, config)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let text = args.text.join(" ");
    let mut phrase = session.continue_phrase(&text, args.words, &mut rng)?;
    phrase.insert(0, text.trim().to_owned());
    println!("{}", phrase.join(" "));
    Ok(())
}

fn run_repl(args: ReplArgs) -> Result<()> {
    let session = open_session(&args.source, PredictorConfig::default())?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":stats" => print_stats(&session.stats()?),
            text => match session.predict_top(text, args.k) {
                Ok(words) => writeln!(stdout, "{}", words.join(", "))?,
                // Keep the loop alive on per-line failures
                Err(err @ (NextWordError::UnknownPrefix(_) | NextWordError::EmptyPrefix)) => {
                    writeln!(stdout, "{err}")?
                }
                Err(err) => return Err(err.into()),
            },
        }
        stdout.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_defer_to_rust_log() {
        assert_eq!(verbosity_override(0, 0), None);
    }

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(verbosity_override(2, 1), Some(LevelFilter::Warn));
        assert_eq!(verbosity_override(0, 3), Some(LevelFilter::Error));
    }

    #[test]
    fn verbose_levels() {
        assert_eq!(verbosity_override(1, 0), Some(LevelFilter::Debug));
        assert_eq!(verbosity_override(4, 0), Some(LevelFilter::Trace));
    }
}
