mod ladder_file;
mod reports;
mod seeds;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use ladder_file::FileLadder;
use ranksim_game::numbers::{round_f64_to_u32, u64_to_f64};
use ranksim_game::{
    BatchConfig, BatchProgress, BatchResult, BuiltinLadder, RankLadder, Simulator, SweepPoint,
    SweepProgress, default_sweep_win_rates, estimated_total_games,
};
use seeds::{SeedInfo, resolve_seed};
use util::parse_win_rates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for a terminal
    Console,
    /// Machine-readable result with per-tier summaries
    Json,
    /// Summary tables in Markdown
    Markdown,
    /// One row per simulated season
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "ranksim", version)]
#[command(about = "Estimate how many ranked games it takes to reach the top of the ladder")]
struct Args {
    /// Probability of winning any single game
    #[arg(long, default_value_t = 0.6)]
    win_rate: f64,

    /// Points held at the start of the season
    #[arg(long, default_value_t = 0)]
    starting_points: i64,

    /// Number of seasons to simulate (defaults to a count derived from the win rate)
    #[arg(long)]
    seasons: Option<u32>,

    /// Batch seed: an integer, 0x-prefixed hex, or `random`
    #[arg(long, default_value = "random")]
    seed: String,

    /// Per-season game limit before a season is abandoned
    #[arg(long, default_value_t = ranksim_game::constants::DEFAULT_MAX_GAMES_PER_SEASON)]
    max_games: u32,

    /// Simulate seasons on the current thread only
    #[arg(long)]
    sequential: bool,

    /// Allow win rates outside 0.40..=0.80
    #[arg(long)]
    unbounded: bool,

    /// JSON ladder definition to use instead of the built-in ladder
    #[arg(long)]
    ladder: Option<PathBuf>,

    /// Print the active ladder as JSON and exit
    #[arg(long)]
    dump_ladder: bool,

    /// Run one batch per win rate instead of a single batch
    #[arg(long)]
    sweep: bool,

    /// Win rates for --sweep (comma-separated, defaults to 0.40..=0.80)
    #[arg(long)]
    win_rates: Option<String>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not draw the progress indicator
    #[arg(long)]
    no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let simulator = load_simulator(&args)?;
    if maybe_dump_ladder(&args, simulator.ladder())? {
        return Ok(());
    }

    let seed = resolve_seed(&args.seed)?;
    let template = build_config(&args, seed.seed);

    announce_banner();
    if args.verbose {
        describe_run(&args, &seed);
    }

    let start_time = Instant::now();
    if args.sweep {
        let points = run_sweep(&args, &simulator, &template)?;
        write_sweep_reports(&args, &points, start_time)?;
    } else {
        let result = run_single(&args, &simulator, &template)?;
        write_reports(&args, &result, start_time)?;
    }
    Ok(())
}

fn load_simulator(args: &Args) -> Result<Simulator> {
    match &args.ladder {
        Some(path) => {
            let source = FileLadder::new(path);
            info!("loading ladder from {}", source.path().display());
            Simulator::from_source(&source)
                .with_context(|| format!("unusable ladder file {}", source.path().display()))
        }
        None => Simulator::from_source(&BuiltinLadder),
    }
}

fn maybe_dump_ladder(args: &Args, ladder: &RankLadder) -> Result<bool> {
    if !args.dump_ladder {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let json = ladder
        .to_config()
        .to_json_pretty()
        .context("failed to serialize ladder")?;
    writeln!(output_target.writer(), "{json}")?;
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    eprintln!("{}", "🏆 Ranked Ladder Season Simulator".bright_cyan().bold());
    eprintln!("{}", "==================================".cyan());
}

fn describe_run(args: &Args, seed: &SeedInfo) {
    let origin = if seed.random { " (random)" } else { "" };
    eprintln!("Seed: {}{origin}", seed.seed);
    eprintln!(
        "Ladder: {}",
        args.ladder
            .as_ref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
    );
    eprintln!(
        "Execution: {}",
        if args.sequential {
            "sequential"
        } else {
            "parallel"
        }
    );
}

fn build_config(args: &Args, seed: u64) -> BatchConfig {
    let config = BatchConfig::new(args.win_rate, args.starting_points, seed)
        .with_max_games(args.max_games)
        .with_parallel(!args.sequential);
    match args.seasons {
        Some(seasons) => config.with_seasons(seasons),
        None => config,
    }
}

fn check_product_range(config: &BatchConfig, unbounded: bool) -> Result<()> {
    if unbounded {
        return Ok(());
    }
    config
        .validate_product_range()
        .context("pass --unbounded to simulate this win rate anyway")
}

fn progress_label(simulator: &Simulator, config: &BatchConfig) -> String {
    let seasons = config.season_count();
    let estimate = if *simulator.ladder() == RankLadder::builtin() {
        estimated_total_games(config.win_rate, seasons)
    } else {
        None
    };
    match estimate {
        Some(games) => format!(
            "Challenging {:.1}M trainers to battle",
            u64_to_f64(games) / 1_000_000.0
        ),
        None => format!("Simulating {seasons} seasons"),
    }
}

/// Draws a percentage on stderr, redrawing only when the whole percent changes.
struct ProgressLine {
    label: String,
    enabled: bool,
    shown: AtomicU32,
}

impl ProgressLine {
    fn new(label: String, enabled: bool) -> Self {
        Self {
            label,
            enabled,
            shown: AtomicU32::new(0),
        }
    }

    fn observe(&self, progress: BatchProgress) {
        self.observe_fraction(progress.fraction());
    }

    fn observe_fraction(&self, fraction: f64) {
        if !self.enabled {
            return;
        }
        let pct = round_f64_to_u32((fraction * 100.0).floor());
        let previous = self.shown.fetch_max(pct, Ordering::Relaxed);
        if pct > previous {
            eprint!("\r{} {pct:>3}%", self.label);
        }
    }

    fn finish(&self) {
        if self.enabled {
            eprintln!();
        }
    }
}

fn run_single(args: &Args, simulator: &Simulator, config: &BatchConfig) -> Result<BatchResult> {
    check_product_range(config, args.unbounded)?;
    let progress = ProgressLine::new(progress_label(simulator, config), !args.no_progress);
    let result = simulator.run_with_progress(config, &|p: BatchProgress| progress.observe(p));
    progress.finish();
    result.context("simulation failed")
}

fn sweep_win_rates(args: &Args) -> Result<Vec<f64>> {
    match &args.win_rates {
        Some(list) => parse_win_rates(list),
        None => Ok(default_sweep_win_rates()),
    }
}

fn run_sweep(
    args: &Args,
    simulator: &Simulator,
    template: &BatchConfig,
) -> Result<Vec<SweepPoint>> {
    let win_rates = sweep_win_rates(args)?;
    for &win_rate in &win_rates {
        check_product_range(&template.with_win_rate(win_rate), args.unbounded)?;
    }
    let progress = ProgressLine::new(
        format!("Sweeping {} win rates", win_rates.len()),
        !args.no_progress,
    );
    let points = simulator.sweep_with_progress(&win_rates, template, &|p: SweepProgress| {
        progress.observe_fraction(p.fraction());
    });
    progress.finish();
    points.context("sweep failed")
}

fn write_reports(args: &Args, result: &BatchResult, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut output_target, result)?,
        ReportFormat::Markdown => reports::generate_markdown_report(&mut output_target, result)?,
        ReportFormat::Csv => reports::generate_csv_report(&mut output_target, result)?,
        ReportFormat::Console => {
            reports::generate_console_report(&mut output_target, result, start_time.elapsed())?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn write_sweep_reports(args: &Args, points: &[SweepPoint], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => reports::generate_sweep_json_report(&mut output_target, points)?,
        ReportFormat::Markdown => {
            reports::generate_sweep_markdown_report(&mut output_target, points)?;
        }
        ReportFormat::Csv => reports::generate_sweep_csv_report(&mut output_target, points)?,
        ReportFormat::Console => reports::generate_sweep_console_report(
            &mut output_target,
            points,
            start_time.elapsed(),
        )?,
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
