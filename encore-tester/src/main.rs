mod logic;
mod storage;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use encore_game::{DiceRetention, ScoringMode};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{GameplayStrategy, RunPlan, ScenarioResult, SeasonTester, resolve_seed_inputs};
use storage::FileStore;
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Weighted skill-check dice
    Dice,
    /// Summed training contributions
    Legacy,
}

impl From<ModeArg> for ScoringMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Dice => Self::Dice,
            ModeArg::Legacy => Self::Legacy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RetentionArg {
    /// Keep the latest roll per skill
    Last,
    /// Keep the highest roll per skill
    Best,
}

impl From<RetentionArg> for DiceRetention {
    fn from(retention: RetentionArg) -> Self {
        match retention {
            RetentionArg::Last => Self::Last,
            RetentionArg::Best => Self::Best,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "encore-tester", version = "0.1.0")]
#[command(about = "Automated season simulation and balance QA for Encore")]
struct Args {
    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated numbers or share codes, or `all`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Seasons per strategy and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Scoring mode for numeric seeds; share codes carry their own
    #[arg(long, value_enum, default_value_t = ModeArg::Dice)]
    mode: ModeArg,

    /// Which skill-check roll counts toward the release
    #[arg(long, value_enum, default_value_t = RetentionArg::Last)]
    retention: RetentionArg,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist every simulated career as JSON under this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let store = args.save_dir.as_ref().map(FileStore::open).transpose()?;

    let plan = RunPlan {
        strategies,
        seeds,
        iterations: args.iterations,
        mode: args.mode.into(),
        retention: args.retention.into(),
    };
    let results = SeasonTester::new(args.verbose, store).run_plan(&plan);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:10} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎤 Encore Season Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn expand_strategies(arg: &str) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(arg) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(GameplayStrategy::ALL);
            continue;
        }
        let Ok(strategy) = token.parse::<GameplayStrategy>() else {
            bail!("Unknown strategy: {token}");
        };
        strategies.push(strategy);
    }
    strategies.sort();
    strategies.dedup();
    if strategies.is_empty() {
        strategies.extend(GameplayStrategy::ALL);
    }
    Ok(strategies)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, results)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, results)?;
        }
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(&mut output_target, "No seasons simulated.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_all_and_dedups() {
        let strategies = expand_strategies("safe,all,safe").unwrap();
        assert_eq!(strategies, GameplayStrategy::ALL.to_vec());
        assert_eq!(
            expand_strategies("grinder").unwrap(),
            vec![GameplayStrategy::Grinder]
        );
        assert!(expand_strategies("reckless").is_err());
    }

    #[test]
    fn cli_flags_parse() {
        let args = Args::try_parse_from([
            "encore-tester",
            "--strategies",
            "safe,gambler",
            "--seeds",
            "1,DC-ENCORE42",
            "--mode",
            "legacy",
            "--retention",
            "best",
            "--report",
            "markdown",
        ])
        .unwrap();
        assert_eq!(args.mode, ModeArg::Legacy);
        assert_eq!(args.report, ReportFormat::Markdown);
        assert_eq!(DiceRetention::from(args.retention), DiceRetention::Best);
        assert_eq!(args.iterations, 3);
    }

    #[test]
    fn output_target_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "encore-output-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush().unwrap();
        drop(target);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(path);
    }
}
