use colored::Colorize;
use encore_game::{DiceRetention, MemoryStore, ScoringMode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{SimulationConfig, SimulationSummary, run_season};
use crate::storage::FileStore;

/// What to simulate for one invocation.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub strategies: Vec<GameplayStrategy>,
    pub seeds: Vec<SeedInfo>,
    pub iterations: usize,
    pub mode: ScoringMode,
    pub retention: DiceRetention,
}

/// Aggregated outcome for one strategy on one seed.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub share_code: String,
    pub mode: ScoringMode,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(serialize_with = "serialize_millis")]
    pub average_duration: Duration,
    pub mean_money: f64,
    pub mean_fans: f64,
    pub mean_score: f64,
    pub grade_counts: BTreeMap<String, usize>,
    pub best_chart: Option<u32>,
    pub gigs_played: usize,
}

impl ScenarioResult {
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} @ {}", self.strategy, self.share_code)
    }
}

pub struct SeasonTester {
    verbose: bool,
    store: Option<FileStore>,
}

impl SeasonTester {
    #[must_use]
    pub const fn new(verbose: bool, store: Option<FileStore>) -> Self {
        Self { verbose, store }
    }

    #[must_use]
    pub fn run_plan(&self, plan: &RunPlan) -> Vec<ScenarioResult> {
        let mut results = Vec::new();
        for &strategy in &plan.strategies {
            for seed_info in &plan.seeds {
                let mode = seed_info.source_mode.unwrap_or(plan.mode);
                if self.verbose {
                    println!(
                        "🎸 Simulating {} (mode: {mode:?} seed: {})",
                        strategy.label().bright_white(),
                        seed_info.share_code_for_mode(mode)
                    );
                }
                results.push(self.run_seed(plan, strategy, seed_info, mode));
            }
        }
        results
    }

    fn run_seed(
        &self,
        plan: &RunPlan,
        strategy: GameplayStrategy,
        seed_info: &SeedInfo,
        mode: ScoringMode,
    ) -> ScenarioResult {
        let mut failures = Vec::new();
        let mut summaries: Vec<SimulationSummary> = Vec::new();
        let mut durations = Vec::new();

        for i in 0..plan.iterations {
            let seed = seed_info
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let config = SimulationConfig::new(mode, strategy, seed).with_retention(plan.retention);
            let start = Instant::now();
            let summary = match self.simulate(&config, &format!("{}-{seed}", strategy.key())) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!("Iteration {} (seed {seed}): {err:#}", i + 1));
                    continue;
                }
            };
            durations.push(start.elapsed());

            if i == 0 {
                match run_season(MemoryStore::new(), "replay", &config.with_save_verification(false))
                {
                    Ok(replay) if replay.save_digest == summary.save_digest => {}
                    Ok(_) => failures.push(format!("Iteration 1 (seed {seed}): replay diverged")),
                    Err(err) => failures.push(format!("Iteration 1 (seed {seed}): {err:#}")),
                }
            }

            if summary.passed() {
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed: money {} fans {} best chart #{}",
                        i + 1,
                        plan.iterations,
                        summary.final_money,
                        summary.final_fans,
                        summary.best_chart().unwrap_or(100)
                    );
                }
            } else {
                let detail = if summary.violations.is_empty() {
                    format!("season stopped after {} weeks", summary.weeks.len())
                } else {
                    summary.violations.join("; ")
                };
                if self.verbose {
                    println!("  ❌ Iteration {}/{} failed: {}", i + 1, plan.iterations, detail.red());
                }
                failures.push(format!("Iteration {} (seed {seed}): {detail}", i + 1));
            }
            summaries.push(summary);
        }

        summarize(plan, strategy, seed_info, mode, &summaries, failures, &durations)
    }

    fn simulate(&self, config: &SimulationConfig, slot: &str) -> anyhow::Result<SimulationSummary> {
        match &self.store {
            Some(store) => run_season(store, slot, config),
            None => run_season(MemoryStore::new(), slot, config),
        }
    }
}

fn summarize(
    plan: &RunPlan,
    strategy: GameplayStrategy,
    seed_info: &SeedInfo,
    mode: ScoringMode,
    summaries: &[SimulationSummary],
    failures: Vec<String>,
    durations: &[Duration],
) -> ScenarioResult {
    let successes = summaries.iter().filter(|s| s.passed()).count();
    let runs = summaries.len().max(1);
    let average_duration = if durations.is_empty() {
        Duration::ZERO
    } else {
        durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
    };

    let mut grade_counts = BTreeMap::new();
    let mut score_total = 0.0;
    let mut score_count = 0usize;
    for summary in summaries {
        for (grade, count) in summary.grade_counts() {
            *grade_counts.entry(grade.to_string()).or_insert(0) += count;
        }
        score_total += summary.weeks.iter().map(|w| w.score).sum::<f64>();
        score_count += summary.weeks.len();
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = |total: f64, count: usize| total / count.max(1) as f64;
    #[allow(clippy::cast_precision_loss)]
    let money_total = summaries.iter().map(|s| s.final_money as f64).sum::<f64>();
    #[allow(clippy::cast_precision_loss)]
    let fans_total = summaries.iter().map(|s| s.final_fans as f64).sum::<f64>();

    ScenarioResult {
        strategy,
        seed: seed_info.seed,
        share_code: seed_info.share_code_for_mode(mode),
        mode,
        passed: failures.is_empty() && successes == plan.iterations,
        iterations_run: plan.iterations,
        successful_iterations: successes,
        failures,
        average_duration,
        mean_money: mean(money_total, runs),
        mean_fans: mean(fans_total, runs),
        mean_score: mean(score_total, score_count),
        grade_counts,
        best_chart: summaries.iter().filter_map(SimulationSummary::best_chart).min(),
        gigs_played: summaries.iter().map(|s| s.gigs_played).sum(),
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    duration.as_millis().serialize(serializer)
}
