use anyhow::Result;
use colored::Colorize;
use encore_game::Grade;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use super::policy::GameplayStrategy;

/// Per-strategy roll-up across every seed.
#[derive(Debug, Clone, Default)]
pub struct StrategyAggregate {
    pub runs: usize,
    pub passed: usize,
    pub money_total: f64,
    pub fans_total: f64,
    pub grade_counts: BTreeMap<String, usize>,
}

impl StrategyAggregate {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_money(&self) -> f64 {
        self.money_total / self.runs.max(1) as f64
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_fans(&self) -> f64 {
        self.fans_total / self.runs.max(1) as f64
    }
}

#[must_use]
pub fn aggregate_by_strategy(
    results: &[ScenarioResult],
) -> BTreeMap<GameplayStrategy, StrategyAggregate> {
    let mut out: BTreeMap<GameplayStrategy, StrategyAggregate> = BTreeMap::new();
    for result in results {
        let entry = out.entry(result.strategy).or_default();
        let runs = result.iterations_run;
        entry.runs += runs;
        entry.passed += result.successful_iterations;
        #[allow(clippy::cast_precision_loss)]
        {
            entry.money_total += result.mean_money * runs as f64;
            entry.fans_total += result.mean_fans * runs as f64;
        }
        for (grade, count) in &result.grade_counts {
            *entry.grade_counts.entry(grade.clone()).or_insert(0) += count;
        }
    }
    out
}

fn grade_line(counts: &BTreeMap<String, usize>) -> String {
    Grade::ALL
        .iter()
        .map(|grade| {
            let count = counts.get(grade.as_str()).copied().unwrap_or(0);
            format!("{grade}:{count}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Season Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total runs: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(passed, total))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} {}", status, result.label().bold())?;
        writeln!(
            out,
            "   Iterations: {}/{} clean | avg {:?}",
            result.successful_iterations, result.iterations_run, result.average_duration
        )?;
        writeln!(
            out,
            "   Money {:.0} | Fans {:.0} | Score {:.1} | Best chart #{}",
            result.mean_money,
            result.mean_fans,
            result.mean_score,
            result.best_chart.unwrap_or(100)
        )?;
        writeln!(out, "   Grades {}", grade_line(&result.grade_counts))?;
        for failure in &result.failures {
            writeln!(out, "     • {}", failure.red())?;
        }
    }

    let aggregates = aggregate_by_strategy(results);
    if !aggregates.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🎚  Strategy Balance".bright_yellow().bold())?;
        writeln!(out, "{}", "===================".yellow())?;
        for (strategy, agg) in &aggregates {
            writeln!(
                out,
                "{:10} runs {:4} clean {:5.1}% money {:8.1} fans {:8.1} | {}",
                strategy.label(),
                agg.runs,
                success_rate(agg.passed, agg.runs),
                agg.mean_money(),
                agg.mean_fans(),
                grade_line(&agg.grade_counts)
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(out, "# Encore Season Simulation Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(passed, total))?;

    writeln!(out, "## Strategies\n")?;
    writeln!(out, "| Strategy | Runs | Mean money | Mean fans | Grades |")?;
    writeln!(out, "|---|---:|---:|---:|---|")?;
    for (strategy, agg) in aggregate_by_strategy(results) {
        writeln!(
            out,
            "| {} | {} | {:.1} | {:.1} | {} |",
            strategy.label(),
            agg.runs,
            agg.mean_money(),
            agg.mean_fans(),
            grade_line(&agg.grade_counts)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {} {}\n", status, result.label())?;
        writeln!(
            out,
            "- **Iterations**: {}/{} clean",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Mean score**: {:.1}", result.mean_score)?;
        writeln!(out, "- **Gigs played**: {}", result.gigs_played)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_game::ScoringMode;

    fn sample(strategy: GameplayStrategy, passed: bool) -> ScenarioResult {
        ScenarioResult {
            strategy,
            seed: 42,
            share_code: "DC-RIFF42".to_string(),
            mode: ScoringMode::Dice,
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 2 (seed 43): week 4: fans fell".to_string()]
            },
            average_duration: Duration::from_millis(3),
            mean_money: 120.0,
            mean_fans: 800.0,
            mean_score: 71.5,
            grade_counts: BTreeMap::from([("A".to_string(), 10), ("C".to_string(), 94)]),
            best_chart: Some(7),
            gigs_played: 12,
        }
    }

    #[test]
    fn aggregates_weight_by_runs() {
        let results = vec![
            sample(GameplayStrategy::Safe, true),
            sample(GameplayStrategy::Safe, false),
            sample(GameplayStrategy::Grinder, true),
        ];
        let aggregates = aggregate_by_strategy(&results);
        let safe = &aggregates[&GameplayStrategy::Safe];
        assert_eq!(safe.runs, 4);
        assert_eq!(safe.passed, 3);
        assert!((safe.mean_money() - 120.0).abs() < 1e-9);
        assert_eq!(safe.grade_counts["C"], 188);
    }

    #[test]
    fn markdown_lists_failures() {
        let mut buffer = Vec::new();
        generate_markdown_report(&mut buffer, &[sample(GameplayStrategy::Gambler, false)]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("# Encore Season Simulation Results"));
        assert!(text.contains("| Gambler | 2 |"));
        assert!(text.contains("week 4: fans fell"));
    }

    #[test]
    fn json_report_is_parseable() {
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &[sample(GameplayStrategy::Balanced, true)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value[0]["strategy"], "balanced");
        assert_eq!(value[0]["mode"], "dice");
        assert_eq!(value[0]["average_duration"], 3);
    }

    #[test]
    fn grade_line_covers_every_grade() {
        let counts = BTreeMap::from([("S".to_string(), 1)]);
        assert_eq!(grade_line(&counts), "S:1 A:0 B:0 C:0 D:0");
    }
}
