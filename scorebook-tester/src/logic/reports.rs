use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use scorebook_engine::{SaveClassification, SeasonTotals, d3k_display_message};

use super::ScenarioResult;
use super::recorder::GameLedger;

/// One pitcher's earned-run line from one replayed game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErRecord {
    pub scenario_name: String,
    pub seed: u64,
    pub game_id: String,
    pub pitcher_id: String,
    pub earned_runs: u32,
    pub unearned_runs: u32,
    pub runs: u32,
    pub runners_allowed: u32,
    pub bequeathed_runners: u32,
    pub inherited_runners_scored: u32,
}

impl ErRecord {
    #[must_use]
    pub fn from_ledger(scenario_name: &str, seed: u64, ledger: &GameLedger) -> Vec<Self> {
        ledger
            .er_summary
            .lines
            .iter()
            .map(|line| Self {
                scenario_name: scenario_name.to_string(),
                seed,
                game_id: ledger.game_id.clone(),
                pitcher_id: line.pitcher_id.as_str().to_string(),
                earned_runs: line.earned_runs,
                unearned_runs: line.unearned_runs,
                runs: line.runs,
                runners_allowed: line.runners_allowed,
                bequeathed_runners: line.bequeathed_runners,
                inherited_runners_scored: line.inherited_runners_scored,
            })
            .collect()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    scenarios: &'a [ScenarioResult],
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (passed as f64 / total as f64) * 100.0
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(
        out,
        "Success rate: {:.1}%",
        success_rate(passed_tests, total_tests)
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn generate_json_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        scenarios: results,
    };
    let json_output = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> std::io::Result<()> {
    writeln!(out, "# Scorebook Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {}\n", status, result.scenario_name)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

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

pub fn generate_csv_report<W: Write + ?Sized>(
    out: &mut W,
    records: &[ErRecord],
) -> std::io::Result<()> {
    writeln!(
        out,
        "scenario,seed,game_id,pitcher_id,earned_runs,unearned_runs,runs,runners_allowed,bequeathed_runners,inherited_runners_scored"
    )?;
    for record in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            csv_field(&record.scenario_name),
            record.seed,
            csv_field(&record.game_id),
            csv_field(&record.pitcher_id),
            record.earned_runs,
            record.unearned_runs,
            record.runs,
            record.runners_allowed,
            record.bequeathed_runners,
            record.inherited_runners_scored
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Box score of attribution decisions for a single replayed game.
pub fn generate_ledger_console<W: Write + ?Sized>(
    out: &mut W,
    ledger: &GameLedger,
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        "📒 Game".bright_cyan().bold(),
        ledger.game_id.bold()
    )?;
    writeln!(
        out,
        "Final: away {} - home {} ({} innings, {} left on base)",
        ledger.away_score, ledger.home_score, ledger.innings, ledger.left_on_base
    )?;
    writeln!(out, "Fingerprint: {}", ledger.fingerprint.dimmed())?;
    writeln!(out)?;

    writeln!(out, "{}", "Earned runs".bright_yellow().bold())?;
    for line in &ledger.er_summary.lines {
        writeln!(
            out,
            "  {:20} ER {:>2}  R {:>2}  allowed {:>2}  bequeathed {:>2}  inherited scored {:>2}",
            line.pitcher_id.as_str(),
            line.earned_runs,
            line.runs,
            line.runners_allowed,
            line.bequeathed_runners,
            line.inherited_runners_scored
        )?;
    }

    writeln!(out, "{}", "Relief decisions".bright_yellow().bold())?;
    for appearance in &ledger.appearances {
        let detection = appearance.detection_result();
        let message = match appearance.classification {
            SaveClassification::Save | SaveClassification::Hold => detection.message.green(),
            SaveClassification::BlownSave => detection.message.red(),
            SaveClassification::None => detection.message.normal(),
        };
        writeln!(
            out,
            "  {:20} {:>5} IP  {}",
            appearance.pitcher_id.as_str(),
            appearance.innings_pitched().to_string(),
            message
        )?;
    }

    if !ledger.d3k_events.is_empty() {
        writeln!(out, "{}", "Dropped third strikes".bright_yellow().bold())?;
        for event in &ledger.d3k_events {
            writeln!(out, "  {}", d3k_display_message(event))?;
        }
    }
    Ok(())
}

pub fn generate_ledger_markdown<W: Write + ?Sized>(
    out: &mut W,
    ledger: &GameLedger,
) -> std::io::Result<()> {
    writeln!(out, "# Game {}\n", ledger.game_id)?;
    writeln!(
        out,
        "Final: away {} - home {} after {} innings\n",
        ledger.away_score, ledger.home_score, ledger.innings
    )?;
    writeln!(out, "| Pitcher | ER | R | Bequeathed | Inherited scored |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for line in &ledger.er_summary.lines {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            line.pitcher_id,
            line.earned_runs,
            line.runs,
            line.bequeathed_runners,
            line.inherited_runners_scored
        )?;
    }
    writeln!(out, "\n| Pitcher | IP | Decision |")?;
    writeln!(out, "|---|---|---|")?;
    for appearance in &ledger.appearances {
        writeln!(
            out,
            "| {} | {} | {} |",
            appearance.pitcher_id,
            appearance.innings_pitched(),
            appearance.classification
        )?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn generate_season_console<W: Write + ?Sized>(
    out: &mut W,
    season: &SeasonTotals,
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} {} ({} games)",
        "🗓  Season".bright_cyan().bold(),
        season.season_id,
        season.games_played()
    )?;
    for (pitcher, line) in &season.pitchers {
        writeln!(
            out,
            "  {:20} G {:>2}  IP {:>5}  SV {:>2}  HLD {:>2}  BS {:>2}  ER {:>3}  ERA {:.2}",
            pitcher.as_str(),
            line.appearances,
            line.innings_pitched().to_string(),
            line.saves,
            line.holds,
            line.blown_saves,
            line.earned_runs,
            line.era()
        )?;
    }
    Ok(())
}
