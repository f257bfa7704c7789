mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::{artifacts_dir, split_csv, write_artifact_files};
use logic::reports::{
    ErRecord, generate_ledger_console, generate_ledger_markdown, generate_season_console,
};
use logic::{GameLog, LogicTester, SeasonBook, resolve_seed_inputs, season_book};
use scorebook_engine::RulesConfig;

#[derive(Debug, Parser)]
#[command(name = "scorebook-tester", version = "0.1.0")]
#[command(
    about = "Automated QA for Scorebook attribution rules - scripted rulings, seeded sweeps and game log replay"
)]
struct Args {
    /// Scenarios to run (comma-separated)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; integers, 0x hex, or a..b ranges)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Game logs (JSON) to replay into a season before the scenarios run
    #[arg(long, value_delimiter = ',')]
    game_log: Vec<PathBuf>,

    /// Season the replayed game logs are committed to
    #[arg(long, default_value = "replay")]
    season: String,

    /// Rules file overriding the official scoring rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Directory to dump replayed game logs and ledgers into
    #[arg(long)]
    artifacts_dir: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let book = season_book(args.rules.clone());
    let rules = book.rules()?;
    let replay_failed = replay_game_logs(&args, &book, &rules)?;

    let scenarios = expand_scenarios(&args.scenarios);
    let seed_tokens = split_csv(&args.seeds);
    let seeds = resolve_seed_inputs(&seed_tokens)?;
    let logic_tester = LogicTester::new(rules, args.verbose);

    let all_results = run_logic_scenarios(&args, &scenarios, &seeds, &logic_tester);
    let er_records = gather_er_records(&args, &scenarios, &seeds, &logic_tester);

    write_reports(&args, &all_results, er_records.as_deref(), start_time)?;

    if replay_failed || all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "⚾ Scorebook Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.contains(&"all".to_string()) {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

/// Replay every `--game-log` into the season book. Returns whether any failed.
fn replay_game_logs(args: &Args, book: &SeasonBook, rules: &RulesConfig) -> Result<bool> {
    if args.game_log.is_empty() {
        return Ok(false);
    }

    println!("{}", "📼 Replaying Game Logs".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut failed = false;
    let mut out = stdout().lock();
    for path in &args.game_log {
        if let Err(err) = replay_one(args, book, rules, path, &mut out) {
            failed = true;
            eprintln!("❌ {}: {}", path.display(), format!("{err:#}").red());
        }
    }

    if let Ok(Some(season)) = book.season(&args.season) {
        generate_season_console(&mut out, &season)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(failed)
}

fn replay_one(
    args: &Args,
    book: &SeasonBook,
    rules: &RulesConfig,
    path: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    let log = GameLog::load(path)?;
    let replayed = log.replay(rules);

    if let Some(base) = &args.artifacts_dir {
        let dir = artifacts_dir(base, &args.season, &log.game_id);
        let chain = replayed.as_ref().err().map(|err| format!("{err:#}"));
        write_artifact_files(
            Path::new(&dir),
            &log,
            replayed.as_ref().ok(),
            chain.as_deref(),
        )?;
    }

    let ledger = replayed.with_context(|| format!("failed to replay {}", log.game_id))?;
    book.commit_game(&args.season, &ledger.totals())?;

    if args.report == "markdown" {
        generate_ledger_markdown(out, &ledger)?;
    } else {
        generate_ledger_console(out, &ledger)?;
    }
    Ok(())
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    logic_seeds: &[u64],
    logic_tester: &LogicTester,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();
    if scenarios.is_empty() {
        return results;
    }

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            let scenario_results =
                logic_tester.run_scenario(&scenario, logic_seeds, args.iterations);
            results.extend(scenario_results);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn gather_er_records(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    logic_tester: &LogicTester,
) -> Option<Vec<ErRecord>> {
    if args.report != "csv" {
        return None;
    }
    let records = scenarios
        .iter()
        .filter_map(|name| get_scenario(name))
        .flat_map(|scenario| logic_tester.er_records(&scenario, seeds))
        .collect();
    Some(records)
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    er_records: Option<&[ErRecord]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Scorebook Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            if let Some(records) = er_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "[]")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
        }
    }

    let duration = start_time.elapsed();
    writeln!(&mut output_target)?;
    writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
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
    use crate::logic::ScenarioResult;
    use crate::logic::synthetic::generate_game;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            game_log: Vec::new(),
            season: "replay".to_string(),
            rules: None,
            artifacts_dir: None,
        }
    }

    fn temp(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".to_string(),
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("all,smoke");
        assert!(expanded.contains(&"smoke".to_string()));
        assert!(expanded.contains(&"closer-save".to_string()));
        assert_eq!(expanded.len(), list_scenarios().len());
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("smoke,setup-hold");
        assert_eq!(expanded, vec!["smoke".to_string(), "setup-hold".to_string()]);
    }

    #[test]
    fn run_logic_scenarios_skips_unknown_names() {
        let tester = LogicTester::new(RulesConfig::default(), false);
        let args = base_args();
        let results = run_logic_scenarios(
            &args,
            &["nope".to_string(), "closer-save".to_string()],
            &[1],
            &tester,
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
    }

    #[test]
    fn gather_er_records_only_for_csv() {
        let tester = LogicTester::new(RulesConfig::default(), false);
        let scenarios = vec!["inherited-runner".to_string()];
        assert!(gather_er_records(&base_args(), &scenarios, &[1], &tester).is_none());

        let args = Args {
            report: "csv".to_string(),
            ..base_args()
        };
        let records = gather_er_records(&args, &scenarios, &[1], &tester).unwrap();
        assert!(records.iter().any(|r| r.pitcher_id == "pitcher-b"));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let path = temp("scorebook-scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("d3k-illegal"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let path = temp("scorebook-test-report.json");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("[]"));
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let path = temp("scorebook-report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_emits_markdown_report() {
        let path = temp("scorebook-report-full.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("# Scorebook Logic Test Results"));
        assert!(content.contains("Smoke"));
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let path = temp("scorebook-report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        let record = ErRecord {
            scenario_name: "Smoke".to_string(),
            seed: 1,
            game_id: "g".to_string(),
            pitcher_id: "p".to_string(),
            earned_runs: 2,
            unearned_runs: 0,
            runs: 2,
            runners_allowed: 4,
            bequeathed_runners: 0,
            inherited_runners_scored: 0,
        };
        write_reports(&args, &[], Some(&[record]), Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("scenario,seed,game_id,pitcher_id"));
        assert!(content.contains("Smoke,1,g,p,2,0,2,4,0,0"));
    }

    #[test]
    fn write_reports_console_lists_results() {
        let path = temp("scorebook-report-console.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Logic Test Results Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn replay_commits_games_and_dumps_artifacts() {
        let rules = RulesConfig::default();
        let log = generate_game(21, &rules).unwrap();
        let log_path = temp("scorebook-replay-21.json");
        std::fs::write(&log_path, serde_json::to_string(&log).unwrap()).unwrap();
        let artifacts = temp("scorebook-replay-artifacts");

        let args = Args {
            game_log: vec![log_path.clone(), log_path],
            artifacts_dir: Some(artifacts.display().to_string()),
            ..base_args()
        };
        let book = season_book(None);
        assert!(!replay_game_logs(&args, &book, &rules).unwrap());
        let season = book.season("replay").unwrap().unwrap();
        assert_eq!(season.games_played(), 1);
        assert!(artifacts.join("replay").join("synthetic-21").exists());
    }

    #[test]
    fn replay_reports_unreadable_logs() {
        let args = Args {
            game_log: vec![temp("scorebook-missing-log.json")],
            ..base_args()
        };
        let book = season_book(None);
        assert!(replay_game_logs(&args, &book, &RulesConfig::default()).unwrap());
    }
}
