use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use scorebook_engine::RulesConfig;

use super::reports::ErRecord;
use super::simulation::{SimulationPlan, SimulationSummary, run_plan};
use crate::common::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    rules: RulesConfig,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(rules: RulesConfig, verbose: bool) -> Self {
        Self { rules, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {})",
                    scenario.name.bright_white(),
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    /// Earned-run rows from the first game of each seed.
    pub fn er_records(&self, scenario: &TestScenario, seeds: &[u64]) -> Vec<ErRecord> {
        let mut records = Vec::new();
        for &seed in seeds {
            match run_plan(&scenario.plan, seed, &self.rules) {
                Ok(summary) => {
                    records.extend(ErRecord::from_ledger(&scenario.name, seed, &summary.ledger));
                }
                Err(err) => log::warn!("{} seed {seed}: {err:#}", scenario.name),
            }
        }
        records
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match run_plan(plan, iteration_seed, &self.rules) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): {err:#}",
                        i + 1
                    ));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} could not be played: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    continue;
                }
            };

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_game(&summary);
                failures.push(format!("Iteration {} ({context}): {err}", i + 1));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                    println!("     ↳ {context}");
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) {}",
                        i + 1,
                        iterations,
                        summarize_game(&summary)
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_game(summary: &SimulationSummary) -> String {
    let ledger = &summary.ledger;
    format!(
        "seed {}, game {}, events {}, final {}-{} in {}, fingerprint {}",
        summary.seed,
        ledger.game_id,
        summary.log.events.len(),
        ledger.away_score,
        ledger.home_score,
        ledger.innings,
        ledger.fingerprint.get(..12).unwrap_or(&ledger.fingerprint)
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations
            .iter()
            .map(std::time::Duration::as_millis)
            .collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|millis| Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::scenario::get_scenario;

    #[test]
    fn passing_scenario_counts_every_iteration() {
        let tester = LogicTester::new(RulesConfig::default(), false);
        let scenario = get_scenario("closer-save").unwrap();
        let results = tester.run_scenario(&scenario, &[1, 2], 3);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
        assert!(results.iter().all(|r| r.successful_iterations == 3));
    }

    #[test]
    fn failing_expectation_is_reported() {
        let tester = LogicTester::new(RulesConfig::default(), false);
        let scenario = TestScenario::simulation(
            "Always Fails",
            SimulationPlan::synthetic().with_expectation(
                |_: &SimulationSummary| -> anyhow::Result<()> { anyhow::bail!("nope") },
            ),
        );
        let results = tester.run_scenario(&scenario, &[9], 2);
        assert!(!results[0].passed);
        assert_eq!(results[0].failures.len(), 2);
        assert!(results[0].failures[0].contains("nope"));
        assert!(results[0].failures[0].contains("synthetic-9"));
    }

    #[test]
    fn er_records_cover_each_pitcher_charged() {
        let tester = LogicTester::new(RulesConfig::default(), false);
        let scenario = get_scenario("inherited-runner").unwrap();
        let records = tester.er_records(&scenario, &[1]);
        assert!(records.iter().any(|r| r.pitcher_id == "pitcher-a" && r.earned_runs == 1));
    }

    #[test]
    fn result_serializes_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "x".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["average_duration"], 12);
        assert_eq!(value["performance_data"][0], 12);
    }
}
