use anyhow::{Context, Result};
use std::sync::Arc;

use scorebook_engine::RulesConfig;

use super::game_log::GameLog;
use super::recorder::GameLedger;
use super::synthetic::generate_game;

/// Where a plan's game comes from.
#[derive(Debug, Clone, Copy)]
pub enum GameSource {
    /// A fixed play-by-play; the seed is ignored.
    Scripted(fn() -> GameLog),
    /// A fresh seeded game per iteration.
    Synthetic,
}

/// Declarative plan for one scenario run.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub source: GameSource,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn scripted(build: fn() -> GameLog) -> Self {
        Self {
            source: GameSource::Scripted(build),
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn synthetic() -> Self {
        Self {
            source: GameSource::Synthetic,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Everything an expectation may inspect after a run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub rules: RulesConfig,
    pub log: GameLog,
    pub ledger: GameLedger,
}

/// Assertion hook run after a game has been replayed.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Build the plan's game for `seed` and replay it under `rules`.
///
/// # Errors
///
/// Returns an error if the game cannot be generated or is rejected on replay.
pub fn run_plan(plan: &SimulationPlan, seed: u64, rules: &RulesConfig) -> Result<SimulationSummary> {
    let log = match plan.source {
        GameSource::Scripted(build) => build(),
        GameSource::Synthetic => generate_game(seed, rules)
            .with_context(|| format!("failed to generate game for seed {seed}"))?,
    };
    let ledger = log
        .replay(rules)
        .with_context(|| format!("failed to replay {}", log.game_id))?;
    Ok(SimulationSummary {
        seed,
        rules: *rules,
        log,
        ledger,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_plan_replays_seeded_game() {
        let plan = SimulationPlan::synthetic();
        let summary = run_plan(&plan, 11, &RulesConfig::default()).unwrap();
        assert_eq!(summary.log.game_id, "synthetic-11");
        assert_eq!(summary.ledger.game_id, summary.log.game_id);
    }

    #[test]
    fn expectations_see_the_summary() {
        let plan = SimulationPlan::synthetic().with_expectation(|summary: &SimulationSummary| {
            anyhow::ensure!(summary.seed == 5, "wrong seed");
            Ok(())
        });
        let summary = run_plan(&plan, 5, &RulesConfig::default()).unwrap();
        assert!(plan.expectations[0].evaluate(&summary).is_ok());
    }
}
