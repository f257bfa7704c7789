use anyhow::{Result, ensure};
use std::collections::BTreeMap;

use scorebook_engine::{D3kOutcome, PitcherId, SaveClassification, constants::D3K_OPEN_OUTS};

use crate::logic::synthetic::{EXTRA_INNINGS, generate_game};
use crate::logic::{GameLog, SimulationPlan, SimulationSummary};

pub fn smoke_plan() -> SimulationPlan {
    SimulationPlan::synthetic().with_expectation(smoke_expectation)
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger;
    ensure!(ledger.fingerprint.len() == 64, "fingerprint should be hex SHA-256");
    ensure!(
        ledger.innings >= u32::from(summary.rules.scheduled_innings),
        "game ended after {} of {} innings",
        ledger.innings,
        summary.rules.scheduled_innings
    );
    ensure!(
        ledger.winner().is_some()
            || ledger.innings >= u32::from(summary.rules.scheduled_innings) + EXTRA_INNINGS,
        "tied after {} innings",
        ledger.innings
    );
    ensure!(!ledger.appearances.is_empty(), "starters always appear");
    Ok(())
}

pub fn er_conservation_plan() -> SimulationPlan {
    SimulationPlan::synthetic().with_expectation(er_conservation_expectation)
}

/// Every run on the scoreboard is charged to exactly one pitcher.
fn er_conservation_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger;
    let scoreboard = ledger.home_score + ledger.away_score;
    ensure!(
        ledger.er_summary.total_runs() == scoreboard,
        "charged {} runs but the scoreboard shows {scoreboard}",
        ledger.er_summary.total_runs()
    );
    ensure!(
        u32::try_from(ledger.runs.len()).unwrap_or(u32::MAX) == scoreboard,
        "run log has {} entries for {scoreboard} runs",
        ledger.runs.len()
    );

    for line in &ledger.er_summary.lines {
        ensure!(
            line.earned_runs + line.unearned_runs == line.runs,
            "{} earned/unearned split does not add up",
            line.pitcher_id
        );
    }

    let mut charged: BTreeMap<&PitcherId, u32> = BTreeMap::new();
    for run in &ledger.runs {
        *charged.entry(&run.charged_to).or_default() += 1;
    }
    for (pitcher, runs) in charged {
        let line = ledger.er_summary.line(pitcher).map_or(0, |line| line.runs);
        ensure!(line == runs, "{pitcher} charged {line} runs, run log says {runs}");
    }
    Ok(())
}

pub fn inheritance_plan() -> SimulationPlan {
    SimulationPlan::synthetic().with_expectation(inheritance_expectation)
}

/// Inherited runs stay with the pitcher who put the runner on.
fn inheritance_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger;
    let mut inherited_runs = 0_u32;
    for run in &ledger.runs {
        match &run.runner.inherited_from {
            Some(owner) => ensure!(
                owner == &run.charged_to,
                "{} inherited from {owner} but charged to {}",
                run.runner.runner_id,
                run.charged_to
            ),
            None => ensure!(
                !run.inherited,
                "{} scored as inherited without an owner",
                run.runner.runner_id
            ),
        }
        if run.inherited {
            inherited_runs += 1;
        }
    }

    let scored: u32 = ledger
        .er_summary
        .lines
        .iter()
        .map(|line| line.inherited_runners_scored)
        .sum();
    ensure!(
        scored == inherited_runs,
        "{scored} inherited runners credited, {inherited_runs} in the run log"
    );

    let bequeathed: u32 = ledger
        .er_summary
        .lines
        .iter()
        .map(|line| line.bequeathed_runners)
        .sum();
    ensure!(
        bequeathed >= inherited_runs,
        "only {bequeathed} runners bequeathed but {inherited_runs} inherited runs"
    );
    Ok(())
}

pub fn save_exclusivity_plan() -> SimulationPlan {
    SimulationPlan::synthetic().with_expectation(save_exclusivity_expectation)
}

/// At most one save a game, and only for the winning side.
fn save_exclusivity_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger;
    let saves: Vec<_> = ledger
        .appearances
        .iter()
        .filter(|appearance| appearance.classification == SaveClassification::Save)
        .collect();
    ensure!(saves.len() <= 1, "{} saves in one game", saves.len());

    if let Some(save) = saves.first() {
        ensure!(
            ledger.winner() == Some(save.team),
            "{} saved a game their team lost",
            save.pitcher_id
        );
        ensure!(
            save.exit.is_some_and(|exit| exit.finished_game && !exit.is_winning_pitcher),
            "{} saved without finishing the game",
            save.pitcher_id
        );
    }

    for appearance in &ledger.appearances {
        ensure!(appearance.is_finalized(), "{} never finalized", appearance.pitcher_id);
        match appearance.classification {
            SaveClassification::BlownSave => ensure!(
                appearance.lead_surrendered,
                "{} blew a save without losing the lead",
                appearance.pitcher_id
            ),
            SaveClassification::Hold => ensure!(
                appearance.exit.is_some_and(|exit| !exit.finished_game),
                "{} held a game they finished",
                appearance.pitcher_id
            ),
            SaveClassification::Save | SaveClassification::None => {}
        }
    }
    Ok(())
}

pub fn d3k_legality_plan() -> SimulationPlan {
    SimulationPlan::synthetic().with_expectation(d3k_legality_expectation)
}

/// First base occupied with fewer than two outs always forces the out.
fn d3k_legality_expectation(summary: &SimulationSummary) -> Result<()> {
    for event in &summary.ledger.d3k_events {
        let blocked = event.bases_before.first && event.outs < D3K_OPEN_OUTS;
        ensure!(
            event.is_legal != blocked,
            "{} at {} outs with first {}: legality {}",
            event.batter_id,
            event.outs,
            if event.bases_before.first { "occupied" } else { "open" },
            event.is_legal
        );
        if blocked {
            ensure!(
                event.outcome == D3kOutcome::Illegal && event.batter_result.base().is_none(),
                "{} reached on an illegal drop",
                event.batter_id
            );
        } else {
            ensure!(
                event.outcome != D3kOutcome::Illegal,
                "{} was called out on a legal drop",
                event.batter_id
            );
        }
    }
    Ok(())
}

pub fn deterministic_replay_plan() -> SimulationPlan {
    SimulationPlan::synthetic().with_expectation(deterministic_replay_expectation)
}

/// Same seed, same game, same ledger; also through a JSON round trip.
fn deterministic_replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let regenerated = generate_game(summary.seed, &summary.rules)?;
    ensure!(
        regenerated == summary.log,
        "seed {} produced a different game on the second run",
        summary.seed
    );

    let replayed = summary.log.replay(&summary.rules)?;
    ensure!(replayed == summary.ledger, "second replay diverged");

    let json = serde_json::to_string(&summary.log)?;
    let restored: GameLog = serde_json::from_str(&json)?;
    ensure!(restored == summary.log, "game log changed through JSON");
    let from_json = restored.replay(&summary.rules)?;
    ensure!(
        from_json.fingerprint == summary.ledger.fingerprint,
        "fingerprint changed through JSON: {} vs {}",
        from_json.fingerprint,
        summary.ledger.fingerprint
    );
    ensure!(summary.ledger.verify()?, "stored fingerprint does not match");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::simulation::run_plan;
    use scorebook_engine::RulesConfig;

    #[test]
    fn sweeps_hold_across_seeds() {
        let plans = [
            smoke_plan(),
            er_conservation_plan(),
            inheritance_plan(),
            save_exclusivity_plan(),
            d3k_legality_plan(),
            deterministic_replay_plan(),
        ];
        let rules = RulesConfig::default();
        for seed in 0..25 {
            for plan in &plans {
                let summary = run_plan(plan, seed, &rules).unwrap();
                for expectation in &plan.expectations {
                    if let Err(err) = expectation.evaluate(&summary) {
                        panic!("seed {seed}: {err:#}");
                    }
                }
            }
        }
    }

    #[test]
    fn conservation_catches_a_missing_run() {
        let mut summary = run_plan(&er_conservation_plan(), 4, &RulesConfig::default()).unwrap();
        summary.ledger.home_score += 1;
        assert!(er_conservation_expectation(&summary).is_err());
    }

    #[test]
    fn replay_check_catches_tampering() {
        let mut summary =
            run_plan(&deterministic_replay_plan(), 8, &RulesConfig::default()).unwrap();
        summary.ledger.left_on_base += 1;
        assert!(deterministic_replay_expectation(&summary).is_err());
    }
}
