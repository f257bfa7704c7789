//! Per-pitcher run accounting behind the responsibility tracker.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::game::{PitcherId, Runner};
use crate::numbers::per_nine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Earned,
    Unearned,
}

/// Decides whether a scoring runner's run is earned.
pub trait RunClassifier {
    fn classify(&self, runner: &Runner) -> RunKind;
}

/// Every run is earned.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllEarned;

impl RunClassifier for AllEarned {
    fn classify(&self, _runner: &Runner) -> RunKind {
        RunKind::Earned
    }
}

/// Runners who reached on an error or fielder's choice score unearned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReachedOnMisplay;

impl RunClassifier for ReachedOnMisplay {
    fn classify(&self, runner: &Runner) -> RunKind {
        if runner.how_reached.is_misplay() {
            RunKind::Unearned
        } else {
            RunKind::Earned
        }
    }
}

impl<F> RunClassifier for F
where
    F: Fn(&Runner) -> RunKind,
{
    fn classify(&self, runner: &Runner) -> RunKind {
        self(runner)
    }
}

/// A run that crossed the plate and who it was charged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunScored {
    pub runner: Runner,
    pub charged_to: PitcherId,
    pub kind: RunKind,
    /// Scored while a different pitcher was on the mound.
    pub inherited: bool,
}

impl RunScored {
    #[must_use]
    pub const fn is_earned(&self) -> bool {
        matches!(self.kind, RunKind::Earned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PitcherRunLine {
    pub earned_runs: u32,
    pub unearned_runs: u32,
    pub runners_allowed: u32,
    pub bequeathed_runners: u32,
    /// Inherited runners that scored while this pitcher was pitching.
    pub inherited_runners_scored: u32,
}

impl PitcherRunLine {
    #[must_use]
    pub const fn runs(&self) -> u32 {
        self.earned_runs + self.unearned_runs
    }

    #[must_use]
    pub fn era_over(&self, outs: u32) -> f64 {
        per_nine(self.earned_runs, outs)
    }
}

/// Pitcher to run line, ordered by pitcher id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EarnedRunLedger {
    lines: BTreeMap<PitcherId, PitcherRunLine>,
}

impl EarnedRunLedger {
    #[must_use]
    pub fn line(&self, pitcher: &PitcherId) -> Option<&PitcherRunLine> {
        self.lines.get(pitcher)
    }

    pub(crate) fn line_mut(&mut self, pitcher: &PitcherId) -> &mut PitcherRunLine {
        self.lines.entry(pitcher.clone()).or_default()
    }

    pub(crate) fn charge(&mut self, run: &RunScored, current: &PitcherId) {
        let line = self.line_mut(&run.charged_to);
        match run.kind {
            RunKind::Earned => line.earned_runs += 1,
            RunKind::Unearned => line.unearned_runs += 1,
        }
        if run.inherited {
            self.line_mut(current).inherited_runners_scored += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PitcherId, &PitcherRunLine)> {
        self.lines.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErSummaryLine {
    pub pitcher_id: PitcherId,
    pub earned_runs: u32,
    pub unearned_runs: u32,
    pub runs: u32,
    pub runners_allowed: u32,
    pub bequeathed_runners: u32,
    pub inherited_runners_scored: u32,
}

/// Read-only projection of the ledger, one line per pitcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErSummary {
    pub lines: Vec<ErSummaryLine>,
}

impl ErSummary {
    #[must_use]
    pub fn from_ledger(ledger: &EarnedRunLedger) -> Self {
        let lines = ledger
            .iter()
            .map(|(pitcher_id, line)| ErSummaryLine {
                pitcher_id: pitcher_id.clone(),
                earned_runs: line.earned_runs,
                unearned_runs: line.unearned_runs,
                runs: line.runs(),
                runners_allowed: line.runners_allowed,
                bequeathed_runners: line.bequeathed_runners,
                inherited_runners_scored: line.inherited_runners_scored,
            })
            .collect();
        Self { lines }
    }

    #[must_use]
    pub fn line(&self, pitcher: &PitcherId) -> Option<&ErSummaryLine> {
        self.lines.iter().find(|line| &line.pitcher_id == pitcher)
    }

    /// Earned runs charged to `pitcher`, zero if they were never charged.
    #[must_use]
    pub fn earned_runs_for(&self, pitcher: &PitcherId) -> u32 {
        self.line(pitcher).map_or(0, |line| line.earned_runs)
    }

    #[must_use]
    pub fn total_earned_runs(&self) -> u32 {
        self.lines.iter().map(|line| line.earned_runs).sum()
    }

    #[must_use]
    pub fn total_runs(&self) -> u32 {
        self.lines.iter().map(|line| line.runs).sum()
    }

    #[must_use]
    pub fn earned_runs_by_pitcher(&self) -> BTreeMap<PitcherId, u32> {
        self.lines
            .iter()
            .map(|line| (line.pitcher_id.clone(), line.earned_runs))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::HowReached;

    fn scored(pitcher: &str, kind: RunKind, inherited: bool) -> RunScored {
        RunScored {
            runner: Runner::new("r", "Runner", HowReached::Hit),
            charged_to: PitcherId::new(pitcher),
            kind,
            inherited,
        }
    }

    #[test]
    fn misplay_classifier_marks_errors_unearned() {
        let on_error = Runner::new("e", "Err", HowReached::Error);
        let on_walk = Runner::new("w", "Walk", HowReached::Walk);
        assert_eq!(ReachedOnMisplay.classify(&on_error), RunKind::Unearned);
        assert_eq!(ReachedOnMisplay.classify(&on_walk), RunKind::Earned);
        assert_eq!(AllEarned.classify(&on_error), RunKind::Earned);
    }

    #[test]
    fn closures_classify_runs() {
        let never = |_: &Runner| RunKind::Unearned;
        let runner = Runner::new("x", "X", HowReached::Hit);
        assert_eq!(never.classify(&runner), RunKind::Unearned);
    }

    #[test]
    fn ledger_charges_inherited_scores_to_both_pitchers() {
        let mut ledger = EarnedRunLedger::default();
        let reliever = PitcherId::new("rp");
        ledger.charge(&scored("sp", RunKind::Earned, true), &reliever);
        ledger.charge(&scored("rp", RunKind::Unearned, false), &reliever);

        let summary = ErSummary::from_ledger(&ledger);
        assert_eq!(summary.earned_runs_for(&PitcherId::new("sp")), 1);
        assert_eq!(summary.earned_runs_for(&reliever), 0);
        let rp = summary.line(&reliever).unwrap();
        assert_eq!(rp.unearned_runs, 1);
        assert_eq!(rp.inherited_runners_scored, 1);
        assert_eq!(summary.total_runs(), 2);
        assert_eq!(summary.total_earned_runs(), 1);
    }

    #[test]
    fn summary_is_ordered_by_pitcher_id() {
        let mut ledger = EarnedRunLedger::default();
        let current = PitcherId::new("zz");
        ledger.charge(&scored("zz", RunKind::Earned, false), &current);
        ledger.charge(&scored("aa", RunKind::Earned, false), &current);
        let ids: Vec<String> = ErSummary::from_ledger(&ledger)
            .lines
            .iter()
            .map(|line| line.pitcher_id.to_string())
            .collect();
        assert_eq!(ids, vec!["aa", "zz"]);
    }

    #[test]
    fn era_uses_outs() {
        let line = PitcherRunLine {
            earned_runs: 2,
            ..PitcherRunLine::default()
        };
        assert!((line.era_over(27) - 2.0).abs() < f64::EPSILON);
    }
}
