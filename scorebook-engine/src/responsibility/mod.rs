//! Runner responsibility: who is on base, who put them there, and who is
//! charged when they score.
mod ledger;

pub use ledger::{
    AllEarned, EarnedRunLedger, ErSummary, ErSummaryLine, PitcherRunLine, ReachedOnMisplay,
    RunClassifier, RunKind, RunScored,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{FIRST_AT_BAT, FIRST_INNING};
use crate::game::{Base, Bases, Destination, PitcherId, PlayerId, Runner};
use crate::numbers::len_to_u32;
use crate::substitution::{BequeathedRunners, SubstitutionEvent, build_bequeathed_runners};

/// Rejected tracker transitions. The state is unchanged when one is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("{base} is already occupied by {occupant}")]
    BaseOccupied { base: Base, occupant: PlayerId },
    #[error("no runner on {base}")]
    BaseEmpty { base: Base },
    #[error("runner on {from} cannot move to {to}")]
    BackwardAdvance { from: Base, to: Destination },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceOutcome {
    Moved { to: Base },
    Scored(RunScored),
}

impl AdvanceOutcome {
    #[must_use]
    pub const fn run(&self) -> Option<&RunScored> {
        match self {
            Self::Moved { .. } => None,
            Self::Scored(run) => Some(run),
        }
    }
}

/// One tracker transition, for callers that drive the tracker as a reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    AddRunner {
        base: Base,
        runner: Runner,
        current_pitcher: PitcherId,
    },
    AdvanceRunner {
        from: Base,
        to: Destination,
        current_pitcher: PitcherId,
    },
    RunnerOut {
        base: Base,
    },
    PitchingChange {
        outgoing: PitcherId,
    },
    PinchRunner {
        base: Base,
        runner: Runner,
    },
    ClearBases,
    NextInning,
    NextAtBat,
}

/// What a transition produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerOutcome {
    Placed,
    Advanced(AdvanceOutcome),
    Removed(Runner),
    Bequeathed(BequeathedRunners),
    Replaced(Runner),
    Cleared { left_on_base: u32 },
    Counters { inning: u32, at_bat: u32 },
}

/// Caller-owned tracker state for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerTrackingState {
    bases: Bases,
    ledger: EarnedRunLedger,
    inning: u32,
    at_bat: u32,
}

impl Default for RunnerTrackingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Empty bases, empty ledger, first inning, first at-bat.
#[must_use]
pub fn create_runner_tracking_state() -> RunnerTrackingState {
    RunnerTrackingState::new()
}

impl RunnerTrackingState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bases: Bases::default(),
            ledger: EarnedRunLedger::default(),
            inning: FIRST_INNING,
            at_bat: FIRST_AT_BAT,
        }
    }

    #[must_use]
    pub const fn inning(&self) -> u32 {
        self.inning
    }

    #[must_use]
    pub const fn at_bat(&self) -> u32 {
        self.at_bat
    }

    #[must_use]
    pub const fn ledger(&self) -> &EarnedRunLedger {
        &self.ledger
    }

    /// Put `runner` on `base`. `current_pitcher` is charged with allowing them.
    ///
    /// # Errors
    ///
    /// [`TrackerError::BaseOccupied`] if someone is already standing there.
    pub fn add_runner(
        &mut self,
        base: Base,
        runner: Runner,
        current_pitcher: &PitcherId,
    ) -> Result<(), TrackerError> {
        if let Some(occupant) = self.bases.get(base) {
            return Err(TrackerError::BaseOccupied {
                base,
                occupant: occupant.runner_id.clone(),
            });
        }
        log::debug!(
            "runner {} placed on {base} against {current_pitcher}",
            runner.runner_id
        );
        self.ledger.line_mut(current_pitcher).runners_allowed += 1;
        *self.bases.slot_mut(base) = Some(runner);
        Ok(())
    }

    /// Move the runner on `from`; every run counts as earned.
    ///
    /// # Errors
    ///
    /// See [`Self::advance_runner_with`].
    pub fn advance_runner(
        &mut self,
        from: Base,
        to: Destination,
        current_pitcher: &PitcherId,
    ) -> Result<AdvanceOutcome, TrackerError> {
        self.advance_runner_with(from, to, current_pitcher, &AllEarned)
    }

    /// Move the runner on `from`, letting `classifier` rule on any run.
    ///
    /// A run is charged to the runner's `inherited_from` pitcher when set and
    /// to `current_pitcher` otherwise.
    ///
    /// # Errors
    ///
    /// [`TrackerError::BaseEmpty`] when nobody is on `from`,
    /// [`TrackerError::BackwardAdvance`] when `to` is not ahead of `from`, and
    /// [`TrackerError::BaseOccupied`] when `to` is taken.
    pub fn advance_runner_with<C>(
        &mut self,
        from: Base,
        to: Destination,
        current_pitcher: &PitcherId,
        classifier: &C,
    ) -> Result<AdvanceOutcome, TrackerError>
    where
        C: RunClassifier + ?Sized,
    {
        if !self.bases.is_occupied(from) {
            return Err(TrackerError::BaseEmpty { base: from });
        }
        if to.ordinal() <= from.ordinal() {
            return Err(TrackerError::BackwardAdvance { from, to });
        }
        if let Some(target) = to.base()
            && let Some(occupant) = self.bases.get(target)
        {
            return Err(TrackerError::BaseOccupied {
                base: target,
                occupant: occupant.runner_id.clone(),
            });
        }

        let Some(runner) = self.bases.slot_mut(from).take() else {
            return Err(TrackerError::BaseEmpty { base: from });
        };

        if let Some(target) = to.base() {
            *self.bases.slot_mut(target) = Some(runner);
            return Ok(AdvanceOutcome::Moved { to: target });
        }

        let charged_to = runner.responsible_pitcher(current_pitcher).clone();
        let run = RunScored {
            kind: classifier.classify(&runner),
            inherited: &charged_to != current_pitcher,
            charged_to,
            runner,
        };
        log::debug!(
            "{} scored, {:?} run charged to {} (pitching: {current_pitcher})",
            run.runner.runner_id,
            run.kind,
            run.charged_to
        );
        self.ledger.charge(&run, current_pitcher);
        Ok(AdvanceOutcome::Scored(run))
    }

    /// Remove the runner on `base` without a run.
    ///
    /// # Errors
    ///
    /// [`TrackerError::BaseEmpty`] when nobody is there.
    pub fn runner_out(&mut self, base: Base) -> Result<Runner, TrackerError> {
        self.bases
            .slot_mut(base)
            .take()
            .ok_or(TrackerError::BaseEmpty { base })
    }

    /// Tag every runner the outgoing pitcher is still liable for.
    ///
    /// Runners already inherited from an earlier pitcher keep that link. The
    /// returned payload lists every runner on base, first to third.
    pub fn handle_pitching_change(&mut self, outgoing: &PitcherId) -> BequeathedRunners {
        let payload = build_bequeathed_runners(&self.bases);
        let mut tagged = 0_u32;
        for base in Base::ALL {
            if let Some(runner) = self.bases.slot_mut(base).as_mut()
                && runner.inherited_from.is_none()
            {
                runner.inherited_from = Some(outgoing.clone());
                tagged += 1;
            }
        }
        if tagged > 0 {
            self.ledger.line_mut(outgoing).bequeathed_runners += tagged;
        }
        log::debug!(
            "pitching change: {outgoing} leaves {} on base, {tagged} newly bequeathed",
            payload.len()
        );
        payload
    }

    /// Swap a pinch runner in for whoever is on `base`, keeping liability.
    ///
    /// # Errors
    ///
    /// [`TrackerError::BaseEmpty`] when nobody is there.
    pub fn handle_pinch_runner(
        &mut self,
        base: Base,
        mut new_runner: Runner,
    ) -> Result<Runner, TrackerError> {
        let slot = self.bases.slot_mut(base);
        let Some(replaced) = slot.take() else {
            return Err(TrackerError::BaseEmpty { base });
        };
        new_runner.how_reached = replaced.how_reached;
        new_runner.inherited_from.clone_from(&replaced.inherited_from);
        *slot = Some(new_runner);
        Ok(replaced)
    }

    /// Empty the bases. Returns how many runners were stranded.
    pub fn clear_bases(&mut self) -> u32 {
        let left_on_base = len_to_u32(self.bases.runner_count());
        self.bases = Bases::default();
        left_on_base
    }

    /// Advance the inning counter; clears the bases and resets the at-bat.
    pub fn next_inning(&mut self) -> u32 {
        let left_on_base = self.clear_bases();
        self.inning += 1;
        self.at_bat = FIRST_AT_BAT;
        left_on_base
    }

    pub const fn next_at_bat(&mut self) {
        self.at_bat += 1;
    }

    #[must_use]
    pub fn get_er_summary(&self) -> ErSummary {
        ErSummary::from_ledger(&self.ledger)
    }

    #[must_use]
    pub const fn get_current_bases(&self) -> &Bases {
        &self.bases
    }

    /// Apply a single transition.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    pub fn apply(&mut self, event: TrackerEvent) -> Result<TrackerOutcome, TrackerError> {
        match event {
            TrackerEvent::AddRunner {
                base,
                runner,
                current_pitcher,
            } => self
                .add_runner(base, runner, &current_pitcher)
                .map(|()| TrackerOutcome::Placed),
            TrackerEvent::AdvanceRunner {
                from,
                to,
                current_pitcher,
            } => self
                .advance_runner(from, to, &current_pitcher)
                .map(TrackerOutcome::Advanced),
            TrackerEvent::RunnerOut { base } => self.runner_out(base).map(TrackerOutcome::Removed),
            TrackerEvent::PitchingChange { outgoing } => Ok(TrackerOutcome::Bequeathed(
                self.handle_pitching_change(&outgoing),
            )),
            TrackerEvent::PinchRunner { base, runner } => self
                .handle_pinch_runner(base, runner)
                .map(TrackerOutcome::Replaced),
            TrackerEvent::ClearBases => Ok(TrackerOutcome::Cleared {
                left_on_base: self.clear_bases(),
            }),
            TrackerEvent::NextInning => Ok(TrackerOutcome::Cleared {
                left_on_base: self.next_inning(),
            }),
            TrackerEvent::NextAtBat => {
                self.next_at_bat();
                Ok(TrackerOutcome::Counters {
                    inning: self.inning,
                    at_bat: self.at_bat,
                })
            }
        }
    }

    /// Route a substitution to the tracker. Lineup-only moves are ignored.
    ///
    /// # Errors
    ///
    /// [`TrackerError::BaseEmpty`] for a pinch runner on a vacant base.
    pub fn apply_substitution(
        &mut self,
        event: &SubstitutionEvent,
        current_pitcher: &PitcherId,
    ) -> Result<Option<TrackerOutcome>, TrackerError> {
        match event {
            SubstitutionEvent::PitchingChange { change, .. }
            | SubstitutionEvent::DoubleSwitch {
                pitching_change: change,
                ..
            } => {
                if &change.outgoing_pitcher_id != current_pitcher {
                    log::warn!(
                        "pitching change removes {} but {current_pitcher} is on the mound",
                        change.outgoing_pitcher_id
                    );
                }
                Ok(Some(TrackerOutcome::Bequeathed(
                    self.handle_pitching_change(&change.outgoing_pitcher_id),
                )))
            }
            SubstitutionEvent::PinchRun { change, .. } => {
                let runner = Runner::new(
                    change.pinch_runner_id.as_str(),
                    &change.pinch_runner_name,
                    change.how_original_reached,
                );
                self.handle_pinch_runner(change.base, runner)
                    .map(|replaced| Some(TrackerOutcome::Replaced(replaced)))
            }
            SubstitutionEvent::PinchHit { .. }
            | SubstitutionEvent::DefensiveSub { .. }
            | SubstitutionEvent::PositionSwitch { .. } => Ok(None),
        }
    }
}
