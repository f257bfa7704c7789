//! Reference caller for the attribution engine.
//!
//! [`GameRecorder`] folds a play-by-play stream into the runner tracker, the
//! pitcher appearances and the dropped-third-strike log, keeping score, outs
//! and inning itself. The engine never sees events out of order because the
//! recorder rejects them first.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use thiserror::Error;

use scorebook_engine::constants::OUTS_PER_INNING;
use scorebook_engine::{
    AdvanceOutcome, AppearanceEvent, AppearanceExit, Base, BaseOccupancy, Bases, D3kContext,
    D3kDetails, D3kError, D3kEvent, D3kOutcome, D3kTotals, Destination, ErSummary, GameState,
    GameTotals, HalfInning, HowReached, PitcherAppearance, PitcherId, PlayerId, RulesConfig,
    RunScored, Runner, RunnerTrackingState, StrikeoutType, SubstitutionEvent, Team, TrackerError,
    create_d3k_event,
};

const HOME_ORDINAL: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

impl PlayerRef {
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: PlayerId::new(id),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitcherRef {
    pub id: PitcherId,
    pub name: String,
}

impl PitcherRef {
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: PitcherId::new(id),
            name: name.to_string(),
        }
    }
}

/// One scored play, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayEvent {
    StartHalfInning {
        inning: u32,
        half_inning: HalfInning,
    },
    /// The batter reaches `base`; runners standing in the way are forced
    /// ahead. `HOME` is an inside-the-park or over-the-fence home run.
    BatterReached {
        batter: PlayerRef,
        how_reached: HowReached,
        base: Destination,
    },
    RunnerAdvanced {
        from: Base,
        to: Destination,
    },
    RunnerOut {
        base: Base,
    },
    BatterOut {
        batter: PlayerRef,
    },
    Substitution {
        event: SubstitutionEvent,
    },
    DroppedThirdStrike {
        batter: PlayerRef,
        catcher: PlayerRef,
        outcome: D3kOutcome,
        #[serde(default)]
        strikeout_type: StrikeoutType,
        #[serde(default)]
        details: D3kDetails,
    },
    GameOver {
        #[serde(default)]
        winning_pitcher: Option<PitcherId>,
    },
}

impl PlayEvent {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StartHalfInning { .. } => "start_half_inning",
            Self::BatterReached { .. } => "batter_reached",
            Self::RunnerAdvanced { .. } => "runner_advanced",
            Self::RunnerOut { .. } => "runner_out",
            Self::BatterOut { .. } => "batter_out",
            Self::Substitution { .. } => "substitution",
            Self::DroppedThirdStrike { .. } => "dropped_third_strike",
            Self::GameOver { .. } => "game_over",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RecorderError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    D3k(#[from] D3kError),
    #[error("no half-inning has been started")]
    NotStarted,
    #[error("side already retired in the {half_inning} of inning {inning}")]
    SideRetired { inning: u32, half_inning: HalfInning },
    #[error("{outgoing} is not on the mound ({current} is pitching)")]
    NotOnMound {
        outgoing: PitcherId,
        current: PitcherId,
    },
    #[error("cannot start the {half_inning} of inning {inning} after the {current_half} of inning {current_inning}")]
    HalfOutOfOrder {
        inning: u32,
        half_inning: HalfInning,
        current_inning: u32,
        current_half: HalfInning,
    },
    #[error("the {half_inning} of inning {inning} has only {outs} outs")]
    SideNotRetired {
        inning: u32,
        half_inning: HalfInning,
        outs: u8,
    },
    #[error("game {0} is already over")]
    GameOver(String),
    #[error("game {0} has not ended")]
    InProgress(String),
    #[error("failed to fingerprint ledger: {0}")]
    Fingerprint(String),
}

/// The pitcher currently on the mound for one team and their open stint.
#[derive(Debug, Clone)]
struct Staff {
    pitcher: PitcherRef,
    appearance: PitcherAppearance,
}

impl Staff {
    fn enter(pitcher: PitcherRef, team: Team, game: &GameState, rules: &RulesConfig) -> Self {
        let appearance =
            PitcherAppearance::create(&pitcher.id, &pitcher.name, team, game, rules);
        Self {
            pitcher,
            appearance,
        }
    }
}

/// `1..=3` map to bases, anything past third is home.
#[must_use]
pub const fn destination_for(ordinal: u8) -> Destination {
    match ordinal {
        0 | 1 => Destination::First,
        2 => Destination::Second,
        3 => Destination::Third,
        _ => Destination::Home,
    }
}

#[derive(Debug, Clone)]
pub struct GameRecorder {
    game_id: String,
    rules: RulesConfig,
    game: GameState,
    tracker: RunnerTrackingState,
    home: Staff,
    away: Staff,
    relieved: Vec<PitcherAppearance>,
    runs: Vec<RunScored>,
    d3k_events: Vec<D3kEvent>,
    left_on_base: u32,
    events_recorded: usize,
    started: bool,
    over: bool,
}

impl GameRecorder {
    #[must_use]
    pub fn new(
        game_id: &str,
        rules: RulesConfig,
        home_starter: PitcherRef,
        away_starter: PitcherRef,
    ) -> Self {
        let game = GameState::new(rules.scheduled_innings);
        let home = Staff::enter(home_starter, Team::Home, &game, &rules);
        let away = Staff::enter(away_starter, Team::Away, &game, &rules);
        Self {
            game_id: game_id.to_string(),
            rules,
            game,
            tracker: RunnerTrackingState::new(),
            home,
            away,
            relieved: Vec::new(),
            runs: Vec::new(),
            d3k_events: Vec::new(),
            left_on_base: 0,
            events_recorded: 0,
            started: false,
            over: false,
        }
    }

    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    #[must_use]
    pub const fn game(&self) -> &GameState {
        &self.game
    }

    #[must_use]
    pub const fn bases(&self) -> &Bases {
        self.tracker.get_current_bases()
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.over
    }

    #[must_use]
    pub const fn events_recorded(&self) -> usize {
        self.events_recorded
    }

    /// The pitcher on the mound for whoever is in the field.
    #[must_use]
    pub const fn fielding_pitcher(&self) -> &PitcherRef {
        &self.fielding_staff().pitcher
    }

    const fn fielding_staff(&self) -> &Staff {
        match self.game.fielding_team() {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    /// Apply one play. A rejected play leaves the recorder unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the play cannot happen in the current situation.
    pub fn record(&mut self, event: PlayEvent) -> Result<(), RecorderError> {
        let kind = event.kind();
        let result = self.apply(event);
        match &result {
            Ok(()) => self.events_recorded += 1,
            Err(err) => log::warn!("{}: rejected {kind}: {err}", self.game_id),
        }
        result
    }

    fn apply(&mut self, event: PlayEvent) -> Result<(), RecorderError> {
        if self.over {
            return Err(RecorderError::GameOver(self.game_id.clone()));
        }
        match event {
            PlayEvent::StartHalfInning {
                inning,
                half_inning,
            } => self.start_half_inning(inning, half_inning),
            PlayEvent::GameOver { winning_pitcher } => {
                self.game_over(winning_pitcher.as_ref());
                Ok(())
            }
            PlayEvent::BatterReached {
                batter,
                how_reached,
                base,
            } => {
                self.ensure_live()?;
                let runner = Runner::new(batter.id.as_str(), &batter.name, how_reached);
                self.tracker.next_at_bat();
                self.place_batter(runner, base)
            }
            PlayEvent::RunnerAdvanced { from, to } => {
                self.ensure_live()?;
                let pitcher = self.fielding_pitcher().id.clone();
                self.advance(from, to, &pitcher)
            }
            PlayEvent::RunnerOut { base } => {
                self.ensure_live()?;
                self.tracker.runner_out(base)?;
                self.sync_bases();
                self.record_out();
                Ok(())
            }
            PlayEvent::BatterOut { .. } => {
                self.ensure_live()?;
                self.tracker.next_at_bat();
                self.record_out();
                Ok(())
            }
            PlayEvent::Substitution { event } => {
                self.ensure_live()?;
                self.substitute(&event)
            }
            PlayEvent::DroppedThirdStrike {
                batter,
                catcher,
                outcome,
                strikeout_type,
                details,
            } => {
                self.ensure_live()?;
                self.dropped_third_strike(&batter, &catcher, outcome, strikeout_type, details)
            }
        }
    }

    fn ensure_live(&self) -> Result<(), RecorderError> {
        if !self.started {
            return Err(RecorderError::NotStarted);
        }
        if u32::from(self.game.outs) >= OUTS_PER_INNING {
            return Err(RecorderError::SideRetired {
                inning: self.game.inning,
                half_inning: self.game.half_inning,
            });
        }
        Ok(())
    }

    /// A new half must come later in the game and only once the side is
    /// retired. A walk-off ends with `GameOver`, never a new half.
    fn start_half_inning(
        &mut self,
        inning: u32,
        half_inning: HalfInning,
    ) -> Result<(), RecorderError> {
        if self.started {
            if (inning, half_inning) <= (self.game.inning, self.game.half_inning) {
                return Err(RecorderError::HalfOutOfOrder {
                    inning,
                    half_inning,
                    current_inning: self.game.inning,
                    current_half: self.game.half_inning,
                });
            }
            if u32::from(self.game.outs) < OUTS_PER_INNING {
                return Err(RecorderError::SideNotRetired {
                    inning: self.game.inning,
                    half_inning: self.game.half_inning,
                    outs: self.game.outs,
                });
            }
            self.update_fielding(AppearanceEvent::InningCompleted);
        }
        let mut stranded = self.tracker.clear_bases();
        while self.tracker.inning() < inning {
            stranded += self.tracker.next_inning();
        }
        self.left_on_base += stranded;
        self.started = true;
        self.game = self
            .game
            .clone()
            .at(inning, half_inning)
            .with_outs(0)
            .with_bases(BaseOccupancy::EMPTY);
        log::debug!("{}: {half_inning} {inning}", self.game_id);
        Ok(())
    }

    fn sync_bases(&mut self) {
        self.game.bases = self.tracker.get_current_bases().occupancy();
    }

    fn update_fielding(&mut self, event: AppearanceEvent) {
        let staff = match self.game.fielding_team() {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        };
        staff.appearance.update(event, &self.game);
    }

    fn record_out(&mut self) {
        self.game.outs = self.game.outs.saturating_add(1);
        self.update_fielding(AppearanceEvent::OutsRecorded(1));
    }

    fn score(&mut self, run: RunScored) {
        let batting = self.game.batting_team();
        self.game.add_runs(batting, 1);
        self.runs.push(run);
        self.update_fielding(AppearanceEvent::RunsAllowed(1));
    }

    fn advance(
        &mut self,
        from: Base,
        to: Destination,
        pitcher: &PitcherId,
    ) -> Result<(), RecorderError> {
        let outcome = self.tracker.advance_runner(from, to, pitcher)?;
        self.sync_bases();
        if let AdvanceOutcome::Scored(run) = outcome {
            self.score(run);
        }
        Ok(())
    }

    /// Push runners ahead just far enough that `through` and every base
    /// behind it are free, lead runner first.
    fn clear_path(&mut self, through: Base, pitcher: &PitcherId) -> Result<(), RecorderError> {
        let mut floor = through.ordinal() + 1;
        let mut moves = Vec::new();
        for base in Base::ALL {
            if !self.tracker.get_current_bases().is_occupied(base) {
                continue;
            }
            let target = base.ordinal().max(floor);
            floor = target + 1;
            if target != base.ordinal() {
                moves.push((base, destination_for(target.min(HOME_ORDINAL))));
            }
        }
        for (from, to) in moves.into_iter().rev() {
            self.advance(from, to, pitcher)?;
        }
        Ok(())
    }

    fn place_batter(&mut self, runner: Runner, to: Destination) -> Result<(), RecorderError> {
        let pitcher = self.fielding_pitcher().id.clone();
        let Some(base) = to.base() else {
            self.clear_path(Base::Third, &pitcher)?;
            self.tracker.add_runner(Base::Third, runner, &pitcher)?;
            return self.advance(Base::Third, Destination::Home, &pitcher);
        };
        self.clear_path(base, &pitcher)?;
        self.tracker.add_runner(base, runner, &pitcher)?;
        self.sync_bases();
        Ok(())
    }

    fn substitute(&mut self, event: &SubstitutionEvent) -> Result<(), RecorderError> {
        let team = self.game.fielding_team();
        let current = self.fielding_pitcher().id.clone();
        if let Some(change) = event.pitching_change()
            && change.outgoing_pitcher_id != current
        {
            return Err(RecorderError::NotOnMound {
                outgoing: change.outgoing_pitcher_id.clone(),
                current,
            });
        }

        let outcome = self.tracker.apply_substitution(event, &current)?;
        self.sync_bases();
        log::debug!(
            "{}: {} applied ({outcome:?})",
            self.game_id,
            event.event_type()
        );

        if let Some(change) = event.pitching_change() {
            let incoming = PitcherRef {
                id: change.incoming_pitcher_id.clone(),
                name: change.incoming_pitcher_name.clone(),
            };
            let relief = Staff::enter(incoming, team, &self.game, &self.rules);
            let staff = match team {
                Team::Home => &mut self.home,
                Team::Away => &mut self.away,
            };
            let mut outgoing = std::mem::replace(staff, relief);
            outgoing
                .appearance
                .finalize(&self.game, AppearanceExit::default());
            self.relieved.push(outgoing.appearance);
        }
        Ok(())
    }

    fn dropped_third_strike(
        &mut self,
        batter: &PlayerRef,
        catcher: &PlayerRef,
        outcome: D3kOutcome,
        strikeout_type: StrikeoutType,
        details: D3kDetails,
    ) -> Result<(), RecorderError> {
        let pitcher = self.fielding_pitcher().clone();
        let context = D3kContext {
            batter_id: batter.id.clone(),
            batter_name: batter.name.clone(),
            catcher_id: catcher.id.clone(),
            catcher_name: catcher.name.clone(),
            pitcher_id: pitcher.id,
            pitcher_name: pitcher.name,
            inning: self.game.inning,
            half_inning: self.game.half_inning,
            outs: self.game.outs,
            bases: self.game.bases,
            strikeout_type,
        };
        let event = create_d3k_event(outcome, &context, details)?;
        self.tracker.next_at_bat();
        if let Some(base) = event.batter_result.base() {
            let how_reached = match event.outcome {
                D3kOutcome::Error | D3kOutcome::WildThrow => HowReached::Error,
                D3kOutcome::Reached | D3kOutcome::ThrownOut | D3kOutcome::Illegal => {
                    HowReached::Hit
                }
            };
            let runner = Runner::new(batter.id.as_str(), &batter.name, how_reached);
            self.place_batter(runner, Destination::from(base))?;
        } else {
            self.record_out();
        }
        self.d3k_events.push(event);
        Ok(())
    }

    fn game_over(&mut self, winning_pitcher: Option<&PitcherId>) {
        for staff in [&mut self.home, &mut self.away] {
            let exit = AppearanceExit {
                finished_game: true,
                is_winning_pitcher: winning_pitcher == Some(&staff.pitcher.id),
                game_over: true,
            };
            staff.appearance.finalize(&self.game, exit);
        }
        for appearance in &mut self.relieved {
            let team_won = self.game.run_differential(appearance.team) > 0;
            appearance.record_game_result(team_won);
        }
        self.left_on_base += self.tracker.clear_bases();
        self.over = true;
        log::debug!(
            "{}: final {}-{} (away-home)",
            self.game_id,
            self.game.away_score,
            self.game.home_score
        );
    }

    /// Close the book on a finished game.
    ///
    /// # Errors
    ///
    /// [`RecorderError::InProgress`] before `GameOver` has been recorded.
    pub fn finish(self) -> Result<GameLedger, RecorderError> {
        if !self.over {
            return Err(RecorderError::InProgress(self.game_id));
        }
        let mut appearances = self.relieved;
        appearances.push(self.away.appearance);
        appearances.push(self.home.appearance);
        let d3k = D3kTotals::from_events(&self.d3k_events);
        let mut ledger = GameLedger {
            game_id: self.game_id,
            home_score: self.game.home_score,
            away_score: self.game.away_score,
            innings: self.game.inning,
            left_on_base: self.left_on_base,
            er_summary: self.tracker.get_er_summary(),
            runs: self.runs,
            appearances,
            d3k_events: self.d3k_events,
            d3k,
            fingerprint: String::new(),
        };
        ledger.fingerprint = ledger.compute_fingerprint()?;
        Ok(ledger)
    }
}

/// Everything the engine attributed over one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLedger {
    pub game_id: String,
    pub home_score: u32,
    pub away_score: u32,
    pub innings: u32,
    pub left_on_base: u32,
    pub er_summary: ErSummary,
    pub runs: Vec<RunScored>,
    pub appearances: Vec<PitcherAppearance>,
    pub d3k_events: Vec<D3kEvent>,
    pub d3k: D3kTotals,
    /// SHA-256 over every other field, hex encoded.
    pub fingerprint: String,
}

impl GameLedger {
    fn compute_fingerprint(&self) -> Result<String, RecorderError> {
        let mut unsigned = self.clone();
        unsigned.fingerprint.clear();
        let bytes = serde_json::to_vec(&unsigned)
            .map_err(|err| RecorderError::Fingerprint(err.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(hex, "{byte:02x}");
        }
        Ok(hex)
    }

    /// Whether the stored fingerprint still matches the contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be serialized.
    pub fn verify(&self) -> Result<bool, RecorderError> {
        Ok(self.compute_fingerprint()? == self.fingerprint)
    }

    #[must_use]
    pub const fn winner(&self) -> Option<Team> {
        if self.home_score > self.away_score {
            Some(Team::Home)
        } else if self.away_score > self.home_score {
            Some(Team::Away)
        } else {
            None
        }
    }

    /// The season contribution of this game.
    #[must_use]
    pub fn totals(&self) -> GameTotals {
        GameTotals::new(
            &self.game_id,
            self.er_summary.clone(),
            self.appearances.clone(),
            &self.d3k_events,
        )
    }

    #[must_use]
    pub fn appearance(&self, pitcher: &PitcherId) -> Option<&PitcherAppearance> {
        self.appearances
            .iter()
            .find(|appearance| &appearance.pitcher_id == pitcher)
    }
}
