//! Seeded generator of complete, legal games for property sweeps.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use scorebook_engine::constants::OUTS_PER_INNING;
use scorebook_engine::{
    Base, D3kDetails, D3kOutcome, Destination, ErrorInfo, ErrorType, EventHeader, HalfInning,
    HowReached, PinchRun, PitcherRole, PitchingChange, Position, RulesConfig, StrikeoutType,
    SubstitutionEvent, Team,
};

use super::game_log::GameLog;
use super::recorder::{
    GameRecorder, PitcherRef, PlayEvent, PlayerRef, RecorderError, destination_for,
};

/// Innings played past regulation before a tie is allowed to stand.
pub const EXTRA_INNINGS: u32 = 3;
/// Plate appearances after which every batter is retired.
const MAX_BATTERS_PER_HALF: u32 = 24;
const HOME_ORDINAL: u8 = 4;

const D3K_OUTCOMES: [D3kOutcome; 4] = [
    D3kOutcome::Reached,
    D3kOutcome::ThrownOut,
    D3kOutcome::Error,
    D3kOutcome::WildThrow,
];

const fn team_key(team: Team) -> &'static str {
    match team {
        Team::Home => "home",
        Team::Away => "away",
    }
}

const fn team_index(team: Team) -> usize {
    match team {
        Team::Home => 0,
        Team::Away => 1,
    }
}

/// Generate the game for `seed`. The same seed and rules always produce the
/// same log.
///
/// # Errors
///
/// Returns an error if the generator produced a play the recorder rejected.
pub fn generate_game(seed: u64, rules: &RulesConfig) -> Result<GameLog, RecorderError> {
    let mut generator = SyntheticGame::new(seed, *rules);
    generator.play()?;
    Ok(generator.log)
}

struct SyntheticGame {
    rng: ChaCha20Rng,
    rules: RulesConfig,
    recorder: GameRecorder,
    log: GameLog,
    batters: [u32; 2],
    relievers: [u32; 2],
    pinch_runners: u32,
}

impl SyntheticGame {
    fn new(seed: u64, rules: RulesConfig) -> Self {
        let game_id = format!("synthetic-{seed}");
        let log = GameLog::new(
            &game_id,
            PitcherRef::new("home-sp", "Home Starter"),
            PitcherRef::new("away-sp", "Away Starter"),
        );
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            recorder: log.recorder(rules),
            rules,
            log,
            batters: [0; 2],
            relievers: [0; 2],
            pinch_runners: 0,
        }
    }

    fn emit(&mut self, event: PlayEvent) -> Result<(), RecorderError> {
        self.recorder.record(event.clone())?;
        self.log.events.push(event);
        Ok(())
    }

    fn scheduled(&self) -> u32 {
        u32::from(self.rules.scheduled_innings)
    }

    fn play(&mut self) -> Result<(), RecorderError> {
        let scheduled = self.scheduled();
        let mut inning = 1;
        loop {
            self.play_half(inning, HalfInning::Top)?;
            let game = self.recorder.game();
            if !(inning >= scheduled && game.home_score > game.away_score) {
                self.play_half(inning, HalfInning::Bottom)?;
            }
            let game = self.recorder.game();
            let decided = inning >= scheduled && game.home_score != game.away_score;
            if decided || inning >= scheduled + EXTRA_INNINGS {
                break;
            }
            inning += 1;
        }
        self.emit(PlayEvent::GameOver {
            winning_pitcher: None,
        })
    }

    fn walked_off(&self) -> bool {
        let game = self.recorder.game();
        game.half_inning == HalfInning::Bottom
            && game.inning >= self.scheduled()
            && game.home_score > game.away_score
    }

    fn play_half(&mut self, inning: u32, half_inning: HalfInning) -> Result<(), RecorderError> {
        self.emit(PlayEvent::StartHalfInning {
            inning,
            half_inning,
        })?;
        if inning > 5 && self.rng.gen_bool(0.3) {
            self.change_pitcher()?;
        }
        let mut batters = 0;
        while u32::from(self.recorder.game().outs) < OUTS_PER_INNING && !self.walked_off() {
            if inning > 6 && self.rng.gen_bool(0.06) {
                self.change_pitcher()?;
            }
            if !self.recorder.bases().is_empty() && self.rng.gen_bool(0.04) {
                self.pinch_run()?;
            }
            batters += 1;
            if batters > MAX_BATTERS_PER_HALF {
                let batter = self.next_batter();
                self.emit(PlayEvent::BatterOut { batter })?;
            } else {
                self.plate_appearance()?;
            }
        }
        Ok(())
    }

    fn next_batter(&mut self) -> PlayerRef {
        let team = self.recorder.game().batting_team();
        let slot = &mut self.batters[team_index(team)];
        let order = *slot % 9 + 1;
        *slot += 1;
        PlayerRef::new(
            &format!("{}-{order}", team_key(team)),
            &format!("{} #{order}", team_key(team)),
        )
    }

    fn header(&self) -> EventHeader {
        let game = self.recorder.game();
        EventHeader {
            game_id: self.log.game_id.clone(),
            inning: game.inning,
            half_inning: game.half_inning,
            outs: game.outs,
            timestamp: 0,
        }
    }

    fn change_pitcher(&mut self) -> Result<(), RecorderError> {
        let team = self.recorder.game().fielding_team();
        let count = &mut self.relievers[team_index(team)];
        *count += 1;
        let incoming = PitcherRef::new(
            &format!("{}-rp{count}", team_key(team)),
            &format!("{} Reliever {count}", team_key(team)),
        );
        let outgoing = self.recorder.fielding_pitcher().clone();
        let mut change = PitchingChange::new(
            (&outgoing.id, &outgoing.name),
            (&incoming.id, &incoming.name),
            self.recorder.bases(),
        );
        if self.recorder.game().inning >= self.scheduled() {
            change.incoming_pitcher_role = PitcherRole::CL;
        }
        change.outgoing_pitch_count = self.rng.gen_range(15..110);
        let event = SubstitutionEvent::PitchingChange {
            header: self.header(),
            change,
        };
        self.emit(PlayEvent::Substitution { event })
    }

    fn pinch_run(&mut self) -> Result<(), RecorderError> {
        let occupied: Vec<Base> = self.recorder.bases().iter().map(|(base, _)| base).collect();
        let base = occupied[self.rng.gen_range(0..occupied.len())];
        let Some(replaced) = self.recorder.bases().get(base).cloned() else {
            return Ok(());
        };
        self.pinch_runners += 1;
        let team = self.recorder.game().batting_team();
        let change = PinchRun {
            replaced_player_id: replaced.runner_id.clone(),
            replaced_player_name: replaced.runner_name.clone(),
            replaced_batting_order: self.rng.gen_range(1..=9),
            base,
            pinch_runner_id: scorebook_engine::PlayerId::new(&format!(
                "{}-pr{}",
                team_key(team),
                self.pinch_runners
            )),
            pinch_runner_name: format!("Pinch Runner {}", self.pinch_runners),
            fielding_position: Position::LF,
            pitcher_responsible: replaced.inherited_from.clone(),
            how_original_reached: replaced.how_reached,
        };
        let event = SubstitutionEvent::PinchRun {
            header: self.header(),
            change,
        };
        self.emit(PlayEvent::Substitution { event })
    }

    fn plate_appearance(&mut self) -> Result<(), RecorderError> {
        let batter = self.next_batter();
        let roll = self.rng.gen_range(0..100);
        match roll {
            0..45 => self.emit(PlayEvent::BatterOut { batter }),
            45..53 => self.dropped_third_strike(batter),
            53..63 => self.reach(batter, HowReached::Walk, Destination::First),
            63..65 => self.reach(batter, HowReached::HitByPitch, Destination::First),
            65..68 => self.reach(batter, HowReached::Error, Destination::First),
            68..71 => self.fielders_choice(batter),
            71..86 => {
                self.advance_runners(1)?;
                self.reach(batter, HowReached::Hit, Destination::First)
            }
            86..93 => {
                self.advance_runners(2)?;
                self.reach(batter, HowReached::Hit, Destination::Second)
            }
            93..95 => {
                self.advance_runners(3)?;
                self.reach(batter, HowReached::Hit, Destination::Third)
            }
            _ => self.reach(batter, HowReached::Hit, Destination::Home),
        }
    }

    fn reach(
        &mut self,
        batter: PlayerRef,
        how_reached: HowReached,
        base: Destination,
    ) -> Result<(), RecorderError> {
        self.emit(PlayEvent::BatterReached {
            batter,
            how_reached,
            base,
        })
    }

    fn fielders_choice(&mut self, batter: PlayerRef) -> Result<(), RecorderError> {
        let lead = [Base::Third, Base::Second, Base::First]
            .into_iter()
            .find(|base| self.recorder.bases().is_occupied(*base));
        let Some(lead) = lead else {
            return self.emit(PlayEvent::BatterOut { batter });
        };
        self.emit(PlayEvent::RunnerOut { base: lead })?;
        if u32::from(self.recorder.game().outs) >= OUTS_PER_INNING {
            return Ok(());
        }
        self.reach(batter, HowReached::FieldersChoice, Destination::First)
    }

    /// Move runners ahead on a hit, lead runner first, never passing one
    /// another. Anyone still in the batter's way is forced by the recorder.
    fn advance_runners(&mut self, hit_bases: u8) -> Result<(), RecorderError> {
        let mut ahead = HOME_ORDINAL + 1;
        for base in [Base::Third, Base::Second, Base::First] {
            if !self.recorder.bases().is_occupied(base) {
                continue;
            }
            let extra = u8::from(self.rng.gen_bool(0.4));
            let mut target = (base.ordinal() + hit_bases + extra).min(HOME_ORDINAL);
            if target < HOME_ORDINAL && target >= ahead {
                target = ahead - 1;
            }
            if target > base.ordinal() {
                self.emit(PlayEvent::RunnerAdvanced {
                    from: base,
                    to: destination_for(target),
                })?;
                ahead = target;
            } else {
                ahead = base.ordinal();
            }
        }
        Ok(())
    }

    fn dropped_third_strike(&mut self, batter: PlayerRef) -> Result<(), RecorderError> {
        let fielding = self.recorder.game().fielding_team();
        let catcher = PlayerRef::new(
            &format!("{}-c", team_key(fielding)),
            &format!("{} Catcher", team_key(fielding)),
        );
        let outcome = D3K_OUTCOMES[self.rng.gen_range(0..D3K_OUTCOMES.len())];
        let mut details = D3kDetails::default();
        match outcome {
            D3kOutcome::ThrownOut => {
                details.throw_sequence = vec!["C".to_string(), "1B".to_string()];
            }
            D3kOutcome::Error if self.rng.gen_bool(0.5) => {
                details.error_info = Some(ErrorInfo {
                    fielder_id: catcher.id.clone(),
                    fielder_name: catcher.name.clone(),
                    error_type: ErrorType::Throwing,
                });
            }
            _ => {}
        }
        let strikeout_type = if self.rng.gen_bool(0.3) {
            StrikeoutType::Looking
        } else {
            StrikeoutType::Swinging
        };
        self.emit(PlayEvent::DroppedThirdStrike {
            batter,
            catcher,
            outcome,
            strikeout_type,
            details,
        })
    }
}
