use anyhow::{Context, Result, ensure};

use scorebook_engine::{
    BatterResult, Bases, D3kDetails, D3kOutcome, Destination, EventHeader, HalfInning,
    HowReached, PitcherAppearance, PitcherId, PitcherRole, PitchingChange, PlayerId, Runner,
    SaveClassification, SaveOpportunity, StrikeoutType, SubstitutionEvent,
};

use crate::logic::GameLog;
use crate::logic::recorder::{PitcherRef, PlayEvent, PlayerRef};
use crate::logic::{SimulationPlan, SimulationSummary};

/// Small builder for hand-written play-by-play.
struct Script {
    log: GameLog,
    inning: u32,
    half_inning: HalfInning,
    outs: u8,
    batters: u32,
}

fn player(id: &str) -> PlayerRef {
    PlayerRef::new(id, &format!("Player {id}"))
}

impl Script {
    fn new(game_id: &str, home: &PitcherRef, away: &PitcherRef) -> Self {
        Self {
            log: GameLog::new(game_id, home.clone(), away.clone()),
            inning: 1,
            half_inning: HalfInning::Top,
            outs: 0,
            batters: 0,
        }
    }

    fn batting_key(&self) -> &'static str {
        match self.half_inning {
            HalfInning::Top => "away",
            HalfInning::Bottom => "home",
        }
    }

    fn catcher(&self) -> PlayerRef {
        match self.half_inning {
            HalfInning::Top => PlayerRef::new("home-c", "Home Catcher"),
            HalfInning::Bottom => PlayerRef::new("away-c", "Away Catcher"),
        }
    }

    fn next_batter(&mut self) -> PlayerRef {
        self.batters += 1;
        player(&format!("{}-{}", self.batting_key(), self.batters))
    }

    fn header(&self) -> EventHeader {
        EventHeader {
            game_id: self.log.game_id.clone(),
            inning: self.inning,
            half_inning: self.half_inning,
            outs: self.outs,
            timestamp: 0,
        }
    }

    fn push(mut self, event: PlayEvent) -> Self {
        self.log.events.push(event);
        self
    }

    fn half(mut self, inning: u32, half_inning: HalfInning) -> Self {
        self.inning = inning;
        self.half_inning = half_inning;
        self.outs = 0;
        self.push(PlayEvent::StartHalfInning {
            inning,
            half_inning,
        })
    }

    fn reach(mut self, how_reached: HowReached, base: Destination) -> Self {
        let batter = self.next_batter();
        self.push(PlayEvent::BatterReached {
            batter,
            how_reached,
            base,
        })
    }

    fn outs(mut self, count: u8) -> Self {
        for _ in 0..count {
            let batter = self.next_batter();
            self.outs += 1;
            self = self.push(PlayEvent::BatterOut { batter });
        }
        self
    }

    fn relieve(
        self,
        outgoing: &PitcherRef,
        incoming: &PitcherRef,
        role: PitcherRole,
        bases: &Bases,
    ) -> Self {
        let mut change = PitchingChange::new(
            (&outgoing.id, &outgoing.name),
            (&incoming.id, &incoming.name),
            bases,
        );
        change.incoming_pitcher_role = role;
        let event = SubstitutionEvent::PitchingChange {
            header: self.header(),
            change,
        };
        self.push(PlayEvent::Substitution { event })
    }

    fn d3k(mut self, outcome: D3kOutcome, strikeout_type: StrikeoutType) -> Self {
        let batter = self.next_batter();
        let catcher = self.catcher();
        self.push(PlayEvent::DroppedThirdStrike {
            batter,
            catcher,
            outcome,
            strikeout_type,
            details: D3kDetails::default(),
        })
    }

    fn game_over(self, winning_pitcher: Option<&PitcherRef>) -> GameLog {
        self.push(PlayEvent::GameOver {
            winning_pitcher: winning_pitcher.map(|pitcher| pitcher.id.clone()),
        })
        .log
    }
}

fn home_starter() -> PitcherRef {
    PitcherRef::new("starter", "Home Starter")
}

fn visitor() -> PitcherRef {
    PitcherRef::new("visitor", "Visiting Starter")
}

fn closer() -> PitcherRef {
    PitcherRef::new("closer", "Closer")
}

fn setup_man() -> PitcherRef {
    PitcherRef::new("setup", "Setup Man")
}

fn appearance<'a>(summary: &'a SimulationSummary, id: &str) -> Result<&'a PitcherAppearance> {
    summary
        .ledger
        .appearance(&PitcherId::new(id))
        .with_context(|| format!("no appearance recorded for {id}"))
}

fn save_count(summary: &SimulationSummary) -> usize {
    summary
        .ledger
        .appearances
        .iter()
        .filter(|appearance| appearance.classification == SaveClassification::Save)
        .count()
}

// Scenario: runner on first, nobody out, strike three gets away.
fn d3k_illegal_game() -> GameLog {
    Script::new("scenario-a", &home_starter(), &visitor())
        .half(1, HalfInning::Top)
        .reach(HowReached::Walk, Destination::First)
        .d3k(D3kOutcome::Reached, StrikeoutType::Swinging)
        .game_over(None)
}

fn d3k_illegal_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger;
    let event = ledger.d3k_events.first().context("no dropped third strike recorded")?;
    ensure!(!event.is_legal, "first occupied with no outs must be illegal");
    ensure!(event.outcome == D3kOutcome::Illegal, "outcome was {}", event.outcome);
    ensure!(event.batter_result == BatterResult::Out, "batter must be out");
    ensure!(event.bases_before.first, "snapshot should show first occupied");

    let catcher_attempts = ledger
        .d3k
        .catchers
        .get(&PlayerId::new("home-c"))
        .map_or(0, |stats| stats.dropped_third_strikes);
    ensure!(catcher_attempts == 0, "illegal drops are not catcher attempts");
    ensure!(ledger.left_on_base == 1, "walked runner should be stranded");
    Ok(())
}

pub fn d3k_illegal_plan() -> SimulationPlan {
    SimulationPlan::scripted(d3k_illegal_game).with_expectation(d3k_illegal_expectation)
}

// Scenario: bases empty, batter beats the throw.
fn d3k_reached_game() -> GameLog {
    Script::new("scenario-b", &home_starter(), &visitor())
        .half(1, HalfInning::Top)
        .d3k(D3kOutcome::Reached, StrikeoutType::Looking)
        .game_over(None)
}

fn d3k_reached_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger;
    let event = ledger.d3k_events.first().context("no dropped third strike recorded")?;
    ensure!(event.is_legal, "first base was open");
    ensure!(event.outcome == D3kOutcome::Reached, "outcome was {}", event.outcome);
    ensure!(event.batter_result == BatterResult::First, "batter should be on first");
    ensure!(event.pitcher_strikeout, "pitcher keeps the strikeout");

    let catcher = ledger
        .d3k
        .catchers
        .get(&PlayerId::new("home-c"))
        .context("catcher should have a D3K line")?;
    ensure!(catcher.dropped_third_strikes == 1 && catcher.failed_throws == 1);
    let batter = ledger
        .d3k
        .batters
        .get(&event.batter_id)
        .context("batter should have a D3K line")?;
    ensure!(batter.reached == 1, "batter reached once");
    ensure!(ledger.left_on_base == 1, "batter should be stranded on first");
    Ok(())
}

pub fn d3k_reached_plan() -> SimulationPlan {
    SimulationPlan::scripted(d3k_reached_game).with_expectation(d3k_reached_expectation)
}

// Scenario: first occupied but two outs, so the batter may run.
fn d3k_two_outs_game() -> GameLog {
    Script::new("scenario-f", &home_starter(), &visitor())
        .half(1, HalfInning::Top)
        .reach(HowReached::HitByPitch, Destination::First)
        .outs(2)
        .d3k(D3kOutcome::ThrownOut, StrikeoutType::Swinging)
        .game_over(None)
}

fn d3k_two_outs_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger;
    let event = ledger.d3k_events.first().context("no dropped third strike recorded")?;
    ensure!(event.is_legal, "two outs opens the play");
    ensure!(event.outcome == D3kOutcome::ThrownOut, "outcome was {}", event.outcome);
    ensure!(event.batter_result == BatterResult::Out);
    let catcher = ledger
        .d3k
        .catchers
        .get(&PlayerId::new("home-c"))
        .context("catcher should have a D3K line")?;
    ensure!(catcher.throwouts == 1, "catcher should be credited the throwout");
    Ok(())
}

pub fn d3k_two_outs_plan() -> SimulationPlan {
    SimulationPlan::scripted(d3k_two_outs_game).with_expectation(d3k_two_outs_expectation)
}

fn pitcher_a() -> PitcherRef {
    PitcherRef::new("pitcher-a", "Pitcher A")
}

fn pitcher_b() -> PitcherRef {
    PitcherRef::new("pitcher-b", "Pitcher B")
}

// Scenario: A puts a man on, B relieves and serves up a home run.
fn inherited_runner_game() -> GameLog {
    let bases = Bases {
        first: Some(Runner::new("away-1", "Player away-1", HowReached::Hit)),
        ..Bases::default()
    };
    Script::new("scenario-c", &pitcher_a(), &visitor())
        .half(1, HalfInning::Top)
        .reach(HowReached::Hit, Destination::First)
        .relieve(&pitcher_a(), &pitcher_b(), PitcherRole::RP, &bases)
        .reach(HowReached::Hit, Destination::Home)
        .outs(3)
        .half(1, HalfInning::Bottom)
        .outs(3)
        .game_over(Some(&visitor()))
}

fn inherited_runner_expectation(summary: &SimulationSummary) -> Result<()> {
    let er = &summary.ledger.er_summary;
    let a = PitcherId::new("pitcher-a");
    let b = PitcherId::new("pitcher-b");
    ensure!(er.earned_runs_for(&a) == 1, "A owns the inherited runner's run");
    ensure!(er.earned_runs_for(&b) == 1, "B owns the batter's run");

    let a_line = er.line(&a).context("A should have a line")?;
    ensure!(a_line.bequeathed_runners == 1, "A left one runner behind");
    let b_line = er.line(&b).context("B should have a line")?;
    ensure!(
        b_line.inherited_runners_scored == 1,
        "one inherited runner scored on B's watch"
    );

    let first_run = summary.ledger.runs.first().context("no runs recorded")?;
    ensure!(first_run.inherited && first_run.charged_to == a);
    Ok(())
}

pub fn inherited_runner_plan() -> SimulationPlan {
    SimulationPlan::scripted(inherited_runner_game).with_expectation(inherited_runner_expectation)
}

fn home_two_nothing() -> Script {
    Script::new("scenario-d", &home_starter(), &visitor())
        .half(1, HalfInning::Top)
        .outs(3)
        .half(1, HalfInning::Bottom)
        .reach(HowReached::Hit, Destination::Home)
        .reach(HowReached::Hit, Destination::Home)
        .outs(3)
}

// Scenario: two-run lead handed to the closer for the ninth.
fn closer_save_game() -> GameLog {
    home_two_nothing()
        .half(9, HalfInning::Top)
        .relieve(&home_starter(), &closer(), PitcherRole::CL, &Bases::default())
        .outs(3)
        .game_over(Some(&home_starter()))
}

fn closer_save_expectation(summary: &SimulationSummary) -> Result<()> {
    let closer = appearance(summary, "closer")?;
    ensure!(
        closer.classification == SaveClassification::Save,
        "closer classified {}",
        closer.classification
    );
    let starter = appearance(summary, "starter")?;
    ensure!(starter.classification == SaveClassification::None);
    ensure!(save_count(summary) == 1, "exactly one save per game");
    Ok(())
}

pub fn closer_save_plan() -> SimulationPlan {
    SimulationPlan::scripted(closer_save_game).with_expectation(closer_save_expectation)
}

// Scenario: setup man bridges the eighth, closer finishes the ninth.
fn setup_hold_game() -> GameLog {
    let mut script = home_two_nothing();
    script.log.game_id = "scenario-e".to_string();
    script
        .half(8, HalfInning::Top)
        .relieve(&home_starter(), &setup_man(), PitcherRole::RP, &Bases::default())
        .outs(3)
        .half(8, HalfInning::Bottom)
        .outs(3)
        .half(9, HalfInning::Top)
        .relieve(&setup_man(), &closer(), PitcherRole::CL, &Bases::default())
        .outs(3)
        .game_over(Some(&home_starter()))
}

fn setup_hold_expectation(summary: &SimulationSummary) -> Result<()> {
    let setup = appearance(summary, "setup")?;
    ensure!(
        setup.opportunity
            == SaveOpportunity::Qualified {
                tying_run_close: true
            },
        "two-run lead puts the tying run on deck"
    );
    ensure!(
        setup.classification == SaveClassification::Hold,
        "setup classified {}",
        setup.classification
    );
    let closer = appearance(summary, "closer")?;
    ensure!(closer.classification == SaveClassification::Save);
    ensure!(save_count(summary) == 1, "exactly one save per game");
    Ok(())
}

pub fn setup_hold_plan() -> SimulationPlan {
    SimulationPlan::scripted(setup_hold_game).with_expectation(setup_hold_expectation)
}

// Scenario: one-run lead, closer gives up two homers and the game.
fn blown_save_game() -> GameLog {
    Script::new("scenario-g", &home_starter(), &visitor())
        .half(1, HalfInning::Top)
        .outs(3)
        .half(1, HalfInning::Bottom)
        .reach(HowReached::Hit, Destination::Home)
        .outs(3)
        .half(9, HalfInning::Top)
        .relieve(&home_starter(), &closer(), PitcherRole::CL, &Bases::default())
        .reach(HowReached::Hit, Destination::Home)
        .reach(HowReached::Hit, Destination::Home)
        .outs(3)
        .half(9, HalfInning::Bottom)
        .outs(3)
        .game_over(Some(&visitor()))
}

fn blown_save_expectation(summary: &SimulationSummary) -> Result<()> {
    let closer = appearance(summary, "closer")?;
    ensure!(
        closer.classification == SaveClassification::BlownSave,
        "closer classified {}",
        closer.classification
    );
    ensure!(closer.blown_save_loss, "closer also took the loss");
    ensure!(save_count(summary) == 0, "nobody saves a lost lead");
    ensure!(
        summary.ledger.er_summary.earned_runs_for(&PitcherId::new("closer")) == 2,
        "both home runs are on the closer"
    );
    Ok(())
}

pub fn blown_save_plan() -> SimulationPlan {
    SimulationPlan::scripted(blown_save_game).with_expectation(blown_save_expectation)
}
