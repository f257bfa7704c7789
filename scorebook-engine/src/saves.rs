//! Save, hold and blown-save detection for relief appearances.
//!
//! An appearance snapshots the situation when the reliever enters, follows
//! the lead while they pitch, and is classified once when they leave.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RulesConfig;
use crate::constants::TYING_RUN_REACH_BEYOND_BASES;
use crate::game::{BaseOccupancy, GameState, HalfInning, InningsPitched, PitcherId, Team};
use crate::numbers::{count_to_i32, len_to_u32};

/// Signed run differential for `pitcher_team`, read from the live score.
#[must_use]
pub fn calculate_lead(game: &GameState, pitcher_team: Team) -> i32 {
    game.run_differential(pitcher_team)
}

/// Save eligibility of a situation at the moment a reliever enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOpportunity {
    #[default]
    None,
    /// Lead within the save margin, or the tying run on base, at bat or on deck.
    Qualified { tying_run_close: bool },
    /// Only the long-relief clause could still apply; decided at exit.
    Undetermined,
}

impl SaveOpportunity {
    #[must_use]
    pub const fn is_qualified(self) -> bool {
        matches!(self, Self::Qualified { .. })
    }
}

fn tying_run_close(lead: i32, bases: BaseOccupancy) -> bool {
    lead <= count_to_i32(bases.runner_count()) + TYING_RUN_REACH_BEYOND_BASES
}

fn opportunity_for(lead: i32, bases: BaseOccupancy, inning: u32, rules: &RulesConfig) -> SaveOpportunity {
    if lead <= 0 {
        return SaveOpportunity::None;
    }
    if inning < rules.late_inning_start() {
        return SaveOpportunity::Undetermined;
    }
    let close = tying_run_close(lead, bases);
    if lead <= rules.max_save_lead || close {
        SaveOpportunity::Qualified {
            tying_run_close: close,
        }
    } else {
        SaveOpportunity::Undetermined
    }
}

/// Classify the current situation for a reliever of `pitcher_team`.
#[must_use]
pub fn is_save_opportunity(
    game: &GameState,
    pitcher_team: Team,
    rules: &RulesConfig,
) -> SaveOpportunity {
    opportunity_for(
        calculate_lead(game, pitcher_team),
        game.bases,
        game.inning,
        rules,
    )
}

/// Boolean form over primitive inputs with the default rules otherwise.
#[must_use]
pub fn is_save_opportunity_bool(
    lead: i32,
    bases: BaseOccupancy,
    inning: u32,
    scheduled_innings: u8,
) -> bool {
    let rules = RulesConfig {
        scheduled_innings,
        ..RulesConfig::default()
    };
    opportunity_for(lead, bases, inning, &rules).is_qualified()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub inning: u32,
    pub half_inning: HalfInning,
    pub outs: u8,
    pub bases: BaseOccupancy,
    pub lead: i32,
    pub inherited_runners: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "count", rename_all = "snake_case")]
pub enum AppearanceEvent {
    OutsRecorded(u32),
    RunsAllowed(u32),
    InningCompleted,
}

/// How an appearance ended, as known to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppearanceExit {
    pub finished_game: bool,
    pub is_winning_pitcher: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaveClassification {
    #[default]
    None,
    Save,
    BlownSave,
    Hold,
}

impl fmt::Display for SaveClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Save => "save",
            Self::BlownSave => "blown save",
            Self::Hold => "hold",
        })
    }
}

/// One pitcher's stint, from entry until it is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitcherAppearance {
    pub pitcher_id: PitcherId,
    pub pitcher_name: String,
    pub team: Team,
    pub entry: EntrySnapshot,
    pub opportunity: SaveOpportunity,
    pub current_lead: i32,
    /// Set once the lead is tied or lost; never cleared.
    pub lead_surrendered: bool,
    pub outs_recorded: u32,
    pub runs_allowed: u32,
    #[serde(default)]
    pub innings_completed: u32,
    #[serde(default)]
    pub effective_relief: Option<bool>,
    #[serde(default)]
    pub long_relief_qualified: bool,
    #[serde(default)]
    pub exit: Option<AppearanceExit>,
    #[serde(default)]
    pub classification: SaveClassification,
    #[serde(default)]
    pub blown_save_loss: bool,
    pub rules: RulesConfig,
}

/// Snapshot entry conditions for `pitcher_id` taking the mound for `team`.
#[must_use]
pub fn create_pitcher_appearance(
    pitcher_id: &PitcherId,
    pitcher_name: &str,
    team: Team,
    game: &GameState,
    rules: &RulesConfig,
) -> PitcherAppearance {
    PitcherAppearance::create(pitcher_id, pitcher_name, team, game, rules)
}

pub fn update_pitcher_appearance(
    appearance: &mut PitcherAppearance,
    event: AppearanceEvent,
    game: &GameState,
) {
    appearance.update(event, game);
}

pub fn finalize_pitcher_appearance(
    appearance: &mut PitcherAppearance,
    game: &GameState,
    exit: AppearanceExit,
) -> SaveClassification {
    appearance.finalize(game, exit)
}

impl PitcherAppearance {
    #[must_use]
    pub fn create(
        pitcher_id: &PitcherId,
        pitcher_name: &str,
        team: Team,
        game: &GameState,
        rules: &RulesConfig,
    ) -> Self {
        let lead = calculate_lead(game, team);
        let opportunity = is_save_opportunity(game, team, rules);
        log::debug!(
            "{pitcher_id} enters in inning {} with lead {lead}: {opportunity:?}",
            game.inning
        );
        Self {
            pitcher_id: pitcher_id.clone(),
            pitcher_name: pitcher_name.to_string(),
            team,
            entry: EntrySnapshot {
                inning: game.inning,
                half_inning: game.half_inning,
                outs: game.outs,
                bases: game.bases,
                lead,
                inherited_runners: len_to_u32(game.bases.runner_count()),
            },
            opportunity,
            current_lead: lead,
            lead_surrendered: false,
            outs_recorded: 0,
            runs_allowed: 0,
            innings_completed: 0,
            effective_relief: None,
            long_relief_qualified: false,
            exit: None,
            classification: SaveClassification::None,
            blown_save_loss: false,
            rules: *rules,
        }
    }

    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.exit.is_some()
    }

    #[must_use]
    pub const fn innings_pitched(&self) -> InningsPitched {
        InningsPitched::from_outs(self.outs_recorded)
    }

    fn track_lead(&mut self, game: &GameState) {
        self.current_lead = calculate_lead(game, self.team);
        if self.entry.lead > 0 && self.current_lead <= 0 && !self.lead_surrendered {
            log::debug!(
                "{} surrendered the lead ({} -> {})",
                self.pitcher_id,
                self.entry.lead,
                self.current_lead
            );
            self.lead_surrendered = true;
        }
    }

    /// Fold one out/run/inning event into the stint. Ignored once finalized.
    pub fn update(&mut self, event: AppearanceEvent, game: &GameState) {
        if self.is_finalized() {
            log::warn!(
                "{} appearance already finalized, ignoring {event:?}",
                self.pitcher_id
            );
            return;
        }
        match event {
            AppearanceEvent::OutsRecorded(outs) => {
                self.outs_recorded = self.outs_recorded.saturating_add(outs);
            }
            AppearanceEvent::RunsAllowed(runs) => {
                self.runs_allowed = self.runs_allowed.saturating_add(runs);
            }
            AppearanceEvent::InningCompleted => {
                self.innings_completed = self.innings_completed.saturating_add(1);
            }
        }
        self.track_lead(game);
    }

    /// Official scorer's judgement on whether long relief was effective.
    pub const fn rule_effective_relief(&mut self, effective: bool) {
        self.effective_relief = Some(effective);
    }

    /// Close the stint and classify it.
    pub fn finalize(&mut self, game: &GameState, exit: AppearanceExit) -> SaveClassification {
        if self.is_finalized() {
            return self.classification;
        }
        self.track_lead(game);
        self.exit = Some(exit);
        self.long_relief_qualified = matches!(self.opportunity, SaveOpportunity::Undetermined)
            && self.entry.lead > 0
            && self.outs_recorded >= self.rules.long_relief_min_outs
            && self.effective_relief == Some(true);

        self.classification = if detect_blown_save(self) {
            SaveClassification::BlownSave
        } else if detect_save(self) {
            SaveClassification::Save
        } else if detect_hold(self) {
            SaveClassification::Hold
        } else {
            SaveClassification::None
        };
        if exit.game_over && self.classification == SaveClassification::BlownSave {
            self.blown_save_loss = self.current_lead < 0;
        }
        log::debug!(
            "{} finalized: {} ({} IP)",
            self.pitcher_id,
            self.classification,
            self.innings_pitched()
        );
        self.classification
    }

    /// Record the final result for a stint that ended before the game did.
    pub fn record_game_result(&mut self, team_won: bool) {
        if self.classification == SaveClassification::BlownSave {
            self.blown_save_loss = !team_won;
        }
    }

    /// Whether any save path (entry qualification or long relief) was met.
    #[must_use]
    pub const fn had_save_opportunity(&self) -> bool {
        self.opportunity.is_qualified() || self.long_relief_qualified
    }

    #[must_use]
    pub fn detection_result(&self) -> SaveDetectionResult {
        let name = &self.pitcher_name;
        let (result, message) = match self.classification {
            SaveClassification::Save => (SaveResult::Save, format!("{name} earned the save!")),
            SaveClassification::Hold => (SaveResult::Hold, format!("{name} earned a hold")),
            SaveClassification::BlownSave if self.blown_save_loss => (
                SaveResult::BlownSaveLoss,
                format!("{name} blew the save AND took the loss!"),
            ),
            SaveClassification::BlownSave => {
                (SaveResult::BlownSave, format!("{name} blew the save!"))
            }
            SaveClassification::None => (SaveResult::None, self.no_decision_reason().to_string()),
        };
        SaveDetectionResult {
            result,
            message,
            details: SaveDetails {
                entered_with_lead: self.entry.lead,
                exited_with_lead: self.current_lead,
                outs_recorded: self.outs_recorded,
                was_qualifying_situation: self.had_save_opportunity(),
            },
        }
    }

    fn no_decision_reason(&self) -> &'static str {
        let Some(exit) = self.exit else {
            return "Appearance still in progress";
        };
        if !self.had_save_opportunity() {
            "Did not enter in save opportunity"
        } else if exit.finished_game && exit.is_winning_pitcher {
            "Pitcher is winning pitcher (not eligible for save)"
        } else if exit.finished_game {
            "Did not pitch full inning without tying run close"
        } else {
            "Did not record an out"
        }
    }
}

/// Lead surrendered during a stint that began as a save opportunity.
#[must_use]
pub const fn detect_blown_save(appearance: &PitcherAppearance) -> bool {
    appearance.is_finalized() && appearance.opportunity.is_qualified() && appearance.lead_surrendered
}

/// Finished the game holding a qualifying lead without being the winner.
#[must_use]
pub const fn detect_save(appearance: &PitcherAppearance) -> bool {
    let Some(exit) = appearance.exit else {
        return false;
    };
    if detect_blown_save(appearance)
        || !exit.finished_game
        || exit.is_winning_pitcher
        || appearance.current_lead <= 0
    {
        return false;
    }
    match appearance.opportunity {
        SaveOpportunity::Qualified { tying_run_close } => {
            tying_run_close || appearance.outs_recorded >= appearance.rules.save_min_outs
        }
        SaveOpportunity::Undetermined => {
            appearance.long_relief_qualified && !appearance.lead_surrendered
        }
        SaveOpportunity::None => false,
    }
}

/// Protected a qualifying lead, recorded an out and handed the game on.
#[must_use]
pub const fn detect_hold(appearance: &PitcherAppearance) -> bool {
    let Some(exit) = appearance.exit else {
        return false;
    };
    appearance.opportunity.is_qualified()
        && !appearance.lead_surrendered
        && appearance.current_lead > 0
        && appearance.outs_recorded >= appearance.rules.hold_min_outs
        && !exit.finished_game
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaveResult {
    Save,
    BlownSave,
    BlownSaveLoss,
    Hold,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDetails {
    pub entered_with_lead: i32,
    pub exited_with_lead: i32,
    pub outs_recorded: u32,
    pub was_qualifying_situation: bool,
}

/// UI-facing summary of a finalized appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDetectionResult {
    pub result: SaveResult,
    pub message: String,
    pub details: SaveDetails,
}
