//! Shared game vocabulary: identities, bases, runners and the live situation.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{DEFAULT_SCHEDULED_INNINGS, FIRST_INNING, OUTS_PER_INNING};
use crate::numbers::score_to_i32;

/// Identity of any player in a game (batter, runner, fielder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a pitcher; earned runs are always charged against one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitcherId(pub String);

impl PitcherId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PitcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PitcherId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Base {
    #[serde(rename = "1B")]
    First,
    #[serde(rename = "2B")]
    Second,
    #[serde(rename = "3B")]
    Third,
}

impl Base {
    pub const ALL: [Self; 3] = [Self::First, Self::Second, Self::Third];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "1B",
            Self::Second => "2B",
            Self::Third => "3B",
        }
    }

    /// Bases a runner must touch from home to stand here (1, 2 or 3).
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an advancing runner ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    #[serde(rename = "1B")]
    First,
    #[serde(rename = "2B")]
    Second,
    #[serde(rename = "3B")]
    Third,
    #[serde(rename = "HOME")]
    Home,
}

impl Destination {
    #[must_use]
    pub const fn base(self) -> Option<Base> {
        match self {
            Self::First => Some(Base::First),
            Self::Second => Some(Base::Second),
            Self::Third => Some(Base::Third),
            Self::Home => None,
        }
    }

    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Home => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "1B",
            Self::Second => "2B",
            Self::Third => "3B",
            Self::Home => "HOME",
        }
    }
}

impl From<Base> for Destination {
    fn from(base: Base) -> Self {
        match base {
            Base::First => Self::First,
            Base::Second => Self::Second,
            Base::Third => Self::Third,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered by play: the top of an inning comes before the bottom.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum HalfInning {
    #[default]
    #[serde(rename = "TOP")]
    Top,
    #[serde(rename = "BOTTOM")]
    Bottom,
}

impl HalfInning {
    #[must_use]
    pub const fn fielding_team(self) -> Team {
        match self {
            Self::Top => Team::Home,
            Self::Bottom => Team::Away,
        }
    }

    #[must_use]
    pub const fn batting_team(self) -> Team {
        self.fielding_team().opponent()
    }
}

impl fmt::Display for HalfInning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("TOP"),
            Self::Bottom => f.write_str("BOTTOM"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }
}

/// How a runner originally reached base; drives earned/unearned rulings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HowReached {
    #[default]
    #[serde(rename = "hit")]
    Hit,
    #[serde(rename = "walk")]
    Walk,
    #[serde(rename = "HBP")]
    HitByPitch,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "FC")]
    FieldersChoice,
    #[serde(rename = "inherited")]
    Inherited,
}

impl HowReached {
    /// Reached through a defensive misplay rather than the pitcher's doing.
    #[must_use]
    pub const fn is_misplay(self) -> bool {
        matches!(self, Self::Error | Self::FieldersChoice)
    }
}

/// A baserunner. `inherited_from` is only set once responsibility differs
/// from the pitcher currently on the mound, and is never rewritten after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    pub runner_id: PlayerId,
    pub runner_name: String,
    #[serde(default)]
    pub how_reached: HowReached,
    #[serde(default)]
    pub inherited_from: Option<PitcherId>,
}

impl Runner {
    #[must_use]
    pub fn new(runner_id: &str, runner_name: &str, how_reached: HowReached) -> Self {
        Self {
            runner_id: PlayerId::new(runner_id),
            runner_name: runner_name.to_string(),
            how_reached,
            inherited_from: None,
        }
    }

    #[must_use]
    pub fn with_inherited_from(mut self, pitcher: PitcherId) -> Self {
        self.inherited_from = Some(pitcher);
        self
    }

    /// Pitcher charged if this runner scores while `current` is pitching.
    #[must_use]
    pub fn responsible_pitcher<'a>(&'a self, current: &'a PitcherId) -> &'a PitcherId {
        self.inherited_from.as_ref().unwrap_or(current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bases {
    #[serde(default)]
    pub first: Option<Runner>,
    #[serde(default)]
    pub second: Option<Runner>,
    #[serde(default)]
    pub third: Option<Runner>,
}

impl Bases {
    #[must_use]
    pub const fn get(&self, base: Base) -> Option<&Runner> {
        match base {
            Base::First => self.first.as_ref(),
            Base::Second => self.second.as_ref(),
            Base::Third => self.third.as_ref(),
        }
    }

    pub const fn slot_mut(&mut self, base: Base) -> &mut Option<Runner> {
        match base {
            Base::First => &mut self.first,
            Base::Second => &mut self.second,
            Base::Third => &mut self.third,
        }
    }

    #[must_use]
    pub const fn is_occupied(&self, base: Base) -> bool {
        self.get(base).is_some()
    }

    /// Occupied bases in order from first to third.
    pub fn iter(&self) -> impl Iterator<Item = (Base, &Runner)> {
        Base::ALL
            .into_iter()
            .filter_map(|base| self.get(base).map(|runner| (base, runner)))
    }

    #[must_use]
    pub fn runner_count(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runner_count() == 0
    }

    #[must_use]
    pub fn occupancy(&self) -> BaseOccupancy {
        BaseOccupancy {
            first: self.first.is_some(),
            second: self.second.is_some(),
            third: self.third.is_some(),
        }
    }
}

/// Boolean projection of [`Bases`] used by situation-only rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BaseOccupancy {
    pub first: bool,
    pub second: bool,
    pub third: bool,
}

impl BaseOccupancy {
    pub const EMPTY: Self = Self {
        first: false,
        second: false,
        third: false,
    };

    pub const LOADED: Self = Self {
        first: true,
        second: true,
        third: true,
    };

    #[must_use]
    pub const fn is_occupied(self, base: Base) -> bool {
        match base {
            Base::First => self.first,
            Base::Second => self.second,
            Base::Third => self.third,
        }
    }

    #[must_use]
    pub const fn with(mut self, base: Base) -> Self {
        match base {
            Base::First => self.first = true,
            Base::Second => self.second = true,
            Base::Third => self.third = true,
        }
        self
    }

    #[must_use]
    pub const fn runner_count(self) -> usize {
        self.first as usize + self.second as usize + self.third as usize
    }

    #[must_use]
    pub const fn is_loaded(self) -> bool {
        self.first && self.second && self.third
    }

    #[must_use]
    pub const fn runners_in_scoring_position(self) -> bool {
        self.second || self.third
    }
}

impl From<&Bases> for BaseOccupancy {
    fn from(bases: &Bases) -> Self {
        bases.occupancy()
    }
}

/// Live game situation consulted by the save detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub inning: u32,
    pub half_inning: HalfInning,
    pub outs: u8,
    #[serde(default)]
    pub bases: BaseOccupancy,
    pub home_score: u32,
    pub away_score: u32,
    #[serde(default = "default_scheduled_innings")]
    pub scheduled_innings: u8,
}

const fn default_scheduled_innings() -> u8 {
    DEFAULT_SCHEDULED_INNINGS
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEDULED_INNINGS)
    }
}

impl GameState {
    #[must_use]
    pub const fn new(scheduled_innings: u8) -> Self {
        Self {
            inning: FIRST_INNING,
            half_inning: HalfInning::Top,
            outs: 0,
            bases: BaseOccupancy::EMPTY,
            home_score: 0,
            away_score: 0,
            scheduled_innings,
        }
    }

    #[must_use]
    pub const fn at(mut self, inning: u32, half_inning: HalfInning) -> Self {
        self.inning = inning;
        self.half_inning = half_inning;
        self
    }

    #[must_use]
    pub const fn with_outs(mut self, outs: u8) -> Self {
        self.outs = outs;
        self
    }

    #[must_use]
    pub const fn with_score(mut self, home: u32, away: u32) -> Self {
        self.home_score = home;
        self.away_score = away;
        self
    }

    #[must_use]
    pub const fn with_bases(mut self, bases: BaseOccupancy) -> Self {
        self.bases = bases;
        self
    }

    #[must_use]
    pub const fn fielding_team(&self) -> Team {
        self.half_inning.fielding_team()
    }

    #[must_use]
    pub const fn batting_team(&self) -> Team {
        self.half_inning.batting_team()
    }

    #[must_use]
    pub const fn score_for(&self, team: Team) -> u32 {
        match team {
            Team::Home => self.home_score,
            Team::Away => self.away_score,
        }
    }

    /// Signed difference of `team`'s score over its opponent's.
    #[must_use]
    pub fn run_differential(&self, team: Team) -> i32 {
        score_to_i32(self.score_for(team)) - score_to_i32(self.score_for(team.opponent()))
    }

    pub const fn add_runs(&mut self, team: Team, runs: u32) {
        match team {
            Team::Home => self.home_score = self.home_score.saturating_add(runs),
            Team::Away => self.away_score = self.away_score.saturating_add(runs),
        }
    }
}

/// Outs recorded displayed in baseball's thirds notation (`6.2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct InningsPitched(pub u32);

impl InningsPitched {
    #[must_use]
    pub const fn from_outs(outs: u32) -> Self {
        Self(outs)
    }

    #[must_use]
    pub const fn outs(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn full_innings(self) -> u32 {
        self.0 / OUTS_PER_INNING
    }

    #[must_use]
    pub const fn thirds(self) -> u32 {
        self.0 % OUTS_PER_INNING
    }
}

impl fmt::Display for InningsPitched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.full_innings(), self.thirds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fielding_team_follows_half_inning() {
        let top = GameState::default().at(3, HalfInning::Top);
        assert_eq!(top.fielding_team(), Team::Home);
        assert_eq!(top.batting_team(), Team::Away);
        let bottom = top.at(3, HalfInning::Bottom);
        assert_eq!(bottom.fielding_team(), Team::Away);
    }

    #[test]
    fn run_differential_is_signed_per_team() {
        let state = GameState::default().with_score(5, 2);
        assert_eq!(state.run_differential(Team::Home), 3);
        assert_eq!(state.run_differential(Team::Away), -3);
    }

    #[test]
    fn occupancy_counts_and_flags() {
        let occ = BaseOccupancy::EMPTY.with(Base::First).with(Base::Third);
        assert_eq!(occ.runner_count(), 2);
        assert!(occ.runners_in_scoring_position());
        assert!(!occ.is_loaded());
        assert!(BaseOccupancy::LOADED.is_loaded());
    }

    #[test]
    fn bases_iterate_in_base_order() {
        let bases = Bases {
            third: Some(Runner::new("r3", "Third", HowReached::Walk)),
            first: Some(Runner::new("r1", "First", HowReached::Hit)),
            second: None,
        };
        let order: Vec<Base> = bases.iter().map(|(base, _)| base).collect();
        assert_eq!(order, vec![Base::First, Base::Third]);
        assert_eq!(bases.occupancy(), BaseOccupancy::EMPTY.with(Base::First).with(Base::Third));
    }

    #[test]
    fn responsible_pitcher_prefers_inherited_link() {
        let current = PitcherId::new("reliever");
        let fresh = Runner::new("r1", "Runner", HowReached::Hit);
        assert_eq!(fresh.responsible_pitcher(&current), &current);
        let inherited = fresh.with_inherited_from(PitcherId::new("starter"));
        assert_eq!(inherited.responsible_pitcher(&current).as_str(), "starter");
    }

    #[test]
    fn innings_pitched_renders_thirds() {
        assert_eq!(InningsPitched::from_outs(20).to_string(), "6.2");
        assert_eq!(InningsPitched::from_outs(3).to_string(), "1.0");
        assert_eq!(InningsPitched::default().to_string(), "0.0");
    }

    #[test]
    fn wire_names_match_scorebook_vocabulary() {
        assert_eq!(serde_json::to_string(&Base::Second).unwrap(), "\"2B\"");
        assert_eq!(serde_json::to_string(&Destination::Home).unwrap(), "\"HOME\"");
        assert_eq!(serde_json::to_string(&HowReached::HitByPitch).unwrap(), "\"HBP\"");
        assert_eq!(serde_json::to_string(&HalfInning::Bottom).unwrap(), "\"BOTTOM\"");
        let runner: Runner =
            serde_json::from_str(r#"{"runner_id":"p7","runner_name":"Seven"}"#).unwrap();
        assert_eq!(runner.how_reached, HowReached::Hit);
        assert!(runner.inherited_from.is_none());
    }
}
