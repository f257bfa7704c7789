//! Dropped third strike: legality, outcome records and per-player totals.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::constants::D3K_OPEN_OUTS;
use crate::game::{Base, BaseOccupancy, HalfInning, PitcherId, PlayerId};
use crate::numbers::rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum D3kOutcome {
    #[serde(rename = "D3K_REACHED")]
    Reached,
    #[serde(rename = "D3K_THROWN_OUT")]
    ThrownOut,
    #[serde(rename = "D3K_ILLEGAL")]
    Illegal,
    #[serde(rename = "D3K_ERROR")]
    Error,
    #[serde(rename = "D3K_WILD_THROW")]
    WildThrow,
}

impl D3kOutcome {
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Reached => "🏃",
            Self::ThrownOut => "🎯",
            Self::Illegal => "🚫",
            Self::Error => "❌",
            Self::WildThrow => "💨",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reached => "Batter Reaches 1B",
            Self::ThrownOut => "Thrown Out at 1B",
            Self::Illegal => "Batter Out (D3K not legal)",
            Self::Error => "Error on Throw",
            Self::WildThrow => "Wild Throw (Extra Base)",
        }
    }

    #[must_use]
    pub const fn default_batter_result(self) -> BatterResult {
        match self {
            Self::Reached | Self::Error => BatterResult::First,
            Self::WildThrow => BatterResult::Second,
            Self::ThrownOut | Self::Illegal => BatterResult::Out,
        }
    }

    /// The batter ends the play on base.
    #[must_use]
    pub const fn batter_reaches(self) -> bool {
        matches!(self, Self::Reached | Self::Error | Self::WildThrow)
    }
}

impl fmt::Display for D3kOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reached => "D3K_REACHED",
            Self::ThrownOut => "D3K_THROWN_OUT",
            Self::Illegal => "D3K_ILLEGAL",
            Self::Error => "D3K_ERROR",
            Self::WildThrow => "D3K_WILD_THROW",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatterResult {
    First,
    Second,
    Third,
    Out,
}

impl BatterResult {
    #[must_use]
    pub const fn base(self) -> Option<Base> {
        match self {
            Self::First => Some(Base::First),
            Self::Second => Some(Base::Second),
            Self::Third => Some(Base::Third),
            Self::Out => None,
        }
    }
}

impl fmt::Display for BatterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Third => "third",
            Self::Out => "out",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrikeoutType {
    #[default]
    Swinging,
    Looking,
}

impl StrikeoutType {
    /// Scorebook mark; a backwards K for a called third strike.
    #[must_use]
    pub const fn mark(self) -> &'static str {
        match self {
            Self::Swinging => "K",
            Self::Looking => "ꓘ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    Throwing,
    Fielding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub fielder_id: PlayerId,
    pub fielder_name: String,
    pub error_type: ErrorType,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum D3kError {
    #[error("{outcome} is not an option when the batter may run")]
    OutcomeNotOffered { outcome: D3kOutcome },
    #[error("batter result {result} contradicts {outcome}")]
    InconsistentBatterResult {
        outcome: D3kOutcome,
        result: BatterResult,
    },
}

/// Whether the batter may try for first on a dropped third strike.
#[must_use]
pub const fn is_d3k_legal(outs: u8, first_base_occupied: bool) -> bool {
    !first_base_occupied || outs >= D3K_OPEN_OUTS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalityReason {
    FirstBaseEmpty,
    TwoOuts,
    FirstBaseOccupied,
}

impl fmt::Display for LegalityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FirstBaseEmpty => "First base empty - D3K legal",
            Self::TwoOuts => "2 outs - D3K legal (force play possible)",
            Self::FirstBaseOccupied => {
                "First base occupied with less than 2 outs - D3K NOT legal"
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct D3kLegality {
    pub is_legal: bool,
    pub reason: LegalityReason,
}

#[must_use]
pub const fn check_d3k_legality(outs: u8, first_base_occupied: bool) -> D3kLegality {
    let reason = if !first_base_occupied {
        LegalityReason::FirstBaseEmpty
    } else if outs >= D3K_OPEN_OUTS {
        LegalityReason::TwoOuts
    } else {
        LegalityReason::FirstBaseOccupied
    };
    D3kLegality {
        is_legal: is_d3k_legal(outs, first_base_occupied),
        reason,
    }
}

/// The pitch that ended the at-bat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PitchContext {
    pub strike_three: bool,
    pub caught_cleanly: bool,
}

/// Only an uncaught third strike opens the dropped-third-strike flow.
#[must_use]
pub const fn should_trigger_d3k_flow(pitch: PitchContext) -> bool {
    pitch.strike_three && !pitch.caught_cleanly
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct D3kOption {
    pub value: D3kOutcome,
    pub label: &'static str,
    pub icon: &'static str,
}

impl D3kOption {
    const fn of(value: D3kOutcome) -> Self {
        Self {
            value,
            label: value.label(),
            icon: value.icon(),
        }
    }
}

const ILLEGAL_OPTIONS: [D3kOption; 1] = [D3kOption::of(D3kOutcome::Illegal)];
const LEGAL_OPTIONS: [D3kOption; 4] = [
    D3kOption::of(D3kOutcome::Reached),
    D3kOption::of(D3kOutcome::ThrownOut),
    D3kOption::of(D3kOutcome::Error),
    D3kOption::of(D3kOutcome::WildThrow),
];

/// Outcomes a scorer may pick from.
#[must_use]
pub fn get_d3k_options(legal: bool) -> &'static [D3kOption] {
    if legal { &LEGAL_OPTIONS } else { &ILLEGAL_OPTIONS }
}

/// Situation and participants at the moment of the dropped third strike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D3kContext {
    pub batter_id: PlayerId,
    pub batter_name: String,
    pub catcher_id: PlayerId,
    pub catcher_name: String,
    pub pitcher_id: PitcherId,
    pub pitcher_name: String,
    pub inning: u32,
    pub half_inning: HalfInning,
    pub outs: u8,
    pub bases: BaseOccupancy,
    #[serde(default)]
    pub strikeout_type: StrikeoutType,
}

impl D3kContext {
    #[must_use]
    pub const fn legality(&self) -> D3kLegality {
        check_d3k_legality(self.outs, self.bases.first)
    }
}

/// Optional play detail supplied by the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct D3kDetails {
    #[serde(default)]
    pub batter_result: Option<BatterResult>,
    #[serde(default)]
    pub throw_sequence: Vec<String>,
    #[serde(default)]
    pub error_info: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D3kEvent {
    pub outcome: D3kOutcome,
    pub is_legal: bool,
    pub batter_id: PlayerId,
    pub batter_name: String,
    pub catcher_id: PlayerId,
    pub catcher_name: String,
    pub pitcher_id: PitcherId,
    pub pitcher_name: String,
    /// The strikeout always goes in the pitcher's line.
    pub pitcher_strikeout: bool,
    pub batter_result: BatterResult,
    pub strikeout_type: StrikeoutType,
    pub inning: u32,
    pub half_inning: HalfInning,
    pub outs: u8,
    pub bases_before: BaseOccupancy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throw_sequence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<ErrorInfo>,
}

/// Build the record for a dropped third strike.
///
/// When the batter may not run the outcome is forced to
/// [`D3kOutcome::Illegal`] and the batter is out, whatever was chosen.
///
/// # Errors
///
/// [`D3kError::OutcomeNotOffered`] for `Illegal` in a legal situation and
/// [`D3kError::InconsistentBatterResult`] when the result contradicts it.
pub fn create_d3k_event(
    outcome: D3kOutcome,
    context: &D3kContext,
    details: D3kDetails,
) -> Result<D3kEvent, D3kError> {
    let legality = context.legality();
    let (outcome, batter_result) = if legality.is_legal {
        if outcome == D3kOutcome::Illegal {
            return Err(D3kError::OutcomeNotOffered { outcome });
        }
        let result = details
            .batter_result
            .unwrap_or_else(|| outcome.default_batter_result());
        if outcome.batter_reaches() == (result == BatterResult::Out) {
            return Err(D3kError::InconsistentBatterResult { outcome, result });
        }
        (outcome, result)
    } else {
        if outcome != D3kOutcome::Illegal {
            log::debug!(
                "{outcome} chosen for {} but {}; recording D3K_ILLEGAL",
                context.batter_id,
                legality.reason
            );
        }
        (D3kOutcome::Illegal, BatterResult::Out)
    };

    Ok(D3kEvent {
        outcome,
        is_legal: legality.is_legal,
        batter_id: context.batter_id.clone(),
        batter_name: context.batter_name.clone(),
        catcher_id: context.catcher_id.clone(),
        catcher_name: context.catcher_name.clone(),
        pitcher_id: context.pitcher_id.clone(),
        pitcher_name: context.pitcher_name.clone(),
        pitcher_strikeout: true,
        batter_result,
        strikeout_type: context.strikeout_type,
        inning: context.inning,
        half_inning: context.half_inning,
        outs: context.outs,
        bases_before: context.bases,
        throw_sequence: details.throw_sequence,
        error_info: details.error_info,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatterD3kStats {
    pub attempts: u32,
    pub reached: u32,
    pub thrown_out: u32,
    pub illegal: u32,
    pub errors: u32,
    pub wild_throws: u32,
}

impl BatterD3kStats {
    pub const fn record(&mut self, event: &D3kEvent) {
        self.attempts += 1;
        match event.outcome {
            D3kOutcome::Reached => self.reached += 1,
            D3kOutcome::ThrownOut => self.thrown_out += 1,
            D3kOutcome::Illegal => self.illegal += 1,
            D3kOutcome::Error => {
                self.errors += 1;
                self.reached += 1;
            }
            D3kOutcome::WildThrow => {
                self.wild_throws += 1;
                self.reached += 1;
            }
        }
    }

    pub const fn merge(&mut self, other: &Self) {
        self.attempts += other.attempts;
        self.reached += other.reached;
        self.thrown_out += other.thrown_out;
        self.illegal += other.illegal;
        self.errors += other.errors;
        self.wild_throws += other.wild_throws;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CatcherD3kStats {
    pub dropped_third_strikes: u32,
    pub throwouts: u32,
    pub failed_throws: u32,
    pub errors: u32,
}

impl CatcherD3kStats {
    /// Illegal drops are not attempts and are skipped.
    pub fn record(&mut self, event: &D3kEvent) {
        match event.outcome {
            D3kOutcome::Illegal => return,
            D3kOutcome::ThrownOut => self.throwouts += 1,
            D3kOutcome::Reached | D3kOutcome::WildThrow => self.failed_throws += 1,
            D3kOutcome::Error => {
                if event
                    .error_info
                    .as_ref()
                    .is_some_and(|info| info.fielder_id == event.catcher_id)
                {
                    self.errors += 1;
                }
                self.failed_throws += 1;
            }
        }
        self.dropped_third_strikes += 1;
    }

    pub const fn merge(&mut self, other: &Self) {
        self.dropped_third_strikes += other.dropped_third_strikes;
        self.throwouts += other.throwouts;
        self.failed_throws += other.failed_throws;
        self.errors += other.errors;
    }

    #[must_use]
    pub fn throwout_rate(&self) -> f64 {
        rate(self.throwouts, self.dropped_third_strikes)
    }
}

#[must_use]
pub fn aggregate_batter_d3k_stats<'a, I>(events: I) -> BTreeMap<PlayerId, BatterD3kStats>
where
    I: IntoIterator<Item = &'a D3kEvent>,
{
    let mut totals: BTreeMap<PlayerId, BatterD3kStats> = BTreeMap::new();
    for event in events {
        totals
            .entry(event.batter_id.clone())
            .or_default()
            .record(event);
    }
    totals
}

#[must_use]
pub fn aggregate_catcher_d3k_stats<'a, I>(events: I) -> BTreeMap<PlayerId, CatcherD3kStats>
where
    I: IntoIterator<Item = &'a D3kEvent>,
{
    let mut totals: BTreeMap<PlayerId, CatcherD3kStats> = BTreeMap::new();
    for event in events {
        if event.outcome == D3kOutcome::Illegal {
            continue;
        }
        totals
            .entry(event.catcher_id.clone())
            .or_default()
            .record(event);
    }
    totals
}

/// Batter and catcher totals over a set of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct D3kTotals {
    pub batters: BTreeMap<PlayerId, BatterD3kStats>,
    pub catchers: BTreeMap<PlayerId, CatcherD3kStats>,
}

impl D3kTotals {
    #[must_use]
    pub fn from_events(events: &[D3kEvent]) -> Self {
        Self {
            batters: aggregate_batter_d3k_stats(events),
            catchers: aggregate_catcher_d3k_stats(events),
        }
    }

    pub fn merge(&mut self, other: &Self) {
        for (id, stats) in &other.batters {
            self.batters.entry(id.clone()).or_default().merge(stats);
        }
        for (id, stats) in &other.catchers {
            self.catchers.entry(id.clone()).or_default().merge(stats);
        }
    }
}

#[must_use]
pub fn d3k_display_message(event: &D3kEvent) -> String {
    let mark = event.strikeout_type.mark();
    let name = &event.batter_name;
    match event.outcome {
        D3kOutcome::Reached => format!("{mark} - {name} reaches on dropped third strike"),
        D3kOutcome::ThrownOut => {
            format!("{mark} - {name} thrown out at 1B on dropped third strike")
        }
        D3kOutcome::Illegal => format!("{mark} - {name} out (D3K not legal)"),
        D3kOutcome::Error => format!("{mark} - {name} reaches on error (dropped third strike)"),
        D3kOutcome::WildThrow => format!(
            "{mark} - {name} reaches {} on wild throw (dropped third strike)",
            event.batter_result
        ),
    }
}
