//! Substitution events recorded by the game tracker and the lineup checks
//! that accompany them.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::game::{Base, Bases, HalfInning, HowReached, PitcherId, PlayerId};

/// At most one runner per base, so the payload never spills to the heap.
pub type BequeathedRunners = SmallVec<[BequeathedRunner; 3]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    P,
    C,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "3B")]
    ThirdBase,
    SS,
    LF,
    CF,
    RF,
    DH,
    SP,
    RP,
    CL,
}

impl Position {
    /// Fielding positions that must each be covered exactly once.
    pub const DEFENSIVE: [Self; 9] = [
        Self::P,
        Self::C,
        Self::FirstBase,
        Self::SecondBase,
        Self::ThirdBase,
        Self::SS,
        Self::LF,
        Self::CF,
        Self::RF,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P => "P",
            Self::C => "C",
            Self::FirstBase => "1B",
            Self::SecondBase => "2B",
            Self::ThirdBase => "3B",
            Self::SS => "SS",
            Self::LF => "LF",
            Self::CF => "CF",
            Self::RF => "RF",
            Self::DH => "DH",
            Self::SP => "SP",
            Self::RP => "RP",
            Self::CL => "CL",
        }
    }

    /// The field slot this position occupies; pitcher roles all map to `P`.
    #[must_use]
    pub const fn defensive_slot(self) -> Option<Self> {
        match self {
            Self::DH => None,
            Self::SP | Self::RP | Self::CL => Some(Self::P),
            other => Some(other),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PitcherRole {
    SP,
    #[default]
    RP,
    CL,
}

/// Fields common to every substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    pub game_id: String,
    pub inning: u32,
    pub half_inning: HalfInning,
    pub outs: u8,
    #[serde(default)]
    pub timestamp: u64,
}

/// Runner left on base by an outgoing pitcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BequeathedRunner {
    pub base: Base,
    pub runner_id: PlayerId,
    pub runner_name: String,
    pub how_reached: HowReached,
}

/// Snapshot the runners on base, first to third, ahead of a pitching change.
#[must_use]
pub fn build_bequeathed_runners(bases: &Bases) -> BequeathedRunners {
    bases
        .iter()
        .map(|(base, runner)| BequeathedRunner {
            base,
            runner_id: runner.runner_id.clone(),
            runner_name: runner.runner_name.clone(),
            how_reached: runner.how_reached,
        })
        .collect()
}

/// Outgoing pitcher's line, stored with outs rather than innings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PitcherLine {
    pub outs: u32,
    pub hits: u32,
    pub runs: u32,
    pub earned_runs: u32,
    pub walks: u32,
    pub strikeouts: u32,
    #[serde(default)]
    pub home_runs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchingChange {
    pub outgoing_pitcher_id: PitcherId,
    pub outgoing_pitcher_name: String,
    #[serde(default)]
    pub outgoing_pitch_count: u32,
    #[serde(default)]
    pub outgoing_line: Option<PitcherLine>,
    #[serde(default)]
    pub bequeathed_runners: BequeathedRunners,
    pub incoming_pitcher_id: PitcherId,
    pub incoming_pitcher_name: String,
    #[serde(default)]
    pub incoming_pitcher_role: PitcherRole,
    #[serde(default)]
    pub inherited_runners: u32,
}

impl PitchingChange {
    /// Build a change with the bequeathed payload taken from `bases`.
    #[must_use]
    pub fn new(
        outgoing: (&PitcherId, &str),
        incoming: (&PitcherId, &str),
        bases: &Bases,
    ) -> Self {
        let bequeathed_runners = build_bequeathed_runners(bases);
        let inherited_runners = crate::numbers::len_to_u32(bequeathed_runners.len());
        Self {
            outgoing_pitcher_id: outgoing.0.clone(),
            outgoing_pitcher_name: outgoing.1.to_string(),
            outgoing_pitch_count: 0,
            outgoing_line: None,
            bequeathed_runners,
            incoming_pitcher_id: incoming.0.clone(),
            incoming_pitcher_name: incoming.1.to_string(),
            incoming_pitcher_role: PitcherRole::RP,
            inherited_runners,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinchHit {
    pub replaced_player_id: PlayerId,
    pub replaced_player_name: String,
    pub replaced_batting_order: u8,
    pub pinch_hitter_id: PlayerId,
    pub pinch_hitter_name: String,
    pub fielding_position: Position,
    #[serde(default)]
    pub pitcher_facing: Option<PitcherId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinchRun {
    pub replaced_player_id: PlayerId,
    pub replaced_player_name: String,
    pub replaced_batting_order: u8,
    pub base: Base,
    pub pinch_runner_id: PlayerId,
    pub pinch_runner_name: String,
    pub fielding_position: Position,
    /// Informational; the tracker copies liability from the replaced runner.
    #[serde(default)]
    pub pitcher_responsible: Option<PitcherId>,
    #[serde(default)]
    pub how_original_reached: HowReached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefensiveSwap {
    pub player_out_id: PlayerId,
    pub player_out_name: String,
    pub player_in_id: PlayerId,
    pub player_in_name: String,
    pub position: Position,
    pub batting_order: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSwap {
    pub player_out_id: PlayerId,
    pub player_out_position: Position,
    pub player_out_batting_order: u8,
    pub player_in_id: PlayerId,
    pub player_in_position: Position,
    pub player_in_batting_order: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMove {
    pub player_id: PlayerId,
    pub player_name: String,
    pub from_position: Position,
    pub to_position: Position,
}

/// Every kind of substitution the recorder can submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum SubstitutionEvent {
    #[serde(rename = "PITCH_CHANGE")]
    PitchingChange {
        header: EventHeader,
        change: PitchingChange,
    },
    #[serde(rename = "PINCH_HIT")]
    PinchHit {
        header: EventHeader,
        change: PinchHit,
    },
    #[serde(rename = "PINCH_RUN")]
    PinchRun {
        header: EventHeader,
        change: PinchRun,
    },
    #[serde(rename = "DEF_SUB")]
    DefensiveSub {
        header: EventHeader,
        substitutions: Vec<DefensiveSwap>,
    },
    #[serde(rename = "DOUBLE_SWITCH")]
    DoubleSwitch {
        header: EventHeader,
        pitching_change: PitchingChange,
        position_swap: PositionSwap,
        new_pitcher_batting_order: u8,
        new_position_player_batting_order: u8,
    },
    #[serde(rename = "POS_SWITCH")]
    PositionSwitch {
        header: EventHeader,
        switches: Vec<PositionMove>,
    },
}

impl SubstitutionEvent {
    #[must_use]
    pub const fn header(&self) -> &EventHeader {
        match self {
            Self::PitchingChange { header, .. }
            | Self::PinchHit { header, .. }
            | Self::PinchRun { header, .. }
            | Self::DefensiveSub { header, .. }
            | Self::DoubleSwitch { header, .. }
            | Self::PositionSwitch { header, .. } => header,
        }
    }

    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::PitchingChange { .. } => "PITCH_CHANGE",
            Self::PinchHit { .. } => "PINCH_HIT",
            Self::PinchRun { .. } => "PINCH_RUN",
            Self::DefensiveSub { .. } => "DEF_SUB",
            Self::DoubleSwitch { .. } => "DOUBLE_SWITCH",
            Self::PositionSwitch { .. } => "POS_SWITCH",
        }
    }

    /// The pitcher swap carried by this event, if any.
    #[must_use]
    pub const fn pitching_change(&self) -> Option<&PitchingChange> {
        match self {
            Self::PitchingChange { change, .. } => Some(change),
            Self::DoubleSwitch {
                pitching_change, ..
            } => Some(pitching_change),
            Self::PinchHit { .. }
            | Self::PinchRun { .. }
            | Self::DefensiveSub { .. }
            | Self::PositionSwitch { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupPlayer {
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: Position,
    pub batting_order: u8,
    #[serde(default)]
    pub entered_inning: u32,
    #[serde(default)]
    pub entered_for: Option<PlayerId>,
    #[serde(default)]
    pub is_starter: bool,
}

/// Problems found in a defensive alignment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlignmentIssue {
    #[error("duplicate position {position} ({first} and {second})")]
    DuplicatePosition {
        position: Position,
        first: String,
        second: String,
    },
    #[error("missing position {position}")]
    MissingPosition { position: Position },
    #[error("DH not allowed in this game")]
    DhNotAllowed,
}

/// Check that every fielding slot is covered exactly once.
///
/// # Errors
///
/// Returns every issue found, in lineup order followed by missing slots.
pub fn validate_defensive_alignment(
    lineup: &[LineupPlayer],
    has_dh: bool,
) -> Result<(), Vec<AlignmentIssue>> {
    let mut issues = Vec::new();
    let mut covered: BTreeMap<Position, &str> = BTreeMap::new();

    for player in lineup {
        let Some(slot) = player.position.defensive_slot() else {
            if !has_dh {
                issues.push(AlignmentIssue::DhNotAllowed);
            }
            continue;
        };
        if let Some(first) = covered.get(&slot) {
            issues.push(AlignmentIssue::DuplicatePosition {
                position: slot,
                first: (*first).to_string(),
                second: player.player_name.clone(),
            });
        } else {
            covered.insert(slot, &player.player_name);
        }
    }

    for position in Position::DEFENSIVE {
        if !covered.contains_key(&position) {
            issues.push(AlignmentIssue::MissingPosition { position });
        }
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Runner;

    fn player(id: &str, position: Position, order: u8) -> LineupPlayer {
        LineupPlayer {
            player_id: PlayerId::new(id),
            player_name: id.to_uppercase(),
            position,
            batting_order: order,
            entered_inning: 1,
            entered_for: None,
            is_starter: true,
        }
    }

    fn full_lineup() -> Vec<LineupPlayer> {
        Position::DEFENSIVE
            .iter()
            .zip(1u8..)
            .map(|(position, order)| player(&format!("p{order}"), *position, order))
            .collect()
    }

    fn header() -> EventHeader {
        EventHeader {
            game_id: "g1".to_string(),
            inning: 6,
            half_inning: HalfInning::Top,
            outs: 1,
            timestamp: 0,
        }
    }

    #[test]
    fn bequeathed_runners_follow_base_order() {
        let bases = Bases {
            first: None,
            second: Some(Runner::new("b", "Bee", HowReached::Walk)),
            third: Some(Runner::new("c", "Cee", HowReached::Error)),
        };
        let payload = build_bequeathed_runners(&bases);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].base, Base::Second);
        assert_eq!(payload[1].how_reached, HowReached::Error);
        assert!(!payload.spilled());
    }

    #[test]
    fn pitching_change_counts_inherited_runners() {
        let bases = Bases {
            first: Some(Runner::new("a", "Ay", HowReached::Hit)),
            ..Bases::default()
        };
        let change = PitchingChange::new(
            (&PitcherId::new("sp"), "Starter"),
            (&PitcherId::new("rp"), "Reliever"),
            &bases,
        );
        assert_eq!(change.inherited_runners, 1);
        assert_eq!(change.bequeathed_runners[0].runner_id.as_str(), "a");
    }

    #[test]
    fn double_switch_exposes_its_pitching_change() {
        let change = PitchingChange::new(
            (&PitcherId::new("sp"), "Starter"),
            (&PitcherId::new("rp"), "Reliever"),
            &Bases::default(),
        );
        let event = SubstitutionEvent::DoubleSwitch {
            header: header(),
            pitching_change: change.clone(),
            position_swap: PositionSwap {
                player_out_id: PlayerId::new("lf1"),
                player_out_position: Position::LF,
                player_out_batting_order: 9,
                player_in_id: PlayerId::new("lf2"),
                player_in_position: Position::LF,
                player_in_batting_order: 1,
            },
            new_pitcher_batting_order: 1,
            new_position_player_batting_order: 9,
        };
        assert_eq!(event.event_type(), "DOUBLE_SWITCH");
        assert_eq!(event.pitching_change(), Some(&change));
        assert_eq!(event.header().inning, 6);
    }

    #[test]
    fn substitution_json_is_tagged() {
        let event = SubstitutionEvent::PositionSwitch {
            header: header(),
            switches: vec![PositionMove {
                player_id: PlayerId::new("x"),
                player_name: "Ex".to_string(),
                from_position: Position::SS,
                to_position: Position::SecondBase,
            }],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "POS_SWITCH");
        assert_eq!(value["switches"][0]["to_position"], "2B");
        let back: SubstitutionEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn complete_alignment_validates() {
        assert_eq!(validate_defensive_alignment(&full_lineup(), false), Ok(()));
    }

    #[test]
    fn alignment_reports_duplicates_missing_and_dh() {
        let mut lineup = full_lineup();
        lineup[8].position = Position::CF;
        lineup.push(player("dh", Position::DH, 10));
        let issues = validate_defensive_alignment(&lineup, false).unwrap_err();
        assert!(issues.contains(&AlignmentIssue::DhNotAllowed));
        assert!(issues.contains(&AlignmentIssue::MissingPosition {
            position: Position::RF
        }));
        assert!(issues.iter().any(|issue| matches!(
            issue,
            AlignmentIssue::DuplicatePosition {
                position: Position::CF,
                ..
            }
        )));
    }

    #[test]
    fn relief_roles_cover_the_mound() {
        let mut lineup = full_lineup();
        lineup[0].position = Position::CL;
        assert_eq!(validate_defensive_alignment(&lineup, true), Ok(()));
    }
}
