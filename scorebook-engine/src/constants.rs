//! Centralized rule constants for Scorebook attribution logic.
//!
//! These values encode the official scoring rules the engines apply.
//! Keeping them together ensures that rule interpretations can only be
//! adjusted via code changes reviewed in version control; the tunable subset
//! is surfaced through [`crate::config::RulesConfig`].

// Game shape ---------------------------------------------------------------
pub const OUTS_PER_INNING: u32 = 3;
pub const DEFAULT_SCHEDULED_INNINGS: u8 = 9;
pub(crate) const FIRST_INNING: u32 = 1;
pub(crate) const FIRST_AT_BAT: u32 = 1;

// Save rule ----------------------------------------------------------------
/// Largest lead (inclusive) that qualifies under the "three runs or less" clause.
pub const MAX_SAVE_LEAD: i32 = 3;
/// Runners on base plus the batter and the on-deck hitter.
pub(crate) const TYING_RUN_REACH_BEYOND_BASES: i32 = 2;
/// Innings before the end of regulation where relief becomes save-eligible.
pub const LATE_INNING_WINDOW: u8 = 2;
/// Outs required for the "three runs or less" clause (one full inning).
pub const SAVE_MIN_OUTS: u32 = 3;
pub const HOLD_MIN_OUTS: u32 = 1;
/// Three full innings; effectiveness is still the scorer's call.
pub const LONG_RELIEF_MIN_OUTS: u32 = 9;

// Dropped third strike -----------------------------------------------------
/// With this many outs the batter may run even when first base is occupied.
pub const D3K_OPEN_OUTS: u8 = 2;
