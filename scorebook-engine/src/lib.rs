//! Scorebook Attribution Engine
//!
//! Platform-agnostic rules for live baseball scoring: earned-run
//! responsibility, save/hold/blown-save classification and dropped third
//! strikes. The caller owns all state and submits events in game order.

pub mod config;
pub mod constants;
pub mod d3k;
pub mod game;
pub mod numbers;
pub mod responsibility;
pub mod saves;
pub mod season;
pub mod substitution;

use anyhow::Context;

// Re-export commonly used types
pub use config::{RulesConfig, RulesConfigError};
pub use d3k::{
    BatterD3kStats, BatterResult, CatcherD3kStats, D3kContext, D3kDetails, D3kError, D3kEvent,
    D3kLegality, D3kOption, D3kOutcome, D3kTotals, ErrorInfo, ErrorType, LegalityReason,
    PitchContext, StrikeoutType, aggregate_batter_d3k_stats, aggregate_catcher_d3k_stats,
    check_d3k_legality, create_d3k_event, d3k_display_message, get_d3k_options, is_d3k_legal,
    should_trigger_d3k_flow,
};
pub use game::{
    Base, BaseOccupancy, Bases, Destination, GameState, HalfInning, HowReached, InningsPitched,
    PitcherId, PlayerId, Runner, Team,
};
pub use responsibility::{
    AdvanceOutcome, AllEarned, ErSummary, ErSummaryLine, PitcherRunLine, ReachedOnMisplay,
    RunClassifier, RunKind, RunScored, RunnerTrackingState, TrackerError, TrackerEvent,
    TrackerOutcome, create_runner_tracking_state,
};
pub use saves::{
    AppearanceEvent, AppearanceExit, PitcherAppearance, SaveClassification, SaveDetectionResult,
    SaveOpportunity, SaveResult, calculate_lead, create_pitcher_appearance, detect_blown_save,
    detect_hold, detect_save, finalize_pitcher_appearance, is_save_opportunity,
    is_save_opportunity_bool, update_pitcher_appearance,
};
pub use season::{GameTotals, PitcherSeasonLine, SeasonTotals};
pub use substitution::{
    AlignmentIssue, BequeathedRunner, BequeathedRunners, DefensiveSwap, EventHeader, LineupPlayer,
    PinchHit, PinchRun, PitcherLine, PitcherRole, PitchingChange, Position, PositionMove,
    PositionSwap, SubstitutionEvent, build_bequeathed_runners, validate_defensive_alignment,
};

/// Source of the rule interpretation in force for a league.
/// Platform-specific implementations should provide this
pub trait RulesLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the rules configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be loaded or parsed.
    fn load_rules(&self) -> Result<RulesConfig, Self::Error>;
}

/// Built-in official rules, for callers without a league override.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfficialRules;

impl RulesLoader for OfficialRules {
    type Error = std::convert::Infallible;

    fn load_rules(&self) -> Result<RulesConfig, Self::Error> {
        Ok(RulesConfig::default())
    }
}

/// Trait for abstracting season persistence
/// Platform-specific implementations should provide this
pub trait SeasonStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save season totals
    ///
    /// # Errors
    ///
    /// Returns an error if the totals cannot be saved.
    fn save_totals(&self, season_id: &str, totals: &SeasonTotals) -> Result<(), Self::Error>;

    /// Load season totals
    ///
    /// # Errors
    ///
    /// Returns an error if the totals cannot be loaded.
    fn load_totals(&self, season_id: &str) -> Result<Option<SeasonTotals>, Self::Error>;
}

/// Binds a rules source to a season store
pub struct Scorebook<L, S>
where
    L: RulesLoader,
    S: SeasonStore,
{
    rules_loader: L,
    store: S,
}

impl<L, S> Scorebook<L, S>
where
    L: RulesLoader,
    S: SeasonStore,
{
    pub const fn new(rules_loader: L, store: S) -> Self {
        Self {
            rules_loader,
            store,
        }
    }

    /// Load and validate the rules in force
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be loaded or are inconsistent.
    pub fn rules(&self) -> Result<RulesConfig, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let rules = self.rules_loader.load_rules().map_err(Into::<anyhow::Error>::into)?;
        rules.validate().context("invalid rules configuration")?;
        Ok(rules)
    }

    /// Load season totals
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn season(&self, season_id: &str) -> Result<Option<SeasonTotals>, S::Error> {
        self.store.load_totals(season_id)
    }

    /// Merge one finished game into its season and persist the result
    ///
    /// # Errors
    ///
    /// Returns an error if the season cannot be loaded or saved.
    pub fn commit_game(
        &self,
        season_id: &str,
        game: &GameTotals,
    ) -> Result<SeasonTotals, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let mut totals = self
            .store
            .load_totals(season_id)
            .map_err(Into::<anyhow::Error>::into)?
            .unwrap_or_else(|| SeasonTotals::new(season_id));
        if totals.record_game(game) {
            self.store
                .save_totals(season_id, &totals)
                .map_err(Into::<anyhow::Error>::into)
                .with_context(|| format!("saving season {season_id}"))?;
        }
        Ok(totals)
    }
}
