//! Season accumulation of per-game attribution results.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::d3k::{D3kEvent, D3kTotals};
use crate::game::{InningsPitched, PitcherId};
use crate::numbers::per_nine;
use crate::responsibility::ErSummary;
use crate::saves::{PitcherAppearance, SaveClassification};

/// Everything one finished game contributes to a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTotals {
    pub game_id: String,
    pub er_summary: ErSummary,
    pub appearances: Vec<PitcherAppearance>,
    pub d3k: D3kTotals,
}

impl GameTotals {
    #[must_use]
    pub fn new(
        game_id: &str,
        er_summary: ErSummary,
        appearances: Vec<PitcherAppearance>,
        d3k_events: &[D3kEvent],
    ) -> Self {
        Self {
            game_id: game_id.to_string(),
            er_summary,
            appearances,
            d3k: D3kTotals::from_events(d3k_events),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PitcherSeasonLine {
    pub appearances: u32,
    pub outs_recorded: u32,
    pub save_opportunities: u32,
    pub saves: u32,
    pub holds: u32,
    pub blown_saves: u32,
    pub blown_save_losses: u32,
    pub earned_runs: u32,
    pub unearned_runs: u32,
}

impl PitcherSeasonLine {
    #[must_use]
    pub const fn innings_pitched(&self) -> InningsPitched {
        InningsPitched::from_outs(self.outs_recorded)
    }

    #[must_use]
    pub fn era(&self) -> f64 {
        per_nine(self.earned_runs, self.outs_recorded)
    }

    fn record_appearance(&mut self, appearance: &PitcherAppearance) {
        self.appearances += 1;
        self.outs_recorded += appearance.outs_recorded;
        if appearance.had_save_opportunity() {
            self.save_opportunities += 1;
        }
        match appearance.classification {
            SaveClassification::Save => self.saves += 1,
            SaveClassification::Hold => self.holds += 1,
            SaveClassification::BlownSave => {
                self.blown_saves += 1;
                if appearance.blown_save_loss {
                    self.blown_save_losses += 1;
                }
            }
            SaveClassification::None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeasonTotals {
    pub season_id: String,
    pub pitchers: BTreeMap<PitcherId, PitcherSeasonLine>,
    pub d3k: D3kTotals,
    #[serde(default)]
    pub games: BTreeSet<String>,
}

impl SeasonTotals {
    #[must_use]
    pub fn new(season_id: &str) -> Self {
        Self {
            season_id: season_id.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn games_played(&self) -> usize {
        self.games.len()
    }

    /// Fold a game in. A game id already recorded is skipped and `false`
    /// is returned, so replaying a game never double counts it.
    pub fn record_game(&mut self, game: &GameTotals) -> bool {
        if !self.games.insert(game.game_id.clone()) {
            log::warn!(
                "game {} already recorded for season {}",
                game.game_id,
                self.season_id
            );
            return false;
        }
        for appearance in &game.appearances {
            self.pitchers
                .entry(appearance.pitcher_id.clone())
                .or_default()
                .record_appearance(appearance);
        }
        for line in &game.er_summary.lines {
            let season = self.pitchers.entry(line.pitcher_id.clone()).or_default();
            season.earned_runs += line.earned_runs;
            season.unearned_runs += line.unearned_runs;
        }
        self.d3k.merge(&game.d3k);
        true
    }

    #[must_use]
    pub fn pitcher(&self, pitcher: &PitcherId) -> Option<&PitcherSeasonLine> {
        self.pitchers.get(pitcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::game::{GameState, HalfInning, Team};
    use crate::saves::{AppearanceEvent, AppearanceExit};

    fn closer_game(game_id: &str) -> GameTotals {
        let game = GameState::default()
            .at(9, HalfInning::Top)
            .with_score(4, 2);
        let mut appearance = PitcherAppearance::create(
            &PitcherId::new("closer"),
            "Closer",
            Team::Home,
            &game,
            &RulesConfig::default(),
        );
        appearance.update(AppearanceEvent::OutsRecorded(3), &game);
        appearance.finalize(
            &game,
            AppearanceExit {
                finished_game: true,
                is_winning_pitcher: false,
                game_over: true,
            },
        );
        GameTotals::new(game_id, ErSummary::default(), vec![appearance], &[])
    }

    #[test]
    fn saves_accumulate_across_games() {
        let mut season = SeasonTotals::new("2026");
        assert!(season.record_game(&closer_game("g1")));
        assert!(season.record_game(&closer_game("g2")));
        let line = season.pitcher(&PitcherId::new("closer")).unwrap();
        assert_eq!(line.saves, 2);
        assert_eq!(line.save_opportunities, 2);
        assert_eq!(line.innings_pitched().to_string(), "2.0");
        assert!(line.era().abs() < f64::EPSILON);
        assert_eq!(season.games_played(), 2);
    }

    #[test]
    fn replaying_a_game_is_ignored() {
        let mut season = SeasonTotals::new("2026");
        let game = closer_game("g1");
        assert!(season.record_game(&game));
        let snapshot = season.clone();
        assert!(!season.record_game(&game));
        assert_eq!(season, snapshot);
    }
}
