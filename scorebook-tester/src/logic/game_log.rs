use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use scorebook_engine::RulesConfig;

use super::recorder::{GameLedger, GameRecorder, PitcherRef, PlayEvent, RecorderError};

/// A replayable play-by-play record of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLog {
    pub game_id: String,
    pub home_starter: PitcherRef,
    pub away_starter: PitcherRef,
    #[serde(default)]
    pub events: Vec<PlayEvent>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReplayError {
    #[error("event {index} ({kind}) rejected: {source}")]
    Rejected {
        index: usize,
        kind: &'static str,
        #[source]
        source: RecorderError,
    },
    #[error(transparent)]
    Incomplete(#[from] RecorderError),
}

impl GameLog {
    #[must_use]
    pub fn new(game_id: &str, home_starter: PitcherRef, away_starter: PitcherRef) -> Self {
        Self {
            game_id: game_id.to_string(),
            home_starter,
            away_starter,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: impl IntoIterator<Item = PlayEvent>) -> Self {
        self.events.extend(events);
        self
    }

    /// Read a game log from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a game log.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read game log {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse game log {}", path.display()))
    }

    #[must_use]
    pub fn recorder(&self, rules: RulesConfig) -> GameRecorder {
        GameRecorder::new(
            &self.game_id,
            rules,
            self.home_starter.clone(),
            self.away_starter.clone(),
        )
    }

    /// Feed every event through a fresh recorder.
    ///
    /// # Errors
    ///
    /// Returns the first rejected event, or [`ReplayError::Incomplete`] when
    /// the log never reaches `GameOver`.
    pub fn replay(&self, rules: &RulesConfig) -> Result<GameLedger, ReplayError> {
        let mut recorder = self.recorder(*rules);
        for (index, event) in self.events.iter().enumerate() {
            let kind = event.kind();
            recorder
                .record(event.clone())
                .map_err(|source| ReplayError::Rejected {
                    index,
                    kind,
                    source,
                })?;
        }
        Ok(recorder.finish()?)
    }
}
