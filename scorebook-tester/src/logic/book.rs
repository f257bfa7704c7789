use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;
use thiserror::Error;

use scorebook_engine::{
    RulesConfig, RulesConfigError, RulesLoader, Scorebook, SeasonStore, SeasonTotals,
};

/// Where the tester takes its rules from.
#[derive(Debug, Clone, Default)]
pub enum RulesSource {
    #[default]
    Official,
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum RulesSourceError {
    #[error("failed to read rules file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rules file {}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: RulesConfigError,
    },
}

impl RulesSource {
    #[must_use]
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Official, Self::File)
    }
}

impl RulesLoader for RulesSource {
    type Error = RulesSourceError;

    fn load_rules(&self) -> Result<RulesConfig, Self::Error> {
        match self {
            Self::Official => Ok(RulesConfig::default()),
            Self::File(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| RulesSourceError::Io {
                    path: path.clone(),
                    source,
                })?;
                RulesConfig::from_json(&raw).map_err(|source| RulesSourceError::Invalid {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// Season totals kept for the lifetime of one tester run.
#[derive(Debug, Default)]
pub struct MemorySeasonStore {
    seasons: RefCell<HashMap<String, SeasonTotals>>,
}

impl SeasonStore for MemorySeasonStore {
    type Error = Infallible;

    fn save_totals(&self, season_id: &str, totals: &SeasonTotals) -> Result<(), Self::Error> {
        self.seasons
            .borrow_mut()
            .insert(season_id.to_string(), totals.clone());
        Ok(())
    }

    fn load_totals(&self, season_id: &str) -> Result<Option<SeasonTotals>, Self::Error> {
        Ok(self.seasons.borrow().get(season_id).cloned())
    }
}

pub type SeasonBook = Scorebook<RulesSource, MemorySeasonStore>;

#[must_use]
pub fn season_book(rules: Option<PathBuf>) -> SeasonBook {
    Scorebook::new(RulesSource::from_arg(rules), MemorySeasonStore::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::scenario::get_scenario;
    use crate::logic::simulation::run_plan;

    fn temp_rules(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("scorebook-rules-{name}.json"));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn official_rules_are_the_defaults() {
        let book = season_book(None);
        assert_eq!(book.rules().unwrap(), RulesConfig::default());
    }

    #[test]
    fn rules_file_overrides_fields() {
        let path = temp_rules("seven", r#"{ "scheduled_innings": 7 }"#);
        let rules = season_book(Some(path)).rules().unwrap();
        assert_eq!(rules.scheduled_innings, 7);
        assert_eq!(rules.max_save_lead, RulesConfig::default().max_save_lead);
    }

    #[test]
    fn missing_and_invalid_files_are_reported() {
        let missing = std::env::temp_dir().join("scorebook-rules-does-not-exist.json");
        let err = season_book(Some(missing)).rules().unwrap_err();
        assert!(format!("{err:#}").contains("failed to read rules file"));

        let path = temp_rules("invalid", r#"{ "max_save_lead": 0 }"#);
        let err = season_book(Some(path)).rules().unwrap_err();
        assert!(format!("{err:#}").contains("max_save_lead"));
    }

    #[test]
    fn committing_the_same_game_twice_counts_once() {
        let book = season_book(None);
        let scenario = get_scenario("closer-save").unwrap();
        let ledger = run_plan(&scenario.plan, 1, &RulesConfig::default())
            .unwrap()
            .ledger;
        book.commit_game("2026", &ledger.totals()).unwrap();
        let season = book.commit_game("2026", &ledger.totals()).unwrap();
        assert_eq!(season.games_played(), 1);
        assert_eq!(book.season("2026").unwrap().unwrap(), season);
    }
}
