use anyhow::{Context, Result};
use chrono::Utc;
use std::{fs, path::Path};

use crate::logic::GameLog;
use crate::logic::recorder::GameLedger;

pub fn artifacts_dir(base: &str, scenario: &str, game_id: &str) -> String {
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    format!("{base}/{scenario}/{game_id}/{ts}")
}

/// Dump a game log, its ledger and any error chain for later inspection.
pub fn write_artifact_files(
    dir: &Path,
    log: &GameLog,
    ledger: Option<&GameLedger>,
    error_chain: Option<&str>,
) -> Result<()> {
    fs::create_dir_all(dir).context("creating artifacts dir")?;

    let payload = serde_json::to_vec_pretty(log).context("serializing game log")?;
    fs::write(dir.join("game-log.json"), payload).context("writing game log")?;

    if let Some(ledger) = ledger {
        let payload = serde_json::to_vec_pretty(ledger).unwrap_or_default();
        let _ = fs::write(dir.join("ledger.json"), payload);
    }

    if let Some(chain) = error_chain {
        let _ = fs::write(dir.join("error.txt"), chain);
    }

    Ok(())
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::recorder::PitcherRef;
    use scorebook_engine::RulesConfig;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn artifacts_dir_includes_key_segments() {
        let dir = artifacts_dir("target/out", "replay", "g-1");
        assert!(dir.contains("target/out/replay/g-1/"));
    }

    #[test]
    fn write_artifact_files_writes_expected_payloads() {
        let base = std::env::temp_dir().join(format!(
            "scorebook-artifacts-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let log = GameLog::new(
            "artifact-game",
            PitcherRef::new("h", "Home"),
            PitcherRef::new("a", "Away"),
        );
        let ledger = crate::logic::synthetic::generate_game(3, &RulesConfig::default())
            .unwrap()
            .replay(&RulesConfig::default())
            .unwrap();
        write_artifact_files(&base, &log, Some(&ledger), Some("boom")).expect("write artifacts");

        assert!(base.join("game-log.json").exists());
        assert!(base.join("ledger.json").exists());
        assert!(base.join("error.txt").exists());
    }
}
