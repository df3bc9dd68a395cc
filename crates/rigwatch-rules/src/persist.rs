// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-through persistence for rules and alerts: JSON blob, atomic
//! write-tmp-then-rename (spec §4.6, §A.5).

use std::path::Path;

use rigwatch_model::alert::Alert;
use rigwatch_model::error::Error;
use rigwatch_model::rule::Rule;
use serde::{de::DeserializeOwned, Serialize};

fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T, Error> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|e| Error::Internal(format!("malformed {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(Error::Internal(format!("reading {}: {e}", path.display()))),
    }
}

fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::Internal(e.to_string()))?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json).map_err(|e| Error::Internal(format!("writing {}: {e}", tmp_path.display())))?;
    std::fs::rename(&tmp_path, path).map_err(|e| Error::Internal(format!("renaming into {}: {e}", path.display())))
}

pub fn load_rules(path: &Path) -> Result<Vec<Rule>, Error> {
    load(path)
}

pub fn save_rules(path: &Path, rules: &[Rule]) -> Result<(), Error> {
    save(path, &rules)
}

pub fn load_alerts(path: &Path) -> Result<Vec<Alert>, Error> {
    load(path)
}

pub fn save_alerts(path: &Path, alerts: &[Alert]) -> Result<(), Error> {
    save(path, &alerts)
}

#[cfg(test)]
mod tests {
    use rigwatch_model::rule::{Action, Condition, Severity};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn round_trips_rules_through_atomic_write() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        let rules = vec![Rule {
            id: "r1".into(),
            name: "stopped".into(),
            description: None,
            enabled: true,
            cooldown_ms: 60_000,
            condition: Condition::AgentStatus { agent: "*".into(), rig: "*".into(), from: None, to: None },
            actions: vec![Action::Toast],
            severity: Severity::Warning,
            last_fired_at: None,
        }];
        save_rules(&path, &rules).expect("save should succeed");
        assert!(!dir.path().join("rules.tmp").exists());
        let loaded = load_rules(&path).expect("load should succeed");
        assert_eq!(loaded, rules);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        let loaded = load_rules(&path).expect("missing file should load as empty");
        assert!(loaded.is_empty());
    }
}
