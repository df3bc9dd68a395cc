// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-format structs matching the external CLI's raw JSON shapes (spec
//! §6.1), and their conversion into the domain model.

use std::collections::BTreeSet;

use rigwatch_model::agent::{Agent, AgentRole};
use rigwatch_model::bead::{Bead, BeadStatus, StatusPoint};
use rigwatch_model::mail::Mail;
use serde::Deserialize;

/// Raw `polecat list`/`polecat status` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPolecat {
    pub rig: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    pub session_running: bool,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub hook_bead: Option<String>,
}

impl RawPolecat {
    pub fn into_agent(self) -> Agent {
        let role = parse_role(self.role.as_deref());
        Agent::new(self.rig, self.name, role, self.session_running, self.state.unwrap_or_default(), self.hook_bead)
    }
}

fn parse_role(raw: Option<&str>) -> AgentRole {
    match raw {
        Some("mayor") => AgentRole::Mayor,
        Some("witness") => AgentRole::Witness,
        Some("refinery") => AgentRole::Refinery,
        Some("crew") => AgentRole::Crew,
        _ => AgentRole::Polecat,
    }
}

/// Raw `bd show` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBead {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default, alias = "dependsOn")]
    pub depends_on: BTreeSet<String>,
    #[serde(default)]
    pub created_at: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<u64>,
}

impl RawBead {
    pub fn into_bead(self, observed_at: u64) -> Bead {
        let status = BeadStatus::from_raw(&self.status);
        let created_at = self.created_at.unwrap_or(observed_at);
        let updated_at = self.updated_at.unwrap_or(observed_at);
        let closed_at = if status.is_terminal() { Some(updated_at) } else { None };
        Bead {
            id: self.id,
            title: self.title.or(self.description).unwrap_or_default(),
            status: status.clone(),
            priority: self.priority.unwrap_or_else(|| "unset".to_owned()),
            owner: self.owner,
            assignee: self.assignee,
            depends_on: self.depends_on,
            created_at,
            updated_at,
            closed_at,
            status_history: vec![StatusPoint { status, at: updated_at }],
        }
    }
}

/// Raw `mail recent` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMail {
    pub rig: String,
    pub from: String,
    pub to: String,
    pub timestamp: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub path: String,
}

impl From<RawMail> for Mail {
    fn from(m: RawMail) -> Self {
        Mail {
            rig: m.rig,
            from: m.from,
            to: m.to,
            timestamp: m.timestamp,
            subject: m.subject,
            preview: m.preview,
            content: m.content,
            path: m.path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_polecat_defaults_unknown_role_to_polecat() {
        let raw = RawPolecat {
            rig: "r1".into(),
            name: "p1".into(),
            role: None,
            session_running: true,
            state: Some("ready".into()),
            hook_bead: None,
        };
        let agent = raw.into_agent();
        assert_eq!(agent.role, AgentRole::Polecat);
    }

    #[test]
    fn raw_bead_falls_back_to_description_for_title() {
        let raw = RawBead {
            id: "B-1".into(),
            title: None,
            description: Some("fix the thing".into()),
            status: "open".into(),
            priority: None,
            owner: None,
            assignee: None,
            depends_on: BTreeSet::new(),
            created_at: None,
            updated_at: None,
        };
        let bead = raw.into_bead(1000);
        assert_eq!(bead.title, "fix the thing");
        assert_eq!(bead.priority, "unset");
        assert_eq!(bead.created_at, 1000);
    }
}
