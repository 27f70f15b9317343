// Club - identity from the reference catalog plus what the batch learns
//
// Identity fields (id, name, department) come from the catalog and never
// change. The competition list and the duty log accumulate as feeds are
// processed and are what the report collaborators read back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ClubId, CompetitionId};

/// One duty actually held by an official of this club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyLogEntry {
    pub competition_id: CompetitionId,
    pub session_number: u32,
    pub duty_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    pub name: String,

    /// Department (or region) code, e.g. "06".
    pub department: String,

    /// Competitions this club took part in, in batch order.
    pub competitions: Vec<CompetitionId>,

    /// Duties held per official (keyed by full name), for the duty-history
    /// section of the report.
    pub duty_log: BTreeMap<String, Vec<DutyLogEntry>>,
}

impl Club {
    pub fn new(id: ClubId, name: impl Into<String>, department: impl Into<String>) -> Self {
        Club {
            id,
            name: name.into(),
            department: department.into(),
            competitions: Vec::new(),
            duty_log: BTreeMap::new(),
        }
    }

    /// Register participation in a competition (idempotent).
    pub fn register_competition(&mut self, competition_id: CompetitionId) {
        if !self.competitions.contains(&competition_id) {
            self.competitions.push(competition_id);
        }
    }

    /// Record that an official of this club held a duty in a session.
    pub fn log_duty(
        &mut self,
        official_name: &str,
        competition_id: CompetitionId,
        session_number: u32,
        duty_name: &str,
    ) {
        let entries = self.duty_log.entry(official_name.to_string()).or_default();
        let entry = DutyLogEntry {
            competition_id,
            session_number,
            duty_name: duty_name.to_string(),
        };
        // A re-resolved assignment for the same session replaces the old line.
        if let Some(existing) = entries
            .iter_mut()
            .find(|e| e.competition_id == competition_id && e.session_number == session_number)
        {
            *existing = entry;
        } else {
            entries.push(entry);
        }
    }
}

impl std::fmt::Display for Club {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.department)
    }
}
