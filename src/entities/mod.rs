// Domain entities for the officials scoring model

mod club;
mod competition;
mod duty;
mod grade;
mod official;
mod session;

pub use club::{Club, DutyLogEntry};
pub use competition::{Competition, CompetitionLevel, Pool, TeamFormat};
pub use duty::{CountRule, Duty};
pub use grade::Grade;
pub use official::{Official, SessionOfficial};
pub use session::{
    DutyAssignment, EntryCounters, ForfeitCategory, ForfeitCounters, ScoreEntry, Session,
};
pub(crate) use session::ParticipationUnit;

use serde::{Deserialize, Serialize};

// Feed entities carry stable numeric ids; keep them as plain aliases.
pub type ClubId = u32;
pub type GradeId = u32;
pub type DutyId = u32;
pub type OfficialId = u32;
pub type SwimmerId = u32;
pub type RaceId = u32;
pub type CompetitionId = u32;

/// Sex of an event, part of the team participation identity unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
    Mixed,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "F",
            Sex::Male => "M",
            Sex::Mixed => "X",
        }
    }

    /// Parse the single-letter code used by the feed and the race table.
    pub fn parse(code: &str) -> Option<Sex> {
        match code.trim().to_ascii_uppercase().as_str() {
            "F" | "W" => Some(Sex::Female),
            "M" => Some(Sex::Male),
            "X" | "MIXED" => Some(Sex::Mixed),
            _ => None,
        }
    }
}
