// Competition - one results feed document after parsing
//
// Immutable header data plus the session list. The only post-parse
// mutations are the resolver/aggregator filling the sessions and the
// linker folding a satellite into its master.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ClubId, CompetitionId, Session};

/// Level category resolved from the feed's competition type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionLevel {
    Departmental,
    Regional,
    National,
}

impl CompetitionLevel {
    pub fn is_departmental(&self) -> bool {
        matches!(self, CompetitionLevel::Departmental)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionLevel::Departmental => "departmental",
            CompetitionLevel::Regional => "regional",
            CompetitionLevel::National => "national",
        }
    }

    pub fn parse(text: &str) -> Option<CompetitionLevel> {
        match text.trim().to_ascii_lowercase().as_str() {
            "departmental" => Some(CompetitionLevel::Departmental),
            "regional" => Some(CompetitionLevel::Regional),
            "national" => Some(CompetitionLevel::National),
            _ => None,
        }
    }
}

/// Team-size indicator from the feed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamFormat {
    /// Ordinary individual-event competition.
    Individual,

    /// Team competition. `size: None` until the aggregator observes the
    /// first complete relay roster.
    Team { size: Option<u32> },
}

impl TeamFormat {
    pub fn is_team(&self) -> bool {
        matches!(self, TeamFormat::Team { .. })
    }
}

/// Pool geometry from the feed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub lanes: u32,
    pub length_m: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    pub start_date: NaiveDate,
    pub stop_date: NaiveDate,
    pub city: String,
    pub level: CompetitionLevel,
    pub team_format: TeamFormat,
    pub pool: Option<Pool>,

    /// Forward link to a master competition, when this feed is a satellite.
    pub master_id: Option<CompetitionId>,

    pub sessions: Vec<Session>,

    /// Clubs fielding officials or swimmers in this competition.
    pub clubs: Vec<ClubId>,

    /// Set once the linker folded this competition into its master;
    /// linked competitions are excluded from direct reporting.
    pub linked: bool,
}

impl Competition {
    pub fn team_size(&self) -> Option<u32> {
        match self.team_format {
            TeamFormat::Individual => None,
            TeamFormat::Team { size } => size,
        }
    }

    pub fn set_team_size(&mut self, size: u32) {
        self.team_format = TeamFormat::Team { size: Some(size) };
    }

    pub fn register_club(&mut self, club: ClubId) {
        if !self.clubs.contains(&club) {
            self.clubs.push(club);
        }
    }

    /// Date range for display: single date or "start - stop".
    pub fn date_str(&self) -> String {
        if self.start_date == self.stop_date {
            self.start_date.format("%d/%m/%Y").to_string()
        } else {
            format!(
                "{} - {}",
                self.start_date.format("%d/%m/%Y"),
                self.stop_date.format("%d/%m/%Y")
            )
        }
    }
}

impl std::fmt::Display for Competition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) - {} - {} - {}",
            self.name,
            self.id,
            self.date_str(),
            self.city,
            self.level.as_str()
        )
    }
}
