// Duty - a named volunteer role at a session
//
// A duty carries the minimum grade expected of its holder and two
// independent "counts-as" rules: one applied at departmental competitions,
// one at regional-or-above. The priority score decides which duty wins
// when an official is logged under several roles in one session.

use serde::{Deserialize, Serialize};

use super::{DutyId, Grade};

/// How a duty counts toward the club's required-officials quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountRule {
    /// Holding this duty never credits the club.
    NotCounted,

    /// Credits the club as long as the holder is registered.
    IfRegistered,

    /// Credits the club only when the holder is a qualified official.
    IfQualified,
}

impl CountRule {
    /// Contribution to the duty priority score.
    pub fn bonus(&self) -> i32 {
        match self {
            CountRule::NotCounted => 0,
            CountRule::IfRegistered => 1,
            CountRule::IfQualified => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CountRule::NotCounted => "none",
            CountRule::IfRegistered => "registered",
            CountRule::IfQualified => "qualified",
        }
    }

    /// Parse the catalog spelling.
    pub fn parse(text: &str) -> Option<CountRule> {
        match text.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(CountRule::NotCounted),
            "registered" => Some(CountRule::IfRegistered),
            "qualified" => Some(CountRule::IfQualified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duty {
    pub id: DutyId,
    pub name: String,

    /// Minimum grade expected of the holder. Falling short is a warning,
    /// not a rejection: the assignment stands.
    pub min_grade: Grade,

    /// Count rule at departmental competitions.
    pub departmental: CountRule,

    /// Count rule at regional-or-above competitions.
    pub regional: CountRule,

    /// Priority score: min grade weight + both count-rule bonuses.
    /// Ties between equal priorities break on the lower duty id.
    pub priority: i32,
}

impl Duty {
    pub fn new(
        id: DutyId,
        name: impl Into<String>,
        min_grade: Grade,
        departmental: CountRule,
        regional: CountRule,
    ) -> Self {
        let priority = min_grade.weight + departmental.bonus() + regional.bonus();
        Duty {
            id,
            name: name.into(),
            min_grade,
            departmental,
            regional,
            priority,
        }
    }

    /// The count rule that applies at the given competition level.
    pub fn count_rule(&self, departmental_level: bool) -> CountRule {
        if departmental_level {
            self.departmental
        } else {
            self.regional
        }
    }

    /// True when this duty outranks `other` for the same official:
    /// strictly higher priority, or equal priority and lower id.
    pub fn outranks(&self, other: &Duty) -> bool {
        self.priority > other.priority || (self.priority == other.priority && self.id < other.id)
    }
}

impl std::fmt::Display for Duty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
