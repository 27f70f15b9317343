// Official - roster record and its session-scoped projection
//
// The roster `Official` is built once per feed from the officials section
// and is never mutated afterwards. Everything session-specific (trainee
// grade upgrade, the resolved duty, validity flags) lives on a
// `SessionOfficial` copy, so no state bleeds between sessions.

use serde::{Deserialize, Serialize};

use super::{ClubId, Duty, Grade, OfficialId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Official {
    pub id: OfficialId,
    pub last_name: String,
    pub first_name: String,
    pub club_id: ClubId,
    pub grade: Grade,
}

impl Official {
    pub fn new(
        id: OfficialId,
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        club_id: ClubId,
        grade: Grade,
    ) -> Self {
        Official {
            id,
            last_name: last_name.into(),
            first_name: first_name.into(),
            club_id,
            grade,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

impl std::fmt::Display for Official {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.first_name, self.last_name, self.grade)
    }
}

/// Session-scoped copy of an official, carrying the effective grade and the
/// duty finally credited for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOfficial {
    pub official_id: OfficialId,
    pub last_name: String,
    pub first_name: String,
    pub club_id: ClubId,

    /// Effective grade for this session (may be trainee-upgraded).
    pub grade: Grade,

    /// Grade meets the catalog's qualified-official threshold.
    pub qualified: bool,

    /// Grade meets the catalog's senior ("B") threshold.
    pub senior: bool,

    /// Duty credited for this session, at most one.
    pub duty: Option<Duty>,

    /// Whether the duty counts at a departmental competition.
    pub valid_departmental: bool,

    /// Whether the duty counts at a regional-or-above competition.
    pub valid_regional: bool,
}

impl SessionOfficial {
    /// Copy the roster record into a session, evaluating the grade against
    /// the catalog thresholds.
    pub fn new(official: &Official, qualified_weight: i32, senior_weight: i32) -> Self {
        SessionOfficial {
            official_id: official.id,
            last_name: official.last_name.clone(),
            first_name: official.first_name.clone(),
            club_id: official.club_id,
            grade: official.grade.clone(),
            qualified: official.grade.weight >= qualified_weight,
            senior: official.grade.weight >= senior_weight,
            duty: None,
            valid_departmental: false,
            valid_regional: false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    /// Trainee upgrade: replace the effective grade for this session only.
    /// The holder becomes a qualified official by definition of the track.
    pub fn upgrade_grade(&mut self, grade: Grade, senior_weight: i32) {
        self.senior = grade.weight >= senior_weight;
        self.grade = grade;
        self.qualified = true;
    }

    /// Fix the duty and derive the per-classification validity flags.
    pub fn set_duty(&mut self, duty: Duty) {
        use super::CountRule::*;

        self.valid_departmental = match duty.departmental {
            NotCounted => false,
            IfRegistered => true,
            IfQualified => self.qualified,
        };
        self.valid_regional = match duty.regional {
            NotCounted => false,
            IfRegistered => true,
            IfQualified => self.qualified,
        };
        self.duty = Some(duty);
    }

    /// Validity for the given competition level.
    pub fn valid_for(&self, departmental_level: bool) -> bool {
        if departmental_level {
            self.valid_departmental
        } else {
            self.valid_regional
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CountRule;

    fn roster_official(weight: i32) -> Official {
        Official::new(
            500,
            "MARTIN",
            "Sophie",
            101,
            Grade::new(1, "G", weight),
        )
    }

    #[test]
    fn test_thresholds_evaluated_on_copy() {
        let so = SessionOfficial::new(&roster_official(2), 1, 2);
        assert!(so.qualified);
        assert!(so.senior);

        let so = SessionOfficial::new(&roster_official(0), 1, 2);
        assert!(!so.qualified);
        assert!(!so.senior);
    }

    #[test]
    fn test_upgrade_marks_qualified() {
        let mut so = SessionOfficial::new(&roster_official(0), 1, 2);
        so.upgrade_grade(Grade::new(2, "B", 2), 2);
        assert!(so.qualified);
        assert!(so.senior);
        assert_eq!(so.grade.name, "B");
    }

    #[test]
    fn test_validity_follows_count_rule_and_qualification() {
        let duty = Duty::new(
            4,
            "Timekeeper",
            Grade::new(1, "C", 1),
            CountRule::IfQualified,
            CountRule::IfRegistered,
        );

        let mut unqualified = SessionOfficial::new(&roster_official(0), 1, 2);
        unqualified.set_duty(duty.clone());
        assert!(!unqualified.valid_departmental);
        assert!(unqualified.valid_regional);

        let mut qualified = SessionOfficial::new(&roster_official(1), 1, 2);
        qualified.set_duty(duty);
        assert!(qualified.valid_departmental);
        assert!(qualified.valid_regional);
    }
}
