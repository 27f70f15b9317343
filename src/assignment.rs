// Assignment resolver - one credited duty per official per session
//
// Walks each session's raw judge list and produces the resolved
// SessionOfficial map. The roster record is copied into the session before
// anything touches it, so trainee upgrades and duty choices never bleed
// into other sessions or into the roster itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::catalog::ReferenceCatalog;
use crate::entities::{Club, ClubId, Competition, DutyId, Official, OfficialId, SessionOfficial};

/// Judge lines the resolver could not credit. Surfaced to the caller
/// instead of silently inventing roster entries for unknown ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// (session number, official id) pairs with no roster entry.
    pub unknown_officials: Vec<(u32, OfficialId)>,

    /// (session number, duty id) pairs missing from the duty table.
    pub unknown_duties: Vec<(u32, DutyId)>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_officials.is_empty() && self.unknown_duties.is_empty()
    }
}

pub struct AssignmentResolver<'a> {
    catalog: &'a ReferenceCatalog,
}

impl<'a> AssignmentResolver<'a> {
    pub fn new(catalog: &'a ReferenceCatalog) -> Self {
        AssignmentResolver { catalog }
    }

    /// Resolve every session of the competition. `officials` is the feed
    /// roster; `clubs` receives the duty-history lines.
    pub fn resolve(
        &self,
        competition: &mut Competition,
        officials: &BTreeMap<OfficialId, Official>,
        clubs: &mut BTreeMap<ClubId, Club>,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        let competition_id = competition.id;

        for session in competition.sessions.iter_mut() {
            let assignments = session.assignments.clone();
            let session_number = session.number;
            let session_start = session.start;

            for assignment in assignments {
                let Some(official) = officials.get(&assignment.official_id) else {
                    warn!(
                        "competition {} session {}: judge references unknown official {}, skipped",
                        competition_id, session_number, assignment.official_id
                    );
                    report
                        .unknown_officials
                        .push((session_number, assignment.official_id));
                    continue;
                };
                let Some(duty) = self.catalog.duty(assignment.duty_id) else {
                    warn!(
                        "competition {} session {}: official {}: duty {} not found, skipped",
                        competition_id,
                        session_number,
                        official.full_name(),
                        assignment.duty_id
                    );
                    report
                        .unknown_duties
                        .push((session_number, assignment.duty_id));
                    continue;
                };

                let entry = session
                    .officials
                    .entry(official.id)
                    .or_insert_with(|| {
                        let mut copy = SessionOfficial::new(
                            official,
                            self.catalog.qualified_weight,
                            self.catalog.senior_weight,
                        );
                        self.apply_trainee_upgrade(&mut copy, session_start);
                        copy
                    });

                // Keep the higher-priority duty; equal priority keeps the
                // lower duty id, whatever order the feed listed them in.
                let accept = match &entry.duty {
                    None => true,
                    Some(held) => duty.outranks(held),
                };
                if !accept {
                    continue;
                }

                if entry.grade.weight < duty.min_grade.weight {
                    warn!(
                        "official {} ({}) holds duty {} rated {} with grade {}",
                        entry.full_name(),
                        entry.club_id,
                        duty.name,
                        duty.min_grade.name,
                        entry.grade.name
                    );
                }

                entry.set_duty(duty.clone());

                if let Some(club) = clubs.get_mut(&official.club_id) {
                    club.log_duty(
                        &official.full_name(),
                        competition_id,
                        session_number,
                        &duty.name,
                    );
                }
            }
        }

        report
    }

    /// Trainee track: an official below the qualified threshold with a
    /// registration dated before the session start is credited at the
    /// target tier for this session only.
    fn apply_trainee_upgrade(
        &self,
        copy: &mut SessionOfficial,
        session_start: chrono::NaiveDateTime,
    ) {
        if copy.qualified {
            return;
        }
        let Some(record) = self.catalog.trainee(copy.official_id) else {
            return;
        };
        let effective = record.since.and_hms_opt(0, 0, 0).unwrap();
        if effective >= session_start {
            return;
        }
        let Some(grade) = self.catalog.grade(record.target_grade) else {
            warn!(
                "trainee record for official {} names unknown grade {}, ignored",
                copy.official_id, record.target_grade
            );
            return;
        };
        debug!(
            "official {} credited as trainee {} from {}",
            copy.full_name(),
            grade.name,
            record.since
        );
        copy.upgrade_grade(grade.clone(), self.catalog.senior_weight);
    }
}
