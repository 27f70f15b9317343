// Participation aggregator - who actually swam, per club, per session
//
// Turns the flattened result records into deduplicated participation
// counts plus the engagement, entry-fee and forfeiture counters. The
// attributing club always comes from the result record itself, never from
// the swimmer's declared home club: that is how the feed encodes loaned
// and guest swimmers, and the money follows the result.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::catalog::ReferenceCatalog;
use crate::entities::{Competition, ParticipationUnit, Session, SwimmerId, TeamFormat};
use crate::error::Error;
use crate::parser::{ResultEntry, ResultRecord, Swimmer};

pub struct ParticipationAggregator<'a> {
    catalog: &'a ReferenceCatalog,
}

impl<'a> ParticipationAggregator<'a> {
    pub fn new(catalog: &'a ReferenceCatalog) -> Self {
        ParticipationAggregator { catalog }
    }

    /// Attribute every result record and reduce the per-session tallies.
    pub fn aggregate(
        &self,
        competition: &mut Competition,
        results: &[ResultRecord],
        swimmers: &BTreeMap<SwimmerId, Swimmer>,
    ) -> Result<(), Error> {
        if let TeamFormat::Team { size: None } = competition.team_format {
            let size = discover_team_size(competition, results)?;
            debug!(
                "competition {}: observed team size {}",
                competition.id, size
            );
            competition.set_team_size(size);
        }

        let team_format = competition.team_format.is_team();

        for result in results {
            if self.catalog.club(result.club_id).is_none() {
                warn!(
                    "competition {}: result in race {} references unknown club {}, skipped",
                    competition.id, result.race_id, result.club_id
                );
                continue;
            }

            let session = &mut competition.sessions[result.session_index];
            let club = result.club_id;

            // Forfeiture tally is independent of round and final status.
            if let Some(category) = self.catalog.forfeit_category(result.disqualification_id) {
                session.forfeits_mut(club).increment(category);
            }

            // Finals do not carry a separate entry fee.
            if !result.is_final {
                let entries = session.entries_mut(club);
                if team_format {
                    entries.team += 1;
                } else {
                    match result.entry {
                        ResultEntry::Solo { .. } => entries.individual += 1,
                        ResultEntry::Relay { .. } => entries.relay += 1,
                    }
                }
            }

            if team_format {
                self.record_team_unit(session, club, result, competition.id);
            } else {
                self.record_individual_units(session, club, result, swimmers, competition.id);
            }
        }

        let team_size = competition.team_size();
        for session in competition.sessions.iter_mut() {
            session.finalize(team_size);
        }

        Ok(())
    }

    /// Team format: the identity unit is (team number, event sex).
    fn record_team_unit(
        &self,
        session: &mut Session,
        club: u32,
        result: &ResultRecord,
        competition_id: u32,
    ) {
        let ResultEntry::Relay { team_number, .. } = &result.entry else {
            // Solo swims inside a team competition carry no team identity;
            // they were already counted as entries.
            debug!(
                "competition {}: solo result in team format (race {}), no unit",
                competition_id, result.race_id
            );
            return;
        };
        let Some(team_number) = team_number else {
            warn!(
                "competition {}: relay without team number in race {}, skipped",
                competition_id, result.race_id
            );
            return;
        };
        let Some(race) = self.catalog.race(result.race_id) else {
            warn!(
                "competition {}: race {} not in the event table, skipped",
                competition_id, result.race_id
            );
            return;
        };

        session.add_unit(club, ParticipationUnit::Team(*team_number, race.sex));
    }

    /// Individual format: one unit and one engagement per swimmer swim.
    fn record_individual_units(
        &self,
        session: &mut Session,
        club: u32,
        result: &ResultRecord,
        swimmers: &BTreeMap<SwimmerId, Swimmer>,
        competition_id: u32,
    ) {
        match &result.entry {
            ResultEntry::Solo { swimmer_id } => {
                if !swimmers.contains_key(swimmer_id) {
                    warn!(
                        "competition {}: result references unknown swimmer {}, skipped",
                        competition_id, swimmer_id
                    );
                    return;
                }
                session.add_unit(club, ParticipationUnit::Swimmer(*swimmer_id));
                session.add_engagements(club, 1);
            }
            ResultEntry::Relay { swimmer_ids, .. } => {
                for swimmer_id in swimmer_ids {
                    if !swimmers.contains_key(swimmer_id) {
                        warn!(
                            "competition {}: relay references unknown swimmer {}, skipped",
                            competition_id, swimmer_id
                        );
                        continue;
                    }
                    session.add_unit(club, ParticipationUnit::Swimmer(*swimmer_id));
                    session.add_engagements(club, 1);
                }
            }
        }
    }
}

/// The observed team size is the roster length of the first relay that was
/// not disqualified. A team-format feed with no such relay is unusable.
fn discover_team_size(
    competition: &Competition,
    results: &[ResultRecord],
) -> Result<u32, Error> {
    for result in results {
        if result.is_disqualified() {
            continue;
        }
        if let ResultEntry::Relay { swimmer_ids, .. } = &result.entry {
            if !swimmer_ids.is_empty() {
                return Ok(swimmer_ids.len() as u32);
            }
        }
    }
    Err(Error::TeamSizeUndetermined {
        competition: competition.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DisqualificationInfo, RaceInfo};
    use crate::entities::{Club, CompetitionLevel, ForfeitCategory, Grade, Sex};
    use chrono::NaiveDate;

    fn test_catalog() -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.insert_grade(Grade::new(2, "C", 1));
        catalog.insert_club(Club::new(101, "CN Antibes", "06"));
        catalog.insert_club(Club::new(102, "ON Nice", "06"));
        catalog.insert_race(
            300,
            RaceInfo {
                label: "100m freestyle".to_string(),
                stroke: "freestyle".to_string(),
                sex: Sex::Female,
            },
        );
        catalog.insert_race(
            301,
            RaceInfo {
                label: "4x50m medley".to_string(),
                stroke: "medley".to_string(),
                sex: Sex::Male,
            },
        );
        catalog.insert_disqualification(
            5,
            DisqualificationInfo {
                code: "DNS exc".to_string(),
                label: "Withdrawal with medical certificate".to_string(),
                category: Some(ForfeitCategory::MedicalCertificate),
                relay_leg: None,
            },
        );
        catalog.insert_disqualification(
            9,
            DisqualificationInfo {
                code: "DSQ".to_string(),
                label: "Stroke infringement".to_string(),
                category: None,
                relay_leg: None,
            },
        );
        catalog
    }

    fn competition(team: bool) -> Competition {
        Competition {
            id: 35303,
            name: "Meeting".to_string(),
            start_date: NaiveDate::from_ymd_opt(2015, 12, 5).unwrap(),
            stop_date: NaiveDate::from_ymd_opt(2015, 12, 5).unwrap(),
            city: "Antibes".to_string(),
            level: CompetitionLevel::Regional,
            team_format: if team {
                TeamFormat::Team { size: None }
            } else {
                TeamFormat::Individual
            },
            pool: None,
            master_id: None,
            sessions: vec![Session::new(
                1,
                NaiveDate::from_ymd_opt(2015, 12, 5)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
            )],
            clubs: vec![101, 102],
            linked: false,
        }
    }

    fn swimmers(ids: &[SwimmerId]) -> BTreeMap<SwimmerId, Swimmer> {
        ids.iter()
            .map(|id| {
                (
                    *id,
                    Swimmer {
                        id: *id,
                        club_id: 101,
                        birth_year: 2002,
                        sex: Sex::Female,
                    },
                )
            })
            .collect()
    }

    fn solo(club: u32, swimmer: SwimmerId) -> ResultRecord {
        ResultRecord {
            session_index: 0,
            race_id: 300,
            round_id: 1,
            club_id: club,
            disqualification_id: 0,
            is_final: false,
            entry: ResultEntry::Solo { swimmer_id: swimmer },
        }
    }

    fn relay(club: u32, team_number: u32, race_id: u32, members: Vec<SwimmerId>) -> ResultRecord {
        ResultRecord {
            session_index: 0,
            race_id,
            round_id: 1,
            club_id: club,
            disqualification_id: 0,
            is_final: false,
            entry: ResultEntry::Relay {
                team_number: Some(team_number),
                swimmer_ids: members,
            },
        }
    }

    #[test]
    fn test_solo_results_deduplicate_by_swimmer() {
        let catalog = test_catalog();
        let mut competition = competition(false);
        let swimmers = swimmers(&[9001, 9002]);

        // Swimmer 9001 swims three races, 9002 one.
        let results = vec![
            solo(101, 9001),
            solo(101, 9001),
            solo(101, 9001),
            solo(101, 9002),
        ];

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &results, &swimmers)
            .unwrap();

        let session = &competition.sessions[0];
        assert_eq!(session.participation_of(101), 2);
        assert_eq!(session.engagements[&101], 4);
        assert_eq!(session.entries[&101].individual, 4);
    }

    #[test]
    fn test_relay_members_count_individually_in_individual_format() {
        let catalog = test_catalog();
        let mut competition = competition(false);
        let swimmers = swimmers(&[9001, 9002, 9003, 9004]);

        let results = vec![
            solo(101, 9001),
            relay(101, 1, 301, vec![9001, 9002, 9003, 9004]),
        ];

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &results, &swimmers)
            .unwrap();

        let session = &competition.sessions[0];
        // 9001 deduplicates across their solo and the relay.
        assert_eq!(session.participation_of(101), 4);
        assert_eq!(session.engagements[&101], 5);
        assert_eq!(session.entries[&101].individual, 1);
        assert_eq!(session.entries[&101].relay, 1);
    }

    #[test]
    fn test_attribution_follows_the_result_club_not_the_swimmer() {
        let catalog = test_catalog();
        let mut competition = competition(false);
        // Swimmer 9001's declared home club is 101, but the result says 102.
        let swimmers = swimmers(&[9001]);

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &[solo(102, 9001)], &swimmers)
            .unwrap();

        let session = &competition.sessions[0];
        assert_eq!(session.participation_of(102), 1);
        assert_eq!(session.participation_of(101), 0);
    }

    #[test]
    fn test_team_units_deduplicate_by_team_and_sex() {
        let catalog = test_catalog();
        let mut competition = competition(true);
        let swimmers = swimmers(&[9001, 9002]);

        let results = vec![
            relay(101, 1, 300, vec![9001, 9002]), // women's race, team 1
            relay(101, 1, 300, vec![9001, 9002]), // same identity again
            relay(101, 1, 301, vec![9001, 9002]), // men's race, new identity
            relay(101, 2, 300, vec![9001, 9002]), // second team
        ];

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &results, &swimmers)
            .unwrap();

        assert_eq!(competition.team_size(), Some(2));
        let session = &competition.sessions[0];
        assert_eq!(session.participation_of(101), 3);
        // Engagements are distinct units scaled by the observed size.
        assert_eq!(session.engagements[&101], 6);
        assert_eq!(session.entries[&101].team, 4);
    }

    #[test]
    fn test_team_size_ignores_disqualified_relays() {
        let catalog = test_catalog();
        let mut competition = competition(true);
        let swimmers = swimmers(&[9001, 9002, 9003]);

        let mut dsq = relay(101, 1, 300, vec![9001, 9002]);
        dsq.disqualification_id = 9;
        let results = vec![dsq, relay(101, 2, 300, vec![9001, 9002, 9003])];

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &results, &swimmers)
            .unwrap();

        assert_eq!(competition.team_size(), Some(3));
    }

    #[test]
    fn test_team_size_undetermined_is_fatal() {
        let catalog = test_catalog();
        let mut competition = competition(true);
        let swimmers = swimmers(&[9001]);

        let mut dsq = relay(101, 1, 300, vec![9001]);
        dsq.disqualification_id = 9;
        let err = ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &[dsq], &swimmers)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::TeamSizeUndetermined { competition: 35303 }
        ));
    }

    #[test]
    fn test_forfeits_counted_even_on_finals() {
        let catalog = test_catalog();
        let mut competition = competition(false);
        let swimmers = swimmers(&[9001]);

        let mut result = solo(101, 9001);
        result.is_final = true;
        result.disqualification_id = 5;

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &[result], &swimmers)
            .unwrap();

        let session = &competition.sessions[0];
        assert_eq!(session.forfeits[&101].medical, 1);
        // But no entry fee for a final.
        assert!(session.entries.get(&101).is_none());
    }

    #[test]
    fn test_untracked_disqualification_is_not_a_forfeit() {
        let catalog = test_catalog();
        let mut competition = competition(false);
        let swimmers = swimmers(&[9001]);

        let mut result = solo(101, 9001);
        result.disqualification_id = 9; // DSQ, not a withdrawal

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &[result], &swimmers)
            .unwrap();

        assert!(competition.sessions[0].forfeits.get(&101).is_none());
    }

    #[test]
    fn test_unknown_club_result_is_skipped() {
        let catalog = test_catalog();
        let mut competition = competition(false);
        let swimmers = swimmers(&[9001]);

        ParticipationAggregator::new(&catalog)
            .aggregate(&mut competition, &[solo(555, 9001)], &swimmers)
            .unwrap();

        assert!(competition.sessions[0].participation.is_empty());
    }

    #[test]
    fn test_rerunning_finalize_keeps_counts() {
        let catalog = test_catalog();
        let mut competition = competition(false);
        let swimmers = swimmers(&[9001, 9002]);

        ParticipationAggregator::new(&catalog)
            .aggregate(
                &mut competition,
                &[solo(101, 9001), solo(101, 9002)],
                &swimmers,
            )
            .unwrap();

        let team_size = competition.team_size();
        let session = &mut competition.sessions[0];
        session.finalize(team_size);
        session.finalize(team_size);
        assert_eq!(session.participation_of(101), 2);
        assert_eq!(session.engagements[&101], 2);
    }
}
