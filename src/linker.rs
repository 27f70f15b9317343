// Competition linker - fold satellite feeds into their master
//
// Some meets publish two feeds for what is financially one competition
// (e.g. a second pool). The satellite carries a link to the master; its
// per-session counts are folded in by session ordinal and only the master
// is reported afterwards. A session-count mismatch would silently misalign
// every downstream total, so it aborts the whole batch.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::entities::{Club, ClubId, Competition, CompetitionId};
use crate::error::Error;

pub struct CompetitionLinker;

impl CompetitionLinker {
    pub fn new() -> Self {
        CompetitionLinker
    }

    /// Fold every satellite into its master. Satellites stay in the map,
    /// flagged `linked`, so their raw data remains auditable.
    pub fn link(
        &self,
        competitions: &mut BTreeMap<CompetitionId, Competition>,
        clubs: &mut BTreeMap<ClubId, Club>,
    ) -> Result<(), Error> {
        let pairs: Vec<(CompetitionId, CompetitionId)> = competitions
            .values()
            .filter_map(|c| c.master_id.map(|master| (c.id, master)))
            .collect();

        for (satellite_id, master_id) in pairs {
            if satellite_id == master_id {
                warn!(
                    "competition {} links to itself, link ignored",
                    satellite_id
                );
                continue;
            }
            if !competitions.contains_key(&master_id) {
                warn!(
                    "competition {} links to {} which is not in this batch, reported standalone",
                    satellite_id, master_id
                );
                continue;
            }

            let satellite_sessions = competitions[&satellite_id].sessions.len();
            let master_sessions = competitions[&master_id].sessions.len();
            if satellite_sessions != master_sessions {
                return Err(Error::LinkMismatch {
                    satellite: satellite_id,
                    master: master_id,
                    satellite_sessions,
                    master_sessions,
                });
            }

            let mut satellite = match competitions.remove(&satellite_id) {
                Some(competition) => competition,
                None => continue,
            };
            if let Some(master) = competitions.get_mut(&master_id) {
                debug!(
                    "folding competition {} into {} ({} sessions)",
                    satellite_id, master_id, master_sessions
                );
                merge_sessions(&satellite, master);

                for club_id in &satellite.clubs {
                    master.register_club(*club_id);
                    if let Some(club) = clubs.get_mut(club_id) {
                        club.register_competition(master_id);
                    }
                }
                satellite.linked = true;
            }
            competitions.insert(satellite_id, satellite);
        }

        Ok(())
    }
}

impl Default for CompetitionLinker {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum the satellite's per-club counters into the master, session by
/// session ordinal. Officials merge additively: an id already on record in
/// the master session stays as first registered.
fn merge_sessions(satellite: &Competition, master: &mut Competition) {
    for (index, sat_session) in satellite.sessions.iter().enumerate() {
        let master_session = &mut master.sessions[index];

        for (club, count) in &sat_session.participation {
            *master_session.participation.entry(*club).or_insert(0) += count;
        }
        for (club, count) in &sat_session.engagements {
            *master_session.engagements.entry(*club).or_insert(0) += count;
        }
        for (club, entries) in &sat_session.entries {
            let target = master_session.entries.entry(*club).or_default();
            target.individual += entries.individual;
            target.relay += entries.relay;
            target.team += entries.team;
        }
        for (club, forfeits) in &sat_session.forfeits {
            let target = master_session.forfeits.entry(*club).or_default();
            target.medical += forfeits.medical;
            target.declared += forfeits.declared;
            target.undeclared += forfeits.undeclared;
        }

        for (official_id, official) in &sat_session.officials {
            master_session
                .officials
                .entry(*official_id)
                .or_insert_with(|| official.clone());
        }
    }
}
