// Session - a timed block of races, the unit the point rule is applied to
//
// The parser creates sessions with their raw duty assignments; the
// resolver fills the officials map; the aggregator feeds the identity
// sets and counters; the scoring engine memoizes its result per club.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{ClubId, DutyId, OfficialId, SessionOfficial, Sex, SwimmerId};

/// Raw duty assignment as read from the feed's judge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyAssignment {
    pub official_id: OfficialId,
    pub duty_id: DutyId,
}

/// Deduplication identity for one participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub(crate) enum ParticipationUnit {
    /// Individual format: one swimmer, however many races they swim.
    Swimmer(SwimmerId),

    /// Team format: one team unit per (team number, event sex).
    Team(u32, Sex),
}

/// Tracked forfeiture categories from the disqualification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForfeitCategory {
    /// Withdrawal covered by a medical certificate.
    MedicalCertificate,

    /// Withdrawal declared before the race.
    DeclaredWithdrawal,

    /// No-show without declaration.
    UndeclaredWithdrawal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForfeitCounters {
    pub medical: u32,
    pub declared: u32,
    pub undeclared: u32,
}

impl ForfeitCounters {
    pub fn increment(&mut self, category: ForfeitCategory) {
        match category {
            ForfeitCategory::MedicalCertificate => self.medical += 1,
            ForfeitCategory::DeclaredWithdrawal => self.declared += 1,
            ForfeitCategory::UndeclaredWithdrawal => self.undeclared += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.medical + self.declared + self.undeclared
    }
}

/// Entry-fee counters. Final rounds do not carry a separate fee and are
/// excluded by the aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCounters {
    pub individual: u32,
    pub relay: u32,
    pub team: u32,
}

impl EntryCounters {
    pub fn total(&self) -> u32 {
        self.individual + self.relay + self.team
    }
}

/// Two-field score cache: either half can be present independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: Option<i32>,
    pub rationale: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Ordinal number from the feed (1-based).
    pub number: u32,

    /// Session start; gates the trainee grade upgrade.
    pub start: NaiveDateTime,

    /// Raw judge list, consumed by the assignment resolver.
    pub assignments: Vec<DutyAssignment>,

    /// Resolved officials, one per official id.
    pub officials: BTreeMap<OfficialId, SessionOfficial>,

    /// Deduplicated participation identities per club.
    #[serde(skip)]
    pub(crate) units: BTreeMap<ClubId, BTreeSet<ParticipationUnit>>,

    /// Distinct participation count per club (after finalize).
    pub participation: BTreeMap<ClubId, u32>,

    /// Engagement count per club: raw entries, team-size-scaled for
    /// team-format competitions.
    pub engagements: BTreeMap<ClubId, u32>,

    /// Entry-fee counters per club.
    pub entries: BTreeMap<ClubId, EntryCounters>,

    /// Forfeiture counters per club.
    pub forfeits: BTreeMap<ClubId, ForfeitCounters>,

    /// Memoized score per club.
    #[serde(skip)]
    pub(crate) scores: BTreeMap<ClubId, ScoreEntry>,

    /// Set once the raw tallies have been reduced to cardinalities.
    pub finalized: bool,
}

impl Session {
    pub fn new(number: u32, start: NaiveDateTime) -> Self {
        Session {
            number,
            start,
            assignments: Vec::new(),
            officials: BTreeMap::new(),
            units: BTreeMap::new(),
            participation: BTreeMap::new(),
            engagements: BTreeMap::new(),
            entries: BTreeMap::new(),
            forfeits: BTreeMap::new(),
            scores: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Record one participation identity. Returns true when the unit was
    /// not seen before for this club.
    pub(crate) fn add_unit(&mut self, club: ClubId, unit: ParticipationUnit) -> bool {
        self.units.entry(club).or_default().insert(unit)
    }

    pub fn add_engagements(&mut self, club: ClubId, count: u32) {
        *self.engagements.entry(club).or_insert(0) += count;
    }

    pub fn entries_mut(&mut self, club: ClubId) -> &mut EntryCounters {
        self.entries.entry(club).or_default()
    }

    pub fn forfeits_mut(&mut self, club: ClubId) -> &mut ForfeitCounters {
        self.forfeits.entry(club).or_default()
    }

    /// Reduce the identity sets to cardinalities. Recomputes from the sets,
    /// so running it again yields the same counts.
    pub fn finalize(&mut self, team_size: Option<u32>) {
        for (club, set) in &self.units {
            let distinct = set.len() as u32;
            self.participation.insert(*club, distinct);
            if let Some(size) = team_size {
                // Team format: engagements are the distinct units scaled.
                self.engagements.insert(*club, distinct * size);
            }
        }
        self.finalized = true;
    }

    /// Resolved officials grouped by club, in official-id order.
    pub fn officials_per_club(&self) -> BTreeMap<ClubId, Vec<&SessionOfficial>> {
        let mut per_club: BTreeMap<ClubId, Vec<&SessionOfficial>> = BTreeMap::new();
        for official in self.officials.values() {
            per_club.entry(official.club_id).or_default().push(official);
        }
        per_club
    }

    pub fn participation_of(&self, club: ClubId) -> u32 {
        self.participation.get(&club).copied().unwrap_or(0)
    }
}
