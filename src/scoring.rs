// Scoring engine - the required-officials rule and the point formula
//
// points() is deterministic given the session's aggregated state and is
// memoized per (session, club) in a two-field cache: the score and the
// rationale trail are stored independently, so asking for the trail after
// a scoreless-rationale hit recomputes only the missing half and can never
// change the cached score.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entities::{ClubId, Competition, Session, SessionOfficial};

/// Result of one points() call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScore {
    pub points: i32,

    /// Present only when the caller asked for the trail.
    pub rationale: Option<Vec<String>>,
}

/// Required officials for one club in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Needed {
    min_qualified: u32,
    total: u32,
}

pub struct ScoringEngine {
    /// Divisor of the departmental formula (participations per required
    /// official). Historical rule snapshots disagree between 8 and 10 for
    /// some team formats, so it is a tunable rather than a constant.
    pub departmental_divisor: u32,

    /// Cap on counted officials at regional-or-above competitions.
    pub regional_cap: usize,
}

impl ScoringEngine {
    pub fn new() -> Self {
        ScoringEngine {
            departmental_divisor: 8,
            regional_cap: 5,
        }
    }

    pub fn with_divisor(departmental_divisor: u32) -> Self {
        ScoringEngine {
            departmental_divisor,
            regional_cap: 5,
        }
    }

    /// Point delta for the club in the given session, memoized.
    pub fn points(
        &self,
        competition: &mut Competition,
        session_index: usize,
        club: ClubId,
        want_rationale: bool,
    ) -> SessionScore {
        let departmental = competition.level.is_departmental();
        let team = competition.team_format.is_team();
        let team_size = competition.team_size();
        let session = &mut competition.sessions[session_index];

        if let Some(entry) = session.scores.get(&club) {
            if let Some(score) = entry.score {
                if !want_rationale {
                    return SessionScore {
                        points: score,
                        rationale: None,
                    };
                }
                if let Some(rationale) = &entry.rationale {
                    return SessionScore {
                        points: score,
                        rationale: Some(rationale.clone()),
                    };
                }
                // Cache hit without a stored trail: rebuild only the trail,
                // the cached score stays authoritative.
                let (_, rationale) =
                    self.compute(session, club, departmental, team, team_size);
                let entry = session.scores.entry(club).or_default();
                entry.rationale = Some(rationale.clone());
                return SessionScore {
                    points: score,
                    rationale: Some(rationale),
                };
            }
        }

        let (points, rationale) = self.compute(session, club, departmental, team, team_size);
        let entry = session.scores.entry(club).or_default();
        entry.score = Some(points);
        if want_rationale {
            entry.rationale = Some(rationale.clone());
            SessionScore {
                points,
                rationale: Some(rationale),
            }
        } else {
            SessionScore {
                points,
                rationale: None,
            }
        }
    }

    /// Pure computation: (points, rationale trail).
    fn compute(
        &self,
        session: &Session,
        club: ClubId,
        departmental: bool,
        team: bool,
        team_size: Option<u32>,
    ) -> (i32, Vec<String>) {
        let participations = session.participation_of(club);
        let needed = self.needed(participations, departmental, team, team_size);

        let mut rationale = Vec::new();
        let mut line = format!("{} official(s) required", needed.total);
        if needed.min_qualified > 0 {
            line.push_str(&format!(
                ", including {} rated B or higher",
                needed.min_qualified
            ));
        }
        rationale.push(line);

        let (counted, qualified) =
            self.count_officials(session, club, departmental, &mut rationale);

        let mut points;
        if counted < needed.total {
            let missing = needed.total - counted;
            points = -4 * missing as i32;
            rationale.push(format!(
                "{} penalty points for {} missing official(s)",
                4 * missing,
                missing
            ));
        } else {
            let extra = counted - needed.total;
            points = 2 * extra as i32;
            if extra > 0 {
                rationale.push(format!(
                    "{} bonus points for {} extra official(s)",
                    2 * extra,
                    extra
                ));
            }
            if qualified < needed.min_qualified {
                let missing = needed.min_qualified - qualified;
                points -= 2 * missing as i32;
                rationale.push(format!(
                    "{} penalty points for {} missing B-grade official(s)",
                    2 * missing,
                    missing
                ));
            }
        }

        (points, rationale)
    }

    /// Required (min qualified, total) officials for the participation
    /// count, by competition level and format.
    fn needed(
        &self,
        participations: u32,
        departmental: bool,
        team: bool,
        team_size: Option<u32>,
    ) -> Needed {
        if departmental {
            let scaled = if team {
                participations * team_size.unwrap_or(1)
            } else {
                participations
            };
            if scaled == 0 {
                return Needed {
                    min_qualified: 0,
                    total: 0,
                };
            }
            let total = scaled.div_ceil(self.departmental_divisor);
            Needed {
                min_qualified: total / 2,
                total,
            }
        } else if team {
            if participations <= 1 {
                Needed {
                    min_qualified: participations,
                    total: participations,
                }
            } else {
                Needed {
                    min_qualified: 1,
                    total: participations.min(3),
                }
            }
        } else if participations <= 10 {
            Needed {
                min_qualified: 0,
                total: 0,
            }
        } else if participations <= 20 {
            Needed {
                min_qualified: 0,
                total: 1,
            }
        } else {
            Needed {
                min_qualified: 1,
                total: 2,
            }
        }
    }

    /// Count the club's creditable officials: (counted, qualified among
    /// them). Officials invalid for the level are excluded with a warning;
    /// regional-or-above counts are capped, in official-id order.
    fn count_officials(
        &self,
        session: &Session,
        club: ClubId,
        departmental: bool,
        rationale: &mut Vec<String>,
    ) -> (u32, u32) {
        let per_club = session.officials_per_club();
        let empty: Vec<&SessionOfficial> = Vec::new();
        let officials = per_club.get(&club).unwrap_or(&empty);

        let mut valid: Vec<&SessionOfficial> = Vec::new();
        for official in officials.iter().copied() {
            if official.valid_for(departmental) {
                valid.push(official);
            } else {
                warn!(
                    "official {} ({}) not creditable at this level, excluded",
                    official.full_name(),
                    official
                        .duty
                        .as_ref()
                        .map(|d| d.name.as_str())
                        .unwrap_or("no duty")
                );
            }
        }

        let mut counted = &valid[..];
        if !departmental && valid.len() > self.regional_cap {
            rationale.push(format!(
                "{} officials retained out of the {} presented",
                self.regional_cap,
                valid.len()
            ));
            counted = &valid[..self.regional_cap];
        }

        let qualified = counted.iter().filter(|o| o.senior).count() as u32;
        (counted.len() as u32, qualified)
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}
