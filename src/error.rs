// Error taxonomy for the batch pipeline
// Only conditions that stop a file or the whole run live here; reference
// lookup misses are warnings logged at the point of use.

use thiserror::Error;

use crate::entities::CompetitionId;

#[derive(Debug, Error)]
pub enum Error {
    /// The document is structurally not a results feed (wrong root element,
    /// missing required section or attribute). Aborts the run: a feed that
    /// cannot be trusted structurally poisons cross-competition totals.
    #[error("{path}: invalid results feed: {reason}")]
    FeedFormat { path: String, reason: String },

    /// The archive wrapper cannot be opened or does not contain the expected
    /// inner document. The file is skipped and the batch continues.
    #[error("{path}: unreadable feed archive: {reason}")]
    FeedUnreadable { path: String, reason: String },

    /// The same competition id appeared in more than one input file.
    /// Reports every duplicated id at once.
    #[error("duplicate competition ids across the batch: {}", format_ids(.ids))]
    DuplicateCompetition { ids: Vec<CompetitionId> },

    /// A satellite competition and its master disagree on session count.
    /// Fatal for the batch: folding counts by ordinal would misalign.
    #[error(
        "competition {satellite} links to {master} but has {satellite_sessions} \
         session(s) against {master_sessions}"
    )]
    LinkMismatch {
        satellite: CompetitionId,
        master: CompetitionId,
        satellite_sessions: usize,
        master_sessions: usize,
    },

    /// A team-format competition offered no non-disqualified relay to
    /// observe the team size from.
    #[error("competition {competition}: team size could not be determined from any relay result")]
    TeamSizeUndetermined { competition: CompetitionId },
}

fn format_ids(ids: &[CompetitionId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
