// Meet Officials - Core Library
// Ingests swim-meet results feeds and scores each club's volunteer-official
// contribution per session, for the organization's financial reconciliation.

pub mod assignment;
pub mod batch;
pub mod catalog;
pub mod entities;
pub mod error;
pub mod linker;
pub mod parser;
pub mod participation;
pub mod scoring;

// Re-export commonly used types
pub use assignment::{AssignmentResolver, ResolutionReport};
pub use batch::{collect_feed_files, run_batch, BatchModel};
pub use catalog::{DisqualificationInfo, RaceInfo, ReferenceCatalog, TraineeRecord};
pub use entities::{
    Club, ClubId, Competition, CompetitionId, CompetitionLevel, CountRule, Duty, DutyAssignment,
    DutyId, DutyLogEntry, EntryCounters, ForfeitCategory, ForfeitCounters, Grade, GradeId,
    Official, OfficialId, Pool, RaceId, ScoreEntry, Session, SessionOfficial, Sex, SwimmerId,
    TeamFormat,
};
pub use error::Error;
pub use linker::CompetitionLinker;
pub use parser::{
    FeedParser, ParsedFeed, ResultEntry, ResultRecord, Swimmer, ARCHIVE_ENTRY, ROOT_TAG,
    SUPPORTED_VERSION,
};
pub use participation::ParticipationAggregator;
pub use scoring::{ScoringEngine, SessionScore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
