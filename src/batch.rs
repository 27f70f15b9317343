// Batch run - ordered, single-threaded, one model per invocation
//
// Input files are processed in sorted order so duplicate detection and
// report ordering are reproducible run to run. Only archive-level
// unreadability is skipped per file; every structural or cross-competition
// invariant violation aborts the run, because partial output would
// misstate the financial totals.

use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::assignment::AssignmentResolver;
use crate::catalog::ReferenceCatalog;
use crate::entities::{Club, ClubId, Competition, CompetitionId};
use crate::error::Error;
use crate::linker::CompetitionLinker;
use crate::parser::{FeedParser, ParsedFeed};
use crate::participation::ParticipationAggregator;

/// The fully resolved graph one batch run produces.
#[derive(Debug, Serialize)]
pub struct BatchModel {
    pub clubs: BTreeMap<ClubId, Club>,
    pub competitions: BTreeMap<CompetitionId, Competition>,
}

impl BatchModel {
    /// Competitions that appear in reports: everything not folded into a
    /// master.
    pub fn reported(&self) -> impl Iterator<Item = &Competition> {
        self.competitions.values().filter(|c| !c.linked)
    }
}

/// Expand directories into their files and sort the whole list.
pub fn collect_feed_files<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    files.push(entry.path());
                }
            }
        } else {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Parse, resolve, aggregate and link every feed file.
pub fn run_batch<P: AsRef<Path>>(
    catalog: &ReferenceCatalog,
    files: &[P],
) -> Result<BatchModel> {
    let mut paths: Vec<PathBuf> = files.iter().map(|p| p.as_ref().to_path_buf()).collect();
    paths.sort();

    let parser = FeedParser::new(catalog);
    let mut feeds: Vec<ParsedFeed> = Vec::new();
    let mut seen: BTreeSet<CompetitionId> = BTreeSet::new();
    let mut duplicates: BTreeSet<CompetitionId> = BTreeSet::new();

    for path in &paths {
        match parser.parse_path(path) {
            Ok(feed) => {
                info!(
                    "parsed competition {} ({}) from {}",
                    feed.competition.name,
                    feed.competition.id,
                    path.display()
                );
                if !seen.insert(feed.competition.id) {
                    duplicates.insert(feed.competition.id);
                }
                feeds.push(feed);
            }
            Err(err @ Error::FeedUnreadable { .. }) => {
                // Skip just this file; the rest of the batch stands.
                error!("{}", err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if !duplicates.is_empty() {
        return Err(Error::DuplicateCompetition {
            ids: duplicates.into_iter().collect(),
        }
        .into());
    }

    let mut model = BatchModel {
        clubs: catalog.clubs().map(|c| (c.id, c.clone())).collect(),
        competitions: BTreeMap::new(),
    };

    let resolver = AssignmentResolver::new(catalog);
    let aggregator = ParticipationAggregator::new(catalog);

    for feed in feeds {
        let ParsedFeed {
            mut competition,
            officials,
            swimmers,
            results,
        } = feed;

        let report = resolver.resolve(&mut competition, &officials, &mut model.clubs);
        if !report.is_clean() {
            info!(
                "competition {}: {} judge line(s) skipped on reference lookups",
                competition.id,
                report.unknown_officials.len() + report.unknown_duties.len()
            );
        }
        aggregator.aggregate(&mut competition, &results, &swimmers)?;

        for club_id in &competition.clubs {
            if let Some(club) = model.clubs.get_mut(club_id) {
                club.register_competition(competition.id);
            }
        }
        model.competitions.insert(competition.id, competition);
    }

    CompetitionLinker::new().link(&mut model.competitions, &mut model.clubs)?;

    info!(
        "batch complete: {} competition(s), {} reported",
        model.competitions.len(),
        model.reported().count()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CompetitionLevel, Grade};
    use std::fs;
    use tempfile::TempDir;

    fn test_catalog() -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.home_region = "06".to_string();
        catalog.insert_grade(Grade::new(2, "C", 1));
        catalog.insert_club(Club::new(101, "CN Antibes", "06"));
        catalog.insert_competition_type(20, "Regional championship", CompetitionLevel::Regional);
        catalog
    }

    fn feed_xml(id: u32, link: Option<u32>) -> String {
        let link_attr = link
            .map(|l| format!(" linkid=\"{}\"", l))
            .unwrap_or_default();
        format!(
            r#"<FFNEX version="1.1.0">
  <MEETS>
    <MEET id="{id}" name="Meet {id}" startdate="2015-12-05" stopdate="2015-12-05" city="Antibes" typeid="20"{link_attr}>
      <OFFICIALS>
        <OFFICIAL id="500" clubid="101" gradeid="2" lastname="MARTIN" firstname="Sophie"/>
      </OFFICIALS>
      <SESSIONS>
        <SESSION number="1" date="2015-12-05" daytime="09:00">
          <EVENTS>
            <EVENT type="RACE" raceid="300" roundid="1"/>
          </EVENTS>
        </SESSION>
      </SESSIONS>
    </MEET>
  </MEETS>
</FFNEX>"#
        )
    }

    #[test]
    fn test_unreadable_file_is_skipped_batch_continues() {
        let catalog = test_catalog();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.xml"), feed_xml(35303, None)).unwrap();
        fs::write(dir.path().join("b.zip"), b"PK\x03\x04 broken archive").unwrap();

        let files = collect_feed_files(&[dir.path().to_path_buf()]).unwrap();
        let model = run_batch(&catalog, &files).unwrap();

        assert_eq!(model.competitions.len(), 1);
        assert!(model.competitions.contains_key(&35303));
    }

    #[test]
    fn test_duplicate_competition_ids_abort_the_batch() {
        let catalog = test_catalog();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.xml"), feed_xml(35303, None)).unwrap();
        fs::write(dir.path().join("b.xml"), feed_xml(35303, None)).unwrap();

        let files = collect_feed_files(&[dir.path().to_path_buf()]).unwrap();
        let err = run_batch(&catalog, &files).unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert!(matches!(err, Error::DuplicateCompetition { ref ids } if ids == &vec![35303]));
    }

    #[test]
    fn test_files_are_processed_in_sorted_order() {
        let catalog = test_catalog();
        let dir = TempDir::new().unwrap();
        // Given out of order on purpose; ids differ per file.
        fs::write(dir.path().join("b.xml"), feed_xml(2, None)).unwrap();
        fs::write(dir.path().join("a.xml"), feed_xml(1, None)).unwrap();

        let files = vec![dir.path().join("b.xml"), dir.path().join("a.xml")];
        let model = run_batch(&catalog, &files).unwrap();

        // Club membership registration follows sorted file order.
        assert_eq!(model.clubs[&101].competitions, vec![1, 2]);
    }

    #[test]
    fn test_format_error_aborts_the_run() {
        let catalog = test_catalog();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.xml"), "<WRONG/>").unwrap();
        fs::write(dir.path().join("b.xml"), feed_xml(35303, None)).unwrap();

        let files = collect_feed_files(&[dir.path().to_path_buf()]).unwrap();
        let err = run_batch(&catalog, &files).unwrap_err();
        assert!(matches!(
            err.downcast::<Error>().unwrap(),
            Error::FeedFormat { .. }
        ));
    }

    #[test]
    fn test_linked_satellite_is_folded_and_hidden() {
        let catalog = test_catalog();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.xml"), feed_xml(40, None)).unwrap();
        fs::write(dir.path().join("b.xml"), feed_xml(41, Some(40))).unwrap();

        let files = collect_feed_files(&[dir.path().to_path_buf()]).unwrap();
        let model = run_batch(&catalog, &files).unwrap();

        assert_eq!(model.competitions.len(), 2);
        let reported: Vec<CompetitionId> = model.reported().map(|c| c.id).collect();
        assert_eq!(reported, vec![40]);
    }
}
