// Results feed parser - FFNEX-style XML, optionally zip-wrapped
//
// One call parses one feed document into a ParsedFeed: the competition
// header with its sessions, the officials and swimmers rosters, and the
// flattened result records. Reference lookups that fail are logged and
// skipped; structural problems raise FeedFormat, unreadable archives raise
// FeedUnreadable so the batch can skip just that file.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::catalog::ReferenceCatalog;
use crate::entities::{
    ClubId, Competition, DutyAssignment, Official, OfficialId, Pool, RaceId, Session, Sex,
    SwimmerId, TeamFormat,
};
use crate::error::Error;

/// Expected root element of a results feed.
pub const ROOT_TAG: &str = "FFNEX";

/// Schema version this parser was written against. Other versions parse
/// with a warning.
pub const SUPPORTED_VERSION: &str = "1.1.0";

/// Name the inner document must have inside an archive-wrapped feed.
pub const ARCHIVE_ENTRY: &str = "ffnex.xml";

/// Swimmer roster entry; birth year and home club feed the reports.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Swimmer {
    pub id: SwimmerId,
    pub club_id: ClubId,
    pub birth_year: i32,
    pub sex: Sex,
}

/// One race entry of a result record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEntry {
    Solo {
        swimmer_id: SwimmerId,
    },
    Relay {
        team_number: Option<u32>,
        swimmer_ids: Vec<SwimmerId>,
    },
}

/// Flattened result record, already tied to its kept session.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub session_index: usize,
    pub race_id: RaceId,
    pub round_id: u32,
    pub club_id: ClubId,
    pub disqualification_id: u32,
    pub is_final: bool,
    pub entry: ResultEntry,
}

impl ResultRecord {
    pub fn is_disqualified(&self) -> bool {
        self.disqualification_id != 0
    }
}

/// Everything one feed document yields.
#[derive(Debug)]
pub struct ParsedFeed {
    pub competition: Competition,
    pub officials: BTreeMap<OfficialId, Official>,
    pub swimmers: BTreeMap<SwimmerId, Swimmer>,
    pub results: Vec<ResultRecord>,
}

pub struct FeedParser<'a> {
    catalog: &'a ReferenceCatalog,
}

impl<'a> FeedParser<'a> {
    pub fn new(catalog: &'a ReferenceCatalog) -> Self {
        FeedParser { catalog }
    }

    /// Parse one feed file (plain XML or zip archive).
    pub fn parse_path(&self, path: &Path) -> Result<ParsedFeed, Error> {
        let label = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| Error::FeedUnreadable {
            path: label.clone(),
            reason: e.to_string(),
        })?;
        self.parse_bytes(&bytes, &label)
    }

    /// Parse feed bytes; `label` identifies the source in errors and logs.
    pub fn parse_bytes(&self, bytes: &[u8], label: &str) -> Result<ParsedFeed, Error> {
        let text = extract_document(bytes, label)?;
        self.parse_document(&text, label)
    }

    fn parse_document(&self, text: &str, path: &str) -> Result<ParsedFeed, Error> {
        let doc = Document::parse(text).map_err(|e| Error::FeedFormat {
            path: path.to_string(),
            reason: format!("XML: {}", e),
        })?;

        let root = doc.root_element();
        if root.tag_name().name() != ROOT_TAG {
            return Err(Error::FeedFormat {
                path: path.to_string(),
                reason: format!(
                    "expected root element {}, found {}",
                    ROOT_TAG,
                    root.tag_name().name()
                ),
            });
        }
        match root.attribute("version") {
            Some(version) if version == SUPPORTED_VERSION => {}
            Some(version) => warn!(
                "{}: feed version {} (parser written against {})",
                path, version, SUPPORTED_VERSION
            ),
            None => warn!("{}: feed carries no version attribute", path),
        }

        let meet = child(root, "MEETS")
            .and_then(|meets| child(meets, "MEET"))
            .ok_or_else(|| Error::FeedFormat {
                path: path.to_string(),
                reason: "missing MEETS/MEET section".to_string(),
            })?;

        let mut competition = self.parse_header(meet, path)?;
        self.check_club_roster(meet, path);
        let officials = self.parse_officials(meet, &mut competition, path);
        let swimmers = self.parse_swimmers(meet, &mut competition, path);
        let race_rounds = self.parse_sessions(meet, &mut competition, path)?;
        let results = self.parse_results(meet, &race_rounds, path);

        Ok(ParsedFeed {
            competition,
            officials,
            swimmers,
            results,
        })
    }

    fn parse_header(&self, meet: Node, path: &str) -> Result<Competition, Error> {
        let id = req_u32(meet, "id", path)?;
        let name = req_attr(meet, "name", path)?.to_string();
        let start_date = req_date(meet, "startdate", path)?;
        let stop_date = req_date(meet, "stopdate", path)?;
        let city = req_attr(meet, "city", path)?.to_string();

        let type_id = req_u32(meet, "typeid", path)?;
        let level = self
            .catalog
            .competition_level(type_id)
            .ok_or_else(|| Error::FeedFormat {
                path: path.to_string(),
                reason: format!("unknown competition type id {}", type_id),
            })?;

        let team_format = match meet.attribute("byteam") {
            None | Some("false") | Some("0") | Some("") => TeamFormat::Individual,
            Some("true") => TeamFormat::Team { size: None },
            Some(number) => {
                let size = number.parse::<u32>().map_err(|_| Error::FeedFormat {
                    path: path.to_string(),
                    reason: format!("invalid byteam value '{}'", number),
                })?;
                TeamFormat::Team { size: Some(size) }
            }
        };

        let master_id = match meet.attribute("linkid") {
            None => None,
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| Error::FeedFormat {
                path: path.to_string(),
                reason: format!("invalid linkid value '{}'", raw),
            })?),
        };

        let pool = match child(meet, "POOL") {
            None => None,
            Some(pool_node) => Some(Pool {
                lanes: req_u32(pool_node, "lanes", path)?,
                length_m: req_u32(pool_node, "size", path)?,
            }),
        };

        Ok(Competition {
            id,
            name,
            start_date,
            stop_date,
            city,
            level,
            team_format,
            pool,
            master_id,
            sessions: Vec::new(),
            clubs: Vec::new(),
            linked: false,
        })
    }

    /// Cross-check the declared club roster against the catalog. Nothing
    /// here is fatal; unknown home-region clubs are a data-quality flag.
    fn check_club_roster(&self, meet: Node, path: &str) {
        let Some(clubs) = child(meet, "CLUBS") else {
            debug!("{}: feed declares no club roster", path);
            return;
        };

        for club_node in children(clubs, "CLUB") {
            let Some(id) = attr_u32(club_node, "id") else {
                warn!("{}: club entry without a valid id, skipped", path);
                continue;
            };
            if self.catalog.club(id).is_some() {
                continue;
            }
            let name = club_node.attribute("name").unwrap_or("?");
            let region = club_node.attribute("region").unwrap_or("");
            if region == self.catalog.home_region {
                warn!(
                    "{}: club {} ({}) claims region {} but is not in the reference list",
                    path, name, id, region
                );
            } else {
                debug!(
                    "{}: out-of-region club {} ({}) not in the reference list",
                    path, name, id
                );
            }
        }
    }

    fn parse_officials(
        &self,
        meet: Node,
        competition: &mut Competition,
        path: &str,
    ) -> BTreeMap<OfficialId, Official> {
        let mut officials = BTreeMap::new();
        let Some(section) = child(meet, "OFFICIALS") else {
            debug!("{}: feed declares no officials", path);
            return officials;
        };

        for node in children(section, "OFFICIAL") {
            let (Some(id), Some(club_id), Some(grade_id)) = (
                attr_u32(node, "id"),
                attr_u32(node, "clubid"),
                attr_u32(node, "gradeid"),
            ) else {
                warn!("{}: official entry with missing ids, skipped", path);
                continue;
            };
            let last_name = node.attribute("lastname").unwrap_or("").to_string();
            let first_name = node.attribute("firstname").unwrap_or("").to_string();

            if Some(club_id) == self.catalog.administrative_club {
                debug!(
                    "{}: official {} {} ({}) filed under the administrative club, filtered",
                    path, first_name, last_name, id
                );
                continue;
            }
            if self.catalog.club(club_id).is_none() {
                debug!(
                    "{}: official {} {} ignored, club {} not in the reference list",
                    path, first_name, last_name, club_id
                );
                continue;
            }
            let Some(grade) = self.catalog.grade(grade_id) else {
                warn!(
                    "{}: official {} {} ({}) references unknown grade {}, skipped",
                    path, first_name, last_name, id, grade_id
                );
                continue;
            };

            competition.register_club(club_id);
            officials.insert(
                id,
                Official::new(id, last_name, first_name, club_id, grade.clone()),
            );
        }

        officials
    }

    fn parse_swimmers(
        &self,
        meet: Node,
        competition: &mut Competition,
        path: &str,
    ) -> BTreeMap<SwimmerId, Swimmer> {
        let mut swimmers = BTreeMap::new();
        let Some(section) = child(meet, "SWIMMERS") else {
            debug!("{}: feed declares no swimmers", path);
            return swimmers;
        };

        for node in children(section, "SWIMMER") {
            let (Some(id), Some(club_id)) = (attr_u32(node, "id"), attr_u32(node, "clubid"))
            else {
                warn!("{}: swimmer entry with missing ids, skipped", path);
                continue;
            };
            let birth_year = node
                .attribute("birthdate")
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .map(|d| chrono::Datelike::year(&d))
                .unwrap_or(0);
            let sex = node
                .attribute("gender")
                .and_then(Sex::parse)
                .unwrap_or(Sex::Mixed);

            if self.catalog.club(club_id).is_some() {
                competition.register_club(club_id);
            }
            swimmers.insert(
                id,
                Swimmer {
                    id,
                    club_id,
                    birth_year,
                    sex,
                },
            );
        }

        swimmers
    }

    /// Read the sessions, keeping only those with at least one race.
    /// Returns the (race id, round id) -> (kept session index, final round)
    /// mapping the results section resolves against.
    fn parse_sessions(
        &self,
        meet: Node,
        competition: &mut Competition,
        path: &str,
    ) -> Result<BTreeMap<(RaceId, u32), (usize, bool)>, Error> {
        let mut race_rounds = BTreeMap::new();
        let Some(section) = child(meet, "SESSIONS") else {
            return Err(Error::FeedFormat {
                path: path.to_string(),
                reason: "missing SESSIONS section".to_string(),
            });
        };

        for node in children(section, "SESSION") {
            let number = req_u32(node, "number", path)?;
            let date = req_date(node, "date", path)?;
            let time = node
                .attribute("daytime")
                .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
                .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
            let start = NaiveDateTime::new(date, time);

            // Collect this session's races first; a raceless session is
            // dropped and its judges are not credited.
            let mut races = Vec::new();
            if let Some(events) = child(node, "EVENTS") {
                for event in children(events, "EVENT") {
                    if event.attribute("type") != Some("RACE") {
                        continue;
                    }
                    let Some(race_id) = attr_u32(event, "raceid") else {
                        continue;
                    };
                    let round_id = attr_u32(event, "roundid").unwrap_or(0);
                    let is_final = event
                        .attribute("round")
                        .map(|r| r.eq_ignore_ascii_case("FINAL"))
                        .unwrap_or(false);
                    races.push((race_id, round_id, is_final));
                }
            }
            if races.is_empty() {
                debug!("{}: session {} has no race, dropped", path, number);
                continue;
            }

            let index = competition.sessions.len();
            for (race_id, round_id, is_final) in races {
                race_rounds.insert((race_id, round_id), (index, is_final));
            }

            let mut session = Session::new(number, start);
            if let Some(judges) = child(node, "JUDGES") {
                for judge in children(judges, "JUDGE") {
                    let (Some(official_id), Some(duty_id)) =
                        (attr_u32(judge, "officialid"), attr_u32(judge, "roleid"))
                    else {
                        warn!(
                            "{}: session {}: judge entry with missing ids, skipped",
                            path, number
                        );
                        continue;
                    };
                    session.assignments.push(DutyAssignment {
                        official_id,
                        duty_id,
                    });
                }
            }
            competition.sessions.push(session);
        }

        Ok(race_rounds)
    }

    fn parse_results(
        &self,
        meet: Node,
        race_rounds: &BTreeMap<(RaceId, u32), (usize, bool)>,
        path: &str,
    ) -> Vec<ResultRecord> {
        let mut results = Vec::new();
        let Some(section) = child(meet, "RESULTS") else {
            debug!("{}: feed declares no results", path);
            return results;
        };

        for node in children(section, "RESULT") {
            let (Some(race_id), Some(club_id)) =
                (attr_u32(node, "raceid"), attr_u32(node, "clubid"))
            else {
                warn!("{}: result entry with missing ids, skipped", path);
                continue;
            };
            let round_id = attr_u32(node, "roundid").unwrap_or(0);
            let disqualification_id = attr_u32(node, "disqualificationid").unwrap_or(0);

            let Some(&(session_index, is_final)) = race_rounds.get(&(race_id, round_id)) else {
                warn!(
                    "{}: result references unknown race {} round {}, skipped",
                    path, race_id, round_id
                );
                continue;
            };

            let entry = if let Some(solo) = child(node, "SOLO") {
                let Some(swimmer_id) = attr_u32(solo, "swimmerid") else {
                    warn!("{}: solo result without swimmer id, skipped", path);
                    continue;
                };
                ResultEntry::Solo { swimmer_id }
            } else if let Some(relay) = child(node, "RELAY") {
                let team_number = attr_u32(relay, "number");
                let swimmer_ids: Vec<SwimmerId> = child(relay, "RELAYPOSITIONS")
                    .map(|positions| {
                        children(positions, "RELAYPOSITION")
                            .filter_map(|p| attr_u32(p, "swimmerid"))
                            .collect()
                    })
                    .unwrap_or_default();
                ResultEntry::Relay {
                    team_number,
                    swimmer_ids,
                }
            } else {
                // Splits and other non-entry records carry no participation.
                continue;
            };

            results.push(ResultRecord {
                session_index,
                race_id,
                round_id,
                club_id,
                disqualification_id,
                is_final,
                entry,
            });
        }

        results
    }
}

// ============================================================================
// ARCHIVE HANDLING
// ============================================================================

/// Unwrap the feed document: pass plain XML through, extract the fixed
/// inner entry from a zip archive. Corrupt archives and missing entries
/// are FeedUnreadable so the batch skips only this file.
fn extract_document(bytes: &[u8], path: &str) -> Result<String, Error> {
    if !bytes.starts_with(b"PK") {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| Error::FeedUnreadable {
            path: path.to_string(),
            reason: format!("corrupt archive: {}", e),
        })?;

    let mut entry = archive
        .by_name(ARCHIVE_ENTRY)
        .map_err(|_| Error::FeedUnreadable {
            path: path.to_string(),
            reason: format!("archive does not contain {}", ARCHIVE_ENTRY),
        })?;

    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| Error::FeedUnreadable {
            path: path.to_string(),
            reason: format!("failed to extract {}: {}", ARCHIVE_ENTRY, e),
        })?;
    Ok(text)
}

// ============================================================================
// XML HELPERS
// ============================================================================

fn child<'a, 'i>(node: Node<'a, 'i>, tag: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn children<'a, 'i>(node: Node<'a, 'i>, tag: &'a str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(move |n| n.has_tag_name(tag))
}

fn attr_u32(node: Node, name: &str) -> Option<u32> {
    node.attribute(name).and_then(|v| v.trim().parse().ok())
}

fn req_attr<'a, 'i>(node: Node<'a, 'i>, name: &str, path: &str) -> Result<&'a str, Error> {
    node.attribute(name).ok_or_else(|| Error::FeedFormat {
        path: path.to_string(),
        reason: format!(
            "element {} is missing attribute '{}'",
            node.tag_name().name(),
            name
        ),
    })
}

fn req_u32(node: Node, name: &str, path: &str) -> Result<u32, Error> {
    let raw = req_attr(node, name, path)?;
    raw.trim().parse::<u32>().map_err(|_| Error::FeedFormat {
        path: path.to_string(),
        reason: format!(
            "element {}: attribute '{}' is not a number: '{}'",
            node.tag_name().name(),
            name,
            raw
        ),
    })
}

fn req_date(node: Node, name: &str, path: &str) -> Result<NaiveDate, Error> {
    let raw = req_attr(node, name, path)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Error::FeedFormat {
        path: path.to_string(),
        reason: format!(
            "element {}: attribute '{}' is not a date: '{}'",
            node.tag_name().name(),
            name,
            raw
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Club, CompetitionLevel, CountRule, Duty, Grade};
    use std::io::Write;

    fn test_catalog() -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.home_region = "06".to_string();
        catalog.administrative_club = Some(999);
        catalog.insert_grade(Grade::new(1, "Registered", 0));
        catalog.insert_grade(Grade::new(2, "C", 1));
        catalog.insert_grade(Grade::new(3, "B", 2));
        catalog.insert_club(Club::new(101, "CN Antibes", "06"));
        catalog.insert_club(Club::new(102, "ON Nice", "06"));
        catalog.insert_duty(Duty::new(
            1,
            "Timekeeper",
            Grade::new(2, "C", 1),
            CountRule::IfRegistered,
            CountRule::IfRegistered,
        ));
        catalog.insert_competition_type(10, "Departmental meeting", CompetitionLevel::Departmental);
        catalog.insert_competition_type(20, "Regional championship", CompetitionLevel::Regional);
        catalog
    }

    fn sample_feed() -> String {
        r#"<?xml version="1.0" encoding="utf-8"?>
<FFNEX version="1.1.0">
  <MEETS>
    <MEET id="35303" name="Meeting de la cote" startdate="2015-12-05" stopdate="2015-12-06" city="Antibes" typeid="20">
      <POOL lanes="8" size="25"/>
      <CLUBS>
        <CLUB id="101" name="CN Antibes" region="06"/>
        <CLUB id="777" name="Mystery Swim Team" region="06"/>
        <CLUB id="888" name="Far Away SC" region="75"/>
      </CLUBS>
      <OFFICIALS>
        <OFFICIAL id="500" clubid="101" gradeid="3" lastname="MARTIN" firstname="Sophie"/>
        <OFFICIAL id="501" clubid="999" gradeid="3" lastname="ADMIN" firstname="Fed"/>
        <OFFICIAL id="502" clubid="777" gradeid="3" lastname="LOST" firstname="Club"/>
        <OFFICIAL id="503" clubid="101" gradeid="42" lastname="ODD" firstname="Grade"/>
      </OFFICIALS>
      <SWIMMERS>
        <SWIMMER id="9001" clubid="101" birthdate="2002-04-01" gender="F"/>
        <SWIMMER id="9002" clubid="102" birthdate="2003-06-15" gender="M"/>
      </SWIMMERS>
      <SESSIONS>
        <SESSION number="1" date="2015-12-05" daytime="09:00">
          <EVENTS>
            <EVENT type="RACE" raceid="300" roundid="1" datetime="2015-12-05 09:10:00"/>
            <EVENT type="RACE" raceid="300" roundid="2" round="FINAL"/>
            <EVENT type="BREAK"/>
          </EVENTS>
          <JUDGES>
            <JUDGE officialid="500" roleid="1"/>
          </JUDGES>
        </SESSION>
        <SESSION number="2" date="2015-12-06" daytime="14:30">
          <EVENTS>
            <EVENT type="BREAK"/>
          </EVENTS>
          <JUDGES>
            <JUDGE officialid="500" roleid="1"/>
          </JUDGES>
        </SESSION>
      </SESSIONS>
      <RESULTS>
        <RESULT raceid="300" roundid="1" clubid="101" disqualificationid="0" heat="1" lane="4">
          <SOLO swimmerid="9001"/>
        </RESULT>
        <RESULT raceid="300" roundid="2" clubid="101" disqualificationid="0">
          <SOLO swimmerid="9001"/>
        </RESULT>
        <RESULT raceid="300" roundid="1" clubid="102" disqualificationid="7">
          <RELAY number="1">
            <RELAYPOSITIONS>
              <RELAYPOSITION swimmerid="9002" number="1"/>
              <RELAYPOSITION swimmerid="9001" number="2"/>
            </RELAYPOSITIONS>
          </RELAY>
        </RESULT>
        <RESULT raceid="999" roundid="1" clubid="101" disqualificationid="0">
          <SOLO swimmerid="9001"/>
        </RESULT>
      </RESULTS>
    </MEET>
  </MEETS>
</FFNEX>"#
            .to_string()
    }

    #[test]
    fn test_parse_header_and_rosters() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);
        let feed = parser
            .parse_bytes(sample_feed().as_bytes(), "sample")
            .unwrap();

        let competition = &feed.competition;
        assert_eq!(competition.id, 35303);
        assert_eq!(competition.city, "Antibes");
        assert_eq!(competition.level, CompetitionLevel::Regional);
        assert_eq!(competition.team_format, TeamFormat::Individual);
        assert_eq!(
            competition.pool,
            Some(Pool {
                lanes: 8,
                length_m: 25
            })
        );
        assert_eq!(competition.master_id, None);
        assert_eq!(competition.clubs, vec![101, 102]);

        // Administrative, unknown-club and unknown-grade officials are gone.
        assert_eq!(feed.officials.len(), 1);
        assert_eq!(feed.officials[&500].full_name(), "MARTIN Sophie");

        assert_eq!(feed.swimmers.len(), 2);
        assert_eq!(feed.swimmers[&9001].birth_year, 2002);
        assert_eq!(feed.swimmers[&9002].sex, Sex::Male);
    }

    #[test]
    fn test_raceless_session_is_dropped() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);
        let feed = parser
            .parse_bytes(sample_feed().as_bytes(), "sample")
            .unwrap();

        assert_eq!(feed.competition.sessions.len(), 1);
        let session = &feed.competition.sessions[0];
        assert_eq!(session.number, 1);
        assert_eq!(session.assignments.len(), 1);
        assert_eq!(
            session.start,
            NaiveDate::from_ymd_opt(2015, 12, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_results_resolve_rounds_and_skip_unknown_races() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);
        let feed = parser
            .parse_bytes(sample_feed().as_bytes(), "sample")
            .unwrap();

        // The raceid=999 record is skipped.
        assert_eq!(feed.results.len(), 3);
        assert!(!feed.results[0].is_final);
        assert!(feed.results[1].is_final);

        let relay = &feed.results[2];
        assert_eq!(relay.club_id, 102);
        assert_eq!(relay.disqualification_id, 7);
        assert_eq!(
            relay.entry,
            ResultEntry::Relay {
                team_number: Some(1),
                swimmer_ids: vec![9002, 9001],
            }
        );
    }

    #[test]
    fn test_wrong_root_is_a_format_error() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);
        let err = parser
            .parse_bytes(b"<LENEX version=\"3.0\"/>", "sample")
            .unwrap_err();
        assert!(matches!(err, Error::FeedFormat { .. }));
        assert!(err.to_string().contains("LENEX"));
    }

    #[test]
    fn test_other_version_still_parses() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);
        let feed = sample_feed().replace("version=\"1.1.0\"", "version=\"1.2.0\"");
        assert!(parser.parse_bytes(feed.as_bytes(), "sample").is_ok());
    }

    #[test]
    fn test_zip_wrapped_feed_round_trips() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file(ARCHIVE_ENTRY, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(sample_feed().as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let feed = parser.parse_bytes(&bytes, "sample.zip").unwrap();
        assert_eq!(feed.competition.id, 35303);
    }

    #[test]
    fn test_archive_without_inner_entry_is_unreadable() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<FFNEX/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = parser.parse_bytes(&bytes, "sample.zip").unwrap_err();
        assert!(matches!(err, Error::FeedUnreadable { .. }));
        assert!(err.to_string().contains(ARCHIVE_ENTRY));
    }

    #[test]
    fn test_corrupt_archive_is_unreadable() {
        let catalog = test_catalog();
        let parser = FeedParser::new(&catalog);
        let err = parser
            .parse_bytes(b"PK\x03\x04 not really a zip file", "sample.zip")
            .unwrap_err();
        assert!(matches!(err, Error::FeedUnreadable { .. }));
    }
}
