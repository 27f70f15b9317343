// ReferenceCatalog - the injected lookup tables every component reads
//
// The catalog is loaded once per run from a directory of CSV files and
// passed by reference everywhere; nothing in the pipeline ever inserts
// into it. Unknown ids coming from a feed are the feed's problem (logged
// and skipped); inconsistencies inside the catalog itself are hard errors.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::entities::{
    Club, ClubId, CompetitionLevel, CountRule, Duty, DutyId, ForfeitCategory, Grade, GradeId,
    OfficialId, RaceId, Sex,
};

/// Event/stroke table row: display label, canonical stroke, event sex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceInfo {
    pub label: String,
    pub stroke: String,
    pub sex: Sex,
}

/// Disqualification-code table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisqualificationInfo {
    pub code: String,
    pub label: String,

    /// Tracked forfeiture category, when the code is one of the three
    /// counted causes.
    pub category: Option<ForfeitCategory>,

    /// Relay leg the code applies to (1-based), for relay-specific codes.
    pub relay_leg: Option<u8>,
}

/// Trainee-track registration: from `since` on, the official may be
/// credited at the target grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraineeRecord {
    pub since: NaiveDate,
    pub target_grade: GradeId,
}

#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    clubs: BTreeMap<ClubId, Club>,
    grades: BTreeMap<GradeId, Grade>,
    duties: BTreeMap<DutyId, Duty>,
    /// Competition type code -> (description, level category).
    competition_types: BTreeMap<u32, (String, CompetitionLevel)>,
    races: BTreeMap<RaceId, RaceInfo>,
    disqualifications: BTreeMap<u32, DisqualificationInfo>,
    trainees: BTreeMap<OfficialId, TraineeRecord>,

    /// Minimum grade weight to be creditable as an official at all.
    pub qualified_weight: i32,

    /// Grade weight of the "B" tier, the qualified-officials minimum.
    pub senior_weight: i32,

    /// Sentinel club id used by the federation for administrative staff;
    /// officials under it are filtered out of the roster.
    pub administrative_club: Option<ClubId>,

    /// The organization's own department code. Unknown clubs claiming this
    /// region are a data-quality warning; others are only noise.
    pub home_region: String,
}

impl ReferenceCatalog {
    /// Empty catalog with neutral thresholds; populate with the insert
    /// methods (used by tests and by the loader).
    pub fn new() -> Self {
        ReferenceCatalog {
            clubs: BTreeMap::new(),
            grades: BTreeMap::new(),
            duties: BTreeMap::new(),
            competition_types: BTreeMap::new(),
            races: BTreeMap::new(),
            disqualifications: BTreeMap::new(),
            trainees: BTreeMap::new(),
            qualified_weight: 1,
            senior_weight: 2,
            administrative_club: None,
            home_region: String::new(),
        }
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn club(&self, id: ClubId) -> Option<&Club> {
        self.clubs.get(&id)
    }

    pub fn clubs(&self) -> impl Iterator<Item = &Club> {
        self.clubs.values()
    }

    pub fn grade(&self, id: GradeId) -> Option<&Grade> {
        self.grades.get(&id)
    }

    pub fn duty(&self, id: DutyId) -> Option<&Duty> {
        self.duties.get(&id)
    }

    pub fn competition_level(&self, type_id: u32) -> Option<CompetitionLevel> {
        self.competition_types.get(&type_id).map(|(_, level)| *level)
    }

    pub fn race(&self, id: RaceId) -> Option<&RaceInfo> {
        self.races.get(&id)
    }

    pub fn disqualification(&self, id: u32) -> Option<&DisqualificationInfo> {
        self.disqualifications.get(&id)
    }

    /// Tracked forfeiture category of a disqualification id, if any.
    /// Id 0 is the feed's "no disqualification" marker.
    pub fn forfeit_category(&self, id: u32) -> Option<ForfeitCategory> {
        if id == 0 {
            return None;
        }
        self.disqualifications.get(&id).and_then(|d| d.category)
    }

    pub fn trainee(&self, official_id: OfficialId) -> Option<&TraineeRecord> {
        self.trainees.get(&official_id)
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    pub fn insert_club(&mut self, club: Club) {
        self.clubs.insert(club.id, club);
    }

    pub fn insert_grade(&mut self, grade: Grade) {
        self.grades.insert(grade.id, grade);
    }

    pub fn insert_duty(&mut self, duty: Duty) {
        self.duties.insert(duty.id, duty);
    }

    pub fn insert_competition_type(
        &mut self,
        type_id: u32,
        description: impl Into<String>,
        level: CompetitionLevel,
    ) {
        self.competition_types
            .insert(type_id, (description.into(), level));
    }

    pub fn insert_race(&mut self, id: RaceId, info: RaceInfo) {
        self.races.insert(id, info);
    }

    pub fn insert_disqualification(&mut self, id: u32, info: DisqualificationInfo) {
        self.disqualifications.insert(id, info);
    }

    pub fn insert_trainee(&mut self, official_id: OfficialId, record: TraineeRecord) {
        self.trainees.insert(official_id, record);
    }

    // ------------------------------------------------------------------
    // Directory loader
    // ------------------------------------------------------------------

    /// Load the catalog from a directory of CSV files:
    /// grades.csv, settings.csv, clubs.csv, duties.csv,
    /// competition_types.csv, races.csv, disqualifications.csv,
    /// trainees.csv.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut catalog = ReferenceCatalog::new();

        // Grades first: duties, settings and trainees reference them.
        for record in read_rows(&dir.join("grades.csv"), &["id", "name", "weight"])? {
            let (file, line, fields) = record;
            let id = parse_u32(&fields[0], &file, line, "id")?;
            let weight = fields[2]
                .trim()
                .parse::<i32>()
                .with_context(|| format!("{}:{}: invalid weight '{}'", file, line, fields[2]))?;
            catalog.insert_grade(Grade::new(id, fields[1].trim(), weight));
        }

        catalog.load_settings(&dir.join("settings.csv"))?;

        for (file, line, fields) in read_rows(&dir.join("clubs.csv"), &["id", "name", "department"])? {
            let id = parse_u32(&fields[0], &file, line, "id")?;
            catalog.insert_club(Club::new(id, fields[1].trim(), fields[2].trim()));
        }

        for (file, line, fields) in read_rows(
            &dir.join("duties.csv"),
            &["id", "name", "min_grade", "departmental", "regional"],
        )? {
            let id = parse_u32(&fields[0], &file, line, "id")?;
            let grade_id = parse_u32(&fields[2], &file, line, "min_grade")?;
            let min_grade = catalog
                .grade(grade_id)
                .cloned()
                .with_context(|| format!("{}:{}: unknown grade id {}", file, line, grade_id))?;
            let departmental = CountRule::parse(&fields[3]).with_context(|| {
                format!("{}:{}: invalid count rule '{}'", file, line, fields[3])
            })?;
            let regional = CountRule::parse(&fields[4]).with_context(|| {
                format!("{}:{}: invalid count rule '{}'", file, line, fields[4])
            })?;
            catalog.insert_duty(Duty::new(id, fields[1].trim(), min_grade, departmental, regional));
        }

        for (file, line, fields) in read_rows(
            &dir.join("competition_types.csv"),
            &["id", "description", "level"],
        )? {
            let id = parse_u32(&fields[0], &file, line, "id")?;
            let level = CompetitionLevel::parse(&fields[2]).with_context(|| {
                format!("{}:{}: invalid competition level '{}'", file, line, fields[2])
            })?;
            catalog.insert_competition_type(id, fields[1].trim(), level);
        }

        for (file, line, fields) in
            read_rows(&dir.join("races.csv"), &["id", "label", "stroke", "sex"])?
        {
            let id = parse_u32(&fields[0], &file, line, "id")?;
            let sex = Sex::parse(&fields[3])
                .with_context(|| format!("{}:{}: invalid sex code '{}'", file, line, fields[3]))?;
            catalog.insert_race(
                id,
                RaceInfo {
                    label: fields[1].trim().to_string(),
                    stroke: fields[2].trim().to_string(),
                    sex,
                },
            );
        }

        for (file, line, fields) in read_rows(
            &dir.join("disqualifications.csv"),
            &["id", "code", "label", "category", "relay_leg"],
        )? {
            let id = parse_u32(&fields[0], &file, line, "id")?;
            let category = parse_forfeit_category(&fields[3])
                .with_context(|| format!("{}:{}: invalid category '{}'", file, line, fields[3]))?;
            let relay_leg = if fields[4].trim().is_empty() {
                None
            } else {
                Some(fields[4].trim().parse::<u8>().with_context(|| {
                    format!("{}:{}: invalid relay leg '{}'", file, line, fields[4])
                })?)
            };
            catalog.insert_disqualification(
                id,
                DisqualificationInfo {
                    code: fields[1].trim().to_string(),
                    label: fields[2].trim().to_string(),
                    category,
                    relay_leg,
                },
            );
        }

        for (file, line, fields) in read_rows(
            &dir.join("trainees.csv"),
            &["official_id", "since", "target_grade"],
        )? {
            let official_id = parse_u32(&fields[0], &file, line, "official_id")?;
            let since = NaiveDate::parse_from_str(fields[1].trim(), "%Y-%m-%d")
                .with_context(|| format!("{}:{}: invalid date '{}'", file, line, fields[1]))?;
            let target_grade = parse_u32(&fields[2], &file, line, "target_grade")?;
            if catalog.grade(target_grade).is_none() {
                bail!("{}:{}: unknown grade id {}", file, line, target_grade);
            }
            catalog.insert_trainee(
                official_id,
                TraineeRecord {
                    since,
                    target_grade,
                },
            );
        }

        Ok(catalog)
    }

    fn load_settings(&mut self, path: &Path) -> Result<()> {
        let mut qualified_grade: Option<String> = None;
        let mut senior_grade: Option<String> = None;

        for (file, line, fields) in read_rows(path, &["key", "value"])? {
            let key = fields[0].trim();
            let value = fields[1].trim();
            match key {
                "home_region" => self.home_region = value.to_string(),
                "qualified_grade" => qualified_grade = Some(value.to_string()),
                "senior_grade" => senior_grade = Some(value.to_string()),
                "administrative_club" => {
                    self.administrative_club = Some(parse_u32(value, &file, line, "value")?)
                }
                other => bail!("{}:{}: unknown setting '{}'", file, line, other),
            }
        }

        if self.home_region.is_empty() {
            bail!("{}: missing 'home_region' setting", path.display());
        }
        self.qualified_weight = self.grade_weight_by_name(
            &qualified_grade.with_context(|| {
                format!("{}: missing 'qualified_grade' setting", path.display())
            })?,
        )?;
        self.senior_weight = self.grade_weight_by_name(&senior_grade.with_context(|| {
            format!("{}: missing 'senior_grade' setting", path.display())
        })?)?;

        Ok(())
    }

    fn grade_weight_by_name(&self, name: &str) -> Result<i32> {
        self.grades
            .values()
            .find(|g| g.name == name)
            .map(|g| g.weight)
            .with_context(|| format!("no grade named '{}' in grades.csv", name))
    }
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// CSV HELPERS
// ============================================================================

fn parse_forfeit_category(text: &str) -> Result<Option<ForfeitCategory>> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "medical" => Ok(Some(ForfeitCategory::MedicalCertificate)),
        "declared" => Ok(Some(ForfeitCategory::DeclaredWithdrawal)),
        "undeclared" => Ok(Some(ForfeitCategory::UndeclaredWithdrawal)),
        other => bail!("unrecognized forfeit category '{}'", other),
    }
}

fn parse_u32(text: &str, file: &str, line: usize, field: &str) -> Result<u32> {
    text.trim()
        .parse::<u32>()
        .with_context(|| format!("{}:{}: invalid {} '{}'", file, line, field, text))
}

/// Read all rows of a CSV file after checking that the header carries
/// exactly the expected columns, in order.
fn read_rows(path: &Path, columns: &[&str]) -> Result<Vec<(String, usize, Vec<String>)>> {
    let file_label = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("catalog file")
        .to_string();

    let file = File::open(path)
        .with_context(|| format!("failed to open catalog file {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("{}: unreadable header", file_label))?;
    let found: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if found.iter().map(String::as_str).ne(columns.iter().copied()) {
        bail!(
            "{}: expected columns [{}], found [{}]",
            file_label,
            columns.join(", "),
            found.join(", ")
        );
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("{}: unreadable row {}", file_label, index + 2))?;
        let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if fields.len() != columns.len() {
            bail!(
                "{}:{}: expected {} fields, found {}",
                file_label,
                index + 2,
                columns.len(),
                fields.len()
            );
        }
        rows.push((file_label.clone(), index + 2, fields));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_catalog_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let write = |name: &str, content: &str| {
            fs::write(dir.path().join(name), content).unwrap();
        };

        write(
            "grades.csv",
            "id,name,weight\n1,Registered,0\n2,C,1\n3,B,2\n4,A,3\n",
        );
        write(
            "settings.csv",
            "key,value\nhome_region,06\nqualified_grade,C\nsenior_grade,B\nadministrative_club,999\n",
        );
        write(
            "clubs.csv",
            "id,name,department\n101,CN Antibes,06\n102,ON Nice,06\n201,Dauphins Aix,13\n",
        );
        write(
            "duties.csv",
            "id,name,min_grade,departmental,regional\n\
             1,Referee,4,qualified,qualified\n\
             2,Timekeeper,2,registered,registered\n\
             3,Starter,3,qualified,registered\n",
        );
        write(
            "competition_types.csv",
            "id,description,level\n10,Departmental meeting,departmental\n20,Regional championship,regional\n",
        );
        write(
            "races.csv",
            "id,label,stroke,sex\n300,100m freestyle,freestyle,F\n301,4x50m medley,medley,M\n",
        );
        write(
            "disqualifications.csv",
            "id,code,label,category,relay_leg\n\
             5,DNS exc,Withdrawal with medical certificate,medical,\n\
             6,DNS dec,Declared withdrawal,declared,\n\
             7,DNS,Undeclared withdrawal,undeclared,\n\
             8,DSQ r2,Early takeover second relay,,2\n",
        );
        write("trainees.csv", "official_id,since,target_grade\n42,2015-09-01,3\n");

        dir
    }

    #[test]
    fn test_from_dir_loads_everything() {
        let dir = write_catalog_dir();
        let catalog = ReferenceCatalog::from_dir(dir.path()).unwrap();

        assert_eq!(catalog.club(101).unwrap().name, "CN Antibes");
        assert_eq!(catalog.grade(3).unwrap().weight, 2);
        assert_eq!(catalog.duty(1).unwrap().priority, 3 + 2 + 2);
        assert_eq!(
            catalog.competition_level(20),
            Some(CompetitionLevel::Regional)
        );
        assert_eq!(catalog.race(300).unwrap().sex, Sex::Female);
        assert_eq!(
            catalog.forfeit_category(5),
            Some(ForfeitCategory::MedicalCertificate)
        );
        assert_eq!(catalog.forfeit_category(8), None);
        assert_eq!(catalog.forfeit_category(0), None);
        assert_eq!(catalog.trainee(42).unwrap().target_grade, 3);
        assert_eq!(catalog.qualified_weight, 1);
        assert_eq!(catalog.senior_weight, 2);
        assert_eq!(catalog.administrative_club, Some(999));
        assert_eq!(catalog.home_region, "06");
    }

    #[test]
    fn test_header_mismatch_is_an_error() {
        let dir = write_catalog_dir();
        fs::write(
            dir.path().join("grades.csv"),
            "id,label,weight\n1,C,1\n",
        )
        .unwrap();

        let err = ReferenceCatalog::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("grades.csv"));
        assert!(err.to_string().contains("expected columns"));
    }

    #[test]
    fn test_unknown_grade_reference_is_an_error() {
        let dir = write_catalog_dir();
        fs::write(
            dir.path().join("duties.csv"),
            "id,name,min_grade,departmental,regional\n1,Referee,99,qualified,qualified\n",
        )
        .unwrap();

        let err = ReferenceCatalog::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("unknown grade id 99"));
    }
}
