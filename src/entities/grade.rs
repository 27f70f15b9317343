// Grade - ordered qualification tier for officials
//
// Grades come from the reference catalog (e.g. C, B, A plus a "merely
// registered" floor at weight 0). Two grades compare by weight alone:
// renaming a tier must not change how officials rank against thresholds.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::GradeId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub name: String,
    /// Ordering weight. 0 means registered but not creditable as official.
    pub weight: i32,
}

impl Grade {
    pub fn new(id: GradeId, name: impl Into<String>, weight: i32) -> Self {
        Grade {
            id,
            name: name.into(),
            weight,
        }
    }
}

// Equality and ordering are by weight only.
impl PartialEq for Grade {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}

impl Eq for Grade {}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Grade {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight.cmp(&other.weight)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
