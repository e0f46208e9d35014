use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

/// Read-only name-to-id lookup tables for groups and staff, loaded once at
/// startup. A missing or malformed file degrades to an empty table; the
/// schedule endpoints do not depend on it.
#[derive(Debug, Default)]
pub struct Directory {
    groups: BTreeMap<String, String>,
    staff: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DirectoryMatch {
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MatchKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Group,
    Teacher,
}

impl Directory {
    pub fn new(groups: BTreeMap<String, String>, staff: BTreeMap<String, String>) -> Self {
        Self { groups, staff }
    }

    pub fn load(groups_file: &Path, staff_file: &Path) -> Self {
        Self {
            groups: load_table(groups_file, "groups"),
            staff: load_table(staff_file, "teachers"),
        }
    }

    /// Case-insensitive substring search over both tables, groups first.
    pub fn search(&self, query: &str) -> Vec<DirectoryMatch> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for (name, id) in &self.groups {
            if name.to_lowercase().contains(&needle) {
                matches.push(DirectoryMatch {
                    name: name.clone(),
                    id: id.clone(),
                    kind: MatchKind::Group,
                });
            }
        }
        for (name, id) in &self.staff {
            if name.to_lowercase().contains(&needle) {
                matches.push(DirectoryMatch {
                    name: name.clone(),
                    id: id.clone(),
                    kind: MatchKind::Teacher,
                });
            }
        }
        matches
    }
}

fn load_table(path: &Path, label: &str) -> BTreeMap<String, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read {label} lookup file");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
        Ok(table) => {
            info!(path = %path.display(), count = table.len(), "loaded {label} lookup table");
            table
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to parse {label} lookup file");
            BTreeMap::new()
        }
    }
}
