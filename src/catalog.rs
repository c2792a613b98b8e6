use csv::Reader;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decode::ReferenceTable;
use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub credits: u32,
    pub prereqs: Vec<String>,
}

/// A degree requirement: one specific course, or any one of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "courses", rename_all = "snake_case")]
pub enum Requirement {
    Single(String),
    Choice(Vec<String>),
}

impl Requirement {
    pub fn options(&self) -> &[String] {
        match self {
            Requirement::Single(id) => std::slice::from_ref(id),
            Requirement::Choice(ids) => ids,
        }
    }

    pub fn is_satisfied_by(&self, taken: &BTreeSet<String>) -> bool {
        self.options().iter().any(|id| taken.contains(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub courses: Vec<Course>,
    pub requirements: Vec<Requirement>,
}

fn course(id: &str, name: &str, credits: u32, prereqs: &[&str]) -> Course {
    Course {
        id: id.to_string(),
        name: name.to_string(),
        credits,
        prereqs: prereqs.iter().map(|p| p.to_string()).collect(),
    }
}

fn single(id: &str) -> Requirement {
    Requirement::Single(id.to_string())
}

fn choice(ids: &[&str]) -> Requirement {
    Requirement::Choice(ids.iter().map(|id| id.to_string()).collect())
}

/// Label of a `choice:<label>` requirement cell, prefix matched without case.
fn choice_label(cell: &str) -> Option<&str> {
    let (kind, label) = cell.split_once(':')?;
    kind.trim().eq_ignore_ascii_case("choice").then(|| label.trim())
}

impl Catalog {
    /// Built-in Purdue CS proof-of-concept catalog.
    pub fn purdue_cs() -> Self {
        let courses = vec![
            course("CS180", "Intro to CS", 4, &[]),
            course("CS182", "Discrete Math", 3, &["CS180"]),
            course("CS240", "C Programming", 3, &["CS180"]),
            course("CS250", "Comp Arch", 4, &["CS180"]),
            course("CS251", "Data Structures", 3, &["CS182", "CS250"]),
            course("CS252", "Systems Prog", 4, &["CS250"]),
            course("CS307", "Software Eng", 3, &["CS182", "CS240"]),
            course("CS354", "Operating Sys", 3, &["CS250"]),
            course("MA161", "Calc I", 5, &[]),
            course("MA162", "Calc II", 5, &["MA161"]),
            course("MA261", "Multivariate", 4, &["MA162"]),
            course("MA265", "Linear Alg (Std)", 3, &["MA162"]),
            course("MA351", "Linear Alg (Adv)", 4, &["MA162"]),
            course("ENGL106", "First Year Comp", 4, &[]),
            course("COM114", "Speech", 3, &[]),
            course("GENED_EASY", "Easy Gen Ed", 1, &[]),
            course("GENED_HARD", "Hard Gen Ed", 3, &[]),
        ];
        let requirements = vec![
            single("CS180"),
            single("CS182"),
            single("CS240"),
            single("CS250"),
            single("CS251"),
            single("CS252"),
            single("MA161"),
            single("MA162"),
            single("MA261"),
            choice(&["MA265", "MA351"]),
            single("ENGL106"),
            single("COM114"),
            single("CS307"),
            single("CS354"),
            choice(&["GENED_EASY", "GENED_HARD"]),
        ];
        Catalog {
            courses,
            requirements,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Course id -> credits, for totalling decoded semesters.
    pub fn reference_table(&self) -> ReferenceTable {
        self.courses
            .iter()
            .map(|c| (c.id.clone(), f64::from(c.credits)))
            .collect()
    }

    /// Requirement groups not yet covered by `taken`, in catalog order.
    pub fn remaining_requirements(&self, taken: &BTreeSet<String>) -> Vec<Requirement> {
        self.requirements
            .iter()
            .filter(|r| !r.is_satisfied_by(taken))
            .cloned()
            .collect()
    }

    /// Loads a catalog from CSV.
    ///
    /// Columns: `id,name,credits,prereqs,requirement`. `prereqs` is a
    /// `;`-separated list. `requirement` is empty (elective), `required`,
    /// or `choice:<label>`; courses sharing a label form one group.
    pub fn from_csv<P: AsRef<Path>>(csv_path: P) -> Result<Self> {
        let reader = Reader::from_path(csv_path.as_ref())?;
        let catalog = Self::from_reader(reader)?;
        info!(
            path = %csv_path.as_ref().display(),
            courses = catalog.courses.len(),
            requirements = catalog.requirements.len(),
            "loaded course catalog"
        );
        Ok(catalog)
    }

    pub fn from_reader<R: std::io::Read>(mut reader: Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| PlannerError::Catalog {
                    row: 0,
                    message: format!("missing '{}' column", name),
                })
        };
        let id_col = column("id")?;
        let name_col = column("name")?;
        let credits_col = column("credits")?;
        let prereqs_col = headers.iter().position(|h| h.trim().eq_ignore_ascii_case("prereqs"));
        let requirement_col = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("requirement"));

        let mut courses: Vec<Course> = Vec::new();
        let mut seen = HashSet::new();
        let mut requirements: Vec<Requirement> = Vec::new();
        // choice label -> index into `requirements`
        let mut choice_groups: HashMap<String, usize> = HashMap::new();

        for (index, result) in reader.records().enumerate() {
            let record = result?;
            // Header is row 1.
            let row = index + 2;

            let id = record.get(id_col).unwrap_or("").trim().to_string();
            if id.is_empty() {
                debug!(row, "skipping catalog row without an id");
                continue;
            }
            if !seen.insert(id.clone()) {
                return Err(PlannerError::Catalog {
                    row,
                    message: format!("duplicate course id '{}'", id),
                });
            }

            let name = record.get(name_col).unwrap_or("").trim().to_string();
            let raw_credits = record.get(credits_col).unwrap_or("").trim();
            let credits = raw_credits.parse::<u32>().map_err(|_| PlannerError::Catalog {
                row,
                message: format!("credits '{}' for '{}' is not a whole number", raw_credits, id),
            })?;

            let prereqs: Vec<String> = prereqs_col
                .and_then(|c| record.get(c))
                .map(|raw| {
                    raw.split(';')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            let requirement = requirement_col.and_then(|c| record.get(c)).unwrap_or("").trim();
            if requirement.eq_ignore_ascii_case("required") {
                requirements.push(Requirement::Single(id.clone()));
            } else if let Some(label) = choice_label(requirement) {
                let label = label.to_string();
                match choice_groups.get(&label) {
                    Some(&at) => {
                        if let Requirement::Choice(ids) = &mut requirements[at] {
                            ids.push(id.clone());
                        }
                    }
                    None => {
                        choice_groups.insert(label, requirements.len());
                        requirements.push(Requirement::Choice(vec![id.clone()]));
                    }
                }
            } else if !requirement.is_empty() {
                return Err(PlannerError::Catalog {
                    row,
                    message: format!("unrecognised requirement '{}' for '{}'", requirement, id),
                });
            }

            courses.push(Course {
                id,
                name,
                credits,
                prereqs,
            });
        }

        let catalog = Catalog {
            courses,
            requirements,
        };
        catalog.check_prereqs()?;
        Ok(catalog)
    }

    fn check_prereqs(&self) -> Result<()> {
        for (index, course) in self.courses.iter().enumerate() {
            if let Some(missing) = course.prereqs.iter().find(|p| !self.contains(p)) {
                return Err(PlannerError::Catalog {
                    row: index + 2,
                    message: format!("'{}' lists unknown prerequisite '{}'", course.id, missing),
                });
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::purdue_cs()
    }
}
