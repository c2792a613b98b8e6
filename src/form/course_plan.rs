use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Catalog;
use crate::decode::{decode_checked, DecodeOptions, DecodeReport, ScheduleRow, SolverResponse};
use crate::error::{PlannerError, Result};
use crate::submit::ProblemForm;

pub const COURSE_PLAN_PROBLEM_ID: &str = "course_plan";

pub const DEFAULT_MAX_SEMESTERS: u32 = 8;
pub const DEFAULT_MAX_CREDITS: u32 = 18;
pub const MAX_SEMESTERS_LIMIT: u32 = 12;
pub const MAX_CREDITS_LIMIT: u32 = 24;

/// Course planner inputs. Serializes directly as the backend request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePlanForm {
    #[serde(rename = "courses_taken", default)]
    pub taken: BTreeSet<String>,
    #[serde(default = "default_max_semesters")]
    pub max_semesters: u32,
    #[serde(default = "default_max_credits")]
    pub max_credits: u32,
}

fn default_max_semesters() -> u32 {
    DEFAULT_MAX_SEMESTERS
}

fn default_max_credits() -> u32 {
    DEFAULT_MAX_CREDITS
}

impl Default for CoursePlanForm {
    fn default() -> Self {
        CoursePlanForm {
            taken: BTreeSet::new(),
            max_semesters: DEFAULT_MAX_SEMESTERS,
            max_credits: DEFAULT_MAX_CREDITS,
        }
    }
}

impl CoursePlanForm {
    pub fn with_taken<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CoursePlanForm {
            taken: taken.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if !(1..=MAX_SEMESTERS_LIMIT).contains(&self.max_semesters) {
            return Err(PlannerError::Validation(format!(
                "Max semesters must be between 1 and {}",
                MAX_SEMESTERS_LIMIT
            )));
        }
        if !(1..=MAX_CREDITS_LIMIT).contains(&self.max_credits) {
            return Err(PlannerError::Validation(format!(
                "Max credits per semester must be between 1 and {}",
                MAX_CREDITS_LIMIT
            )));
        }
        if let Some(unknown) = self.taken.iter().find(|id| !catalog.contains(id)) {
            return Err(PlannerError::Validation(format!("Unknown course: {}", unknown)));
        }
        Ok(())
    }

    pub fn build_request(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn handle_response(
        &self,
        response: &SolverResponse,
        catalog: &Catalog,
        options: &DecodeOptions,
    ) -> Result<CoursePlan> {
        let report = decode_checked(response, &catalog.reference_table(), options)?;
        let plan = CoursePlan::new(report, self.max_credits);
        info!(
            semesters = plan.semester_count(),
            total_credits = plan.total_credits(),
            skipped = plan.report.skipped.len(),
            "decoded course plan"
        );
        Ok(plan)
    }
}

/// A decoded plan as shown in the output grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePlan {
    pub generated_at: DateTime<Utc>,
    pub max_credits: u32,
    #[serde(flatten)]
    pub report: DecodeReport,
}

impl CoursePlan {
    pub fn new(report: DecodeReport, max_credits: u32) -> Self {
        CoursePlan {
            generated_at: Utc::now(),
            max_credits,
            report,
        }
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.report.rows
    }

    pub fn is_no_plan(&self) -> bool {
        self.report.is_no_plan()
    }

    pub fn semester_count(&self) -> usize {
        if self.is_no_plan() {
            0
        } else {
            self.report.rows.len()
        }
    }

    pub fn total_credits(&self) -> f64 {
        self.report.rows.iter().map(|r| r.total_weight).sum()
    }

    /// Rows whose credit total exceeds the form's per-semester limit.
    pub fn overloaded(&self) -> impl Iterator<Item = &ScheduleRow> {
        let limit = f64::from(self.max_credits);
        self.report.rows.iter().filter(move |r| r.total_weight > limit)
    }
}

/// The course planner bound to its reference data, ready to submit.
#[derive(Debug, Clone)]
pub struct CoursePlanApp {
    pub catalog: Catalog,
    pub options: DecodeOptions,
    pub form: CoursePlanForm,
}

impl ProblemForm for CoursePlanApp {
    type Output = CoursePlan;

    fn problem_id(&self) -> &str {
        COURSE_PLAN_PROBLEM_ID
    }

    fn build_request(&self) -> Result<serde_json::Value> {
        self.form.validate(&self.catalog)?;
        self.form.build_request()
    }

    fn handle_response(&self, response: &SolverResponse) -> Result<CoursePlan> {
        self.form.handle_response(response, &self.catalog, &self.options)
    }
}
