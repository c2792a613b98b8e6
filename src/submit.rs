//! The submit/callback seam between a form and the solver backend.
//!
//! A form builds a request payload, a [`SolverBackend`] turns it into a
//! [`SolverResponse`] however it likes, and the form handles that response
//! exactly once. Transport lives entirely on the backend side.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::decode::SolverResponse;
use crate::error::{PlannerError, Result};

pub trait ProblemForm {
    type Output;

    /// Backend routing key for this problem.
    fn problem_id(&self) -> &str;

    fn build_request(&self) -> Result<serde_json::Value>;

    fn handle_response(&self, response: &SolverResponse) -> Result<Self::Output>;
}

pub trait SolverBackend {
    fn solve(&self, problem_id: &str, payload: &serde_json::Value) -> Result<SolverResponse>;
}

/// Builds the request, calls the backend, and hands a successful response
/// to the form. Backend failures propagate without invoking the handler.
pub fn submit<F, B>(form: &F, backend: &B) -> Result<F::Output>
where
    F: ProblemForm + ?Sized,
    B: SolverBackend + ?Sized,
{
    let payload = form.build_request()?;
    info!(problem_id = form.problem_id(), "submitting to solver backend");

    let response = backend.solve(form.problem_id(), &payload).map_err(|e| {
        warn!(problem_id = form.problem_id(), error = %e, "solver backend failed");
        e
    })?;
    info!(
        problem_id = form.problem_id(),
        variables = response.len(),
        "solver response received"
    );

    form.handle_response(&response)
}

/// File-drop backend: writes `<dir>/<problem_id>.request.json` and answers
/// with the recorded `<dir>/<problem_id>.json`.
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    dir: PathBuf,
}

impl ReplayBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReplayBackend { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn request_path(&self, problem_id: &str) -> PathBuf {
        self.dir.join(format!("{}.request.json", problem_id))
    }

    pub fn response_path(&self, problem_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", problem_id))
    }
}

impl SolverBackend for ReplayBackend {
    fn solve(&self, problem_id: &str, payload: &serde_json::Value) -> Result<SolverResponse> {
        fs::write(self.request_path(problem_id), serde_json::to_vec_pretty(payload)?)?;

        let path = self.response_path(problem_id);
        let body = fs::read_to_string(&path).map_err(|e| PlannerError::Backend {
            problem_id: problem_id.to_string(),
            message: format!("no recorded response at {}: {}", path.display(), e),
        })?;
        let response = serde_json::from_str(&body).map_err(|e| PlannerError::Backend {
            problem_id: problem_id.to_string(),
            message: format!("response is not a JSON object of numbers: {}", e),
        })?;
        Ok(response)
    }
}
