//! Scheduling form apps backed by an external optimization solver.
//!
//! The forms collect inputs (courses already taken, credit limits,
//! supplier lead times), hand a request payload to a solver backend, and
//! decode the flat variable map it returns into grid rows.
//!
//! - **`decode`**: solver response -> ordered schedule rows
//! - **`catalog`**: course reference data and degree requirements
//! - **`form`**: the course planner and supplier order forms
//! - **`submit`**: the form/backend seam
//! - **`display`**, **`export`**: text and CSV output
//! - **`web`**: actix-web pages and JSON API

pub mod catalog;
pub mod config;
pub mod decode;
pub mod display;
pub mod error;
pub mod export;
pub mod form;
pub mod logging;
pub mod submit;
pub mod web;

pub use error::{PlannerError, Result};
