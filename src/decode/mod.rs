//! Turns a flat solver response into ordered schedule rows.
//!
//! The backend answers with one binary variable per `(entity, slot)`
//! pair, e.g. `{"CS180_0": 1, "CS180_1": 0, "slack_3": 1}`. Decoding keeps
//! the variables set to exactly 1, drops solver-internal slack variables,
//! groups entities by slot and totals each slot's weight from a
//! [`ReferenceTable`].

pub mod key;
pub mod matrix;
pub mod rows;

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

pub use key::{AssignmentKey, SkipReason};
pub use matrix::decode_matrix;
pub use rows::{to_grid_rows, GridRow, ScheduleRow, SlotLabel, NO_PLAN_TEXT};

/// Raw solver output. Values are kept as JSON so that non-numeric
/// metadata in a response is ignored instead of failing deserialization.
pub type SolverResponse = BTreeMap<String, serde_json::Value>;

pub const DEFAULT_SLACK_PREFIX: &str = "slack_";

/// Immutable entity id -> weight lookup (course id -> credits).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable {
    weights: HashMap<String, f64>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: impl Into<String>, weight: f64) {
        self.weights.insert(entity.into(), weight);
    }

    pub fn weight(&self, entity: &str) -> Option<f64> {
        self.weights.get(entity).copied()
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.weights.contains_key(entity)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        ReferenceTable {
            weights: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// What to do with an assigned entity that the reference table does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownEntityPolicy {
    /// Keep it in the row, contributing 0 weight.
    #[default]
    ZeroWeight,
    /// Leave it out of the row.
    Drop,
    /// Fail in [`decode_checked`].
    Reject,
}

impl FromStr for UnknownEntityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "zero_weight" | "zero" => Ok(UnknownEntityPolicy::ZeroWeight),
            "drop" => Ok(UnknownEntityPolicy::Drop),
            "reject" => Ok(UnknownEntityPolicy::Reject),
            other => Err(format!(
                "unknown entity policy '{}' (expected zero-weight, drop or reject)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Keys starting with this are solver auxiliaries. Empty disables the filter.
    pub slack_prefix: String,
    pub unknown_entities: UnknownEntityPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            slack_prefix: DEFAULT_SLACK_PREFIX.to_string(),
            unknown_entities: UnknownEntityPolicy::default(),
        }
    }
}

impl DecodeOptions {
    pub fn with_slack_prefix(slack_prefix: impl Into<String>) -> Self {
        DecodeOptions {
            slack_prefix: slack_prefix.into(),
            ..Self::default()
        }
    }

    fn is_slack(&self, key: &str) -> bool {
        !self.slack_prefix.is_empty() && key.starts_with(&self.slack_prefix)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("entity '{entity}' in slot {slot} is not in the reference table")]
    UnknownEntity { entity: String, slot: SlotLabel },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedKey {
    pub key: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownEntity {
    pub entity: String,
    pub slot: SlotLabel,
}

/// Rows plus what was left out along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeReport {
    pub rows: Vec<ScheduleRow>,
    pub skipped: Vec<SkippedKey>,
    pub unknown_entities: Vec<UnknownEntity>,
}

impl DecodeReport {
    pub fn is_no_plan(&self) -> bool {
        matches!(self.rows.as_slice(), [row] if row.is_no_plan())
    }
}

fn is_assigned(value: &serde_json::Value) -> bool {
    value.as_f64() == Some(1.0)
}

/// Decodes `response` with the default unknown-entity policy.
///
/// Never fails: malformed keys are dropped and an empty result becomes
/// the single [`ScheduleRow::no_plan`] sentinel.
pub fn decode(response: &SolverResponse, table: &ReferenceTable, slack_prefix: &str) -> Vec<ScheduleRow> {
    decode_with_report(response, table, &DecodeOptions::with_slack_prefix(slack_prefix)).rows
}

pub fn decode_with_report(
    response: &SolverResponse,
    table: &ReferenceTable,
    options: &DecodeOptions,
) -> DecodeReport {
    let mut slots: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (key, value) in response {
        if !is_assigned(value) {
            continue;
        }
        if options.is_slack(key) {
            trace!(key = %key, "ignoring slack variable");
            continue;
        }
        match AssignmentKey::parse(key) {
            Ok(parsed) => slots.entry(parsed.slot).or_default().push(parsed.entity),
            Err(reason) => {
                debug!(key = %key, %reason, "skipping malformed solver key");
                skipped.push(SkippedKey {
                    key: key.clone(),
                    reason,
                });
            }
        }
    }

    let mut rows = Vec::with_capacity(slots.len());
    let mut unknown_entities = Vec::new();

    for (slot, entities) in slots {
        let label = SlotLabel::from_solver_slot(slot);
        let mut kept = Vec::with_capacity(entities.len());
        let mut total_weight = 0.0;

        for entity in entities {
            match table.weight(entity) {
                Some(weight) => {
                    total_weight += weight;
                    kept.push(entity.to_string());
                }
                None => {
                    warn!(entity = %entity, slot = %label, "assigned entity missing from reference table");
                    unknown_entities.push(UnknownEntity {
                        entity: entity.to_string(),
                        slot: label,
                    });
                    if options.unknown_entities != UnknownEntityPolicy::Drop {
                        kept.push(entity.to_string());
                    }
                }
            }
        }

        // A slot holding only dropped entities is not populated.
        if !kept.is_empty() {
            rows.push(ScheduleRow::new(slot, kept, total_weight));
        }
    }

    if rows.is_empty() {
        rows.push(ScheduleRow::no_plan());
    }

    DecodeReport {
        rows,
        skipped,
        unknown_entities,
    }
}

/// Like [`decode_with_report`], but fails on the first unknown entity
/// when the policy is [`UnknownEntityPolicy::Reject`].
pub fn decode_checked(
    response: &SolverResponse,
    table: &ReferenceTable,
    options: &DecodeOptions,
) -> Result<DecodeReport, DecodeError> {
    let report = decode_with_report(response, table, options);
    if options.unknown_entities == UnknownEntityPolicy::Reject {
        if let Some(first) = report.unknown_entities.first() {
            return Err(DecodeError::UnknownEntity {
                entity: first.entity.clone(),
                slot: first.slot,
            });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> SolverResponse {
        serde_json::from_value(value).unwrap()
    }

    fn credits() -> ReferenceTable {
        [("CS180", 4.0), ("MA161", 5.0), ("CS251", 3.0)].into_iter().collect()
    }

    #[test]
    fn groups_by_slot() {
        let r = response(json!({"CS180_0": 1, "MA161_0": 1, "CS251_1": 1, "slack_9": 1}));
        let rows = decode(&r, &credits(), "slack_");

        assert_eq!(
            rows,
            vec![
                ScheduleRow::new(0, vec!["CS180".into(), "MA161".into()], 9.0),
                ScheduleRow::new(1, vec!["CS251".into()], 3.0),
            ]
        );
    }

    #[test]
    fn empty_response_is_sentinel() {
        let rows = decode(&SolverResponse::new(), &credits(), "slack_");
        assert_eq!(rows, vec![ScheduleRow::no_plan()]);
    }

    #[test]
    fn non_numeric_suffix_is_sentinel() {
        let r = response(json!({"X_abc": 1}));
        let report = decode_with_report(&r, &credits(), &DecodeOptions::default());
        assert!(report.is_no_plan());
        assert_eq!(
            report.skipped,
            vec![SkippedKey {
                key: "X_abc".into(),
                reason: SkipReason::BadSlot
            }]
        );
    }

    #[test]
    fn only_exact_ones_count() {
        let r = response(json!({
            "CS180_0": 0, "MA161_0": 0.5, "CS251_1": 1.0, "CS180_2": true, "MA161_3": "1"
        }));
        let rows = decode(&r, &credits(), "slack_");
        assert_eq!(rows, vec![ScheduleRow::new(1, vec!["CS251".into()], 3.0)]);
    }

    #[test]
    fn slack_keys_excluded_even_when_set() {
        let r = response(json!({"slack_0": 1, "slack_CS180_1": 1}));
        assert_eq!(decode(&r, &credits(), "slack_"), vec![ScheduleRow::no_plan()]);
    }

    #[test]
    fn empty_slack_prefix_filters_nothing() {
        let r = response(json!({"slack_0": 1}));
        let rows = decode(&r, &ReferenceTable::new(), "");
        assert_eq!(rows, vec![ScheduleRow::new(0, vec!["slack".into()], 0.0)]);
    }

    #[test]
    fn rows_sorted_numerically() {
        // "10" sorts before "2" as a string; rows must not.
        let r = response(json!({"CS180_10": 1, "MA161_2": 1, "CS251_0": 1}));
        let rows = decode(&r, &credits(), "slack_");
        let slots: Vec<SlotLabel> = rows.iter().map(|r| r.slot).collect();
        assert_eq!(
            slots,
            vec![SlotLabel::Index(1), SlotLabel::Index(3), SlotLabel::Index(11)]
        );
    }

    #[test]
    fn unknown_entity_zero_weight() {
        let r = response(json!({"CS180_0": 1, "PHYS172_0": 1}));
        let report = decode_with_report(&r, &credits(), &DecodeOptions::default());
        assert_eq!(
            report.rows,
            vec![ScheduleRow::new(0, vec!["CS180".into(), "PHYS172".into()], 4.0)]
        );
        assert_eq!(report.unknown_entities.len(), 1);
        assert_eq!(report.unknown_entities[0].slot, SlotLabel::Index(1));
    }

    #[test]
    fn unknown_entity_drop() {
        let options = DecodeOptions {
            unknown_entities: UnknownEntityPolicy::Drop,
            ..DecodeOptions::default()
        };
        let r = response(json!({"CS180_0": 1, "PHYS172_0": 1, "PHYS172_1": 1}));
        let report = decode_with_report(&r, &credits(), &options);
        assert_eq!(report.rows, vec![ScheduleRow::new(0, vec!["CS180".into()], 4.0)]);
        assert_eq!(report.unknown_entities.len(), 2);
    }

    #[test]
    fn unknown_entity_reject() {
        let options = DecodeOptions {
            unknown_entities: UnknownEntityPolicy::Reject,
            ..DecodeOptions::default()
        };
        let r = response(json!({"CS180_0": 1, "PHYS172_4": 1}));
        let err = decode_checked(&r, &credits(), &options).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownEntity {
                entity: "PHYS172".into(),
                slot: SlotLabel::Index(5)
            }
        );

        let ok = response(json!({"CS180_0": 1}));
        assert!(decode_checked(&ok, &credits(), &options).is_ok());
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("zero-weight".parse::<UnknownEntityPolicy>(), Ok(UnknownEntityPolicy::ZeroWeight));
        assert_eq!("DROP".parse::<UnknownEntityPolicy>(), Ok(UnknownEntityPolicy::Drop));
        assert_eq!("reject".parse::<UnknownEntityPolicy>(), Ok(UnknownEntityPolicy::Reject));
        assert!("ignore".parse::<UnknownEntityPolicy>().is_err());
    }
}
