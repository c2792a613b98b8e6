use std::fmt;

use serde::{Serialize, Serializer};

/// Text shown in place of entities when the solver assigned nothing.
pub const NO_PLAN_TEXT: &str = "Degree Completed or No Plan Found";

/// Display label of a schedule row: a 1-based slot number, or "N/A" on
/// the sentinel row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SlotLabel {
    Index(u64),
    NotAvailable,
}

impl SlotLabel {
    /// Label for a 0-based solver slot.
    pub fn from_solver_slot(slot: u32) -> Self {
        SlotLabel::Index(u64::from(slot) + 1)
    }
}

impl Serialize for SlotLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SlotLabel::Index(n) => serializer.serialize_u64(*n),
            SlotLabel::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

impl fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotLabel::Index(n) => f.pad(&n.to_string()),
            SlotLabel::NotAvailable => f.pad("N/A"),
        }
    }
}

/// One populated slot of a decoded schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    #[serde(rename = "slotIndex")]
    pub slot: SlotLabel,
    pub entities: Vec<String>,
    pub total_weight: f64,
}

impl ScheduleRow {
    pub fn new(slot: u32, entities: Vec<String>, total_weight: f64) -> Self {
        ScheduleRow {
            slot: SlotLabel::from_solver_slot(slot),
            entities,
            total_weight,
        }
    }

    /// The sentinel row returned when nothing was assigned.
    pub fn no_plan() -> Self {
        ScheduleRow {
            slot: SlotLabel::NotAvailable,
            entities: Vec::new(),
            total_weight: 0.0,
        }
    }

    pub fn is_no_plan(&self) -> bool {
        self.slot == SlotLabel::NotAvailable
    }

    pub fn to_grid_row(&self) -> GridRow {
        let entities = if self.is_no_plan() {
            NO_PLAN_TEXT.to_string()
        } else {
            self.entities.join(", ")
        };
        GridRow {
            slot_index: self.slot,
            entities,
            total_weight: self.total_weight,
        }
    }
}

/// Flattened row as the output grid renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub slot_index: SlotLabel,
    pub entities: String,
    pub total_weight: f64,
}

pub fn to_grid_rows(rows: &[ScheduleRow]) -> Vec<GridRow> {
    rows.iter().map(ScheduleRow::to_grid_row).collect()
}
