use std::fmt;

use serde::Serialize;

/// A solver variable name of the form `<entity>_<slot>`.
///
/// The entity part is opaque and may itself contain underscores, so the
/// split always happens at the last one: `GENED_EASY_3` is entity
/// `GENED_EASY` in slot 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentKey<'a> {
    pub entity: &'a str,
    /// 0-based slot as the solver numbers it.
    pub slot: u32,
}

/// Why a key with an "assigned" value was left out of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoSeparator,
    EmptyEntity,
    BadSlot,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoSeparator => "no '_' separator",
            SkipReason::EmptyEntity => "empty entity id",
            SkipReason::BadSlot => "slot suffix is not a non-negative integer",
        };
        f.write_str(text)
    }
}

impl<'a> AssignmentKey<'a> {
    pub fn parse(key: &'a str) -> Result<Self, SkipReason> {
        let (entity, raw_slot) = key.rsplit_once('_').ok_or(SkipReason::NoSeparator)?;

        if entity.is_empty() {
            return Err(SkipReason::EmptyEntity);
        }
        // Digits only: `str::parse` would also take a leading '+'.
        if raw_slot.is_empty() || !raw_slot.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SkipReason::BadSlot);
        }
        let slot = raw_slot.parse::<u32>().map_err(|_| SkipReason::BadSlot)?;

        Ok(AssignmentKey { entity, slot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_last_underscore() {
        let key = AssignmentKey::parse("A_B_2").unwrap();
        assert_eq!(key.entity, "A_B");
        assert_eq!(key.slot, 2);
    }

    #[test]
    fn plain_key() {
        let key = AssignmentKey::parse("CS180_0").unwrap();
        assert_eq!(key, AssignmentKey { entity: "CS180", slot: 0 });
    }

    #[test]
    fn entity_with_spaces() {
        let key = AssignmentKey::parse("CS 18000_7").unwrap();
        assert_eq!(key.entity, "CS 18000");
        assert_eq!(key.slot, 7);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(AssignmentKey::parse("CS180"), Err(SkipReason::NoSeparator));
        assert_eq!(AssignmentKey::parse("_3"), Err(SkipReason::EmptyEntity));
        assert_eq!(AssignmentKey::parse("X_abc"), Err(SkipReason::BadSlot));
        assert_eq!(AssignmentKey::parse("X_"), Err(SkipReason::BadSlot));
        assert_eq!(AssignmentKey::parse("X_-1"), Err(SkipReason::BadSlot));
        assert_eq!(AssignmentKey::parse("X_+1"), Err(SkipReason::BadSlot));
        assert_eq!(AssignmentKey::parse("X_1.5"), Err(SkipReason::BadSlot));
    }

    #[test]
    fn rejects_slot_overflow() {
        assert_eq!(AssignmentKey::parse("X_99999999999"), Err(SkipReason::BadSlot));
    }
}
