//! Hardware unit model.
//!
//! A `Unit` is one addressable hardware entity (a chassis card, a
//! supervisor module). Units are not created or destroyed by the
//! daemons; they are re-derived from platform enumeration on every
//! reconciliation cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::key::{FIELD_ADMIN_STATUS, FIELD_DESC, FIELD_OPER_STATUS, FIELD_SLOT};

/// Sentinel for an unknown or unassigned slot.
pub const INVALID_SLOT: i32 = -1;

/// Placeholder published when an attribute read is unsupported.
pub const NOT_AVAILABLE: &str = "N/A";

/// Observed operational status of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OperStatus {
    /// Unit is present and functional.
    Online,

    /// Unit is present but not functional (or powered down).
    Offline,

    /// Status could not be determined.
    Unknown,
}

impl OperStatus {
    /// Wire representation used in published records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
            Self::Unknown => "Unknown",
        }
    }
}

impl Default for OperStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for OperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operator-commanded admin state, distinct from observed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminState {
    /// Unit is administratively enabled.
    Up,

    /// Unit is administratively disabled.
    Down,
}

impl AdminState {
    /// Wire representation used in published records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl Default for AdminState {
    fn default() -> Self {
        Self::Up
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One addressable hardware entity as read from the platform.
///
/// `name` is the globally unique identity and doubles as the publish
/// key; the remaining attributes are best-effort reads that may have
/// been substituted with [`NOT_AVAILABLE`] / [`INVALID_SLOT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique name, e.g. `LINE-CARD0`. Must carry a recognized role prefix.
    pub name: String,

    /// Human-readable description from the identity EEPROM.
    pub description: String,

    /// Physical slot number, [`INVALID_SLOT`] if unknown.
    pub slot: i32,

    /// Observed operational status.
    pub oper_status: OperStatus,

    /// Operator-commanded admin state, `None` when the driver cannot report it.
    pub admin_state: Option<AdminState>,
}

impl Unit {
    /// Creates a unit with placeholder attributes for everything but the name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: NOT_AVAILABLE.to_string(),
            slot: INVALID_SLOT,
            oper_status: OperStatus::Unknown,
            admin_state: None,
        }
    }

    /// Renders this unit as the field/value pairs of its published record.
    ///
    /// Unavailable attributes render as [`NOT_AVAILABLE`] so that the
    /// record shape is identical regardless of driver capabilities.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let slot = if self.slot == INVALID_SLOT {
            NOT_AVAILABLE.to_string()
        } else {
            self.slot.to_string()
        };
        let admin = self
            .admin_state
            .map_or(NOT_AVAILABLE, |state| state.as_str())
            .to_string();
        vec![
            (FIELD_DESC.to_string(), self.description.clone()),
            (FIELD_SLOT.to_string(), slot),
            (FIELD_OPER_STATUS.to_string(), self.oper_status.as_str().to_string()),
            (FIELD_ADMIN_STATUS.to_string(), admin),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oper_status_display() {
        assert_eq!(OperStatus::Online.to_string(), "Online");
        assert_eq!(OperStatus::Offline.to_string(), "Offline");
        assert_eq!(OperStatus::Unknown.to_string(), "Unknown");
        assert_eq!(OperStatus::default(), OperStatus::Unknown);
    }

    #[test]
    fn test_admin_state_display() {
        assert_eq!(AdminState::Up.to_string(), "up");
        assert_eq!(AdminState::Down.to_string(), "down");
        assert_eq!(AdminState::default(), AdminState::Up);
    }

    #[test]
    fn test_unit_named_defaults() {
        let unit = Unit::named("LINE-CARD0");
        assert_eq!(unit.name, "LINE-CARD0");
        assert_eq!(unit.description, NOT_AVAILABLE);
        assert_eq!(unit.slot, INVALID_SLOT);
        assert_eq!(unit.oper_status, OperStatus::Unknown);
        assert_eq!(unit.admin_state, None);
    }

    #[test]
    fn test_unit_fields_with_placeholders() {
        let unit = Unit::named("LINE-CARD0");
        let fields = unit.to_fields();
        assert!(fields.contains(&("desc".to_string(), NOT_AVAILABLE.to_string())));
        assert!(fields.contains(&("slot".to_string(), NOT_AVAILABLE.to_string())));
        assert!(fields.contains(&("oper_status".to_string(), "Unknown".to_string())));
        assert!(fields.contains(&("admin_status".to_string(), NOT_AVAILABLE.to_string())));
    }

    #[test]
    fn test_unit_fields_fully_populated() {
        let unit = Unit {
            name: "LINE-CARD1".to_string(),
            description: "32x100G line card".to_string(),
            slot: 2,
            oper_status: OperStatus::Online,
            admin_state: Some(AdminState::Down),
        };
        let fields = unit.to_fields();
        assert!(fields.contains(&("slot".to_string(), "2".to_string())));
        assert!(fields.contains(&("oper_status".to_string(), "Online".to_string())));
        assert!(fields.contains(&("admin_status".to_string(), "down".to_string())));
    }
}
