//! Platform facade - the seam between the daemon and the hardware driver.
//!
//! The daemon never talks to hardware directly; it goes through the
//! [`Platform`] trait, injected at construction time. Any method may
//! report [`PlatformError::NotImplemented`], which callers treat as
//! "value unavailable" rather than a failure.
//!
//! [`StaticPlatform`] is the fixture-backed implementation used by the
//! binary (loaded from a TOML file) and by tests. Attributes omitted
//! from the fixture report `NotImplemented`, matching drivers that
//! leave optional capabilities unimplemented.

use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::debug;

use modsync_core::{AdminState, OperStatus, PlatformError, INVALID_SLOT};

/// Facade over the hardware/platform driver.
///
/// All methods take `&self`; implementations must be safe to call
/// concurrently from the main loop and the coordinator worker, and
/// admin-state commands must be idempotent.
pub trait Platform: Send + Sync {
    /// Total number of enumerable units.
    fn num_units(&self) -> Result<usize, PlatformError>;

    /// Unique name of the unit at `index`.
    fn unit_name(&self, index: usize) -> Result<String, PlatformError>;

    /// Human-readable description of the unit at `index`.
    fn unit_description(&self, index: usize) -> Result<String, PlatformError>;

    /// Physical slot of the unit at `index`.
    fn unit_slot(&self, index: usize) -> Result<i32, PlatformError>;

    /// Observed operational status of the unit at `index`.
    fn unit_oper_status(&self, index: usize) -> Result<OperStatus, PlatformError>;

    /// Current admin state of the unit at `index`.
    fn unit_admin_state(&self, index: usize) -> Result<AdminState, PlatformError>;

    /// Commands the unit at `index` into `state`.
    ///
    /// Returns whether the driver accepted the command.
    fn set_admin_state(&self, index: usize, state: AdminState) -> Result<bool, PlatformError>;

    /// Resolves a unit name to its enumeration index.
    ///
    /// Returns a negative index when the name is unknown.
    fn resolve_index(&self, name: &str) -> Result<i32, PlatformError>;

    /// Slot this daemon instance is running in.
    fn assigned_slot(&self) -> Result<i32, PlatformError>;

    /// Slot designated as the chassis coordinator.
    fn coordinator_slot(&self) -> Result<i32, PlatformError>;
}

/// One unit entry in a platform fixture.
///
/// Every attribute is optional; a missing attribute makes the
/// corresponding read report `NotImplemented`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitFixture {
    /// Unit name, e.g. `LINE-CARD0`.
    pub name: Option<String>,

    /// Identity EEPROM description.
    pub description: Option<String>,

    /// Physical slot number.
    pub slot: Option<i32>,

    /// Observed operational status.
    pub oper_status: Option<OperStatus>,
}

impl UnitFixture {
    /// Creates a fully-populated fixture unit.
    pub fn new(name: &str, description: &str, slot: i32, oper_status: OperStatus) -> Self {
        Self {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            slot: Some(slot),
            oper_status: Some(oper_status),
        }
    }

    /// Creates a fixture unit with only a name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

/// On-disk fixture format for [`StaticPlatform`].
#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    assigned_slot: Option<i32>,
    coordinator_slot: Option<i32>,

    #[serde(default, rename = "unit")]
    units: Vec<UnitFixture>,
}

/// Fixture-backed platform implementation.
///
/// Unit attributes are fixed at load time; admin state is mutable so
/// that admin commands round-trip, which is what the config event
/// handler needs and what tests observe.
pub struct StaticPlatform {
    units: Vec<UnitFixture>,
    admin: Mutex<Vec<AdminState>>,
    assigned_slot: Option<i32>,
    coordinator_slot: Option<i32>,
}

impl StaticPlatform {
    /// Creates a platform from in-memory fixture units.
    pub fn new(
        units: Vec<UnitFixture>,
        assigned_slot: Option<i32>,
        coordinator_slot: Option<i32>,
    ) -> Self {
        let admin = vec![AdminState::Up; units.len()];
        Self {
            units,
            admin: Mutex::new(admin),
            assigned_slot,
            coordinator_slot,
        }
    }

    /// Loads a platform fixture from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, PlatformError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PlatformError::Failed(format!("read {}: {e}", path.display())))?;
        let fixture: FixtureFile = toml::from_str(&raw)
            .map_err(|e| PlatformError::Failed(format!("parse {}: {e}", path.display())))?;

        debug!(
            path = %path.display(),
            units = fixture.units.len(),
            "Loaded platform fixture"
        );

        Ok(Self::new(
            fixture.units,
            fixture.assigned_slot,
            fixture.coordinator_slot,
        ))
    }

    /// Current admin state of a unit, for observation in tests and tooling.
    pub fn admin_state(&self, index: usize) -> Option<AdminState> {
        self.admin
            .lock()
            .ok()
            .and_then(|admin| admin.get(index).copied())
    }

    fn unit(&self, index: usize) -> Result<&UnitFixture, PlatformError> {
        self.units.get(index).ok_or(PlatformError::NoSuchUnit(index))
    }
}

impl Platform for StaticPlatform {
    fn num_units(&self) -> Result<usize, PlatformError> {
        Ok(self.units.len())
    }

    fn unit_name(&self, index: usize) -> Result<String, PlatformError> {
        self.unit(index)?
            .name
            .clone()
            .ok_or(PlatformError::NotImplemented)
    }

    fn unit_description(&self, index: usize) -> Result<String, PlatformError> {
        self.unit(index)?
            .description
            .clone()
            .ok_or(PlatformError::NotImplemented)
    }

    fn unit_slot(&self, index: usize) -> Result<i32, PlatformError> {
        self.unit(index)?.slot.ok_or(PlatformError::NotImplemented)
    }

    fn unit_oper_status(&self, index: usize) -> Result<OperStatus, PlatformError> {
        self.unit(index)?
            .oper_status
            .ok_or(PlatformError::NotImplemented)
    }

    fn unit_admin_state(&self, index: usize) -> Result<AdminState, PlatformError> {
        self.unit(index)?;
        self.admin
            .lock()
            .ok()
            .and_then(|admin| admin.get(index).copied())
            .ok_or(PlatformError::NoSuchUnit(index))
    }

    fn set_admin_state(&self, index: usize, state: AdminState) -> Result<bool, PlatformError> {
        self.unit(index)?;
        let mut admin = self
            .admin
            .lock()
            .map_err(|_| PlatformError::Failed("admin state lock poisoned".to_string()))?;
        match admin.get_mut(index) {
            Some(slot) => {
                *slot = state;
                Ok(true)
            }
            None => Err(PlatformError::NoSuchUnit(index)),
        }
    }

    fn resolve_index(&self, name: &str) -> Result<i32, PlatformError> {
        let found = self
            .units
            .iter()
            .position(|unit| unit.name.as_deref() == Some(name));
        Ok(found.map_or(-1, |index| index as i32))
    }

    fn assigned_slot(&self) -> Result<i32, PlatformError> {
        self.assigned_slot.ok_or(PlatformError::NotImplemented)
    }

    fn coordinator_slot(&self) -> Result<i32, PlatformError> {
        self.coordinator_slot.ok_or(PlatformError::NotImplemented)
    }
}

/// Returns true when `slot` is a usable slot number.
pub fn slot_is_valid(slot: i32) -> bool {
    slot != INVALID_SLOT && slot >= 0
}
