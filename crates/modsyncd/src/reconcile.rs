//! Periodic reconciliation of platform state into the shared store.
//!
//! The [`Reconciler`] owns the publish lifecycle for two tables: the
//! chassis summary table (one record, unit count) and the module table
//! (one record per enumerated unit, keyed by unit name). Each cycle
//! re-derives the authoritative snapshot from the platform and
//! publishes it idempotently; an integrity check detects external
//! tampering with the module table and forces a full republish.
//!
//! All per-cycle failures here are recoverable: they are logged,
//! the affected record or cycle is skipped, and the next period
//! retries from scratch.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use modsync_core::{chassis_key, ModuleRole, Unit, FIELD_MODULE_COUNT, INVALID_SLOT};

use crate::platform::Platform;
use crate::store::Table;

/// Chassis number used in the summary key. Single-chassis deployment.
const CHASSIS_INDEX: u32 = 1;

/// Mirrors platform unit state into the shared store.
pub struct Reconciler {
    platform: Arc<dyn Platform>,
    chassis_table: Arc<dyn Table>,
    module_table: Arc<dyn Table>,

    /// Keys published by the last successful pass, for integrity
    /// comparison and orphan cleanup. Rebuilt every cycle.
    published: HashSet<String>,
}

impl Reconciler {
    /// Creates a reconciler over the given platform and store tables.
    pub fn new(
        platform: Arc<dyn Platform>,
        chassis_table: Arc<dyn Table>,
        module_table: Arc<dyn Table>,
    ) -> Self {
        Self {
            platform,
            chassis_table,
            module_table,
            published: HashSet::new(),
        }
    }

    /// Keys currently believed published in the module table.
    pub fn published_keys(&self) -> &HashSet<String> {
        &self.published
    }

    /// Publishes the chassis summary record (total unit count).
    ///
    /// A platform reporting zero units is a misconfiguration, not a
    /// valid empty chassis; it is logged as an error and nothing is
    /// published.
    pub fn publish_summary(&mut self) {
        let count = match self.platform.num_units() {
            Ok(0) => {
                error!("Platform reports zero units; not publishing chassis summary");
                return;
            }
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Unit enumeration failed; not publishing chassis summary");
                return;
            }
        };

        let key = chassis_key(CHASSIS_INDEX);
        let fields = vec![(FIELD_MODULE_COUNT.to_string(), count.to_string())];
        match self.chassis_table.set(&key, &fields) {
            Ok(()) => info!(key = %key, units = count, "Published chassis summary"),
            Err(e) => warn!(key = %key, error = %e, "Failed to publish chassis summary"),
        }
    }

    /// Runs one full publish pass over every enumerated unit.
    ///
    /// After this pass the module table's key set equals the current
    /// enumeration result: records are published for every unit with a
    /// valid name, and keys left over from units that disappeared are
    /// deleted.
    pub fn reconcile_all(&mut self) {
        let count = match self.platform.num_units() {
            Ok(0) => {
                error!("Platform reports zero units; skipping this cycle");
                return;
            }
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Unit enumeration failed; skipping this cycle");
                return;
            }
        };

        let mut current = HashSet::with_capacity(count);
        for index in 0..count {
            let Some(unit) = self.read_unit(index) else {
                continue;
            };
            match self.module_table.set(&unit.name, &unit.to_fields()) {
                Ok(()) => {
                    current.insert(unit.name);
                }
                Err(e) => warn!(key = %unit.name, error = %e, "Failed to publish module record"),
            }
        }

        for orphan in self.published.difference(&current) {
            debug!(key = %orphan, "Removing record for unit no longer enumerated");
            if let Err(e) = self.module_table.delete(orphan) {
                warn!(key = %orphan, error = %e, "Failed to delete orphan record");
            }
        }

        debug!(units = current.len(), "Reconciliation pass complete");
        self.published = current;
    }

    /// Compares the live module-table key set against the last
    /// captured snapshot; on divergence forces an immediate full
    /// republish. Returns whether a resync was forced.
    ///
    /// This is intentionally cheap when nothing changed: one key
    /// listing, no attribute reads.
    pub fn check_integrity(&mut self) -> bool {
        if self.published.is_empty() {
            return false;
        }

        let live: HashSet<String> = match self.module_table.list_keys() {
            Ok(keys) => keys.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, "Key listing failed; skipping integrity check");
                return false;
            }
        };

        let intact = live.len() == self.published.len()
            && self.published.iter().all(|key| live.contains(key));
        if intact {
            return false;
        }

        warn!(
            expected = self.published.len(),
            found = live.len(),
            "Published key set diverged from expectation; forcing full resync"
        );

        // Keys we never published (an external writer's leftovers) are
        // removed so the table converges back to the enumeration result.
        for foreign in live.difference(&self.published) {
            warn!(key = %foreign, "Removing key not published by this process");
            if let Err(e) = self.module_table.delete(foreign) {
                warn!(key = %foreign, error = %e, "Failed to delete foreign key");
            }
        }

        self.reconcile_all();
        true
    }

    /// One periodic pass: integrity check first, then the normal
    /// unconditional publish unless the check already republished.
    pub fn run_cycle(&mut self) {
        if !self.check_integrity() {
            self.reconcile_all();
        }
    }

    /// Deletes every record this reconciler is responsible for,
    /// including the chassis summary.
    ///
    /// Best-effort by design: individual delete failures are logged
    /// and the remaining keys are still attempted.
    pub fn teardown(&mut self) {
        for key in self.published.drain() {
            if let Err(e) = self.module_table.delete(&key) {
                warn!(key = %key, error = %e, "Failed to delete module record during teardown");
            }
        }

        let key = chassis_key(CHASSIS_INDEX);
        if let Err(e) = self.chassis_table.delete(&key) {
            warn!(key = %key, error = %e, "Failed to delete chassis summary during teardown");
        }

        info!("Published state torn down");
    }

    /// Reads one unit's attributes with independent fault isolation.
    ///
    /// A failed name read or an unrecognized role prefix skips the
    /// unit entirely (the name is the publish key); any other failed
    /// attribute degrades to its placeholder.
    fn read_unit(&self, index: usize) -> Option<Unit> {
        let name = match self.platform.unit_name(index) {
            Ok(name) => name,
            Err(e) => {
                error!(index, error = %e, "Unit name unavailable; skipping unit");
                return None;
            }
        };
        if ModuleRole::of(&name).is_none() {
            error!(index, name = %name, "Unit name has no recognized role prefix; skipping unit");
            return None;
        }

        let mut unit = Unit::named(name);
        if let Ok(description) = self.platform.unit_description(index) {
            unit.description = description;
        }
        unit.slot = self.platform.unit_slot(index).unwrap_or(INVALID_SLOT);
        if let Ok(status) = self.platform.unit_oper_status(index) {
            unit.oper_status = status;
        }
        unit.admin_state = self.platform.unit_admin_state(index).ok();
        Some(unit)
    }
}
