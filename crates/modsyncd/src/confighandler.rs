//! Config change events → admin-state commands.
//!
//! The [`ConfigEventHandler`] consumes events from one module config
//! channel and turns them into admin commands against the platform.
//! Commands are fire-and-forget: a rejected or failed command is
//! logged and the event is dropped, never retried - the next
//! notification for the same key re-attempts from scratch.

use std::sync::Arc;

use tracing::{error, info, trace, warn};

use modsync_core::{AdminState, ChangeEvent, ChangeOp, ModuleRole};

use crate::platform::Platform;

/// Translates module config change events into admin-state commands.
pub struct ConfigEventHandler {
    platform: Arc<dyn Platform>,
}

impl ConfigEventHandler {
    /// Creates a handler issuing commands through `platform`.
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    /// Applies one change event.
    ///
    /// A config entry for a unit is an explicit down request: `Set`
    /// commands the unit Down, `Delete` (entry removed) commands it
    /// back Up. Keys without a recognized role prefix are dropped
    /// before any platform call.
    pub fn apply(&self, event: &ChangeEvent) {
        if ModuleRole::of(&event.key).is_none() {
            error!(key = %event.key, "Config event key has no recognized role prefix; dropping");
            return;
        }

        let target = match event.op {
            ChangeOp::Set => AdminState::Down,
            ChangeOp::Delete => AdminState::Up,
            ChangeOp::Other => {
                trace!(key = %event.key, "Ignoring config event with unrecognized operation");
                return;
            }
        };

        let index = match self.platform.resolve_index(&event.key) {
            Ok(index) if index >= 0 => index as usize,
            Ok(index) => {
                warn!(key = %event.key, index, "Config event key did not resolve to a unit; dropping");
                return;
            }
            Err(e) => {
                warn!(key = %event.key, error = %e, "Index resolution failed; dropping config event");
                return;
            }
        };

        match self.platform.set_admin_state(index, target) {
            Ok(true) => info!(key = %event.key, state = %target, "Commanded admin state"),
            Ok(false) => warn!(key = %event.key, state = %target, "Driver rejected admin command"),
            Err(e) => warn!(key = %event.key, state = %target, error = %e, "Admin command failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{StaticPlatform, UnitFixture};
    use modsync_core::{OperStatus, PlatformError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn platform_with_card() -> Arc<StaticPlatform> {
        Arc::new(StaticPlatform::new(
            vec![UnitFixture::new(
                "LINE-CARD0",
                "line card",
                2,
                OperStatus::Online,
            )],
            Some(1),
            Some(1),
        ))
    }

    #[test]
    fn test_set_commands_down() {
        let platform = platform_with_card();
        let handler = ConfigEventHandler::new(platform.clone());

        handler.apply(&ChangeEvent::new("LINE-CARD0", ChangeOp::Set));
        assert_eq!(platform.admin_state(0), Some(AdminState::Down));
    }

    #[test]
    fn test_delete_commands_up() {
        let platform = platform_with_card();
        let handler = ConfigEventHandler::new(platform.clone());

        platform.set_admin_state(0, AdminState::Down).unwrap();
        handler.apply(&ChangeEvent::new("LINE-CARD0", ChangeOp::Delete));
        assert_eq!(platform.admin_state(0), Some(AdminState::Up));
    }

    #[test]
    fn test_other_op_is_ignored() {
        let platform = platform_with_card();
        let handler = ConfigEventHandler::new(platform.clone());

        handler.apply(&ChangeEvent::new("LINE-CARD0", ChangeOp::Other));
        assert_eq!(platform.admin_state(0), Some(AdminState::Up));
    }

    #[test]
    fn test_unresolvable_key_is_dropped() {
        let platform = platform_with_card();
        let handler = ConfigEventHandler::new(platform.clone());

        handler.apply(&ChangeEvent::new("LINE-CARD9", ChangeOp::Set));
        assert_eq!(platform.admin_state(0), Some(AdminState::Up));
    }

    /// Platform stub that counts every call, to prove malformed keys
    /// never reach it.
    #[derive(Default)]
    struct CountingPlatform {
        calls: AtomicUsize,
    }

    impl Platform for CountingPlatform {
        fn num_units(&self) -> Result<usize, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
        fn unit_name(&self, _: usize) -> Result<String, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("LINE-CARD0".to_string())
        }
        fn unit_description(&self, _: usize) -> Result<String, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PlatformError::NotImplemented)
        }
        fn unit_slot(&self, _: usize) -> Result<i32, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PlatformError::NotImplemented)
        }
        fn unit_oper_status(&self, _: usize) -> Result<OperStatus, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PlatformError::NotImplemented)
        }
        fn unit_admin_state(&self, _: usize) -> Result<AdminState, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PlatformError::NotImplemented)
        }
        fn set_admin_state(&self, _: usize, _: AdminState) -> Result<bool, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
        fn resolve_index(&self, _: &str) -> Result<i32, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
        fn assigned_slot(&self) -> Result<i32, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
        fn coordinator_slot(&self) -> Result<i32, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    #[test]
    fn test_malformed_key_never_reaches_platform() {
        let platform = Arc::new(CountingPlatform::default());
        let handler = ConfigEventHandler::new(platform.clone());

        handler.apply(&ChangeEvent::new("PSU0", ChangeOp::Set));
        handler.apply(&ChangeEvent::new("", ChangeOp::Delete));

        assert_eq!(platform.calls.load(Ordering::SeqCst), 0);
    }
}
