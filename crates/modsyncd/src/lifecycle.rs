//! Startup ordering, main loop, and guaranteed teardown.
//!
//! The [`LifecycleController`] walks the daemon through its states:
//!
//! ```text
//! Init → PlatformLoaded → Publishing → Running → Draining → TornDown
//! ```
//!
//! Platform loading (the `Init → PlatformLoaded` edge) happens in the
//! binary before the controller is built; everything from the role
//! capability check onward lives here. The two fatal startup
//! conditions map to distinct process exit codes; every error after
//! the loop starts is absorbed and logged. Teardown runs
//! unconditionally on the way out so no published key outlives the
//! process.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::ChangeChannel;
use crate::confighandler::ConfigEventHandler;
use crate::mux::{EventMultiplexer, WaitOutcome};
use crate::platform::{slot_is_valid, Platform};
use crate::reconcile::Reconciler;

/// Exit code for a platform facade that could not be loaded.
pub const EXIT_PLATFORM_LOAD: u8 = 2;

/// Exit code for a platform lacking the role-determining capability.
pub const EXIT_NOT_SUPPORTED: u8 = 3;

/// Default bound on one multiplexed wait, and therefore the
/// reconciliation period and the worst-case shutdown latency.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fatal startup failures. Never retried; everything else is absorbed
/// per-cycle.
#[derive(Debug, Clone, Error)]
pub enum FatalError {
    /// The platform facade could not be acquired.
    #[error("platform load failed: {0}")]
    PlatformLoad(String),

    /// The platform cannot report the slots needed to determine this
    /// instance's role.
    #[error("platform not supported: {0}")]
    NotSupported(String),
}

impl FatalError {
    /// Distinct process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PlatformLoad(_) => EXIT_PLATFORM_LOAD,
            Self::NotSupported(_) => EXIT_NOT_SUPPORTED,
        }
    }
}

/// Orchestrates the daemon's main loop.
pub struct LifecycleController {
    platform: Arc<dyn Platform>,
    reconciler: Reconciler,
    mux: EventMultiplexer,
    handlers: Vec<ConfigEventHandler>,
    coordinator: Option<(ChangeChannel, ConfigEventHandler)>,
    wait_timeout: Duration,
}

impl LifecycleController {
    /// Creates a controller for an already-loaded platform.
    pub fn new(platform: Arc<dyn Platform>, reconciler: Reconciler) -> Self {
        Self {
            platform,
            reconciler,
            mux: EventMultiplexer::new(),
            handlers: Vec::new(),
            coordinator: None,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    /// Overrides the wait timeout / reconciliation period.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Registers a channel on the main loop with its dispatch handler.
    pub fn add_channel(&mut self, channel: ChangeChannel, handler: ConfigEventHandler) {
        self.mux.register(channel);
        self.handlers.push(handler);
    }

    /// Provides the channel/handler pair for the coordinator worker.
    ///
    /// The worker is only spawned when the role check designates this
    /// instance the coordinator; otherwise the pair is dropped unused.
    pub fn set_coordinator_channel(&mut self, channel: ChangeChannel, handler: ConfigEventHandler) {
        self.coordinator = Some((channel, handler));
    }

    /// Runs the daemon until `cancel` fires, then tears down.
    ///
    /// The role capability check runs before anything is published, so
    /// a fatal exit leaves no state behind. From the first publish
    /// onward the controller always reaches teardown.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), FatalError> {
        let is_coordinator = check_role(self.platform.as_ref())?;
        info!(is_coordinator, "Role capability check passed");

        // Publishing: one-time summary, then the first full pass.
        self.reconciler.publish_summary();
        self.reconciler.reconcile_all();

        let worker = if is_coordinator {
            self.coordinator.take().map(|(channel, handler)| {
                spawn_config_worker(channel, handler, self.wait_timeout, cancel.clone())
            })
        } else {
            None
        };

        info!(
            channels = self.mux.len(),
            period_secs = self.wait_timeout.as_secs_f64(),
            "Entering main loop"
        );

        loop {
            match self.mux.wait(self.wait_timeout, &cancel).await {
                WaitOutcome::Timeout => self.reconciler.run_cycle(),
                WaitOutcome::Ready(index) => self.dispatch(index),
                WaitOutcome::Cancelled => break,
            }
        }

        // Draining: stop the worker, then remove everything we published.
        info!("Stop requested; draining");
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                warn!(error = %e, "Config worker did not stop cleanly");
            }
        }
        self.reconciler.teardown();

        Ok(())
    }

    fn dispatch(&mut self, index: usize) {
        let Some(event) = self.mux.channel_mut(index).and_then(ChangeChannel::pop) else {
            debug!(index, "Ready channel had no event to pop");
            return;
        };
        match self.handlers.get(index) {
            Some(handler) => handler.apply(&event),
            None => warn!(index, key = %event.key, "No handler registered for channel"),
        }
    }
}

/// Determines whether this instance holds the coordinator role.
///
/// Both slots must be reported and valid; anything else means the
/// platform cannot support role-based operation at all.
fn check_role(platform: &dyn Platform) -> Result<bool, FatalError> {
    let assigned = platform
        .assigned_slot()
        .map_err(|e| FatalError::NotSupported(format!("assigned slot unavailable: {e}")))?;
    let coordinator = platform
        .coordinator_slot()
        .map_err(|e| FatalError::NotSupported(format!("coordinator slot unavailable: {e}")))?;

    if !slot_is_valid(assigned) {
        return Err(FatalError::NotSupported(format!(
            "assigned slot {assigned} is invalid"
        )));
    }
    if !slot_is_valid(coordinator) {
        return Err(FatalError::NotSupported(format!(
            "coordinator slot {coordinator} is invalid"
        )));
    }

    Ok(assigned == coordinator)
}

/// Spawns the coordinator's config worker: an independent multiplex
/// loop over the module config channel.
///
/// The worker shares no lock with the main loop; it relies on the
/// platform facade's operations being concurrency-safe and admin
/// commands being idempotent.
fn spawn_config_worker(
    channel: ChangeChannel,
    handler: ConfigEventHandler,
    wait_timeout: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut mux = EventMultiplexer::new();
        let index = mux.register(channel);
        info!("Config worker started");

        loop {
            match mux.wait(wait_timeout, &cancel).await {
                WaitOutcome::Ready(ready) if ready == index => {
                    if let Some(event) = mux.channel_mut(ready).and_then(ChangeChannel::pop) {
                        handler.apply(&event);
                    }
                }
                WaitOutcome::Ready(_) | WaitOutcome::Timeout => continue,
                WaitOutcome::Cancelled => break,
            }
        }

        debug!("Config worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{StaticPlatform, UnitFixture};
    use modsync_core::OperStatus;

    fn platform(assigned: Option<i32>, coordinator: Option<i32>) -> StaticPlatform {
        StaticPlatform::new(
            vec![UnitFixture::new(
                "SUPERVISOR0",
                "Supervisor",
                1,
                OperStatus::Online,
            )],
            assigned,
            coordinator,
        )
    }

    #[test]
    fn test_coordinator_when_slots_match() {
        assert!(check_role(&platform(Some(1), Some(1))).unwrap());
        assert!(!check_role(&platform(Some(2), Some(1))).unwrap());
    }

    #[test]
    fn test_missing_capability_is_fatal() {
        let err = check_role(&platform(None, Some(1))).unwrap_err();
        assert!(matches!(err, FatalError::NotSupported(_)));
        assert_eq!(err.exit_code(), EXIT_NOT_SUPPORTED);
    }

    #[test]
    fn test_invalid_slot_is_fatal() {
        let err = check_role(&platform(Some(-1), Some(1))).unwrap_err();
        assert!(matches!(err, FatalError::NotSupported(_)));

        let err = check_role(&platform(Some(1), Some(-4))).unwrap_err();
        assert!(matches!(err, FatalError::NotSupported(_)));
    }

    #[test]
    fn test_fatal_exit_codes_are_distinct() {
        let load = FatalError::PlatformLoad("no driver".to_string());
        let unsupported = FatalError::NotSupported("no slot".to_string());
        assert_ne!(load.exit_code(), unsupported.exit_code());
        assert_ne!(load.exit_code(), 0);
        assert_ne!(unsupported.exit_code(), 0);
    }
}
