//! Domain model for the modsync daemons.
//!
//! This crate holds the pure, I/O-free types shared by the state
//! synchronization daemons:
//! - `model` - hardware unit model (identity, slot, status, admin state)
//! - `key` - published-key grammar and entity-role classification
//! - `event` - configuration change events consumed from subscriptions
//! - `error` - platform and store error types
//!
//! Nothing in this crate touches the platform or the shared store; it
//! only defines the vocabulary the daemon crates speak.

pub mod error;
pub mod event;
pub mod key;
pub mod model;

pub use error::{PlatformError, StoreError};
pub use event::{ChangeEvent, ChangeOp};
pub use key::{chassis_key, ModuleRole, FIELD_ADMIN_STATUS, FIELD_DESC, FIELD_MODULE_COUNT,
              FIELD_OPER_STATUS, FIELD_SLOT};
pub use model::{AdminState, OperStatus, Unit, INVALID_SLOT, NOT_AVAILABLE};
