//! Modsync daemon - chassis module state synchronization.
//!
//! This crate provides the state-synchronization core for the modsync
//! daemon family:
//! - `platform` - facade over the hardware/platform driver
//! - `store` - shared key/value store table abstraction
//! - `channel` - change-notification subscription channels
//! - `mux` - bounded multiplexed wait across channels
//! - `reconcile` - periodic read-hardware → publish → integrity cycle
//! - `confighandler` - config change events → admin-state commands
//! - `lifecycle` - startup ordering, main loop, guaranteed teardown
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        modsyncd                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────┐  timeout   ┌──────────────────────────┐    │
//! │  │EventMultiplex│───────────▶│       Reconciler         │    │
//! │  │  (bounded)   │            │ enumerate → publish →    │    │
//! │  └──────┬───────┘            │ integrity check          │    │
//! │         │ ready              └───────────┬──────────────┘    │
//! │         ▼                                │ set/delete        │
//! │  ┌──────────────┐  admin cmds  ┌─────────▼──────────────┐    │
//! │  │ConfigEvent   │─────────────▶│   shared store tables  │    │
//! │  │Handler       │              │  (CHASSIS / MODULE)    │    │
//! │  └──────────────┘              └────────────────────────┘    │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The main loop is single-threaded and cooperative: it suspends only
//! inside the multiplexer's bounded wait, so a shutdown request is
//! observed at most one wait timeout late. When this instance holds
//! the coordinator role a second worker task runs its own multiplex
//! loop over the module config channel.

pub mod channel;
pub mod confighandler;
pub mod lifecycle;
pub mod mux;
pub mod platform;
pub mod reconcile;
pub mod store;
