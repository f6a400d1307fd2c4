//! Concrete collaborators for the poll loop: gateways, stores and notifiers.
//!
//! - `FixtureGateway` serves Trådfri-style payload files from a directory.
//! - `SimulatedGateway` serves an in-memory scene.
//! - `CsvHistoryStore` and `JsonlSink` persist snapshots and baselines.
//! - `LogNotifier` and `AlertFileNotifier` deliver the escalation alert.

pub mod error;
pub mod fixture;
pub mod notify;
pub mod payload;
pub mod sim;
pub mod store;
pub mod util;

pub use error::GatewayError;
pub use fixture::FixtureGateway;
pub use notify::{AlertFileNotifier, LogNotifier};
pub use sim::SimulatedGateway;
pub use store::{CsvHistoryStore, JsonlSink};
