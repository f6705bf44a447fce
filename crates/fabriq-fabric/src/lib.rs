//! fabriq-fabric — the boundary between planning and real hardware.
//!
//! Everything async lives here. The planner crates are pure computation;
//! this crate wraps the composable-fabric controller behind the
//! [`FabricClient`] trait, ships an in-memory [`SimFabric`] that enforces
//! the controller's legality rules, and executes plans action by action,
//! feeding notify events back into the [`Inventory`] as each action
//! commits.
//!
//! # Components
//!
//! - **`client`** — `FabricClient`, the controller operations the
//!   executor needs
//! - **`sim`** — `SimFabric`, an in-memory controller for tests and
//!   offline planning
//! - **`snapshot`** — `FabricSnapshot`, the on-disk fabric state document
//! - **`demand`** — `DemandSpec`, the on-disk demand document
//! - **`executor`** — `execute_plan` / `reconcile`
//! - **`error`** — per-concern error enums
//!
//! [`Inventory`]: fabriq_inventory::Inventory

pub mod client;
pub mod demand;
pub mod error;
pub mod executor;
pub mod sim;
pub mod snapshot;

pub use client::{FabricClient, FabricFuture};
pub use demand::{DemandSpec, Want};
pub use error::{DemandError, ExecutorError, FabricError, FabricResult, ReconcileError, SnapshotError};
pub use executor::{ExecutionSummary, execute_plan, reconcile};
pub use sim::SimFabric;
pub use snapshot::{DeviceRecord, FabricSnapshot, GroupRecord, MachineRecord};
