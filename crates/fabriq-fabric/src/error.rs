//! Fabric boundary error types.

use fabriq_inventory::InventoryError;
use fabriq_model::{MachineId, ResourceModel};
use fabriq_planner::PlanError;
use thiserror::Error;

/// Errors a fabric controller can answer with.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error("no device named {0} on the fabric")]
    UnknownDevice(String),

    #[error("no machine {0} on the fabric")]
    UnknownMachine(MachineId),

    #[error("device {device} is not attached to machine {machine}")]
    DeviceNotOnMachine { device: String, machine: MachineId },

    #[error("fabric state error: {0}")]
    State(#[from] InventoryError),
}

pub type FabricResult<T> = Result<T, FabricError>;

/// Errors reading, writing, or validating a snapshot document.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("snapshot encode error: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("snapshot is not internally consistent: {0}")]
    Invalid(#[from] InventoryError),
}

/// Errors reading or resolving a demand document. Everything here is
/// caught before allocation starts.
#[derive(Debug, Error)]
pub enum DemandError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("demand parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("demand names unknown group {0:?}")]
    UnknownGroup(String),

    #[error("demand names unknown machine {0:?}")]
    UnknownMachine(String),

    #[error("machine {machine:?} is not in group {group:?}")]
    MachineNotInGroup { machine: String, group: String },

    #[error("negative count {count} for machine {machine:?}")]
    NegativeCount { machine: String, count: i64 },

    #[error("machine {machine:?} asks for a model without a vendor")]
    ModelWithoutVendor { machine: String },

    #[error("machine {machine:?} lists {model} twice")]
    DuplicateWant { machine: String, model: ResourceModel },
}

/// Errors aborting plan execution. The index names the first action that
/// failed; everything before it committed.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("fabric rejected action {index}: {source}")]
    Fabric { index: usize, source: FabricError },

    #[error("inventory rejected action {index}: {source}")]
    Inventory {
        index: usize,
        source: InventoryError,
    },

    #[error("action {index} names unknown device {name:?}")]
    UnknownDeviceName { index: usize, name: String },
}

/// Umbrella for the one-call reconcile loop.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("fabric error: {0}")]
    Fabric(#[from] FabricError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("demand error: {0}")]
    Demand(#[from] DemandError),

    #[error("planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("execution error: {0}")]
    Execute(#[from] ExecutorError),
}
