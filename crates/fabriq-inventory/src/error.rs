//! Inventory error types.

use fabriq_model::{DeviceId, GroupId, MachineId};
use thiserror::Error;

/// Errors raised when a notify event would break referential integrity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("unknown device id {0}")]
    UnknownDevice(DeviceId),

    #[error("unknown machine id {0}")]
    UnknownMachine(MachineId),

    #[error("unknown group id {0}")]
    UnknownGroup(GroupId),

    #[error("device id {0} already registered")]
    DuplicateDevice(DeviceId),

    #[error("machine id {0} already registered")]
    DuplicateMachine(MachineId),

    #[error("group id {0} already registered")]
    DuplicateGroup(GroupId),

    #[error("device name already registered: {0}")]
    DuplicateDeviceName(String),

    #[error("machine name already registered: {0}")]
    DuplicateMachineName(String),

    #[error("group name already registered: {0}")]
    DuplicateGroupName(String),

    #[error("device {device} is attached to machine {machine}")]
    DeviceAttached {
        device: DeviceId,
        machine: MachineId,
    },

    #[error("device {0} is not attached to any machine")]
    DeviceNotAttached(DeviceId),

    #[error("device {0} is not in any group")]
    DeviceNotGrouped(DeviceId),

    #[error("device {device} sits in a different group than machine {machine}")]
    GroupMismatch {
        device: DeviceId,
        machine: MachineId,
    },

    #[error("machine {0} still has devices attached")]
    MachineNotEmpty(MachineId),

    #[error("group {0} still has members")]
    GroupNotEmpty(GroupId),
}

pub type InventoryResult<T> = Result<T, InventoryError>;
