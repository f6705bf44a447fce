//! Planner error types.

use fabriq_model::{DeviceId, MachineId, ResourceModel};
use thiserror::Error;

/// Errors that abort planning. None of these are retryable from inside
/// the planner; the caller decides whether to re-plan with new demand.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Demand for a model exceeds what the candidate lists can supply
    /// after more specific requests took their share. The whole plan is
    /// rejected rather than silently under-provisioning.
    #[error("demand for {model} on machine {machine} is short {shortfall} device(s)")]
    UnsatisfiableDemand {
        model: ResourceModel,
        machine: MachineId,
        shortfall: i64,
    },

    /// `get_action` stopped making progress while variances remain.
    #[error("plan cannot be linearized; {pending} variance(s) still pending")]
    Deadlock { pending: usize },

    #[error("machine {0} is not in the inventory")]
    UnknownMachine(MachineId),

    #[error("device {0} is not in the inventory")]
    UnknownDevice(DeviceId),
}

pub type PlanResult<T> = Result<T, PlanError>;
