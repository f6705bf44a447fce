//! Plan executor — applies actions against a fabric, strictly in order.
//!
//! Each fabric call that commits is mirrored into the caller's inventory
//! through the notify events, so the inventory tracks the fabric step by
//! step. Execution stops at the first failure; the error names the index
//! of the action that failed, and every action before it has already
//! been committed on the fabric.

use tracing::{debug, info};

use fabriq_inventory::Inventory;
use fabriq_model::MachineId;
use fabriq_planner::{Action, Plan, compute_plan};

use crate::client::FabricClient;
use crate::demand::DemandSpec;
use crate::error::{ExecutorError, ReconcileError};

/// What an execution actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub actions_applied: usize,
    pub devices_attached: usize,
    pub devices_detached: usize,
}

pub async fn execute_plan(
    client: &dyn FabricClient,
    inventory: &mut Inventory,
    plan: &Plan,
) -> Result<ExecutionSummary, ExecutorError> {
    let mut summary = ExecutionSummary::default();
    for (index, action) in plan.actions.iter().enumerate() {
        match action {
            Action::Noop => {
                debug!(index, "skipping no-op");
                continue;
            }
            Action::Attach {
                machine, devices, ..
            } => {
                for device in devices {
                    client
                        .attach_device(device, *machine)
                        .await
                        .map_err(|source| ExecutorError::Fabric { index, source })?;
                    notify_attached(inventory, index, device, *machine)?;
                    summary.devices_attached += 1;
                }
            }
            Action::Detach {
                machine, devices, ..
            } => {
                for device in devices {
                    client
                        .detach_device(device, *machine)
                        .await
                        .map_err(|source| ExecutorError::Fabric { index, source })?;
                    notify_detached(inventory, index, device)?;
                    summary.devices_detached += 1;
                }
            }
            Action::Reconfigure {
                machine,
                attach,
                detach,
                ..
            } => {
                client
                    .reconfigure_machine(*machine, attach, detach)
                    .await
                    .map_err(|source| ExecutorError::Fabric { index, source })?;
                for device in detach {
                    notify_detached(inventory, index, device)?;
                    summary.devices_detached += 1;
                }
                for device in attach {
                    notify_attached(inventory, index, device, *machine)?;
                    summary.devices_attached += 1;
                }
            }
        }
        summary.actions_applied += 1;
        debug!(index, %action, "action applied");
    }
    info!(
        actions = summary.actions_applied,
        attached = summary.devices_attached,
        detached = summary.devices_detached,
        "plan executed"
    );
    Ok(summary)
}

fn notify_attached(
    inventory: &mut Inventory,
    index: usize,
    device: &str,
    machine: MachineId,
) -> Result<(), ExecutorError> {
    let id = inventory
        .device_by_name(device)
        .map(|d| d.id)
        .ok_or_else(|| ExecutorError::UnknownDeviceName {
            index,
            name: device.to_string(),
        })?;
    inventory
        .notify_device_attached(id, machine)
        .map_err(|source| ExecutorError::Inventory { index, source })
}

fn notify_detached(
    inventory: &mut Inventory,
    index: usize,
    device: &str,
) -> Result<(), ExecutorError> {
    let id = inventory
        .device_by_name(device)
        .map(|d| d.id)
        .ok_or_else(|| ExecutorError::UnknownDeviceName {
            index,
            name: device.to_string(),
        })?;
    inventory
        .notify_device_detached(id)
        .map_err(|source| ExecutorError::Inventory { index, source })
}

/// Fetch, plan, execute: one full reconciliation pass. Returns the plan
/// alongside what actually ran.
pub async fn reconcile(
    client: &dyn FabricClient,
    demand: &DemandSpec,
) -> Result<(Plan, ExecutionSummary), ReconcileError> {
    let snapshot = client.fetch_snapshot().await?;
    let mut inventory = snapshot.into_inventory()?;
    let layout = demand.into_layout(&inventory)?;
    let plan = compute_plan(&inventory, &layout)?;
    let summary = execute_plan(client, &mut inventory, &plan).await?;
    Ok((plan, summary))
}
