//! Plan — ordered fabric actions and the end-to-end computation.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use fabriq_inventory::{ClusterLayout, Inventory};
use fabriq_model::{DeviceId, MachineId};

use crate::allocator::{claim_devices, populate_allocations};
use crate::error::{PlanError, PlanResult};
use crate::variance::{Variance, VarianceSet};

/// One executable step against the fabric. Devices are named, not
/// numbered, because names are what the controller API accepts; they are
/// resolved from the inventory at the moment the action is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Attach {
        machine: MachineId,
        node_name: String,
        devices: Vec<String>,
    },
    Detach {
        machine: MachineId,
        node_name: String,
        devices: Vec<String>,
    },
    /// Combined detach+attach on one machine, one fabric transaction.
    Reconfigure {
        machine: MachineId,
        node_name: String,
        attach: Vec<String>,
        detach: Vec<String>,
    },
    Noop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Attach {
                machine,
                node_name,
                devices,
            } => write!(
                f,
                "attach [{}] to machine {machine} (node {node_name})",
                devices.join(", ")
            ),
            Action::Detach {
                machine,
                node_name,
                devices,
            } => write!(
                f,
                "detach [{}] from machine {machine} (node {node_name})",
                devices.join(", ")
            ),
            Action::Reconfigure {
                machine,
                node_name,
                attach,
                detach,
            } => write!(
                f,
                "reconfigure machine {machine} (node {node_name}): attach [{}], detach [{}]",
                attach.join(", "),
                detach.join(", ")
            ),
            Action::Noop => f.write_str("no-op"),
        }
    }
}

/// An ordered action sequence. Executing it strictly in order reproduces
/// the planner's intended end state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Plan the moves that take every machine named in `demand` from what it
/// currently holds to what the demand asks for. Machines absent from the
/// demand layout are never touched.
pub fn compute_plan(inventory: &Inventory, demand: &ClusterLayout) -> PlanResult<Plan> {
    let allocations = populate_allocations(inventory, demand);
    let desired = claim_devices(&allocations)?;

    let mut variances = VarianceSet::new();
    for mp in demand.machine_profiles() {
        let machine = inventory
            .machine(mp.machine)
            .ok_or(PlanError::UnknownMachine(mp.machine))?;
        let current: BTreeSet<DeviceId> = inventory
            .devices_on_machine(mp.machine)
            .map(|d| d.id)
            .collect();
        let want = desired.get(&mp.machine).cloned().unwrap_or_default();
        let additions: BTreeSet<DeviceId> = want.difference(&current).copied().collect();
        let removals: BTreeSet<DeviceId> = current.difference(&want).copied().collect();
        debug!(
            machine = %mp.machine,
            additions = additions.len(),
            removals = removals.len(),
            "variance computed"
        );
        variances.push(Variance::new(
            mp.machine,
            machine.node_name.clone(),
            additions,
            removals,
        ));
    }

    let mut unassigned: BTreeSet<DeviceId> = inventory.free_devices().map(|d| d.id).collect();
    let actions = variances.drain(inventory, &mut unassigned)?;
    info!(actions = actions.len(), "plan computed");
    Ok(Plan { actions })
}
