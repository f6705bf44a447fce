//! Variance — per-machine deltas and their incremental serialization.
//!
//! A `Variance` is the raw difference between what a machine holds and
//! what it should hold. A `VarianceSet` drains those differences into
//! concrete actions one at a time, threading a shared pool of currently
//! free device ids through every step so that no attach is ever emitted
//! before the detach that frees its devices. Swap cycles break by
//! bifurcating a blocked variance into a detach-first half and an
//! attach-later half.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use fabriq_inventory::Inventory;
use fabriq_model::{DeviceId, MachineId};

use crate::error::{PlanError, PlanResult};
use crate::plan::Action;

/// The delta moving one machine from its current to its desired devices.
///
/// Value object: bifurcation builds new variances, nothing mutates one
/// in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variance {
    pub machine: MachineId,
    pub node_name: String,
    pub additions: BTreeSet<DeviceId>,
    pub removals: BTreeSet<DeviceId>,
}

impl Variance {
    pub fn new(
        machine: MachineId,
        node_name: impl Into<String>,
        additions: BTreeSet<DeviceId>,
        removals: BTreeSet<DeviceId>,
    ) -> Self {
        Self {
            machine,
            node_name: node_name.into(),
            additions,
            removals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn has_additions(&self) -> bool {
        !self.additions.is_empty()
    }

    pub fn has_removals(&self) -> bool {
        !self.removals.is_empty()
    }

    /// A variance can split only while it has work on both sides.
    pub fn can_bifurcate(&self) -> bool {
        self.has_additions() && self.has_removals()
    }

    /// Split into a remove-only half followed by an add-only half. A
    /// one-sided or empty variance comes back unchanged.
    pub fn bifurcate(self) -> Vec<Variance> {
        if !self.can_bifurcate() {
            return vec![self];
        }
        let remove_half = Variance {
            machine: self.machine,
            node_name: self.node_name.clone(),
            additions: BTreeSet::new(),
            removals: self.removals,
        };
        let add_half = Variance {
            machine: self.machine,
            node_name: self.node_name,
            additions: self.additions,
            removals: BTreeSet::new(),
        };
        vec![remove_half, add_half]
    }

    /// Try to turn this variance into one executable action.
    ///
    /// `unassigned` is the caller-owned pool of device ids the fabric
    /// currently holds free. Removals always succeed and feed the pool;
    /// additions succeed only once every wanted id is in the pool, and a
    /// blocked attempt returns `Ok(None)` without touching the pool. A
    /// machine or device id missing from the inventory is a programming
    /// error and fails loudly.
    pub fn create_action(
        &self,
        inventory: &Inventory,
        unassigned: &mut BTreeSet<DeviceId>,
    ) -> PlanResult<Option<Action>> {
        if self.is_empty() {
            return Ok(Some(Action::Noop));
        }
        if inventory.machine(self.machine).is_none() {
            return Err(PlanError::UnknownMachine(self.machine));
        }

        if !self.has_additions() {
            let devices = device_names(inventory, &self.removals)?;
            unassigned.extend(self.removals.iter().copied());
            debug!(machine = %self.machine, count = devices.len(), "detach action");
            return Ok(Some(Action::Detach {
                machine: self.machine,
                node_name: self.node_name.clone(),
                devices,
            }));
        }

        if !self.additions.is_subset(unassigned) {
            debug!(machine = %self.machine, "additions not yet free, deferring");
            return Ok(None);
        }

        if !self.has_removals() {
            let devices = device_names(inventory, &self.additions)?;
            for id in &self.additions {
                unassigned.remove(id);
            }
            debug!(machine = %self.machine, count = devices.len(), "attach action");
            return Ok(Some(Action::Attach {
                machine: self.machine,
                node_name: self.node_name.clone(),
                devices,
            }));
        }

        // Both sides, all additions free: one combined fabric transaction.
        let attach = device_names(inventory, &self.additions)?;
        let detach = device_names(inventory, &self.removals)?;
        for id in &self.additions {
            unassigned.remove(id);
        }
        unassigned.extend(self.removals.iter().copied());
        debug!(
            machine = %self.machine,
            attach = attach.len(),
            detach = detach.len(),
            "reconfigure action"
        );
        Ok(Some(Action::Reconfigure {
            machine: self.machine,
            node_name: self.node_name.clone(),
            attach,
            detach,
        }))
    }
}

fn device_names(inventory: &Inventory, ids: &BTreeSet<DeviceId>) -> PlanResult<Vec<String>> {
    ids.iter()
        .map(|id| {
            inventory
                .device(*id)
                .map(|d| d.name.clone())
                .ok_or(PlanError::UnknownDevice(*id))
        })
        .collect()
}

/// Pending variances, drained one action at a time.
#[derive(Debug, Clone, Default)]
pub struct VarianceSet {
    pending: Vec<Variance>,
}

impl VarianceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, variance: Variance) {
        self.pending.push(variance);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[Variance] {
        &self.pending
    }

    /// Produce the next executable action, or `Ok(None)` when nothing
    /// can move. `None` with an empty pending set means the plan is
    /// complete; `None` with variances left means the remainder cannot
    /// be linearized and the caller must surface it.
    ///
    /// Scans in insertion order, dropping empty variances as it goes. A
    /// blocked two-sided variance is replaced in place by its halves and
    /// the scan restarts, so its detach half frees devices before any
    /// dependent attach is retried.
    pub fn get_action(
        &mut self,
        inventory: &Inventory,
        unassigned: &mut BTreeSet<DeviceId>,
    ) -> PlanResult<Option<Action>> {
        loop {
            let mut index = 0;
            let mut bifurcated = false;
            while index < self.pending.len() {
                if self.pending[index].is_empty() {
                    self.pending.remove(index);
                    continue;
                }
                match self.pending[index].create_action(inventory, unassigned)? {
                    Some(action) => {
                        self.pending.remove(index);
                        return Ok(Some(action));
                    }
                    None if self.pending[index].can_bifurcate() => {
                        let halves = self.pending.remove(index).bifurcate();
                        for (offset, half) in halves.into_iter().enumerate() {
                            self.pending.insert(index + offset, half);
                        }
                        debug!(index, "bifurcated blocked variance");
                        bifurcated = true;
                        break;
                    }
                    None => index += 1,
                }
            }
            if !bifurcated {
                return Ok(None);
            }
        }
    }

    /// Drain every variance into an ordered action list. Variances still
    /// pending once no action can be produced are a deadlock.
    pub fn drain(
        &mut self,
        inventory: &Inventory,
        unassigned: &mut BTreeSet<DeviceId>,
    ) -> PlanResult<Vec<Action>> {
        let mut actions = Vec::new();
        while let Some(action) = self.get_action(inventory, unassigned)? {
            actions.push(action);
        }
        if !self.pending.is_empty() {
            warn!(pending = self.pending.len(), "variances cannot make progress");
            return Err(PlanError::Deadlock {
                pending: self.pending.len(),
            });
        }
        Ok(actions)
    }
}
