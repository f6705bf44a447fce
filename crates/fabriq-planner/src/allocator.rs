//! Allocator — candidate selection and claiming in specificity order.
//!
//! For every requested resource model the allocator builds a full,
//! locality-preferring candidate list per requesting machine. Candidate
//! lists are never trimmed to the requested count here; `claim_devices`
//! consumes them in model order so that overlapping requests are settled
//! by specificity, not by luck.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use fabriq_inventory::{ClusterLayout, Device, Inventory};
use fabriq_model::{DeviceId, MachineId, ResourceModel};

use crate::error::{PlanError, PlanResult};

/// One machine's claim on a resource model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub machine: MachineId,
    /// Requested device count for this model on this machine.
    pub count: i64,
    /// Every candidate id that could satisfy the request, best first,
    /// untrimmed. Consumers claim from the front and skip taken ids.
    pub candidates: Vec<DeviceId>,
}

fn eligible(device: &Device, model: &ResourceModel, restrictions: &[ResourceModel]) -> bool {
    model.matches(device.device_type, &device.vendor, &device.model)
        && !restrictions
            .iter()
            .any(|r| r.matches(device.device_type, &device.vendor, &device.model))
}

/// Ordered ids of devices matching `model` but no restriction, from the
/// point of view of `machine`: first the devices it already holds, then
/// the free pool, then every peer's devices, peers in ascending
/// machine-id order. Device ids ascend within each section. The order
/// encodes "reuse what you have before reaching for a peer's hardware".
pub fn ordered_device_ids(
    inventory: &Inventory,
    model: &ResourceModel,
    restrictions: &[ResourceModel],
    machine: MachineId,
) -> Vec<DeviceId> {
    let mut ids: Vec<DeviceId> = inventory
        .devices_on_machine(machine)
        .filter(|d| eligible(d, model, restrictions))
        .map(|d| d.id)
        .collect();
    ids.extend(
        inventory
            .free_devices()
            .filter(|d| eligible(d, model, restrictions))
            .map(|d| d.id),
    );
    for peer in inventory.machines() {
        if peer.id == machine {
            continue;
        }
        ids.extend(
            inventory
                .devices_on_machine(peer.id)
                .filter(|d| eligible(d, model, restrictions))
                .map(|d| d.id),
        );
    }
    ids
}

/// Build the full allocation table for a demand layout.
///
/// Keys come out in the resource-model total order (most specific first
/// within a device type); allocations under a key are in ascending
/// machine-id order. Zero-count profile entries produce no allocation;
/// they exist to restrict broader keys on the same machine, so "4 GPUs
/// but no A100s" is a generic entry of 4 plus an A100 entry of 0.
pub fn populate_allocations(
    inventory: &Inventory,
    layout: &ClusterLayout,
) -> BTreeMap<ResourceModel, Vec<Allocation>> {
    let mut keys: BTreeSet<ResourceModel> = BTreeSet::new();
    for mp in layout.machine_profiles() {
        keys.extend(mp.profile.keys().cloned());
    }

    let mut allocations: BTreeMap<ResourceModel, Vec<Allocation>> = BTreeMap::new();
    for model in &keys {
        for mp in layout.machine_profiles() {
            let Some(count) = mp.profile.get(model) else {
                continue;
            };
            if count == 0 {
                continue;
            }
            let restrictions: Vec<ResourceModel> = mp
                .profile
                .keys()
                .filter(|other| other.is_more_specific_than(model) && other.overlaps(model))
                .cloned()
                .collect();
            let candidates = ordered_device_ids(inventory, model, &restrictions, mp.machine);
            debug!(
                %model,
                machine = %mp.machine,
                count,
                candidates = candidates.len(),
                restrictions = restrictions.len(),
                "allocation populated"
            );
            allocations.entry(model.clone()).or_default().push(Allocation {
                machine: mp.machine,
                count,
                candidates,
            });
        }
    }
    allocations
}

/// Claim concrete devices for every allocation, most specific model
/// first, machines in ascending order within a model. Ids taken by an
/// earlier key or machine are skipped. Any shortfall rejects the whole
/// pass; a partially honored demand is worse than a loud failure.
pub fn claim_devices(
    allocations: &BTreeMap<ResourceModel, Vec<Allocation>>,
) -> PlanResult<BTreeMap<MachineId, BTreeSet<DeviceId>>> {
    let mut claimed: BTreeSet<DeviceId> = BTreeSet::new();
    let mut desired: BTreeMap<MachineId, BTreeSet<DeviceId>> = BTreeMap::new();

    for (model, allocs) in allocations {
        for alloc in allocs {
            let mut taken = 0i64;
            let entry = desired.entry(alloc.machine).or_default();
            for id in &alloc.candidates {
                if taken >= alloc.count {
                    break;
                }
                if claimed.insert(*id) {
                    entry.insert(*id);
                    taken += 1;
                }
            }
            if taken < alloc.count {
                warn!(
                    %model,
                    machine = %alloc.machine,
                    requested = alloc.count,
                    granted = taken,
                    "demand shortfall"
                );
                return Err(PlanError::UnsatisfiableDemand {
                    model: model.clone(),
                    machine: alloc.machine,
                    shortfall: alloc.count - taken,
                });
            }
            debug!(%model, machine = %alloc.machine, taken, "allocation claimed");
        }
    }
    Ok(desired)
}
