//! Cluster layout — per-machine profiles for one group.
//!
//! A layout answers "who holds what" (captured from an inventory) or
//! "who wants what" (built by a demand source). Both shapes share the
//! same type so the planner can diff them without caring which is which.

use tracing::debug;

use fabriq_model::{GroupId, MachineId, MachineProfile, Profile};

use crate::inventory::Inventory;

/// One profile per machine in a group plus the group's unassigned pool.
///
/// Machine profiles are kept in ascending machine-id order; every walk
/// over them inherits that order.
#[derive(Debug, Clone)]
pub struct ClusterLayout {
    group: GroupId,
    machines: Vec<MachineProfile>,
    unassigned: Profile,
}

impl ClusterLayout {
    pub fn new(group: GroupId) -> Self {
        Self {
            group,
            machines: Vec::new(),
            unassigned: Profile::new(),
        }
    }

    /// Capture the group's current placement. Every device assigned to
    /// the group lands in exactly one location's profile, keyed by its
    /// exact vendor/model matcher with count 1 per device.
    pub fn from_inventory(inventory: &Inventory, group: GroupId) -> Self {
        let mut layout = Self::new(group);
        for machine in inventory.machines_in_group(group) {
            layout.ensure_machine(machine.id);
        }
        for device in inventory.devices_in_group(group) {
            let model = device.specific_model();
            match device.machine {
                Some(machine) => {
                    debug!(device = %device.id, %machine, %model, "captured attached device");
                    layout.ensure_machine(machine).inject(model, 1);
                }
                None => {
                    debug!(device = %device.id, %model, "captured unassigned device");
                    layout.unassigned.inject(model, 1);
                }
            }
        }
        layout
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Machine profiles in ascending machine-id order.
    pub fn machine_profiles(&self) -> &[MachineProfile] {
        &self.machines
    }

    pub fn machine_profile(&self, machine: MachineId) -> Option<&Profile> {
        self.machines
            .iter()
            .find(|mp| mp.machine == machine)
            .map(|mp| &mp.profile)
    }

    /// Profile for `machine`, created empty if the layout has not seen
    /// it yet. Insertion keeps the ascending-id order.
    pub fn ensure_machine(&mut self, machine: MachineId) -> &mut Profile {
        match self
            .machines
            .binary_search_by_key(&machine, |mp| mp.machine)
        {
            Ok(pos) => &mut self.machines[pos].profile,
            Err(pos) => {
                self.machines.insert(pos, MachineProfile::new(machine));
                &mut self.machines[pos].profile
            }
        }
    }

    pub fn unassigned(&self) -> &Profile {
        &self.unassigned
    }

    /// Sum every location's profile into one. Identical keys add up;
    /// a Generic key never merges with a Specific key of the same type.
    pub fn flatten(&self) -> Profile {
        let mut flat = Profile::new();
        for mp in &self.machines {
            flat.absorb(&mp.profile);
        }
        flat.absorb(&self.unassigned);
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Device, Group, Machine};
    use fabriq_model::{DeviceId, DeviceType, ResourceModel};

    fn a100() -> ResourceModel {
        ResourceModel::specific(DeviceType::Gpu, "NVIDIA", "A100")
    }

    fn l40() -> ResourceModel {
        ResourceModel::specific(DeviceType::Gpu, "NVIDIA", "L40")
    }

    fn a770() -> ResourceModel {
        ResourceModel::specific(DeviceType::Gpu, "Intel", "A770")
    }

    fn sample_inventory() -> Inventory {
        let mut inv = Inventory::new();
        inv.notify_group_created(Group {
            id: GroupId(1),
            name: "rack-a".to_string(),
        })
        .unwrap();
        inv.notify_machine_created(Machine {
            id: MachineId(10),
            name: "m1".to_string(),
            node_name: "node-1".to_string(),
            group: GroupId(1),
        })
        .unwrap();
        inv.notify_machine_created(Machine {
            id: MachineId(20),
            name: "m2".to_string(),
            node_name: "node-2".to_string(),
            group: GroupId(1),
        })
        .unwrap();
        for (id, name, vendor, model) in [
            (1, "gpu-1", "NVIDIA", "A100"),
            (2, "gpu-2", "NVIDIA", "A100"),
            (3, "gpu-3", "Intel", "A770"),
        ] {
            inv.notify_device_created(Device {
                id: DeviceId(id),
                name: name.to_string(),
                device_type: DeviceType::Gpu,
                vendor: vendor.to_string(),
                model: model.to_string(),
                group: None,
                machine: None,
            })
            .unwrap();
            inv.notify_device_moved_to_group(DeviceId(id), GroupId(1))
                .unwrap();
        }
        inv
    }

    #[test]
    fn capture_splits_devices_by_location() {
        let mut inv = sample_inventory();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();
        inv.notify_device_attached(DeviceId(3), MachineId(20)).unwrap();

        let layout = ClusterLayout::from_inventory(&inv, GroupId(1));

        assert_eq!(
            layout.machine_profile(MachineId(10)).unwrap().get(&a100()),
            Some(1)
        );
        assert_eq!(
            layout.machine_profile(MachineId(20)).unwrap().get(&a770()),
            Some(1)
        );
        // gpu-2 never got attached, so it sits in the unassigned profile.
        assert_eq!(layout.unassigned().get(&a100()), Some(1));
    }

    #[test]
    fn capture_lists_empty_machines() {
        let inv = sample_inventory();
        let layout = ClusterLayout::from_inventory(&inv, GroupId(1));

        assert_eq!(layout.machine_profiles().len(), 2);
        assert!(layout.machine_profile(MachineId(10)).unwrap().is_empty());
        assert_eq!(layout.unassigned().get(&a100()), Some(2));
    }

    #[test]
    fn capture_of_an_empty_group_is_all_empty() {
        let mut inv = Inventory::new();
        inv.notify_group_created(Group {
            id: GroupId(7),
            name: "empty".to_string(),
        })
        .unwrap();

        let layout = ClusterLayout::from_inventory(&inv, GroupId(7));
        assert!(layout.machine_profiles().is_empty());
        assert!(layout.unassigned().is_empty());
        assert!(layout.flatten().is_empty());
    }

    #[test]
    fn flatten_sums_identical_keys_across_locations() {
        // {M1: A=1}, {M2: A=1, B=2}, {M3: B=1, C=1}, {M4: C=2}
        let mut layout = ClusterLayout::new(GroupId(1));
        layout.ensure_machine(MachineId(1)).inject(a100(), 1);
        let m2 = layout.ensure_machine(MachineId(2));
        m2.inject(a100(), 1);
        m2.inject(l40(), 2);
        let m3 = layout.ensure_machine(MachineId(3));
        m3.inject(l40(), 1);
        m3.inject(a770(), 1);
        layout.ensure_machine(MachineId(4)).inject(a770(), 2);

        let flat = layout.flatten();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat.get(&a100()), Some(2));
        assert_eq!(flat.get(&l40()), Some(3));
        assert_eq!(flat.get(&a770()), Some(3));
    }

    #[test]
    fn flatten_keeps_generic_and_specific_keys_apart() {
        let gpu = ResourceModel::generic(DeviceType::Gpu);
        let mut layout = ClusterLayout::new(GroupId(1));
        layout.ensure_machine(MachineId(1)).inject(gpu.clone(), 2);
        layout.ensure_machine(MachineId(2)).inject(a100(), 1);

        let flat = layout.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.get(&gpu), Some(2));
        assert_eq!(flat.get(&a100()), Some(1));
    }

    #[test]
    fn ensure_machine_keeps_ascending_order() {
        let mut layout = ClusterLayout::new(GroupId(1));
        layout.ensure_machine(MachineId(30));
        layout.ensure_machine(MachineId(10));
        layout.ensure_machine(MachineId(20));
        layout.ensure_machine(MachineId(10));

        let ids: Vec<MachineId> = layout
            .machine_profiles()
            .iter()
            .map(|mp| mp.machine)
            .collect();
        assert_eq!(ids, vec![MachineId(10), MachineId(20), MachineId(30)]);
    }
}
