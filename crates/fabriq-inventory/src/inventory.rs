//! Inventory — the queryable fabric snapshot.
//!
//! Holds every device, machine, and group the fabric reported, plus the
//! current placement of each device. Reads are cheap and plentiful;
//! writes happen only through the `notify_*` methods, which validate
//! referential integrity and reject events that could not have happened
//! on a real fabric.

use std::collections::BTreeMap;

use tracing::debug;

use fabriq_model::{DeviceId, GroupId, MachineId};

use crate::error::{InventoryError, InventoryResult};
use crate::types::{Device, Group, Machine};

/// Point-in-time catalog of the fabric, advanced by notify events.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: BTreeMap<DeviceId, Device>,
    machines: BTreeMap<MachineId, Machine>,
    groups: BTreeMap<GroupId, Group>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ───────────────────────────────────────────────────────

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(&id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// All devices in ascending id order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// All machines in ascending id order.
    pub fn machines(&self) -> impl Iterator<Item = &Machine> {
        self.machines.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn device_by_name(&self, name: &str) -> Option<&Device> {
        self.devices.values().find(|d| d.name == name)
    }

    pub fn machine_by_name(&self, name: &str) -> Option<&Machine> {
        self.machines.values().find(|m| m.name == name)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.values().find(|g| g.name == name)
    }

    /// Devices attached to `machine`, ascending id order.
    pub fn devices_on_machine(&self, machine: MachineId) -> impl Iterator<Item = &Device> {
        self.devices
            .values()
            .filter(move |d| d.machine == Some(machine))
    }

    /// Devices attached to no machine, ascending id order. Grouped but
    /// unattached devices count as free.
    pub fn free_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|d| d.machine.is_none())
    }

    /// Devices whose current group is `group`, attached or not.
    pub fn devices_in_group(&self, group: GroupId) -> impl Iterator<Item = &Device> {
        self.devices
            .values()
            .filter(move |d| d.group == Some(group))
    }

    pub fn machines_in_group(&self, group: GroupId) -> impl Iterator<Item = &Machine> {
        self.machines.values().filter(move |m| m.group == group)
    }

    // ── Notify events ─────────────────────────────────────────────────

    /// Register a device the fabric reported. Placement references must
    /// already exist, and an attached device must sit in its machine's
    /// group.
    pub fn notify_device_created(&mut self, device: Device) -> InventoryResult<()> {
        if self.devices.contains_key(&device.id) {
            return Err(InventoryError::DuplicateDevice(device.id));
        }
        if self.device_by_name(&device.name).is_some() {
            return Err(InventoryError::DuplicateDeviceName(device.name));
        }
        if let Some(group) = device.group {
            if !self.groups.contains_key(&group) {
                return Err(InventoryError::UnknownGroup(group));
            }
        }
        if let Some(machine) = device.machine {
            let record = self
                .machines
                .get(&machine)
                .ok_or(InventoryError::UnknownMachine(machine))?;
            if device.group != Some(record.group) {
                return Err(InventoryError::GroupMismatch {
                    device: device.id,
                    machine,
                });
            }
        }
        debug!(device = %device.id, name = %device.name, "device created");
        self.devices.insert(device.id, device);
        Ok(())
    }

    /// Forget a device. Refused while the device is attached; detach it
    /// first so the event log never hides an implicit detach.
    pub fn notify_device_deleted(&mut self, device: DeviceId) -> InventoryResult<()> {
        let record = self
            .devices
            .get(&device)
            .ok_or(InventoryError::UnknownDevice(device))?;
        if let Some(machine) = record.machine {
            return Err(InventoryError::DeviceAttached { device, machine });
        }
        self.devices.remove(&device);
        debug!(%device, "device deleted");
        Ok(())
    }

    /// Record a fabric attach. The device joins the machine's group as
    /// part of the same event.
    pub fn notify_device_attached(
        &mut self,
        device: DeviceId,
        machine: MachineId,
    ) -> InventoryResult<()> {
        let group = self
            .machines
            .get(&machine)
            .map(|m| m.group)
            .ok_or(InventoryError::UnknownMachine(machine))?;
        let record = self
            .devices
            .get_mut(&device)
            .ok_or(InventoryError::UnknownDevice(device))?;
        if let Some(owner) = record.machine {
            return Err(InventoryError::DeviceAttached {
                device,
                machine: owner,
            });
        }
        record.machine = Some(machine);
        record.group = Some(group);
        debug!(%device, %machine, "device attached");
        Ok(())
    }

    /// Record a fabric detach. The device stays in its group's free pool.
    pub fn notify_device_detached(&mut self, device: DeviceId) -> InventoryResult<()> {
        let record = self
            .devices
            .get_mut(&device)
            .ok_or(InventoryError::UnknownDevice(device))?;
        let machine = record
            .machine
            .take()
            .ok_or(InventoryError::DeviceNotAttached(device))?;
        debug!(%device, %machine, "device detached");
        Ok(())
    }

    /// Move an unattached device into a group's free pool.
    pub fn notify_device_moved_to_group(
        &mut self,
        device: DeviceId,
        group: GroupId,
    ) -> InventoryResult<()> {
        if !self.groups.contains_key(&group) {
            return Err(InventoryError::UnknownGroup(group));
        }
        let record = self
            .devices
            .get_mut(&device)
            .ok_or(InventoryError::UnknownDevice(device))?;
        if let Some(machine) = record.machine {
            return Err(InventoryError::DeviceAttached { device, machine });
        }
        record.group = Some(group);
        debug!(%device, %group, "device moved to group");
        Ok(())
    }

    /// Return an unattached device to the fabric-wide loose pool.
    pub fn notify_device_left_group(&mut self, device: DeviceId) -> InventoryResult<()> {
        let record = self
            .devices
            .get_mut(&device)
            .ok_or(InventoryError::UnknownDevice(device))?;
        if let Some(machine) = record.machine {
            return Err(InventoryError::DeviceAttached { device, machine });
        }
        if record.group.take().is_none() {
            return Err(InventoryError::DeviceNotGrouped(device));
        }
        debug!(%device, "device left group");
        Ok(())
    }

    pub fn notify_machine_created(&mut self, machine: Machine) -> InventoryResult<()> {
        if self.machines.contains_key(&machine.id) {
            return Err(InventoryError::DuplicateMachine(machine.id));
        }
        if self.machine_by_name(&machine.name).is_some() {
            return Err(InventoryError::DuplicateMachineName(machine.name));
        }
        if !self.groups.contains_key(&machine.group) {
            return Err(InventoryError::UnknownGroup(machine.group));
        }
        debug!(machine = %machine.id, name = %machine.name, "machine created");
        self.machines.insert(machine.id, machine);
        Ok(())
    }

    /// Refused while any device remains attached to the machine.
    pub fn notify_machine_deleted(&mut self, machine: MachineId) -> InventoryResult<()> {
        if !self.machines.contains_key(&machine) {
            return Err(InventoryError::UnknownMachine(machine));
        }
        if self.devices_on_machine(machine).next().is_some() {
            return Err(InventoryError::MachineNotEmpty(machine));
        }
        self.machines.remove(&machine);
        debug!(%machine, "machine deleted");
        Ok(())
    }

    pub fn notify_group_created(&mut self, group: Group) -> InventoryResult<()> {
        if self.groups.contains_key(&group.id) {
            return Err(InventoryError::DuplicateGroup(group.id));
        }
        if self.group_by_name(&group.name).is_some() {
            return Err(InventoryError::DuplicateGroupName(group.name));
        }
        debug!(group = %group.id, name = %group.name, "group created");
        self.groups.insert(group.id, group);
        Ok(())
    }

    /// Refused while any machine or device remains in the group.
    pub fn notify_group_deleted(&mut self, group: GroupId) -> InventoryResult<()> {
        if !self.groups.contains_key(&group) {
            return Err(InventoryError::UnknownGroup(group));
        }
        if self.machines_in_group(group).next().is_some()
            || self.devices_in_group(group).next().is_some()
        {
            return Err(InventoryError::GroupNotEmpty(group));
        }
        self.groups.remove(&group);
        debug!(%group, "group deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabriq_model::DeviceType;

    fn gpu(id: u32, name: &str, vendor: &str, model: &str) -> Device {
        Device {
            id: DeviceId(id),
            name: name.to_string(),
            device_type: DeviceType::Gpu,
            vendor: vendor.to_string(),
            model: model.to_string(),
            group: None,
            machine: None,
        }
    }

    fn sample() -> Inventory {
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
        inv.notify_device_created(gpu(1, "gpu-1", "NVIDIA", "A100"))
            .unwrap();
        inv.notify_device_created(gpu(2, "gpu-2", "NVIDIA", "L40"))
            .unwrap();
        inv.notify_device_created(gpu(3, "gpu-3", "Intel", "A770"))
            .unwrap();
        inv
    }

    #[test]
    fn replaying_events_reproduces_placement() {
        let mut inv = sample();
        inv.notify_device_moved_to_group(DeviceId(1), GroupId(1))
            .unwrap();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();
        inv.notify_device_attached(DeviceId(2), MachineId(20)).unwrap();

        let d1 = inv.device(DeviceId(1)).unwrap();
        assert_eq!(d1.machine, Some(MachineId(10)));
        assert_eq!(d1.group, Some(GroupId(1)));

        let on_m2: Vec<DeviceId> = inv
            .devices_on_machine(MachineId(20))
            .map(|d| d.id)
            .collect();
        assert_eq!(on_m2, vec![DeviceId(2)]);

        let free: Vec<DeviceId> = inv.free_devices().map(|d| d.id).collect();
        assert_eq!(free, vec![DeviceId(3)]);
    }

    #[test]
    fn attach_pulls_device_into_the_machines_group() {
        let mut inv = sample();
        inv.notify_device_attached(DeviceId(3), MachineId(10)).unwrap();
        assert_eq!(inv.device(DeviceId(3)).unwrap().group, Some(GroupId(1)));
    }

    #[test]
    fn detach_keeps_device_in_group_pool() {
        let mut inv = sample();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();
        inv.notify_device_detached(DeviceId(1)).unwrap();

        let d1 = inv.device(DeviceId(1)).unwrap();
        assert_eq!(d1.machine, None);
        assert_eq!(d1.group, Some(GroupId(1)));
        assert!(inv.free_devices().any(|d| d.id == DeviceId(1)));
    }

    #[test]
    fn attaching_an_owned_device_is_refused() {
        let mut inv = sample();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();

        let err = inv
            .notify_device_attached(DeviceId(1), MachineId(20))
            .unwrap_err();
        assert_eq!(
            err,
            InventoryError::DeviceAttached {
                device: DeviceId(1),
                machine: MachineId(10),
            }
        );
    }

    #[test]
    fn moving_an_attached_device_between_groups_is_refused() {
        let mut inv = sample();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();
        assert!(inv
            .notify_device_moved_to_group(DeviceId(1), GroupId(1))
            .is_err());
    }

    #[test]
    fn deleting_an_attached_device_is_refused() {
        let mut inv = sample();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();
        assert_eq!(
            inv.notify_device_deleted(DeviceId(1)).unwrap_err(),
            InventoryError::DeviceAttached {
                device: DeviceId(1),
                machine: MachineId(10),
            }
        );

        inv.notify_device_detached(DeviceId(1)).unwrap();
        inv.notify_device_deleted(DeviceId(1)).unwrap();
        assert!(inv.device(DeviceId(1)).is_none());
        assert_eq!(
            inv.notify_device_deleted(DeviceId(1)).unwrap_err(),
            InventoryError::UnknownDevice(DeviceId(1))
        );
    }

    #[test]
    fn leaving_a_group_while_attached_is_refused() {
        let mut inv = sample();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();
        assert_eq!(
            inv.notify_device_left_group(DeviceId(1)).unwrap_err(),
            InventoryError::DeviceAttached {
                device: DeviceId(1),
                machine: MachineId(10),
            }
        );
        // Refusal left placement untouched.
        let d1 = inv.device(DeviceId(1)).unwrap();
        assert_eq!(d1.machine, Some(MachineId(10)));
        assert_eq!(d1.group, Some(GroupId(1)));
    }

    #[test]
    fn deleting_a_machine_with_devices_is_refused() {
        let mut inv = sample();
        inv.notify_device_attached(DeviceId(1), MachineId(10)).unwrap();
        assert_eq!(
            inv.notify_machine_deleted(MachineId(10)).unwrap_err(),
            InventoryError::MachineNotEmpty(MachineId(10))
        );

        inv.notify_device_detached(DeviceId(1)).unwrap();
        inv.notify_device_left_group(DeviceId(1)).unwrap();
        inv.notify_machine_deleted(MachineId(10)).unwrap();
        assert!(inv.machine(MachineId(10)).is_none());
    }

    #[test]
    fn deleting_a_populated_group_is_refused() {
        let mut inv = sample();
        assert_eq!(
            inv.notify_group_deleted(GroupId(1)).unwrap_err(),
            InventoryError::GroupNotEmpty(GroupId(1))
        );
    }

    #[test]
    fn duplicate_ids_and_names_are_refused() {
        let mut inv = sample();
        assert_eq!(
            inv.notify_device_created(gpu(1, "other", "NVIDIA", "A100"))
                .unwrap_err(),
            InventoryError::DuplicateDevice(DeviceId(1))
        );
        assert_eq!(
            inv.notify_device_created(gpu(9, "gpu-1", "NVIDIA", "A100"))
                .unwrap_err(),
            InventoryError::DuplicateDeviceName("gpu-1".to_string())
        );
    }

    #[test]
    fn created_device_with_inconsistent_placement_is_refused() {
        let mut inv = sample();
        let mut device = gpu(9, "gpu-9", "NVIDIA", "A100");
        device.machine = Some(MachineId(10));
        // Attached but not in the machine's group.
        assert_eq!(
            inv.notify_device_created(device).unwrap_err(),
            InventoryError::GroupMismatch {
                device: DeviceId(9),
                machine: MachineId(10),
            }
        );
    }

    #[test]
    fn lookups_by_name() {
        let inv = sample();
        assert_eq!(inv.device_by_name("gpu-2").unwrap().id, DeviceId(2));
        assert_eq!(inv.machine_by_name("m2").unwrap().id, MachineId(20));
        assert_eq!(inv.group_by_name("rack-a").unwrap().id, GroupId(1));
        assert!(inv.device_by_name("gpu-9").is_none());
    }
}
