//! Catalog records held by the inventory.

use fabriq_model::{DeviceId, DeviceType, GroupId, MachineId, ResourceModel};

/// A composable device known to the fabric.
///
/// Placement invariant: `machine` is only ever `Some` while `group` names
/// that machine's group. The notify API preserves this; attach moves the
/// device into the machine's group, detach returns it to the group pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub device_type: DeviceType,
    pub vendor: String,
    pub model: String,
    pub group: Option<GroupId>,
    pub machine: Option<MachineId>,
}

impl Device {
    /// The exact matcher for this device's hardware.
    pub fn specific_model(&self) -> ResourceModel {
        ResourceModel::specific(self.device_type, self.vendor.clone(), self.model.clone())
    }

    pub fn is_attached(&self) -> bool {
        self.machine.is_some()
    }
}

/// A fabric machine: the logical host devices get attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    /// Cluster node this machine backs, used when actions are rendered.
    pub node_name: String,
    pub group: GroupId,
}

/// A fabric group: a pool of machines and devices reserved for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}
