//! Fabric snapshot document.
//!
//! The TOML form of everything a controller bulk-fetch returns: groups,
//! machines, devices, placement. Converting into an [`Inventory`] replays
//! the records through the notify API, so a snapshot that could not have
//! come from a real fabric is rejected with the exact integrity error.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fabriq_inventory::{Device, Group, Inventory, Machine};
use fabriq_model::{DeviceId, DeviceType, GroupId, MachineId};

use crate::error::SnapshotError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRecord {
    pub id: MachineId,
    pub name: String,
    pub node: String,
    pub group: GroupId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub vendor: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<MachineId>,
}

/// On-disk fabric state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricSnapshot {
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub machines: Vec<MachineRecord>,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}

impl FabricSnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = fs::read_to_string(path)?;
        let snapshot = toml::from_str(&text)?;
        debug!(path = %path.display(), "snapshot loaded");
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Replay the records into an inventory, groups first, then
    /// machines, then devices, validating every reference on the way.
    pub fn into_inventory(self) -> Result<Inventory, SnapshotError> {
        let mut inventory = Inventory::new();
        for record in self.groups {
            inventory.notify_group_created(Group {
                id: record.id,
                name: record.name,
            })?;
        }
        for record in self.machines {
            inventory.notify_machine_created(Machine {
                id: record.id,
                name: record.name,
                node_name: record.node,
                group: record.group,
            })?;
        }
        for record in self.devices {
            inventory.notify_device_created(Device {
                id: record.id,
                name: record.name,
                device_type: record.device_type,
                vendor: record.vendor,
                model: record.model,
                group: record.group,
                machine: record.machine,
            })?;
        }
        Ok(inventory)
    }

    pub fn from_inventory(inventory: &Inventory) -> Self {
        Self {
            groups: inventory
                .groups()
                .map(|g| GroupRecord {
                    id: g.id,
                    name: g.name.clone(),
                })
                .collect(),
            machines: inventory
                .machines()
                .map(|m| MachineRecord {
                    id: m.id,
                    name: m.name.clone(),
                    node: m.node_name.clone(),
                    group: m.group,
                })
                .collect(),
            devices: inventory
                .devices()
                .map(|d| DeviceRecord {
                    id: d.id,
                    name: d.name.clone(),
                    device_type: d.device_type,
                    vendor: d.vendor.clone(),
                    model: d.model.clone(),
                    group: d.group,
                    machine: d.machine,
                })
                .collect(),
        }
    }
}
