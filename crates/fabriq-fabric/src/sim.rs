//! In-memory fabric controller.
//!
//! `SimFabric` stands in for the real controller in tests and offline
//! planning. It enforces the legality rules real hardware would: an
//! attach must name a free device, a detach must name a device on that
//! machine, and a reconfigure applies both sides or neither.

use tokio::sync::RwLock;
use tracing::debug;

use fabriq_inventory::Inventory;
use fabriq_model::MachineId;

use crate::client::{FabricClient, FabricFuture};
use crate::error::{FabricError, FabricResult, SnapshotError};
use crate::snapshot::FabricSnapshot;

pub struct SimFabric {
    state: RwLock<Inventory>,
}

impl SimFabric {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            state: RwLock::new(inventory),
        }
    }

    pub fn from_snapshot(snapshot: FabricSnapshot) -> Result<Self, SnapshotError> {
        Ok(Self::new(snapshot.into_inventory()?))
    }

    /// Copy of the current fabric state.
    pub async fn inventory(&self) -> Inventory {
        self.state.read().await.clone()
    }

    fn apply_attach(
        inventory: &mut Inventory,
        device: &str,
        machine: MachineId,
    ) -> FabricResult<()> {
        if inventory.machine(machine).is_none() {
            return Err(FabricError::UnknownMachine(machine));
        }
        let id = inventory
            .device_by_name(device)
            .map(|d| d.id)
            .ok_or_else(|| FabricError::UnknownDevice(device.to_string()))?;
        inventory.notify_device_attached(id, machine)?;
        Ok(())
    }

    fn apply_detach(
        inventory: &mut Inventory,
        device: &str,
        machine: MachineId,
    ) -> FabricResult<()> {
        if inventory.machine(machine).is_none() {
            return Err(FabricError::UnknownMachine(machine));
        }
        let record = inventory
            .device_by_name(device)
            .ok_or_else(|| FabricError::UnknownDevice(device.to_string()))?;
        if record.machine != Some(machine) {
            return Err(FabricError::DeviceNotOnMachine {
                device: device.to_string(),
                machine,
            });
        }
        let id = record.id;
        inventory.notify_device_detached(id)?;
        Ok(())
    }
}

impl FabricClient for SimFabric {
    fn fetch_snapshot(&self) -> FabricFuture<'_, FabricSnapshot> {
        Box::pin(async move {
            let inventory = self.state.read().await;
            Ok(FabricSnapshot::from_inventory(&inventory))
        })
    }

    fn attach_device<'a>(&'a self, device: &'a str, machine: MachineId) -> FabricFuture<'a, ()> {
        Box::pin(async move {
            let mut inventory = self.state.write().await;
            Self::apply_attach(&mut inventory, device, machine)?;
            debug!(device, %machine, "sim attach");
            Ok(())
        })
    }

    fn detach_device<'a>(&'a self, device: &'a str, machine: MachineId) -> FabricFuture<'a, ()> {
        Box::pin(async move {
            let mut inventory = self.state.write().await;
            Self::apply_detach(&mut inventory, device, machine)?;
            debug!(device, %machine, "sim detach");
            Ok(())
        })
    }

    fn reconfigure_machine<'a>(
        &'a self,
        machine: MachineId,
        attach: &'a [String],
        detach: &'a [String],
    ) -> FabricFuture<'a, ()> {
        Box::pin(async move {
            let mut inventory = self.state.write().await;
            // Stage on a copy so a rejected half applies nothing.
            let mut staged = inventory.clone();
            for device in detach {
                Self::apply_detach(&mut staged, device, machine)?;
            }
            for device in attach {
                Self::apply_attach(&mut staged, device, machine)?;
            }
            *inventory = staged;
            debug!(%machine, attached = attach.len(), detached = detach.len(), "sim reconfigure");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabriq_inventory::{Device, Group, Machine};
    use fabriq_model::{DeviceId, DeviceType, GroupId};

    fn fabric() -> SimFabric {
        let mut inv = Inventory::new();
        inv.notify_group_created(Group {
            id: GroupId(1),
            name: "rack".to_string(),
        })
        .unwrap();
        for n in [1u32, 2] {
            inv.notify_machine_created(Machine {
                id: MachineId(n * 10),
                name: format!("m{n}"),
                node_name: format!("node-{n}"),
                group: GroupId(1),
            })
            .unwrap();
        }
        for id in 1u32..=2 {
            inv.notify_device_created(Device {
                id: DeviceId(id),
                name: format!("gpu-{id}"),
                device_type: DeviceType::Gpu,
                vendor: "NVIDIA".to_string(),
                model: "A100".to_string(),
                group: Some(GroupId(1)),
                machine: None,
            })
            .unwrap();
        }
        SimFabric::new(inv)
    }

    #[tokio::test]
    async fn attach_moves_a_free_device() {
        let fabric = fabric();
        fabric.attach_device("gpu-1", MachineId(10)).await.unwrap();

        let inv = fabric.inventory().await;
        assert_eq!(inv.device(DeviceId(1)).unwrap().machine, Some(MachineId(10)));
    }

    #[tokio::test]
    async fn attach_of_an_owned_device_is_illegal() {
        let fabric = fabric();
        fabric.attach_device("gpu-1", MachineId(10)).await.unwrap();

        let err = fabric.attach_device("gpu-1", MachineId(20)).await.unwrap_err();
        assert!(matches!(err, FabricError::State(_)));
    }

    #[tokio::test]
    async fn detach_requires_the_current_owner() {
        let fabric = fabric();
        fabric.attach_device("gpu-1", MachineId(10)).await.unwrap();

        let err = fabric.detach_device("gpu-1", MachineId(20)).await.unwrap_err();
        assert!(matches!(err, FabricError::DeviceNotOnMachine { .. }));

        fabric.detach_device("gpu-1", MachineId(10)).await.unwrap();
        let inv = fabric.inventory().await;
        assert_eq!(inv.device(DeviceId(1)).unwrap().machine, None);
    }

    #[tokio::test]
    async fn unknown_names_are_rejected() {
        let fabric = fabric();
        assert!(matches!(
            fabric.attach_device("gpu-9", MachineId(10)).await.unwrap_err(),
            FabricError::UnknownDevice(_)
        ));
        assert!(matches!(
            fabric.attach_device("gpu-1", MachineId(99)).await.unwrap_err(),
            FabricError::UnknownMachine(_)
        ));
    }

    #[tokio::test]
    async fn reconfigure_applies_both_sides_or_neither() {
        let fabric = fabric();
        fabric.attach_device("gpu-1", MachineId(10)).await.unwrap();
        fabric.attach_device("gpu-2", MachineId(20)).await.unwrap();

        // gpu-2 is owned by machine 20, so the attach half must fail and
        // the detach half must not survive either.
        let attach = vec!["gpu-2".to_string()];
        let detach = vec!["gpu-1".to_string()];
        let err = fabric
            .reconfigure_machine(MachineId(10), &attach, &detach)
            .await
            .unwrap_err();
        assert!(matches!(err, FabricError::State(_)));

        let inv = fabric.inventory().await;
        assert_eq!(inv.device(DeviceId(1)).unwrap().machine, Some(MachineId(10)));
        assert_eq!(inv.device(DeviceId(2)).unwrap().machine, Some(MachineId(20)));
    }

    #[tokio::test]
    async fn snapshot_reflects_mutations() {
        let fabric = fabric();
        fabric.attach_device("gpu-1", MachineId(10)).await.unwrap();

        let snapshot = fabric.fetch_snapshot().await.unwrap();
        let device = snapshot.devices.iter().find(|d| d.name == "gpu-1").unwrap();
        assert_eq!(device.machine, Some(MachineId(10)));
    }
}
