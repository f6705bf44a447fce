//! The controller operations the executor needs, behind one trait.
//!
//! Implementations wrap a real composable-fabric controller or the
//! in-memory [`SimFabric`]. Devices cross this boundary by name, never
//! by raw id, because names are what controller APIs accept.
//!
//! [`SimFabric`]: crate::sim::SimFabric

use std::future::Future;
use std::pin::Pin;

use fabriq_model::MachineId;

use crate::error::FabricResult;
use crate::snapshot::FabricSnapshot;

/// Boxed future alias for fabric call results.
pub type FabricFuture<'a, T> = Pin<Box<dyn Future<Output = FabricResult<T>> + Send + 'a>>;

/// A composable-fabric controller.
///
/// Every method maps to one controller transaction. `reconfigure_machine`
/// is the combined form: the controller applies the detaches and attaches
/// as a unit, so a swap confined to one machine needs no intermediate
/// free-pool state.
pub trait FabricClient: Send + Sync {
    /// Bulk-fetch the whole fabric: groups, machines, devices, placement.
    fn fetch_snapshot(&self) -> FabricFuture<'_, FabricSnapshot>;

    /// Attach one free device to a machine.
    fn attach_device<'a>(&'a self, device: &'a str, machine: MachineId) -> FabricFuture<'a, ()>;

    /// Detach one device from the machine currently holding it.
    fn detach_device<'a>(&'a self, device: &'a str, machine: MachineId) -> FabricFuture<'a, ()>;

    /// Detach and attach on one machine in a single transaction.
    fn reconfigure_machine<'a>(
        &'a self,
        machine: MachineId,
        attach: &'a [String],
        detach: &'a [String],
    ) -> FabricFuture<'a, ()>;
}
