//! Demand document — per-machine resource wants.
//!
//! Wants name machines and groups by their fabric names and carry an
//! optional vendor/model pair narrowing the matcher. Resolution happens
//! against an inventory, and every malformed or conflicting entry is
//! rejected here, before any allocation work starts.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fabriq_inventory::{ClusterLayout, Inventory};
use fabriq_model::{DeviceType, MachineId, ResourceModel};

use crate::error::DemandError;

/// One machine's want of one resource model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Want {
    pub machine: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub count: i64,
}

impl Want {
    /// The matcher this want describes. A model without a vendor is
    /// rejected; there is no "any vendor's A100" matcher.
    fn resource_model(&self) -> Result<ResourceModel, DemandError> {
        match (&self.vendor, &self.model) {
            (Some(vendor), Some(model)) => Ok(ResourceModel::specific(
                self.device_type,
                vendor.clone(),
                model.clone(),
            )),
            (Some(vendor), None) => Ok(ResourceModel::vendor(self.device_type, vendor.clone())),
            (None, None) => Ok(ResourceModel::generic(self.device_type)),
            (None, Some(_)) => Err(DemandError::ModelWithoutVendor {
                machine: self.machine.clone(),
            }),
        }
    }
}

/// On-disk demand for one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandSpec {
    pub group: String,
    #[serde(default)]
    pub wants: Vec<Want>,
}

impl DemandSpec {
    pub fn load(path: &Path) -> Result<Self, DemandError> {
        let text = fs::read_to_string(path)?;
        let spec = toml::from_str(&text)?;
        debug!(path = %path.display(), "demand loaded");
        Ok(spec)
    }

    /// Resolve names against the inventory and build the demand layout.
    ///
    /// A zero count is meaningful twice over: it pins the machine into
    /// the layout (a machine whose wants sum to nothing gets stripped of
    /// its devices) and it excludes its model from broader wants on the
    /// same machine.
    pub fn into_layout(&self, inventory: &Inventory) -> Result<ClusterLayout, DemandError> {
        let group = inventory
            .group_by_name(&self.group)
            .ok_or_else(|| DemandError::UnknownGroup(self.group.clone()))?;

        let mut layout = ClusterLayout::new(group.id);
        let mut seen: BTreeSet<(MachineId, ResourceModel)> = BTreeSet::new();
        for want in &self.wants {
            if want.count < 0 {
                return Err(DemandError::NegativeCount {
                    machine: want.machine.clone(),
                    count: want.count,
                });
            }
            let machine = inventory
                .machine_by_name(&want.machine)
                .ok_or_else(|| DemandError::UnknownMachine(want.machine.clone()))?;
            if machine.group != group.id {
                return Err(DemandError::MachineNotInGroup {
                    machine: want.machine.clone(),
                    group: self.group.clone(),
                });
            }
            let model = want.resource_model()?;
            if !seen.insert((machine.id, model.clone())) {
                return Err(DemandError::DuplicateWant {
                    machine: want.machine.clone(),
                    model,
                });
            }
            layout.ensure_machine(machine.id).inject(model, want.count);
        }
        debug!(group = %self.group, wants = self.wants.len(), "demand resolved");
        Ok(layout)
    }
}
