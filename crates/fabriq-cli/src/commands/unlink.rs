use std::path::Path;

use anyhow::anyhow;

use fabriq_fabric::{FabricSnapshot, SimFabric, execute_plan};
use fabriq_inventory::ClusterLayout;
use fabriq_planner::compute_plan;

use super::plan::print_plan;

pub async fn unlink(fabric: &Path, machine: &str, commit: bool) -> anyhow::Result<()> {
    let mut inventory = FabricSnapshot::load(fabric)?.into_inventory()?;

    let target = inventory
        .machine_by_name(machine)
        .ok_or_else(|| anyhow!("no machine named {machine}"))?;
    let (machine_id, group) = (target.id, target.group);

    // An empty profile strips the machine; machines absent from the
    // layout are never touched.
    let mut layout = ClusterLayout::new(group);
    layout.ensure_machine(machine_id);

    let plan = compute_plan(&inventory, &layout)?;
    print_plan(&plan);

    if commit {
        let sim = SimFabric::new(inventory.clone());
        let summary = execute_plan(&sim, &mut inventory, &plan).await?;
        println!(
            "✓ Applied {} actions ({} detached)",
            summary.actions_applied, summary.devices_detached
        );
        FabricSnapshot::from_inventory(&sim.inventory().await).save(fabric)?;
        println!("  Snapshot: {}", fabric.display());
    }

    Ok(())
}
