use std::path::Path;

use fabriq_fabric::FabricSnapshot;

pub fn resources(fabric: &Path) -> anyhow::Result<()> {
    let inventory = FabricSnapshot::load(fabric)?.into_inventory()?;

    for group in inventory.groups() {
        println!("group {} ({})", group.name, group.id);
        for machine in inventory.machines_in_group(group.id) {
            println!("  machine {} on {}", machine.name, machine.node_name);
            for device in inventory.devices_on_machine(machine.id) {
                println!("    {}  {}", device.name, device.specific_model());
            }
        }
        let free: Vec<_> = inventory
            .devices_in_group(group.id)
            .filter(|d| !d.is_attached())
            .collect();
        if !free.is_empty() {
            println!("  free");
            for device in free {
                println!("    {}  {}", device.name, device.specific_model());
            }
        }
    }

    let ungrouped: Vec<_> = inventory.devices().filter(|d| d.group.is_none()).collect();
    if !ungrouped.is_empty() {
        println!("ungrouped");
        for device in ungrouped {
            println!("    {}  {}", device.name, device.specific_model());
        }
    }

    Ok(())
}
