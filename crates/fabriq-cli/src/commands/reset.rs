use std::path::Path;

use anyhow::{anyhow, bail};

use fabriq_fabric::{FabricSnapshot, SimFabric, execute_plan};
use fabriq_inventory::ClusterLayout;
use fabriq_planner::compute_plan;

use super::plan::print_plan;

pub async fn reset(fabric: &Path, group: Option<&str>, commit: bool) -> anyhow::Result<()> {
    let mut inventory = FabricSnapshot::load(fabric)?.into_inventory()?;

    let group_id = match group {
        Some(name) => {
            inventory
                .group_by_name(name)
                .ok_or_else(|| anyhow!("no group named {name}"))?
                .id
        }
        None => {
            let mut groups = inventory.groups();
            match (groups.next(), groups.next()) {
                (Some(only), None) => only.id,
                (None, _) => bail!("snapshot holds no groups"),
                _ => bail!("snapshot holds several groups, pass --group"),
            }
        }
    };

    // Every machine pinned with an empty profile: strip them all.
    let machines: Vec<_> = inventory
        .machines_in_group(group_id)
        .map(|m| m.id)
        .collect();
    let mut layout = ClusterLayout::new(group_id);
    for machine in machines {
        layout.ensure_machine(machine);
    }

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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FABRIC: &str = r#"
[[groups]]
id = 1
name = "rack-a"

[[machines]]
id = 10
name = "m1"
node = "node-1"
group = 1

[[machines]]
id = 20
name = "m2"
node = "node-2"
group = 1

[[devices]]
id = 1
name = "a100-1"
type = "gpu"
vendor = "NVIDIA"
model = "A100"
group = 1
machine = 10

[[devices]]
id = 2
name = "a770-1"
type = "gpu"
vendor = "Intel"
model = "A770"
group = 1
machine = 20
"#;

    #[tokio::test]
    async fn reset_commit_strips_every_machine_in_the_group() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = dir.path().join("fabric.toml");
        fs::write(&fabric, FABRIC).unwrap();

        reset(&fabric, None, true).await.unwrap();

        let snapshot = FabricSnapshot::load(&fabric).unwrap();
        assert!(snapshot.devices.iter().all(|d| d.machine.is_none()));
    }

    #[tokio::test]
    async fn reset_without_commit_leaves_the_snapshot_alone() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = dir.path().join("fabric.toml");
        fs::write(&fabric, FABRIC).unwrap();

        reset(&fabric, None, false).await.unwrap();

        let snapshot = FabricSnapshot::load(&fabric).unwrap();
        assert!(snapshot.devices.iter().all(|d| d.machine.is_some()));
    }

    #[tokio::test]
    async fn reset_with_several_groups_needs_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = dir.path().join("fabric.toml");
        let mut text = FABRIC.to_string();
        text.push_str("\n[[groups]]\nid = 2\nname = \"rack-b\"\n");
        fs::write(&fabric, text).unwrap();

        assert!(reset(&fabric, None, false).await.is_err());
        assert!(reset(&fabric, Some("rack-a"), false).await.is_ok());
    }
}
