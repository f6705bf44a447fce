use std::path::Path;

use fabriq_fabric::{DemandSpec, FabricSnapshot, SimFabric, reconcile};

use super::plan::print_plan;

pub async fn apply(fabric: &Path, demand: &Path) -> anyhow::Result<()> {
    let snapshot = FabricSnapshot::load(fabric)?;
    let spec = DemandSpec::load(demand)?;

    let sim = SimFabric::from_snapshot(snapshot)?;
    let (plan, summary) = reconcile(&sim, &spec).await?;

    print_plan(&plan);
    println!(
        "✓ Applied {} actions ({} attached, {} detached)",
        summary.actions_applied, summary.devices_attached, summary.devices_detached
    );

    FabricSnapshot::from_inventory(&sim.inventory().await).save(fabric)?;
    println!("  Snapshot: {}", fabric.display());

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

[[devices]]
id = 1
name = "a100-1"
type = "gpu"
vendor = "NVIDIA"
model = "A100"
group = 1
"#;

    const DEMAND: &str = r#"
group = "rack-a"

[[wants]]
machine = "m1"
type = "gpu"
vendor = "NVIDIA"
model = "A100"
count = 1
"#;

    #[tokio::test]
    async fn apply_executes_the_plan_and_saves_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let fabric = dir.path().join("fabric.toml");
        let demand = dir.path().join("demand.toml");
        fs::write(&fabric, FABRIC).unwrap();
        fs::write(&demand, DEMAND).unwrap();

        apply(&fabric, &demand).await.unwrap();

        let snapshot = FabricSnapshot::load(&fabric).unwrap();
        let device = snapshot.devices.iter().find(|d| d.name == "a100-1").unwrap();
        assert_eq!(device.machine.map(|m| m.0), Some(10));
    }
}
