use std::path::Path;

use fabriq_fabric::{DemandSpec, FabricSnapshot};
use fabriq_planner::{Plan, compute_plan};

pub fn plan(fabric: &Path, demand: &Path, format: &str) -> anyhow::Result<()> {
    let inventory = FabricSnapshot::load(fabric)?.into_inventory()?;
    let spec = DemandSpec::load(demand)?;
    let layout = spec.into_layout(&inventory)?;
    let plan = compute_plan(&inventory, &layout)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
        _ => print_plan(&plan),
    }

    Ok(())
}

pub(crate) fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("Nothing to do.");
        return;
    }
    for (index, action) in plan.actions.iter().enumerate() {
        println!("{:>3}. {action}", index + 1);
    }
}
