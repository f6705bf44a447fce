//! fabriq-planner — turns declared demand into an ordered action plan.
//!
//! The planner never talks to a fabric. It reads an `Inventory` snapshot
//! and a demand `ClusterLayout`, and emits a `Plan` whose actions are safe
//! to execute strictly in order: a device is never attached anywhere
//! before the action that frees it.
//!
//! # Architecture
//!
//! ```text
//! compute_plan
//!   ├── populate_allocations   per-model candidate lists, specificity order
//!   ├── claim_devices          first-fit claims, shortfall = hard error
//!   └── VarianceSet            desired-minus-current deltas
//!         └── get_action       drains one action at a time, bifurcating
//!                              blocked swaps into detach-first halves
//! ```
//!
//! # Components
//!
//! - **`allocator`** — candidate ordering and allocation claiming
//! - **`variance`** — per-machine deltas and their incremental drain
//! - **`plan`** — `Action`/`Plan` output types and `compute_plan`
//! - **`error`** — `PlanError`

pub mod allocator;
pub mod error;
pub mod plan;
pub mod variance;

pub use allocator::{Allocation, claim_devices, ordered_device_ids, populate_allocations};
pub use error::{PlanError, PlanResult};
pub use plan::{Action, Plan, compute_plan};
pub use variance::{Variance, VarianceSet};
