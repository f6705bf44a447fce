//! fabriq-inventory — fabric read model and layout capture.
//!
//! The [`Inventory`] is the shared snapshot every planning step consults:
//! which devices exist, what hardware they are, and where they currently
//! sit (machine, group free pool, or loose). It is never re-fetched
//! mid-operation; callers advance it through the narrow `notify_*` event
//! API as real fabric changes commit, so any inventory state is
//! reproducible from its event log.
//!
//! [`ClusterLayout`] captures one group's placement as per-machine
//! profiles plus an unassigned profile, and doubles as the structure
//! demand is expressed in.

pub mod error;
pub mod inventory;
pub mod layout;
pub mod types;

pub use error::{InventoryError, InventoryResult};
pub use inventory::Inventory;
pub use layout::ClusterLayout;
pub use types::{Device, Group, Machine};
