//! fabriq-model — resource matchers, profiles, and shared ids.
//!
//! The model crate is the leaf of the workspace: the typed ids every other
//! crate keys on, the `ResourceModel` matcher family with its "most specific
//! wins" total order, and the `Profile` count map demand and snapshots are
//! expressed in. Everything here is pure value semantics; there are no
//! failure modes and no I/O.

pub mod ids;
pub mod profile;
pub mod resource;

pub use ids::{DeviceId, GroupId, MachineId};
pub use profile::{MachineProfile, Profile};
pub use resource::{DeviceType, ResourceModel};
