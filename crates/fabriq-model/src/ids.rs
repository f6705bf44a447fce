//! Typed identifiers for fabric entities.
//!
//! The fabric controller hands out small integer ids for devices, machines,
//! and groups. Keeping them as distinct newtypes stops a machine id from
//! ever being used where a device id is expected; ordering on the inner
//! integer is what gives the planner its deterministic ascending-id walks.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! fabric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

fabric_id!(
    /// Identifier of a single composable device on the fabric.
    DeviceId
);
fabric_id!(
    /// Identifier of a fabric machine (a logical host built from devices).
    MachineId
);
fabric_id!(
    /// Identifier of a fabric group (a pool reserved for one consumer).
    GroupId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_inner_value() {
        let mut ids = vec![DeviceId(30), DeviceId(2), DeviceId(17)];
        ids.sort();
        assert_eq!(ids, vec![DeviceId(2), DeviceId(17), DeviceId(30)]);
    }

    #[test]
    fn display_is_the_raw_number() {
        assert_eq!(MachineId(42).to_string(), "42");
        assert_eq!(GroupId(7).to_string(), "7");
    }
}
