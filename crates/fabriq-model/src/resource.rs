//! Resource matchers and their specificity ordering.
//!
//! A `ResourceModel` is what an operator asks for: "any GPU", "any NVIDIA
//! GPU", or "exactly an NVIDIA A100". The three variants form a closed set
//! with a total order that sorts more specific requests first, so that
//! overlapping requests are always resolved in the same deterministic
//! sequence.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of composable device the fabric can attach to a machine.
///
/// Declaration order is load-bearing: it is the primary sort key of the
/// `ResourceModel` total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Cpu,
    Fpga,
    Gpu,
    Link,
    Memory,
    Ssd,
}

impl DeviceType {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Cpu => "cpu",
            DeviceType::Fpga => "fpga",
            DeviceType::Gpu => "gpu",
            DeviceType::Link => "link",
            DeviceType::Memory => "memory",
            DeviceType::Ssd => "ssd",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A matcher over devices, from loosest to tightest.
///
/// Two models are equal iff they are the same variant with the same fields.
/// The `Ord` impl is the single comparator every planner walk relies on
/// (see [`compare`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceModel {
    /// Matches any device of the type.
    Generic { device_type: DeviceType },
    /// Matches devices of the type from one vendor.
    Vendor { device_type: DeviceType, vendor: String },
    /// Matches exactly one vendor model.
    Specific {
        device_type: DeviceType,
        vendor: String,
        model: String,
    },
}

impl ResourceModel {
    pub fn generic(device_type: DeviceType) -> Self {
        ResourceModel::Generic { device_type }
    }

    pub fn vendor(device_type: DeviceType, vendor: impl Into<String>) -> Self {
        ResourceModel::Vendor {
            device_type,
            vendor: vendor.into(),
        }
    }

    pub fn specific(
        device_type: DeviceType,
        vendor: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        ResourceModel::Specific {
            device_type,
            vendor: vendor.into(),
            model: model.into(),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        match self {
            ResourceModel::Generic { device_type }
            | ResourceModel::Vendor { device_type, .. }
            | ResourceModel::Specific { device_type, .. } => *device_type,
        }
    }

    /// Vendor restriction, if the variant carries one.
    pub fn vendor_name(&self) -> Option<&str> {
        match self {
            ResourceModel::Generic { .. } => None,
            ResourceModel::Vendor { vendor, .. } | ResourceModel::Specific { vendor, .. } => {
                Some(vendor)
            }
        }
    }

    /// Model restriction, if the variant carries one.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            ResourceModel::Specific { model, .. } => Some(model),
            _ => None,
        }
    }

    /// Variant rank: lower is more specific.
    fn rank(&self) -> u8 {
        match self {
            ResourceModel::Specific { .. } => 0,
            ResourceModel::Vendor { .. } => 1,
            ResourceModel::Generic { .. } => 2,
        }
    }

    /// Does a concrete device satisfy this matcher?
    pub fn matches(&self, device_type: DeviceType, vendor: &str, model: &str) -> bool {
        if device_type != self.device_type() {
            return false;
        }
        match self {
            ResourceModel::Generic { .. } => true,
            ResourceModel::Vendor { vendor: v, .. } => v == vendor,
            ResourceModel::Specific {
                vendor: v,
                model: m,
                ..
            } => v == vendor && m == model,
        }
    }

    /// True when this matcher is strictly finer than `other` and its
    /// vendor/model fields fall inside `other`'s match set. Used to find
    /// the restrictions a broad request must honor.
    pub fn is_more_specific_than(&self, other: &ResourceModel) -> bool {
        if self.device_type() != other.device_type() || self.rank() >= other.rank() {
            return false;
        }
        match other {
            ResourceModel::Generic { .. } => true,
            ResourceModel::Vendor { vendor, .. } => self.vendor_name() == Some(vendor.as_str()),
            // rank() already rules this out: nothing is finer than Specific.
            ResourceModel::Specific { .. } => false,
        }
    }

    /// True when some device could match both models.
    pub fn overlaps(&self, other: &ResourceModel) -> bool {
        if self.device_type() != other.device_type() {
            return false;
        }
        match (self, other) {
            (ResourceModel::Generic { .. }, _) | (_, ResourceModel::Generic { .. }) => true,
            (ResourceModel::Vendor { vendor: a, .. }, ResourceModel::Vendor { vendor: b, .. }) => {
                a == b
            }
            (ResourceModel::Vendor { vendor: a, .. }, ResourceModel::Specific { vendor: b, .. })
            | (ResourceModel::Specific { vendor: a, .. }, ResourceModel::Vendor { vendor: b, .. }) => {
                a == b
            }
            (
                ResourceModel::Specific {
                    vendor: va,
                    model: ma,
                    ..
                },
                ResourceModel::Specific {
                    vendor: vb,
                    model: mb,
                    ..
                },
            ) => va == vb && ma == mb,
        }
    }
}

/// The one total-order comparator for resource models.
///
/// Keys, in order: device type (declaration order), variant rank
/// (Specific < Vendor < Generic), vendor name, model name. Every ordered
/// walk in the planner goes through this function, so changing it changes
/// allocation precedence everywhere at once.
pub fn compare(a: &ResourceModel, b: &ResourceModel) -> Ordering {
    a.device_type()
        .cmp(&b.device_type())
        .then_with(|| a.rank().cmp(&b.rank()))
        .then_with(|| a.vendor_name().unwrap_or("").cmp(b.vendor_name().unwrap_or("")))
        .then_with(|| a.model_name().unwrap_or("").cmp(b.model_name().unwrap_or("")))
}

impl Ord for ResourceModel {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl PartialOrd for ResourceModel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(compare(self, other))
    }
}

impl fmt::Display for ResourceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceModel::Generic { device_type } => write!(f, "{device_type}"),
            ResourceModel::Vendor {
                device_type,
                vendor,
            } => write!(f, "{device_type}/{vendor}"),
            ResourceModel::Specific {
                device_type,
                vendor,
                model,
            } => write!(f, "{device_type}/{vendor}/{model}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a100() -> ResourceModel {
        ResourceModel::specific(DeviceType::Gpu, "NVIDIA", "A100")
    }

    fn nvidia() -> ResourceModel {
        ResourceModel::vendor(DeviceType::Gpu, "NVIDIA")
    }

    fn any_gpu() -> ResourceModel {
        ResourceModel::generic(DeviceType::Gpu)
    }

    #[test]
    fn device_types_keep_declaration_order() {
        let mut types = vec![
            DeviceType::Ssd,
            DeviceType::Gpu,
            DeviceType::Cpu,
            DeviceType::Memory,
            DeviceType::Fpga,
            DeviceType::Link,
        ];
        types.sort();
        assert_eq!(
            types,
            vec![
                DeviceType::Cpu,
                DeviceType::Fpga,
                DeviceType::Gpu,
                DeviceType::Link,
                DeviceType::Memory,
                DeviceType::Ssd,
            ]
        );
    }

    #[test]
    fn specific_sorts_before_vendor_before_generic() {
        let mut models = vec![any_gpu(), nvidia(), a100()];
        models.sort();
        assert_eq!(models, vec![a100(), nvidia(), any_gpu()]);
    }

    #[test]
    fn ordering_groups_by_type_first() {
        let cpu_generic = ResourceModel::generic(DeviceType::Cpu);
        let ssd_specific = ResourceModel::specific(DeviceType::Ssd, "Samsung", "PM9A3");
        let mut models = vec![ssd_specific.clone(), a100(), cpu_generic.clone(), nvidia()];
        models.sort();
        // All GPU entries stay together after the CPU entry, SSD last.
        assert_eq!(models, vec![cpu_generic, a100(), nvidia(), ssd_specific]);
    }

    #[test]
    fn ties_break_on_vendor_then_model() {
        let intel = ResourceModel::vendor(DeviceType::Gpu, "Intel");
        let l40 = ResourceModel::specific(DeviceType::Gpu, "NVIDIA", "L40");
        assert_eq!(compare(&intel, &nvidia()), Ordering::Less);
        assert_eq!(compare(&a100(), &l40), Ordering::Less);
    }

    #[test]
    fn matches_respects_each_variant() {
        assert!(any_gpu().matches(DeviceType::Gpu, "Intel", "A770"));
        assert!(!any_gpu().matches(DeviceType::Ssd, "Intel", "A770"));

        assert!(nvidia().matches(DeviceType::Gpu, "NVIDIA", "L40"));
        assert!(!nvidia().matches(DeviceType::Gpu, "Intel", "A770"));

        assert!(a100().matches(DeviceType::Gpu, "NVIDIA", "A100"));
        assert!(!a100().matches(DeviceType::Gpu, "NVIDIA", "L40"));
    }

    #[test]
    fn more_specific_requires_compatible_fields() {
        assert!(a100().is_more_specific_than(&nvidia()));
        assert!(a100().is_more_specific_than(&any_gpu()));
        assert!(nvidia().is_more_specific_than(&any_gpu()));

        // Vendor mismatch breaks the superset relation.
        let intel = ResourceModel::vendor(DeviceType::Gpu, "Intel");
        assert!(!a100().is_more_specific_than(&intel));

        // Never reflexive, never across types, never coarser-than.
        assert!(!a100().is_more_specific_than(&a100()));
        assert!(!any_gpu().is_more_specific_than(&a100()));
        assert!(!nvidia().is_more_specific_than(&ResourceModel::generic(DeviceType::Ssd)));
    }

    #[test]
    fn overlap_matrix() {
        let intel = ResourceModel::vendor(DeviceType::Gpu, "Intel");
        let l40 = ResourceModel::specific(DeviceType::Gpu, "NVIDIA", "L40");

        assert!(any_gpu().overlaps(&a100()));
        assert!(a100().overlaps(&any_gpu()));
        assert!(nvidia().overlaps(&a100()));
        assert!(!nvidia().overlaps(&intel));
        assert!(!a100().overlaps(&l40));
        assert!(a100().overlaps(&a100()));
        assert!(!any_gpu().overlaps(&ResourceModel::generic(DeviceType::Cpu)));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(any_gpu().to_string(), "gpu");
        assert_eq!(nvidia().to_string(), "gpu/NVIDIA");
        assert_eq!(a100().to_string(), "gpu/NVIDIA/A100");
    }
}
