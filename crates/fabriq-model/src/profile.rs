//! Demand and inventory profiles keyed by resource model.

use std::collections::BTreeMap;
use std::fmt;

use crate::ids::MachineId;
use crate::resource::ResourceModel;

/// Counts per resource model, ordered by model specificity.
///
/// A key exists from its first injection onward, even at count zero. The
/// planner treats a zero entry as an explicit statement ("this machine
/// wants none of these"), distinct from a key that was never mentioned,
/// so `get` only answers `None` for models nobody has injected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    counts: BTreeMap<ResourceModel, i64>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to the model's tally, creating the entry if absent.
    pub fn inject(&mut self, model: ResourceModel, count: i64) {
        *self.counts.entry(model).or_insert(0) += count;
    }

    pub fn get(&self, model: &ResourceModel) -> Option<i64> {
        self.counts.get(model).copied()
    }

    /// Models in specificity order.
    pub fn keys(&self) -> impl Iterator<Item = &ResourceModel> {
        self.counts.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceModel, i64)> {
        self.counts.iter().map(|(model, count)| (model, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fold another profile into this one, entry by entry. Zero entries
    /// carry over as zero entries.
    pub fn absorb(&mut self, other: &Profile) {
        for (model, count) in other.iter() {
            self.inject(model.clone(), count);
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (model, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{model}={count}")?;
            first = false;
        }
        Ok(())
    }
}

/// A machine together with the profile describing what it holds or wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineProfile {
    pub machine: MachineId,
    pub profile: Profile,
}

impl MachineProfile {
    pub fn new(machine: MachineId) -> Self {
        Self {
            machine,
            profile: Profile::new(),
        }
    }
}
