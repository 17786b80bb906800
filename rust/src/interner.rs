//! Machine name interning.
//!
//! Environments are described with machine names (e.g. `"cat0_m0"`), while the
//! rank tables and timelines are indexed by dense integer IDs.

use rustc_hash::FxHashMap;

use crate::models::MachineId;

/// Bidirectional map between machine names and dense machine IDs.
///
/// IDs are handed out in insertion order, which is also the machine
/// iteration order used for tie-breaking.
#[derive(Debug, Clone)]
pub struct NameInterner {
    to_id: FxHashMap<String, MachineId>,
    from_id: Vec<String>,
}

impl NameInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_id: Vec::with_capacity(capacity),
        }
    }

    /// Intern a name, returning its ID and whether it was newly added.
    pub fn intern(&mut self, name: &str) -> (MachineId, bool) {
        if let Some(&id) = self.to_id.get(name) {
            return (id, false);
        }
        let id = self.from_id.len();
        self.from_id.push(name.to_string());
        self.to_id.insert(name.to_string(), id);
        (id, true)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<MachineId> {
        self.to_id.get(name).copied()
    }

    #[inline]
    pub fn resolve(&self, id: MachineId) -> Option<&str> {
        self.from_id.get(id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.from_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_id.is_empty()
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
