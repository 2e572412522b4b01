use super::molecule::MoleculeList;
use serde::{Deserialize, Serialize};

/// One working dataset: a complete molecule-residue-spin tree.
///
/// Every query and mutation in [`crate::engine`] takes the hierarchy it
/// operates on explicitly; there is no process-global current dataset.
/// Callers holding several hierarchies (for example when correlating two
/// datasets believed to share the same sequence) are responsible for
/// serializing access themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub molecules: MoleculeList,
}

impl Hierarchy {
    /// Creates an empty hierarchy holding the placeholder chain
    /// molecule -> residue -> spin.
    pub fn new() -> Self {
        Self {
            molecules: MoleculeList::new(),
        }
    }

    /// True if no molecule, residue, or spin data has been added yet.
    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_new_hierarchy_holds_the_placeholder_chain() {
        let hier = Hierarchy::new();
        assert!(hier.is_empty());
        assert_eq!(hier.molecules.len(), 1);
        assert_eq!(hier.molecules[0].residues.len(), 1);
        assert_eq!(hier.molecules[0].residues[0].spins.len(), 1);
    }
}
