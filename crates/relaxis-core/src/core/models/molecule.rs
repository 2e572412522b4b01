use super::attributes::AttributeMap;
use super::identity::Identity;
use super::residue::ResidueList;
use super::{DuplicateError, Level};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A molecule and the residues it owns.
///
/// The name corresponds to that of the structure file when one was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub name: Option<String>,
    pub select: bool,
    pub residues: ResidueList,
    pub attributes: AttributeMap,
}

impl Molecule {
    pub(crate) fn new(name: Option<&str>, select: bool) -> Self {
        Self {
            name: name.map(str::to_string),
            select,
            residues: ResidueList::new(),
            attributes: AttributeMap::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::from_fields(None, self.name.as_deref())
    }

    /// True if the name is unset, no data has been attached, and the owned
    /// residue list is itself empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.attributes.is_empty() && self.residues.is_empty()
    }
}

impl Default for Molecule {
    fn default() -> Self {
        Self::new(None, true)
    }
}

/// The ordered, never-empty list of molecules in a hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeList(Vec<Molecule>);

impl MoleculeList {
    /// Creates the list holding the initial placeholder molecule.
    pub fn new() -> Self {
        MoleculeList(vec![Molecule::default()])
    }

    /// True if the list holds only the untouched placeholder molecule.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Molecule> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Molecule> {
        self.0.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Molecule> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Molecule> {
        self.0.get_mut(index)
    }

    /// Adds a molecule, overwriting the placeholder if the list is empty.
    ///
    /// Fails without mutating the list if the name collides with an existing
    /// sibling. Returns the freshly added molecule.
    pub fn add_item(&mut self, name: Option<&str>) -> Result<&mut Molecule, DuplicateError> {
        let key = Identity::from_fields(None, name);
        if self.0.iter().any(|mol| mol.identity() == key) {
            return Err(DuplicateError {
                level: Level::Molecule,
                key,
            });
        }
        if self.is_empty() {
            let mol = &mut self.0[0];
            mol.name = name.map(str::to_string);
            mol.select = true;
        } else {
            self.0.push(Molecule::new(name, true));
        }
        let index = self.0.len() - 1;
        Ok(&mut self.0[index])
    }

    /// Attaches an already-built molecule subtree, typically a deep clone.
    pub(crate) fn attach(&mut self, mol: Molecule) -> Result<&mut Molecule, DuplicateError> {
        let key = mol.identity();
        if self.is_empty() {
            self.0[0] = mol;
        } else {
            if !key.is_unset() && self.0.iter().any(|m| m.identity() == key) {
                return Err(DuplicateError {
                    level: Level::Molecule,
                    key,
                });
            }
            self.0.push(mol);
        }
        let index = self.0.len() - 1;
        Ok(&mut self.0[index])
    }

    /// Drops every molecule rejected by `keep`, re-seeding a placeholder if
    /// the list would end up with zero elements.
    pub(crate) fn retain_or_reseed<F>(&mut self, keep: F)
    where
        F: FnMut(&Molecule) -> bool,
    {
        self.0.retain(keep);
        if self.0.is_empty() {
            self.0.push(Molecule::default());
        }
    }
}

impl Default for MoleculeList {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for MoleculeList {
    type Output = Molecule;

    fn index(&self, index: usize) -> &Molecule {
        &self.0[index]
    }
}

impl IndexMut<usize> for MoleculeList {
    fn index_mut(&mut self, index: usize) -> &mut Molecule {
        &mut self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_molecule_names_are_rejected() {
        let mut molecules = MoleculeList::new();
        molecules.add_item(Some("ubiquitin")).unwrap();
        let err = molecules.add_item(Some("ubiquitin")).unwrap_err();
        assert_eq!(err.level, Level::Molecule);
        assert_eq!(molecules.len(), 1);
    }

    #[test]
    fn an_unnamed_molecule_collides_with_another_unnamed_one() {
        let mut molecules = MoleculeList::new();
        molecules.add_item(Some("A")).unwrap();
        molecules.add_item(None).unwrap();
        assert!(molecules.add_item(None).is_err());
        assert_eq!(molecules.len(), 2);
    }

    #[test]
    fn a_molecule_with_residues_is_not_empty() {
        let mut mol = Molecule::default();
        assert!(mol.is_empty());
        mol.residues.add_item(Some(1), Some("GLY")).unwrap();
        assert!(!mol.is_empty());
    }
}
