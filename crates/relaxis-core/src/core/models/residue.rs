use super::attributes::AttributeMap;
use super::identity::Identity;
use super::spin::SpinList;
use super::{DuplicateError, Level};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A residue and the spins it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residue {
    pub num: Option<i64>,
    pub name: Option<String>,
    pub select: bool,
    pub spins: SpinList,
    pub attributes: AttributeMap,
}

impl Residue {
    pub(crate) fn new(num: Option<i64>, name: Option<&str>, select: bool) -> Self {
        Self {
            num,
            name: name.map(str::to_string),
            select,
            spins: SpinList::new(),
            attributes: AttributeMap::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::from_fields(self.num, self.name.as_deref())
    }

    /// True if the identity fields are unset, no data has been attached, and
    /// the owned spin list is itself empty.
    pub fn is_empty(&self) -> bool {
        self.num.is_none()
            && self.name.is_none()
            && self.attributes.is_empty()
            && self.spins.is_empty()
    }
}

impl Default for Residue {
    fn default() -> Self {
        Self::new(None, None, true)
    }
}

/// The ordered, never-empty list of residues owned by one molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueList(Vec<Residue>);

impl ResidueList {
    /// Creates the list holding the initial placeholder residue.
    pub fn new() -> Self {
        ResidueList(vec![Residue::default()])
    }

    /// True if the list holds only the untouched placeholder residue.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Residue> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Residue> {
        self.0.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Residue> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Residue> {
        self.0.get_mut(index)
    }

    /// Adds a residue, overwriting the placeholder if the list is empty.
    ///
    /// Fails without mutating the list if the identity key collides with an
    /// existing sibling. Returns the freshly added residue.
    pub fn add_item(
        &mut self,
        num: Option<i64>,
        name: Option<&str>,
    ) -> Result<&mut Residue, DuplicateError> {
        let key = Identity::from_fields(num, name);
        if self.0.iter().any(|res| res.identity() == key) {
            return Err(DuplicateError {
                level: Level::Residue,
                key,
            });
        }
        if self.is_empty() {
            let res = &mut self.0[0];
            res.num = num;
            res.name = name.map(str::to_string);
            res.select = true;
        } else {
            self.0.push(Residue::new(num, name, true));
        }
        let index = self.0.len() - 1;
        Ok(&mut self.0[index])
    }

    /// Attaches an already-built residue subtree, typically a deep clone.
    pub(crate) fn attach(&mut self, res: Residue) -> Result<&mut Residue, DuplicateError> {
        let key = res.identity();
        if self.is_empty() {
            self.0[0] = res;
        } else {
            if !key.is_unset() && self.0.iter().any(|r| r.identity() == key) {
                return Err(DuplicateError {
                    level: Level::Residue,
                    key,
                });
            }
            self.0.push(res);
        }
        let index = self.0.len() - 1;
        Ok(&mut self.0[index])
    }

    /// Drops every residue rejected by `keep`, re-seeding a placeholder if
    /// the list would end up with zero elements.
    pub(crate) fn retain_or_reseed<F>(&mut self, keep: F)
    where
        F: FnMut(&Residue) -> bool,
    {
        self.0.retain(keep);
        if self.0.is_empty() {
            self.0.push(Residue::default());
        }
    }
}

impl Default for ResidueList {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for ResidueList {
    type Output = Residue;

    fn index(&self, index: usize) -> &Residue {
        &self.0[index]
    }
}

impl IndexMut<usize> for ResidueList {
    fn index_mut(&mut self, index: usize) -> &mut Residue {
        &mut self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_residue_numbers_are_rejected() {
        let mut residues = ResidueList::new();
        residues.add_item(Some(5), Some("GLY")).unwrap();
        let err = residues.add_item(Some(5), Some("ALA")).unwrap_err();
        assert_eq!(err.level, Level::Residue);
        assert_eq!(err.key, Identity::Number(5));
        assert_eq!(residues.len(), 1);
        assert_eq!(residues[0].name.as_deref(), Some("GLY"));
    }

    #[test]
    fn a_residue_with_spins_is_not_empty() {
        let mut res = Residue::default();
        assert!(res.is_empty());
        res.spins.add_item(Some(1), Some("N")).unwrap();
        assert!(!res.is_empty());
    }

    #[test]
    fn the_placeholder_is_overwritten_in_place() {
        let mut residues = ResidueList::new();
        assert!(residues.is_empty());
        residues.add_item(Some(1), Some("MET")).unwrap();
        assert_eq!(residues.len(), 1);
        assert!(!residues.is_empty());
    }
}
