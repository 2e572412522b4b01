use super::attributes::AttributeMap;
use super::identity::Identity;
use super::{DuplicateError, Level};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// How the position of a pseudo-spin is derived from its member spins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionAveraging {
    Linear,
}

/// A single spin system.
///
/// The identity key is the number when set, otherwise the name. The
/// `select` flag marks the spin as active for analysis; deselected spins
/// are kept in the sequence but skipped by counting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    pub num: Option<i64>,
    pub name: Option<String>,
    pub select: bool,
    /// One position per structural model, in Angstroms.
    pub positions: Option<Vec<Point3<f64>>>,
    /// Set for pseudo-spins averaged from several member positions.
    pub averaging: Option<PositionAveraging>,
    pub attributes: AttributeMap,
}

impl Spin {
    pub(crate) fn new(num: Option<i64>, name: Option<&str>, select: bool) -> Self {
        Self {
            num,
            name: name.map(str::to_string),
            select,
            positions: None,
            averaging: None,
            attributes: AttributeMap::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::from_fields(self.num, self.name.as_deref())
    }

    /// True if neither identity field is set and no data has been attached.
    pub fn is_empty(&self) -> bool {
        self.num.is_none()
            && self.name.is_none()
            && self.positions.is_none()
            && self.averaging.is_none()
            && self.attributes.is_empty()
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self::new(None, None, true)
    }
}

/// The ordered, never-empty list of spins owned by one residue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinList(Vec<Spin>);

impl SpinList {
    /// Creates the list holding the initial placeholder spin.
    pub fn new() -> Self {
        SpinList(vec![Spin::default()])
    }

    /// True if the list holds only the untouched placeholder spin.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spin> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Spin> {
        self.0.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Spin> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Spin> {
        self.0.get_mut(index)
    }

    /// Adds a spin, overwriting the placeholder if the list is empty.
    ///
    /// Fails without mutating the list if the identity key collides with an
    /// existing sibling. Returns the freshly added spin.
    pub fn add_item(
        &mut self,
        num: Option<i64>,
        name: Option<&str>,
    ) -> Result<&mut Spin, DuplicateError> {
        let key = Identity::from_fields(num, name);
        if self.0.iter().any(|spin| spin.identity() == key) {
            return Err(DuplicateError {
                level: Level::Spin,
                key,
            });
        }
        if self.is_empty() {
            let spin = &mut self.0[0];
            spin.num = num;
            spin.name = name.map(str::to_string);
            spin.select = true;
        } else {
            self.0.push(Spin::new(num, name, true));
        }
        let index = self.0.len() - 1;
        Ok(&mut self.0[index])
    }

    /// Attaches an already-built spin, typically a deep clone.
    pub(crate) fn attach(&mut self, spin: Spin) -> Result<&mut Spin, DuplicateError> {
        let key = spin.identity();
        if self.is_empty() {
            self.0[0] = spin;
        } else {
            if !key.is_unset() && self.0.iter().any(|s| s.identity() == key) {
                return Err(DuplicateError {
                    level: Level::Spin,
                    key,
                });
            }
            self.0.push(spin);
        }
        let index = self.0.len() - 1;
        Ok(&mut self.0[index])
    }

    /// Drops every spin rejected by `keep`, re-seeding a placeholder if the
    /// list would end up with zero elements.
    pub(crate) fn retain_or_reseed<F>(&mut self, keep: F)
    where
        F: FnMut(&Spin) -> bool,
    {
        self.0.retain(keep);
        if self.0.is_empty() {
            self.0.push(Spin::default());
        }
    }
}

impl Default for SpinList {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for SpinList {
    type Output = Spin;

    fn index(&self, index: usize) -> &Spin {
        &self.0[index]
    }
}

impl IndexMut<usize> for SpinList {
    fn index_mut(&mut self, index: usize) -> &mut Spin {
        &mut self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_list_holds_one_empty_placeholder() {
        let spins = SpinList::new();
        assert_eq!(spins.len(), 1);
        assert!(spins.is_empty());
        assert!(spins[0].is_empty());
        assert!(spins[0].select);
    }

    #[test]
    fn the_first_spin_overwrites_the_placeholder() {
        let mut spins = SpinList::new();
        spins.add_item(Some(1), Some("N")).unwrap();
        assert_eq!(spins.len(), 1);
        assert!(!spins.is_empty());
        assert_eq!(spins[0].num, Some(1));
        assert_eq!(spins[0].name.as_deref(), Some("N"));
    }

    #[test]
    fn later_spins_are_appended() {
        let mut spins = SpinList::new();
        spins.add_item(Some(1), Some("N")).unwrap();
        spins.add_item(Some(2), Some("HN")).unwrap();
        assert_eq!(spins.len(), 2);
        assert_eq!(spins[1].name.as_deref(), Some("HN"));
    }

    #[test]
    fn duplicate_numbers_are_rejected_without_mutation() {
        let mut spins = SpinList::new();
        spins.add_item(Some(5), Some("N")).unwrap();
        let err = spins.add_item(Some(5), Some("HN")).unwrap_err();
        assert_eq!(
            err,
            DuplicateError {
                level: Level::Spin,
                key: Identity::Number(5),
            }
        );
        assert_eq!(spins.len(), 1);
        assert_eq!(spins[0].name.as_deref(), Some("N"));
    }

    #[test]
    fn unnumbered_spins_key_on_their_name() {
        let mut spins = SpinList::new();
        spins.add_item(None, Some("N")).unwrap();
        assert!(spins.add_item(None, Some("HN")).is_ok());
        assert!(spins.add_item(None, Some("N")).is_err());
    }

    #[test]
    fn a_numbered_spin_does_not_collide_with_an_equally_named_one() {
        let mut spins = SpinList::new();
        spins.add_item(Some(1), Some("N")).unwrap();
        assert!(spins.add_item(None, Some("N")).is_ok());
    }

    #[test]
    fn attached_data_makes_a_placeholder_non_empty() {
        use super::super::attributes::AttributeValue;
        let mut spins = SpinList::new();
        spins[0]
            .attributes
            .insert("r1".to_string(), AttributeValue::Float(1.3));
        assert!(!spins.is_empty());
    }

    #[test]
    fn retain_or_reseed_restores_the_placeholder() {
        let mut spins = SpinList::new();
        spins.add_item(Some(1), Some("N")).unwrap();
        spins.retain_or_reseed(|spin| spin.num != Some(1));
        assert_eq!(spins.len(), 1);
        assert!(spins.is_empty());
    }
}
