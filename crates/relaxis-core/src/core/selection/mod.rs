//! # Selection Core
//!
//! The identification-string grammar and the selection object built on it.
//!
//! An identification string addresses entities of the hierarchy through up
//! to three tokens: `#<molecule>`, `:<residue>`, and `@<spin>`, in that
//! order. Each token is a comma-separated list of elements, where an element
//! is a number, a name (with `*`/`?` wildcards), or an inclusive integer
//! range `start-end`. Two identification strings can be combined with the
//! boolean operators `&` (intersection) and `|` (union).
//!
//! - [`tokenize`] splits a string into its three tokens.
//! - [`parse`] turns one token into a sorted constraint set.
//! - [`Selection`] combines the parsed constraint sets with the boolean
//!   operators and answers containment queries against entities.
//! - [`spin_id`] generates round-trip identification strings.

pub mod error;
pub mod parse;
pub(crate) mod pattern;
pub mod spin_id;
pub mod tokenize;

use crate::core::models::molecule::Molecule;
use crate::core::models::residue::Residue;
use crate::core::models::spin::Spin;
use error::SelectionError;
use parse::{Element, parse_token};
use tokenize::tokenize;
use tracing::warn;

/// A parsed molecule-residue-spin selection.
///
/// A selection is either a leaf holding one constraint set per level, or
/// the union or intersection of two child selections.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Leaf {
        molecules: Vec<Element>,
        residues: Vec<Element>,
        spins: Vec<Element>,
    },
    Union(Box<Selection>, Box<Selection>),
    Intersection(Box<Selection>, Box<Selection>),
}

impl Selection {
    /// Parses a selection string.
    ///
    /// An absent or blank string produces the leaf with empty constraint
    /// sets, which matches every entity. Boolean operators are located by a
    /// single right-to-left scan: the right-most top-level `&` or `|` splits
    /// the string into two child selections, so mixed `&`/`|` strings group
    /// right-to-left rather than by conventional operator precedence.
    pub fn parse(selection: Option<&str>) -> Result<Self, SelectionError> {
        let Some(raw) = selection else {
            return Ok(Self::match_all());
        };
        if raw.trim().is_empty() {
            return Ok(Self::match_all());
        }

        let and_index = raw.rfind('&');
        let or_index = raw.rfind('|');
        match (and_index, or_index) {
            (Some(and_index), or_index) if or_index.is_none_or(|o| and_index > o) => {
                let left = Self::parse(Some(raw[..and_index].trim()))?;
                let right = Self::parse(Some(raw[and_index + 1..].trim()))?;
                Ok(Selection::Intersection(Box::new(left), Box::new(right)))
            }
            (_, Some(or_index)) => {
                let left = Self::parse(Some(raw[..or_index].trim()))?;
                let right = Self::parse(Some(raw[or_index + 1..].trim()))?;
                Ok(Selection::Union(Box::new(left), Box::new(right)))
            }
            _ => {
                let (mol_token, res_token, spin_token) = tokenize(Some(raw))?;
                Ok(Selection::Leaf {
                    molecules: parse_token(mol_token),
                    residues: parse_token(res_token),
                    spins: parse_token(spin_token),
                })
            }
        }
    }

    fn match_all() -> Self {
        Selection::Leaf {
            molecules: Vec::new(),
            residues: Vec::new(),
            spins: Vec::new(),
        }
    }

    /// Tests whether a combination of entities is contained in the
    /// selection.
    ///
    /// An absent entity counts as a match for its level, as does an empty
    /// constraint set; otherwise the entity must match by number or by name
    /// pattern. The per-level results are combined with AND.
    pub fn contains(
        &self,
        mol: Option<&Molecule>,
        res: Option<&Residue>,
        spin: Option<&Spin>,
    ) -> bool {
        match self {
            Selection::Union(left, right) => {
                left.contains(mol, res, spin) || right.contains(mol, res, spin)
            }
            Selection::Intersection(left, right) => {
                left.contains(mol, res, spin) && right.contains(mol, res, spin)
            }
            Selection::Leaf {
                molecules,
                residues,
                spins,
            } => {
                let select_mol = mol.is_none_or(|mol| {
                    molecules.is_empty() || pattern::matches_name(molecules, mol.name.as_deref())
                });
                let select_res = res.is_none_or(|res| {
                    residues.is_empty()
                        || pattern::matches_entity(residues, res.num, res.name.as_deref())
                });
                let select_spin = spin.is_none_or(|spin| {
                    spins.is_empty()
                        || pattern::matches_entity(spins, spin.num, spin.name.as_deref())
                });
                select_mol && select_res && select_spin
            }
        }
    }

    /// Tests a concrete spin identification string against the selection.
    ///
    /// Only leaf selections are supported; a boolean selection logs a
    /// warning and reports no match, as does an unparsable identifier.
    pub fn contains_spin_id(&self, spin_id: &str) -> bool {
        let Selection::Leaf {
            molecules,
            residues,
            spins,
        } = self
        else {
            warn!(
                spin_id,
                "the spin identification string is too complex for a boolean selection"
            );
            return false;
        };

        match tokenize(Some(spin_id)) {
            Ok((mol_token, res_token, spin_token)) => {
                id_level_matches(molecules, &parse_token(mol_token))
                    && id_level_matches(residues, &parse_token(res_token))
                    && id_level_matches(spins, &parse_token(spin_token))
            }
            Err(error) => {
                warn!(
                    spin_id,
                    %error,
                    "the spin identification string cannot be tokenized for containment testing"
                );
                false
            }
        }
    }

    /// Tests whether the molecule name is contained in the selection.
    pub fn contains_mol(&self, mol: Option<&str>) -> bool {
        match self {
            Selection::Union(left, right) => left.contains_mol(mol) || right.contains_mol(mol),
            Selection::Intersection(left, right) => {
                left.contains_mol(mol) && right.contains_mol(mol)
            }
            Selection::Leaf { molecules, .. } => {
                molecules.is_empty() || pattern::matches_name(molecules, mol)
            }
        }
    }

    /// Tests whether the residue, identified by its raw fields, is contained
    /// in the selection.
    pub fn contains_res(
        &self,
        res_num: Option<i64>,
        res_name: Option<&str>,
        mol: Option<&str>,
    ) -> bool {
        match self {
            Selection::Union(left, right) => {
                left.contains_res(res_num, res_name, mol) || right.contains_res(res_num, res_name, mol)
            }
            Selection::Intersection(left, right) => {
                left.contains_res(res_num, res_name, mol) && right.contains_res(res_num, res_name, mol)
            }
            Selection::Leaf { residues, .. } => {
                let select_res =
                    residues.is_empty() || pattern::matches_entity(residues, res_num, res_name);
                select_res && self.contains_mol(mol)
            }
        }
    }

    /// Tests whether the spin, identified by its raw fields, is contained in
    /// the selection.
    pub fn contains_spin(
        &self,
        spin_num: Option<i64>,
        spin_name: Option<&str>,
        res_num: Option<i64>,
        res_name: Option<&str>,
        mol: Option<&str>,
    ) -> bool {
        match self {
            Selection::Union(left, right) => {
                left.contains_spin(spin_num, spin_name, res_num, res_name, mol)
                    || right.contains_spin(spin_num, spin_name, res_num, res_name, mol)
            }
            Selection::Intersection(left, right) => {
                left.contains_spin(spin_num, spin_name, res_num, res_name, mol)
                    && right.contains_spin(spin_num, spin_name, res_num, res_name, mol)
            }
            Selection::Leaf { spins, .. } => {
                let select_spin =
                    spins.is_empty() || pattern::matches_entity(spins, spin_num, spin_name);
                select_spin && self.contains_res(res_num, res_name, mol)
            }
        }
    }

    /// True if the selection constrains the molecule level anywhere.
    pub fn has_molecules(&self) -> bool {
        match self {
            Selection::Union(left, right) => left.has_molecules() || right.has_molecules(),
            Selection::Intersection(left, right) => left.has_molecules() && right.has_molecules(),
            Selection::Leaf { molecules, .. } => !molecules.is_empty(),
        }
    }

    /// True if the selection constrains the residue level anywhere.
    pub fn has_residues(&self) -> bool {
        match self {
            Selection::Union(left, right) => left.has_residues() || right.has_residues(),
            Selection::Intersection(left, right) => left.has_residues() && right.has_residues(),
            Selection::Leaf { residues, .. } => !residues.is_empty(),
        }
    }

    /// True if the selection constrains the spin level anywhere.
    pub fn has_spins(&self) -> bool {
        match self {
            Selection::Union(left, right) => left.has_spins() || right.has_spins(),
            Selection::Intersection(left, right) => left.has_spins() && right.has_spins(),
            Selection::Leaf { spins, .. } => !spins.is_empty(),
        }
    }
}

/// One level of identifier-against-selection matching: the identifier side
/// auto-matches when it carries no elements for the level, the selection
/// side when its constraint set is empty.
fn id_level_matches(constraints: &[Element], id_elements: &[Element]) -> bool {
    if id_elements.is_empty() || constraints.is_empty() {
        return true;
    }
    id_elements.iter().any(|element| match element {
        Element::Number(num) => constraints.contains(&Element::Number(*num)),
        Element::Name(name) => pattern::matches_name(constraints, Some(name)),
    })
}
