//! # Entity Model
//!
//! The molecule-residue-spin containers and their ordered list wrappers.
//!
//! A hierarchy is a strictly tree-shaped structure: a [`hierarchy::Hierarchy`]
//! owns a [`molecule::MoleculeList`], each [`molecule::Molecule`] owns a
//! [`residue::ResidueList`], and each [`residue::Residue`] owns a
//! [`spin::SpinList`]. The lists are never empty: a freshly constructed list
//! holds exactly one placeholder entity with no identity fields set, and the
//! first real entity added overwrites that placeholder in place. Identity
//! keys ([`identity::Identity`]) are unique among siblings.

pub mod attributes;
pub mod hierarchy;
pub mod identity;
pub mod molecule;
pub mod residue;
pub mod spin;

use identity::Identity;
use std::fmt;
use thiserror::Error;

/// The level of the hierarchy an operation acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Molecule,
    Residue,
    Spin,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Level::Molecule => "molecule",
                Level::Residue => "residue",
                Level::Spin => "spin",
            }
        )
    }
}

/// An entity's identity key collided with an existing sibling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("the {level} '{key}' already exists in the sequence")]
pub struct DuplicateError {
    pub level: Level,
    pub key: Identity,
}
