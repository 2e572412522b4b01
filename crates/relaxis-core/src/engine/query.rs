use super::error::EngineError;
use crate::core::models::Level;
use crate::core::models::hierarchy::Hierarchy;
use crate::core::models::molecule::Molecule;
use crate::core::models::residue::Residue;
use crate::core::models::spin::Spin;
use crate::core::selection::Selection;
use crate::core::selection::spin_id::generate_spin_id;

fn owned_id(selection: Option<&str>) -> String {
    selection.unwrap_or_default().to_string()
}

/// Lazily yields every molecule matching a selection.
///
/// A fresh traversal is performed on every call to [`molecule_loop`]; the
/// iterator holds no state beyond its position.
#[derive(Debug)]
pub struct MoleculeLoop<'a> {
    hier: &'a Hierarchy,
    selection: Selection,
    mol_index: usize,
    done: bool,
}

impl<'a> Iterator for MoleculeLoop<'a> {
    type Item = &'a Molecule;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while self.mol_index < self.hier.molecules.len() {
            let mol = &self.hier.molecules[self.mol_index];
            self.mol_index += 1;
            if self.selection.contains(Some(mol), None, None) {
                return Some(mol);
            }
        }
        None
    }
}

/// Iterates over the molecules of the hierarchy matching the selection, in
/// insertion order.
///
/// # Errors
///
/// Fails on a malformed selection string, or on a selection carrying residue
/// or spin constraints, which are finer than this loop iterates.
pub fn molecule_loop<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<MoleculeLoop<'a>, EngineError> {
    let sel = Selection::parse(selection)?;
    if sel.has_residues() {
        return Err(EngineError::ResidueIdDisallowed {
            id: owned_id(selection),
        });
    }
    if sel.has_spins() {
        return Err(EngineError::SpinIdDisallowed {
            id: owned_id(selection),
        });
    }
    Ok(MoleculeLoop {
        hier,
        selection: sel,
        mol_index: 0,
        done: hier.is_empty(),
    })
}

/// One residue yielded by [`residue_loop`], with its owning molecule's name.
#[derive(Debug, Clone, Copy)]
pub struct ResidueEntry<'a> {
    pub mol_name: Option<&'a str>,
    pub residue: &'a Residue,
}

impl ResidueEntry<'_> {
    /// The round-trip identification string of this residue.
    pub fn residue_id(&self) -> String {
        generate_spin_id(
            self.mol_name,
            self.residue.num,
            self.residue.name.as_deref(),
            None,
            None,
        )
    }
}

/// Lazily yields every residue matching a selection, depth-first.
pub struct ResidueLoop<'a> {
    hier: &'a Hierarchy,
    selection: Selection,
    mol_index: usize,
    res_index: usize,
    done: bool,
}

impl<'a> Iterator for ResidueLoop<'a> {
    type Item = ResidueEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let mol = self.hier.molecules.get(self.mol_index)?;
            match mol.residues.get(self.res_index) {
                Some(res) => {
                    self.res_index += 1;
                    if self.selection.contains(Some(mol), Some(res), None) {
                        return Some(ResidueEntry {
                            mol_name: mol.name.as_deref(),
                            residue: res,
                        });
                    }
                }
                None => {
                    self.mol_index += 1;
                    self.res_index = 0;
                }
            }
        }
    }
}

/// Iterates over the residues of the hierarchy matching the selection, in
/// depth-first insertion order.
pub fn residue_loop<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<ResidueLoop<'a>, EngineError> {
    let sel = Selection::parse(selection)?;
    Ok(ResidueLoop {
        hier,
        selection: sel,
        mol_index: 0,
        res_index: 0,
        done: hier.is_empty(),
    })
}

/// One spin yielded by [`spin_loop`], with its owning molecule and residue
/// information.
#[derive(Debug, Clone, Copy)]
pub struct SpinEntry<'a> {
    pub mol_name: Option<&'a str>,
    pub res_num: Option<i64>,
    pub res_name: Option<&'a str>,
    pub spin: &'a Spin,
}

impl SpinEntry<'_> {
    /// The round-trip identification string of this spin.
    pub fn spin_id(&self) -> String {
        generate_spin_id(
            self.mol_name,
            self.res_num,
            self.res_name,
            self.spin.num,
            self.spin.name.as_deref(),
        )
    }
}

/// Lazily yields every spin matching a selection, depth-first.
pub struct SpinLoop<'a> {
    hier: &'a Hierarchy,
    selection: Selection,
    mol_index: usize,
    res_index: usize,
    spin_index: usize,
    done: bool,
}

impl<'a> Iterator for SpinLoop<'a> {
    type Item = SpinEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let mol = self.hier.molecules.get(self.mol_index)?;
            let Some(res) = mol.residues.get(self.res_index) else {
                self.mol_index += 1;
                self.res_index = 0;
                continue;
            };
            match res.spins.get(self.spin_index) {
                Some(spin) => {
                    self.spin_index += 1;
                    if self.selection.contains(Some(mol), Some(res), Some(spin)) {
                        return Some(SpinEntry {
                            mol_name: mol.name.as_deref(),
                            res_num: res.num,
                            res_name: res.name.as_deref(),
                            spin,
                        });
                    }
                }
                None => {
                    self.res_index += 1;
                    self.spin_index = 0;
                }
            }
        }
    }
}

/// Iterates over the spins of the hierarchy matching the selection, in
/// depth-first insertion order.
pub fn spin_loop<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<SpinLoop<'a>, EngineError> {
    let sel = Selection::parse(selection)?;
    Ok(SpinLoop {
        hier,
        selection: sel,
        mol_index: 0,
        res_index: 0,
        spin_index: 0,
        done: hier.is_empty(),
    })
}

/// Lazily yields the `(molecule, residue, spin)` positional indices of every
/// matching spin.
pub struct SpinIndexLoop<'a> {
    hier: &'a Hierarchy,
    selection: Selection,
    mol_index: usize,
    res_index: usize,
    spin_index: usize,
    done: bool,
}

impl Iterator for SpinIndexLoop<'_> {
    type Item = (usize, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let mol = self.hier.molecules.get(self.mol_index)?;
            let Some(res) = mol.residues.get(self.res_index) else {
                self.mol_index += 1;
                self.res_index = 0;
                continue;
            };
            match res.spins.get(self.spin_index) {
                Some(spin) => {
                    let indices = (self.mol_index, self.res_index, self.spin_index);
                    self.spin_index += 1;
                    if self.selection.contains(Some(mol), Some(res), Some(spin)) {
                        return Some(indices);
                    }
                }
                None => {
                    self.res_index += 1;
                    self.spin_index = 0;
                }
            }
        }
    }
}

/// Iterates over the positional indices of the matching spins, used to
/// correlate spins across two hierarchies believed to share a sequence.
pub fn spin_index_loop<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<SpinIndexLoop<'a>, EngineError> {
    let sel = Selection::parse(selection)?;
    Ok(SpinIndexLoop {
        hier,
        selection: sel,
        mol_index: 0,
        res_index: 0,
        spin_index: 0,
        done: hier.is_empty(),
    })
}

/// The position of one spin within its hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinIndex {
    /// The index within a flattened walk over every spin of the hierarchy.
    pub global: usize,
    pub mol: usize,
    pub res: usize,
    pub spin: usize,
}

/// Finds the position of the first spin matching the selection.
pub fn find_index(
    hier: &Hierarchy,
    selection: Option<&str>,
) -> Result<Option<SpinIndex>, EngineError> {
    let sel = Selection::parse(selection)?;
    let mut global = 0;
    for (mol_index, mol) in hier.molecules.iter().enumerate() {
        for (res_index, res) in mol.residues.iter().enumerate() {
            for (spin_index, spin) in res.spins.iter().enumerate() {
                if sel.contains(Some(mol), Some(res), Some(spin)) {
                    return Ok(Some(SpinIndex {
                        global,
                        mol: mol_index,
                        res: res_index,
                        spin: spin_index,
                    }));
                }
                global += 1;
            }
        }
    }
    Ok(None)
}

pub(crate) fn resolve_molecule_index(
    hier: &Hierarchy,
    selection: Option<&str>,
) -> Result<Option<usize>, EngineError> {
    let sel = Selection::parse(selection)?;
    let mut found = None;
    let mut matches = 0;
    for (index, mol) in hier.molecules.iter().enumerate() {
        if !sel.contains(Some(mol), None, None) {
            continue;
        }
        // Without a selection only an unnamed molecule can be the default.
        if selection.is_none() && mol.name.is_some() {
            continue;
        }
        found = Some(index);
        matches += 1;
    }
    if matches > 1 {
        return Err(EngineError::ambiguous(Level::Molecule, selection));
    }
    Ok(found)
}

pub(crate) fn resolve_residue_index(
    hier: &Hierarchy,
    selection: Option<&str>,
) -> Result<Option<(usize, usize)>, EngineError> {
    let sel = Selection::parse(selection)?;
    let mut found = None;
    let mut matches = 0;
    for (mol_index, mol) in hier.molecules.iter().enumerate() {
        for (res_index, res) in mol.residues.iter().enumerate() {
            if !sel.contains(Some(mol), Some(res), None) {
                continue;
            }
            found = Some((mol_index, res_index));
            matches += 1;
        }
    }
    if matches > 1 {
        return Err(EngineError::ambiguous(Level::Residue, selection));
    }
    Ok(found)
}

pub(crate) fn resolve_spin_index(
    hier: &Hierarchy,
    selection: Option<&str>,
) -> Result<Option<(usize, usize, usize)>, EngineError> {
    let sel = Selection::parse(selection)?;
    let mut found = None;
    let mut matches = 0;
    for (mol_index, mol) in hier.molecules.iter().enumerate() {
        for (res_index, res) in mol.residues.iter().enumerate() {
            for (spin_index, spin) in res.spins.iter().enumerate() {
                if !sel.contains(Some(mol), Some(res), Some(spin)) {
                    continue;
                }
                found = Some((mol_index, res_index, spin_index));
                matches += 1;
            }
        }
    }
    if matches > 1 {
        return Err(EngineError::ambiguous(Level::Spin, selection));
    }
    Ok(found)
}

/// Returns the single molecule matching the selection.
///
/// Two or more matches are an error; zero matches report `Ok(None)`.
pub fn return_molecule<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<Option<&'a Molecule>, EngineError> {
    Ok(resolve_molecule_index(hier, selection)?.map(|index| &hier.molecules[index]))
}

/// Returns the single residue matching the selection.
///
/// Two or more matches are an error; zero matches report `Ok(None)`.
pub fn return_residue<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<Option<&'a Residue>, EngineError> {
    Ok(resolve_residue_index(hier, selection)?
        .map(|(mol, res)| &hier.molecules[mol].residues[res]))
}

/// Returns the single spin matching the selection.
///
/// Two or more matches are an error; zero matches report `Ok(None)`.
pub fn return_spin<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<Option<&'a Spin>, EngineError> {
    Ok(resolve_spin_index(hier, selection)?
        .map(|(mol, res, spin)| &hier.molecules[mol].residues[res].spins[spin]))
}

/// Returns the single matching spin together with its molecule and residue
/// information.
pub fn return_spin_entry<'a>(
    hier: &'a Hierarchy,
    selection: Option<&str>,
) -> Result<Option<SpinEntry<'a>>, EngineError> {
    Ok(resolve_spin_index(hier, selection)?.map(|(mol, res, spin)| {
        let mol = &hier.molecules[mol];
        let res = &mol.residues[res];
        SpinEntry {
            mol_name: mol.name.as_deref(),
            res_num: res.num,
            res_name: res.name.as_deref(),
            spin: &res.spins[spin],
        }
    }))
}

/// Returns the spin at the given global index, counting every spin of the
/// hierarchy depth-first.
pub fn return_spin_from_index(hier: &Hierarchy, global_index: usize) -> Option<SpinEntry<'_>> {
    spin_loop(hier, None).ok()?.nth(global_index)
}

/// Converts a global spin index into `(molecule, residue, spin)` indices.
pub fn spin_index_from_global(
    hier: &Hierarchy,
    global_index: usize,
) -> Option<(usize, usize, usize)> {
    spin_index_loop(hier, None).ok()?.nth(global_index)
}

/// Counts the molecules matching the selection.
pub fn count_molecules(hier: &Hierarchy, selection: Option<&str>) -> Result<usize, EngineError> {
    Ok(molecule_loop(hier, selection)?.count())
}

/// Counts the residues matching the selection.
pub fn count_residues(hier: &Hierarchy, selection: Option<&str>) -> Result<usize, EngineError> {
    Ok(residue_loop(hier, selection)?.count())
}

/// Counts the spins matching the selection, optionally skipping deselected
/// spins.
pub fn count_spins(
    hier: &Hierarchy,
    selection: Option<&str>,
    skip_deselected: bool,
) -> Result<usize, EngineError> {
    Ok(spin_loop(hier, selection)?
        .filter(|entry| !skip_deselected || entry.spin.select)
        .count())
}

/// Tests whether two hierarchies hold the same sequence: the same counts at
/// every level and pairwise identical spin numbers and names.
pub fn same_sequence(hier1: &Hierarchy, hier2: &Hierarchy) -> bool {
    if hier1.molecules.len() != hier2.molecules.len() {
        return false;
    }
    for (mol1, mol2) in hier1.molecules.iter().zip(hier2.molecules.iter()) {
        if mol1.residues.len() != mol2.residues.len() {
            return false;
        }
        for (res1, res2) in mol1.residues.iter().zip(mol2.residues.iter()) {
            if res1.spins.len() != res2.spins.len() {
                return false;
            }
            for (spin1, spin2) in res1.spins.iter().zip(res2.spins.iter()) {
                if spin1.num != spin2.num || spin1.name != spin2.name {
                    return false;
                }
            }
        }
    }
    true
}
