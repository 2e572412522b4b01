use super::error::EngineError;
use super::query::{resolve_molecule_index, resolve_residue_index, resolve_spin_index};
use crate::core::models::Level;
use crate::core::models::hierarchy::Hierarchy;
use crate::core::models::molecule::Molecule;
use crate::core::models::residue::Residue;
use crate::core::models::spin::{PositionAveraging, Spin};
use crate::core::selection::Selection;
use crate::core::selection::parse::{
    parse_token, single_molecule_info, single_residue_info, single_spin_info,
};
use crate::core::selection::pattern::matches_exact;
use crate::core::selection::tokenize::tokenize;
use nalgebra::{Point3, Vector3};
use tracing::debug;

fn owned_id(id: Option<&str>) -> String {
    id.unwrap_or_default().to_string()
}

/// Adds a molecule to the hierarchy.
pub fn create_molecule(hier: &mut Hierarchy, mol_name: Option<&str>) -> Result<(), EngineError> {
    hier.molecules.add_item(mol_name)?;
    debug!(name = mol_name, "molecule created");
    Ok(())
}

/// Adds a residue to the molecule located by `mol_id`.
///
/// The locator may only carry a molecule token; without one the residue is
/// added to the first molecule.
pub fn create_residue(
    hier: &mut Hierarchy,
    res_num: Option<i64>,
    res_name: Option<&str>,
    mol_id: Option<&str>,
) -> Result<(), EngineError> {
    let (_, res_token, spin_token) = tokenize(mol_id)?;
    if res_token.is_some() {
        return Err(EngineError::ResidueIdDisallowed {
            id: owned_id(mol_id),
        });
    }
    if spin_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: owned_id(mol_id),
        });
    }

    let mol_index = match mol_id {
        Some(_) => resolve_molecule_index(hier, mol_id)?.ok_or(EngineError::MoleculeNotFound {
            id: owned_id(mol_id),
        })?,
        None => 0,
    };
    hier.molecules[mol_index].residues.add_item(res_num, res_name)?;
    Ok(())
}

/// Adds a spin to the residue located by `res_id`.
///
/// The locator may carry molecule and residue tokens; without one the spin
/// is added to the first residue of the first molecule.
pub fn create_spin(
    hier: &mut Hierarchy,
    spin_num: Option<i64>,
    spin_name: Option<&str>,
    res_id: Option<&str>,
) -> Result<(), EngineError> {
    let (mol_index, res_index) = locate_spin_parent(hier, res_id)?;
    hier.molecules[mol_index].residues[res_index]
        .spins
        .add_item(spin_num, spin_name)?;
    Ok(())
}

/// Adds a pseudo-spin whose position is averaged from its member spins.
///
/// Every member must resolve to a unique spin carrying positions. The
/// averaged positions are computed per structural model, over as many models
/// as every member provides.
pub fn create_pseudo_spin(
    hier: &mut Hierarchy,
    spin_num: Option<i64>,
    spin_name: Option<&str>,
    res_id: Option<&str>,
    members: &[&str],
    averaging: PositionAveraging,
) -> Result<(), EngineError> {
    let (mol_index, res_index) = locate_spin_parent(hier, res_id)?;

    let mut member_positions = Vec::with_capacity(members.len());
    for &member in members {
        let (mi, ri, si) =
            resolve_spin_index(hier, Some(member))?.ok_or(EngineError::SpinNotFound {
                id: member.to_string(),
            })?;
        let spin = &hier.molecules[mi].residues[ri].spins[si];
        let positions = spin
            .positions
            .as_ref()
            .ok_or(EngineError::MissingPosition {
                id: member.to_string(),
            })?;
        member_positions.push(positions.clone());
    }
    let averaged = match averaging {
        PositionAveraging::Linear => linear_average(&member_positions),
    };

    let spin = hier.molecules[mol_index].residues[res_index]
        .spins
        .add_item(spin_num, spin_name)?;
    spin.positions = Some(averaged);
    spin.averaging = Some(averaging);
    Ok(())
}

fn locate_spin_parent(
    hier: &Hierarchy,
    res_id: Option<&str>,
) -> Result<(usize, usize), EngineError> {
    let (_, _, spin_token) = tokenize(res_id)?;
    if spin_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: owned_id(res_id),
        });
    }
    match res_id {
        Some(_) => resolve_residue_index(hier, res_id)?.ok_or(EngineError::ResidueNotFound {
            id: owned_id(res_id),
        }),
        None => Ok((0, 0)),
    }
}

/// Averages the member positions model by model, over as many models as
/// every member provides.
fn linear_average(member_positions: &[Vec<Point3<f64>>]) -> Vec<Point3<f64>> {
    let models = member_positions.iter().map(Vec::len).min().unwrap_or(0);
    (0..models)
        .map(|model| {
            let mut sum = Vector3::zeros();
            for positions in member_positions {
                sum += positions[model].coords;
            }
            Point3::from(sum / member_positions.len() as f64)
        })
        .collect()
}

/// Deletes every molecule matching the identifier.
///
/// The identifier may only carry a molecule token, and matching is literal:
/// molecule names are compared for exact equality against the parsed
/// elements. A placeholder is re-seeded if no molecule remains.
pub fn delete_molecule(hier: &mut Hierarchy, mol_id: &str) -> Result<(), EngineError> {
    let (mol_token, res_token, spin_token) = tokenize(Some(mol_id))?;
    if res_token.is_some() {
        return Err(EngineError::ResidueIdDisallowed {
            id: mol_id.to_string(),
        });
    }
    if spin_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: mol_id.to_string(),
        });
    }

    let molecules = parse_token(mol_token);
    hier.molecules
        .retain_or_reseed(|mol| !matches_exact(&molecules, None, mol.name.as_deref()));
    Ok(())
}

/// Deletes every residue matching the identifier, across every molecule the
/// identifier's molecule token selects.
pub fn delete_residue(hier: &mut Hierarchy, res_id: &str) -> Result<(), EngineError> {
    let (mol_token, res_token, spin_token) = tokenize(Some(res_id))?;
    if spin_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: res_id.to_string(),
        });
    }

    let residues = parse_token(res_token);
    let mol_sel = mol_token.map(|token| format!("#{token}"));
    let sel = Selection::parse(mol_sel.as_deref())?;
    for mol in hier.molecules.iter_mut() {
        if !sel.contains(Some(mol), None, None) {
            continue;
        }
        mol.residues
            .retain_or_reseed(|res| !matches_exact(&residues, res.num, res.name.as_deref()));
    }
    Ok(())
}

/// Deletes every spin matching the identifier, across every residue the
/// identifier's molecule and residue tokens select.
pub fn delete_spin(hier: &mut Hierarchy, spin_id: &str) -> Result<(), EngineError> {
    let (_, _, spin_token) = tokenize(Some(spin_id))?;
    let spins = parse_token(spin_token);
    let sel = Selection::parse(Some(spin_id))?;
    for mol in hier.molecules.iter_mut() {
        let mol_name = mol.name.clone();
        for res in mol.residues.iter_mut() {
            if !sel.contains_res(res.num, res.name.as_deref(), mol_name.as_deref()) {
                continue;
            }
            res.spins
                .retain_or_reseed(|spin| !matches_exact(&spins, spin.num, spin.name.as_deref()));
        }
    }
    Ok(())
}

/// Renames the single molecule matching the identifier.
pub fn name_molecule(
    hier: &mut Hierarchy,
    mol_id: &str,
    name: Option<&str>,
) -> Result<(), EngineError> {
    let sel = Selection::parse(Some(mol_id))?;
    if sel.has_residues() {
        return Err(EngineError::ResidueIdDisallowed {
            id: mol_id.to_string(),
        });
    }
    if sel.has_spins() {
        return Err(EngineError::SpinIdDisallowed {
            id: mol_id.to_string(),
        });
    }

    if let Some(index) = resolve_molecule_index(hier, Some(mol_id))? {
        hier.molecules[index].name = name.map(str::to_string);
    }
    Ok(())
}

/// Renames every residue matching the identifier.
pub fn name_residue(
    hier: &mut Hierarchy,
    res_id: &str,
    name: Option<&str>,
) -> Result<(), EngineError> {
    let sel = Selection::parse(Some(res_id))?;
    if sel.has_spins() {
        return Err(EngineError::SpinIdDisallowed {
            id: res_id.to_string(),
        });
    }
    if hier.is_empty() {
        return Ok(());
    }
    for mol in hier.molecules.iter_mut() {
        let mol_name = mol.name.clone();
        for res in mol.residues.iter_mut() {
            if sel.contains_res(res.num, res.name.as_deref(), mol_name.as_deref()) {
                res.name = name.map(str::to_string);
            }
        }
    }
    Ok(())
}

/// Renames every spin matching the identifier.
pub fn name_spin(
    hier: &mut Hierarchy,
    spin_id: Option<&str>,
    name: Option<&str>,
) -> Result<(), EngineError> {
    let sel = Selection::parse(spin_id)?;
    if hier.is_empty() {
        return Ok(());
    }
    for mol in hier.molecules.iter_mut() {
        let mol_name = mol.name.clone();
        for res in mol.residues.iter_mut() {
            let (res_num, res_name) = (res.num, res.name.clone());
            for spin in res.spins.iter_mut() {
                if sel.contains_spin(
                    spin.num,
                    spin.name.as_deref(),
                    res_num,
                    res_name.as_deref(),
                    mol_name.as_deref(),
                ) {
                    spin.name = name.map(str::to_string);
                }
            }
        }
    }
    Ok(())
}

/// Renumbers the single residue matching the identifier.
///
/// Renumbering more than one residue at once is disallowed.
pub fn number_residue(
    hier: &mut Hierarchy,
    res_id: &str,
    number: Option<i64>,
) -> Result<(), EngineError> {
    let sel = Selection::parse(Some(res_id))?;
    if sel.has_spins() {
        return Err(EngineError::SpinIdDisallowed {
            id: res_id.to_string(),
        });
    }
    if super::query::count_residues(hier, Some(res_id))? > 1 {
        return Err(EngineError::MultipleRenumber {
            level: Level::Residue,
        });
    }
    if hier.is_empty() {
        return Ok(());
    }
    for mol in hier.molecules.iter_mut() {
        let mol_name = mol.name.clone();
        for res in mol.residues.iter_mut() {
            if sel.contains_res(res.num, res.name.as_deref(), mol_name.as_deref()) {
                res.num = number;
            }
        }
    }
    Ok(())
}

/// Renumbers the single spin matching the identifier.
///
/// Renumbering more than one spin at once is disallowed.
pub fn number_spin(
    hier: &mut Hierarchy,
    spin_id: Option<&str>,
    number: Option<i64>,
) -> Result<(), EngineError> {
    let sel = Selection::parse(spin_id)?;
    if number.is_some() && super::query::count_spins(hier, spin_id, false)? > 1 {
        return Err(EngineError::MultipleRenumber { level: Level::Spin });
    }
    if hier.is_empty() {
        return Ok(());
    }
    for mol in hier.molecules.iter_mut() {
        let mol_name = mol.name.clone();
        for res in mol.residues.iter_mut() {
            let (res_num, res_name) = (res.num, res.name.clone());
            for spin in res.spins.iter_mut() {
                if sel.contains_spin(
                    spin.num,
                    spin.name.as_deref(),
                    res_num,
                    res_name.as_deref(),
                    mol_name.as_deref(),
                ) {
                    spin.num = number;
                }
            }
        }
    }
    Ok(())
}

/// Copies a molecule and its whole subtree within one hierarchy.
pub fn copy_molecule(
    hier: &mut Hierarchy,
    mol_from: &str,
    mol_to: Option<&str>,
) -> Result<(), EngineError> {
    let clone = molecule_copy_source(hier, mol_from, hier, mol_to)?;
    hier.molecules.attach(clone)?;
    Ok(())
}

/// Copies a molecule and its whole subtree from one hierarchy to another.
pub fn copy_molecule_between(
    src: &Hierarchy,
    mol_from: &str,
    dst: &mut Hierarchy,
    mol_to: Option<&str>,
) -> Result<(), EngineError> {
    let clone = molecule_copy_source(src, mol_from, dst, mol_to)?;
    dst.molecules.attach(clone)?;
    Ok(())
}

fn molecule_copy_source(
    src: &Hierarchy,
    mol_from: &str,
    dst: &Hierarchy,
    mol_to: Option<&str>,
) -> Result<Molecule, EngineError> {
    let (_, res_from_token, spin_from_token) = tokenize(Some(mol_from))?;
    let (mol_to_token, res_to_token, spin_to_token) = tokenize(mol_to)?;
    if spin_from_token.is_some() || spin_to_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: spin_from_token
                .map_or_else(|| owned_id(mol_to), |_| mol_from.to_string()),
        });
    }
    if res_from_token.is_some() || res_to_token.is_some() {
        return Err(EngineError::ResidueIdDisallowed {
            id: res_from_token
                .map_or_else(|| owned_id(mol_to), |_| mol_from.to_string()),
        });
    }

    let rename = single_molecule_info(mol_to_token)?;

    if let Some(index) = resolve_molecule_index(dst, mol_to)? {
        if !dst.molecules[index].is_empty() {
            return Err(EngineError::TargetExists {
                level: Level::Molecule,
                id: owned_id(mol_to),
            });
        }
    }

    let source_index =
        resolve_molecule_index(src, Some(mol_from))?.ok_or(EngineError::MoleculeNotFound {
            id: mol_from.to_string(),
        })?;
    let mut clone = src.molecules[source_index].clone();
    if rename.is_some() {
        clone.name = rename;
    }
    Ok(clone)
}

/// Copies a residue and its spins within one hierarchy, renaming and
/// renumbering the copy from the destination identifier.
pub fn copy_residue(
    hier: &mut Hierarchy,
    res_from: &str,
    res_to: Option<&str>,
) -> Result<(), EngineError> {
    let (clone, mol_index) = residue_copy_source(hier, res_from, hier, res_to)?;
    hier.molecules[mol_index].residues.attach(clone)?;
    Ok(())
}

/// Copies a residue and its spins from one hierarchy to another.
pub fn copy_residue_between(
    src: &Hierarchy,
    res_from: &str,
    dst: &mut Hierarchy,
    res_to: Option<&str>,
) -> Result<(), EngineError> {
    let (clone, mol_index) = residue_copy_source(src, res_from, dst, res_to)?;
    dst.molecules[mol_index].residues.attach(clone)?;
    Ok(())
}

fn residue_copy_source(
    src: &Hierarchy,
    res_from: &str,
    dst: &Hierarchy,
    res_to: Option<&str>,
) -> Result<(Residue, usize), EngineError> {
    let (_, _, spin_from_token) = tokenize(Some(res_from))?;
    let (_, res_to_token, spin_to_token) = tokenize(res_to)?;
    if spin_from_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: res_from.to_string(),
        });
    }
    if spin_to_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: owned_id(res_to),
        });
    }

    let (num_to, name_to) = single_residue_info(res_to_token)?;

    if let Some((mi, ri)) = resolve_residue_index(dst, res_to)? {
        if !dst.molecules[mi].residues[ri].is_empty() {
            return Err(EngineError::TargetExists {
                level: Level::Residue,
                id: owned_id(res_to),
            });
        }
    }

    let (smi, sri) =
        resolve_residue_index(src, Some(res_from))?.ok_or(EngineError::ResidueNotFound {
            id: res_from.to_string(),
        })?;
    let mut clone = src.molecules[smi].residues[sri].clone();
    if num_to.is_some() {
        clone.num = num_to;
    }
    if name_to.is_some() {
        clone.name = name_to;
    }

    // The destination molecule defaults to the first one.
    let mol_index = resolve_molecule_index(dst, res_to)?.unwrap_or(0);
    Ok((clone, mol_index))
}

/// Copies a spin within one hierarchy, renaming and renumbering the copy
/// from the destination identifier.
pub fn copy_spin(
    hier: &mut Hierarchy,
    spin_from: &str,
    spin_to: Option<&str>,
) -> Result<(), EngineError> {
    let (clone, (mol_index, res_index)) = spin_copy_source(hier, spin_from, hier, spin_to)?;
    hier.molecules[mol_index].residues[res_index]
        .spins
        .attach(clone)?;
    Ok(())
}

/// Copies a spin from one hierarchy to another.
pub fn copy_spin_between(
    src: &Hierarchy,
    spin_from: &str,
    dst: &mut Hierarchy,
    spin_to: Option<&str>,
) -> Result<(), EngineError> {
    let (clone, (mol_index, res_index)) = spin_copy_source(src, spin_from, dst, spin_to)?;
    dst.molecules[mol_index].residues[res_index]
        .spins
        .attach(clone)?;
    Ok(())
}

fn spin_copy_source(
    src: &Hierarchy,
    spin_from: &str,
    dst: &Hierarchy,
    spin_to: Option<&str>,
) -> Result<(Spin, (usize, usize)), EngineError> {
    let (_, _, spin_to_token) = tokenize(spin_to)?;

    if spin_to_token.is_some() {
        if let Some((mi, ri, si)) = resolve_spin_index(dst, spin_to)? {
            if !dst.molecules[mi].residues[ri].spins[si].is_empty() {
                return Err(EngineError::TargetExists {
                    level: Level::Spin,
                    id: owned_id(spin_to),
                });
            }
        }
    }

    // The residue part of the source locator must resolve before the spin
    // itself is looked up, to distinguish the two failure modes.
    if resolve_residue_index(src, Some(spin_from))?.is_none() {
        return Err(EngineError::ResidueNotFound {
            id: spin_from.to_string(),
        });
    }
    let (smi, sri, ssi) =
        resolve_spin_index(src, Some(spin_from))?.ok_or(EngineError::SpinNotFound {
            id: spin_from.to_string(),
        })?;

    let destination = resolve_residue_index(dst, spin_to)?;
    let parent = match (destination, spin_to) {
        (Some(indices), _) => indices,
        (None, Some(_)) => {
            return Err(EngineError::ResidueNotFound {
                id: owned_id(spin_to),
            });
        }
        (None, None) => (0, 0),
    };

    let (num_to, name_to) = single_spin_info(spin_to_token)?;
    let mut clone = src.molecules[smi].residues[sri].spins[ssi].clone();
    if num_to.is_some() {
        clone.num = num_to;
    }
    if name_to.is_some() {
        clone.name = name_to;
    }
    Ok((clone, parent))
}

/// Sets the select flag of every spin in the hierarchy.
pub fn select_all(hier: &mut Hierarchy) {
    set_select_all(hier, true);
}

/// Clears the select flag of every spin in the hierarchy.
pub fn deselect_all(hier: &mut Hierarchy) {
    set_select_all(hier, false);
}

fn set_select_all(hier: &mut Hierarchy, select: bool) {
    for mol in hier.molecules.iter_mut() {
        for res in mol.residues.iter_mut() {
            for spin in res.spins.iter_mut() {
                spin.select = select;
            }
        }
    }
}

/// Sets the select flag of every spin matching the identifier.
pub fn select_spins(hier: &mut Hierarchy, spin_id: Option<&str>) -> Result<(), EngineError> {
    set_select(hier, spin_id, |_| true)
}

/// Clears the select flag of every spin matching the identifier.
pub fn deselect_spins(hier: &mut Hierarchy, spin_id: Option<&str>) -> Result<(), EngineError> {
    set_select(hier, spin_id, |_| false)
}

/// Flips the select flag of every spin matching the identifier.
pub fn reverse_selection(hier: &mut Hierarchy, spin_id: Option<&str>) -> Result<(), EngineError> {
    set_select(hier, spin_id, |select| !select)
}

fn set_select<F>(hier: &mut Hierarchy, spin_id: Option<&str>, apply: F) -> Result<(), EngineError>
where
    F: Fn(bool) -> bool,
{
    let sel = Selection::parse(spin_id)?;
    if hier.is_empty() {
        return Ok(());
    }
    for mol in hier.molecules.iter_mut() {
        let mol_name = mol.name.clone();
        for res in mol.residues.iter_mut() {
            let (res_num, res_name) = (res.num, res.name.clone());
            for spin in res.spins.iter_mut() {
                if sel.contains_spin(
                    spin.num,
                    spin.name.as_deref(),
                    res_num,
                    res_name.as_deref(),
                    mol_name.as_deref(),
                ) {
                    spin.select = apply(spin.select);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::identity::Identity;
    use crate::engine::query::{count_spins, return_residue, return_spin, spin_loop};

    fn create_standard_test_hierarchy() -> Hierarchy {
        let mut hier = Hierarchy::new();
        create_molecule(&mut hier, Some("A")).unwrap();
        for (num, name) in [(1, "MET"), (2, "GLN"), (3, "ILE"), (4, "PHE")] {
            create_residue(&mut hier, Some(num), Some(name), Some("#A")).unwrap();
        }
        create_spin(&mut hier, Some(1), Some("N"), Some("#A:1")).unwrap();
        create_spin(&mut hier, Some(2), Some("HN"), Some("#A:1")).unwrap();
        create_spin(&mut hier, Some(3), Some("N"), Some("#A:2")).unwrap();
        hier
    }

    mod creation {
        use super::*;
        use crate::core::models::DuplicateError;

        #[test]
        fn creating_into_a_named_molecule_requires_it_to_exist() {
            let mut hier = Hierarchy::new();
            assert!(matches!(
                create_residue(&mut hier, Some(1), Some("GLY"), Some("#missing")).unwrap_err(),
                EngineError::MoleculeNotFound { .. }
            ));
        }

        #[test]
        fn creation_rejects_tokens_below_the_target_level() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                create_residue(&mut hier, Some(9), None, Some("#A:1")).unwrap_err(),
                EngineError::ResidueIdDisallowed { .. }
            ));
            assert!(matches!(
                create_residue(&mut hier, Some(9), None, Some("#A@N")).unwrap_err(),
                EngineError::SpinIdDisallowed { .. }
            ));
            assert!(matches!(
                create_spin(&mut hier, Some(9), None, Some("#A:1@N")).unwrap_err(),
                EngineError::SpinIdDisallowed { .. }
            ));
        }

        #[test]
        fn duplicate_identities_fail_without_mutating() {
            let mut hier = create_standard_test_hierarchy();
            let err = create_residue(&mut hier, Some(1), Some("ALA"), Some("#A")).unwrap_err();
            assert_eq!(
                err,
                EngineError::Duplicate(DuplicateError {
                    level: Level::Residue,
                    key: Identity::Number(1),
                })
            );
            assert_eq!(hier.molecules[0].residues.len(), 4);
        }

        #[test]
        fn spins_default_to_the_first_residue() {
            let mut hier = Hierarchy::new();
            create_spin(&mut hier, Some(1), Some("N"), None).unwrap();
            assert_eq!(
                hier.molecules[0].residues[0].spins[0].name.as_deref(),
                Some("N")
            );
        }
    }

    mod pseudo_spins {
        use super::*;
        use nalgebra::Point3;

        #[test]
        fn member_positions_are_averaged_per_model() {
            let mut hier = create_standard_test_hierarchy();
            create_spin(&mut hier, Some(10), Some("H1"), Some("#A:3")).unwrap();
            create_spin(&mut hier, Some(11), Some("H2"), Some("#A:3")).unwrap();
            hier.molecules[0].residues[2].spins[0].positions = Some(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ]);
            hier.molecules[0].residues[2].spins[1].positions = Some(vec![
                Point3::new(2.0, 4.0, 0.0),
                Point3::new(4.0, 2.0, 0.0),
            ]);

            create_pseudo_spin(
                &mut hier,
                Some(12),
                Some("Q1"),
                Some("#A:3"),
                &["#A:3@H1", "#A:3@H2"],
                PositionAveraging::Linear,
            )
            .unwrap();

            let spin = return_spin(&hier, Some("@Q1")).unwrap().unwrap();
            assert_eq!(spin.averaging, Some(PositionAveraging::Linear));
            assert_eq!(
                spin.positions,
                Some(vec![
                    Point3::new(1.0, 2.0, 0.0),
                    Point3::new(3.0, 1.0, 0.0),
                ])
            );
        }

        #[test]
        fn members_without_positions_are_an_error() {
            let mut hier = create_standard_test_hierarchy();
            let err = create_pseudo_spin(
                &mut hier,
                Some(12),
                Some("Q1"),
                Some("#A:1"),
                &["#A:1@N"],
                PositionAveraging::Linear,
            )
            .unwrap_err();
            assert!(matches!(err, EngineError::MissingPosition { .. }));
            assert_eq!(hier.molecules[0].residues[0].spins.len(), 2);
        }

        #[test]
        fn missing_members_are_an_error() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                create_pseudo_spin(
                    &mut hier,
                    Some(12),
                    Some("Q1"),
                    Some("#A:1"),
                    &["@CB"],
                    PositionAveraging::Linear,
                )
                .unwrap_err(),
                EngineError::SpinNotFound { .. }
            ));
        }
    }

    mod deletion {
        use super::*;

        #[test]
        fn deleting_the_last_molecule_reseeds_the_placeholder() {
            let mut hier = create_standard_test_hierarchy();
            delete_molecule(&mut hier, "#A").unwrap();
            assert_eq!(hier.molecules.len(), 1);
            assert!(hier.is_empty());
        }

        #[test]
        fn deletion_matches_names_literally() {
            let mut hier = create_standard_test_hierarchy();
            create_molecule(&mut hier, Some("AB")).unwrap();
            // A glob would catch both molecules; deletion must not.
            delete_molecule(&mut hier, "#A*").unwrap();
            assert_eq!(hier.molecules.len(), 2);
        }

        #[test]
        fn residues_are_deleted_across_the_selected_molecules() {
            let mut hier = create_standard_test_hierarchy();
            delete_residue(&mut hier, "#A:1-3").unwrap();
            assert_eq!(hier.molecules[0].residues.len(), 1);
            assert_eq!(hier.molecules[0].residues[0].num, Some(4));
        }

        #[test]
        fn deleting_all_spins_of_a_residue_reseeds_the_placeholder() {
            let mut hier = create_standard_test_hierarchy();
            delete_spin(&mut hier, "#A:1@N,HN").unwrap();
            let res = return_residue(&hier, Some("#A:1")).unwrap().unwrap();
            assert_eq!(res.spins.len(), 1);
            assert!(res.spins.is_empty());
            // The other residues keep their spins.
            assert_eq!(count_spins(&hier, Some("@N"), false).unwrap(), 1);
        }

        #[test]
        fn delete_molecule_rejects_finer_tokens() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                delete_molecule(&mut hier, "#A:1").unwrap_err(),
                EngineError::ResidueIdDisallowed { .. }
            ));
            assert!(matches!(
                delete_residue(&mut hier, "#A:1@N").unwrap_err(),
                EngineError::SpinIdDisallowed { .. }
            ));
        }
    }

    mod renaming_and_renumbering {
        use super::*;

        #[test]
        fn name_molecule_requires_a_unique_match() {
            let mut hier = create_standard_test_hierarchy();
            create_molecule(&mut hier, Some("B")).unwrap();
            assert!(matches!(
                name_molecule(&mut hier, "#*", Some("C")).unwrap_err(),
                EngineError::Ambiguous { .. }
            ));
            name_molecule(&mut hier, "#B", Some("C")).unwrap();
            assert_eq!(hier.molecules[1].name.as_deref(), Some("C"));
        }

        #[test]
        fn name_residue_renames_every_match() {
            let mut hier = create_standard_test_hierarchy();
            name_residue(&mut hier, ":1-2", Some("XXX")).unwrap();
            assert_eq!(hier.molecules[0].residues[0].name.as_deref(), Some("XXX"));
            assert_eq!(hier.molecules[0].residues[1].name.as_deref(), Some("XXX"));
            assert_eq!(hier.molecules[0].residues[2].name.as_deref(), Some("ILE"));
        }

        #[test]
        fn name_spin_rejects_nothing_but_renames_matches() {
            let mut hier = create_standard_test_hierarchy();
            name_spin(&mut hier, Some("@HN"), Some("H")).unwrap();
            assert_eq!(
                hier.molecules[0].residues[0].spins[1].name.as_deref(),
                Some("H")
            );
        }

        #[test]
        fn renumbering_multiple_residues_is_disallowed() {
            let mut hier = create_standard_test_hierarchy();
            assert_eq!(
                number_residue(&mut hier, ":1-2", Some(10)).unwrap_err(),
                EngineError::MultipleRenumber {
                    level: Level::Residue,
                }
            );
            number_residue(&mut hier, ":4", Some(10)).unwrap();
            assert_eq!(hier.molecules[0].residues[3].num, Some(10));
        }

        #[test]
        fn renumbering_multiple_spins_is_disallowed() {
            let mut hier = create_standard_test_hierarchy();
            assert_eq!(
                number_spin(&mut hier, Some("@N"), Some(20)).unwrap_err(),
                EngineError::MultipleRenumber { level: Level::Spin },
            );
            number_spin(&mut hier, Some("@HN"), Some(20)).unwrap();
            assert_eq!(hier.molecules[0].residues[0].spins[1].num, Some(20));
        }

        #[test]
        fn name_residue_rejects_spin_tokens() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                name_residue(&mut hier, ":1@N", Some("X")).unwrap_err(),
                EngineError::SpinIdDisallowed { .. }
            ));
        }
    }

    mod copying {
        use super::*;

        #[test]
        fn a_residue_copy_is_renumbered_from_the_destination() {
            let mut hier = create_standard_test_hierarchy();
            copy_residue(&mut hier, "#A:1", Some(":5,LEU")).unwrap();
            let copy = return_residue(&hier, Some(":5")).unwrap().unwrap();
            assert_eq!(copy.name.as_deref(), Some("LEU"));
            // The subtree came along.
            assert_eq!(copy.spins.len(), 2);
            assert_eq!(copy.spins[0].name.as_deref(), Some("N"));
            // The source is untouched.
            let source = return_residue(&hier, Some(":1")).unwrap().unwrap();
            assert_eq!(source.name.as_deref(), Some("MET"));
        }

        #[test]
        fn copying_onto_an_existing_residue_is_an_error() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                copy_residue(&mut hier, "#A:1", Some(":2")).unwrap_err(),
                EngineError::TargetExists {
                    level: Level::Residue,
                    ..
                }
            ));
        }

        #[test]
        fn copying_a_missing_residue_is_an_error() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                copy_residue(&mut hier, "#A:9", Some(":10")).unwrap_err(),
                EngineError::ResidueNotFound { .. }
            ));
        }

        #[test]
        fn molecules_are_deep_cloned_between_hierarchies() {
            let src = create_standard_test_hierarchy();
            let mut dst = Hierarchy::new();
            copy_molecule_between(&src, "#A", &mut dst, Some("#B")).unwrap();
            assert_eq!(dst.molecules.len(), 1);
            assert_eq!(dst.molecules[0].name.as_deref(), Some("B"));
            assert_eq!(dst.molecules[0].residues.len(), 4);
            assert_eq!(count_spins(&dst, Some("#B:1"), false).unwrap(), 2);
        }

        #[test]
        fn a_spin_copy_lands_in_the_destination_residue() {
            let mut hier = create_standard_test_hierarchy();
            copy_spin(&mut hier, "#A:1@HN", Some("#A:3@9,HE")).unwrap();
            let copy = return_spin(&hier, Some("#A:3@HE")).unwrap().unwrap();
            assert_eq!(copy.num, Some(9));
        }

        #[test]
        fn a_spin_copy_into_a_missing_residue_is_an_error() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                copy_spin(&mut hier, "#A:1@HN", Some("#A:9")).unwrap_err(),
                EngineError::ResidueNotFound { .. }
            ));
        }

        #[test]
        fn a_molecule_copy_rejects_residue_tokens() {
            let mut hier = create_standard_test_hierarchy();
            assert!(matches!(
                copy_molecule(&mut hier, "#A:1", Some("#B")).unwrap_err(),
                EngineError::ResidueIdDisallowed { .. }
            ));
        }
    }

    mod selection_flags {
        use super::*;

        #[test]
        fn deselect_and_select_all_touch_every_spin() {
            let mut hier = create_standard_test_hierarchy();
            deselect_all(&mut hier);
            assert_eq!(count_spins(&hier, None, true).unwrap(), 0);
            select_all(&mut hier);
            assert_eq!(count_spins(&hier, None, true).unwrap(), 5);
        }

        #[test]
        fn deselection_follows_the_identifier() {
            let mut hier = create_standard_test_hierarchy();
            deselect_spins(&mut hier, Some("#A:1")).unwrap();
            assert_eq!(count_spins(&hier, None, true).unwrap(), 3);
            select_spins(&mut hier, Some("@HN")).unwrap();
            assert_eq!(count_spins(&hier, None, true).unwrap(), 4);
        }

        #[test]
        fn reversing_flips_the_matching_spins() {
            let mut hier = create_standard_test_hierarchy();
            deselect_spins(&mut hier, Some("@N")).unwrap();
            reverse_selection(&mut hier, None).unwrap();
            let selected: Vec<bool> = spin_loop(&hier, None)
                .unwrap()
                .map(|entry| entry.spin.select)
                .collect();
            assert_eq!(selected, vec![true, false, true, false, false]);
        }
    }
}
