use super::error::EngineError;
use super::query::{molecule_loop, residue_loop, spin_loop};
use crate::core::models::hierarchy::Hierarchy;
use crate::core::selection::tokenize::tokenize;
use std::fmt::Write;

fn cell<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

/// Formats a table of the molecules matching the identifier and their
/// residue counts.
pub fn format_molecules(hier: &Hierarchy, mol_id: Option<&str>) -> Result<String, EngineError> {
    let mut table = String::new();
    let _ = writeln!(table, "{:<15} {:<18}", "Molecule", "Number of residues");
    for mol in molecule_loop(hier, mol_id)? {
        let _ = writeln!(table, "{:<15} {:<18}", cell(mol.name.as_deref()), mol.residues.len());
    }
    Ok(table)
}

/// Formats a table of the residues matching the identifier and their spin
/// counts.
pub fn format_residues(hier: &Hierarchy, res_id: Option<&str>) -> Result<String, EngineError> {
    let (_, _, spin_token) = tokenize(res_id)?;
    if spin_token.is_some() {
        return Err(EngineError::SpinIdDisallowed {
            id: res_id.unwrap_or_default().to_string(),
        });
    }

    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:<15} {:<12} {:<12} {:<15}",
        "Molecule", "Res number", "Res name", "Number of spins"
    );
    for entry in residue_loop(hier, res_id)? {
        let _ = writeln!(
            table,
            "{:<15} {:<12} {:<12} {:<15}",
            cell(entry.mol_name),
            cell(entry.residue.num),
            cell(entry.residue.name.as_deref()),
            entry.residue.spins.len()
        );
    }
    Ok(table)
}

/// Formats a table of the spins matching the identifier.
pub fn format_spins(hier: &Hierarchy, spin_id: Option<&str>) -> Result<String, EngineError> {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:<15} {:<12} {:<12} {:<13} {:<12}",
        "Molecule", "Res number", "Res name", "Spin number", "Spin name"
    );
    for entry in spin_loop(hier, spin_id)? {
        let _ = writeln!(
            table,
            "{:<15} {:<12} {:<12} {:<13} {:<12}",
            cell(entry.mol_name),
            cell(entry.res_num),
            cell(entry.res_name),
            cell(entry.spin.num),
            cell(entry.spin.name.as_deref())
        );
    }
    Ok(table)
}
