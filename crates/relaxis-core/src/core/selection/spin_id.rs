/// Generates the identification string for one spin.
///
/// Only the supplied fields are emitted. When both the number and the name
/// of one level are present they are joined with `&`, producing strings such
/// as `#ubi:1&:MET@2&@N` that select the entity through the intersection of
/// both constraints.
pub fn generate_spin_id(
    mol_name: Option<&str>,
    res_num: Option<i64>,
    res_name: Option<&str>,
    spin_num: Option<i64>,
    spin_name: Option<&str>,
) -> String {
    let mut id = String::new();

    if let Some(mol_name) = mol_name {
        id.push('#');
        id.push_str(mol_name);
    }

    if let Some(res_num) = res_num {
        id.push(':');
        id.push_str(&res_num.to_string());
    }
    if let Some(res_name) = res_name {
        id.push_str(if res_num.is_some() { "&:" } else { ":" });
        id.push_str(res_name);
    }

    if let Some(spin_num) = spin_num {
        id.push('@');
        id.push_str(&spin_num.to_string());
    }
    if let Some(spin_name) = spin_name {
        id.push_str(if spin_num.is_some() { "&@" } else { "@" });
        id.push_str(spin_name);
    }

    id
}
