use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity key of an entity within its sibling list.
///
/// Molecules key on their name; residues and spins key on their number when
/// one is set, falling back to their name. A placeholder carries no key.
///
/// The derived ordering places all numbers before all names (numbers by
/// value, names lexically), with unset keys sorting last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identity {
    Number(i64),
    Name(String),
    Unset,
}

impl Identity {
    /// Builds the key from the raw identity fields, preferring the number.
    pub fn from_fields(num: Option<i64>, name: Option<&str>) -> Self {
        match (num, name) {
            (Some(num), _) => Identity::Number(num),
            (None, Some(name)) => Identity::Name(name.to_string()),
            (None, None) => Identity::Unset,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Identity::Unset)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Number(num) => write!(f, "{num}"),
            Identity::Name(name) => write!(f, "{name}"),
            Identity::Unset => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fields_prefers_the_number() {
        assert_eq!(Identity::from_fields(Some(5), Some("N")), Identity::Number(5));
        assert_eq!(
            Identity::from_fields(None, Some("N")),
            Identity::Name("N".to_string())
        );
        assert_eq!(Identity::from_fields(None, None), Identity::Unset);
    }

    #[test]
    fn numbers_sort_before_names_and_unset_sorts_last() {
        let mut keys = vec![
            Identity::Unset,
            Identity::Name("CA".to_string()),
            Identity::Number(3),
            Identity::Name("N".to_string()),
            Identity::Number(-2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Identity::Number(-2),
                Identity::Number(3),
                Identity::Name("CA".to_string()),
                Identity::Name("N".to_string()),
                Identity::Unset,
            ]
        );
    }

    #[test]
    fn display_formats_each_variant() {
        assert_eq!(Identity::Number(-7).to_string(), "-7");
        assert_eq!(Identity::Name("HN".to_string()).to_string(), "HN");
        assert_eq!(Identity::Unset.to_string(), "?");
    }
}
