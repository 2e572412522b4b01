use super::error::SelectionError;

/// Splits an identification string into its molecule, residue, and spin
/// tokens.
///
/// The molecule token is the text after the `#` character, the residue token
/// the text after the `:` character, and the spin token the text after the
/// `@` character. Each delimiter may occur at most once and the tokens must
/// appear in `#`, `:`, `@` order. An absent input means "no constraint" and
/// yields three absent tokens.
///
/// # Arguments
///
/// * `id` - The identification string, or `None` for no constraint.
///
/// # Return
///
/// The molecule, residue, and spin token substrings, each `None` when the
/// corresponding delimiter is absent.
///
/// # Errors
///
/// Returns a [`SelectionError`] for repeated delimiters, out-of-order
/// delimiters, or a non-absent string containing no token at all.
pub fn tokenize(id: Option<&str>) -> Result<TokenTriple<'_>, SelectionError> {
    let Some(id) = id else {
        return Ok((None, None, None));
    };

    // The spin token is split off first so that the residue and molecule
    // splits only ever see the text before the '@'.
    let (rest, spin_token) = match id.split_once('@') {
        Some((head, tail)) => {
            if tail.contains('@') {
                return Err(SelectionError::RepeatedDelimiter {
                    delimiter: '@',
                    id: id.to_string(),
                });
            }
            if tail.contains(':') {
                return Err(SelectionError::OutOfOrder {
                    later: '@',
                    earlier: ':',
                    id: id.to_string(),
                });
            }
            if tail.contains('#') {
                return Err(SelectionError::OutOfOrder {
                    later: '@',
                    earlier: '#',
                    id: id.to_string(),
                });
            }
            (head, Some(tail))
        }
        None => (id, None),
    };

    let (rest, res_token) = match rest.split_once(':') {
        Some((head, tail)) => {
            if tail.contains(':') {
                return Err(SelectionError::RepeatedDelimiter {
                    delimiter: ':',
                    id: id.to_string(),
                });
            }
            if tail.contains('#') {
                return Err(SelectionError::OutOfOrder {
                    later: ':',
                    earlier: '#',
                    id: id.to_string(),
                });
            }
            (head, Some(tail))
        }
        None => (rest, None),
    };

    let mol_token = match rest.split_once('#') {
        Some((_, tail)) => {
            if tail.contains('#') {
                return Err(SelectionError::RepeatedDelimiter {
                    delimiter: '#',
                    id: id.to_string(),
                });
            }
            Some(tail)
        }
        None => None,
    };

    if mol_token.is_none() && res_token.is_none() && spin_token.is_none() {
        return Err(SelectionError::Invalid { id: id.to_string() });
    }

    Ok((mol_token, res_token, spin_token))
}

/// The molecule, residue, and spin token substrings of one identifier.
pub type TokenTriple<'a> = (Option<&'a str>, Option<&'a str>, Option<&'a str>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_absent_identifier_yields_three_absent_tokens() {
        assert_eq!(tokenize(None).unwrap(), (None, None, None));
    }

    #[test]
    fn a_full_identifier_is_split_into_three_tokens() {
        assert_eq!(
            tokenize(Some("#ubi:1-5@N,HN")).unwrap(),
            (Some("ubi"), Some("1-5"), Some("N,HN"))
        );
    }

    #[test]
    fn partial_identifiers_leave_the_other_tokens_absent() {
        assert_eq!(tokenize(Some("#ubi")).unwrap(), (Some("ubi"), None, None));
        assert_eq!(tokenize(Some(":1")).unwrap(), (None, Some("1"), None));
        assert_eq!(tokenize(Some("@CA")).unwrap(), (None, None, Some("CA")));
        assert_eq!(
            tokenize(Some(":1@CA")).unwrap(),
            (None, Some("1"), Some("CA"))
        );
    }

    #[test]
    fn repeated_delimiters_are_rejected() {
        assert_eq!(
            tokenize(Some("@N@H")).unwrap_err(),
            SelectionError::RepeatedDelimiter {
                delimiter: '@',
                id: "@N@H".to_string(),
            }
        );
        assert!(matches!(
            tokenize(Some(":1:2")).unwrap_err(),
            SelectionError::RepeatedDelimiter { delimiter: ':', .. }
        ));
        assert!(matches!(
            tokenize(Some("#A#B")).unwrap_err(),
            SelectionError::RepeatedDelimiter { delimiter: '#', .. }
        ));
    }

    #[test]
    fn out_of_order_delimiters_are_rejected() {
        assert!(matches!(
            tokenize(Some("@N:1")).unwrap_err(),
            SelectionError::OutOfOrder {
                later: '@',
                earlier: ':',
                ..
            }
        ));
        assert!(matches!(
            tokenize(Some("@N#A")).unwrap_err(),
            SelectionError::OutOfOrder {
                later: '@',
                earlier: '#',
                ..
            }
        ));
        assert!(matches!(
            tokenize(Some(":1#A")).unwrap_err(),
            SelectionError::OutOfOrder {
                later: ':',
                earlier: '#',
                ..
            }
        ));
    }

    #[test]
    fn a_string_without_any_token_is_invalid() {
        assert_eq!(
            tokenize(Some("ubi")).unwrap_err(),
            SelectionError::Invalid {
                id: "ubi".to_string(),
            }
        );
    }

    #[test]
    fn text_before_the_molecule_delimiter_is_ignored() {
        // Mirrors the splitting rules: only the text after '#' matters.
        assert_eq!(tokenize(Some("x#A")).unwrap(), (Some("A"), None, None));
    }
}
