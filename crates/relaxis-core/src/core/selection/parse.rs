use super::error::SelectionError;
use std::fmt;
use tracing::debug;

/// One parsed element of an identification token.
///
/// The derived ordering sorts all numbers before all names, numbers by value
/// and names lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Number(i64),
    Name(String),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Number(num) => write!(f, "{num}"),
            Element::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Parses one token into its sorted list of identifying numbers and names.
///
/// The token is split on `,` and each piece trimmed. A piece is converted to
/// a number where possible and kept as a name otherwise. A piece of the form
/// `start-end` with integer bounds and `start < end` is expanded to the full
/// inclusive range; the dash scan skips the first character so a leading
/// negative sign is never mistaken for a range. Any other dashed piece falls
/// back to a name with a logged diagnostic, never an error.
///
/// An absent token yields an empty constraint set.
pub fn parse_token(token: Option<&str>) -> Vec<Element> {
    let Some(token) = token else {
        return Vec::new();
    };

    let mut elements = Vec::new();
    for raw in token.split(',') {
        let piece = raw.trim();
        let dashes: Vec<usize> = piece
            .char_indices()
            .skip(1)
            .filter(|&(_, c)| c == '-')
            .map(|(index, _)| index)
            .collect();

        match dashes.as_slice() {
            [] => match piece.parse::<i64>() {
                Ok(num) => elements.push(Element::Number(num)),
                Err(_) => elements.push(Element::Name(piece.to_string())),
            },
            [dash] => {
                let bounds = (piece[..*dash].parse::<i64>(), piece[dash + 1..].parse::<i64>());
                match bounds {
                    (Ok(start), Ok(end)) if start < end => {
                        elements.extend((start..=end).map(Element::Number));
                    }
                    (Ok(start), Ok(end)) => {
                        debug!(
                            element = piece,
                            start,
                            end,
                            "the start of the range is not below its end, keeping the element as a name"
                        );
                        elements.push(Element::Name(piece.to_string()));
                    }
                    _ => {
                        debug!(
                            element = piece,
                            "the range bounds are not integers, keeping the element as a name"
                        );
                        elements.push(Element::Name(piece.to_string()));
                    }
                }
            }
            _ => {
                debug!(
                    element = piece,
                    "more than one range character found, keeping the element as a name"
                );
                elements.push(Element::Name(piece.to_string()));
            }
        }
    }

    elements.sort();
    elements
}

/// Extracts the single molecule name a token is allowed to denote.
///
/// Used when a token names a rename or copy destination, where anything but
/// one element is ambiguous.
pub fn single_molecule_info(token: Option<&str>) -> Result<Option<String>, SelectionError> {
    let mut name = None;
    for element in parse_token(token) {
        if name.is_some() {
            return Err(SelectionError::AmbiguousToken {
                token: token.unwrap_or_default().to_string(),
            });
        }
        name = Some(element.to_string());
    }
    Ok(name)
}

/// Extracts the single residue number and name a token is allowed to denote.
pub fn single_residue_info(
    token: Option<&str>,
) -> Result<(Option<i64>, Option<String>), SelectionError> {
    single_entity_info(token)
}

/// Extracts the single spin number and name a token is allowed to denote.
pub fn single_spin_info(
    token: Option<&str>,
) -> Result<(Option<i64>, Option<String>), SelectionError> {
    single_entity_info(token)
}

fn single_entity_info(token: Option<&str>) -> Result<(Option<i64>, Option<String>), SelectionError> {
    let mut num = None;
    let mut name = None;
    for element in parse_token(token) {
        match element {
            Element::Number(n) if num.is_none() => num = Some(n),
            Element::Name(s) if name.is_none() => name = Some(s),
            _ => {
                return Err(SelectionError::AmbiguousToken {
                    token: token.unwrap_or_default().to_string(),
                });
            }
        }
    }
    Ok((num, name))
}
