use super::parse::Element;
use regex::Regex;

/// Converts a glob-style identifier pattern into an anchored regular
/// expression: `*` matches any run of characters, `?` a single character,
/// everything else is literal.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 2);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

/// True if the name matches any name pattern among the elements.
///
/// An absent name never matches; number elements never match a name.
pub(crate) fn matches_name(elements: &[Element], name: Option<&str>) -> bool {
    let Some(name) = name else {
        return false;
    };
    elements.iter().any(|element| match element {
        Element::Name(pattern) => {
            glob_to_regex(pattern).is_some_and(|regex| regex.is_match(name))
        }
        Element::Number(_) => false,
    })
}

/// True if the entity's number is listed or its name matches a pattern.
pub(crate) fn matches_entity(elements: &[Element], num: Option<i64>, name: Option<&str>) -> bool {
    num.is_some_and(|num| elements.contains(&Element::Number(num))) || matches_name(elements, name)
}

/// Literal element matching, used where mutation targets are resolved:
/// numbers by value, names by exact string equality (no patterns).
pub(crate) fn matches_exact(elements: &[Element], num: Option<i64>, name: Option<&str>) -> bool {
    elements.iter().any(|element| match element {
        Element::Number(n) => Some(*n) == num,
        Element::Name(s) => Some(s.as_str()) == name,
    })
}
