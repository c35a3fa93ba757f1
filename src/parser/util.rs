//! Text helpers shared by the parse phases.

use crate::xml::Element;

pub(crate) const USER_PREFIX: &str = "user(";
pub(crate) const GROUP_PREFIX: &str = "group(";

/// Lenient boolean: `true|enabled|on|active|yes` and their negations.
pub(crate) fn parse_boolean(text: &str) -> Option<bool> {
    match text {
        "true" | "enabled" | "on" | "active" | "yes" => Some(true),
        "false" | "disabled" | "off" | "inactive" | "no" => Some(false),
        _ => None,
    }
}

/// [`parse_boolean`] with a default for an absent attribute.
pub(crate) fn parse_boolean_or(text: Option<&str>, default: bool) -> Option<bool> {
    text.map_or(Some(default), parse_boolean)
}

/// Split a comma separated list. Commas inside `${...}` or `#{...}` do not
/// separate entries; entries are trimmed.
pub(crate) fn split_comma_separated(text: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut inside_expression = false;

    for character in text.chars() {
        match character {
            '{' | '$' => inside_expression = true,
            '}' => inside_expression = false,
            ',' if !inside_expression => {
                entries.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(character);
    }

    if !current.is_empty() {
        entries.push(current.trim().to_string());
    }
    entries
}

/// All `documentation` children, trimmed and joined by a blank line.
pub(crate) fn parse_documentation(element: &Element) -> Option<String> {
    let docs: Vec<&str> = element
        .elements("documentation")
        .map(|doc| doc.text().trim())
        .collect();
    (!docs.is_empty()).then(|| docs.join("\n\n"))
}

/// The id inside `user(...)` or `group(...)`.
pub(crate) fn assignment_id<'t>(expression: &'t str, prefix: &str) -> &'t str {
    let inner = expression.strip_prefix(prefix).unwrap_or(expression);
    inner.strip_suffix(')').unwrap_or(inner).trim()
}
