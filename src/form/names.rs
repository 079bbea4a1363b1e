//! Field display-name normalization

/// Type labels that form designers append to field names
const TYPE_SUFFIXES: [&str; 9] = [
    "Text Box",
    "Text Field",
    "Checkbox",
    "Check Box",
    "Radio Button",
    "Dropdown",
    "Combo Box",
    "List Box",
    "Signature",
];

/// Strip trailing UI type labels (e.g. `"Email Text Box"` -> `"Email"`).
///
/// A suffix only counts when whitespace separates it from the rest of the
/// name, so a field called just `"Signature"` keeps its name. Stripping
/// repeats until no suffix is left, which makes the function idempotent.
pub fn clean(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut current = name.trim_end();
    while let Some(stripped) = strip_type_suffix(current) {
        current = stripped;
    }
    current.trim().to_string()
}

fn strip_type_suffix(name: &str) -> Option<&str> {
    TYPE_SUFFIXES.iter().find_map(|suffix| {
        let split = name.len().checked_sub(suffix.len())?;
        if !name.is_char_boundary(split) {
            return None;
        }
        let (head, tail) = name.split_at(split);
        if !tail.eq_ignore_ascii_case(suffix) {
            return None;
        }
        // the suffix must be its own word
        if !head.ends_with(char::is_whitespace) || head.trim().is_empty() {
            return None;
        }
        Some(head.trim_end())
    })
}
