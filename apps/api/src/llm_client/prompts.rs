// Prompt templating shared by every component.
// Each component keeps its own prompts.rs alongside it.

/// Fills `{placeholder}` slots in a prompt template.
pub fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    slots.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_every_occurrence() {
        let out = fill("{a} and {a} then {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x then y");
    }

    #[test]
    fn test_fill_leaves_unknown_slots() {
        assert_eq!(fill("{missing}", &[]), "{missing}");
    }
}
