/// Splits a variable label such as `"T (K)"` into its name and unit text.
///
/// The unit is the content of the trailing balanced parenthesis group, so
/// nested groups survive: `"S (J/(mol*K))"` gives `("S", "J/(mol*K)")`. A
/// label without a trailing group has an empty unit.
///
/// ```rust
/// use equationer::record::split_label_units;
///
/// assert_eq!(split_label_units("k (s**-1)"), ("k".to_string(), "s**-1".to_string()));
/// assert_eq!(split_label_units("T"), ("T".to_string(), String::new()));
/// ```
pub fn split_label_units(label: &str) -> (String, String) {
    let trimmed = label.trim();
    let Some(body) = trimmed.strip_suffix(')') else {
        return (trimmed.to_string(), String::new());
    };

    let mut depth = 0usize;
    for (i, c) in body.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth == 0 => {
                let name = body[..i].trim();
                let units = body[i + 1..].trim();
                return (name.to_string(), units.to_string());
            }
            '(' => depth -= 1,
            _ => {}
        }
    }

    (trimmed.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_units() {
        assert_eq!(
            split_label_units("S (J/(mol*K))"),
            ("S".to_string(), "J/(mol*K)".to_string())
        );
    }

    #[test]
    fn test_unbalanced_label_has_no_units() {
        assert_eq!(split_label_units("x)"), ("x)".to_string(), String::new()));
        assert_eq!(split_label_units("  T (K) "), ("T".to_string(), "K".to_string()));
    }
}
