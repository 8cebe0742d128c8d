use std::collections::BTreeSet;

/// Parses a scope parameter. Scopes may be separated by spaces or commas.
pub fn parse_scope(value: &str) -> BTreeSet<String> {
    value
        .split([' ', ','])
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}

/// Space-separated scope string, in sorted order
pub fn format_scope(scope: &BTreeSet<String>) -> String {
    scope.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}
