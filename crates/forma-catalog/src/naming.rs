//! Exercise name forms
//!
//! Catalog keys are SCREAMING_SNAKE_CASE (`BICEP_CURL`); hosts show and send
//! back title-cased names (`Bicep Curl`).

/// `BICEP_CURL` -> `Bicep Curl`
pub fn display_name(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Bicep Curl` (or `bicep-curl`) -> `BICEP_CURL`
pub fn canonical_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|word| !word.is_empty())
        .map(|word| word.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}
