pub mod laboratories;
pub mod parameters;
pub mod units;

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::{Category, Sex};

pub use parameters::{category_keywords, ParameterDefinition, ReferenceRange, ValueKind, PARAMETERS};

/// Lower-cased alias -> index into `PARAMETERS`. Canonical keys are aliases of themselves.
static ALIAS_INDEX: LazyLock<HashMap<String, usize>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for (position, definition) in PARAMETERS.iter().enumerate() {
        index.insert(definition.key.to_string(), position);
        for alias in definition.aliases {
            index.insert(normalize_alias(alias), position);
        }
    }
    index
});

/// Canonical form of an alias: trimmed, lower-cased, spaces and dashes folded to `_`.
pub fn normalize_alias(alias: &str) -> String {
    alias
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

pub fn lookup(alias: &str) -> Option<&'static ParameterDefinition> {
    ALIAS_INDEX.get(&normalize_alias(alias)).map(|&i| &PARAMETERS[i])
}

pub fn canonical_key(alias: &str) -> Option<&'static str> {
    lookup(alias).map(|d| d.key)
}

pub fn category_of(alias: &str) -> Option<Category> {
    lookup(alias).map(|d| d.category)
}

pub fn display_name(alias: &str) -> Option<&'static str> {
    lookup(alias).map(|d| d.display_name())
}

/// Reference interval for a parameter. Without a sex, sex-dependent ranges widen to the
/// envelope of both.
pub fn reference_range(alias: &str, sex: Option<Sex>) -> Option<(f64, f64)> {
    let definition = lookup(alias)?;
    Some(match (definition.reference, sex) {
        (ReferenceRange::Flat(low, high), _) => (low, high),
        (ReferenceRange::BySex { male, .. }, Some(Sex::Male)) => male,
        (ReferenceRange::BySex { female, .. }, Some(Sex::Female)) => female,
        (ReferenceRange::BySex { male, female }, None) => {
            (male.0.min(female.0), male.1.max(female.1))
        }
    })
}

/// Unknown aliases are treated as plausible so unrecognised readings are never dropped here.
pub fn is_plausible(alias: &str, value: f64) -> bool {
    match lookup(alias) {
        Some(definition) => {
            let (min, max) = definition.plausible;
            value >= min && value <= max
        }
        None => true,
    }
}

pub fn parameters_in(category: Category) -> impl Iterator<Item = &'static ParameterDefinition> {
    PARAMETERS.iter().filter(move |d| d.category == category)
}

/// Finds `keyword` in an already lower-cased line and returns the byte offset just past it.
///
/// Short keywords ("hb", "ne", "алт") must stand alone as a token; longer ones only
/// need a token start so inflected forms ("гемоглобина") still match.
pub fn find_keyword(line_lower: &str, keyword: &str) -> Option<usize> {
    let whole_token = keyword.chars().count() <= 4;
    let mut search_from = 0;
    while let Some(offset) = line_lower[search_from..].find(keyword) {
        let start = search_from + offset;
        let end = start + keyword.len();
        let starts_token = line_lower[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let ends_token = line_lower[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if starts_token && (!whole_token || ends_token) {
            return Some(end);
        }
        search_from = start + line_lower[start..].chars().next().map_or(1, |c| c.len_utf8());
    }
    None
}

pub fn mentions_any(line_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| find_keyword(line_lower, k).is_some())
}
