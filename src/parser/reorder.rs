use regex::Regex;
use std::sync::LazyLock;

use crate::knowledge::{self, units, PARAMETERS};

/// Unit spellings that open a unit-first row even when OCR mangled the rest of the unit.
static UNIT_LINE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\d+\^?\d*/л|г/л|%|фл|пг|мм/ч)").expect("valid unit prefix pattern")
});

static LEADING_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:<=|>=|[<>≤≥])?\s*\d+(?:[.,]\d+)?\s*\*?").expect("valid value pattern")
});

fn looks_like_unit_line(line: &str) -> bool {
    let trimmed = line.trim();
    units::is_unit_line(trimmed) || UNIT_LINE_PREFIX.is_match(trimmed)
}

fn names_a_parameter(line: &str) -> bool {
    let lower = line.to_lowercase();
    PARAMETERS.iter().any(|d| knowledge::mentions_any(&lower, d.keywords))
}

/// Rewrites `unit / name / value` triples into a single `name value unit` line.
///
/// Some exports print the unit column before the parameter name, which leaves the
/// value two lines away from the unit it belongs to. Lines that do not form a complete
/// triple pass through unchanged.
pub fn reorder_unit_first_rows(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if i + 2 < lines.len()
            && looks_like_unit_line(lines[i])
            && names_a_parameter(lines[i + 1])
            && LEADING_VALUE.is_match(lines[i + 2])
        {
            let unit = lines[i].trim();
            let name = lines[i + 1].trim();
            let value = lines[i + 2].trim();
            out.push(format!("{} {} {}", name, value, unit));
            i += 3;
            continue;
        }
        out.push(lines[i].to_string());
        i += 1;
    }

    out.join("\n")
}
