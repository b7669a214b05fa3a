//! Value, reference-range and status extraction shared by both extraction strategies.

use regex::Regex;
use std::sync::LazyLock;

use crate::knowledge::units;
use crate::models::{Comparison, ReadingStatus};

static VALUE_WITH_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(<=|>=|[<>≤≥])?\s*(\d+(?:[.,]\d+)?)\s*(\*)?\s*$").expect("valid value pattern")
});

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<=|>=|[<>≤≥])?\s*(\d+(?:[.,]\d+)?)(\s*\*)?").expect("valid number pattern")
});

/// Parenthesised abbreviations such as `(WBC)` or `(25-OH)`.
static LABELLED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\p{L}[^)]*\)").expect("valid group pattern"));

/// Service codes (`A09.05.003`), dates and clock times.
static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-zа-я]\d{2}\.\d{2}\.\d{3}(?:\.\d+)?|\d{1,2}[./]\d{1,2}[./]\d{2,4}|\d{1,2}:\d{2}(?::\d{2})?")
        .expect("valid noise pattern")
});

static RANGE_BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)от\s*(\d+(?:[.,]\d+)?)\s*до\s*(\d+(?:[.,]\d+)?)").expect("valid range pattern")
});

static RANGE_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*[-–—]\s*(\d+(?:[.,]\d+)?)").expect("valid range pattern")
});

static RANGE_UPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(<=|≤|<|до)\s*(\d+(?:[.,]\d+)?)").expect("valid range pattern")
});

static RANGE_LOWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(>=|≥|>|от)\s*(\d+(?:[.,]\d+)?)").expect("valid range pattern")
});

pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses `"< 0,30"`, `"≥5"`, `"145*"` and plain numbers.
pub fn parse_value_with_operator(text: &str) -> Option<(Option<Comparison>, f64)> {
    let caps = VALUE_WITH_OPERATOR.captures(text)?;
    let operator = caps.get(1).and_then(|m| Comparison::from_symbol(m.as_str()));
    let value = parse_number(caps.get(2)?.as_str())?;
    Some((operator, value))
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberToken {
    pub operator: Option<Comparison>,
    pub value: f64,
    /// Trailing `*`, the abnormality marker most labs print next to out-of-range values.
    pub flagged: bool,
    pub start: usize,
    pub end: usize,
}

/// Removes everything in a line that looks numeric but is not a measurement.
pub fn scrub_line(line: &str, mask_ranges: bool) -> String {
    let mut cleaned = LABELLED_GROUP.replace_all(line, " ").into_owned();
    cleaned = NOISE.replace_all(&cleaned, " ").into_owned();
    cleaned = units::strip_units(&cleaned);
    if mask_ranges {
        let blank = |caps: &regex::Captures| " ".repeat(caps[0].len());
        cleaned = RANGE_BETWEEN.replace_all(&cleaned, blank).into_owned();
        cleaned = RANGE_DASH.replace_all(&cleaned, blank).into_owned();
    }
    cleaned
}

/// First standalone number in already-scrubbed text. Digits glued to a preceding letter
/// (`т4`, `b12`) are skipped.
pub fn first_number(scrubbed: &str) -> Option<NumberToken> {
    for caps in NUMBER_TOKEN.captures_iter(scrubbed) {
        let whole = caps.get(0)?;
        let digits = caps.get(2)?;
        let glued = scrubbed[..digits.start()]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_alphabetic() || c == '.' || c == ',' || c == '^');
        if glued && caps.get(1).is_none() {
            continue;
        }
        let Some(value) = parse_number(digits.as_str()) else {
            continue;
        };
        let operator = caps.get(1);
        return Some(NumberToken {
            operator: operator.and_then(|m| Comparison::from_symbol(m.as_str())),
            value,
            flagged: caps.get(3).is_some(),
            // leading whitespace may be a masked reference range
            start: operator.map_or(digits.start(), |m| m.start()),
            end: whole.end(),
        });
    }
    None
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInterval {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub text: String,
}

impl ReferenceInterval {
    pub fn status_for(&self, value: f64, flagged: bool) -> ReadingStatus {
        let below = self.low.is_some_and(|low| value < low);
        let above = self.high.is_some_and(|high| value > high);
        if below {
            ReadingStatus::Decreased
        } else if above {
            ReadingStatus::Elevated
        } else if flagged {
            // marked abnormal by the lab although inside the printed bounds
            if self.high.is_none() {
                ReadingStatus::Decreased
            } else {
                ReadingStatus::Elevated
            }
        } else {
            ReadingStatus::Normal
        }
    }
}

/// Finds a reference interval in free text: `a - b`, `от a до b`, `< b`, `> a`.
pub fn parse_reference(text: &str) -> Option<ReferenceInterval> {
    if let Some(caps) = RANGE_BETWEEN.captures(text) {
        return Some(ReferenceInterval {
            low: parse_number(&caps[1]),
            high: parse_number(&caps[2]),
            text: caps[0].trim().to_string(),
        });
    }
    if let Some(caps) = RANGE_DASH.captures(text) {
        let low = parse_number(&caps[1]);
        let high = parse_number(&caps[2]);
        if let (Some(l), Some(h)) = (low, high) {
            if l <= h {
                return Some(ReferenceInterval {
                    low,
                    high,
                    text: caps[0].trim().to_string(),
                });
            }
        }
    }
    if let Some(caps) = RANGE_UPPER.captures(text) {
        return Some(ReferenceInterval {
            low: None,
            high: parse_number(&caps[2]),
            text: caps[0].trim().to_string(),
        });
    }
    if let Some(caps) = RANGE_LOWER.captures(text) {
        return Some(ReferenceInterval {
            low: parse_number(&caps[2]),
            high: None,
            text: caps[0].trim().to_string(),
        });
    }
    None
}

pub fn status_from_reference(value: f64, reference: Option<&ReferenceInterval>, flagged: bool) -> ReadingStatus {
    reference.map_or(ReadingStatus::Unknown, |r| r.status_for(value, flagged))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_with_operator() {
        assert_eq!(parse_value_with_operator("145"), Some((None, 145.0)));
        assert_eq!(parse_value_with_operator(" 5,2 "), Some((None, 5.2)));
        assert_eq!(parse_value_with_operator("< 0.30"), Some((Some(Comparison::Less), 0.30)));
        assert_eq!(parse_value_with_operator("≥5"), Some((Some(Comparison::GreaterOrEqual), 5.0)));
        assert_eq!(parse_value_with_operator(">= 1.5"), Some((Some(Comparison::GreaterOrEqual), 1.5)));
        assert_eq!(parse_value_with_operator("12.4*"), Some((None, 12.4)));
        assert_eq!(parse_value_with_operator("abc"), None);
        assert_eq!(parse_value_with_operator("5.2 ммоль/л"), None);
    }

    #[test]
    fn test_first_number_skips_glued_digits() {
        let token = first_number(" т4 свободный 15.3").unwrap();
        assert_eq!(token.value, 15.3);

        let token = first_number("  172* ").unwrap();
        assert_eq!(token.value, 172.0);
        assert!(token.flagged);

        assert!(first_number("   ").is_none());

        let token = first_number("   <= 5").unwrap();
        assert_eq!((token.start, token.end), (3, 7));
        let token = first_number("          145 ").unwrap();
        assert_eq!(token.start, 10);
    }

    #[test]
    fn test_scrub_line_drops_codes_units_and_ranges() {
        let scrubbed = scrub_line("A09.05.003 Гемоглобин (HGB) 145 г/л 130 - 170", true);
        let token = first_number(&scrubbed).unwrap();
        assert_eq!(token.value, 145.0);

        let scrubbed = scrub_line("Лейкоциты (WBC), 10^9/л", true);
        assert!(first_number(&scrubbed).is_none());

        let scrubbed = scrub_line("Дата 12.03.2024 10:45", true);
        assert!(first_number(&scrubbed).is_none());
    }

    #[test]
    fn test_parse_reference_forms() {
        let r = parse_reference("130 - 170").unwrap();
        assert_eq!((r.low, r.high), (Some(130.0), Some(170.0)));
        assert_eq!(r.text, "130 - 170");

        let r = parse_reference("3,3–5,5").unwrap();
        assert_eq!((r.low, r.high), (Some(3.3), Some(5.5)));

        let r = parse_reference("от 0.27 до 4.2").unwrap();
        assert_eq!((r.low, r.high), (Some(0.27), Some(4.2)));

        let r = parse_reference("< 5").unwrap();
        assert_eq!((r.low, r.high), (None, Some(5.0)));

        let r = parse_reference("> 1.0").unwrap();
        assert_eq!((r.low, r.high), (Some(1.0), None));

        assert!(parse_reference("нет данных").is_none());
    }

    #[test]
    fn test_status_from_reference() {
        let r = parse_reference("130 - 170").unwrap();
        assert_eq!(r.status_for(145.0, false), ReadingStatus::Normal);
        assert_eq!(r.status_for(120.0, false), ReadingStatus::Decreased);
        assert_eq!(r.status_for(180.0, false), ReadingStatus::Elevated);
        assert_eq!(r.status_for(180.0, true), ReadingStatus::Elevated);
        assert_eq!(r.status_for(150.0, true), ReadingStatus::Elevated);
        assert_eq!(status_from_reference(145.0, None, true), ReadingStatus::Unknown);
    }
}
