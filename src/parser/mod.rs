//! Offline keyword-window extraction.
//!
//! The parser never talks to anything outside the process; it is the strategy of last
//! resort when generative extraction is disabled or unavailable.

pub mod fields;
pub mod reorder;

use tracing::debug;

use crate::knowledge::{self, category_keywords, units, ParameterDefinition, ValueKind, PARAMETERS};
use crate::models::{Category, ExtractedReading, ReadingMap, TextCategory};

use fields::{first_number, parse_reference, scrub_line, status_from_reference, NumberToken};

pub use fields::parse_value_with_operator;
pub use reorder::reorder_unit_first_rows;

/// Lines after the keyword line that may still hold the value.
pub const DEFAULT_WINDOW: usize = 3;

const ABSOLUTE_MARKERS: &[&str] = &["абс", "#", "10^9", "10*9", "10⁹", "×10", "x10", "х10", "тыс/мкл", "10e9"];

#[derive(Debug, Clone)]
pub struct DeterministicParser {
    window: usize,
}

impl Default for DeterministicParser {
    fn default() -> Self {
        Self::new()
    }
}

struct Line<'a> {
    raw: &'a str,
    lower: String,
}

impl DeterministicParser {
    pub fn new() -> Self {
        Self { window: DEFAULT_WINDOW }
    }

    /// Extracts every parameter of `category` found in `text`. First match wins.
    pub fn parse_category(&self, text: &str, category: Category) -> ReadingMap {
        let reordered = reorder_unit_first_rows(text);
        let lines: Vec<Line> = reordered
            .lines()
            .map(|raw| Line { raw, lower: raw.to_lowercase() })
            .collect();
        self.extract(&lines, category)
    }

    /// Runs the three category passes independently and merges their results.
    pub fn parse_all(&self, text: &str) -> ReadingMap {
        let reordered = reorder_unit_first_rows(text);
        let lines: Vec<Line> = reordered
            .lines()
            .map(|raw| Line { raw, lower: raw.to_lowercase() })
            .collect();

        let mut pooled = ReadingMap::new();
        for category in Category::ALL {
            for (key, reading) in self.extract(&lines, category) {
                pooled.entry(key).or_insert(reading);
            }
        }
        pooled
    }

    fn extract(&self, lines: &[Line], category: Category) -> ReadingMap {
        let mut found = ReadingMap::new();
        let candidates: Vec<&ParameterDefinition> = knowledge::parameters_in(category).collect();

        for (index, line) in lines.iter().enumerate() {
            for definition in &candidates {
                if found.contains_key(definition.key) {
                    continue;
                }
                let Some(keyword_end) = definition
                    .keywords
                    .iter()
                    .find_map(|k| knowledge::find_keyword(&line.lower, k))
                else {
                    continue;
                };
                if let Some(reading) = self.read_window(lines, index, keyword_end, definition) {
                    debug!("Found {} = {} on line {}", definition.key, reading.value, index + 1);
                    found.insert(definition.key.to_string(), reading);
                    // one parameter per row
                    break;
                }
            }
        }

        found
    }

    /// Scans the rest of the keyword line, then up to `window` following lines, for the
    /// first value that satisfies the parameter's rules.
    fn read_window(
        &self,
        lines: &[Line],
        index: usize,
        keyword_end: usize,
        definition: &ParameterDefinition,
    ) -> Option<ExtractedReading> {
        let keyword_line = &lines[index];
        let last = (index + self.window).min(lines.len().saturating_sub(1));

        for offset in 0..=(last - index) {
            let position = index + offset;
            let line = &lines[position];

            if offset > 0 && mentions_other_parameter(&line.lower, definition) {
                break;
            }

            let haystack = if offset == 0 {
                &line.raw[byte_offset_in_raw(line, keyword_end)..]
            } else {
                line.raw
            };
            let scrubbed = scrub_line(haystack, true);
            let Some(token) = first_number(&scrubbed) else {
                continue;
            };

            if !kind_allows(definition.kind, &keyword_line.lower, &line.lower, token.value) {
                continue;
            }
            if !knowledge::is_plausible(definition.key, token.value) {
                debug!("Discarding implausible {} = {}", definition.key, token.value);
                continue;
            }

            return Some(self.build_reading(lines, index, position, haystack, &token, definition));
        }

        None
    }

    fn build_reading(
        &self,
        lines: &[Line],
        keyword_index: usize,
        value_index: usize,
        value_text: &str,
        token: &NumberToken,
        definition: &ParameterDefinition,
    ) -> ExtractedReading {
        // matched line first, then keyword line, then the rows between, then one row below
        let mut order = vec![value_index];
        if keyword_index != value_index {
            order.push(keyword_index);
        }
        order.extend((keyword_index + 1)..value_index);
        if value_index + 1 < lines.len() && !mentions_other_parameter(&lines[value_index + 1].lower, definition) {
            order.push(value_index + 1);
        }

        let unit = order
            .iter()
            .find_map(|&i| units::find_unit(lines[i].raw))
            .unwrap_or_else(|| units::normalize(definition.primary_unit()));

        // range masking preserves byte offsets, so the token span lines up with the unmasked text
        let mut without_value = scrub_line(value_text, false);
        without_value.replace_range(token.start..token.end, &" ".repeat(token.end - token.start));
        let reference = std::iter::once(without_value)
            .chain(order.iter().skip(1).map(|&i| scrub_line(lines[i].raw, false)))
            .find_map(|text| parse_reference(&text));

        let status = status_from_reference(token.value, reference.as_ref(), token.flagged);

        ExtractedReading {
            value: token.value,
            operator: token.operator,
            unit,
            reference: reference.map(|r| r.text).unwrap_or_default(),
            status,
        }
    }
}

/// Maps a byte offset in the lower-cased line back onto the raw line.
fn byte_offset_in_raw(line: &Line, lower_offset: usize) -> usize {
    let chars_before = line.lower[..lower_offset].chars().count();
    line.raw
        .char_indices()
        .nth(chars_before)
        .map_or(line.raw.len(), |(i, _)| i)
}

fn kind_allows(kind: ValueKind, keyword_line: &str, value_line: &str, value: f64) -> bool {
    match kind {
        ValueKind::Plain => true,
        ValueKind::Percentage => {
            (keyword_line.contains('%') || value_line.contains('%')) && (0.0..=100.0).contains(&value)
        }
        ValueKind::AbsoluteCount => {
            !keyword_line.contains('%')
                && !value_line.contains('%')
                && ABSOLUTE_MARKERS
                    .iter()
                    .any(|m| keyword_line.contains(m) || value_line.contains(m))
        }
    }
}

/// A row naming a different parameter ends the current window.
fn mentions_other_parameter(line_lower: &str, current: &ParameterDefinition) -> bool {
    PARAMETERS.iter().any(|other| {
        other.key != current.key
            && !shares_keywords(other, current)
            && knowledge::mentions_any(line_lower, other.keywords)
    })
}

/// Relative and absolute differential counts are named identically; only the `%` or
/// count marker tells them apart.
fn shares_keywords(a: &ParameterDefinition, b: &ParameterDefinition) -> bool {
    a.keywords == b.keywords
}

/// Scores each category by distinct keyword hits. Hormones are checked first so they win
/// ties; no hits at all means the document is unclassified.
pub fn classify_document(text: &str) -> TextCategory {
    let lower = text.to_lowercase();
    let score = |category: Category| {
        category_keywords(category)
            .iter()
            .filter(|k| knowledge::find_keyword(&lower, k).is_some())
            .count()
    };

    let order = [Category::Hormones, Category::BloodGeneral, Category::BloodBiochem];
    let mut best: Option<(Category, usize)> = None;
    for category in order {
        let hits = score(category);
        debug!("Keyword score for {}: {}", category, hits);
        if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
            best = Some((category, hits));
        }
    }

    best.map_or(TextCategory::Unknown, |(category, _)| category.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comparison, ReadingStatus};

    fn parser() -> DeterministicParser {
        DeterministicParser::new()
    }

    #[test]
    fn test_hemoglobin_value_within_window() {
        let text = "Гемоглобин\n(HGB)\n145\nг/л";
        let readings = parser().parse_category(text, Category::BloodGeneral);
        let hb = readings.get("hemoglobin").expect("hemoglobin extracted");
        assert_eq!(hb.value, 145.0);
        assert_eq!(hb.unit, "г/л");
    }

    #[test]
    fn test_value_beyond_window_is_ignored() {
        let text = "Гемоглобин\nпримечание\nещё строка\nи ещё одна\n145";
        let readings = parser().parse_category(text, Category::BloodGeneral);
        assert!(readings.get("hemoglobin").is_none());
    }

    #[test]
    fn test_same_line_value_with_reference_and_status() {
        let text = "Глюкоза 6.4* ммоль/л 3.3 - 5.5";
        let readings = parser().parse_category(text, Category::BloodBiochem);
        let glucose = &readings["glucose"];
        assert_eq!(glucose.value, 6.4);
        assert_eq!(glucose.unit, "ммоль/л");
        assert_eq!(glucose.reference, "3.3 - 5.5");
        assert_eq!(glucose.status, ReadingStatus::Elevated);
    }

    #[test]
    fn test_reference_printed_before_value() {
        let readings = parser().parse_category("Гемоглобин 130 - 170 145 г/л", Category::BloodGeneral);
        let hb = &readings["hemoglobin"];
        assert_eq!(hb.value, 145.0);
        assert_eq!(hb.reference, "130 - 170");
        assert_eq!(hb.status, ReadingStatus::Normal);
    }

    #[test]
    fn test_reference_on_following_line() {
        let text = "Креатинин\n54\nмкмоль/л\n62 - 106";
        let readings = parser().parse_category(text, Category::BloodBiochem);
        let creatinine = &readings["creatinine"];
        assert_eq!(creatinine.value, 54.0);
        assert_eq!(creatinine.unit, "мкмоль/л");
        // the reference sits two rows below the value, outside the lookup rows
        assert_eq!(creatinine.status, ReadingStatus::Unknown);

        let text = "Креатинин\n54\n62 - 106";
        let readings = parser().parse_category(text, Category::BloodBiochem);
        assert_eq!(readings["creatinine"].reference, "62 - 106");
        assert_eq!(readings["creatinine"].status, ReadingStatus::Decreased);
    }

    #[test]
    fn test_percentage_requires_percent_sign() {
        let readings = parser().parse_category("Нейтрофилы 55", Category::BloodGeneral);
        assert!(readings.get("neutrophils_percentage").is_none());
        assert!(readings.get("neutrophils_absolute").is_none());

        let readings = parser().parse_category("Нейтрофилы (Ne), % \n 55", Category::BloodGeneral);
        assert_eq!(readings["neutrophils_percentage"].value, 55.0);
        assert_eq!(readings["neutrophils_percentage"].unit, "%");
        assert!(readings.get("neutrophils_absolute").is_none());
    }

    #[test]
    fn test_absolute_and_relative_counts_kept_apart() {
        let text = "Лимфоциты (LYMF), %\n32.5\nЛимфоциты, абс.\n2.1\n10^9/л";
        let readings = parser().parse_category(text, Category::BloodGeneral);
        assert_eq!(readings["lymphocytes_percentage"].value, 32.5);
        assert_eq!(readings["lymphocytes_absolute"].value, 2.1);
        assert_eq!(readings["lymphocytes_absolute"].unit, "×10⁹/л");
    }

    #[test]
    fn test_percentage_never_exceeds_hundred() {
        let text = "Нейтрофилы, %\n550\n55";
        let readings = parser().parse_category(text, Category::BloodGeneral);
        let ne = &readings["neutrophils_percentage"];
        assert_eq!(ne.value, 55.0);
        for reading in parser().parse_all("Базофилы %\n250\nЭозинофилы %\n101").values() {
            assert!(reading.value <= 100.0);
        }
    }

    #[test]
    fn test_implausible_value_is_skipped() {
        let text = "Гемоглобин\n14\n145";
        let readings = parser().parse_category(text, Category::BloodGeneral);
        assert_eq!(readings["hemoglobin"].value, 145.0);
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Гемоглобин 145\nГемоглобин 98";
        let readings = parser().parse_category(text, Category::BloodGeneral);
        assert_eq!(readings["hemoglobin"].value, 145.0);
    }

    #[test]
    fn test_window_stops_at_next_parameter() {
        let text = "Эритроциты\nГематокрит\n4.5";
        let readings = parser().parse_category(text, Category::BloodGeneral);
        assert!(readings.get("erythrocytes").is_none());
    }

    #[test]
    fn test_censored_value_keeps_operator() {
        let text = "С-реактивный белок < 0,5 мг/л до 5";
        let readings = parser().parse_category(text, Category::BloodBiochem);
        let crp = &readings["crp"];
        assert_eq!(crp.value, 0.5);
        assert_eq!(crp.operator, Some(Comparison::Less));
        assert_eq!(crp.reference, "до 5");
        assert_eq!(crp.status, ReadingStatus::Normal);
    }

    #[test]
    fn test_hormone_panel() {
        let text = "ТТГ 2,15 мкМЕ/мл 0,27 - 4,2\nТ4 свободный 15,3 пмоль/л 12 - 22\nПролактин 12 нг/мл";
        let readings = parser().parse_category(text, Category::Hormones);
        assert_eq!(readings["tsh"].value, 2.15);
        assert_eq!(readings["tsh"].unit, "мкМЕ/мл");
        assert_eq!(readings["tsh"].status, ReadingStatus::Normal);
        assert_eq!(readings["free_t4"].value, 15.3);
        assert_eq!(readings["prolactin"].value, 12.0);
        assert!(readings.get("total_t4").is_none());
    }

    #[test]
    fn test_unit_first_layout_is_reordered() {
        let text = "ммоль/л\nГлюкоза\n5.2\n3.3 - 5.5";
        let readings = parser().parse_category(text, Category::BloodBiochem);
        assert_eq!(readings["glucose"].value, 5.2);
        assert_eq!(readings["glucose"].unit, "ммоль/л");
        assert_eq!(readings["glucose"].status, ReadingStatus::Normal);
    }

    #[test]
    fn test_parsing_is_pure() {
        let text = "Общий анализ крови\nГемоглобин 145 г/л\nЛейкоциты 6,1 10^9/л\nГлюкоза 5.2 ммоль/л\nТТГ 1.8";
        let first = parser().parse_all(text);
        let second = parser().parse_all(text);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_classify_document() {
        assert_eq!(
            classify_document("Общий анализ крови: гемоглобин, эритроциты, лейкоциты"),
            TextCategory::BloodGeneral
        );
        assert_eq!(
            classify_document("Биохимия: глюкоза, креатинин, мочевина"),
            TextCategory::BloodBiochem
        );
        assert_eq!(classify_document("ТТГ и пролактин"), TextCategory::Hormones);
        assert_eq!(classify_document("Справка для бассейна"), TextCategory::Unknown);
    }

    #[test]
    fn test_classify_tie_goes_to_hormones() {
        // one hit each for hormones and blood_general
        assert_eq!(classify_document("ТТГ, гемоглобин"), TextCategory::Hormones);
    }
}
