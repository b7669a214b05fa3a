use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalUnit {
    MmolL,
    UmolL,
    NmolL,
    PmolL,
    GL,
    GDl,
    MgL,
    MgDl,
    UgL,
    X10e9L,
    X10e12L,
    ThouUl,
    UL,
    IuL,
    IuMl,
    MiuMl,
    UiuMl,
    MuL,
    PgMl,
    NgMl,
    NgDl,
    Percent,
    Ratio,
    MmH,
    MlMin,
    MlMin173,
    Fl,
    Pg,
}

impl CanonicalUnit {
    pub fn display_en(&self) -> &'static str {
        match self {
            CanonicalUnit::MmolL => "mmol/L",
            CanonicalUnit::UmolL => "μmol/L",
            CanonicalUnit::NmolL => "nmol/L",
            CanonicalUnit::PmolL => "pmol/L",
            CanonicalUnit::GL => "g/L",
            CanonicalUnit::GDl => "g/dL",
            CanonicalUnit::MgL => "mg/L",
            CanonicalUnit::MgDl => "mg/dL",
            CanonicalUnit::UgL => "μg/L",
            CanonicalUnit::X10e9L => "×10⁹/L",
            CanonicalUnit::X10e12L => "×10¹²/L",
            CanonicalUnit::ThouUl => "thou/μL",
            CanonicalUnit::UL => "U/L",
            CanonicalUnit::IuL => "IU/L",
            CanonicalUnit::IuMl => "IU/mL",
            CanonicalUnit::MiuMl => "mIU/mL",
            CanonicalUnit::UiuMl => "μIU/mL",
            CanonicalUnit::MuL => "mU/L",
            CanonicalUnit::PgMl => "pg/mL",
            CanonicalUnit::NgMl => "ng/mL",
            CanonicalUnit::NgDl => "ng/dL",
            CanonicalUnit::Percent => "%",
            CanonicalUnit::Ratio => "ratio",
            CanonicalUnit::MmH => "mm/h",
            CanonicalUnit::MlMin => "mL/min",
            CanonicalUnit::MlMin173 => "mL/min/1.73m²",
            CanonicalUnit::Fl => "fL",
            CanonicalUnit::Pg => "pg",
        }
    }

    pub fn display_ru(&self) -> &'static str {
        match self {
            CanonicalUnit::MmolL => "ммоль/л",
            CanonicalUnit::UmolL => "мкмоль/л",
            CanonicalUnit::NmolL => "нмоль/л",
            CanonicalUnit::PmolL => "пмоль/л",
            CanonicalUnit::GL => "г/л",
            CanonicalUnit::GDl => "г/дл",
            CanonicalUnit::MgL => "мг/л",
            CanonicalUnit::MgDl => "мг/дл",
            CanonicalUnit::UgL => "мкг/л",
            CanonicalUnit::X10e9L => "×10⁹/л",
            CanonicalUnit::X10e12L => "×10¹²/л",
            CanonicalUnit::ThouUl => "тыс/мкл",
            CanonicalUnit::UL => "Ед/л",
            CanonicalUnit::IuL => "МЕ/л",
            CanonicalUnit::IuMl => "МЕ/мл",
            CanonicalUnit::MiuMl => "мМЕ/мл",
            CanonicalUnit::UiuMl => "мкМЕ/мл",
            CanonicalUnit::MuL => "мЕд/л",
            CanonicalUnit::PgMl => "пг/мл",
            CanonicalUnit::NgMl => "нг/мл",
            CanonicalUnit::NgDl => "нг/дл",
            CanonicalUnit::Percent => "%",
            CanonicalUnit::Ratio => "отношение",
            CanonicalUnit::MmH => "мм/ч",
            CanonicalUnit::MlMin => "мл/мин",
            CanonicalUnit::MlMin173 => "мл/мин/1,73м²",
            CanonicalUnit::Fl => "фл",
            CanonicalUnit::Pg => "пг",
        }
    }
}

use CanonicalUnit::*;

/// Spellings seen on Russian and international reports, stored lower-cased without spaces.
const UNIT_ALIASES: &[(&str, CanonicalUnit)] = &[
    ("ммоль/л", MmolL),
    ("mmol/l", MmolL),
    ("мкмоль/л", UmolL),
    ("μmol/l", UmolL),
    ("µmol/l", UmolL),
    ("umol/l", UmolL),
    ("нмоль/л", NmolL),
    ("nmol/l", NmolL),
    ("пмоль/л", PmolL),
    ("pmol/l", PmolL),
    ("г/л", GL),
    ("g/l", GL),
    ("г/дл", GDl),
    ("g/dl", GDl),
    ("мг/л", MgL),
    ("mg/l", MgL),
    ("мг/дл", MgDl),
    ("mg/dl", MgDl),
    ("мкг/л", UgL),
    ("μg/l", UgL),
    ("µg/l", UgL),
    ("ug/l", UgL),
    ("×10⁹/л", X10e9L),
    ("×10⁹/l", X10e9L),
    ("×10^9/л", X10e9L),
    ("x10^9/л", X10e9L),
    ("х10^9/л", X10e9L),
    ("x10^9/l", X10e9L),
    ("*10^9/л", X10e9L),
    ("10^9/л", X10e9L),
    ("10^9/l", X10e9L),
    ("10*9/л", X10e9L),
    ("10⁹/л", X10e9L),
    ("10e9/l", X10e9L),
    ("×10¹²/л", X10e12L),
    ("×10¹²/l", X10e12L),
    ("×10^12/л", X10e12L),
    ("x10^12/л", X10e12L),
    ("х10^12/л", X10e12L),
    ("x10^12/l", X10e12L),
    ("*10^12/л", X10e12L),
    ("10^12/л", X10e12L),
    ("10^12/l", X10e12L),
    ("10*12/л", X10e12L),
    ("10¹²/л", X10e12L),
    ("10e12/l", X10e12L),
    ("тыс/мкл", ThouUl),
    ("thou/μl", ThouUl),
    ("thou/ul", ThouUl),
    ("ед/л", UL),
    ("u/l", UL),
    ("ме/л", IuL),
    ("iu/l", IuL),
    ("ме/мл", IuMl),
    ("iu/ml", IuMl),
    ("мме/мл", MiuMl),
    ("miu/ml", MiuMl),
    ("мкме/мл", UiuMl),
    ("μiu/ml", UiuMl),
    ("µiu/ml", UiuMl),
    ("uiu/ml", UiuMl),
    ("мед/л", MuL),
    ("mu/l", MuL),
    ("пг/мл", PgMl),
    ("pg/ml", PgMl),
    ("нг/мл", NgMl),
    ("ng/ml", NgMl),
    ("нг/дл", NgDl),
    ("ng/dl", NgDl),
    ("%", Percent),
    ("отношение", Ratio),
    ("ratio", Ratio),
    ("мм/ч", MmH),
    ("мм/час", MmH),
    ("mm/h", MmH),
    ("mm/hr", MmH),
    ("мл/мин", MlMin),
    ("ml/min", MlMin),
    ("мл/мин/1,73м²", MlMin173),
    ("мл/мин/1,73м^2", MlMin173),
    ("мл/мин/1,73м2", MlMin173),
    ("мл/мин/1.73м²", MlMin173),
    ("мл/мин/1.73м2", MlMin173),
    ("ml/min/1.73m²", MlMin173),
    ("ml/min/1.73m2", MlMin173),
    ("фл", Fl),
    ("fl", Fl),
    ("пг", Pg),
    ("pg", Pg),
];

static ALIAS_MAP: LazyLock<HashMap<String, CanonicalUnit>> = LazyLock::new(|| {
    let mut map: HashMap<String, CanonicalUnit> =
        UNIT_ALIASES.iter().map(|(alias, unit)| (alias.to_string(), *unit)).collect();
    // display forms resolve to themselves so normalisation is idempotent
    for (_, unit) in UNIT_ALIASES {
        map.insert(lookup_key(unit.display_ru()), *unit);
        map.insert(lookup_key(unit.display_en()), *unit);
    }
    map
});

/// Longest spellings first so `мг/л` wins over `г/л` at the same position.
static UNIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut spellings: Vec<String> = ALIAS_MAP.keys().cloned().collect();
    spellings.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    let alternation = spellings
        .iter()
        .map(|s| {
            // tolerate OCR spacing around slashes
            regex::escape(s).replace('/', r"\s*/\s*")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(?:^|[^\p{{L}}])({})(?:$|[^\p{{L}}\d])", alternation))
        .expect("unit alternation is a valid pattern")
});

fn lookup_key(raw: &str) -> String {
    raw.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn canonical(raw: &str) -> Option<CanonicalUnit> {
    let key = lookup_key(raw);
    if key.is_empty() {
        return None;
    }
    ALIAS_MAP.get(&key).copied()
}

/// Maps a free-text unit to its Russian display form. Unknown spellings come back untouched.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    match canonical(raw) {
        Some(unit) => unit.display_ru().to_string(),
        None => raw.to_string(),
    }
}

/// First recognisable unit token in a line of report text, normalised.
pub fn find_unit(text: &str) -> Option<String> {
    UNIT_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| canonical(m.as_str()))
        .map(|unit| unit.display_ru().to_string())
}

/// Blanks every unit token so digits inside `10^9/л` or `1,73м²` are not read as values.
pub fn strip_units(text: &str) -> String {
    UNIT_PATTERN
        .replace_all(text, |caps: &regex::Captures| " ".repeat(caps[0].chars().count()))
        .into_owned()
}

/// Whether a whole line is nothing but a unit, as in the unit-first layout some labs print.
pub fn is_unit_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && canonical(trimmed).is_some()
}
