use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Laboratory {
    Invitro,
    Helix,
    Kdl,
    Gemotest,
    Cmd,
    Unknown,
}

impl Laboratory {
    /// Detection order. `cmd-online.ru` belongs to Invitro, so Invitro is tried before CMD.
    pub const KNOWN: [Laboratory; 5] = [
        Laboratory::Invitro,
        Laboratory::Helix,
        Laboratory::Kdl,
        Laboratory::Gemotest,
        Laboratory::Cmd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Laboratory::Invitro => "invitro",
            Laboratory::Helix => "helix",
            Laboratory::Kdl => "kdl",
            Laboratory::Gemotest => "gemotest",
            Laboratory::Cmd => "cmd",
            Laboratory::Unknown => "unknown",
        }
    }

    pub fn signatures(&self) -> &'static [&'static str] {
        match self {
            Laboratory::Invitro => &["инвитро", "invitro", "www.invitro.ru", "cmd-online.ru"],
            Laboratory::Helix => &["хеликс", "helix", "www.helix.ru", "cmd helix"],
            Laboratory::Kdl => &["кдл", "kdl", "kdlmed.ru", "клинико-диагностическая лаборатория"],
            Laboratory::Gemotest => &["гемотест", "gemotest", "gemotest.ru"],
            Laboratory::Cmd => &["цмд", "cmd", "cmd-online", "центр молекулярной диагностики"],
            Laboratory::Unknown => &[],
        }
    }

    /// Layout notes appended to extraction prompts for reports from this laboratory.
    pub fn layout_hint(&self) -> Option<&'static str> {
        match self {
            Laboratory::Invitro => Some(
                "Бланк ИНВИТРО: единицы измерения часто стоят ПЕРЕД названием показателя, \
                 например \"ммоль/л \\n Глюкоза \\n 5.2\". Коды услуг вида A09.05.XXX не являются \
                 показателями, игнорируй их.",
            ),
            Laboratory::Helix => Some(
                "Бланк ХЕЛИКС: таблица \"Параметр | Значение | Единицы | Референс\". \
                 Звёздочка * рядом со значением отмечает отклонение от нормы.",
            ),
            Laboratory::Kdl => Some(
                "Бланк КДЛ: формат смешанный, референсный интервал может находиться \
                 на отдельной строке под значением.",
            ),
            Laboratory::Gemotest => Some(
                "Бланк ГЕМОТЕСТ: похож на ИНВИТРО, единицы могут стоять как до, \
                 так и после названия показателя.",
            ),
            Laboratory::Cmd | Laboratory::Unknown => None,
        }
    }
}

impl fmt::Display for Laboratory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive substring match against every signature; the first laboratory that
/// matches wins.
pub fn detect_laboratory(text: &str) -> Laboratory {
    let lower = text.to_lowercase();
    Laboratory::KNOWN
        .into_iter()
        .find(|lab| lab.signatures().iter().any(|sig| lower.contains(sig)))
        .unwrap_or(Laboratory::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_invitro_by_domain() {
        let text = "Результаты анализов\nwww.invitro.ru\nГлюкоза 5.2";
        assert_eq!(detect_laboratory(text), Laboratory::Invitro);
    }

    #[test]
    fn test_unknown_when_no_signature() {
        assert_eq!(detect_laboratory("Глюкоза 5.2 ммоль/л"), Laboratory::Unknown);
        assert_eq!(detect_laboratory(""), Laboratory::Unknown);
    }

    #[test]
    fn test_case_insensitive_and_ordered() {
        assert_eq!(detect_laboratory("ЛАБОРАТОРИЯ ГЕМОТЕСТ"), Laboratory::Gemotest);
        assert_eq!(detect_laboratory("HELIX lab"), Laboratory::Helix);
        // Invitro's partner domain is checked before the bare CMD brand
        assert_eq!(detect_laboratory("заказ через cmd-online.ru"), Laboratory::Invitro);
        assert_eq!(detect_laboratory("ЦМД, Москва"), Laboratory::Cmd);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Laboratory::Kdl).unwrap(), "\"kdl\"");
        assert!(Laboratory::Unknown.layout_hint().is_none());
        assert!(Laboratory::Invitro.layout_hint().unwrap().contains("A09.05"));
    }
}
