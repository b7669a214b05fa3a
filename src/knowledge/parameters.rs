//! Static catalog of recognised laboratory parameters.
//!
//! Entry order matters to the deterministic parser: within a category, a line is
//! offered to parameters in catalog order, so entries whose names contain another
//! entry's keyword (MCH contains "гемоглобин", transferrin saturation contains
//! "железо") are listed before the broader entry.

use crate::models::Category;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceRange {
    Flat(f64, f64),
    BySex { male: (f64, f64), female: (f64, f64) },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Plain,
    /// Differential white-cell share, only accepted next to an explicit `%`.
    Percentage,
    /// Differential white-cell absolute count, never accepted next to `%`.
    AbsoluteCount,
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterDefinition {
    pub key: &'static str,
    pub names_ru: &'static [&'static str],
    pub aliases: &'static [&'static str],
    pub category: Category,
    pub units: &'static [&'static str],
    pub reference: ReferenceRange,
    pub plausible: (f64, f64),
    pub keywords: &'static [&'static str],
    pub kind: ValueKind,
}

impl ParameterDefinition {
    pub fn display_name(&self) -> &'static str {
        self.names_ru.first().copied().unwrap_or(self.key)
    }

    pub fn primary_unit(&self) -> &'static str {
        self.units.first().copied().unwrap_or("")
    }
}

use Category::{BloodBiochem, BloodGeneral, Hormones};
use ReferenceRange::{BySex, Flat};
use ValueKind::{AbsoluteCount, Percentage, Plain};

macro_rules! param {
    (
        $key:literal, $cat:expr, $kind:expr,
        names: [$($name:literal),* $(,)?],
        aliases: [$($alias:literal),* $(,)?],
        units: [$($unit:literal),* $(,)?],
        reference: $reference:expr,
        plausible: ($min:expr, $max:expr),
        keywords: [$($kw:literal),* $(,)?] $(,)?
    ) => {
        ParameterDefinition {
            key: $key,
            names_ru: &[$($name),*],
            aliases: &[$($alias),*],
            category: $cat,
            units: &[$($unit),*],
            reference: $reference,
            plausible: ($min, $max),
            keywords: &[$($kw),*],
            kind: $kind,
        }
    };
}

pub static PARAMETERS: &[ParameterDefinition] = &[
    // Complete blood count: erythrocyte and platelet indices first
    param!("mchc", BloodGeneral, Plain,
        names: ["Средняя концентрация гемоглобина в эритроците (MCHC)"],
        aliases: ["mchc"],
        units: ["г/л"],
        reference: Flat(320.0, 360.0),
        plausible: (200.0, 450.0),
        keywords: ["mchc", "средняя концентрация гемоглобина", "схгэ"]),
    param!("mch", BloodGeneral, Plain,
        names: ["Среднее содержание гемоглобина в эритроците (MCH)"],
        aliases: ["mch"],
        units: ["пг"],
        reference: Flat(27.0, 34.0),
        plausible: (10.0, 50.0),
        keywords: ["mch", "среднее содержание гемоглобина", "ссгэ"]),
    param!("mcv", BloodGeneral, Plain,
        names: ["Средний объем эритроцита (MCV)"],
        aliases: ["mcv"],
        units: ["фл"],
        reference: Flat(80.0, 100.0),
        plausible: (50.0, 150.0),
        keywords: ["mcv", "средний объем эритроцит", "средний объём эритроцит"]),
    param!("rdw", BloodGeneral, Plain,
        names: ["Ширина распределения эритроцитов (RDW)"],
        aliases: ["rdw", "rdw_cv"],
        units: ["%"],
        reference: Flat(11.5, 14.5),
        plausible: (5.0, 40.0),
        keywords: ["rdw", "ширина распределения эритроцитов"]),
    param!("mpv", BloodGeneral, Plain,
        names: ["Средний объем тромбоцита (MPV)"],
        aliases: ["mpv"],
        units: ["фл"],
        reference: Flat(7.4, 10.4),
        plausible: (3.0, 20.0),
        keywords: ["mpv", "средний объем тромбоцит", "средний объём тромбоцит"]),
    param!("hemoglobin", BloodGeneral, Plain,
        names: ["Гемоглобин"],
        aliases: ["hemoglobin", "hgb", "hb", "haemoglobin"],
        units: ["г/л", "g/L"],
        reference: BySex { male: (130.0, 170.0), female: (120.0, 150.0) },
        plausible: (50.0, 250.0),
        keywords: ["гемоглобин", "hgb", "hb", "hemoglobin"]),
    param!("erythrocytes", BloodGeneral, Plain,
        names: ["Эритроциты"],
        aliases: ["erythrocytes", "rbc", "red_blood_cells"],
        units: ["×10¹²/л", "×10^12/L"],
        reference: BySex { male: (4.3, 5.7), female: (3.8, 5.1) },
        plausible: (1.0, 10.0),
        keywords: ["эритроциты", "rbc", "erythrocytes"]),
    param!("leukocytes", BloodGeneral, Plain,
        names: ["Лейкоциты"],
        aliases: ["leukocytes", "wbc", "white_blood_cells"],
        units: ["×10⁹/л", "×10^9/L"],
        reference: Flat(3.89, 9.23),
        plausible: (1.0, 50.0),
        keywords: ["лейкоциты", "wbc", "leukocytes"]),
    param!("platelets", BloodGeneral, Plain,
        names: ["Тромбоциты"],
        aliases: ["platelets", "plt", "thrombocytes"],
        units: ["×10⁹/л", "×10^9/L"],
        reference: Flat(150.0, 400.0),
        plausible: (50.0, 1000.0),
        keywords: ["тромбоциты", "plt", "platelets"]),
    param!("hematocrit", BloodGeneral, Plain,
        names: ["Гематокрит"],
        aliases: ["hematocrit", "hct"],
        units: ["%"],
        reference: BySex { male: (40.0, 48.0), female: (36.0, 42.0) },
        plausible: (10.0, 80.0),
        keywords: ["гематокрит", "hct", "hematocrit"]),
    param!("esr", BloodGeneral, Plain,
        names: ["СОЭ"],
        aliases: ["esr", "esr_westergren"],
        units: ["мм/ч", "mm/h"],
        reference: BySex { male: (0.0, 10.0), female: (0.0, 15.0) },
        plausible: (0.0, 100.0),
        keywords: ["соэ", "скорость оседания эритроцитов", "скорости оседания эритроцитов", "esr"]),
    // Leukocyte differential, relative
    param!("neutrophils_percentage", BloodGeneral, Percentage,
        names: ["Нейтрофилы, %"],
        aliases: ["neutrophils", "neutrophils_percentage", "neutrophils_percent", "ne_percent", "neutrophils_ne"],
        units: ["%"],
        reference: Flat(47.0, 72.0),
        plausible: (0.0, 100.0),
        keywords: ["нейтрофилы", "neutrophils", "ne"]),
    param!("lymphocytes_percentage", BloodGeneral, Percentage,
        names: ["Лимфоциты, %"],
        aliases: ["lymphocytes", "lymphocytes_percentage", "lymphocytes_percent", "lymf_percent", "lymphocytes_lymf"],
        units: ["%"],
        reference: Flat(19.0, 37.0),
        plausible: (0.0, 100.0),
        keywords: ["лимфоциты", "lymphocytes", "lymf", "lym"]),
    param!("monocytes_percentage", BloodGeneral, Percentage,
        names: ["Моноциты, %"],
        aliases: ["monocytes", "monocytes_percentage", "monocytes_percent", "mon_percent", "monocytes_mon"],
        units: ["%"],
        reference: Flat(3.0, 11.0),
        plausible: (0.0, 50.0),
        keywords: ["моноциты", "monocytes", "mon"]),
    param!("eosinophils_percentage", BloodGeneral, Percentage,
        names: ["Эозинофилы, %"],
        aliases: ["eosinophils", "eosinophils_percentage", "eosinophils_percent", "eo_percent", "eosinophils_eo"],
        units: ["%"],
        reference: Flat(0.5, 5.0),
        plausible: (0.0, 50.0),
        keywords: ["эозинофилы", "eosinophils", "eo"]),
    param!("basophils_percentage", BloodGeneral, Percentage,
        names: ["Базофилы, %"],
        aliases: ["basophils", "basophils_percentage", "basophils_percent", "ba_percent", "basophils_ba"],
        units: ["%"],
        reference: Flat(0.0, 1.0),
        plausible: (0.0, 20.0),
        keywords: ["базофилы", "basophils", "ba"]),
    // Leukocyte differential, absolute
    param!("neutrophils_absolute", BloodGeneral, AbsoluteCount,
        names: ["Нейтрофилы, абс."],
        aliases: ["neutrophils_absolute", "neutrophils_abs", "ne_abs"],
        units: ["×10⁹/л"],
        reference: Flat(1.8, 7.7),
        plausible: (0.0, 50.0),
        keywords: ["нейтрофилы", "neutrophils", "ne"]),
    param!("lymphocytes_absolute", BloodGeneral, AbsoluteCount,
        names: ["Лимфоциты, абс."],
        aliases: ["lymphocytes_absolute", "lymphocytes_abs", "lymf_abs"],
        units: ["×10⁹/л"],
        reference: Flat(1.0, 4.8),
        plausible: (0.0, 50.0),
        keywords: ["лимфоциты", "lymphocytes", "lymf", "lym"]),
    param!("monocytes_absolute", BloodGeneral, AbsoluteCount,
        names: ["Моноциты, абс."],
        aliases: ["monocytes_absolute", "monocytes_abs", "mon_abs"],
        units: ["×10⁹/л"],
        reference: Flat(0.05, 0.82),
        plausible: (0.0, 10.0),
        keywords: ["моноциты", "monocytes", "mon"]),
    param!("eosinophils_absolute", BloodGeneral, AbsoluteCount,
        names: ["Эозинофилы, абс."],
        aliases: ["eosinophils_absolute", "eosinophils_abs", "eo_abs"],
        units: ["×10⁹/л"],
        reference: Flat(0.02, 0.5),
        plausible: (0.0, 10.0),
        keywords: ["эозинофилы", "eosinophils", "eo"]),
    param!("basophils_absolute", BloodGeneral, AbsoluteCount,
        names: ["Базофилы, абс."],
        aliases: ["basophils_absolute", "basophils_abs", "ba_abs"],
        units: ["×10⁹/л"],
        reference: Flat(0.0, 0.08),
        plausible: (0.0, 5.0),
        keywords: ["базофилы", "basophils", "ba"]),

    // Biochemistry
    param!("glucose", BloodBiochem, Plain,
        names: ["Глюкоза"],
        aliases: ["glucose", "sugar", "glu"],
        units: ["ммоль/л", "mmol/L"],
        reference: Flat(3.3, 5.5),
        plausible: (1.0, 30.0),
        keywords: ["глюкоза", "glucose", "glu"]),
    param!("hba1c", BloodBiochem, Plain,
        names: ["Гликированный гемоглобин (HbA1c)"],
        aliases: ["hba1c", "hb_a1c", "glycated_hemoglobin"],
        units: ["%"],
        reference: Flat(4.0, 6.0),
        plausible: (2.0, 20.0),
        keywords: ["гликированный гемоглобин", "гликозилированный гемоглобин", "hba1c"]),
    param!("creatinine", BloodBiochem, Plain,
        names: ["Креатинин"],
        aliases: ["creatinine", "crea"],
        units: ["мкмоль/л", "μmol/L"],
        reference: BySex { male: (62.0, 106.0), female: (44.0, 80.0) },
        plausible: (20.0, 1500.0),
        keywords: ["креатинин", "creatinine"]),
    param!("urea", BloodBiochem, Plain,
        names: ["Мочевина"],
        aliases: ["urea", "bun"],
        units: ["ммоль/л", "mmol/L"],
        reference: Flat(2.76, 8.07),
        plausible: (1.0, 50.0),
        keywords: ["мочевина", "urea"]),
    param!("uric_acid", BloodBiochem, Plain,
        names: ["Мочевая кислота"],
        aliases: ["uric_acid", "urate"],
        units: ["мкмоль/л"],
        reference: BySex { male: (202.3, 416.5), female: (142.8, 339.2) },
        plausible: (50.0, 1200.0),
        keywords: ["мочевая кислота", "uric acid"]),
    param!("gfr_ckd_epi", BloodBiochem, Plain,
        names: ["Скорость клубочковой фильтрации (СКФ), CKD-EPI"],
        aliases: ["gfr_ckd_epi", "gfr", "egfr"],
        units: ["мл/мин/1,73м²", "mL/min/1.73m²"],
        reference: Flat(90.0, 120.0),
        plausible: (5.0, 150.0),
        keywords: ["скф", "gfr", "egfr", "ckd-epi", "скорость клубочковой фильтрации"]),
    param!("bilirubin_direct", BloodBiochem, Plain,
        names: ["Билирубин прямой"],
        aliases: ["bilirubin_direct", "direct_bilirubin"],
        units: ["мкмоль/л"],
        reference: Flat(0.0, 5.0),
        plausible: (0.0, 300.0),
        keywords: ["билирубин прямой", "прямой билирубин", "билирубин связанный", "direct bilirubin"]),
    param!("bilirubin_indirect", BloodBiochem, Plain,
        names: ["Билирубин непрямой"],
        aliases: ["bilirubin_indirect", "indirect_bilirubin"],
        units: ["мкмоль/л"],
        reference: Flat(0.0, 16.5),
        plausible: (0.0, 300.0),
        keywords: ["билирубин непрямой", "непрямой билирубин", "билирубин свободный", "indirect bilirubin"]),
    param!("bilirubin_total", BloodBiochem, Plain,
        names: ["Билирубин общий"],
        aliases: ["bilirubin_total", "total_bilirubin", "bilirubin"],
        units: ["мкмоль/л", "μmol/L"],
        reference: Flat(5.0, 21.0),
        plausible: (0.0, 500.0),
        keywords: ["билирубин общий", "общий билирубин", "total bilirubin"]),
    param!("alt", BloodBiochem, Plain,
        names: ["АЛТ (аланинаминотрансфераза)"],
        aliases: ["alt", "alat", "alanine_aminotransferase", "alt_gpt"],
        units: ["Ед/л", "U/L"],
        reference: BySex { male: (0.0, 41.0), female: (0.0, 33.0) },
        plausible: (0.0, 1000.0),
        keywords: ["алт", "аланинаминотрансфераза", "alt", "alat"]),
    param!("ast", BloodBiochem, Plain,
        names: ["АСТ (аспартатаминотрансфераза)"],
        aliases: ["ast", "asat", "aspartate_aminotransferase", "ast_got"],
        units: ["Ед/л", "U/L"],
        reference: BySex { male: (0.0, 37.0), female: (0.0, 31.0) },
        plausible: (0.0, 1000.0),
        keywords: ["аст", "аспартатаминотрансфераза", "ast", "asat"]),
    param!("ggt", BloodBiochem, Plain,
        names: ["Гамма-глутамилтрансфераза (ГГТ)"],
        aliases: ["ggt", "gamma_gt", "ggtp"],
        units: ["Ед/л"],
        reference: BySex { male: (0.0, 55.0), female: (0.0, 38.0) },
        plausible: (0.0, 2000.0),
        keywords: ["ггт", "гамма-глутамилтрансфераза", "гамма-гт", "ggt", "gamma-gt"]),
    param!("alkaline_phosphatase", BloodBiochem, Plain,
        names: ["Щелочная фосфатаза"],
        aliases: ["alkaline_phosphatase", "alp", "alkp"],
        units: ["Ед/л"],
        reference: Flat(30.0, 120.0),
        plausible: (5.0, 3000.0),
        keywords: ["щелочная фосфатаза", "щф", "alp", "alkaline phosphatase"]),
    param!("ldh", BloodBiochem, Plain,
        names: ["Лактатдегидрогеназа (ЛДГ)"],
        aliases: ["ldh", "ld", "lactate_dehydrogenase"],
        units: ["Ед/л"],
        reference: Flat(0.0, 247.0),
        plausible: (10.0, 5000.0),
        keywords: ["лдг", "лактатдегидрогеназа", "ldh"]),
    param!("amylase", BloodBiochem, Plain,
        names: ["Амилаза"],
        aliases: ["amylase", "alpha_amylase"],
        units: ["Ед/л"],
        reference: Flat(28.0, 100.0),
        plausible: (0.0, 3000.0),
        keywords: ["амилаза", "amylase"]),
    param!("creatine_kinase", BloodBiochem, Plain,
        names: ["Креатинкиназа (КФК)"],
        aliases: ["creatine_kinase", "ck", "cpk"],
        units: ["Ед/л"],
        reference: BySex { male: (0.0, 190.0), female: (0.0, 167.0) },
        plausible: (0.0, 20000.0),
        keywords: ["креатинкиназа", "кфк", "creatine kinase", "cpk"]),
    param!("total_protein", BloodBiochem, Plain,
        names: ["Общий белок"],
        aliases: ["total_protein", "protein"],
        units: ["г/л"],
        reference: Flat(64.0, 83.0),
        plausible: (20.0, 150.0),
        keywords: ["общий белок", "белок общий", "total protein"]),
    param!("albumin", BloodBiochem, Plain,
        names: ["Альбумин"],
        aliases: ["albumin", "alb"],
        units: ["г/л"],
        reference: Flat(35.0, 52.0),
        plausible: (10.0, 80.0),
        keywords: ["альбумин", "albumin"]),
    param!("cholesterol", BloodBiochem, Plain,
        names: ["Холестерин общий"],
        aliases: ["cholesterol", "total_cholesterol", "chol"],
        units: ["ммоль/л", "mmol/L"],
        reference: Flat(3.0, 5.2),
        plausible: (1.0, 20.0),
        keywords: ["холестерин общий", "общий холестерин", "холестерол общий", "total cholesterol"]),
    param!("hdl", BloodBiochem, Plain,
        names: ["Холестерин ЛПВП"],
        aliases: ["hdl", "hdl_cholesterol", "cholesterol_hdl"],
        units: ["ммоль/л"],
        reference: BySex { male: (1.0, 2.5), female: (1.2, 2.5) },
        plausible: (0.1, 5.0),
        keywords: ["лпвп", "липопротеины высокой плотности", "hdl"]),
    param!("ldl", BloodBiochem, Plain,
        names: ["Холестерин ЛПНП"],
        aliases: ["ldl", "ldl_cholesterol", "cholesterol_ldl"],
        units: ["ммоль/л"],
        reference: Flat(0.0, 3.0),
        plausible: (0.1, 15.0),
        keywords: ["лпнп", "липопротеины низкой плотности", "ldl"]),
    param!("triglycerides", BloodBiochem, Plain,
        names: ["Триглицериды"],
        aliases: ["triglycerides", "tg", "trig"],
        units: ["ммоль/л"],
        reference: Flat(0.0, 1.7),
        plausible: (0.1, 50.0),
        keywords: ["триглицериды", "triglycerides"]),
    param!("atherogenic_index", BloodBiochem, Plain,
        names: ["Коэффициент атерогенности"],
        aliases: ["atherogenic_index", "atherogenic_coefficient"],
        units: [],
        reference: Flat(0.0, 3.0),
        plausible: (0.0, 20.0),
        keywords: ["индекс атерогенности", "коэффициент атерогенности"]),
    param!("transferrin_saturation", BloodBiochem, Plain,
        names: ["Насыщение трансферрина железом"],
        aliases: ["transferrin_saturation", "tsat"],
        units: ["%"],
        reference: Flat(15.0, 50.0),
        plausible: (1.0, 100.0),
        keywords: ["насыщение трансферрина", "коэффициент насыщения трансферрина"]),
    param!("iron", BloodBiochem, Plain,
        names: ["Железо"],
        aliases: ["iron", "serum_iron", "fe"],
        units: ["мкмоль/л"],
        reference: BySex { male: (11.6, 31.3), female: (9.0, 30.4) },
        plausible: (1.0, 100.0),
        keywords: ["железо", "сывороточное железо", "iron"]),
    param!("ferritin", BloodBiochem, Plain,
        names: ["Ферритин"],
        aliases: ["ferritin"],
        units: ["мкг/л", "нг/мл"],
        reference: BySex { male: (20.0, 250.0), female: (10.0, 120.0) },
        plausible: (1.0, 5000.0),
        keywords: ["ферритин", "ferritin"]),
    param!("transferrin", BloodBiochem, Plain,
        names: ["Трансферрин"],
        aliases: ["transferrin"],
        units: ["г/л"],
        reference: Flat(2.0, 3.6),
        plausible: (0.5, 10.0),
        keywords: ["трансферрин", "transferrin"]),
    param!("crp", BloodBiochem, Plain,
        names: ["С-реактивный белок"],
        aliases: ["crp", "c_reactive_protein", "hs_crp"],
        units: ["мг/л"],
        reference: Flat(0.0, 5.0),
        plausible: (0.0, 500.0),
        keywords: ["с-реактивный белок", "c-реактивный белок", "срб", "crp", "c-reactive protein"]),
    param!("potassium", BloodBiochem, Plain,
        names: ["Калий"],
        aliases: ["potassium", "k"],
        units: ["ммоль/л"],
        reference: Flat(3.5, 5.1),
        plausible: (1.0, 10.0),
        keywords: ["калий", "potassium"]),
    param!("sodium", BloodBiochem, Plain,
        names: ["Натрий"],
        aliases: ["sodium", "na"],
        units: ["ммоль/л"],
        reference: Flat(136.0, 145.0),
        plausible: (100.0, 180.0),
        keywords: ["натрий", "sodium"]),
    param!("chloride", BloodBiochem, Plain,
        names: ["Хлор"],
        aliases: ["chloride", "cl"],
        units: ["ммоль/л"],
        reference: Flat(98.0, 107.0),
        plausible: (60.0, 140.0),
        keywords: ["хлор", "chloride"]),
    param!("calcium", BloodBiochem, Plain,
        names: ["Кальций общий"],
        aliases: ["calcium", "calcium_total", "ca"],
        units: ["ммоль/л"],
        reference: Flat(2.15, 2.55),
        plausible: (1.0, 5.0),
        keywords: ["кальций", "calcium"]),
    param!("magnesium", BloodBiochem, Plain,
        names: ["Магний"],
        aliases: ["magnesium", "mg"],
        units: ["ммоль/л"],
        reference: Flat(0.66, 1.07),
        plausible: (0.1, 5.0),
        keywords: ["магний", "magnesium"]),
    param!("phosphorus", BloodBiochem, Plain,
        names: ["Фосфор неорганический"],
        aliases: ["phosphorus", "phosphate", "phos", "inorganic_phosphorus"],
        units: ["ммоль/л"],
        reference: Flat(0.81, 1.45),
        plausible: (0.1, 5.0),
        keywords: ["фосфор", "phosphorus", "phosphate"]),

    // Hormones
    param!("tsh", Hormones, Plain,
        names: ["ТТГ (тиреотропный гормон)"],
        aliases: ["tsh", "thyroid_stimulating_hormone", "ttg"],
        units: ["мкМЕ/мл", "мМЕ/мл", "mIU/mL"],
        reference: Flat(0.27, 4.2),
        plausible: (0.001, 100.0),
        keywords: ["ттг", "тиреотропный гормон", "tsh", "thyroid stimulating hormone"]),
    param!("free_t4", Hormones, Plain,
        names: ["Т4 свободный"],
        aliases: ["free_t4", "ft4", "free_thyroxine"],
        units: ["пмоль/л", "pmol/L"],
        reference: Flat(12.0, 22.0),
        plausible: (1.0, 100.0),
        keywords: ["свободный т4", "т4 свободный", "тироксин свободный", "free t4", "ft4"]),
    param!("total_t4", Hormones, Plain,
        names: ["Т4 общий"],
        aliases: ["total_t4", "t4", "thyroxine_total"],
        units: ["нмоль/л"],
        reference: Flat(66.0, 181.0),
        plausible: (10.0, 400.0),
        keywords: ["т4 общий", "общий т4", "тироксин общий", "total t4"]),
    param!("free_t3", Hormones, Plain,
        names: ["Т3 свободный"],
        aliases: ["free_t3", "ft3", "free_triiodothyronine"],
        units: ["пмоль/л", "pmol/L"],
        reference: Flat(3.1, 6.8),
        plausible: (0.5, 50.0),
        keywords: ["свободный т3", "т3 свободный", "трийодтиронин свободный", "free t3", "ft3"]),
    param!("total_t3", Hormones, Plain,
        names: ["Т3 общий"],
        aliases: ["total_t3", "t3", "triiodothyronine_total"],
        units: ["нмоль/л"],
        reference: Flat(1.3, 3.1),
        plausible: (0.1, 15.0),
        keywords: ["т3 общий", "общий т3", "трийодтиронин общий", "total t3"]),
    param!("anti_tpo", Hormones, Plain,
        names: ["Антитела к тиреопероксидазе (АТ-ТПО)"],
        aliases: ["anti_tpo", "atpo", "tpo_antibodies"],
        units: ["МЕ/мл"],
        reference: Flat(0.0, 34.0),
        plausible: (0.0, 5000.0),
        keywords: ["ат-тпо", "ат к тпо", "антитела к тиреопероксидазе", "anti-tpo"]),
    param!("anti_tg", Hormones, Plain,
        names: ["Антитела к тиреоглобулину (АТ-ТГ)"],
        aliases: ["anti_tg", "atg", "tg_antibodies", "anti_thyroglobulin"],
        units: ["МЕ/мл"],
        reference: Flat(0.0, 115.0),
        plausible: (0.0, 10000.0),
        keywords: ["ат-тг", "ат к тг", "антитела к тиреоглобулину", "anti-tg"]),
    param!("testosterone", Hormones, Plain,
        names: ["Тестостерон"],
        aliases: ["testosterone"],
        units: ["нмоль/л", "nmol/L"],
        reference: BySex { male: (7.6, 31.4), female: (0.29, 1.67) },
        plausible: (0.0, 60.0),
        keywords: ["тестостерон", "testosterone"]),
    param!("estradiol", Hormones, Plain,
        names: ["Эстрадиол"],
        aliases: ["estradiol", "e2"],
        units: ["пг/мл", "pg/mL"],
        reference: Flat(25.8, 60.7),
        plausible: (1.0, 5000.0),
        keywords: ["эстрадиол", "estradiol"]),
    param!("prolactin", Hormones, Plain,
        names: ["Пролактин"],
        aliases: ["prolactin", "prl"],
        units: ["нг/мл", "ng/mL", "мМЕ/мл"],
        reference: BySex { male: (2.5, 17.0), female: (4.5, 33.0) },
        plausible: (0.0, 5000.0),
        keywords: ["пролактин", "prolactin"]),
    param!("cortisol", Hormones, Plain,
        names: ["Кортизол"],
        aliases: ["cortisol"],
        units: ["нмоль/л", "nmol/L"],
        reference: Flat(138.0, 690.0),
        plausible: (0.0, 3000.0),
        keywords: ["кортизол", "cortisol"]),
    param!("lh", Hormones, Plain,
        names: ["Лютеинизирующий гормон (ЛГ)"],
        aliases: ["lh", "luteinizing_hormone"],
        units: ["мМЕ/мл"],
        reference: BySex { male: (1.7, 8.6), female: (2.4, 12.6) },
        plausible: (0.0, 200.0),
        keywords: ["лг", "лютеинизирующий гормон", "lh"]),
    param!("fsh", Hormones, Plain,
        names: ["Фолликулостимулирующий гормон (ФСГ)"],
        aliases: ["fsh", "follicle_stimulating_hormone"],
        units: ["мМЕ/мл"],
        reference: BySex { male: (1.5, 12.4), female: (3.5, 12.5) },
        plausible: (0.0, 300.0),
        keywords: ["фсг", "фолликулостимулирующий гормон", "fsh"]),
    param!("progesterone", Hormones, Plain,
        names: ["Прогестерон"],
        aliases: ["progesterone"],
        units: ["нмоль/л"],
        reference: Flat(0.2, 95.0),
        plausible: (0.0, 1000.0),
        keywords: ["прогестерон", "progesterone"]),
    param!("dhea_s", Hormones, Plain,
        names: ["ДГЭА-сульфат"],
        aliases: ["dhea_s", "dheas", "dhea_sulfate"],
        units: ["мкмоль/л"],
        reference: BySex { male: (2.2, 15.2), female: (0.9, 11.7) },
        plausible: (0.01, 50.0),
        keywords: ["дгэа-с", "дгэа-сульфат", "дегидроэпиандростерон", "dhea-s", "dhea-so4"]),
    param!("shbg", Hormones, Plain,
        names: ["Глобулин, связывающий половые гормоны (ГСПГ)"],
        aliases: ["shbg", "sex_hormone_binding_globulin"],
        units: ["нмоль/л"],
        reference: BySex { male: (18.3, 54.1), female: (32.4, 128.0) },
        plausible: (1.0, 500.0),
        keywords: ["гспг", "глобулин, связывающий половые гормоны", "shbg"]),
    param!("insulin", Hormones, Plain,
        names: ["Инсулин"],
        aliases: ["insulin"],
        units: ["мкМЕ/мл"],
        reference: Flat(2.6, 24.9),
        plausible: (0.0, 1000.0),
        keywords: ["инсулин", "insulin"]),
    param!("pth", Hormones, Plain,
        names: ["Паратгормон"],
        aliases: ["pth", "parathyroid_hormone", "parathormone"],
        units: ["пг/мл"],
        reference: Flat(15.0, 65.0),
        plausible: (1.0, 3000.0),
        keywords: ["паратгормон", "паратиреоидный гормон", "pth"]),
    param!("vitamin_d", Hormones, Plain,
        names: ["25-OH витамин D"],
        aliases: ["vitamin_d", "25_oh_d", "25oh_vitamin_d", "calcidiol"],
        units: ["нг/мл"],
        reference: Flat(30.0, 100.0),
        plausible: (1.0, 300.0),
        keywords: ["витамин d", "витамин д", "25-oh", "25-он", "vitamin d"]),
    param!("vitamin_b12", Hormones, Plain,
        names: ["Витамин B12"],
        aliases: ["vitamin_b12", "b12", "cobalamin"],
        units: ["пг/мл"],
        reference: Flat(191.0, 663.0),
        plausible: (10.0, 5000.0),
        keywords: ["витамин b12", "витамин в12", "цианокобаламин", "кобаламин", "vitamin b12"]),
    param!("folate", Hormones, Plain,
        names: ["Фолиевая кислота"],
        aliases: ["folate", "folic_acid"],
        units: ["нг/мл"],
        reference: Flat(3.1, 20.5),
        plausible: (0.1, 100.0),
        keywords: ["фолиевая кислота", "фолат", "folate", "folic acid"]),
    param!("psa", Hormones, Plain,
        names: ["ПСА общий"],
        aliases: ["psa", "psa_total", "prostate_specific_antigen"],
        units: ["нг/мл"],
        reference: Flat(0.0, 4.0),
        plausible: (0.0, 1000.0),
        keywords: ["пса", "простатспецифический антиген", "простат-специфический антиген", "psa"]),
];

/// Document-level keywords used to guess which panel a report belongs to.
pub fn category_keywords(category: Category) -> &'static [&'static str] {
    match category {
        BloodGeneral => &[
            "гемоглобин",
            "эритроциты",
            "лейкоциты",
            "соэ",
            "hemoglobin",
            "rbc",
            "wbc",
            "общий анализ крови",
            "cbc",
            "complete blood count",
            "тромбоциты",
            "platelets",
            "лейкоформула",
        ],
        BloodBiochem => &[
            "глюкоза",
            "белок",
            "креатинин",
            "мочевина",
            "алт",
            "аст",
            "холестерин",
            "glucose",
            "protein",
            "creatinine",
            "urea",
            "alt",
            "ast",
            "bilirubin",
            "cholesterol",
            "биохимический анализ",
            "биохимия",
            "biochemistry",
            "липидный профиль",
        ],
        Hormones => &[
            "ттг",
            "тироксин",
            "тестостерон",
            "эстрадиол",
            "пролактин",
            "tsh",
            "t4",
            "testosterone",
            "hormone",
            "гормон",
            "гормональный",
            "эндокринология",
        ],
    }
}
