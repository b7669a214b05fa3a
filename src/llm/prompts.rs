use crate::knowledge::{self, laboratories::Laboratory};
use crate::models::Category;

const RESPONSE_CONTRACT: &str = "Ответ верни строго одним JSON-объектом вида \
{\"parameters\": {\"<ключ>\": {\"value\": <число или строка с оператором < >>, \
\"unit\": \"<единицы>\", \"reference\": \"<референсный интервал как в бланке>\", \
\"status\": \"норма|повышен|понижен|неизвестно\"}}}. \
Если показатель в тексте отсутствует, не добавляй его. Не выдумывай значения. \
Если ни одного показателя нет, верни {\"parameters\": {}}.";

const GENERIC_PROMPT: &str =
    "Извлеки ВСЕ медицинские показатели в JSON: parameters с value, unit, reference, status.";

fn category_intro(category: Category) -> &'static str {
    match category {
        Category::BloodGeneral => {
            "Ты извлекаешь показатели ОБЩЕГО АНАЛИЗА КРОВИ из текста лабораторного бланка, \
             полученного распознаванием. Лейкоцитарную формулу указывай отдельно в процентах \
             (ключи *_percentage) и в абсолютных значениях (ключи *_absolute)."
        }
        Category::BloodBiochem => {
            "Ты извлекаешь показатели БИОХИМИЧЕСКОГО АНАЛИЗА КРОВИ из текста лабораторного бланка, \
             полученного распознаванием: углеводный и липидный обмен, ферменты, белки, \
             билирубин, электролиты, показатели обмена железа."
        }
        Category::Hormones => {
            "Ты извлекаешь ГОРМОНАЛЬНЫЕ показатели и витамины из текста лабораторного бланка, \
             полученного распознаванием: щитовидная железа, половые гормоны, надпочечники, \
             инсулин, паратгормон, витамины D, B12, фолиевая кислота, ПСА."
        }
    }
}

/// Canonical keys the model should use for a category, with their display names.
fn key_listing(category: Category) -> String {
    knowledge::parameters_in(category)
        .map(|def| format!("{} ({})", def.key, def.display_name()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn system_prompt(category: Option<Category>, laboratory: Laboratory) -> String {
    let mut prompt = match category {
        Some(category) => format!(
            "{}\nИспользуй ключи: {}.\n{}",
            category_intro(category),
            key_listing(category),
            RESPONSE_CONTRACT
        ),
        None => GENERIC_PROMPT.to_string(),
    };

    if let Some(hint) = laboratory.layout_hint() {
        prompt.push_str("\n\n");
        prompt.push_str(hint);
    }
    prompt
}

pub fn user_message(text: &str) -> String {
    format!("Текст анализа:\n\n{}", text)
}
