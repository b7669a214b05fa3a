//! Token estimates and the per-model price table used for cost logging.

use tracing::warn;

/// USD per one million tokens, (input, output).
const PRICES: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4.1-mini", 0.40, 1.60),
    ("gpt-4.1", 2.00, 8.00),
    ("gpt-3.5-turbo", 0.50, 1.50),
];

const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub fn prices_for(model: &str) -> (f64, f64) {
    let lookup = |name: &str| PRICES.iter().find(|(m, _, _)| *m == name).map(|(_, i, o)| (*i, *o));
    lookup(model)
        .or_else(|| lookup(DEFAULT_MODEL))
        .unwrap_or((0.0, 0.0))
}

pub fn estimate_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
    let (input, output) = prices_for(model);
    prompt_tokens as f64 / 1_000_000.0 * input + completion_tokens as f64 / 1_000_000.0 * output
}

/// Rough count, four bytes per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Cuts `text` to roughly `max_tokens`, on a char boundary.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> &str {
    let before = estimate_tokens(text);
    if before <= max_tokens {
        return text;
    }

    let mut cut = max_tokens.saturating_mul(4).min(text.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let truncated = &text[..cut];
    warn!(
        "Generative input truncated from {} to {} tokens",
        before,
        estimate_tokens(truncated)
    );
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_prices() {
        assert_eq!(prices_for("gpt-4o"), (2.50, 10.00));
        assert_eq!(prices_for("gpt-4.1-mini"), (0.40, 1.60));
        assert_eq!(prices_for("some-local-model"), (0.15, 0.60));
    }

    #[test]
    fn test_cost_estimate() {
        let cost = estimate_cost("gpt-4o-mini", 1_000_000, 1_000_000);
        assert!((cost - 0.75).abs() < 1e-9);
        assert_eq!(estimate_cost("gpt-4o", 0, 0), 0.0);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "Гемоглобин ".repeat(100);
        let cut = truncate_to_tokens(&text, 10);
        assert!(cut.len() <= 40);
        assert!(text.starts_with(cut));

        assert_eq!(truncate_to_tokens("short", 10), "short");
    }
}
