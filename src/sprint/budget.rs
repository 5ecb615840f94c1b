//! Free-text money amounts ("$252k - $327k", "1.5M") to numbers.

/// Parse a budget string into a dollar amount.
///
/// Ranges (`a - b`) give the mean of both ends. `k` and `m` suffixes scale by
/// a thousand and a million. Anything unparseable is 0; this never panics.
#[must_use]
pub fn parse_budget(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return 0.0;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|ch| *ch != '$' && *ch != ',' && !ch.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if cleaned.contains('-') {
        let parts: Vec<&str> = cleaned.split('-').collect();
        if let [low, high] = parts.as_slice() {
            if let (Some(low), Some(high)) = (parse_amount(low), parse_amount(high)) {
                return low / 2.0 + high / 2.0;
            }
        }
    }

    parse_amount(&cleaned).unwrap_or(0.0)
}

fn parse_amount(raw: &str) -> Option<f64> {
    let (digits, scale) = if let Some(rest) = raw.strip_suffix('k') {
        (rest, 1_000.0)
    } else if let Some(rest) = raw.strip_suffix('m') {
        (rest, 1_000_000.0)
    } else {
        (raw, 1.0)
    };
    let value = digits.parse::<f64>().ok()? * scale;
    value.is_finite().then_some(value)
}
