// 💰 Amount Extraction - First money amount mentioned in a sentence
//
// Number shape: digits, optional ",ddd" thousand groups, optional one or two
// decimals. Patterns are tried in a fixed order (currency suffix, then
// currency prefix, per currency) and the first positive amount wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Inr,
    Eur,
    Gbp,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAmount {
    pub value: f64,
    /// None when only the bare-number fallback matched
    pub currency: Option<Currency>,
}

// ASCII classes: the app's patterns run on the JVM where \d and \s are ASCII
const NUMBER: &str = r"([0-9]+(?:,[0-9]{3})*(?:\.[0-9]{1,2})?)";
const SPACE: &str = r"[ \t\n\x0B\x0C\r]*";

static PATTERNS: LazyLock<Vec<(Regex, Option<Currency>)>> = LazyLock::new(|| {
    let suffix = |words: &str| format!("{}{}(?:{})", NUMBER, SPACE, words);
    let prefix = |symbol: &str| format!("{}{}", symbol, NUMBER);
    [
        (suffix(r"dollars?|bucks?|usd|\$"), Some(Currency::Usd)),
        (prefix(r"\$"), Some(Currency::Usd)),
        (suffix("rupees?|rs|₹|inr"), Some(Currency::Inr)),
        (prefix("₹"), Some(Currency::Inr)),
        (suffix("euros?|eur|€"), Some(Currency::Eur)),
        (prefix("€"), Some(Currency::Eur)),
        (suffix("pounds?|gbp|£"), Some(Currency::Gbp)),
        (prefix("£"), Some(Currency::Gbp)),
        (NUMBER.to_string(), None),
    ]
    .into_iter()
    .filter_map(|(pattern, currency)| match Regex::new(&pattern) {
        Ok(re) => Some((re, currency)),
        Err(e) => {
            tracing::error!(%pattern, error = %e, "amount pattern rejected");
            None
        }
    })
    .collect()
});

/// First positive amount, or None when the sentence has no usable number
pub fn extract_amount(text: &str) -> Option<ExtractedAmount> {
    let lower = text.trim().to_lowercase();
    PATTERNS.iter().find_map(|(re, currency)| {
        let raw = re.captures(&lower)?.get(1)?.as_str().replace(',', "");
        raw.parse::<f64>()
            .ok()
            .filter(|v| *v > 0.0)
            .map(|value| ExtractedAmount {
                value,
                currency: *currency,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> Option<f64> {
        extract_amount(text).map(|a| a.value)
    }

    #[test]
    fn test_currency_suffix_and_prefix() {
        let a = extract_amount("Paid 50 dollars for lunch").unwrap();
        assert_eq!(a.value, 50.0);
        assert_eq!(a.currency, Some(Currency::Usd));

        let a = extract_amount("Received salary $5000 from work").unwrap();
        assert_eq!(a.value, 5000.0);
        assert_eq!(a.currency, Some(Currency::Usd));

        let a = extract_amount("Spent ₹1,200.50 on groceries").unwrap();
        assert_eq!(a.value, 1200.5);
        assert_eq!(a.currency, Some(Currency::Inr));

        assert_eq!(extract_amount("tea 30 rs").unwrap().currency, Some(Currency::Inr));
        assert_eq!(extract_amount("€15 taxi").unwrap().currency, Some(Currency::Eur));
        assert_eq!(extract_amount("20 pounds of apples").unwrap().currency, Some(Currency::Gbp));
    }

    #[test]
    fn test_usd_beats_earlier_bare_number() {
        // the bare number comes first in the text but USD patterns run first
        let a = extract_amount("2 coffees for $7.25").unwrap();
        assert_eq!(a.value, 7.25);
    }

    #[test]
    fn test_bare_number_fallback() {
        let a = extract_amount("I got myself a tshirt that cost 3000").unwrap();
        assert_eq!(a.value, 3000.0);
        assert_eq!(a.currency, None);
    }

    #[test]
    fn test_thousand_groups_and_decimals() {
        assert_eq!(value("rent 1,250,000"), Some(1_250_000.0));
        assert_eq!(value("12,34 items"), Some(12.0));
        assert_eq!(value("fee 9.999"), Some(9.99));
    }

    #[test]
    fn test_backtracks_to_a_shorter_number() {
        // "123.456 usd" can only match starting inside the number
        assert_eq!(value("123.456 usd"), Some(456.0));
    }

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(PATTERNS.len(), 9);
        assert_eq!(PATTERNS[8].1, None);
    }

    #[test]
    fn test_suffix_allows_whitespace_and_plurals() {
        let a = extract_amount("got 40  bucks back").unwrap();
        assert_eq!((a.value, a.currency), (40.0, Some(Currency::Usd)));
        let a = extract_amount("paid 3 euros").unwrap();
        assert_eq!((a.value, a.currency), (3.0, Some(Currency::Eur)));
    }

    #[test]
    fn test_zero_and_missing_amounts() {
        assert_eq!(value("no amount here"), None);
        assert_eq!(value("0 dollars"), None);
        assert_eq!(value(""), None);
    }
}
