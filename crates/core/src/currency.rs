use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const DEFAULT_SYMBOL: &str = "$";

const GROUP_SEPARATOR: char = ',';
const DECIMAL_POINT: char = '.';

// ASCII classes so non-Latin digits are rejected.
static CANONICAL_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9]{2})?$").expect("canonical amount pattern is valid")
});

/// Input accepted by [`CurrencyFormatter::format`].
///
/// Mirrors what arrives from form fields and query results: a number, a
/// numeric string, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountInput<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl From<f64> for AmountInput<'_> {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<'a> From<&'a str> for AmountInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for AmountInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl<'a, T> From<Option<T>> for AmountInput<'a>
where
    T: Into<AmountInput<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Missing)
    }
}

/// Result of [`CurrencyFormatter::format_while_typing`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypedAmount {
    /// Text to put back into the input field.
    pub display: String,
    /// Best-effort numeric value of the normalized text.
    pub raw: f64,
}

/// Business-rule violations reported by [`CurrencyFormatter::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is required")]
    Required,
    #[error("Amount cannot be negative")]
    Negative,
}

/// Converts between canonical two-decimal, comma-grouped strings and
/// numeric amounts.
///
/// All conversions are total: transiently invalid keystroke data degrades to
/// zero instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    symbol: String,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrencyFormatter {
    pub fn new() -> Self {
        Self::with_symbol(DEFAULT_SYMBOL)
    }

    pub fn with_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Renders `amount` with exactly two decimals and thousands separators.
    pub fn format<'a>(&self, amount: impl Into<AmountInput<'a>>) -> String {
        let value = match amount.into() {
            AmountInput::Number(value) => value,
            AmountInput::Text(text) => text.trim().parse::<f64>().unwrap_or(0.0),
            AmountInput::Missing => 0.0,
        };
        format_number(value)
    }

    pub fn format_with_symbol<'a>(&self, amount: impl Into<AmountInput<'a>>) -> String {
        format!("{}{}", self.symbol, self.format(amount))
    }

    /// Leniently reads an amount out of user or display text.
    ///
    /// The symbol, grouping separators and whitespace are ignored; whatever
    /// follows the leading number is discarded.
    pub fn parse(&self, text: &str) -> f64 {
        let cleaned = self.strip_decorations(text);
        leading_number(&cleaned).unwrap_or(0.0)
    }

    /// Normalizes text while the user is still editing.
    ///
    /// Unlike [`format`](Self::format) this never pads or rounds, so a
    /// trailing decimal point survives between keystrokes.
    pub fn format_while_typing(&self, text: &str) -> TypedAmount {
        let mut integer = String::new();
        let mut fraction: Option<String> = None;

        for ch in text.chars() {
            match ch {
                '0'..='9' => match fraction.as_mut() {
                    Some(digits) if digits.len() < 2 => digits.push(ch),
                    Some(_) => {}
                    None => integer.push(ch),
                },
                DECIMAL_POINT if fraction.is_none() => fraction = Some(String::new()),
                _ => {}
            }
        }

        let mut display = group_digits(&integer);
        let mut normalized = integer;
        if let Some(digits) = fraction {
            display.push(DECIMAL_POINT);
            display.push_str(&digits);
            normalized.push(DECIMAL_POINT);
            normalized.push_str(&digits);
        }

        TypedAmount {
            display,
            raw: leading_number(&normalized).unwrap_or(0.0),
        }
    }

    /// Canonicalizes whatever was typed once the field loses focus.
    pub fn format_on_blur(&self, text: &str) -> String {
        format_number(self.parse(text))
    }

    /// Strict check for the bare canonical form: digits with an optional
    /// two-digit fraction, no symbol, sign, or separators.
    pub fn validate_format(&self, text: &str) -> bool {
        CANONICAL_AMOUNT.is_match(text)
    }

    pub fn validate(&self, text: &str) -> Result<(), AmountError> {
        if text.trim().is_empty() {
            return Err(AmountError::Required);
        }
        if self.parse(text) < 0.0 {
            return Err(AmountError::Negative);
        }
        Ok(())
    }

    fn strip_decorations(&self, text: &str) -> String {
        let without_symbol = if self.symbol.is_empty() {
            text.to_string()
        } else {
            text.replace(self.symbol.as_str(), "")
        };
        without_symbol
            .chars()
            .filter(|ch| *ch != GROUP_SEPARATOR && !ch.is_whitespace())
            .collect()
    }
}

fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0.00".to_string();
    }

    // `{:.2}` breaks ties to even; amounts round half away from zero.
    let scaled = value.abs() * 100.0;
    let rounded = if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value.abs()
    };
    let fixed = format!("{rounded:.2}");
    let (integer, fraction) = fixed.split_once(DECIMAL_POINT).unwrap_or((fixed.as_str(), "00"));
    let negative = value < 0.0 && fixed.bytes().any(|b| b != b'0' && b != b'.');

    let mut rendered = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if negative {
        rendered.push('-');
    }
    rendered.push_str(&group_digits(integer));
    rendered.push(DECIMAL_POINT);
    rendered.push_str(fraction);
    rendered
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped
}

/// Reads `[+-]?digits[.digits]` from the start of `text`.
fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }

    let mut digits = 0;
    let mut seen_point = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_point => seen_point = true,
            _ => break,
        }
        end += 1;
    }

    if digits == 0 {
        return None;
    }
    text[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Monetary value that crosses display and persistence boundaries as its
/// canonical string.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct CurrencyAmount(f64);

impl CurrencyAmount {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for CurrencyAmount {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_number(self.0))
    }
}

impl Serialize for CurrencyAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(CurrencyAmountVisitor)
    }
}

struct CurrencyAmountVisitor;

impl<'de> Visitor<'de> for CurrencyAmountVisitor {
    type Value = CurrencyAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a currency string")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(CurrencyAmount(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(CurrencyAmount(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(CurrencyAmount(value as f64))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(CurrencyAmount(CurrencyFormatter::new().parse(value)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(CurrencyAmount::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn fmt() -> CurrencyFormatter {
        CurrencyFormatter::new()
    }

    fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    #[test]
    fn format_groups_thousands_with_two_decimals() {
        let f = fmt();
        assert_eq!(f.format(0.0), "0.00");
        assert_eq!(f.format(5.0), "5.00");
        assert_eq!(f.format(999.999), "1,000.00");
        assert_eq!(f.format(1234.5), "1,234.50");
        assert_eq!(f.format(1_234_567.891), "1,234,567.89");
        assert_eq!(f.format(100_000.0), "100,000.00");
    }

    #[test]
    fn format_degrades_missing_and_invalid_to_zero() {
        let f = fmt();
        assert_eq!(f.format(None::<f64>), "0.00");
        assert_eq!(f.format(AmountInput::Missing), "0.00");
        assert_eq!(f.format(f64::NAN), "0.00");
        assert_eq!(f.format(f64::INFINITY), "0.00");
        assert_eq!(f.format("abc"), "0.00");
        assert_eq!(f.format(""), "0.00");
    }

    #[test]
    fn format_accepts_numeric_strings() {
        let f = fmt();
        assert_eq!(f.format("1234.5"), "1,234.50");
        assert_eq!(f.format(" 42 "), "42.00");
        assert_eq!(f.format(Some("7.1")), "7.10");
    }

    #[test]
    fn format_keeps_sign_but_not_negative_zero() {
        let f = fmt();
        assert_eq!(f.format(-1234.5), "-1,234.50");
        assert_eq!(f.format(-0.0), "0.00");
        assert_eq!(f.format(-0.001), "0.00");
    }

    #[test]
    fn format_with_symbol_prefixes_symbol() {
        assert_eq!(fmt().format_with_symbol(1500.0), "$1,500.00");
        assert_eq!(
            CurrencyFormatter::with_symbol("₱").format_with_symbol(None::<f64>),
            "₱0.00"
        );
    }

    #[test]
    fn parse_strips_symbol_separators_and_whitespace() {
        let f = fmt();
        assert_eq!(f.parse("$1,234.50"), 1234.5);
        assert_eq!(f.parse(" 1 000 "), 1000.0);
        assert_eq!(f.parse("-5"), -5.0);
        assert_eq!(f.parse("10."), 10.0);
        assert_eq!(f.parse("12abc"), 12.0);
        assert_eq!(f.parse("abc"), 0.0);
        assert_eq!(f.parse(""), 0.0);
        assert_eq!(f.parse("."), 0.0);
    }

    #[test]
    fn parse_is_left_inverse_of_format() {
        let f = fmt();
        for value in [0.0, 0.01, 1.5, 19.99, 1234.567, 1_000_000.0, 98_765.4321] {
            assert_eq!(f.parse(&f.format(value)), round2(value), "value {value}");
        }
    }

    #[test]
    fn half_cents_round_away_from_zero() {
        let f = fmt();
        assert_eq!(f.format(0.125), "0.13");
        assert_eq!(f.format(1.125), "1.13");
        assert_eq!(f.format(0.625), "0.63");
        assert_eq!(f.format(-0.125), "-0.13");
        for value in [0.125, 1.125, 0.625] {
            assert_eq!(f.parse(&f.format(value)), round2(value), "value {value}");
        }
    }

    proptest! {
        #[test]
        fn format_then_parse_rounds_to_cents(value in 0.0f64..1e12) {
            let f = fmt();
            let rendered = f.format(value);
            prop_assert_eq!(f.parse(&rendered), round2(value));
            let fraction = rendered.rsplit_once('.').map(|(_, fraction)| fraction.len());
            prop_assert_eq!(fraction, Some(2));
        }

        #[test]
        fn half_cent_grid_round_trips(cents in 0u64..10_000_000) {
            let f = fmt();
            let value = (cents as f64 + 0.5) / 100.0;
            prop_assert_eq!(f.parse(&f.format(value)), round2(value));
        }
    }

    #[test]
    fn typing_groups_without_padding() {
        let f = fmt();
        assert_eq!(
            f.format_while_typing("1234.5"),
            TypedAmount {
                display: "1,234.5".to_string(),
                raw: 1234.5
            }
        );
        assert_eq!(f.format_while_typing("10.").display, "10.");
        assert_eq!(f.format_while_typing("10.").raw, 10.0);
        assert_eq!(f.format_while_typing("").display, "");
        assert_eq!(f.format_while_typing("").raw, 0.0);
    }

    #[test]
    fn typing_truncates_fraction_without_rounding() {
        let typed = fmt().format_while_typing("1234.567");
        assert_eq!(typed.display, "1,234.56");
        assert_eq!(typed.raw, 1234.56);
    }

    #[test]
    fn typing_drops_extra_points_and_foreign_characters() {
        let f = fmt();
        assert_eq!(f.format_while_typing("1,234,5678").display, "12,345,678");
        assert_eq!(f.format_while_typing("1.2.3").display, "1.23");
        assert_eq!(f.format_while_typing("$-12a3").display, "123");
        assert_eq!(f.format_while_typing(".5").raw, 0.5);
    }

    #[test]
    fn blur_canonicalizes_partial_input() {
        let f = fmt();
        assert_eq!(f.format_on_blur("10."), "10.00");
        assert_eq!(f.format_on_blur("1,234.5"), "1,234.50");
        assert_eq!(f.format_on_blur(""), "0.00");
        assert_eq!(f.format_on_blur("$2500"), "2,500.00");
    }

    #[test]
    fn validate_format_accepts_only_bare_canonical_text() {
        let f = fmt();
        assert!(f.validate_format("1000.00"));
        assert!(f.validate_format("1000"));
        assert!(f.validate_format("0.50"));
        assert!(!f.validate_format("1,000.00"));
        assert!(!f.validate_format("1000.5"));
        assert!(!f.validate_format("1000."));
        assert!(!f.validate_format(".50"));
        assert!(!f.validate_format("$10.00"));
        assert!(!f.validate_format("-10.00"));
        assert!(!f.validate_format(""));
    }

    #[test]
    fn validate_applies_business_rules() {
        let f = fmt();
        assert_eq!(f.validate(""), Err(AmountError::Required));
        assert_eq!(f.validate("   "), Err(AmountError::Required));
        assert_eq!(f.validate("-5"), Err(AmountError::Negative));
        assert_eq!(f.validate("10.00"), Ok(()));
        assert_eq!(f.validate("abc"), Ok(()));
        assert_eq!(AmountError::Required.to_string(), "Amount is required");
        assert_eq!(AmountError::Negative.to_string(), "Amount cannot be negative");
    }

    #[test]
    fn currency_amount_serializes_as_canonical_string() {
        let value = serde_json::to_value(CurrencyAmount::new(1234.5)).expect("serialize");
        assert_eq!(value, json!("1,234.50"));
    }

    #[test]
    fn currency_amount_deserializes_leniently() {
        let parsed: Vec<CurrencyAmount> =
            serde_json::from_value(json!(["$1,234.50", 12, 3.25, null, "n/a"])).expect("deserialize");
        let values: Vec<f64> = parsed.into_iter().map(CurrencyAmount::value).collect();
        assert_eq!(values, vec![1234.5, 12.0, 3.25, 0.0, 0.0]);
    }
}
