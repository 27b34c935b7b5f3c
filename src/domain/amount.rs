use crate::error::{PosError, Result};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

pub const BACKSPACE: char = '⌫';
pub const CURRENCY_SYMBOL: &str = "£";
/// Largest whole-pound part the keypad accepts (£9,999,999.99).
pub const MAX_INTEGER_DIGITS: usize = 7;

/// A single keypad press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Point,
    Backspace,
}

impl TryFrom<char> for Key {
    type Error = PosError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Ok(Key::Digit(c as u8 - b'0')),
            '.' => Ok(Key::Point),
            BACKSPACE => Ok(Key::Backspace),
            other => Err(PosError::InvalidKey(other.to_string())),
        }
    }
}

impl FromStr for Key {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::try_from(c),
            _ => Err(PosError::InvalidKey(s.to_string())),
        }
    }
}

/// Applies one key press to the keypad value and returns the new value.
///
/// The value is kept as the literal keypad string so that "0." and "12.5"
/// survive re-rendering exactly as typed.
pub fn apply_digit(current: &str, key: Key) -> String {
    match key {
        Key::Backspace => {
            if current.chars().count() > 1 {
                let mut next = current.to_string();
                next.pop();
                next
            } else {
                "0".to_string()
            }
        }
        Key::Point if current.contains('.') => current.to_string(),
        Key::Point => format!("{current}."),
        Key::Digit(d) if current == "0" => d.to_string(),
        Key::Digit(d) => match current.split_once('.') {
            Some((_, fraction)) if fraction.len() >= 2 => current.to_string(),
            None if current.len() >= MAX_INTEGER_DIGITS => current.to_string(),
            _ => format!("{current}{d}"),
        },
    }
}

/// Keypad accumulator for the sale amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountEntry {
    value: String,
}

impl Default for AmountEntry {
    fn default() -> Self {
        Self {
            value: "0".to_string(),
        }
    }
}

impl AmountEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays a sequence of keypad characters from a fresh entry.
    pub fn from_keys(keys: &str) -> Result<Self> {
        let mut entry = Self::new();
        for c in keys.chars() {
            entry.press(Key::try_from(c)?);
        }
        Ok(entry)
    }

    pub fn press(&mut self, key: Key) {
        self.value = apply_digit(&self.value, key);
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Checkout is disabled while the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value == "0" || self.value == "0."
    }

    pub fn amount(&self) -> Decimal {
        Decimal::from_str(self.value.trim_end_matches('.')).unwrap_or(Decimal::ZERO)
    }

    pub fn clear(&mut self) {
        self.value = "0".to_string();
    }
}

impl fmt::Display for AmountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.ends_with('.') {
            write!(f, "{}{}00", CURRENCY_SYMBOL, self.value)
        } else {
            write!(f, "{}", format_money(self.amount()))
        }
    }
}

/// Formats an amount for display with two decimal places, e.g. `£12.50`.
pub fn format_money(amount: Decimal) -> String {
    format!("{}{:.2}", CURRENCY_SYMBOL, amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rust_decimal_macros::dec;

    fn press_all(keys: &str) -> String {
        AmountEntry::from_keys(keys).unwrap().value().to_string()
    }

    #[test]
    fn test_leading_zero_replaced() {
        assert_eq!(press_all("5"), "5");
        assert_eq!(press_all("05"), "5");
        assert_eq!(press_all("0.5"), "0.5");
        assert_eq!(press_all("."), "0.");
    }

    #[test]
    fn test_second_point_ignored() {
        assert_eq!(press_all("1.2.3"), "1.23");
    }

    #[test]
    fn test_fraction_capped_at_two_digits() {
        assert_eq!(press_all("12.345"), "12.34");
        assert_eq!(press_all("9.999"), "9.99");
    }

    #[test]
    fn test_integer_part_capped() {
        let nines = "9".repeat(29);
        let entry = AmountEntry::from_keys(&nines).unwrap();
        assert_eq!(entry.value(), "9999999");
        assert_eq!(entry.amount(), dec!(9999999));
        assert_eq!(entry.to_string(), "£9999999.00");

        // The cap leaves room for pence.
        let entry = AmountEntry::from_keys(&format!("{nines}.994")).unwrap();
        assert_eq!(entry.amount(), dec!(9999999.99));
    }

    #[test]
    fn test_backspace() {
        assert_eq!(press_all("12⌫"), "1");
        assert_eq!(press_all("12⌫⌫"), "0");
        assert_eq!(press_all("1.5⌫"), "1.");
        assert_eq!(press_all("1.5⌫⌫"), "1");
    }

    #[test]
    fn test_backspace_on_zero_is_idempotent() {
        assert_eq!(apply_digit("0", Key::Backspace), "0");
        assert_eq!(press_all("⌫⌫⌫"), "0");
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(
            AmountEntry::from_keys("1a"),
            Err(PosError::InvalidKey(_))
        ));
        assert!(matches!(
            AmountEntry::from_keys("-1"),
            Err(PosError::InvalidKey(_))
        ));
        assert!("12".parse::<Key>().is_err());
        assert_eq!("⌫".parse::<Key>().unwrap(), Key::Backspace);
    }

    #[test]
    fn test_clear_starts_over() {
        let mut entry = AmountEntry::from_keys("42.1").unwrap();
        entry.clear();
        assert_eq!(entry, AmountEntry::new());
        assert!(entry.is_zero());
    }

    #[test]
    fn test_is_zero() {
        assert!(AmountEntry::new().is_zero());
        assert!(AmountEntry::from_keys(".").unwrap().is_zero());
        assert!(!AmountEntry::from_keys("0.0").unwrap().is_zero());
        assert!(!AmountEntry::from_keys("3").unwrap().is_zero());
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(AmountEntry::from_keys("12.5").unwrap().amount(), dec!(12.5));
        assert_eq!(AmountEntry::from_keys("7.").unwrap().amount(), dec!(7));
        assert_eq!(AmountEntry::new().amount(), Decimal::ZERO);
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(AmountEntry::new().to_string(), "£0.00");
        assert_eq!(AmountEntry::from_keys("12.5").unwrap().to_string(), "£12.50");
        assert_eq!(AmountEntry::from_keys("4.").unwrap().to_string(), "£4.00");
        assert_eq!(format_money(dec!(3)), "£3.00");
    }

    #[test]
    fn test_random_key_sequences_keep_shape() {
        let keys = ['0', '1', '5', '9', '.', BACKSPACE];
        let mut rng = rand::thread_rng();

        for _ in 0..500 {
            let mut entry = AmountEntry::new();
            for _ in 0..rng.gen_range(1..30) {
                let key = keys[rng.gen_range(0..keys.len())];
                entry.press(Key::try_from(key).unwrap());

                let value = entry.value();
                assert!(value.matches('.').count() <= 1, "{value}");
                if let Some((_, fraction)) = value.split_once('.') {
                    assert!(fraction.len() <= 2, "{value}");
                }
                let whole = value.split('.').next().unwrap_or_default();
                assert!(whole.len() <= MAX_INTEGER_DIGITS, "{value}");
                assert!(!value.is_empty());
                assert!(!value.starts_with('-'));
            }
        }
    }
}
