//! VIN check-digit computation (ISO 3779).
//!
//! Candidates are built from a prefix template and a sequence number, so the
//! check digit at position 9 is never trusted: it is always recomputed from
//! the other sixteen characters.

use std::fmt;

use thiserror::Error;

/// Length of every VIN.
pub const VIN_LEN: usize = 17;

/// Zero-based index of the check digit.
const CHECK_DIGIT_INDEX: usize = 8;

/// Positional weights. The check-digit slot carries weight 0.
const WEIGHTS: [u32; VIN_LEN] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidVin {
    #[error("VIN must be exactly {VIN_LEN} characters, got {0}")]
    Length(usize),

    #[error("invalid character {ch:?} at position {position}")]
    Character { ch: char, position: usize },
}

/// A 17-character VIN whose check digit is known to be correct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vin(String);

impl Vin {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The check digit at position 9.
    pub fn check_digit(&self) -> char {
        self.0.as_bytes()[CHECK_DIGIT_INDEX] as char
    }

    /// True if `candidate` already carries its correct check digit.
    pub fn is_valid(candidate: &str) -> bool {
        add_check_digit(candidate).is_ok_and(|vin| vin.0 == candidate.to_ascii_uppercase())
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Transliterate one VIN character to its numeric value.
///
/// I, O and Q are never valid in a VIN.
fn transliterate(ch: char) -> Option<u32> {
    match ch {
        '0'..='9' => ch.to_digit(10),
        'A' | 'J' => Some(1),
        'B' | 'K' | 'S' => Some(2),
        'C' | 'L' | 'T' => Some(3),
        'D' | 'M' | 'U' => Some(4),
        'E' | 'N' | 'V' => Some(5),
        'F' | 'W' => Some(6),
        'G' | 'P' | 'X' => Some(7),
        'H' | 'Y' => Some(8),
        'R' | 'Z' => Some(9),
        _ => None,
    }
}

/// Check a prefix template: every character must be usable in a VIN, and
/// at least one position must be left for the sequence number.
pub fn check_prefix(prefix: &str) -> Result<(), InvalidVin> {
    let len = prefix.chars().count();
    if len == 0 || len >= VIN_LEN {
        return Err(InvalidVin::Length(len));
    }
    for (i, ch) in prefix.chars().enumerate() {
        let ch = ch.to_ascii_uppercase();
        if transliterate(ch).is_none() {
            return Err(InvalidVin::Character {
                ch,
                position: i + 1,
            });
        }
    }
    Ok(())
}

/// Compute the check digit for `candidate` and return the corrected VIN.
///
/// The input is uppercased; every character other than position 9 is
/// returned unchanged. Any character outside the transliteration table,
/// including the existing check-digit slot, rejects the whole candidate.
pub fn add_check_digit(candidate: &str) -> Result<Vin, InvalidVin> {
    let len = candidate.chars().count();
    if len != VIN_LEN {
        return Err(InvalidVin::Length(len));
    }

    let upper = candidate.to_ascii_uppercase();
    let mut sum = 0u32;
    for (i, ch) in upper.chars().enumerate() {
        let value = transliterate(ch).ok_or(InvalidVin::Character {
            ch,
            position: i + 1,
        })?;
        sum += value * WEIGHTS[i];
    }

    let check = match sum % 11 {
        10 => 'X',
        r => char::from_digit(r, 10).unwrap_or('0'),
    };

    let mut corrected = String::with_capacity(VIN_LEN);
    corrected.push_str(&upper[..CHECK_DIGIT_INDEX]);
    corrected.push(check);
    corrected.push_str(&upper[CHECK_DIGIT_INDEX + 1..]);
    Ok(Vin(corrected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vector_gets_its_check_digit() {
        let vin = add_check_digit("1FA6P8R00P5502924").unwrap();
        assert_eq!(vin.as_str(), "1FA6P8R02P5502924");
        assert_eq!(vin.check_digit(), '2');
    }

    #[test]
    fn remainder_ten_becomes_x() {
        let vin = add_check_digit("1M8GDM9A0KP042788").unwrap();
        assert_eq!(vin.as_str(), "1M8GDM9AXKP042788");
    }

    #[test]
    fn lowercase_is_normalised() {
        let vin = add_check_digit("1fa6p8t00p5502924").unwrap();
        assert_eq!(vin.as_str(), "1FA6P8T01P5502924");
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(add_check_digit(""), Err(InvalidVin::Length(0)));
        assert_eq!(
            add_check_digit("1FA6P8R00P502924"),
            Err(InvalidVin::Length(16))
        );
        assert_eq!(
            add_check_digit("1FA6P8R00P55029241"),
            Err(InvalidVin::Length(18))
        );
    }

    #[test]
    fn i_o_q_are_rejected() {
        for bad in ['I', 'O', 'Q'] {
            let candidate = format!("1FA6P8R00P550292{bad}");
            assert_eq!(
                add_check_digit(&candidate),
                Err(InvalidVin::Character {
                    ch: bad,
                    position: 17
                })
            );
        }
    }

    #[test]
    fn check_digit_slot_must_also_be_mappable() {
        assert!(matches!(
            add_check_digit("1FA6P8R0-P5502924"),
            Err(InvalidVin::Character { ch: '-', position: 9 })
        ));
    }

    #[test]
    fn is_valid_checks_the_existing_digit() {
        assert!(Vin::is_valid("1FA6P8R02P5502924"));
        assert!(!Vin::is_valid("1FA6P8R00P5502924"));
        assert!(!Vin::is_valid("short"));
    }

    #[test]
    fn prefix_characters_must_be_vin_characters() {
        assert_eq!(check_prefix("1FA6P8R00P5"), Ok(()));
        assert_eq!(check_prefix("1fa6p8r00p"), Ok(()));
        assert_eq!(
            check_prefix("1FA6P8O00P5"),
            Err(InvalidVin::Character {
                ch: 'O',
                position: 7
            })
        );
        assert!(matches!(
            check_prefix("1FA 6P8"),
            Err(InvalidVin::Character { ch: ' ', .. })
        ));
        assert_eq!(check_prefix(""), Err(InvalidVin::Length(0)));
        assert_eq!(
            check_prefix("1FA6P8R02P5502924"),
            Err(InvalidVin::Length(17))
        );
    }

    proptest! {
        #[test]
        fn check_digit_is_idempotent(candidate in "[0-9A-HJ-NPR-Z]{17}") {
            let once = add_check_digit(&candidate).unwrap();
            let twice = add_check_digit(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn only_position_nine_changes(candidate in "[0-9A-HJ-NPR-Z]{17}") {
            let vin = add_check_digit(&candidate).unwrap();
            for (i, (a, b)) in candidate.chars().zip(vin.as_str().chars()).enumerate() {
                if i != CHECK_DIGIT_INDEX {
                    prop_assert_eq!(a, b);
                }
            }
        }
    }
}
