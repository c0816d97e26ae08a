// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Base-10 text encoding of big integers and the `"(<a>, <b>)"` key wire format.

use crypto_bigint::{Limb, Uint};
use num_bigint::BigUint;

use crate::ParseError;

/// Formats `value` in base 10, without leading zeros.
pub fn to_decimal_string<const LIMBS: usize>(value: &Uint<LIMBS>) -> String {
    to_big_uint(value).to_str_radix(10)
}

/// Parses an unsigned base-10 integer consisting solely of ASCII digits.
pub fn from_decimal_str<const LIMBS: usize>(digits: &str) -> Result<Uint<LIMBS>, ParseError> {
    if digits.is_empty() {
        return Err(ParseError::Empty);
    }
    // `BigUint` also accepts a sign and `_` separators.
    if !digits.bytes().all(|digit| digit.is_ascii_digit()) {
        return Err(ParseError::InvalidDigit);
    }

    let value = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or(ParseError::InvalidDigit)?;
    from_big_uint(&value)
}

fn to_big_uint<const LIMBS: usize>(value: &Uint<LIMBS>) -> BigUint {
    let bytes: Vec<u8> = value
        .as_words()
        .iter()
        .rev()
        .flat_map(|word| word.to_be_bytes())
        .collect();

    BigUint::from_bytes_be(&bytes)
}

fn from_big_uint<const LIMBS: usize>(value: &BigUint) -> Result<Uint<LIMBS>, ParseError> {
    let significant = value.to_bytes_be();
    let width = LIMBS * Limb::BYTES;
    if significant.len() > width {
        return Err(ParseError::Overflow {
            bits: Uint::<LIMBS>::BITS,
        });
    }

    let mut bytes = vec![0u8; width];
    bytes[width - significant.len()..].copy_from_slice(&significant);

    Ok(Uint::from_be_slice(&bytes))
}

/// Formats two integers as `"(<first>, <second>)"`.
pub fn format_pair<const LIMBS: usize>(first: &Uint<LIMBS>, second: &Uint<LIMBS>) -> String {
    format!(
        "({}, {})",
        to_decimal_string(first),
        to_decimal_string(second)
    )
}

/// Parses a string of exactly the form `"(<first>, <second>)"`: parentheses, a comma followed by a
/// single space, and two unsigned base-10 integers. Nothing may precede or follow the pair.
pub fn parse_pair<const LIMBS: usize>(pair: &str) -> Result<(Uint<LIMBS>, Uint<LIMBS>), ParseError> {
    let (first, second) = pair
        .strip_prefix('(')
        .and_then(|pair| pair.strip_suffix(')'))
        .and_then(|pair| pair.split_once(", "))
        .ok_or(ParseError::MalformedPair)?;

    if first.is_empty() || second.is_empty() {
        return Err(ParseError::MalformedPair);
    }

    Ok((from_decimal_str(first)?, from_decimal_str(second)?))
}

/// Implements `Serialize` and `Deserialize` through the type's `Display` and `FromStr` impls.
macro_rules! impl_serde_via_string {
    ($type:ty) => {
        impl serde::Serialize for $type {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let encoded = String::deserialize(deserializer)?;

                encoded.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_serde_via_string;
