// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;
use std::str::FromStr;

use crate::serialization::{from_decimal_str, impl_serde_via_string, to_decimal_string};
use crate::{Error, PaillierModulusSizedNumber};

/// A Paillier ciphertext, an element of $\mathbb{Z}_{N^2}$.
///
/// Range checks against a concrete $N^2$ happen in the [`EncryptionKey`](crate::EncryptionKey)
/// operations that consume it. Serialized as a base-10 string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ciphertext(PaillierModulusSizedNumber);

impl Ciphertext {
    pub fn new(value: PaillierModulusSizedNumber) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &PaillierModulusSizedNumber {
        &self.0
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_decimal_string(&self.0))
    }
}

impl FromStr for Ciphertext {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(from_decimal_str(s)?))
    }
}

impl_serde_via_string!(Ciphertext);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::CIPHERTEXT;
    use crate::ParseError;

    #[test]
    fn wraps_a_full_width_value() {
        let ciphertext = Ciphertext::new(CIPHERTEXT);

        assert_eq!(*ciphertext.value(), CIPHERTEXT);
        assert_eq!(
            Ciphertext::new(*ciphertext.value()),
            Ciphertext::new(CIPHERTEXT)
        );
    }

    #[test]
    fn displays_and_parses_in_decimal() {
        let ciphertext = Ciphertext::new(CIPHERTEXT);

        assert_eq!(ciphertext.to_string().parse::<Ciphertext>().unwrap(), ciphertext);
        assert_eq!("12345".parse::<Ciphertext>().unwrap().to_string(), "12345");
    }

    #[test]
    fn serializes_as_a_string() {
        let json = serde_json::to_string(&Ciphertext::new(PaillierModulusSizedNumber::from_u8(42))).unwrap();

        assert_eq!(json, "\"42\"");
        assert_eq!(
            serde_json::from_str::<Ciphertext>(&json).unwrap(),
            Ciphertext::new(PaillierModulusSizedNumber::from_u8(42))
        );
    }

    #[test]
    fn rejects_non_decimal_ciphertexts() {
        assert_eq!(
            "0x2a".parse::<Ciphertext>(),
            Err(Error::Parse(ParseError::InvalidDigit))
        );
        assert_eq!("".parse::<Ciphertext>(), Err(Error::Parse(ParseError::Empty)));
        assert!(serde_json::from_str::<Ciphertext>("42").is_err());
    }
}
