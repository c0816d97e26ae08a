// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;
use std::str::FromStr;

use subtle::ConstantTimeEq;

use crate::serialization::{format_pair, impl_serde_via_string, parse_pair};
use crate::{
    AsNaturalNumber, AsRingElement, Ciphertext, EncryptionKey, Error, LargeBiPrimeSizedNumber,
    Result,
};

/// A Paillier private key $(\lambda, \mu)$.
///
/// Holds no reference to its public key; [`DecryptionKey::decrypt`] takes the matching
/// [`EncryptionKey`] explicitly. Serialized as `"(<lambda>, <mu>)"` in base 10.
#[derive(Clone)]
pub struct DecryptionKey {
    // $ \lambda = lcm(p - 1, q - 1) $
    lambda: LargeBiPrimeSizedNumber,
    // $ \mu = L(g^\lambda mod N^2)^{-1} mod N $
    mu: LargeBiPrimeSizedNumber,
}

impl DecryptionKey {
    pub fn new(lambda: LargeBiPrimeSizedNumber, mu: LargeBiPrimeSizedNumber) -> DecryptionKey {
        DecryptionKey { lambda, mu }
    }

    pub fn lambda(&self) -> &LargeBiPrimeSizedNumber {
        &self.lambda
    }

    pub fn mu(&self) -> &LargeBiPrimeSizedNumber {
        &self.mu
    }

    /// Decrypts `ciphertext`, returning the plaintext in $[0, N)$.
    pub fn decrypt(
        &self,
        encryption_key: &EncryptionKey,
        ciphertext: &Ciphertext,
    ) -> Result<LargeBiPrimeSizedNumber> {
        let n = encryption_key.n();

        // $ x = c^\lambda mod N^2 $
        let x = encryption_key
            .ciphertext_mod_n2(ciphertext)?
            .pow_bounded_exp(&self.lambda, self.lambda.bits_vartime())
            .as_natural_number();

        // $ m = L(x) * \mu mod N $
        Ok((encryption_key.l_function(&x).as_ring_element(n) * self.mu.as_ring_element(n))
            .as_natural_number())
    }
}

impl PartialEq for DecryptionKey {
    fn eq(&self, other: &Self) -> bool {
        (self.lambda.ct_eq(&other.lambda) & self.mu.ct_eq(&other.mu)).into()
    }
}

impl Eq for DecryptionKey {}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey").finish_non_exhaustive()
    }
}

impl fmt::Display for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pair(&self.lambda, &self.mu))
    }
}

impl FromStr for DecryptionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lambda, mu) = parse_pair::<{ LargeBiPrimeSizedNumber::LIMBS }>(s)?;

        Ok(DecryptionKey::new(lambda, mu))
    }
}

impl_serde_via_string!(DecryptionKey);
