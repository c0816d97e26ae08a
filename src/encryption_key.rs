// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;
use std::str::FromStr;

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::rand_core::CryptoRngCore;
use crypto_bigint::NonZero;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::arithmetic::{div_rem_vartime, gcd, non_zero};
use crate::sampling::{random_bits, MAX_SAMPLING_ATTEMPTS};
use crate::serialization::{format_pair, impl_serde_via_string, parse_pair};
use crate::{
    AsNaturalNumber, Ciphertext, Error, LargeBiPrimeSizedNumber, PaillierModulusSizedNumber,
    PaillierRingElement, Result, SanityCheckError,
};

/// A Paillier public key $(N, g)$ with $g = N + 1$.
///
/// $N$ is held in a fixed 2048-bit integer ([`MAX_KEY_BITS`](crate::MAX_KEY_BITS)); larger moduli
/// cannot be represented or parsed. Serialized as `"(<n>, <g>)"` in base 10.
#[derive(Clone, Debug)]
pub struct EncryptionKey {
    n: LargeBiPrimeSizedNumber,
    g: LargeBiPrimeSizedNumber,
    n2: PaillierModulusSizedNumber,
    // $N$ as a divisor of 4096-bit numbers, for the L function
    n_divisor: NonZero<PaillierModulusSizedNumber>,
    n2_params: DynResidueParams<{ PaillierModulusSizedNumber::LIMBS }>,
}

impl EncryptionKey {
    /// Builds the public key for the modulus `n`, which must be odd and greater than one.
    pub fn new(n: LargeBiPrimeSizedNumber) -> Result<EncryptionKey> {
        if !n.bit_vartime(0) || n == LargeBiPrimeSizedNumber::ONE || n == LargeBiPrimeSizedNumber::MAX
        {
            return Err(SanityCheckError::InvalidModulus.into());
        }

        let n2: PaillierModulusSizedNumber = n.square();
        let n_divisor = non_zero(&n.resize::<{ PaillierModulusSizedNumber::LIMBS }>())?;

        Ok(EncryptionKey {
            n,
            g: n.wrapping_add(&LargeBiPrimeSizedNumber::ONE),
            n2,
            n_divisor,
            n2_params: DynResidueParams::new(&n2),
        })
    }

    /// Builds the public key from both of its components, rejecting any generator but $N + 1$.
    pub fn from_parts(
        n: LargeBiPrimeSizedNumber,
        g: LargeBiPrimeSizedNumber,
    ) -> Result<EncryptionKey> {
        let encryption_key = EncryptionKey::new(n)?;
        if g != encryption_key.g {
            return Err(SanityCheckError::InvalidGenerator.into());
        }

        Ok(encryption_key)
    }

    pub fn n(&self) -> &LargeBiPrimeSizedNumber {
        &self.n
    }

    pub fn g(&self) -> &LargeBiPrimeSizedNumber {
        &self.g
    }

    pub fn n2(&self) -> &PaillierModulusSizedNumber {
        &self.n2
    }

    pub(crate) fn mod_n2(&self, x: &PaillierModulusSizedNumber) -> PaillierRingElement {
        DynResidue::new(x, self.n2_params)
    }

    pub(crate) fn one_mod_n2(&self) -> PaillierRingElement {
        DynResidue::one(self.n2_params)
    }

    /// $ L(x) = (x - 1) / N $, for $x \equiv 1 \pmod N$ in $[1, N^2)$.
    pub(crate) fn l_function(&self, x: &PaillierModulusSizedNumber) -> LargeBiPrimeSizedNumber {
        let (quotient, _) = div_rem_vartime(
            &x.wrapping_sub(&PaillierModulusSizedNumber::ONE),
            &self.n_divisor,
        );

        quotient.resize()
    }

    /// Encrypts `plaintext` with a fresh randomizer drawn from `rng`.
    pub fn encrypt(
        &self,
        plaintext: &LargeBiPrimeSizedNumber,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Ciphertext> {
        let randomness = self.sample_randomness(rng)?;

        self.encrypt_with_randomness(plaintext, &randomness)
    }

    /// Encrypts `plaintext` under the caller-chosen randomizer $r \in (0, N)$.
    ///
    /// Plaintexts must lie in $[0, N)$; anything larger is rejected rather than reduced.
    pub fn encrypt_with_randomness(
        &self,
        plaintext: &LargeBiPrimeSizedNumber,
        randomness: &LargeBiPrimeSizedNumber,
    ) -> Result<Ciphertext> {
        if *plaintext >= self.n {
            return Err(SanityCheckError::PlaintextOutOfRange.into());
        }
        if *randomness == LargeBiPrimeSizedNumber::ZERO || *randomness >= self.n {
            return Err(SanityCheckError::RandomnessOutOfRange.into());
        }

        let r = self.mod_n2(&randomness.resize());

        // $ c = g^m * r^N = (1 + m*N) * r^N mod N^2 $
        Ok(Ciphertext::new(
            (self.generator_pow(plaintext) * r.pow(&self.n)).as_natural_number(),
        ))
    }

    /// Encrypts every plaintext in `plaintexts`.
    ///
    /// The randomizers are drawn from `rng` in order; the exponentiations run on rayon's pool
    /// when the `parallel` feature is enabled.
    pub fn encrypt_batch(
        &self,
        plaintexts: &[LargeBiPrimeSizedNumber],
        rng: &mut impl CryptoRngCore,
    ) -> Result<Vec<Ciphertext>> {
        let randomizers = plaintexts
            .iter()
            .map(|_| self.sample_randomness(rng))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let iter = plaintexts.iter().zip(randomizers.iter());
        #[cfg(feature = "parallel")]
        let iter = plaintexts.par_iter().zip(randomizers.par_iter());

        iter.map(|(plaintext, randomness)| self.encrypt_with_randomness(plaintext, randomness))
            .collect()
    }

    /// Samples a randomizer $r \in (0, N)$ with $\gcd(r, N) = 1$.
    pub fn sample_randomness(
        &self,
        rng: &mut impl CryptoRngCore,
    ) -> Result<LargeBiPrimeSizedNumber> {
        let bits = self.n.bits_vartime();

        for _ in 0..MAX_SAMPLING_ATTEMPTS {
            let randomness: LargeBiPrimeSizedNumber = random_bits(bits, rng);
            if randomness != LargeBiPrimeSizedNumber::ZERO
                && randomness < self.n
                && gcd(&randomness, &self.n) == LargeBiPrimeSizedNumber::ONE
            {
                return Ok(randomness);
            }
        }

        Err(Error::RandomnessExhausted {
            attempts: MAX_SAMPLING_ATTEMPTS,
        })
    }

    /// Returns an encryption of $m_1 + m_2 \bmod N$ given encryptions of $m_1$ and $m_2$.
    pub fn homomorphic_add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        let lhs = self.ciphertext_mod_n2(lhs)?;
        let rhs = self.ciphertext_mod_n2(rhs)?;

        // $ c_1 * c_2 mod N^2 $
        Ok(Ciphertext::new((lhs * rhs).as_natural_number()))
    }

    /// Returns an encryption of $k * m \bmod N$ given an encryption of $m$.
    pub fn homomorphic_scale(
        &self,
        ciphertext: &Ciphertext,
        scalar: &LargeBiPrimeSizedNumber,
    ) -> Result<Ciphertext> {
        let ciphertext = self.ciphertext_mod_n2(ciphertext)?;

        // $ c^k mod N^2 $
        Ok(Ciphertext::new(
            ciphertext
                .pow_bounded_exp(scalar, scalar.bits_vartime())
                .as_natural_number(),
        ))
    }

    /// Returns an encryption of $m + k \bmod N$ given an encryption of $m$ and a public $k < N$.
    pub fn homomorphic_add_plaintext(
        &self,
        ciphertext: &Ciphertext,
        plaintext: &LargeBiPrimeSizedNumber,
    ) -> Result<Ciphertext> {
        if *plaintext >= self.n {
            return Err(SanityCheckError::PlaintextOutOfRange.into());
        }
        let ciphertext = self.ciphertext_mod_n2(ciphertext)?;

        // $ c * g^k mod N^2 $
        Ok(Ciphertext::new(
            (ciphertext * self.generator_pow(plaintext)).as_natural_number(),
        ))
    }

    /// Homomorphically sums `ciphertexts`; the empty sum is the trivial encryption of zero, $1$.
    pub fn sum<'a>(
        &self,
        ciphertexts: impl IntoIterator<Item = &'a Ciphertext>,
    ) -> Result<Ciphertext> {
        ciphertexts
            .into_iter()
            .try_fold(self.one_mod_n2(), |acc, ciphertext| {
                Ok::<_, Error>(acc * self.ciphertext_mod_n2(ciphertext)?)
            })
            .map(|sum| Ciphertext::new(sum.as_natural_number()))
    }

    /// Computes an encryption of $\sum_i k_i m_i \bmod N$ from pairs of an encryption of $m_i$
    /// and its public weight $k_i$.
    pub fn weighted_sum(
        &self,
        terms: &[(Ciphertext, LargeBiPrimeSizedNumber)],
    ) -> Result<Ciphertext> {
        #[cfg(not(feature = "parallel"))]
        let iter = terms.iter();
        #[cfg(feature = "parallel")]
        let iter = terms.par_iter();

        let scaled = iter
            .map(|(ciphertext, weight)| self.homomorphic_scale(ciphertext, weight))
            .collect::<Result<Vec<_>>>()?;

        self.sum(&scaled)
    }

    /// Rejects ciphertexts outside of $[0, N^2)$.
    pub fn validate_ciphertext(&self, ciphertext: &Ciphertext) -> Result<()> {
        if *ciphertext.value() >= self.n2 {
            return Err(SanityCheckError::CiphertextOutOfRange.into());
        }

        Ok(())
    }

    pub(crate) fn ciphertext_mod_n2(&self, ciphertext: &Ciphertext) -> Result<PaillierRingElement> {
        self.validate_ciphertext(ciphertext)?;

        Ok(self.mod_n2(ciphertext.value()))
    }

    // $ g^m = (1 + N)^m = 1 + m*N mod N^2 $
    fn generator_pow(&self, plaintext: &LargeBiPrimeSizedNumber) -> PaillierRingElement {
        self.mod_n2(&plaintext.resize()) * self.mod_n2(&self.n.resize()) + self.one_mod_n2()
    }
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n && self.g == other.g
    }
}

impl Eq for EncryptionKey {}

impl fmt::Display for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pair(&self.n, &self.g))
    }
}

impl FromStr for EncryptionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (n, g) = parse_pair::<{ LargeBiPrimeSizedNumber::LIMBS }>(s)?;

        EncryptionKey::from_parts(n, g)
    }
}

impl_serde_via_string!(EncryptionKey);

#[cfg(test)]
mod tests {
    use rand_core::OsRng;
    use rstest::rstest;

    use super::*;
    use crate::tests::{ZeroRng, CIPHERTEXT, N, PLAINTEXT, RANDOMNESS};
    use crate::ParseError;

    fn small_key() -> EncryptionKey {
        // $ N = 3 * 5 $
        EncryptionKey::new(LargeBiPrimeSizedNumber::from_u8(15)).unwrap()
    }

    fn encrypt_small(plaintext: u8, randomness: u8) -> Ciphertext {
        small_key()
            .encrypt_with_randomness(
                &LargeBiPrimeSizedNumber::from_u8(plaintext),
                &LargeBiPrimeSizedNumber::from_u8(randomness),
            )
            .unwrap()
    }

    #[test]
    fn encrypts() {
        let encryption_key = EncryptionKey::new(N).unwrap();

        assert_eq!(
            encryption_key.encrypt_with_randomness(&PLAINTEXT, &RANDOMNESS),
            Ok(Ciphertext::new(CIPHERTEXT))
        );
    }

    #[test]
    fn encrypts_small_values() {
        // $ (1 + 2*15) * 2^{15} mod 225 = 31 * 143 mod 225 = 158 $
        assert_eq!(
            encrypt_small(2, 2),
            Ciphertext::new(PaillierModulusSizedNumber::from_u8(158))
        );
    }

    #[test]
    fn adds_encrypted_values() {
        let encryption_key = small_key();

        assert_eq!(
            encryption_key.homomorphic_add(&encrypt_small(2, 2), &encrypt_small(3, 4)),
            Ok(encrypt_small(5, 8))
        );
    }

    #[test]
    fn scales_encrypted_values() {
        let encryption_key = small_key();

        assert_eq!(
            encryption_key.homomorphic_scale(&encrypt_small(2, 2), &LargeBiPrimeSizedNumber::from_u8(3)),
            Ok(encrypt_small(6, 8))
        );
        assert_eq!(
            encryption_key.homomorphic_scale(&encrypt_small(2, 2), &LargeBiPrimeSizedNumber::ZERO),
            Ok(Ciphertext::new(PaillierModulusSizedNumber::ONE))
        );
    }

    #[test]
    fn adds_plaintexts_to_encrypted_values() {
        let encryption_key = small_key();

        assert_eq!(
            encryption_key.homomorphic_add_plaintext(&encrypt_small(2, 2), &LargeBiPrimeSizedNumber::from_u8(4)),
            Ok(encrypt_small(6, 2))
        );
        assert_eq!(
            encryption_key.homomorphic_add_plaintext(&encrypt_small(2, 2), &LargeBiPrimeSizedNumber::from_u8(15)),
            Err(Error::SanityCheck(SanityCheckError::PlaintextOutOfRange))
        );
    }

    #[test]
    fn sums_encrypted_values() {
        let encryption_key = small_key();

        assert_eq!(
            encryption_key.sum(&[] as &[Ciphertext]),
            Ok(Ciphertext::new(PaillierModulusSizedNumber::ONE))
        );
        assert_eq!(
            encryption_key.sum(&[encrypt_small(1, 2), encrypt_small(2, 2), encrypt_small(3, 1)]),
            Ok(encrypt_small(6, 4))
        );
        assert_eq!(
            encryption_key.weighted_sum(&[
                (encrypt_small(1, 2), LargeBiPrimeSizedNumber::from_u8(4)),
                (encrypt_small(2, 1), LargeBiPrimeSizedNumber::from_u8(3)),
            ]),
            // $ 1*4 + 2*3 = 10, 2^4 * 1^3 = 16 = 1 mod 15 $
            Ok(encrypt_small(10, 1))
        );
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        let encryption_key = small_key();
        let one = LargeBiPrimeSizedNumber::ONE;

        assert_eq!(
            encryption_key.encrypt_with_randomness(&LargeBiPrimeSizedNumber::from_u8(15), &one),
            Err(Error::SanityCheck(SanityCheckError::PlaintextOutOfRange))
        );
        assert_eq!(
            encryption_key.encrypt_with_randomness(&one, &LargeBiPrimeSizedNumber::ZERO),
            Err(Error::SanityCheck(SanityCheckError::RandomnessOutOfRange))
        );
        assert_eq!(
            encryption_key.encrypt_with_randomness(&one, &LargeBiPrimeSizedNumber::from_u8(15)),
            Err(Error::SanityCheck(SanityCheckError::RandomnessOutOfRange))
        );
        assert_eq!(
            encryption_key.homomorphic_add(
                &Ciphertext::new(PaillierModulusSizedNumber::from_u8(225)),
                &encrypt_small(1, 1)
            ),
            Err(Error::SanityCheck(SanityCheckError::CiphertextOutOfRange))
        );
    }

    #[test]
    fn samples_invertible_randomness() {
        let encryption_key = small_key();

        for _ in 0..64 {
            let randomness = encryption_key.sample_randomness(&mut OsRng).unwrap();

            assert!(randomness > LargeBiPrimeSizedNumber::ZERO && randomness < *encryption_key.n());
            assert_eq!(gcd(&randomness, encryption_key.n()), LargeBiPrimeSizedNumber::ONE);
        }
    }

    #[test]
    fn gives_up_on_a_stuck_random_source() {
        let encryption_key = EncryptionKey::new(N).unwrap();

        assert_eq!(
            encryption_key.sample_randomness(&mut ZeroRng),
            Err(Error::RandomnessExhausted {
                attempts: MAX_SAMPLING_ATTEMPTS
            })
        );
        assert_eq!(
            encryption_key.encrypt(&PLAINTEXT, &mut ZeroRng),
            Err(Error::RandomnessExhausted {
                attempts: MAX_SAMPLING_ATTEMPTS
            })
        );
    }

    #[test]
    fn randomizes_encryptions() {
        let encryption_key = EncryptionKey::new(N).unwrap();

        assert_ne!(
            encryption_key.encrypt(&PLAINTEXT, &mut OsRng).unwrap(),
            encryption_key.encrypt(&PLAINTEXT, &mut OsRng).unwrap()
        );
    }

    #[test]
    fn encrypts_batches() {
        let encryption_key = EncryptionKey::new(N).unwrap();
        let plaintexts = [PLAINTEXT, LargeBiPrimeSizedNumber::ZERO, LargeBiPrimeSizedNumber::ONE];

        let ciphertexts = encryption_key.encrypt_batch(&plaintexts, &mut OsRng).unwrap();

        assert_eq!(ciphertexts.len(), plaintexts.len());
        assert!(ciphertexts.iter().all(|ciphertext| encryption_key.validate_ciphertext(ciphertext).is_ok()));
    }

    #[test]
    fn computes_the_l_function() {
        let encryption_key = small_key();

        // $ L(1 + 7*15) = 7 $
        assert_eq!(
            encryption_key.l_function(&PaillierModulusSizedNumber::from_u8(106)),
            LargeBiPrimeSizedNumber::from_u8(7)
        );
    }

    #[rstest]
    #[case("(15, 16)", Ok(()))]
    #[case("(15, 17)", Err(Error::SanityCheck(SanityCheckError::InvalidGenerator)))]
    #[case("(16, 17)", Err(Error::SanityCheck(SanityCheckError::InvalidModulus)))]
    #[case("(1, 2)", Err(Error::SanityCheck(SanityCheckError::InvalidModulus)))]
    #[case("(15,16)", Err(Error::Parse(ParseError::MalformedPair)))]
    #[case("15, 16", Err(Error::Parse(ParseError::MalformedPair)))]
    #[case("(15, x)", Err(Error::Parse(ParseError::InvalidDigit)))]
    fn parses(#[case] encoded: &str, #[case] expected: Result<()>) {
        assert_eq!(encoded.parse::<EncryptionKey>().map(|_| ()), expected);
    }

    #[test]
    fn rejects_moduli_wider_than_the_key_size_limit() {
        let n = (num_bigint::BigUint::from(1u8) << crate::MAX_KEY_BITS) + 1u8;
        let encoded = format!("({}, {})", n, &n + 1u8);

        assert_eq!(
            encoded.parse::<EncryptionKey>().map(|_| ()),
            Err(Error::Parse(ParseError::Overflow {
                bits: crate::MAX_KEY_BITS
            }))
        );
    }

    #[test]
    fn displays_and_parses() {
        let encryption_key = EncryptionKey::new(N).unwrap();
        let encoded = encryption_key.to_string();

        assert!(encoded.starts_with("(19095069757121805146782069263772254658294023465403171160632978"));
        assert_eq!(encoded.parse::<EncryptionKey>().unwrap(), encryption_key);
        assert_eq!(small_key().to_string(), "(15, 16)");

        let json = serde_json::to_string(&encryption_key).unwrap();
        assert_eq!(json, format!("\"{encoded}\""));
        assert_eq!(serde_json::from_str::<EncryptionKey>(&json).unwrap(), encryption_key);
    }
}
