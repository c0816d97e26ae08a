// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::rand_core::CryptoRngCore;
use crypto_bigint::CheckedMul;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arithmetic::{invmod, lcm, modpow};
use crate::primality::DEFAULT_MILLER_RABIN_ROUNDS;
use crate::prime_generation::generate_prime;
use crate::sampling::MAX_SAMPLING_ATTEMPTS;
use crate::{
    DecryptionKey, EncryptionKey, Error, LargeBiPrimeSizedNumber, LargePrimeSizedNumber,
    PaillierModulusSizedNumber, Result, SanityCheckError,
};

/// The smallest supported modulus size, in bits.
pub const MIN_KEY_BITS: usize = 16;
/// The largest supported modulus size, in bits.
pub const MAX_KEY_BITS: usize = LargeBiPrimeSizedNumber::BITS;

/// Parameters for [`generate_key_pair`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyGenerationParameters {
    /// Size of the modulus $N$; each prime gets half of it.
    pub bits: usize,
    pub miller_rabin_rounds: usize,
}

impl Default for KeyGenerationParameters {
    fn default() -> Self {
        Self {
            bits: 512,
            miller_rabin_rounds: DEFAULT_MILLER_RABIN_ROUNDS,
        }
    }
}

impl KeyGenerationParameters {
    pub fn validate(&self) -> Result<()> {
        if self.bits % 2 != 0 || !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&self.bits) {
            return Err(SanityCheckError::InvalidKeySize { bits: self.bits }.into());
        }
        if self.miller_rabin_rounds == 0 {
            return Err(SanityCheckError::InvalidRounds.into());
        }

        Ok(())
    }
}

/// Generates a fresh Paillier key pair with a modulus of about `parameters.bits` bits.
///
/// Draws two distinct primes of `bits / 2` bits each and hands them to [`key_pair_from_primes`].
/// The primes are dropped once the keys are derived. `bits` must be even and within
/// [`MIN_KEY_BITS`]`..=`[`MAX_KEY_BITS`] (2048), the width of the fixed-size modulus.
pub fn generate_key_pair(
    parameters: &KeyGenerationParameters,
    rng: &mut impl CryptoRngCore,
) -> Result<(EncryptionKey, DecryptionKey)> {
    parameters.validate()?;
    info!(bits = parameters.bits, "generating a Paillier key pair");

    let prime_bits = parameters.bits / 2;
    let p: LargePrimeSizedNumber =
        generate_prime(prime_bits, parameters.miller_rabin_rounds, rng)?;

    let mut q: LargePrimeSizedNumber =
        generate_prime(prime_bits, parameters.miller_rabin_rounds, rng)?;
    let mut attempts = 1;
    while q == p {
        if attempts == MAX_SAMPLING_ATTEMPTS {
            return Err(Error::RandomnessExhausted { attempts });
        }
        debug!(prime_bits, "resampling a prime equal to the first");

        q = generate_prime(prime_bits, parameters.miller_rabin_rounds, rng)?;
        attempts += 1;
    }

    let key_pair = key_pair_from_primes(&p, &q)?;
    info!(
        bits = key_pair.0.n().bits_vartime(),
        "generated a Paillier key pair"
    );

    Ok(key_pair)
}

/// Derives the key pair of the modulus $N = pq$ from the distinct primes `p` and `q`.
///
/// $ \lambda = lcm(p - 1, q - 1) $ and $ \mu = L(g^\lambda mod N^2)^{-1} mod N $. Primality is
/// not checked; a $\mu$ that does not exist is reported as [`Error::NoModularInverse`].
pub fn key_pair_from_primes(
    p: &LargePrimeSizedNumber,
    q: &LargePrimeSizedNumber,
) -> Result<(EncryptionKey, DecryptionKey)> {
    if p == q {
        return Err(SanityCheckError::IdenticalPrimes.into());
    }

    let p: LargeBiPrimeSizedNumber = p.resize();
    let q: LargeBiPrimeSizedNumber = q.resize();

    let n = Option::<LargeBiPrimeSizedNumber>::from(p.checked_mul(&q))
        .ok_or(Error::ArithmeticOverflow)?;
    let encryption_key = EncryptionKey::new(n)?;

    let lambda = lcm(
        &p.wrapping_sub(&LargeBiPrimeSizedNumber::ONE),
        &q.wrapping_sub(&LargeBiPrimeSizedNumber::ONE),
    )?;

    let x = modpow(
        &encryption_key.g().resize::<{ PaillierModulusSizedNumber::LIMBS }>(),
        &lambda,
        encryption_key.n2(),
    )?;
    let mu = invmod(&encryption_key.l_function(&x), &n)?;

    debug!(
        bits = n.bits_vartime(),
        "derived a Paillier key pair from its primes"
    );

    Ok((encryption_key, DecryptionKey::new(lambda, mu)))
}
