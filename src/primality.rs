// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Miller-Rabin probabilistic primality testing.

use crypto_bigint::rand_core::CryptoRngCore;
use crypto_bigint::{Limb, NonZero, Uint};

use crate::arithmetic::modpow;
use crate::sampling::{random_bits, MAX_SAMPLING_ATTEMPTS};
use crate::{Error, Result, SanityCheckError};

/// Rounds giving a false-positive probability of at most $4^{-8}$.
pub const DEFAULT_MILLER_RABIN_ROUNDS: usize = 8;

/// Primes used for trial division ahead of the Miller-Rabin rounds.
pub const SMALL_PRIMES: [u8; 10] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29];

/// Tests `candidate` for primality.
///
/// Composites are rejected with certainty when a small prime divides them, and otherwise with
/// probability at least $1 - 4^{-rounds}$. Witnesses are drawn uniformly from $[2, n - 2]$.
pub fn is_probable_prime<const LIMBS: usize>(
    candidate: &Uint<LIMBS>,
    rounds: usize,
    rng: &mut impl CryptoRngCore,
) -> Result<bool> {
    if rounds == 0 {
        return Err(SanityCheckError::InvalidRounds.into());
    }
    if *candidate < Uint::from_u8(2) {
        return Ok(false);
    }

    for small_prime in SMALL_PRIMES {
        let divisor = NonZero::new(Limb::from_u8(small_prime));
        let Some(divisor) = Option::<NonZero<Limb>>::from(divisor) else {
            continue;
        };
        let (_, remainder) = candidate.div_rem_limb(divisor);
        if remainder == Limb::ZERO {
            return Ok(*candidate == Uint::from_u8(small_prime));
        }
    }

    // $ n - 1 = d * 2^s $
    let candidate_minus_one = candidate.wrapping_sub(&Uint::ONE);
    let mut s = 0;
    while !candidate_minus_one.bit_vartime(s) {
        s += 1;
    }
    let d = candidate_minus_one.shr_vartime(s);
    let two = Uint::<LIMBS>::from_u8(2);

    'rounds: for _ in 0..rounds {
        let witness = sample_witness(candidate, rng)?;

        let mut x = modpow(&witness, &d, candidate)?;
        if x == Uint::ONE || x == candidate_minus_one {
            continue;
        }

        for _ in 1..s {
            x = modpow(&x, &two, candidate)?;
            if x == candidate_minus_one {
                continue 'rounds;
            }
        }

        return Ok(false);
    }

    Ok(true)
}

/// Draws a witness uniformly from $[2, n - 2]$ for an odd `candidate` $n > 29$.
fn sample_witness<const LIMBS: usize>(
    candidate: &Uint<LIMBS>,
    rng: &mut impl CryptoRngCore,
) -> Result<Uint<LIMBS>> {
    let lower_bound = Uint::<LIMBS>::from_u8(2);
    let upper_bound = candidate.wrapping_sub(&lower_bound);
    let bits = candidate.bits_vartime();

    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        let witness = random_bits(bits, rng);
        if witness >= lower_bound && witness <= upper_bound {
            return Ok(witness);
        }
    }

    Err(Error::RandomnessExhausted {
        attempts: MAX_SAMPLING_ATTEMPTS,
    })
}
