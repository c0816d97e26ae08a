// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Random prime generation.

use crypto_bigint::rand_core::CryptoRngCore;
use crypto_bigint::Uint;
use tracing::debug;

use crate::primality::is_probable_prime;
use crate::sampling::random_bits;
use crate::{Error, Result, SanityCheckError};

/// Upper bound on the candidates examined by [`generate_prime`].
///
/// The expected number of candidates for a $k$-bit prime is about $k \ln(2) / 2$.
pub const MAX_PRIME_CANDIDATES: usize = 1 << 20;

/// Generates a random probable prime of exactly `bits` bits.
///
/// Candidates are random `bits`-bit integers with the top bit (fixing the length) and the low
/// bit (making them odd) forced on, resubmitted to the Miller-Rabin oracle until one passes.
pub fn generate_prime<const LIMBS: usize>(
    bits: usize,
    miller_rabin_rounds: usize,
    rng: &mut impl CryptoRngCore,
) -> Result<Uint<LIMBS>> {
    if !(2..=Uint::<LIMBS>::BITS).contains(&bits) {
        return Err(SanityCheckError::InvalidPrimeSize { bits }.into());
    }

    let top_bit = Uint::<LIMBS>::ONE.shl_vartime(bits - 1);

    for attempt in 1..=MAX_PRIME_CANDIDATES {
        let candidate = random_bits::<LIMBS>(bits, rng) | top_bit | Uint::ONE;

        if is_probable_prime(&candidate, miller_rabin_rounds, rng)? {
            debug!(bits, attempt, "found a probable prime");

            return Ok(candidate);
        }
    }

    Err(Error::RandomnessExhausted {
        attempts: MAX_PRIME_CANDIDATES,
    })
}
