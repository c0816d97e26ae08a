// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::rand_core::CryptoRngCore;
use crypto_bigint::{Random, Uint};

/// Upper bound on the draws a rejection-sampling loop makes before giving up.
///
/// Every loop bounded by this constant accepts a draw with probability at least one half, so
/// hitting the bound signals a broken random source rather than bad luck.
pub const MAX_SAMPLING_ATTEMPTS: usize = 256;

/// Samples a uniformly random integer of at most `bits` bits.
pub(crate) fn random_bits<const LIMBS: usize>(
    bits: usize,
    rng: &mut impl CryptoRngCore,
) -> Uint<LIMBS> {
    if bits == 0 {
        return Uint::ZERO;
    }

    let bits = bits.min(Uint::<LIMBS>::BITS);
    Uint::<LIMBS>::random(rng).shr_vartime(Uint::<LIMBS>::BITS - bits)
}
