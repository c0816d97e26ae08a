// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Fixed-point encoding of real values into the plaintext space $\mathbb{Z}_N$.
//!
//! A value $v$ is encoded as $round(v * scale)$, with negative values represented by $N - |x|$.
//! Decoding reads plaintexts above $\lfloor N / 2 \rfloor$ as negative and divides by the scale,
//! so sums and integer multiples of encodings decode correctly as long as they stay within
//! $[-\lfloor N / 2 \rfloor, \lfloor N / 2 \rfloor]$.

use crypto_bigint::Limb;

use crate::{LargeBiPrimeSizedNumber, Result, SanityCheckError};

// $ 2^{128} $, the first magnitude that does not fit a `u128`.
const U128_BOUND: f64 = 340_282_366_920_938_463_463_374_607_431_768_211_456.0;

/// Encodes `value` at the fixed-point `scale` as a plaintext modulo `n`.
pub fn encode(value: f64, scale: u64, n: &LargeBiPrimeSizedNumber) -> Result<LargeBiPrimeSizedNumber> {
    if scale == 0 {
        return Err(SanityCheckError::InvalidScale.into());
    }
    if !value.is_finite() {
        return Err(SanityCheckError::NonFiniteValue.into());
    }

    let scaled = (value * scale as f64).round();
    if !scaled.is_finite() || scaled.abs() >= U128_BOUND {
        return Err(SanityCheckError::ValueOutOfRange.into());
    }

    let magnitude = LargeBiPrimeSizedNumber::from_u128(scaled.abs() as u128);
    if magnitude > n.shr_vartime(1) {
        return Err(SanityCheckError::ValueOutOfRange.into());
    }

    if scaled < 0.0 && magnitude != LargeBiPrimeSizedNumber::ZERO {
        Ok(n.wrapping_sub(&magnitude))
    } else {
        Ok(magnitude)
    }
}

/// Decodes a plaintext modulo `n` produced at the fixed-point `scale`.
///
/// Fails with [`SanityCheckError::ValueOutOfRange`] when the signed magnitude exceeds 128 bits.
pub fn decode(plaintext: &LargeBiPrimeSizedNumber, scale: u64, n: &LargeBiPrimeSizedNumber) -> Result<f64> {
    if scale == 0 {
        return Err(SanityCheckError::InvalidScale.into());
    }
    if plaintext >= n {
        return Err(SanityCheckError::PlaintextOutOfRange.into());
    }

    let is_negative = *plaintext > n.shr_vartime(1);
    let magnitude = if is_negative {
        n.wrapping_sub(plaintext)
    } else {
        *plaintext
    };

    if magnitude.bits_vartime() > u128::BITS as usize {
        return Err(SanityCheckError::ValueOutOfRange.into());
    }
    let magnitude = magnitude
        .as_words()
        .iter()
        .rev()
        .fold(0u128, |acc, &word| (acc << Limb::BITS) | u128::from(word));
    let magnitude = magnitude as f64 / scale as f64;

    Ok(if is_negative { -magnitude } else { magnitude })
}
