// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Modular arithmetic kernel: exponentiation, gcd/lcm and inversion over [`Uint`].
//!
//! Everything in here runs in variable time.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{CheckedMul, NonZero, Uint};

use crate::{Error, Result, SanityCheckError};

/// Computes $base^{exponent} \bmod modulus$ by right-to-left square-and-multiply.
///
/// `base` is reduced modulo `modulus` first and the result lies in `[0, modulus)`. Odd moduli
/// multiply in Montgomery form; even moduli fall back to shift-and-add multiplication.
pub fn modpow<const LIMBS: usize, const EXP_LIMBS: usize>(
    base: &Uint<LIMBS>,
    exponent: &Uint<EXP_LIMBS>,
    modulus: &Uint<LIMBS>,
) -> Result<Uint<LIMBS>> {
    let divisor = non_zero(modulus)?;
    if *modulus == Uint::ONE {
        return Ok(Uint::ZERO);
    }

    let base = *base % divisor;
    let exponent_bits = exponent.bits_vartime();

    if modulus.bit_vartime(0) {
        let params = DynResidueParams::new(modulus);
        let mut result = DynResidue::one(params);
        let mut power = DynResidue::new(&base, params);

        for i in 0..exponent_bits {
            if exponent.bit_vartime(i) {
                result = result * power;
            }
            power = power.square();
        }

        return Ok(result.retrieve());
    }

    let mut result = Uint::ONE;
    let mut power = base;
    for i in 0..exponent_bits {
        if exponent.bit_vartime(i) {
            result = mul_mod_vartime(&result, &power, modulus);
        }
        power = mul_mod_vartime(&power, &power, modulus);
    }

    Ok(result)
}

/// Greatest common divisor by Euclid's algorithm; `gcd(a, 0) = a`.
pub fn gcd<const LIMBS: usize>(a: &Uint<LIMBS>, b: &Uint<LIMBS>) -> Uint<LIMBS> {
    let (mut a, mut b) = (*a, *b);

    while let Some(divisor) = Option::<NonZero<Uint<LIMBS>>>::from(NonZero::new(b)) {
        let (_, remainder) = div_rem_vartime(&a, &divisor);
        a = b;
        b = remainder;
    }

    a
}

/// Least common multiple, `0` if either input is `0`.
pub fn lcm<const LIMBS: usize>(a: &Uint<LIMBS>, b: &Uint<LIMBS>) -> Result<Uint<LIMBS>> {
    if *a == Uint::ZERO || *b == Uint::ZERO {
        return Ok(Uint::ZERO);
    }

    let divisor = non_zero(&gcd(a, b))?;
    let (quotient, _) = div_rem_vartime(a, &divisor);

    Option::from(quotient.checked_mul(b)).ok_or(Error::ArithmeticOverflow)
}

/// A signed Bézout coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BezoutCoefficient<const LIMBS: usize> {
    pub magnitude: Uint<LIMBS>,
    pub is_negative: bool,
}

/// The output $(g, x, y)$ of the extended Euclidean algorithm, where $ax + by = g$.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendedGcd<const LIMBS: usize> {
    pub gcd: Uint<LIMBS>,
    pub x: BezoutCoefficient<LIMBS>,
    pub y: BezoutCoefficient<LIMBS>,
}

/// Extended Euclidean algorithm.
///
/// The coefficient sequences $s_i, t_i$ alternate in sign, so only their magnitudes are tracked:
/// $|s_{i+1}| = |s_{i-1}| + q_i |s_i|$. After $k$ division steps $s_k$ is negative iff $k$ is
/// odd, and $t_k$ is negative iff $k$ is even. Magnitudes never exceed $b / g$ (resp. $a / g$).
pub fn extended_gcd<const LIMBS: usize>(a: &Uint<LIMBS>, b: &Uint<LIMBS>) -> ExtendedGcd<LIMBS> {
    let (mut r0, mut r1) = (*a, *b);
    let (mut s0, mut s1) = (Uint::<LIMBS>::ONE, Uint::<LIMBS>::ZERO);
    let (mut t0, mut t1) = (Uint::<LIMBS>::ZERO, Uint::<LIMBS>::ONE);
    let mut steps = 0usize;

    while let Some(divisor) = Option::<NonZero<Uint<LIMBS>>>::from(NonZero::new(r1)) {
        let (quotient, remainder) = div_rem_vartime(&r0, &divisor);

        (r0, r1) = (r1, remainder);
        (s0, s1) = (s1, s0.wrapping_add(&quotient.wrapping_mul(&s1)));
        (t0, t1) = (t1, t0.wrapping_add(&quotient.wrapping_mul(&t1)));
        steps += 1;
    }

    ExtendedGcd {
        gcd: r0,
        x: BezoutCoefficient {
            magnitude: s0,
            is_negative: steps % 2 == 1 && s0 != Uint::ZERO,
        },
        y: BezoutCoefficient {
            magnitude: t0,
            is_negative: steps % 2 == 0 && t0 != Uint::ZERO,
        },
    }
}

/// The inverse of `a` modulo `m`, in `[0, m)`.
///
/// Fails with [`Error::NoModularInverse`] when $\gcd(a, m) \neq 1$.
pub fn invmod<const LIMBS: usize>(a: &Uint<LIMBS>, m: &Uint<LIMBS>) -> Result<Uint<LIMBS>> {
    let modulus = non_zero(m)?;
    let a = *a % modulus;

    let ExtendedGcd { gcd, x, .. } = extended_gcd(&a, m);
    if gcd != Uint::ONE {
        return Err(Error::NoModularInverse);
    }

    let magnitude = x.magnitude % modulus;
    if x.is_negative && magnitude != Uint::ZERO {
        Ok(m.wrapping_sub(&magnitude))
    } else {
        Ok(magnitude)
    }
}

pub(crate) fn non_zero<const LIMBS: usize>(value: &Uint<LIMBS>) -> Result<NonZero<Uint<LIMBS>>> {
    Option::from(NonZero::new(*value)).ok_or(Error::SanityCheck(SanityCheckError::ZeroModulus))
}

/// Schoolbook binary long division; runs in time proportional to the bit length of the quotient.
///
/// `Uint::div_rem` always iterates over the full width, which is too slow for Euclid's algorithm
/// on 4096-bit values.
pub(crate) fn div_rem_vartime<const LIMBS: usize>(
    dividend: &Uint<LIMBS>,
    divisor: &NonZero<Uint<LIMBS>>,
) -> (Uint<LIMBS>, Uint<LIMBS>) {
    let divisor: &Uint<LIMBS> = divisor;
    let dividend_bits = dividend.bits_vartime();
    let divisor_bits = divisor.bits_vartime();

    let mut quotient = Uint::ZERO;
    let mut remainder = *dividend;
    if dividend_bits < divisor_bits {
        return (quotient, remainder);
    }

    let mut shift = dividend_bits - divisor_bits;
    let mut shifted_divisor = divisor.shl_vartime(shift);
    loop {
        if remainder >= shifted_divisor {
            remainder = remainder.wrapping_sub(&shifted_divisor);
            quotient = quotient | Uint::ONE.shl_vartime(shift);
        }
        if shift == 0 {
            break;
        }
        shift -= 1;
        shifted_divisor = shifted_divisor.shr_vartime(1);
    }

    (quotient, remainder)
}

// Both operands must already be reduced modulo `modulus`.
fn mul_mod_vartime<const LIMBS: usize>(
    lhs: &Uint<LIMBS>,
    rhs: &Uint<LIMBS>,
    modulus: &Uint<LIMBS>,
) -> Uint<LIMBS> {
    let mut result = Uint::ZERO;
    for i in (0..rhs.bits_vartime()).rev() {
        result = result.add_mod(&result, modulus);
        if rhs.bit_vartime(i) {
            result = result.add_mod(lhs, modulus);
        }
    }

    result
}
