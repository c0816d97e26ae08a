// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Additively homomorphic Paillier encryption over fixed-width big integers.
//!
//! The crate is organized bottom-up: the modular arithmetic kernel ([`arithmetic`]) feeds the
//! Miller-Rabin oracle ([`primality`]), which drives [`prime_generation`], which in turn backs
//! key generation. [`EncryptionKey`] and [`DecryptionKey`] carry the cryptosystem operations,
//! and [`risk_model`] composes them into a weighted aggregate over encrypted features.
//!
//! Arithmetic is *not* constant-time.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{Concat, Uint, U1024};

pub mod arithmetic;
mod ciphertext;
pub mod config;
mod decryption_key;
pub mod encoding;
mod encryption_key;
mod error;
mod key_generation;
pub mod primality;
pub mod prime_generation;
pub mod risk_model;
mod sampling;
pub mod serialization;

pub use ciphertext::Ciphertext;
pub use config::Config;
pub use decryption_key::DecryptionKey;
pub use encryption_key::EncryptionKey;
pub use error::{Error, ParseError, Result, SanityCheckError};
pub use key_generation::{
    generate_key_pair, key_pair_from_primes, KeyGenerationParameters, MAX_KEY_BITS, MIN_KEY_BITS,
};
pub use risk_model::{RiskModel, WeightedFeature};
pub use sampling::MAX_SAMPLING_ATTEMPTS;

/* Types & Trait (impls) around `crypto_bigint` for internal use */

/// Holds one of the two secret primes $p, q$.
pub type LargePrimeSizedNumber = U1024;
/// Holds the modulus $N$ along with plaintexts, randomizers, $\lambda$ and $\mu$.
pub type LargeBiPrimeSizedNumber = <LargePrimeSizedNumber as Concat>::Output;
/// Holds $N^2$ and ciphertexts.
pub type PaillierModulusSizedNumber = <LargeBiPrimeSizedNumber as Concat>::Output;
pub(crate) type PaillierRingElement = DynResidue<{ PaillierModulusSizedNumber::LIMBS }>;

pub(crate) trait AsNaturalNumber<const LIMBS: usize> {
    fn as_natural_number(&self) -> Uint<LIMBS>;
}

pub(crate) trait AsRingElement<const LIMBS: usize> {
    /// Lifts `self` into the ring of integers modulo the odd modulus `n`.
    fn as_ring_element(&self, n: &Uint<LIMBS>) -> DynResidue<LIMBS>;
}

impl<const LIMBS: usize> AsNaturalNumber<LIMBS> for DynResidue<LIMBS> {
    fn as_natural_number(&self) -> Uint<LIMBS> {
        self.retrieve()
    }
}

impl<const LIMBS: usize> AsRingElement<LIMBS> for Uint<LIMBS> {
    fn as_ring_element(&self, n: &Uint<LIMBS>) -> DynResidue<LIMBS> {
        let ring_params = DynResidueParams::new(n);
        DynResidue::new(self, ring_params)
    }
}
