// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("failed to parse input: {0}")]
    Parse(#[from] ParseError),
    #[error("the following sanity-check error occurred: {0}")]
    SanityCheck(#[from] SanityCheckError),
    #[error("no modular inverse exists")]
    NoModularInverse,
    #[error("rejection sampling did not produce a valid value after {attempts} attempts")]
    RandomnessExhausted { attempts: usize },
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty number")]
    Empty,
    #[error("invalid decimal digit")]
    InvalidDigit,
    #[error("number does not fit in {bits} bits")]
    Overflow { bits: usize },
    #[error("expected a pair of the form \"(<a>, <b>)\"")]
    MalformedPair,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SanityCheckError {
    #[error("modulus must be non-zero")]
    ZeroModulus,
    #[error("invalid Paillier modulus")]
    InvalidModulus,
    #[error("generator must equal N + 1")]
    InvalidGenerator,
    #[error("the two primes must be distinct")]
    IdenticalPrimes,
    #[error("unsupported key size of {bits} bits")]
    InvalidKeySize { bits: usize },
    #[error("unsupported prime size of {bits} bits")]
    InvalidPrimeSize { bits: usize },
    #[error("Miller-Rabin needs at least one round")]
    InvalidRounds,
    #[error("plaintext is outside of [0, N)")]
    PlaintextOutOfRange,
    #[error("ciphertext is outside of [0, N^2)")]
    CiphertextOutOfRange,
    #[error("randomness is outside of (0, N)")]
    RandomnessOutOfRange,
    #[error("value is not a finite number")]
    NonFiniteValue,
    #[error("encoded value does not fit the plaintext space")]
    ValueOutOfRange,
    #[error("scale must be positive")]
    InvalidScale,
    #[error("weight of feature {0} must be finite and non-negative")]
    InvalidWeight(String),
    #[error("the risk model has no features")]
    EmptyModel,
    #[error("feature {0} is declared more than once")]
    DuplicateFeature(String),
    #[error("missing value for feature {0}")]
    MissingFeature(String),
    #[error("unknown feature {0}")]
    UnknownFeature(String),
}

pub type Result<T> = std::result::Result<T, Error>;
