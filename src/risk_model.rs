// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! A weighted risk score computed over encrypted features.
//!
//! The data owner encodes every feature at `feature_scale` and encrypts it
//! ([`RiskModel::encrypt_features`]). The aggregator, holding only the public key, raises each
//! ciphertext to its weight encoded at `weight_scale` and multiplies the results
//! ([`RiskModel::aggregate`]). The key owner decrypts the aggregate and divides by the product
//! of both scales ([`RiskModel::decrypt_score`]).

use std::collections::{BTreeMap, HashSet};

use crypto_bigint::rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encoding::{decode, encode};
use crate::{
    Ciphertext, DecryptionKey, EncryptionKey, Error, LargeBiPrimeSizedNumber, Result,
    SanityCheckError,
};

// $ 2^{64} $
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightedFeature {
    /// Key of the feature in submitted and encrypted feature maps.
    pub name: String,
    /// Human-readable name.
    #[serde(default)]
    pub label: String,
    pub weight: f64,
}

impl WeightedFeature {
    pub fn new(name: &str, label: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            weight,
        }
    }
}

/// The features of a risk score, their weights and the fixed-point scales used to encode them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskModel {
    pub feature_scale: u64,
    pub weight_scale: u64,
    pub features: Vec<WeightedFeature>,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self {
            feature_scale: 100,
            weight_scale: 1000,
            features: vec![
                WeightedFeature::new("age", "Age", 0.2),
                WeightedFeature::new("bmi", "BMI", 0.3),
                WeightedFeature::new("systolic_bp", "Systolic Blood Pressure", 0.2),
                WeightedFeature::new("diastolic_bp", "Diastolic Blood Pressure", 0.2),
                WeightedFeature::new("cholesterol", "Cholesterol", 0.1),
            ],
        }
    }
}

impl RiskModel {
    pub fn validate(&self) -> Result<()> {
        if self.feature_scale == 0 || self.weight_scale == 0 {
            return Err(SanityCheckError::InvalidScale.into());
        }
        self.combined_scale()?;

        if self.features.is_empty() {
            return Err(SanityCheckError::EmptyModel.into());
        }

        let mut names = HashSet::new();
        for feature in &self.features {
            if !names.insert(feature.name.as_str()) {
                return Err(SanityCheckError::DuplicateFeature(feature.name.clone()).into());
            }
        }

        self.integer_weights().map(|_| ())
    }

    /// The scale of a decrypted aggregate, `feature_scale * weight_scale`.
    pub fn combined_scale(&self) -> Result<u64> {
        self.feature_scale
            .checked_mul(self.weight_scale)
            .ok_or(Error::ArithmeticOverflow)
    }

    /// Every weight rounded at `weight_scale`, in feature order.
    pub fn integer_weights(&self) -> Result<Vec<u64>> {
        self.features
            .iter()
            .map(|feature| -> Result<u64> {
                let weight = (feature.weight * self.weight_scale as f64).round();
                if !weight.is_finite() || weight < 0.0 || weight >= U64_BOUND {
                    return Err(SanityCheckError::InvalidWeight(feature.name.clone()).into());
                }

                Ok(weight as u64)
            })
            .collect()
    }

    /// Encodes and encrypts one value per feature of the model.
    ///
    /// `values` must hold exactly the model's features.
    pub fn encrypt_features(
        &self,
        encryption_key: &EncryptionKey,
        values: &BTreeMap<String, f64>,
        rng: &mut impl CryptoRngCore,
    ) -> Result<BTreeMap<String, Ciphertext>> {
        self.validate()?;
        self.check_feature_names(values)?;

        let plaintexts = self
            .features
            .iter()
            .map(|feature| -> Result<LargeBiPrimeSizedNumber> {
                let value = values
                    .get(&feature.name)
                    .ok_or_else(|| SanityCheckError::MissingFeature(feature.name.clone()))?;

                encode(*value, self.feature_scale, encryption_key.n())
            })
            .collect::<Result<Vec<_>>>()?;

        let ciphertexts = encryption_key.encrypt_batch(&plaintexts, rng)?;
        info!(features = ciphertexts.len(), "encrypted risk features");

        Ok(self
            .features
            .iter()
            .map(|feature| feature.name.clone())
            .zip(ciphertexts)
            .collect())
    }

    /// Computes the encrypted risk score from encrypted features, without decrypting them.
    pub fn aggregate(
        &self,
        encryption_key: &EncryptionKey,
        encrypted_features: &BTreeMap<String, Ciphertext>,
    ) -> Result<Ciphertext> {
        self.validate()?;
        self.check_feature_names(encrypted_features)?;

        let terms = self
            .features
            .iter()
            .zip(self.integer_weights()?)
            .map(|(feature, weight)| -> Result<(Ciphertext, LargeBiPrimeSizedNumber)> {
                let ciphertext = encrypted_features
                    .get(&feature.name)
                    .ok_or_else(|| SanityCheckError::MissingFeature(feature.name.clone()))?;
                debug!(feature = %feature.name, weight, "weighting encrypted feature");

                Ok((*ciphertext, LargeBiPrimeSizedNumber::from_u64(weight)))
            })
            .collect::<Result<Vec<_>>>()?;

        encryption_key.weighted_sum(&terms)
    }

    /// Decrypts an aggregate produced by [`RiskModel::aggregate`] into the risk score.
    pub fn decrypt_score(
        &self,
        encryption_key: &EncryptionKey,
        decryption_key: &DecryptionKey,
        encrypted_score: &Ciphertext,
    ) -> Result<f64> {
        let plaintext = decryption_key.decrypt(encryption_key, encrypted_score)?;

        decode(&plaintext, self.combined_scale()?, encryption_key.n())
    }

    fn check_feature_names<T>(&self, values: &BTreeMap<String, T>) -> Result<()> {
        if let Some(feature) = self
            .features
            .iter()
            .find(|feature| !values.contains_key(&feature.name))
        {
            return Err(SanityCheckError::MissingFeature(feature.name.clone()).into());
        }

        if let Some(name) = values
            .keys()
            .find(|name| !self.features.iter().any(|feature| &feature.name == *name))
        {
            return Err(SanityCheckError::UnknownFeature(name.clone()).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;
    use rstest::rstest;

    use super::*;
    use crate::tests::{LAMBDA, MU, N};

    fn key_pair() -> (EncryptionKey, DecryptionKey) {
        (EncryptionKey::new(N).unwrap(), DecryptionKey::new(LAMBDA, MU))
    }

    fn values(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    fn patient() -> BTreeMap<String, f64> {
        values(&[
            ("age", 20.0),
            ("bmi", 28.0),
            ("systolic_bp", 120.0),
            ("diastolic_bp", 80.0),
            ("cholesterol", 20.0),
        ])
    }

    #[test]
    fn default_model_weights_and_scales() {
        let model = RiskModel::default();

        assert_eq!(model.validate(), Ok(()));
        assert_eq!(model.combined_scale(), Ok(100_000));
        assert_eq!(model.integer_weights(), Ok(vec![200, 300, 200, 200, 100]));
    }

    #[test]
    fn scores_encrypted_features() {
        let (encryption_key, decryption_key) = key_pair();
        let model = RiskModel::default();

        let encrypted_features = model
            .encrypt_features(&encryption_key, &patient(), &mut OsRng)
            .unwrap();
        assert_eq!(
            encrypted_features.keys().collect::<Vec<_>>(),
            ["age", "bmi", "cholesterol", "diastolic_bp", "systolic_bp"]
        );

        let encrypted_score = model.aggregate(&encryption_key, &encrypted_features).unwrap();

        assert_eq!(
            model.decrypt_score(&encryption_key, &decryption_key, &encrypted_score),
            Ok(54.4)
        );
    }

    #[test]
    fn scores_negative_and_fractional_features() {
        let (encryption_key, decryption_key) = key_pair();
        let model = RiskModel {
            features: vec![
                WeightedFeature::new("delta", "", 0.5),
                WeightedFeature::new("offset", "", 2.0),
            ],
            ..Default::default()
        };

        let encrypted_features = model
            .encrypt_features(
                &encryption_key,
                &values(&[("delta", -12.5), ("offset", 1.25)]),
                &mut OsRng,
            )
            .unwrap();
        let encrypted_score = model.aggregate(&encryption_key, &encrypted_features).unwrap();

        // $ -12.5 * 0.5 + 1.25 * 2 = -3.75 $
        assert_eq!(
            model.decrypt_score(&encryption_key, &decryption_key, &encrypted_score),
            Ok(-3.75)
        );
    }

    #[rstest]
    #[case(&[("age", 1.0)], SanityCheckError::MissingFeature("bmi".to_string()))]
    #[case(
        &[("age", 1.0), ("bmi", 1.0), ("systolic_bp", 1.0), ("diastolic_bp", 1.0), ("cholesterol", 1.0), ("weight", 1.0)],
        SanityCheckError::UnknownFeature("weight".to_string())
    )]
    #[case(
        &[("age", f64::NAN), ("bmi", 1.0), ("systolic_bp", 1.0), ("diastolic_bp", 1.0), ("cholesterol", 1.0)],
        SanityCheckError::NonFiniteValue
    )]
    fn rejects_mismatched_features(#[case] entries: &[(&str, f64)], #[case] expected: SanityCheckError) {
        let (encryption_key, _) = key_pair();

        assert_eq!(
            RiskModel::default().encrypt_features(&encryption_key, &values(entries), &mut OsRng),
            Err(Error::SanityCheck(expected))
        );
    }

    #[test]
    fn aggregation_requires_every_feature() {
        let (encryption_key, _) = key_pair();
        let model = RiskModel::default();
        let mut encrypted_features = model
            .encrypt_features(&encryption_key, &patient(), &mut OsRng)
            .unwrap();
        encrypted_features.remove("cholesterol");

        assert_eq!(
            model.aggregate(&encryption_key, &encrypted_features),
            Err(Error::SanityCheck(SanityCheckError::MissingFeature(
                "cholesterol".to_string()
            )))
        );
    }

    #[rstest]
    #[case(RiskModel { features: vec![], ..Default::default() }, Error::SanityCheck(SanityCheckError::EmptyModel))]
    #[case(RiskModel { feature_scale: 0, ..Default::default() }, Error::SanityCheck(SanityCheckError::InvalidScale))]
    #[case(RiskModel { feature_scale: u64::MAX, ..Default::default() }, Error::ArithmeticOverflow)]
    #[case(
        RiskModel { features: vec![WeightedFeature::new("a", "", 1.0), WeightedFeature::new("a", "", 2.0)], ..Default::default() },
        Error::SanityCheck(SanityCheckError::DuplicateFeature("a".to_string()))
    )]
    #[case(
        RiskModel { features: vec![WeightedFeature::new("a", "", -1.0)], ..Default::default() },
        Error::SanityCheck(SanityCheckError::InvalidWeight("a".to_string()))
    )]
    #[case(
        RiskModel { features: vec![WeightedFeature::new("a", "", f64::INFINITY)], ..Default::default() },
        Error::SanityCheck(SanityCheckError::InvalidWeight("a".to_string()))
    )]
    fn rejects_invalid_models(#[case] model: RiskModel, #[case] expected: Error) {
        assert_eq!(model.validate(), Err(expected));
    }
}
