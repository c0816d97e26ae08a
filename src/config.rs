// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! TOML configuration.
//!
//! ```toml
//! [key_generation]
//! bits = 1024
//! miller_rabin_rounds = 16
//!
//! [risk_model]
//! feature_scale = 100
//! weight_scale = 1000
//!
//! [[risk_model.features]]
//! name = "age"
//! label = "Age"
//! weight = 0.5
//! ```
//!
//! Omitted sections and fields take their defaults.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, KeyGenerationParameters, Result, RiskModel};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub key_generation: KeyGenerationParameters,
    pub risk_model: RiskModel,
}

impl Config {
    /// Parses and validates a TOML configuration.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml).map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.key_generation.validate()?;
        self.risk_model.validate()
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Config::from_toml_str(s)
    }
}
