// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! paillier-aggregate: weighted aggregation over Paillier-encrypted features.
//!
//! Plays each party of the risk-scoring flow in turn: the key owner (`keygen`, `decrypt`), the
//! data owner (`encrypt`) and the aggregator (`aggregate`), exchanging keys and ciphertexts as
//! base-10 strings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand_core::OsRng;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use paillier_aggregate::{
    generate_key_pair, Ciphertext, Config, DecryptionKey, EncryptionKey, KeyGenerationParameters,
};

#[derive(Parser)]
#[command(name = "paillier-aggregate")]
#[command(about = "Weighted aggregation over Paillier-encrypted features")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair and print both keys as JSON
    Keygen {
        /// Modulus size in bits, overriding the configuration
        #[arg(long)]
        bits: Option<usize>,
    },
    /// Encrypt feature values and print the ciphertexts as a JSON object
    Encrypt {
        /// Public key, "(<n>, <g>)"
        #[arg(long)]
        public_key: EncryptionKey,

        /// Feature value, as name=value; repeat for every feature of the model
        #[arg(long = "feature", value_parser = parse_feature, required = true)]
        features: Vec<(String, f64)>,
    },
    /// Compute the encrypted weighted score from a JSON object of encrypted features
    Aggregate {
        /// Public key, "(<n>, <g>)"
        #[arg(long)]
        public_key: EncryptionKey,

        /// JSON file produced by `encrypt`
        #[arg(long)]
        input: PathBuf,
    },
    /// Decrypt an encrypted score
    Decrypt {
        /// Public key, "(<n>, <g>)"
        #[arg(long)]
        public_key: EncryptionKey,

        /// Private key, "(<lambda>, <mu>)"
        #[arg(long)]
        private_key: DecryptionKey,

        /// Encrypted score produced by `aggregate`
        #[arg(long)]
        ciphertext: Ciphertext,
    },
}

#[derive(Serialize)]
struct KeyPair {
    public_key: EncryptionKey,
    private_key: DecryptionKey,
}

fn parse_feature(feature: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = feature
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {feature:?}"))?;
    let value = value
        .parse()
        .map_err(|e| format!("invalid value for feature {name}: {e}"))?;

    Ok((name.to_string(), value))
}

fn collect_features(features: Vec<(String, f64)>) -> Result<BTreeMap<String, f64>> {
    let mut values = BTreeMap::new();
    for (name, value) in features {
        if values.contains_key(&name) {
            bail!("feature {name} is given more than once");
        }
        values.insert(name, value);
    }

    Ok(values)
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let toml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;

    Config::from_toml_str(&toml)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Keygen { bits } => {
            let parameters = KeyGenerationParameters {
                bits: bits.unwrap_or(config.key_generation.bits),
                ..config.key_generation
            };
            let (public_key, private_key) =
                generate_key_pair(&parameters, &mut OsRng).context("key generation failed")?;

            println!(
                "{}",
                serde_json::to_string_pretty(&KeyPair {
                    public_key,
                    private_key
                })?
            );
        }
        Command::Encrypt {
            public_key,
            features,
        } => {
            let values = collect_features(features)?;
            let encrypted_features = config
                .risk_model
                .encrypt_features(&public_key, &values, &mut OsRng)
                .context("failed to encrypt features")?;

            println!("{}", serde_json::to_string_pretty(&encrypted_features)?);
        }
        Command::Aggregate { public_key, input } => {
            let encrypted_features: BTreeMap<String, Ciphertext> = serde_json::from_str(
                &std::fs::read_to_string(&input)
                    .with_context(|| format!("failed to read {}", input.display()))?,
            )
            .with_context(|| format!("invalid encrypted features in {}", input.display()))?;

            let encrypted_score = config
                .risk_model
                .aggregate(&public_key, &encrypted_features)
                .context("failed to aggregate encrypted features")?;
            info!(features = encrypted_features.len(), "aggregated encrypted features");

            println!("{encrypted_score}");
        }
        Command::Decrypt {
            public_key,
            private_key,
            ciphertext,
        } => {
            let score = config
                .risk_model
                .decrypt_score(&public_key, &private_key, &ciphertext)
                .context("failed to decrypt the score")?;

            println!("{score}");
        }
    }

    Ok(())
}
