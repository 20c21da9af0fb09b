/*
[INPUT]:  YAML configuration file or string
[OUTPUT]: Selected domain (hosts, example pair, fees) and API credentials
[POS]:    Configuration layer - startup selection of the operating domain
[UPDATE]: When adding domains or configuration options
*/

use std::fmt;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::constants::{self, DEFAULT_DOMAIN};
use crate::error::{DeribitError, Result};

/// Maker/taker fees as decimal fractions (0.001 = 0.1%)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_percent_fee_decimal: Decimal,
    pub taker_percent_fee_decimal: Decimal,
    #[serde(default = "default_fee_deducted_from_returns")]
    pub buy_percent_fee_deducted_from_returns: bool,
}

impl FeeSchedule {
    pub fn fee_for(&self, is_maker: bool) -> Decimal {
        if is_maker {
            self.maker_percent_fee_decimal
        } else {
            self.taker_percent_fee_decimal
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            maker_percent_fee_decimal: Decimal::new(1, 3),
            taker_percent_fee_decimal: Decimal::new(1, 3),
            buy_percent_fee_deducted_from_returns: true,
        }
    }
}

/// Names under which the host's secret store keeps this domain's API credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    pub api_key: String,
    pub api_secret: String,
}

impl CredentialKeys {
    fn for_connector(connector: &str) -> Self {
        Self {
            api_key: format!("{connector}_api_key"),
            api_secret: format!("{connector}_api_secret"),
        }
    }
}

/// Everything that differs between operating domains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    pub connector_name: String,
    pub domain_tag: String,
    pub example_pair: String,
    pub fees: FeeSchedule,
    pub credential_keys: CredentialKeys,
}

impl DomainConfig {
    /// The default `deribit.com` domain
    pub fn com() -> Self {
        Self {
            connector_name: "deribit".to_string(),
            domain_tag: DEFAULT_DOMAIN.to_string(),
            example_pair: "ZRX-ETH".to_string(),
            fees: FeeSchedule::default(),
            credential_keys: CredentialKeys::for_connector("deribit"),
        }
    }

    /// Regional `deribit.us` domain
    pub fn us() -> Self {
        Self {
            connector_name: "deribit_us".to_string(),
            domain_tag: "us".to_string(),
            example_pair: "BTC-USD".to_string(),
            fees: FeeSchedule::default(),
            credential_keys: CredentialKeys::for_connector("deribit_us"),
        }
    }

    /// Look up a preset by domain tag
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            DEFAULT_DOMAIN => Ok(Self::com()),
            "us" => Ok(Self::us()),
            other => Err(DeribitError::Config(format!("unknown domain: {other}"))),
        }
    }

    pub fn public_rest_url(&self, path: &str) -> Result<Url> {
        constants::public_rest_url(path, &self.domain_tag)
    }

    pub fn private_rest_url(&self, path: &str) -> Result<Url> {
        constants::private_rest_url(path, &self.domain_tag)
    }

    pub fn wss_url(&self) -> Result<Url> {
        constants::wss_url(&self.domain_tag)
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self::com()
    }
}

/// API credentials supplied by the host
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Deribit API client id
    pub api_key: String,
    /// Deribit API client secret
    pub api_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Top-level connector configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectorConfig {
    /// Domain tag: "com" or "us"
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Overrides the domain's fee schedule
    #[serde(default)]
    pub fees: Option<FeeSchedule>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            fees: None,
            credentials: None,
        }
    }
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_fee_deducted_from_returns() -> bool {
    true
}

impl ConnectorConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The selected domain with any fee override applied
    pub fn domain_config(&self) -> Result<DomainConfig> {
        let mut domain = DomainConfig::from_tag(&self.domain)?;
        if let Some(fees) = &self.fees {
            domain.fees = fees.clone();
        }
        Ok(domain)
    }

    pub fn validate(&self) -> Result<()> {
        self.domain_config()?;
        if let Some(fees) = &self.fees {
            if fees.maker_percent_fee_decimal.is_sign_negative()
                || fees.taker_percent_fee_decimal.is_sign_negative()
            {
                return Err(DeribitError::Config("fees must not be negative".to_string()));
            }
        }
        if let Some(credentials) = &self.credentials {
            if credentials.api_key.trim().is_empty() || credentials.api_secret.trim().is_empty() {
                warn!(domain = %self.domain, "credentials present but empty");
                return Err(DeribitError::Config(
                    "api_key and api_secret must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
