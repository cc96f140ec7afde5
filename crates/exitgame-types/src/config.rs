//! Configuration for an exit game instance.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{constants, Address, ExitGameError, Result};

/// Settings fixed when the exit game is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitGameConfig {
    /// Address that holds deposited funds in custody and is the subject
    /// state updates are committed under.
    pub plasma_address: Address,
    /// The only party allowed to commit blocks to the commitment log.
    pub operator: Address,
    /// Base dispute window in ledger-height units.
    #[serde(default = "default_dispute_period")]
    pub dispute_period: u64,
}

fn default_dispute_period() -> u64 {
    constants::DEFAULT_DISPUTE_PERIOD
}

impl Default for ExitGameConfig {
    fn default() -> Self {
        Self {
            plasma_address: Address::derive(constants::DEFAULT_PLASMA_LABEL),
            operator: Address::derive(constants::DEFAULT_OPERATOR_LABEL),
            dispute_period: constants::DEFAULT_DISPUTE_PERIOD,
        }
    }
}

impl ExitGameConfig {
    /// Check the settings make sense together.
    ///
    /// # Errors
    /// Returns [`ExitGameError::Configuration`] for a zero dispute period or
    /// an operator that is also the custody address.
    pub fn validate(&self) -> Result<()> {
        if self.dispute_period == 0 {
            return Err(ExitGameError::Configuration(
                "dispute_period must be > 0".into(),
            ));
        }
        if self.operator == self.plasma_address {
            return Err(ExitGameError::Configuration(
                "operator must differ from plasma_address".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| ExitGameError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ExitGameConfig::default();
        assert_eq!(cfg.dispute_period, 10);
        cfg.validate().unwrap();
    }

    #[test]
    fn zero_dispute_period_rejected() {
        let cfg = ExitGameConfig {
            dispute_period: 0,
            ..ExitGameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ExitGameError::Configuration(_))
        ));
    }

    #[test]
    fn operator_must_not_be_custody() {
        let addr = Address::derive("same");
        let cfg = ExitGameConfig {
            plasma_address: addr,
            operator: addr,
            dispute_period: 5,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_dispute_period_defaults() {
        let base = ExitGameConfig::default();
        let json = format!(
            r#"{{"plasma_address":{},"operator":{}}}"#,
            serde_json::to_string(&base.plasma_address).unwrap(),
            serde_json::to_string(&base.operator).unwrap(),
        );
        let cfg = ExitGameConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg, base);
    }

    #[test]
    fn json_addresses_are_hex_strings() {
        let json = format!(
            r#"{{"plasma_address":"0x{}","operator":"{}","dispute_period":3}}"#,
            "ab".repeat(20),
            "cd".repeat(20),
        );
        let cfg = ExitGameConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg.plasma_address, Address([0xab; 20]));
        assert_eq!(cfg.operator, Address([0xcd; 20]));
        assert_eq!(cfg.dispute_period, 3);

        let written = serde_json::to_string(&cfg).unwrap();
        assert!(written.contains(&format!("\"0x{}\"", "ab".repeat(20))));
        assert_eq!(ExitGameConfig::from_json_str(&written).unwrap(), cfg);
    }

    #[test]
    fn short_address_is_configuration_error() {
        let err = ExitGameConfig::from_json_str(r#"{"plasma_address":"0x12","operator":"0x34"}"#)
            .unwrap_err();
        assert!(matches!(err, ExitGameError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = ExitGameConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ExitGameError::Configuration(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ExitGameConfig::from_json_file("/nonexistent/exitgame.json").unwrap_err();
        assert!(matches!(err, ExitGameError::Io(_)));
    }
}
