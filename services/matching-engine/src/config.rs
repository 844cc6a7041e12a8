//! Engine configuration
//!
//! Limits, fee percentages and the vesting schedule. Configuration is
//! plain data with serde support; `validate` reports every problem at once
//! so a bad file can be fixed in one pass.

use chrono::Duration;
use esop_types::fee::{FeeRate, FeeSchedule};
use esop_types::numeric::{Amount, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest supported vesting cycle (100 years)
pub const MAX_CYCLE_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Undrained events kept by default
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 10_000;

fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}

/// Configuration errors, one reason per problem found
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration: {}", .reasons.join("; "))]
pub struct ConfigError {
    pub reasons: Vec<String>,
}

/// Inclusive range for currency values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: Amount,
    pub max: Amount,
}

impl AmountRange {
    pub fn contains(&self, value: &Amount) -> bool {
        &self.min <= value && value <= &self.max
    }
}

/// Inclusive range for unit counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRange {
    pub min: Quantity,
    pub max: Quantity,
}

impl QuantityRange {
    pub fn contains(&self, value: &Quantity) -> bool {
        &self.min <= value && value <= &self.max
    }
}

/// Platform fee percentages (0-100, two decimal places) per ESOP class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub normal: Decimal,
    pub performance: Decimal,
}

/// Vesting schedule for NORMAL units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingConfig {
    /// Share of each lot released per cycle; positive, summing to 1
    pub breakup: Vec<Decimal>,
    /// Length of one vesting cycle, in seconds
    pub cycle_duration_secs: u64,
}

impl VestingConfig {
    pub fn cycle_duration(&self) -> Duration {
        // Clamped so the conversion cannot overflow on unvalidated input
        let secs = self.cycle_duration_secs.min(MAX_CYCLE_DURATION_SECS);
        Duration::seconds(secs as i64)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub wallet_limit: AmountRange,
    pub inventory_limit: QuantityRange,
    pub fees: FeeConfig,
    pub vesting: VestingConfig,
    /// Most undrained events retained; 0 turns the event log off
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let ceiling: u64 = 10_000_000_000;
        let limit = Amount::from_u64(ceiling).as_biguint() * Amount::from_u64(ceiling).as_biguint();
        Self {
            wallet_limit: AmountRange {
                min: Amount::zero(),
                max: Amount::from_biguint(limit.clone()),
            },
            inventory_limit: QuantityRange {
                min: Quantity::zero(),
                max: Quantity::from_biguint(limit),
            },
            fees: FeeConfig {
                normal: Decimal::new(300, 2),
                performance: Decimal::new(200, 2),
            },
            vesting: VestingConfig {
                breakup: vec![
                    Decimal::new(3, 1),
                    Decimal::new(2, 1),
                    Decimal::new(1, 1),
                    Decimal::new(4, 1),
                ],
                cycle_duration_secs: 0,
            },
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw).map_err(|e| ConfigError {
            reasons: vec![format!("could not parse configuration: {e}")],
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every constraint, collecting all violations
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut reasons = Vec::new();

        if self.wallet_limit.min > self.wallet_limit.max {
            reasons.push("wallet_limit.min must not exceed wallet_limit.max".to_string());
        }
        if self.inventory_limit.min > self.inventory_limit.max {
            reasons.push("inventory_limit.min must not exceed inventory_limit.max".to_string());
        }

        for (name, percent) in [("fees.normal", self.fees.normal), ("fees.performance", self.fees.performance)] {
            if FeeRate::from_percent(percent).is_none() {
                reasons.push(format!("{name} must be between 0 and 100"));
            } else if percent.normalize().scale() > 2 {
                reasons.push(format!("{name} allows at most two decimal places"));
            }
        }

        let breakup = &self.vesting.breakup;
        if breakup.is_empty() {
            reasons.push("vesting.breakup must not be empty".to_string());
        } else {
            if breakup.iter().any(|ratio| *ratio <= Decimal::ZERO) {
                reasons.push("vesting.breakup ratios must be positive".to_string());
            }
            let sum: Decimal = breakup.iter().copied().sum();
            if sum != Decimal::ONE {
                reasons.push(format!("vesting.breakup must sum to 1 (got {sum})"));
            }
        }
        if self.vesting.cycle_duration_secs > MAX_CYCLE_DURATION_SECS {
            reasons.push(format!(
                "vesting.cycle_duration_secs must be at most {MAX_CYCLE_DURATION_SECS}"
            ));
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { reasons })
        }
    }

    /// Fee schedule derived from the configured percentages
    pub fn fee_schedule(&self) -> Result<FeeSchedule, ConfigError> {
        let rate = |name: &str, percent: Decimal| {
            FeeRate::from_percent(percent).ok_or_else(|| ConfigError {
                reasons: vec![format!("{name} must be between 0 and 100")],
            })
        };
        Ok(FeeSchedule {
            normal: rate("fees.normal", self.fees.normal)?,
            performance: rate("fees.performance", self.fees.performance)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wallet_limit.max.to_string(), "100000000000000000000");

        let fees = config.fee_schedule().unwrap();
        assert_eq!(fees.normal.basis_points(), 300);
        assert_eq!(fees.performance.basis_points(), 200);
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let mut config = EngineConfig::default();
        config.wallet_limit.min = Amount::from_u64(10);
        config.wallet_limit.max = Amount::from_u64(5);
        config.fees.normal = Decimal::new(101, 0);
        config.fees.performance = Decimal::new(1234, 3);
        config.vesting.breakup = vec![Decimal::new(5, 1), Decimal::new(-1, 1)];

        let err = config.validate().unwrap_err();
        assert_eq!(err.reasons.len(), 5, "{:?}", err.reasons);
        assert!(err.reasons.iter().any(|r| r.contains("wallet_limit")));
        assert!(err.reasons.iter().any(|r| r.contains("fees.normal")));
        assert!(err.reasons.iter().any(|r| r.contains("two decimal places")));
        assert!(err.reasons.iter().any(|r| r.contains("positive")));
        assert!(err.reasons.iter().any(|r| r.contains("sum to 1")));
    }

    #[test]
    fn test_empty_breakup_rejected() {
        let mut config = EngineConfig::default();
        config.vesting.breakup.clear();
        let err = config.validate().unwrap_err();
        assert_eq!(err.reasons, vec!["vesting.breakup must not be empty".to_string()]);
    }

    #[test]
    fn test_from_json_str() {
        let raw = r#"{
            "wallet_limit": { "min": "0", "max": "1000000" },
            "inventory_limit": { "min": "1", "max": "5000" },
            "fees": { "normal": "2.50", "performance": "1" },
            "vesting": { "breakup": ["0.25", "0.25", "0.5"], "cycle_duration_secs": 60 }
        }"#;

        let config = EngineConfig::from_json_str(raw).unwrap();
        assert_eq!(config.wallet_limit.max, Amount::from_u64(1_000_000));
        assert_eq!(config.fee_schedule().unwrap().normal.basis_points(), 250);
        assert_eq!(config.vesting.cycle_duration(), Duration::seconds(60));
        assert_eq!(config.event_log_capacity, DEFAULT_EVENT_LOG_CAPACITY);
    }

    #[test]
    fn test_from_json_str_reports_parse_errors() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.reasons[0].starts_with("could not parse configuration"));
    }

    #[test]
    fn test_ranges() {
        let range = QuantityRange {
            min: Quantity::from_u64(1),
            max: Quantity::from_u64(10),
        };
        assert!(range.contains(&Quantity::from_u64(1)));
        assert!(range.contains(&Quantity::from_u64(10)));
        assert!(!range.contains(&Quantity::zero()));
        assert!(!range.contains(&Quantity::from_u64(11)));
    }
}
