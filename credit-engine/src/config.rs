//! Configuration for the credit engine

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Risk scoring weights
    pub risk: RiskWeights,

    /// Credit utilization bands
    pub credit: CreditLimitConfig,

    /// Notification center windows
    pub notifications: NotificationConfig,

    /// Expected delay reported for customers with no invoices yet
    pub default_expected_delay_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk: RiskWeights::default(),
            credit: CreditLimitConfig::default(),
            notifications: NotificationConfig::default(),
            default_expected_delay_days: 7,
        }
    }
}

/// Risk score weights. Every weight must lie in 0..=100; each component
/// is capped before weighting so the raw sum stays finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    /// Points at 100% credit utilization
    pub utilization: Decimal,

    /// Extra points once utilization reaches the limit
    pub over_limit_penalty: Decimal,

    /// Flat points when any invoice is overdue
    pub overdue_presence: Decimal,

    /// Points at full overdue severity
    pub overdue_severity: Decimal,

    /// Summed days overdue that count as full severity
    pub overdue_scale_days: u32,

    /// Points at full historical payment delay
    pub payment_delay: Decimal,

    /// Average days late (on paid invoices) that count as full delay
    pub delay_scale_days: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            utilization: Decimal::from(45),
            over_limit_penalty: Decimal::from(25),
            overdue_presence: Decimal::from(15),
            overdue_severity: Decimal::from(20),
            overdue_scale_days: 90,
            payment_delay: Decimal::from(20),
            delay_scale_days: 60,
        }
    }
}

/// Credit utilization band thresholds (percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditLimitConfig {
    /// Utilization at which usage is considered moderate
    pub moderate_pct: Decimal,

    /// Utilization at which usage is considered high
    pub high_pct: Decimal,

    /// Utilization at which the limit is exceeded
    pub exceeded_pct: Decimal,
}

impl Default for CreditLimitConfig {
    fn default() -> Self {
        Self {
            moderate_pct: Decimal::from(60),
            high_pct: Decimal::from(80),
            exceeded_pct: Decimal::from(100),
        }
    }
}

/// Notification center configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Invoices due within this many days raise a due-soon alert
    pub due_soon_days: u32,

    /// Payments at most this many days old count as recent
    pub recent_payment_days: u32,

    /// How many of the latest payments are considered
    pub recent_payment_count: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            due_soon_days: 3,
            recent_payment_days: 2,
            recent_payment_count: 5,
        }
    }
}

impl EngineConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then apply `CREDIT_ENGINE_*` environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = EngineConfig::default();

        if let Some(v) = env_parse("CREDIT_ENGINE_UTILIZATION_WEIGHT")? {
            config.risk.utilization = v;
        }
        if let Some(v) = env_parse("CREDIT_ENGINE_OVER_LIMIT_PENALTY")? {
            config.risk.over_limit_penalty = v;
        }
        if let Some(v) = env_parse("CREDIT_ENGINE_OVERDUE_PRESENCE")? {
            config.risk.overdue_presence = v;
        }
        if let Some(v) = env_parse("CREDIT_ENGINE_OVERDUE_SEVERITY")? {
            config.risk.overdue_severity = v;
        }
        if let Some(v) = env_parse("CREDIT_ENGINE_PAYMENT_DELAY_WEIGHT")? {
            config.risk.payment_delay = v;
        }
        if let Some(v) = env_parse("CREDIT_ENGINE_DUE_SOON_DAYS")? {
            config.notifications.due_soon_days = v;
        }
        if let Some(v) = env_parse("CREDIT_ENGINE_DEFAULT_EXPECTED_DELAY_DAYS")? {
            config.default_expected_delay_days = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject weights and thresholds that would break score ordering
    pub fn validate(&self) -> Result<()> {
        self.risk.validate()?;

        let credit = &self.credit;
        if !(credit.moderate_pct < credit.high_pct && credit.high_pct < credit.exceeded_pct) {
            return Err(Error::InvalidConfig(format!(
                "credit bands must increase: {} < {} < {}",
                credit.moderate_pct, credit.high_pct, credit.exceeded_pct
            )));
        }

        Ok(())
    }
}

impl RiskWeights {
    /// Each weight must lie in 0..=100 and both scales must be non-zero
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("risk.utilization", self.utilization),
            ("risk.over_limit_penalty", self.over_limit_penalty),
            ("risk.overdue_presence", self.overdue_presence),
            ("risk.overdue_severity", self.overdue_severity),
            ("risk.payment_delay", self.payment_delay),
        ];
        for (name, value) in weights {
            if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                return Err(Error::InvalidConfig(format!(
                    "{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }

        if self.overdue_scale_days == 0 || self.delay_scale_days == 0 {
            return Err(Error::InvalidConfig(
                "risk scale days must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
