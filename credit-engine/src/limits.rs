//! Credit limit checking

use crate::config::CreditLimitConfig;
use crate::{Customer, EnrichedInvoice, Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Utilization band for a customer's credit line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationBand {
    /// Sufficient limit available
    Healthy,
    /// Moderate usage
    Moderate,
    /// Approaching the limit
    High,
    /// At or over the limit
    Exceeded,
}

/// Credit utilization after a prospective invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditUtilization {
    /// Exposure recomputed from open invoices
    pub current_exposure: Decimal,

    /// Exposure including the new invoice
    pub projected_exposure: Decimal,

    /// Projected exposure as a percentage of the limit
    pub utilization_pct: Decimal,

    /// Limit left after the new invoice (negative when over)
    pub remaining_limit: Decimal,

    /// Band
    pub band: UtilizationBand,
}

/// Credit limit checker
#[derive(Debug, Clone, Default)]
pub struct CreditLimitChecker {
    config: CreditLimitConfig,
}

impl CreditLimitChecker {
    /// Create new credit limit checker
    pub fn new(config: CreditLimitConfig) -> Self {
        Self { config }
    }

    /// Evaluate the customer's utilization if `new_invoice_amount` were issued.
    /// Exposure comes from the enriched invoices, never from the customer's
    /// cached `outstanding`.
    pub fn evaluate(
        &self,
        customer: &Customer,
        enriched: &[EnrichedInvoice],
        new_invoice_amount: Decimal,
    ) -> CreditUtilization {
        let current_exposure = enriched
            .iter()
            .filter(|inv| inv.invoice.customer_id == customer.id && inv.status.is_open())
            .fold(Decimal::ZERO, |acc, inv| acc.saturating_add(inv.outstanding));
        let projected_exposure =
            current_exposure.saturating_add(new_invoice_amount.max(Decimal::ZERO));

        let utilization_pct = if customer.credit_limit > Decimal::ZERO {
            projected_exposure
                .checked_div(customer.credit_limit)
                .unwrap_or(Decimal::MAX)
                .saturating_mul(Decimal::ONE_HUNDRED)
                .round_dp(2)
        } else if projected_exposure > Decimal::ZERO {
            // Any exposure against a zero limit is over the limit
            self.config.exceeded_pct
        } else {
            Decimal::ZERO
        };

        let band = if utilization_pct >= self.config.exceeded_pct {
            UtilizationBand::Exceeded
        } else if utilization_pct >= self.config.high_pct {
            UtilizationBand::High
        } else if utilization_pct >= self.config.moderate_pct {
            UtilizationBand::Moderate
        } else {
            UtilizationBand::Healthy
        };

        CreditUtilization {
            current_exposure,
            projected_exposure,
            utilization_pct,
            remaining_limit: customer.credit_limit.saturating_sub(projected_exposure),
            band,
        }
    }

    /// Fail when the new invoice would take the customer to or past the limit
    pub fn ensure_within_limit(
        &self,
        customer: &Customer,
        enriched: &[EnrichedInvoice],
        new_invoice_amount: Decimal,
    ) -> Result<CreditUtilization> {
        let utilization = self.evaluate(customer, enriched, new_invoice_amount);
        if utilization.band == UtilizationBand::Exceeded {
            return Err(Error::CreditLimitExceeded(format!(
                "Customer {} would reach {}% of credit limit {}",
                customer.id, utilization.utilization_pct, customer.credit_limit
            )));
        }
        Ok(utilization)
    }
}
