//! Customer risk scoring engine
//!
//! Scores a customer from their enriched invoices and payment history.
//! The score is a weighted sum of four signals, clamped to 0-100:
//!
//! - credit utilization (recomputed exposure / credit limit)
//! - presence of overdue invoices
//! - overdue severity (summed days overdue)
//! - historical lateness on invoices already paid

use crate::config::{EngineConfig, RiskWeights};
use crate::error::Result;
use crate::dates::days_between;
use crate::{
    Customer, CustomerId, EnrichedInvoice, InvoiceId, InvoiceStatus, Payment, RiskLevel, RiskScore,
};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Map a score onto its risk level
pub fn get_risk_level(score: RiskScore) -> RiskLevel {
    RiskLevel::from(score)
}

/// One weighted contribution to a risk score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Factor name
    pub name: String,

    /// Maximum points this factor can contribute
    pub weight: Decimal,

    /// Points actually contributed
    pub score: Decimal,

    /// Human-readable explanation
    pub reason: String,
}

/// Full risk picture for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRiskProfile {
    /// Customer ID
    pub customer_id: CustomerId,

    /// Customer name
    pub name: String,

    /// Risk score
    pub risk_score: RiskScore,

    /// Risk level
    pub risk_level: RiskLevel,

    /// Score breakdown
    pub factors: Vec<RiskFactor>,

    /// Exposure recomputed from invoices
    pub outstanding: Decimal,

    /// Credit limit
    pub credit_limit: Decimal,

    /// Number of invoices on file
    pub total_invoices: usize,

    /// Number of invoices currently overdue
    pub overdue_invoices: usize,

    /// Percentage of invoices fully paid
    pub on_time_rate: u8,

    /// Average days overdue across currently overdue invoices
    pub avg_delay_days: u32,

    /// Delay expected on the next invoice
    pub expected_delay_days: u32,

    /// Confidence in the prediction (percent)
    pub prediction_confidence: u8,

    /// Summary of payment behavior
    pub payment_behavior: String,

    /// Suggested actions
    pub recommendations: Vec<String>,
}

/// Raw signals gathered for one customer
#[derive(Debug, Default)]
struct Signals {
    invoice_count: usize,
    paid_count: usize,
    exposure: Decimal,
    overdue_count: usize,
    total_days_overdue: u64,
    avg_paid_delay: Option<Decimal>,
}

/// Risk scorer
#[derive(Debug, Clone)]
pub struct RiskScorer {
    weights: RiskWeights,
    default_expected_delay_days: u32,
}

impl RiskScorer {
    /// Create new risk scorer, rejecting weights outside 0..=100
    pub fn new(weights: RiskWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            default_expected_delay_days: EngineConfig::default().default_expected_delay_days,
        })
    }

    /// Create a scorer from the engine configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            weights: config.risk.clone(),
            default_expected_delay_days: config.default_expected_delay_days,
        })
    }

    /// Score a customer. Invoices and payments belonging to other customers
    /// are ignored, so the full sets can be passed in.
    pub fn calculate_risk_score(
        &self,
        customer: &Customer,
        enriched: &[EnrichedInvoice],
        payments: &[Payment],
    ) -> RiskScore {
        let signals = gather_signals(customer, enriched, payments);
        self.score_signals(customer, &signals).0
    }

    /// Expected payment delay in days for the customer's next invoice
    pub fn calculate_expected_delay(&self, customer: &Customer, enriched: &[EnrichedInvoice]) -> u32 {
        let mut count = 0usize;
        let mut overdue_count = 0u64;
        let mut total_days = 0u64;

        for inv in customer_invoices(customer, enriched) {
            count += 1;
            if inv.status == InvoiceStatus::Overdue {
                overdue_count += 1;
                total_days = total_days.saturating_add(u64::from(inv.days_overdue));
            }
        }

        if count == 0 {
            return self.default_expected_delay_days;
        }
        rounded_average(total_days, overdue_count)
    }

    /// Score, level and supporting detail for one customer
    pub fn assess_customer(
        &self,
        customer: &Customer,
        enriched: &[EnrichedInvoice],
        payments: &[Payment],
    ) -> CustomerRiskProfile {
        let signals = gather_signals(customer, enriched, payments);
        let (risk_score, factors) = self.score_signals(customer, &signals);
        let risk_level = get_risk_level(risk_score);

        let avg_delay_days = rounded_average(signals.total_days_overdue, signals.overdue_count as u64);
        let on_time_rate = if signals.invoice_count == 0 {
            100
        } else {
            let pct = Decimal::from(signals.paid_count * 100) / Decimal::from(signals.invoice_count);
            round_to_u8(pct)
        };
        let prediction_confidence = signals.invoice_count.saturating_mul(2).saturating_add(60).min(95) as u8;

        let payment_behavior = if signals.overdue_count > 0 {
            format!(
                "Currently has {} overdue invoice(s). Average delay of {} days.",
                signals.overdue_count, avg_delay_days
            )
        } else if signals.paid_count > 0 {
            "Good payment history. Consistently pays on time.".to_string()
        } else {
            "New customer with limited payment history.".to_string()
        };

        let recommendations = vec![
            if risk_level == RiskLevel::High {
                "Reduce credit limit and require advance payments".to_string()
            } else {
                "Maintain current credit terms".to_string()
            },
            if signals.overdue_count > 0 {
                format!("Follow up on {} overdue invoice(s)", signals.overdue_count)
            } else {
                "Send payment reminders before due date".to_string()
            },
            if risk_level == RiskLevel::Low {
                "Consider increasing credit limit".to_string()
            } else {
                "Monitor payment patterns closely".to_string()
            },
        ];

        CustomerRiskProfile {
            customer_id: customer.id.clone(),
            name: customer.name.clone(),
            risk_score,
            risk_level,
            factors,
            outstanding: signals.exposure,
            credit_limit: customer.credit_limit,
            total_invoices: signals.invoice_count,
            overdue_invoices: signals.overdue_count,
            on_time_rate,
            avg_delay_days,
            expected_delay_days: self.calculate_expected_delay(customer, enriched),
            prediction_confidence,
            payment_behavior,
            recommendations,
        }
    }

    fn score_signals(&self, customer: &Customer, signals: &Signals) -> (RiskScore, Vec<RiskFactor>) {
        let w = &self.weights;
        let mut factors = Vec::new();

        if signals.invoice_count == 0 {
            return (RiskScore::MIN, factors);
        }

        // No usable limit: any exposure at all is maximum risk
        if customer.credit_limit <= Decimal::ZERO && signals.exposure > Decimal::ZERO {
            factors.push(RiskFactor {
                name: "Credit Utilization".to_string(),
                weight: Decimal::ONE_HUNDRED,
                score: Decimal::ONE_HUNDRED,
                reason: format!("Outstanding {} against no credit limit", signals.exposure),
            });
            return (RiskScore::MAX, factors);
        }

        let utilization = if customer.credit_limit <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            signals
                .exposure
                .checked_div(customer.credit_limit)
                .unwrap_or(Decimal::MAX)
        };
        let mut utilization_points = utilization.min(Decimal::ONE).saturating_mul(w.utilization);
        if utilization >= Decimal::ONE {
            utilization_points = utilization_points.saturating_add(w.over_limit_penalty);
        }
        factors.push(RiskFactor {
            name: "Credit Utilization".to_string(),
            weight: w.utilization.saturating_add(w.over_limit_penalty),
            score: utilization_points,
            reason: format!(
                "Outstanding {} of {} limit",
                signals.exposure, customer.credit_limit
            ),
        });

        let presence_points = if signals.overdue_count > 0 {
            w.overdue_presence
        } else {
            Decimal::ZERO
        };
        let severity = capped_ratio(
            Decimal::from(signals.total_days_overdue),
            w.overdue_scale_days,
        );
        let severity_points = severity.saturating_mul(w.overdue_severity);
        factors.push(RiskFactor {
            name: "Overdue Invoices".to_string(),
            weight: w.overdue_presence.saturating_add(w.overdue_severity),
            score: presence_points.saturating_add(severity_points),
            reason: format!(
                "{} overdue invoice(s), {} total days overdue",
                signals.overdue_count, signals.total_days_overdue
            ),
        });

        let avg_delay = signals.avg_paid_delay.unwrap_or(Decimal::ZERO);
        let delay_points = capped_ratio(avg_delay, w.delay_scale_days).saturating_mul(w.payment_delay);
        factors.push(RiskFactor {
            name: "Payment History".to_string(),
            weight: w.payment_delay,
            score: delay_points,
            reason: match signals.avg_paid_delay {
                Some(days) => format!(
                    "Paid invoices settled {} days late on average",
                    days.round_dp(1)
                ),
                None => "No settled invoices yet".to_string(),
            },
        });

        let total = [presence_points, severity_points, delay_points]
            .into_iter()
            .fold(utilization_points, Decimal::saturating_add);
        let score = RiskScore::new(round_to_u8(total.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)));

        debug!(
            customer_id = %customer.id,
            %utilization,
            overdue = signals.overdue_count,
            score = score.score(),
            "risk score calculated"
        );

        (score, factors)
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            default_expected_delay_days: EngineConfig::default().default_expected_delay_days,
        }
    }
}

fn customer_invoices<'a>(
    customer: &'a Customer,
    enriched: &'a [EnrichedInvoice],
) -> impl Iterator<Item = &'a EnrichedInvoice> + 'a {
    enriched
        .iter()
        .filter(move |inv| inv.invoice.customer_id == customer.id)
}

fn gather_signals(customer: &Customer, enriched: &[EnrichedInvoice], payments: &[Payment]) -> Signals {
    let mut signals = Signals::default();

    for inv in customer_invoices(customer, enriched) {
        signals.invoice_count += 1;
        match inv.status {
            InvoiceStatus::Paid => signals.paid_count += 1,
            InvoiceStatus::Overdue => {
                signals.overdue_count += 1;
                signals.total_days_overdue = signals
                    .total_days_overdue
                    .saturating_add(u64::from(inv.days_overdue));
                signals.exposure = signals.exposure.saturating_add(inv.outstanding);
            }
            InvoiceStatus::Pending | InvoiceStatus::Partial => {
                signals.exposure = signals.exposure.saturating_add(inv.outstanding);
            }
        }
    }

    let delays = paid_invoice_delays(customer_invoices(customer, enriched), payments);
    if !delays.is_empty() {
        let total = delays.iter().fold(0u64, |acc, d| acc.saturating_add(*d));
        signals.avg_paid_delay = Some(Decimal::from(total) / Decimal::from(delays.len()));
    }

    signals
}

/// Days between due date and last dated payment for each paid invoice,
/// floored at 0. Paid invoices without a due date or a dated payment are
/// skipped. Output follows invoice order.
pub fn paid_invoice_delays<'a, I>(invoices: I, payments: &[Payment]) -> Vec<u64>
where
    I: IntoIterator<Item = &'a EnrichedInvoice>,
{
    let paid: Vec<(&InvoiceId, NaiveDate)> = invoices
        .into_iter()
        .filter(|inv| inv.status == InvoiceStatus::Paid)
        .filter_map(|inv| inv.invoice.due_date.map(|due| (&inv.invoice.id, due)))
        .collect();
    if paid.is_empty() {
        return Vec::new();
    }

    let mut last_payment: HashMap<&InvoiceId, NaiveDate> = HashMap::new();
    for p in payments {
        if let Some(date) = p.payment_date {
            last_payment
                .entry(&p.invoice_id)
                .and_modify(|d| *d = (*d).max(date))
                .or_insert(date);
        }
    }

    paid.iter()
        .filter_map(|(id, due)| {
            last_payment
                .get(*id)
                .map(|last| days_between(*due, *last).max(0) as u64)
        })
        .collect()
}

fn capped_ratio(value: Decimal, scale_days: u32) -> Decimal {
    if scale_days == 0 {
        return Decimal::ZERO;
    }
    (value / Decimal::from(scale_days)).min(Decimal::ONE)
}

fn rounded_average(total: u64, count: u64) -> u32 {
    if count == 0 {
        return 0;
    }
    (Decimal::from(total) / Decimal::from(count))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}

fn round_to_u8(value: Decimal) -> u8 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
        .unwrap_or(u8::MAX)
}
