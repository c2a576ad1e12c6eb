//! Portfolio-wide dashboard metrics

use crate::dates::days_between;
use crate::scoring::{paid_invoice_delays, RiskScorer};
use crate::{Customer, EnrichedInvoice, InvoiceId, InvoiceStatus, Payment, RiskLevel};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Share of high-risk exposure expected to go bad
const BAD_DEBT_RATIO: Decimal = dec!(0.3);

/// Customer count per risk level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    /// Low risk customers
    pub low: usize,
    /// Medium risk customers
    pub medium: usize,
    /// High risk customers
    pub high: usize,
}

/// Dashboard summary across every customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Outstanding across all open invoices
    pub total_outstanding: Decimal,

    /// Invoices with a positive outstanding balance
    pub open_invoice_count: usize,

    /// Overdue invoices
    pub overdue_count: usize,

    /// Outstanding on overdue invoices
    pub overdue_amount: Decimal,

    /// Payments received against known invoices
    pub total_collected: Decimal,

    /// Percentage of invoices fully paid (one decimal place)
    pub collection_efficiency_pct: Decimal,

    /// Average days between due date and final payment on paid invoices
    pub avg_payment_delay_days: u32,

    /// Customers per risk level
    pub risk_distribution: RiskDistribution,

    /// Expected loss on high-risk customers' outstanding
    pub bad_debt_forecast: Decimal,
}

impl PortfolioSummary {
    /// Compute the summary from enriched invoices
    pub fn compute(
        customers: &[Customer],
        enriched: &[EnrichedInvoice],
        payments: &[Payment],
        scorer: &RiskScorer,
    ) -> Self {
        let mut total_outstanding = Decimal::ZERO;
        let mut open_invoice_count = 0;
        let mut overdue_count = 0;
        let mut overdue_amount = Decimal::ZERO;
        let mut paid_count = 0usize;

        for inv in enriched {
            if inv.status.is_open() && inv.outstanding > Decimal::ZERO {
                total_outstanding = total_outstanding.saturating_add(inv.outstanding);
                open_invoice_count += 1;
            }
            match inv.status {
                InvoiceStatus::Overdue => {
                    overdue_count += 1;
                    overdue_amount = overdue_amount.saturating_add(inv.outstanding);
                }
                InvoiceStatus::Paid => paid_count += 1,
                InvoiceStatus::Pending | InvoiceStatus::Partial => {}
            }
        }

        let known: HashSet<&InvoiceId> = enriched.iter().map(|inv| &inv.invoice.id).collect();
        let total_collected = payments
            .iter()
            .filter(|p| known.contains(&p.invoice_id))
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.amount));

        let collection_efficiency_pct = if enriched.is_empty() {
            Decimal::ZERO
        } else {
            (Decimal::from(paid_count * 100) / Decimal::from(enriched.len()))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };

        let mut risk_distribution = RiskDistribution::default();
        let mut high_risk_outstanding = Decimal::ZERO;
        for customer in customers {
            let profile = scorer.assess_customer(customer, enriched, payments);
            match profile.risk_level {
                RiskLevel::Low => risk_distribution.low += 1,
                RiskLevel::Medium => risk_distribution.medium += 1,
                RiskLevel::High => {
                    risk_distribution.high += 1;
                    high_risk_outstanding = high_risk_outstanding.saturating_add(profile.outstanding);
                }
            }
        }

        let summary = Self {
            total_outstanding,
            open_invoice_count,
            overdue_count,
            overdue_amount,
            total_collected,
            collection_efficiency_pct,
            avg_payment_delay_days: average_payment_delay(enriched, payments),
            risk_distribution,
            bad_debt_forecast: high_risk_outstanding.saturating_mul(BAD_DEBT_RATIO).round_dp(2),
        };

        info!(
            outstanding = %summary.total_outstanding,
            overdue = summary.overdue_count,
            high_risk = summary.risk_distribution.high,
            "portfolio summary computed"
        );

        summary
    }
}

/// Open, not-yet-overdue invoices due within `within_days`, soonest first
pub fn upcoming_payments(
    enriched: &[EnrichedInvoice],
    as_of: NaiveDate,
    within_days: u32,
) -> Vec<EnrichedInvoice> {
    let mut upcoming: Vec<EnrichedInvoice> = enriched
        .iter()
        .filter(|inv| matches!(inv.status, InvoiceStatus::Pending | InvoiceStatus::Partial))
        .filter(|inv| {
            inv.invoice
                .due_date
                .map(|due| (0..=i64::from(within_days)).contains(&days_between(as_of, due)))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    upcoming.sort_by_key(|inv| inv.invoice.due_date);
    upcoming
}

fn average_payment_delay(enriched: &[EnrichedInvoice], payments: &[Payment]) -> u32 {
    let delays = paid_invoice_delays(enriched, payments);
    if delays.is_empty() {
        return 0;
    }

    let total = delays.iter().fold(0u64, |acc, d| acc.saturating_add(*d));
    (Decimal::from(total) / Decimal::from(delays.len()))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::enrich_invoices;
    use crate::Invoice;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn day(offset: i64) -> Option<NaiveDate> {
        Some(today() + Duration::days(offset))
    }

    fn fixture() -> (Vec<Customer>, Vec<EnrichedInvoice>, Vec<Payment>) {
        let customers = vec![
            Customer::new("C1", "Acme", dec!(10000)),
            Customer::new("C2", "Globex", dec!(1000)),
        ];
        let invoices = vec![
            Invoice::new("I1", "C1", dec!(1000), day(-10)),
            Invoice::new("I2", "C1", dec!(2000), day(5)),
            Invoice::new("I3", "C2", dec!(3000), day(2)),
            Invoice::new("I4", "C2", dec!(500), day(-20)),
        ];
        let payments = vec![
            Payment::new("P1", "I4", dec!(500), day(-16)),
            Payment::new("P2", "I2", dec!(500), day(-1)),
            Payment::new("P3", "GHOST", dec!(99), day(-1)),
        ];
        let enriched = enrich_invoices(&invoices, &payments, today());
        (customers, enriched, payments)
    }

    #[test]
    fn test_portfolio_summary() {
        let (customers, enriched, payments) = fixture();
        let summary = PortfolioSummary::compute(&customers, &enriched, &payments, &RiskScorer::default());

        assert_eq!(summary.total_outstanding, dec!(5500));
        assert_eq!(summary.open_invoice_count, 3);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.overdue_amount, dec!(1000));
        assert_eq!(summary.total_collected, dec!(1000));
        assert_eq!(summary.collection_efficiency_pct, dec!(25.0));
        assert_eq!(summary.avg_payment_delay_days, 4);
        // C2: 3000 against a 1000 limit
        assert_eq!(summary.risk_distribution.high, 1);
        assert_eq!(summary.bad_debt_forecast, dec!(900));
    }

    #[test]
    fn test_upcoming_payments_sorted() {
        let (_, enriched, _) = fixture();
        let upcoming = upcoming_payments(&enriched, today(), 7);
        let ids: Vec<&str> = upcoming.iter().map(|e| e.invoice.id.as_str()).collect();
        assert_eq!(ids, vec!["I3", "I2"]);
        assert!(upcoming_payments(&enriched, today(), 1).is_empty());
    }

    #[test]
    fn test_empty_portfolio() {
        let summary = PortfolioSummary::compute(&[], &[], &[], &RiskScorer::default());
        assert_eq!(summary.total_outstanding, Decimal::ZERO);
        assert_eq!(summary.collection_efficiency_pct, Decimal::ZERO);
        assert_eq!(summary.avg_payment_delay_days, 0);
    }

    #[test]
    fn test_extreme_amounts_saturate() {
        let customers = vec![Customer::new("C1", "Acme", dec!(1000))];
        let invoices = vec![
            Invoice::new("I1", "C1", Decimal::MAX, day(-3)),
            Invoice::new("I2", "C1", Decimal::MAX, day(3)),
            Invoice::new("I3", "C1", Decimal::MAX, day(-9)),
        ];
        let payments = vec![
            Payment::new("P1", "I3", Decimal::MAX, day(-8)),
            Payment::new("P2", "I3", Decimal::MAX, day(-1)),
        ];
        let enriched = enrich_invoices(&invoices, &payments, today());
        let summary = PortfolioSummary::compute(&customers, &enriched, &payments, &RiskScorer::default());

        assert_eq!(summary.total_outstanding, Decimal::MAX);
        assert_eq!(summary.total_collected, Decimal::MAX);
        assert_eq!(summary.risk_distribution.high, 1);
        assert!(summary.bad_debt_forecast > Decimal::ZERO);
    }
}
