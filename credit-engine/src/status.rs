//! Invoice status engine
//!
//! Derives `{status, outstanding, is_overdue, days_overdue}` from an invoice
//! and the full payment list. Pure: nothing is cached, every call recomputes
//! from the arrays it is handed.

use crate::dates::days_between;
use crate::{EnrichedInvoice, Invoice, InvoiceId, InvoiceStatus, Payment};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

/// Sum of all payments referencing `invoice_id`, saturating at `Decimal::MAX`
pub fn total_paid(invoice_id: &InvoiceId, payments: &[Payment]) -> Decimal {
    payments
        .iter()
        .filter(|p| &p.invoice_id == invoice_id)
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.amount))
}

/// Enrich one invoice with its derived status.
///
/// Precedence, first match wins:
/// 1. nothing outstanding: `Paid`
/// 2. partly paid: `Overdue` if past due, else `Partial`
/// 3. unpaid and past due: `Overdue`
/// 4. otherwise `Pending`
///
/// An invoice without a usable due date is never overdue.
pub fn enrich_invoice(invoice: &Invoice, payments: &[Payment], as_of: NaiveDate) -> EnrichedInvoice {
    let paid = total_paid(&invoice.id, payments);
    let outstanding = invoice.amount.saturating_sub(paid).max(Decimal::ZERO);

    // Whole days past due, only when strictly before `as_of`
    let past_due_days = invoice
        .due_date
        .map(|due| days_between(due, as_of))
        .filter(|days| *days > 0);

    let (status, is_overdue, days_overdue) = if outstanding.is_zero() {
        (InvoiceStatus::Paid, false, 0)
    } else {
        match (paid > Decimal::ZERO, past_due_days) {
            (_, Some(days)) => (InvoiceStatus::Overdue, true, clamp_days(days)),
            (true, None) => (InvoiceStatus::Partial, false, 0),
            (false, None) => (InvoiceStatus::Pending, false, 0),
        }
    };

    debug!(
        invoice_id = %invoice.id,
        %status,
        %outstanding,
        days_overdue,
        "invoice enriched"
    );

    EnrichedInvoice {
        invoice: invoice.clone(),
        status,
        outstanding,
        is_overdue,
        days_overdue,
    }
}

/// Enrich every invoice, preserving input order
pub fn enrich_invoices(
    invoices: &[Invoice],
    payments: &[Payment],
    as_of: NaiveDate,
) -> Vec<EnrichedInvoice> {
    invoices
        .iter()
        .map(|inv| enrich_invoice(inv, payments, as_of))
        .collect()
}

/// Enriched invoices whose status is `Overdue`, in input order
pub fn get_overdue_invoices(
    invoices: &[Invoice],
    payments: &[Payment],
    as_of: NaiveDate,
) -> Vec<EnrichedInvoice> {
    invoices
        .iter()
        .map(|inv| enrich_invoice(inv, payments, as_of))
        .filter(|inv| inv.status == InvoiceStatus::Overdue)
        .collect()
}

fn clamp_days(days: i64) -> u32 {
    u32::try_from(days).unwrap_or(u32::MAX)
}
