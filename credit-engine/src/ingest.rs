//! Ingestion boundary
//!
//! Loosely-typed backend records are normalized here into fully-typed,
//! already-defaulted records. Malformed amounts degrade to zero and
//! unparseable dates to `None`; only records with no identity are dropped.

use crate::dates::parse_calendar_day;
use crate::{Customer, Invoice, Payment, Result, RiskLevel};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

/// Invoice as returned by `GET /invoices`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInvoice {
    /// Invoice ID
    pub id: Value,
    /// Owning customer
    pub customer_id: Value,
    /// Invoice total
    pub amount: Value,
    /// Due date
    pub due_date: Value,
    /// Legacy status, recomputed downstream and never trusted
    pub status: Value,
    /// Display number
    pub invoice_number: Value,
    /// Display customer name
    pub customer_name: Value,
}

/// Payment as returned by `GET /payments`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPayment {
    /// Payment ID
    pub id: Value,
    /// Invoice the payment applies to
    pub invoice_id: Value,
    /// Amount paid
    pub amount: Value,
    /// Payment date
    pub payment_date: Value,
    /// Older records carry `date` instead of `paymentDate`
    pub date: Value,
    /// Display invoice number
    pub invoice_number: Value,
    /// Display customer name
    pub customer_name: Value,
}

/// Customer as returned by `GET /customers`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCustomer {
    /// Customer ID
    pub id: Value,
    /// Display name
    pub name: Value,
    /// Credit limit
    pub credit_limit: Value,
    /// Stale denormalized outstanding balance
    pub outstanding: Value,
    /// Cached risk level (older backends store it here)
    pub risk_score: Value,
    /// Cached risk level
    pub risk_level: Value,
}

impl RawInvoice {
    /// Normalize into a typed invoice; `None` when an identity field is missing
    pub fn normalize(&self) -> Option<Invoice> {
        let id = coerce_id(&self.id)?;
        let customer_id = coerce_id(&self.customer_id)?;
        let due_date = coerce_date(&self.due_date);
        if due_date.is_none() && !self.due_date.is_null() {
            warn!(invoice_id = %id, due_date = %self.due_date, "unparseable due date, treating as not overdue");
        }

        Some(Invoice {
            id: id.into(),
            customer_id: customer_id.into(),
            amount: coerce_amount(&self.amount),
            due_date,
            invoice_number: coerce_text(&self.invoice_number),
            customer_name: coerce_text(&self.customer_name),
        })
    }
}

impl RawPayment {
    /// Normalize into a typed payment; `None` when an identity field is missing
    pub fn normalize(&self) -> Option<Payment> {
        let id = coerce_id(&self.id)?;
        let invoice_id = coerce_id(&self.invoice_id)?;
        let payment_date = coerce_date(&self.payment_date).or_else(|| coerce_date(&self.date));

        Some(Payment {
            id: id.into(),
            invoice_id: invoice_id.into(),
            amount: coerce_amount(&self.amount),
            payment_date,
            invoice_number: coerce_text(&self.invoice_number),
            customer_name: coerce_text(&self.customer_name),
        })
    }
}

impl RawCustomer {
    /// Normalize into a typed customer; `None` when the ID is missing
    pub fn normalize(&self) -> Option<Customer> {
        let id = coerce_id(&self.id)?;
        let name = coerce_text(&self.name).unwrap_or_else(|| id.clone());
        let cached_risk_level = coerce_risk_level(&self.risk_level)
            .or_else(|| coerce_risk_level(&self.risk_score));

        Some(Customer {
            id: id.into(),
            name,
            credit_limit: coerce_amount(&self.credit_limit),
            outstanding: coerce_amount(&self.outstanding),
            cached_risk_level,
        })
    }
}

/// Normalized customers, invoices and payments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Customers
    pub customers: Vec<Customer>,
    /// Invoices
    pub invoices: Vec<Invoice>,
    /// Payments
    pub payments: Vec<Payment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    customers: Vec<Value>,
    invoices: Vec<Value>,
    payments: Vec<Value>,
}

impl Dataset {
    /// Parse a JSON document holding any of the `customers`, `invoices` and
    /// `payments` envelopes. Absent arrays are empty.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(json)?;
        Ok(Self {
            customers: normalize_all::<RawCustomer, _>("customer", envelope.customers, |r| r.normalize()),
            invoices: normalize_all::<RawInvoice, _>("invoice", envelope.invoices, |r| r.normalize()),
            payments: normalize_all::<RawPayment, _>("payment", envelope.payments, |r| r.normalize()),
        })
    }

    /// Merge another dataset into this one, e.g. one envelope per endpoint
    pub fn extend(&mut self, other: Dataset) {
        self.customers.extend(other.customers);
        self.invoices.extend(other.invoices);
        self.payments.extend(other.payments);
    }
}

fn normalize_all<R, T>(kind: &str, values: Vec<Value>, normalize: impl Fn(&R) -> Option<T>) -> Vec<T>
where
    R: for<'de> Deserialize<'de>,
{
    let mut out = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let raw: R = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(kind, index, error = %e, "dropping record that is not an object");
                continue;
            }
        };
        match normalize(&raw) {
            Some(record) => out.push(record),
            None => warn!(kind, index, "dropping record with missing identity field"),
        }
    }
    out
}

/// Coerce a loosely-typed amount. Non-numeric, missing and negative values
/// all become zero.
pub fn coerce_amount(value: &Value) -> Decimal {
    let parsed = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                parse_decimal(&n.to_string()).or_else(|| n.as_f64().and_then(Decimal::from_f64))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                parse_decimal(s)
            }
        }
        _ => None,
    };

    parsed
        .filter(|d| *d > Decimal::ZERO)
        .unwrap_or(Decimal::ZERO)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_date(value: &Value) -> Option<chrono::NaiveDate> {
    value.as_str().and_then(parse_calendar_day)
}

fn coerce_risk_level(value: &Value) -> Option<RiskLevel> {
    match value.as_str()?.trim().to_ascii_lowercase().as_str() {
        "low" => Some(RiskLevel::Low),
        "medium" => Some(RiskLevel::Medium),
        "high" => Some(RiskLevel::High),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(&json!(1000)), dec!(1000));
        assert_eq!(coerce_amount(&json!(12.5)), dec!(12.5));
        assert_eq!(coerce_amount(&json!(" 400.10 ")), dec!(400.10));
        assert_eq!(coerce_amount(&json!("1e3")), dec!(1000));
        assert_eq!(coerce_amount(&json!("abc")), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(null)), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(true)), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(-50)), Decimal::ZERO);
    }

    #[test]
    fn test_invoice_normalization() {
        let raw: RawInvoice = serde_json::from_value(json!({
            "id": 42,
            "customerId": "C1",
            "amount": "2500",
            "dueDate": "2024-03-01T18:30:00.000Z",
            "status": "paid",
            "invoiceNumber": "INV-0042"
        }))
        .unwrap();
        let invoice = raw.normalize().unwrap();
        assert_eq!(invoice.id.as_str(), "42");
        assert_eq!(invoice.amount, dec!(2500));
        assert_eq!(invoice.due_date, chrono::NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(invoice.display_number(), "INV-0042");
    }

    #[test]
    fn test_bad_due_date_becomes_none() {
        let raw: RawInvoice = serde_json::from_value(json!({
            "id": "I1", "customerId": "C1", "amount": 10, "dueDate": "soon"
        }))
        .unwrap();
        assert_eq!(raw.normalize().unwrap().due_date, None);
    }

    #[test]
    fn test_payment_date_fallback() {
        let raw: RawPayment = serde_json::from_value(json!({
            "id": "P1", "invoiceId": "I1", "amount": 5, "date": "2024-02-02"
        }))
        .unwrap();
        let payment = raw.normalize().unwrap();
        assert_eq!(payment.payment_date, chrono::NaiveDate::from_ymd_opt(2024, 2, 2));
    }

    #[test]
    fn test_customer_cached_level_case_insensitive() {
        let raw: RawCustomer = serde_json::from_value(json!({
            "id": "C1", "name": "Acme", "creditLimit": 500000, "riskScore": "High"
        }))
        .unwrap();
        let customer = raw.normalize().unwrap();
        assert_eq!(customer.cached_risk_level, Some(RiskLevel::High));
        assert_eq!(customer.credit_limit, dec!(500000));
    }

    #[test]
    fn test_dataset_drops_records_without_identity() {
        let dataset = Dataset::from_json_str(
            r#"{
                "invoices": [
                    {"id": "I1", "customerId": "C1", "amount": 100, "dueDate": "2024-01-01"},
                    {"customerId": "C1", "amount": 100},
                    {"id": "I3", "amount": 100},
                    17
                ],
                "payments": [{"id": "P1", "amount": 10}]
            }"#,
        )
        .unwrap();
        assert_eq!(dataset.invoices.len(), 1);
        assert!(dataset.payments.is_empty());
        assert!(dataset.customers.is_empty());
    }

    #[test]
    fn test_dataset_rejects_malformed_json() {
        assert!(Dataset::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_dataset_extend_merges_envelopes() {
        let mut dataset = Dataset::from_json_str(r#"{"customers": [{"id": "C1"}]}"#).unwrap();
        dataset.extend(
            Dataset::from_json_str(r#"{"payments": [{"id": "P1", "invoiceId": "I1", "amount": 1}]}"#)
                .unwrap(),
        );
        assert_eq!(dataset.customers.len(), 1);
        assert_eq!(dataset.customers[0].name, "C1");
        assert_eq!(dataset.payments.len(), 1);
    }
}
