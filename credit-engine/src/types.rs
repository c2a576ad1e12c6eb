//! Core types for the credit engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Opaque invoice identifier
    InvoiceId
);
string_id!(
    /// Opaque payment identifier
    PaymentId
);
string_id!(
    /// Opaque customer identifier
    CustomerId
);

/// Invoice as delivered by the backend, after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID
    pub id: InvoiceId,

    /// Owning customer
    pub customer_id: CustomerId,

    /// Total invoice value
    pub amount: Decimal,

    /// Due date; `None` when upstream sent something unparseable
    pub due_date: Option<NaiveDate>,

    /// Human-facing invoice number
    pub invoice_number: Option<String>,

    /// Customer name as recorded on the invoice
    pub customer_name: Option<String>,
}

impl Invoice {
    /// Create an invoice with no display metadata
    pub fn new(
        id: impl Into<InvoiceId>,
        customer_id: impl Into<CustomerId>,
        amount: Decimal,
        due_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            amount,
            due_date,
            invoice_number: None,
            customer_name: None,
        }
    }

    /// Invoice number for display, falling back to the ID
    pub fn display_number(&self) -> &str {
        self.invoice_number.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Payment applied against a single invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID
    pub id: PaymentId,

    /// Invoice this payment settles (fully or partially)
    pub invoice_id: InvoiceId,

    /// Amount paid
    pub amount: Decimal,

    /// Calendar day the payment was made
    pub payment_date: Option<NaiveDate>,

    /// Invoice number as recorded on the payment
    pub invoice_number: Option<String>,

    /// Customer name as recorded on the payment
    pub customer_name: Option<String>,
}

impl Payment {
    /// Create a payment with no display metadata
    pub fn new(
        id: impl Into<PaymentId>,
        invoice_id: impl Into<InvoiceId>,
        amount: Decimal,
        payment_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: id.into(),
            invoice_id: invoice_id.into(),
            amount,
            payment_date,
            invoice_number: None,
            customer_name: None,
        }
    }
}

/// Credit customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID
    pub id: CustomerId,

    /// Display name
    pub name: String,

    /// Ceiling on outstanding exposure
    pub credit_limit: Decimal,

    /// Denormalized outstanding balance from the backend. Informational only:
    /// exposure is always recomputed from invoices.
    pub outstanding: Decimal,

    /// Risk level cached by the backend on a previous load. Never read by
    /// the scoring engine.
    pub cached_risk_level: Option<RiskLevel>,
}

impl Customer {
    /// Create a customer with a credit limit
    pub fn new(id: impl Into<CustomerId>, name: impl Into<String>, credit_limit: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            credit_limit,
            outstanding: Decimal::ZERO,
            cached_risk_level: None,
        }
    }
}

/// Derived invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Fully settled
    Paid,
    /// Nothing paid, not yet due
    Pending,
    /// Partly paid, not yet due
    Partial,
    /// Outstanding balance past its due date
    Overdue,
}

impl InvoiceStatus {
    /// Whether the invoice still carries an outstanding balance
    pub fn is_open(&self) -> bool {
        !matches!(self, InvoiceStatus::Paid)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Overdue => "overdue",
        };
        f.write_str(s)
    }
}

/// Invoice together with its derived status. Transient view, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedInvoice {
    /// Source invoice
    #[serde(flatten)]
    pub invoice: Invoice,

    /// Derived status
    pub status: InvoiceStatus,

    /// `max(0, amount - total paid)`
    pub outstanding: Decimal,

    /// Outstanding and strictly past due
    pub is_overdue: bool,

    /// Whole days past due; 0 unless overdue
    pub days_overdue: u32,
}

/// Risk score (0-100, higher is riskier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Lowest score that maps to medium risk
    pub const MEDIUM_THRESHOLD: u8 = 40;

    /// Lowest score that maps to high risk
    pub const HIGH_THRESHOLD: u8 = 60;

    /// Minimum score
    pub const MIN: RiskScore = RiskScore(0);

    /// Maximum score
    pub const MAX: RiskScore = RiskScore(100);

    /// Create new risk score (0-100)
    pub fn new(score: u8) -> Self {
        Self(score.min(100))
    }

    /// Get raw score
    pub fn score(&self) -> u8 {
        self.0
    }

    /// Check if high risk (>= 60)
    pub fn is_high_risk(&self) -> bool {
        self.0 >= Self::HIGH_THRESHOLD
    }

    /// Check if medium risk (40-59)
    pub fn is_medium_risk(&self) -> bool {
        (Self::MEDIUM_THRESHOLD..Self::HIGH_THRESHOLD).contains(&self.0)
    }

    /// Check if low risk (< 40)
    pub fn is_low_risk(&self) -> bool {
        self.0 < Self::MEDIUM_THRESHOLD
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

impl From<RiskScore> for RiskLevel {
    fn from(score: RiskScore) -> Self {
        if score.is_high_risk() {
            RiskLevel::High
        } else if score.is_medium_risk() {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}
