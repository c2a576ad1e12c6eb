//! Credit engine for CreditFlow
//!
//! Invoice status derivation and customer risk scoring for B2B credit
//! management.
//!
//! # Invariants
//!
//! - Outstanding: `outstanding == max(0, amount - Σ matching payments)`
//! - Paid is terminal: fully paid invoices are never overdue
//! - Overdue requires an outstanding balance and a due date strictly before today
//! - Determinism: same inputs → same status, score and level

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod dates;
pub mod error;
pub mod ingest;
pub mod limits;
pub mod notifications;
pub mod portfolio;
pub mod scoring;
pub mod status;
pub mod storage;
pub mod types;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use ingest::Dataset;
pub use limits::CreditLimitChecker;
pub use notifications::NotificationCenter;
pub use portfolio::PortfolioSummary;
pub use scoring::{get_risk_level, CustomerRiskProfile, RiskScorer};
pub use status::{enrich_invoice, enrich_invoices, get_overdue_invoices};
pub use storage::{InMemoryStore, KeyValueStore};
pub use types::*;

/// Score a customer with the default weights
pub fn calculate_risk_score(
    customer: &Customer,
    enriched: &[EnrichedInvoice],
    payments: &[Payment],
) -> RiskScore {
    RiskScorer::default().calculate_risk_score(customer, enriched, payments)
}
