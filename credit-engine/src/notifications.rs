//! Notification center
//!
//! Alerts are derived fresh from invoices, payments and customers on every
//! call. Only the set of dismissed alert ids is persisted, through an
//! injected [`KeyValueStore`].

use crate::config::NotificationConfig;
use crate::dates::days_between;
use crate::scoring::RiskScorer;
use crate::status::enrich_invoices;
use crate::storage::KeyValueStore;
use crate::{
    Customer, CustomerId, EnrichedInvoice, Error, Invoice, InvoiceId, InvoiceStatus, Payment,
    PaymentId, Result, RiskLevel,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// Invoice past due
    Overdue,
    /// Invoice due within the configured window
    DueSoon,
    /// Open invoice held by a high-risk customer
    Risk,
    /// Payment received recently
    Payment,
}

/// Alert priority; sorts high first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Needs action now
    High,
    /// Needs attention soon
    Medium,
    /// Informational
    Low,
}

/// A single alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable id; encodes the state it was raised for so a dismissed alert
    /// reappears when that state changes
    pub id: String,
    /// Category
    pub kind: NotificationKind,
    /// Priority
    pub priority: Priority,
    /// Title
    pub title: String,
    /// Message body
    pub message: String,
    /// Relative time label
    pub timestamp: String,
    /// Related invoice
    pub invoice_id: Option<InvoiceId>,
    /// Related customer
    pub customer_id: Option<CustomerId>,
    /// Related payment
    pub payment_id: Option<PaymentId>,
}

/// Notification center backed by a key-value store
pub struct NotificationCenter<S> {
    store: S,
    config: NotificationConfig,
    scorer: RiskScorer,
}

impl<S: KeyValueStore> NotificationCenter<S> {
    /// Store key holding the dismissed ids as a JSON array
    pub const DISMISSED_KEY: &'static str = "dismissedNotifications";

    /// Create a notification center
    pub fn new(store: S, config: NotificationConfig, scorer: RiskScorer) -> Self {
        Self {
            store,
            config,
            scorer,
        }
    }

    /// Dismissed notification ids, in dismissal order
    pub fn dismissed(&self) -> Result<Vec<String>> {
        let Some(raw) = self.store.get(Self::DISMISSED_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                warn!(error = %e, "discarding unreadable dismissed notification list");
                Ok(Vec::new())
            }
        }
    }

    /// Dismiss one notification
    pub fn dismiss(&self, id: &str) -> Result<()> {
        let mut ids = self.dismissed()?;
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
        self.save(&ids)
    }

    /// Replace the dismissed set with every id in `notifications`
    pub fn dismiss_all(&self, notifications: &[Notification]) -> Result<()> {
        let ids: Vec<String> = notifications.iter().map(|n| n.id.clone()).collect();
        self.save(&ids)
    }

    /// Build the current alert list, minus dismissed ones, high priority first
    pub fn generate(
        &self,
        customers: &[Customer],
        invoices: &[Invoice],
        payments: &[Payment],
        as_of: NaiveDate,
    ) -> Result<Vec<Notification>> {
        let dismissed: HashSet<String> = self.dismissed()?.into_iter().collect();
        let enriched = enrich_invoices(invoices, payments, as_of);
        let by_id: HashMap<&CustomerId, &Customer> = customers.iter().map(|c| (&c.id, c)).collect();

        let mut notifications = Vec::new();
        self.overdue_alerts(&enriched, &by_id, &mut notifications);
        self.due_soon_alerts(&enriched, &by_id, as_of, &mut notifications);
        self.risk_alerts(customers, &enriched, payments, as_of, &mut notifications);
        self.payment_alerts(payments, as_of, &mut notifications);

        notifications.retain(|n| !dismissed.contains(&n.id));
        notifications.sort_by_key(|n| n.priority);

        debug!(count = notifications.len(), "notifications generated");
        Ok(notifications)
    }

    fn overdue_alerts(
        &self,
        enriched: &[EnrichedInvoice],
        customers: &HashMap<&CustomerId, &Customer>,
        out: &mut Vec<Notification>,
    ) {
        for inv in enriched.iter().filter(|inv| inv.status == InvoiceStatus::Overdue) {
            let days = inv.days_overdue;
            out.push(Notification {
                id: format!("overdue-{}-{}", inv.invoice.id, days),
                kind: NotificationKind::Overdue,
                priority: Priority::High,
                title: "Invoice Overdue".to_string(),
                message: format!(
                    "{} from {} is {} {} overdue - {}",
                    inv.invoice.display_number(),
                    customer_label(inv, customers),
                    days,
                    plural_days(i64::from(days)),
                    inv.outstanding
                ),
                timestamp: format!("{} {} ago", days, plural_days(i64::from(days))),
                invoice_id: Some(inv.invoice.id.clone()),
                customer_id: Some(inv.invoice.customer_id.clone()),
                payment_id: None,
            });
        }
    }

    fn due_soon_alerts(
        &self,
        enriched: &[EnrichedInvoice],
        customers: &HashMap<&CustomerId, &Customer>,
        as_of: NaiveDate,
        out: &mut Vec<Notification>,
    ) {
        let window = 0..=i64::from(self.config.due_soon_days);
        for inv in enriched
            .iter()
            .filter(|inv| matches!(inv.status, InvoiceStatus::Pending | InvoiceStatus::Partial))
        {
            let Some(due) = inv.invoice.due_date else {
                continue;
            };
            let days_until = days_between(as_of, due);
            if !window.contains(&days_until) {
                continue;
            }

            let (title, when, label) = if days_until == 0 {
                ("Invoice Due Today", "today".to_string(), "Today".to_string())
            } else {
                (
                    "Invoice Due Soon",
                    format!("in {} {}", days_until, plural_days(days_until)),
                    format!("In {} {}", days_until, plural_days(days_until)),
                )
            };

            out.push(Notification {
                id: format!("due-soon-{}-{}", inv.invoice.id, days_until),
                kind: NotificationKind::DueSoon,
                priority: Priority::Medium,
                title: title.to_string(),
                message: format!(
                    "{} from {} due {} - {}",
                    inv.invoice.display_number(),
                    customer_label(inv, customers),
                    when,
                    inv.outstanding
                ),
                timestamp: label,
                invoice_id: Some(inv.invoice.id.clone()),
                customer_id: Some(inv.invoice.customer_id.clone()),
                payment_id: None,
            });
        }
    }

    fn risk_alerts(
        &self,
        customers: &[Customer],
        enriched: &[EnrichedInvoice],
        payments: &[Payment],
        as_of: NaiveDate,
        out: &mut Vec<Notification>,
    ) {
        // Levels are recomputed; a cached level from the backend is ignored
        let high_risk = customers.iter().filter(|c| {
            RiskLevel::from(self.scorer.calculate_risk_score(c, enriched, payments)) == RiskLevel::High
        });

        for customer in high_risk {
            for inv in enriched
                .iter()
                .filter(|inv| inv.invoice.customer_id == customer.id && inv.status.is_open())
            {
                let detail = if inv.status == InvoiceStatus::Overdue {
                    format!("{} days overdue", inv.days_overdue)
                } else {
                    match inv.invoice.due_date {
                        Some(due) => match days_between(as_of, due) {
                            0 => "due today".to_string(),
                            d if d <= i64::from(self.config.due_soon_days) => format!("due in {} days", d),
                            _ => format!("due {}", due.format("%-d %b")),
                        },
                        None => "no due date".to_string(),
                    }
                };

                out.push(Notification {
                    id: format!("risk-invoice-{}-{}", inv.invoice.id, customer.id),
                    kind: NotificationKind::Risk,
                    priority: Priority::Medium,
                    title: "High Risk Customer - Action Required".to_string(),
                    message: format!(
                        "{}: {} ({}) - {}",
                        customer.name,
                        inv.invoice.display_number(),
                        inv.outstanding,
                        detail
                    ),
                    timestamp: "Risk Alert".to_string(),
                    invoice_id: Some(inv.invoice.id.clone()),
                    customer_id: Some(customer.id.clone()),
                    payment_id: None,
                });
            }
        }
    }

    fn payment_alerts(&self, payments: &[Payment], as_of: NaiveDate, out: &mut Vec<Notification>) {
        let recent_window = 0..=i64::from(self.config.recent_payment_days);
        let start = payments.len().saturating_sub(self.config.recent_payment_count);

        for payment in payments[start..].iter().rev() {
            let Some(date) = payment.payment_date else {
                continue;
            };
            let days_since = days_between(date, as_of);
            if !recent_window.contains(&days_since) {
                continue;
            }

            let label = match days_since {
                0 => "Today".to_string(),
                1 => "Yesterday".to_string(),
                n => format!("{} days ago", n),
            };

            out.push(Notification {
                id: format!("payment-{}-{}", payment.id, date.format("%Y-%m-%d")),
                kind: NotificationKind::Payment,
                priority: Priority::Low,
                title: "Payment Received".to_string(),
                message: format!(
                    "{} payment of {} received from {}",
                    payment
                        .invoice_number
                        .as_deref()
                        .unwrap_or(payment.invoice_id.as_str()),
                    payment.amount,
                    payment.customer_name.as_deref().unwrap_or("customer")
                ),
                timestamp: label,
                invoice_id: Some(payment.invoice_id.clone()),
                customer_id: None,
                payment_id: Some(payment.id.clone()),
            });
        }
    }

    fn save(&self, ids: &[String]) -> Result<()> {
        let raw = serde_json::to_string(ids).map_err(|e| Error::Storage(e.to_string()))?;
        self.store.set(Self::DISMISSED_KEY, raw)
    }
}

fn customer_label<'a>(inv: &'a EnrichedInvoice, customers: &HashMap<&CustomerId, &'a Customer>) -> &'a str {
    customers
        .get(&inv.invoice.customer_id)
        .map(|c| c.name.as_str())
        .or(inv.invoice.customer_name.as_deref())
        .unwrap_or(inv.invoice.customer_id.as_str())
}

fn plural_days(n: i64) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}
