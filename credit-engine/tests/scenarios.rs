//! End-to-end scenarios: JSON ingestion through status, scoring and reporting

use chrono::{Duration, NaiveDate};
use credit_engine::{
    calculate_risk_score, enrich_invoice, enrich_invoices, get_overdue_invoices, get_risk_level,
    CreditLimitChecker, Customer, Dataset, Invoice, InvoiceStatus, Payment, PortfolioSummary,
    RiskLevel, RiskScore, RiskScorer,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn yesterday() -> Option<NaiveDate> {
    Some(today() - Duration::days(1))
}

fn tomorrow() -> Option<NaiveDate> {
    Some(today() + Duration::days(1))
}

#[test]
fn test_documented_examples() {
    let overdue = Invoice::new("I1", "C1", dec!(1000), yesterday());
    let e = enrich_invoice(&overdue, &[], today());
    assert_eq!(
        (e.status, e.outstanding, e.days_overdue),
        (InvoiceStatus::Overdue, dec!(1000), 1)
    );

    let full = [Payment::new("P1", "I1", dec!(1000), Some(today()))];
    let e = enrich_invoice(&overdue, &full, today());
    assert_eq!(
        (e.status, e.outstanding, e.days_overdue),
        (InvoiceStatus::Paid, Decimal::ZERO, 0)
    );

    let partial = [Payment::new("P1", "I1", dec!(400), Some(today()))];
    let not_due = Invoice::new("I1", "C1", dec!(1000), tomorrow());
    let e = enrich_invoice(&not_due, &partial, today());
    assert_eq!(
        (e.status, e.outstanding, e.days_overdue),
        (InvoiceStatus::Partial, dec!(600), 0)
    );

    let e = enrich_invoice(&overdue, &partial, today());
    assert_eq!(
        (e.status, e.outstanding, e.days_overdue),
        (InvoiceStatus::Overdue, dec!(600), 1)
    );
}

#[test]
fn test_zero_limit_customer_is_max_risk() {
    let customer = Customer::new("C1", "Acme", Decimal::ZERO);
    let invoices = vec![Invoice::new("I1", "C1", dec!(1), tomorrow())];
    let enriched = enrich_invoices(&invoices, &[], today());
    assert_eq!(calculate_risk_score(&customer, &enriched, &[]), RiskScore::MAX);
}

#[test]
fn test_customer_without_invoices_is_low() {
    let customer = Customer::new("C1", "Acme", dec!(5000));
    let score = calculate_risk_score(&customer, &[], &[]);
    assert_eq!(get_risk_level(score), RiskLevel::Low);
}

#[test]
fn test_orphan_records_contribute_nothing() {
    // A payment for an invoice that does not exist, and an invoice for a
    // customer that does not exist, are silently ignored.
    let customer = Customer::new("C1", "Acme", dec!(1000));
    let invoices = vec![
        Invoice::new("I1", "C1", dec!(500), tomorrow()),
        Invoice::new("I2", "NOBODY", dec!(99999), yesterday()),
    ];
    let payments = vec![
        Payment::new("P1", "I1", dec!(100), Some(today())),
        Payment::new("P2", "MISSING", dec!(400), Some(today())),
    ];
    let enriched = enrich_invoices(&invoices, &payments, today());

    assert_eq!(enriched[0].outstanding, dec!(400));
    let with_orphans = calculate_risk_score(&customer, &enriched, &payments);
    let without = calculate_risk_score(&customer, &enriched[..1], &payments[..1]);
    assert_eq!(with_orphans, without);

    let summary = PortfolioSummary::compute(&[customer], &enriched, &payments, &RiskScorer::default());
    assert_eq!(summary.total_collected, dec!(100));
}

#[test]
fn test_malformed_backend_payload_degrades() {
    let dataset = Dataset::from_json_str(
        r#"{
            "customers": [
                {"id": 1, "name": "Acme", "creditLimit": "50000", "outstanding": 999999, "riskScore": "High"}
            ],
            "invoices": [
                {"id": 10, "customerId": 1, "amount": "12000", "dueDate": "2024-06-14T00:00:00.000Z", "status": "paid"},
                {"id": 11, "customerId": 1, "amount": "n/a", "dueDate": "2024-06-01"},
                {"id": 12, "customerId": 1, "amount": 3000, "dueDate": "whenever"}
            ],
            "payments": [
                {"id": 100, "invoiceId": 10, "amount": "2000", "paymentDate": "2024-06-10"},
                {"id": 101, "invoiceId": 10, "amount": null}
            ]
        }"#,
    )
    .unwrap();

    let enriched = enrich_invoices(&dataset.invoices, &dataset.payments, today());
    let statuses: Vec<InvoiceStatus> = enriched.iter().map(|e| e.status).collect();

    // Legacy "paid" status is recomputed; bad amount degrades to a zero
    // invoice; bad due date is never overdue
    assert_eq!(
        statuses,
        vec![InvoiceStatus::Overdue, InvoiceStatus::Paid, InvoiceStatus::Pending]
    );
    assert_eq!(enriched[0].outstanding, dec!(10000));

    let overdue = get_overdue_invoices(&dataset.invoices, &dataset.payments, today());
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].invoice.id.as_str(), "10");

    let scorer = RiskScorer::default();
    let customer = &dataset.customers[0];
    let profile = scorer.assess_customer(customer, &enriched, &dataset.payments);
    assert_eq!(profile.outstanding, dec!(13000));
    assert_eq!(profile.risk_score, scorer.calculate_risk_score(customer, &enriched, &dataset.payments));
}

#[test]
fn test_huge_amounts_never_panic() {
    let dataset = Dataset::from_json_str(
        r#"{
            "customers": [
                {"id": "C1", "name": "Acme", "creditLimit": "50000000000000000000000000000"}
            ],
            "invoices": [
                {"id": "I1", "customerId": "C1", "amount": "50000000000000000000000000000", "dueDate": "2024-06-01"},
                {"id": "I2", "customerId": "C1", "amount": "50000000000000000000000000000", "dueDate": "2024-07-01"},
                {"id": "I3", "customerId": "C1", "amount": "50000000000000000000000000000", "dueDate": "2024-05-01"}
            ],
            "payments": [
                {"id": "P1", "invoiceId": "I3", "amount": "50000000000000000000000000000", "paymentDate": "2024-05-10"},
                {"id": "P2", "invoiceId": "I3", "amount": "50000000000000000000000000000", "paymentDate": "2024-05-11"}
            ]
        }"#,
    )
    .unwrap();

    let enriched = enrich_invoices(&dataset.invoices, &dataset.payments, today());
    let statuses: Vec<InvoiceStatus> = enriched.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![InvoiceStatus::Overdue, InvoiceStatus::Pending, InvoiceStatus::Paid]
    );
    assert!(enriched.iter().all(|e| e.outstanding >= Decimal::ZERO));

    // Two open invoices saturate exposure, which exceeds the limit
    let customer = &dataset.customers[0];
    let score = calculate_risk_score(customer, &enriched, &dataset.payments);
    assert_eq!(get_risk_level(score), RiskLevel::High);

    let profile = RiskScorer::default().assess_customer(customer, &enriched, &dataset.payments);
    assert_eq!(profile.outstanding, Decimal::MAX);
    assert_eq!(profile.risk_score, score);

    let utilization = CreditLimitChecker::default().evaluate(customer, &enriched, Decimal::MAX);
    assert_eq!(utilization.projected_exposure, Decimal::MAX);
    assert!(CreditLimitChecker::default()
        .ensure_within_limit(customer, &enriched, Decimal::ZERO)
        .is_err());

    let summary =
        PortfolioSummary::compute(&dataset.customers, &enriched, &dataset.payments, &RiskScorer::default());
    assert_eq!(summary.total_outstanding, Decimal::MAX);
    assert_eq!(summary.total_collected, Decimal::MAX);
}
