//! Integration tests for the rebalancer workflows against the mock broker.

use std::path::Path;

use wholeshare::{Error as EngineError, PriceRef, TargetAllocations};
use wholeshare_broker::mock::{FillMode, MockBroker};
use wholeshare_broker::{Account, BrokerOrder, BrokerSide, OrderId};
use wholeshare_rebalancer::audit::AuditLog;
use wholeshare_rebalancer::error::Error;
use wholeshare_rebalancer::execution::{self, Mode, Outcome, RunOptions};
use wholeshare_rebalancer::reconcile::Drift;
use wholeshare_rebalancer::target;

const NUMBER: &str = "12345678";

fn targets() -> TargetAllocations {
    target::from_json(
        r#"{
            "global": {
                "VTI": { "proportion": 0.6 },
                "BND": { "proportion": 0.4 }
            },
            "999": {
                "VXUS": { "proportion": 1.0 }
            }
        }"#,
    )
    .unwrap()
}

fn broker_with(cash: f64, vti_held: f64) -> MockBroker {
    let mut builder = MockBroker::builder()
        .with_account(NUMBER, cash)
        .with_quote("VTI", 100.0)
        .with_quote("BND", 100.0)
        .with_quote("VXUS", 50.0);
    if vti_held > 0.0 {
        builder = builder.with_position(NUMBER, "VTI", vti_held, 100.0);
    }
    builder.build()
}

fn account(broker: &MockBroker) -> Account {
    execution::find_account(broker, "678").unwrap()
}

fn events(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["event"].as_str().unwrap().to_string()
        })
        .collect()
}

fn yes() -> RunOptions {
    RunOptions {
        dry_run: false,
        yes: true,
    }
}

// ============================================================================
// invest
// ============================================================================

#[test]
fn invest_dry_run_submits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let mut audit = AuditLog::open(&path).unwrap();

    let broker = broker_with(1000.0, 0.0);
    let opts = RunOptions {
        dry_run: true,
        yes: false,
    };
    let outcome =
        execution::run(&broker, &account(&broker), &targets(), Mode::Invest, opts, &mut audit)
            .unwrap();

    assert_eq!(outcome, Outcome::DryRun);
    assert!(broker.submitted_orders().is_empty());
    assert_eq!(
        events(&path),
        ["run_started", "positions_fetched", "plan_computed", "run_completed"]
    );
}

#[test]
fn invest_with_yes_submits_single_buy_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let mut audit = AuditLog::open(&path).unwrap();

    let broker = broker_with(1000.0, 0.0);
    let outcome =
        execution::run(&broker, &account(&broker), &targets(), Mode::Invest, yes(), &mut audit)
            .unwrap();

    assert_eq!(outcome, Outcome::Submitted(OrderId("1".into())));

    let orders = broker.submitted_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].account, NUMBER);
    let BrokerOrder::Single(legs) = &orders[0].order else {
        panic!("buy-only plan must be a single order");
    };
    let legs: Vec<_> = legs
        .iter()
        .map(|l| (l.ticker.as_str(), l.side, l.quantity))
        .collect();
    assert_eq!(
        legs,
        [("BND", BrokerSide::Buy, 4), ("VTI", BrokerSide::Buy, 6)]
    );

    assert!(events(&path).contains(&"order_submitted".to_string()));
}

#[test]
fn invest_without_cash_is_nothing_to_do() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let broker = broker_with(0.0, 5.0);
    let outcome =
        execution::run(&broker, &account(&broker), &targets(), Mode::Invest, yes(), &mut audit)
            .unwrap();

    assert_eq!(outcome, Outcome::NothingToDo);
    assert!(broker.submitted_orders().is_empty());
}

#[test]
fn declined_confirmation_submits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let mut audit = AuditLog::open(&path).unwrap();

    let broker = broker_with(1000.0, 0.0);
    let outcome = execution::run_with_confirm(
        &broker,
        &account(&broker),
        &targets(),
        Mode::Invest,
        RunOptions::default(),
        &mut audit,
        || Ok(false),
    )
    .unwrap();

    assert_eq!(outcome, Outcome::Declined);
    assert!(broker.submitted_orders().is_empty());
    assert!(events(&path).contains(&"user_confirmed".to_string()));
}

#[test]
fn approved_confirmation_submits() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let broker = broker_with(1000.0, 0.0);
    let outcome = execution::run_with_confirm(
        &broker,
        &account(&broker),
        &targets(),
        Mode::Invest,
        RunOptions::default(),
        &mut audit,
        || Ok(true),
    )
    .unwrap();

    assert!(matches!(outcome, Outcome::Submitted(_)));
    assert_eq!(broker.submitted_orders().len(), 1);
}

#[test]
fn rejected_order_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let broker = MockBroker::builder()
        .with_account(NUMBER, 1000.0)
        .with_quote("VTI", 100.0)
        .with_quote("BND", 100.0)
        .fill_mode(FillMode::Reject)
        .build();
    let result =
        execution::run(&broker, &account(&broker), &targets(), Mode::Invest, yes(), &mut audit);

    assert!(matches!(result, Err(Error::Broker(_))));
    assert_eq!(broker.submitted_orders().len(), 1);
}

#[test]
fn missing_quote_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let broker = MockBroker::builder()
        .with_account(NUMBER, 1000.0)
        .with_quote("VTI", 100.0)
        .build();
    let result =
        execution::run(&broker, &account(&broker), &targets(), Mode::Invest, yes(), &mut audit);

    match result {
        Err(Error::Engine(EngineError::MissingPrice {
            ticker,
            referenced_by: PriceRef::Targets,
        })) => assert_eq!(ticker.as_str(), "BND"),
        other => panic!("expected missing BND price, got {other:?}"),
    }
    assert!(broker.submitted_orders().is_empty());
}

// ============================================================================
// rebalance
// ============================================================================

#[test]
fn rebalance_sells_before_buying() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let broker = broker_with(0.0, 10.0);
    let outcome = execution::run(
        &broker,
        &account(&broker),
        &targets(),
        Mode::Rebalance,
        yes(),
        &mut audit,
    )
    .unwrap();
    assert!(matches!(outcome, Outcome::Submitted(_)));

    let orders = broker.submitted_orders();
    let BrokerOrder::Trigger { first, then } = &orders[0].order else {
        panic!("plan with sales must be a trigger order");
    };
    assert_eq!(first.len(), 1);
    assert_eq!(
        (first[0].ticker.as_str(), first[0].side, first[0].quantity),
        ("VTI", BrokerSide::Sell, 4)
    );
    assert_eq!(then.len(), 1);
    assert_eq!(
        (then[0].ticker.as_str(), then[0].side, then[0].quantity),
        ("BND", BrokerSide::Buy, 4)
    );
}

#[test]
fn rebalance_leaves_untracked_positions_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    // AAPL has no target and no quote; it must not be priced or sold
    let broker = MockBroker::builder()
        .with_account(NUMBER, 0.0)
        .with_position(NUMBER, "VTI", 10.0, 100.0)
        .with_position(NUMBER, "AAPL", 3.0, 200.0)
        .with_quote("VTI", 100.0)
        .with_quote("BND", 100.0)
        .build();
    execution::run(
        &broker,
        &account(&broker),
        &targets(),
        Mode::Rebalance,
        yes(),
        &mut audit,
    )
    .unwrap();

    let orders = broker.submitted_orders();
    assert_eq!(orders.len(), 1);
    assert!(orders[0].order.legs().all(|l| l.ticker.as_str() != "AAPL"));
}

#[test]
fn balanced_account_needs_no_rebalance() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let broker = MockBroker::builder()
        .with_account(NUMBER, 0.0)
        .with_position(NUMBER, "VTI", 6.0, 100.0)
        .with_position(NUMBER, "BND", 4.0, 100.0)
        .with_quote("VTI", 100.0)
        .with_quote("BND", 100.0)
        .build();
    let outcome = execution::run(
        &broker,
        &account(&broker),
        &targets(),
        Mode::Rebalance,
        yes(),
        &mut audit,
    )
    .unwrap();

    assert_eq!(outcome, Outcome::NothingToDo);
    assert!(broker.submitted_orders().is_empty());
}

// ============================================================================
// account targets, drift
// ============================================================================

#[test]
fn account_specific_targets_take_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let broker = MockBroker::builder()
        .with_account("55555999", 500.0)
        .with_quote("VXUS", 50.0)
        .build();
    let account = execution::find_account(&broker, "999").unwrap();
    execution::run(&broker, &account, &targets(), Mode::Invest, yes(), &mut audit).unwrap();

    let orders = broker.submitted_orders();
    let legs: Vec<_> = orders[0].order.legs().collect();
    assert_eq!(legs.len(), 1);
    assert_eq!(legs[0].ticker.as_str(), "VXUS");
    assert_eq!(legs[0].quantity, 10);
}

#[test]
fn no_matching_targets_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut audit = AuditLog::open(&dir.path().join("audit.jsonl")).unwrap();

    let only_one = target::from_json(r#"{ "999": { "VXUS": { "proportion": 1.0 } } }"#).unwrap();
    let broker = broker_with(1000.0, 0.0);
    let result =
        execution::run(&broker, &account(&broker), &only_one, Mode::Invest, yes(), &mut audit);

    assert!(matches!(result, Err(Error::Target(_))));
}

#[test]
fn drift_reports_tracked_weights() {
    let broker = MockBroker::builder()
        .with_account(NUMBER, 0.0)
        .with_position(NUMBER, "VTI", 8.0, 100.0)
        .with_position(NUMBER, "BND", 2.0, 100.0)
        .with_position(NUMBER, "AAPL", 100.0, 200.0)
        .with_quote("VTI", 100.0)
        .with_quote("BND", 100.0)
        .build();

    let report = execution::run_drift(&broker, &account(&broker), &targets()).unwrap();
    assert_eq!(report.entries.len(), 2);
    assert!(report.entries.iter().all(|e| e.ticker != "AAPL"));

    let vti = report.entries.iter().find(|e| e.ticker == "VTI").unwrap();
    let Drift::Proportion { diff_weight, .. } = vti.drift else {
        panic!("VTI is proportional");
    };
    assert!((diff_weight - 0.2).abs() < 1e-12);
}

#[test]
fn show_accounts_lists_all() {
    let broker = MockBroker::builder()
        .with_account("11111111", 10.0)
        .with_account("22222222", 20.0)
        .build();
    let accounts = execution::show_accounts(&broker).unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(execution::find_account(&broker, "2").unwrap().number, "22222222");
}
