//! Edge-case tests: boundary and adversarial inputs to every public entry point.

use wholeshare::ticker::quantities;
use wholeshare::{
    Allocation, Error, Holdings, TargetAllocation, Ticker, balance_purchase, fill_fixed_targets,
    fill_proportional, rebalance_with_selling,
};

fn sixty_forty() -> TargetAllocation {
    TargetAllocation::new([
        (Ticker::from("VTI"), Allocation::Proportion(0.6)),
        (Ticker::from("BND"), Allocation::Proportion(0.4)),
    ])
    .unwrap()
}

// ============================================================================
// Cash boundaries
// ============================================================================

#[test]
fn zero_cash_every_entry_point() {
    let holdings = quantities(&[("VTI", 3.0), ("BND", 1.0)]);
    let prices = quantities(&[("VTI", 250.0), ("BND", 70.0)]);
    let targets = sixty_forty();

    for result in [
        balance_purchase(0.0, &holdings, &prices, &targets),
        fill_fixed_targets(0.0, &holdings, &prices, &targets),
        fill_proportional(0.0, &holdings, &prices, &targets),
    ] {
        let result = result.unwrap();
        assert!(result.plan.is_empty());
        assert_eq!(result.cash, 0.0);
    }
}

#[test]
fn cash_exactly_one_share() {
    let prices = quantities(&[("VTI", 250.0), ("BND", 70.0)]);
    let result = balance_purchase(70.0, &Holdings::default(), &prices, &sixty_forty()).unwrap();
    // VTI is the most underweight but unaffordable
    assert_eq!(result.plan.get("BND"), 1);
    assert_eq!(result.cash, 0.0);
}

#[test]
fn cash_just_below_cheapest_price() {
    let prices = quantities(&[("VTI", 250.0), ("BND", 70.0)]);
    let result = balance_purchase(69.99, &Holdings::default(), &prices, &sixty_forty()).unwrap();
    assert!(result.plan.is_empty());
    assert_eq!(result.cash, 69.99);
}

#[test]
fn negative_cash_rejected() {
    let prices = quantities(&[("VTI", 250.0), ("BND", 70.0)]);
    let err = balance_purchase(-5.0, &Holdings::default(), &prices, &sixty_forty()).unwrap_err();
    assert_eq!(err, Error::InvalidCash(-5.0));
}

#[test]
fn nan_cash_rejected() {
    let prices = quantities(&[("VTI", 250.0), ("BND", 70.0)]);
    let err =
        rebalance_with_selling(f64::NAN, &Holdings::default(), &prices, &sixty_forty()).unwrap_err();
    assert!(matches!(err, Error::InvalidCash(_)));
}

// ============================================================================
// Prices
// ============================================================================

#[test]
fn zero_price_rejected_before_looping() {
    let prices = quantities(&[("VTI", 0.0), ("BND", 70.0)]);
    let err = balance_purchase(1000.0, &Holdings::default(), &prices, &sixty_forty()).unwrap_err();
    assert!(matches!(err, Error::InvalidPrice { .. }));
}

#[test]
fn extra_prices_are_ignored() {
    let prices = quantities(&[("VTI", 250.0), ("BND", 70.0), ("QQQ", 400.0)]);
    let result = balance_purchase(500.0, &Holdings::default(), &prices, &sixty_forty()).unwrap();
    assert_eq!(result.plan.get("QQQ"), 0);
}

// ============================================================================
// Holdings
// ============================================================================

#[test]
fn empty_holdings_start_from_scratch() {
    let prices = quantities(&[("VTI", 10.0), ("BND", 10.0)]);
    let result = balance_purchase(100.0, &Holdings::default(), &prices, &sixty_forty()).unwrap();
    assert_eq!(result.plan.get("VTI"), 6);
    assert_eq!(result.plan.get("BND"), 4);
}

#[test]
fn rebalance_with_empty_holdings_is_a_purchase() {
    let prices = quantities(&[("VTI", 10.0), ("BND", 10.0)]);
    let holdings = Holdings::default();
    let bought = balance_purchase(100.0, &holdings, &prices, &sixty_forty()).unwrap();
    let rebalanced = rebalance_with_selling(100.0, &holdings, &prices, &sixty_forty()).unwrap();
    assert_eq!(bought, rebalanced);
}

#[test]
fn untracked_holding_does_not_count_toward_weights() {
    // 1000 shares of an untracked fund must not make VTI/BND look underweight
    let holdings = quantities(&[("VTI", 6.0), ("BND", 4.0), ("OTHER", 1000.0)]);
    let prices = quantities(&[("VTI", 10.0), ("BND", 10.0), ("OTHER", 10.0)]);
    let result = balance_purchase(10.0, &holdings, &prices, &sixty_forty()).unwrap();
    assert_eq!(result.plan.len(), 1);
    assert_eq!(result.plan.get("OTHER"), 0);
}

#[test]
fn nan_holding_rejected() {
    let holdings = quantities(&[("VTI", f64::NAN)]);
    let prices = quantities(&[("VTI", 250.0), ("BND", 70.0)]);
    let err = balance_purchase(100.0, &holdings, &prices, &sixty_forty()).unwrap_err();
    assert!(matches!(err, Error::InvalidHolding { .. }));
}

// ============================================================================
// Rebalance guard
// ============================================================================

#[test]
fn rebalance_on_target_returns_original_cash() {
    let holdings = quantities(&[("VTI", 6.0), ("BND", 4.0)]);
    let prices = quantities(&[("VTI", 10.0), ("BND", 10.0)]);
    let result = rebalance_with_selling(3.21, &holdings, &prices, &sixty_forty()).unwrap();
    assert!(result.plan.is_empty());
    assert_eq!(result.cash, 3.21);
}

#[test]
fn rebalance_never_sells_more_than_whole_shares_held() {
    let holdings = quantities(&[("VTI", 12.9), ("BND", 0.5)]);
    let prices = quantities(&[("VTI", 10.0), ("BND", 10.0)]);
    let result = rebalance_with_selling(0.0, &holdings, &prices, &sixty_forty()).unwrap();
    for (ticker, sold) in result.plan.sells() {
        assert!(sold as f64 <= holdings[ticker].floor());
    }
}
