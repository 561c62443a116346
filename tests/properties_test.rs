//! Property-based tests for wallet and projection invariants.
//!
//! - Accepted deposits add to the balance; accepted withdrawals and
//!   investments subtract from it; rejected ones change nothing
//! - The stored balance always matches a replay of the history
//! - Projections are deterministic, never lose money at non-negative rates,
//!   and report the amount put in exactly
//! - Any input, however large, yields a projection or an error, never a panic

mod common;

use common::sample_bank_details;
use pocket_invest::application::{AppError, LedgerService};
use pocket_invest::config::StorageConfig;
use pocket_invest::domain::{
    ContributionType, MAX_DURATION_MONTHS, MAX_PROJECTION_AMOUNT, Paise, ProjectionError,
    UserProfile, compute_returns, default_catalog, project,
};
use pocket_invest::storage::paths;
use proptest::{prelude::*, test_runner::TestCaseError};
use tempfile::TempDir;

fn fail(e: impl std::fmt::Display) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

#[derive(Debug, Clone)]
enum Op {
    Deposit(Paise),
    Withdraw(Paise),
    Invest(Paise),
}

fn op_strat() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1..=50_000_i64).prop_map(Op::Deposit),
        (1..=50_000_i64).prop_map(Op::Withdraw),
        // Digital gold accepts anything from ₹10
        (1_000..=50_000_i64).prop_map(Op::Invest),
    ]
}

fn contribution_strat() -> impl Strategy<Value = ContributionType> {
    prop_oneof![
        Just(ContributionType::Lumpsum),
        Just(ContributionType::Sip),
        Just(ContributionType::Recurring),
    ]
}

/// Whole-rupee amounts, so totals are exact in paise.
fn rupee_amount_strat() -> impl Strategy<Value = Paise> {
    (1..=1_000_000_i64).prop_map(|rupees| rupees * 100)
}

/// Any positive amount, up to the full range of `Paise`.
fn huge_amount_strat() -> impl Strategy<Value = Paise> {
    prop_oneof![
        rupee_amount_strat(),
        (MAX_PROJECTION_AMOUNT..=i64::MAX),
        Just(i64::MAX),
    ]
}

/// Any duration, up to the full range of `u32`.
fn huge_months_strat() -> impl Strategy<Value = u32> {
    prop_oneof![1..=MAX_DURATION_MONTHS, MAX_DURATION_MONTHS..=u32::MAX, Just(u32::MAX)]
}

/// Run `ops` against a fresh database, returning
/// (stored balance, modelled balance, accepted count, transaction count, integrity ok).
async fn run_ops(ops: &[Op]) -> anyhow::Result<(Paise, Paise, usize, usize, bool)> {
    let temp = TempDir::new()?;
    let config = StorageConfig::with_database(temp.path().join("prop.db").to_string_lossy());
    let service = LedgerService::init(&config).await?;

    let uid = "prop-user";
    let profile = UserProfile::new(uid, "Prop", "prop@example.com");
    service
        .store()
        .write(&paths::profile(uid), serde_json::to_value(&profile)?)
        .await?;
    let bank = service.link_bank_account(uid, sample_bank_details()).await?;

    let mut model: Paise = 0;
    let mut accepted = 0;
    for op in ops {
        let result = match op {
            Op::Deposit(amount) => service.deposit(uid, *amount, &bank.id).await,
            Op::Withdraw(amount) => service.withdraw(uid, *amount, &bank.id).await,
            Op::Invest(amount) => service.invest(uid, *amount, "gold-digital").await,
        };
        let delta = match op {
            Op::Deposit(amount) => *amount,
            Op::Withdraw(amount) | Op::Invest(amount) => -*amount,
        };

        match result {
            Ok(receipt) => {
                model += delta;
                accepted += 1;
                anyhow::ensure!(receipt.new_balance == model, "receipt balance drifted");
            }
            Err(AppError::InsufficientFunds { balance, .. }) => {
                anyhow::ensure!(model + delta < 0, "sufficient funds were rejected");
                anyhow::ensure!(balance == model, "reported balance drifted");
            }
            Err(other) => return Err(other.into()),
        }
    }

    let stored = service.get_profile(uid).await?.wallet_balance;
    let transactions = service.list_transactions(uid).await?.len();
    let integrity = service.check_integrity(uid).await?.is_valid();
    Ok((stored, model, accepted, transactions, integrity))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn projection_is_deterministic(
        contribution in contribution_strat(),
        rate in 0.0..30.0_f64,
        amount in rupee_amount_strat(),
        months in 1..=480_u32,
    ) {
        let first = compute_returns(contribution, rate, amount, months).map_err(fail)?;
        let second = compute_returns(contribution, rate, amount, months).map_err(fail)?;
        prop_assert_eq!(first, second);
    }

    #[test]
    fn projection_reports_amount_put_in(
        contribution in contribution_strat(),
        rate in 0.0..30.0_f64,
        amount in rupee_amount_strat(),
        months in 1..=480_u32,
    ) {
        let p = compute_returns(contribution, rate, amount, months).map_err(fail)?;
        let expected = if contribution.is_recurring() {
            amount * i64::from(months)
        } else {
            amount
        };
        prop_assert_eq!(p.total_invested, expected);
    }

    #[test]
    fn projection_never_loses_money(
        contribution in contribution_strat(),
        rate in 0.0..30.0_f64,
        amount in rupee_amount_strat(),
        months in 1..=480_u32,
    ) {
        let p = compute_returns(contribution, rate, amount, months).map_err(fail)?;
        prop_assert!(p.maturity_value >= p.total_invested);
    }

    #[test]
    fn zero_rate_returns_what_was_invested(
        contribution in contribution_strat(),
        amount in rupee_amount_strat(),
        months in 0..=480_u32,
    ) {
        let p = compute_returns(contribution, 0.0, amount, months).map_err(fail)?;
        prop_assert_eq!(p.maturity_value, p.total_invested);
    }

    #[test]
    fn zero_duration_never_divides(
        contribution in contribution_strat(),
        rate in 0.0..30.0_f64,
        amount in rupee_amount_strat(),
    ) {
        let p = compute_returns(contribution, rate, amount, 0).map_err(fail)?;
        if contribution.is_recurring() {
            prop_assert_eq!(p.total_invested, 0);
            prop_assert_eq!(p.maturity_value, 0);
        } else {
            prop_assert_eq!(p.total_invested, amount);
            prop_assert_eq!(p.maturity_value, amount);
        }
    }

    #[test]
    fn huge_inputs_never_panic(
        contribution in contribution_strat(),
        rate in 0.0..30.0_f64,
        amount in huge_amount_strat(),
        months in huge_months_strat(),
    ) {
        match compute_returns(contribution, rate, amount, months) {
            Ok(p) => {
                prop_assert!(p.total_invested >= 0);
                prop_assert!(p.maturity_value >= p.total_invested);
            }
            Err(ProjectionError::InvalidInput(_)) => {}
        }

        let mut option = default_catalog().remove(0);
        option.contribution_type = contribution;
        option.interest_rate = rate;
        match project(&option, amount, months) {
            Ok(p) => {
                prop_assert!(amount <= MAX_PROJECTION_AMOUNT);
                prop_assert!(months <= MAX_DURATION_MONTHS);
                prop_assert!(p.maturity_value >= p.total_invested);
            }
            Err(ProjectionError::InvalidInput(_)) => {
                prop_assert!(
                    amount > MAX_PROJECTION_AMOUNT
                        || months > MAX_DURATION_MONTHS
                        || compute_returns(contribution, rate, amount, months).is_err()
                );
            }
        }
    }
}

proptest! {
    // Each case opens its own database
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn wallet_matches_accepted_operations(ops in prop::collection::vec(op_strat(), 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(fail)?;
        let (stored, model, accepted, transactions, integrity) =
            runtime.block_on(run_ops(&ops)).map_err(fail)?;

        prop_assert_eq!(stored, model);
        prop_assert!(stored >= 0);
        prop_assert_eq!(transactions, accepted);
        prop_assert!(integrity);
    }
}
