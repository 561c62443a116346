use serde::{Deserialize, Serialize};

use super::{Goal, Paise, Transaction, TransactionType};

/// Wallet balance implied by a user's history: every transaction plus every
/// rupee moved into goals. Sums saturate instead of wrapping.
pub fn replay_balance(transactions: &[Transaction], goals: &[Goal]) -> Paise {
    let from_transactions = transactions
        .iter()
        .fold(0, |sum: Paise, t| sum.saturating_add(t.wallet_delta()));
    let into_goals = goals
        .iter()
        .fold(0, |sum: Paise, g| sum.saturating_add(g.current_amount));
    from_transactions.saturating_sub(into_goals)
}

/// Sum of successful transactions of one type.
pub fn total_of(transactions: &[Transaction], transaction_type: TransactionType) -> Paise {
    transactions
        .iter()
        .filter(|t| t.transaction_type == transaction_type)
        .fold(0, |sum: Paise, t| sum.saturating_add(t.wallet_delta().saturating_abs()))
}

/// Result of checking a user's stored balance against their history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub transaction_count: usize,
    pub goal_count: usize,
    pub stored_balance: Paise,
    pub replayed_balance: Paise,
    pub total_deposited: Paise,
    pub total_withdrawn: Paise,
    pub total_invested: Paise,
    pub total_in_goals: Paise,
    pub invalid_amounts: usize,
}

impl IntegrityReport {
    pub fn drift(&self) -> Paise {
        self.stored_balance.saturating_sub(self.replayed_balance)
    }

    pub fn is_valid(&self) -> bool {
        self.drift() == 0 && self.invalid_amounts == 0 && self.stored_balance >= 0
    }
}

pub fn build_integrity_report(
    stored_balance: Paise,
    transactions: &[Transaction],
    goals: &[Goal],
) -> IntegrityReport {
    IntegrityReport {
        transaction_count: transactions.len(),
        goal_count: goals.len(),
        stored_balance,
        replayed_balance: replay_balance(transactions, goals),
        total_deposited: total_of(transactions, TransactionType::Deposit),
        total_withdrawn: total_of(transactions, TransactionType::Withdrawal),
        total_invested: total_of(transactions, TransactionType::Investment),
        total_in_goals: goals
            .iter()
            .fold(0, |sum: Paise, g| sum.saturating_add(g.current_amount)),
        invalid_amounts: transactions.iter().filter(|t| t.amount <= 0).count()
            + goals.iter().filter(|g| g.current_amount < 0).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::default_catalog;
    use super::*;

    fn history() -> (Vec<Transaction>, Vec<Goal>) {
        let option = &default_catalog()[0];
        let transactions = vec![
            Transaction::deposit("t1".into(), 10_000, "b1".into()),
            Transaction::withdrawal("t2".into(), 1_500, "b1".into()),
            Transaction::investment("t3".into(), 2_000, option),
        ];
        let mut goal = Goal::new("g1".into(), "Phone", 20_000);
        goal.current_amount = 500;
        (transactions, vec![goal])
    }

    #[test]
    fn test_replay_balance_empty() {
        assert_eq!(replay_balance(&[], &[]), 0);
    }

    #[test]
    fn test_replay_balance_mixed() {
        let (transactions, goals) = history();
        assert_eq!(replay_balance(&transactions, &goals), 6_000);
    }

    #[test]
    fn test_integrity_report_consistent() {
        let (transactions, goals) = history();
        let report = build_integrity_report(6_000, &transactions, &goals);

        assert!(report.is_valid());
        assert_eq!(report.total_deposited, 10_000);
        assert_eq!(report.total_withdrawn, 1_500);
        assert_eq!(report.total_invested, 2_000);
        assert_eq!(report.total_in_goals, 500);
    }

    #[test]
    fn test_replay_saturates_on_huge_history() {
        let transactions = vec![
            Transaction::deposit("t1".into(), i64::MAX, "b1".into()),
            Transaction::deposit("t2".into(), i64::MAX, "b1".into()),
        ];
        assert_eq!(replay_balance(&transactions, &[]), i64::MAX);
        assert_eq!(total_of(&transactions, TransactionType::Deposit), i64::MAX);
    }

    #[test]
    fn test_integrity_report_detects_drift() {
        let (transactions, goals) = history();
        let report = build_integrity_report(7_000, &transactions, &goals);

        assert!(!report.is_valid());
        assert_eq!(report.drift(), 1_000);
    }
}
