use serde::{Deserialize, Serialize};

use crate::domain::{
    BankAccount, Goal, GoalStatus, InvestmentCategory, Paise, Transaction, TransactionType,
    total_of,
};

/// Everything a user holds, with the totals shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub wallet_balance: Paise,
    pub total_invested: Paise,
    pub total_in_goals: Paise,
    pub active_goals: usize,
    pub holdings: Vec<Holding>,
    pub goals: Vec<Goal>,
    pub transactions: Vec<Transaction>,
    pub bank_accounts: Vec<BankAccount>,
}

/// Money invested into one product, summed over all investments in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub option_id: String,
    pub asset_name: String,
    pub category: Option<InvestmentCategory>,
    pub invested: Paise,
    pub count: usize,
}

impl Portfolio {
    pub fn build(
        wallet_balance: Paise,
        goals: Vec<Goal>,
        transactions: Vec<Transaction>,
        bank_accounts: Vec<BankAccount>,
    ) -> Self {
        Self {
            wallet_balance,
            total_invested: total_of(&transactions, TransactionType::Investment),
            total_in_goals: goals
                .iter()
                .fold(0, |sum: Paise, g| sum.saturating_add(g.current_amount)),
            active_goals: goals
                .iter()
                .filter(|g| g.status == GoalStatus::Active)
                .count(),
            holdings: holdings(&transactions),
            goals,
            transactions,
            bank_accounts,
        }
    }

    /// Wallet plus everything invested or saved into goals. Saturates rather
    /// than wrapping.
    pub fn net_worth(&self) -> Paise {
        self.wallet_balance
            .saturating_add(self.total_invested)
            .saturating_add(self.total_in_goals)
    }
}

/// Group investment transactions by product, largest holding first.
pub fn holdings(transactions: &[Transaction]) -> Vec<Holding> {
    let mut holdings: Vec<Holding> = Vec::new();

    for tx in transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Investment && t.wallet_delta() != 0)
    {
        let option_id = tx.option_id.clone().unwrap_or_default();
        match holdings.iter_mut().find(|h| h.option_id == option_id) {
            Some(holding) => {
                holding.invested = holding.invested.saturating_add(tx.amount);
                holding.count += 1;
            }
            None => holdings.push(Holding {
                asset_name: tx.asset_name.clone().unwrap_or_else(|| option_id.clone()),
                option_id,
                category: tx.category,
                invested: tx.amount,
                count: 1,
            }),
        }
    }

    holdings.sort_by(|a, b| b.invested.cmp(&a.invested));
    holdings
}
