use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BankAccountId, InvestmentCategory, InvestmentOption, InvestmentOptionId, Paise};

pub type TransactionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Bank to wallet
    Deposit,
    /// Wallet to bank
    Withdrawal,
    /// Wallet to investment product
    Investment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "Deposit",
            TransactionType::Withdrawal => "Withdrawal",
            TransactionType::Investment => "Investment",
        }
    }

    /// Sign of this transaction's effect on the wallet balance.
    pub fn wallet_sign(&self) -> i64 {
        match self {
            TransactionType::Deposit => 1,
            TransactionType::Withdrawal | TransactionType::Investment => -1,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[default]
    Success,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// One entry of a user's ledger. Transactions are append-only: once written
/// they are never updated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    /// Always positive; direction comes from the type
    pub amount: Paise,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_id: Option<BankAccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<InvestmentOptionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<InvestmentCategory>,
}

impl Transaction {
    fn new(id: TransactionId, transaction_type: TransactionType, amount: Paise) -> Self {
        assert!(amount > 0, "Transaction amount must be positive");
        Self {
            id,
            amount,
            transaction_type,
            status: TransactionStatus::Success,
            date: Utc::now(),
            bank_account_id: None,
            option_id: None,
            asset_name: None,
            category: None,
        }
    }

    pub fn deposit(id: TransactionId, amount: Paise, bank_account_id: BankAccountId) -> Self {
        Self::new(id, TransactionType::Deposit, amount).with_bank_account(bank_account_id)
    }

    pub fn withdrawal(id: TransactionId, amount: Paise, bank_account_id: BankAccountId) -> Self {
        Self::new(id, TransactionType::Withdrawal, amount).with_bank_account(bank_account_id)
    }

    pub fn investment(id: TransactionId, amount: Paise, option: &InvestmentOption) -> Self {
        let mut tx = Self::new(id, TransactionType::Investment, amount);
        tx.option_id = Some(option.id.clone());
        tx.asset_name = Some(option.title.clone());
        tx.category = Some(option.category);
        tx
    }

    fn with_bank_account(mut self, bank_account_id: BankAccountId) -> Self {
        self.bank_account_id = Some(bank_account_id);
        self
    }

    /// Signed effect of this transaction on the wallet.
    pub fn wallet_delta(&self) -> Paise {
        if self.status != TransactionStatus::Success {
            return 0;
        }
        self.transaction_type.wallet_sign().saturating_mul(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::super::default_catalog;
    use super::*;

    #[test]
    fn test_deposit_transaction() {
        let tx = Transaction::deposit("t1".into(), 5000, "b1".into());
        assert_eq!(tx.transaction_type, TransactionType::Deposit);
        assert_eq!(tx.bank_account_id.as_deref(), Some("b1"));
        assert_eq!(tx.status, TransactionStatus::Success);
        assert_eq!(tx.wallet_delta(), 5000);
    }

    #[test]
    fn test_investment_transaction_is_tagged() {
        let option = &default_catalog()[0];
        let tx = Transaction::investment("t2".into(), 100_000, option);

        assert_eq!(tx.option_id.as_deref(), Some(option.id.as_str()));
        assert_eq!(tx.asset_name.as_deref(), Some(option.title.as_str()));
        assert_eq!(tx.category, Some(option.category));
        assert_eq!(tx.wallet_delta(), -100_000);
        assert!(tx.bank_account_id.is_none());
    }

    #[test]
    fn test_non_success_has_no_wallet_effect() {
        let mut tx = Transaction::withdrawal("t3".into(), 700, "b1".into());
        tx.status = TransactionStatus::Failed;
        assert_eq!(tx.wallet_delta(), 0);
    }

    #[test]
    fn test_wire_shape() {
        let tx = Transaction::withdrawal("t4".into(), 700, "b1".into());
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "Withdrawal");
        assert_eq!(value["bankAccountId"], "b1");
        assert!(value.get("optionId").is_none());
    }

    #[test]
    #[should_panic(expected = "Transaction amount must be positive")]
    fn test_transaction_requires_positive_amount() {
        Transaction::deposit("t5".into(), 0, "b1".into());
    }
}
