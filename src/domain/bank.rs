use serde::{Deserialize, Serialize};

use super::Paise;

pub type BankAccountId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    Savings,
    Current,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "Savings",
            AccountType::Current => "Current",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "savings" => Some(AccountType::Savings),
            "current" => Some(AccountType::Current),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Details supplied when linking a bank account.
#[derive(Debug, Clone)]
pub struct NewBankAccount {
    pub account_holder_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub branch_name: String,
    pub account_type: AccountType,
}

/// A linked bank account. Its balance is informational only; the app never
/// debits or credits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: BankAccountId,
    pub account_holder_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub branch_name: String,
    pub account_type: AccountType,
    pub balance: Paise,
    pub is_primary: bool,
}

impl BankAccount {
    pub fn link(id: BankAccountId, details: NewBankAccount, is_primary: bool) -> Self {
        Self {
            id,
            account_holder_name: details.account_holder_name,
            account_number: details.account_number,
            bank_name: details.bank_name,
            branch_name: details.branch_name,
            account_type: details.account_type,
            balance: 0,
            is_primary,
        }
    }

    /// Account number with all but the last four digits hidden.
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self.account_number.chars().collect();
        if digits.len() <= 4 {
            return self.account_number.clone();
        }
        let visible: String = digits[digits.len() - 4..].iter().collect();
        format!("{}{}", "X".repeat(digits.len() - 4), visible)
    }
}
